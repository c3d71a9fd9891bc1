//! Scripted clients for both services.
//!
//! Each client wraps a [`MockService`]: script responses with
//! `expect("Operation").return_ok(..)`, run the pipeline, then inspect the
//! recorded requests (serialized with wire names) and call `verify()`.
//!
//! ```rust
//! use cmdlet_aws::mock::MockSqs;
//! use cmdlet_aws::sqs::model::PurgeQueueResponse;
//!
//! let sqs = MockSqs::new();
//! sqs.expect("PurgeQueue").return_ok(PurgeQueueResponse {});
//! assert_eq!(sqs.call_count(), 0);
//! ```

use crate::pinpoint_email::model::*;
use crate::pinpoint_email::PinpointEmailApi;
use crate::sqs::model::*;
use crate::sqs::SqsApi;
use async_trait::async_trait;
use cmdlet_framework::mock::MockService;
use cmdlet_framework::ServiceError;
use std::ops::Deref;

/// Declares a mock client type and implements the service trait on it, one
/// method per listed operation.
macro_rules! mock_client {
    ($name:ident: $api:ident { $($op:ident),* $(,)? }) => {
        paste::paste! {
            #[derive(Clone, Default)]
            pub struct $name(MockService);

            impl $name {
                pub fn new() -> Self {
                    Self::default()
                }
            }

            impl Deref for $name {
                type Target = MockService;

                fn deref(&self) -> &MockService {
                    &self.0
                }
            }

            #[async_trait]
            impl $api for $name {
                $(
                    async fn [<$op:snake>](
                        &self,
                        request: [<$op Request>],
                    ) -> Result<[<$op Response>], ServiceError> {
                        self.0.respond(stringify!($op), &request)
                    }
                )*
            }
        }
    };
}

mock_client!(MockSqs: SqsApi {
    AddPermission,
    RemovePermission,
    CreateQueue,
    DeleteQueue,
    GetQueueUrl,
    ListQueues,
    SendMessage,
    SendMessageBatch,
    ReceiveMessage,
    DeleteMessage,
    ChangeMessageVisibility,
    PurgeQueue,
});

mock_client!(MockPinpointEmail: PinpointEmailApi {
    CreateConfigurationSet,
    DeleteConfigurationSet,
    PutConfigurationSetReputationOptions,
    PutConfigurationSetSendingOptions,
    SendEmail,
    CreateEmailIdentity,
    DeleteEmailIdentity,
    ListEmailIdentities,
    GetAccount,
    PutAccountSendingAttributes,
});

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_sqs_records_wire_names() {
        let sqs = MockSqs::new();
        sqs.expect("GetQueueUrl").return_ok(GetQueueUrlResponse {
            queue_url: Some("https://queue.example/q1".into()),
        });

        let response = sqs
            .get_queue_url(GetQueueUrlRequest {
                queue_name: Some("q1".into()),
                queue_owner_aws_account_id: Some("111122223333".into()),
            })
            .await
            .unwrap();

        assert_eq!(response.queue_url.as_deref(), Some("https://queue.example/q1"));
        assert_eq!(sqs.calls(), ["GetQueueUrl"]);
        assert_eq!(
            sqs.last_request(),
            Some(json!({"QueueName": "q1", "QueueOwnerAWSAccountId": "111122223333"}))
        );
        sqs.verify();
    }

    #[tokio::test]
    async fn test_mock_pinpoint_returns_scripted_error() {
        let email = MockPinpointEmail::new();
        email
            .expect("DeleteEmailIdentity")
            .return_err(ServiceError::api("NotFoundException", "missing"));

        let err = email
            .delete_email_identity(DeleteEmailIdentityRequest {
                email_identity: Some("a@example.com".into()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("NotFoundException"));
        email.verify();
    }
}

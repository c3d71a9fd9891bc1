//! # Amazon SQS
//!
//! - [`model`] - request and response shapes
//! - [`ops`] - bound parameters and [`Operation`](cmdlet_framework::Operation) impls
//! - [`local`] - in-process queue service
//!
//! Every operation goes through the [`SqsApi`] client trait, so the pipeline
//! does not care whether it talks to the local backend or to a mock.

pub mod local;
pub mod model;
pub mod ops;

use async_trait::async_trait;
use cmdlet_framework::ServiceError;
use model::*;

pub const SERVICE: &str = "sqs";

/// Error code returned for an unknown queue.
pub const NON_EXISTENT_QUEUE: &str = "AWS.SimpleQueueService.NonExistentQueue";

/// Client for Amazon SQS. One method per operation.
#[async_trait]
pub trait SqsApi: Send + Sync {
    async fn add_permission(
        &self,
        request: AddPermissionRequest,
    ) -> Result<AddPermissionResponse, ServiceError>;

    async fn remove_permission(
        &self,
        request: RemovePermissionRequest,
    ) -> Result<RemovePermissionResponse, ServiceError>;

    async fn create_queue(
        &self,
        request: CreateQueueRequest,
    ) -> Result<CreateQueueResponse, ServiceError>;

    async fn delete_queue(
        &self,
        request: DeleteQueueRequest,
    ) -> Result<DeleteQueueResponse, ServiceError>;

    async fn get_queue_url(
        &self,
        request: GetQueueUrlRequest,
    ) -> Result<GetQueueUrlResponse, ServiceError>;

    async fn list_queues(
        &self,
        request: ListQueuesRequest,
    ) -> Result<ListQueuesResponse, ServiceError>;

    async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<SendMessageResponse, ServiceError>;

    async fn send_message_batch(
        &self,
        request: SendMessageBatchRequest,
    ) -> Result<SendMessageBatchResponse, ServiceError>;

    async fn receive_message(
        &self,
        request: ReceiveMessageRequest,
    ) -> Result<ReceiveMessageResponse, ServiceError>;

    async fn delete_message(
        &self,
        request: DeleteMessageRequest,
    ) -> Result<DeleteMessageResponse, ServiceError>;

    async fn change_message_visibility(
        &self,
        request: ChangeMessageVisibilityRequest,
    ) -> Result<ChangeMessageVisibilityResponse, ServiceError>;

    async fn purge_queue(
        &self,
        request: PurgeQueueRequest,
    ) -> Result<PurgeQueueResponse, ServiceError>;
}

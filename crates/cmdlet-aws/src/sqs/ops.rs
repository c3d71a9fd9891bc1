//! SQS operations: one parameter surface and one [`Operation`] impl each.
//!
//! Parameter structs double as the command-line surface (`clap::Args`) and as
//! the source for `^Name` pass-through projection (`Serialize`, wire names).

use super::model::*;
use super::SqsApi;
use crate::params::{parse_key_value, to_map};
use async_trait::async_trait;
use clap::Args;
use cmdlet_framework::{ConfirmImpact, Operation, Requirements, ServiceError};
use serde::Serialize;

// =============================================================================
// PERMISSIONS
// =============================================================================

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddPermissionParams {
    /// URL of the queue to change
    #[arg(long)]
    pub queue_url: Option<String>,
    /// Unique identifier for the permission
    #[arg(long)]
    pub label: Option<String>,
    /// Principal account ids granted the permission
    #[arg(long = "aws-account-id", value_delimiter = ',')]
    #[serde(rename = "AWSAccountId")]
    pub aws_account_id: Option<Vec<String>>,
    /// Actions granted, e.g. SendMessage
    #[arg(long, value_delimiter = ',')]
    pub action: Option<Vec<String>>,
}

pub struct AddPermission;

#[async_trait]
impl Operation for AddPermission {
    const NAME: &'static str = "AddPermission";
    const SERVICE: &'static str = super::SERVICE;
    const IMPACT: ConfirmImpact = ConfirmImpact::Medium;
    const RESPONSE_FIELDS: &'static [&'static str] = &[];
    const PASS_THROUGH: &'static [&'static str] = &["QueueUrl"];
    type Params = AddPermissionParams;
    type Request = AddPermissionRequest;
    type Response = AddPermissionResponse;
    type Client = dyn SqsApi;

    fn requirements(p: &Self::Params, req: &mut Requirements) {
        req.require("QueueUrl", &p.queue_url)
            .require("Label", &p.label)
            .require("AWSAccountId", &p.aws_account_id)
            .require("Action", &p.action);
    }

    fn assemble(p: &Self::Params) -> Self::Request {
        AddPermissionRequest {
            queue_url: p.queue_url.clone(),
            label: p.label.clone(),
            aws_account_ids: p.aws_account_id.clone(),
            actions: p.action.clone(),
        }
    }

    fn target(p: &Self::Params) -> String {
        p.queue_url.clone().unwrap_or_default()
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.add_permission(request).await
    }
}

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemovePermissionParams {
    #[arg(long)]
    pub queue_url: Option<String>,
    /// Label of the permission to revoke
    #[arg(long)]
    pub label: Option<String>,
}

pub struct RemovePermission;

#[async_trait]
impl Operation for RemovePermission {
    const NAME: &'static str = "RemovePermission";
    const SERVICE: &'static str = super::SERVICE;
    const IMPACT: ConfirmImpact = ConfirmImpact::High;
    const RESPONSE_FIELDS: &'static [&'static str] = &[];
    const PASS_THROUGH: &'static [&'static str] = &["QueueUrl"];
    type Params = RemovePermissionParams;
    type Request = RemovePermissionRequest;
    type Response = RemovePermissionResponse;
    type Client = dyn SqsApi;

    fn requirements(p: &Self::Params, req: &mut Requirements) {
        req.require("QueueUrl", &p.queue_url)
            .require("Label", &p.label);
    }

    fn assemble(p: &Self::Params) -> Self::Request {
        RemovePermissionRequest {
            queue_url: p.queue_url.clone(),
            label: p.label.clone(),
        }
    }

    fn target(p: &Self::Params) -> String {
        format!(
            "{} ({})",
            p.queue_url.as_deref().unwrap_or_default(),
            p.label.as_deref().unwrap_or_default()
        )
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.remove_permission(request).await
    }
}

// =============================================================================
// QUEUES
// =============================================================================

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateQueueParams {
    /// Name of the new queue
    #[arg(long)]
    pub queue_name: Option<String>,
    /// Queue attribute as Name=Value, e.g. VisibilityTimeout=60
    #[arg(long, value_parser = parse_key_value)]
    pub attribute: Option<Vec<(String, String)>>,
    /// Cost allocation tag as Key=Value
    #[arg(long, value_parser = parse_key_value)]
    pub tag: Option<Vec<(String, String)>>,
}

pub struct CreateQueue;

#[async_trait]
impl Operation for CreateQueue {
    const NAME: &'static str = "CreateQueue";
    const SERVICE: &'static str = super::SERVICE;
    const IMPACT: ConfirmImpact = ConfirmImpact::Medium;
    const DEFAULT_SELECT: &'static str = "QueueUrl";
    const RESPONSE_FIELDS: &'static [&'static str] = &["QueueUrl"];
    const PASS_THROUGH: &'static [&'static str] = &["QueueName"];
    type Params = CreateQueueParams;
    type Request = CreateQueueRequest;
    type Response = CreateQueueResponse;
    type Client = dyn SqsApi;

    fn requirements(p: &Self::Params, req: &mut Requirements) {
        req.require("QueueName", &p.queue_name);
    }

    fn assemble(p: &Self::Params) -> Self::Request {
        CreateQueueRequest {
            queue_name: p.queue_name.clone(),
            attributes: to_map(&p.attribute),
            tags: to_map(&p.tag),
        }
    }

    fn target(p: &Self::Params) -> String {
        p.queue_name.clone().unwrap_or_default()
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.create_queue(request).await
    }
}

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteQueueParams {
    #[arg(long)]
    pub queue_url: Option<String>,
}

pub struct DeleteQueue;

#[async_trait]
impl Operation for DeleteQueue {
    const NAME: &'static str = "DeleteQueue";
    const SERVICE: &'static str = super::SERVICE;
    const IMPACT: ConfirmImpact = ConfirmImpact::High;
    const RESPONSE_FIELDS: &'static [&'static str] = &[];
    const PASS_THROUGH: &'static [&'static str] = &["QueueUrl"];
    type Params = DeleteQueueParams;
    type Request = DeleteQueueRequest;
    type Response = DeleteQueueResponse;
    type Client = dyn SqsApi;

    fn requirements(p: &Self::Params, req: &mut Requirements) {
        req.require("QueueUrl", &p.queue_url);
    }

    fn assemble(p: &Self::Params) -> Self::Request {
        DeleteQueueRequest {
            queue_url: p.queue_url.clone(),
        }
    }

    fn target(p: &Self::Params) -> String {
        p.queue_url.clone().unwrap_or_default()
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.delete_queue(request).await
    }
}

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetQueueUrlParams {
    #[arg(long)]
    pub queue_name: Option<String>,
    /// Account that owns the queue, when it is not the caller's
    #[arg(long = "queue-owner-aws-account-id")]
    #[serde(rename = "QueueOwnerAWSAccountId")]
    pub queue_owner_aws_account_id: Option<String>,
}

pub struct GetQueueUrl;

#[async_trait]
impl Operation for GetQueueUrl {
    const NAME: &'static str = "GetQueueUrl";
    const SERVICE: &'static str = super::SERVICE;
    const DEFAULT_SELECT: &'static str = "QueueUrl";
    const RESPONSE_FIELDS: &'static [&'static str] = &["QueueUrl"];
    const PASS_THROUGH: &'static [&'static str] = &["QueueName"];
    type Params = GetQueueUrlParams;
    type Request = GetQueueUrlRequest;
    type Response = GetQueueUrlResponse;
    type Client = dyn SqsApi;

    fn requirements(p: &Self::Params, req: &mut Requirements) {
        req.require("QueueName", &p.queue_name);
    }

    fn assemble(p: &Self::Params) -> Self::Request {
        GetQueueUrlRequest {
            queue_name: p.queue_name.clone(),
            queue_owner_aws_account_id: p.queue_owner_aws_account_id.clone(),
        }
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.get_queue_url(request).await
    }
}

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListQueuesParams {
    /// Only list queues whose name starts with this prefix
    #[arg(long)]
    pub queue_name_prefix: Option<String>,
    /// Token from a previous page
    #[arg(long)]
    pub next_token: Option<String>,
    #[arg(long)]
    pub max_results: Option<i32>,
}

pub struct ListQueues;

#[async_trait]
impl Operation for ListQueues {
    const NAME: &'static str = "ListQueues";
    const SERVICE: &'static str = super::SERVICE;
    const DEFAULT_SELECT: &'static str = "QueueUrls";
    const RESPONSE_FIELDS: &'static [&'static str] = &["QueueUrls", "NextToken"];
    const PASS_THROUGH: &'static [&'static str] = &["QueueNamePrefix"];
    type Params = ListQueuesParams;
    type Request = ListQueuesRequest;
    type Response = ListQueuesResponse;
    type Client = dyn SqsApi;

    fn assemble(p: &Self::Params) -> Self::Request {
        ListQueuesRequest {
            queue_name_prefix: p.queue_name_prefix.clone(),
            next_token: p.next_token.clone(),
            max_results: p.max_results,
        }
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.list_queues(request).await
    }
}

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PurgeQueueParams {
    #[arg(long)]
    pub queue_url: Option<String>,
}

pub struct PurgeQueue;

#[async_trait]
impl Operation for PurgeQueue {
    const NAME: &'static str = "PurgeQueue";
    const SERVICE: &'static str = super::SERVICE;
    const IMPACT: ConfirmImpact = ConfirmImpact::High;
    const RESPONSE_FIELDS: &'static [&'static str] = &[];
    const PASS_THROUGH: &'static [&'static str] = &["QueueUrl"];
    type Params = PurgeQueueParams;
    type Request = PurgeQueueRequest;
    type Response = PurgeQueueResponse;
    type Client = dyn SqsApi;

    fn requirements(p: &Self::Params, req: &mut Requirements) {
        req.require("QueueUrl", &p.queue_url);
    }

    fn assemble(p: &Self::Params) -> Self::Request {
        PurgeQueueRequest {
            queue_url: p.queue_url.clone(),
        }
    }

    fn target(p: &Self::Params) -> String {
        p.queue_url.clone().unwrap_or_default()
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.purge_queue(request).await
    }
}

// =============================================================================
// MESSAGES
// =============================================================================

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendMessageParams {
    #[arg(long)]
    pub queue_url: Option<String>,
    #[arg(long)]
    pub message_body: Option<String>,
    /// Seconds before the message becomes visible
    #[arg(long)]
    pub delay_seconds: Option<i32>,
    /// String message attribute as Name=Value
    #[arg(long, value_parser = parse_key_value)]
    pub message_attribute: Option<Vec<(String, String)>>,
    /// FIFO queues only
    #[arg(long)]
    pub message_group_id: Option<String>,
    /// FIFO queues only
    #[arg(long)]
    pub message_deduplication_id: Option<String>,
}

pub struct SendMessage;

#[async_trait]
impl Operation for SendMessage {
    const NAME: &'static str = "SendMessage";
    const SERVICE: &'static str = super::SERVICE;
    const IMPACT: ConfirmImpact = ConfirmImpact::Medium;
    const RESPONSE_FIELDS: &'static [&'static str] = &["MessageId", "SequenceNumber"];
    const PASS_THROUGH: &'static [&'static str] = &["QueueUrl"];
    type Params = SendMessageParams;
    type Request = SendMessageRequest;
    type Response = SendMessageResponse;
    type Client = dyn SqsApi;

    fn requirements(p: &Self::Params, req: &mut Requirements) {
        req.require("QueueUrl", &p.queue_url)
            .require("MessageBody", &p.message_body);
    }

    fn assemble(p: &Self::Params) -> Self::Request {
        SendMessageRequest {
            queue_url: p.queue_url.clone(),
            message_body: p.message_body.clone(),
            delay_seconds: p.delay_seconds,
            message_attributes: p.message_attribute.as_ref().map(|attrs| {
                attrs
                    .iter()
                    .map(|(k, v)| (k.clone(), MessageAttributeValue::string(v.clone())))
                    .collect()
            }),
            message_group_id: p.message_group_id.clone(),
            message_deduplication_id: p.message_deduplication_id.clone(),
        }
    }

    fn target(p: &Self::Params) -> String {
        p.queue_url.clone().unwrap_or_default()
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.send_message(request).await
    }
}

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendMessageBatchParams {
    #[arg(long)]
    pub queue_url: Option<String>,
    /// Batch entry as Id=MessageBody; repeat for each message
    #[arg(long, value_parser = parse_key_value)]
    pub entry: Option<Vec<(String, String)>>,
    /// FIFO queues only; applies to every entry
    #[arg(long)]
    pub message_group_id: Option<String>,
    /// FIFO queues only; each entry gets `<value>-<Id>`
    #[arg(long)]
    pub message_deduplication_id: Option<String>,
}

pub struct SendMessageBatch;

#[async_trait]
impl Operation for SendMessageBatch {
    const NAME: &'static str = "SendMessageBatch";
    const SERVICE: &'static str = super::SERVICE;
    const IMPACT: ConfirmImpact = ConfirmImpact::Medium;
    const RESPONSE_FIELDS: &'static [&'static str] = &["Successful", "Failed"];
    const PASS_THROUGH: &'static [&'static str] = &["QueueUrl"];
    type Params = SendMessageBatchParams;
    type Request = SendMessageBatchRequest;
    type Response = SendMessageBatchResponse;
    type Client = dyn SqsApi;

    fn requirements(p: &Self::Params, req: &mut Requirements) {
        req.require("QueueUrl", &p.queue_url)
            .require("Entry", &p.entry);
    }

    fn assemble(p: &Self::Params) -> Self::Request {
        SendMessageBatchRequest {
            queue_url: p.queue_url.clone(),
            entries: p.entry.as_ref().map(|entries| {
                entries
                    .iter()
                    .map(|(id, body)| SendMessageBatchRequestEntry {
                        id: id.clone(),
                        message_body: body.clone(),
                        delay_seconds: None,
                        message_group_id: p.message_group_id.clone(),
                        message_deduplication_id: p
                            .message_deduplication_id
                            .as_ref()
                            .map(|dedup| format!("{dedup}-{id}")),
                    })
                    .collect()
            }),
        }
    }

    fn target(p: &Self::Params) -> String {
        p.queue_url.clone().unwrap_or_default()
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.send_message_batch(request).await
    }
}

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiveMessageParams {
    #[arg(long)]
    pub queue_url: Option<String>,
    /// 1 to 10
    #[arg(long)]
    pub max_number_of_messages: Option<i32>,
    /// Seconds the received messages stay hidden
    #[arg(long)]
    pub visibility_timeout: Option<i32>,
    /// Long-poll for up to this many seconds
    #[arg(long)]
    pub wait_time_seconds: Option<i32>,
    #[arg(long, value_delimiter = ',')]
    pub attribute_name: Option<Vec<String>>,
}

pub struct ReceiveMessage;

#[async_trait]
impl Operation for ReceiveMessage {
    const NAME: &'static str = "ReceiveMessage";
    const SERVICE: &'static str = super::SERVICE;
    const CANCELLABLE: bool = true;
    const DEFAULT_SELECT: &'static str = "Messages";
    const RESPONSE_FIELDS: &'static [&'static str] = &["Messages"];
    const PASS_THROUGH: &'static [&'static str] = &["QueueUrl"];
    type Params = ReceiveMessageParams;
    type Request = ReceiveMessageRequest;
    type Response = ReceiveMessageResponse;
    type Client = dyn SqsApi;

    fn requirements(p: &Self::Params, req: &mut Requirements) {
        req.require("QueueUrl", &p.queue_url);
    }

    fn assemble(p: &Self::Params) -> Self::Request {
        ReceiveMessageRequest {
            queue_url: p.queue_url.clone(),
            max_number_of_messages: p.max_number_of_messages,
            visibility_timeout: p.visibility_timeout,
            wait_time_seconds: p.wait_time_seconds,
            attribute_names: p.attribute_name.clone(),
        }
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.receive_message(request).await
    }
}

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteMessageParams {
    #[arg(long)]
    pub queue_url: Option<String>,
    /// Handle from the ReceiveMessage that returned the message
    #[arg(long)]
    pub receipt_handle: Option<String>,
}

pub struct DeleteMessage;

#[async_trait]
impl Operation for DeleteMessage {
    const NAME: &'static str = "DeleteMessage";
    const SERVICE: &'static str = super::SERVICE;
    const IMPACT: ConfirmImpact = ConfirmImpact::High;
    const RESPONSE_FIELDS: &'static [&'static str] = &[];
    const PASS_THROUGH: &'static [&'static str] = &["ReceiptHandle"];
    type Params = DeleteMessageParams;
    type Request = DeleteMessageRequest;
    type Response = DeleteMessageResponse;
    type Client = dyn SqsApi;

    fn requirements(p: &Self::Params, req: &mut Requirements) {
        req.require("QueueUrl", &p.queue_url)
            .require("ReceiptHandle", &p.receipt_handle);
    }

    fn assemble(p: &Self::Params) -> Self::Request {
        DeleteMessageRequest {
            queue_url: p.queue_url.clone(),
            receipt_handle: p.receipt_handle.clone(),
        }
    }

    fn target(p: &Self::Params) -> String {
        p.receipt_handle.clone().unwrap_or_default()
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.delete_message(request).await
    }
}

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeMessageVisibilityParams {
    #[arg(long)]
    pub queue_url: Option<String>,
    #[arg(long)]
    pub receipt_handle: Option<String>,
    /// New timeout in seconds; 0 makes the message visible immediately
    #[arg(long)]
    pub visibility_timeout: Option<i32>,
}

pub struct ChangeMessageVisibility;

#[async_trait]
impl Operation for ChangeMessageVisibility {
    const NAME: &'static str = "ChangeMessageVisibility";
    const SERVICE: &'static str = super::SERVICE;
    const IMPACT: ConfirmImpact = ConfirmImpact::Medium;
    const RESPONSE_FIELDS: &'static [&'static str] = &[];
    const PASS_THROUGH: &'static [&'static str] = &["ReceiptHandle"];
    type Params = ChangeMessageVisibilityParams;
    type Request = ChangeMessageVisibilityRequest;
    type Response = ChangeMessageVisibilityResponse;
    type Client = dyn SqsApi;

    fn requirements(p: &Self::Params, req: &mut Requirements) {
        req.require("QueueUrl", &p.queue_url)
            .require("ReceiptHandle", &p.receipt_handle)
            .require("VisibilityTimeout", &p.visibility_timeout);
    }

    fn assemble(p: &Self::Params) -> Self::Request {
        ChangeMessageVisibilityRequest {
            queue_url: p.queue_url.clone(),
            receipt_handle: p.receipt_handle.clone(),
            visibility_timeout: p.visibility_timeout,
        }
    }

    fn target(p: &Self::Params) -> String {
        p.receipt_handle.clone().unwrap_or_default()
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.change_message_visibility(request).await
    }
}

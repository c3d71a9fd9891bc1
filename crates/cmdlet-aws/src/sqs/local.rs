//! # Local SQS
//!
//! An in-process queue service. [`SqsState`] holds the queues and applies
//! requests synchronously; [`LocalSqs`] runs it inside a
//! [`LocalBackend`](cmdlet_framework::LocalBackend) and implements [`SqsApi`]
//! on top of it.
//!
//! Queue URLs look like `https://sqs.<region>.local/<account>/<name>`.
//! Delays and visibility timeouts are tracked with Tokio's clock.

use super::model::*;
use super::{SqsApi, NON_EXISTENT_QUEUE, SERVICE};
use async_trait::async_trait;
use chrono::Utc;
use cmdlet_framework::{LocalBackend, LocalHandle, Region, ServiceError};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

const DEFAULT_VISIBILITY_TIMEOUT: u64 = 30;
const MAX_VISIBILITY_TIMEOUT: i32 = 43_200;
const MAX_DELAY_SECONDS: i32 = 900;
const MAX_WAIT_TIME_SECONDS: i32 = 20;
const MAX_BATCH_ENTRIES: usize = 10;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn missing(parameter: &str) -> ServiceError {
    ServiceError::api(
        "MissingParameter",
        format!("The request must contain the parameter {parameter}."),
    )
}

fn invalid(parameter: &str, value: impl std::fmt::Display, reason: &str) -> ServiceError {
    ServiceError::api(
        "InvalidParameterValue",
        format!("Value {value} for parameter {parameter} is invalid. Reason: {reason}"),
    )
}

/// `now + seconds`, or an error when the instant cannot be represented.
fn after(now: Instant, seconds: u64, parameter: &str) -> Result<Instant, ServiceError> {
    now.checked_add(Duration::from_secs(seconds))
        .ok_or_else(|| invalid(parameter, seconds, "Out of range."))
}

fn required<'a>(parameter: &str, value: &'a Option<String>) -> Result<&'a str, ServiceError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(missing(parameter)),
    }
}

#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: String,
    body: String,
    attributes: BTreeMap<String, MessageAttributeValue>,
    sent_timestamp: i64,
    receive_count: u32,
    available_at: Instant,
}

#[derive(Debug, Clone)]
struct InFlight {
    seq: u64,
    message: StoredMessage,
    visible_at: Instant,
}

#[derive(Debug, Clone)]
struct Permission {
    accounts: Vec<String>,
    actions: Vec<String>,
}

#[derive(Debug)]
struct Queue {
    url: String,
    attributes: BTreeMap<String, String>,
    tags: BTreeMap<String, String>,
    permissions: BTreeMap<String, Permission>,
    visible: BTreeMap<u64, StoredMessage>,
    in_flight: HashMap<String, InFlight>,
}

impl Queue {
    fn is_fifo(&self) -> bool {
        self.url.ends_with(".fifo")
    }

    fn numeric_attribute(&self, name: &str, default: u64) -> u64 {
        self.attributes
            .get(name)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Returns messages whose visibility timeout ran out to the visible set.
    fn requeue_expired(&mut self, now: Instant) {
        let expired: Vec<String> = self
            .in_flight
            .iter()
            .filter(|(_, f)| f.visible_at <= now)
            .map(|(handle, _)| handle.clone())
            .collect();
        for handle in expired {
            if let Some(flight) = self.in_flight.remove(&handle) {
                self.visible.insert(flight.seq, flight.message);
            }
        }
    }
}

/// State of every queue in one region and account.
#[derive(Debug)]
pub struct SqsState {
    region: String,
    account_id: String,
    queues: BTreeMap<String, Queue>,
    next_seq: u64,
}

impl SqsState {
    pub fn new(region: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            account_id: account_id.into(),
            queues: BTreeMap::new(),
            next_seq: 1,
        }
    }

    fn queue_url(&self, name: &str) -> String {
        format!("https://sqs.{}.local/{}/{}", self.region, self.account_id, name)
    }

    fn queue_mut(&mut self, url: &Option<String>) -> Result<&mut Queue, ServiceError> {
        let url = required("QueueUrl", url)?;
        self.queues
            .values_mut()
            .find(|q| q.url == url)
            .ok_or_else(|| {
                ServiceError::api(NON_EXISTENT_QUEUE, "The specified queue does not exist.")
            })
    }

    pub fn add_permission(
        &mut self,
        request: AddPermissionRequest,
    ) -> Result<AddPermissionResponse, ServiceError> {
        let label = required("Label", &request.label)?.to_string();
        let accounts = request
            .aws_account_ids
            .filter(|a| !a.is_empty())
            .ok_or_else(|| missing("AWSAccountIds"))?;
        let actions = request
            .actions
            .filter(|a| !a.is_empty())
            .ok_or_else(|| missing("Actions"))?;
        let queue = self.queue_mut(&request.queue_url)?;
        if queue.permissions.contains_key(&label) {
            return Err(invalid("Label", &label, "Already exists."));
        }
        queue.permissions.insert(label, Permission { accounts, actions });
        Ok(AddPermissionResponse {})
    }

    pub fn remove_permission(
        &mut self,
        request: RemovePermissionRequest,
    ) -> Result<RemovePermissionResponse, ServiceError> {
        let label = required("Label", &request.label)?.to_string();
        let queue = self.queue_mut(&request.queue_url)?;
        if queue.permissions.remove(&label).is_none() {
            return Err(invalid("Label", &label, "can't find label."));
        }
        Ok(RemovePermissionResponse {})
    }

    pub fn create_queue(
        &mut self,
        request: CreateQueueRequest,
    ) -> Result<CreateQueueResponse, ServiceError> {
        let name = required("QueueName", &request.queue_name)?.to_string();
        let stem = name.strip_suffix(".fifo").unwrap_or(&name);
        if !(1..=80).contains(&stem.len())
            || !stem
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(invalid(
                "QueueName",
                &name,
                "Can only include alphanumeric characters, hyphens, or underscores. 1 to 80 in length",
            ));
        }

        let attributes = request.attributes.unwrap_or_default();
        for (key, max) in [
            ("VisibilityTimeout", MAX_VISIBILITY_TIMEOUT),
            ("DelaySeconds", MAX_DELAY_SECONDS),
        ] {
            if let Some(value) = attributes.get(key) {
                if !value.parse::<i32>().is_ok_and(|v| (0..=max).contains(&v)) {
                    return Err(ServiceError::api(
                        "InvalidAttributeValue",
                        format!("Invalid value for the parameter {key}."),
                    ));
                }
            }
        }

        if let Some(existing) = self.queues.get(&name) {
            if existing.attributes != attributes {
                return Err(ServiceError::api(
                    "QueueAlreadyExists",
                    "A queue already exists with the same name and a different value for attribute(s)",
                ));
            }
            return Ok(CreateQueueResponse {
                queue_url: Some(existing.url.clone()),
            });
        }

        let url = self.queue_url(&name);
        self.queues.insert(
            name,
            Queue {
                url: url.clone(),
                attributes,
                tags: request.tags.unwrap_or_default(),
                permissions: BTreeMap::new(),
                visible: BTreeMap::new(),
                in_flight: HashMap::new(),
            },
        );
        Ok(CreateQueueResponse {
            queue_url: Some(url),
        })
    }

    pub fn delete_queue(
        &mut self,
        request: DeleteQueueRequest,
    ) -> Result<DeleteQueueResponse, ServiceError> {
        let url = self.queue_mut(&request.queue_url)?.url.clone();
        self.queues.retain(|_, q| q.url != url);
        Ok(DeleteQueueResponse {})
    }

    pub fn get_queue_url(
        &self,
        request: GetQueueUrlRequest,
    ) -> Result<GetQueueUrlResponse, ServiceError> {
        let name = required("QueueName", &request.queue_name)?;
        if let Some(owner) = request.queue_owner_aws_account_id.as_deref() {
            if owner != self.account_id {
                return Err(ServiceError::api(
                    NON_EXISTENT_QUEUE,
                    "The specified queue does not exist.",
                ));
            }
        }
        self.queues
            .get(name)
            .map(|q| GetQueueUrlResponse {
                queue_url: Some(q.url.clone()),
            })
            .ok_or_else(|| {
                ServiceError::api(NON_EXISTENT_QUEUE, "The specified queue does not exist.")
            })
    }

    pub fn list_queues(&self, request: ListQueuesRequest) -> Result<ListQueuesResponse, ServiceError> {
        let prefix = request.queue_name_prefix.unwrap_or_default();
        let urls: Vec<String> = self
            .queues
            .iter()
            .filter(|(name, _)| name.starts_with(&prefix))
            .map(|(_, q)| q.url.clone())
            .collect();

        let start = match request.next_token.as_deref() {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .ok()
                .filter(|i| *i <= urls.len())
                .ok_or_else(|| invalid("NextToken", token, "Invalid token."))?,
        };

        let (page, next_token) = match request.max_results {
            None => (urls[start..].to_vec(), None),
            Some(max) if (1..=1000).contains(&max) => {
                let end = (start + max as usize).min(urls.len());
                let next = (end < urls.len()).then(|| end.to_string());
                (urls[start..end].to_vec(), next)
            }
            Some(max) => return Err(invalid("MaxResults", max, "Must be between 1 and 1000.")),
        };

        Ok(ListQueuesResponse {
            queue_urls: (!page.is_empty()).then_some(page),
            next_token,
        })
    }

    pub fn send_message(
        &mut self,
        request: SendMessageRequest,
        now: Instant,
    ) -> Result<SendMessageResponse, ServiceError> {
        let body = required("MessageBody", &request.message_body)?.to_string();
        let seq = self.next_seq;
        let queue = self.queue_mut(&request.queue_url)?;
        if queue.is_fifo() && request.message_group_id.is_none() {
            return Err(missing("MessageGroupId"));
        }
        let delay = match request.delay_seconds {
            Some(d) if !(0..=MAX_DELAY_SECONDS).contains(&d) => {
                return Err(invalid("DelaySeconds", d, "Must be between 0 and 900."))
            }
            Some(d) => d as u64,
            None => queue.numeric_attribute("DelaySeconds", 0),
        };

        let available_at = after(now, delay, "DelaySeconds")?;
        let message_id = uuid::Uuid::new_v4().to_string();
        let fifo = queue.is_fifo();
        queue.visible.insert(
            seq,
            StoredMessage {
                message_id: message_id.clone(),
                body,
                attributes: request.message_attributes.unwrap_or_default(),
                sent_timestamp: Utc::now().timestamp_millis(),
                receive_count: 0,
                available_at,
            },
        );
        self.next_seq += 1;
        Ok(SendMessageResponse {
            message_id: Some(message_id),
            sequence_number: fifo.then(|| format!("{seq:020}")),
        })
    }

    pub fn send_message_batch(
        &mut self,
        request: SendMessageBatchRequest,
        now: Instant,
    ) -> Result<SendMessageBatchResponse, ServiceError> {
        let entries = request.entries.unwrap_or_default();
        if entries.is_empty() {
            return Err(ServiceError::api(
                "AWS.SimpleQueueService.EmptyBatchRequest",
                "There should be at least one SendMessageBatchRequestEntry in the request.",
            ));
        }
        if entries.len() > MAX_BATCH_ENTRIES {
            return Err(ServiceError::api(
                "AWS.SimpleQueueService.TooManyEntriesInBatchRequest",
                format!("Maximum number of entries per request are {MAX_BATCH_ENTRIES}."),
            ));
        }
        let mut ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|w| w[0] == w[1]) {
            return Err(ServiceError::api(
                "AWS.SimpleQueueService.BatchEntryIdsNotDistinct",
                "Two or more batch entries in the request have the same Id.",
            ));
        }
        // Fail the whole batch up front on an unknown queue.
        self.queue_mut(&request.queue_url)?;

        let mut response = SendMessageBatchResponse::default();
        for entry in entries {
            let single = SendMessageRequest {
                queue_url: request.queue_url.clone(),
                message_body: Some(entry.message_body),
                delay_seconds: entry.delay_seconds,
                message_group_id: entry.message_group_id,
                message_deduplication_id: entry.message_deduplication_id,
                ..Default::default()
            };
            match self.send_message(single, now) {
                Ok(sent) => response.successful.push(SendMessageBatchResultEntry {
                    id: entry.id,
                    message_id: sent.message_id.unwrap_or_default(),
                }),
                Err(e) => response.failed.push(BatchResultErrorEntry {
                    id: entry.id,
                    code: e.code().unwrap_or("InternalError").to_string(),
                    message: e.to_string(),
                    sender_fault: true,
                }),
            }
        }
        Ok(response)
    }

    pub fn receive_message(
        &mut self,
        request: &ReceiveMessageRequest,
        now: Instant,
    ) -> Result<ReceiveMessageResponse, ServiceError> {
        let max = request.max_number_of_messages.unwrap_or(1);
        if !(1..=10).contains(&max) {
            return Err(invalid(
                "MaxNumberOfMessages",
                max,
                "Must be between 1 and 10, if provided.",
            ));
        }
        let names = request.attribute_names.clone().unwrap_or_default();
        let wants = |name: &str| names.iter().any(|n| n == "All" || n == name);

        let queue = self.queue_mut(&request.queue_url)?;
        let timeout = match request.visibility_timeout {
            Some(t) if !(0..=MAX_VISIBILITY_TIMEOUT).contains(&t) => {
                return Err(invalid(
                    "VisibilityTimeout",
                    t,
                    "Must be between 0 and 43200, if provided.",
                ))
            }
            Some(t) => t as u64,
            None => queue.numeric_attribute("VisibilityTimeout", DEFAULT_VISIBILITY_TIMEOUT),
        };
        let visible_at = after(now, timeout, "VisibilityTimeout")?;
        queue.requeue_expired(now);

        let ready: Vec<u64> = queue
            .visible
            .iter()
            .filter(|(_, m)| m.available_at <= now)
            .map(|(seq, _)| *seq)
            .take(max as usize)
            .collect();

        let mut messages = Vec::with_capacity(ready.len());
        for seq in ready {
            let Some(mut message) = queue.visible.remove(&seq) else {
                continue;
            };
            message.receive_count += 1;
            let receipt_handle = uuid::Uuid::new_v4().simple().to_string();

            let mut attributes = BTreeMap::new();
            if wants("SentTimestamp") {
                attributes.insert("SentTimestamp".into(), message.sent_timestamp.to_string());
            }
            if wants("ApproximateReceiveCount") {
                attributes.insert(
                    "ApproximateReceiveCount".into(),
                    message.receive_count.to_string(),
                );
            }
            messages.push(Message {
                message_id: message.message_id.clone(),
                receipt_handle: receipt_handle.clone(),
                body: message.body.clone(),
                attributes,
                message_attributes: message.attributes.clone(),
            });
            queue.in_flight.insert(
                receipt_handle,
                InFlight {
                    seq,
                    message,
                    visible_at,
                },
            );
        }

        Ok(ReceiveMessageResponse {
            messages: (!messages.is_empty()).then_some(messages),
        })
    }

    pub fn delete_message(
        &mut self,
        request: DeleteMessageRequest,
    ) -> Result<DeleteMessageResponse, ServiceError> {
        let handle = required("ReceiptHandle", &request.receipt_handle)?.to_string();
        let queue = self.queue_mut(&request.queue_url)?;
        queue.in_flight.remove(&handle).ok_or_else(|| {
            ServiceError::api(
                "ReceiptHandleIsInvalid",
                format!("The input receipt handle \"{handle}\" is not a valid receipt handle."),
            )
        })?;
        Ok(DeleteMessageResponse {})
    }

    pub fn change_message_visibility(
        &mut self,
        request: ChangeMessageVisibilityRequest,
        now: Instant,
    ) -> Result<ChangeMessageVisibilityResponse, ServiceError> {
        let handle = required("ReceiptHandle", &request.receipt_handle)?.to_string();
        let timeout = request
            .visibility_timeout
            .ok_or_else(|| missing("VisibilityTimeout"))?;
        if !(0..=MAX_VISIBILITY_TIMEOUT).contains(&timeout) {
            return Err(invalid(
                "VisibilityTimeout",
                timeout,
                "Must be between 0 and 43200.",
            ));
        }
        let queue = self.queue_mut(&request.queue_url)?;
        let flight = queue.in_flight.get_mut(&handle).ok_or_else(|| {
            ServiceError::api(
                "AWS.SimpleQueueService.MessageNotInflight",
                "The message referred to isn't in flight.",
            )
        })?;
        flight.visible_at = after(now, timeout as u64, "VisibilityTimeout")?;
        if timeout == 0 {
            queue.requeue_expired(now);
        }
        Ok(ChangeMessageVisibilityResponse {})
    }

    pub fn purge_queue(
        &mut self,
        request: PurgeQueueRequest,
    ) -> Result<PurgeQueueResponse, ServiceError> {
        let queue = self.queue_mut(&request.queue_url)?;
        let purged = queue.visible.len() + queue.in_flight.len();
        queue.visible.clear();
        queue.in_flight.clear();
        debug!(queue = %queue.url, purged, "Purged");
        Ok(PurgeQueueResponse {})
    }

    /// Number of messages that are visible or in flight.
    pub fn depth(&self, queue_name: &str) -> Option<usize> {
        self.queues
            .get(queue_name)
            .map(|q| q.visible.len() + q.in_flight.len())
    }

    /// Labels of the permissions granted on a queue.
    pub fn permission_labels(&self, queue_name: &str) -> Option<Vec<String>> {
        self.queues
            .get(queue_name)
            .map(|q| q.permissions.keys().cloned().collect())
    }

    pub fn tags(&self, queue_name: &str) -> Option<BTreeMap<String, String>> {
        self.queues.get(queue_name).map(|q| q.tags.clone())
    }
}

/// [`SqsApi`] backed by an in-process [`SqsState`].
#[derive(Clone)]
pub struct LocalSqs {
    region: String,
    handle: LocalHandle<SqsState>,
}

impl LocalSqs {
    /// Starts a backend for `region`. Must be called within a Tokio runtime.
    pub fn spawn(region: &Region, account_id: &str) -> Self {
        let (backend, handle) = LocalBackend::new(SqsState::new(region.as_str(), account_id), 64);
        tokio::spawn(backend.run(SERVICE));
        info!(%region, account_id, "Local SQS started");
        Self {
            region: region.to_string(),
            handle,
        }
    }

    /// Direct access to the state, for inspection.
    pub async fn inspect<R, F>(&self, f: F) -> Result<R, ServiceError>
    where
        R: Send + 'static,
        F: FnOnce(&SqsState) -> R + Send + 'static,
    {
        self.handle.exec(move |s| Ok(f(s))).await
    }
}

#[async_trait]
impl SqsApi for LocalSqs {
    #[instrument(skip_all, fields(region = %self.region))]
    async fn add_permission(
        &self,
        request: AddPermissionRequest,
    ) -> Result<AddPermissionResponse, ServiceError> {
        self.handle.exec(move |s| s.add_permission(request)).await
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn remove_permission(
        &self,
        request: RemovePermissionRequest,
    ) -> Result<RemovePermissionResponse, ServiceError> {
        self.handle.exec(move |s| s.remove_permission(request)).await
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn create_queue(
        &self,
        request: CreateQueueRequest,
    ) -> Result<CreateQueueResponse, ServiceError> {
        self.handle.exec(move |s| s.create_queue(request)).await
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn delete_queue(
        &self,
        request: DeleteQueueRequest,
    ) -> Result<DeleteQueueResponse, ServiceError> {
        self.handle.exec(move |s| s.delete_queue(request)).await
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn get_queue_url(
        &self,
        request: GetQueueUrlRequest,
    ) -> Result<GetQueueUrlResponse, ServiceError> {
        self.handle.exec(move |s| s.get_queue_url(request)).await
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn list_queues(
        &self,
        request: ListQueuesRequest,
    ) -> Result<ListQueuesResponse, ServiceError> {
        self.handle.exec(move |s| s.list_queues(request)).await
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<SendMessageResponse, ServiceError> {
        let now = Instant::now();
        self.handle.exec(move |s| s.send_message(request, now)).await
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn send_message_batch(
        &self,
        request: SendMessageBatchRequest,
    ) -> Result<SendMessageBatchResponse, ServiceError> {
        let now = Instant::now();
        self.handle
            .exec(move |s| s.send_message_batch(request, now))
            .await
    }

    /// Long-polls for up to `WaitTimeSeconds` when the queue is empty.
    #[instrument(skip_all, fields(region = %self.region))]
    async fn receive_message(
        &self,
        request: ReceiveMessageRequest,
    ) -> Result<ReceiveMessageResponse, ServiceError> {
        let wait = request.wait_time_seconds.unwrap_or(0);
        if !(0..=MAX_WAIT_TIME_SECONDS).contains(&wait) {
            return Err(invalid(
                "WaitTimeSeconds",
                wait,
                "Must be >= 0 and <= 20, if provided.",
            ));
        }
        let deadline = Instant::now() + Duration::from_secs(wait as u64);
        loop {
            let attempt = request.clone();
            let now = Instant::now();
            let response = self
                .handle
                .exec(move |s| s.receive_message(&attempt, now))
                .await?;
            if response.messages.is_some() || now >= deadline {
                return Ok(response);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn delete_message(
        &self,
        request: DeleteMessageRequest,
    ) -> Result<DeleteMessageResponse, ServiceError> {
        self.handle.exec(move |s| s.delete_message(request)).await
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn change_message_visibility(
        &self,
        request: ChangeMessageVisibilityRequest,
    ) -> Result<ChangeMessageVisibilityResponse, ServiceError> {
        let now = Instant::now();
        self.handle
            .exec(move |s| s.change_message_visibility(request, now))
            .await
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn purge_queue(
        &self,
        request: PurgeQueueRequest,
    ) -> Result<PurgeQueueResponse, ServiceError> {
        self.handle.exec(move |s| s.purge_queue(request)).await
    }
}

use async_trait::async_trait;
use cmdlet_framework::mock::MockService;
use cmdlet_framework::{
    cancel_pair, execute, AutoApprove, AutoDecline, ClientCache, ClientKey, ConfirmImpact,
    ConfirmRequest, ConfirmationGate, ContextBuilder, Dispatcher, InvokeError, Invoker, Operation,
    Outcome, Region, Requirements, Selector, ServiceError, TransportKind,
};
use serde::Serialize;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// --- A minimal queue service ---

#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendParams {
    queue_url: Option<String>,
    message_body: Option<String>,
    delay_seconds: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    queue_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delay_seconds: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendResponse {
    message_id: Option<String>,
    sequence_number: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PurgeParams {
    queue_url: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ReceiveParams {
    queue_url: Option<String>,
}

#[async_trait]
trait QueueApi: Send + Sync {
    async fn send(&self, request: SendRequest) -> Result<SendResponse, ServiceError>;
    async fn purge(&self, request: PurgeParams) -> Result<(), ServiceError>;
    async fn receive(&self, request: ReceiveParams) -> Result<Vec<String>, ServiceError>;
}

#[async_trait]
impl QueueApi for MockService {
    async fn send(&self, request: SendRequest) -> Result<SendResponse, ServiceError> {
        self.respond("SendMessage", &request)
    }
    async fn purge(&self, request: PurgeParams) -> Result<(), ServiceError> {
        self.respond("PurgeQueue", &request)
    }
    async fn receive(&self, request: ReceiveParams) -> Result<Vec<String>, ServiceError> {
        self.respond("ReceiveMessage", &request)
    }
}

/// Long poll that never returns.
struct Stalled;

#[async_trait]
impl QueueApi for Stalled {
    async fn send(&self, _: SendRequest) -> Result<SendResponse, ServiceError> {
        std::future::pending().await
    }
    async fn purge(&self, _: PurgeParams) -> Result<(), ServiceError> {
        std::future::pending().await
    }
    async fn receive(&self, _: ReceiveParams) -> Result<Vec<String>, ServiceError> {
        std::future::pending().await
    }
}

struct SendMessage;

#[async_trait]
impl Operation for SendMessage {
    const NAME: &'static str = "SendMessage";
    const SERVICE: &'static str = "sqs";
    const IMPACT: ConfirmImpact = ConfirmImpact::Medium;
    const RESPONSE_FIELDS: &'static [&'static str] = &["MessageId", "SequenceNumber"];
    const PASS_THROUGH: &'static [&'static str] = &["QueueUrl"];
    type Params = SendParams;
    type Request = SendRequest;
    type Response = SendResponse;
    type Client = dyn QueueApi;

    fn requirements(p: &SendParams, req: &mut Requirements) {
        req.require("QueueUrl", &p.queue_url)
            .require("MessageBody", &p.message_body);
    }

    fn assemble(p: &SendParams) -> SendRequest {
        SendRequest {
            queue_url: p.queue_url.clone(),
            message_body: p.message_body.clone(),
            delay_seconds: p.delay_seconds,
        }
    }

    async fn call(client: &Self::Client, request: SendRequest) -> Result<SendResponse, ServiceError> {
        client.send(request).await
    }
}

struct PurgeQueue;

#[async_trait]
impl Operation for PurgeQueue {
    const NAME: &'static str = "PurgeQueue";
    const SERVICE: &'static str = "sqs";
    const IMPACT: ConfirmImpact = ConfirmImpact::High;
    const RESPONSE_FIELDS: &'static [&'static str] = &[];
    type Params = PurgeParams;
    type Request = PurgeParams;
    type Response = ();
    type Client = dyn QueueApi;

    fn assemble(p: &PurgeParams) -> PurgeParams {
        PurgeParams {
            queue_url: p.queue_url.clone(),
        }
    }

    fn target(p: &PurgeParams) -> String {
        p.queue_url.clone().unwrap_or_default()
    }

    async fn call(client: &Self::Client, request: PurgeParams) -> Result<(), ServiceError> {
        client.purge(request).await
    }
}

struct ReceiveMessage;

#[async_trait]
impl Operation for ReceiveMessage {
    const NAME: &'static str = "ReceiveMessage";
    const SERVICE: &'static str = "sqs";
    const CANCELLABLE: bool = true;
    const RESPONSE_FIELDS: &'static [&'static str] = &[];
    type Params = ReceiveParams;
    type Request = ReceiveParams;
    type Response = Vec<String>;
    type Client = dyn QueueApi;

    fn assemble(p: &ReceiveParams) -> ReceiveParams {
        ReceiveParams {
            queue_url: p.queue_url.clone(),
        }
    }

    async fn call(client: &Self::Client, request: ReceiveParams) -> Result<Vec<String>, ServiceError> {
        client.receive(request).await
    }
}

/// Approves everything and counts how often it was asked.
#[derive(Default)]
struct CountingGate(AtomicUsize);

impl ConfirmationGate for CountingGate {
    fn confirm(&self, _request: &ConfirmRequest) -> bool {
        self.0.fetch_add(1, Ordering::SeqCst);
        true
    }
}

// --- Helpers ---

fn mock_cache(mock: &MockService) -> Arc<ClientCache<dyn QueueApi>> {
    let mock = mock.clone();
    Arc::new(ClientCache::new(
        move |_: &ClientKey| -> Result<Arc<dyn QueueApi>, ServiceError> { Ok(Arc::new(mock.clone())) },
    ))
}

fn invoker(mock: &MockService) -> Invoker<dyn QueueApi> {
    Invoker::new(Dispatcher::new(mock_cache(mock)), Arc::new(AutoApprove))
}

fn send_params() -> SendParams {
    SendParams {
        queue_url: Some("https://queue.example/q1".into()),
        message_body: Some("hello".into()),
        delay_seconds: None,
    }
}

fn sent() -> SendResponse {
    SendResponse {
        message_id: Some("m-1".into()),
        sequence_number: None,
    }
}

// --- Tests ---

#[tokio::test]
async fn test_default_selector_emits_whole_response() {
    let mock = MockService::new();
    mock.expect("SendMessage").return_ok(sent());

    let ctx = ContextBuilder::new(send_params())
        .region(Region::new("us-east-1"))
        .build::<SendMessage>();
    let outcome = invoker(&mock).invoke::<SendMessage>(&ctx, None).await.unwrap();

    assert_eq!(
        outcome,
        Outcome::Emitted(json!({"MessageId": "m-1", "SequenceNumber": null}))
    );
    // Unbound DelaySeconds never reaches the wire.
    assert_eq!(
        mock.last_request(),
        Some(json!({"QueueUrl": "https://queue.example/q1", "MessageBody": "hello"}))
    );
    mock.verify();
}

#[tokio::test]
async fn test_assembly_is_idempotent() {
    let ctx = ContextBuilder::new(send_params()).build::<SendMessage>();
    assert_eq!(
        SendMessage::assemble(ctx.params()),
        SendMessage::assemble(ctx.params())
    );
}

#[tokio::test]
async fn test_missing_required_parameter_still_dispatches() {
    let mock = MockService::new();
    mock.expect("SendMessage")
        .return_err(ServiceError::api("MissingParameter", "MessageBody is required"));

    let params = SendParams {
        message_body: Some(String::new()),
        ..send_params()
    };
    let ctx = ContextBuilder::new(params)
        .region(Region::new("us-east-1"))
        .build::<SendMessage>();
    assert_eq!(ctx.diagnostics().len(), 1);

    let err = invoker(&mock)
        .invoke::<SendMessage>(&ctx, None)
        .await
        .unwrap_err();
    // The remote API's verdict comes back unchanged.
    assert!(matches!(
        err,
        InvokeError::Service(ServiceError::Api { ref code, .. }) if code == "MissingParameter"
    ));
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_transport_failure_is_single_attempt_and_names_endpoint() {
    let mock = MockService::new();
    mock.expect("SendMessage").return_err(ServiceError::transport(
        TransportKind::NameResolution,
        "sqs.nowhere-1.amazonaws.com",
        "no such host",
    ));

    let ctx = ContextBuilder::new(send_params())
        .region(Region::new("nowhere-1"))
        .build::<SendMessage>();
    let err = invoker(&mock)
        .invoke::<SendMessage>(&ctx, None)
        .await
        .unwrap_err();

    assert_eq!(mock.call_count(), 1);
    assert_eq!(err.category(), "ConnectionError");
    let message = err.to_string();
    assert!(message.contains("sqs.nowhere-1.amazonaws.com"));
    assert!(message.contains("nowhere-1"));
    assert!(message.contains("SendMessage"));
}

#[tokio::test]
async fn test_declined_confirmation_sends_nothing() {
    let mock = MockService::new();
    let invoker = Invoker::new(Dispatcher::new(mock_cache(&mock)), Arc::new(AutoDecline));

    let ctx = ContextBuilder::new(PurgeParams {
        queue_url: Some("https://queue.example/q1".into()),
    })
    .region(Region::new("us-east-1"))
    .build::<PurgeQueue>();
    let outcome = invoker.invoke::<PurgeQueue>(&ctx, None).await.unwrap();

    assert_eq!(outcome, Outcome::Declined);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_force_and_threshold_bypass_gate() {
    let mock = MockService::new();
    mock.expect("PurgeQueue").return_ok(());
    mock.expect("SendMessage").return_ok(sent());
    let invoker = Invoker::new(Dispatcher::new(mock_cache(&mock)), Arc::new(AutoDecline))
        .with_threshold(ConfirmImpact::High);

    let purge = ContextBuilder::new(PurgeParams {
        queue_url: Some("https://queue.example/q1".into()),
    })
    .region(Region::new("us-east-1"))
    .force(true)
    .build::<PurgeQueue>();
    assert!(invoker.invoke::<PurgeQueue>(&purge, None).await.unwrap().value().is_some());

    // Medium impact is below the High threshold.
    let send = ContextBuilder::new(send_params())
        .region(Region::new("us-east-1"))
        .build::<SendMessage>();
    assert!(matches!(
        invoker.invoke::<SendMessage>(&send, None).await.unwrap(),
        Outcome::Emitted(_)
    ));
    mock.verify();
}

#[tokio::test]
async fn test_selector_modes_are_exclusive() {
    let mock = MockService::new();
    mock.expect("SendMessage").return_ok(sent());
    mock.expect("SendMessage").return_ok(sent());
    let invoker = invoker(&mock);

    let field = ContextBuilder::new(send_params())
        .region(Region::new("us-east-1"))
        .selector(Selector::Field("SequenceNumber".into()))
        .build::<SendMessage>();
    assert_eq!(
        invoker.invoke::<SendMessage>(&field, None).await.unwrap(),
        Outcome::Emitted(serde_json::Value::Null)
    );

    let passed = ContextBuilder::new(send_params())
        .region(Region::new("us-east-1"))
        .selector(Selector::PassThrough("QueueUrl".into()))
        .build::<SendMessage>();
    assert_eq!(
        invoker.invoke::<SendMessage>(&passed, None).await.unwrap(),
        Outcome::Emitted(json!("https://queue.example/q1"))
    );
}

#[tokio::test]
async fn test_invalid_selector_fails_before_dispatch() {
    let mock = MockService::new();
    let ctx = ContextBuilder::new(send_params())
        .region(Region::new("us-east-1"))
        .selector(Selector::Field("ReceiptHandle".into()))
        .build::<SendMessage>();
    let err = invoker(&mock)
        .invoke::<SendMessage>(&ctx, None)
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::InvalidSelector { .. }));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_missing_region_fails_before_client_creation() {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();
    let cache: ClientCache<dyn QueueApi> = ClientCache::new(
        move |_: &ClientKey| -> Result<Arc<dyn QueueApi>, ServiceError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(MockService::new()))
        },
    );
    let invoker: Invoker<dyn QueueApi> =
        Invoker::new(Dispatcher::new(Arc::new(cache)), Arc::new(AutoApprove));

    let ctx = ContextBuilder::new(send_params()).build::<SendMessage>();
    let err = invoker.invoke::<SendMessage>(&ctx, None).await.unwrap_err();
    assert!(matches!(err, InvokeError::MissingRegion { .. }));
    assert_eq!(created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_region_fails_before_confirmation() {
    let mock = MockService::new();
    let gate = Arc::new(CountingGate::default());
    let invoker = Invoker::new(Dispatcher::new(mock_cache(&mock)), gate.clone());

    let ctx = ContextBuilder::new(PurgeParams {
        queue_url: Some("https://queue.example/q1".into()),
    })
    .build::<PurgeQueue>();
    let err = invoker.invoke::<PurgeQueue>(&ctx, None).await.unwrap_err();

    assert!(matches!(err, InvokeError::MissingRegion { .. }));
    assert_eq!(gate.0.load(Ordering::SeqCst), 0);
    assert_eq!(mock.call_count(), 0);

    let ctx = ContextBuilder::new(PurgeParams {
        queue_url: Some("https://queue.example/q1".into()),
    })
    .region(Region::new("us-east-1"))
    .build::<PurgeQueue>();
    mock.expect("PurgeQueue").return_ok(());
    invoker.invoke::<PurgeQueue>(&ctx, None).await.unwrap();
    assert_eq!(gate.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_client_reused_across_invocations() {
    let mock = MockService::new();
    mock.expect("SendMessage").return_ok(sent());
    mock.expect("SendMessage").return_ok(sent());
    mock.expect("SendMessage").return_ok(sent());
    let invoker = invoker(&mock);

    for region in ["us-east-1", "us-east-1", "eu-west-1"] {
        let ctx = ContextBuilder::new(send_params())
            .region(Region::new(region))
            .build::<SendMessage>();
        invoker.invoke::<SendMessage>(&ctx, None).await.unwrap();
    }
    assert_eq!(invoker.dispatcher().cache().len(), 2);
}

#[tokio::test]
async fn test_cancel_abandons_long_poll() {
    let cache: ClientCache<dyn QueueApi> = ClientCache::new(
        |_: &ClientKey| -> Result<Arc<dyn QueueApi>, ServiceError> { Ok(Arc::new(Stalled)) },
    );
    let invoker: Invoker<dyn QueueApi> =
        Invoker::new(Dispatcher::new(Arc::new(cache)), Arc::new(AutoApprove));
    let ctx = ContextBuilder::new(ReceiveParams {
        queue_url: Some("https://queue.example/q1".into()),
    })
    .region(Region::new("us-east-1"))
    .build::<ReceiveMessage>();

    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        invoker.invoke::<ReceiveMessage>(&ctx, Some(&signal)),
    )
    .await
    .expect("cancellation should end the call");
    assert!(matches!(result, Err(InvokeError::Cancelled { .. })));
}

#[tokio::test]
async fn test_cancel_ignored_by_non_cancellable_operation() {
    let mock = MockService::new();
    mock.expect("SendMessage").return_ok(sent());
    let ctx = ContextBuilder::new(send_params())
        .region(Region::new("us-east-1"))
        .build::<SendMessage>();

    let (handle, signal) = cancel_pair();
    handle.cancel();
    assert!(signal.is_cancelled());

    let outcome = invoker(&mock)
        .invoke::<SendMessage>(&ctx, Some(&signal))
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Emitted(_)));
    assert_eq!(mock.call_count(), 1);
    mock.verify();
}

#[test]
fn test_invoke_blocking_outside_runtime() {
    let mock = MockService::new();
    mock.expect("SendMessage").return_ok(sent());
    let ctx = ContextBuilder::new(send_params())
        .region(Region::new("us-east-1"))
        .selector(Selector::Field("MessageId".into()))
        .build::<SendMessage>();

    let outcome = invoker(&mock).invoke_blocking::<SendMessage>(&ctx).unwrap();
    assert_eq!(outcome, Outcome::Emitted(json!("m-1")));
}

#[test]
fn test_hooks_run_around_requirement_check() {
    let ctx = ContextBuilder::new(SendParams::default())
        .pre_hook(|p| p.queue_url = Some("https://queue.example/q1".into()))
        .post_hook(|p| p.delay_seconds = Some(5))
        .build::<SendMessage>();

    // QueueUrl was filled before the check, MessageBody was not.
    assert_eq!(ctx.diagnostics().len(), 1);
    assert_eq!(ctx.diagnostics()[0].parameter, "MessageBody");
    assert_eq!(ctx.params().delay_seconds, Some(5));
}

#[test]
fn test_generic_execute() {
    let ctx = ContextBuilder::new(send_params()).build::<SendMessage>();
    let calls = AtomicUsize::new(0);
    let out: Result<String, ServiceError> = execute(
        &ctx,
        SendMessage::assemble,
        |req| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(SendResponse {
                message_id: req.message_body,
                sequence_number: None,
            })
        },
        |resp, _params| resp.message_id.unwrap_or_default(),
    );
    assert_eq!(out.unwrap(), "hello");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

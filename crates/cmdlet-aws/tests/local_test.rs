use cmdlet_aws::cli::run_session;
use cmdlet_aws::config::Settings;
use cmdlet_aws::host::{Host, InvocationOptions};
use cmdlet_aws::pinpoint_email::ops::*;
use cmdlet_aws::sqs::ops::*;
use cmdlet_framework::{cancel_pair, AutoDecline, InvokeError, Outcome};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn settings() -> Settings {
    Settings {
        region: Some("us-east-1".into()),
        ..Default::default()
    }
}

fn forced() -> InvocationOptions {
    InvocationOptions {
        force: true,
        ..Default::default()
    }
}

fn emitted(outcome: Outcome) -> Value {
    match outcome {
        Outcome::Emitted(value) => value,
        Outcome::Declined => panic!("unexpected decline"),
    }
}

#[tokio::test]
async fn test_queue_message_lifecycle() {
    let host = Host::local(&settings(), Arc::new(AutoDecline));

    let url = emitted(
        host.run::<CreateQueue>(
            CreateQueueParams {
                queue_name: Some("orders".into()),
                ..Default::default()
            },
            &forced(),
            None,
        )
        .await
        .unwrap(),
    );
    assert_eq!(url, json!("https://sqs.us-east-1.local/000000000000/orders"));
    let queue_url = url.as_str().map(str::to_string);

    host.run::<SendMessage>(
        SendMessageParams {
            queue_url: queue_url.clone(),
            message_body: Some("order 1".into()),
            message_attribute: Some(vec![("kind".into(), "new".into())]),
            ..Default::default()
        },
        &forced(),
        None,
    )
    .await
    .unwrap();

    let messages = emitted(
        host.run::<ReceiveMessage>(
            ReceiveMessageParams {
                queue_url: queue_url.clone(),
                attribute_name: Some(vec!["All".into()]),
                ..Default::default()
            },
            &InvocationOptions::default(),
            None,
        )
        .await
        .unwrap(),
    );
    let message = &messages[0];
    assert_eq!(message["Body"], json!("order 1"));
    assert_eq!(message["Attributes"]["ApproximateReceiveCount"], json!("1"));
    assert_eq!(
        message["MessageAttributes"]["kind"],
        json!({"DataType": "String", "StringValue": "new"})
    );

    // Without --force the gate declines and the message stays in flight.
    let declined = host
        .run::<DeleteMessage>(
            DeleteMessageParams {
                queue_url: queue_url.clone(),
                receipt_handle: message["ReceiptHandle"].as_str().map(str::to_string),
            },
            &InvocationOptions::default(),
            None,
        )
        .await
        .unwrap();
    assert_eq!(declined, Outcome::Declined);

    host.run::<DeleteMessage>(
        DeleteMessageParams {
            queue_url: queue_url.clone(),
            receipt_handle: message["ReceiptHandle"].as_str().map(str::to_string),
        },
        &forced(),
        None,
    )
    .await
    .unwrap();

    let err = host
        .run::<DeleteMessage>(
            DeleteMessageParams {
                queue_url,
                receipt_handle: message["ReceiptHandle"].as_str().map(str::to_string),
            },
            &forced(),
            None,
        )
        .await
        .unwrap_err();
    match err {
        InvokeError::Service(e) => assert_eq!(e.code(), Some("ReceiptHandleIsInvalid")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_regions_get_separate_backends() {
    let host = Host::local(&settings(), Arc::new(AutoDecline));
    let create = |region: &str| InvocationOptions {
        region: Some(region.into()),
        force: true,
        ..Default::default()
    };

    for region in ["us-east-1", "eu-west-1"] {
        host.run::<CreateQueue>(
            CreateQueueParams {
                queue_name: Some("shared".into()),
                ..Default::default()
            },
            &create(region),
            None,
        )
        .await
        .unwrap();
    }

    let listed = emitted(
        host.run::<ListQueues>(
            ListQueuesParams::default(),
            &InvocationOptions {
                region: Some("eu-west-1".into()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap(),
    );
    assert_eq!(listed, json!(["https://sqs.eu-west-1.local/000000000000/shared"]));
    assert_eq!(host.sqs().dispatcher().cache().len(), 2);
}

#[tokio::test]
async fn test_long_poll_can_be_cancelled() {
    let host = Host::local(&settings(), Arc::new(AutoDecline));
    let url = emitted(
        host.run::<CreateQueue>(
            CreateQueueParams {
                queue_name: Some("idle".into()),
                ..Default::default()
            },
            &forced(),
            None,
        )
        .await
        .unwrap(),
    );

    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.cancel();
    });

    let err = host
        .run::<ReceiveMessage>(
            ReceiveMessageParams {
                queue_url: url.as_str().map(str::to_string),
                wait_time_seconds: Some(20),
                ..Default::default()
            },
            &InvocationOptions::default(),
            Some(&signal),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::Cancelled { .. }));
}

#[tokio::test]
async fn test_email_flow() {
    let host = Host::local(&settings(), Arc::new(AutoDecline));

    let identity = emitted(
        host.run::<CreateEmailIdentity>(
            CreateEmailIdentityParams {
                email_identity: Some("example.com".into()),
                ..Default::default()
            },
            &forced(),
            None,
        )
        .await
        .unwrap(),
    );
    assert_eq!(
        identity,
        json!({"IdentityType": "DOMAIN", "VerifiedForSendingStatus": true})
    );

    let message_id = emitted(
        host.run::<SendEmail>(
            SendEmailParams {
                from_email_address: Some("news@example.com".into()),
                destination_to_addresses: Some(vec!["reader@example.org".into()]),
                content_raw_data: Some("Subject: hi\r\n\r\nbody".into()),
                ..Default::default()
            },
            &forced(),
            None,
        )
        .await
        .unwrap(),
    );
    assert!(message_id.is_string());

    let quota = emitted(
        host.run::<GetAccount>(
            GetAccountParams {},
            &InvocationOptions {
                select: Some("SendQuota".into()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap(),
    );
    assert_eq!(quota["SentLast24Hours"], json!(1.0));
}

#[tokio::test]
async fn test_session_shares_backend_between_lines() {
    let host = Host::local(&settings(), Arc::new(AutoDecline));
    let script = "\
# set up
sqs create-queue --queue-name jobs --force
sqs send-message --queue-url https://sqs.us-east-1.local/000000000000/jobs --message-body 'first job' --force --select ^QueueUrl
sqs receive-message --queue-url https://sqs.us-east-1.local/000000000000/jobs --select Messages
sqs purge-queue --queue-url https://sqs.us-east-1.local/000000000000/jobs
sqs get-queue-url --queue-name missing
sqs no-such-operation
";
    let mut out = Vec::new();
    let mut err = Vec::new();

    let failures = run_session(
        &host,
        &InvocationOptions::default(),
        script.as_bytes(),
        &mut out,
        &mut err,
    )
    .await
    .unwrap();

    let out = String::from_utf8(out).unwrap();
    let lines: Vec<Value> = out
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], json!("https://sqs.us-east-1.local/000000000000/jobs"));
    assert_eq!(lines[1], json!("https://sqs.us-east-1.local/000000000000/jobs"));
    assert_eq!(lines[2][0]["Body"], json!("first job"));

    // purge-queue without --force is declined silently; the two bad lines fail.
    assert_eq!(failures, 2);
    let err = String::from_utf8(err).unwrap();
    let records: Vec<&str> = err.lines().filter(|l| l.starts_with('{')).collect();
    let first: Value = serde_json::from_str(records[0]).unwrap();
    assert_eq!(first["Operation"], json!("GetQueueUrl"));
    assert_eq!(first["Category"], json!("InvalidOperation"));
    assert!(first["Message"]
        .as_str()
        .unwrap()
        .contains("AWS.SimpleQueueService.NonExistentQueue"));
    assert_eq!(host.sqs().dispatcher().cache().len(), 1);
}

#[tokio::test]
async fn test_session_rejects_process_flags_on_a_line() {
    let host = Host::local(&settings(), Arc::new(AutoDecline));
    let script = "\
sqs create-queue --queue-name held --force
sqs purge-queue --queue-url https://sqs.us-east-1.local/000000000000/held --confirm-impact none
";
    let mut out = Vec::new();
    let mut err = Vec::new();

    let failures = run_session(
        &host,
        &InvocationOptions::default(),
        script.as_bytes(),
        &mut out,
        &mut err,
    )
    .await
    .unwrap();

    assert_eq!(failures, 1);
    assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    let err = String::from_utf8(err).unwrap();
    let record: Value = err
        .lines()
        .find(|l| l.starts_with('{'))
        .map(|l| serde_json::from_str(l).unwrap())
        .unwrap();
    assert_eq!(record["Operation"], json!("session"));
    assert!(record["Message"]
        .as_str()
        .unwrap()
        .contains("--confirm-impact"));
}

//! Decision client against an in-process fake decision service.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use skirmish_engine::client::{ClientSettings, DecisionClient, FailureKind, MAX_REPLY_BYTES};
use skirmish_types::{
    ActionHead, ActionMask, ActionVector, DecisionRequest, HEAD_COUNT, OBSERVATION_SIZE,
    ObservationVector, options,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

const ZEROS: &str = r#"{"action":[0,0,0,0,0,0,0,0,0,0,0,0]}"#;

/// What the fake service does with the next request line.
enum Reply {
    Line(&'static str),
    Flood(usize),
    Silent,
    Hangup,
}

/// Serve `script` one request line at a time. Every received line is
/// forwarded to the returned channel.
async fn fake_service(script: Vec<Reply>) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut script = script.into_iter();
        'accept: loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let (reader, mut writer) = stream.into_split();
            let mut lines = BufReader::new(reader).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let _ = seen_tx.send(line);
                match script.next() {
                    Some(Reply::Line(reply)) => {
                        writer.write_all(reply.as_bytes()).await.unwrap();
                        writer.write_all(b"\n").await.unwrap();
                    }
                    Some(Reply::Flood(bytes)) => {
                        let _ = writer.write_all(&vec![b' '; bytes]).await;
                    }
                    Some(Reply::Silent) => {}
                    Some(Reply::Hangup) | None => continue 'accept,
                }
            }
        }
    });
    (address, seen_rx)
}

fn client(address: String, request_timeout_ms: u64) -> DecisionClient {
    DecisionClient::new(ClientSettings {
        address,
        connect_timeout: Duration::from_millis(200),
        request_timeout: Duration::from_millis(request_timeout_ms),
        model: "test-model".to_owned(),
        deterministic: true,
        return_log_prob: false,
        return_entropy: false,
        return_value: false,
        return_probs: false,
    })
}

fn request(client: &DecisionClient) -> DecisionRequest {
    client.build_request(vec![ObservationVector::zeroed()], ActionMask::no_ops_only())
}

#[tokio::test]
async fn all_zero_reply_is_accepted() {
    let (address, mut seen) = fake_service(vec![Reply::Line(ZEROS)]).await;
    let mut client = client(address, 500);
    let result = client.decide(&request(&client)).await;

    assert!(result.is_success());
    assert_eq!(result.action, ActionVector::no_op());
    assert!(client.is_connected());

    let line = seen.recv().await.unwrap();
    let sent: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(sent["model"], "test-model");
    assert_eq!(sent["deterministic"], true);
    assert_eq!(sent["actionMasks"].as_array().unwrap().len(), HEAD_COUNT);
    assert_eq!(sent["obs"].as_array().unwrap().len(), 1);
    assert_eq!(sent["obs"][0].as_array().unwrap().len(), OBSERVATION_SIZE);
}

#[tokio::test]
async fn selected_options_are_returned_per_head() {
    let (address, _seen) = fake_service(vec![Reply::Line(
        r#"{"action":[1,0,0,0,0,0,0,0,0,0,0,3],"logProb":-0.25}"#,
    )])
    .await;
    let mut client = client(address, 500);
    let result = client.decide(&request(&client)).await;

    assert!(result.is_success());
    assert_eq!(result.action.get(ActionHead::Attack), options::ATTACK_MELEE);
    assert_eq!(result.action.get(ActionHead::Prayer), options::PRAY_MELEE);
}

#[tokio::test]
async fn short_action_array_falls_back_to_no_op() {
    let (address, _seen) = fake_service(vec![Reply::Line(r#"{"action":[1,0,0]}"#)]).await;
    let mut client = client(address, 500);
    let result = client.decide(&request(&client)).await;

    assert_eq!(result.action, ActionVector::no_op());
    assert_eq!(result.failure, Some(FailureKind::ContractViolation));
    assert!(client.is_connected());
}

#[tokio::test]
async fn out_of_range_option_falls_back_to_no_op() {
    let (address, _seen) =
        fake_service(vec![Reply::Line(r#"{"action":[7,0,0,0,0,0,0,0,0,0,0,0]}"#)]).await;
    let mut client = client(address, 500);
    let result = client.decide(&request(&client)).await;

    assert_eq!(result.action, ActionVector::no_op());
    assert_eq!(result.failure, Some(FailureKind::ContractViolation));
}

#[tokio::test]
async fn malformed_reply_falls_back_to_no_op() {
    let (address, _seen) = fake_service(vec![Reply::Line("not json")]).await;
    let mut client = client(address, 500);
    let result = client.decide(&request(&client)).await;

    assert_eq!(result.action, ActionVector::no_op());
    assert_eq!(result.failure, Some(FailureKind::ContractViolation));
}

#[tokio::test]
async fn silent_service_times_out_and_drops_connection() {
    let (address, _seen) = fake_service(vec![Reply::Silent]).await;
    let mut client = client(address, 100);
    let result = client.decide(&request(&client)).await;

    assert_eq!(result.action, ActionVector::no_op());
    assert_eq!(result.failure, Some(FailureKind::Timeout));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn unreachable_service_is_a_connection_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    drop(listener);

    let mut client = client(address, 100);
    let result = client.decide(&request(&client)).await;

    assert_eq!(result.action, ActionVector::no_op());
    assert_eq!(result.failure, Some(FailureKind::Connection));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn reconnects_lazily_after_hangup() {
    let (address, mut seen) = fake_service(vec![Reply::Hangup, Reply::Line(ZEROS)]).await;
    let mut client = client(address, 500);

    let first = client.decide(&request(&client)).await;
    assert_eq!(first.failure, Some(FailureKind::Connection));
    assert!(!client.is_connected());

    let second = client.decide(&request(&client)).await;
    assert!(second.is_success());
    assert!(client.is_connected());

    assert!(seen.recv().await.is_some());
    assert!(seen.recv().await.is_some());
}

#[tokio::test]
async fn oversized_reply_is_cut_off_and_drops_connection() {
    let flood = usize::try_from(MAX_REPLY_BYTES).unwrap().saturating_mul(2);
    let (address, _seen) = fake_service(vec![Reply::Flood(flood), Reply::Line(ZEROS)]).await;
    let mut client = client(address, 1_000);

    let result = client.decide(&request(&client)).await;
    assert_eq!(result.failure, Some(FailureKind::ContractViolation));
    assert_eq!(result.action, ActionVector::no_op());
    assert!(!client.is_connected());

    let result = client.decide(&request(&client)).await;
    assert!(result.is_success());
}

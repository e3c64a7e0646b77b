/*!
 * Integration tests for the message bridge and the line-based server
 */

use std::collections::HashMap;
use std::sync::Arc;

use promptlens::app_config::Config;
use promptlens::app_controller::{Controller, MALFORMED_MESSAGE};
use promptlens::bridge::{
    Acknowledgment, ChannelPort, InboundMessage, MessageBridge, OutboundMessage, TaskDefaults,
};
use promptlens::dispatcher::HttpDispatcher;
use promptlens::providers::ProviderId;
use promptlens::providers::mock::MockDispatcher;
use promptlens::task::NormalizedEvent;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{chunk, config_at, error, sse_json_body};

fn mock_controller(dispatcher: MockDispatcher) -> Controller {
    let mut config = Config::default();
    config.mock.enabled = true;
    Controller::with_dispatcher(config, Arc::new(dispatcher))
}

async fn serve_lines(controller: &Controller, input: &str) -> Vec<Value> {
    serve_bytes(controller, input.as_bytes()).await
}

async fn serve_bytes(controller: &Controller, input: &[u8]) -> Vec<Value> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    controller.serve(input, tx).await.unwrap();

    let mut lines = Vec::new();
    while let Some(line) = rx.recv().await {
        lines.push(serde_json::from_str(&line).unwrap());
    }
    lines
}

#[tokio::test]
async fn test_bridge_httpDispatch_shouldAckThenRelayEvents() {
    let server = MockServer::start().await;
    let body = sse_json_body(&[
        json!({ "choices": [{ "delta": { "content": "Bon" } }] }),
        json!({ "choices": [{ "delta": { "content": "jour" } }] }),
    ]) + "data: [DONE]\n\n";
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let bridge = MessageBridge::new(Arc::new(HttpDispatcher::new()), TaskDefaults::default());
    let message = InboundMessage {
        action: "translate".to_string(),
        text: "Hello".to_string(),
        config: Some(config_at(ProviderId::OpenAI, server.uri())),
        target_language: Some("fr".to_string()),
        request_id: Some("req-1".to_string()),
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut ack = None;
    let relay = bridge
        .handle(message, Arc::new(ChannelPort::new(tx)), |a| ack = Some(a))
        .expect("accepted");

    assert_eq!(ack, Some(Acknowledgment::streaming(Some("req-1".to_string()))));

    let stats = relay.await.unwrap();
    assert_eq!(stats.delivered, 3);
    assert_eq!(stats.dropped, 0);

    let mut relayed = Vec::new();
    while let Some(message) = rx.recv().await {
        relayed.push(message);
    }
    assert_eq!(
        relayed,
        vec![
            OutboundMessage::Stream { request_id: Some("req-1".to_string()), data: chunk("Bon") },
            OutboundMessage::Stream { request_id: Some("req-1".to_string()), data: chunk("jour") },
            OutboundMessage::Stream { request_id: Some("req-1".to_string()), data: NormalizedEvent::Done },
        ]
    );
}

#[tokio::test]
async fn test_bridge_providerFailure_shouldRelaySingleError() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let bridge = MessageBridge::new(Arc::new(HttpDispatcher::new()), TaskDefaults::default());
    let message = InboundMessage {
        action: "summarize".to_string(),
        text: "Long article".to_string(),
        config: Some(config_at(ProviderId::Anthropic, server.uri())),
        target_language: None,
        request_id: None,
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut ack = None;
    let relay = bridge.handle(message, Arc::new(ChannelPort::new(tx)), |a| ack = Some(a)).unwrap();
    relay.await.unwrap();

    let ack = ack.unwrap();
    assert!(ack.success);
    let request_id = ack.request_id.expect("generated request id");

    let relayed = rx.recv().await.unwrap();
    assert_eq!(relayed.event(), &error("Summarization failed"));
    assert_eq!(relayed, OutboundMessage::Stream { request_id: Some(request_id), data: error("Summarization failed") });
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_serve_mockDispatcher_shouldWriteAckBeforeStream() {
    let controller = mock_controller(MockDispatcher::working());
    let input = concat!(
        r#"{"action":"translate","text":"Thank you","requestId":"a","config":{"providerId":"openai"}}"#,
        "\n",
        r#"{"action":"summarize","text":"Short text to summarize","requestId":"b"}"#,
        "\n",
    );

    let lines = serve_lines(&controller, input).await;

    let mut by_request: HashMap<String, Vec<Value>> = HashMap::new();
    for line in lines {
        let id = line["requestId"].as_str().unwrap().to_string();
        by_request.entry(id).or_default().push(line);
    }

    for id in ["a", "b"] {
        let lines = &by_request[id];
        assert_eq!(lines[0], json!({ "success": true, "streaming": true, "requestId": id }));
        assert!(lines[1..].iter().all(|line| line["type"] == "stream"));
        assert_eq!(lines.last().unwrap()["data"], json!({ "type": "done" }));
    }

    let texts: Vec<&str> = by_request["a"][1..]
        .iter()
        .filter_map(|line| line["data"]["text"].as_str())
        .collect();
    assert_eq!(texts.concat(), "Cảm ơn bạn");
}

#[tokio::test]
async fn test_serve_rejectedLines_shouldOnlyAcknowledge() {
    let controller = mock_controller(MockDispatcher::working());
    let input = "not json\n\n{\"action\":\"rewrite\",\"text\":\"x\",\"requestId\":\"r\"}\n{\"action\":\"translate\",\"text\":\"\",\"requestId\":\"e\"}\n";

    let lines = serve_lines(&controller, input).await;

    assert_eq!(
        lines,
        vec![
            json!({ "success": false, "error": MALFORMED_MESSAGE }),
            json!({ "success": false, "error": "Unknown action", "requestId": "r" }),
            json!({ "success": false, "error": "No text provided", "requestId": "e" }),
        ]
    );
}

#[tokio::test]
async fn test_serve_invalidUtf8Line_shouldRejectAndKeepServing() {
    let controller = mock_controller(MockDispatcher::working());
    let input = b"\xff\xfe garbage\n{\"action\":\"translate\",\"text\":\"Thank you\",\"requestId\":\"after\",\"config\":{\"providerId\":\"openai\"}}\n";

    let lines = serve_bytes(&controller, input).await;

    assert_eq!(lines[0], json!({ "success": false, "error": MALFORMED_MESSAGE }));
    assert_eq!(lines[1], json!({ "success": true, "streaming": true, "requestId": "after" }));
    assert_eq!(lines.last().unwrap()["data"], json!({ "type": "done" }));

    let texts: Vec<&str> = lines[2..]
        .iter()
        .filter_map(|line| line["data"]["text"].as_str())
        .collect();
    assert_eq!(texts.concat(), "Cảm ơn bạn");
}

#[tokio::test]
async fn test_serve_manySequentialRequests_shouldTallyEveryRelay() {
    let controller = mock_controller(MockDispatcher::working());
    let input: String = (0..20)
        .map(|i| format!("{{\"action\":\"translate\",\"text\":\"Hello world\",\"requestId\":\"r{}\"}}\n", i))
        .collect();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let stats = controller.serve(input.as_bytes(), tx).await.unwrap();

    let mut written = 0;
    while rx.recv().await.is_some() {
        written += 1;
    }
    assert_eq!(stats.dropped, 0);
    assert_eq!(stats.delivered + 20, written);
}

#[tokio::test]
async fn test_serve_failingDispatcher_shouldRelayFixedError() {
    let controller = mock_controller(MockDispatcher::failing());
    let lines = serve_lines(&controller, "{\"action\":\"translate\",\"text\":\"Hi\",\"requestId\":\"x\"}\n").await;

    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[1],
        json!({ "type": "stream", "requestId": "x", "data": { "type": "error", "error": "Translation failed" } })
    );
}

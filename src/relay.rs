use anyhow::Result;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::event_log::EventLog;
use crate::line::{
    Event, MessageContent, MessageEvent, MessagingApi, OutboundMessage, ReplyMessageRequest,
};

/// Outcome of an operation whose failure is logged and then dropped:
/// it never reaches the HTTP response or stops sibling events.
pub type BestEffort = Result<()>;

/// Reply to a text message with the same text. Every other event is ignored.
pub async fn echo(api: &dyn MessagingApi, event: &Event) -> BestEffort {
    let (reply_token, text) = match event {
        Event::Message(MessageEvent {
            reply_token,
            message,
            ..
        }) => match message {
            MessageContent::Text { text, .. } => (reply_token, text),
            MessageContent::Image { .. }
            | MessageContent::Video { .. }
            | MessageContent::Audio { .. }
            | MessageContent::File { .. }
            | MessageContent::Location { .. }
            | MessageContent::Sticker { .. }
            | MessageContent::Unknown => return Ok(()),
        },
        Event::Follow(_)
        | Event::Unfollow(_)
        | Event::Join(_)
        | Event::Leave(_)
        | Event::MemberJoined(_)
        | Event::MemberLeft(_)
        | Event::Postback(_)
        | Event::Unsend(_)
        | Event::Unknown => return Ok(()),
    };

    let Some(reply_token) = reply_token else {
        warn!("Text message without reply token, not echoing");
        return Ok(());
    };

    debug!("Echoing {} bytes", text.len());
    api.reply_message(&ReplyMessageRequest {
        reply_token: reply_token.clone(),
        messages: vec![OutboundMessage::text(text.clone())],
    })
    .await
}

/// Log then echo each event of a verified batch, in order.
pub async fn handle_events(log: &EventLog, api: &dyn MessagingApi, events: &[Value]) {
    info!("Handling {} events", events.len());

    for raw in events {
        if let Err(e) = log.append(raw) {
            warn!("Event log append failed: {:#}", e);
        }

        let event = match Event::from_value(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!("Unrecognized webhook event: {}", e);
                continue;
            }
        };

        if let Err(e) = echo(api, &event).await {
            warn!("Reply to {} event failed: {:#}", event.kind(), e);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingApi;
    use super::*;
    use serde_json::json;

    fn text_event(token: &str, text: &str) -> Value {
        json!({
            "type": "message",
            "replyToken": token,
            "source": {"type": "user", "userId": "U1"},
            "timestamp": 1,
            "message": {"type": "text", "id": "m1", "text": text}
        })
    }

    fn image_event(token: &str) -> Value {
        json!({
            "type": "message",
            "replyToken": token,
            "timestamp": 2,
            "message": {"type": "image", "id": "m2"}
        })
    }

    fn log_lines(path: &std::path::Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_echo_replies_verbatim() {
        let api = RecordingApi::default();
        let text = "  héllo 👋\nworld  ";
        let event = Event::from_value(&text_event("tok1", text)).unwrap();

        echo(&api, &event).await.unwrap();

        let replies = api.replies.lock().await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].reply_token, "tok1");
        assert_eq!(replies[0].messages, vec![OutboundMessage::text(text)]);
    }

    #[tokio::test]
    async fn test_echo_ignores_non_text() {
        let api = RecordingApi::default();
        let follow = Event::from_value(&json!({"type": "follow", "replyToken": "t"})).unwrap();
        let image = Event::from_value(&image_event("tok2")).unwrap();

        echo(&api, &follow).await.unwrap();
        echo(&api, &image).await.unwrap();

        assert!(api.replies.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_echo_without_reply_token_is_skipped() {
        let api = RecordingApi::default();
        let event = Event::from_value(&json!({
            "type": "message",
            "mode": "standby",
            "message": {"type": "text", "id": "m", "text": "hi"}
        }))
        .unwrap();

        echo(&api, &event).await.unwrap();
        assert!(api.replies.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_text_and_image_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let log = EventLog::open(&path).unwrap();
        let api = RecordingApi::default();
        let events = vec![text_event("tok1", "hi"), image_event("tok2")];

        handle_events(&log, &api, &events).await;

        assert_eq!(log_lines(&path), events);
        let replies = api.replies.lock().await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].reply_token, "tok1");
        assert_eq!(replies[0].messages, vec![OutboundMessage::text("hi")]);
    }

    #[tokio::test]
    async fn test_reply_failure_does_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let log = EventLog::open(&path).unwrap();
        let api = RecordingApi::failing();
        let events = vec![
            text_event("tok1", "one"),
            json!({"type": "leave"}),
            text_event("tok3", "three"),
        ];

        handle_events(&log, &api, &events).await;

        assert_eq!(log_lines(&path).len(), 3);
        let tokens: Vec<String> = api
            .replies
            .lock()
            .await
            .iter()
            .map(|r| r.reply_token.clone())
            .collect();
        assert_eq!(tokens, vec!["tok1", "tok3"]);
    }

    #[tokio::test]
    async fn test_malformed_event_is_logged_not_replied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let log = EventLog::open(&path).unwrap();
        let api = RecordingApi::default();
        // message event missing its "message" object
        let events = vec![json!({"type": "message", "replyToken": "tok"}), json!("bare")];

        handle_events(&log, &api, &events).await;

        assert_eq!(log_lines(&path), events);
        assert!(api.replies.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_text_from_unmodelled_source_is_echoed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let log = EventLog::open(&path).unwrap();
        let api = RecordingApi::default();
        let events = vec![json!({
            "type": "message",
            "replyToken": "tok1",
            "source": {"type": "channel"},
            "message": {"type": "text", "id": "m1", "text": "hi"}
        })];

        handle_events(&log, &api, &events).await;

        let replies = api.replies.lock().await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].reply_token, "tok1");
        assert_eq!(replies[0].messages, vec![OutboundMessage::text("hi")]);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_log_write_failure_does_not_stop_replies() {
        let log = EventLog::open(std::path::Path::new("/dev/full")).unwrap();
        let api = RecordingApi::default();
        let events = vec![text_event("tok1", "one"), text_event("tok2", "two")];

        assert!(log.append(&events[0]).is_err());

        handle_events(&log, &api, &events).await;

        let tokens: Vec<String> = api
            .replies
            .lock()
            .await
            .iter()
            .map(|r| r.reply_token.clone())
            .collect();
        assert_eq!(tokens, vec!["tok1", "tok2"]);
    }
}

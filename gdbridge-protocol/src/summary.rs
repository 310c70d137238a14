//! Best-effort JSON-RPC summaries of frame payloads, for logging only.

use serde_json::Value;
use std::fmt;

/// A one-line description of a frame payload.
///
/// Deriving a summary never fails: payloads that are not JSON objects are
/// summarized as [`MessageSummary::Unparseable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSummary {
    /// A message with a method and an id.
    Request { method: String, id: String },
    /// A message with a method and no id.
    Notification { method: String },
    /// A message carrying `result` or `error`.
    Response { id: String, is_error: bool },
    /// Valid JSON that matches none of the shapes above.
    Unknown,
    /// Payload that is not a JSON object.
    Unparseable { len: usize },
}

impl MessageSummary {
    pub fn from_payload(payload: &[u8]) -> Self {
        let msg = match serde_json::from_slice::<Value>(payload) {
            Ok(Value::Object(map)) => map,
            _ => return MessageSummary::Unparseable { len: payload.len() },
        };

        let id = msg.get("id").map(render_id);
        if let Some(method) = msg.get("method").and_then(Value::as_str) {
            let method = method.to_string();
            return match id {
                Some(id) => MessageSummary::Request { method, id },
                None => MessageSummary::Notification { method },
            };
        }

        if msg.contains_key("result") || msg.contains_key("error") {
            return MessageSummary::Response {
                id: id.unwrap_or_default(),
                is_error: msg.contains_key("error"),
            };
        }

        MessageSummary::Unknown
    }
}

fn render_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for MessageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageSummary::Request { method, id } => write!(f, "method={} id={}", method, id),
            MessageSummary::Notification { method } => write!(f, "method={}", method),
            MessageSummary::Response { id, is_error: false } => write!(f, "response id={}", id),
            MessageSummary::Response { id, is_error: true } => {
                write!(f, "error response id={}", id)
            }
            MessageSummary::Unknown => write!(f, "unknown message"),
            MessageSummary::Unparseable { len } => write!(f, "(unparseable, {} bytes)", len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request() {
        let summary =
            MessageSummary::from_payload(br#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#);
        assert_eq!(
            summary,
            MessageSummary::Request {
                method: "initialize".into(),
                id: "1".into()
            }
        );
        assert_eq!(summary.to_string(), "method=initialize id=1");
    }

    #[test]
    fn test_string_id() {
        let summary = MessageSummary::from_payload(br#"{"id":"abc","method":"shutdown"}"#);
        assert_eq!(summary.to_string(), "method=shutdown id=abc");
    }

    #[test]
    fn test_notification() {
        let summary = MessageSummary::from_payload(
            br#"{"jsonrpc":"2.0","method":"textDocument/didOpen","params":{}}"#,
        );
        assert_eq!(
            summary,
            MessageSummary::Notification {
                method: "textDocument/didOpen".into()
            }
        );
    }

    #[test]
    fn test_responses() {
        let ok = MessageSummary::from_payload(br#"{"jsonrpc":"2.0","id":7,"result":null}"#);
        assert_eq!(ok.to_string(), "response id=7");

        let err = MessageSummary::from_payload(
            br#"{"jsonrpc":"2.0","id":8,"error":{"code":-32601,"message":"nope"}}"#,
        );
        assert_eq!(
            err,
            MessageSummary::Response {
                id: "8".into(),
                is_error: true
            }
        );
    }

    #[test]
    fn test_unknown_and_unparseable() {
        assert_eq!(
            MessageSummary::from_payload(br#"{"jsonrpc":"2.0"}"#),
            MessageSummary::Unknown
        );
        assert_eq!(
            MessageSummary::from_payload(b"\xff\xfe not json"),
            MessageSummary::Unparseable { len: 11 }
        );
        assert_eq!(
            MessageSummary::from_payload(b"[1,2,3]").to_string(),
            "(unparseable, 7 bytes)"
        );
    }
}

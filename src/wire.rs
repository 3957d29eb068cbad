//! Newline-delimited JSON over TCP.
//!
//! One request per line, one reply line per request, in order. Malformed
//! JSON gets an `error` reply instead of dropping the connection; oversized
//! lines terminate it.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::debug;

use crate::limits::MAX_LINE_LEN;
use crate::model::{AiResponse, Turn, UserQuery};
use crate::router::Assistant;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    /// One user message for the assistant.
    Message(UserQuery),
    /// Poll for a proactive occupancy tip.
    Insight { session_id: Option<String> },
    /// The recorded transcript for a (user, session) pair.
    History { user_id: String, session_id: String },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerReply {
    Message(AiResponse),
    Insight { text: Option<String> },
    History { turns: Vec<Turn> },
    Error { message: String },
}

/// Serve one client until it disconnects.
pub async fn process_connection(
    stream: TcpStream,
    assistant: Arc<Assistant>,
) -> Result<(), LinesCodecError> {
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LEN));

    while let Some(line) = framed.next().await.transpose()? {
        let reply = match serde_json::from_str::<ClientRequest>(&line) {
            Ok(request) => dispatch(request, &assistant).await,
            Err(err) => {
                debug!(error = %err, "unparseable request line");
                ServerReply::Error {
                    message: format!("invalid request: {err}"),
                }
            }
        };
        let encoded = serde_json::to_string(&reply)
            .unwrap_or_else(|err| format!(r#"{{"type":"error","message":"{err}"}}"#));
        framed.send(encoded).await?;
    }
    Ok(())
}

async fn dispatch(request: ClientRequest, assistant: &Assistant) -> ServerReply {
    match request {
        ClientRequest::Message(query) => {
            ServerReply::Message(assistant.handle_message(&query).await)
        }
        ClientRequest::Insight { session_id } => ServerReply::Insight {
            text: assistant.ambient_insight(session_id.as_deref().unwrap_or("default")),
        },
        ClientRequest::History {
            user_id,
            session_id,
        } => ServerReply::History {
            turns: assistant.history(&user_id, &session_id).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_request_decodes() {
        let line = r#"{"type":"message","text":"hello","session_id":"s1","user_id":"u1"}"#;
        let req: ClientRequest = serde_json::from_str(line).unwrap();
        match req {
            ClientRequest::Message(q) => {
                assert_eq!(q.text, "hello");
                assert_eq!(q.session(), "s1");
                assert!(q.user_email.is_none());
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn insight_request_allows_missing_session() {
        let req: ClientRequest = serde_json::from_str(r#"{"type":"insight"}"#).unwrap();
        assert!(matches!(req, ClientRequest::Insight { session_id: None }));
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ClientRequest>(r#"{"type":"shutdown"}"#).is_err());
    }

    #[test]
    fn replies_are_tagged() {
        let reply = ServerReply::Insight { text: None };
        let json = serde_json::to_string(&reply).unwrap();
        assert_eq!(json, r#"{"type":"insight","text":null}"#);

        let reply = ServerReply::Error {
            message: "bad".to_string(),
        };
        let json = serde_json::to_string(&reply).unwrap();
        assert!(json.contains(r#""type":"error""#));
    }
}

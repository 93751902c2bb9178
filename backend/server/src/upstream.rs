//! # Ingestion Backend
//!
//! The external processing service that actually performs ingestion. We only
//! start runs on it; progress is tracked by whoever updates the `status` column.
//!
//! ## Contract
//!
//! - Request: `POST <INGESTION_BACKEND_URL>` with `{ "message": string }`
//! - Response: `{ "pid": string | number, "message": string }`, read loosely
//! - Errors: any non-2xx, ideally with `{ "message": string }` in the body
//!
//! One attempt per trigger, no retries and no timeout beyond the client default.
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Serialize)]
struct StartIngestion<'a> {
    message: &'a str,
}

/// Reply of a 2xx `start-ingestion` call. Both fields are kept as raw JSON
/// and interpreted loosely, a body that is not a JSON object has neither.
#[derive(Debug, Clone, Default)]
pub struct IngestionAck {
    pub pid: Option<Value>,
    pub message: Option<Value>,
}

impl IngestionAck {
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(mut fields)) => Self {
                pid: fields.remove("pid"),
                message: fields.remove("message"),
            },
            _ => Self::default(),
        }
    }

    /// Numbers are rendered in decimal and `true` as `"true"`. Empty strings,
    /// zero, `false`, `null`, arrays and objects count as no identifier.
    pub fn process_id(&self) -> Option<String> {
        match self.pid.as_ref()? {
            Value::String(pid) if !pid.is_empty() => Some(pid.clone()),
            Value::Number(pid) if pid.as_f64() != Some(0.0) => Some(pid.to_string()),
            Value::Bool(true) => Some("true".to_string()),
            _ => None,
        }
    }

    /// Strings are used verbatim, other JSON values in their JSON form.
    pub fn message_text(&self) -> String {
        match &self.message {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("{0}")]
    Unreachable(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("{0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    pub fn cause(&self) -> String {
        let cause = self.to_string();

        if cause.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            cause
        }
    }
}

#[async_trait]
pub trait IngestionBackend: Send + Sync {
    async fn start_ingestion(&self, message: &str) -> Result<IngestionAck, UpstreamError>;
}

pub struct HttpBackend {
    client: Client,
    url: String,
}

impl HttpBackend {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl IngestionBackend for HttpBackend {
    async fn start_ingestion(&self, message: &str) -> Result<IngestionAck, UpstreamError> {
        let res = self
            .client
            .post(&self.url)
            .json(&StartIngestion { message })
            .send()
            .await
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;

        let status = res.status();

        #[cfg(feature = "verbose")]
        tracing::debug!("Ingestion backend status: {status}");

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();

            return Err(UpstreamError::Rejected {
                status: status.as_u16(),
                message: error_message(&body)
                    .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16())),
            });
        }

        let body = res
            .text()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;

        Ok(IngestionAck::from_body(&body))
    }
}

/// Pulls `message` out of a JSON error body. Array messages are joined with `,`.
fn error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;

    let message = match json.get("message")? {
        Value::String(message) => message.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(","),
        _ => return None,
    };

    (!message.is_empty()).then_some(message)
}

#[cfg(test)]
pub(crate) mod stub {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Replays a fixed reply and counts calls.
    pub struct StubBackend {
        reply: Result<IngestionAck, UpstreamError>,
        pub calls: AtomicUsize,
    }

    impl StubBackend {
        pub fn started(pid: Value, message: &str) -> Self {
            Self::replying(Ok(IngestionAck {
                pid: Some(pid),
                message: Some(Value::String(message.to_string())),
            }))
        }

        pub fn without_pid(message: &str) -> Self {
            Self::replying(Ok(IngestionAck {
                pid: None,
                message: Some(Value::String(message.to_string())),
            }))
        }

        pub fn failing(err: UpstreamError) -> Self {
            Self::replying(Err(err))
        }

        fn replying(reply: Result<IngestionAck, UpstreamError>) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl IngestionBackend for StubBackend {
        async fn start_ingestion(&self, _message: &str) -> Result<IngestionAck, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }
}

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::generation::parameters::FormatType;
use ollama_rs::Ollama;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// One generation request: the file's current name plus its text content.
#[derive(Debug, Clone)]
pub struct NameRequest {
    pub original_name: String,
    pub content: String,
}

/// Structured answer the oracle is asked to produce. Streamed responses are
/// re-parsed as they accumulate, so intermediate elements may not carry a
/// name yet; the last element of the stream is authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamePartial {
    pub new_name: Option<String>,
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("generation request failed: {0}")]
    Request(String),
    #[error("generation stream failed: {0}")]
    Stream(String),
}

pub type PartialStream = Pin<Box<dyn Stream<Item = Result<NamePartial, OracleError>> + Send>>;

/// A single-use generation session. Consumed by one `generate` call;
/// concurrent reuse is ruled out by taking `self` by value.
#[async_trait]
pub trait OracleSession: Send {
    async fn generate(self: Box<Self>, request: NameRequest) -> Result<PartialStream, OracleError>;
}

/// Factory handing out one fresh session per outstanding request.
pub trait NamingOracle: Send + Sync {
    fn new_session(&self) -> Box<dyn OracleSession>;
}

/// Ollama-backed oracle. Each session owns its own client so no connection
/// state is shared between concurrent requests.
#[derive(Debug, Clone)]
pub struct OllamaOracle {
    host: String,
    port: u16,
    model: String,
}

impl OllamaOracle {
    pub fn new(host: impl Into<String>, port: u16, model: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            model: model.into(),
        }
    }

    /// Reads `OLLAMA_HOST`, `OLLAMA_PORT` and `SMART_RENAME_MODEL`, falling
    /// back to a local default install.
    pub fn from_env() -> Self {
        let host = std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost".to_string());
        let port = std::env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(11434);
        let model =
            std::env::var("SMART_RENAME_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Self::new(host, port, model)
    }
}

impl NamingOracle for OllamaOracle {
    fn new_session(&self) -> Box<dyn OracleSession> {
        Box::new(OllamaSession {
            client: Ollama::new(self.host.clone(), self.port),
            model: self.model.clone(),
        })
    }
}

struct OllamaSession {
    client: Ollama,
    model: String,
}

#[async_trait]
impl OracleSession for OllamaSession {
    async fn generate(self: Box<Self>, request: NameRequest) -> Result<PartialStream, OracleError> {
        let prompt = build_prompt(&request);
        debug!(file = %request.original_name, model = %self.model, "requesting name suggestion");
        let generation =
            GenerationRequest::new(self.model.clone(), prompt).format(FormatType::Json);
        let stream = self
            .client
            .generate_stream(generation)
            .await
            .map_err(|e| OracleError::Request(e.to_string()))?;

        // Chunks are text fragments of one JSON object. Re-parse the running
        // buffer per chunk; until the object is complete the partial carries
        // no name.
        let mut buffer = String::new();
        let partials = stream.map(move |chunk| match chunk {
            Ok(responses) => {
                for piece in responses {
                    buffer.push_str(&piece.response);
                }
                Ok(parse_partial(&buffer))
            }
            Err(e) => Err(OracleError::Stream(e.to_string())),
        });
        Ok(Box::pin(partials))
    }
}

fn parse_partial(buffer: &str) -> NamePartial {
    serde_json::from_str(buffer).unwrap_or_default()
}

pub fn build_prompt(request: &NameRequest) -> String {
    let extension = std::path::Path::new(&request.original_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("txt");
    format!(
        "You rename files based on their content. Suggest one descriptive \
         filename for the file below: lower-case words separated by single \
         underscores, keeping the `.{ext}` extension. Respond with a JSON \
         object of the form {{\"new_name\": \"...\"}} and nothing else.\n\n\
         Current name: {name}\n\
         Content:\n{content}",
        ext = extension,
        name = request.original_name,
        content = request.content,
    )
}

/// Normalizes a raw oracle answer into something safe to rename to.
/// Returns `None` when nothing usable is left.
pub fn normalize_suggestion(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    // A suggestion must stay inside the working directory.
    if trimmed.contains(['/', '\\']) || trimmed == "." || trimmed == ".." {
        return None;
    }
    let name: String = trimmed
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();
    Some(name)
}

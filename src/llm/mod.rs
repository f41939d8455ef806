pub mod ollama;
pub mod prompt;

use async_trait::async_trait;
use futures::Stream;
use serde::{ Deserialize, Serialize };
use std::pin::Pin;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::chat::ChatRequest;
use crate::models::stream::RelayEvent;
use self::ollama::OllamaClient;
use self::prompt::build_prompt;

pub type RelayStream = Pin<Box<dyn Stream<Item = RelayEvent> + Send>>;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub temperature: f64,
    pub top_p: f64,
    pub num_predict: i64,
}

/// Body of a streamed `/api/generate` call.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub options: GenerateOptions,
}

impl GenerateRequest {
    pub fn from_chat(model: &str, chat: &ChatRequest) -> Self {
        Self {
            model: model.to_string(),
            prompt: build_prompt(&chat.messages, chat.system()),
            stream: true,
            options: GenerateOptions {
                temperature: chat.temperature(),
                top_p: chat.top_p(),
                num_predict: chat.max_tokens(),
            },
        }
    }
}

/// One line of the inference server's newline-delimited JSON stream.
#[derive(Deserialize, Debug, Default)]
pub struct GenerateChunk {
    pub response: Option<String>,
    pub thinking: Option<String>,
    #[serde(default)]
    pub done: bool,
}

/// Events carried by a single stream line, in emission order. Blank and
/// malformed lines carry none.
pub fn parse_stream_line(line: &str) -> Vec<RelayEvent> {
    let line = line.trim();
    if line.is_empty() {
        return Vec::new();
    }
    let chunk: GenerateChunk = match serde_json::from_str(line) {
        Ok(chunk) => chunk,
        Err(e) => {
            log::debug!("Skipping malformed stream line ({}): {}", e, line);
            return Vec::new();
        }
    };

    let mut events = Vec::new();
    if let Some(thinking) = chunk.thinking.filter(|t| !t.is_empty()) {
        events.push(RelayEvent::Thinking(thinking));
    }
    if let Some(token) = chunk.response {
        events.push(RelayEvent::Token(token));
    }
    if chunk.done {
        events.push(RelayEvent::Done);
    }
    events
}

/// Splits a byte stream into lines regardless of how the transport chunks it.
#[derive(Debug, Default)]
pub struct LineDecoder {
    pending: Vec<u8>,
}

impl LineDecoder {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let rest = self.pending.split_off(pos + 1);
            let line = std::mem::replace(&mut self.pending, rest);
            lines.push(String::from_utf8_lossy(&line[..pos]).into_owned());
        }
        lines
    }

    /// Whatever trails the last newline once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Installed model names in server order; empty when the server is unreachable.
    async fn list_models(&self) -> Vec<String>;

    /// Starts a generation and relays it. Failures arrive as a terminal
    /// `RelayEvent::Error` rather than as an `Err`.
    fn generate_stream(&self, request: GenerateRequest) -> RelayStream;
}

pub fn new_client(config: &AppConfig) -> Arc<dyn ChatClient> {
    Arc::new(OllamaClient::from_config(config))
}

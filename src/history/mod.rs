mod file;

use async_trait::async_trait;
use log::info;
use serde_json::Value;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::chat::ConversationRecord;

pub use file::FileTranscriptStore;

pub const DEFAULT_CHAT_NAME: &str = "New Chat";
const NAME_MAX_CHARS: usize = 30;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("No data")]
    EmptyPayload,

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored conversation is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write-once storage of conversation transcripts.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Persists a new record and returns the generated filename.
    async fn save(&self, record: ConversationRecord) -> Result<String, StoreError>;

    async fn load(&self, filename: &str) -> Result<Value, StoreError>;

    /// Filenames, most recent first.
    async fn list(&self) -> Result<Vec<String>, StoreError>;

    async fn delete(&self, filename: &str) -> Result<(), StoreError>;

    async fn delete_all(&self) -> Result<(), StoreError>;
}

pub fn create_transcript_store(config: &AppConfig) -> Arc<dyn TranscriptStore> {
    info!("Chat history will be stored in: {}", config.conversations_dir.display());
    Arc::new(FileTranscriptStore::new(config.conversations_dir.clone()))
}

/// Accepts any non-empty JSON object as a conversation record.
pub fn record_from_payload(payload: Value) -> Result<ConversationRecord, StoreError> {
    match payload {
        Value::Object(map) if !map.is_empty() => Ok(map),
        _ => Err(StoreError::EmptyPayload),
    }
}

/// Adds a display name to a record that has no `name` key. An existing
/// `name`, whatever its value, is left alone.
pub fn ensure_name(record: &mut ConversationRecord) {
    if !record.contains_key("name") {
        let name = derive_name(record);
        record.insert("name".to_string(), Value::String(name));
    }
}

/// Display name for an unnamed conversation: its opening user message.
pub fn derive_name(record: &ConversationRecord) -> String {
    let first_user = record
        .get("messages")
        .and_then(Value::as_array)
        .and_then(|messages| {
            messages.iter().find(|m| m.get("role").and_then(Value::as_str) == Some("user"))
        });
    let first_user = match first_user {
        Some(msg) => msg,
        None => return DEFAULT_CHAT_NAME.to_string(),
    };
    let content = first_user.get("content").and_then(Value::as_str).unwrap_or("");

    let mut name: String = content.chars().take(NAME_MAX_CHARS).collect();
    if content.chars().count() > NAME_MAX_CHARS {
        name.push_str("...");
    }
    let name = name.replace('\n', " ");
    let name = name.trim();

    if name.is_empty() {
        DEFAULT_CHAT_NAME.to_string()
    } else {
        name.to_string()
    }
}

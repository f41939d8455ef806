use async_trait::async_trait;
use chrono::Local;
use log::{ error, info };
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{ Component, Path, PathBuf };
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::history::{ ensure_name, StoreError, TranscriptStore };
use crate::models::chat::ConversationRecord;

const FILE_PREFIX: &str = "conv_";
const FILE_EXT: &str = ".json";

/// One pretty-printed JSON file per conversation in a flat directory.
pub struct FileTranscriptStore {
    dir: PathBuf,
}

impl FileTranscriptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn new_filename() -> String {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}{}_{}{}", FILE_PREFIX, stamp, &suffix[..8], FILE_EXT)
    }

    /// Maps a client-supplied name to a path inside the store, or `None` when
    /// the name is anything other than a single plain component.
    fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Some(self.dir.join(name)),
            _ => None,
        }
    }

    async fn existing(&self, filename: &str) -> Result<PathBuf, StoreError> {
        let path = self.resolve(filename).ok_or_else(|| StoreError::NotFound(filename.to_string()))?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(StoreError::NotFound(filename.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(filename.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn json_filenames(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Ok(name) = entry.file_name().into_string() {
                if name.ends_with(FILE_EXT) {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }
}

#[async_trait]
impl TranscriptStore for FileTranscriptStore {
    async fn save(&self, mut record: ConversationRecord) -> Result<String, StoreError> {
        ensure_name(&mut record);
        let body = serde_json::to_vec_pretty(&record)?;

        let filename = Self::new_filename();
        // create_new: a save never replaces an existing transcript
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.dir.join(&filename)).await?;
        file.write_all(&body).await?;
        file.flush().await?;

        info!("Saved conversation {} as {}", record["name"], filename);
        Ok(filename)
    }

    async fn load(&self, filename: &str) -> Result<Value, StoreError> {
        let path = self.existing(filename).await?;
        let raw = fs::read(&path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names = self.json_filenames().await?;
        names.sort_unstable_by(|a, b| b.cmp(a));
        Ok(names)
    }

    async fn delete(&self, filename: &str) -> Result<(), StoreError> {
        let path = self.existing(filename).await?;
        fs::remove_file(&path).await?;
        info!("Deleted conversation {}", filename);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let names = self.json_filenames().await?;
        let total = names.len();
        for name in names {
            if let Err(e) = fs::remove_file(self.dir.join(&name)).await {
                error!("Failed to delete conversation {}: {}", name, e);
                return Err(e.into());
            }
        }
        info!("Deleted all {} conversations", total);
        Ok(())
    }
}

use log::info;
use serde::Serialize;
use std::path::PathBuf;
use tokio::fs;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "AUX", "COM1", "COM2", "COM3", "COM4", "LPT1", "LPT2", "LPT3", "PRN", "NUL",
];

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No file part")]
    NoFilePart,

    #[error("No selected file")]
    NoSelectedFile,

    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UploadedFile {
    /// Name on disk, unique per upload.
    #[serde(rename = "filename")]
    pub stored_name: String,
    #[serde(rename = "original")]
    pub original_name: String,
}

pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn store(&self, filename: &str, data: &[u8]) -> Result<UploadedFile, UploadError> {
        if filename.is_empty() {
            return Err(UploadError::NoSelectedFile);
        }
        let original_name = secure_filename(filename);
        let stored_name = format!("{}_{}", Uuid::new_v4().simple(), original_name);

        fs::write(self.dir.join(&stored_name), data).await?;
        info!("Stored upload {} ({} bytes) as {}", original_name, data.len(), stored_name);

        Ok(UploadedFile { stored_name, original_name })
    }
}

/// Reduces a client-supplied filename to a flat, ASCII-only name that is safe
/// to join onto a directory.
pub fn secure_filename(filename: &str) -> String {
    // decomposed accents fall away with the ASCII filter: é -> e
    let flattened: String = filename
        .nfkd()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let mut name = kept.trim_matches(|c| c == '.' || c == '_').to_string();

    let stem = name.split('.').next().unwrap_or_default().to_ascii_uppercase();
    if WINDOWS_DEVICE_NAMES.contains(&stem.as_str()) {
        name.insert(0, '_');
    }
    name
}

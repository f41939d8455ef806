use crate::cli::Args;
use log::info;
use std::error::Error;
use std::path::{ Path, PathBuf };

const DEFAULT_DATA_DIR: &str = ".mallama";
const CONVERSATIONS_DIR: &str = "conversations";
const UPLOADS_DIR: &str = "uploads";

/// Resolved runtime configuration, handed to each component at construction.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub ollama_url: String,
    pub conversations_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub max_body_bytes: usize,
    pub static_dir: Option<PathBuf>,
    pub debug: bool,
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let data_dir = match &args.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .ok_or("Could not determine home directory, pass --data-dir")?
                .join(DEFAULT_DATA_DIR),
        };

        Ok(Self::with_data_dir(args, &data_dir))
    }

    fn with_data_dir(args: &Args, data_dir: &Path) -> Self {
        Self {
            bind_addr: format!("{}:{}", args.host, args.port),
            ollama_url: args.ollama_url.trim_end_matches('/').to_string(),
            conversations_dir: data_dir.join(CONVERSATIONS_DIR),
            uploads_dir: data_dir.join(UPLOADS_DIR),
            max_body_bytes: args.max_upload_mb.saturating_mul(1024 * 1024),
            static_dir: args.static_dir.as_ref().map(PathBuf::from),
            debug: args.debug,
        }
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.conversations_dir)?;
        std::fs::create_dir_all(&self.uploads_dir)?;
        Ok(())
    }

    pub fn log_summary(&self) {
        info!("--- Core Configuration ---");
        info!("Server Address: {}", self.bind_addr);
        info!("Ollama URL: {}", self.ollama_url);
        info!("Conversations Dir: {}", self.conversations_dir.display());
        info!("Uploads Dir: {}", self.uploads_dir.display());
        info!("Max Request Size: {} bytes", self.max_body_bytes);
        match &self.static_dir {
            Some(dir) => info!("Static UI Dir: {}", dir.display()),
            None => info!("Static UI Dir: (disabled)"),
        }
        info!("Debug: {}", self.debug);
        info!("-------------------------");
    }
}

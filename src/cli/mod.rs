use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Browser UI for Ollama", long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host to bind to
    #[arg(long, env = "WEBUI_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind to
    #[arg(long, env = "WEBUI_PORT", default_value = "5000")]
    pub port: u16,

    /// Run in debug mode (debug level logging)
    #[arg(long, env = "WEBUI_DEBUG", default_value = "false")]
    pub debug: bool,

    // --- Inference Server Args ---
    /// Base URL of the Ollama server (e.g., http://localhost:11434)
    #[arg(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    pub ollama_url: String,

    // --- Storage Args ---
    /// Directory holding the conversations/ and uploads/ folders. Defaults to ~/.mallama
    #[arg(long, env = "WEBUI_DATA_DIR")]
    pub data_dir: Option<String>,

    /// Maximum request body size in megabytes, applies to uploads.
    #[arg(long, env = "WEBUI_MAX_UPLOAD_MB", default_value = "50")]
    pub max_upload_mb: usize,

    /// Optional directory with the browser UI (index.html, app.js) served at /.
    #[arg(long, env = "WEBUI_STATIC_DIR")]
    pub static_dir: Option<String>,
}

pub mod api;
pub mod error;

use crate::config::AppConfig;
use crate::history::create_transcript_store;
use crate::llm::new_client;
use crate::uploads::UploadStore;
use api::AppState;
use log::{ error, info };
use std::error::Error;
use std::sync::Arc;

pub struct Server {
    config: AppConfig,
    state: AppState,
}

impl Server {
    pub fn new(config: AppConfig) -> Self {
        let state = AppState {
            client: new_client(&config),
            transcripts: create_transcript_store(&config),
            uploads: Arc::new(UploadStore::new(config.uploads_dir.clone())),
        };
        Self { config, state }
    }

    pub fn with_state(config: AppConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn router(&self) -> axum::Router {
        api::router(self.state.clone(), &self.config)
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let listener = tokio::net::TcpListener::bind(&self.config.bind_addr).await.map_err(|e| {
            error!("Failed to bind HTTP server to {}: {}. Try a different port.", self.config.bind_addr, e);
            e
        })?;
        info!("Starting Ollama Web UI on http://{}", self.config.bind_addr);
        info!("Press Ctrl+C to stop");

        axum::serve(listener, self.router().into_make_service())
            .with_graceful_shutdown(shutdown_signal()).await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

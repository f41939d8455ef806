use async_trait::async_trait;
use futures::StreamExt;
use log::{ debug, warn };
use reqwest::{ Client as HttpClient, StatusCode };
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::{ parse_stream_line, ChatClient, GenerateRequest, LineDecoder, RelayStream };
use crate::config::AppConfig;
use crate::models::stream::RelayEvent;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaClient {
    pub fn new(base_url: Option<String>) -> Self {
        let url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.into());

        Self {
            http: HttpClient::new(),
            base_url: url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(Some(config.ollama_url.clone()))
    }

    async fn fetch_tags(&self) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self.http.get(&url).send().await?;
        if resp.status() != StatusCode::OK {
            return Err(format!("HTTP error: {}", resp.status()).into());
        }
        let tags = resp.json::<TagsResponse>().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn list_models(&self) -> Vec<String> {
        match self.fetch_tags().await {
            Ok(models) => models,
            Err(e) => {
                warn!("Could not list models from {}: {}", self.base_url, e);
                Vec::new()
            }
        }
    }

    fn generate_stream(&self, request: GenerateRequest) -> RelayStream {
        let url = format!("{}/api/generate", self.base_url);
        let (tx, rx) = mpsc::channel(32);
        let client = self.http.clone();

        tokio::spawn(async move {
            debug!("Starting generation with model {}", request.model);
            let response = match client.post(&url).json(&request).send().await {
                Ok(response) => response,
                Err(e) => {
                    let _ = tx.send(RelayEvent::Error(e.to_string())).await;
                    return;
                }
            };
            if !response.status().is_success() {
                let _ = tx.send(RelayEvent::Error(response.status().as_u16().to_string())).await;
                return;
            }

            let mut decoder = LineDecoder::default();
            let mut stream = response.bytes_stream();

            while let Some(chunk_result) = stream.next().await {
                let chunk = match chunk_result {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx.send(RelayEvent::Error(e.to_string())).await;
                        return;
                    }
                };
                for line in decoder.push(&chunk) {
                    for event in parse_stream_line(&line) {
                        let terminal = event.is_terminal();
                        // receiver gone: the browser disconnected
                        if tx.send(event).await.is_err() || terminal {
                            return;
                        }
                    }
                }
            }

            if let Some(line) = decoder.finish() {
                for event in parse_stream_line(&line) {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            }
            debug!("Upstream stream ended for model {}", request.model);
        });

        Box::pin(ReceiverStream::new(rx))
    }
}

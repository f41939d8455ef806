use axum::{
    body::Bytes,
    extract::{ multipart::{ MultipartError, MultipartRejection }, DefaultBodyLimit, Multipart, State },
    http::StatusCode,
    response::{ sse::{ Event, Sse }, IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use futures::StreamExt;
use log::{ error, info };
use serde::{ de::DeserializeOwned, Deserialize, Serialize };
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{ Any, CorsLayer };
use tower_http::services::ServeDir;

use crate::config::AppConfig;
use crate::history::{ record_from_payload, TranscriptStore };
use crate::llm::{ ChatClient, GenerateRequest };
use crate::models::chat::ChatRequest;
use crate::server::error::ApiError;
use crate::uploads::{ UploadError, UploadStore, UploadedFile };

const UPLOAD_FIELD: &str = "file";

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn ChatClient>,
    pub transcripts: Arc<dyn TranscriptStore>,
    pub uploads: Arc<UploadStore>,
}

#[derive(Deserialize, Default)]
struct FilenameRequest {
    filename: Option<String>,
}

impl FilenameRequest {
    fn required(self) -> Result<String, ApiError> {
        self.filename
            .filter(|f| !f.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Filename missing".into()))
    }
}

#[derive(Serialize)]
struct SavedResponse {
    filename: String,
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/models", get(models_handler))
        .route("/chat", post(chat_handler))
        .route("/stop", post(stop_handler))
        .route("/save", post(save_handler))
        .route("/load", post(load_handler))
        .route("/conversations", get(conversations_handler))
        .route("/upload", post(upload_handler))
        .route("/delete", post(delete_handler))
        .route("/delete-all", post(delete_all_handler));

    if let Some(dir) = &config.static_dir {
        info!("Serving browser UI from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(cors)
            .layer(DefaultBodyLimit::max(config.max_body_bytes))
    ).with_state(state)
}

fn parse_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
}

async fn models_handler(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.client.list_models().await)
}

async fn chat_handler(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let chat: ChatRequest = parse_json(&body)?;
    let model = chat.model().ok_or_else(|| ApiError::BadRequest("Model not specified".into()))?;

    info!("Chat request for model {} with {} messages", model, chat.messages.len());
    let request = GenerateRequest::from_chat(model, &chat);
    let events = state.client
        .generate_stream(request)
        .map(|event| Ok::<Event, Infallible>(Event::default().data(event.to_data())));

    Ok(Sse::new(events).into_response())
}

async fn stop_handler() -> Json<StatusResponse> {
    // The browser aborts its own fetch; nothing is cancelled upstream.
    Json(StatusResponse { status: "stopped" })
}

async fn save_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SavedResponse>, ApiError> {
    let payload: Value = parse_json(&body)?;
    let record = record_from_payload(payload)?;
    let filename = state.transcripts.save(record).await.map_err(|e| {
        error!("Failed to save conversation: {}", e);
        e
    })?;
    Ok(Json(SavedResponse { filename }))
}

async fn load_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let filename = parse_json::<FilenameRequest>(&body)?.required()?;
    let conversation = state.transcripts.load(&filename).await?;
    Ok(Json(conversation))
}

async fn conversations_handler(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let files = state.transcripts.list().await.map_err(|e| {
        error!("Failed to list conversations: {}", e);
        e
    })?;
    Ok(Json(files))
}

async fn upload_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadedFile>, ApiError> {
    let mut multipart = multipart.map_err(|_| UploadError::NoFilePart)?;

    while let Some(field) = multipart
        .next_field().await
        .map_err(multipart_error)?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        // a plain form value named "file" is not a file part
        let filename = match field.file_name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        if filename.is_empty() {
            return Err(UploadError::NoSelectedFile.into());
        }
        let data = field.bytes().await.map_err(multipart_error)?;
        let stored = state.uploads.store(&filename, &data).await.map_err(|e| {
            error!("Failed to store upload {}: {}", filename, e);
            e
        })?;
        return Ok(Json(stored));
    }

    Err(UploadError::NoFilePart.into())
}

/// Keeps client-side multipart failures (body over the cap, malformed
/// parts) out of the 5xx range.
fn multipart_error(err: MultipartError) -> ApiError {
    let status = err.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("File too large".into())
    } else if status.is_client_error() {
        ApiError::BadRequest(err.body_text())
    } else {
        error!("Failed to read upload: {}", err.body_text());
        ApiError::Internal(err.body_text())
    }
}

async fn delete_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StatusResponse>, ApiError> {
    let filename = parse_json::<FilenameRequest>(&body)?.required()?;
    state.transcripts.delete(&filename).await?;
    Ok(Json(StatusResponse { status: "deleted" }))
}

async fn delete_all_handler(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    state.transcripts.delete_all().await?;
    Ok(Json(StatusResponse { status: "all deleted" }))
}

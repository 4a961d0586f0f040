/*!
 * HTTP surface of the service.
 *
 * `POST /api/youtube-transcript` validates the request body, runs the
 * fallback plan and maps the outcome to a status code and JSON body.
 * `GET /health` answers `ok`.
 */

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::app_config::{Config, ServerConfig};
use crate::errors::AppError;
use crate::transcript::{
    CaptionTrack, FallbackSource, RetrievalOutcome, TranscriptAttempt, TranscriptService,
};
use crate::video_id::{extract_video_id, VideoId};

pub const TRANSCRIPT_ROUTE: &str = "/api/youtube-transcript";

pub const MISSING_URL_MESSAGE: &str = "A valid YouTube URL is required.";
pub const INVALID_URL_MESSAGE: &str = "Could not parse a YouTube video ID from the provided URL.";
pub const UNAVAILABLE_MESSAGE: &str =
    "Transcript could not be retrieved. It may be unavailable or restricted for this video.";
pub const DIAGNOSED_MESSAGE: &str =
    "Transcript could not be retrieved. YouTube returned an error for every available caption track.";
pub const UNEXPECTED_MESSAGE: &str = "Unexpected error while retrieving the transcript.";

/// Shared state for the router
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TranscriptService>,
    /// Language used when the request does not name one
    pub default_language: String,
}

impl AppState {
    pub fn new(service: TranscriptService, default_language: impl Into<String>) -> Self {
        Self {
            service: Arc::new(service),
            default_language: default_language.into(),
        }
    }

    /// Validate the configuration and wire the real strategies
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        config
            .validate()
            .map_err(|e| AppError::Config(format!("{:#}", e)))?;
        let service = TranscriptService::from_config(config)?;
        Ok(Self::new(service, config.default_language.clone()))
    }
}

/// Validated request body
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptRequest {
    pub url: String,
    pub language: Option<String>,
}

impl TranscriptRequest {
    /// Read the request from a raw body
    ///
    /// Returns `None` when the body is not a JSON object with a non-blank
    /// string `url`. A non-string or blank `language` is treated as absent.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        let value: Value = serde_json::from_slice(body).ok()?;
        let url = value.get("url")?.as_str()?.trim();
        if url.is_empty() {
            return None;
        }

        let language = value
            .get("language")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .map(str::to_string);

        Some(Self {
            url: url.to_string(),
            language,
        })
    }
}

/// Successful response body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptResponse {
    pub transcript: String,
    pub video_id: VideoId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<CaptionTrack>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<Vec<TranscriptAttempt>>,
}

/// Error response body
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<Vec<TranscriptAttempt>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            attempts: None,
            details: None,
        }
    }
}

/// Everything the transcript endpoint can answer
#[derive(Debug, Clone)]
pub enum EndpointReply {
    Success(TranscriptResponse),
    BadRequest(ErrorResponse),
    NotFound(ErrorResponse),
    BadGateway(ErrorResponse),
}

impl EndpointReply {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Success(_) => StatusCode::OK,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for EndpointReply {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Success(body) => (status, Json(body)).into_response(),
            Self::BadRequest(body) | Self::NotFound(body) | Self::BadGateway(body) => {
                (status, Json(body)).into_response()
            }
        }
    }
}

/// Map a retrieval outcome to the endpoint reply
pub fn reply_for(video_id: VideoId, outcome: RetrievalOutcome) -> EndpointReply {
    match outcome {
        RetrievalOutcome::Found { result, attempts } => EndpointReply::Success(TranscriptResponse {
            transcript: result.transcript,
            video_id,
            track: result.track,
            fallback: result.fallback,
            attempts: (!attempts.is_empty()).then_some(attempts),
        }),
        RetrievalOutcome::Diagnosed { attempts } => EndpointReply::BadGateway(ErrorResponse {
            attempts: Some(attempts),
            ..ErrorResponse::new(DIAGNOSED_MESSAGE)
        }),
        RetrievalOutcome::Unavailable => EndpointReply::NotFound(ErrorResponse::new(UNAVAILABLE_MESSAGE)),
        RetrievalOutcome::Failed { details } => EndpointReply::BadGateway(ErrorResponse {
            details: Some(details),
            ..ErrorResponse::new(UNEXPECTED_MESSAGE)
        }),
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(TRANSCRIPT_ROUTE, post(transcript_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn transcript_handler(State(state): State<AppState>, body: Bytes) -> EndpointReply {
    let request_id = Uuid::new_v4();

    let Some(request) = TranscriptRequest::from_body(&body) else {
        warn!("[{}] Rejected request without a usable URL", request_id);
        return EndpointReply::BadRequest(ErrorResponse::new(MISSING_URL_MESSAGE));
    };

    let Some(video_id) = extract_video_id(&request.url) else {
        warn!("[{}] No video id in '{}'", request_id, request.url);
        return EndpointReply::BadRequest(ErrorResponse::new(INVALID_URL_MESSAGE));
    };

    let language = request.language.unwrap_or_else(|| state.default_language.clone());
    info!("[{}] Retrieving transcript for {} ({})", request_id, video_id, language);

    let outcome = state.service.retrieve(&video_id, &language).await;
    let reply = reply_for(video_id, outcome);

    match &reply {
        EndpointReply::Success(body) => info!(
            "[{}] Served {} characters for {}",
            request_id,
            body.transcript.len(),
            body.video_id
        ),
        other => error!("[{}] Retrieval failed with status {}", request_id, other.status()),
    }

    reply
}

/// Bind the listener and serve until the process is stopped
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<(), AppError> {
    let address = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| AppError::Server(format!("Failed to bind {}: {}", address, e)))?;

    info!("Listening on http://{}", address);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

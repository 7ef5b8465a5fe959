//! API request handlers
//!
//! Frame work (landmark extraction, inference, training) is synchronous and
//! runs on the blocking pool; handlers only decode input and shape output.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection};
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::Json;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::envelope::{ApiError, ApiErrorResponse, ApiResponse};
use crate::landmarks::Frame;
use crate::pipeline::{Recognizer, RecognizerStatus};
use crate::temporal::{SessionSnapshot, DEFAULT_SESSION};
use crate::training::{TrainingError, TrainingRecorder};
use crate::types::PredictionDebug;

/// Longest accepted session id.
const MAX_SESSION_ID_LEN: usize = 128;

// ============================================================================
// Shared State
// ============================================================================

/// State shared by every handler.
#[derive(Clone)]
pub struct ApiState {
    pub recognizer: Arc<Recognizer>,
    pub recorder: Arc<TrainingRecorder>,
    /// Directory the training endpoints read samples from
    pub training_dir: PathBuf,
}

impl ApiState {
    pub fn new(recognizer: Arc<Recognizer>, training_dir: impl Into<PathBuf>) -> Self {
        let training_dir = training_dir.into();
        Self {
            recognizer,
            recorder: Arc::new(TrainingRecorder::new(training_dir.clone())),
            training_dir,
        }
    }
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub base64_image: String,
}

#[derive(Debug, Deserialize)]
pub struct FrameRequest {
    pub base64_image: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClearHistoryRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    /// Clear every session instead of one
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    pub base64_image: String,
    pub gesture: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct SignResponse {
    pub sign: String,
    pub confidence: f64,
}

#[derive(Debug, Serialize)]
pub struct FrameResponse {
    pub sign: String,
    pub confidence: f64,
    pub hand_detected: bool,
    pub debug: PredictionDebug,
}

#[derive(Debug, Serialize)]
pub struct ClearHistoryResponse {
    pub cleared: usize,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub recognizer: RecognizerStatus,
    pub sessions: Vec<SessionSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

// ============================================================================
// Input Helpers
// ============================================================================

/// Decode a base64 image, tolerating a `data:<mime>;base64,` prefix.
pub fn decode_image(encoded: &str) -> Result<Frame, ApiError> {
    let trimmed = encoded.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| ApiError::BadRequest("malformed data URL".to_string()))?,
        None => trimmed,
    };
    if payload.is_empty() {
        return Err(ApiError::BadRequest("base64_image is empty".to_string()));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| ApiError::BadRequest(format!("invalid base64: {e}")))?;
    Frame::decode(&bytes).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Normalize an optional session id; blank means the default session.
fn session_id(raw: Option<&str>) -> Result<String, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_SESSION.to_string()),
        Some(id) if id.len() > MAX_SESSION_ID_LEN => Err(ApiError::BadRequest(format!(
            "session_id longer than {MAX_SESSION_ID_LEN} bytes"
        ))),
        Some(id) => Ok(id.to_string()),
    }
}

/// Parse a JSON body that may be omitted entirely.
///
/// An empty body yields `T::default()`. A non-empty body needs a JSON
/// content type and must deserialize cleanly.
fn parse_optional_json<T>(headers: &HeaderMap, body: &Bytes) -> Result<T, ApiError>
where
    T: Default + DeserializeOwned,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| mime.trim().to_ascii_lowercase())
        .is_some_and(|mime| mime == "application/json" || mime.ends_with("+json"));
    if !is_json {
        return Err(ApiError::BadRequest(
            "Expected request with `Content-Type: application/json`".to_string(),
        ));
    }
    let Json(value) = Json::<T>::from_bytes(body)?;
    Ok(value)
}

/// Run blocking pipeline work off the async runtime.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!(error = %e, "Blocking task failed");
        ApiError::Internal("prediction task failed".to_string())
    })
}

// ============================================================================
// Prediction Endpoints
// ============================================================================

/// POST /api/v1/sign-to-text
pub async fn sign_to_text(
    State(state): State<ApiState>,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let frame = decode_image(&req.base64_image)?;

    let recognizer = Arc::clone(&state.recognizer);
    let result = blocking(move || recognizer.predict_static(&frame)).await?;
    Ok(ApiResponse::ok(SignResponse {
        sign: result.label,
        confidence: result.confidence,
    }))
}

/// POST /api/v1/predict-frame
pub async fn predict_frame(
    State(state): State<ApiState>,
    payload: Result<Json<FrameRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let session = session_id(req.session_id.as_deref())?;
    let frame = decode_image(&req.base64_image)?;

    let recognizer = Arc::clone(&state.recognizer);
    let p = blocking(move || recognizer.predict_frame(&session, &frame)).await?;
    Ok(ApiResponse::ok(FrameResponse {
        sign: p.label,
        confidence: p.confidence,
        hand_detected: p.hand_detected,
        debug: p.debug,
    }))
}

/// POST /api/v1/clear-history
///
/// An empty body clears the default session. Any other body must be valid
/// JSON for [`ClearHistoryRequest`].
pub async fn clear_history(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let req = parse_optional_json::<ClearHistoryRequest>(&headers, &body?)?;
    let cleared = if req.all {
        state.recognizer.clear_all_history()
    } else {
        let session = session_id(req.session_id.as_deref())?;
        usize::from(state.recognizer.clear_history(&session))
    };
    Ok(ApiResponse::ok(ClearHistoryResponse { cleared }))
}

// ============================================================================
// Training Endpoints
// ============================================================================

/// POST /api/v1/training/record
pub async fn record_sample(
    State(state): State<ApiState>,
    payload: Result<Json<RecordRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let frame = decode_image(&req.base64_image)?;

    let recorder = Arc::clone(&state.recorder);
    let saved = blocking(move || recorder.record(&req.gesture, &req.session_id, frame)).await?;
    match saved {
        Ok(path) => Ok(ApiResponse::ok(RecordResponse {
            path: path.display().to_string(),
        })),
        Err(TrainingError::InvalidName(name)) => Err(ApiError::BadRequest(format!(
            "invalid gesture or session name '{name}'"
        ))),
        Err(e) => {
            tracing::error!(error = %e, "Failed to record training sample");
            Err(ApiError::Internal("failed to save training sample".to_string()))
        }
    }
}

/// POST /api/v1/training/train-dynamic
pub async fn train_dynamic(State(state): State<ApiState>) -> Result<Response, ApiError> {
    run_training(state, |r, dir| r.try_train_dynamic_model(&dir)).await
}

/// POST /api/v1/training/train-static
pub async fn train_static(State(state): State<ApiState>) -> Result<Response, ApiError> {
    run_training(state, |r, dir| r.try_train_static_model(&dir)).await
}

async fn run_training(
    state: ApiState,
    train: impl FnOnce(&Recognizer, PathBuf) -> Option<bool> + Send + 'static,
) -> Result<Response, ApiError> {
    let recognizer = Arc::clone(&state.recognizer);
    let dir = state.training_dir.clone();
    let success = blocking(move || train(recognizer.as_ref(), dir))
        .await?
        .ok_or_else(|| ApiError::Busy("a training run is already in progress".to_string()))?;
    Ok(ApiResponse::ok(TrainResponse { success }))
}

// ============================================================================
// Status Endpoints
// ============================================================================

/// GET /api/v1/status
pub async fn get_status(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(StatusResponse {
        recognizer: state.recognizer.status(),
        sessions: state.recognizer.sessions().snapshots(),
    })
}

/// GET /health
pub async fn health_check(State(state): State<ApiState>) -> Json<HealthResponse> {
    let status = state.recognizer.status();
    Json(HealthResponse {
        status: status.status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: status.uptime_secs as u64,
    })
}

/// Fallback for unknown routes.
pub async fn not_found() -> Response {
    ApiErrorResponse::not_found("no such endpoint")
}

use super::state::AppState;
use crate::error::InterviewError;
use crate::models::{
    CodeAnalysisEntry, Difficulty, InterviewType, ScoreSet, Session, SessionSummary,
    TranscriptEntry, UserStats,
};
use crate::session::{CodeInput, EndPayload, StartResponse};
use crate::voice::CallEvent;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequestParts, Path, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateInterviewRequest {
    pub candidate_name: String,
    pub interview_type: InterviewType,
    pub difficulty: Difficulty,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub sequence: u64,
    pub code_snapshot: String,
    #[serde(default)]
    pub narrative: String,
    pub scores: ScoreSet,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Errors and authentication
// ============================================================================

impl IntoResponse for InterviewError {
    fn into_response(self) -> Response {
        let status = match &self {
            InterviewError::Validation(_) => StatusCode::BAD_REQUEST,
            InterviewError::Unauthorized => StatusCode::UNAUTHORIZED,
            InterviewError::Forbidden(_) => StatusCode::FORBIDDEN,
            InterviewError::NotFound(_) => StatusCode::NOT_FOUND,
            InterviewError::Conflict { .. } | InterviewError::DuplicateRoom(_) => {
                StatusCode::CONFLICT
            }
            InterviewError::Transport(_) => StatusCode::BAD_GATEWAY,
            InterviewError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Owner id resolved from the `Authorization: Bearer` header
pub struct Owner(pub String);

#[async_trait]
impl FromRequestParts<AppState> for Owner {
    type Rejection = InterviewError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(InterviewError::Unauthorized)?;

        let owner_id = state.identity.resolve(token).await?;
        Ok(Owner(owner_id))
    }
}

type ApiResult<T> = Result<(StatusCode, Json<T>), InterviewError>;

// ============================================================================
// Handlers
// ============================================================================

/// POST /interviews
/// Schedule a new interview
pub async fn create_interview(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Json(req): Json<CreateInterviewRequest>,
) -> ApiResult<SessionSummary> {
    let summary = state
        .service()
        .create(&req.candidate_name, req.interview_type, req.difficulty, &owner_id)
        .await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// GET /interviews
/// List the caller's interviews, newest first
pub async fn list_interviews(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
) -> ApiResult<Vec<SessionSummary>> {
    let summaries = state.service().list(&owner_id).await?;
    Ok((StatusCode::OK, Json(summaries)))
}

/// GET /interviews/:room_id
pub async fn get_interview(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(room_id): Path<String>,
) -> ApiResult<Session> {
    let session = state.service().get(&owner_id, &room_id).await?;
    Ok((StatusCode::OK, Json(session)))
}

/// POST /interviews/:room_id/start
/// Open the voice call and move the interview in progress
pub async fn start_interview(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(room_id): Path<String>,
) -> ApiResult<StartResponse> {
    info!("Starting interview {}", room_id);
    let response = state.orchestrator.start_call(&owner_id, &room_id).await?;
    Ok((StatusCode::OK, Json(response)))
}

/// POST /interviews/:room_id/events
/// Relay a provider call event into the live session
pub async fn push_call_event(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(room_id): Path<String>,
    Json(event): Json<CallEvent>,
) -> Result<StatusCode, InterviewError> {
    state
        .orchestrator
        .push_event(&owner_id, &room_id, event)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// PUT /interviews/:room_id/code
/// Editor snapshot; debounced while a call is live
pub async fn put_code(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(room_id): Path<String>,
    Json(input): Json<CodeInput>,
) -> Result<StatusCode, InterviewError> {
    state
        .orchestrator
        .push_code(&owner_id, &room_id, input)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// PUT /interviews/:room_id/transcript
/// Replace the stored transcript with the client's cumulative copy
pub async fn put_transcript(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(room_id): Path<String>,
    Json(entries): Json<Vec<TranscriptEntry>>,
) -> Result<StatusCode, InterviewError> {
    state
        .service()
        .replace_transcript(&owner_id, &room_id, entries)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /interviews/:room_id/analysis
/// Append a client-side analysis to the history
pub async fn post_analysis(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(room_id): Path<String>,
    Json(req): Json<AnalysisRequest>,
) -> Result<StatusCode, InterviewError> {
    let ScoreSet {
        quality,
        correctness,
        efficiency,
    } = req.scores;
    if quality > 100 || correctness > 100 || efficiency > 100 {
        return Err(InterviewError::Validation(
            "analysis scores must be within 0..=100".to_string(),
        ));
    }

    let entry = CodeAnalysisEntry {
        sequence: req.sequence,
        code_snapshot: req.code_snapshot,
        narrative: req.narrative,
        scores: req.scores,
        timestamp: state.service().clock().now(),
    };

    state
        .service()
        .append_code_analysis(&owner_id, &room_id, entry)
        .await?;
    Ok(StatusCode::CREATED)
}

/// POST /interviews/:room_id/end
/// Finalize the interview: scores, narrative report, statistics
///
/// An empty body ends with defaults. A body that does not decode is rejected.
pub async fn end_interview(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(room_id): Path<String>,
    body: Bytes,
) -> ApiResult<Session> {
    let payload = decode_end_payload(&body)?;
    let session = state.orchestrator.end(&owner_id, &room_id, payload).await?;
    Ok((StatusCode::OK, Json(session)))
}

fn decode_end_payload(body: &[u8]) -> Result<EndPayload, InterviewError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(EndPayload::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| InterviewError::Validation(format!("invalid end payload: {}", e)))
}

/// POST /interviews/:room_id/cancel
pub async fn cancel_interview(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(room_id): Path<String>,
) -> ApiResult<Session> {
    let session = state.orchestrator.cancel(&owner_id, &room_id).await?;
    Ok((StatusCode::OK, Json(session)))
}

/// GET /users/me/stats
pub async fn get_user_stats(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
) -> ApiResult<UserStats> {
    let stats = state.service().user_stats(&owner_id).await?;
    Ok((StatusCode::OK, Json(stats)))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

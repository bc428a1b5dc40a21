use thiserror::Error;

use crate::models::SessionStatus;

/// Errors surfaced by the interview lifecycle operations
#[derive(Error, Debug)]
pub enum InterviewError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Missing or invalid credential")]
    Unauthorized,

    #[error("Room {0} belongs to another user")]
    Forbidden(String),

    #[error("Room {0} not found")]
    NotFound(String),

    #[error("Room {room_id} is {status}, cannot {action}")]
    Conflict {
        room_id: String,
        status: SessionStatus,
        action: &'static str,
    },

    #[error("Room id {0} already exists")]
    DuplicateRoom(String),

    #[error("Voice transport failed: {0}")]
    Transport(String),

    #[error("Storage failed: {0}")]
    Storage(String),
}

impl InterviewError {
    pub fn conflict(room_id: &str, status: SessionStatus, action: &'static str) -> Self {
        Self::Conflict {
            room_id: room_id.to_string(),
            status,
            action,
        }
    }
}

pub type Result<T> = std::result::Result<T, InterviewError>;

/// Failure decoding a structured payload out of a text-generation response
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Empty response")]
    Empty,

    #[error("Malformed JSON: {0}")]
    Malformed(String),

    #[error("Schema violation: {0}")]
    Schema(String),
}

/// Code analysis failure. Non-fatal: callers keep their prior scores.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Analysis service unavailable: {0}")]
    Unavailable(String),

    #[error("Analysis timed out")]
    Timeout,

    #[error("Analysis response rejected: {0}")]
    Decode(#[from] DecodeError),
}

/// Narrative report failure. Non-fatal: completion falls back to a canned report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportError {
    #[error("Report service unavailable: {0}")]
    Unavailable(String),

    #[error("Report generation timed out")]
    Timeout,

    #[error("Report response rejected: {0}")]
    Decode(#[from] DecodeError),
}

//! Session registry contract
//!
//! The registry is the only hard dependency of the lifecycle. It owns the durable session
//! records and enforces the transition guards atomically, so that retried `start` calls,
//! stale `end` calls and late transcript flushes are rejected at the storage boundary:
//! - `start` is a no-op on an in-progress session
//! - `complete`, transcript/code/analysis/score mutations require `in-progress`
//! - `cancel` requires a non-terminal session

mod memory;

pub use memory::MemoryRegistry;

use crate::error::Result;
use crate::models::{
    AiAnalysis, CodeAnalysisEntry, CodeSubmission, Scores, Session, TranscriptEntry, UserStats,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Outcome of a `start` request
#[derive(Debug, Clone)]
pub struct StartOutcome {
    pub session: Session,
    /// False when the session was already in progress and nothing changed
    pub transitioned: bool,
}

/// Final values written when a session completes
#[derive(Debug, Clone)]
pub struct Completion {
    pub end_time: DateTime<Utc>,
    pub duration: u64,
    pub scores: Scores,
    pub ai_analysis: AiAnalysis,
    pub transcript: Option<Vec<TranscriptEntry>>,
    pub code: Option<CodeSubmission>,
    pub recording_url: Option<String>,
}

#[async_trait]
pub trait SessionRegistry: Send + Sync {
    async fn get(&self, room_id: &str) -> Result<Session>;

    /// Insert a new session. Fails with `DuplicateRoom` if the room id is taken.
    async fn create(&self, session: Session) -> Result<Session>;

    async fn start(
        &self,
        room_id: &str,
        external_call_id: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<StartOutcome>;

    async fn append_code_analysis(&self, room_id: &str, entry: CodeAnalysisEntry) -> Result<()>;

    async fn replace_code_submission(&self, room_id: &str, code: CodeSubmission) -> Result<()>;

    async fn replace_transcript(&self, room_id: &str, entries: Vec<TranscriptEntry>)
        -> Result<()>;

    /// Overwrite the live (pre-completion) scores
    async fn update_scores(&self, room_id: &str, scores: Scores) -> Result<()>;

    async fn complete(&self, room_id: &str, completion: Completion) -> Result<Session>;

    async fn cancel(&self, room_id: &str, at: DateTime<Utc>) -> Result<Session>;

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Session>>;
}

/// Per-user statistics storage
#[async_trait]
pub trait UserStatsStore: Send + Sync {
    async fn load(&self, owner_id: &str) -> Result<Option<UserStats>>;

    /// Read-modify-write the owner's stats atomically
    async fn modify(
        &self,
        owner_id: &str,
        update: &(dyn Fn(Option<UserStats>) -> UserStats + Send + Sync),
    ) -> Result<UserStats>;
}

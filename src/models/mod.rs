//! Session and statistics records shared by the registry, the state machine and the HTTP API

mod session;
mod stats;

pub use session::{
    clamp_score, AiAnalysis, CodeAnalysisEntry, CodeSubmission, Difficulty, InterviewType, Role,
    ScoreSet, Scores, Session, SessionStatus, SessionSummary, TranscriptEntry,
};
pub use stats::{CompletionRecord, UserStats};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::session::InterviewType;

/// Compact record of one completed interview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub interview_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub overall_score: u8,
    pub interview_type: InterviewType,
    /// Seconds
    pub duration: u64,
}

/// Aggregate interview statistics for one user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_interviews: usize,
    pub average_score: u8,
    pub best_score: u8,
    /// Seconds
    pub total_duration: u64,
    pub interviews_by_type: HashMap<InterviewType, usize>,
    pub last_interview_date: Option<DateTime<Utc>>,
    pub history: Vec<CompletionRecord>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle status of an interview session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl SessionStatus {
    /// Completed and cancelled sessions accept no further transitions or mutations
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::InProgress => "in-progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewType {
    Technical,
    Behavioral,
    SystemDesign,
    Coding,
    Mixed,
}

impl InterviewType {
    pub fn as_str(self) -> &'static str {
        match self {
            InterviewType::Technical => "technical",
            InterviewType::Behavioral => "behavioral",
            InterviewType::SystemDesign => "system_design",
            InterviewType::Coding => "coding",
            InterviewType::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// Speaker of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The AI interviewer
    Agent,
    /// The candidate
    User,
}

/// A single utterance in the interview transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// The candidate's most recent code, overwritten on every settle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSubmission {
    pub code: String,
    pub language: String,
    pub submitted_at: DateTime<Utc>,
}

/// Scores produced by one code analysis, each in 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub quality: u8,
    pub correctness: u8,
    pub efficiency: u8,
}

/// One entry of the append-only code analysis history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeAnalysisEntry {
    /// Request order of the analysis (newer requests have larger values)
    #[serde(default)]
    pub sequence: u64,
    pub code_snapshot: String,
    pub narrative: String,
    pub scores: ScoreSet,
    pub timestamp: DateTime<Utc>,
}

/// Session scores, each an integer in 0..=100
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub code_quality: u8,
    pub communication: u8,
    pub problem_solving: u8,
    pub technical_knowledge: u8,
    pub confidence: u8,
    pub overall: u8,
}

/// Narrative feedback attached to a completed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub code_review: String,
    pub communication_feedback: String,
    pub technical_feedback: String,
    pub overall_feedback: String,
    pub detailed_report: String,
    pub generated_at: DateTime<Utc>,
}

/// The durable interview session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub room_id: String,
    pub owner_id: String,
    pub candidate_name: String,
    pub interview_type: InterviewType,
    pub difficulty: Difficulty,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Whole seconds between start and end, set once at completion
    pub duration: Option<u64>,
    pub external_call_id: Option<String>,
    pub recording_url: Option<String>,
    pub code_submission: Option<CodeSubmission>,
    pub code_analysis_history: Vec<CodeAnalysisEntry>,
    pub transcript: Vec<TranscriptEntry>,
    pub scores: Scores,
    pub ai_analysis: Option<AiAnalysis>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Build a freshly scheduled session
    pub fn scheduled(
        room_id: String,
        owner_id: String,
        candidate_name: String,
        interview_type: InterviewType,
        difficulty: Difficulty,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            owner_id,
            candidate_name,
            interview_type,
            difficulty,
            status: SessionStatus::Scheduled,
            created_at,
            start_time: None,
            end_time: None,
            duration: None,
            external_call_id: None,
            recording_url: None,
            code_submission: None,
            code_analysis_history: Vec::new(),
            transcript: Vec::new(),
            scores: Scores::default(),
            ai_analysis: None,
            completed_at: None,
        }
    }

    /// Most recently requested analysis in the history
    pub fn latest_analysis(&self) -> Option<&CodeAnalysisEntry> {
        self.code_analysis_history
            .iter()
            .max_by_key(|entry| (entry.sequence, entry.timestamp))
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            room_id: self.room_id.clone(),
            candidate_name: self.candidate_name.clone(),
            interview_type: self.interview_type,
            difficulty: self.difficulty,
            status: self.status,
            created_at: self.created_at,
            overall_score: self
                .ai_analysis
                .as_ref()
                .map(|_| self.scores.overall),
        }
    }
}

/// Client-facing summary of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub room_id: String,
    pub candidate_name: String,
    pub interview_type: InterviewType,
    pub difficulty: Difficulty,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    /// Present once the session is completed
    pub overall_score: Option<u8>,
}

/// Clamp a raw score into 0..=100 and round to the nearest integer
pub fn clamp_score(raw: f64) -> u8 {
    if !raw.is_finite() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

use crate::error::{InterviewError, Result};
use crate::models::{clamp_score, Role, ScoreSet, Scores, TranscriptEntry};
use serde::{Deserialize, Serialize};

/// Average candidate utterance length (in characters) that maps to a full communication score
const COMMUNICATION_FULL_MARKS_CHARS: f64 = 50.0;

/// Client-supplied score overrides sent with `end`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreOverrides {
    pub code_quality: Option<u8>,
    pub communication: Option<u8>,
    pub problem_solving: Option<u8>,
    pub technical_knowledge: Option<u8>,
    pub confidence: Option<u8>,
    pub overall: Option<u8>,
}

impl ScoreOverrides {
    /// Every supplied score must lie in 0..=100
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("code_quality", self.code_quality),
            ("communication", self.communication),
            ("problem_solving", self.problem_solving),
            ("technical_knowledge", self.technical_knowledge),
            ("confidence", self.confidence),
            ("overall", self.overall),
        ];
        for (name, value) in fields {
            if let Some(v) = value.filter(|v| *v > 100) {
                return Err(InterviewError::Validation(format!(
                    "{} score {} is outside 0..=100",
                    name, v
                )));
            }
        }
        Ok(())
    }
}

/// Length-based communication proxy: no semantic signal, kept deliberately simple
pub fn communication_score(transcript: &[TranscriptEntry]) -> u8 {
    let lengths: Vec<usize> = transcript
        .iter()
        .filter(|entry| entry.role == Role::User)
        .map(|entry| entry.content.trim().chars().count())
        .collect();

    if lengths.is_empty() {
        return 0;
    }

    let average = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
    clamp_score(average / COMMUNICATION_FULL_MARKS_CHARS * 100.0)
}

/// Mean of the four graded dimensions, rounded
pub fn overall_score(scores: &Scores) -> u8 {
    let sum = scores.code_quality as f64
        + scores.communication as f64
        + scores.problem_solving as f64
        + scores.technical_knowledge as f64;
    clamp_score(sum / 4.0)
}

/// Fold the latest analysis onto live scores: quality → code quality,
/// correctness → problem solving, efficiency → technical knowledge
pub fn apply_analysis(scores: &mut Scores, analysis: &ScoreSet) {
    scores.code_quality = analysis.quality.min(100);
    scores.problem_solving = analysis.correctness.min(100);
    scores.technical_knowledge = analysis.efficiency.min(100);
}

/// Final scores for a completed session
///
/// Starts from the live scores, refreshes the analysis-derived fields and communication,
/// then lets the client's overrides win. `overall` is recomputed unless overridden.
pub fn aggregate(
    live: &Scores,
    latest_analysis: Option<&ScoreSet>,
    transcript: &[TranscriptEntry],
    overrides: &ScoreOverrides,
) -> Scores {
    let mut scores = *live;

    if let Some(analysis) = latest_analysis {
        apply_analysis(&mut scores, analysis);
    }
    if !transcript.is_empty() {
        scores.communication = communication_score(transcript);
    }

    let clamp = |v: u8| v.min(100);
    if let Some(v) = overrides.code_quality {
        scores.code_quality = clamp(v);
    }
    if let Some(v) = overrides.communication {
        scores.communication = clamp(v);
    }
    if let Some(v) = overrides.problem_solving {
        scores.problem_solving = clamp(v);
    }
    if let Some(v) = overrides.technical_knowledge {
        scores.technical_knowledge = clamp(v);
    }
    if let Some(v) = overrides.confidence {
        scores.confidence = clamp(v);
    }
    scores.confidence = scores.confidence.min(100);

    scores.overall = match overrides.overall {
        Some(v) => clamp(v),
        None => overall_score(&scores),
    };

    scores
}

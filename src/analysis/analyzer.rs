use crate::ai::{decode_payload, TextGenerator, Validate};
use crate::error::AnalysisError;
use crate::models::{Difficulty, InterviewType, ScoreSet};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are a senior engineer grading code written during a live \
mock interview. Respond with JSON only: {\"quality\": 0-100, \"correctness\": 0-100, \
\"efficiency\": 0-100, \"narrative\": \"two or three sentences of feedback\"}.";

/// Interview context passed along with a code snapshot
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub interview_type: InterviewType,
    pub difficulty: Difficulty,
}

/// Validated result of one code analysis
#[derive(Debug, Clone, PartialEq)]
pub struct CodeAnalysis {
    pub scores: ScoreSet,
    pub narrative: String,
}

/// Scores a code snapshot
#[async_trait]
pub trait CodeAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        code: &str,
        language: &str,
        context: &AnalysisContext,
    ) -> Result<CodeAnalysis, AnalysisError>;
}

/// Wire shape requested from the text-generation service
#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    quality: f64,
    correctness: f64,
    efficiency: f64,
    #[serde(default)]
    narrative: String,
}

impl Validate for AnalysisPayload {
    fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("quality", self.quality),
            ("correctness", self.correctness),
            ("efficiency", self.efficiency),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(format!("{} = {} is outside 0..=100", name, value));
            }
        }
        Ok(())
    }
}

impl From<AnalysisPayload> for CodeAnalysis {
    fn from(payload: AnalysisPayload) -> Self {
        // validate() guarantees the range, so rounding cannot overflow u8
        Self {
            scores: ScoreSet {
                quality: payload.quality.round() as u8,
                correctness: payload.correctness.round() as u8,
                efficiency: payload.efficiency.round() as u8,
            },
            narrative: payload.narrative,
        }
    }
}

/// Decode a (possibly fenced) analysis response
pub fn parse_analysis(raw: &str) -> Result<CodeAnalysis, AnalysisError> {
    let payload: AnalysisPayload = decode_payload(raw)?;
    Ok(payload.into())
}

/// Code analyzer backed by a text-generation service
pub struct LlmCodeAnalyzer {
    llm: Arc<dyn TextGenerator>,
}

impl LlmCodeAnalyzer {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl CodeAnalyzer for LlmCodeAnalyzer {
    async fn analyze(
        &self,
        code: &str,
        language: &str,
        context: &AnalysisContext,
    ) -> Result<CodeAnalysis, AnalysisError> {
        let prompt = format!(
            "Interview type: {}\nDifficulty: {}\nLanguage: {}\n\nCode:\n{}",
            context.interview_type.as_str(),
            context.difficulty.as_str(),
            language,
            code
        );

        debug!("Analyzing {} chars of {}", code.len(), language);

        let raw = self
            .llm
            .complete(SYSTEM_PROMPT, &prompt)
            .await
            .map_err(|e| AnalysisError::Unavailable(e.to_string()))?;

        parse_analysis(&raw).map_err(|e| {
            warn!("Discarding analysis response: {}", e);
            e
        })
    }
}

use crate::ai::{decode_payload, TextGenerator, Validate};
use crate::error::ReportError;
use crate::models::{
    AiAnalysis, CodeAnalysisEntry, CodeSubmission, Difficulty, InterviewType, Role, Scores,
    TranscriptEntry,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Transcript entries sent to the report service
pub const TRANSCRIPT_WINDOW: usize = 20;
/// Analysis history entries sent to the report service
pub const ANALYSIS_WINDOW: usize = 5;

const SYSTEM_PROMPT: &str = "You are an interview coach writing feedback on a finished mock \
interview. Respond with JSON only, using exactly these keys: strengths (array of strings), \
weaknesses (array of strings), recommendations (array of strings), codeReview, \
communicationFeedback, technicalFeedback, overallFeedback, detailedReport (strings).";

/// Everything the narrative service sees about a finished session
#[derive(Debug, Clone, Serialize)]
pub struct ReportRequest {
    pub candidate_name: String,
    pub interview_type: InterviewType,
    pub difficulty: Difficulty,
    pub duration_secs: u64,
    pub scores: Scores,
    pub code: Option<CodeSubmission>,
    pub transcript: Vec<TranscriptEntry>,
    pub analysis_history: Vec<CodeAnalysisEntry>,
    /// Stamped on the resulting report
    #[serde(skip)]
    pub requested_at: DateTime<Utc>,
}

impl ReportRequest {
    /// Build a request, keeping only the most recent transcript and analysis windows
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        candidate_name: &str,
        interview_type: InterviewType,
        difficulty: Difficulty,
        duration_secs: u64,
        scores: Scores,
        code: Option<CodeSubmission>,
        transcript: &[TranscriptEntry],
        analysis_history: &[CodeAnalysisEntry],
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            candidate_name: candidate_name.to_string(),
            interview_type,
            difficulty,
            duration_secs,
            scores,
            code,
            transcript: tail(transcript, TRANSCRIPT_WINDOW),
            analysis_history: tail(analysis_history, ANALYSIS_WINDOW),
            requested_at,
        }
    }

    fn render_prompt(&self) -> String {
        let mut prompt = format!(
            "Candidate: {}\nInterview type: {}\nDifficulty: {}\nDuration: {}s\n\
             Scores: code quality {}, communication {}, problem solving {}, \
             technical knowledge {}, overall {}\n",
            self.candidate_name,
            self.interview_type.as_str(),
            self.difficulty.as_str(),
            self.duration_secs,
            self.scores.code_quality,
            self.scores.communication,
            self.scores.problem_solving,
            self.scores.technical_knowledge,
            self.scores.overall,
        );

        if let Some(code) = &self.code {
            prompt.push_str(&format!("\nFinal code ({}):\n{}\n", code.language, code.code));
        }

        if !self.analysis_history.is_empty() {
            prompt.push_str("\nRecent code analyses:\n");
            for entry in &self.analysis_history {
                prompt.push_str(&format!(
                    "- quality {} correctness {} efficiency {}: {}\n",
                    entry.scores.quality,
                    entry.scores.correctness,
                    entry.scores.efficiency,
                    entry.narrative
                ));
            }
        }

        if !self.transcript.is_empty() {
            prompt.push_str("\nTranscript (most recent):\n");
            for entry in &self.transcript {
                let speaker = match entry.role {
                    Role::Agent => "Interviewer",
                    Role::User => "Candidate",
                };
                prompt.push_str(&format!("{}: {}\n", speaker, entry.content));
            }
        }

        prompt
    }
}

fn tail<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    items[items.len().saturating_sub(n)..].to_vec()
}

/// Produces the narrative report for a completed session
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, request: &ReportRequest) -> Result<AiAnalysis, ReportError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportPayload {
    strengths: Vec<String>,
    weaknesses: Vec<String>,
    recommendations: Vec<String>,
    #[serde(default)]
    code_review: String,
    #[serde(default)]
    communication_feedback: String,
    #[serde(default)]
    technical_feedback: String,
    overall_feedback: String,
    #[serde(default)]
    detailed_report: String,
}

impl Validate for ReportPayload {
    fn validate(&self) -> Result<(), String> {
        if self.overall_feedback.trim().is_empty() {
            return Err("overallFeedback is empty".to_string());
        }
        Ok(())
    }
}

/// Decode a (possibly fenced) report response
pub fn parse_report(raw: &str, generated_at: DateTime<Utc>) -> Result<AiAnalysis, ReportError> {
    let payload: ReportPayload = decode_payload(raw)?;
    Ok(AiAnalysis {
        strengths: payload.strengths,
        weaknesses: payload.weaknesses,
        recommendations: payload.recommendations,
        code_review: payload.code_review,
        communication_feedback: payload.communication_feedback,
        technical_feedback: payload.technical_feedback,
        overall_feedback: payload.overall_feedback,
        detailed_report: payload.detailed_report,
        generated_at,
    })
}

/// Report generator backed by a text-generation service
pub struct LlmReportGenerator {
    llm: Arc<dyn TextGenerator>,
}

impl LlmReportGenerator {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ReportGenerator for LlmReportGenerator {
    async fn generate(&self, request: &ReportRequest) -> Result<AiAnalysis, ReportError> {
        let raw = self
            .llm
            .complete(SYSTEM_PROMPT, &request.render_prompt())
            .await
            .map_err(|e| ReportError::Unavailable(e.to_string()))?;

        parse_report(&raw, request.requested_at)
    }
}

/// Deterministic report used whenever the narrative service cannot deliver
pub fn fallback_report(request: &ReportRequest) -> AiAnalysis {
    AiAnalysis {
        strengths: vec!["Completed the interview session".to_string()],
        weaknesses: vec!["Detailed feedback is unavailable for this session".to_string()],
        recommendations: vec![
            "Review your transcript and code, then try another practice interview".to_string(),
        ],
        code_review: String::new(),
        communication_feedback: String::new(),
        technical_feedback: String::new(),
        overall_feedback: format!(
            "You completed a {} {} interview with an overall score of {}/100.",
            request.difficulty.as_str(),
            request.interview_type.as_str().replace('_', " "),
            request.scores.overall
        ),
        detailed_report: String::new(),
        generated_at: request.requested_at,
    }
}

/// Generate a report, substituting the fallback on failure or timeout
pub async fn generate_or_fallback(
    generator: &dyn ReportGenerator,
    request: &ReportRequest,
    timeout: Duration,
) -> AiAnalysis {
    let outcome = match tokio::time::timeout(timeout, generator.generate(request)).await {
        Ok(result) => result,
        Err(_) => Err(ReportError::Timeout),
    };

    match outcome {
        Ok(report) => {
            info!("Narrative report generated for {}", request.candidate_name);
            report
        }
        Err(e) => {
            warn!("Report generation failed, using fallback: {}", e);
            fallback_report(request)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_report() {
        let raw = "```json\n{\"strengths\":[\"clear\"],\"weaknesses\":[],\"recommendations\":[\"practice\"],\
                   \"codeReview\":\"ok\",\"communicationFeedback\":\"good\",\"technicalFeedback\":\"fine\",\
                   \"overallFeedback\":\"Solid.\",\"detailedReport\":\"...\"}\n```";
        let at = Utc::now();
        let report = parse_report(raw, at).unwrap();
        assert_eq!(report.generated_at, at);
        assert_eq!(report.strengths, vec!["clear"]);
        assert_eq!(report.overall_feedback, "Solid.");
    }

    #[test]
    fn rejects_report_without_overall_feedback() {
        let raw = r#"{"strengths":[],"weaknesses":[],"recommendations":[],"overallFeedback":" "}"#;
        assert!(parse_report(raw, Utc::now()).is_err());
    }

    #[test]
    fn tail_keeps_most_recent() {
        assert_eq!(tail(&[1, 2, 3, 4], 2), vec![3, 4]);
        assert_eq!(tail(&[1], 5), vec![1]);
    }
}

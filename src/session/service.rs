use super::config::SessionConfig;
use super::stats::StatsRollup;
use crate::clock::Clock;
use crate::error::{InterviewError, Result};
use crate::models::{
    CodeAnalysisEntry, CodeSubmission, Difficulty, InterviewType, Session, SessionStatus,
    SessionSummary, TranscriptEntry, UserStats,
};
use crate::registry::{Completion, SessionRegistry, StartOutcome};
use crate::report::{aggregate, generate_or_fallback, ReportGenerator, ReportRequest, ScoreOverrides};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

const MAX_CANDIDATE_NAME_CHARS: usize = 100;
const ROOM_ID_ATTEMPTS: usize = 5;

/// Values supplied by the caller when ending a session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndPayload {
    pub scores: ScoreOverrides,
    /// Final transcript; the stored transcript is used when absent
    pub transcript: Option<Vec<TranscriptEntry>>,
    pub code: Option<CodeInput>,
    pub recording_url: Option<String>,
}

impl EndPayload {
    pub fn validate(&self) -> Result<()> {
        self.scores.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeInput {
    pub code: String,
    pub language: String,
}

/// 16 random bytes, URL-safe base64 (22 chars)
pub fn allocate_room_id() -> String {
    URL_SAFE_NO_PAD.encode(uuid::Uuid::new_v4().as_bytes())
}

/// Owns the valid session transitions:
/// scheduled → in-progress → completed, and scheduled | in-progress → cancelled
pub struct SessionService {
    registry: Arc<dyn SessionRegistry>,
    reports: Arc<dyn ReportGenerator>,
    stats: StatsRollup,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl SessionService {
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        reports: Arc<dyn ReportGenerator>,
        stats: StatsRollup,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self {
            registry,
            reports,
            stats,
            clock,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<dyn SessionRegistry> {
        &self.registry
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Load a session and check that `owner_id` owns it
    pub async fn get(&self, owner_id: &str, room_id: &str) -> Result<Session> {
        let session = self.registry.get(room_id).await?;
        if session.owner_id != owner_id {
            return Err(InterviewError::Forbidden(room_id.to_string()));
        }
        Ok(session)
    }

    pub async fn list(&self, owner_id: &str) -> Result<Vec<SessionSummary>> {
        let sessions = self.registry.list_by_owner(owner_id).await?;
        Ok(sessions.iter().map(Session::summary).collect())
    }

    pub async fn create(
        &self,
        candidate_name: &str,
        interview_type: InterviewType,
        difficulty: Difficulty,
        owner_id: &str,
    ) -> Result<SessionSummary> {
        let candidate_name = candidate_name.trim();
        if candidate_name.is_empty() {
            return Err(InterviewError::Validation(
                "candidate name is required".to_string(),
            ));
        }
        if candidate_name.chars().count() > MAX_CANDIDATE_NAME_CHARS {
            return Err(InterviewError::Validation(format!(
                "candidate name exceeds {} characters",
                MAX_CANDIDATE_NAME_CHARS
            )));
        }
        if owner_id.trim().is_empty() {
            return Err(InterviewError::Validation("owner id is required".to_string()));
        }

        for _ in 0..ROOM_ID_ATTEMPTS {
            let session = Session::scheduled(
                allocate_room_id(),
                owner_id.to_string(),
                candidate_name.to_string(),
                interview_type,
                difficulty,
                self.clock.now(),
            );

            match self.registry.create(session).await {
                Ok(created) => {
                    info!(
                        "Scheduled {} interview {} for {}",
                        interview_type.as_str(),
                        created.room_id,
                        owner_id
                    );
                    return Ok(created.summary());
                }
                Err(InterviewError::DuplicateRoom(room_id)) => {
                    warn!("Room id collision on {}, retrying", room_id);
                }
                Err(e) => return Err(e),
            }
        }

        Err(InterviewError::Storage(
            "could not allocate a unique room id".to_string(),
        ))
    }

    /// scheduled → in-progress. A repeat start on an in-progress session is a no-op.
    pub async fn start(
        &self,
        owner_id: &str,
        room_id: &str,
        external_call_id: Option<String>,
    ) -> Result<StartOutcome> {
        let session = self.get(owner_id, room_id).await?;
        if session.status.is_terminal() {
            return Err(InterviewError::conflict(room_id, session.status, "start"));
        }

        let outcome = self
            .registry
            .start(room_id, external_call_id, self.clock.now())
            .await?;

        if outcome.transitioned {
            info!("Interview {} started", room_id);
        }

        Ok(outcome)
    }

    /// in-progress → completed
    ///
    /// Computes duration and final scores, attaches the narrative report (or its fallback),
    /// persists the record, then updates the owner's statistics on a best-effort basis.
    pub async fn end(&self, owner_id: &str, room_id: &str, payload: EndPayload) -> Result<Session> {
        payload.validate()?;
        let session = self.get(owner_id, room_id).await?;
        if session.status != SessionStatus::InProgress {
            return Err(InterviewError::conflict(room_id, session.status, "end"));
        }

        let end_time = self.clock.now();
        let start_time = session.start_time.unwrap_or(end_time);
        let elapsed_ms = (end_time - start_time).num_milliseconds().max(0);
        let duration = (elapsed_ms as f64 / 1000.0).round() as u64;

        let transcript = payload
            .transcript
            .clone()
            .unwrap_or_else(|| session.transcript.clone());
        let code = payload
            .code
            .map(|input| CodeSubmission {
                code: input.code,
                language: input.language,
                submitted_at: end_time,
            })
            .or_else(|| session.code_submission.clone());

        let scores = aggregate(
            &session.scores,
            session.latest_analysis().map(|entry| &entry.scores),
            &transcript,
            &payload.scores,
        );

        let request = ReportRequest::new(
            &session.candidate_name,
            session.interview_type,
            session.difficulty,
            duration,
            scores,
            code.clone(),
            &transcript,
            &session.code_analysis_history,
            end_time,
        );
        let ai_analysis =
            generate_or_fallback(self.reports.as_ref(), &request, self.config.report_timeout())
                .await;

        let completed = self
            .registry
            .complete(
                room_id,
                Completion {
                    end_time,
                    duration,
                    scores,
                    ai_analysis,
                    transcript: payload.transcript,
                    code,
                    recording_url: payload.recording_url,
                },
            )
            .await?;

        info!(
            "Interview {} completed after {}s, overall {}",
            room_id, duration, completed.scores.overall
        );

        if let Err(e) = self.stats.record(&completed).await {
            warn!("Statistics roll-up failed for {}: {}", room_id, e);
        }

        Ok(completed)
    }

    /// scheduled | in-progress → cancelled
    pub async fn cancel(&self, owner_id: &str, room_id: &str) -> Result<Session> {
        let session = self.get(owner_id, room_id).await?;
        if session.status.is_terminal() {
            return Err(InterviewError::conflict(room_id, session.status, "cancel"));
        }

        let cancelled = self.registry.cancel(room_id, self.clock.now()).await?;
        info!("Interview {} cancelled", room_id);
        Ok(cancelled)
    }

    pub async fn replace_transcript(
        &self,
        owner_id: &str,
        room_id: &str,
        entries: Vec<TranscriptEntry>,
    ) -> Result<()> {
        self.get(owner_id, room_id).await?;
        self.registry.replace_transcript(room_id, entries).await
    }

    pub async fn replace_code_submission(
        &self,
        owner_id: &str,
        room_id: &str,
        input: CodeInput,
    ) -> Result<()> {
        self.get(owner_id, room_id).await?;
        self.registry
            .replace_code_submission(
                room_id,
                CodeSubmission {
                    code: input.code,
                    language: input.language,
                    submitted_at: self.clock.now(),
                },
            )
            .await
    }

    pub async fn append_code_analysis(
        &self,
        owner_id: &str,
        room_id: &str,
        entry: CodeAnalysisEntry,
    ) -> Result<()> {
        self.get(owner_id, room_id).await?;
        self.registry.append_code_analysis(room_id, entry).await
    }

    pub async fn user_stats(&self, owner_id: &str) -> Result<UserStats> {
        self.stats.load(owner_id).await
    }
}

use crate::error::{InterviewError, Result};
use crate::models::{CompletionRecord, Session, SessionStatus, UserStats};
use crate::registry::UserStatsStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Fold a completion into the owner's stats, recomputing every aggregate from history
///
/// A record whose interview id is already present is not appended again, so replaying a
/// completion is harmless and a previously missed update is healed by the next one.
pub fn roll_up(prior: Option<UserStats>, record: CompletionRecord) -> UserStats {
    let prior = prior.unwrap_or_default();
    let prior_best = prior.best_score;
    let mut history = prior.history;

    if !history
        .iter()
        .any(|existing| existing.interview_id == record.interview_id)
    {
        history.push(record.clone());
    }

    let total_interviews = history.len();
    let total_duration = history.iter().map(|r| r.duration).sum();
    let score_sum: u64 = history.iter().map(|r| r.overall_score as u64).sum();
    let average_score = if total_interviews == 0 {
        0
    } else {
        (score_sum as f64 / total_interviews as f64).round() as u8
    };
    let best_score = history
        .iter()
        .map(|r| r.overall_score)
        .max()
        .unwrap_or(0)
        .max(prior_best);

    let mut interviews_by_type = HashMap::new();
    for entry in &history {
        *interviews_by_type.entry(entry.interview_type).or_insert(0) += 1;
    }

    UserStats {
        total_interviews,
        average_score,
        best_score,
        total_duration,
        interviews_by_type,
        last_interview_date: Some(record.completed_at),
        history,
    }
}

/// Compact record for a completed session
pub fn completion_record(session: &Session) -> Result<CompletionRecord> {
    match (session.status, session.completed_at) {
        (SessionStatus::Completed, Some(completed_at)) => Ok(CompletionRecord {
            interview_id: session.id,
            completed_at,
            overall_score: session.scores.overall,
            interview_type: session.interview_type,
            duration: session.duration.unwrap_or(0),
        }),
        (status, _) => Err(InterviewError::conflict(
            &session.room_id,
            status,
            "record statistics",
        )),
    }
}

/// Post-completion statistics update on the owning user's record
pub struct StatsRollup {
    store: Arc<dyn UserStatsStore>,
}

impl StatsRollup {
    pub fn new(store: Arc<dyn UserStatsStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, session: &Session) -> Result<UserStats> {
        let record = completion_record(session)?;
        let stats = self
            .store
            .modify(&session.owner_id, &move |prior| {
                roll_up(prior, record.clone())
            })
            .await?;

        info!(
            "Updated stats for {}: {} interviews, average {}",
            session.owner_id, stats.total_interviews, stats.average_score
        );

        Ok(stats)
    }

    pub async fn load(&self, owner_id: &str) -> Result<UserStats> {
        Ok(self.store.load(owner_id).await?.unwrap_or_default())
    }
}

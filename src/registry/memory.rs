use super::{Completion, SessionRegistry, StartOutcome, UserStatsStore};
use crate::error::{InterviewError, Result};
use crate::models::{
    CodeAnalysisEntry, CodeSubmission, Scores, Session, SessionStatus, TranscriptEntry, UserStats,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    /// room_id → session
    sessions: HashMap<String, Session>,
    /// owner_id → stats
    user_stats: HashMap<String, UserStats>,
}

/// In-memory registry with an optional JSON snapshot file for durability
pub struct MemoryRegistry {
    state: RwLock<Snapshot>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(Snapshot::default()),
            snapshot_path: None,
        }
    }

    /// Open a registry backed by `path`, loading existing records if the file exists
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Snapshot>(&bytes).map_err(|e| {
                InterviewError::Storage(format!("corrupt snapshot {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => {
                return Err(InterviewError::Storage(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        info!(
            "Opened session registry at {} ({} sessions)",
            path.display(),
            snapshot.sessions.len()
        );

        Ok(Self {
            state: RwLock::new(snapshot),
            snapshot_path: Some(path),
        })
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let bytes = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| InterviewError::Storage(e.to_string()))?;

        // Write-then-rename so a crash never leaves a truncated snapshot
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| InterviewError::Storage(format!("write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| InterviewError::Storage(format!("rename {}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Store `session` and persist. A failed write puts the previous record back.
    async fn commit_session(&self, state: &mut Snapshot, session: Session) -> Result<()> {
        let room_id = session.room_id.clone();
        let previous = state.sessions.insert(room_id.clone(), session);

        if let Err(e) = self.persist(state).await {
            warn!("Rolling back room {} after failed write: {}", room_id, e);
            match previous {
                Some(previous) => {
                    state.sessions.insert(room_id, previous);
                }
                None => {
                    state.sessions.remove(&room_id);
                }
            }
            return Err(e);
        }

        Ok(())
    }

    /// Apply `f` to a copy of an in-progress session and commit it
    async fn mutate_live<F>(&self, room_id: &str, action: &'static str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Session) + Send,
    {
        let mut state = self.state.write().await;
        let mut session = state
            .sessions
            .get(room_id)
            .cloned()
            .ok_or_else(|| InterviewError::NotFound(room_id.to_string()))?;

        if session.status != SessionStatus::InProgress {
            warn!("Rejected {} on room {} ({})", action, room_id, session.status);
            return Err(InterviewError::conflict(room_id, session.status, action));
        }

        f(&mut session);
        self.commit_session(&mut state, session).await
    }

    fn find(state: &Snapshot, room_id: &str) -> Result<Session> {
        state
            .sessions
            .get(room_id)
            .cloned()
            .ok_or_else(|| InterviewError::NotFound(room_id.to_string()))
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionRegistry for MemoryRegistry {
    async fn get(&self, room_id: &str) -> Result<Session> {
        let state = self.state.read().await;
        Self::find(&state, room_id)
    }

    async fn create(&self, session: Session) -> Result<Session> {
        let mut state = self.state.write().await;
        if state.sessions.contains_key(&session.room_id) {
            return Err(InterviewError::DuplicateRoom(session.room_id));
        }

        self.commit_session(&mut state, session.clone()).await?;
        Ok(session)
    }

    async fn start(
        &self,
        room_id: &str,
        external_call_id: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<StartOutcome> {
        let mut state = self.state.write().await;
        let mut session = Self::find(&state, room_id)?;

        match session.status {
            SessionStatus::InProgress => {
                debug!("Room {} already in progress, start is a no-op", room_id);
                return Ok(StartOutcome {
                    session,
                    transitioned: false,
                });
            }
            SessionStatus::Scheduled => {}
            status => return Err(InterviewError::conflict(room_id, status, "start")),
        }

        session.status = SessionStatus::InProgress;
        session.start_time = Some(at);
        if external_call_id.is_some() {
            session.external_call_id = external_call_id;
        }
        self.commit_session(&mut state, session.clone()).await?;

        Ok(StartOutcome {
            session,
            transitioned: true,
        })
    }

    async fn append_code_analysis(&self, room_id: &str, entry: CodeAnalysisEntry) -> Result<()> {
        self.mutate_live(room_id, "append code analysis", |session| {
            session.code_analysis_history.push(entry);
        })
        .await
    }

    async fn replace_code_submission(&self, room_id: &str, code: CodeSubmission) -> Result<()> {
        self.mutate_live(room_id, "replace code", |session| {
            session.code_submission = Some(code);
        })
        .await
    }

    async fn replace_transcript(
        &self,
        room_id: &str,
        entries: Vec<TranscriptEntry>,
    ) -> Result<()> {
        self.mutate_live(room_id, "replace transcript", |session| {
            session.transcript = entries;
        })
        .await
    }

    async fn update_scores(&self, room_id: &str, scores: Scores) -> Result<()> {
        self.mutate_live(room_id, "update scores", |session| {
            session.scores = scores;
        })
        .await
    }

    async fn complete(&self, room_id: &str, completion: Completion) -> Result<Session> {
        let mut state = self.state.write().await;
        let mut session = Self::find(&state, room_id)?;

        if session.status != SessionStatus::InProgress {
            return Err(InterviewError::conflict(room_id, session.status, "complete"));
        }

        session.status = SessionStatus::Completed;
        session.end_time = Some(completion.end_time);
        session.completed_at = Some(completion.end_time);
        session.duration = Some(completion.duration);
        session.scores = completion.scores;
        session.ai_analysis = Some(completion.ai_analysis);
        if let Some(transcript) = completion.transcript {
            session.transcript = transcript;
        }
        if let Some(code) = completion.code {
            session.code_submission = Some(code);
        }
        if completion.recording_url.is_some() {
            session.recording_url = completion.recording_url;
        }
        self.commit_session(&mut state, session.clone()).await?;

        Ok(session)
    }

    async fn cancel(&self, room_id: &str, at: DateTime<Utc>) -> Result<Session> {
        let mut state = self.state.write().await;
        let mut session = Self::find(&state, room_id)?;

        if session.status.is_terminal() {
            return Err(InterviewError::conflict(room_id, session.status, "cancel"));
        }

        session.status = SessionStatus::Cancelled;
        session.end_time = Some(at);
        self.commit_session(&mut state, session.clone()).await?;

        Ok(session)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Session>> {
        let state = self.state.read().await;
        let mut sessions: Vec<Session> = state
            .sessions
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }
}

#[async_trait]
impl UserStatsStore for MemoryRegistry {
    async fn load(&self, owner_id: &str) -> Result<Option<UserStats>> {
        let state = self.state.read().await;
        Ok(state.user_stats.get(owner_id).cloned())
    }

    async fn modify(
        &self,
        owner_id: &str,
        update: &(dyn Fn(Option<UserStats>) -> UserStats + Send + Sync),
    ) -> Result<UserStats> {
        let mut state = self.state.write().await;
        let prior = state.user_stats.get(owner_id).cloned();
        let stats = update(prior.clone());
        state
            .user_stats
            .insert(owner_id.to_string(), stats.clone());

        if let Err(e) = self.persist(&state).await {
            match prior {
                Some(prior) => {
                    state.user_stats.insert(owner_id.to_string(), prior);
                }
                None => {
                    state.user_stats.remove(owner_id);
                }
            }
            return Err(e);
        }

        Ok(stats)
    }
}

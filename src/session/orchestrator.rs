use super::live::{LiveDeps, LiveExit, LiveSession, LiveSessionHandle};
use super::service::{CodeInput, EndPayload, SessionService};
use super::state::SessionEvent;
use crate::analysis::CodeEdit;
use crate::error::{InterviewError, Result};
use crate::models::{Session, SessionStatus};
use crate::voice::{CallEvent, CallHandle};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Result of a start request
#[derive(Debug, Clone, Serialize)]
pub struct StartResponse {
    pub session: Session,
    /// Present only when this request created the call
    pub call: Option<CallHandle>,
}

/// Ties the state machine to the voice transport and the live sessions it drives
pub struct Orchestrator {
    deps: LiveDeps,
    /// room_id → running live session
    live: Mutex<HashMap<String, LiveSessionHandle>>,
}

impl Orchestrator {
    pub fn new(deps: LiveDeps) -> Self {
        Self {
            deps,
            live: Mutex::new(HashMap::new()),
        }
    }

    pub fn service(&self) -> &Arc<SessionService> {
        &self.deps.service
    }

    /// Open the call and move the session in progress
    ///
    /// A transport failure leaves the session scheduled so the client can retry. A start on
    /// an in-progress session returns the current state without opening another call.
    pub async fn start_call(&self, owner_id: &str, room_id: &str) -> Result<StartResponse> {
        let session = self.deps.service.get(owner_id, room_id).await?;
        match session.status {
            SessionStatus::Scheduled => {}
            SessionStatus::InProgress => {
                return Ok(StartResponse {
                    session,
                    call: None,
                })
            }
            status => return Err(InterviewError::conflict(room_id, status, "start")),
        }

        let call = self
            .deps
            .transport
            .create_call(room_id, &session.candidate_name)
            .await?;

        let outcome = self
            .deps
            .service
            .start(owner_id, room_id, Some(call.external_call_id.clone()))
            .await?;

        if !outcome.transitioned {
            warn!(
                "Room {} was started concurrently, abandoning call {}",
                room_id, call.external_call_id
            );
            return Ok(StartResponse {
                session: outcome.session,
                call: None,
            });
        }

        let call_events = match self.deps.transport.subscribe(&call.external_call_id).await {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!("No provider event stream for room {}: {}", room_id, e);
                None
            }
        };

        let handle = LiveSession::spawn(&outcome.session, self.deps.clone(), call_events);
        let mut live = self.live.lock().await;
        reap(&mut live);
        live.insert(room_id.to_string(), handle);

        Ok(StartResponse {
            session: outcome.session,
            call: Some(call),
        })
    }

    /// Relay a provider call event into the room's live session
    pub async fn push_event(&self, owner_id: &str, room_id: &str, event: CallEvent) -> Result<()> {
        let session = self.deps.service.get(owner_id, room_id).await?;

        let mut live = self.live.lock().await;
        reap(&mut live);

        match live.get(room_id) {
            Some(handle) => handle.send(SessionEvent::Call(event)).await,
            None => Err(InterviewError::conflict(
                room_id,
                session.status,
                "accept call events",
            )),
        }
    }

    /// Feed an editor snapshot to the debouncer, or store it directly without a live call
    pub async fn push_code(&self, owner_id: &str, room_id: &str, input: CodeInput) -> Result<()> {
        self.deps.service.get(owner_id, room_id).await?;

        {
            let mut live = self.live.lock().await;
            reap(&mut live);
            if let Some(handle) = live.get(room_id) {
                return handle
                    .send(SessionEvent::CodeEdited(CodeEdit {
                        code: input.code,
                        language: input.language,
                    }))
                    .await;
            }
        }

        self.deps
            .service
            .replace_code_submission(owner_id, room_id, input)
            .await
    }

    /// Stop the live session (cancelling its timers) before ending the interview
    ///
    /// The transcript held by the live session is handed to the final record when the caller
    /// did not supply one, so nothing between the last flush and the stop is lost.
    pub async fn end(
        &self,
        owner_id: &str,
        room_id: &str,
        mut payload: EndPayload,
    ) -> Result<Session> {
        self.deps.service.get(owner_id, room_id).await?;
        payload.validate()?;

        if let Some(handle) = self.take_live(room_id).await {
            match handle.stop().await {
                LiveExit::Completed(completed) => {
                    info!("Room {} was finalized by its call ending", room_id);
                    return Err(InterviewError::conflict(room_id, completed.status, "end"));
                }
                LiveExit::Stopped(transcript) => {
                    if payload.transcript.is_none() && !transcript.is_empty() {
                        payload.transcript = Some(transcript);
                    }
                }
                LiveExit::Failed => {}
            }
        }

        self.deps.service.end(owner_id, room_id, payload).await
    }

    pub async fn cancel(&self, owner_id: &str, room_id: &str) -> Result<Session> {
        self.deps.service.get(owner_id, room_id).await?;

        if let Some(handle) = self.take_live(room_id).await {
            if let LiveExit::Stopped(transcript) = handle.stop().await {
                if !transcript.is_empty() {
                    if let Err(e) = self
                        .deps
                        .service
                        .registry()
                        .replace_transcript(room_id, transcript)
                        .await
                    {
                        warn!("Final transcript flush for {} failed: {}", room_id, e);
                    }
                }
            }
        }

        self.deps.service.cancel(owner_id, room_id).await
    }

    /// Wait for a room's live session to finish on its own (call ended or stopped)
    pub async fn wait_for_live(&self, room_id: &str) -> Option<Session> {
        let handle = self.take_live(room_id).await?;
        match handle.wait().await {
            LiveExit::Completed(session) => Some(session),
            LiveExit::Stopped(_) | LiveExit::Failed => None,
        }
    }

    /// Rooms with a running live session
    pub async fn live_rooms(&self) -> Vec<String> {
        let mut live = self.live.lock().await;
        reap(&mut live);
        live.keys().cloned().collect()
    }

    async fn take_live(&self, room_id: &str) -> Option<LiveSessionHandle> {
        self.live.lock().await.remove(room_id)
    }
}

/// Drop handles whose loop already exited
fn reap(live: &mut HashMap<String, LiveSessionHandle>) {
    live.retain(|room_id, handle| {
        let running = !handle.is_finished();
        if !running {
            debug!("Reaped live session for room {}", room_id);
        }
        running
    });
}

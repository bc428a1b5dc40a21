use super::config::SessionConfig;
use super::service::{EndPayload, SessionService};
use super::state::{Command, LiveState, SessionEvent};
use super::transcript::TranscriptSynchronizer;
use crate::analysis::{AnalysisContext, CodeAnalyzer, CodeEdit, Debouncer};
use crate::error::{AnalysisError, InterviewError, Result};
use crate::models::{CodeSubmission, Session, TranscriptEntry};
use crate::voice::{CallEvent, VoiceTransport};
use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Collaborators a live session needs
#[derive(Clone)]
pub struct LiveDeps {
    pub service: Arc<SessionService>,
    pub transport: Arc<dyn VoiceTransport>,
    pub analyzer: Arc<dyn CodeAnalyzer>,
    pub config: SessionConfig,
}

/// How a live session's consumer loop exited
#[derive(Debug)]
pub enum LiveExit {
    /// The call ended and the interview was finalized
    Completed(Session),
    /// Stopped before the call ended. Carries the live transcript, which may be ahead of
    /// the last flush.
    Stopped(Vec<TranscriptEntry>),
    /// Finalizing failed, or the task panicked
    Failed,
}

/// Control handle for a running live session
pub struct LiveSessionHandle {
    events: mpsc::Sender<SessionEvent>,
    task: JoinHandle<LiveExit>,
}

impl LiveSessionHandle {
    pub async fn send(&self, event: SessionEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| InterviewError::Transport("live session has already stopped".to_string()))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop timers and wait for the consumer loop to exit. Yields `Completed` if the call
    /// ended (and the interview was finalized) before the stop request was seen.
    pub async fn stop(self) -> LiveExit {
        let _ = self.events.send(SessionEvent::Shutdown).await;
        self.wait().await
    }

    pub async fn wait(self) -> LiveExit {
        match self.task.await {
            Ok(exit) => exit,
            Err(e) => {
                error!("Live session task panicked: {}", e);
                LiveExit::Failed
            }
        }
    }
}

/// The single consumer of one room's event channel
pub struct LiveSession {
    room_id: String,
    owner_id: String,
    external_call_id: Option<String>,
    analysis_context: AnalysisContext,
    deps: LiveDeps,
    events: mpsc::WeakSender<SessionEvent>,
}

impl LiveSession {
    /// Spawn the consumer loop for an in-progress session
    ///
    /// `call_events` is the provider stream, if one could be subscribed; events can also be
    /// injected through the returned handle.
    pub fn spawn(
        session: &Session,
        deps: LiveDeps,
        call_events: Option<BoxStream<'static, CallEvent>>,
    ) -> LiveSessionHandle {
        let (tx, rx) = mpsc::channel(deps.config.event_buffer.max(1));

        let state = LiveState::new(
            session.transcript.clone(),
            session.scores,
            session
                .code_analysis_history
                .iter()
                .map(|entry| entry.sequence)
                .max()
                .unwrap_or(0),
        );

        let (transcript_tx, transcript_rx) = watch::channel(session.transcript.clone());
        let synchronizer = TranscriptSynchronizer::spawn(
            session.room_id.clone(),
            Arc::clone(deps.service.registry()),
            deps.config.flush_interval(),
            transcript_rx,
        );

        let debouncer = Debouncer::spawn(
            deps.config.debounce_window(),
            deps.config.min_code_chars,
            tx.clone(),
            SessionEvent::CodeSettled,
        );

        let forwarder = call_events.map(|stream| {
            let tx = tx.clone();
            tokio::spawn(forward_call_events(stream, tx))
        });

        let live = LiveSession {
            room_id: session.room_id.clone(),
            owner_id: session.owner_id.clone(),
            external_call_id: session.external_call_id.clone(),
            analysis_context: AnalysisContext {
                interview_type: session.interview_type,
                difficulty: session.difficulty,
            },
            deps,
            events: tx.downgrade(),
        };

        info!("Live session started for room {}", live.room_id);

        let task = tokio::spawn(live.run(
            rx,
            state,
            Timers {
                debouncer,
                synchronizer,
                forwarder,
            },
            transcript_tx,
        ));

        LiveSessionHandle { events: tx, task }
    }

    async fn run(
        self,
        mut rx: mpsc::Receiver<SessionEvent>,
        mut state: LiveState,
        timers: Timers,
        transcript_tx: watch::Sender<Vec<TranscriptEntry>>,
    ) -> LiveExit {
        while let Some(event) = rx.recv().await {
            let now = self.deps.service.clock().now();

            for command in state.apply(event, now) {
                match command {
                    Command::MarkStarted { call_id } => {
                        if let Err(e) = self
                            .deps
                            .service
                            .start(&self.owner_id, &self.room_id, call_id)
                            .await
                        {
                            warn!("Start on call_started failed for {}: {}", self.room_id, e);
                        }
                    }
                    Command::Debounce(edit) => {
                        if !timers.debouncer.push(edit) {
                            warn!("Debouncer for room {} is gone", self.room_id);
                        }
                    }
                    Command::PublishTranscript(entries) => {
                        transcript_tx.send_replace(entries);
                    }
                    Command::PersistCode(edit) => self.persist_code(edit, now).await,
                    Command::Analyze { sequence, edit } => self.spawn_analysis(sequence, edit),
                    Command::RecordAnalysis(entry) => {
                        if let Err(e) = self
                            .deps
                            .service
                            .registry()
                            .append_code_analysis(&self.room_id, entry)
                            .await
                        {
                            warn!("Dropping analysis for room {}: {}", self.room_id, e);
                        }
                    }
                    Command::PersistScores(scores) => {
                        if let Err(e) = self
                            .deps
                            .service
                            .registry()
                            .update_scores(&self.room_id, scores)
                            .await
                        {
                            warn!("Live scores not saved for room {}: {}", self.room_id, e);
                        }
                    }
                    Command::Finish => {
                        timers.cancel().await;
                        return self.finish(state).await;
                    }
                    Command::Stop => {
                        timers.cancel().await;
                        info!("Live session stopped for room {}", self.room_id);
                        return LiveExit::Stopped(state.into_transcript());
                    }
                }
            }
        }

        timers.cancel().await;
        LiveExit::Stopped(state.into_transcript())
    }

    async fn persist_code(&self, edit: CodeEdit, now: chrono::DateTime<chrono::Utc>) {
        let submission = CodeSubmission {
            code: edit.code,
            language: edit.language,
            submitted_at: now,
        };
        if let Err(e) = self
            .deps
            .service
            .registry()
            .replace_code_submission(&self.room_id, submission)
            .await
        {
            warn!("Code submission not saved for room {}: {}", self.room_id, e);
        }
    }

    /// Run the analyzer detached; the result comes back as an event
    fn spawn_analysis(&self, sequence: u64, edit: CodeEdit) {
        let Some(events) = self.events.upgrade() else {
            return;
        };
        let analyzer = Arc::clone(&self.deps.analyzer);
        let context = self.analysis_context.clone();
        let timeout = self.deps.config.analysis_timeout();

        debug!("Dispatching analysis #{} for room {}", sequence, self.room_id);

        tokio::spawn(async move {
            let result = match tokio::time::timeout(
                timeout,
                analyzer.analyze(&edit.code, &edit.language, &context),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(AnalysisError::Timeout),
            };

            // The receiver is gone once the session stopped; the result is discarded
            let _ = events
                .send(SessionEvent::AnalysisFinished {
                    sequence,
                    code: edit.code,
                    result,
                })
                .await;
        });
    }

    /// End the interview after the call ended. Timers are already cancelled.
    async fn finish(self, state: LiveState) -> LiveExit {
        let transcript = state.into_transcript();
        let mut payload = EndPayload {
            transcript: (!transcript.is_empty()).then_some(transcript),
            ..EndPayload::default()
        };

        if let Some(call_id) = &self.external_call_id {
            match self.deps.transport.fetch_call_artifacts(call_id).await {
                Ok(artifacts) => {
                    payload.recording_url = artifacts.recording_url;
                    if payload.transcript.is_none() && !artifacts.transcript.is_empty() {
                        // Provider utterances carry no timestamps
                        let now = self.deps.service.clock().now();
                        payload.transcript = Some(
                            artifacts
                                .transcript
                                .into_iter()
                                .map(|u| TranscriptEntry {
                                    role: u.role,
                                    content: u.content,
                                    timestamp: now,
                                })
                                .collect(),
                        );
                    }
                }
                Err(e) => warn!("Call artifacts unavailable for {}: {}", call_id, e),
            }
        }

        match self
            .deps
            .service
            .end(&self.owner_id, &self.room_id, payload)
            .await
        {
            Ok(session) => LiveExit::Completed(session),
            Err(e) => {
                error!("Failed to end interview {}: {}", self.room_id, e);
                LiveExit::Failed
            }
        }
    }
}

/// Background sources feeding one live session
struct Timers {
    debouncer: Debouncer,
    synchronizer: TranscriptSynchronizer,
    forwarder: Option<JoinHandle<()>>,
}

impl Timers {
    async fn cancel(self) {
        self.debouncer.cancel();
        if let Some(forwarder) = self.forwarder {
            forwarder.abort();
        }
        self.synchronizer.stop().await;
    }
}

async fn forward_call_events(
    mut stream: BoxStream<'static, CallEvent>,
    tx: mpsc::Sender<SessionEvent>,
) {
    while let Some(event) = stream.next().await {
        let terminal = matches!(event, CallEvent::CallEnded { .. });
        if tx.send(SessionEvent::Call(event)).await.is_err() || terminal {
            break;
        }
    }
}

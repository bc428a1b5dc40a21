//! Explicit state of one live interview
//!
//! All asynchronous sources (transport events, the debouncer, analyzer completions) are
//! turned into [`SessionEvent`]s on a single ordered channel. [`LiveState::apply`] consumes
//! them one at a time and answers with the [`Command`]s the consumer loop must execute, so
//! there is exactly one writer of the in-memory session snapshot.

use crate::analysis::{CodeAnalysis, CodeEdit};
use crate::error::AnalysisError;
use crate::models::{CodeAnalysisEntry, Scores, TranscriptEntry};
use crate::report::{apply_analysis, overall_score};
use crate::voice::{CallEvent, Utterance};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum SessionEvent {
    Call(CallEvent),
    /// Raw editor snapshot, to be debounced
    CodeEdited(CodeEdit),
    /// Snapshot that survived the idle window
    CodeSettled(CodeEdit),
    AnalysisFinished {
        sequence: u64,
        code: String,
        result: Result<CodeAnalysis, AnalysisError>,
    },
    /// Stop the live session without ending the interview
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Idempotent registry start for the reported call
    MarkStarted { call_id: Option<String> },
    Debounce(CodeEdit),
    PublishTranscript(Vec<TranscriptEntry>),
    PersistCode(CodeEdit),
    Analyze { sequence: u64, edit: CodeEdit },
    RecordAnalysis(CodeAnalysisEntry),
    PersistScores(Scores),
    /// Cancel timers, then end the interview
    Finish,
    /// Cancel timers and exit
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Session started, provider has not confirmed the call yet
    AwaitingCall,
    Active,
    Ended,
}

pub struct LiveState {
    phase: Phase,
    transcript: Vec<TranscriptEntry>,
    scores: Scores,
    /// Sequence handed to the most recent analysis request
    requested_sequence: u64,
    /// Sequence of the analysis whose scores are currently applied
    applied_sequence: u64,
    agent_talking: bool,
}

impl LiveState {
    /// Resume from the stored transcript and live scores
    pub fn new(transcript: Vec<TranscriptEntry>, scores: Scores, last_sequence: u64) -> Self {
        Self {
            phase: Phase::AwaitingCall,
            transcript,
            scores,
            requested_sequence: last_sequence,
            applied_sequence: last_sequence,
            agent_talking: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn scores(&self) -> &Scores {
        &self.scores
    }

    pub fn agent_talking(&self) -> bool {
        self.agent_talking
    }

    pub fn into_transcript(self) -> Vec<TranscriptEntry> {
        self.transcript
    }

    pub fn apply(&mut self, event: SessionEvent, now: DateTime<Utc>) -> Vec<Command> {
        if self.phase == Phase::Ended {
            match &event {
                SessionEvent::AnalysisFinished { sequence, .. } => {
                    debug!("Discarding analysis #{} that finished after the call", sequence)
                }
                other => debug!("Ignoring {:?} after call end", other),
            }
            return Vec::new();
        }

        match event {
            SessionEvent::Call(call_event) => self.apply_call_event(call_event, now),
            SessionEvent::CodeEdited(edit) => vec![Command::Debounce(edit)],
            SessionEvent::CodeSettled(edit) => {
                self.requested_sequence += 1;
                vec![
                    Command::PersistCode(edit.clone()),
                    Command::Analyze {
                        sequence: self.requested_sequence,
                        edit,
                    },
                ]
            }
            SessionEvent::AnalysisFinished {
                sequence,
                code,
                result,
            } => self.apply_analysis(sequence, code, result, now),
            SessionEvent::Shutdown => {
                self.phase = Phase::Ended;
                vec![Command::Stop]
            }
        }
    }

    fn apply_call_event(&mut self, event: CallEvent, now: DateTime<Utc>) -> Vec<Command> {
        match event {
            CallEvent::CallStarted { call_id } => {
                if self.phase == Phase::Active {
                    debug!("Duplicate call_started ignored");
                    return Vec::new();
                }
                self.phase = Phase::Active;
                info!("Call started");
                vec![Command::MarkStarted { call_id }]
            }
            CallEvent::Update { transcript } => {
                if self.phase != Phase::Active {
                    warn!("Transcript update before call_started dropped");
                    return Vec::new();
                }
                if self.merge_transcript(transcript, now) {
                    vec![Command::PublishTranscript(self.transcript.clone())]
                } else {
                    Vec::new()
                }
            }
            CallEvent::AgentStartTalking => {
                self.agent_talking = true;
                Vec::new()
            }
            CallEvent::AgentStopTalking => {
                self.agent_talking = false;
                Vec::new()
            }
            CallEvent::Error { message } => {
                warn!("Voice transport reported an error: {}", message);
                Vec::new()
            }
            CallEvent::CallEnded { reason } => {
                info!("Call ended ({})", reason.as_deref().unwrap_or("no reason given"));
                self.phase = Phase::Ended;
                vec![Command::Finish]
            }
        }
    }

    /// Replace entries in place by position, appending new ones. Returns true on change.
    fn merge_transcript(&mut self, utterances: Vec<Utterance>, now: DateTime<Utc>) -> bool {
        let mut changed = false;

        for (index, utterance) in utterances.into_iter().enumerate() {
            match self.transcript.get_mut(index) {
                Some(existing) => {
                    if existing.role != utterance.role || existing.content != utterance.content {
                        existing.role = utterance.role;
                        existing.content = utterance.content;
                        changed = true;
                    }
                }
                None => {
                    self.transcript.push(TranscriptEntry {
                        role: utterance.role,
                        content: utterance.content,
                        timestamp: now,
                    });
                    changed = true;
                }
            }
        }

        changed
    }

    fn apply_analysis(
        &mut self,
        sequence: u64,
        code: String,
        result: Result<CodeAnalysis, AnalysisError>,
        now: DateTime<Utc>,
    ) -> Vec<Command> {
        let analysis = match result {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("Analysis #{} failed, keeping prior scores: {}", sequence, e);
                return Vec::new();
            }
        };

        let mut commands = vec![Command::RecordAnalysis(CodeAnalysisEntry {
            sequence,
            code_snapshot: code,
            narrative: analysis.narrative,
            scores: analysis.scores,
            timestamp: now,
        })];

        if sequence > self.applied_sequence {
            self.applied_sequence = sequence;
            apply_analysis(&mut self.scores, &analysis.scores);
            self.scores.overall = overall_score(&self.scores);
            commands.push(Command::PersistScores(self.scores));
        } else {
            debug!(
                "Analysis #{} superseded by #{}, history only",
                sequence, self.applied_sequence
            );
        }

        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, ScoreSet};

    fn edit(code: &str) -> CodeEdit {
        CodeEdit {
            code: code.to_string(),
            language: "rust".to_string(),
        }
    }

    fn finished(sequence: u64, quality: u8) -> SessionEvent {
        SessionEvent::AnalysisFinished {
            sequence,
            code: format!("snapshot {}", sequence),
            result: Ok(CodeAnalysis {
                scores: ScoreSet {
                    quality,
                    correctness: quality,
                    efficiency: quality,
                },
                narrative: String::new(),
            }),
        }
    }

    fn active() -> LiveState {
        let mut state = LiveState::new(Vec::new(), Scores::default(), 0);
        state.apply(
            SessionEvent::Call(CallEvent::CallStarted { call_id: None }),
            Utc::now(),
        );
        state
    }

    #[test]
    fn updates_before_call_started_are_dropped() {
        let mut state = LiveState::new(Vec::new(), Scores::default(), 0);
        let commands = state.apply(
            SessionEvent::Call(CallEvent::Update {
                transcript: vec![Utterance {
                    role: Role::Agent,
                    content: "Hello".to_string(),
                }],
            }),
            Utc::now(),
        );
        assert!(commands.is_empty());
        assert!(state.transcript().is_empty());
    }

    #[test]
    fn transcript_updates_replace_in_place() {
        let mut state = active();
        let now = Utc::now();
        let update = |text: &str| {
            SessionEvent::Call(CallEvent::Update {
                transcript: vec![
                    Utterance {
                        role: Role::Agent,
                        content: "Tell me about yourself".to_string(),
                    },
                    Utterance {
                        role: Role::User,
                        content: text.to_string(),
                    },
                ],
            })
        };

        state.apply(update("I am"), now);
        let commands = state.apply(update("I am a backend engineer"), now);

        assert_eq!(state.transcript().len(), 2);
        assert_eq!(state.transcript()[1].content, "I am a backend engineer");
        assert!(matches!(commands.as_slice(), [Command::PublishTranscript(t)] if t.len() == 2));

        // Identical update: nothing to publish
        assert!(state.apply(update("I am a backend engineer"), now).is_empty());
    }

    #[test]
    fn settled_code_is_persisted_then_analyzed_with_increasing_sequence() {
        let mut state = active();
        let first = state.apply(SessionEvent::CodeSettled(edit("fn a() {}")), Utc::now());
        let second = state.apply(SessionEvent::CodeSettled(edit("fn b() {}")), Utc::now());

        assert_eq!(first[0], Command::PersistCode(edit("fn a() {}")));
        assert!(matches!(first[1], Command::Analyze { sequence: 1, .. }));
        assert!(matches!(second[1], Command::Analyze { sequence: 2, .. }));
    }

    #[test]
    fn stale_analysis_goes_to_history_only() {
        let mut state = active();
        state.apply(SessionEvent::CodeSettled(edit("v1")), Utc::now());
        state.apply(SessionEvent::CodeSettled(edit("v2")), Utc::now());

        let newer = state.apply(finished(2, 90), Utc::now());
        assert_eq!(newer.len(), 2);
        assert_eq!(state.scores().code_quality, 90);

        let older = state.apply(finished(1, 40), Utc::now());
        assert_eq!(older.len(), 1);
        assert!(matches!(older[0], Command::RecordAnalysis(ref e) if e.sequence == 1));
        assert_eq!(state.scores().code_quality, 90);
    }

    #[test]
    fn failed_analysis_keeps_scores() {
        let mut state = active();
        let commands = state.apply(
            SessionEvent::AnalysisFinished {
                sequence: 1,
                code: "fn main() {}".to_string(),
                result: Err(AnalysisError::Timeout),
            },
            Utc::now(),
        );
        assert!(commands.is_empty());
        assert_eq!(*state.scores(), Scores::default());
    }

    #[test]
    fn nothing_is_processed_after_call_ended() {
        let mut state = active();
        let commands = state.apply(
            SessionEvent::Call(CallEvent::CallEnded { reason: None }),
            Utc::now(),
        );
        assert_eq!(commands, vec![Command::Finish]);
        assert_eq!(state.phase(), Phase::Ended);

        assert!(state.apply(finished(1, 99), Utc::now()).is_empty());
        assert!(state
            .apply(SessionEvent::CodeSettled(edit("late code")), Utc::now())
            .is_empty());
        assert_eq!(state.scores().code_quality, 0);
    }

    #[test]
    fn agent_talking_is_tracked() {
        let mut state = active();
        state.apply(SessionEvent::Call(CallEvent::AgentStartTalking), Utc::now());
        assert!(state.agent_talking());
        state.apply(SessionEvent::Call(CallEvent::AgentStopTalking), Utc::now());
        assert!(!state.agent_talking());
    }
}

use crate::models::Role;
use serde::{Deserialize, Serialize};

/// One utterance as reported by the voice provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub role: Role,
    pub content: String,
}

/// Typed call event emitted by the voice provider
///
/// Ordering contract: `CallStarted` precedes any `Update`; `CallEnded` is final.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CallEvent {
    CallStarted {
        #[serde(default)]
        call_id: Option<String>,
    },
    CallEnded {
        #[serde(default)]
        reason: Option<String>,
    },
    AgentStartTalking,
    AgentStopTalking,
    /// The provider's running transcript of the call
    Update { transcript: Vec<Utterance> },
    Error { message: String },
}

impl CallEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CallEvent::CallStarted { .. } => "call_started",
            CallEvent::CallEnded { .. } => "call_ended",
            CallEvent::AgentStartTalking => "agent_start_talking",
            CallEvent::AgentStopTalking => "agent_stop_talking",
            CallEvent::Update { .. } => "update",
            CallEvent::Error { .. } => "error",
        }
    }
}

/// Envelope published on the NATS relay subject for a call
#[derive(Debug, Serialize, Deserialize)]
pub struct CallEventMessage {
    pub call_id: String,
    /// RFC3339 timestamp
    pub timestamp: String,
    #[serde(flatten)]
    pub event: CallEvent,
}

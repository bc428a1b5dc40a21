//! Interview session lifecycle
//!
//! This module provides:
//! - `SessionService`: the state machine (create, start, end, cancel) over the registry
//! - `LiveSession`: the single consumer loop driving an in-progress room
//! - `TranscriptSynchronizer`: periodic transcript flushes into the registry
//! - `StatsRollup`: per-user statistics recomputed on every completion
//! - `Orchestrator`: glue between the state machine, the voice transport and live sessions

mod config;
mod live;
mod orchestrator;
mod service;
mod state;
mod stats;
mod transcript;

pub use config::SessionConfig;
pub use live::{LiveDeps, LiveExit, LiveSession, LiveSessionHandle};
pub use orchestrator::{Orchestrator, StartResponse};
pub use service::{allocate_room_id, CodeInput, EndPayload, SessionService};
pub use state::{Command, LiveState, Phase, SessionEvent};
pub use stats::{completion_record, roll_up, StatsRollup};
pub use transcript::TranscriptSynchronizer;

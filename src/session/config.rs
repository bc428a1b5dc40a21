use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing and threshold settings for live interview sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle period after the last code edit before the buffer is analyzed
    /// Default: 3000 ms
    pub debounce_ms: u64,

    /// Code buffers at or below this many (trimmed) characters are not analyzed
    pub min_code_chars: usize,

    /// How often the in-memory transcript is flushed to the registry
    /// Default: 10 seconds
    pub transcript_flush_secs: u64,

    /// Upper bound on a single code analysis call
    pub analysis_timeout_secs: u64,

    /// Upper bound on narrative report generation at completion
    pub report_timeout_secs: u64,

    /// Capacity of each live session's event channel
    pub event_buffer: usize,
}

impl SessionConfig {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.transcript_flush_secs)
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }

    pub fn report_timeout(&self) -> Duration {
        Duration::from_secs(self.report_timeout_secs)
    }

    /// Reject settings that would stall a live session or panic a timer
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.transcript_flush_secs > 0,
            "session.transcript_flush_secs must be positive"
        );
        ensure!(
            self.analysis_timeout_secs > 0,
            "session.analysis_timeout_secs must be positive"
        );
        ensure!(
            self.report_timeout_secs > 0,
            "session.report_timeout_secs must be positive"
        );
        ensure!(self.event_buffer > 0, "session.event_buffer must be positive");
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 3000,
            min_code_chars: 20,
            transcript_flush_secs: 10,
            analysis_timeout_secs: 30,
            report_timeout_secs: 45,
            event_buffer: 256,
        }
    }
}

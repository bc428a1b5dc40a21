// Shared test doubles for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures::stream::{BoxStream, StreamExt};
use loqa_interviews::analysis::{AnalysisContext, CodeAnalysis, CodeAnalyzer};
use loqa_interviews::error::{AnalysisError, InterviewError, ReportError, Result};
use loqa_interviews::models::{AiAnalysis, ScoreSet, UserStats};
use loqa_interviews::registry::{MemoryRegistry, UserStatsStore};
use loqa_interviews::report::{ReportGenerator, ReportRequest};
use loqa_interviews::voice::{CallArtifacts, CallEvent, CallHandle, Utterance, VoiceTransport};
use loqa_interviews::{
    LiveDeps, ManualClock, Orchestrator, SessionConfig, SessionService, StatsRollup,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const OWNER: &str = "user-1";
pub const OTHER_OWNER: &str = "user-2";

// ============================================================================
// Voice transport
// ============================================================================

#[derive(Default)]
pub struct MockTransport {
    pub fail_create: AtomicBool,
    pub calls_created: AtomicUsize,
    pub recording_url: Mutex<Option<String>>,
    /// Final transcript reported by the provider after the call
    pub provider_transcript: Mutex<Vec<Utterance>>,
    /// Sender side of the event stream handed out by `subscribe`
    pub events: Mutex<Option<futures::channel::mpsc::UnboundedSender<CallEvent>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit an event on the most recently subscribed call
    pub fn emit(&self, event: CallEvent) {
        if let Some(tx) = self.events.lock().unwrap().as_ref() {
            tx.unbounded_send(event).unwrap();
        }
    }
}

#[async_trait]
impl VoiceTransport for MockTransport {
    async fn create_call(&self, room_id: &str, _display_name: &str) -> Result<CallHandle> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(InterviewError::Transport("provider unreachable".to_string()));
        }
        let n = self.calls_created.fetch_add(1, Ordering::SeqCst);
        Ok(CallHandle {
            access_credential: format!("token-{}", n),
            external_call_id: format!("call-{}-{}", room_id, n),
        })
    }

    async fn fetch_call_artifacts(&self, _external_call_id: &str) -> Result<CallArtifacts> {
        Ok(CallArtifacts {
            recording_url: self.recording_url.lock().unwrap().clone(),
            transcript: self.provider_transcript.lock().unwrap().clone(),
        })
    }

    async fn subscribe(&self, _external_call_id: &str) -> Result<BoxStream<'static, CallEvent>> {
        let (tx, rx) = futures::channel::mpsc::unbounded();
        *self.events.lock().unwrap() = Some(tx);
        Ok(rx.boxed())
    }
}

// ============================================================================
// Code analyzer
// ============================================================================

/// Answers every request with the same scores after an optional delay
pub struct ScriptedAnalyzer {
    pub delay: Duration,
    pub scores: Mutex<VecDeque<std::result::Result<ScoreSet, AnalysisError>>>,
    pub requests: Mutex<Vec<String>>,
}

impl ScriptedAnalyzer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            scores: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn enqueue(&self, result: std::result::Result<ScoreSet, AnalysisError>) {
        self.scores.lock().unwrap().push_back(result);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CodeAnalyzer for ScriptedAnalyzer {
    async fn analyze(
        &self,
        code: &str,
        _language: &str,
        _context: &AnalysisContext,
    ) -> std::result::Result<CodeAnalysis, AnalysisError> {
        self.requests.lock().unwrap().push(code.to_string());
        let next = self.scores.lock().unwrap().pop_front();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let scores = next.unwrap_or(Ok(score_set(70, 70, 70)))?;
        Ok(CodeAnalysis {
            scores,
            narrative: format!("analysis of {} chars", code.len()),
        })
    }
}

pub fn score_set(quality: u8, correctness: u8, efficiency: u8) -> ScoreSet {
    ScoreSet {
        quality,
        correctness,
        efficiency,
    }
}

// ============================================================================
// Report generator
// ============================================================================

pub struct CannedReports;

#[async_trait]
impl ReportGenerator for CannedReports {
    async fn generate(
        &self,
        request: &ReportRequest,
    ) -> std::result::Result<AiAnalysis, ReportError> {
        Ok(AiAnalysis {
            strengths: vec!["Structured answers".to_string()],
            weaknesses: vec!["Edge cases".to_string()],
            recommendations: vec!["Practice testing".to_string()],
            code_review: "Readable".to_string(),
            communication_feedback: "Clear".to_string(),
            technical_feedback: "Solid".to_string(),
            overall_feedback: "Good interview".to_string(),
            detailed_report: "...".to_string(),
            generated_at: request.requested_at,
        })
    }
}

pub struct UnreachableReports;

#[async_trait]
impl ReportGenerator for UnreachableReports {
    async fn generate(
        &self,
        _request: &ReportRequest,
    ) -> std::result::Result<AiAnalysis, ReportError> {
        Err(ReportError::Unavailable("connection refused".to_string()))
    }
}

// ============================================================================
// Statistics store that always fails
// ============================================================================

pub struct BrokenStatsStore;

#[async_trait]
impl UserStatsStore for BrokenStatsStore {
    async fn load(&self, _owner_id: &str) -> Result<Option<UserStats>> {
        Err(InterviewError::Storage("stats store offline".to_string()))
    }

    async fn modify(
        &self,
        _owner_id: &str,
        _update: &(dyn Fn(Option<UserStats>) -> UserStats + Send + Sync),
    ) -> Result<UserStats> {
        Err(InterviewError::Storage("stats store offline".to_string()))
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub registry: Arc<MemoryRegistry>,
    pub clock: Arc<ManualClock>,
    pub transport: Arc<MockTransport>,
    pub analyzer: Arc<ScriptedAnalyzer>,
    pub service: Arc<SessionService>,
    pub orchestrator: Arc<Orchestrator>,
}

pub struct HarnessBuilder {
    reports: Arc<dyn ReportGenerator>,
    stats: Option<Arc<dyn UserStatsStore>>,
    analyzer_delay: Duration,
    config: SessionConfig,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            reports: Arc::new(CannedReports),
            stats: None,
            analyzer_delay: Duration::ZERO,
            config: SessionConfig::default(),
        }
    }

    pub fn reports(mut self, reports: Arc<dyn ReportGenerator>) -> Self {
        self.reports = reports;
        self
    }

    pub fn stats(mut self, stats: Arc<dyn UserStatsStore>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn analyzer_delay(mut self, delay: Duration) -> Self {
        self.analyzer_delay = delay;
        self
    }

    pub fn build(self) -> Harness {
        let registry = Arc::new(MemoryRegistry::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let transport = Arc::new(MockTransport::new());
        let analyzer = Arc::new(ScriptedAnalyzer::new(self.analyzer_delay));
        let stats_store: Arc<dyn UserStatsStore> = match self.stats {
            Some(store) => store,
            None => registry.clone(),
        };

        let service = Arc::new(SessionService::new(
            registry.clone(),
            self.reports,
            StatsRollup::new(stats_store),
            clock.clone(),
            self.config.clone(),
        ));

        let orchestrator = Arc::new(Orchestrator::new(LiveDeps {
            service: service.clone(),
            transport: transport.clone(),
            analyzer: analyzer.clone(),
            config: self.config,
        }));

        Harness {
            registry,
            clock,
            transport,
            analyzer,
            service,
            orchestrator,
        }
    }
}

pub fn harness() -> Harness {
    HarnessBuilder::new().build()
}

pub fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 27, 14, 30, 0).unwrap()
}

/// Let spawned tasks drain their queues without moving paused time
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

pub mod ai;
pub mod analysis;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod models;
pub mod registry;
pub mod report;
pub mod session;
pub mod voice;

pub use analysis::{CodeAnalyzer, CodeEdit, Debouncer, LlmCodeAnalyzer};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{AnalysisError, InterviewError, ReportError, Result};
pub use http::{create_router, AppState};
pub use identity::{IdentityResolver, StaticTokens};
pub use models::{Session, SessionStatus, UserStats};
pub use registry::{MemoryRegistry, SessionRegistry, UserStatsStore};
pub use report::{LlmReportGenerator, ReportGenerator};
pub use session::{LiveDeps, Orchestrator, SessionConfig, SessionService, StatsRollup};
pub use voice::{CallEvent, NatsEventRelay, ProviderApi, ProviderTransport, VoiceTransport};

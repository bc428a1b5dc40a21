use anyhow::{Context, Result};
use clap::Parser;
use loqa_interviews::ai::{ChatCompletionsClient, TextGenerator};
use loqa_interviews::{
    create_router, AppState, Config, LiveDeps, LlmCodeAnalyzer, LlmReportGenerator,
    MemoryRegistry, NatsEventRelay, Orchestrator, ProviderApi, ProviderTransport,
    SessionService, StaticTokens, StatsRollup, SystemClock,
};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "loqa-interviews", about = "Mock interview session orchestrator")]
struct Args {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/loqa-interviews")]
    config: String,

    /// Override the configured HTTP port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Loqa Interviews v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let registry = Arc::new(match &cfg.registry.snapshot_path {
        Some(path) => MemoryRegistry::open(path)
            .await
            .context("Failed to open session registry")?,
        None => MemoryRegistry::new(),
    });

    let llm: Arc<dyn TextGenerator> = Arc::new(ChatCompletionsClient::new(&cfg.ai)?);

    let relay = NatsEventRelay::connect(&cfg.voice.nats_url).await?;
    let transport = Arc::new(ProviderTransport::new(ProviderApi::new(&cfg.voice), relay));

    let service = Arc::new(SessionService::new(
        registry.clone(),
        Arc::new(LlmReportGenerator::new(Arc::clone(&llm))),
        StatsRollup::new(registry.clone()),
        Arc::new(SystemClock),
        cfg.session.clone(),
    ));

    let orchestrator = Arc::new(Orchestrator::new(LiveDeps {
        service,
        transport,
        analyzer: Arc::new(LlmCodeAnalyzer::new(llm)),
        config: cfg.session.clone(),
    }));

    let state = AppState::new(orchestrator, Arc::new(StaticTokens::new(cfg.auth.tokens)));
    let app = create_router(state);

    let port = args.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", cfg.service.http.bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use mock_interview::{create_router, AppState, Config, Language};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mock-interview", about = "Mock interview practice API")]
struct Args {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/mock-interview")]
    config: String,

    /// Override the HTTP port from the config file
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the default content language (en, zh)
    #[arg(short, long)]
    lang: Option<Language>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }
    if let Some(lang) = args.lang {
        cfg.session.default_language = lang;
    }

    info!("Mock Interview v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!(
        "Simulated API latency: list={}ms fetch={}ms submit={}ms evaluate={}ms",
        cfg.api.question_list_ms,
        cfg.api.question_fetch_ms,
        cfg.api.submit_ms,
        cfg.api.evaluate_ms
    );

    let state = AppState::from_config(&cfg);
    let sessions = state.sessions.clone();
    let app = create_router(state);

    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await
        .context("HTTP server failed")?;

    // Release every device still held before exiting
    for (_, session) in sessions.write().await.drain() {
        session.shutdown();
    }

    info!("Stopped");
    Ok(())
}

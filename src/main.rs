use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mindy::config::{Args, Settings};
use mindy::{Coordinator, Limiter, MemoryEngine, PilosaClient, server};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let settings = match Settings::load(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(settings, args.memory).await {
        error!(error = %e, "mindy stopped");
        std::process::exit(1);
    }
}

async fn run(settings: Settings, memory: bool) -> mindy::Result<()> {
    let limiter = Limiter::new(settings.concurrency)?;
    let capacity = limiter.capacity();
    let app = if memory {
        info!("serving from an empty in-memory engine");
        let coordinator = Coordinator::new(Arc::new(MemoryEngine::new()), limiter);
        server::router(coordinator.with_shard_fanout(settings.shard_fanout))
    } else {
        let client = PilosaClient::new(settings.pilosa.clone(), settings.engine_timeout())?;
        let coordinator = Coordinator::new(Arc::new(client), limiter);
        server::router(coordinator.with_shard_fanout(settings.shard_fanout))
    };

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| mindy::MindyError::Config(format!("starting listener on {addr}: {e}")))?;
    info!(%addr, pilosa = ?settings.pilosa, concurrency = capacity, "mindy listening");
    axum::serve(listener, app)
        .await
        .map_err(|e| mindy::MindyError::Internal(format!("serving: {e}")))
}

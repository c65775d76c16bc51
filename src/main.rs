use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use conclave::server::{serve, AppState};
use conclave::{MemoryStore, OpenAiClient, Orchestrator, ServiceConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env()?;

    let model = Arc::new(OpenAiClient::new(&config)?);
    let orchestrator = Arc::new(Orchestrator::new(model));
    let store = Arc::new(MemoryStore::new());

    let state = AppState {
        orchestrator,
        papers: store.clone(),
        knowledge: store,
    };

    serve(state, config.port).await
}

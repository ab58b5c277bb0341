//! AgentECS visualizer server.
//!
//! Main entry point: wires a [`TickLoopSource`] driven by a
//! [`DemoWorldGenerator`] to the REST/WebSocket router and serves it until
//! shutdown, at which point the source is disconnected cleanly.

use agentecs_net::{shutdown_signal, ServerBuilder};
use agentecs_server::routes::create_router;
use agentecs_server::state::AppState;
use agentecs_source::{DemoWorldGenerator, TickLoopSource};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Number of entities the bundled demo world generates.
const DEMO_ENTITY_COUNT: u64 = 12;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("agentecs-server starting");

    let config = agentecs_core::VizConfig::from_env();
    tracing::info!(host = %config.host, port = config.port, "configuration loaded");

    let source = Arc::new(TickLoopSource::new(
        config.clone(),
        Box::new(DemoWorldGenerator::new(DEMO_ENTITY_COUNT)),
    ));
    source.connect();

    let bind_addr = format!("{}:{}", config.host, config.port).parse()?;
    let state = Arc::new(AppState::new(Arc::clone(&source), config));
    let router = create_router(state);

    let shutdown = {
        let source = Arc::clone(&source);
        async move {
            shutdown_signal().await;
            source.disconnect().await;
        }
    };

    ServerBuilder::new()
        .bind_addr(bind_addr)
        .router(router)
        .run_with_shutdown(shutdown)
        .await?;

    Ok(())
}

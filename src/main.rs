use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use vclock_kv::config::{CliArgs, NodeConfig};
use vclock_kv::dispatcher::Node;
use vclock_kv::transport::router;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match NodeConfig::from_args(CliArgs::parse()) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid configuration, refusing to start");
            return ExitCode::FAILURE;
        }
    };

    info!(
        node_id = config.id,
        cluster_size = config.cluster_size(),
        bind = %config.bind,
        "starting node"
    );

    let bind_addr = config.bind;
    let node = Arc::new(Node::new(Arc::new(config)));
    let app = router(node);

    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(%err, addr = %bind_addr, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(%err, "server error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received, draining connections");
}

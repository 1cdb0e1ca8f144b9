use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use strato_mock::create_router;
use strato_mock::state::{DEFAULT_SETTLE_READS, MockState};

#[derive(Parser)]
#[command(name = "strato-mock")]
#[command(about = "Programmable mock server for the strato resource API")]
struct Args {
    /// Listen address for the REST API
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Number of reads a transitional resource takes to settle to Active
    #[arg(long, default_value_t = DEFAULT_SETTLE_READS)]
    settle_reads: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("strato_mock=info".parse()?))
        .init();

    let args = Args::parse();

    let state = MockState::new(args.settle_reads);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    info!(
        "Mock server listening on {} (settle_reads={})",
        args.listen, args.settle_reads
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = signal::ctrl_c();
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("Failed to install SIGTERM handler");

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = sigterm.recv() => info!("Received SIGTERM"),
    }
}

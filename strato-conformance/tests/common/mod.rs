//! Shared test utilities for conformance scenarios.
//!
//! Every scenario runs against an in-process mock server spawned on an
//! ephemeral port. Budgets are millisecond-scale so the suite stays fast.

use std::net::SocketAddr;
use tokio::net::TcpListener;

use strato_conformance::{Config, Harness};
use strato_mock::state::{DEFAULT_SETTLE_READS, MockState};
use strato_mock::{SharedState, create_router};

/// In-process mock server for one scenario.
pub struct TestServer {
    pub addr: SocketAddr,
    /// Direct handle to the mock store, for control operations like forcing
    /// a lifecycle state.
    pub state: SharedState,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        Self::spawn_with_settle_reads(DEFAULT_SETTLE_READS).await
    }

    /// Spawn with a specific settle-reads setting; a large value makes
    /// resources effectively never settle, for timeout scenarios.
    pub async fn spawn_with_settle_reads(settle_reads: u32) -> Self {
        let state = MockState::new(settle_reads);
        let router = create_router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        Self {
            addr,
            state,
            shutdown_tx,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self) -> Config {
        Config {
            endpoint: self.endpoint(),
            initial_delay_ms: 0,
            interval_ms: 10,
            max_attempts: 10,
        }
    }

    /// Run the setup phase against this server.
    pub async fn harness(&self) -> Harness {
        Harness::connect(&self.config())
            .await
            .expect("Harness setup failed")
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

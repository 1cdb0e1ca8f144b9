//! strato-conformance - scenario wiring for the strato API conformance suite.
//!
//! The harness is constructed once per run and passed by reference into each
//! scenario: client, retry budget, and the read-only catalogs fetched during
//! setup. There is no process-wide singleton.

use anyhow::{Context, Result, ensure};
use std::time::Duration;
use uuid::Uuid;

use strato_sdk::types::{InstanceSpec, Sku, Zone};
use strato_sdk::{ApiClient, RetryBudget};

/// Harness configuration, plain numeric values as supplied on the command
/// line or by the test setup.
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub initial_delay_ms: u64,
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl Config {
    pub fn budget(&self) -> RetryBudget {
        RetryBudget::new(
            Duration::from_millis(self.initial_delay_ms),
            Duration::from_millis(self.interval_ms),
            self.max_attempts,
        )
    }
}

/// Everything a scenario needs. Catalogs are fetched once here and treated
/// as immutable afterwards.
pub struct Harness {
    pub api: ApiClient,
    pub budget: RetryBudget,
    pub zones: Vec<Zone>,
    pub skus: Vec<Sku>,
}

impl Harness {
    /// Setup phase: build the client and pre-fetch the reference catalogs.
    pub async fn connect(config: &Config) -> Result<Self> {
        let api = ApiClient::new(&config.endpoint);
        let zones = api.zones().await.context("fetching zone catalog")?;
        let skus = api.skus().await.context("fetching SKU catalog")?;
        ensure!(!zones.is_empty(), "zone catalog is empty");
        ensure!(!skus.is_empty(), "SKU catalog is empty");
        Ok(Self {
            api,
            budget: config.budget(),
            zones,
            skus,
        })
    }

    /// A name unique across runs and scenarios, so scenarios never collide.
    pub fn unique_name(&self, prefix: &str) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{prefix}-{}", &suffix[..8])
    }

    /// Baseline instance spec from the pre-fetched catalogs.
    pub fn instance_spec(&self, network: &str) -> InstanceSpec {
        InstanceSpec {
            sku: self.skus[0].name.clone(),
            zone: self.zones[0].name.clone(),
            image: "debian-12".to_string(),
            network: network.to_string(),
            volumes: Vec::new(),
        }
    }
}

use anyhow::{Result, bail};
use clap::Parser;
use std::collections::BTreeMap;
use tracing::info;
use tracing_subscriber::EnvFilter;

use strato_conformance::{Config, Harness};
use strato_sdk::types::{NetworkSpec, TenantSpec, WorkspaceSpec};
use strato_sdk::{ListOptions, StateCheck, state};

#[derive(Parser)]
#[command(name = "strato-conformance")]
#[command(about = "Smoke conformance run against a strato API endpoint")]
struct Args {
    /// API endpoint to test, e.g. http://127.0.0.1:8080
    #[arg(short, long)]
    endpoint: String,

    /// Wait before the first state check (milliseconds)
    #[arg(long, default_value_t = 1000)]
    initial_delay_ms: u64,

    /// Wait between state checks (milliseconds)
    #[arg(long, default_value_t = 2000)]
    interval_ms: u64,

    /// State checks allowed before declaring failure
    #[arg(long, default_value_t = 30)]
    max_attempts: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("strato_conformance=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = Config {
        endpoint: args.endpoint,
        initial_delay_ms: args.initial_delay_ms,
        interval_ms: args.interval_ms,
        max_attempts: args.max_attempts,
    };

    info!("Connecting to {}", config.endpoint);
    let harness = Harness::connect(&config).await?;
    info!(
        "Setup complete: {} zones, {} SKUs",
        harness.zones.len(),
        harness.skus.len()
    );

    run_instance_smoke(&harness).await?;

    info!("Conformance smoke passed");
    Ok(())
}

/// One full lifecycle: tenant, workspace, network, instance, converge to
/// Active, list it back under a label filter, delete, verify 404.
async fn run_instance_smoke(harness: &Harness) -> Result<()> {
    let active = StateCheck::equals(state::ACTIVE);
    let no_labels = BTreeMap::new();

    let tenant = harness.unique_name("smoke");
    info!(tenant = %tenant, "creating tenant");
    harness
        .api
        .tenants()
        .create_or_update(
            &tenant,
            &TenantSpec {
                display_name: "Conformance Smoke".to_string(),
                description: None,
            },
            &no_labels,
        )
        .await?;
    harness
        .api
        .tenants()
        .await_state(&tenant, &active, harness.budget)
        .await?;

    let workspaces = harness.api.workspaces(&tenant);
    info!("creating workspace dev");
    workspaces
        .create_or_update(
            "dev",
            &WorkspaceSpec {
                region: harness.zones[0].region.clone(),
                description: None,
            },
            &no_labels,
        )
        .await?;
    workspaces.await_state("dev", &active, harness.budget).await?;

    let networks = harness.api.networks(&tenant);
    info!("creating network default");
    networks
        .create_or_update(
            "default",
            &NetworkSpec {
                cidr: "10.0.0.0/16".to_string(),
                dns_servers: vec!["10.0.0.2".to_string()],
            },
            &no_labels,
        )
        .await?;
    networks
        .await_state("default", &active, harness.budget)
        .await?;

    let instances = harness.api.instances(&tenant, "dev");
    let name = harness.unique_name("inst");
    let spec = harness.instance_spec("default");
    let labels: BTreeMap<String, String> =
        [("run".to_string(), tenant.clone())].into_iter().collect();

    info!(name = %name, "creating instance");
    let created = instances.create_or_update(&name, &spec, &labels).await?;
    if created.metadata.verb != "PUT" {
        bail!("create returned verb {:?}, expected PUT", created.metadata.verb);
    }

    let converged = instances.await_state(&name, &active, harness.budget).await?;
    info!(name = %name, state = ?converged.state(), "instance converged");
    if converged.spec != spec {
        bail!("converged spec differs from submitted spec");
    }

    let listed = instances
        .list(ListOptions::new().label("run", tenant.as_str()))
        .all()
        .await?;
    if listed.len() != 1 || listed[0].metadata.name != name {
        bail!("label-filtered list did not return exactly the created instance");
    }

    info!(name = %name, "deleting instance");
    instances.delete(&name).await?;
    match instances.get(&name).await {
        Err(e) if e.is_not_found() => {}
        Ok(_) => bail!("instance still present after delete"),
        Err(e) => return Err(e.into()),
    }

    // Cleanup, reverse order.
    networks.delete("default").await?;
    workspaces.delete("dev").await?;
    harness.api.tenants().delete(&tenant).await?;

    Ok(())
}

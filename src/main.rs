// Main entry point - Wires configuration, Grafana client and the reconciler
mod application;
mod domain;
mod error;
mod infrastructure;
mod presentation;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::application::reconcile_service::ReconcileService;
use crate::infrastructure::cluster_config::ClusterConfigReader;
use crate::infrastructure::cluster_files::ClusterFiles;
use crate::infrastructure::config::load_settings;
use crate::infrastructure::grafana_repository::GrafanaRepository;
use crate::infrastructure::secrets::SopsDecryptor;
use crate::presentation::cli::{Args, log_report};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let settings = load_settings()?;
    let central_cluster = args.central_cluster(&settings.default_central_cluster);

    let clusters = ClusterConfigReader::new(
        ClusterFiles::new(settings.clusters_path()),
        Arc::new(SopsDecryptor::new(settings.sops_binary.clone())),
    );

    // The central Grafana's address and token are fatal if missing
    let grafana_host = clusters
        .grafana_host(&central_cluster)
        .with_context(|| format!("Could not locate the central Grafana of {}", central_cluster))?;
    let token = clusters
        .grafana_token(&central_cluster)
        .await
        .with_context(|| format!("Could not read the Grafana token of {}", central_cluster))?;

    let repository = Arc::new(GrafanaRepository::new(&grafana_host, token));
    tracing::info!("Reconciling datasources at {}", repository.endpoint());

    let service = ReconcileService::new(repository, clusters);
    let report = service.reconcile().await?;
    log_report(&report);

    Ok(())
}

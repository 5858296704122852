// Command line arguments and the end-of-run summary
use crate::application::reconcile_service::ReconcileReport;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "grafana-datasources",
    about = "Register the authenticated Prometheus of every cluster as a datasource of the central Grafana",
    version
)]
pub struct Args {
    /// The name of the cluster where the central Grafana lives
    pub cluster_name: Option<String>,
}

impl Args {
    pub fn central_cluster(&self, default: &str) -> String {
        self.cluster_name
            .clone()
            .unwrap_or_else(|| default.to_string())
    }
}

pub fn log_report(report: &ReconcileReport) {
    for failure in &report.failures {
        tracing::debug!("{} failed: {}", failure.cluster, failure.error);
    }
    if !report.created.is_empty() {
        tracing::info!(
            "Created {} new datasources: {:?}",
            report.created.len(),
            report.created
        );
    }
    tracing::error!(
        "Failed to add {} clusters as datasources. See errors above!",
        report.failure_count()
    );
    tracing::info!(
        "Successfully retrieved {} existing datasources! {:?}",
        report.existing.len(),
        report.existing
    );
}

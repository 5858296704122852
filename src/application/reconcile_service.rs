// Reconcile service - Registers every configured cluster missing from Grafana
use crate::application::datasource_repository::DatasourceRepository;
use crate::domain::datasource::DatasourcePayload;
use crate::error::Result;
use crate::infrastructure::cluster_config::ClusterConfigReader;
use crate::infrastructure::cluster_files::read_cluster_name;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterFailure {
    pub cluster: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    /// Datasources registered before this run, in listing order
    pub existing: Vec<String>,
    pub created: Vec<String>,
    pub failures: Vec<ClusterFailure>,
}

impl ReconcileReport {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

#[derive(Clone)]
pub struct ReconcileService {
    repository: Arc<dyn DatasourceRepository>,
    clusters: ClusterConfigReader,
}

impl ReconcileService {
    pub fn new(repository: Arc<dyn DatasourceRepository>, clusters: ClusterConfigReader) -> Self {
        Self {
            repository,
            clusters,
        }
    }

    /// One reconciliation pass. Errors listing Grafana or enumerating
    /// clusters abort the pass; errors for a single cluster are recorded
    /// in the report and the pass moves on.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let existing = self.repository.list_datasource_names().await?;
        let cluster_files = self.clusters.files().all_cluster_files()?;

        let mut registered: HashSet<String> = existing.iter().cloned().collect();
        let mut report = ReconcileReport {
            existing,
            ..Default::default()
        };

        tracing::info!("Searching for clusters that aren't Grafana datasources...");
        for cluster_file in cluster_files {
            let cluster_name = match read_cluster_name(&cluster_file) {
                Ok(Some(name)) => name,
                Ok(None) => {
                    tracing::debug!("{} has no cluster name, ignoring", cluster_file.display());
                    continue;
                }
                Err(e) => {
                    let label = cluster_file.display().to_string();
                    tracing::warn!("An error occurred for {}. Error was: {}. Skipping...", label, e);
                    report.failures.push(ClusterFailure {
                        cluster: label,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            if registered.contains(&cluster_name) {
                continue;
            }

            tracing::info!("Found {} cluster. Checking if it can be added...", cluster_name);
            match self.register(&cluster_name).await {
                Ok(()) => {
                    tracing::info!("Successfully created a new datasource for {}!", cluster_name);
                    registered.insert(cluster_name.clone());
                    report.created.push(cluster_name);
                }
                Err(e) => {
                    tracing::warn!(
                        "An error occurred for {}. Error was: {}. Skipping...",
                        cluster_name,
                        e
                    );
                    report.failures.push(ClusterFailure {
                        cluster: cluster_name,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    async fn register(&self, cluster_name: &str) -> Result<()> {
        let cluster = self.clusters.cluster_record(cluster_name).await?;
        let payload = DatasourcePayload::for_cluster(&cluster);
        self.repository.create_datasource(&payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeployerError;
    use crate::infrastructure::cluster_config::{SUPPORT_SECRETS_FILE, SUPPORT_VALUES_FILE};
    use crate::infrastructure::cluster_files::ClusterFiles;
    use crate::infrastructure::secrets::PlaintextDecryptor;
    use async_trait::async_trait;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeGrafana {
        existing: Vec<String>,
        fail_listing: bool,
        reject: Vec<String>,
        created: Mutex<Vec<DatasourcePayload>>,
    }

    impl FakeGrafana {
        fn with_existing(names: &[&str]) -> Self {
            Self {
                existing: names.iter().map(|n| n.to_string()).collect(),
                ..Default::default()
            }
        }

        fn created_names(&self) -> Vec<String> {
            self.created
                .lock()
                .unwrap()
                .iter()
                .map(|p| p.name.clone())
                .collect()
        }
    }

    #[async_trait]
    impl DatasourceRepository for FakeGrafana {
        async fn list_datasource_names(&self) -> Result<Vec<String>> {
            if self.fail_listing {
                return Err(DeployerError::Http {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    body: "internal error".to_string(),
                });
            }
            Ok(self.existing.clone())
        }

        async fn create_datasource(&self, payload: &DatasourcePayload) -> Result<()> {
            if self.reject.contains(&payload.name) {
                return Err(DeployerError::Http {
                    status: reqwest::StatusCode::BAD_REQUEST,
                    body: "bad datasource".to_string(),
                });
            }
            self.created.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    fn support_values(exposed: bool) -> String {
        format!(
            "prometheusIngressAuthSecret:\n  enabled: {exposed}\nprometheus:\n  server:\n    ingress:\n      tls:\n        - hosts:\n            - prometheus.example.org\n"
        )
    }

    fn add_cluster(root: &Path, dir: &str, name: &str, exposed: bool) {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("cluster.yaml"), format!("name: \"{name}\"\n")).unwrap();
        fs::write(dir.join(SUPPORT_VALUES_FILE), support_values(exposed)).unwrap();
        fs::write(
            dir.join(SUPPORT_SECRETS_FILE),
            "prometheusIngressAuthSecret:\n  username: grafana\n  password: s3cret\n",
        )
        .unwrap();
    }

    fn service(root: &Path, grafana: Arc<FakeGrafana>) -> ReconcileService {
        let clusters =
            ClusterConfigReader::new(ClusterFiles::new(root), Arc::new(PlaintextDecryptor));
        ReconcileService::new(grafana, clusters)
    }

    #[tokio::test]
    async fn test_registers_only_missing_clusters() {
        let root = tempfile::tempdir().unwrap();
        add_cluster(root.path(), "alpha", "alpha", true);
        add_cluster(root.path(), "beta", "beta", true);
        let grafana = Arc::new(FakeGrafana::with_existing(&["alpha"]));

        let report = service(root.path(), grafana.clone()).reconcile().await.unwrap();

        assert_eq!(grafana.created_names(), vec!["beta"]);
        assert_eq!(report.created, vec!["beta"]);
        assert_eq!(report.failure_count(), 0);
        assert_eq!(report.existing, vec!["alpha"]);

        let payload = grafana.created.lock().unwrap()[0].clone();
        assert_eq!(payload.url, "https://prometheus.example.org");
        assert_eq!(payload.basic_auth_user, "grafana");
        assert_eq!(payload.secure_json_data.basic_auth_password, "s3cret");
    }

    #[tokio::test]
    async fn test_unexposed_prometheus_counts_as_failure() {
        let root = tempfile::tempdir().unwrap();
        add_cluster(root.path(), "alpha", "alpha", true);
        add_cluster(root.path(), "beta", "beta", false);
        let grafana = Arc::new(FakeGrafana::with_existing(&["alpha"]));

        let report = service(root.path(), grafana.clone()).reconcile().await.unwrap();

        assert!(grafana.created_names().is_empty());
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.failures[0].cluster, "beta");
        assert!(report.failures[0].error.contains("prometheusIngressAuthSecret"));
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_before_any_cluster() {
        let root = tempfile::tempdir().unwrap();
        add_cluster(root.path(), "beta", "beta", true);
        let grafana = Arc::new(FakeGrafana {
            fail_listing: true,
            ..Default::default()
        });

        let err = service(root.path(), grafana.clone()).reconcile().await.unwrap_err();

        assert!(matches!(err, DeployerError::Http { .. }));
        assert!(grafana.created_names().is_empty());
    }

    #[tokio::test]
    async fn test_nameless_cluster_is_skipped_silently() {
        let root = tempfile::tempdir().unwrap();
        add_cluster(root.path(), "beta", "beta", true);
        add_cluster(root.path(), "unnamed", "", true);
        fs::create_dir_all(root.path().join("absent")).unwrap();
        fs::write(root.path().join("absent/cluster.yaml"), "provider: gcp\n").unwrap();
        let grafana = Arc::new(FakeGrafana::default());

        let report = service(root.path(), grafana.clone()).reconcile().await.unwrap();

        assert_eq!(grafana.created_names(), vec!["beta"]);
        assert_eq!(report.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_creation_does_not_stop_the_pass() {
        let root = tempfile::tempdir().unwrap();
        add_cluster(root.path(), "alpha", "alpha", true);
        add_cluster(root.path(), "beta", "beta", true);
        let grafana = Arc::new(FakeGrafana {
            reject: vec!["alpha".to_string()],
            ..Default::default()
        });

        let report = service(root.path(), grafana.clone()).reconcile().await.unwrap();

        assert_eq!(grafana.created_names(), vec!["beta"]);
        assert_eq!(
            report.failures,
            vec![ClusterFailure {
                cluster: "alpha".to_string(),
                error: "Grafana returned 400 Bad Request: bad datasource".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_secrets_file_counts_as_failure() {
        let root = tempfile::tempdir().unwrap();
        add_cluster(root.path(), "beta", "beta", true);
        fs::remove_file(root.path().join("beta").join(SUPPORT_SECRETS_FILE)).unwrap();
        let grafana = Arc::new(FakeGrafana::default());

        let report = service(root.path(), grafana.clone()).reconcile().await.unwrap();

        assert!(grafana.created_names().is_empty());
        assert_eq!(report.failure_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_cluster_names_register_once() {
        let root = tempfile::tempdir().unwrap();
        add_cluster(root.path(), "beta", "beta", true);
        add_cluster(root.path(), "beta-copy", "beta", true);
        let grafana = Arc::new(FakeGrafana::default());

        let report = service(root.path(), grafana.clone()).reconcile().await.unwrap();

        assert_eq!(grafana.created_names(), vec!["beta"]);
        assert_eq!(report.created, vec!["beta"]);
    }

    #[tokio::test]
    async fn test_malformed_cluster_file_is_recorded_and_skipped() {
        let root = tempfile::tempdir().unwrap();
        add_cluster(root.path(), "beta", "beta", true);
        fs::create_dir_all(root.path().join("alpha")).unwrap();
        fs::write(root.path().join("alpha/cluster.yaml"), "name: [oops\n").unwrap();
        let grafana = Arc::new(FakeGrafana::default());

        let report = service(root.path(), grafana.clone()).reconcile().await.unwrap();

        assert_eq!(grafana.created_names(), vec!["beta"]);
        assert_eq!(report.failure_count(), 1);
        assert!(report.failures[0].cluster.ends_with("cluster.yaml"));
    }

    #[tokio::test]
    async fn test_secrets_without_credentials_count_as_failure() {
        let root = tempfile::tempdir().unwrap();
        add_cluster(root.path(), "beta", "beta", true);
        fs::write(root.path().join("beta").join(SUPPORT_SECRETS_FILE), "other: 1\n").unwrap();
        let grafana = Arc::new(FakeGrafana::default());

        let report = service(root.path(), grafana.clone()).reconcile().await.unwrap();

        assert!(grafana.created_names().is_empty());
        assert!(report.created.is_empty());
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.failures[0].cluster, "beta");
    }

    #[tokio::test]
    async fn test_missing_tls_counts_as_failure() {
        let root = tempfile::tempdir().unwrap();
        add_cluster(root.path(), "beta", "beta", true);
        fs::write(
            root.path().join("beta").join(SUPPORT_VALUES_FILE),
            "prometheusIngressAuthSecret:\n  enabled: true\nprometheus:\n  server:\n    ingress:\n      enabled: true\n",
        )
        .unwrap();
        let grafana = Arc::new(FakeGrafana::default());

        let report = service(root.path(), grafana.clone()).reconcile().await.unwrap();

        assert!(grafana.created_names().is_empty());
        assert_eq!(report.failure_count(), 1);
        assert!(report.failures[0].error.contains("No tls config"));
    }

    #[tokio::test]
    async fn test_registers_nested_cluster() {
        let root = tempfile::tempdir().unwrap();
        add_cluster(&root.path().join("group"), "beta", "beta", true);
        let grafana = Arc::new(FakeGrafana::default());

        let report = service(root.path(), grafana.clone()).reconcile().await.unwrap();

        assert_eq!(grafana.created_names(), vec!["beta"]);
        assert_eq!(report.failure_count(), 0);
    }
}

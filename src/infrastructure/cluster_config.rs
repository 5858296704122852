// Reading Prometheus and Grafana settings out of a cluster's config directory
use crate::domain::cluster::{ClusterRecord, PrometheusCredentials};
use crate::error::{DeployerError, Result};
use crate::infrastructure::cluster_files::{ClusterFiles, load_yaml, parse_yaml};
use crate::infrastructure::secrets::SecretDecryptor;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

pub const SUPPORT_VALUES_FILE: &str = "support.values.yaml";
pub const SUPPORT_SECRETS_FILE: &str = "enc-support.secret.values.yaml";
pub const GRAFANA_TOKEN_FILE: &str = "enc-grafana-token.secret.yaml";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SupportValues {
    prometheus_ingress_auth_secret: IngressAuthSecret,
    prometheus: PrometheusValues,
    grafana: GrafanaValues,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IngressAuthSecret {
    enabled: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PrometheusValues {
    server: ServerValues,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServerValues {
    ingress: IngressValues,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GrafanaValues {
    ingress: IngressValues,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IngressValues {
    tls: Option<Vec<TlsEntry>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TlsEntry {
    hosts: Vec<String>,
}

impl IngressValues {
    /// Only the first host of the first TLS entry is used; clusters
    /// currently expose a single hostname per ingress.
    fn first_tls_host(&self) -> Option<&str> {
        self.tls
            .as_deref()?
            .first()?
            .hosts
            .first()
            .map(String::as_str)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SupportSecrets {
    prometheus_ingress_auth_secret: PrometheusCredentials,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GrafanaTokenFile {
    grafana_token: Option<String>,
}

#[derive(Clone)]
pub struct ClusterConfigReader {
    files: ClusterFiles,
    decryptor: Arc<dyn SecretDecryptor>,
}

impl ClusterConfigReader {
    pub fn new(files: ClusterFiles, decryptor: Arc<dyn SecretDecryptor>) -> Self {
        Self { files, decryptor }
    }

    pub fn files(&self) -> &ClusterFiles {
        &self.files
    }

    fn cluster_file(&self, cluster_name: &str, file_name: &str) -> Result<PathBuf> {
        Ok(self.files.find_cluster_dir(cluster_name)?.join(file_name))
    }

    fn support_values(&self, cluster_name: &str) -> Result<SupportValues> {
        load_yaml(&self.cluster_file(cluster_name, SUPPORT_VALUES_FILE)?)
    }

    /// Hostname of the authenticated Prometheus ingress of `cluster_name`
    pub fn prometheus_address(&self, cluster_name: &str) -> Result<String> {
        let support = self.support_values(cluster_name)?;

        // Only securely exposed Prometheus instances may become datasources
        if !support.prometheus_ingress_auth_secret.enabled {
            return Err(DeployerError::config(format!(
                "`prometheusIngressAuthSecret` wasn't configured for {}",
                cluster_name
            )));
        }

        support
            .prometheus
            .server
            .ingress
            .first_tls_host()
            .map(str::to_string)
            .ok_or_else(|| {
                DeployerError::config(format!(
                    "No tls config was found for the prometheus instance of {}",
                    cluster_name
                ))
            })
    }

    /// Basic-auth credentials of the Prometheus ingress, decrypted from the
    /// cluster's support secrets. A missing section yields unset credentials.
    pub async fn prometheus_credentials(&self, cluster_name: &str) -> Result<PrometheusCredentials> {
        let path = self.cluster_file(cluster_name, SUPPORT_SECRETS_FILE)?;
        let decrypted = self.decryptor.decrypt(&path).await?;
        let secrets: SupportSecrets = parse_yaml(&decrypted.read_to_string()?, &path)?;
        Ok(secrets.prometheus_ingress_auth_secret)
    }

    /// Hostname of the Grafana ingress running on `central_cluster`
    pub fn grafana_host(&self, central_cluster: &str) -> Result<String> {
        let support = self.support_values(central_cluster)?;

        support
            .grafana
            .ingress
            .first_tls_host()
            .map(str::to_string)
            .ok_or_else(|| {
                DeployerError::config(format!(
                    "No tls config was found for the Grafana instance of {}. \
                     Please consider enabling it before using it as the central Grafana.",
                    central_cluster
                ))
            })
    }

    /// API token of the Grafana running on `central_cluster`
    pub async fn grafana_token(&self, central_cluster: &str) -> Result<String> {
        let path = self.cluster_file(central_cluster, GRAFANA_TOKEN_FILE)?;
        let decrypted = self.decryptor.decrypt(&path).await?;
        let token_file: GrafanaTokenFile = parse_yaml(&decrypted.read_to_string()?, &path)?;

        token_file.grafana_token.ok_or_else(|| {
            DeployerError::config(format!("No grafana_token found in {}", path.display()))
        })
    }

    /// Fails unless the Prometheus is exposed over TLS and both credential
    /// keys are present
    pub async fn cluster_record(&self, cluster_name: &str) -> Result<ClusterRecord> {
        let prometheus_host = self.prometheus_address(cluster_name)?;
        let credentials = self
            .prometheus_credentials(cluster_name)
            .await?
            .require(cluster_name)?;
        Ok(ClusterRecord::new(
            cluster_name.to_string(),
            prometheus_host,
            credentials,
        ))
    }
}

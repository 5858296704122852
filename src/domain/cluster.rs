// Cluster domain model
use crate::error::{DeployerError, Result};
use serde::Deserialize;

/// `prometheusIngressAuthSecret` section of a cluster's support secrets.
/// Either key may be absent; an absent section deserializes with both unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PrometheusCredentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl PrometheusCredentials {
    #[cfg(test)]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Basic-auth pair for `cluster_name`; both keys must be present
    pub fn require(self, cluster_name: &str) -> Result<BasicAuth> {
        let missing = |key: &str| {
            DeployerError::config(format!(
                "`prometheusIngressAuthSecret.{}` wasn't found in the secrets of {}",
                key, cluster_name
            ))
        };
        let username = self.username.ok_or_else(|| missing("username"))?;
        let password = self.password.ok_or_else(|| missing("password"))?;
        Ok(BasicAuth::new(username, password))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Everything needed to register one cluster as a Grafana datasource
#[derive(Debug, Clone)]
pub struct ClusterRecord {
    pub name: String,
    pub prometheus_host: String,
    pub credentials: BasicAuth,
}

impl ClusterRecord {
    pub fn new(name: String, prometheus_host: String, credentials: BasicAuth) -> Self {
        Self {
            name,
            prometheus_host,
            credentials,
        }
    }
}

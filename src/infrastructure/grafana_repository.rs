// Grafana datasource API client
use crate::application::datasource_repository::DatasourceRepository;
use crate::domain::datasource::{DatasourcePayload, RegisteredDatasource};
use crate::error::{DeployerError, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};

#[derive(Debug, Clone)]
pub struct GrafanaRepository {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

pub fn datasource_endpoint(grafana_host: &str) -> String {
    format!("https://{}/api/datasources", grafana_host.trim_end_matches('/'))
}

impl GrafanaRepository {
    pub fn new(grafana_host: &str, token: String) -> Self {
        Self::with_endpoint(datasource_endpoint(grafana_host), token)
    }

    pub fn with_endpoint(endpoint: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            token,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.client
            .request(method, &self.endpoint)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(DeployerError::Http { status, body })
    }
}

#[async_trait]
impl DatasourceRepository for GrafanaRepository {
    async fn list_datasource_names(&self) -> Result<Vec<String>> {
        let response = self.request(reqwest::Method::GET).send().await?;
        let response = Self::check_status(response).await.inspect_err(|e| {
            tracing::error!(
                "An error occurred when retrieving the datasources from {}: {}",
                self.endpoint,
                e
            );
        })?;

        let datasources = response.json::<Vec<RegisteredDatasource>>().await?;
        tracing::debug!("Grafana lists {} datasources", datasources.len());
        Ok(datasources.into_iter().map(|d| d.name).collect())
    }

    async fn create_datasource(&self, payload: &DatasourcePayload) -> Result<()> {
        let response = self
            .request(reqwest::Method::POST)
            .json(payload)
            .send()
            .await?;
        Self::check_status(response).await.inspect_err(|e| {
            tracing::error!(
                "An error occurred when creating the datasource {}: {}",
                payload.name,
                e
            );
        })?;
        Ok(())
    }
}

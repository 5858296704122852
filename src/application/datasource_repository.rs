// Repository trait for the central Grafana's datasource registry
use crate::domain::datasource::DatasourcePayload;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait DatasourceRepository: Send + Sync {
    /// Names of every datasource currently registered, in listing order
    async fn list_datasource_names(&self) -> Result<Vec<String>>;

    /// Register a new datasource
    async fn create_datasource(&self, payload: &DatasourcePayload) -> Result<()>;
}

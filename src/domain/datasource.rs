// Grafana datasource domain model
use super::cluster::ClusterRecord;
use serde::{Deserialize, Serialize};

pub const DATASOURCE_TYPE: &str = "prometheus";
pub const DATASOURCE_ACCESS: &str = "proxy";

/// One entry of the `GET /api/datasources` listing. Only the name is used.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredDatasource {
    pub name: String,
}

/// Request body for `POST /api/datasources`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasourcePayload {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub access: String,
    pub url: String,
    pub basic_auth: bool,
    pub basic_auth_user: String,
    pub secure_json_data: SecureJsonData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureJsonData {
    pub basic_auth_password: String,
}

impl DatasourcePayload {
    pub fn for_cluster(cluster: &ClusterRecord) -> Self {
        Self {
            name: cluster.name.clone(),
            kind: DATASOURCE_TYPE.to_string(),
            access: DATASOURCE_ACCESS.to_string(),
            url: format!("https://{}", cluster.prometheus_host),
            basic_auth: true,
            basic_auth_user: cluster.credentials.username.clone(),
            secure_json_data: SecureJsonData {
                basic_auth_password: cluster.credentials.password.clone(),
            },
        }
    }
}

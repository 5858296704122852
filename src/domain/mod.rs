// Domain layer - Cluster and datasource models
pub mod cluster;
pub mod datasource;

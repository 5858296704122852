// Infrastructure layer - External dependencies and adapters
pub mod cluster_config;
pub mod cluster_files;
pub mod config;
pub mod grafana_repository;
pub mod secrets;

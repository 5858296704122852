// Application layer - Reconciliation use case and its ports
pub mod datasource_repository;
pub mod reconcile_service;

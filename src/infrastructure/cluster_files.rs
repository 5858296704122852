// Locating and enumerating per-cluster configuration directories
use crate::error::{DeployerError, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const CLUSTER_FILE: &str = "cluster.yaml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClusterFile {
    name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ClusterFiles {
    clusters_path: PathBuf,
}

impl ClusterFiles {
    pub fn new(clusters_path: impl Into<PathBuf>) -> Self {
        Self {
            clusters_path: clusters_path.into(),
        }
    }

    /// Directory holding `cluster.yaml` and the secrets of `cluster_name`.
    /// Cluster directories may sit at any depth below the clusters directory.
    pub fn find_cluster_dir(&self, cluster_name: &str) -> Result<PathBuf> {
        self.all_cluster_files()?
            .into_iter()
            .filter_map(|file| file.parent().map(Path::to_path_buf))
            .find(|dir| dir.file_name().is_some_and(|name| name == cluster_name))
            .ok_or_else(|| {
                DeployerError::config(format!(
                    "No {} found for cluster {} under {}",
                    CLUSTER_FILE,
                    cluster_name,
                    self.clusters_path.display()
                ))
            })
    }

    /// Every `cluster.yaml` below the clusters directory, sorted by path.
    /// Files inside `templates` directories are not real clusters.
    pub fn all_cluster_files(&self) -> Result<Vec<PathBuf>> {
        if !self.clusters_path.is_dir() {
            return Err(DeployerError::config(format!(
                "Clusters directory {} does not exist",
                self.clusters_path.display()
            )));
        }

        let files = WalkDir::new(&self.clusters_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.file_name() != "templates")
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && entry.file_name() == CLUSTER_FILE)
            .map(|entry| entry.into_path())
            .collect();

        Ok(files)
    }
}

/// Name declared in a `cluster.yaml`. Absent or empty names yield `None`.
pub fn read_cluster_name(cluster_file: &Path) -> Result<Option<String>> {
    let cluster: ClusterFile = load_yaml(cluster_file)?;
    Ok(cluster.name.filter(|name| !name.is_empty()))
}

pub fn load_yaml<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| DeployerError::io(path, e))?;
    parse_yaml(&contents, path)
}

/// Parse YAML read from `origin`. An empty document yields `T::default()`.
pub fn parse_yaml<T: DeserializeOwned + Default>(contents: &str, origin: &Path) -> Result<T> {
    if contents.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(contents).map_err(|source| DeployerError::Yaml {
        path: origin.to_path_buf(),
        source,
    })
}

use serde::Deserialize;
use std::path::PathBuf;

const SETTINGS_FILE: &str = "config/grafana-datasources";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Root of the infrastructure repository
    pub repo_root: PathBuf,
    /// Directory under `repo_root` holding one sub-directory per cluster
    pub clusters_dir: PathBuf,
    /// Program used as `<sops_binary> --decrypt <file>`
    pub sops_binary: String,
    /// Cluster hosting the central Grafana when none is given on the command line
    pub default_central_cluster: String,
}

impl Settings {
    pub fn clusters_path(&self) -> PathBuf {
        self.repo_root.join(&self.clusters_dir)
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(SETTINGS_FILE)
}

/// Layer an optional settings file (any format `config` recognises by
/// extension) over the built-in defaults.
pub fn load_settings_from(name: &str) -> anyhow::Result<Settings> {
    let settings = config::Config::builder()
        .set_default("repo_root", ".")?
        .set_default("clusters_dir", "config/clusters")?
        .set_default("sops_binary", "sops")?
        .set_default("default_central_cluster", "2i2c")?
        .add_source(config::File::with_name(name).required(false))
        .build()?;

    Ok(settings.try_deserialize()?)
}

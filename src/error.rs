// Error kinds raised while resolving cluster configuration and talking to Grafana
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployerError {
    /// A required configuration section is missing or malformed
    #[error("{0}")]
    Config(String),

    /// Grafana answered with a non-success status
    #[error("Grafana returned {status}: {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("request to Grafana failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decrypt {}: {message}", path.display())]
    Decrypt { path: PathBuf, message: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl DeployerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DeployerError>;

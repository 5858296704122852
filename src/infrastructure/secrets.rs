// Scoped decryption of sops-encrypted cluster secrets
use crate::error::{DeployerError, Result};
use async_trait::async_trait;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::process::Command;

/// Plaintext copy of an encrypted file. The copy is removed when the
/// handle is dropped, whichever way the caller leaves its scope.
#[derive(Debug)]
pub struct DecryptedFile {
    file: NamedTempFile,
}

impl DecryptedFile {
    pub fn with_contents(contents: &[u8]) -> std::io::Result<Self> {
        let mut file = NamedTempFile::new()?;
        file.write_all(contents)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn read_to_string(&self) -> Result<String> {
        std::fs::read_to_string(self.path()).map_err(|e| DeployerError::io(self.path(), e))
    }
}

#[async_trait]
pub trait SecretDecryptor: Send + Sync {
    async fn decrypt(&self, encrypted: &Path) -> Result<DecryptedFile>;
}

#[derive(Debug, Clone)]
pub struct SopsDecryptor {
    binary: String,
}

impl SopsDecryptor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl SecretDecryptor for SopsDecryptor {
    async fn decrypt(&self, encrypted: &Path) -> Result<DecryptedFile> {
        tokio::fs::metadata(encrypted)
            .await
            .map_err(|e| DeployerError::io(encrypted, e))?;

        tracing::debug!("Decrypting {} with {}", encrypted.display(), self.binary);
        let output = Command::new(&self.binary)
            .arg("--decrypt")
            .arg(encrypted)
            .output()
            .await
            .map_err(|e| DeployerError::Decrypt {
                path: encrypted.to_path_buf(),
                message: format!("could not run {}: {}", self.binary, e),
            })?;

        if !output.status.success() {
            return Err(DeployerError::Decrypt {
                path: encrypted.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        DecryptedFile::with_contents(&output.stdout).map_err(|e| DeployerError::io(encrypted, e))
    }
}

/// Treats the "encrypted" file as plaintext. Lets tests lay out cluster
/// directories without sops keys.
#[cfg(test)]
pub struct PlaintextDecryptor;

#[cfg(test)]
#[async_trait]
impl SecretDecryptor for PlaintextDecryptor {
    async fn decrypt(&self, encrypted: &Path) -> Result<DecryptedFile> {
        let contents = std::fs::read(encrypted).map_err(|e| DeployerError::io(encrypted, e))?;
        DecryptedFile::with_contents(&contents).map_err(|e| DeployerError::io(encrypted, e))
    }
}

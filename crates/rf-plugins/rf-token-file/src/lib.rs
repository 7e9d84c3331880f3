//! # rf-token-file
//! rusty-forum/crates/rf-plugins/rf-token-file/src/lib.rs
//! `TokenStore` implementations: a file that survives restarts, and an
//! in-memory slot for ephemeral sessions.

use anyhow::Context;
use async_trait::async_trait;
use rf_core::traits::TokenStore;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Keeps the token in a single file, e.g. `.rusty-forum/token`.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Sibling file the token is written to before being moved into place.
    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> anyhow::Result<Option<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    async fn save(&self, token: &str) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let staging = self.staging_path();
        write_private(&staging, token)
            .await
            .with_context(|| format!("writing {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;

        debug!(path = %self.path.display(), "token saved");
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "token removed");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("removing {}", self.path.display())),
        }
    }
}

/// Writes `contents` to a freshly created file that is owner-only on unix
/// from the moment it exists.
async fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    // A leftover staging file would keep its old permissions.
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options.open(path).await?;
    file.write_all(contents.as_bytes()).await?;
    file.sync_all().await
}

/// Holds the token for the life of the process only.
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> anyhow::Result<Option<String>> {
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, token: &str) -> anyhow::Result<()> {
        *self.slot.lock().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        self.slot.lock().await.take();
        Ok(())
    }
}

/*!
 * Persistence backends
 *
 * The coordinator only knows `save(content, metadata)`. What a save actually
 * does belongs to the caller; `FilePersistence` is the backend the binary uses.
 */

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::utils::error::AppResult;

/// Persists one piece of content. `Ok` means saved; any error is a failure.
#[async_trait]
pub trait ContentPersistence<C>: Send + Sync {
    async fn save(&self, content: &C, metadata: &Value) -> AppResult<()>;
}

/// Adapter turning an async closure into a persistence backend
pub struct FnPersistence<F> {
    save_fn: F,
}

impl<F> FnPersistence<F> {
    pub fn new(save_fn: F) -> Self {
        Self { save_fn }
    }
}

#[async_trait]
impl<C, F, Fut> ContentPersistence<C> for FnPersistence<F>
where
    C: Clone + Send + Sync + 'static,
    F: Fn(C, Value) -> Fut + Send + Sync,
    Fut: Future<Output = AppResult<()>> + Send,
{
    async fn save(&self, content: &C, metadata: &Value) -> AppResult<()> {
        (self.save_fn)(content.clone(), metadata.clone()).await
    }
}

/// Shorthand for [`FnPersistence::new`]
pub fn persist_fn<F>(save_fn: F) -> FnPersistence<F> {
    FnPersistence::new(save_fn)
}

/// Writes text content to a file with a temp-file-and-rename swap.
/// Non-null metadata is written as JSON to `<file>.meta.json`.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, ".meta.json")
    }

    async fn write_atomic(path: &Path, bytes: &[u8]) -> AppResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("cannot create directory {}", parent.display()))?;
        }

        let tmp_path = sibling_with_suffix(path, ".tmp");
        fs::write(&tmp_path, bytes)
            .await
            .with_context(|| format!("cannot write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path)
            .await
            .with_context(|| format!("cannot replace {}", path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl ContentPersistence<String> for FilePersistence {
    async fn save(&self, content: &String, metadata: &Value) -> AppResult<()> {
        Self::write_atomic(&self.path, content.as_bytes()).await?;

        if !metadata.is_null() {
            let json = serde_json::to_vec_pretty(metadata).context("metadata serialization failed")?;
            Self::write_atomic(&self.metadata_path(), &json).await?;
        }

        debug!("Wrote {} bytes to {}", content.len(), self.path.display());
        Ok(())
    }
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

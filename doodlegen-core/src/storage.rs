use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

/// A bucket-style object store that receives staged workspace directories.
///
/// One client handle is built at startup and shared across requests. The
/// returned identifier names the remote folder the files landed in.
#[async_trait]
pub trait BucketStore: Send + Sync {
    async fn upload_dir(&self, client: &str, local: &Path, remote: &str) -> Result<String>;
}

/// Filesystem-backed bucket.
///
/// Mirrors each staged file under a bucket root, keyed by the remote path.
/// Stands in for a cloud bucket in local deployments and tests.
pub struct LocalBucket {
    root: PathBuf,
}

impl LocalBucket {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_dir(&self, remote: &str) -> PathBuf {
        self.root.join(remote.trim_matches('/'))
    }
}

#[async_trait]
impl BucketStore for LocalBucket {
    async fn upload_dir(&self, client: &str, local: &Path, remote: &str) -> Result<String> {
        let dest = self.object_dir(remote);
        tokio::fs::create_dir_all(&dest)
            .await
            .with_context(|| format!("creating bucket folder {}", dest.display()))?;

        let mut uploaded = 0usize;
        let mut entries = tokio::fs::read_dir(local)
            .await
            .with_context(|| format!("reading workspace {}", local.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let target = dest.join(entry.file_name());
            tokio::fs::copy(entry.path(), &target)
                .await
                .with_context(|| format!("uploading {}", entry.path().display()))?;
            uploaded += 1;
        }

        info!(client, files = uploaded, folder = remote, "upload complete");
        Ok(remote.to_string())
    }
}

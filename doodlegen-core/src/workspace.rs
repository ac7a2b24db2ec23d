use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::debug;

use crate::PipelineError;

/// Remote prefix all uploads land under.
pub const REMOTE_ROOT: &str = "/images/";

const DATE_FORMAT: &str = "%d:%b:%Y";
const TIME_FORMAT: &str = "%H:%M:%S%.6f";

/// The transient local-directory/remote-path pair owned by one request.
///
/// Both paths share the `<client>-<date>-<time>` suffix, with the time
/// carried down to microseconds, so concurrent requests land in distinct
/// directories. Derivation is pure; `create` and `cleanup` do the I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    local_path: PathBuf,
    remote_path: String,
}

impl Workspace {
    /// Derive the path pair for a client at the given instant. No I/O.
    ///
    /// The client identifier ends up as a path component, so identifiers
    /// that are empty or carry separator or parent-directory sequences are
    /// rejected rather than spliced in verbatim.
    pub fn derive(
        client: &str,
        local_root: &Path,
        at: DateTime<Local>,
    ) -> Result<Self, PipelineError> {
        validate_client(client)?;

        let suffix = format!(
            "{client}-{}-{}",
            at.format(DATE_FORMAT),
            at.format(TIME_FORMAT)
        );
        Ok(Self {
            local_path: local_root.join(&suffix),
            remote_path: format!("{REMOTE_ROOT}{suffix}/"),
        })
    }

    /// Derive for the current wall-clock instant.
    pub fn for_client(client: &str, local_root: &Path) -> Result<Self, PipelineError> {
        Self::derive(client, local_root, Local::now())
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    /// Create the local staging directory.
    pub async fn create(&self) -> Result<(), PipelineError> {
        tokio::fs::create_dir_all(&self.local_path).await?;
        Ok(())
    }

    /// Remove the local directory tree. A directory that was never created
    /// is not an error; nothing was staged.
    pub async fn cleanup(&self) -> Result<(), PipelineError> {
        if tokio::fs::metadata(&self.local_path).await.is_err() {
            return Ok(());
        }
        debug!(path = %self.local_path.display(), "removing workspace");
        tokio::fs::remove_dir_all(&self.local_path).await?;
        Ok(())
    }
}

fn validate_client(client: &str) -> Result<(), PipelineError> {
    if client.is_empty() || client.contains(['/', '\\']) || client.contains("..") {
        return Err(PipelineError::InvalidClient(client.to_string()));
    }
    Ok(())
}

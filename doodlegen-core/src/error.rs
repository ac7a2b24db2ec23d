use thiserror::Error;

/// Faults the predict pipeline can surface, one variant per stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid client identifier: {0:?}")]
    InvalidClient(String),

    #[error("unknown label: {0:?}")]
    UnknownLabel(String),

    #[error("image generation failed: {0}")]
    Generation(#[source] anyhow::Error),

    #[error("upload failed: {0}")]
    Upload(#[source] anyhow::Error),

    #[error("workspace I/O failed: {0}")]
    Workspace(#[from] std::io::Error),
}

impl PipelineError {
    /// Client-side faults: the request was malformed, nothing ran.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidClient(_) | PipelineError::UnknownLabel(_)
        )
    }
}

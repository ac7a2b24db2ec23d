use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    BucketStore, Categories, PipelineError, PredictRequest, SketchBatch, SketchModel, Workspace,
};

/// The predict pipeline: derive a workspace, stage generated sketches,
/// upload them, and always drop the local copy.
///
/// The model and store handles are built once at startup and injected here;
/// the pipeline itself holds no per-request state.
pub struct Pipeline {
    model: Arc<dyn SketchModel>,
    store: Arc<dyn BucketStore>,
    images_root: PathBuf,
}

impl Pipeline {
    pub fn new(
        model: Arc<dyn SketchModel>,
        store: Arc<dyn BucketStore>,
        images_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            model,
            store,
            images_root: images_root.into(),
        }
    }

    pub fn categories(&self) -> &Categories {
        self.model.categories()
    }

    /// Run one generation request end to end and return the remote folder
    /// the images were uploaded to.
    ///
    /// Label resolution happens before any filesystem write, so an unknown
    /// label leaves no workspace behind. Once the directory may exist,
    /// cleanup runs on every exit path; a cleanup fault is logged and does
    /// not mask the pipeline outcome.
    pub async fn predict(&self, req: &PredictRequest) -> Result<String, PipelineError> {
        let label = self.model.categories().resolve(&req.label)?;
        let workspace = Workspace::for_client(&req.ip, &self.images_root)?;

        let outcome = self
            .stage_and_upload(&workspace, req.num_of_examples, label, &req.ip)
            .await;

        if let Err(err) = workspace.cleanup().await {
            warn!(
                path = %workspace.local_path().display(),
                error = %err,
                "workspace cleanup failed, local files may remain"
            );
        }

        if let Ok(folder) = &outcome {
            info!(
                client = %req.ip,
                label = %req.label,
                samples = req.num_of_examples,
                folder,
                "predict complete"
            );
        }
        outcome
    }

    async fn stage_and_upload(
        &self,
        workspace: &Workspace,
        num_of_examples: u32,
        label: usize,
        client: &str,
    ) -> Result<String, PipelineError> {
        workspace.create().await?;

        let batch = self
            .model
            .generate(num_of_examples, label)
            .map_err(PipelineError::Generation)?;
        stage_batch(workspace.local_path(), &batch).await?;

        self.store
            .upload_dir(client, workspace.local_path(), workspace.remote_path())
            .await
            .map_err(PipelineError::Upload)
    }
}

/// Write each generated image into the workspace as a numbered PNG.
async fn stage_batch(dir: &Path, batch: &SketchBatch) -> Result<(), PipelineError> {
    for (index, img) in batch.iter().enumerate() {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| PipelineError::Generation(e.into()))?;
        tokio::fs::write(dir.join(format!("{index}.png")), bytes).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::ProceduralSketch;

    /// Store double that records uploads, or fails on demand.
    struct RecordingStore {
        fail: bool,
        uploads: Mutex<Vec<(String, usize)>>,
    }

    impl RecordingStore {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                uploads: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BucketStore for RecordingStore {
        async fn upload_dir(&self, _client: &str, local: &Path, remote: &str) -> anyhow::Result<String> {
            if self.fail {
                return Err(anyhow!("bucket unreachable"));
            }
            let files = std::fs::read_dir(local).unwrap().count();
            self.uploads
                .lock()
                .unwrap()
                .push((remote.to_string(), files));
            Ok(remote.to_string())
        }
    }

    fn pipeline(root: &Path, fail_upload: bool) -> (Pipeline, Arc<RecordingStore>) {
        let store = Arc::new(RecordingStore::new(fail_upload));
        let model = Arc::new(ProceduralSketch::with_default_categories());
        (Pipeline::new(model, store.clone(), root), store)
    }

    fn request(label: &str) -> PredictRequest {
        PredictRequest {
            num_of_examples: 3,
            label: label.to_string(),
            ip: "10.0.0.1".to_string(),
        }
    }

    fn entries(root: &Path) -> usize {
        std::fs::read_dir(root).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn success_uploads_and_removes_the_workspace() {
        let root = tempfile::tempdir().unwrap();
        let (pipeline, store) = pipeline(root.path(), false);

        let folder = pipeline.predict(&request("cat")).await.unwrap();

        let uploads = store.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, folder);
        assert_eq!(uploads[0].1, 3, "one PNG per requested sample");
        assert!(folder.starts_with("/images/10.0.0.1-"));
        assert_eq!(entries(root.path()), 0, "local workspace was removed");
    }

    #[tokio::test]
    async fn unknown_label_faults_without_touching_the_filesystem() {
        let root = tempfile::tempdir().unwrap();
        let (pipeline, _) = pipeline(root.path(), false);

        let err = pipeline.predict(&request("submarine")).await.unwrap_err();

        assert!(matches!(err, PipelineError::UnknownLabel(_)));
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn upload_failure_still_removes_the_workspace() {
        let root = tempfile::tempdir().unwrap();
        let (pipeline, _) = pipeline(root.path(), true);

        let err = pipeline.predict(&request("cat")).await.unwrap_err();

        assert!(matches!(err, PipelineError::Upload(_)));
        assert_eq!(entries(root.path()), 0, "no leak on upload failure");
    }

    #[tokio::test]
    async fn invalid_client_is_rejected_before_any_write() {
        let root = tempfile::tempdir().unwrap();
        let (pipeline, _) = pipeline(root.path(), false);

        let mut req = request("cat");
        req.ip = "../../etc".to_string();
        let err = pipeline.predict(&req).await.unwrap_err();

        assert!(matches!(err, PipelineError::InvalidClient(_)));
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn concurrent_requests_use_distinct_folders() {
        let root = tempfile::tempdir().unwrap();
        let (pipeline, store) = pipeline(root.path(), false);
        let pipeline = Arc::new(pipeline);

        let mut handles = Vec::new();
        for client in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
            let pipeline = pipeline.clone();
            let mut req = request("dog");
            req.ip = client.to_string();
            handles.push(tokio::spawn(async move { pipeline.predict(&req).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let uploads = store.uploads.lock().unwrap();
        let mut folders: Vec<_> = uploads.iter().map(|(f, _)| f.clone()).collect();
        folders.sort();
        folders.dedup();
        assert_eq!(folders.len(), 3);
        assert_eq!(entries(root.path()), 0);
    }
}

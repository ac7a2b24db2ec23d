pub mod categories;
pub mod error;
pub mod pipeline;
pub mod sketch;
pub mod storage;
pub mod workspace;

pub use categories::Categories;
pub use error::PipelineError;
use image::DynamicImage;
pub use pipeline::Pipeline;
use serde::{Deserialize, Serialize};
pub use sketch::{ProceduralSketch, SketchModel};
pub use storage::{BucketStore, LocalBucket};
pub use workspace::Workspace;

// Parameters of one generation request, as they arrive on the wire.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PredictRequest {
    pub num_of_examples: u32,
    pub label: String,
    pub ip: String,
}

/// A batch of generated images, ready to be staged as files.
pub type SketchBatch = Vec<DynamicImage>;

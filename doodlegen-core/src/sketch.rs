use anyhow::{bail, Result};
use image::{DynamicImage, GrayImage};

use crate::{Categories, SketchBatch};

/// Side of the square canvas the sketch models draw on.
pub const CANVAS_SIZE: u32 = 28;

/// A pretrained sketch generator.
///
/// Implementations are loaded once at startup and shared across requests;
/// `generate` takes the label in resolved index form.
pub trait SketchModel: Send + Sync {
    fn categories(&self) -> &Categories;

    fn generate(&self, num_of_examples: u32, label: usize) -> Result<SketchBatch>;
}

/// Deterministic stand-in generator.
///
/// Draws a seeded noise sketch per sample so the full pipeline (staging,
/// upload, cleanup) runs without network weights. Output for a given
/// (label, sample) pair is stable across runs.
pub struct ProceduralSketch {
    categories: Categories,
}

impl ProceduralSketch {
    pub fn new(categories: Categories) -> Self {
        Self { categories }
    }

    /// Built-in category list matching the published model head.
    pub fn with_default_categories() -> Self {
        let labels = [
            "airplane", "apple", "bicycle", "bird", "cat", "dog", "fish", "flower", "house",
            "tree",
        ];
        Self::new(Categories::new(
            labels.iter().map(|s| s.to_string()).collect(),
        ))
    }

    fn draw(&self, label: usize, sample: u32) -> DynamicImage {
        let seed = (label as u64) << 32 | u64::from(sample);
        let img = GrayImage::from_fn(CANVAS_SIZE, CANVAS_SIZE, |x, y| {
            let cell = seed
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(u64::from(y * CANVAS_SIZE + x));
            image::Luma([splitmix(cell) as u8])
        });
        DynamicImage::ImageLuma8(img)
    }
}

impl SketchModel for ProceduralSketch {
    fn categories(&self) -> &Categories {
        &self.categories
    }

    fn generate(&self, num_of_examples: u32, label: usize) -> Result<SketchBatch> {
        if label >= self.categories.len() {
            bail!(
                "label index {label} out of range for {} categories",
                self.categories.len()
            );
        }
        Ok((0..num_of_examples)
            .map(|sample| self.draw(label, sample))
            .collect())
    }
}

fn splitmix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_the_requested_number_of_samples() {
        let model = ProceduralSketch::with_default_categories();
        let batch = model.generate(3, 0).unwrap();
        assert_eq!(batch.len(), 3);
        for img in &batch {
            assert_eq!((img.width(), img.height()), (CANVAS_SIZE, CANVAS_SIZE));
        }
    }

    #[test]
    fn output_is_deterministic() {
        let model = ProceduralSketch::with_default_categories();
        let a = model.generate(2, 4).unwrap();
        let b = model.generate(2, 4).unwrap();
        assert_eq!(a[0].as_bytes(), b[0].as_bytes());
        assert_eq!(a[1].as_bytes(), b[1].as_bytes());
    }

    #[test]
    fn out_of_range_label_fails() {
        let model = ProceduralSketch::with_default_categories();
        assert!(model.generate(1, 999).is_err());
    }
}

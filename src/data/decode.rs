// ============================================================
// Layer 4 — Image Decode / Resize Stage
// ============================================================
// Two strategies, never mixed inside one dataset:
//
//   FastPath  — decode JPEG/PNG/GIF/BMP bytes and require the
//               exact [img_size, img_size, channels] shape.
//               No resize: a mismatch is a DecodeShape error.
//
//   Fallback  — open as 8-bit grayscale and bilinear-resize to
//               28×28×1. Any input resolution is accepted.
//
// Pixels are cast to f32 without normalisation (0.0..=255.0).
// Decoding runs lazily, when a batch is pulled from the dataset.
//
// Reference: image crate docs (DynamicImage, imageops::resize)

use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, sync::Arc};

use crate::data::error::{DatasetError, DatasetResult};

/// Side length of images produced by the fallback decoder
pub const FALLBACK_IMG_SIZE: u32 = 28;

/// Which decoder a dataset applies to its image paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodeStrategy {
    /// Native decode with an exact shape assertion
    FastPath,
    /// Grayscale decode followed by an explicit 28×28 resize
    Fallback,
}

impl DecodeStrategy {
    /// Build the decoder for this strategy.
    /// `img_size` / `channels` only apply to the fast path.
    pub fn decoder(self, img_size: usize, channels: usize) -> DatasetResult<Arc<dyn ImageDecoder>> {
        Ok(match self {
            Self::FastPath => Arc::new(FastPathDecoder::new(img_size, channels)?),
            Self::Fallback => Arc::new(FallbackDecoder::default()),
        })
    }
}

/// Turns an image file into a fixed-shape HWC f32 buffer.
pub trait ImageDecoder: Send + Sync {
    /// [height, width, channels] of every decoded image
    fn output_shape(&self) -> [usize; 3];

    fn decode(&self, path: &Path) -> DatasetResult<Vec<f32>>;
}

// ─── FastPathDecoder ──────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct FastPathDecoder {
    img_size: usize,
    channels: usize,
}

impl FastPathDecoder {
    pub fn new(img_size: usize, channels: usize) -> DatasetResult<Self> {
        if img_size == 0 {
            return Err(DatasetError::Config("img_size must be positive".into()));
        }
        if !(1..=4).contains(&channels) {
            return Err(DatasetError::Config(format!(
                "channels must be between 1 and 4, got {channels}"
            )));
        }
        Ok(Self { img_size, channels })
    }
}

impl ImageDecoder for FastPathDecoder {
    fn output_shape(&self) -> [usize; 3] {
        [self.img_size, self.img_size, self.channels]
    }

    fn decode(&self, path: &Path) -> DatasetResult<Vec<f32>> {
        let bytes = fs::read(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        // Container format is sniffed from the bytes, not the extension
        let img = image::load_from_memory(&bytes).map_err(|source| DatasetError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let actual = [
            img.height() as usize,
            img.width() as usize,
            img.color().channel_count() as usize,
        ];
        let expected = self.output_shape();
        if actual != expected {
            return Err(DatasetError::DecodeShape {
                path: path.to_path_buf(),
                expected,
                actual,
            });
        }

        let raw = match self.channels {
            1 => img.into_luma8().into_raw(),
            2 => img.into_luma_alpha8().into_raw(),
            3 => img.into_rgb8().into_raw(),
            _ => img.into_rgba8().into_raw(),
        };
        Ok(raw.into_iter().map(f32::from).collect())
    }
}

// ─── FallbackDecoder ──────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct FallbackDecoder {
    size: u32,
}

impl Default for FallbackDecoder {
    fn default() -> Self {
        Self { size: FALLBACK_IMG_SIZE }
    }
}

impl ImageDecoder for FallbackDecoder {
    fn output_shape(&self) -> [usize; 3] {
        [self.size as usize, self.size as usize, 1]
    }

    fn decode(&self, path: &Path) -> DatasetResult<Vec<f32>> {
        let gray = image::open(path)
            .map_err(|source| DatasetError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .into_luma8();

        // Triangle is the bilinear filter
        let resized = imageops::resize(&gray, self.size, self.size, FilterType::Triangle);
        Ok(resized.into_raw().into_iter().map(f32::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;

    #[test]
    fn test_fast_path_exact_shape() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("frame.png");
        fixtures::write_rgb(&path, 4, 4, 200);

        let dec = FastPathDecoder::new(4, 3).unwrap();
        let pixels = dec.decode(&path).unwrap();
        assert_eq!(pixels.len(), 4 * 4 * 3);
        // Raw values, not scaled to [0, 1]
        assert_eq!(pixels[0], 200.0);
    }

    #[test]
    fn test_fast_path_rejects_wrong_size() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("big.png");
        fixtures::write_rgb(&path, 8, 6, 10);

        let dec = FastPathDecoder::new(4, 3).unwrap();
        match dec.decode(&path) {
            Err(DatasetError::DecodeShape { expected, actual, .. }) => {
                assert_eq!(expected, [4, 4, 3]);
                assert_eq!(actual, [6, 8, 3]);
            }
            other => panic!("expected DecodeShape, got {other:?}"),
        }
    }

    #[test]
    fn test_fast_path_rejects_wrong_channel_count() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("rgb.png");
        fixtures::write_rgb(&path, 4, 4, 10);

        let dec = FastPathDecoder::new(4, 1).unwrap();
        assert!(matches!(
            dec.decode(&path),
            Err(DatasetError::DecodeShape { .. })
        ));
    }

    #[test]
    fn test_fallback_resizes_any_resolution() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("wide.png");
        fixtures::write_rgb(&path, 64, 20, 90);

        let dec = FallbackDecoder::default();
        let pixels = dec.decode(&path).unwrap();
        assert_eq!(dec.output_shape(), [28, 28, 1]);
        assert_eq!(pixels.len(), 28 * 28);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dec = FastPathDecoder::new(4, 3).unwrap();
        assert!(matches!(
            dec.decode(Path::new("/definitely/not/here.png")),
            Err(DatasetError::Io { .. })
        ));
        assert!(FallbackDecoder::default()
            .decode(Path::new("/definitely/not/here.png"))
            .is_err());
    }

    #[test]
    fn test_invalid_channel_config() {
        assert!(FastPathDecoder::new(32, 0).is_err());
        assert!(FastPathDecoder::new(32, 5).is_err());
        assert!(FastPathDecoder::new(0, 3).is_err());
    }
}

// ============================================================
// Layer 3 — Example and Batch
// ============================================================
// An Example is one decoded training pair:
//   image: f32 pixels in HWC order, shape [height, width, channels]
//   label: steering angle reshaped to a length-1 vector
//
// Unlabeled examples (fallback decode path) carry no label.
// Every example inside one dataset shares the same shape.

/// One decoded (image, label) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    /// Row-major HWC pixel values, cast to f32 (not normalised)
    pub image: Vec<f32>,

    /// [height, width, channels]
    pub shape: [usize; 3],

    /// Steering angle as a length-1 vector, None for unlabeled data
    pub label: Option<[f32; 1]>,
}

impl Example {
    pub fn new(image: Vec<f32>, shape: [usize; 3], label: Option<f32>) -> Self {
        debug_assert_eq!(image.len(), shape.iter().product::<usize>());
        Self {
            image,
            shape,
            label: label.map(|l| [l]),
        }
    }
}

/// An ordered group of examples. The final batch of a pass may be
/// shorter than the configured batch size.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Batch {
    pub examples: Vec<Example>,
}

impl Batch {
    pub fn new(examples: Vec<Example>) -> Self {
        Self { examples }
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Shape shared by every image in the batch
    pub fn image_shape(&self) -> Option<[usize; 3]> {
        self.examples.first().map(|e| e.shape)
    }

    /// All labels in batch order, or None if any example is unlabeled
    pub fn labels(&self) -> Option<Vec<f32>> {
        self.examples
            .iter()
            .map(|e| e.label.map(|[l]| l))
            .collect()
    }
}

// ============================================================
// Layer 3 — Manifest Record
// ============================================================
// The simulator writes one CSV row per captured frame:
//
//   img_center, img_left, img_right, center, left, right, steering_angle
//
// The file has no header row, so the column names live here.
// Only `img_center` and `steering_angle` feed the trainer;
// the remaining fields are parsed and carried along.

use serde::{Deserialize, Serialize};

/// Column names of driving_log.csv, in file order.
pub const MANIFEST_COLUMNS: [&str; 7] = [
    "img_center",
    "img_left",
    "img_right",
    "center",
    "left",
    "right",
    "steering_angle",
];

/// One parsed row of the driving log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestRecord {
    /// Path to the centre camera frame (the training input)
    pub img_center: String,
    pub img_left: String,
    pub img_right: String,
    pub center: f32,
    pub left: f32,
    pub right: f32,
    /// Ground truth steering angle (the regression target)
    pub steering_angle: f32,
}

impl ManifestRecord {
    /// Number of columns a well-formed row carries
    pub const WIDTH: usize = MANIFEST_COLUMNS.len();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_and_label_columns() {
        assert_eq!(MANIFEST_COLUMNS[0], "img_center");
        assert_eq!(MANIFEST_COLUMNS[ManifestRecord::WIDTH - 1], "steering_angle");
        assert_eq!(ManifestRecord::WIDTH, 7);
    }
}

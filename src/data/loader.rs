// ============================================================
// Layer 4 — Manifest Loader
// ============================================================
// Reads the simulator's driving_log.csv and hands the image
// paths and steering labels to `make_dataset`.
//
// The CSV has no header row. Columns, in order:
//   img_center, img_left, img_right, center, left, right, steering_angle
//
// Only `img_center` (feature) and `steering_angle` (label) are used.
// Row i of the features stays paired with row i of the labels.
//
// Image paths:
//   absolute → used as written
//   relative → joined onto the image directory
//
// Entry points pick the decode strategy explicitly:
//   load_data       → labeled   → FastPath
//   load_unlabeled  → unlabeled → Fallback
//
// Reference: csv crate docs (ReaderBuilder, StringRecord)
//            Rust Book §9 (Error Handling)

use std::path::{Path, PathBuf};

use crate::data::{
    dataset::{make_dataset, Dataset, DatasetOptions},
    decode::DecodeStrategy,
    error::{DatasetError, DatasetResult},
};
use crate::domain::manifest::{ManifestRecord, MANIFEST_COLUMNS};

/// File name the simulator gives its log
pub const MANIFEST_FILENAME: &str = "driving_log.csv";

/// Sub-directory of the data dir that holds the frames
pub const IMAGE_SUBDIR: &str = "IMG";

/// Parse every row of a headerless driving log.
pub fn read_manifest(path: &Path) -> DatasetResult<Vec<ManifestRecord>> {
    if !path.is_file() {
        return Err(DatasetError::ManifestNotFound { path: path.to_path_buf() });
    }

    // flexible: short rows reach our own schema check instead of
    // failing inside the csv reader
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| DatasetError::Csv { path: path.to_path_buf(), source })?;

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|source| DatasetError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        rows.push(parse_record(&record, line + 1)?);
    }

    tracing::debug!("Read {} manifest rows from '{}'", rows.len(), path.display());
    Ok(rows)
}

fn parse_record(record: &csv::StringRecord, line: usize) -> DatasetResult<ManifestRecord> {
    if record.len() < ManifestRecord::WIDTH {
        return Err(DatasetError::Schema(format!(
            "line {line}: expected {} columns ({}), found {}",
            ManifestRecord::WIDTH,
            MANIFEST_COLUMNS.join(", "),
            record.len()
        )));
    }

    let text = |i: usize| record[i].to_string();
    let number = |i: usize| -> DatasetResult<f32> {
        record[i].parse::<f32>().map_err(|_| {
            DatasetError::Schema(format!(
                "line {line}: column '{}' is not numeric: {:?}",
                MANIFEST_COLUMNS[i], &record[i]
            ))
        })
    };

    if record[0].is_empty() {
        return Err(DatasetError::Schema(format!(
            "line {line}: column 'img_center' is empty"
        )));
    }

    Ok(ManifestRecord {
        img_center: text(0),
        img_left: text(1),
        img_right: text(2),
        center: number(3)?,
        left: number(4)?,
        right: number(5)?,
        steering_angle: number(6)?,
    })
}

/// Resolve a manifest path against the image directory.
pub fn resolve_image_path(raw: &str, image_dir: &Path) -> PathBuf {
    let p = Path::new(raw.trim());
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        image_dir.join(p)
    }
}

/// Build the labeled training dataset from a manifest.
pub fn load_data(
    manifest_path: &Path,
    image_dir: &Path,
    options: DatasetOptions,
) -> DatasetResult<Dataset> {
    let rows = read_manifest(manifest_path)?;

    let (features, labels): (Vec<PathBuf>, Vec<f32>) = rows
        .iter()
        .map(|r| (resolve_image_path(&r.img_center, image_dir), r.steering_angle))
        .unzip();

    tracing::info!(
        "Loaded {} examples from '{}'",
        features.len(),
        manifest_path.display()
    );

    let options = DatasetOptions { decode: DecodeStrategy::FastPath, ..options };
    make_dataset(features, Some(labels), options)
}

/// Build an unlabeled dataset from image paths given directly.
/// These always go through the grayscale fallback decoder.
pub fn load_unlabeled(features: Vec<PathBuf>, options: DatasetOptions) -> DatasetResult<Dataset> {
    let options = DatasetOptions { decode: DecodeStrategy::Fallback, ..options };
    make_dataset(features, None, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;
    use std::fs;

    fn options(batch_size: usize, shuffle: bool) -> DatasetOptions {
        DatasetOptions {
            shuffle,
            batch_size,
            img_size: 4,
            channels: 3,
            seed: Some(7),
            ..DatasetOptions::default()
        }
    }

    #[test]
    fn test_thousand_rows_ten_batches() {
        let tmp = tempfile::tempdir().unwrap();
        let (manifest, image_dir) = fixtures::write_driving_log(tmp.path(), 1000, 4);

        let mut ds = load_data(&manifest, &image_dir, options(100, false)).unwrap();
        assert_eq!(ds.len(), 1000);

        let mut count = 0usize;
        let mut row = 0usize;
        for batch in ds.iter() {
            let batch = batch.unwrap();
            assert_eq!(batch.len(), 100);
            for ex in &batch.examples {
                assert_eq!(ex.shape, [4, 4, 3]);
                // Row i carries label i and first pixel i % 256
                assert_eq!(ex.label, Some([row as f32]));
                assert_eq!(ex.image[0], (row % 256) as f32);
                row += 1;
            }
            count += 1;
        }
        assert_eq!(count, 10);
        assert_eq!(row, 1000);
    }

    #[test]
    fn test_missing_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_data(&tmp.path().join("nope.csv"), tmp.path(), options(4, false));
        assert!(matches!(err, Err(DatasetError::ManifestNotFound { .. })));
    }

    #[test]
    fn test_short_row_is_schema_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(MANIFEST_FILENAME);
        fs::write(&path, "a.png, b.png, c.png, 0, 0, 0, 0.1\nonly.png, 0.2\n").unwrap();

        match read_manifest(&path) {
            Err(DatasetError::Schema(msg)) => assert!(msg.contains("line 2")),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_label_is_schema_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(MANIFEST_FILENAME);
        fs::write(&path, "a.png, b.png, c.png, 0, 0, 0, left\n").unwrap();
        assert!(matches!(read_manifest(&path), Err(DatasetError::Schema(_))));
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(MANIFEST_FILENAME);
        fs::write(&path, "IMG/c.png, IMG/l.png, IMG/r.png, 0.0, 0.5, 0, -0.25\n").unwrap();

        let rows = read_manifest(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].img_left, "IMG/l.png");
        assert_eq!(rows[0].left, 0.5);
        assert_eq!(rows[0].steering_angle, -0.25);
    }

    #[test]
    fn test_resolve_image_path() {
        let dir = Path::new("/data/IMG");
        assert_eq!(
            resolve_image_path(" center_1.jpg", dir),
            PathBuf::from("/data/IMG/center_1.jpg")
        );
        assert_eq!(
            resolve_image_path("/abs/center_1.jpg", dir),
            PathBuf::from("/abs/center_1.jpg")
        );
    }

    #[test]
    fn test_load_unlabeled_uses_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("frame.png");
        fixtures::write_rgb(&path, 40, 40, 5);

        // Even with FastPath requested, unlabeled features use the fallback
        let ds = load_unlabeled(vec![path], options(1, false)).unwrap();
        assert_eq!(ds.options().decode, DecodeStrategy::Fallback);
        assert_eq!(ds.example_shape(), [28, 28, 1]);
    }
}

//! Synthetic frames and driving logs for tests.

use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use crate::data::loader::{IMAGE_SUBDIR, MANIFEST_FILENAME};

/// Write a solid-colour RGB PNG.
pub fn write_rgb(path: &Path, width: u32, height: u32, value: u8) {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([value, value / 2, 255 - value]));
    img.save(path).unwrap();
}

/// Write `count` square frames into `dir`. Frame i has first pixel
/// value `i % 256` and label `i`.
pub fn write_frames(dir: &Path, count: usize, size: u32) -> (Vec<PathBuf>, Vec<f32>) {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("center_{i:05}.png"));
            write_rgb(&path, size, size, (i % 256) as u8);
            (path, i as f32)
        })
        .unzip()
}

/// Lay out `<root>/driving_log.csv` and `<root>/IMG/` the way the
/// simulator does, with relative frame paths. Returns (manifest, image dir).
pub fn write_driving_log(root: &Path, rows: usize, size: u32) -> (PathBuf, PathBuf) {
    let image_dir = root.join(IMAGE_SUBDIR);
    fs::create_dir_all(&image_dir).unwrap();
    let (paths, labels) = write_frames(&image_dir, rows, size);

    let mut csv = String::new();
    for (path, label) in paths.iter().zip(labels) {
        let name = path.file_name().unwrap().to_string_lossy();
        writeln!(csv, "{name}, left_{name}, right_{name}, 0.0, 0.0, 0.0, {label}").unwrap();
    }
    let manifest = root.join(MANIFEST_FILENAME);
    fs::write(&manifest, csv).unwrap();
    (manifest, image_dir)
}

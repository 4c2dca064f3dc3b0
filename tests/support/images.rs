use std::path::Path;

use image::{Rgb, RgbImage};

/// Write `count` solid-color PNGs into `<root>/<class_name>/`.
///
/// The red channel encodes the class position, the green channel the image
/// position, so every fixture image is distinct.
pub fn write_class_images(root: &Path, class_name: &str, class_pos: u8, count: usize) {
    let dir = root.join(class_name);
    std::fs::create_dir_all(&dir).expect("create class dir");
    for idx in 0..count {
        let color = Rgb([class_pos.saturating_mul(60), (idx as u8).saturating_mul(5), 128]);
        RgbImage::from_pixel(10, 10, color)
            .save(dir.join(format!("img_{idx:03}.png")))
            .expect("write fixture png");
    }
}

/// Write a corpus with one folder per `(class_name, count)` entry.
pub fn write_corpus(root: &Path, classes: &[(&str, usize)]) {
    for (pos, (class_name, count)) in classes.iter().enumerate() {
        write_class_images(root, class_name, pos as u8, *count);
    }
}

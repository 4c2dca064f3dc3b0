//! Whole-partition materialization into plain `ndarray` arrays.

use ndarray::{Array1, Array4, Axis};

use super::folder::ImageFolder;
use super::transform::{ImageTransform, TransformError};

/// Feature batch `[N, 3, S, S]` with its `[N]` labels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledArrays {
    pub x: Array4<f32>,
    pub y: Array1<i64>,
}

impl LabeledArrays {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Copy out the given rows, in the given order.
    pub fn select(&self, rows: &[usize]) -> Self {
        Self {
            x: self.x.select(Axis(0), rows),
            y: self.y.select(Axis(0), rows),
        }
    }

    /// Labels as class indices.
    pub fn label_indices(&self) -> Vec<usize> {
        self.y.iter().map(|&label| label as usize).collect()
    }
}

/// Decode and transform the records at `indices`, in that order.
///
/// The whole batch is allocated up front and each image is written into its row.
pub fn materialize(
    folder: &ImageFolder,
    indices: &[usize],
    transform: &ImageTransform,
) -> Result<LabeledArrays, TransformError> {
    let [channels, height, width] = transform.output_shape();
    let mut x = Array4::<f32>::zeros((indices.len(), channels, height, width));
    let mut y = Array1::<i64>::zeros(indices.len());
    let records = folder.records();
    for (row, &idx) in indices.iter().enumerate() {
        let record = &records[idx];
        transform.load_into(&record.path, x.index_axis_mut(Axis(0), row))?;
        y[row] = record.label as i64;
    }
    Ok(LabeledArrays { x, y })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    #[test]
    fn rows_follow_requested_order() {
        let dir = tempdir().unwrap();
        let black = dir.path().join("dark/0.png");
        let white = dir.path().join("light/0.png");
        for (path, value) in [(&black, 0u8), (&white, 255u8)] {
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            RgbImage::from_pixel(5, 5, Rgb([value; 3])).save(path).unwrap();
        }
        let folder = ImageFolder::scan(dir.path()).unwrap();
        let transform = ImageTransform::new(3, [0.5; 3], [0.5; 3]).unwrap();

        let batch = materialize(&folder, &[1, 0, 1], &transform).unwrap();
        assert_eq!(batch.x.shape(), &[3, 3, 3, 3]);
        assert_eq!(batch.y.to_vec(), vec![1, 0, 1]);
        assert!(batch.x.index_axis(Axis(0), 0).iter().all(|v| (*v - 1.0).abs() < 1e-6));
        assert!(batch.x.index_axis(Axis(0), 1).iter().all(|v| (*v + 1.0).abs() < 1e-6));

        let picked = batch.select(&[2, 1]);
        assert_eq!(picked.y.to_vec(), vec![1, 0]);
        assert_eq!(picked.label_indices(), vec![1, 0]);
        assert_eq!(picked.x.shape(), &[2, 3, 3, 3]);
    }

    #[test]
    fn empty_selection_keeps_image_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("only/0.png");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_pixel(2, 2, Rgb([9, 9, 9])).save(&path).unwrap();
        let folder = ImageFolder::scan(dir.path()).unwrap();
        let transform = ImageTransform::new(4, [0.5; 3], [0.5; 3]).unwrap();
        let batch = materialize(&folder, &[], &transform).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.x.shape(), &[0, 3, 4, 4]);
    }
}

//! Building blocks for dataset preparation: folder scanning, image
//! preprocessing, random partitioning, balanced seed sampling and
//! materialization into arrays.

pub mod arrays;
pub mod folder;
pub mod seed_set;
pub mod split;
pub mod transform;

pub use arrays::{LabeledArrays, materialize};
pub use folder::{ImageFolder, ImageFolderError, ImageRecord};
pub use seed_set::{SeedSetError, balanced_seed_indices, class_distribution};
pub use split::{SplitError, partition_sizes, random_split, shuffled_indices};
pub use transform::{ImageTransform, TransformError};

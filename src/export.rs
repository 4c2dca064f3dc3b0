//! Write prepared arrays as `.npy` files plus a `manifest.json`.
//!
//! Feature arrays are `float32` with shape `[N, 3, S, S]`, label arrays are
//! `int64` with shape `[N]`, matching what NumPy-based training code expects.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ndarray_npy::{WriteNpyError, write_npy};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::prepare::{PrepSummary, PreparedArrays};

/// Bumped whenever file names or the manifest layout change.
pub const EXPORT_FORMAT_VERSION: i64 = 1;
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Npy {
        path: PathBuf,
        source: WriteNpyError,
    },
}

#[derive(Debug, Clone, Serialize)]
struct ArrayFiles {
    x: String,
    y: String,
    len: usize,
}

#[derive(Debug, Clone, Serialize)]
struct ExportManifest<'a> {
    format_version: i64,
    x_dtype: &'static str,
    y_dtype: &'static str,
    x_shape_tail: [usize; 3],
    partitions: BTreeMap<&'static str, ArrayFiles>,
    summary: &'a PrepSummary,
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub out_dir: PathBuf,
    pub files_written: usize,
    pub manifest_path: PathBuf,
}

/// File names used for a partition: `X_<name>.npy` and `y_<name>.npy`.
pub fn array_file_names(name: &str) -> (String, String) {
    (format!("X_{name}.npy"), format!("y_{name}.npy"))
}

/// Write all eight arrays and the manifest into `out_dir`, creating it if needed.
pub fn export_arrays(
    arrays: &PreparedArrays,
    summary: &PrepSummary,
    out_dir: &Path,
) -> Result<ExportSummary, ExportError> {
    std::fs::create_dir_all(out_dir)?;

    let side = summary.image_size as usize;
    let mut partitions = BTreeMap::new();
    let mut files_written = 0usize;
    for (name, batch) in arrays.named() {
        let (x_name, y_name) = array_file_names(name);
        write_array(&out_dir.join(&x_name), &batch.x)?;
        write_array(&out_dir.join(&y_name), &batch.y)?;
        files_written += 2;
        partitions.insert(
            name,
            ArrayFiles {
                x: x_name,
                y: y_name,
                len: batch.len(),
            },
        );
    }

    let manifest = ExportManifest {
        format_version: EXPORT_FORMAT_VERSION,
        x_dtype: "float32",
        y_dtype: "int64",
        x_shape_tail: [3, side, side],
        partitions,
        summary,
    };
    let manifest_path = out_dir.join(MANIFEST_FILE_NAME);
    std::fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest)?)?;
    info!("Exported {files_written} arrays to {}", out_dir.display());

    Ok(ExportSummary {
        out_dir: out_dir.to_path_buf(),
        files_written,
        manifest_path,
    })
}

fn write_array<T>(path: &Path, array: &T) -> Result<(), ExportError>
where
    T: ndarray_npy::WriteNpyExt,
{
    write_npy(path, array).map_err(|source| ExportError::Npy {
        path: path.to_path_buf(),
        source,
    })
}

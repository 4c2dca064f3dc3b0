//! Class-per-folder image corpora.
//!
//! A corpus root holds one subfolder per class. Classes are indexed by their
//! sorted folder names, and every supported image file below a class folder
//! (at any depth) belongs to that class. Within a class, directories are
//! visited in path-string order and files are sorted by name inside each
//! directory, so `cls/z.png` comes before `cls/sub/a.png`.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// File extensions treated as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "ppm", "bmp", "pgm", "tif", "tiff", "webp",
];

#[derive(Debug, Error)]
pub enum ImageFolderError {
    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("No class folders found under {0}")]
    NoClasses(PathBuf),
    #[error("Class folder name is not valid UTF-8: {0}")]
    NonUtf8ClassName(PathBuf),
    #[error("Class '{class_name}' has no supported image files under {path}")]
    EmptyClass { class_name: String, path: PathBuf },
}

/// One labeled image on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub path: PathBuf,
    /// Index into [`ImageFolder::class_names`].
    pub label: usize,
}

/// Scanned listing of a class-per-folder corpus. No pixels are decoded here.
#[derive(Debug, Clone)]
pub struct ImageFolder {
    root: PathBuf,
    class_names: Vec<String>,
    records: Vec<ImageRecord>,
}

impl ImageFolder {
    /// Scan `root`, ordering records by class index, then directory, then name.
    pub fn scan(root: &Path) -> Result<Self, ImageFolderError> {
        let mut class_dirs = Vec::new();
        for entry in read_dir(root)? {
            let entry = entry.map_err(|source| ImageFolderError::ReadDir {
                path: root.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry
                .file_name()
                .into_string()
                .map_err(|_| ImageFolderError::NonUtf8ClassName(path.clone()))?;
            class_dirs.push((name, path));
        }
        if class_dirs.is_empty() {
            return Err(ImageFolderError::NoClasses(root.to_path_buf()));
        }
        class_dirs.sort_by(|a, b| a.0.cmp(&b.0));

        let mut class_names = Vec::with_capacity(class_dirs.len());
        let mut records = Vec::new();
        for (label, (class_name, class_dir)) in class_dirs.into_iter().enumerate() {
            let files = collect_class_images(&class_dir)?;
            if files.is_empty() {
                return Err(ImageFolderError::EmptyClass {
                    class_name,
                    path: class_dir,
                });
            }
            debug!("class {label} '{class_name}': {} images", files.len());
            records.extend(files.into_iter().map(|path| ImageRecord { path, label }));
            class_names.push(class_name);
        }

        Ok(Self {
            root: root.to_path_buf(),
            class_names,
            records,
        })
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Labels in record order.
    pub fn labels(&self) -> Vec<usize> {
        self.records.iter().map(|record| record.label).collect()
    }

    /// Hex blake3 digest over every record's label and root-relative path.
    ///
    /// Two scans with the same fingerprint index the same files identically,
    /// which is what makes a seeded split reproducible.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for record in &self.records {
            let rel = record.path.strip_prefix(&self.root).unwrap_or(&record.path);
            let rel = rel.to_string_lossy().replace('\\', "/");
            hasher.update(record.label.to_string().as_bytes());
            hasher.update(b"\t");
            hasher.update(rel.as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// True when `path` carries one of [`IMAGE_EXTENSIONS`].
pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn read_dir(path: &Path) -> Result<fs::ReadDir, ImageFolderError> {
    fs::read_dir(path).map_err(|source| ImageFolderError::ReadDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Image files below `class_dir`, grouped by directory.
fn collect_class_images(class_dir: &Path) -> Result<Vec<PathBuf>, ImageFolderError> {
    let mut dirs = Vec::new();
    collect_dirs_recursive(class_dir, &mut dirs)?;
    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(dirs.into_iter().flat_map(|(_, files)| files).collect())
}

/// Push `(dir as string, image files sorted by name)` for `dir` and every
/// directory below it.
fn collect_dirs_recursive(
    dir: &Path,
    out: &mut Vec<(String, Vec<PathBuf>)>,
) -> Result<(), ImageFolderError> {
    let mut files = Vec::new();
    for entry in read_dir(dir)? {
        let entry = entry.map_err(|source| ImageFolderError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_dirs_recursive(&path, out)?;
        } else if path.is_file() && has_image_extension(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    out.push((dir.to_string_lossy().into_owned(), files));
    Ok(())
}

//! Active-learning dataset preparation.
//!
//! [`ActiveLearningData::load`] scans the training and test corpora, splits
//! the training corpus into `train_all`, validation and pool partitions, draws
//! a class-balanced initial labeled set out of `train_all` and materializes
//! everything as plain arrays. All partitions live in memory for the lifetime
//! of the value.
//!
//! Randomness comes from the caller's generator, or one seeded from
//! [`PrepConfig::seed`] (a seed is drawn and recorded when none is set). The
//! generator is consumed in a fixed order: partition split, per-partition
//! shuffles, test shuffle, seed-set sampling. The same seed over the same
//! corpus therefore reproduces every partition and the initial set.

use ndarray::{Array1, Array4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, MAX_SEED, PrepConfig};
use crate::dataset::{
    ImageFolder, ImageFolderError, ImageTransform, LabeledArrays, SeedSetError, SplitError,
    TransformError, balanced_seed_indices, class_distribution, materialize, partition_sizes,
    random_split, shuffled_indices,
};

#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("image folder error: {0}")]
    Folder(#[from] ImageFolderError),
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),
    #[error("split error: {0}")]
    Split(#[from] SplitError),
    #[error("seed set error: {0}")]
    SeedSet(#[from] SeedSetError),
    #[error("training classes {train:?} differ from test classes {test:?}")]
    ClassMismatch {
        train: Vec<String>,
        test: Vec<String>,
    },
}

/// Training-corpus indices of each partition, in materialized row order.
///
/// Row `i` of the validation arrays is training record `validation[i]`, and
/// likewise for the other partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionIndices {
    pub train_all: Vec<usize>,
    pub validation: Vec<usize>,
    pub pool: Vec<usize>,
}

/// The eight output arrays, ordered init/val/pool/test.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedArrays {
    pub initial: LabeledArrays,
    pub validation: LabeledArrays,
    pub pool: LabeledArrays,
    pub test: LabeledArrays,
}

/// `(X_init, y_init, X_val, y_val, X_pool, y_pool, X_test, y_test)`.
pub type ArrayTuple = (
    Array4<f32>,
    Array1<i64>,
    Array4<f32>,
    Array1<i64>,
    Array4<f32>,
    Array1<i64>,
    Array4<f32>,
    Array1<i64>,
);

impl PreparedArrays {
    pub fn into_tuple(self) -> ArrayTuple {
        (
            self.initial.x,
            self.initial.y,
            self.validation.x,
            self.validation.y,
            self.pool.x,
            self.pool.y,
            self.test.x,
            self.test.y,
        )
    }

    /// `(name, arrays)` pairs in output order.
    pub fn named(&self) -> [(&'static str, &LabeledArrays); 4] {
        [
            ("init", &self.initial),
            ("val", &self.validation),
            ("pool", &self.pool),
            ("test", &self.test),
        ]
    }
}

/// Serializable description of a preparation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrepSummary {
    pub class_names: Vec<String>,
    pub image_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
    pub seed: Option<u64>,
    pub train_corpus_len: usize,
    pub test_corpus_len: usize,
    pub train_all_len: usize,
    pub initial_len: usize,
    pub validation_len: usize,
    pub pool_len: usize,
    pub test_len: usize,
    pub initial_distribution: Vec<usize>,
    pub train_fingerprint: String,
    pub test_fingerprint: String,
}

/// Fully materialized partitions of one preparation run.
#[derive(Debug, Clone)]
pub struct ActiveLearningData {
    class_names: Vec<String>,
    partitions: PartitionIndices,
    initial_rows: Vec<usize>,
    train_all: LabeledArrays,
    initial: LabeledArrays,
    validation: LabeledArrays,
    pool: LabeledArrays,
    test: LabeledArrays,
    summary: PrepSummary,
}

impl ActiveLearningData {
    /// Prepare with a generator seeded from `config.seed`.
    ///
    /// Without a configured seed one is drawn from OS entropy and stored in
    /// [`PrepSummary::seed`], so every run can be replayed.
    pub fn load(config: &PrepConfig) -> Result<Self, PrepareError> {
        let seed = match config.seed {
            Some(seed) => seed,
            None => {
                let seed = draw_seed();
                info!("No seed configured; drew seed {seed}");
                seed
            }
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let mut data = Self::load_with_rng(config, &mut rng)?;
        data.summary.seed = Some(seed);
        Ok(data)
    }

    /// Prepare drawing all randomness from `rng`.
    pub fn load_with_rng<R: Rng + ?Sized>(
        config: &PrepConfig,
        rng: &mut R,
    ) -> Result<Self, PrepareError> {
        config.validate()?;
        let transform = ImageTransform::from_config(config)?;

        let train_folder = ImageFolder::scan(&config.train_dir)?;
        let test_folder = ImageFolder::scan(&config.test_dir)?;
        if train_folder.class_names() != test_folder.class_names() {
            return Err(PrepareError::ClassMismatch {
                train: train_folder.class_names().to_vec(),
                test: test_folder.class_names().to_vec(),
            });
        }
        let num_classes = train_folder.class_names().len();
        debug!(
            "Scanned {} training and {} test images across {num_classes} classes",
            train_folder.len(),
            test_folder.len()
        );

        let sizes = partition_sizes(train_folder.len(), config.train_size, config.val_size)?;
        let [train_all, validation, pool] = random_split(train_folder.len(), &sizes, &mut *rng)?;
        let partitions = PartitionIndices {
            train_all: shuffle_part(&train_all, &mut *rng),
            validation: shuffle_part(&validation, &mut *rng),
            pool: shuffle_part(&pool, &mut *rng),
        };

        let mut test_order = shuffled_indices(test_folder.len(), &mut *rng);
        if let Some(limit) = config.test_limit {
            test_order.truncate(limit);
        }

        // Sample before decoding anything so a sparse class fails fast.
        let train_labels: Vec<usize> = partitions
            .train_all
            .iter()
            .map(|&idx| train_folder.records()[idx].label)
            .collect();
        let initial_rows =
            balanced_seed_indices(&train_labels, num_classes, config.seed_per_class, &mut *rng)?;

        info!(
            "Loading partitions: train_all={} validation={} pool={} test={}",
            partitions.train_all.len(),
            partitions.validation.len(),
            partitions.pool.len(),
            test_order.len()
        );
        let train_all = materialize(&train_folder, &partitions.train_all, &transform)?;
        let validation = materialize(&train_folder, &partitions.validation, &transform)?;
        let pool = materialize(&train_folder, &partitions.pool, &transform)?;
        let test = materialize(&test_folder, &test_order, &transform)?;

        let initial = train_all.select(&initial_rows);
        let initial_distribution = class_distribution(&initial.label_indices(), num_classes);
        info!("Initial training data points: {}", initial.len());
        info!("Data distribution for each class: {initial_distribution:?}");

        let summary = PrepSummary {
            class_names: train_folder.class_names().to_vec(),
            image_size: transform.size(),
            mean: config.mean,
            std: config.std,
            seed: config.seed,
            train_corpus_len: train_folder.len(),
            test_corpus_len: test_folder.len(),
            train_all_len: train_all.len(),
            initial_len: initial.len(),
            validation_len: validation.len(),
            pool_len: pool.len(),
            test_len: test.len(),
            initial_distribution,
            train_fingerprint: train_folder.fingerprint(),
            test_fingerprint: test_folder.fingerprint(),
        };

        Ok(Self {
            class_names: train_folder.class_names().to_vec(),
            partitions,
            initial_rows,
            train_all,
            initial,
            validation,
            pool,
            test,
            summary,
        })
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn partition_indices(&self) -> &PartitionIndices {
        &self.partitions
    }

    /// Rows of `train_all` that make up the initial set.
    pub fn initial_rows(&self) -> &[usize] {
        &self.initial_rows
    }

    pub fn train_all(&self) -> &LabeledArrays {
        &self.train_all
    }

    pub fn initial(&self) -> &LabeledArrays {
        &self.initial
    }

    pub fn validation(&self) -> &LabeledArrays {
        &self.validation
    }

    pub fn pool(&self) -> &LabeledArrays {
        &self.pool
    }

    pub fn test(&self) -> &LabeledArrays {
        &self.test
    }

    pub fn initial_distribution(&self) -> &[usize] {
        &self.summary.initial_distribution
    }

    pub fn summary(&self) -> &PrepSummary {
        &self.summary
    }

    /// Copies of all eight output arrays.
    pub fn load_all(&self) -> PreparedArrays {
        PreparedArrays {
            initial: self.initial.clone(),
            validation: self.validation.clone(),
            pool: self.pool.clone(),
            test: self.test.clone(),
        }
    }

    /// Move the eight output arrays out, dropping `train_all`.
    pub fn into_arrays(self) -> (PreparedArrays, PrepSummary) {
        (
            PreparedArrays {
                initial: self.initial,
                validation: self.validation,
                pool: self.pool,
                test: self.test,
            },
            self.summary,
        )
    }
}

fn shuffle_part<R: Rng + ?Sized>(part: &[usize], rng: &mut R) -> Vec<usize> {
    shuffled_indices(part.len(), rng)
        .into_iter()
        .map(|pos| part[pos])
        .collect()
}

/// Fresh seed in `0..=MAX_SEED`, so it can be written back into a config file.
fn draw_seed() -> u64 {
    StdRng::from_os_rng().random_range(0..=MAX_SEED)
}

//! Randomized partitioning of a corpus into disjoint index sets.

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("partition sizes sum to {requested} but the corpus has {available} records")]
    SizeMismatch { requested: usize, available: usize },
    #[error(
        "train_size ({train_size}) + val_size ({val_size}) must be below the corpus size ({corpus_len}) to leave a pool"
    )]
    NoPoolLeft {
        corpus_len: usize,
        train_size: usize,
        val_size: usize,
    },
}

/// `[train, val, pool]` sizes for a corpus of `corpus_len` records.
pub fn partition_sizes(
    corpus_len: usize,
    train_size: usize,
    val_size: usize,
) -> Result<[usize; 3], SplitError> {
    let labeled = train_size.saturating_add(val_size);
    if labeled >= corpus_len {
        return Err(SplitError::NoPoolLeft {
            corpus_len,
            train_size,
            val_size,
        });
    }
    Ok([train_size, val_size, corpus_len - labeled])
}

/// Split `0..len` into disjoint random subsets with the given sizes.
///
/// One permutation is drawn and cut into consecutive chunks, so every index
/// lands in exactly one subset. There is one subset per entry of `sizes`.
pub fn random_split<const N: usize, R: Rng + ?Sized>(
    len: usize,
    sizes: &[usize; N],
    rng: &mut R,
) -> Result<[Vec<usize>; N], SplitError> {
    let requested = sizes
        .iter()
        .try_fold(0usize, |acc, &size| acc.checked_add(size))
        .unwrap_or(usize::MAX);
    if requested != len {
        return Err(SplitError::SizeMismatch {
            requested,
            available: len,
        });
    }
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(rng);

    let mut start = 0usize;
    Ok((*sizes).map(|size| {
        let part = order[start..start + size].to_vec();
        start += size;
        part
    }))
}

/// Shuffled copy of `0..len`, used for whole-partition reads.
pub fn shuffled_indices<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(rng);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeSet;

    #[test]
    fn reference_corpus_sizes() {
        assert_eq!(partition_sizes(5712, 1000, 100).unwrap(), [1000, 100, 4612]);
        assert_eq!(partition_sizes(5712, 1000, 4711).unwrap(), [1000, 4711, 1]);
        assert_eq!(
            partition_sizes(5712, 1000, 4712),
            Err(SplitError::NoPoolLeft {
                corpus_len: 5712,
                train_size: 1000,
                val_size: 4712,
            })
        );
    }

    #[test]
    fn split_covers_every_index_once() {
        let mut rng = StdRng::seed_from_u64(3);
        let parts = random_split(50, &[20, 5, 25], &mut rng).unwrap();
        assert_eq!(
            parts.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![20, 5, 25]
        );
        let mut seen = BTreeSet::new();
        for part in &parts {
            for &idx in part {
                assert!(seen.insert(idx), "index {idx} appears twice");
            }
        }
        assert_eq!(seen, (0..50).collect::<BTreeSet<_>>());
    }

    #[test]
    fn split_rejects_sizes_that_do_not_sum() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            random_split(10, &[5, 4], &mut rng),
            Err(SplitError::SizeMismatch {
                requested: 9,
                available: 10,
            })
        );
        assert!(random_split(10, &[usize::MAX, 11], &mut rng).is_err());
    }

    #[test]
    fn split_yields_one_part_per_size_even_when_empty() {
        let mut rng = StdRng::seed_from_u64(12);
        let [train, val, pool] = random_split(6, &[6, 0, 0], &mut rng).unwrap();
        assert_eq!(train.len(), 6);
        assert!(val.is_empty());
        assert!(pool.is_empty());

        let err = random_split(6, &[3, 2, 0], &mut rng).unwrap_err();
        assert_eq!(
            err,
            SplitError::SizeMismatch {
                requested: 5,
                available: 6,
            }
        );
    }

    #[test]
    fn same_seed_same_split() {
        let a = random_split(100, &[30, 10, 60], &mut StdRng::seed_from_u64(42)).unwrap();
        let b = random_split(100, &[30, 10, 60], &mut StdRng::seed_from_u64(42)).unwrap();
        let c = random_split(100, &[30, 10, 60], &mut StdRng::seed_from_u64(43)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn shuffled_indices_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut order = shuffled_indices(17, &mut rng);
        order.sort_unstable();
        assert_eq!(order, (0..17).collect::<Vec<_>>());
    }
}

//! Class-balanced initial labeled set.

use rand::Rng;
use rand::seq::index;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedSetError {
    #[error("class {class} has {available} samples in train_all, {required} are needed for the seed set")]
    InsufficientClassSamples {
        class: usize,
        available: usize,
        required: usize,
    },
}

/// Pick `per_class` positions of every class in `0..num_classes`.
///
/// Positions index into `labels`. Classes are visited in ascending order and
/// sampling within a class is without replacement, so the result holds
/// `num_classes * per_class` distinct positions grouped by class.
pub fn balanced_seed_indices<R: Rng + ?Sized>(
    labels: &[usize],
    num_classes: usize,
    per_class: usize,
    rng: &mut R,
) -> Result<Vec<usize>, SeedSetError> {
    let mut picked = Vec::with_capacity(num_classes * per_class);
    for class in 0..num_classes {
        let members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|&(_, &label)| label == class)
            .map(|(pos, _)| pos)
            .collect();
        if members.len() < per_class {
            return Err(SeedSetError::InsufficientClassSamples {
                class,
                available: members.len(),
                required: per_class,
            });
        }
        picked.extend(
            index::sample(rng, members.len(), per_class)
                .into_iter()
                .map(|i| members[i]),
        );
    }
    Ok(picked)
}

/// Count of each label in `0..num_classes`; labels outside the range are ignored.
pub fn class_distribution(labels: &[usize], num_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; num_classes];
    for &label in labels {
        if let Some(count) = counts.get_mut(label) {
            *count += 1;
        }
    }
    counts
}

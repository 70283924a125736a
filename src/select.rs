// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Target file selection.
//!
//! Each run touches a small random subset of the configured target files.
//! First the number of files is drawn from the configured count weights, then
//! that many targets are sampled by weight without replacement. A chosen
//! target leaves the pool together with its weight, so later rounds are drawn
//! from the remaining weights only.

use crate::{config::TargetFile, entropy::Entropy};

use tracing::debug;

/// Choose targets to update this run.
///
/// Never returns duplicates, and never returns more than
/// `min(count_weights.len(), targets.len())` targets. Returns nothing if no
/// targets are configured.
pub fn select_targets<'a, E>(
    targets: &'a [TargetFile],
    count_weights: &[f64],
    entropy: &mut E,
) -> Vec<&'a TargetFile>
where
    E: Entropy,
{
    if targets.is_empty() {
        return Vec::new();
    }

    let count = weighted_index(count_weights, entropy).map_or(1, |index| index + 1);
    debug!("select {count} of {} targets", targets.len());

    let mut pool = targets.iter().collect::<Vec<_>>();
    let mut chosen = Vec::with_capacity(count.min(pool.len()));
    while chosen.len() < count && !pool.is_empty() {
        let weights = pool.iter().map(|target| target.weight).collect::<Vec<_>>();

        // INVARIANT: Fall back to uniform draw when every remaining weight is zero.
        let index =
            weighted_index(&weights, entropy).unwrap_or_else(|| entropy.index(pool.len()));
        chosen.push(pool.remove(index));
    }

    chosen
}

/// Draw index proportional to its weight.
///
/// Returns `None` if weights are empty or carry no usable mass.
pub fn weighted_index<E>(weights: &[f64], entropy: &mut E) -> Option<usize>
where
    E: Entropy,
{
    let usable = |weight: &f64| weight.is_finite() && *weight > 0.0;
    let total: f64 = weights.iter().copied().filter(usable).sum();
    if total <= 0.0 {
        return None;
    }

    let mut remaining = entropy.unit() * total;
    let mut last = None;
    for (index, weight) in weights.iter().enumerate().filter(|(_, weight)| usable(*weight)) {
        if remaining < *weight {
            return Some(index);
        }

        remaining -= weight;
        last = Some(index);
    }

    // Float drift can leave a sliver of mass past the final bucket.
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::{RandEntropy, Scripted};
    use pretty_assertions::assert_eq;
    use std::{collections::HashSet, path::Path};

    fn targets() -> Vec<TargetFile> {
        vec![
            TargetFile::new("a.md", 1.0),
            TargetFile::new("b.txt", 1.0),
            TargetFile::new("c.json", 2.0),
        ]
    }

    fn paths<'a>(chosen: &[&'a TargetFile]) -> Vec<&'a Path> {
        chosen.iter().map(|target| target.path.as_path()).collect()
    }

    #[test]
    fn scripted_selection_removes_chosen_weight() {
        let targets = targets();

        // 0.7 of [0.6, 0.4] picks two files. 0.6 of [1, 1, 2] lands on c.json,
        // then 0.75 of the remaining [1, 1] lands on b.txt.
        let mut entropy = Scripted::new([], [0.7, 0.6, 0.75]);
        let chosen = select_targets(&targets, &[0.6, 0.4], &mut entropy);

        assert_eq!(paths(&chosen), vec![Path::new("c.json"), Path::new("b.txt")]);
    }

    #[test]
    fn single_file_when_coin_says_one() {
        let targets = targets();
        let mut entropy = Scripted::new([], [0.1, 0.0]);
        let chosen = select_targets(&targets, &[0.6, 0.4], &mut entropy);

        assert_eq!(paths(&chosen), vec![Path::new("a.md")]);
    }

    #[test]
    fn empty_targets_select_nothing() {
        let mut entropy = RandEntropy::seeded(1);
        let chosen = select_targets(&[], &[0.6, 0.4], &mut entropy);

        assert!(chosen.is_empty());
    }

    #[test]
    fn fewer_targets_than_count() {
        let targets = vec![TargetFile::new("only.md", 1.0)];
        let mut entropy = Scripted::new([], [0.99]);
        let chosen = select_targets(&targets, &[0.0, 0.0, 1.0], &mut entropy);

        assert_eq!(paths(&chosen), vec![Path::new("only.md")]);
    }

    #[test]
    fn zero_weights_fall_back_to_uniform() {
        let targets = vec![
            TargetFile::new("a.md", 0.0),
            TargetFile::new("b.md", 0.0),
        ];
        let mut entropy = Scripted::new([1], [0.0]);
        let chosen = select_targets(&targets, &[1.0], &mut entropy);

        assert_eq!(paths(&chosen), vec![Path::new("b.md")]);
    }

    #[test]
    fn never_duplicates_or_exceeds_bound() {
        let targets = targets();
        let mut entropy = RandEntropy::seeded(99);

        for _ in 0..500 {
            let chosen = select_targets(&targets, &[0.2, 0.3, 0.5], &mut entropy);
            let unique = chosen.iter().map(|target| &target.path).collect::<HashSet<_>>();

            assert!(!chosen.is_empty());
            assert!(chosen.len() <= 3);
            assert_eq!(unique.len(), chosen.len());
        }
    }

    #[test]
    fn weighted_index_skips_empty_buckets() {
        let mut entropy = Scripted::new([], [0.5]);
        assert_eq!(weighted_index(&[0.0, 2.0, 0.0, 2.0], &mut entropy), Some(3));
        assert_eq!(weighted_index(&[0.0, 0.0], &mut entropy), None);
        assert_eq!(weighted_index(&[], &mut entropy), None);
    }
}

//! Stratified sampling over composite bins for market questions
//! (`spec.md` §4.C step 3, §8 properties 2 & 3).
//!
//! Grounded in
//! `original_source/src/curate_questions/create_question_set/main.py::stratified_sample_questions`:
//! target per bin is `round(N * weight)` capped by availability; rounding
//! residuals are redistributed to the highest-weight bins (to fill a
//! shortfall) or the lowest-weight bins (to trim a surplus). Selection
//! within a bin uses a seed-derived RNG so the same inputs and seed produce
//! a byte-identical sample (`spec.md` §8 property 2).

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::bins::CompositeBin;

/// Compute the per-bin sample target before residual redistribution:
/// `round(N * weight)`, capped by that bin's availability.
fn raw_targets(
    weights: &BTreeMap<CompositeBin, f64>,
    availability: &BTreeMap<CompositeBin, usize>,
    n: usize,
) -> BTreeMap<CompositeBin, usize> {
    weights
        .iter()
        .map(|(&bin, &w)| {
            let want = (n as f64 * w).round() as usize;
            let avail = *availability.get(&bin).unwrap_or(&0);
            (bin, want.min(avail))
        })
        .collect()
}

/// Redistribute the shortfall or surplus left after rounding so the total
/// across bins equals `n` exactly (when enough availability exists overall).
fn redistribute(
    mut targets: BTreeMap<CompositeBin, usize>,
    weights: &BTreeMap<CompositeBin, f64>,
    availability: &BTreeMap<CompositeBin, usize>,
    n: usize,
) -> BTreeMap<CompositeBin, usize> {
    // Bins ordered by weight, highest first, for shortfall fill.
    let mut by_weight_desc: Vec<CompositeBin> = weights.keys().copied().collect();
    by_weight_desc.sort_by(|a, b| {
        weights[b]
            .partial_cmp(&weights[a])
            .unwrap()
            .then(a.cmp(b))
    });

    let total: usize = targets.values().sum();
    if total < n {
        let mut shortfall = n - total;
        for bin in &by_weight_desc {
            if shortfall == 0 {
                break;
            }
            let avail = *availability.get(bin).unwrap_or(&0);
            let current = targets[bin];
            let spare = avail.saturating_sub(current);
            let take = spare.min(shortfall);
            if take > 0 {
                *targets.get_mut(bin).unwrap() += take;
                shortfall -= take;
            }
        }
    } else if total > n {
        let mut surplus = total - n;
        for bin in by_weight_desc.iter().rev() {
            if surplus == 0 {
                break;
            }
            let current = targets[bin];
            let give = current.min(surplus);
            *targets.get_mut(bin).unwrap() -= give;
            surplus -= give;
        }
    }
    targets
}

/// Sample exactly `n` items (or as many as total availability allows)
/// across the given composite bins, honoring per-bin targets.
/// `candidates` maps each composite bin to the ids available in it.
/// Returns the sampled ids, grouped by bin in bin order for determinism.
pub fn stratified_sample(
    candidates: &BTreeMap<CompositeBin, Vec<String>>,
    weights: &BTreeMap<CompositeBin, f64>,
    n: usize,
    seed: u64,
) -> Vec<String> {
    let availability: BTreeMap<CompositeBin, usize> =
        candidates.iter().map(|(&bin, v)| (bin, v.len())).collect();
    let targets = raw_targets(weights, &availability, n);
    let targets = redistribute(targets, weights, &availability, n);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut result = Vec::new();
    for (bin, ids) in candidates {
        let target = *targets.get(bin).unwrap_or(&0);
        let mut pool = ids.clone();
        pool.sort();
        pool.shuffle(&mut rng);
        result.extend(pool.into_iter().take(target));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cands(bin: CompositeBin, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{bin:?}-{i}")).collect()
    }

    #[test]
    fn meets_target_when_availability_is_ample() {
        let mut candidates = BTreeMap::new();
        candidates.insert((0, 0), cands((0, 0), 1000));
        candidates.insert((1, 0), cands((1, 0), 1000));
        let mut weights = BTreeMap::new();
        weights.insert((0, 0), 0.5);
        weights.insert((1, 0), 0.5);
        let sampled = stratified_sample(&candidates, &weights, 100, 42);
        assert_eq!(sampled.len(), 100);
    }

    #[test]
    fn determinism_same_seed_same_sample() {
        let mut candidates = BTreeMap::new();
        candidates.insert((0, 0), cands((0, 0), 50));
        candidates.insert((1, 0), cands((1, 0), 50));
        let mut weights = BTreeMap::new();
        weights.insert((0, 0), 0.3);
        weights.insert((1, 0), 0.7);
        let a = stratified_sample(&candidates, &weights, 20, 7);
        let b = stratified_sample(&candidates, &weights, 20, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn bin_at_or_above_target_availability_gets_exact_target() {
        // spec.md §8 property 3: for every bin with availability >= target,
        // the sampled count equals the target.
        let mut candidates = BTreeMap::new();
        candidates.insert((0, 0), cands((0, 0), 10_000));
        let mut weights = BTreeMap::new();
        weights.insert((0, 0), 1.0);
        let sampled = stratified_sample(&candidates, &weights, 100, 1);
        assert_eq!(sampled.len(), 100);
    }
}

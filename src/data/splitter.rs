// ============================================================
// Layer 4 — Stratified Train/Test Splitter
// ============================================================
// Splits row indices into a train and a test set so that every
// class keeps (about) the same share in both.
//
// For each class c with n_c rows:
//   1. shuffle that class's indices with a seeded StdRng
//   2. the first round(n_c · test_fraction) go to test
//   3. the rest go to train
//
// Classes are visited in id order and one RNG is threaded
// through all of them, so a fixed seed and a fixed label list
// always give identical index sets. Both sets are returned
// sorted ascending.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.
//
// Reference: rand crate documentation (StdRng, SeedableRng)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::collections::BTreeMap;

/// Stratified split of `0..labels.len()` into (train, test).
///
/// # Arguments
/// * `labels`        - Class id of every row
/// * `test_fraction` - Share of each class sent to test, e.g. 0.2
/// * `seed`          - RNG seed; same seed ⇒ same split
pub fn stratified_split(labels: &[usize], test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let fraction = test_fraction.clamp(0.0, 1.0);

    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(i);
    }

    let mut rng   = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test  = Vec::new();

    for (_, mut indices) in by_class {
        indices.shuffle(&mut rng);
        let n_test = ((indices.len() as f64) * fraction).round() as usize;
        let rest   = indices.split_off(n_test.min(indices.len()));
        test.extend(indices);
        train.extend(rest);
    }

    train.sort_unstable();
    test.sort_unstable();

    tracing::debug!(
        "Stratified split: {} train, {} test (test_fraction={})",
        train.len(), test.len(), fraction
    );
    (train, test)
}

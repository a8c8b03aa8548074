// crates/xenospec-experiment/src/axis.rs
// ============================================================================
// Module: XenoSpec Experiment Axis Enumeration
// Description: Builds the ordered list of axis-value combinations an
// experiment sweeps over.
// Purpose: Implements spec.md §4.9's `iterate` (Cartesian product in
// declared axis order) and `sample` (draw without replacement when
// feasible, falling back to with-replacement beyond the product's size).
// Dependencies: indexmap, rand, rand_chacha, serde_json
// ============================================================================

//! ## Overview
//! A [`Combination`] is one row of the sweep: one value per declared axis,
//! in declared order. [`combinations`] enumerates every row for `iterate`;
//! [`sample`] draws a subset (or, when asked for more rows than exist,
//! repeats rows and says so through its `exact` return value).

use indexmap::IndexMap;
use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;

/// One row of an experiment's combination sweep: one value per axis, in the
/// axes map's declared order.
pub type Combination = IndexMap<String, Value>;

/// The full Cartesian product of `axes`, in declared axis order (the first
/// axis varies slowest, the last axis fastest), matching spec.md's worked
/// example ordering `(A,0),(A,1),(B,0),(B,1)` for axes `{agent, seed}`.
#[must_use]
pub fn combinations(axes: &IndexMap<String, Vec<Value>>) -> Vec<Combination> {
    let mut rows: Vec<Combination> = vec![IndexMap::new()];
    for (name, values) in axes {
        let mut next = Vec::with_capacity(rows.len() * values.len().max(1));
        for row in &rows {
            for value in values {
                let mut extended = row.clone();
                extended.insert(name.clone(), value.clone());
                next.push(extended);
            }
        }
        rows = next;
    }
    rows
}

/// The outcome of [`sample`]: the drawn rows, and whether every row is
/// distinct (`exact = false` means `samples` exceeded the Cartesian
/// product's size and some rows were drawn more than once).
pub struct SampleOutcome {
    /// The drawn combinations, in draw order.
    pub rows: Vec<Combination>,
    /// `false` when `samples` exceeded the product size and sampling fell
    /// back to drawing with replacement.
    pub exact: bool,
}

/// Draws `samples` rows from the full Cartesian product of `axes`, without
/// replacement when `samples` does not exceed the product's size, falling
/// back to sampling with replacement otherwise (spec.md §4.9, Open Question
/// decision: rather than silently truncating the requested count).
#[must_use]
pub fn sample(axes: &IndexMap<String, Vec<Value>>, samples: usize, rng: &mut ChaCha8Rng) -> SampleOutcome {
    let product = combinations(axes);
    if product.is_empty() {
        return SampleOutcome { rows: Vec::new(), exact: true };
    }

    if samples <= product.len() {
        let mut indices: Vec<usize> = (0..product.len()).collect();
        indices.shuffle(rng);
        let rows = indices[..samples].iter().map(|&i| product[i].clone()).collect();
        SampleOutcome { rows, exact: true }
    } else {
        let rows = (0..samples)
            .map(|_| product[rng.gen_range(0..product.len())].clone())
            .collect();
        SampleOutcome { rows, exact: false }
    }
}

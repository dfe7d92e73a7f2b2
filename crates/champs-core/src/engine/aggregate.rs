use crate::core::models::pair::{PairEndpoint, PairRow};
use std::collections::HashMap;
use std::hash::Hash;

/// A per-group reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Number of rows in the group, NaN values included.
    Count,
    Min,
    Max,
    Mean,
    /// Sample standard deviation (`n - 1`); NaN for groups with fewer than two values.
    Std,
}

/// How pair rows are grouped before reducing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Molecule,
    MoleculeAtom(PairEndpoint),
    MoleculeType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey<'a> {
    Molecule(&'a str),
    MoleculeAtom(&'a str, usize),
    MoleculeType(&'a str, &'a str),
}

impl GroupBy {
    pub fn key<'a>(&self, row: &'a PairRow) -> GroupKey<'a> {
        let molecule = row.pair.molecule_name.as_str();
        match *self {
            GroupBy::Molecule => GroupKey::Molecule(molecule),
            GroupBy::MoleculeAtom(endpoint) => {
                GroupKey::MoleculeAtom(molecule, row.pair.atom_index(endpoint))
            }
            GroupBy::MoleculeType => GroupKey::MoleculeType(molecule, &row.pair.coupling_type),
        }
    }

    pub fn keys<'a>(&self, rows: &'a [PairRow]) -> Vec<GroupKey<'a>> {
        rows.iter().map(|row| self.key(row)).collect()
    }
}

/// Running statistics of one group (Welford's update for the variance).
#[derive(Debug, Clone, Copy)]
struct GroupStats {
    rows: usize,
    valid: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for GroupStats {
    fn default() -> Self {
        Self {
            rows: 0,
            valid: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl GroupStats {
    fn push(&mut self, value: f64) {
        self.rows += 1;
        if value.is_nan() {
            return;
        }
        self.valid += 1;
        let delta = value - self.mean;
        self.mean += delta / self.valid as f64;
        self.m2 += delta * (value - self.mean);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn reduce(&self, reduction: Reduction) -> f64 {
        match reduction {
            Reduction::Count => self.rows as f64,
            _ if self.valid == 0 => f64::NAN,
            Reduction::Min => self.min,
            Reduction::Max => self.max,
            Reduction::Mean => self.mean,
            Reduction::Std if self.valid < 2 => f64::NAN,
            Reduction::Std => (self.m2 / (self.valid - 1) as f64).sqrt(),
        }
    }
}

/// Reduces `values` per group of `keys` and broadcasts each result back onto the rows.
///
/// Returns one column per requested reduction, each with exactly one entry per input
/// row, in input order.
///
/// # Panics
///
/// Panics if `keys` and `values` have different lengths.
pub fn broadcast<K: Eq + Hash>(keys: &[K], values: &[f64], reductions: &[Reduction]) -> Vec<Vec<f64>> {
    assert_eq!(
        keys.len(),
        values.len(),
        "group keys and values must be row-aligned"
    );

    let mut groups: HashMap<&K, GroupStats> = HashMap::new();
    for (key, &value) in keys.iter().zip(values) {
        groups.entry(key).or_default().push(value);
    }

    reductions
        .iter()
        .map(|&reduction| {
            keys.iter()
                .map(|key| groups[key].reduce(reduction))
                .collect()
        })
        .collect()
}

/// Counts the rows of each group and broadcasts the count back onto the rows.
pub fn broadcast_count<K: Eq + Hash>(keys: &[K]) -> Vec<f64> {
    let mut counts: HashMap<&K, usize> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    keys.iter().map(|key| counts[key] as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn broadcast_preserves_row_order_and_count() {
        let keys = ["b", "a", "b", "c", "a"];
        let values = [1.0, 10.0, 3.0, 7.0, 20.0];
        let columns = broadcast(&keys, &values, &[Reduction::Mean, Reduction::Count]);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0], vec![2.0, 15.0, 2.0, 7.0, 15.0]);
        assert_eq!(columns[1], vec![2.0, 2.0, 2.0, 1.0, 2.0]);
    }

    #[test]
    fn min_max_and_sample_std() {
        let keys = [0, 0, 0, 1];
        let values = [2.0, 4.0, 9.0, 5.0];
        let columns = broadcast(
            &keys,
            &values,
            &[Reduction::Min, Reduction::Max, Reduction::Std],
        );
        assert_eq!(columns[0], vec![2.0, 2.0, 2.0, 5.0]);
        assert_eq!(columns[1], vec![9.0, 9.0, 9.0, 5.0]);
        // Sample std of [2, 4, 9] is sqrt(13).
        assert!((columns[2][0] - 13f64.sqrt()).abs() < EPS);
        assert!(columns[2][3].is_nan(), "singleton group has no sample std");
    }

    #[test]
    fn nan_values_are_skipped_but_counted() {
        let keys = ["m", "m", "m", "n"];
        let values = [1.0, f64::NAN, 3.0, f64::NAN];
        let columns = broadcast(&keys, &values, &[Reduction::Mean, Reduction::Count]);
        assert_eq!(columns[0][0], 2.0);
        assert!(columns[0][3].is_nan(), "all-NaN group has no mean");
        assert_eq!(columns[1], vec![3.0, 3.0, 3.0, 1.0]);
    }

    #[test]
    fn all_nan_group_is_counted_but_has_no_statistics() {
        let keys = ["n", "n"];
        let values = [f64::NAN, f64::NAN];
        let columns = broadcast(
            &keys,
            &values,
            &[Reduction::Count, Reduction::Min, Reduction::Max, Reduction::Std],
        );
        assert_eq!(columns[0], vec![2.0, 2.0]);
        assert!(columns[1..].iter().flatten().all(|v| v.is_nan()));
    }

    #[test]
    fn count_helper_matches_count_reduction() {
        let keys = ["x", "y", "x"];
        let expected = broadcast(&keys, &[0.0; 3], &[Reduction::Count]).remove(0);
        assert_eq!(broadcast_count(&keys), expected);
    }

    #[test]
    fn empty_input_yields_empty_columns() {
        let keys: [&str; 0] = [];
        let columns = broadcast(&keys, &[], &[Reduction::Mean]);
        assert_eq!(columns, vec![Vec::<f64>::new()]);
    }
}

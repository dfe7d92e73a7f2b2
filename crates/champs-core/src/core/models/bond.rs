/// One bonded neighbor of an atom, addressed by its local index within the molecule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondNeighbor {
    pub atom_index: usize,
    /// Euclidean bond length in Angstroms.
    pub distance: f64,
}

/// The bonded-neighbor set of a single atom, sorted by neighbor index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomBonds {
    neighbors: Vec<BondNeighbor>,
}

impl AtomBonds {
    pub fn new(mut neighbors: Vec<BondNeighbor>) -> Self {
        neighbors.sort_by_key(|n| n.atom_index);
        Self { neighbors }
    }

    pub fn neighbors(&self) -> &[BondNeighbor] {
        &self.neighbors
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    pub fn is_bonded_to(&self, atom_index: usize) -> bool {
        self.neighbors.iter().any(|n| n.atom_index == atom_index)
    }

    pub fn distance_to(&self, atom_index: usize) -> Option<f64> {
        self.neighbors
            .iter()
            .find(|n| n.atom_index == atom_index)
            .map(|n| n.distance)
    }

    pub fn summary(&self) -> AtomBondSummary {
        let distances: Vec<f64> = self.neighbors.iter().map(|n| n.distance).collect();
        AtomBondSummary::from_distances(&distances)
    }
}

/// Per-atom bond statistics.
///
/// `bond_lengths_mean` and `bond_lengths_std` are `NaN` exactly when `n_bonds == 0`.
/// Consumers rely on the NaN to tell "no bonds" apart from a real statistic, so it must
/// never be coerced to zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtomBondSummary {
    pub n_bonds: usize,
    pub bond_lengths_mean: f64,
    /// Population standard deviation (divides by `n`).
    pub bond_lengths_std: f64,
}

impl AtomBondSummary {
    pub fn from_distances(distances: &[f64]) -> Self {
        if distances.is_empty() {
            return Self::unbonded();
        }
        let n = distances.len() as f64;
        let mean = distances.iter().sum::<f64>() / n;
        let variance = distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
        Self {
            n_bonds: distances.len(),
            bond_lengths_mean: mean,
            bond_lengths_std: variance.sqrt(),
        }
    }

    pub fn unbonded() -> Self {
        Self {
            n_bonds: 0,
            bond_lengths_mean: f64::NAN,
            bond_lengths_std: f64::NAN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_distances_yield_nan_statistics() {
        let summary = AtomBondSummary::from_distances(&[]);
        assert_eq!(summary.n_bonds, 0);
        assert!(summary.bond_lengths_mean.is_nan());
        assert!(summary.bond_lengths_std.is_nan());
    }

    #[test]
    fn single_distance_has_zero_std() {
        let summary = AtomBondSummary::from_distances(&[1.09]);
        assert_eq!(summary.n_bonds, 1);
        assert_eq!(summary.bond_lengths_mean, 1.09);
        assert_eq!(summary.bond_lengths_std, 0.0);
    }

    #[test]
    fn std_is_population_std() {
        let summary = AtomBondSummary::from_distances(&[1.0, 3.0]);
        assert!((summary.bond_lengths_mean - 2.0).abs() < 1e-12);
        assert!((summary.bond_lengths_std - 1.0).abs() < 1e-12);
    }

    #[test]
    fn atom_bonds_sorts_neighbors_and_summarizes() {
        let bonds = AtomBonds::new(vec![
            BondNeighbor {
                atom_index: 4,
                distance: 1.5,
            },
            BondNeighbor {
                atom_index: 1,
                distance: 1.1,
            },
        ]);
        let indices: Vec<usize> = bonds.neighbors().iter().map(|n| n.atom_index).collect();
        assert_eq!(indices, vec![1, 4]);
        assert!(bonds.is_bonded_to(4));
        assert!(!bonds.is_bonded_to(2));
        assert_eq!(bonds.distance_to(1), Some(1.1));
        assert_eq!(bonds.summary().n_bonds, 2);
    }
}

use super::bond::AtomBondSummary;
use crate::core::utils::geometry::PairDistance;
use nalgebra::Point3;
use std::fmt;

/// Which end of a coupling pair a feature refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairEndpoint {
    Atom0,
    Atom1,
}

impl PairEndpoint {
    pub const ALL: [PairEndpoint; 2] = [PairEndpoint::Atom0, PairEndpoint::Atom1];

    /// Column-name suffix used for this endpoint ("0" or "1").
    pub fn suffix(self) -> &'static str {
        match self {
            PairEndpoint::Atom0 => "0",
            PairEndpoint::Atom1 => "1",
        }
    }
}

impl fmt::Display for PairEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "atom_{}", self.suffix())
    }
}

/// One row of the train or test pair table.
#[derive(Debug, Clone, PartialEq)]
pub struct CouplingPair {
    pub id: u64,
    pub molecule_name: String,
    pub atom_index_0: usize,
    pub atom_index_1: usize,
    /// Coupling type label such as "1JHC".
    pub coupling_type: String,
    /// The regression target; absent in test data.
    pub scalar_coupling_constant: Option<f64>,
}

impl CouplingPair {
    pub fn atom_index(&self, endpoint: PairEndpoint) -> usize {
        match endpoint {
            PairEndpoint::Atom0 => self.atom_index_0,
            PairEndpoint::Atom1 => self.atom_index_1,
        }
    }

    pub fn key(&self) -> PairKey<'_> {
        PairKey {
            molecule_name: &self.molecule_name,
            atom_index_0: self.atom_index_0,
            atom_index_1: self.atom_index_1,
        }
    }
}

/// The composite key identifying a pair row across every table of the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey<'a> {
    pub molecule_name: &'a str,
    pub atom_index_0: usize,
    pub atom_index_1: usize,
}

/// The four-term decomposition of a scalar coupling constant.
#[derive(Debug, Clone, PartialEq)]
pub struct CouplingContribution {
    pub molecule_name: String,
    pub atom_index_0: usize,
    pub atom_index_1: usize,
    pub coupling_type: String,
    /// Fermi contact.
    pub fc: f64,
    /// Spin-dipolar.
    pub sd: f64,
    /// Paramagnetic spin-orbit.
    pub pso: f64,
    /// Diamagnetic spin-orbit.
    pub dso: f64,
}

impl CouplingContribution {
    pub fn key(&self) -> PairKey<'_> {
        PairKey {
            molecule_name: &self.molecule_name,
            atom_index_0: self.atom_index_0,
            atom_index_1: self.atom_index_1,
        }
    }
}

/// Returns the bond-separation prefix of a coupling type ("1JHC" -> "1").
pub fn coupling_type_prefix(coupling_type: &str) -> &str {
    coupling_type
        .char_indices()
        .nth(1)
        .map_or(coupling_type, |(end, _)| &coupling_type[..end])
}

/// Returns the element pair of a coupling type ("1JHC" -> "HC").
pub fn coupling_type_elements(coupling_type: &str) -> &str {
    let rest = coupling_type.trim_start_matches(|c: char| c.is_ascii_digit());
    rest.strip_prefix('J').unwrap_or(rest)
}

/// Atom information mapped onto one end of a pair.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointInfo {
    pub element: String,
    pub position: Point3<f64>,
    pub electronegativity: f64,
    pub radius: f64,
    pub bonds: AtomBondSummary,
}

/// A coupling pair after both endpoints have been joined against the annotated
/// structure table.
#[derive(Debug, Clone, PartialEq)]
pub struct PairRow {
    pub pair: CouplingPair,
    pub atom_0: EndpointInfo,
    pub atom_1: EndpointInfo,
    pub distance: PairDistance,
    pub type_0: String,
    pub type_1: String,
    pub contribution: Option<CouplingContribution>,
}

impl PairRow {
    pub fn endpoint(&self, endpoint: PairEndpoint) -> &EndpointInfo {
        match endpoint {
            PairEndpoint::Atom0 => &self.atom_0,
            PairEndpoint::Atom1 => &self.atom_1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_prefix_is_the_leading_character() {
        assert_eq!(coupling_type_prefix("1JHC"), "1");
        assert_eq!(coupling_type_prefix("3JHN"), "3");
        assert_eq!(coupling_type_prefix("J"), "J");
        assert_eq!(coupling_type_prefix(""), "");
    }

    #[test]
    fn type_elements_drop_the_bond_separation() {
        assert_eq!(coupling_type_elements("1JHC"), "HC");
        assert_eq!(coupling_type_elements("2JHH"), "HH");
        assert_eq!(coupling_type_elements("HN"), "HN");
    }

    #[test]
    fn endpoint_suffix_and_display() {
        assert_eq!(PairEndpoint::Atom0.suffix(), "0");
        assert_eq!(PairEndpoint::Atom1.to_string(), "atom_1");
    }

    #[test]
    fn pair_key_matches_contribution_key() {
        let pair = CouplingPair {
            id: 7,
            molecule_name: "m".into(),
            atom_index_0: 1,
            atom_index_1: 0,
            coupling_type: "1JHC".into(),
            scalar_coupling_constant: Some(84.8),
        };
        let contribution = CouplingContribution {
            molecule_name: "m".into(),
            atom_index_0: 1,
            atom_index_1: 0,
            coupling_type: "1JHC".into(),
            fc: 83.0,
            sd: 0.25,
            pso: 1.26,
            dso: 0.27,
        };
        assert_eq!(pair.key(), contribution.key());
        assert_eq!(pair.atom_index(PairEndpoint::Atom1), 0);
    }
}

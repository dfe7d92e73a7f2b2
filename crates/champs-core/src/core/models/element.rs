use phf::{Map, phf_map};
use std::collections::HashMap;
use thiserror::Error;

/// Added to every covalent radius before it is used as a bonding threshold.
pub const DEFAULT_FUDGE_FACTOR: f64 = 0.05;

/// Reference covalent radii (Angstroms) and Pauling electronegativities.
static REFERENCE_ELEMENTS: Map<&'static str, (f64, f64)> = phf_map! {
    "H" => (0.38, 2.20),
    "C" => (0.77, 2.55),
    "N" => (0.75, 3.04),
    "O" => (0.73, 3.44),
    "F" => (0.71, 3.98),
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown element symbol '{symbol}'")]
pub struct UnknownElementError {
    pub symbol: String,
}

/// Physical constants attached to an element for bond perception.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementProperties {
    /// Bonding radius in Angstroms, with the fudge factor already added.
    pub radius: f64,
    /// Pauling electronegativity.
    pub electronegativity: f64,
}

/// A closed lookup table from element symbol to [`ElementProperties`].
///
/// The table starts from the reference set (H, C, N, O, F) and can be extended with
/// additional elements. Lookups of symbols outside the table fail instead of falling
/// back to a default, since a guessed radius silently changes which atoms are bonded.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTable {
    fudge_factor: f64,
    entries: HashMap<String, ElementProperties>,
}

impl ElementTable {
    /// Builds the reference table with the default fudge factor.
    pub fn reference() -> Self {
        Self::with_fudge_factor(DEFAULT_FUDGE_FACTOR)
    }

    /// Builds the reference table, adding `fudge_factor` to every covalent radius.
    pub fn with_fudge_factor(fudge_factor: f64) -> Self {
        let entries = REFERENCE_ELEMENTS
            .entries()
            .map(|(symbol, &(radius, electronegativity))| {
                (
                    symbol.to_string(),
                    ElementProperties {
                        radius: radius + fudge_factor,
                        electronegativity,
                    },
                )
            })
            .collect();
        Self {
            fudge_factor,
            entries,
        }
    }

    pub fn fudge_factor(&self) -> f64 {
        self.fudge_factor
    }

    /// Adds or replaces an element. `covalent_radius` is given without the fudge factor.
    pub fn insert(&mut self, symbol: &str, covalent_radius: f64, electronegativity: f64) {
        self.entries.insert(
            symbol.to_string(),
            ElementProperties {
                radius: covalent_radius + self.fudge_factor,
                electronegativity,
            },
        );
    }

    pub fn lookup(&self, symbol: &str) -> Result<ElementProperties, UnknownElementError> {
        self.entries
            .get(symbol)
            .copied()
            .ok_or_else(|| UnknownElementError {
                symbol: symbol.to_string(),
            })
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains_key(symbol)
    }

    /// Returns the known symbols in sorted order.
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }
}

impl Default for ElementTable {
    fn default() -> Self {
        Self::reference()
    }
}

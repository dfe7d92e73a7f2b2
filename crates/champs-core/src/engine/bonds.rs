//! Windowed bond inference over a flat, molecule-contiguous atom table.
//!
//! Every atom row `i` is compared against rows `i + k` for `k` in `1..max_atoms`. A
//! comparison is only valid when both rows exist and belong to the same molecule run,
//! so neither the end of the table nor a molecule boundary can produce a bond. Each hit
//! is recorded on both atoms with the same distance.
//!
//! Molecules with more than `max_atoms` atoms are handled without overflow, but atom
//! pairs whose local indices differ by `max_atoms` or more are never compared.
//!
//! An atom at local index `max_atoms` or higher keeps its bonds too: the 27-28 bond of
//! a 29-atom molecule is recorded on both atoms, unlike a fixed 28-column neighbor
//! matrix, which drops it from atom 27's neighbors.

use super::config::BondConfig;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use crate::core::models::bond::{AtomBondSummary, AtomBonds, BondNeighbor};
use crate::core::models::structure::{AnnotatedAtom, AnnotatedStructure, StructureTable};
use nalgebra::Point3;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Bonded-neighbor sets for every row of a structure table, in row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BondTable {
    rows: Vec<AtomBonds>,
}

impl BondTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&AtomBonds> {
        self.rows.get(row)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AtomBonds> {
        self.rows.iter()
    }

    pub fn summaries(&self) -> Vec<AtomBondSummary> {
        self.rows.iter().map(AtomBonds::summary).collect()
    }

    pub fn total_bonds(&self) -> usize {
        self.rows.iter().map(AtomBonds::len).sum::<usize>() / 2
    }
}

/// A bond found at one offset: row `row` is bonded to row `row + offset`.
#[derive(Debug, Clone, Copy)]
struct OffsetHit {
    row: usize,
    distance: f64,
}

/// Per-row inputs of the windowed scan, resolved once up front.
struct ScanInput {
    positions: Vec<Point3<f64>>,
    radii: Vec<f64>,
    molecules: Vec<usize>,
    min_distance: f64,
}

impl ScanInput {
    fn scan_offset(&self, offset: usize) -> Vec<OffsetHit> {
        let n = self.positions.len();
        (0..n.saturating_sub(offset))
            .filter_map(|i| {
                let j = i + offset;
                if self.molecules[i] != self.molecules[j] {
                    return None;
                }
                let distance = nalgebra::distance(&self.positions[i], &self.positions[j]);
                let cutoff = self.radii[i] + self.radii[j];
                (distance > self.min_distance && distance < cutoff)
                    .then_some(OffsetHit { row: i, distance })
            })
            .collect()
    }
}

pub struct BondInferenceEngine<'a> {
    config: &'a BondConfig,
}

impl<'a> BondInferenceEngine<'a> {
    pub fn new(config: &'a BondConfig) -> Self {
        Self { config }
    }

    /// Infers the bonded neighbors of every atom.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MalformedInput`] if a molecule's atom indices are not
    /// `0, 1, 2, ...` in row order, and [`EngineError::UnknownElement`] if an element is
    /// missing from the configured element table.
    #[instrument(skip_all, name = "bond_inference", fields(atoms = structures.len()))]
    pub fn infer(
        &self,
        structures: &StructureTable,
        reporter: &ProgressReporter,
    ) -> Result<BondTable, EngineError> {
        validate_atom_indices(structures)?;

        let atoms = structures.atoms();
        let radii = atoms
            .iter()
            .map(|atom| {
                self.config
                    .elements
                    .lookup(&atom.element)
                    .map(|props| props.radius)
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let input = ScanInput {
            positions: atoms.iter().map(|atom| atom.position).collect(),
            radii,
            molecules: structures.molecule_ordinals(),
            min_distance: self.config.min_distance,
        };

        let offsets: Vec<usize> = (1..self.config.max_atoms).collect();
        reporter.report(Progress::TaskStart {
            total_steps: offsets.len() as u64,
        });

        #[cfg(not(feature = "parallel"))]
        let iterator = offsets.iter();

        #[cfg(feature = "parallel")]
        let iterator = offsets.par_iter();

        let hits_per_offset: Vec<Vec<OffsetHit>> = iterator
            .map(|&offset| {
                let hits = input.scan_offset(offset);
                reporter.report(Progress::TaskIncrement);
                hits
            })
            .collect();

        reporter.report(Progress::TaskFinish);

        let mut neighbors: Vec<Vec<BondNeighbor>> = vec![Vec::new(); atoms.len()];
        for (&offset, hits) in offsets.iter().zip(&hits_per_offset) {
            debug!(offset, bonds = hits.len(), "Merging offset.");
            for hit in hits {
                let target = hit.row + offset;
                neighbors[hit.row].push(BondNeighbor {
                    atom_index: atoms[target].atom_index,
                    distance: hit.distance,
                });
                neighbors[target].push(BondNeighbor {
                    atom_index: atoms[hit.row].atom_index,
                    distance: hit.distance,
                });
            }
        }

        let table = BondTable {
            rows: neighbors.into_iter().map(AtomBonds::new).collect(),
        };
        info!(bonds = table.total_bonds(), "Bond inference complete.");
        Ok(table)
    }

    /// Infers bonds and joins the per-atom statistics and element constants back onto
    /// the structure table.
    pub fn annotate(
        &self,
        structures: &StructureTable,
        reporter: &ProgressReporter,
    ) -> Result<AnnotatedStructure, EngineError> {
        let bonds = self.infer(structures, reporter)?;
        let annotated = structures
            .atoms()
            .iter()
            .zip(bonds.iter())
            .map(|(atom, atom_bonds)| {
                let props = self.config.elements.lookup(&atom.element)?;
                Ok(AnnotatedAtom {
                    atom: atom.clone(),
                    electronegativity: props.electronegativity,
                    radius: props.radius,
                    bonds: atom_bonds.summary(),
                })
            })
            .collect::<Result<Vec<_>, EngineError>>()?;
        Ok(AnnotatedStructure::new(annotated))
    }
}

/// Checks that every molecule run numbers its atoms `0, 1, 2, ...` in row order.
fn validate_atom_indices(structures: &StructureTable) -> Result<(), EngineError> {
    let atoms = structures.atoms();
    for span in structures.molecule_spans() {
        for (expected, row) in span.rows.clone().enumerate() {
            let found = atoms[row].atom_index;
            if found != expected {
                return Err(EngineError::MalformedInput(format!(
                    "molecule '{}' has atom index {} on row {} where {} was expected; \
                     atom indices must be contiguous from 0 and molecules must not be split",
                    span.molecule_name, found, row, expected
                )));
            }
        }
    }
    Ok(())
}

use crate::core::io::structures::AnnotatedStructureFile;
use crate::core::models::pair::{
    CouplingContribution, CouplingPair, EndpointInfo, PairEndpoint, PairKey, PairRow,
    coupling_type_elements, coupling_type_prefix,
};
use crate::core::models::structure::{AnnotatedAtom, AnnotatedStructure, StructureTable};
use crate::core::utils::geometry::PairDistance;
use crate::engine::bonds::BondInferenceEngine;
use crate::engine::cache::TableCache;
use crate::engine::config::BondConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Cache stage name of the annotated structure table.
pub const BONDS_CACHE_KEY: &str = "structures_bonds";

/// The cache key of a bond annotation computed under `config`.
///
/// Each bond configuration gets its own entry, so changing radii or cutoffs never
/// reuses bonds inferred under other settings.
pub fn bonds_cache_key(config: &BondConfig) -> String {
    format!("{}-{:016x}", BONDS_CACHE_KEY, config.fingerprint())
}

/// Infers bonds and attaches element constants and bond statistics to every atom.
#[instrument(skip_all, name = "preprocess_workflow")]
pub fn annotate_structures(
    structures: &StructureTable,
    config: &BondConfig,
    reporter: &ProgressReporter,
) -> Result<AnnotatedStructure, EngineError> {
    info!(atoms = structures.len(), "Annotating structure table.");
    let annotated = BondInferenceEngine::new(config).annotate(structures, reporter)?;
    let bonded = annotated
        .atoms()
        .iter()
        .filter(|a| a.bonds.n_bonds > 0)
        .count();
    info!(
        atoms = annotated.len(),
        bonded, "Structure annotation complete."
    );
    Ok(annotated)
}

/// Like [`annotate_structures`], but reuses the table stored under
/// [`bonds_cache_key`] when it describes the same atoms, and stores a freshly
/// computed table otherwise.
pub fn annotate_structures_cached<C: TableCache>(
    structures: &StructureTable,
    config: &BondConfig,
    cache: &C,
    reporter: &ProgressReporter,
) -> Result<AnnotatedStructure, EngineError> {
    let key = bonds_cache_key(config);
    if let Some(atoms) = cache.load::<AnnotatedStructureFile>(&key)? {
        if describes_same_atoms(&atoms, structures) {
            info!(key = %key, "Reusing cached bond annotation.");
            return Ok(AnnotatedStructure::new(atoms));
        }
        warn!("Cached bond annotation does not match the structure table; recomputing.");
    }

    let annotated = annotate_structures(structures, config, reporter)?;
    cache.store::<AnnotatedStructureFile>(&key, annotated.atoms())?;
    Ok(annotated)
}

fn describes_same_atoms(cached: &[AnnotatedAtom], structures: &StructureTable) -> bool {
    cached.len() == structures.len()
        && cached
            .iter()
            .zip(structures.atoms())
            .all(|(cached, atom)| cached.atom == *atom)
}

fn endpoint_info(atom: &AnnotatedAtom) -> EndpointInfo {
    EndpointInfo {
        element: atom.atom.element.clone(),
        position: atom.atom.position,
        electronegativity: atom.electronegativity,
        radius: atom.radius,
        bonds: atom.bonds,
    }
}

/// Joins each pair against the annotated structure table (and, if given, the
/// contribution table), preserving pair order.
///
/// # Errors
///
/// Returns [`EngineError::MalformedInput`] if a pair references an atom that is not
/// in the structure table.
#[instrument(skip_all, name = "map_pairs")]
pub fn map_pairs(
    pairs: Vec<CouplingPair>,
    structure: &AnnotatedStructure,
    contributions: Option<&[CouplingContribution]>,
) -> Result<Vec<PairRow>, EngineError> {
    let locator = structure.locator();
    let contributions: HashMap<PairKey<'_>, &CouplingContribution> = contributions
        .unwrap_or_default()
        .iter()
        .map(|c| (c.key(), c))
        .collect();

    let rows = pairs
        .into_iter()
        .map(|pair| {
            let find = |endpoint: PairEndpoint| {
                let index = pair.atom_index(endpoint);
                locator.find(&pair.molecule_name, index).ok_or_else(|| {
                    EngineError::MalformedInput(format!(
                        "pair {} references atom {} of molecule '{}', which is not in the structure table",
                        pair.id, index, pair.molecule_name
                    ))
                })
            };
            let atom_0 = endpoint_info(find(PairEndpoint::Atom0)?);
            let atom_1 = endpoint_info(find(PairEndpoint::Atom1)?);
            let contribution = contributions.get(&pair.key()).map(|&c| c.clone());

            Ok(PairRow {
                distance: PairDistance::between(&atom_0.position, &atom_1.position),
                type_0: coupling_type_prefix(&pair.coupling_type).to_string(),
                type_1: coupling_type_elements(&pair.coupling_type).to_string(),
                atom_0,
                atom_1,
                contribution,
                pair,
            })
        })
        .collect::<Result<Vec<_>, EngineError>>()?;

    if !contributions.is_empty() {
        let matched = rows.iter().filter(|r| r.contribution.is_some()).count();
        info!(
            matched,
            pairs = rows.len(),
            "Merged scalar coupling contributions."
        );
    }
    Ok(rows)
}

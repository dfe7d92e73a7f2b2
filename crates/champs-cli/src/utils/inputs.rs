use crate::config::DataOptions;
use crate::error::{CliError, Result};
use champs::core::io::pairs::{ContributionFile, PairFile};
use champs::core::io::structures::StructureFile;
use champs::core::io::traits::TableFile;
use champs::core::models::pair::{CouplingContribution, PairRow};
use champs::core::models::structure::{AnnotatedStructure, StructureTable};
use champs::engine::cache::CsvTableCache;
use champs::engine::config::{BondConfig, TargetColumn};
use champs::engine::progress::ProgressReporter;
use champs::workflows::preprocess;
use std::path::Path;
use tracing::info;

pub fn read_structures(path: &Path) -> Result<StructureTable> {
    info!("Loading structures from {:?}", path);
    let atoms = StructureFile::read_from_path(path, None)?;
    info!(atoms = atoms.len(), "Structure table loaded.");
    Ok(StructureTable::new(atoms))
}

/// Runs bond inference on the structure table at `path`, going through the table
/// cache when `cache_dir` is set.
pub fn annotate(
    path: &Path,
    config: &BondConfig,
    cache_dir: Option<&Path>,
    reporter: &ProgressReporter,
) -> Result<AnnotatedStructure> {
    let structures = read_structures(path)?;
    let annotated = match cache_dir {
        Some(dir) => {
            info!("Using table cache at {:?}", dir);
            preprocess::annotate_structures_cached(
                &structures,
                config,
                &CsvTableCache::new(dir),
                reporter,
            )?
        }
        None => preprocess::annotate_structures(&structures, config, reporter)?,
    };
    Ok(annotated)
}

/// Reads the contribution table if one was given, failing when `target` cannot be
/// computed without it.
pub fn read_contributions(
    path: Option<&Path>,
    target: TargetColumn,
) -> Result<Option<Vec<CouplingContribution>>> {
    match path {
        Some(path) => {
            info!("Loading scalar coupling contributions from {:?}", path);
            Ok(Some(ContributionFile::read_from_path(path, None)?))
        }
        None if target.needs_contributions() => Err(CliError::Argument(format!(
            "target '{}' requires --contributions",
            target
        ))),
        None => Ok(None),
    }
}

/// Reads a pair table (honoring `nrows`) and joins it against the annotated structures.
pub fn read_pair_rows(
    path: &Path,
    data: &DataOptions,
    structure: &AnnotatedStructure,
    contributions: Option<&[CouplingContribution]>,
) -> Result<Vec<PairRow>> {
    info!("Loading pairs from {:?}", path);
    let pairs = PairFile::read_from_path(path, data.nrows)?;
    info!(rows = pairs.len(), "Pair table loaded.");
    Ok(preprocess::map_pairs(pairs, structure, contributions)?)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;
    use std::path::{Path, PathBuf};

    /// Writes a small structures/train/test/contributions set into `dir`.
    ///
    /// Every molecule is a C-H fragment whose bond length drives the coupling constant,
    /// so a ridge model on `Distance` fits it closely.
    pub fn write_dataset(dir: &Path, n_molecules: usize) -> Dataset {
        let mut structures = String::from("molecule_name,atom_index,atom,x,y,z\n");
        let mut train = String::from("id,molecule_name,atom_index_0,atom_index_1,type,scalar_coupling_constant\n");
        let mut test = String::from("id,molecule_name,atom_index_0,atom_index_1,type\n");
        let mut contributions = String::from("molecule_name,atom_index_0,atom_index_1,type,fc,sd,pso,dso\n");

        for i in 0..n_molecules {
            let name = format!("dsgdb9nsd_{:06}", i + 1);
            let dist = 1.0 + 0.01 * i as f64;
            structures.push_str(&format!("{name},0,C,0.0,0.0,0.0\n"));
            structures.push_str(&format!("{name},1,H,{dist},0.0,0.0\n"));
            if i % 4 == 3 {
                test.push_str(&format!("{},{name},1,0,1JHC\n", 1000 + i));
            } else {
                let scc = 80.0 + 50.0 * dist + (i % 2) as f64;
                train.push_str(&format!("{i},{name},1,0,1JHC,{scc}\n"));
                contributions.push_str(&format!("{name},1,0,1JHC,{},0.1,0.2,0.3\n", scc - 0.6));
            }
        }

        let dataset = Dataset {
            structures: dir.join("structures.csv"),
            train: dir.join("train.csv"),
            test: dir.join("test.csv"),
            contributions: dir.join("scalar_coupling_contributions.csv"),
        };
        fs::write(&dataset.structures, structures).unwrap();
        fs::write(&dataset.train, train).unwrap();
        fs::write(&dataset.test, test).unwrap();
        fs::write(&dataset.contributions, contributions).unwrap();
        dataset
    }

    pub struct Dataset {
        pub structures: PathBuf,
        pub train: PathBuf,
        pub test: PathBuf,
        pub contributions: PathBuf,
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::write_dataset;
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn annotation_populates_and_reuses_the_cache() {
        let dir = tempdir().unwrap();
        let data = write_dataset(dir.path(), 8);
        let cache_dir = dir.path().join("cache");
        let reporter = ProgressReporter::new();

        let first = annotate(&data.structures, &BondConfig::default(), Some(&cache_dir), &reporter)
            .unwrap();
        let key = preprocess::bonds_cache_key(&BondConfig::default());
        assert!(cache_dir.join(format!("{}.csv", key)).is_file());
        let second = annotate(&data.structures, &BondConfig::default(), Some(&cache_dir), &reporter)
            .unwrap();
        assert_eq!(first.len(), second.len());
        assert!(second.atoms().iter().all(|a| a.bonds.n_bonds == 1));
    }

    #[test]
    fn nrows_limits_the_pair_table() {
        let dir = tempdir().unwrap();
        let data = write_dataset(dir.path(), 8);
        let structure =
            annotate(&data.structures, &BondConfig::default(), None, &ProgressReporter::new())
                .unwrap();
        let options = DataOptions {
            nrows: Some(3),
            cache_dir: None,
        };
        let rows = read_pair_rows(&data.train, &options, &structure, None).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].type_0, "1");
        assert_eq!(rows[0].type_1, "HC");
    }

    #[test]
    fn contribution_targets_require_the_table() {
        assert!(matches!(
            read_contributions(None, TargetColumn::Fc),
            Err(CliError::Argument(_))
        ));
        assert!(read_contributions(None, TargetColumn::ScalarCouplingConstant)
            .unwrap()
            .is_none());
    }

    #[test]
    fn missing_structure_file_is_a_table_error() {
        let dir = tempdir().unwrap();
        let result = read_structures(&dir.path().join("missing.csv"));
        assert!(matches!(result, Err(CliError::Table(_))));
    }
}

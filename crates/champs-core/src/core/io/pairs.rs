use super::error::TableError;
use super::traits::{TableFile, read_rows, require_non_empty, write_rows};
use crate::core::models::pair::{CouplingContribution, CouplingPair};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

const PAIR_HEADER: [&str; 6] = [
    "id",
    "molecule_name",
    "atom_index_0",
    "atom_index_1",
    "type",
    "scalar_coupling_constant",
];

const CONTRIBUTION_HEADER: [&str; 8] = [
    "molecule_name",
    "atom_index_0",
    "atom_index_1",
    "type",
    "fc",
    "sd",
    "pso",
    "dso",
];

#[derive(Debug, Deserialize, Serialize)]
struct PairRecord {
    id: u64,
    molecule_name: String,
    atom_index_0: usize,
    atom_index_1: usize,
    #[serde(rename = "type")]
    coupling_type: String,
    #[serde(default)]
    scalar_coupling_constant: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize)]
struct ContributionRecord {
    molecule_name: String,
    atom_index_0: usize,
    atom_index_1: usize,
    #[serde(rename = "type")]
    coupling_type: String,
    fc: f64,
    sd: f64,
    pso: f64,
    dso: f64,
}

/// `train.csv` / `test.csv`: one row per atom pair. The target column is optional.
pub struct PairFile;

impl TableFile for PairFile {
    type Record = CouplingPair;

    fn read_from(reader: impl Read, limit: Option<usize>) -> Result<Vec<CouplingPair>, TableError> {
        read_rows(reader, limit, |row, record: PairRecord| {
            require_non_empty(row, "molecule_name", &record.molecule_name)?;
            require_non_empty(row, "type", &record.coupling_type)?;
            if record.atom_index_0 == record.atom_index_1 {
                return Err(TableError::InvalidRecord {
                    row,
                    message: format!(
                        "pair couples atom {} with itself",
                        record.atom_index_0
                    ),
                });
            }
            Ok(CouplingPair {
                id: record.id,
                molecule_name: record.molecule_name,
                atom_index_0: record.atom_index_0,
                atom_index_1: record.atom_index_1,
                coupling_type: record.coupling_type,
                scalar_coupling_constant: record.scalar_coupling_constant,
            })
        })
    }

    fn write_to(records: &[CouplingPair], writer: impl Write) -> Result<(), TableError> {
        let rows = records.iter().map(|pair| PairRecord {
            id: pair.id,
            molecule_name: pair.molecule_name.clone(),
            atom_index_0: pair.atom_index_0,
            atom_index_1: pair.atom_index_1,
            coupling_type: pair.coupling_type.clone(),
            scalar_coupling_constant: pair.scalar_coupling_constant,
        });
        write_rows(&PAIR_HEADER, rows, writer)
    }
}

/// `scalar_coupling_contributions.csv`.
pub struct ContributionFile;

impl TableFile for ContributionFile {
    type Record = CouplingContribution;

    fn read_from(
        reader: impl Read,
        limit: Option<usize>,
    ) -> Result<Vec<CouplingContribution>, TableError> {
        read_rows(reader, limit, |row, record: ContributionRecord| {
            require_non_empty(row, "molecule_name", &record.molecule_name)?;
            Ok(CouplingContribution {
                molecule_name: record.molecule_name,
                atom_index_0: record.atom_index_0,
                atom_index_1: record.atom_index_1,
                coupling_type: record.coupling_type,
                fc: record.fc,
                sd: record.sd,
                pso: record.pso,
                dso: record.dso,
            })
        })
    }

    fn write_to(records: &[CouplingContribution], writer: impl Write) -> Result<(), TableError> {
        let rows = records.iter().map(|c| ContributionRecord {
            molecule_name: c.molecule_name.clone(),
            atom_index_0: c.atom_index_0,
            atom_index_1: c.atom_index_1,
            coupling_type: c.coupling_type.clone(),
            fc: c.fc,
            sd: c.sd,
            pso: c.pso,
            dso: c.dso,
        });
        write_rows(&CONTRIBUTION_HEADER, rows, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_training_pairs_with_target() {
        let csv = "\
id,molecule_name,atom_index_0,atom_index_1,type,scalar_coupling_constant
0,dsgdb9nsd_000001,1,0,1JHC,84.8076
1,dsgdb9nsd_000001,1,2,2JHH,-11.257
";
        let pairs = PairFile::read_from(csv.as_bytes(), None).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].coupling_type, "1JHC");
        assert_eq!(pairs[0].scalar_coupling_constant, Some(84.8076));
        assert_eq!(pairs[1].atom_index_1, 2);
    }

    #[test]
    fn reads_test_pairs_without_target_column() {
        let csv = "\
id,molecule_name,atom_index_0,atom_index_1,type
4658147,dsgdb9nsd_000004,2,0,2JHC
";
        let pairs = PairFile::read_from(csv.as_bytes(), None).unwrap();
        assert_eq!(pairs[0].id, 4658147);
        assert_eq!(pairs[0].scalar_coupling_constant, None);
    }

    #[test]
    fn self_coupling_is_rejected() {
        let csv = "id,molecule_name,atom_index_0,atom_index_1,type\n0,m,1,1,1JHC\n";
        let result = PairFile::read_from(csv.as_bytes(), None);
        assert!(matches!(result, Err(TableError::InvalidRecord { row: 1, .. })));
    }

    #[test]
    fn pairs_write_and_read_back() {
        let pairs = vec![CouplingPair {
            id: 3,
            molecule_name: "m".into(),
            atom_index_0: 2,
            atom_index_1: 0,
            coupling_type: "3JHH".into(),
            scalar_coupling_constant: None,
        }];
        let mut buffer = Vec::new();
        PairFile::write_to(&pairs, &mut buffer).unwrap();
        assert_eq!(PairFile::read_from(buffer.as_slice(), None).unwrap(), pairs);
    }

    #[test]
    fn reads_contributions() {
        let csv = "\
molecule_name,atom_index_0,atom_index_1,type,fc,sd,pso,dso
dsgdb9nsd_000001,1,0,1JHC,83.0224,0.254579,1.25862,0.27201
";
        let contributions = ContributionFile::read_from(csv.as_bytes(), None).unwrap();
        assert_eq!(contributions.len(), 1);
        assert_eq!(contributions[0].fc, 83.0224);
        assert_eq!(contributions[0].dso, 0.27201);
    }
}

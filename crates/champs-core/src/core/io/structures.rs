use super::error::TableError;
use super::traits::{TableFile, read_rows, require_non_empty, write_rows};
use crate::core::models::atom::Atom;
use crate::core::models::bond::AtomBondSummary;
use crate::core::models::structure::AnnotatedAtom;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

const STRUCTURE_HEADER: [&str; 6] = ["molecule_name", "atom_index", "atom", "x", "y", "z"];

const ANNOTATED_HEADER: [&str; 11] = [
    "molecule_name",
    "atom_index",
    "atom",
    "x",
    "y",
    "z",
    "electronegativity",
    "radius",
    "n_bonds",
    "bond_lengths_mean",
    "bond_lengths_std",
];

#[derive(Debug, Deserialize, Serialize)]
struct StructureRow {
    molecule_name: String,
    atom_index: usize,
    atom: String,
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Deserialize, Serialize)]
struct AnnotatedRow {
    molecule_name: String,
    atom_index: usize,
    atom: String,
    x: f64,
    y: f64,
    z: f64,
    electronegativity: f64,
    radius: f64,
    n_bonds: usize,
    bond_lengths_mean: Option<f64>,
    bond_lengths_std: Option<f64>,
}

fn nan_to_none(value: f64) -> Option<f64> {
    if value.is_nan() { None } else { Some(value) }
}

fn checked_atom(row: usize, record: StructureRow) -> Result<Atom, TableError> {
    require_non_empty(row, "molecule_name", &record.molecule_name)?;
    require_non_empty(row, "atom", &record.atom)?;
    Ok(Atom {
        molecule_name: record.molecule_name,
        atom_index: record.atom_index,
        element: record.atom.trim().to_string(),
        position: Point3::new(record.x, record.y, record.z),
    })
}

/// The raw `structures.csv` table: one row per atom.
pub struct StructureFile;

impl TableFile for StructureFile {
    type Record = Atom;

    fn read_from(reader: impl Read, limit: Option<usize>) -> Result<Vec<Atom>, TableError> {
        read_rows(reader, limit, checked_atom)
    }

    fn write_to(records: &[Atom], writer: impl Write) -> Result<(), TableError> {
        let rows = records.iter().map(|atom| StructureRow {
            molecule_name: atom.molecule_name.clone(),
            atom_index: atom.atom_index,
            atom: atom.element.clone(),
            x: atom.position.x,
            y: atom.position.y,
            z: atom.position.z,
        });
        write_rows(&STRUCTURE_HEADER, rows, writer)
    }
}

/// The structure table augmented with element constants and bond statistics.
///
/// Missing bond statistics (atoms without bonds) are written as empty cells and read
/// back as `NaN`.
pub struct AnnotatedStructureFile;

impl TableFile for AnnotatedStructureFile {
    type Record = AnnotatedAtom;

    fn read_from(reader: impl Read, limit: Option<usize>) -> Result<Vec<AnnotatedAtom>, TableError> {
        read_rows(reader, limit, |row, record: AnnotatedRow| {
            let atom = checked_atom(
                row,
                StructureRow {
                    molecule_name: record.molecule_name,
                    atom_index: record.atom_index,
                    atom: record.atom,
                    x: record.x,
                    y: record.y,
                    z: record.z,
                },
            )?;
            let bonds = AtomBondSummary {
                n_bonds: record.n_bonds,
                bond_lengths_mean: record.bond_lengths_mean.unwrap_or(f64::NAN),
                bond_lengths_std: record.bond_lengths_std.unwrap_or(f64::NAN),
            };
            if (bonds.n_bonds == 0) != bonds.bond_lengths_mean.is_nan() {
                return Err(TableError::InvalidRecord {
                    row,
                    message: format!(
                        "n_bonds = {} is inconsistent with bond_lengths_mean",
                        bonds.n_bonds
                    ),
                });
            }
            Ok(AnnotatedAtom {
                atom,
                electronegativity: record.electronegativity,
                radius: record.radius,
                bonds,
            })
        })
    }

    fn write_to(records: &[AnnotatedAtom], writer: impl Write) -> Result<(), TableError> {
        let rows = records.iter().map(|annotated| AnnotatedRow {
            molecule_name: annotated.atom.molecule_name.clone(),
            atom_index: annotated.atom.atom_index,
            atom: annotated.atom.element.clone(),
            x: annotated.atom.position.x,
            y: annotated.atom.position.y,
            z: annotated.atom.position.z,
            electronegativity: annotated.electronegativity,
            radius: annotated.radius,
            n_bonds: annotated.bonds.n_bonds,
            bond_lengths_mean: nan_to_none(annotated.bonds.bond_lengths_mean),
            bond_lengths_std: nan_to_none(annotated.bonds.bond_lengths_std),
        });
        write_rows(&ANNOTATED_HEADER, rows, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRUCTURES_CSV: &str = "\
molecule_name,atom_index,atom,x,y,z
dsgdb9nsd_000001,0,C,-0.0126981359,1.0858041578,0.0080009958
dsgdb9nsd_000001,1,H,0.002150416,-0.0060313176,0.0019761204
dsgdb9nsd_000002,0,N,-0.0404260543,1.0241077531,0.0625637998
";

    #[test]
    fn reads_structure_rows_in_order() {
        let atoms = StructureFile::read_from(STRUCTURES_CSV.as_bytes(), None).unwrap();
        assert_eq!(atoms.len(), 3);
        assert_eq!(atoms[0].molecule_name, "dsgdb9nsd_000001");
        assert_eq!(atoms[0].element, "C");
        assert_eq!(atoms[1].atom_index, 1);
        assert_eq!(atoms[2].element, "N");
        assert_eq!(atoms[2].position.y, 1.0241077531);
    }

    #[test]
    fn limit_truncates_rows() {
        let atoms = StructureFile::read_from(STRUCTURES_CSV.as_bytes(), Some(2)).unwrap();
        assert_eq!(atoms.len(), 2);
    }

    #[test]
    fn missing_column_is_rejected() {
        let csv = "molecule_name,atom_index,atom,x,y\nm,0,H,0.0,0.0\n";
        let result = StructureFile::read_from(csv.as_bytes(), None);
        assert!(matches!(result, Err(TableError::Csv(_))));
    }

    #[test]
    fn empty_element_is_rejected() {
        let csv = "molecule_name,atom_index,atom,x,y,z\nm,0,,0.0,0.0,0.0\n";
        let result = StructureFile::read_from(csv.as_bytes(), None);
        assert!(matches!(result, Err(TableError::InvalidRecord { row: 1, .. })));
    }

    #[test]
    fn negative_atom_index_is_rejected() {
        let csv = "molecule_name,atom_index,atom,x,y,z\nm,-1,H,0.0,0.0,0.0\n";
        assert!(StructureFile::read_from(csv.as_bytes(), None).is_err());
    }

    #[test]
    fn annotated_rows_write_nan_as_empty_and_read_back_as_nan() {
        let records = vec![
            AnnotatedAtom {
                atom: Atom::new("m", 0, "H", Point3::new(0.0, 0.0, 0.0)),
                electronegativity: 2.2,
                radius: 0.43,
                bonds: AtomBondSummary {
                    n_bonds: 1,
                    bond_lengths_mean: 0.3,
                    bond_lengths_std: 0.0,
                },
            },
            AnnotatedAtom {
                atom: Atom::new("n", 0, "F", Point3::new(1.0, 1.0, 1.0)),
                electronegativity: 3.98,
                radius: 0.76,
                bonds: AtomBondSummary::unbonded(),
            },
        ];

        let mut buffer = Vec::new();
        AnnotatedStructureFile::write_to(&records, &mut buffer).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ANNOTATED_HEADER.join(","));
        assert!(lines[2].ends_with(",0,,"));

        let read_back = AnnotatedStructureFile::read_from(buffer.as_slice(), None).unwrap();
        assert_eq!(read_back.len(), 2);
        assert_eq!(read_back[0].bonds.bond_lengths_mean, 0.3);
        assert_eq!(read_back[1].bonds.n_bonds, 0);
        assert!(read_back[1].bonds.bond_lengths_mean.is_nan());
        assert!(read_back[1].bonds.bond_lengths_std.is_nan());
    }

    #[test]
    fn annotated_row_with_inconsistent_nan_is_rejected() {
        let csv = format!("{}\nm,0,H,0,0,0,2.2,0.43,2,,\n", ANNOTATED_HEADER.join(","));
        let result = AnnotatedStructureFile::read_from(csv.as_bytes(), None);
        assert!(matches!(result, Err(TableError::InvalidRecord { row: 1, .. })));
    }

    #[test]
    fn empty_table_still_writes_header() {
        let mut buffer = Vec::new();
        StructureFile::write_to(&[], &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap().trim_end(), STRUCTURE_HEADER.join(","));
    }
}

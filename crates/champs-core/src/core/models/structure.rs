use super::atom::Atom;
use super::bond::AtomBondSummary;
use std::collections::HashMap;
use std::ops::Range;

/// A contiguous run of rows sharing one molecule name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoleculeSpan<'a> {
    pub molecule_name: &'a str,
    pub rows: Range<usize>,
}

impl MoleculeSpan<'_> {
    pub fn atom_count(&self) -> usize {
        self.rows.len()
    }
}

/// The flat atom table of every molecule in a dataset, in input row order.
///
/// Atoms of one molecule are expected to occupy consecutive rows. The table does not
/// reorder or deduplicate anything: row `i` of every derived table corresponds to row `i`
/// here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureTable {
    atoms: Vec<Atom>,
}

impl StructureTable {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self { atoms }
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn into_atoms(self) -> Vec<Atom> {
        self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Iterates over the runs of consecutive rows that share a molecule name.
    pub fn molecule_spans(&self) -> MoleculeSpans<'_> {
        MoleculeSpans {
            atoms: &self.atoms,
            cursor: 0,
        }
    }

    /// Assigns each row the ordinal of its molecule run.
    ///
    /// Two rows get the same ordinal iff they lie in the same run, which turns the
    /// same-molecule test into an integer comparison.
    pub fn molecule_ordinals(&self) -> Vec<usize> {
        let mut ordinals = vec![0; self.atoms.len()];
        for (ordinal, span) in self.molecule_spans().enumerate() {
            ordinals[span.rows].fill(ordinal);
        }
        ordinals
    }
}

pub struct MoleculeSpans<'a> {
    atoms: &'a [Atom],
    cursor: usize,
}

impl<'a> Iterator for MoleculeSpans<'a> {
    type Item = MoleculeSpan<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.cursor;
        let first = self.atoms.get(start)?;
        let len = self.atoms[start..]
            .iter()
            .take_while(|atom| atom.molecule_name == first.molecule_name)
            .count();
        self.cursor = start + len;
        Some(MoleculeSpan {
            molecule_name: &first.molecule_name,
            rows: start..self.cursor,
        })
    }
}

/// An atom row augmented with element constants and bond statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedAtom {
    pub atom: Atom,
    pub electronegativity: f64,
    pub radius: f64,
    pub bonds: AtomBondSummary,
}

/// The structure table after bond inference: same rows, same order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotatedStructure {
    atoms: Vec<AnnotatedAtom>,
}

impl AnnotatedStructure {
    pub fn new(atoms: Vec<AnnotatedAtom>) -> Self {
        Self { atoms }
    }

    pub fn atoms(&self) -> &[AnnotatedAtom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Builds a `(molecule_name, atom_index) -> row` index for joining pair tables.
    pub fn locator(&self) -> AtomLocator<'_> {
        let rows = self
            .atoms
            .iter()
            .enumerate()
            .map(|(row, a)| ((a.atom.molecule_name.as_str(), a.atom.atom_index), row))
            .collect();
        AtomLocator {
            structure: self,
            rows,
        }
    }
}

pub struct AtomLocator<'a> {
    structure: &'a AnnotatedStructure,
    rows: HashMap<(&'a str, usize), usize>,
}

impl<'a> AtomLocator<'a> {
    pub fn find(&self, molecule_name: &str, atom_index: usize) -> Option<&'a AnnotatedAtom> {
        self.rows
            .get(&(molecule_name, atom_index))
            .map(|&row| &self.structure.atoms[row])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn atom(molecule: &str, index: usize) -> Atom {
        Atom::new(molecule, index, "H", Point3::origin())
    }

    #[test]
    fn molecule_spans_follow_row_runs() {
        let table = StructureTable::new(vec![
            atom("a", 0),
            atom("a", 1),
            atom("b", 0),
            atom("c", 0),
            atom("c", 1),
            atom("c", 2),
        ]);
        let spans: Vec<_> = table.molecule_spans().collect();
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].molecule_name, "a");
        assert_eq!(spans[0].rows, 0..2);
        assert_eq!(spans[1].rows, 2..3);
        assert_eq!(spans[2].rows, 3..6);
        assert_eq!(spans[2].atom_count(), 3);
    }

    #[test]
    fn empty_table_has_no_spans() {
        let table = StructureTable::default();
        assert!(table.is_empty());
        assert_eq!(table.molecule_spans().count(), 0);
        assert!(table.molecule_ordinals().is_empty());
    }

    #[test]
    fn molecule_ordinals_distinguish_runs() {
        let table = StructureTable::new(vec![atom("a", 0), atom("a", 1), atom("b", 0)]);
        assert_eq!(table.molecule_ordinals(), vec![0, 0, 1]);
    }

    #[test]
    fn locator_finds_atoms_by_composite_key() {
        let annotated = AnnotatedStructure::new(
            [atom("a", 0), atom("a", 1), atom("b", 0)]
                .into_iter()
                .map(|atom| AnnotatedAtom {
                    atom,
                    electronegativity: 2.2,
                    radius: 0.43,
                    bonds: AtomBondSummary::unbonded(),
                })
                .collect(),
        );
        let locator = annotated.locator();
        assert_eq!(locator.find("a", 1).unwrap().atom.atom_index, 1);
        assert_eq!(locator.find("b", 0).unwrap().atom.molecule_name, "b");
        assert!(locator.find("b", 1).is_none());
    }
}

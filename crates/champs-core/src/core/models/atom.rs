use nalgebra::Point3;

/// A single row of the structure table.
///
/// Atoms carry no identity beyond `(molecule_name, atom_index)`; the row position in the
/// owning [`StructureTable`](super::structure::StructureTable) is what the bond engine
/// indexes by.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Opaque identifier of the molecule this atom belongs to.
    pub molecule_name: String,
    /// Zero-based position of the atom within its molecule.
    pub atom_index: usize,
    /// Element symbol (e.g. "H", "C").
    pub element: String,
    /// Cartesian coordinates in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    pub fn new(
        molecule_name: &str,
        atom_index: usize,
        element: &str,
        position: Point3<f64>,
    ) -> Self {
        Self {
            molecule_name: molecule_name.to_string(),
            atom_index,
            element: element.to_string(),
            position,
        }
    }

    /// Returns true if both atoms belong to the same molecule.
    #[inline]
    pub fn shares_molecule_with(&self, other: &Atom) -> bool {
        self.molecule_name == other.molecule_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_stores_all_fields() {
        let atom = Atom::new("m1", 3, "N", Point3::new(1.0, -2.0, 0.5));
        assert_eq!(atom.molecule_name, "m1");
        assert_eq!(atom.atom_index, 3);
        assert_eq!(atom.element, "N");
        assert_eq!(atom.position, Point3::new(1.0, -2.0, 0.5));
    }

    #[test]
    fn shares_molecule_compares_names_only() {
        let a = Atom::new("m1", 0, "C", Point3::origin());
        let b = Atom::new("m1", 7, "H", Point3::new(9.0, 9.0, 9.0));
        let c = Atom::new("m2", 0, "C", Point3::origin());
        assert!(a.shares_molecule_with(&b));
        assert!(!a.shares_molecule_with(&c));
    }
}

//! # Core Models Module
//!
//! Data structures describing molecules as flat atom tables, the per-atom-pair label
//! rows of the coupling task and the per-atom bond records derived from them.
//!
//! ## Key Components
//!
//! - [`atom`] - A single atom row: molecule, local index, element and position
//! - [`element`] - Covalent radius and electronegativity lookup
//! - [`structure`] - The ordered atom table and its per-molecule runs
//! - [`bond`] - Bonded neighbors and per-atom bond statistics
//! - [`pair`] - Coupling pairs, target contributions and preprocessed pair rows
//!
//! ## Usage
//!
//! ```ignore
//! use champs::core::models::{atom::Atom, structure::StructureTable};
//! use nalgebra::Point3;
//!
//! let table = StructureTable::new(vec![
//!     Atom::new("dsgdb9nsd_000001", 0, "C", Point3::new(0.0, 0.0, 0.0)),
//!     Atom::new("dsgdb9nsd_000001", 1, "H", Point3::new(0.0, 0.0, 1.09)),
//! ]);
//! assert_eq!(table.molecule_spans().count(), 1);
//! ```

pub mod atom;
pub mod bond;
pub mod element;
pub mod pair;
pub mod structure;

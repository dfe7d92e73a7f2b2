//! # Core Module
//!
//! Fundamental data structures and pure functions shared by the bond inference engine
//! and the feature pipeline.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, structure tables, coupling pairs,
//!   element properties and per-atom bond records
//! - **Table I/O** ([`io`]) - CSV readers and writers for the competition tables
//! - **Geometry** ([`utils`]) - Distance features between mapped atom pairs
//!
//! Nothing in this module holds state across calls; every type is a plain value that the
//! [`engine`](crate::engine) layer consumes.

pub mod io;
pub mod models;
pub mod utils;

//! Provides CSV input/output for the tables of the coupling task.
//!
//! Every table type implements [`traits::TableFile`], which maps between CSV rows and the
//! in-memory models in [`crate::core::models`]. Readers never reorder rows; writers emit
//! an explicit header row so that empty tables still round-trip.

pub mod error;
pub mod pairs;
pub mod structures;
pub mod submission;
pub mod traits;

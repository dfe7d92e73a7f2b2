//! # Workflows Module
//!
//! End-to-end procedures that tie the engine and core layers together. These are the
//! entry points used by the command-line front end.
//!
//! - **Preprocessing** ([`preprocess`]) - Bond annotation of the structure table
//!   (optionally through a table cache) and the join of pair tables onto it
//! - **Prediction** ([`predict`]) - Feature extraction, k-fold cross-validated ridge
//!   regression and averaged test predictions
//! - **Tuning** ([`tune`]) - Seeded random search over the ridge penalty and the
//!   study file that persists the best parameters

pub mod predict;
pub mod preprocess;
pub mod tune;

//! # CHAMPS Core Library
//!
//! Bond inference, feature engineering and cross-validated regression for predicting
//! scalar coupling constants between atom pairs in small organic molecules.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture so that the geometric preprocessing
//! can be tested and reused independently of the learning pipeline around it.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Atom`, `StructureTable`,
//!   `CouplingPair`), the element property table, pure geometry and CSV table I/O.
//!
//! - **[`engine`]: The Logic Core.** The windowed `BondInferenceEngine`, group-by
//!   aggregation, the feature registry, the regression model seam, k-fold
//!   cross-validation, the table cache and the shared configuration and error types.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures (`preprocess`, `predict`,
//!   `tune`) that tie `engine` and `core` together for the command-line front end.

pub mod core;
pub mod engine;
pub mod workflows;

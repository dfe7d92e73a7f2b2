//! # Engine Module
//!
//! The computational layer of the pipeline: bond inference, statistical aggregation,
//! feature extraction and the cross-validated regression loop.
//!
//! ## Architecture
//!
//! - **Bond Inference** ([`bonds`]) - Windowed neighbor comparison producing per-atom
//!   bonded-neighbor sets and bond statistics
//! - **Aggregation** ([`aggregate`]) - Group-by reductions broadcast back onto rows
//! - **Features** ([`features`]) - Name-addressed registry of feature extractors
//! - **Modeling** ([`model`]) - Design matrix encoding, the `Regressor` seam, k-fold
//!   splitting and the competition metric
//! - **Caching** ([`cache`]) - Name-addressed store for intermediate tables
//! - **Configuration** ([`config`]) - Bond, prediction and tuning parameters
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine-wide error type
//!
//! The bond engine is a pure function of its input table and configuration; it never
//! reads or writes the cache.

pub mod aggregate;
pub mod bonds;
pub mod cache;
pub mod config;
pub mod error;
pub mod features;
pub mod model;
pub mod progress;

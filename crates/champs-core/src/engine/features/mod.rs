//! Feature extraction over preprocessed pair rows.
//!
//! Features are looked up by name in an explicit [`FeatureRegistry`]; each one turns
//! the pair table into one or more row-aligned [`FeatureColumn`]s.

mod builtin;
mod column;
mod registry;

pub use builtin::{
    CategoricalFeature, DistanceFeature, EndpointBondsFeature, EndpointCountFeature,
    EndpointElectronegativityFeature, MoleculeCountFeature, MoleculeDistanceStatisticsFeature,
    TypeDistanceStatisticsFeature,
};
pub use column::{ColumnData, FeatureColumn};
pub use registry::{FeatureFactory, FeatureRegistry};

use crate::core::models::pair::PairRow;

/// A named extractor of feature columns.
pub trait Feature: Send + Sync {
    /// The registry name of the feature (e.g. `MoleculeCount`).
    fn name(&self) -> &'static str;

    /// Computes this feature's columns, each with exactly one value per row.
    fn extract(&self, rows: &[PairRow]) -> Vec<FeatureColumn>;
}

/// Extracts the columns of every feature in order.
pub fn extract_all(features: &[Box<dyn Feature>], rows: &[PairRow]) -> Vec<FeatureColumn> {
    features
        .iter()
        .flat_map(|feature| feature.extract(rows))
        .collect()
}

use super::registry::FeatureFactory;
use super::{Feature, FeatureColumn};
use crate::core::models::pair::{PairEndpoint, PairRow};
use crate::engine::aggregate::{GroupBy, Reduction, broadcast, broadcast_count};

pub(super) const FACTORIES: [FeatureFactory; 15] = [
    || Box::new(CategoricalFeature::TYPE),
    || Box::new(CategoricalFeature::TYPE_0),
    || Box::new(CategoricalFeature::TYPE_1),
    || Box::new(CategoricalFeature::ATOM_0),
    || Box::new(CategoricalFeature::ATOM_1),
    || Box::new(DistanceFeature),
    || Box::new(MoleculeCountFeature),
    || Box::new(MoleculeDistanceStatisticsFeature),
    || Box::new(EndpointCountFeature::new(PairEndpoint::Atom0)),
    || Box::new(EndpointCountFeature::new(PairEndpoint::Atom1)),
    || Box::new(EndpointBondsFeature::new(PairEndpoint::Atom0)),
    || Box::new(EndpointBondsFeature::new(PairEndpoint::Atom1)),
    || Box::new(EndpointElectronegativityFeature::new(PairEndpoint::Atom0)),
    || Box::new(EndpointElectronegativityFeature::new(PairEndpoint::Atom1)),
    || Box::new(TypeDistanceStatisticsFeature),
];

fn endpoint_name(endpoint: PairEndpoint, atom_0: &'static str, atom_1: &'static str) -> &'static str {
    match endpoint {
        PairEndpoint::Atom0 => atom_0,
        PairEndpoint::Atom1 => atom_1,
    }
}

fn distances(rows: &[PairRow]) -> Vec<f64> {
    rows.iter().map(|row| row.distance.dist).collect()
}

/// Passes one string column of the pair table through unchanged.
#[derive(Clone, Copy)]
pub struct CategoricalFeature {
    name: &'static str,
    column: &'static str,
    select: fn(&PairRow) -> &str,
}

impl CategoricalFeature {
    pub const TYPE: Self = Self {
        name: "Type",
        column: "type",
        select: |row| row.pair.coupling_type.as_str(),
    };
    pub const TYPE_0: Self = Self {
        name: "Type0",
        column: "type_0",
        select: |row| row.type_0.as_str(),
    };
    pub const TYPE_1: Self = Self {
        name: "Type1",
        column: "type_1",
        select: |row| row.type_1.as_str(),
    };
    pub const ATOM_0: Self = Self {
        name: "Atom0",
        column: "atom_0",
        select: |row| row.atom_0.element.as_str(),
    };
    pub const ATOM_1: Self = Self {
        name: "Atom1",
        column: "atom_1",
        select: |row| row.atom_1.element.as_str(),
    };
}

impl Feature for CategoricalFeature {
    fn name(&self) -> &'static str {
        self.name
    }

    fn extract(&self, rows: &[PairRow]) -> Vec<FeatureColumn> {
        let values = rows
            .iter()
            .map(|row| (self.select)(row).to_string())
            .collect();
        vec![FeatureColumn::categorical(self.column, values)]
    }
}

/// Pair distance and its squared per-axis components.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceFeature;

impl Feature for DistanceFeature {
    fn name(&self) -> &'static str {
        "Distance"
    }

    fn extract(&self, rows: &[PairRow]) -> Vec<FeatureColumn> {
        let column = |name: &str, select: fn(&PairRow) -> f64| {
            FeatureColumn::numeric(name, rows.iter().map(select).collect())
        };
        vec![
            column("dist", |row| row.distance.dist),
            column("dist_x", |row| row.distance.dist_x),
            column("dist_y", |row| row.distance.dist_y),
            column("dist_z", |row| row.distance.dist_z),
        ]
    }
}

/// Number of pairs in each row's molecule.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoleculeCountFeature;

impl Feature for MoleculeCountFeature {
    fn name(&self) -> &'static str {
        "MoleculeCount"
    }

    fn extract(&self, rows: &[PairRow]) -> Vec<FeatureColumn> {
        let keys = GroupBy::Molecule.keys(rows);
        vec![FeatureColumn::numeric(
            "molecule_couples",
            broadcast_count(&keys),
        )]
    }
}

/// Mean, min, max and std of the pair distance over each row's molecule.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoleculeDistanceStatisticsFeature;

impl Feature for MoleculeDistanceStatisticsFeature {
    fn name(&self) -> &'static str {
        "MoleculeDistanceStatistics"
    }

    fn extract(&self, rows: &[PairRow]) -> Vec<FeatureColumn> {
        const COLUMNS: [(&str, Reduction); 4] = [
            ("molecule_dist_mean", Reduction::Mean),
            ("molecule_dist_min", Reduction::Min),
            ("molecule_dist_max", Reduction::Max),
            ("molecule_dist_std", Reduction::Std),
        ];
        let keys = GroupBy::Molecule.keys(rows);
        let reductions = COLUMNS.map(|(_, reduction)| reduction);
        broadcast(&keys, &distances(rows), &reductions)
            .into_iter()
            .zip(COLUMNS)
            .map(|(values, (name, _))| FeatureColumn::numeric(name, values))
            .collect()
    }
}

/// Mean and std of the pair distance over each row's (molecule, coupling type) group.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeDistanceStatisticsFeature;

impl Feature for TypeDistanceStatisticsFeature {
    fn name(&self) -> &'static str {
        "TypeDistanceStatistics"
    }

    fn extract(&self, rows: &[PairRow]) -> Vec<FeatureColumn> {
        let keys = GroupBy::MoleculeType.keys(rows);
        let mut columns = broadcast(&keys, &distances(rows), &[Reduction::Mean, Reduction::Std]);
        let std = columns.pop().unwrap_or_default();
        let mean = columns.pop().unwrap_or_default();
        vec![
            FeatureColumn::numeric("type_dist_mean", mean),
            FeatureColumn::numeric("type_dist_std", std),
        ]
    }
}

/// Number of pairs sharing this row's endpoint atom.
#[derive(Debug, Clone, Copy)]
pub struct EndpointCountFeature {
    endpoint: PairEndpoint,
}

impl EndpointCountFeature {
    pub fn new(endpoint: PairEndpoint) -> Self {
        Self { endpoint }
    }
}

impl Feature for EndpointCountFeature {
    fn name(&self) -> &'static str {
        endpoint_name(self.endpoint, "Atom0Count", "Atom1Count")
    }

    fn extract(&self, rows: &[PairRow]) -> Vec<FeatureColumn> {
        let keys = GroupBy::MoleculeAtom(self.endpoint).keys(rows);
        vec![FeatureColumn::numeric(
            format!("{}_couples", self.endpoint),
            broadcast_count(&keys),
        )]
    }
}

/// Bond count and bond-length statistics of the endpoint atom.
#[derive(Debug, Clone, Copy)]
pub struct EndpointBondsFeature {
    endpoint: PairEndpoint,
}

impl EndpointBondsFeature {
    pub fn new(endpoint: PairEndpoint) -> Self {
        Self { endpoint }
    }
}

impl Feature for EndpointBondsFeature {
    fn name(&self) -> &'static str {
        endpoint_name(self.endpoint, "Atom0Bonds", "Atom1Bonds")
    }

    fn extract(&self, rows: &[PairRow]) -> Vec<FeatureColumn> {
        let bonds: Vec<_> = rows
            .iter()
            .map(|row| row.endpoint(self.endpoint).bonds)
            .collect();
        vec![
            FeatureColumn::numeric(
                format!("{}_n_bonds", self.endpoint),
                bonds.iter().map(|b| b.n_bonds as f64).collect(),
            ),
            FeatureColumn::numeric(
                format!("{}_bond_lengths_mean", self.endpoint),
                bonds.iter().map(|b| b.bond_lengths_mean).collect(),
            ),
            FeatureColumn::numeric(
                format!("{}_bond_lengths_std", self.endpoint),
                bonds.iter().map(|b| b.bond_lengths_std).collect(),
            ),
        ]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EndpointElectronegativityFeature {
    endpoint: PairEndpoint,
}

impl EndpointElectronegativityFeature {
    pub fn new(endpoint: PairEndpoint) -> Self {
        Self { endpoint }
    }
}

impl Feature for EndpointElectronegativityFeature {
    fn name(&self) -> &'static str {
        endpoint_name(
            self.endpoint,
            "Atom0Electronegativity",
            "Atom1Electronegativity",
        )
    }

    fn extract(&self, rows: &[PairRow]) -> Vec<FeatureColumn> {
        vec![FeatureColumn::numeric(
            format!("{}_electronegativity", self.endpoint),
            rows.iter()
                .map(|row| row.endpoint(self.endpoint).electronegativity)
                .collect(),
        )]
    }
}

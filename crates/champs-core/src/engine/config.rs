use crate::core::models::element::{DEFAULT_FUDGE_FACTOR, ElementTable};
use crate::core::models::pair::PairRow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Widest local-index gap the windowed bond search compares, plus one.
pub const MAX_ATOMS: usize = 28;
/// Distances at or below this value are never bonds.
pub const MIN_BOND_DISTANCE: f64 = 1e-4;

pub const DEFAULT_FEATURES: [&str; 4] = [
    "MoleculeCount",
    "MoleculeDistanceStatistics",
    "Atom0Count",
    "Atom1Count",
];
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_N_SPLITS: usize = 5;
pub const DEFAULT_ALPHA: f64 = 1.0;
pub const DEFAULT_ALPHA_RANGE: (f64, f64) = (1e-2, 1e2);
pub const DEFAULT_ITERATIONS: usize = 100;
pub const DEFAULT_MAX_DEPTH: u32 = 3;
pub const DEFAULT_MIN_LEAF_SIZE: usize = 20;
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BondConfig {
    /// Offsets `1..max_atoms` are compared; pairs further apart are never bonded.
    pub max_atoms: usize,
    pub min_distance: f64,
    pub elements: ElementTable,
}

impl Default for BondConfig {
    fn default() -> Self {
        Self {
            max_atoms: MAX_ATOMS,
            min_distance: MIN_BOND_DISTANCE,
            elements: ElementTable::reference(),
        }
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(hash: u64, bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(hash, |h, &b| (h ^ u64::from(b)).wrapping_mul(FNV_PRIME))
}

impl BondConfig {
    /// A stable 64-bit FNV-1a hash of every setting that changes inferred bonds.
    ///
    /// Equal configurations always hash alike, across runs and builds.
    pub fn fingerprint(&self) -> u64 {
        let mut hash = fnv1a(FNV_OFFSET, &(self.max_atoms as u64).to_le_bytes());
        hash = fnv1a(hash, &self.min_distance.to_bits().to_le_bytes());
        hash = fnv1a(hash, &self.elements.fudge_factor().to_bits().to_le_bytes());
        for symbol in self.elements.symbols() {
            hash = fnv1a(hash, symbol.as_bytes());
            hash = fnv1a(hash, &[0]);
            if let Ok(props) = self.elements.lookup(symbol) {
                hash = fnv1a(hash, &props.radius.to_bits().to_le_bytes());
                hash = fnv1a(hash, &props.electronegativity.to_bits().to_le_bytes());
            }
        }
        hash
    }
}

/// An element added on top of the reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraElement {
    pub symbol: String,
    pub covalent_radius: f64,
    pub electronegativity: f64,
}

#[derive(Default)]
pub struct BondConfigBuilder {
    max_atoms: Option<usize>,
    min_distance: Option<f64>,
    fudge_factor: Option<f64>,
    extra_elements: Vec<ExtraElement>,
}

impl BondConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_atoms(mut self, max_atoms: usize) -> Self {
        self.max_atoms = Some(max_atoms);
        self
    }
    pub fn min_distance(mut self, distance: f64) -> Self {
        self.min_distance = Some(distance);
        self
    }
    pub fn fudge_factor(mut self, fudge_factor: f64) -> Self {
        self.fudge_factor = Some(fudge_factor);
        self
    }
    pub fn element(mut self, element: ExtraElement) -> Self {
        self.extra_elements.push(element);
        self
    }

    pub fn build(self) -> Result<BondConfig, ConfigError> {
        let max_atoms = self.max_atoms.unwrap_or(MAX_ATOMS);
        if max_atoms == 0 {
            return Err(invalid("max_atoms", "must be at least 1"));
        }
        let min_distance = self.min_distance.unwrap_or(MIN_BOND_DISTANCE);
        if !min_distance.is_finite() || min_distance < 0.0 {
            return Err(invalid("min_distance", "must be a non-negative number"));
        }
        let fudge_factor = self.fudge_factor.unwrap_or(DEFAULT_FUDGE_FACTOR);
        if !fudge_factor.is_finite() {
            return Err(invalid("fudge_factor", "must be finite"));
        }

        let mut elements = ElementTable::with_fudge_factor(fudge_factor);
        for extra in self.extra_elements {
            if extra.symbol.trim().is_empty() {
                return Err(invalid("elements", "element symbol must not be empty"));
            }
            if !(extra.covalent_radius.is_finite() && extra.covalent_radius > 0.0) {
                return Err(invalid(
                    "elements",
                    format!("radius of '{}' must be positive", extra.symbol),
                ));
            }
            elements.insert(&extra.symbol, extra.covalent_radius, extra.electronegativity);
        }

        Ok(BondConfig {
            max_atoms,
            min_distance,
            elements,
        })
    }
}

/// The value a model is trained to predict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetColumn {
    #[default]
    ScalarCouplingConstant,
    Fc,
    Sd,
    Pso,
    Dso,
}

impl TargetColumn {
    pub fn name(self) -> &'static str {
        match self {
            TargetColumn::ScalarCouplingConstant => "scalar_coupling_constant",
            TargetColumn::Fc => "fc",
            TargetColumn::Sd => "sd",
            TargetColumn::Pso => "pso",
            TargetColumn::Dso => "dso",
        }
    }

    /// Reads the target from a preprocessed row, if the row carries it.
    pub fn value(self, row: &PairRow) -> Option<f64> {
        match self {
            TargetColumn::ScalarCouplingConstant => row.pair.scalar_coupling_constant,
            TargetColumn::Fc => row.contribution.as_ref().map(|c| c.fc),
            TargetColumn::Sd => row.contribution.as_ref().map(|c| c.sd),
            TargetColumn::Pso => row.contribution.as_ref().map(|c| c.pso),
            TargetColumn::Dso => row.contribution.as_ref().map(|c| c.dso),
        }
    }

    pub fn needs_contributions(self) -> bool {
        self != TargetColumn::ScalarCouplingConstant
    }
}

impl FromStr for TargetColumn {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scalar_coupling_constant" | "scalar-coupling-constant" => {
                Ok(TargetColumn::ScalarCouplingConstant)
            }
            "fc" => Ok(TargetColumn::Fc),
            "sd" => Ok(TargetColumn::Sd),
            "pso" => Ok(TargetColumn::Pso),
            "dso" => Ok(TargetColumn::Dso),
            _ => Err(invalid("target", format!("unknown target column '{}'", s))),
        }
    }
}

impl fmt::Display for TargetColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which learning algorithm a pipeline trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelKind {
    #[default]
    GradientBoosting,
    Ridge,
}

impl ModelKind {
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::GradientBoosting => "gradient-boosting",
            ModelKind::Ridge => "ridge",
        }
    }
}

impl FromStr for ModelKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gradient-boosting" | "gbdt" | "gbm" => Ok(ModelKind::GradientBoosting),
            "ridge" => Ok(ModelKind::Ridge),
            _ => Err(invalid("model", format!("unknown model '{}'", s))),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hyperparameters of the gradient-boosted regression trees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BoostingParams {
    /// Number of boosting rounds (trees).
    pub iterations: usize,
    /// Depth limit of every tree; a tree has at most `2^max_depth` leaves.
    pub max_depth: u32,
    /// Smallest number of training rows a leaf may hold.
    pub min_leaf_size: usize,
    /// Shrinkage applied to every tree's contribution.
    pub learning_rate: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            max_depth: DEFAULT_MAX_DEPTH,
            min_leaf_size: DEFAULT_MIN_LEAF_SIZE,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

impl BoostingParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(invalid("iterations", "at least one boosting round is required"));
        }
        if self.max_depth == 0 {
            return Err(invalid("max_depth", "must be at least 1"));
        }
        if self.min_leaf_size == 0 {
            return Err(invalid("min_leaf_size", "must be at least 1"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(invalid("learning_rate", "must lie in (0, 1]"));
        }
        Ok(())
    }
}

/// A fully specified model: the algorithm and its hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ModelParams {
    GradientBoosting(BoostingParams),
    Ridge { alpha: f64 },
}

impl Default for ModelParams {
    fn default() -> Self {
        Self::defaults_for(ModelKind::default())
    }
}

impl ModelParams {
    pub fn defaults_for(kind: ModelKind) -> Self {
        match kind {
            ModelKind::GradientBoosting => ModelParams::GradientBoosting(BoostingParams::default()),
            ModelKind::Ridge => ModelParams::Ridge {
                alpha: DEFAULT_ALPHA,
            },
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            ModelParams::GradientBoosting(_) => ModelKind::GradientBoosting,
            ModelParams::Ridge { .. } => ModelKind::Ridge,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ModelParams::GradientBoosting(params) => params.validate(),
            ModelParams::Ridge { alpha } => check_alpha("alpha", *alpha),
        }
    }
}

impl fmt::Display for ModelParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelParams::GradientBoosting(p) => write!(
                f,
                "gradient-boosting(iterations={}, max-depth={}, min-leaf-size={}, learning-rate={})",
                p.iterations, p.max_depth, p.min_leaf_size, p.learning_rate
            ),
            ModelParams::Ridge { alpha } => write!(f, "ridge(alpha={})", alpha),
        }
    }
}

/// Inclusive sampling ranges of the boosting hyperparameter search.
///
/// The defaults cover 2 to 16 leaves per tree and 3 to 100 rows per leaf; the
/// learning rate is sampled log-uniformly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostingSearchSpace {
    pub iterations: (usize, usize),
    pub max_depth: (u32, u32),
    pub min_leaf_size: (usize, usize),
    pub learning_rate: (f64, f64),
}

impl Default for BoostingSearchSpace {
    fn default() -> Self {
        Self {
            iterations: (20, 200),
            max_depth: (1, 4),
            min_leaf_size: (3, 100),
            learning_rate: (1e-2, 3e-1),
        }
    }
}

impl BoostingSearchSpace {
    fn validate(&self) -> Result<(), ConfigError> {
        let ordered = self.iterations.0 <= self.iterations.1
            && self.max_depth.0 <= self.max_depth.1
            && self.min_leaf_size.0 <= self.min_leaf_size.1
            && self.learning_rate.0 <= self.learning_rate.1;
        if !ordered {
            return Err(invalid("boosting_space", "lower bound exceeds upper bound"));
        }
        BoostingParams {
            iterations: self.iterations.0,
            max_depth: self.max_depth.0,
            min_leaf_size: self.min_leaf_size.0,
            learning_rate: self.learning_rate.0,
        }
        .validate()?;
        BoostingParams {
            iterations: self.iterations.1,
            max_depth: self.max_depth.1,
            min_leaf_size: self.min_leaf_size.1,
            learning_rate: self.learning_rate.1,
        }
        .validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossValidationConfig {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionConfig {
    pub feature_names: Vec<String>,
    pub target: TargetColumn,
    pub validation: CrossValidationConfig,
    pub model: ModelParams,
}

fn check_common(
    feature_names: &[String],
    n_splits: usize,
) -> Result<(), ConfigError> {
    if feature_names.is_empty() {
        return Err(invalid("feature_names", "at least one feature is required"));
    }
    if n_splits < 2 {
        return Err(invalid("n_splits", "k-fold validation needs at least 2 splits"));
    }
    Ok(())
}

fn check_alpha(name: &'static str, alpha: f64) -> Result<(), ConfigError> {
    if !(alpha.is_finite() && alpha > 0.0) {
        return Err(invalid(name, "must be a positive number"));
    }
    Ok(())
}

#[derive(Default)]
pub struct PredictionConfigBuilder {
    feature_names: Option<Vec<String>>,
    target: Option<TargetColumn>,
    n_splits: Option<usize>,
    shuffle: Option<bool>,
    seed: Option<u64>,
    model: Option<ModelParams>,
}

impl PredictionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = Some(names);
        self
    }
    pub fn target(mut self, target: TargetColumn) -> Self {
        self.target = Some(target);
        self
    }
    pub fn n_splits(mut self, n: usize) -> Self {
        self.n_splits = Some(n);
        self
    }
    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = Some(shuffle);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn model(mut self, model: ModelParams) -> Self {
        self.model = Some(model);
        self
    }

    pub fn build(self) -> Result<PredictionConfig, ConfigError> {
        let feature_names = self
            .feature_names
            .ok_or(ConfigError::MissingParameter("feature_names"))?;
        let n_splits = self.n_splits.ok_or(ConfigError::MissingParameter("n_splits"))?;
        check_common(&feature_names, n_splits)?;
        let model = self.model.unwrap_or_default();
        model.validate()?;

        Ok(PredictionConfig {
            feature_names,
            target: self.target.unwrap_or_default(),
            validation: CrossValidationConfig {
                n_splits,
                shuffle: self.shuffle.unwrap_or(true),
                seed: self.seed.ok_or(ConfigError::MissingParameter("seed"))?,
            },
            model,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TuningConfig {
    pub feature_names: Vec<String>,
    pub target: TargetColumn,
    pub validation: CrossValidationConfig,
    pub n_trials: usize,
    pub model: ModelKind,
    /// Inclusive log-uniform search range for the ridge penalty.
    pub alpha_range: (f64, f64),
    pub boosting_space: BoostingSearchSpace,
}

#[derive(Default)]
pub struct TuningConfigBuilder {
    feature_names: Option<Vec<String>>,
    target: Option<TargetColumn>,
    n_splits: Option<usize>,
    seed: Option<u64>,
    n_trials: Option<usize>,
    model: Option<ModelKind>,
    alpha_range: Option<(f64, f64)>,
    boosting_space: Option<BoostingSearchSpace>,
}

impl TuningConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = Some(names);
        self
    }
    pub fn target(mut self, target: TargetColumn) -> Self {
        self.target = Some(target);
        self
    }
    pub fn n_splits(mut self, n: usize) -> Self {
        self.n_splits = Some(n);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn n_trials(mut self, n: usize) -> Self {
        self.n_trials = Some(n);
        self
    }
    pub fn model(mut self, kind: ModelKind) -> Self {
        self.model = Some(kind);
        self
    }
    pub fn alpha_range(mut self, min: f64, max: f64) -> Self {
        self.alpha_range = Some((min, max));
        self
    }
    pub fn boosting_space(mut self, space: BoostingSearchSpace) -> Self {
        self.boosting_space = Some(space);
        self
    }

    pub fn build(self) -> Result<TuningConfig, ConfigError> {
        let feature_names = self
            .feature_names
            .ok_or(ConfigError::MissingParameter("feature_names"))?;
        let n_splits = self.n_splits.ok_or(ConfigError::MissingParameter("n_splits"))?;
        check_common(&feature_names, n_splits)?;

        let n_trials = self.n_trials.ok_or(ConfigError::MissingParameter("n_trials"))?;
        if n_trials == 0 {
            return Err(invalid("n_trials", "at least one trial is required"));
        }
        let (min, max) = self.alpha_range.unwrap_or(DEFAULT_ALPHA_RANGE);
        check_alpha("alpha_range", min)?;
        check_alpha("alpha_range", max)?;
        if min > max {
            return Err(invalid("alpha_range", "lower bound exceeds upper bound"));
        }
        let boosting_space = self.boosting_space.unwrap_or_default();
        boosting_space.validate()?;

        Ok(TuningConfig {
            feature_names,
            target: self.target.unwrap_or_default(),
            validation: CrossValidationConfig {
                n_splits,
                shuffle: true,
                seed: self.seed.ok_or(ConfigError::MissingParameter("seed"))?,
            },
            n_trials,
            model: self.model.unwrap_or_default(),
            alpha_range: (min, max),
            boosting_space,
        })
    }
}

use crate::cli::{ConfigArgs, PredictArgs, TrainingInputArgs, TuneArgs};
use crate::error::{CliError, Result};
use champs::engine::config::{
    self as core_config, BondConfig, BondConfigBuilder, BoostingSearchSpace, ExtraElement,
    ModelKind, ModelParams, PredictionConfig, PredictionConfigBuilder, TargetColumn,
    TuningConfig, TuningConfigBuilder,
};
use champs::workflows::tune::BestParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

pub const DEFAULT_N_TRIALS: usize = 20;
pub const DEFAULT_STUDY_PATH: &str = "champs-study.toml";

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialElement {
    symbol: String,
    covalent_radius: f64,
    electronegativity: f64,
}

impl From<PartialElement> for ExtraElement {
    fn from(p: PartialElement) -> Self {
        Self {
            symbol: p.symbol,
            covalent_radius: p.covalent_radius,
            electronegativity: p.electronegativity,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialBondsConfig {
    max_atoms: Option<usize>,
    min_distance: Option<f64>,
    fudge_factor: Option<f64>,
    #[serde(default)]
    extra_elements: Vec<PartialElement>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialFeaturesConfig {
    names: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialModelConfig {
    kind: Option<String>,
    alpha: Option<f64>,
    iterations: Option<usize>,
    max_depth: Option<u32>,
    min_leaf_size: Option<usize>,
    learning_rate: Option<f64>,
    target: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialValidationConfig {
    n_splits: Option<usize>,
    seed: Option<u64>,
    shuffle: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialTuningConfig {
    n_trials: Option<usize>,
    alpha_min: Option<f64>,
    alpha_max: Option<f64>,
    iterations: Option<(usize, usize)>,
    max_depth: Option<(u32, u32)>,
    min_leaf_size: Option<(usize, usize)>,
    learning_rate: Option<(f64, f64)>,
    study: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialDataConfig {
    nrows: Option<usize>,
    cache_dir: Option<PathBuf>,
}

/// Everything a configuration file may set. Every field is optional; missing values
/// fall back to CLI flags and then to the library defaults.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialPipelineConfig {
    bonds: Option<PartialBondsConfig>,
    features: Option<PartialFeaturesConfig>,
    model: Option<PartialModelConfig>,
    validation: Option<PartialValidationConfig>,
    tuning: Option<PartialTuningConfig>,
    data: Option<PartialDataConfig>,
}

/// Data-loading options resolved from flags and the configuration file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataOptions {
    pub nrows: Option<usize>,
    pub cache_dir: Option<PathBuf>,
}

impl PartialPipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads the configuration file named by `args` (if any) and applies its `-S`
    /// overrides.
    pub fn load(args: &ConfigArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_set_values(&args.set_values)?;
        Ok(config)
    }

    pub fn bond_config(&self) -> Result<BondConfig> {
        let mut builder = BondConfigBuilder::new();
        if let Some(bonds) = &self.bonds {
            if let Some(max_atoms) = bonds.max_atoms {
                builder = builder.max_atoms(max_atoms);
            }
            if let Some(min_distance) = bonds.min_distance {
                builder = builder.min_distance(min_distance);
            }
            if let Some(fudge_factor) = bonds.fudge_factor {
                builder = builder.fudge_factor(fudge_factor);
            }
            for element in &bonds.extra_elements {
                builder = builder.element(element.clone().into());
            }
        }
        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn data_options(&self, nrows: Option<usize>, cache_dir: Option<&Path>) -> DataOptions {
        let data = self.data.as_ref();
        DataOptions {
            nrows: nrows.or(data.and_then(|d| d.nrows)),
            cache_dir: cache_dir
                .map(Path::to_path_buf)
                .or_else(|| data.and_then(|d| d.cache_dir.clone())),
        }
    }

    /// The study file path: the flag, then `tuning.study`, then [`DEFAULT_STUDY_PATH`].
    pub fn study_path(&self, cli_value: Option<&Path>) -> PathBuf {
        cli_value
            .map(Path::to_path_buf)
            .or_else(|| self.tuning.as_ref().and_then(|t| t.study.clone()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STUDY_PATH))
    }

    fn feature_names(&self, input: &TrainingInputArgs) -> Vec<String> {
        input
            .features
            .clone()
            .or_else(|| self.features.as_ref().and_then(|f| f.names.clone()))
            .unwrap_or_else(|| {
                core_config::DEFAULT_FEATURES
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
    }

    pub fn target(&self, input: &TrainingInputArgs) -> Result<TargetColumn> {
        match input
            .target
            .as_deref()
            .or_else(|| self.model.as_ref().and_then(|m| m.target.as_deref()))
        {
            Some(name) => TargetColumn::from_str(name).map_err(|e| CliError::Config(e.to_string())),
            None => Ok(TargetColumn::default()),
        }
    }

    /// The model family: the flag, then `model.kind`, then gradient boosting.
    pub fn model_kind(&self, input: &TrainingInputArgs) -> Result<ModelKind> {
        match input
            .model
            .as_deref()
            .or_else(|| self.model.as_ref().and_then(|m| m.kind.as_deref()))
        {
            Some(name) => ModelKind::from_str(name).map_err(|e| CliError::Config(e.to_string())),
            None => Ok(ModelKind::default()),
        }
    }

    /// Overlays the explicitly configured hyperparameters on `base`.
    fn overlay_model(&self, base: ModelParams, cli_alpha: Option<f64>) -> ModelParams {
        let m = self.model.as_ref();
        match base {
            ModelParams::Ridge { alpha } => ModelParams::Ridge {
                alpha: cli_alpha.or(m.and_then(|m| m.alpha)).unwrap_or(alpha),
            },
            ModelParams::GradientBoosting(mut p) => {
                if cli_alpha.is_some() {
                    warn!("--alpha only applies to the ridge model; ignoring it.");
                }
                if let Some(m) = m {
                    p.iterations = m.iterations.unwrap_or(p.iterations);
                    p.max_depth = m.max_depth.unwrap_or(p.max_depth);
                    p.min_leaf_size = m.min_leaf_size.unwrap_or(p.min_leaf_size);
                    p.learning_rate = m.learning_rate.unwrap_or(p.learning_rate);
                }
                ModelParams::GradientBoosting(p)
            }
        }
    }

    fn boosting_space(&self) -> BoostingSearchSpace {
        let defaults = BoostingSearchSpace::default();
        match &self.tuning {
            Some(t) => BoostingSearchSpace {
                iterations: t.iterations.unwrap_or(defaults.iterations),
                max_depth: t.max_depth.unwrap_or(defaults.max_depth),
                min_leaf_size: t.min_leaf_size.unwrap_or(defaults.min_leaf_size),
                learning_rate: t.learning_rate.unwrap_or(defaults.learning_rate),
            },
            None => defaults,
        }
    }

    fn validation(&self) -> (Option<usize>, Option<u64>, Option<bool>) {
        let v = self.validation.as_ref();
        (
            v.and_then(|v| v.n_splits),
            v.and_then(|v| v.seed),
            v.and_then(|v| v.shuffle),
        )
    }

    /// Resolves the prediction configuration.
    ///
    /// Hyperparameters start from `best` when it was tuned for the same model, target
    /// and features (otherwise from the library defaults for the model); values set in
    /// the `[model]` table or by `--alpha` override them one by one.
    pub fn merge_prediction(
        &self,
        args: &PredictArgs,
        best: Option<&BestParams>,
    ) -> Result<PredictionConfig> {
        let feature_names = self.feature_names(&args.input);
        let target = self.target(&args.input)?;
        let (n_splits, seed, shuffle) = self.validation();

        let kind = self.model_kind(&args.input)?;

        let tuned = best.and_then(|best| {
            if best.applies_to(kind, target, &feature_names) {
                Some(best.params)
            } else {
                warn!("Study parameters were tuned for another model, target or feature list; ignoring them.");
                None
            }
        });
        let base = match tuned {
            Some(params) => {
                info!(params = %params, "Using the tuned model parameters.");
                params
            }
            None => ModelParams::defaults_for(kind),
        };
        let model = self.overlay_model(base, args.alpha);

        PredictionConfigBuilder::new()
            .feature_names(feature_names)
            .target(target)
            .n_splits(
                args.input
                    .n_splits
                    .or(n_splits)
                    .unwrap_or(core_config::DEFAULT_N_SPLITS),
            )
            .shuffle(shuffle.unwrap_or(true))
            .seed(args.input.seed.or(seed).unwrap_or(core_config::DEFAULT_SEED))
            .model(model)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn merge_tuning(&self, args: &TuneArgs) -> Result<TuningConfig> {
        let (n_splits, seed, _) = self.validation();
        let tuning = self.tuning.as_ref();
        let (default_min, default_max) = core_config::DEFAULT_ALPHA_RANGE;

        TuningConfigBuilder::new()
            .feature_names(self.feature_names(&args.input))
            .target(self.target(&args.input)?)
            .n_splits(
                args.input
                    .n_splits
                    .or(n_splits)
                    .unwrap_or(core_config::DEFAULT_N_SPLITS),
            )
            .seed(args.input.seed.or(seed).unwrap_or(core_config::DEFAULT_SEED))
            .n_trials(
                args.n_trials
                    .or(tuning.and_then(|t| t.n_trials))
                    .unwrap_or(DEFAULT_N_TRIALS),
            )
            .model(self.model_kind(&args.input)?)
            .alpha_range(
                tuning.and_then(|t| t.alpha_min).unwrap_or(default_min),
                tuning.and_then(|t| t.alpha_max).unwrap_or(default_max),
            )
            .boosting_space(self.boosting_space())
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;
            let key = key.trim();
            let value_str = value_str.trim();

            match key {
                "bonds.max-atoms" => {
                    self.bonds.get_or_insert_with(Default::default).max_atoms =
                        Some(parse_value(key, value_str)?);
                }
                "bonds.min-distance" => {
                    self.bonds.get_or_insert_with(Default::default).min_distance =
                        Some(parse_value(key, value_str)?);
                }
                "bonds.fudge-factor" => {
                    self.bonds.get_or_insert_with(Default::default).fudge_factor =
                        Some(parse_value(key, value_str)?);
                }
                "features.names" => {
                    self.features.get_or_insert_with(Default::default).names = Some(
                        value_str
                            .split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(String::from)
                            .collect(),
                    );
                }
                "model.kind" => {
                    self.model.get_or_insert_with(Default::default).kind =
                        Some(value_str.to_string());
                }
                "model.iterations" => {
                    self.model.get_or_insert_with(Default::default).iterations =
                        Some(parse_value(key, value_str)?);
                }
                "model.max-depth" => {
                    self.model.get_or_insert_with(Default::default).max_depth =
                        Some(parse_value(key, value_str)?);
                }
                "model.min-leaf-size" => {
                    self.model.get_or_insert_with(Default::default).min_leaf_size =
                        Some(parse_value(key, value_str)?);
                }
                "model.learning-rate" => {
                    self.model.get_or_insert_with(Default::default).learning_rate =
                        Some(parse_value(key, value_str)?);
                }
                "model.alpha" => {
                    self.model.get_or_insert_with(Default::default).alpha =
                        Some(parse_value(key, value_str)?);
                }
                "model.target" => {
                    self.model.get_or_insert_with(Default::default).target =
                        Some(value_str.to_string());
                }
                "validation.n-splits" => {
                    self.validation.get_or_insert_with(Default::default).n_splits =
                        Some(parse_value(key, value_str)?);
                }
                "validation.seed" => {
                    self.validation.get_or_insert_with(Default::default).seed =
                        Some(parse_value(key, value_str)?);
                }
                "validation.shuffle" => {
                    self.validation.get_or_insert_with(Default::default).shuffle =
                        Some(parse_value(key, value_str)?);
                }
                "tuning.n-trials" => {
                    self.tuning.get_or_insert_with(Default::default).n_trials =
                        Some(parse_value(key, value_str)?);
                }
                "tuning.alpha-min" => {
                    self.tuning.get_or_insert_with(Default::default).alpha_min =
                        Some(parse_value(key, value_str)?);
                }
                "tuning.alpha-max" => {
                    self.tuning.get_or_insert_with(Default::default).alpha_max =
                        Some(parse_value(key, value_str)?);
                }
                "tuning.iterations" => {
                    self.tuning.get_or_insert_with(Default::default).iterations =
                        Some(parse_range(key, value_str)?);
                }
                "tuning.max-depth" => {
                    self.tuning.get_or_insert_with(Default::default).max_depth =
                        Some(parse_range(key, value_str)?);
                }
                "tuning.min-leaf-size" => {
                    self.tuning.get_or_insert_with(Default::default).min_leaf_size =
                        Some(parse_range(key, value_str)?);
                }
                "tuning.learning-rate" => {
                    self.tuning.get_or_insert_with(Default::default).learning_rate =
                        Some(parse_range(key, value_str)?);
                }
                "tuning.study" => {
                    self.tuning.get_or_insert_with(Default::default).study =
                        Some(PathBuf::from(value_str));
                }
                "data.nrows" => {
                    self.data.get_or_insert_with(Default::default).nrows =
                        Some(parse_value(key, value_str)?);
                }
                "data.cache-dir" => {
                    self.data.get_or_insert_with(Default::default).cache_dir =
                        Some(PathBuf::from(value_str));
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
            debug!("Applied --set override: {} = {}", key, value_str);
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid value for {}: '{}' ({} expected)",
            key,
            value,
            std::any::type_name::<T>()
        ))
    })
}

/// Parses an inclusive `MIN,MAX` range.
fn parse_range<T: FromStr>(key: &str, value: &str) -> Result<(T, T)> {
    let (min, max) = value.split_once(',').ok_or_else(|| {
        CliError::Config(format!(
            "Invalid range for {}: '{}' (MIN,MAX expected)",
            key, value
        ))
    })?;
    Ok((parse_value(key, min.trim())?, parse_value(key, max.trim())?))
}

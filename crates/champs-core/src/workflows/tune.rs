use super::predict::{TrainingSet, build_training_set, cross_validate};
use crate::core::models::pair::PairRow;
use crate::engine::config::{
    BoostingParams, BoostingSearchSpace, ModelKind, ModelParams, TargetColumn, TuningConfig,
};
use crate::engine::error::EngineError;
use crate::engine::features::FeatureRegistry;
use crate::engine::model::{KFold, build_regressor};
use crate::engine::progress::{Progress, ProgressReporter};
use rand::Rng;
use rand::SeedableRng;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, instrument, warn};

/// The best parameters found by a tuning study, as persisted in the study file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BestParams {
    /// Mean cross-validation score reached with `params` (lower is better).
    pub score: f64,
    pub target: String,
    pub features: Vec<String>,
    /// Total number of trials the study has evaluated.
    pub n_trials: usize,
    pub params: ModelParams,
}

impl BestParams {
    /// Whether these parameters were tuned for the given model, target and feature list.
    pub fn applies_to<S: AsRef<str>>(
        &self,
        kind: ModelKind,
        target: TargetColumn,
        features: &[S],
    ) -> bool {
        self.params.kind() == kind
            && self.target == target.name()
            && self.features.len() == features.len()
            && self
                .features
                .iter()
                .zip(features)
                .all(|(a, b)| a == b.as_ref())
    }

    fn same_setup(&self, other: &BestParams) -> bool {
        self.params.kind() == other.params.kind()
            && self.target == other.target
            && self.features == other.features
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trial {
    pub params: ModelParams,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TuningOutcome {
    pub trials: Vec<Trial>,
    pub best: BestParams,
}

/// Draws candidate parameters for one model family.
enum ParamSampler {
    Ridge {
        log_alpha: Uniform<f64>,
    },
    Boosting {
        iterations: Uniform<usize>,
        max_depth: Uniform<u32>,
        min_leaf_size: Uniform<usize>,
        log_learning_rate: Uniform<f64>,
    },
}

impl ParamSampler {
    fn new(config: &TuningConfig) -> Self {
        match config.model {
            ModelKind::Ridge => {
                let (min, max) = config.alpha_range;
                ParamSampler::Ridge {
                    log_alpha: Uniform::new_inclusive(min.ln(), max.ln()),
                }
            }
            ModelKind::GradientBoosting => {
                let BoostingSearchSpace {
                    iterations,
                    max_depth,
                    min_leaf_size,
                    learning_rate,
                } = config.boosting_space;
                ParamSampler::Boosting {
                    iterations: Uniform::new_inclusive(iterations.0, iterations.1),
                    max_depth: Uniform::new_inclusive(max_depth.0, max_depth.1),
                    min_leaf_size: Uniform::new_inclusive(min_leaf_size.0, min_leaf_size.1),
                    log_learning_rate: Uniform::new_inclusive(
                        learning_rate.0.ln(),
                        learning_rate.1.ln(),
                    ),
                }
            }
        }
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> ModelParams {
        match self {
            ParamSampler::Ridge { log_alpha } => ModelParams::Ridge {
                alpha: log_alpha.sample(rng).exp(),
            },
            ParamSampler::Boosting {
                iterations,
                max_depth,
                min_leaf_size,
                log_learning_rate,
            } => ModelParams::GradientBoosting(BoostingParams {
                iterations: iterations.sample(rng),
                max_depth: max_depth.sample(rng),
                min_leaf_size: min_leaf_size.sample(rng),
                // exp(ln x) can land a hair outside the bounds.
                learning_rate: log_learning_rate.sample(rng).exp().min(1.0),
            }),
        }
    }
}

fn score_params(
    training: &TrainingSet,
    kfold: &KFold,
    params: &ModelParams,
) -> Result<f64, EngineError> {
    let silent = ProgressReporter::new();
    Ok(cross_validate(training, None, kfold, || build_regressor(params), &silent)?.mean_score())
}

/// Random search over the hyperparameters of the configured model, scored by k-fold
/// cross-validation.
///
/// Ridge samples its penalty log-uniformly from `alpha_range`. Gradient boosting
/// samples round count, tree depth and leaf size uniformly and the learning rate
/// log-uniformly from `boosting_space`.
#[instrument(skip_all, name = "tuning_workflow")]
pub fn run(
    train: &[PairRow],
    config: &TuningConfig,
    registry: &FeatureRegistry,
    reporter: &ProgressReporter,
) -> Result<TuningOutcome, EngineError> {
    let features = registry.resolve(&config.feature_names)?;
    let (training, _) = reporter.phase("Feature extraction", || {
        build_training_set(train, &features, config.target)
    })?;

    let sampler = ParamSampler::new(config);
    let mut rng = StdRng::seed_from_u64(config.validation.seed);
    let kfold = KFold::from(&config.validation);

    info!(
        n_trials = config.n_trials,
        model = %config.model,
        "Starting parameter search."
    );
    reporter.report(Progress::PhaseStart { name: "Tuning" });
    reporter.report(Progress::TaskStart {
        total_steps: config.n_trials as u64,
    });

    let mut trials: Vec<Trial> = Vec::with_capacity(config.n_trials);
    let mut best_so_far = f64::INFINITY;
    for _ in 0..config.n_trials {
        let params = sampler.sample(&mut rng);
        let score = score_params(&training, &kfold, &params)?;
        info!(trial = trials.len() + 1, params = %params, score, "Trial finished.");
        trials.push(Trial { params, score });
        if score < best_so_far {
            best_so_far = score;
        }
        reporter.report(Progress::Message(format!(
            "trial {}/{}: {:.4} (best {:.4})",
            trials.len(),
            config.n_trials,
            score,
            best_so_far
        )));
        reporter.report(Progress::TaskIncrement);
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let best_trial = trials
        .iter()
        .copied()
        .filter(|t| !t.score.is_nan())
        .min_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| EngineError::Model("no trial produced a finite score".to_string()))?;
    let best = BestParams {
        score: best_trial.score,
        target: config.target.name().to_string(),
        features: config.feature_names.clone(),
        n_trials: trials.len(),
        params: best_trial.params,
    };
    info!(params = %best.params, score = best.score, "Parameter search complete.");
    Ok(TuningOutcome { trials, best })
}

fn study_error(path: &Path, message: impl Into<String>) -> EngineError {
    EngineError::Study {
        path: path.to_string_lossy().to_string(),
        message: message.into(),
    }
}

/// Reads the best parameters from a study file; `Ok(None)` if the file does not exist.
pub fn load_best_params(path: &Path) -> Result<Option<BestParams>, EngineError> {
    if !path.is_file() {
        info!(path = %path.display(), "There are no best parameters.");
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|e| study_error(path, e.to_string()))?;
    let params: BestParams =
        toml::from_str(&content).map_err(|e| study_error(path, e.to_string()))?;
    info!(path = %path.display(), params = %params.params, "Loading the best parameters.");
    Ok(Some(params))
}

pub fn save_best_params(path: &Path, params: &BestParams) -> Result<(), EngineError> {
    let content = toml::to_string_pretty(params).map_err(|e| study_error(path, e.to_string()))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| study_error(path, e.to_string()))?;
    }
    fs::write(path, content).map_err(|e| study_error(path, e.to_string()))
}

/// Merges a new search result into the study file and returns what the file now holds.
///
/// An existing entry for the same model, target and features survives if its score
/// is better; either way the trial count accumulates. Entries for any other setup are
/// replaced.
pub fn record_best_params(path: &Path, candidate: BestParams) -> Result<BestParams, EngineError> {
    let merged = match load_best_params(path)? {
        Some(existing) if existing.same_setup(&candidate) => {
            let n_trials = existing.n_trials + candidate.n_trials;
            let mut kept = if existing.score <= candidate.score {
                existing
            } else {
                candidate
            };
            kept.n_trials = n_trials;
            kept
        }
        Some(_) => {
            warn!("Study file holds parameters for another setup; replacing them.");
            candidate
        }
        None => candidate,
    };
    save_best_params(path, &merged)?;
    Ok(merged)
}

use crate::core::io::submission::SubmissionRow;
use crate::core::models::pair::PairRow;
use crate::engine::config::{PredictionConfig, TargetColumn};
use crate::engine::error::EngineError;
use crate::engine::features::{Feature, FeatureRegistry, extract_all};
use crate::engine::model::{DesignEncoder, KFold, Regressor, build_regressor, group_log_mae};
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::{DMatrix, DVector};
use tracing::{info, instrument};

/// Training rows encoded for a regressor, with the coupling type of each row for scoring.
pub(crate) struct TrainingSet {
    pub x: DMatrix<f64>,
    pub y: DVector<f64>,
    pub types: Vec<String>,
}

pub(crate) struct CrossValidation {
    pub fold_scores: Vec<f64>,
    /// Mean of the per-fold test predictions, when a test matrix was given.
    pub test_predictions: Option<DVector<f64>>,
}

impl CrossValidation {
    pub fn mean_score(&self) -> f64 {
        self.fold_scores.iter().sum::<f64>() / self.fold_scores.len() as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionOutcome {
    /// Group log-MAE of each validation fold.
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    /// One prediction per test row, in test order.
    pub test_predictions: Vec<f64>,
}

impl PredictionOutcome {
    /// Pairs each test prediction with the id of its test row.
    pub fn submission(&self, test: &[PairRow]) -> Vec<SubmissionRow> {
        test.iter()
            .zip(&self.test_predictions)
            .map(|(row, &prediction)| SubmissionRow {
                id: row.pair.id,
                scalar_coupling_constant: prediction,
            })
            .collect()
    }
}

/// Fits the configured model with k-fold cross-validation and predicts the test rows
/// with the average of the fold models.
#[instrument(skip_all, name = "prediction_workflow")]
pub fn run(
    train: &[PairRow],
    test: &[PairRow],
    config: &PredictionConfig,
    registry: &FeatureRegistry,
    reporter: &ProgressReporter,
) -> Result<PredictionOutcome, EngineError> {
    info!(
        train_rows = train.len(),
        test_rows = test.len(),
        target = %config.target,
        model = %config.model,
        "Starting prediction."
    );
    let features = registry.resolve(&config.feature_names)?;

    let (training, x_test) = reporter.phase("Feature extraction", || {
        let (training, encoder) = build_training_set(train, &features, config.target)?;
        let x_test = encoder.transform(&extract_all(&features, test), test.len())?;
        info!(
            columns = encoder.width(),
            "Encoded design matrices."
        );
        Ok::<_, EngineError>((training, x_test))
    })?;

    let kfold = KFold::from(&config.validation);
    let validation = cross_validate(
        &training,
        Some(&x_test),
        &kfold,
        || build_regressor(&config.model),
        reporter,
    )?;

    let mean_score = validation.mean_score();
    info!(score = mean_score, "Cross-validation complete.");
    Ok(PredictionOutcome {
        fold_scores: validation.fold_scores,
        mean_score,
        test_predictions: validation
            .test_predictions
            .map(|p| p.iter().copied().collect())
            .unwrap_or_default(),
    })
}

/// Reads the regression target of every training row.
///
/// # Errors
///
/// Returns [`EngineError::MalformedInput`] for a row without a finite target.
pub(crate) fn target_vector(rows: &[PairRow], target: TargetColumn) -> Result<DVector<f64>, EngineError> {
    let values = rows
        .iter()
        .map(|row| match target.value(row) {
            Some(value) if value.is_finite() => Ok(value),
            Some(_) => Err(EngineError::MalformedInput(format!(
                "training pair {} has a non-finite '{}'",
                row.pair.id, target
            ))),
            None => Err(EngineError::MalformedInput(format!(
                "training pair {} has no '{}' value",
                row.pair.id, target
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DVector::from_vec(values))
}

pub(crate) fn build_training_set(
    rows: &[PairRow],
    features: &[Box<dyn Feature>],
    target: TargetColumn,
) -> Result<(TrainingSet, DesignEncoder), EngineError> {
    let y = target_vector(rows, target)?;
    let columns = extract_all(features, rows);
    let encoder = DesignEncoder::fit(&columns)?;
    let x = encoder.transform(&columns, rows.len())?;
    let types = rows.iter().map(|r| r.pair.coupling_type.clone()).collect();
    Ok((TrainingSet { x, y, types }, encoder))
}

/// Runs k-fold cross-validation with a fresh model per fold.
pub(crate) fn cross_validate<R, F>(
    training: &TrainingSet,
    test: Option<&DMatrix<f64>>,
    kfold: &KFold,
    make_model: F,
    reporter: &ProgressReporter,
) -> Result<CrossValidation, EngineError>
where
    R: Regressor,
    F: Fn() -> R,
{
    let folds = kfold.split(training.y.len())?;

    reporter.report(Progress::PhaseStart {
        name: "Cross-validation",
    });
    reporter.report(Progress::TaskStart {
        total_steps: folds.len() as u64,
    });

    let mut fold_scores = Vec::with_capacity(folds.len());
    let mut prediction_sum = test.map(|x| DVector::zeros(x.nrows()));
    for (k, fold) in folds.iter().enumerate() {
        let mut model = make_model();
        model.fit(
            &training.x.select_rows(&fold.train),
            &training.y.select_rows(&fold.train),
        )?;

        let predicted = model.predict(&training.x.select_rows(&fold.valid))?;
        let actual: Vec<f64> = fold.valid.iter().map(|&i| training.y[i]).collect();
        let types: Vec<&str> = fold
            .valid
            .iter()
            .map(|&i| training.types[i].as_str())
            .collect();
        let score = group_log_mae(&types, &actual, predicted.as_slice());
        info!(fold = k + 1, score, "Fold scored.");
        fold_scores.push(score);
        reporter.report(Progress::Message(format!(
            "fold {}/{}: {:.4} (mean {:.4})",
            k + 1,
            folds.len(),
            score,
            fold_scores.iter().sum::<f64>() / fold_scores.len() as f64
        )));

        if let (Some(sum), Some(x_test)) = (prediction_sum.as_mut(), test) {
            *sum += model.predict(x_test)?;
        }
        reporter.report(Progress::TaskIncrement);
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let n_folds = folds.len() as f64;
    Ok(CrossValidation {
        fold_scores,
        test_predictions: prediction_sum.map(|sum| sum / n_folds),
    })
}

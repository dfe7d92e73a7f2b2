use super::regressor::{Regressor, check_prediction_width, check_training_shape};
use crate::engine::config::BoostingParams;
use crate::engine::error::EngineError;
use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec, ValueType};
use gbdt::gradient_boost::GBDT;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

const SQUARED_ERROR: &str = "SquaredError";

enum BoostingFit {
    /// Trees fitted to the centered target.
    Trees {
        model: GBDT,
        offset: f64,
        n_columns: usize,
    },
    /// A design matrix without columns can only predict the training mean.
    Constant(f64),
}

/// Gradient-boosted regression trees with squared-error loss.
///
/// Every row is used in every round and every tree sees every column, so a fit
/// depends only on the data and the parameters.
pub struct GradientBoostingRegressor {
    params: BoostingParams,
    fit: Option<BoostingFit>,
}

impl GradientBoostingRegressor {
    pub fn new(params: BoostingParams) -> Self {
        Self { params, fit: None }
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    fn tree_config(&self, n_columns: usize) -> Config {
        let mut config = Config::new();
        config.set_feature_size(n_columns);
        config.set_max_depth(self.params.max_depth);
        config.set_iterations(self.params.iterations);
        config.set_shrinkage(self.params.learning_rate as ValueType);
        config.set_min_leaf_size(self.params.min_leaf_size);
        config.set_loss(SQUARED_ERROR);
        config.set_data_sample_ratio(1.0);
        config.set_feature_sample_ratio(1.0);
        config.set_training_optimization_level(2);
        config.set_debug(false);
        config
    }
}

fn row_features(x: &DMatrix<f64>, row: usize) -> Vec<ValueType> {
    x.row(row).iter().map(|&v| v as ValueType).collect()
}

impl Regressor for GradientBoostingRegressor {
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), EngineError> {
        self.params
            .validate()
            .map_err(|e| EngineError::Model(e.to_string()))?;
        check_training_shape(x, y)?;

        let offset = y.mean();
        if x.ncols() == 0 {
            self.fit = Some(BoostingFit::Constant(offset));
            return Ok(());
        }

        let mut training: DataVec = (0..x.nrows())
            .map(|i| {
                Data::new_training_data(
                    row_features(x, i),
                    1.0,
                    (y[i] - offset) as ValueType,
                    None,
                )
            })
            .collect();
        let mut model = GBDT::new(&self.tree_config(x.ncols()));
        model.fit(&mut training);

        debug!(
            iterations = self.params.iterations,
            max_depth = self.params.max_depth,
            n_rows = x.nrows(),
            n_columns = x.ncols(),
            "Fitted gradient boosting regressor."
        );
        self.fit = Some(BoostingFit::Trees {
            model,
            offset,
            n_columns: x.ncols(),
        });
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, EngineError> {
        match &self.fit {
            None => Err(EngineError::Model("model has not been fitted".to_string())),
            Some(BoostingFit::Constant(value)) => {
                check_prediction_width(0, x)?;
                Ok(DVector::from_element(x.nrows(), *value))
            }
            Some(BoostingFit::Trees {
                model,
                offset,
                n_columns,
            }) => {
                check_prediction_width(*n_columns, x)?;
                if x.nrows() == 0 {
                    return Ok(DVector::zeros(0));
                }
                let rows: DataVec = (0..x.nrows())
                    .map(|i| Data::new_test_data(row_features(x, i), None))
                    .collect();
                let predicted = model.predict(&rows);
                Ok(DVector::from_iterator(
                    x.nrows(),
                    predicted.into_iter().map(|p| p as f64 + offset),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (DMatrix<f64>, DVector<f64>) {
        // y jumps from 10 to 30 at a = 5; b is noise.
        let rows: Vec<f64> = (0..10)
            .flat_map(|i| [i as f64, ((i * 7) % 3) as f64])
            .collect();
        let x = DMatrix::from_row_slice(10, 2, &rows);
        let y = DVector::from_iterator(10, (0..10).map(|i| if i < 5 { 10.0 } else { 30.0 }));
        (x, y)
    }

    fn params(iterations: usize) -> BoostingParams {
        BoostingParams {
            iterations,
            max_depth: 2,
            min_leaf_size: 1,
            learning_rate: 0.5,
        }
    }

    #[test]
    fn boosting_learns_a_step_function() {
        let (x, y) = step_data();
        let mut model = GradientBoostingRegressor::new(params(50));
        model.fit(&x, &y).unwrap();
        let predicted = model.predict(&x).unwrap();
        for (p, t) in predicted.iter().zip(y.iter()) {
            assert!((p - t).abs() < 0.5, "predicted {} for {}", p, t);
        }
    }

    #[test]
    fn one_round_separates_the_two_levels() {
        let (x, y) = step_data();
        let mut model = GradientBoostingRegressor::new(params(1));
        model.fit(&x, &y).unwrap();
        let predicted = model.predict(&x).unwrap();
        assert!(predicted[0] < 20.0 && predicted[0] > 10.0 - 1e-3);
        assert!(predicted[9] > 20.0 && predicted[9] < 30.0 + 1e-3);
    }

    #[test]
    fn large_leaves_fall_back_to_the_mean() {
        let (x, y) = step_data();
        let mut model = GradientBoostingRegressor::new(BoostingParams {
            min_leaf_size: 100,
            ..params(10)
        });
        model.fit(&x, &y).unwrap();
        for p in model.predict(&x).unwrap().iter() {
            assert!((p - 20.0).abs() < 1e-3);
        }
    }

    #[test]
    fn empty_design_predicts_the_mean() {
        let x = DMatrix::zeros(3, 0);
        let y = DVector::from_vec(vec![1.0, 2.0, 6.0]);
        let mut model = GradientBoostingRegressor::new(BoostingParams::default());
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), DVector::from_element(3, 3.0));
    }

    #[test]
    fn unfitted_or_mismatched_predictions_fail() {
        let (x, y) = step_data();
        let mut model = GradientBoostingRegressor::new(params(5));
        assert!(matches!(model.predict(&x), Err(EngineError::Model(_))));
        model.fit(&x, &y).unwrap();
        assert!(matches!(
            model.predict(&DMatrix::zeros(1, 3)),
            Err(EngineError::Model(_))
        ));
    }

    #[test]
    fn invalid_parameters_are_rejected_at_fit() {
        let (x, y) = step_data();
        let mut model = GradientBoostingRegressor::new(BoostingParams {
            iterations: 0,
            ..params(1)
        });
        assert!(matches!(model.fit(&x, &y), Err(EngineError::Model(_))));
    }
}

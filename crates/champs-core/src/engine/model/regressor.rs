use super::{GradientBoostingRegressor, RidgeRegressor};
use crate::engine::config::ModelParams;
use crate::engine::error::EngineError;
use nalgebra::{DMatrix, DVector};

/// A learning algorithm that maps a design matrix onto a numeric target.
pub trait Regressor {
    /// Fits the model, replacing any earlier fit.
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), EngineError>;

    /// Predicts one value per row of `x`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Model`] if the model has not been fitted or `x` has a
    /// different column count than the training matrix.
    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, EngineError>;
}

impl<R: Regressor + ?Sized> Regressor for Box<R> {
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), EngineError> {
        (**self).fit(x, y)
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, EngineError> {
        (**self).predict(x)
    }
}

/// Creates an unfitted model for `params`.
pub fn build_regressor(params: &ModelParams) -> Box<dyn Regressor> {
    match *params {
        ModelParams::GradientBoosting(boosting) => {
            Box::new(GradientBoostingRegressor::new(boosting))
        }
        ModelParams::Ridge { alpha } => Box::new(RidgeRegressor::new(alpha)),
    }
}

pub(crate) fn check_training_shape(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), EngineError> {
    if x.nrows() != y.len() {
        return Err(EngineError::Model(format!(
            "design matrix has {} rows but the target has {}",
            x.nrows(),
            y.len()
        )));
    }
    if x.nrows() == 0 {
        return Err(EngineError::Model("cannot fit on an empty table".to_string()));
    }
    Ok(())
}

pub(crate) fn check_prediction_width(expected: usize, x: &DMatrix<f64>) -> Result<(), EngineError> {
    if x.ncols() != expected {
        return Err(EngineError::Model(format!(
            "model was fitted on {} columns but got {}",
            expected,
            x.ncols()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::BoostingParams;

    #[test]
    fn factory_builds_the_requested_model() {
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let y = DVector::from_vec(vec![1.0, 3.0, 5.0, 7.0]);

        let mut ridge = build_regressor(&ModelParams::Ridge { alpha: 1e-9 });
        ridge.fit(&x, &y).unwrap();
        assert!((ridge.predict(&x).unwrap()[3] - 7.0).abs() < 1e-6);

        let params = BoostingParams {
            min_leaf_size: 1,
            ..BoostingParams::default()
        };
        let mut boosting = build_regressor(&ModelParams::GradientBoosting(params));
        boosting.fit(&x, &y).unwrap();
        assert_eq!(boosting.predict(&x).unwrap().len(), 4);
    }

    #[test]
    fn shape_checks_report_model_errors() {
        let x = DMatrix::<f64>::zeros(2, 3);
        assert!(check_training_shape(&x, &DVector::zeros(3)).is_err());
        assert!(check_training_shape(&DMatrix::zeros(0, 3), &DVector::zeros(0)).is_err());
        assert!(check_prediction_width(2, &x).is_err());
        assert!(check_prediction_width(3, &x).is_ok());
    }
}

use super::regressor::{Regressor, check_prediction_width, check_training_shape};
use crate::engine::error::EngineError;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
struct RidgeFit {
    coefficients: DVector<f64>,
    intercept: f64,
}

/// L2-regularized least squares with an unpenalized intercept.
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeRegressor {
    alpha: f64,
    fit: Option<RidgeFit>,
}

impl RidgeRegressor {
    pub fn new(alpha: f64) -> Self {
        Self { alpha, fit: None }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn coefficients(&self) -> Option<&DVector<f64>> {
        self.fit.as_ref().map(|fit| &fit.coefficients)
    }

    pub fn intercept(&self) -> Option<f64> {
        self.fit.as_ref().map(|fit| fit.intercept)
    }
}

impl Regressor for RidgeRegressor {
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), EngineError> {
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(EngineError::Model(format!(
                "ridge penalty must be positive, got {}",
                self.alpha
            )));
        }
        check_training_shape(x, y)?;

        let means = DVector::from_iterator(x.ncols(), x.column_iter().map(|c| c.mean()));
        let y_mean = y.mean();

        let mut centered = x.clone();
        for (mut column, &mean) in centered.column_iter_mut().zip(means.iter()) {
            for value in column.iter_mut() {
                *value -= mean;
            }
        }
        let y_centered = y.add_scalar(-y_mean);

        // (XᵀX + αI) β = Xᵀy on centered data; α > 0 keeps the system positive definite.
        let mut gram = centered.tr_mul(&centered);
        for i in 0..gram.nrows() {
            gram[(i, i)] += self.alpha;
        }
        let rhs = centered.tr_mul(&y_centered);
        let coefficients = if gram.nrows() == 0 {
            DVector::zeros(0)
        } else {
            gram.cholesky()
                .ok_or_else(|| {
                    EngineError::Model("normal equations are not positive definite".to_string())
                })?
                .solve(&rhs)
        };
        let intercept = y_mean - means.dot(&coefficients);

        debug!(
            alpha = self.alpha,
            n_rows = x.nrows(),
            n_columns = x.ncols(),
            intercept,
            "Fitted ridge regressor."
        );
        self.fit = Some(RidgeFit {
            coefficients,
            intercept,
        });
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, EngineError> {
        let fit = self
            .fit
            .as_ref()
            .ok_or_else(|| EngineError::Model("model has not been fitted".to_string()))?;
        check_prediction_width(fit.coefficients.len(), x)?;
        Ok((x * &fit.coefficients).add_scalar(fit.intercept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn linear_data() -> (DMatrix<f64>, DVector<f64>) {
        // y = 3 + 2 a - b
        let x = DMatrix::from_row_slice(
            5,
            2,
            &[0.0, 1.0, 1.0, 0.0, 2.0, 3.0, 3.0, 1.0, 4.0, 5.0],
        );
        let y = DVector::from_iterator(5, x.row_iter().map(|r| 3.0 + 2.0 * r[0] - r[1]));
        (x, y)
    }

    #[test]
    fn small_penalty_recovers_noiseless_linear_function() {
        let (x, y) = linear_data();
        let mut model = RidgeRegressor::new(1e-9);
        model.fit(&x, &y).unwrap();

        let coefficients = model.coefficients().unwrap();
        assert!((coefficients[0] - 2.0).abs() < EPS);
        assert!((coefficients[1] + 1.0).abs() < EPS);
        assert!((model.intercept().unwrap() - 3.0).abs() < EPS);

        let predicted = model.predict(&x).unwrap();
        for (p, t) in predicted.iter().zip(y.iter()) {
            assert!((p - t).abs() < EPS);
        }
    }

    #[test]
    fn large_penalty_shrinks_towards_the_mean() {
        let (x, y) = linear_data();
        let mut model = RidgeRegressor::new(1e12);
        model.fit(&x, &y).unwrap();
        let predicted = model.predict(&x).unwrap();
        for p in predicted.iter() {
            assert!((p - y.mean()).abs() < 1e-6);
        }
    }

    #[test]
    fn intercept_only_model_predicts_the_mean() {
        let x = DMatrix::zeros(3, 0);
        let y = DVector::from_vec(vec![1.0, 2.0, 6.0]);
        let mut model = RidgeRegressor::new(1.0);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), DVector::from_element(3, 3.0));
    }

    #[test]
    fn collinear_columns_still_solve() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        let y = DVector::from_vec(vec![2.0, 4.0, 6.0]);
        let mut model = RidgeRegressor::new(1e-3);
        assert!(model.fit(&x, &y).is_ok());
    }

    #[test]
    fn predicting_before_fitting_fails() {
        let model = RidgeRegressor::new(1.0);
        let result = model.predict(&DMatrix::zeros(1, 2));
        assert!(matches!(result, Err(EngineError::Model(_))));
    }

    #[test]
    fn column_count_mismatch_fails() {
        let (x, y) = linear_data();
        let mut model = RidgeRegressor::new(1.0);
        model.fit(&x, &y).unwrap();
        assert!(matches!(
            model.predict(&DMatrix::zeros(2, 3)),
            Err(EngineError::Model(_))
        ));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let (x, y) = linear_data();
        assert!(RidgeRegressor::new(0.0).fit(&x, &y).is_err());
        assert!(RidgeRegressor::new(f64::NAN).fit(&x, &y).is_err());
        let short = DVector::from_vec(vec![1.0]);
        assert!(RidgeRegressor::new(1.0).fit(&x, &short).is_err());
    }
}

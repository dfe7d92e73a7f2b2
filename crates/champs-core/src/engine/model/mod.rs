mod boosting;
mod design;
mod kfold;
mod metric;
mod regressor;
mod ridge;

pub use boosting::GradientBoostingRegressor;
pub use design::DesignEncoder;
pub use kfold::{Fold, KFold};
pub use metric::{MAE_FLOOR, group_log_mae};
pub use regressor::{Regressor, build_regressor};
pub use ridge::RidgeRegressor;

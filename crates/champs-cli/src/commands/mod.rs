pub mod predict;
pub mod preprocess;
pub mod tune;

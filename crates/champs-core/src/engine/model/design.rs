use crate::engine::error::EngineError;
use crate::engine::features::{ColumnData, FeatureColumn};
use itertools::Itertools;
use nalgebra::DMatrix;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
enum ColumnEncoder {
    /// Passes values through, replacing NaN with the training mean.
    Numeric { name: String, fill: f64 },
    /// One indicator column per training category, in sorted order.
    OneHot { name: String, categories: Vec<String> },
}

impl ColumnEncoder {
    fn name(&self) -> &str {
        match self {
            ColumnEncoder::Numeric { name, .. } | ColumnEncoder::OneHot { name, .. } => name,
        }
    }

    fn width(&self) -> usize {
        match self {
            ColumnEncoder::Numeric { .. } => 1,
            ColumnEncoder::OneHot { categories, .. } => categories.len(),
        }
    }
}

/// Turns feature columns into a dense numeric design matrix.
///
/// The encoder is fitted on the training columns once and then applied unchanged to
/// every other table, so training and test matrices always share their layout.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignEncoder {
    encoders: Vec<ColumnEncoder>,
}

impl DesignEncoder {
    /// Learns fill values and category vocabularies from the training columns.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MalformedInput`] if two columns share a name or the
    /// columns differ in length.
    pub fn fit(columns: &[FeatureColumn]) -> Result<Self, EngineError> {
        check_columns(columns)?;
        let encoders = columns
            .iter()
            .map(|column| match &column.data {
                ColumnData::Numeric(values) => ColumnEncoder::Numeric {
                    name: column.name.clone(),
                    fill: nan_mean(values),
                },
                ColumnData::Categorical(values) => ColumnEncoder::OneHot {
                    name: column.name.clone(),
                    categories: values.iter().sorted().dedup().cloned().collect(),
                },
            })
            .collect();
        Ok(Self { encoders })
    }

    /// Number of matrix columns produced by [`transform`](Self::transform).
    pub fn width(&self) -> usize {
        self.encoders.iter().map(ColumnEncoder::width).sum()
    }

    /// Names of the matrix columns; one-hot columns are named `<column>=<category>`.
    pub fn column_names(&self) -> Vec<String> {
        self.encoders
            .iter()
            .flat_map(|encoder| match encoder {
                ColumnEncoder::Numeric { name, .. } => vec![name.clone()],
                ColumnEncoder::OneHot { name, categories } => categories
                    .iter()
                    .map(|category| format!("{}={}", name, category))
                    .collect(),
            })
            .collect()
    }

    /// Encodes `columns` (which must match the fitted columns by name, kind and order)
    /// into an `n_rows x width` matrix.
    pub fn transform(
        &self,
        columns: &[FeatureColumn],
        n_rows: usize,
    ) -> Result<DMatrix<f64>, EngineError> {
        check_columns(columns)?;
        if columns.len() != self.encoders.len() {
            return Err(EngineError::MalformedInput(format!(
                "expected {} feature columns, got {}",
                self.encoders.len(),
                columns.len()
            )));
        }

        let mut matrix = DMatrix::zeros(n_rows, self.width());
        let mut offset = 0;
        for (encoder, column) in self.encoders.iter().zip(columns) {
            if encoder.name() != column.name || column.len() != n_rows {
                return Err(EngineError::MalformedInput(format!(
                    "feature column '{}' ({} rows) does not match fitted column '{}' ({} rows expected)",
                    column.name,
                    column.len(),
                    encoder.name(),
                    n_rows
                )));
            }
            match (encoder, &column.data) {
                (ColumnEncoder::Numeric { fill, .. }, ColumnData::Numeric(values)) => {
                    for (row, &value) in values.iter().enumerate() {
                        matrix[(row, offset)] = if value.is_nan() { *fill } else { value };
                    }
                }
                (ColumnEncoder::OneHot { categories, .. }, ColumnData::Categorical(values)) => {
                    for (row, value) in values.iter().enumerate() {
                        if let Ok(index) = categories.binary_search(value) {
                            matrix[(row, offset + index)] = 1.0;
                        }
                    }
                }
                _ => {
                    return Err(EngineError::MalformedInput(format!(
                        "feature column '{}' changed kind between tables",
                        column.name
                    )));
                }
            }
            offset += encoder.width();
        }
        Ok(matrix)
    }
}

fn check_columns(columns: &[FeatureColumn]) -> Result<(), EngineError> {
    let mut names = HashSet::new();
    if let Some(duplicate) = columns.iter().find(|c| !names.insert(c.name.as_str())) {
        return Err(EngineError::MalformedInput(format!(
            "duplicate feature column '{}'",
            duplicate.name
        )));
    }
    if !columns.iter().map(FeatureColumn::len).all_equal() {
        return Err(EngineError::MalformedInput(
            "feature columns differ in length".to_string(),
        ));
    }
    Ok(())
}

/// Mean of the non-NaN values, or 0 if there are none.
fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

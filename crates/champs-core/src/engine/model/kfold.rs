use crate::engine::config::{ConfigError, CrossValidationConfig};
use crate::engine::error::EngineError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// One train/validation split; both index lists are sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub valid: Vec<usize>,
}

/// K-fold splitter. Validation folds are disjoint and together cover every row once;
/// the first `n % k` folds hold one extra row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KFold {
    n_splits: usize,
    shuffle: bool,
    seed: u64,
}

impl KFold {
    pub fn new(n_splits: usize, shuffle: bool, seed: u64) -> Self {
        Self {
            n_splits,
            shuffle,
            seed,
        }
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    pub fn split(&self, n_rows: usize) -> Result<Vec<Fold>, EngineError> {
        let invalid = |reason: String| {
            EngineError::Config(ConfigError::InvalidParameter {
                name: "n_splits",
                reason,
            })
        };
        if self.n_splits < 2 {
            return Err(invalid(format!(
                "k-fold needs at least 2 splits, got {}",
                self.n_splits
            )));
        }
        if self.n_splits > n_rows {
            return Err(invalid(format!(
                "cannot split {} rows into {} folds",
                n_rows, self.n_splits
            )));
        }

        let mut order: Vec<usize> = (0..n_rows).collect();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed);
            order.shuffle(&mut rng);
        }

        let base = n_rows / self.n_splits;
        let extra = n_rows % self.n_splits;
        let mut start = 0;
        let mut folds = Vec::with_capacity(self.n_splits);
        for k in 0..self.n_splits {
            let size = base + usize::from(k < extra);
            let mut in_valid = vec![false; n_rows];
            for &row in &order[start..start + size] {
                in_valid[row] = true;
            }
            let (valid, train): (Vec<usize>, Vec<usize>) =
                (0..n_rows).partition(|&row| in_valid[row]);
            folds.push(Fold { train, valid });
            start += size;
        }
        Ok(folds)
    }
}

impl From<&CrossValidationConfig> for KFold {
    fn from(config: &CrossValidationConfig) -> Self {
        Self::new(config.n_splits, config.shuffle, config.seed)
    }
}

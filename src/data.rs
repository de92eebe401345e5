//! Supervised datasets.
//!
//! A [`Dataset`] is a validated ordered collection of `(input, target)`
//! column-vector pairs. The order matters: training applies one stochastic
//! update per example in exactly the order stored here.

use crate::{Error, Matrix, Result};

#[derive(Debug, Clone)]
pub struct Dataset {
    pairs: Vec<(Matrix, Matrix)>,
    input_dim: usize,
    target_dim: usize,
}

impl Dataset {
    /// Build a dataset from `(input, target)` pairs.
    ///
    /// Every input and target must be a column vector, and all pairs must
    /// share the same input and target heights.
    pub fn from_pairs(pairs: Vec<(Matrix, Matrix)>) -> Result<Self> {
        let (first_input, first_target) = pairs
            .first()
            .ok_or_else(|| Error::InvalidData("dataset must not be empty".to_owned()))?;

        let input_dim = first_input.rows();
        let target_dim = first_target.rows();

        for (i, (input, target)) in pairs.iter().enumerate() {
            if !input.is_column_vector() {
                return Err(Error::InvalidData(format!(
                    "input {i} has format {:?}, expected a column vector",
                    input.format()
                )));
            }
            if !target.is_column_vector() {
                return Err(Error::InvalidData(format!(
                    "target {i} has format {:?}, expected a column vector",
                    target.format()
                )));
            }
            if input.rows() != input_dim {
                return Err(Error::InvalidData(format!(
                    "input {i} has height {}, expected {input_dim}",
                    input.rows()
                )));
            }
            if target.rows() != target_dim {
                return Err(Error::InvalidData(format!(
                    "target {i} has height {}, expected {target_dim}",
                    target.rows()
                )));
            }
        }

        Ok(Self {
            pairs,
            input_dim,
            target_dim,
        })
    }

    /// Convenience constructor from nested rows of scalars.
    pub fn from_rows(inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<Self> {
        if inputs.len() != targets.len() {
            return Err(Error::InvalidData(format!(
                "inputs/targets length mismatch: {} vs {}",
                inputs.len(),
                targets.len()
            )));
        }

        let mut pairs = Vec::with_capacity(inputs.len());
        for (input, target) in inputs.iter().zip(targets) {
            let input_rows: Vec<Vec<f64>> = input.iter().map(|&x| vec![x]).collect();
            let target_rows: Vec<Vec<f64>> = target.iter().map(|&x| vec![x]).collect();
            pairs.push((
                Matrix::from_rows(&input_rows)
                    .map_err(|e| Error::InvalidData(format!("bad input row: {e}")))?,
                Matrix::from_rows(&target_rows)
                    .map_err(|e| Error::InvalidData(format!("bad target row: {e}")))?,
            ));
        }
        Self::from_pairs(pairs)
    }

    /// Returns the number of examples.
    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if there are no examples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Height of every input column vector.
    #[inline]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Height of every target column vector.
    #[inline]
    pub fn target_dim(&self) -> usize {
        self.target_dim
    }

    /// The `idx`-th `(input, target)` pair.
    ///
    /// Panics if `idx >= len`.
    #[inline]
    pub fn pair(&self, idx: usize) -> (&Matrix, &Matrix) {
        let (input, target) = &self.pairs[idx];
        (input, target)
    }

    /// Iterate over `(input, target)` pairs in dataset order.
    pub fn iter(&self) -> impl Iterator<Item = (&Matrix, &Matrix)> {
        self.pairs.iter().map(|(i, t)| (i, t))
    }
}

//! Dense 2-D matrices.
//!
//! `Matrix` is the sole numeric currency of the crate: activations, weights,
//! biases, and gradients are all matrices (column vectors are matrices with
//! one column).
//!
//! Conventions:
//! - Storage is row-major and flat; the shape is a `(rows, cols)` format.
//! - Element access is 1-based, following the mathematical convention. Valid
//!   indices are `[1, rows] x [1, cols]`.
//! - All arithmetic is pure and returns a fresh matrix; `set_entry` is the
//!   only in-place mutator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{linalg, Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    /// Row-major, `rows * cols` entries.
    entries: Vec<f64>,
}

impl Matrix {
    /// Build a matrix from nested rows.
    ///
    /// Ragged rows are right-padded with zeros to the longest observed row;
    /// nothing is ever truncated. A completely empty input (no rows, or all
    /// rows empty) is rejected.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::InvalidConstruction(
                "cannot build a matrix from zero rows".to_owned(),
            ));
        }

        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        if cols == 0 {
            return Err(Error::InvalidConstruction(
                "cannot build a matrix from empty rows".to_owned(),
            ));
        }

        let mut entries = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            entries.extend_from_slice(row);
            entries.extend(std::iter::repeat(0.0).take(cols - row.len()));
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            entries,
        })
    }

    /// An `n x p` matrix of zeros.
    pub fn zero(n: usize, p: usize) -> Result<Self> {
        if n < 1 || p < 1 {
            return Err(Error::InvalidConstruction(format!(
                "matrix dimensions must be >= 1, got ({n}, {p})"
            )));
        }
        Ok(Self {
            rows: n,
            cols: p,
            entries: vec![0.0; n * p],
        })
    }

    /// An `n x p` matrix with entries drawn i.i.d. uniformly from `[lo, hi]`.
    pub fn randomize(n: usize, p: usize, lo: f64, hi: f64) -> Result<Self> {
        Self::randomize_with_rng(n, p, lo, hi, &mut rand::thread_rng())
    }

    /// Deterministic variant of [`Matrix::randomize`].
    pub fn randomize_with_seed(n: usize, p: usize, lo: f64, hi: f64, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::randomize_with_rng(n, p, lo, hi, &mut rng)
    }

    /// Uniform random matrix using the provided RNG.
    pub fn randomize_with_rng<R: Rng + ?Sized>(
        n: usize,
        p: usize,
        lo: f64,
        hi: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
            return Err(Error::InvalidConstruction(format!(
                "randomize bounds must be finite with lo <= hi, got [{lo}, {hi}]"
            )));
        }

        let mut m = Self::zero(n, p)?;
        for entry in &mut m.entries {
            *entry = rng.gen_range(lo..=hi);
        }
        Ok(m)
    }

    /// The `(rows, cols)` format.
    #[inline]
    pub fn format(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether this matrix is a column vector (exactly one column).
    #[inline]
    pub fn is_column_vector(&self) -> bool {
        self.cols == 1
    }

    #[inline]
    fn validate_indices(&self, i: usize, j: usize) -> Result<()> {
        if i < 1 || i > self.rows {
            return Err(Error::IndexOutOfRange(format!(
                "row index {i} is outside [1, {}]",
                self.rows
            )));
        }
        if j < 1 || j > self.cols {
            return Err(Error::IndexOutOfRange(format!(
                "column index {j} is outside [1, {}]",
                self.cols
            )));
        }
        Ok(())
    }

    /// The entry at row `i`, column `j` (1-based).
    #[inline]
    pub fn get_entry(&self, i: usize, j: usize) -> Result<f64> {
        self.validate_indices(i, j)?;
        Ok(self.entries[(i - 1) * self.cols + (j - 1)])
    }

    /// Overwrite the entry at row `i`, column `j` (1-based).
    #[inline]
    pub fn set_entry(&mut self, value: f64, i: usize, j: usize) -> Result<()> {
        self.validate_indices(i, j)?;
        self.entries[(i - 1) * self.cols + (j - 1)] = value;
        Ok(())
    }

    /// A fresh copy of row `i` (1-based).
    pub fn row(&self, i: usize) -> Result<Vec<f64>> {
        self.validate_indices(i, 1)?;
        let start = (i - 1) * self.cols;
        Ok(self.entries[start..start + self.cols].to_vec())
    }

    /// A fresh copy of column `j` (1-based).
    pub fn column(&self, j: usize) -> Result<Vec<f64>> {
        self.validate_indices(1, j)?;
        Ok((0..self.rows)
            .map(|r| self.entries[r * self.cols + (j - 1)])
            .collect())
    }

    /// The transposed matrix. Applying it twice gives back the original.
    pub fn transpose(&self) -> Self {
        let mut entries = vec![0.0; self.entries.len()];
        for r in 0..self.rows {
            for c in 0..self.cols {
                entries[c * self.rows + r] = self.entries[r * self.cols + c];
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            entries,
        }
    }

    #[inline]
    fn require_same_format(&self, other: &Self, op: &str) -> Result<()> {
        if self.format() != other.format() {
            return Err(Error::ShapeMismatch(format!(
                "cannot {op} matrices of formats {:?} and {:?}",
                self.format(),
                other.format()
            )));
        }
        Ok(())
    }

    /// Element-wise sum. Both operands must share the same format.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.require_same_format(other, "add")?;
        Ok(self.zip_with(other, |a, b| a + b))
    }

    /// Element-wise difference. Both operands must share the same format.
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.require_same_format(other, "subtract")?;
        Ok(self.zip_with(other, |a, b| a - b))
    }

    /// Element-wise (Hadamard) product. Both operands must share the same format.
    pub fn hadamard(&self, other: &Self) -> Result<Self> {
        self.require_same_format(other, "multiply element-wise")?;
        Ok(self.zip_with(other, |a, b| a * b))
    }

    /// Standard matrix product.
    ///
    /// Requires `self.cols == other.rows`; the result has format
    /// `(self.rows, other.cols)`. Each entry is the dot product of a row of
    /// `self` with a column of `other`.
    pub fn matmul(&self, other: &Self) -> Result<Self> {
        if self.cols != other.rows {
            return Err(Error::ShapeMismatch(format!(
                "cannot multiply {:?} by {:?}: inner dimensions differ ({} != {})",
                self.format(),
                other.format(),
                self.cols,
                other.rows
            )));
        }

        let mut out = Self::zero(self.rows, other.cols)?;
        for i in 1..=self.rows {
            let row = self.row(i)?;
            for j in 1..=other.cols {
                let col = other.column(j)?;
                out.set_entry(linalg::dot(&row, &col)?, i, j)?;
            }
        }
        Ok(out)
    }

    /// Every entry multiplied by `scalar`. No shape constraint.
    pub fn scale(&self, scalar: f64) -> Self {
        self.map(|x| scalar * x)
    }

    /// Every entry divided by `scalar`.
    ///
    /// Fails if the divisor is zero or non-finite.
    pub fn scalar_div(&self, scalar: f64) -> Result<Self> {
        if !scalar.is_finite() || scalar == 0.0 {
            return Err(Error::TypeMismatch(format!(
                "can only divide by a finite nonzero scalar, got {scalar}"
            )));
        }
        Ok(self.map(|x| x / scalar))
    }

    /// Apply `f` to every entry, returning a new matrix of the same format.
    ///
    /// This is the element-wise lift used by the activation registry.
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            entries: self.entries.iter().map(|&x| f(x)).collect(),
        }
    }

    #[inline]
    fn zip_with<F: Fn(f64, f64) -> f64>(&self, other: &Self, f: F) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            entries: self
                .entries
                .iter()
                .zip(&other.entries)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    /// Sum of every entry.
    #[inline]
    pub fn sum(&self) -> f64 {
        self.entries.iter().sum()
    }

    /// Maximum entry.
    #[inline]
    pub(crate) fn max_entry(&self) -> f64 {
        self.entries.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Flat row-major view of the entries.
    #[inline]
    pub fn entries(&self) -> &[f64] {
        &self.entries
    }

    /// The entry grid as nested rows (the persisted representation).
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows)
            .map(|r| self.entries[r * self.cols..(r + 1) * self.cols].to_vec())
            .collect()
    }
}

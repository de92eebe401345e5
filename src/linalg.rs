//! Vector primitives shared by the matrix layer.

use crate::{Error, Result};

/// Dot product of two vectors.
///
/// Fails if either slice is empty or the lengths differ. The sum is exact in
/// the sense that no partial result is returned on error.
#[inline]
pub fn dot(u: &[f64], v: &[f64]) -> Result<f64> {
    if u.is_empty() || v.is_empty() {
        return Err(Error::ShapeMismatch("cannot dot empty vectors".to_owned()));
    }
    if u.len() != v.len() {
        return Err(Error::ShapeMismatch(format!(
            "cannot dot vectors of lengths {} and {}",
            u.len(),
            v.len()
        )));
    }

    let mut acc = 0.0_f64;
    for (&x, &y) in u.iter().zip(v) {
        acc = x.mul_add(y, acc);
    }
    Ok(acc)
}

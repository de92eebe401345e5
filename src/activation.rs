//! Activation functions.
//!
//! Each activation is a scalar function paired with its derivative; both are
//! lifted element-wise over [`Matrix`] via [`Matrix::map`]. The registry is a
//! closed enum resolved by name (`"sigmoid"`, `"ReLU"`, `"linear"`,
//! `"tanh"`), which is also the name written into persisted models.
//!
//! Derivatives are taken with respect to the pre-activation `z`, because
//! backprop evaluates them on the cached pre-activation vectors.

use crate::{Error, Matrix, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Element-wise activation function.
pub enum Activation {
    Sigmoid,
    ReLU,
    Linear,
    Tanh,
}

impl Activation {
    /// Resolve an activation by its registry name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "sigmoid" => Ok(Activation::Sigmoid),
            "ReLU" => Ok(Activation::ReLU),
            "linear" => Ok(Activation::Linear),
            "tanh" => Ok(Activation::Tanh),
            other => Err(Error::UnknownActivation(format!(
                "no activation named {other:?}; expected one of \
                 \"sigmoid\", \"ReLU\", \"linear\", \"tanh\""
            ))),
        }
    }

    /// The registry name, as written into persisted models.
    pub fn name(self) -> &'static str {
        match self {
            Activation::Sigmoid => "sigmoid",
            Activation::ReLU => "ReLU",
            Activation::Linear => "linear",
            Activation::Tanh => "tanh",
        }
    }

    #[inline]
    pub fn forward(self, z: f64) -> f64 {
        match self {
            Activation::Sigmoid => sigmoid(z),
            Activation::ReLU => z.max(0.0),
            Activation::Linear => z,
            Activation::Tanh => z.tanh(),
        }
    }

    /// Derivative with respect to the pre-activation `z`.
    #[inline]
    pub fn derivative(self, z: f64) -> f64 {
        match self {
            Activation::Sigmoid => {
                let s = sigmoid(z);
                s * (1.0 - s)
            }
            Activation::ReLU => {
                if z > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Linear => 1.0,
            Activation::Tanh => {
                let t = z.tanh();
                1.0 - t * t
            }
        }
    }

    /// Apply the activation to every entry of `m`.
    #[inline]
    pub fn map(self, m: &Matrix) -> Matrix {
        m.map(|z| self.forward(z))
    }

    /// Apply the derivative to every entry of `m`.
    #[inline]
    pub fn map_derivative(self, m: &Matrix) -> Matrix {
        m.map(|z| self.derivative(z))
    }
}

/// Turn a column vector into a probability distribution.
///
/// Numerically stable: the maximum entry is subtracted before exponentiating,
/// so inputs of large magnitude do not overflow. The output entries lie in
/// `[0, 1]` and sum to 1 up to floating-point rounding.
pub fn softmax(m: &Matrix) -> Result<Matrix> {
    if !m.is_column_vector() {
        return Err(Error::InvalidShapeForOperation(format!(
            "softmax requires a column vector, got format {:?}",
            m.format()
        )));
    }

    let max = m.max_entry();
    let exponentials = m.map(|z| (z - max).exp());
    let total = exponentials.sum();
    exponentials.scalar_div(total)
}

#[inline]
fn sigmoid(z: f64) -> f64 {
    // Numerically stable sigmoid.
    if z >= 0.0 {
        let e = (-z).exp();
        1.0 / (1.0 + e)
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

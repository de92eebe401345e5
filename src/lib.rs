//! A from-scratch dense matrix algebra layer and multilayer perceptron trainer.
//!
//! The crate is built around a single numeric currency: [`Matrix`], a dense
//! 2-D `f64` container with 1-based element access and pure arithmetic.
//! [`MultiLayerPerceptron`] composes matrices with the activation registry to
//! implement forward propagation, reverse-mode backpropagation, online
//! stochastic gradient descent, MSE loss evaluation, and JSON persistence.
//!
//! # Design notes
//!
//! - Shapes are validated at every API boundary; shape errors are `Result`s,
//!   never panics.
//! - All matrix arithmetic is pure (a new matrix is returned); the only
//!   mutations are `Matrix::set_entry` and the MLP's in-place weight/bias
//!   update during training.
//! - Training is deliberately online: one update per example, in dataset
//!   order. Reordering examples changes the numeric trajectory.
//! - The core is single-threaded and synchronous; a training run owns
//!   exclusive mutable access to its model.
//!
//! # Quick start
//!
//! ```rust
//! use dense_mlp::{Activation, Dataset, MultiLayerPerceptron, TrainConfig};
//!
//! # fn main() -> dense_mlp::Result<()> {
//! let data = Dataset::from_rows(
//!     &[vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]],
//!     &[vec![0.0], vec![1.0], vec![1.0]],
//! )?;
//!
//! let mut mlp = MultiLayerPerceptron::new_with_seed(
//!     vec![2, 4, 1],
//!     Activation::Sigmoid,
//!     Activation::Sigmoid,
//!     0,
//! )?;
//!
//! let report = mlp.train(&data, &data, &TrainConfig {
//!     epochs: 50,
//!     learning_rate: 0.5,
//!     ..TrainConfig::default()
//! })?;
//! assert_eq!(report.train_losses.len(), 50);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod data;
pub mod error;
pub mod linalg;
pub mod matrix;
pub mod mlp;
pub mod serde_model;
pub mod train;

pub use activation::{softmax, Activation};
pub use data::Dataset;
pub use error::{Error, Result};
pub use matrix::Matrix;
pub use mlp::{ForwardPass, Gradients, MultiLayerPerceptron};
pub use serde_model::SerializedMlp;
pub use train::{LrSchedule, TrainConfig, TrainReport};

//! The multilayer perceptron.
//!
//! A network is described by a `structure` of layer widths. For widths
//! `[n_0, n_1, ..., n_L]` there are `L` layer transitions; transition `l`
//! owns a weight matrix of format `(n_{l+1}, n_l)` and a bias column vector
//! of format `(n_{l+1}, 1)`.
//!
//! One training pass over a single example runs: forward propagation
//! (recording activation and pre-activation histories), reverse-mode error
//! computation layer by layer, then an immediate in-place weight/bias update.
//! Histories are recomputed on every call; nothing is cached across calls.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Activation, Dataset, Error, Matrix, Result};

#[derive(Debug, Clone)]
pub struct MultiLayerPerceptron {
    structure: Vec<usize>,
    weights: Vec<Matrix>,
    biases: Vec<Matrix>,
    hidden_activation: Activation,
    output_activation: Activation,
}

/// The full history of one forward pass.
///
/// `activations` has one entry per layer including the input
/// (`structure.len()` total); `pre_activations` has one entry per layer
/// transition (`structure.len() - 1` total).
#[derive(Debug, Clone)]
pub struct ForwardPass {
    activations: Vec<Matrix>,
    pre_activations: Vec<Matrix>,
}

impl ForwardPass {
    /// The network output: the final activation.
    #[inline]
    pub fn output(&self) -> &Matrix {
        self.activations
            .last()
            .expect("forward pass must record at least the input activation")
    }

    #[inline]
    pub fn activations(&self) -> &[Matrix] {
        &self.activations
    }

    #[inline]
    pub fn pre_activations(&self) -> &[Matrix] {
        &self.pre_activations
    }
}

/// Per-transition parameter gradients produced by one backward pass.
#[derive(Debug, Clone)]
pub struct Gradients {
    pub d_weights: Vec<Matrix>,
    pub d_biases: Vec<Matrix>,
}

impl MultiLayerPerceptron {
    /// Build a network with weights and biases drawn uniformly from `[-1, 1]`.
    pub fn new(
        structure: Vec<usize>,
        hidden_activation: Activation,
        output_activation: Activation,
    ) -> Result<Self> {
        Self::new_with_rng(
            structure,
            hidden_activation,
            output_activation,
            &mut rand::thread_rng(),
        )
    }

    /// Deterministic variant of [`MultiLayerPerceptron::new`].
    pub fn new_with_seed(
        structure: Vec<usize>,
        hidden_activation: Activation,
        output_activation: Activation,
        seed: u64,
    ) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new_with_rng(structure, hidden_activation, output_activation, &mut rng)
    }

    /// Build a network using the provided RNG for initialization.
    pub fn new_with_rng<R: Rng + ?Sized>(
        structure: Vec<usize>,
        hidden_activation: Activation,
        output_activation: Activation,
        rng: &mut R,
    ) -> Result<Self> {
        validate_structure(&structure)?;

        let mut weights = Vec::with_capacity(structure.len() - 1);
        let mut biases = Vec::with_capacity(structure.len() - 1);
        for w in structure.windows(2) {
            let (in_dim, out_dim) = (w[0], w[1]);
            weights.push(Matrix::randomize_with_rng(out_dim, in_dim, -1.0, 1.0, rng)?);
            biases.push(Matrix::randomize_with_rng(out_dim, 1, -1.0, 1.0, rng)?);
        }

        Ok(Self {
            structure,
            weights,
            biases,
            hidden_activation,
            output_activation,
        })
    }

    /// Rebuild a network from explicit parameter matrices.
    ///
    /// Every matrix format is validated against `structure`; this is the
    /// entry point used when loading a persisted model.
    pub fn from_parts(
        structure: Vec<usize>,
        hidden_activation: Activation,
        output_activation: Activation,
        weights: Vec<Matrix>,
        biases: Vec<Matrix>,
    ) -> Result<Self> {
        validate_structure(&structure)?;

        let transitions = structure.len() - 1;
        if weights.len() != transitions || biases.len() != transitions {
            return Err(Error::InvalidData(format!(
                "expected {transitions} weight and bias matrices, got {} and {}",
                weights.len(),
                biases.len()
            )));
        }

        for (l, w) in weights.iter().enumerate() {
            let expected = (structure[l + 1], structure[l]);
            if w.format() != expected {
                return Err(Error::InvalidData(format!(
                    "weight matrix {l} has format {:?}, expected {expected:?}",
                    w.format()
                )));
            }
        }
        for (l, b) in biases.iter().enumerate() {
            let expected = (structure[l + 1], 1);
            if b.format() != expected {
                return Err(Error::InvalidData(format!(
                    "bias matrix {l} has format {:?}, expected {expected:?}",
                    b.format()
                )));
            }
        }

        Ok(Self {
            structure,
            weights,
            biases,
            hidden_activation,
            output_activation,
        })
    }

    #[inline]
    pub fn structure(&self) -> &[usize] {
        &self.structure
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.structure.len()
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.structure[0]
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.structure[self.structure.len() - 1]
    }

    #[inline]
    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    #[inline]
    pub fn biases(&self) -> &[Matrix] {
        &self.biases
    }

    #[inline]
    pub fn hidden_activation(&self) -> Activation {
        self.hidden_activation
    }

    #[inline]
    pub fn output_activation(&self) -> Activation {
        self.output_activation
    }

    fn validate_input(&self, input: &Matrix) -> Result<()> {
        if !input.is_column_vector() || input.rows() != self.input_dim() {
            return Err(Error::InvalidShapeForOperation(format!(
                "input must be a column vector of height {}, got format {:?}",
                self.input_dim(),
                input.format()
            )));
        }
        Ok(())
    }

    fn validate_expected(&self, expected: &Matrix) -> Result<()> {
        if !expected.is_column_vector() || expected.rows() != self.output_dim() {
            return Err(Error::InvalidShapeForOperation(format!(
                "expected output must be a column vector of height {}, got format {:?}",
                self.output_dim(),
                expected.format()
            )));
        }
        Ok(())
    }

    /// Feed an input column vector through the network.
    ///
    /// For each transition `l`: `Z_l = W_l * A_{l-1} + B_l`, then the hidden
    /// activation for all but the last transition and the output activation
    /// for the last. The returned [`ForwardPass`] carries the complete
    /// histories required by backpropagation.
    pub fn forward_propagate(&self, input: &Matrix) -> Result<ForwardPass> {
        self.validate_input(input)?;

        let transitions = self.weights.len();
        let mut activations = Vec::with_capacity(transitions + 1);
        let mut pre_activations = Vec::with_capacity(transitions);
        activations.push(input.clone());

        for (l, (w, b)) in self.weights.iter().zip(&self.biases).enumerate() {
            let z = w.matmul(&activations[l])?.add(b)?;
            let a = if l + 1 < transitions {
                self.hidden_activation.map(&z)
            } else {
                self.output_activation.map(&z)
            };
            pre_activations.push(z);
            activations.push(a);
        }

        Ok(ForwardPass {
            activations,
            pre_activations,
        })
    }

    /// Compute per-transition gradients for one `(input, expected)` example.
    ///
    /// Runs a fresh forward pass, then the reverse-mode recurrence:
    /// - output error `d_L = (A_L - Y) (.) act'(Z_L)`
    /// - hidden errors `d_l = (W_{l+1}^T * d_{l+1}) (.) act'(Z_l)` in reverse
    /// - `dW_l = d_l * A_l^T`, `dB_l = d_l`
    pub fn compute_gradients(&self, input: &Matrix, expected: &Matrix) -> Result<Gradients> {
        self.validate_expected(expected)?;
        let pass = self.forward_propagate(input)?;

        let transitions = self.weights.len();
        let mut d_weights_rev = Vec::with_capacity(transitions);
        let mut d_biases_rev = Vec::with_capacity(transitions);

        let output_error = pass
            .output()
            .sub(expected)?
            .hadamard(&self.output_activation.map_derivative(&pass.pre_activations[transitions - 1]))?;
        d_weights_rev.push(output_error.matmul(&pass.activations[transitions - 1].transpose())?);
        d_biases_rev.push(output_error.clone());

        // The single-transition network has no hidden layers; this loop is empty.
        let mut error = output_error;
        for l in (0..transitions - 1).rev() {
            error = self.weights[l + 1]
                .transpose()
                .matmul(&error)?
                .hadamard(&self.hidden_activation.map_derivative(&pass.pre_activations[l]))?;
            d_weights_rev.push(error.matmul(&pass.activations[l].transpose())?);
            d_biases_rev.push(error.clone());
        }

        d_weights_rev.reverse();
        d_biases_rev.reverse();
        Ok(Gradients {
            d_weights: d_weights_rev,
            d_biases: d_biases_rev,
        })
    }

    /// One stochastic update from a single example.
    ///
    /// Recomputes the forward pass, derives gradients, and applies
    /// `W <- W - lr * dW`, `B <- B - lr * dB` in place.
    pub fn backward_propagate(
        &mut self,
        input: &Matrix,
        expected: &Matrix,
        learning_rate: f64,
    ) -> Result<()> {
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and > 0, got {learning_rate}"
            )));
        }

        let grads = self.compute_gradients(input, expected)?;
        for l in 0..self.weights.len() {
            self.weights[l] = self.weights[l].sub(&grads.d_weights[l].scale(learning_rate))?;
            self.biases[l] = self.biases[l].sub(&grads.d_biases[l].scale(learning_rate))?;
        }
        Ok(())
    }

    /// Mean squared error over a dataset, per output unit per example.
    ///
    /// The total squared error is normalized by `examples * output_width`.
    pub fn mse_loss(&self, data: &Dataset) -> Result<f64> {
        if data.target_dim() != self.output_dim() {
            return Err(Error::InvalidData(format!(
                "dataset target_dim {} does not match model output_dim {}",
                data.target_dim(),
                self.output_dim()
            )));
        }

        let mut total = 0.0_f64;
        for (input, expected) in data.iter() {
            let pass = self.forward_propagate(input)?;
            let error = pass.output().sub(expected)?;
            total += error.hadamard(&error)?.sum();
        }
        Ok(total / (data.len() as f64 * self.output_dim() as f64))
    }
}

fn validate_structure(structure: &[usize]) -> Result<()> {
    if structure.len() < 2 {
        return Err(Error::InvalidConfig(
            "structure must include input and output widths".to_owned(),
        ));
    }
    if structure.contains(&0) {
        return Err(Error::InvalidConfig(
            "all layer widths must be > 0".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[f64]) -> Matrix {
        let rows: Vec<Vec<f64>> = values.iter().map(|&x| vec![x]).collect();
        Matrix::from_rows(&rows).unwrap()
    }

    /// Squared-error objective whose gradients the backward recurrence computes:
    /// `E = 0.5 * sum((a - y)^2)`.
    fn half_squared_error(mlp: &MultiLayerPerceptron, input: &Matrix, expected: &Matrix) -> f64 {
        let out = mlp.forward_propagate(input).unwrap();
        let diff = out.output().sub(expected).unwrap();
        0.5 * diff.hadamard(&diff).unwrap().sum()
    }

    fn assert_close(analytic: f64, numeric: f64, abs_tol: f64, rel_tol: f64) {
        let diff = (analytic - numeric).abs();
        let scale = analytic.abs().max(numeric.abs()).max(1.0);
        assert!(
            diff <= abs_tol || diff / scale <= rel_tol,
            "analytic={analytic} numeric={numeric} diff={diff}"
        );
    }

    #[test]
    fn construction_sets_up_layer_shapes() {
        let mlp = MultiLayerPerceptron::new_with_seed(
            vec![2, 3, 1],
            Activation::Sigmoid,
            Activation::Sigmoid,
            0,
        )
        .unwrap();

        assert_eq!(mlp.structure(), &[2, 3, 1]);
        assert_eq!(mlp.weights().len(), 2);
        assert_eq!(mlp.biases().len(), 2);
        assert_eq!(mlp.weights()[0].format(), (3, 2));
        assert_eq!(mlp.weights()[1].format(), (1, 3));
        assert_eq!(mlp.biases()[0].format(), (3, 1));
        assert_eq!(mlp.biases()[1].format(), (1, 1));

        for w in mlp.weights() {
            assert!(w.entries().iter().all(|&x| (-1.0..=1.0).contains(&x)));
        }
    }

    #[test]
    fn construction_rejects_degenerate_structures() {
        let err = MultiLayerPerceptron::new_with_seed(
            vec![2],
            Activation::Sigmoid,
            Activation::Sigmoid,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = MultiLayerPerceptron::new_with_seed(
            vec![2, 0, 1],
            Activation::Sigmoid,
            Activation::Sigmoid,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn seeded_init_is_deterministic() {
        let a = MultiLayerPerceptron::new_with_seed(
            vec![2, 3, 1],
            Activation::Tanh,
            Activation::Linear,
            123,
        )
        .unwrap();
        let b = MultiLayerPerceptron::new_with_seed(
            vec![2, 3, 1],
            Activation::Tanh,
            Activation::Linear,
            123,
        )
        .unwrap();

        let input = column(&[0.3, -0.7]);
        let out_a = a.forward_propagate(&input).unwrap();
        let out_b = b.forward_propagate(&input).unwrap();
        assert_eq!(out_a.output(), out_b.output());
    }

    #[test]
    fn forward_records_full_histories() {
        let mlp = MultiLayerPerceptron::new_with_seed(
            vec![2, 3, 1],
            Activation::Sigmoid,
            Activation::Sigmoid,
            0,
        )
        .unwrap();

        let pass = mlp.forward_propagate(&column(&[0.5, 0.5])).unwrap();
        assert_eq!(pass.output().format(), (1, 1));
        assert_eq!(pass.activations().len(), 3);
        assert_eq!(pass.pre_activations().len(), 2);
    }

    #[test]
    fn forward_rejects_non_column_inputs() {
        let mlp = MultiLayerPerceptron::new_with_seed(
            vec![2, 3, 1],
            Activation::Sigmoid,
            Activation::Sigmoid,
            0,
        )
        .unwrap();

        let wide = Matrix::from_rows(&[vec![0.5, 0.5]]).unwrap();
        assert!(matches!(
            mlp.forward_propagate(&wide),
            Err(Error::InvalidShapeForOperation(_))
        ));

        let wrong_height = column(&[0.5, 0.5, 0.5]);
        assert!(matches!(
            mlp.forward_propagate(&wrong_height),
            Err(Error::InvalidShapeForOperation(_))
        ));
    }

    #[test]
    fn gradients_match_central_differences() {
        let mlp = MultiLayerPerceptron::new_with_seed(
            vec![2, 3, 2],
            Activation::Sigmoid,
            Activation::Sigmoid,
            0,
        )
        .unwrap();

        let input = column(&[0.3, -0.7]);
        let expected = column(&[0.2, 0.9]);
        let grads = mlp.compute_gradients(&input, &expected).unwrap();

        let eps = 1e-6;
        for l in 0..mlp.weights().len() {
            let (rows, cols) = mlp.weights()[l].format();
            for i in 1..=rows {
                for j in 1..=cols {
                    let orig = mlp.weights()[l].get_entry(i, j).unwrap();

                    let mut plus = mlp.clone();
                    plus.weights[l].set_entry(orig + eps, i, j).unwrap();
                    let mut minus = mlp.clone();
                    minus.weights[l].set_entry(orig - eps, i, j).unwrap();

                    let numeric = (half_squared_error(&plus, &input, &expected)
                        - half_squared_error(&minus, &input, &expected))
                        / (2.0 * eps);
                    let analytic = grads.d_weights[l].get_entry(i, j).unwrap();
                    assert_close(analytic, numeric, 1e-7, 1e-5);
                }
            }

            for i in 1..=mlp.biases()[l].rows() {
                let orig = mlp.biases()[l].get_entry(i, 1).unwrap();

                let mut plus = mlp.clone();
                plus.biases[l].set_entry(orig + eps, i, 1).unwrap();
                let mut minus = mlp.clone();
                minus.biases[l].set_entry(orig - eps, i, 1).unwrap();

                let numeric = (half_squared_error(&plus, &input, &expected)
                    - half_squared_error(&minus, &input, &expected))
                    / (2.0 * eps);
                let analytic = grads.d_biases[l].get_entry(i, 1).unwrap();
                assert_close(analytic, numeric, 1e-7, 1e-5);
            }
        }
    }

    #[test]
    fn single_transition_network_trains_without_hidden_layers() {
        let mut mlp = MultiLayerPerceptron::new_with_seed(
            vec![2, 1],
            Activation::Sigmoid,
            Activation::Linear,
            1,
        )
        .unwrap();

        let input = column(&[1.0, -1.0]);
        let expected = column(&[0.5]);

        let before = half_squared_error(&mlp, &input, &expected);
        for _ in 0..50 {
            mlp.backward_propagate(&input, &expected, 0.1).unwrap();
        }
        let after = half_squared_error(&mlp, &input, &expected);
        assert!(after < before);
    }

    #[test]
    fn backward_rejects_bad_learning_rates() {
        let mut mlp = MultiLayerPerceptron::new_with_seed(
            vec![2, 1],
            Activation::Sigmoid,
            Activation::Sigmoid,
            0,
        )
        .unwrap();
        let input = column(&[0.0, 0.0]);
        let expected = column(&[1.0]);

        for lr in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                mlp.backward_propagate(&input, &expected, lr),
                Err(Error::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn mse_loss_normalizes_per_output_unit() {
        // Fixed parameters: identity-ish single transition with linear output.
        let weights = vec![Matrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap()];
        let biases = vec![Matrix::from_rows(&[vec![0.0], vec![0.0]]).unwrap()];
        let mlp = MultiLayerPerceptron::from_parts(
            vec![2, 2],
            Activation::Linear,
            Activation::Linear,
            weights,
            biases,
        )
        .unwrap();

        // Outputs equal inputs; errors are (1, 1) and (0, 2).
        let data = Dataset::from_rows(
            &[vec![0.0, 0.0], vec![1.0, 0.0]],
            &[vec![1.0, 1.0], vec![1.0, 2.0]],
        )
        .unwrap();

        // Total squared error = (1 + 1) + (0 + 4) = 6; examples * width = 4.
        let loss = mlp.mse_loss(&data).unwrap();
        assert!((loss - 1.5).abs() < 1e-12);
    }
}

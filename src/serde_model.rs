//! Model persistence.
//!
//! The on-disk format is a JSON document:
//!
//! ```json
//! {
//!   "structure": [2, 3, 1],
//!   "hidden_activation": "sigmoid",
//!   "output_activation": "sigmoid",
//!   "weights": [[[...], ...], ...],
//!   "biases": [[[...]], ...]
//! }
//! ```
//!
//! where `weights[i]` has format `(structure[i+1], structure[i])` and
//! `biases[i]` has format `(structure[i+1], 1)`.
//!
//! The internal `MultiLayerPerceptron` struct is never serialized directly;
//! [`SerializedMlp`] is a detached mirror, so the file format stays stable if
//! the internal representation changes. Deserialization validates dimensions,
//! activation names, and finiteness; an inconsistent file is a hard failure,
//! never silently repaired.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Activation, Error, Matrix, MultiLayerPerceptron, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedMlp {
    pub structure: Vec<usize>,
    pub hidden_activation: String,
    pub output_activation: String,
    /// One entry grid per layer transition, as nested rows.
    pub weights: Vec<Vec<Vec<f64>>>,
    pub biases: Vec<Vec<Vec<f64>>>,
}

impl SerializedMlp {
    pub fn validate(&self) -> Result<()> {
        if self.structure.len() < 2 {
            return Err(Error::InvalidData(
                "structure must include input and output widths".to_owned(),
            ));
        }
        if self.structure.contains(&0) {
            return Err(Error::InvalidData(
                "all layer widths must be > 0".to_owned(),
            ));
        }

        Activation::from_name(&self.hidden_activation)
            .map_err(|e| Error::InvalidData(format!("hidden activation: {e}")))?;
        Activation::from_name(&self.output_activation)
            .map_err(|e| Error::InvalidData(format!("output activation: {e}")))?;

        let transitions = self.structure.len() - 1;
        if self.weights.len() != transitions || self.biases.len() != transitions {
            return Err(Error::InvalidData(format!(
                "expected {transitions} weight and bias grids, got {} and {}",
                self.weights.len(),
                self.biases.len()
            )));
        }

        for l in 0..transitions {
            let (out_dim, in_dim) = (self.structure[l + 1], self.structure[l]);
            validate_grid(&self.weights[l], out_dim, in_dim, &format!("weights[{l}]"))?;
            validate_grid(&self.biases[l], out_dim, 1, &format!("biases[{l}]"))?;
        }

        Ok(())
    }
}

fn validate_grid(grid: &[Vec<f64>], rows: usize, cols: usize, what: &str) -> Result<()> {
    if grid.len() != rows {
        return Err(Error::InvalidData(format!(
            "{what} has {} rows, expected {rows}",
            grid.len()
        )));
    }
    for (i, row) in grid.iter().enumerate() {
        if row.len() != cols {
            return Err(Error::InvalidData(format!(
                "{what} row {i} has {} entries, expected {cols}",
                row.len()
            )));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(format!(
                "{what} row {i} contains non-finite entries"
            )));
        }
    }
    Ok(())
}

impl From<&MultiLayerPerceptron> for SerializedMlp {
    fn from(model: &MultiLayerPerceptron) -> Self {
        Self {
            structure: model.structure().to_vec(),
            hidden_activation: model.hidden_activation().name().to_owned(),
            output_activation: model.output_activation().name().to_owned(),
            weights: model.weights().iter().map(Matrix::to_rows).collect(),
            biases: model.biases().iter().map(Matrix::to_rows).collect(),
        }
    }
}

impl TryFrom<SerializedMlp> for MultiLayerPerceptron {
    type Error = Error;

    fn try_from(value: SerializedMlp) -> std::result::Result<Self, Self::Error> {
        value.validate()?;

        let hidden = Activation::from_name(&value.hidden_activation)?;
        let output = Activation::from_name(&value.output_activation)?;

        let mut weights = Vec::with_capacity(value.weights.len());
        for (l, grid) in value.weights.iter().enumerate() {
            weights.push(
                Matrix::from_rows(grid)
                    .map_err(|e| Error::InvalidData(format!("weights[{l}]: {e}")))?,
            );
        }
        let mut biases = Vec::with_capacity(value.biases.len());
        for (l, grid) in value.biases.iter().enumerate() {
            biases.push(
                Matrix::from_rows(grid)
                    .map_err(|e| Error::InvalidData(format!("biases[{l}]: {e}")))?,
            );
        }

        MultiLayerPerceptron::from_parts(value.structure, hidden, output, weights, biases)
    }
}

impl MultiLayerPerceptron {
    /// Serialize the model to a compact JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(&SerializedMlp::from(self))
            .map_err(|e| Error::InvalidData(format!("failed to serialize model: {e}")))
    }

    /// Serialize the model to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&SerializedMlp::from(self))
            .map_err(|e| Error::InvalidData(format!("failed to serialize model: {e}")))
    }

    /// Parse a model from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let ser: SerializedMlp = serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("failed to parse model json: {e}")))?;
        ser.try_into()
    }

    /// Save the model to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let p = path.as_ref();
        std::fs::write(p, self.to_json_string_pretty()?)
            .map_err(|e| Error::InvalidData(format!("failed to write {}: {e}", p.display())))
    }

    /// Load a model from a JSON file.
    ///
    /// Round-trip guarantee: `load(save(m))` reproduces `m`'s structure,
    /// activation names, and every weight/bias entry exactly.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::InvalidData(format!("failed to read {}: {e}", p.display())))?;
        Self::from_json_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_model() -> MultiLayerPerceptron {
        let weights = vec![
            Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap(),
            Matrix::from_rows(&[vec![7.0, 8.0, 9.0]]).unwrap(),
        ];
        let biases = vec![
            Matrix::from_rows(&[vec![0.1], vec![0.2], vec![0.3]]).unwrap(),
            Matrix::from_rows(&[vec![0.4]]).unwrap(),
        ];
        MultiLayerPerceptron::from_parts(
            vec![2, 3, 1],
            Activation::Tanh,
            Activation::Linear,
            weights,
            biases,
        )
        .unwrap()
    }

    #[test]
    fn json_uses_the_documented_schema() {
        let json = tiny_model().to_json_string().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["structure"], serde_json::json!([2, 3, 1]));
        assert_eq!(value["hidden_activation"], "tanh");
        assert_eq!(value["output_activation"], "linear");
        assert_eq!(value["weights"][0][1][0], 3.0);
        assert_eq!(value["biases"][1][0][0], 0.4);
    }

    #[test]
    fn roundtrip_reproduces_all_entries_exactly() {
        let model = tiny_model();
        let json = model.to_json_string_pretty().unwrap();
        let loaded = MultiLayerPerceptron::from_json_str(&json).unwrap();

        assert_eq!(loaded.structure(), model.structure());
        assert_eq!(loaded.hidden_activation(), model.hidden_activation());
        assert_eq!(loaded.output_activation(), model.output_activation());
        assert_eq!(loaded.weights(), model.weights());
        assert_eq!(loaded.biases(), model.biases());
    }

    #[test]
    fn roundtrip_preserves_the_last_ulp() {
        // Entries whose shortest decimal rendering stresses the float parser;
        // a default reader can come back one ULP off.
        let weights = vec![Matrix::from_rows(&[vec![
            0.9545116830510739,
            1.0 / 3.0,
            0.1 + 0.2,
            -2.2250738585072014e-308,
        ]])
        .unwrap()];
        let biases = vec![Matrix::from_rows(&[vec![6.02e23_f64.recip()]]).unwrap()];
        let model = MultiLayerPerceptron::from_parts(
            vec![4, 1],
            Activation::Sigmoid,
            Activation::Sigmoid,
            weights,
            biases,
        )
        .unwrap();

        for json in [
            model.to_json_string().unwrap(),
            model.to_json_string_pretty().unwrap(),
        ] {
            let loaded = MultiLayerPerceptron::from_json_str(&json).unwrap();
            assert_eq!(loaded.weights(), model.weights());
            assert_eq!(loaded.biases(), model.biases());
        }
    }

    #[test]
    fn rejects_mismatched_dimensions() {
        let mut ser = SerializedMlp::from(&tiny_model());
        ser.weights[0].pop();
        let err = MultiLayerPerceptron::try_from(ser).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));

        let mut ser = SerializedMlp::from(&tiny_model());
        ser.biases[1][0].push(0.0);
        let err = MultiLayerPerceptron::try_from(ser).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn rejects_unknown_activation_names() {
        let mut ser = SerializedMlp::from(&tiny_model());
        ser.hidden_activation = "softplus".to_owned();
        let err = MultiLayerPerceptron::try_from(ser).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn rejects_non_finite_entries() {
        let mut ser = SerializedMlp::from(&tiny_model());
        ser.weights[0][0][0] = f64::NAN;
        assert!(ser.validate().is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        let err = MultiLayerPerceptron::from_json_str("{\"structure\":[2]}").unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }
}

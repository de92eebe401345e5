use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Operand dimensions are incompatible for the requested operation.
    ShapeMismatch(String),
    /// A 1-based row/column index fell outside the valid range.
    IndexOutOfRange(String),
    /// Empty input to matrix construction, or non-positive dimensions.
    InvalidConstruction(String),
    /// A column vector was required and something else was given.
    InvalidShapeForOperation(String),
    /// Activation name not present in the registry.
    UnknownActivation(String),
    /// Non-numeric (zero or non-finite) operand to a scalar operation.
    TypeMismatch(String),
    /// Malformed dataset or persisted model.
    InvalidData(String),
    /// Bad training configuration (epochs, learning rate, schedule).
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ShapeMismatch(msg) => write!(f, "shape mismatch: {msg}"),
            Error::IndexOutOfRange(msg) => write!(f, "index out of range: {msg}"),
            Error::InvalidConstruction(msg) => write!(f, "invalid construction: {msg}"),
            Error::InvalidShapeForOperation(msg) => {
                write!(f, "invalid shape for operation: {msg}")
            }
            Error::UnknownActivation(msg) => write!(f, "unknown activation: {msg}"),
            Error::TypeMismatch(msg) => write!(f, "type mismatch: {msg}"),
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            Error::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MathError {
    #[error("invalid coefficient: {0}")]
    InvalidCoefficient(String),

    #[error("singular system: determinant {determinant:e} is too close to zero")]
    SingularSystem { determinant: f64 },

    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    #[error("malformed sample: {0}")]
    MalformedSample(String),
}

pub type MathResult<T> = Result<T, MathError>;

//! Equation solving, free-text equation parsing and descriptive statistics.
//!
//! Every operation is a pure function over its arguments: inputs go in,
//! a typed result or a [`MathError`] comes out. Nothing is cached between
//! calls.

pub mod error;
pub mod format;
pub mod normalize;
pub mod parser;
pub mod regression;
pub mod solver;
pub mod stats;

pub use error::{MathError, MathResult};
pub use format::{format_linear, format_quadratic};
pub use normalize::{normalize, Normalization, NormalizationParams, NormalizeMethod};
pub use parser::{
    parse_equation, Coefficients, EquationKind, ParseFailure, ParsedEquation, SolvedEquation,
};
pub use regression::{
    correlation, correlation_matrix, linear_regression, CorrelationMatrix, DataPoint, Direction,
    FittedPoint, PairInterpretation, RegressionModel, Strength,
};
pub use solver::{
    solve_linear, solve_quadratic, solve_system_2x2, LinearSolution, QuadraticSolution, Root,
    RootCheck, RootKind, SystemRow, SystemSolution,
};
pub use stats::{describe, validate_sample, Quartiles, Spread, StatsSummary};

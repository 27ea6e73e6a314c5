//! Free-text equation parsing.
//!
//! The parser is an ordered table of fixed-shape matchers rather than a
//! grammar. Input is normalized (whitespace removed, lower-cased) and every
//! matcher is tried in order; the first one that recognizes the text wins.
//! Quadratic shapes come before linear ones so that a mistyped quadratic is
//! never read as a linear equation. New shapes are added by appending a
//! matcher to [`PATTERNS`].

use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::MathResult;
use crate::format::{format_linear, format_quadratic};
use crate::solver::{solve_linear, solve_quadratic, LinearSolution, QuadraticSolution};

/// Equations offered back to the caller when nothing matched.
pub const SUGGESTIONS: &[&str] = &[
    "x^2 - 5x + 6 = 0",
    "2x² + 3x - 2 = 0",
    "x^2 - 4 = 0",
    "3x + 7 = 0",
    "2x - 4 = 6",
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquationKind {
    Linear,
    Quadratic,
}

impl fmt::Display for EquationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Quadratic => write!(f, "quadratic"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coefficients {
    Quadratic { a: f64, b: f64, c: f64 },
    Linear { a: f64, b: f64 },
}

impl Coefficients {
    pub fn kind(&self) -> EquationKind {
        match self {
            Self::Quadratic { .. } => EquationKind::Quadratic,
            Self::Linear { .. } => EquationKind::Linear,
        }
    }

    /// Canonical display form, e.g. `x² - 5x + 6 = 0`.
    pub fn formatted(&self) -> String {
        match *self {
            Self::Quadratic { a, b, c } => format_quadratic(a, b, c),
            Self::Linear { a, b } => format_linear(a, b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedEquation {
    pub kind: EquationKind,
    pub coefficients: Coefficients,
    pub formatted: String,
    /// Name of the matcher that recognized the input.
    pub pattern: &'static str,
}

impl ParsedEquation {
    /// Hand the coefficients to the matching solver.
    pub fn solve(&self) -> MathResult<SolvedEquation> {
        match self.coefficients {
            Coefficients::Quadratic { a, b, c } => {
                solve_quadratic(a, b, c).map(SolvedEquation::Quadratic)
            }
            Coefficients::Linear { a, b } => solve_linear(a, b).map(SolvedEquation::Linear),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SolvedEquation {
    Linear(LinearSolution),
    Quadratic(QuadraticSolution),
}

/// No pattern recognized the input. This is an expected outcome for
/// free-text input, so it carries example equations instead of a cause.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("unrecognized equation format: {input:?}")]
pub struct ParseFailure {
    pub input: String,
    pub suggestions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Pattern table
// ---------------------------------------------------------------------------

type Matcher = fn(&str) -> Option<Coefficients>;

pub struct Pattern {
    pub name: &'static str,
    matcher: Matcher,
}

/// Tried top to bottom; order matters.
pub static PATTERNS: &[Pattern] = &[
    Pattern {
        name: "quadratic_caret",
        matcher: quadratic_caret,
    },
    Pattern {
        name: "quadratic_superscript",
        matcher: quadratic_superscript,
    },
    Pattern {
        name: "quadratic_caret_no_linear",
        matcher: quadratic_caret_no_linear,
    },
    Pattern {
        name: "quadratic_superscript_no_linear",
        matcher: quadratic_superscript_no_linear,
    },
    Pattern {
        name: "quadratic_no_constant",
        matcher: quadratic_no_constant,
    },
    Pattern {
        name: "quadratic_bare",
        matcher: quadratic_bare,
    },
    Pattern {
        name: "linear",
        matcher: linear,
    },
    Pattern {
        name: "linear_with_rhs",
        matcher: linear_with_rhs,
    },
];

pub fn parse_equation(text: &str) -> Result<ParsedEquation, ParseFailure> {
    let normalized = normalize(text);

    for pattern in PATTERNS {
        if let Some(coefficients) = (pattern.matcher)(&normalized) {
            debug!(pattern = pattern.name, input = %normalized, "matched equation pattern");
            return Ok(ParsedEquation {
                kind: coefficients.kind(),
                formatted: coefficients.formatted(),
                coefficients,
                pattern: pattern.name,
            });
        }
    }

    debug!(input = %normalized, "no equation pattern matched");
    Err(ParseFailure {
        input: text.to_string(),
        suggestions: SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
    })
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

// ---------------------------------------------------------------------------
// Matchers
// ---------------------------------------------------------------------------

fn quadratic_caret(s: &str) -> Option<Coefficients> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let caps = compiled(&RE, r"^([+-]?\d*)x\^2([+-]\d*)x([+-]\d+)=0$").captures(s)?;
    full_quadratic(&caps)
}

fn quadratic_superscript(s: &str) -> Option<Coefficients> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let caps = compiled(&RE, r"^([+-]?\d*)x²([+-]\d*)x([+-]\d+)=0$").captures(s)?;
    full_quadratic(&caps)
}

fn quadratic_caret_no_linear(s: &str) -> Option<Coefficients> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let caps = compiled(&RE, r"^([+-]?\d*)x\^2([+-]\d+)=0$").captures(s)?;
    Some(Coefficients::Quadratic {
        a: coefficient(&caps[1])?,
        b: 0.0,
        c: coefficient(&caps[2])?,
    })
}

fn quadratic_superscript_no_linear(s: &str) -> Option<Coefficients> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let caps = compiled(&RE, r"^([+-]?\d*)x²([+-]\d+)=0$").captures(s)?;
    Some(Coefficients::Quadratic {
        a: coefficient(&caps[1])?,
        b: 0.0,
        c: coefficient(&caps[2])?,
    })
}

fn quadratic_no_constant(s: &str) -> Option<Coefficients> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let caps = compiled(&RE, r"^([+-]?\d*)x(?:\^2|²)([+-]\d*)x=0$").captures(s)?;
    Some(Coefficients::Quadratic {
        a: coefficient(&caps[1])?,
        b: coefficient(&caps[2])?,
        c: 0.0,
    })
}

fn quadratic_bare(s: &str) -> Option<Coefficients> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let caps = compiled(&RE, r"^([+-]?\d*)x(?:\^2|²)=0$").captures(s)?;
    Some(Coefficients::Quadratic {
        a: coefficient(&caps[1])?,
        b: 0.0,
        c: 0.0,
    })
}

fn linear(s: &str) -> Option<Coefficients> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let caps = compiled(&RE, r"^([+-]?\d*)x([+-]\d+)=0$").captures(s)?;
    Some(Coefficients::Linear {
        a: coefficient(&caps[1])?,
        b: coefficient(&caps[2])?,
    })
}

/// `ax + b = c` (or `ax = c`), folded into `ax + (b - c) = 0`.
fn linear_with_rhs(s: &str) -> Option<Coefficients> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let caps = compiled(&RE, r"^([+-]?\d*)x([+-]\d+)?=([+-]?\d+)$").captures(s)?;
    let b = match caps.get(2) {
        Some(m) => coefficient(m.as_str())?,
        None => 0.0,
    };
    Some(Coefficients::Linear {
        a: coefficient(&caps[1])?,
        b: b - coefficient(&caps[3])?,
    })
}

fn full_quadratic(caps: &Captures<'_>) -> Option<Coefficients> {
    Some(Coefficients::Quadratic {
        a: coefficient(&caps[1])?,
        b: coefficient(&caps[2])?,
        c: coefficient(&caps[3])?,
    })
}

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("equation patterns are valid regexes"))
}

/// Empty or `+` means 1, a lone `-` means -1, anything else is an integer.
fn coefficient(raw: &str) -> Option<f64> {
    match raw {
        "" | "+" => Some(1.0),
        "-" => Some(-1.0),
        digits => digits.parse::<i64>().ok().map(|v| v as f64),
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MathError, MathResult};
use crate::stats::{
    finite, median_of_sorted, min_max, moments, quartiles_unchecked, require_len, sorted_copy,
    spread, validate_sample, Spread,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMethod {
    #[default]
    ZScore,
    MinMax,
    Robust,
}

impl fmt::Display for NormalizeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZScore => write!(f, "zscore"),
            Self::MinMax => write!(f, "minmax"),
            Self::Robust => write!(f, "robust"),
        }
    }
}

impl std::str::FromStr for NormalizeMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zscore" | "z-score" | "z_score" | "standard" => Ok(Self::ZScore),
            "minmax" | "min-max" | "min_max" => Ok(Self::MinMax),
            "robust" => Ok(Self::Robust),
            _ => Err(format!("invalid normalization method: {s}")),
        }
    }
}

/// Parameters needed to undo a normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizationParams {
    ZScore { mean: f64, std_dev: f64 },
    MinMax { min: f64, max: f64 },
    Robust { median: f64, iqr: f64 },
}

impl NormalizationParams {
    fn apply(&self, x: f64) -> f64 {
        match *self {
            Self::ZScore { mean, std_dev } => (x - mean) / std_dev,
            Self::MinMax { min, max } => (x - min) / (max - min),
            Self::Robust { median, iqr } => (x - median) / iqr,
        }
    }

    fn invert(&self, z: f64) -> f64 {
        match *self {
            Self::ZScore { mean, std_dev } => z * std_dev + mean,
            Self::MinMax { min, max } => z * (max - min) + min,
            Self::Robust { median, iqr } => z * iqr + median,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub method: NormalizeMethod,
    pub normalized: Vec<f64>,
    pub parameters: NormalizationParams,
    pub before: Spread,
    pub after: Spread,
}

impl Normalization {
    /// Map normalized values back onto the original scale.
    pub fn invert(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&z| self.parameters.invert(z)).collect()
    }
}

pub fn normalize(sample: &[f64], method: NormalizeMethod) -> MathResult<Normalization> {
    validate_sample(sample)?;
    require_len(sample, 2, "normalization")?;

    let parameters = match method {
        NormalizeMethod::ZScore => {
            let (_, mean, variance) = moments(sample)?;
            let std_dev = variance.sqrt();
            // constant samples can leave rounding noise in std_dev
            let (min, max) = min_max(sample);
            if std_dev == 0.0 || min == max {
                return Err(degenerate(method, "standard deviation is zero"));
            }
            NormalizationParams::ZScore { mean, std_dev }
        }
        NormalizeMethod::MinMax => {
            let (min, max) = min_max(sample);
            if max == min {
                return Err(degenerate(method, "all values are equal"));
            }
            finite("range", max - min)?;
            NormalizationParams::MinMax { min, max }
        }
        NormalizeMethod::Robust => {
            let sorted = sorted_copy(sample);
            let iqr = finite("interquartile range", quartiles_unchecked(&sorted).iqr)?;
            if iqr == 0.0 {
                return Err(degenerate(method, "interquartile range is zero"));
            }
            NormalizationParams::Robust {
                median: median_of_sorted(&sorted),
                iqr,
            }
        }
    };

    let normalized: Vec<f64> = sample.iter().map(|&x| parameters.apply(x)).collect();
    debug!(%method, n = sample.len(), "normalized sample");

    Ok(Normalization {
        method,
        before: spread(sample)?,
        after: spread(&normalized)?,
        normalized,
        parameters,
    })
}

fn degenerate(method: NormalizeMethod, reason: &str) -> MathError {
    MathError::DegenerateInput(format!("cannot apply {method} normalization: {reason}"))
}

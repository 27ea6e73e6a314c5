//! Ordinary least-squares regression and Pearson correlation.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::debug;

use crate::error::{MathError, MathResult};
use crate::stats::{finite, min_max, require_len, validate_sample};

/// |r| below this is a weak correlation.
pub const WEAK_BELOW: f64 = 0.3;
/// |r| below this (and at least [`WEAK_BELOW`]) is a moderate correlation.
pub const MODERATE_BELOW: f64 = 0.7;

// ---------------------------------------------------------------------------
// Linear regression
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

impl DataPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedPoint {
    pub x: f64,
    pub y: f64,
    pub predicted: f64,
    /// `y - predicted`
    pub residual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionModel {
    pub n: usize,
    pub slope: f64,
    pub intercept: f64,
    /// Pearson r; `None` when every `y` is identical.
    pub correlation: Option<f64>,
    /// `r²`, or 1 for a constant `y` since the fit is then exact.
    pub r_squared: f64,
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub points: Vec<FittedPoint>,
}

impl RegressionModel {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// `y = 2.0000x + 0.5000` style rendering.
    pub fn equation(&self, precision: usize) -> String {
        let sign = if self.intercept < 0.0 { '-' } else { '+' };
        format!(
            "y = {:.p$}x {sign} {:.p$}",
            self.slope,
            self.intercept.abs(),
            p = precision
        )
    }
}

/// Fit `y = slope·x + intercept` by ordinary least squares.
///
/// Fails with [`MathError::DegenerateInput`] when every `x` is identical. A
/// constant `y` still fits (slope 0) but leaves the correlation undefined.
pub fn linear_regression(points: &[DataPoint]) -> MathResult<RegressionModel> {
    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
    validate_sample(&xs)?;
    validate_sample(&ys)?;
    require_len(&xs, 2, "linear regression")?;

    let n = points.len();
    let x_mean = finite("sum of x", xs.iter().sum())? / n as f64;
    let y_mean = finite("sum of y", ys.iter().sum())? / n as f64;

    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), p| {
        let dx = p.x - x_mean;
        (sxy + dx * (p.y - y_mean), sxx + dx * dx)
    });
    finite("x variance", sxx)?;
    finite("xy covariance", sxy)?;
    if sxx == 0.0 {
        debug!(n, "rejecting regression with constant x");
        return Err(MathError::DegenerateInput(
            "all x values are identical; slope is undefined".into(),
        ));
    }

    let (y_min, y_max) = min_max(&ys);
    let constant_y = y_min == y_max;
    // ȳ may differ from the shared value by rounding; pin the fit exactly.
    let slope = if constant_y { 0.0 } else { sxy / sxx };
    let intercept = if constant_y {
        y_min
    } else {
        finite("intercept", y_mean - slope * x_mean)?
    };

    let fitted: Vec<FittedPoint> = points
        .iter()
        .map(|p| {
            let predicted = slope * p.x + intercept;
            FittedPoint {
                x: p.x,
                y: p.y,
                predicted,
                residual: p.y - predicted,
            }
        })
        .collect();

    let mse = finite(
        "mean squared error",
        fitted.iter().map(|f| f.residual.powi(2)).sum::<f64>() / n as f64,
    )?;
    let mae = fitted.iter().map(|f| f.residual.abs()).sum::<f64>() / n as f64;
    let r = if constant_y {
        None
    } else {
        Some(correlation(&xs, &ys)?)
    };

    debug!(n, slope, intercept, ?r, "fitted linear regression");
    Ok(RegressionModel {
        n,
        slope,
        intercept,
        correlation: r,
        r_squared: r.map_or(1.0, |r| r * r),
        mse,
        rmse: mse.sqrt(),
        mae,
        points: fitted,
    })
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Pearson product-moment correlation coefficient.
pub fn correlation(x: &[f64], y: &[f64]) -> MathResult<f64> {
    validate_sample(x)?;
    validate_sample(y)?;
    if x.len() != y.len() {
        return Err(MathError::MalformedSample(format!(
            "paired samples differ in length ({} vs {})",
            x.len(),
            y.len()
        )));
    }
    require_len(x, 2, "correlation")?;

    let n = x.len() as f64;
    let x_mean = finite("sum of x", x.iter().sum())? / n;
    let y_mean = finite("sum of y", y.iter().sum())? / n;

    let (sxy, sxx, syy) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0, 0.0), |(sxy, sxx, syy), (&xi, &yi)| {
            let dx = xi - x_mean;
            let dy = yi - y_mean;
            (sxy + dx * dy, sxx + dx * dx, syy + dy * dy)
        });
    finite("x variance", sxx)?;
    finite("y variance", syy)?;
    finite("covariance", sxy)?;

    if sxx == 0.0 || syy == 0.0 {
        return Err(MathError::DegenerateInput(
            "correlation is undefined when a sample has zero variance".into(),
        ));
    }

    Ok((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    Moderate,
    Strong,
}

impl Strength {
    pub fn from_r(r: f64) -> Self {
        let magnitude = r.abs();
        if magnitude < WEAK_BELOW {
            Self::Weak
        } else if magnitude < MODERATE_BELOW {
            Self::Moderate
        } else {
            Self::Strong
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weak => write!(f, "weak"),
            Self::Moderate => write!(f, "moderate"),
            Self::Strong => write!(f, "strong"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    pub fn from_r(r: f64) -> Self {
        if r < 0.0 {
            Self::Negative
        } else {
            Self::Positive
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Negative => write!(f, "negative"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairInterpretation {
    pub first: String,
    pub second: String,
    pub r: f64,
    pub p_value: Option<f64>,
    pub strength: Strength,
    pub direction: Direction,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// Variable names in input order; rows and columns follow this order.
    pub variables: Vec<String>,
    pub n: usize,
    pub matrix: Vec<Vec<f64>>,
    /// Two-tailed p-values; `None` when there are fewer than 3 observations.
    pub p_values: Vec<Vec<Option<f64>>>,
    /// One entry per unordered pair of distinct variables.
    pub interpretations: Vec<PairInterpretation>,
}

impl CorrelationMatrix {
    pub fn get(&self, first: &str, second: &str) -> Option<f64> {
        let (i, j) = self.indices(first, second)?;
        Some(self.matrix[i][j])
    }

    pub fn p_value(&self, first: &str, second: &str) -> Option<f64> {
        let (i, j) = self.indices(first, second)?;
        self.p_values[i][j]
    }

    fn indices(&self, first: &str, second: &str) -> Option<(usize, usize)> {
        let i = self.variables.iter().position(|v| v == first)?;
        let j = self.variables.iter().position(|v| v == second)?;
        Some((i, j))
    }
}

/// Pairwise Pearson correlations between named, equal-length samples.
pub fn correlation_matrix<S, V>(named: &[(S, V)]) -> MathResult<CorrelationMatrix>
where
    S: AsRef<str>,
    V: AsRef<[f64]>,
{
    if named.len() < 2 {
        return Err(MathError::MalformedSample(format!(
            "correlation matrix requires at least 2 variables, got {}",
            named.len()
        )));
    }

    let mut seen = HashSet::new();
    for (name, _) in named {
        if !seen.insert(name.as_ref()) {
            return Err(MathError::MalformedSample(format!(
                "duplicate variable name: {}",
                name.as_ref()
            )));
        }
    }

    let n = named[0].1.as_ref().len();
    for (name, values) in named {
        let values = values.as_ref();
        if values.len() != n {
            return Err(MathError::MalformedSample(format!(
                "variable {} has {} values, expected {n}",
                name.as_ref(),
                values.len()
            )));
        }
    }

    let k = named.len();
    let mut matrix = vec![vec![1.0; k]; k];
    let mut p_values = vec![vec![Some(0.0); k]; k];
    let mut interpretations = Vec::with_capacity(k * (k - 1) / 2);

    for i in 0..k {
        for j in (i + 1)..k {
            let r = correlation(named[i].1.as_ref(), named[j].1.as_ref())?;
            let p = two_tailed_p_value(r, n);
            matrix[i][j] = r;
            matrix[j][i] = r;
            p_values[i][j] = p;
            p_values[j][i] = p;

            let strength = Strength::from_r(r);
            let direction = Direction::from_r(r);
            interpretations.push(PairInterpretation {
                first: named[i].0.as_ref().to_string(),
                second: named[j].0.as_ref().to_string(),
                r,
                p_value: p,
                strength,
                direction,
                description: format!("{strength} {direction} correlation"),
            });
        }
    }

    debug!(variables = k, n, "computed correlation matrix");
    Ok(CorrelationMatrix {
        variables: named.iter().map(|(s, _)| s.as_ref().to_string()).collect(),
        n,
        matrix,
        p_values,
        interpretations,
    })
}

/// Two-tailed p-value for `H0: ρ = 0` using `t = r·√((n-2)/(1-r²))` on a
/// Student-t distribution with `n - 2` degrees of freedom.
pub fn two_tailed_p_value(r: f64, n: usize) -> Option<f64> {
    if n < 3 || !r.is_finite() {
        return None;
    }
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return Some(0.0);
    }

    let dof = (n - 2) as f64;
    let t = r * (dof / denom).sqrt();
    let dist = StudentsT::new(0.0, 1.0, dof).ok()?;
    Some((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}

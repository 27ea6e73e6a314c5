//! Descriptive statistics over a single sample.
//!
//! Every public entry point validates its input before doing arithmetic, so
//! non-finite values are reported as [`MathError::MalformedSample`] rather than
//! leaking into results as NaN. Variance and standard deviation are population
//! statistics (divide by `n`).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{MathError, MathResult};

/// Tukey fence multiplier for outlier detection.
pub const OUTLIER_FENCE: f64 = 1.5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Index-based quartiles (no interpolation): `q = sorted[floor(n·p)]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quartiles {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
    pub iqr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    /// Most frequent values, ascending. Empty when every value is unique.
    pub mode: Vec<f64>,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub quartiles: Quartiles,
    pub outliers: Vec<f64>,
    /// Present for n > 2 with non-zero spread.
    pub skewness: Option<f64>,
    /// Excess kurtosis, present for n > 3 with non-zero spread.
    pub kurtosis: Option<f64>,
}

/// Location and spread of a sample, used to report a transform's effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject empty samples and any NaN or infinite element.
pub fn validate_sample(sample: &[f64]) -> MathResult<()> {
    if sample.is_empty() {
        warn!("rejecting empty sample");
        return Err(MathError::MalformedSample("sample is empty".into()));
    }
    if let Some(index) = sample.iter().position(|v| !v.is_finite()) {
        warn!(index, "rejecting sample with non-finite element");
        return Err(MathError::MalformedSample(format!(
            "element {index} is not a finite number ({})",
            sample[index]
        )));
    }
    Ok(())
}

pub(crate) fn require_len(sample: &[f64], min: usize, what: &str) -> MathResult<()> {
    if sample.len() < min {
        return Err(MathError::MalformedSample(format!(
            "{what} requires at least {min} values, got {}",
            sample.len()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

pub fn describe(sample: &[f64]) -> MathResult<StatsSummary> {
    validate_sample(sample)?;

    let sorted = sorted_copy(sample);
    let count = sample.len();
    let (sum, mean, variance) = moments(sample)?;
    let std_dev = variance.sqrt();
    let min = sorted[0];
    let max = sorted[count - 1];
    let range = finite("range", max - min)?;
    let quartiles = quartiles_unchecked(&sorted);
    finite("interquartile range", quartiles.iqr)?;

    let summary = StatsSummary {
        count,
        sum,
        mean,
        median: median_of_sorted(&sorted),
        mode: mode_of_sorted(&sorted),
        min,
        max,
        range,
        variance,
        std_dev,
        quartiles,
        outliers: outliers_unchecked(&sorted, &quartiles),
        skewness: skewness(sample, mean, std_dev).ok(),
        kurtosis: kurtosis(sample, mean, std_dev).ok(),
    };
    debug!(count, mean, std_dev, outliers = summary.outliers.len(), "described sample");
    Ok(summary)
}

pub fn mean(sample: &[f64]) -> MathResult<f64> {
    validate_sample(sample)?;
    moments(sample).map(|(_, mean, _)| mean)
}

pub fn median(sample: &[f64]) -> MathResult<f64> {
    validate_sample(sample)?;
    Ok(median_of_sorted(&sorted_copy(sample)))
}

/// Population variance.
pub fn variance(sample: &[f64]) -> MathResult<f64> {
    validate_sample(sample)?;
    moments(sample).map(|(_, _, variance)| variance)
}

/// Population standard deviation.
pub fn std_dev(sample: &[f64]) -> MathResult<f64> {
    variance(sample).map(f64::sqrt)
}

/// Quartiles of an ascending-sorted sample.
pub fn quartiles(sorted: &[f64]) -> MathResult<Quartiles> {
    validate_sample(sorted)?;
    debug_assert!(sorted.windows(2).all(|w| w[0] <= w[1]), "sample must be sorted");
    let q = quartiles_unchecked(sorted);
    finite("interquartile range", q.iqr)?;
    Ok(q)
}

/// Values of an ascending-sorted sample outside `[q1 - 1.5·IQR, q3 + 1.5·IQR]`.
pub fn outliers(sorted: &[f64]) -> MathResult<Vec<f64>> {
    let q = quartiles(sorted)?;
    Ok(outliers_unchecked(sorted, &q))
}

/// Bias-corrected sample skewness, `n/((n-1)(n-2)) · Σ((x - mean)/std)³`.
pub fn skewness(sample: &[f64], mean: f64, std: f64) -> MathResult<f64> {
    validate_sample(sample)?;
    require_len(sample, 3, "skewness")?;
    require_spread(std, "skewness")?;

    let n = sample.len() as f64;
    let m3: f64 = sample.iter().map(|x| ((x - mean) / std).powi(3)).sum();
    Ok(n / ((n - 1.0) * (n - 2.0)) * m3)
}

/// Bias-corrected excess kurtosis.
pub fn kurtosis(sample: &[f64], mean: f64, std: f64) -> MathResult<f64> {
    validate_sample(sample)?;
    require_len(sample, 4, "kurtosis")?;
    require_spread(std, "kurtosis")?;

    let n = sample.len() as f64;
    let m4: f64 = sample.iter().map(|x| ((x - mean) / std).powi(4)).sum();
    let scale = n * (n + 1.0) / ((n - 1.0) * (n - 2.0) * (n - 3.0));
    let correction = 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
    Ok(scale * m4 - correction)
}

pub fn spread(sample: &[f64]) -> MathResult<Spread> {
    validate_sample(sample)?;
    let (_, mean, variance) = moments(sample)?;
    let (min, max) = min_max(sample);
    Ok(Spread {
        mean,
        std_dev: variance.sqrt(),
        min,
        max,
    })
}

// ---------------------------------------------------------------------------
// Helpers (inputs already validated)
// ---------------------------------------------------------------------------

pub(crate) fn sorted_copy(sample: &[f64]) -> Vec<f64> {
    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Sum, mean and population variance of a validated sample.
///
/// Finite elements can still overflow these; that is reported instead of
/// returning infinities.
pub(crate) fn moments(sample: &[f64]) -> MathResult<(f64, f64, f64)> {
    let sum = finite("sum", sample.iter().sum())?;
    let mean = sum / sample.len() as f64;
    let variance = finite("variance", variance_about(sample, mean))?;
    Ok((sum, mean, variance))
}

pub(crate) fn finite(what: &str, value: f64) -> MathResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        warn!(what, "sample statistic overflows f64");
        Err(MathError::MalformedSample(format!(
            "{what} of the sample overflows the f64 range"
        )))
    }
}

pub(crate) fn variance_about(sample: &[f64], mean: f64) -> f64 {
    sample.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / sample.len() as f64
}

pub(crate) fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

pub(crate) fn quartiles_unchecked(sorted: &[f64]) -> Quartiles {
    let at = |p: f64| sorted[((sorted.len() as f64 * p).floor() as usize).min(sorted.len() - 1)];
    let (q1, q2, q3) = (at(0.25), at(0.5), at(0.75));
    Quartiles {
        q1,
        q2,
        q3,
        iqr: q3 - q1,
    }
}

pub(crate) fn min_max(sample: &[f64]) -> (f64, f64) {
    sample
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        })
}

fn outliers_unchecked(sorted: &[f64], q: &Quartiles) -> Vec<f64> {
    let lower = q.q1 - OUTLIER_FENCE * q.iqr;
    let upper = q.q3 + OUTLIER_FENCE * q.iqr;
    sorted
        .iter()
        .copied()
        .filter(|&x| x < lower || x > upper)
        .collect()
}

fn mode_of_sorted(sorted: &[f64]) -> Vec<f64> {
    let mut runs: Vec<(f64, usize)> = Vec::new();
    for &x in sorted {
        match runs.last_mut() {
            Some((value, count)) if *value == x => *count += 1,
            _ => runs.push((x, 1)),
        }
    }

    let best = runs.iter().map(|(_, c)| *c).max().unwrap_or(0);
    if best < 2 {
        return Vec::new();
    }
    runs.into_iter()
        .filter(|(_, c)| *c == best)
        .map(|(v, _)| v)
        .collect()
}

fn require_spread(std: f64, what: &str) -> MathResult<()> {
    if !(std.is_finite() && std > 0.0) {
        return Err(MathError::DegenerateInput(format!(
            "{what} is undefined for a sample with zero standard deviation"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    fn one_to_ten() -> Vec<f64> {
        (1..=10).map(f64::from).collect()
    }

    #[test]
    fn test_describe_one_to_ten() {
        let s = describe(&one_to_ten()).unwrap();
        assert_eq!(s.count, 10);
        assert_eq!(s.sum, 55.0);
        assert_eq!(s.mean, 5.5);
        assert_eq!(s.median, 5.5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 10.0);
        assert_eq!(s.range, 9.0);
        assert!(approx(s.variance, 8.25, 1e-12));
        assert!(approx(s.std_dev, 8.25_f64.sqrt(), 1e-12));
        assert!(s.mode.is_empty());
        assert!(s.outliers.is_empty());
        assert!(approx(s.skewness.unwrap(), 0.0, 1e-12));
        assert!(s.kurtosis.unwrap() < 0.0);
    }

    #[test]
    fn test_describe_ignores_input_order() {
        let shuffled = [7.0, 1.0, 10.0, 3.0, 5.0, 2.0, 9.0, 4.0, 8.0, 6.0];
        let a = describe(&shuffled).unwrap();
        let b = describe(&one_to_ten()).unwrap();
        assert_eq!(a.median, b.median);
        assert_eq!(a.quartiles, b.quartiles);
        assert_eq!((a.min, a.max), (b.min, b.max));
        assert!(approx(a.variance, b.variance, 1e-12));
    }

    #[test]
    fn test_quartiles_index_based() {
        let q = quartiles(&one_to_ten()).unwrap();
        assert_eq!(q.q1, 3.0);
        assert_eq!(q.q2, 6.0);
        assert_eq!(q.q3, 8.0);
        assert_eq!(q.iqr, 5.0);

        let q = quartiles(&[4.0]).unwrap();
        assert_eq!((q.q1, q.q2, q.q3, q.iqr), (4.0, 4.0, 4.0, 0.0));
    }

    #[test]
    fn test_outliers_iqr_rule() {
        let mut data = one_to_ten();
        data[9] = 100.0;
        let found = outliers(&data).unwrap();
        assert_eq!(found, vec![100.0]);

        let s = describe(&[-50.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]).unwrap();
        assert_eq!(s.outliers, vec![-50.0]);
    }

    #[test]
    fn test_mode() {
        let s = describe(&[3.0, 1.0, 2.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(s.mode, vec![2.0, 3.0]);
        let s = describe(&[5.0, 5.0, 5.0, 1.0]).unwrap();
        assert_eq!(s.mode, vec![5.0]);
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
    }

    #[test]
    fn test_single_value_sample() {
        let s = describe(&[42.0]).unwrap();
        assert_eq!(s.count, 1);
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.range, 0.0);
        assert!(s.skewness.is_none());
        assert!(s.kurtosis.is_none());
        assert!(s.outliers.is_empty());
    }

    #[test]
    fn test_rejects_empty_and_non_finite() {
        assert!(matches!(describe(&[]), Err(MathError::MalformedSample(_))));
        assert!(matches!(
            describe(&[1.0, f64::NAN, 3.0]),
            Err(MathError::MalformedSample(_))
        ));
        assert!(matches!(
            describe(&[f64::NEG_INFINITY]),
            Err(MathError::MalformedSample(_))
        ));
    }

    #[test]
    fn test_skewness_sign() {
        let right = [1.0, 1.0, 1.0, 2.0, 10.0];
        let s = describe(&right).unwrap();
        assert!(s.skewness.unwrap() > 0.0);

        let left: Vec<f64> = right.iter().map(|x| -x).collect();
        let s = describe(&left).unwrap();
        assert!(s.skewness.unwrap() < 0.0);
    }

    #[test]
    fn test_skewness_requires_three_values() {
        let result = skewness(&[1.0, 2.0], 1.5, 0.5);
        assert!(matches!(result, Err(MathError::MalformedSample(_))));
    }

    #[test]
    fn test_kurtosis_requires_four_values() {
        let result = kurtosis(&[1.0, 2.0, 3.0], 2.0, 0.8);
        assert!(matches!(result, Err(MathError::MalformedSample(_))));
    }

    #[test]
    fn test_higher_moments_reject_zero_spread() {
        let flat = [2.0, 2.0, 2.0, 2.0];
        assert!(matches!(
            skewness(&flat, 2.0, 0.0),
            Err(MathError::DegenerateInput(_))
        ));
        assert!(matches!(
            kurtosis(&flat, 2.0, 0.0),
            Err(MathError::DegenerateInput(_))
        ));
        let s = describe(&flat).unwrap();
        assert!(s.skewness.is_none() && s.kurtosis.is_none());
    }

    #[test]
    fn test_kurtosis_heavy_tails_positive() {
        let data = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -10.0, 10.0];
        let m = mean(&data).unwrap();
        let sd = std_dev(&data).unwrap();
        assert!(kurtosis(&data, m, sd).unwrap() > 0.0);
    }

    #[test]
    fn test_spread() {
        let s = spread(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(s.mean, 5.0);
        assert_eq!(s.std_dev, 2.0);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
    }

    #[test]
    fn test_describe_reports_sum_overflow() {
        let result = describe(&[1e308, 1e308, 1e308]);
        assert!(matches!(result, Err(MathError::MalformedSample(_))));
        assert!(matches!(mean(&[1e308, 1e308]), Err(MathError::MalformedSample(_))));
    }

    #[test]
    fn test_variance_overflow_is_reported() {
        // Sum and mean are fine here; the squared deviations are not.
        let data = [1e308, -1e308];
        assert!(matches!(variance(&data), Err(MathError::MalformedSample(_))));
        assert!(matches!(spread(&data), Err(MathError::MalformedSample(_))));
        assert!(matches!(describe(&data), Err(MathError::MalformedSample(_))));
    }

    #[test]
    fn test_large_but_representable_sample() {
        let s = describe(&[1e150, 2e150, 3e150]).unwrap();
        assert!(s.mean.is_finite() && s.variance.is_finite());
        assert!((s.range - 2e150).abs() <= 1e136);
    }
}

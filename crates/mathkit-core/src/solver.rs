use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MathError, MathResult};

/// Residuals smaller than this are reported as exactly zero.
pub const RESIDUAL_EPSILON: f64 = 1e-10;
/// Looser bound used for the per-root `valid` flag.
pub const VALIDITY_TOLERANCE: f64 = 1e-6;
/// Determinants below this magnitude make a 2×2 system singular.
pub const SINGULAR_EPSILON: f64 = 1e-10;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearSolution {
    pub x: f64,
    /// `a·x + b`, zero when within floating-point noise.
    pub verification: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootKind {
    TwoReal,
    OneReal,
    Complex,
}

impl fmt::Display for RootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TwoReal => write!(f, "two_real"),
            Self::OneReal => write!(f, "one_real"),
            Self::Complex => write!(f, "complex"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Root {
    Real(f64),
    Complex { re: f64, im: f64 },
}

impl Root {
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(x) => Some(*x),
            Self::Complex { .. } => None,
        }
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(x) => write!(f, "{x}"),
            Self::Complex { re, im } if *im < 0.0 => write!(f, "{re} - {}i", -im),
            Self::Complex { re, im } => write!(f, "{re} + {im}i"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootCheck {
    pub root: f64,
    /// `a·x² + b·x + c` evaluated at `root`.
    pub value: f64,
    pub valid: bool,
}

/// Roots of `a·x² + b·x + c = 0`.
///
/// A double root is always reported as a single-element `solutions` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadraticSolution {
    pub discriminant: f64,
    pub kind: RootKind,
    pub solutions: Vec<Root>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<Vec<RootCheck>>,
}

/// One row `a·x + b·y = c` of a 2×2 linear system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemRow {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl SystemRow {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    fn lhs(&self, x: f64, y: f64) -> f64 {
        self.a * x + self.b * y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemSolution {
    pub x: f64,
    pub y: f64,
    pub determinant: f64,
    /// Left-hand sides of both rows re-evaluated at `(x, y)`.
    pub verification: (f64, f64),
}

// ---------------------------------------------------------------------------
// Solvers
// ---------------------------------------------------------------------------

pub fn solve_linear(a: f64, b: f64) -> MathResult<LinearSolution> {
    ensure_finite(&[("a", a), ("b", b)])?;
    if a == 0.0 {
        return Err(MathError::InvalidCoefficient(
            "leading coefficient `a` must be non-zero for a linear equation".into(),
        ));
    }

    let x = positive_zero(-b / a);
    let verification = clamp_residual(a * x + b);
    ensure_representable(&[("x", x), ("verification", verification)])?;
    debug!(a, b, x, "solved linear equation");
    Ok(LinearSolution { x, verification })
}

pub fn solve_quadratic(a: f64, b: f64, c: f64) -> MathResult<QuadraticSolution> {
    ensure_finite(&[("a", a), ("b", b), ("c", c)])?;
    if a == 0.0 {
        return Err(MathError::InvalidCoefficient(
            "leading coefficient `a` must be non-zero for a quadratic equation".into(),
        ));
    }

    let discriminant = b * b - 4.0 * a * c;
    let two_a = 2.0 * a;
    ensure_representable(&[("discriminant", discriminant), ("2a", two_a)])?;

    let solution = if discriminant > 0.0 {
        let sqrt_d = discriminant.sqrt();
        let mut roots = [(-b + sqrt_d) / two_a, (-b - sqrt_d) / two_a];
        roots.sort_by(f64::total_cmp);
        let roots = roots.map(positive_zero);
        QuadraticSolution {
            discriminant,
            kind: RootKind::TwoReal,
            solutions: roots.iter().map(|&x| Root::Real(x)).collect(),
            verification: Some(roots.iter().map(|&x| check_root(a, b, c, x)).collect()),
        }
    } else if discriminant == 0.0 {
        let x = positive_zero(-b / two_a);
        QuadraticSolution {
            discriminant,
            kind: RootKind::OneReal,
            solutions: vec![Root::Real(x)],
            verification: Some(vec![check_root(a, b, c, x)]),
        }
    } else {
        let re = positive_zero(-b / two_a);
        let im = ((-discriminant).sqrt() / two_a).abs();
        QuadraticSolution {
            discriminant,
            kind: RootKind::Complex,
            solutions: vec![Root::Complex { re, im }, Root::Complex { re, im: -im }],
            verification: None,
        }
    };

    for root in &solution.solutions {
        match *root {
            Root::Real(x) => ensure_representable(&[("root", x)])?,
            Root::Complex { re, im } => {
                ensure_representable(&[("real part", re), ("imaginary part", im)])?
            }
        }
    }
    for check in solution.verification.iter().flatten() {
        ensure_representable(&[("verification", check.value)])?;
    }

    debug!(a, b, c, discriminant, kind = %solution.kind, "solved quadratic equation");
    Ok(solution)
}

/// Solve a 2×2 linear system with Cramer's rule.
///
/// Near-singular systems fail without distinguishing "no solution" from
/// "infinitely many solutions".
pub fn solve_system_2x2(eq1: SystemRow, eq2: SystemRow) -> MathResult<SystemSolution> {
    ensure_finite(&[
        ("a1", eq1.a),
        ("b1", eq1.b),
        ("c1", eq1.c),
        ("a2", eq2.a),
        ("b2", eq2.b),
        ("c2", eq2.c),
    ])?;

    let determinant = eq1.a * eq2.b - eq2.a * eq1.b;
    ensure_representable(&[("determinant", determinant)])?;
    if determinant.abs() < SINGULAR_EPSILON {
        debug!(determinant, "rejecting singular system");
        return Err(MathError::SingularSystem { determinant });
    }

    let x = positive_zero((eq1.c * eq2.b - eq2.c * eq1.b) / determinant);
    let y = positive_zero((eq1.a * eq2.c - eq2.a * eq1.c) / determinant);
    let verification = (eq1.lhs(x, y), eq2.lhs(x, y));
    ensure_representable(&[
        ("x", x),
        ("y", y),
        ("verification", verification.0),
        ("verification", verification.1),
    ])?;
    debug!(x, y, determinant, "solved 2x2 system");

    Ok(SystemSolution {
        x,
        y,
        determinant,
        verification,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_root(a: f64, b: f64, c: f64, x: f64) -> RootCheck {
    let value = clamp_residual(a * x * x + b * x + c);
    RootCheck {
        root: x,
        value,
        valid: value.abs() < VALIDITY_TOLERANCE,
    }
}

fn clamp_residual(value: f64) -> f64 {
    if value.abs() < RESIDUAL_EPSILON {
        0.0
    } else {
        value
    }
}

// -0.0 reads badly in output ("x = -0")
fn positive_zero(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

fn ensure_finite(coefficients: &[(&str, f64)]) -> MathResult<()> {
    match coefficients.iter().find(|(_, v)| !v.is_finite()) {
        Some((name, v)) => Err(MathError::InvalidCoefficient(format!(
            "coefficient `{name}` must be finite, got {v}"
        ))),
        None => Ok(()),
    }
}

/// Finite coefficients can still overflow intermediate results.
fn ensure_representable(values: &[(&str, f64)]) -> MathResult<()> {
    match values.iter().find(|(_, v)| !v.is_finite()) {
        Some((name, v)) => Err(MathError::InvalidCoefficient(format!(
            "coefficients are too large: {name} evaluates to {v}"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_solve_linear_basic() {
        let sol = solve_linear(2.0, -4.0).unwrap();
        assert_eq!(sol.x, 2.0);
        assert_eq!(sol.verification, 0.0);
    }

    #[test]
    fn test_solve_linear_satisfies_equation() {
        for a in [-7.5, -3.0, -0.25, 0.1, 1.0, 3.3, 1e4] {
            for b in [-100.0, -1.0, 0.0, 0.7, 42.0] {
                let sol = solve_linear(a, b).unwrap();
                assert!(approx(a * sol.x + b, 0.0, 1e-9), "a={a} b={b}");
            }
        }
    }

    #[test]
    fn test_solve_linear_zero_root_is_positive_zero() {
        let sol = solve_linear(-3.0, 0.0).unwrap();
        assert!(sol.x.is_sign_positive());
    }

    #[test]
    fn test_solve_linear_rejects_zero_leading() {
        let result = solve_linear(0.0, 5.0);
        assert!(matches!(result, Err(MathError::InvalidCoefficient(_))));
    }

    #[test]
    fn test_solve_linear_rejects_non_finite() {
        assert!(matches!(
            solve_linear(f64::NAN, 1.0),
            Err(MathError::InvalidCoefficient(_))
        ));
        assert!(matches!(
            solve_linear(1.0, f64::INFINITY),
            Err(MathError::InvalidCoefficient(_))
        ));
    }

    #[test]
    fn test_quadratic_two_real_sorted() {
        let sol = solve_quadratic(1.0, -5.0, 6.0).unwrap();
        assert_eq!(sol.kind, RootKind::TwoReal);
        assert_eq!(sol.discriminant, 1.0);
        assert_eq!(sol.solutions, vec![Root::Real(2.0), Root::Real(3.0)]);
        let checks = sol.verification.unwrap();
        assert_eq!(checks.len(), 2);
        assert!(checks.iter().all(|c| c.valid && c.value == 0.0));
    }

    #[test]
    fn test_quadratic_negative_leading_still_ascending() {
        let sol = solve_quadratic(-2.0, 2.0, 12.0).unwrap();
        let roots: Vec<f64> = sol.solutions.iter().filter_map(Root::as_real).collect();
        assert_eq!(roots, vec![-2.0, 3.0]);
    }

    #[test]
    fn test_quadratic_roots_satisfy_equation() {
        let cases = [
            (1.0, 0.0, -2.0),
            (3.0, 7.0, 1.0),
            (-0.5, 4.0, 9.0),
            (2.0, -11.0, 5.0),
        ];
        for (a, b, c) in cases {
            let sol = solve_quadratic(a, b, c).unwrap();
            assert_eq!(sol.kind, RootKind::TwoReal);
            let roots: Vec<f64> = sol.solutions.iter().filter_map(Root::as_real).collect();
            assert_eq!(roots.len(), 2);
            assert!(roots[0] < roots[1]);
            for x in roots {
                assert!(approx(a * x * x + b * x + c, 0.0, 1e-9), "a={a} b={b} c={c}");
            }
        }
    }

    #[test]
    fn test_quadratic_double_root_single_entry() {
        let sol = solve_quadratic(1.0, -4.0, 4.0).unwrap();
        assert_eq!(sol.kind, RootKind::OneReal);
        assert_eq!(sol.discriminant, 0.0);
        assert_eq!(sol.solutions, vec![Root::Real(2.0)]);
        assert_eq!(sol.verification.unwrap().len(), 1);
    }

    #[test]
    fn test_quadratic_double_root_equals_vertex() {
        let (a, b, c) = (4.0, 4.0, 1.0);
        let sol = solve_quadratic(a, b, c).unwrap();
        assert_eq!(sol.solutions, vec![Root::Real(-b / (2.0 * a))]);
    }

    #[test]
    fn test_quadratic_complex_conjugates() {
        let sol = solve_quadratic(1.0, 2.0, 5.0).unwrap();
        assert_eq!(sol.kind, RootKind::Complex);
        assert_eq!(sol.discriminant, -16.0);
        assert!(sol.verification.is_none());
        assert_eq!(
            sol.solutions,
            vec![
                Root::Complex { re: -1.0, im: 2.0 },
                Root::Complex { re: -1.0, im: -2.0 }
            ]
        );
    }

    #[test]
    fn test_quadratic_complex_negative_leading() {
        let sol = solve_quadratic(-1.0, 0.0, -4.0).unwrap();
        match (sol.solutions[0], sol.solutions[1]) {
            (Root::Complex { re: r1, im: i1 }, Root::Complex { re: r2, im: i2 }) => {
                assert_eq!(r1, r2);
                assert_eq!(r1, 0.0);
                assert_eq!(i1, -i2);
                assert_eq!(i1, 2.0);
            }
            other => panic!("expected complex pair, got {other:?}"),
        }
    }

    #[test]
    fn test_quadratic_rejects_zero_leading() {
        let result = solve_quadratic(0.0, 2.0, 1.0);
        assert!(matches!(result, Err(MathError::InvalidCoefficient(_))));
    }

    #[test]
    fn test_root_display() {
        assert_eq!(Root::Real(1.5).to_string(), "1.5");
        assert_eq!(Root::Complex { re: -1.0, im: 2.0 }.to_string(), "-1 + 2i");
        assert_eq!(Root::Complex { re: -1.0, im: -2.0 }.to_string(), "-1 - 2i");
    }

    #[test]
    fn test_system_unique_solution() {
        // 2x + 3y = 8, x - y = -1  =>  x = 1, y = 2
        let sol =
            solve_system_2x2(SystemRow::new(2.0, 3.0, 8.0), SystemRow::new(1.0, -1.0, -1.0))
                .unwrap();
        assert!(approx(sol.x, 1.0, 1e-12));
        assert!(approx(sol.y, 2.0, 1e-12));
        assert_eq!(sol.determinant, -5.0);
        assert!(approx(sol.verification.0, 8.0, 1e-9));
        assert!(approx(sol.verification.1, -1.0, 1e-9));
    }

    #[test]
    fn test_system_singular_parallel() {
        let result =
            solve_system_2x2(SystemRow::new(1.0, 2.0, 3.0), SystemRow::new(2.0, 4.0, 7.0));
        assert!(matches!(result, Err(MathError::SingularSystem { .. })));
    }

    #[test]
    fn test_system_singular_coincident() {
        let result =
            solve_system_2x2(SystemRow::new(1.0, 2.0, 3.0), SystemRow::new(2.0, 4.0, 6.0));
        assert!(matches!(result, Err(MathError::SingularSystem { .. })));
    }

    #[test]
    fn test_system_near_singular_rejected() {
        let result = solve_system_2x2(
            SystemRow::new(1.0, 1.0, 2.0),
            SystemRow::new(1.0, 1.0 + 1e-11, 2.0),
        );
        match result {
            Err(MathError::SingularSystem { determinant }) => assert!(determinant.abs() < 1e-10),
            other => panic!("expected singular system, got {other:?}"),
        }
    }

    #[test]
    fn test_quadratic_serializes_roots_untagged() {
        let sol = solve_quadratic(1.0, 2.0, 5.0).unwrap();
        let json = serde_json::to_value(&sol).unwrap();
        assert_eq!(json["kind"], "complex");
        assert_eq!(json["solutions"][0]["re"], -1.0);
        assert!(json.get("verification").is_none());

        let sol = solve_quadratic(1.0, -5.0, 6.0).unwrap();
        let json = serde_json::to_value(&sol).unwrap();
        assert_eq!(json["solutions"][0], 2.0);
    }

    #[test]
    fn test_linear_overflowing_root_is_rejected() {
        assert!(matches!(
            solve_linear(1e-300, 1e300),
            Err(MathError::InvalidCoefficient(_))
        ));
    }

    #[test]
    fn test_quadratic_overflowing_discriminant_is_rejected() {
        assert!(matches!(
            solve_quadratic(1.0, 1e200, 1.0),
            Err(MathError::InvalidCoefficient(_))
        ));
        // 4ac alone overflows
        assert!(matches!(
            solve_quadratic(1e200, 0.0, -1e200),
            Err(MathError::InvalidCoefficient(_))
        ));
    }

    #[test]
    fn test_quadratic_overflowing_root_is_rejected() {
        // discriminant is fine, but one root is -b/a = -1e310
        assert!(matches!(
            solve_quadratic(1e-300, 1e10, 0.0),
            Err(MathError::InvalidCoefficient(_))
        ));
    }

    #[test]
    fn test_system_overflowing_determinant_is_rejected() {
        let result = solve_system_2x2(
            SystemRow::new(1e200, 1.0, 1.0),
            SystemRow::new(1.0, 1e200, 1.0),
        );
        assert!(matches!(result, Err(MathError::InvalidCoefficient(_))));
    }
}

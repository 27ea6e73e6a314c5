//! Human-readable rendering of coefficient tuples.

/// Render `a·x² + b·x + c = 0`, e.g. `x² - 5x + 6 = 0`.
pub fn format_quadratic(a: f64, b: f64, c: f64) -> String {
    let mut out = leading_term(a, "x²");
    push_term(&mut out, b, "x");
    push_term(&mut out, c, "");
    out.push_str(" = 0");
    out
}

/// Render `a·x + b = 0`, e.g. `2x + 3 = 0`.
pub fn format_linear(a: f64, b: f64) -> String {
    let mut out = leading_term(a, "x");
    push_term(&mut out, b, "");
    out.push_str(" = 0");
    out
}

fn leading_term(coef: f64, var: &str) -> String {
    if coef == 1.0 {
        var.to_string()
    } else if coef == -1.0 {
        format!("-{var}")
    } else {
        format!("{coef}{var}")
    }
}

fn push_term(out: &mut String, coef: f64, var: &str) {
    if coef == 0.0 {
        return;
    }
    out.push_str(if coef < 0.0 { " - " } else { " + " });
    let magnitude = coef.abs();
    if magnitude == 1.0 && !var.is_empty() {
        out.push_str(var);
    } else {
        out.push_str(&format!("{magnitude}{var}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_quadratic_unit_leading() {
        assert_eq!(format_quadratic(1.0, -5.0, 6.0), "x² - 5x + 6 = 0");
    }

    #[test]
    fn test_format_quadratic_omits_zero_terms() {
        assert_eq!(format_quadratic(2.0, 0.0, -8.0), "2x² - 8 = 0");
        assert_eq!(format_quadratic(-1.0, 1.0, 0.0), "-x² + x = 0");
        assert_eq!(format_quadratic(3.0, 0.0, 0.0), "3x² = 0");
    }

    #[test]
    fn test_format_linear() {
        assert_eq!(format_linear(2.0, 3.0), "2x + 3 = 0");
        assert_eq!(format_linear(-1.0, -7.0), "-x - 7 = 0");
        assert_eq!(format_linear(4.0, 0.0), "4x = 0");
    }

    #[test]
    fn test_format_fractional_coefficients() {
        assert_eq!(format_linear(0.5, -1.5), "0.5x - 1.5 = 0");
    }
}

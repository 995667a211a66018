//! Number formatting shared by `as.character`, `deparse` and `paste`
//!
//! Doubles are printed with at most 15 significant digits, choosing fixed or
//! scientific notation by whichever is narrower (fixed wins ties). Exponents
//! carry a sign and at least two digits: `1e+05`, `1.5e-10`.

use crate::na;
use num::complex::Complex64;

/// Significant digits used when converting doubles to text
pub const DOUBLE_DIGITS: usize = 15;

/// Format a double with up to `digits` significant digits
pub fn format_double(x: f64, digits: usize) -> String {
    format_double_scipen(x, digits, 0)
}

/// As [`format_double`], with a penalty added to the scientific width
pub fn format_double_scipen(x: f64, digits: usize, scipen: i64) -> String {
    if na::is_na_real(x) {
        return "NA".to_string();
    }
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }
    if x == 0.0 {
        return "0".to_string();
    }

    let digits = digits.clamp(1, 22);
    let sci = format!("{:.*e}", digits - 1, x);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i64>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    let neg = mantissa.starts_with('-');
    let mut sig: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    while sig.len() > 1 && sig.ends_with('0') {
        sig.pop();
    }
    let nsig = sig.len() as i64;

    let rgt = if exp >= 0 { (nsig - 1 - exp).max(0) } else { nsig - 1 - exp };
    let left = if exp >= 0 { exp + 1 } else { 1 };
    let fixed_width = neg as i64 + left + if rgt > 0 { rgt + 1 } else { 0 };
    let exp_digits = if exp.abs() >= 100 { 3 } else { 2 };
    let sci_width = neg as i64 + nsig + if nsig > 1 { 1 } else { 0 } + 2 + exp_digits;

    let mut out = String::new();
    if neg {
        out.push('-');
    }
    if fixed_width <= sci_width + scipen {
        if exp >= 0 {
            let int_len = (exp + 1) as usize;
            if sig.len() <= int_len {
                out.push_str(&sig);
                out.extend(std::iter::repeat('0').take(int_len - sig.len()));
            } else {
                out.push_str(&sig[..int_len]);
                out.push('.');
                out.push_str(&sig[int_len..]);
            }
        } else {
            out.push_str("0.");
            out.extend(std::iter::repeat('0').take((-exp - 1) as usize));
            out.push_str(&sig);
        }
    } else {
        out.push_str(&sig[..1]);
        if sig.len() > 1 {
            out.push('.');
            out.push_str(&sig[1..]);
        }
        out.push('e');
        out.push(if exp < 0 { '-' } else { '+' });
        out.push_str(&format!("{:02}", exp.abs()));
    }
    out
}

/// `1+2i` style
pub fn format_complex(z: Complex64, digits: usize) -> String {
    if na::is_na_complex(z) {
        return "NA".to_string();
    }
    let re = format_double(z.re, digits);
    let im = format_double(z.im.abs(), digits);
    let sign = if z.im < 0.0 || (z.im == 0.0 && z.im.is_sign_negative()) {
        '-'
    } else {
        '+'
    };
    format!("{}{}{}i", re, sign, im)
}

pub fn format_integer(i: i32) -> String {
    if i == na::NA_INTEGER {
        "NA".to_string()
    } else {
        i.to_string()
    }
}

pub fn format_logical(b: Option<bool>) -> &'static str {
    match b {
        Some(true) => "TRUE",
        Some(false) => "FALSE",
        None => "NA",
    }
}

pub fn format_raw(b: u8) -> String {
    format!("{:02x}", b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1.0, "1")]
    #[case(0.1, "0.1")]
    #[case(100.0, "100")]
    #[case(100000.0, "1e+05")]
    #[case(123456.0, "123456")]
    #[case(0.0001, "1e-04")]
    #[case(1e15, "1e+15")]
    #[case(1.0 / 3.0, "0.333333333333333")]
    #[case(-2.5, "-2.5")]
    #[case(1e-300, "1e-300")]
    #[case(3.14159, "3.14159")]
    #[case(1234567.0, "1234567")]
    fn test_format_double(#[case] x: f64, #[case] expected: &str) {
        assert_eq!(format_double(x, DOUBLE_DIGITS), expected);
    }

    #[test]
    fn test_format_special_doubles() {
        assert_eq!(format_double(na::na_real(), 15), "NA");
        assert_eq!(format_double(f64::NAN, 15), "NaN");
        assert_eq!(format_double(f64::NEG_INFINITY, 15), "-Inf");
    }

    #[test]
    fn test_scipen_prefers_fixed() {
        assert_eq!(format_double_scipen(100000.0, 15, 1), "100000");
    }

    #[test]
    fn test_format_complex() {
        assert_eq!(format_complex(Complex64::new(1.0, 2.0), 15), "1+2i");
        assert_eq!(format_complex(Complex64::new(0.0, -1.5), 15), "0-1.5i");
    }
}

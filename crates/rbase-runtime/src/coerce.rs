//! Element-kind coercion
//!
//! Conversions follow the kind ladder raw < logical < integer < double <
//! complex < character < list. Coercion never touches the source storage: a
//! same-kind, attribute-free input is returned as the identical instance,
//! anything else yields a fresh attribute-free vector. Lossy conversions are
//! reported through [`CoercionNotes`] so the caller can raise the warnings.

use crate::deparse::deparse_value;
use crate::error::{Message, RResult};
use crate::format::{format_complex, format_double, format_integer, format_logical, format_raw, DOUBLE_DIGITS};
use crate::na::{self, NA_INTEGER};
use crate::value::{Kind, RStr, Value, Vector, VectorData};
use num::complex::Complex64;

/// Lossy events observed during a coercion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoercionNotes {
    pub nas_introduced: bool,
    pub int_range: bool,
    pub imaginary_discarded: bool,
    pub out_of_range_raw: bool,
}

impl CoercionNotes {
    /// Warnings to raise, in a stable order
    pub fn warnings(&self) -> Vec<Message> {
        let mut out = Vec::new();
        if self.nas_introduced {
            out.push(Message::NasIntroducedByCoercion);
        }
        if self.int_range {
            out.push(Message::NasIntroducedByCoercionIntRange);
        }
        if self.imaginary_discarded {
            out.push(Message::ImaginaryPartsDiscarded);
        }
        if self.out_of_range_raw {
            out.push(Message::OutOfRangeRaw);
        }
        out
    }
}

/// Result of [`coerce`]
#[derive(Debug, Clone)]
pub struct Coerced {
    pub vector: Vector,
    pub notes: CoercionNotes,
}

// ============================================================================
// Element conversions
// ============================================================================

pub fn logical_to_int(b: Option<bool>) -> i32 {
    match b {
        Some(b) => b as i32,
        None => NA_INTEGER,
    }
}

pub fn logical_to_double(b: Option<bool>) -> f64 {
    match b {
        Some(b) => b as i32 as f64,
        None => na::na_real(),
    }
}

pub fn int_to_double(i: i32) -> f64 {
    if i == NA_INTEGER {
        na::na_real()
    } else {
        i as f64
    }
}

pub fn int_to_logical(i: i32) -> Option<bool> {
    if i == NA_INTEGER {
        None
    } else {
        Some(i != 0)
    }
}

pub fn double_to_logical(x: f64) -> Option<bool> {
    if x.is_nan() {
        None
    } else {
        Some(x != 0.0)
    }
}

/// Truncating conversion; `Err(())` when out of integer range
pub fn double_to_int(x: f64) -> Result<i32, ()> {
    if x.is_nan() {
        return Ok(NA_INTEGER);
    }
    if x >= 2147483648.0 || x <= -2147483648.0 {
        return Err(());
    }
    Ok(x.trunc() as i32)
}

pub fn double_to_complex(x: f64) -> Complex64 {
    if na::is_na_real(x) {
        na::na_complex()
    } else {
        Complex64::new(x, 0.0)
    }
}

pub fn double_to_string(x: f64) -> String {
    format_double(x, DOUBLE_DIGITS)
}

/// Parse a string as a double the way the reader does: surrounding
/// whitespace ignored, `NA` is NA, hex and `Inf`/`NaN` accepted.
/// `None` means unparseable.
pub fn parse_double(s: &str) -> Option<f64> {
    let t = s.trim();
    if t == "NA" {
        return Some(na::na_real());
    }
    let (neg, body) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    let magnitude = if let Some(hex) = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
    {
        if hex.is_empty() {
            return None;
        }
        u64::from_str_radix(hex, 16).ok()? as f64
    } else {
        match body {
            "Inf" | "inf" | "infinity" | "Infinity" => f64::INFINITY,
            "NaN" => f64::NAN,
            _ => {
                if body.is_empty()
                    || !body
                        .chars()
                        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
                {
                    return None;
                }
                body.parse::<f64>().ok()?
            }
        }
    };
    Some(if neg { -magnitude } else { magnitude })
}

/// Parse `a`, `bi`, `a+bi` or `a-bi`
pub fn parse_complex(s: &str) -> Option<Complex64> {
    let t = s.trim();
    if t == "NA" {
        return Some(na::na_complex());
    }
    if let Some(re) = parse_double(t) {
        return Some(Complex64::new(re, 0.0));
    }
    let body = t.strip_suffix('i')?;
    let bytes = body.as_bytes();
    let split = (1..bytes.len())
        .rev()
        .find(|&i| matches!(bytes[i], b'+' | b'-') && !matches!(bytes[i - 1], b'e' | b'E'));
    match split {
        Some(i) => {
            let re = parse_double(&body[..i])?;
            let im = parse_double(&body[i..])?;
            Some(Complex64::new(re, im))
        }
        None => Some(Complex64::new(0.0, parse_double(body)?)),
    }
}

pub fn parse_logical(s: &str) -> Option<bool> {
    match s {
        "TRUE" | "true" | "T" | "True" => Some(true),
        "FALSE" | "false" | "F" | "False" => Some(false),
        _ => None,
    }
}

fn str_value(s: String) -> Option<RStr> {
    Some(RStr::from(s))
}

// ============================================================================
// Vector conversions
// ============================================================================

/// Convert `v` to `kind`, dropping attributes
pub fn coerce(v: &Vector, kind: Kind) -> RResult<Coerced> {
    let mut notes = CoercionNotes::default();
    if v.kind() == kind {
        let vector = if v.has_attributes() {
            v.clone().strip_attributes()
        } else {
            v.clone()
        };
        return Ok(Coerced { vector, notes });
    }
    let data = coerce_data(v.data(), kind, &mut notes)?;
    let vector = match kind {
        // conversions from complete sources that cannot introduce NA
        Kind::Double | Kind::Complex | Kind::Character
            if v.is_complete() && v.kind() < kind && v.kind() != Kind::Character =>
        {
            Vector::with_completeness(data, true)
        }
        _ => Vector::new(data),
    };
    Ok(Coerced { vector, notes })
}

/// Convert storage to `kind`
pub fn coerce_data(data: &VectorData, kind: Kind, notes: &mut CoercionNotes) -> RResult<VectorData> {
    if data.kind() == kind {
        return Ok(data.clone());
    }
    if let VectorData::List(items) = data {
        return list_to_atomic(items, kind, notes);
    }
    let out = match kind {
        Kind::Logical => VectorData::Logical(to_logical(data)),
        Kind::Integer => VectorData::Integer(to_integer(data, notes)),
        Kind::Double => VectorData::Double(to_double(data, notes)),
        Kind::Complex => VectorData::Complex(to_complex(data, notes)),
        Kind::Character => VectorData::Character(to_character(data)),
        Kind::Raw => VectorData::Raw(to_raw(data, notes)),
        Kind::List => VectorData::List((0..data.len()).map(|i| data.element(i)).collect()),
    };
    Ok(out)
}

fn to_logical(data: &VectorData) -> Vec<Option<bool>> {
    match data {
        VectorData::Logical(v) => v.clone(),
        VectorData::Integer(v) => v.iter().map(|&i| int_to_logical(i)).collect(),
        VectorData::Double(v) => v.iter().map(|&x| double_to_logical(x)).collect(),
        VectorData::Complex(v) => v
            .iter()
            .map(|z| {
                if z.re.is_nan() || z.im.is_nan() {
                    None
                } else {
                    Some(z.re != 0.0 || z.im != 0.0)
                }
            })
            .collect(),
        VectorData::Character(v) => v
            .iter()
            .map(|s| s.as_deref().and_then(parse_logical))
            .collect(),
        VectorData::Raw(v) => v.iter().map(|&b| Some(b != 0)).collect(),
        VectorData::List(_) => Vec::new(),
    }
}

fn noted_double_to_int(x: f64, notes: &mut CoercionNotes) -> i32 {
    double_to_int(x).unwrap_or_else(|()| {
        notes.int_range = true;
        NA_INTEGER
    })
}

fn to_integer(data: &VectorData, notes: &mut CoercionNotes) -> Vec<i32> {
    match data {
        VectorData::Logical(v) => v.iter().map(|&b| logical_to_int(b)).collect(),
        VectorData::Integer(v) => v.clone(),
        VectorData::Double(v) => v.iter().map(|&x| noted_double_to_int(x, notes)).collect(),
        VectorData::Complex(v) => {
            if v.iter().any(|z| !z.im.is_nan() && z.im != 0.0) {
                notes.imaginary_discarded = true;
            }
            v.iter()
                .map(|z| {
                    if na::is_na_complex(*z) {
                        NA_INTEGER
                    } else {
                        noted_double_to_int(z.re, notes)
                    }
                })
                .collect()
        }
        VectorData::Character(v) => v
            .iter()
            .map(|s| match s {
                None => NA_INTEGER,
                Some(s) => match parse_double(s) {
                    Some(x) => noted_double_to_int(x, notes),
                    None => {
                        notes.nas_introduced = true;
                        NA_INTEGER
                    }
                },
            })
            .collect(),
        VectorData::Raw(v) => v.iter().map(|&b| b as i32).collect(),
        VectorData::List(_) => Vec::new(),
    }
}

fn to_double(data: &VectorData, notes: &mut CoercionNotes) -> Vec<f64> {
    match data {
        VectorData::Logical(v) => v.iter().map(|&b| logical_to_double(b)).collect(),
        VectorData::Integer(v) => v.iter().map(|&i| int_to_double(i)).collect(),
        VectorData::Double(v) => v.clone(),
        VectorData::Complex(v) => {
            if v.iter().any(|z| !z.im.is_nan() && z.im != 0.0) {
                notes.imaginary_discarded = true;
            }
            v.iter()
                .map(|z| if na::is_na_complex(*z) { na::na_real() } else { z.re })
                .collect()
        }
        VectorData::Character(v) => v
            .iter()
            .map(|s| match s {
                None => na::na_real(),
                Some(s) => parse_double(s).unwrap_or_else(|| {
                    notes.nas_introduced = true;
                    na::na_real()
                }),
            })
            .collect(),
        VectorData::Raw(v) => v.iter().map(|&b| b as f64).collect(),
        VectorData::List(_) => Vec::new(),
    }
}

fn to_complex(data: &VectorData, notes: &mut CoercionNotes) -> Vec<Complex64> {
    match data {
        VectorData::Character(v) => v
            .iter()
            .map(|s| match s {
                None => na::na_complex(),
                Some(s) => parse_complex(s).unwrap_or_else(|| {
                    notes.nas_introduced = true;
                    na::na_complex()
                }),
            })
            .collect(),
        VectorData::Complex(v) => v.clone(),
        other => to_double(other, notes)
            .into_iter()
            .map(double_to_complex)
            .collect(),
    }
}

fn to_character(data: &VectorData) -> Vec<Option<RStr>> {
    match data {
        VectorData::Logical(v) => v
            .iter()
            .map(|&b| b.map(|_| RStr::from(format_logical(b))))
            .collect(),
        VectorData::Integer(v) => v
            .iter()
            .map(|&i| if i == NA_INTEGER { None } else { str_value(format_integer(i)) })
            .collect(),
        VectorData::Double(v) => v
            .iter()
            .map(|&x| if na::is_na_real(x) { None } else { str_value(double_to_string(x)) })
            .collect(),
        VectorData::Complex(v) => v
            .iter()
            .map(|&z| {
                if na::is_na_complex(z) {
                    None
                } else {
                    str_value(format_complex(z, DOUBLE_DIGITS))
                }
            })
            .collect(),
        VectorData::Character(v) => v.clone(),
        VectorData::Raw(v) => v.iter().map(|&b| str_value(format_raw(b))).collect(),
        VectorData::List(_) => Vec::new(),
    }
}

fn to_raw(data: &VectorData, notes: &mut CoercionNotes) -> Vec<u8> {
    let ints = to_integer(data, notes);
    ints.into_iter()
        .map(|i| {
            if (0..=255).contains(&i) {
                i as u8
            } else {
                notes.out_of_range_raw = true;
                0
            }
        })
        .collect()
}

/// Lists convert element-wise when every element is a length-one atomic
/// vector; character targets deparse anything else.
fn list_to_atomic(items: &[Value], kind: Kind, notes: &mut CoercionNotes) -> RResult<VectorData> {
    let mut out = VectorData::na_of(kind, items.len());
    for (i, item) in items.iter().enumerate() {
        let element = match item {
            Value::Vector(v) if v.len() == 1 && v.kind().is_atomic() => {
                coerce_data(v.data(), kind, notes)?
            }
            other if kind == Kind::Character => {
                VectorData::Character(vec![str_value(deparse_value(other))])
            }
            _ => {
                return Err(Message::CannotCoerce("list".to_string(), kind.type_name().to_string()).into())
            }
        };
        match (&mut out, element) {
            (VectorData::Logical(o), VectorData::Logical(e)) => o[i] = e[0],
            (VectorData::Integer(o), VectorData::Integer(e)) => o[i] = e[0],
            (VectorData::Double(o), VectorData::Double(e)) => o[i] = e[0],
            (VectorData::Complex(o), VectorData::Complex(e)) => o[i] = e[0],
            (VectorData::Character(o), VectorData::Character(e)) => o[i] = e[0].clone(),
            (VectorData::Raw(o), VectorData::Raw(e)) => o[i] = e[0],
            _ => {}
        }
    }
    Ok(out)
}

/// Common kind of several vectors (the highest on the ladder)
pub fn common_kind(kinds: impl IntoIterator<Item = Kind>) -> Option<Kind> {
    kinds.into_iter().max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_same_kind_without_attributes_is_identical() {
        let v = Vector::double(vec![1.0, 2.0]);
        let out = coerce(&v, Kind::Double).unwrap();
        assert!(out.vector.ptr_eq(&v));
    }

    #[test]
    fn test_same_kind_with_attributes_is_stripped() {
        let mut v = Vector::double(vec![1.0]);
        v.set_attr("foo", Value::int(1));
        let out = coerce(&v, Kind::Double).unwrap();
        assert!(!out.vector.has_attributes());
    }

    #[test]
    fn test_character_to_double_warns_on_garbage() {
        let v = Vector::strings(["1.5", "abc", "NA"]);
        let out = coerce(&v, Kind::Double).unwrap();
        assert!(out.notes.nas_introduced);
        match out.vector.data() {
            VectorData::Double(d) => {
                assert_eq!(d[0], 1.5);
                assert!(na::is_na_real(d[1]));
                assert!(na::is_na_real(d[2]));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(!out.vector.is_complete());
    }

    #[test]
    fn test_double_to_integer_range() {
        let v = Vector::double(vec![2.9, -2.9, 3e10]);
        let out = coerce(&v, Kind::Integer).unwrap();
        assert!(out.notes.int_range);
        assert_eq!(out.vector, Vector::integer(vec![2, -2, NA_INTEGER]));
    }

    #[rstest]
    #[case("1", Some(1.0))]
    #[case(" 2.5 ", Some(2.5))]
    #[case("0x1A", Some(26.0))]
    #[case("-Inf", Some(f64::NEG_INFINITY))]
    #[case("1e3", Some(1000.0))]
    #[case("abc", None)]
    #[case("", None)]
    fn test_parse_double(#[case] input: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_double(input), expected);
    }

    #[test]
    fn test_parse_complex() {
        assert_eq!(parse_complex("1+2i"), Some(Complex64::new(1.0, 2.0)));
        assert_eq!(parse_complex("-3i"), Some(Complex64::new(0.0, -3.0)));
        assert_eq!(parse_complex("1e-2-1i"), Some(Complex64::new(0.01, -1.0)));
        assert_eq!(parse_complex("x"), None);
    }

    #[test]
    fn test_list_to_double() {
        let list = Vector::list(vec![Value::int(1), Value::dbl(2.5)]);
        let out = coerce(&list, Kind::Double).unwrap();
        assert_eq!(out.vector, Vector::double(vec![1.0, 2.5]));

        let bad = Vector::list(vec![Value::Vector(Vector::integer(vec![1, 2]))]);
        let err = coerce(&bad, Kind::Double).unwrap_err();
        assert_eq!(
            err.message,
            Message::CannotCoerce("list".to_string(), "double".to_string())
        );
    }

    #[test]
    fn test_logical_to_character() {
        let v = Vector::logical(vec![Some(true), None]);
        let out = coerce(&v, Kind::Character).unwrap();
        assert_eq!(out.vector, Vector::character(vec![Some("TRUE".into()), None]));
    }

    #[test]
    fn test_raw_out_of_range() {
        let v = Vector::integer(vec![1, 300]);
        let out = coerce(&v, Kind::Raw).unwrap();
        assert!(out.notes.out_of_range_raw);
        assert_eq!(out.vector, Vector::raw(vec![1, 0]));
    }
}

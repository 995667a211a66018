//! Shared helpers for integration tests
//!
//! Every helper evaluates in a fresh [`Session`] unless one is passed in.

#![allow(dead_code)]

use rbase_runtime::na::na_real;
use rbase_runtime::{RError, RStr, RWarning, Session, Value, Vector, VectorData};

use pretty_assertions::assert_eq;

/// Evaluate source in a fresh session
pub fn eval(source: &str) -> Result<Value, RError> {
    Session::new().eval(source)
}

/// Evaluate and unwrap
pub fn eval_ok(source: &str) -> Value {
    match eval(source) {
        Ok(value) => value,
        Err(err) => panic!("`{}` failed: {}", source, err),
    }
}

/// Evaluate and expect an error
pub fn eval_err(source: &str) -> RError {
    match eval(source) {
        Ok(value) => panic!("`{}` succeeded with {:?}", source, value),
        Err(err) => err,
    }
}

/// Evaluate and return the value together with the warnings raised
pub fn eval_warned(source: &str) -> (Value, Vec<RWarning>) {
    let session = Session::new();
    let value = session.eval(source).unwrap_or_else(|err| panic!("`{}` failed: {}", source, err));
    (value, session.take_warnings())
}

/// Assert that `source` evaluates to `expected`
pub fn assert_eval(source: &str, expected: Value) {
    assert_eq!(eval_ok(source), expected, "evaluating `{}`", source);
}

/// Assert that `source` fails with exactly `message`
pub fn assert_error_message(source: &str, message: &str) {
    assert_eq!(eval_err(source).message.to_string(), message, "evaluating `{}`", source);
}

// ============================================================================
// Value builders
// ============================================================================

pub fn dbl(values: &[f64]) -> Value {
    Value::Vector(Vector::double(values.to_vec()))
}

pub fn int(values: &[i32]) -> Value {
    Value::Vector(Vector::integer(values.to_vec()))
}

pub fn lgl(values: &[Option<bool>]) -> Value {
    Value::Vector(Vector::logical(values.to_vec()))
}

pub fn strs(values: &[&str]) -> Value {
    Value::Vector(Vector::strings(values))
}

/// Character vector where `None` is NA
pub fn chr(values: &[Option<&str>]) -> Value {
    Value::Vector(Vector::character(values.iter().map(|s| s.map(RStr::from)).collect()))
}

pub const NA: f64 = f64::NAN;

/// Doubles where `f64::NAN` in the input stands for NA
pub fn dbl_na(values: &[f64]) -> Value {
    dbl(&values.iter().map(|&x| if x.is_nan() { na_real() } else { x }).collect::<Vec<_>>())
}

/// Names of a vector value
pub fn names(value: &Value) -> Vec<Option<String>> {
    value
        .as_vector()
        .and_then(Vector::names)
        .map(|n| n.iter().map(|s| s.as_deref().map(str::to_string)).collect())
        .unwrap_or_default()
}

/// Double elements of a value
pub fn doubles(value: &Value) -> Vec<f64> {
    match value.as_vector().map(Vector::data) {
        Some(VectorData::Double(d)) => d.clone(),
        other => panic!("expected double vector, got {:?}", other),
    }
}

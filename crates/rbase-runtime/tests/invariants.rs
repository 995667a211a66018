//! Property tests for NA handling shared by every builtin
//!
//! - the completeness flag is never `true` while an NA is present
//! - cumulative functions are NA from the first NA onwards

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rbase_runtime::na::{is_na_real, na_real};
use rbase_runtime::{Session, Value, Vector, VectorData};

fn with_na(values: Vec<f64>, at: usize) -> Vec<f64> {
    let mut values = values;
    let at = at % values.len();
    values[at] = na_real();
    values
}

fn result_vector(value: Value) -> Vector {
    match value {
        Value::Vector(v) => v,
        other => panic!("expected vector, got {:?}", other),
    }
}

proptest! {
    #[test]
    fn cumulative_functions_taint_forward(
        values in prop::collection::vec(-1e6f64..1e6, 1..40),
        at in 0usize..40,
        name in prop::sample::select(vec!["cumsum", "cumprod", "cummax", "cummin"]),
    ) {
        let values = with_na(values, at);
        let first_na = values.iter().position(|&x| is_na_real(x)).unwrap();
        let session = Session::new();
        let input = Value::Vector(Vector::double(values));
        let out = result_vector(session.call(name, vec![(None, input)]).unwrap());
        prop_assert!(!out.is_complete());
        let VectorData::Double(out) = out.data() else { panic!("not double") };
        for (i, &x) in out.iter().enumerate() {
            prop_assert_eq!(i >= first_na, is_na_real(x), "{} at {}", name, i);
        }
    }

    #[test]
    fn completeness_flag_never_lies(
        values in prop::collection::vec(-1e3f64..1e3, 1..30),
        at in 0usize..30,
        name in prop::sample::select(vec!["abs", "sqrt", "round", "rev", "sort", "as.character", "as.integer", "cumsum"]),
    ) {
        let session = Session::new();
        let input = Value::Vector(Vector::double(with_na(values, at)));
        let out = result_vector(session.call(name, vec![(None, input)]).unwrap());
        if out.data().has_na() {
            prop_assert!(!out.is_complete(), "{} returned NA flagged complete", name);
        }
    }

    #[test]
    fn complete_inputs_stay_complete_through_cumsum(
        values in prop::collection::vec(-1e3f64..1e3, 0..30),
    ) {
        let session = Session::new();
        let input = Value::Vector(Vector::double(values.clone()));
        let out = result_vector(session.call("cumsum", vec![(None, input)]).unwrap());
        prop_assert_eq!(out.len(), values.len());
        prop_assert!(!out.data().has_na());
    }

    #[test]
    fn nchar_counts_characters(words in prop::collection::vec("[a-z]{0,8}", 1..10)) {
        let session = Session::new();
        let input = Value::Vector(Vector::strings(&words));
        let lengths = result_vector(session.call("nchar", vec![(None, input)]).unwrap());
        let expected: Vec<i32> = words.iter().map(|w| w.chars().count() as i32).collect();
        let VectorData::Integer(lengths) = lengths.data() else { panic!("not integer") };
        prop_assert_eq!(lengths, &expected);
    }
}

#[test]
fn test_sort_drops_na_and_stays_complete() {
    let session = Session::new();
    let sorted = result_vector(session.eval("sort(c(3, NA, 1))").unwrap());
    assert!(sorted.is_complete());
    assert_eq!(Value::Vector(sorted), Value::Vector(Vector::double(vec![1.0, 3.0])));
}

//! End-to-end builtin behaviour through the session API

mod common;

use common::*;
use pretty_assertions::assert_eq;
use rbase_runtime::na::NA_INTEGER;
use rbase_runtime::{Message, Value};
use rstest::rstest;

// ============================================================================
// any / all
// ============================================================================

#[rstest]
#[case("all(NULL)", Value::lgl(true))]
#[case("all()", Value::lgl(true))]
#[case("all(c(TRUE, NA), na.rm = FALSE)", Value::na_logical())]
#[case("all(c(TRUE, NA), na.rm = TRUE)", Value::lgl(true))]
#[case("any(c(FALSE, NA))", Value::na_logical())]
#[case("any(FALSE, FALSE, TRUE, stop('should not reach'))", Value::lgl(true))]
#[case("all(TRUE, FALSE, stop('should not reach'))", Value::lgl(false))]
fn test_any_all(#[case] source: &str, #[case] expected: Value) {
    assert_eval(source, expected);
}

#[test]
fn test_any_forces_until_decided() {
    let err = eval_err("any(FALSE, stop('reached'), TRUE)");
    assert_eq!(err.message, Message::Custom("reached".to_string()));
}

// ============================================================================
// Cumulative functions
// ============================================================================

#[test]
fn test_cummax_taints_after_na() {
    assert_eval("cummax(c(1, 3, NA, 2))", dbl_na(&[1.0, 3.0, NA, NA]));
    assert_eval("cumsum(c(1L, NA, 3L))", int(&[1, NA_INTEGER, NA_INTEGER]));
}

#[rstest]
#[case("cummax(c(a = 1, b = 3, c = 2))")]
#[case("cumprod(c(a = 1, b = 3, c = 2))")]
#[case("cumsum(c(a = 1, b = 3, c = 2))")]
#[case("strrep(c(a = 'x', b = 'y', c = 'z'), 2)")]
fn test_length_preserving_builtins_copy_names(#[case] source: &str) {
    let value = eval_ok(source);
    assert_eq!(
        names(&value),
        vec![Some("a".to_string()), Some("b".to_string()), Some("c".to_string())]
    );
}

// ============================================================================
// choose
// ============================================================================

#[test]
fn test_choose() {
    assert_eval("choose(5, 2)", Value::dbl(10.0));
    let minus = doubles(&eval_ok("choose(-1, 2)"));
    assert!(minus[0].is_finite());
    assert_eq!(minus[0], 1.0);

    let (_, warnings) = eval_warned("choose(5, 2)");
    assert!(warnings.is_empty());
    let (value, warnings) = eval_warned("choose(5, 2.4)");
    assert_eq!(value, Value::dbl(10.0));
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].message.to_string(), "'k' (2.40) must be integer, rounded to 2");
}

// ============================================================================
// bincode
// ============================================================================

#[rstest]
#[case("TRUE", "FALSE", &[NA_INTEGER, 1, 2, 3])]
#[case("TRUE", "TRUE", &[1, 1, 2, 3])]
#[case("FALSE", "FALSE", &[1, 2, 3, NA_INTEGER])]
#[case("FALSE", "TRUE", &[1, 2, 3, 3])]
fn test_bincode_boundaries(#[case] right: &str, #[case] include_lowest: &str, #[case] expected: &[i32]) {
    let source = format!(
        "bincode(x = c(0, 1, 2, 3), breaks = c(0, 1, 2, 3), right = {}, include.lowest = {})",
        right, include_lowest
    );
    assert_eval(&source, int(expected));
}

// ============================================================================
// Matching and ranking
// ============================================================================

#[rstest]
#[case("pmatch(c('me', 'mean'), c('mean', 'median'))", &[NA_INTEGER, 1])]
#[case("pmatch(c('', 'ab', 'ab'), c('abc', 'ab'))", &[NA_INTEGER, 2, 1])]
#[case("charmatch(c('me', 'mea'), c('mean', 'median'))", &[0, 1])]
fn test_partial_matching(#[case] source: &str, #[case] expected: &[i32]) {
    assert_eval(source, int(expected));
}

#[test]
fn test_rank_ties() {
    assert_eval("rank(c(10, 20, 20, 30), ties.method = 'average')", dbl(&[1.0, 2.5, 2.5, 4.0]));
    assert_eval("rank(c(10, 20, 20, 30), ties.method = 'min')", int(&[1, 2, 2, 4]));
    assert_eval("rank(c(10, 20, 20, 30), ties.method = 'max')", int(&[1, 3, 3, 4]));
}

// ============================================================================
// Matrices
// ============================================================================

#[test]
fn test_diag() {
    assert_eval("diag(2)", eval_ok("matrix(c(1, 0, 0, 1), 2)"));
    assert_eval("diag(matrix(1:4, 2))", int(&[1, 4]));
    assert_eval("dim(diag(3))", int(&[3, 3]));
}

#[test]
fn test_row_and_column_extraction() {
    assert_eval("m <- matrix(1:6, 2); m[2, ]", int(&[2, 4, 6]));
    assert_eval("m <- matrix(1:6, 2); m[, 3]", int(&[5, 6]));
}

#[test]
fn test_apply_over_rows() {
    assert_eval("apply(matrix(1:6, 2), 1, sum)", int(&[9, 12]));
    assert_eval("sapply(1:3, function(i) i * 2)", dbl(&[2.0, 4.0, 6.0]));
}

// ============================================================================
// Language builtins
// ============================================================================

#[test]
fn test_dollar_reads_platform_tables() {
    assert_eval(".Machine$double.eps", Value::dbl(2f64.powi(-52)));
    assert_eval("cfg <- list(width = 80); cfg$width <- cfg$width + 1; cfg$w", Value::dbl(81.0));
}

#[test]
fn test_switch_fallthrough() {
    assert_eval("switch('b', a = , b = , c = 3, 4)", Value::dbl(3.0));
}

#[test]
fn test_substitute_returns_caller_expression() {
    assert_eval("f <- function(x) deparse(substitute(x)); f(a + b * 2)", Value::str("a + b * 2"));
}

#[test]
fn test_on_exit_runs_after_body_and_on_error() {
    let session = rbase_runtime::Session::new();
    session
        .eval("log <- character(0); f <- function() { on.exit(log <<- c(log, 'exit')); log <<- c(log, 'body'); 1 }")
        .unwrap();
    assert_eq!(session.eval("f()").unwrap(), Value::dbl(1.0));
    assert_eq!(session.eval("log").unwrap(), strs(&["body", "exit"]));

    session
        .eval("g <- function() { on.exit(log <<- c(log, 'cleanup')); stop('failed') }")
        .unwrap();
    let err = session.eval("g()").unwrap_err();
    assert_eq!(err.to_string(), "Error in g() : failed");
    assert_eq!(session.eval("log").unwrap(), strs(&["body", "exit", "cleanup"]));
}

#[test]
fn test_sample_reproducible_per_seed() {
    let session = rbase_runtime::Session::new();
    let first = session.eval("set.seed(42); sample(10)").unwrap();
    let second = session.eval("set.seed(42); sample(10)").unwrap();
    assert_eq!(first, second);
    assert_eq!(session.eval("sort(sample(10))").unwrap(), int(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]));
}

// ============================================================================
// Errors
// ============================================================================

#[rstest]
#[case("bincode(1, c(2, 1))", "'breaks' is not sorted")]
#[case("sample(5, 10)", "cannot take a sample larger than the population when 'replace = FALSE'")]
#[case("sample2(10, 6)", "This algorithm is for size <= n/2")]
#[case("vapply(1:2, function(i) 'a', numeric(1))", "values must be type 'double',\n but FUN(X[[1]]) result is type 'character'")]
#[case("get('no_such_object')", "object 'no_such_object' not found")]
#[case("undefined_function(1)", "could not find function \"undefined_function\"")]
fn test_error_messages(#[case] source: &str, #[case] message: &str) {
    assert_error_message(source, message);
}

//! Deparse output snapshots

mod common;

use common::eval_ok;
use rbase_runtime::{Value, VectorData};

/// `deparse(<source>)` lines joined with newlines
fn deparsed(source: &str) -> String {
    match eval_ok(&format!("deparse({})", source)) {
        Value::Vector(v) => match v.data() {
            VectorData::Character(lines) => lines
                .iter()
                .map(|l| l.as_deref().unwrap_or("NA").to_string())
                .collect::<Vec<_>>()
                .join("\n"),
            other => panic!("deparse returned {:?}", other.kind()),
        },
        other => panic!("deparse returned {:?}", other),
    }
}

#[test]
fn test_deparse_calls() {
    insta::assert_snapshot!(deparsed("quote(x + 1)"), @"x + 1");
    insta::assert_snapshot!(deparsed("quote(f(a = , b))"), @"f(a = , b)");
    insta::assert_snapshot!(deparsed("quote(x[[1]])"), @"x[[1]]");
    insta::assert_snapshot!(deparsed("quote(x[i, j])"), @"x[i, j]");
}

#[test]
fn test_deparse_vectors() {
    insta::assert_snapshot!(deparsed("1:3"), @"1:3");
    insta::assert_snapshot!(deparsed("c(1L, 3L)"), @"c(1L, 3L)");
    insta::assert_snapshot!(deparsed("c(1, NA)"), @"c(1, NA)");
    insta::assert_snapshot!(deparsed("c(a = 1, b = 2)"), @"c(a = 1, b = 2)");
    insta::assert_snapshot!(deparsed("'say \"hi\"'"), @r#""say \"hi\"""#);
    insta::assert_snapshot!(deparsed("numeric(0)"), @"numeric(0)");
    insta::assert_snapshot!(deparsed("list()"), @"list()");
}

#[test]
fn test_deparse_attributes() {
    insta::assert_snapshot!(
        deparsed("structure(c(a = 1, b = 2), class = 'foo')"),
        @r#"structure(c(a = 1, b = 2), class = "foo")"#
    );
}

#[test]
fn test_substitute_then_deparse() {
    insta::assert_snapshot!(
        deparsed("{ f <- function(x) substitute(x); f(mean(y, na.rm = TRUE)) }"),
        @"mean(y, na.rm = TRUE)"
    );
}

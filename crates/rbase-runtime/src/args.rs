//! Argument matching
//!
//! Supplied arguments are matched to formals in three passes: exact tags,
//! unique partial tags (only for formals declared before `...`), then
//! positions. Whatever is left goes to `...` when the function has one.

use crate::ast::Expr;
use crate::deparse::{deparse_expr, deparse_value};
use crate::env::Environment;
use crate::error::{Message, RResult};
use crate::value::{DotArg, Value};
use std::rc::Rc;

/// One actual argument before matching
#[derive(Debug, Clone)]
pub struct Supplied {
    pub name: Option<String>,
    /// Usually a promise; `Missing` for an empty argument
    pub value: Value,
}

impl Supplied {
    pub fn new(name: Option<String>, value: Value) -> Self {
        Self {
            name: name.filter(|n| !n.is_empty()),
            value,
        }
    }

    pub fn positional(value: Value) -> Self {
        Self { name: None, value }
    }
}

/// Outcome of matching against a formal list
#[derive(Debug, Clone)]
pub struct Matched {
    /// One slot per formal; `Missing` when nothing matched (and for `...`)
    pub values: Vec<Value>,
    /// Contents of `...`, in call order
    pub dots: Vec<DotArg>,
}

/// Match supplied arguments to `formals`
pub fn match_args<S: AsRef<str>>(formals: &[S], supplied: Vec<Supplied>) -> RResult<Matched> {
    let names: Vec<&str> = formals.iter().map(|f| f.as_ref()).collect();
    let dots_at = names.iter().position(|&n| n == "...");
    let mut slots: Vec<Option<usize>> = vec![None; names.len()];
    let mut exact = vec![false; names.len()];
    let mut used = vec![false; supplied.len()];

    // exact
    for (i, arg) in supplied.iter().enumerate() {
        let Some(tag) = arg.name.as_deref() else { continue };
        if let Some(j) = names.iter().position(|&n| n != "..." && n == tag) {
            if slots[j].is_some() {
                return Err(Message::FormalMatchedMultiple(names[j].to_string()).into());
            }
            slots[j] = Some(i);
            exact[j] = true;
            used[i] = true;
        }
    }

    // partial
    let partial_limit = dots_at.unwrap_or(names.len());
    for (i, arg) in supplied.iter().enumerate() {
        if used[i] {
            continue;
        }
        let Some(tag) = arg.name.as_deref() else { continue };
        let candidates: Vec<usize> = (0..partial_limit)
            .filter(|&j| !exact[j] && names[j].starts_with(tag))
            .collect();
        match candidates.as_slice() {
            [] => {}
            [j] => {
                if slots[*j].is_some() {
                    return Err(Message::FormalMatchedMultiple(names[*j].to_string()).into());
                }
                slots[*j] = Some(i);
                used[i] = true;
            }
            _ => return Err(Message::ArgumentMatchesMultiple(i + 1).into()),
        }
    }

    // positional, up to `...`
    let mut next = 0;
    for (i, arg) in supplied.iter().enumerate() {
        if used[i] || arg.name.is_some() {
            continue;
        }
        while next < partial_limit && slots[next].is_some() {
            next += 1;
        }
        if next >= partial_limit {
            break;
        }
        slots[next] = Some(i);
        used[i] = true;
        next += 1;
    }

    let leftovers: Vec<usize> = (0..supplied.len()).filter(|&i| !used[i]).collect();
    if dots_at.is_none() && !leftovers.is_empty() {
        let shown: Vec<String> = leftovers.iter().map(|&i| describe_supplied(&supplied[i])).collect();
        return Err(if shown.len() == 1 {
            Message::UnusedArgument(shown.join(", "))
        } else {
            Message::UnusedArguments(shown.join(", "))
        }
        .into());
    }

    let mut values = vec![Value::Missing; names.len()];
    let mut taken: Vec<Option<Supplied>> = supplied.into_iter().map(Some).collect();
    for (j, slot) in slots.iter().enumerate() {
        if let Some(arg) = slot.and_then(|i| taken[i].take()) {
            values[j] = arg.value;
        }
    }
    let dots = leftovers
        .into_iter()
        .filter_map(|i| taken[i].take())
        .map(|arg| DotArg {
            name: arg.name,
            value: arg.value,
        })
        .collect();

    Ok(Matched { values, dots })
}

/// `name = expr` text used by `unused argument` errors
fn describe_supplied(arg: &Supplied) -> String {
    let text = describe_value(&arg.value);
    match &arg.name {
        Some(name) => format!("{} = {}", name, text),
        None => text,
    }
}

/// Source text of a (possibly unevaluated) argument value
pub fn describe_value(value: &Value) -> String {
    match value {
        Value::Promise(p) => deparse_expr(&p.expr()),
        other => deparse_value(other),
    }
}

// ============================================================================
// Matched builtin arguments
// ============================================================================

/// Arguments handed to an eager builtin
///
/// Every declared formal except `...` has been forced, in declaration order.
/// The `...` entries are left as promises so the builtin controls when (and
/// whether) they are evaluated.
#[derive(Debug, Clone)]
pub struct Args {
    formals: &'static [&'static str],
    values: Vec<Value>,
    dots: Vec<DotArg>,
    /// The call being evaluated
    pub call: Rc<Expr>,
    /// Environment the call was made from
    pub env: Environment,
}

impl Args {
    pub fn new(
        formals: &'static [&'static str],
        values: Vec<Value>,
        dots: Vec<DotArg>,
        call: Rc<Expr>,
        env: Environment,
    ) -> Self {
        Self {
            formals,
            values,
            dots,
            call,
            env,
        }
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.formals.iter().position(|&f| f == name)
    }

    /// Value of formal `name`, `Missing` if it was not supplied
    pub fn get(&self, name: &str) -> Value {
        self.index(name)
            .and_then(|i| self.values.get(i).cloned())
            .unwrap_or(Value::Missing)
    }

    pub fn is_missing(&self, name: &str) -> bool {
        matches!(
            self.index(name).and_then(|i| self.values.get(i)),
            None | Some(Value::Missing)
        )
    }

    pub fn dots(&self) -> &[DotArg] {
        &self.dots
    }

    pub fn formals(&self) -> &'static [&'static str] {
        self.formals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn named(name: &str, v: i32) -> Supplied {
        Supplied::new(Some(name.to_string()), Value::dbl(v as f64))
    }

    fn pos(v: i32) -> Supplied {
        Supplied::positional(Value::dbl(v as f64))
    }

    #[test]
    fn test_positional_fill() {
        let m = match_args(&["x", "y"], vec![pos(1), pos(2)]).unwrap();
        assert_eq!(m.values, vec![Value::dbl(1.0), Value::dbl(2.0)]);
    }

    #[test]
    fn test_exact_before_positional() {
        let m = match_args(&["x", "y"], vec![pos(1), named("x", 2)]).unwrap();
        assert_eq!(m.values, vec![Value::dbl(2.0), Value::dbl(1.0)]);
    }

    #[test]
    fn test_partial_match() {
        let m = match_args(&["x", "decreasing"], vec![pos(1), named("dec", 0)]).unwrap();
        assert_eq!(m.values[1], Value::dbl(0.0));
    }

    #[test]
    fn test_no_partial_after_dots() {
        let m = match_args(&["...", "na.rm"], vec![named("na", 1)]).unwrap();
        assert_eq!(m.values[1], Value::Missing);
        assert_eq!(m.dots.len(), 1);
    }

    #[test]
    fn test_positional_stops_at_dots() {
        let m = match_args(&["x", "...", "sep"], vec![pos(1), pos(2), pos(3)]).unwrap();
        assert_eq!(m.values[0], Value::dbl(1.0));
        assert_eq!(m.values[2], Value::Missing);
        assert_eq!(m.dots.len(), 2);
    }

    #[rstest]
    #[case(vec![pos(1), pos(2), pos(3)], "unused argument (3)")]
    #[case(vec![named("z", 1)], "unused argument (z = 1)")]
    #[case(vec![pos(1), pos(2), pos(3), pos(4)], "unused arguments (3, 4)")]
    fn test_unused(#[case] supplied: Vec<Supplied>, #[case] expected: &str) {
        let err = match_args(&["x", "y"], supplied).unwrap_err();
        assert_eq!(err.message.to_string(), expected);
    }

    #[test]
    fn test_ambiguous_partial() {
        let err = match_args(&["min", "max"], vec![named("m", 1)]).unwrap_err();
        assert_eq!(err.message, Message::ArgumentMatchesMultiple(1));
    }

    #[test]
    fn test_formal_matched_twice() {
        let err = match_args(&["x"], vec![named("x", 1), named("x", 2)]).unwrap_err();
        assert_eq!(err.message, Message::FormalMatchedMultiple("x".to_string()));
    }

    #[test]
    fn test_named_dots_keep_tags() {
        let m = match_args(&["...", "sep"], vec![named("a", 1), pos(2), named("sep", 3)]).unwrap();
        let tags: Vec<Option<String>> = m.dots.iter().map(|d| d.name.clone()).collect();
        assert_eq!(tags, vec![Some("a".to_string()), None]);
        assert_eq!(m.values[1], Value::dbl(3.0));
    }
}

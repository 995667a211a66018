//! Deparsing: values and expressions back to source text

use crate::ast::{Arg, Expr, Formal};
use crate::format::{format_complex, format_double, format_logical, format_raw, DOUBLE_DIGITS};
use crate::na::{self, NA_INTEGER};
use crate::value::{Function, Kind, RStr, Value, Vector, VectorData};

const INDENT: &str = "    ";

const BINARY_OPS: &[&str] = &[
    "+", "-", "*", "/", "^", "==", "!=", "<", ">", "<=", ">=", "&", "|", "&&", "||", "<-",
    "<<-", "=", ":", "~",
];

/// Reserved words that need backticks when used as names
const RESERVED: &[&str] = &[
    "if", "else", "repeat", "while", "function", "for", "next", "break", "TRUE", "FALSE",
    "NULL", "Inf", "NaN", "NA", "NA_integer_", "NA_real_", "NA_character_", "in",
];

/// True when `name` can be written without backticks
pub fn is_syntactic_name(name: &str) -> bool {
    if name == "..." {
        return true;
    }
    let mut chars = name.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    if !(first.is_alphabetic() || first == '.') {
        return false;
    }
    if first == '.' && name.chars().nth(1).is_some_and(|c| c.is_ascii_digit()) {
        return false;
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '.' || c == '_') {
        return false;
    }
    !RESERVED.contains(&name)
}

fn quote_name(name: &str) -> String {
    if is_syntactic_name(name) {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "\\`"))
    }
}

/// Double-quoted string literal with escapes
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

// ============================================================================
// Values
// ============================================================================

/// Source text that re-creates `value`
pub fn deparse_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Missing => String::new(),
        Value::Vector(v) => deparse_vector(v),
        Value::Env(_) => "<environment>".to_string(),
        Value::Function(Function::Builtin(spec)) => format!(".Primitive({})", quote_string(spec.name)),
        Value::Function(Function::Closure(c)) => deparse_function(&c.formals, &c.body, 0),
        Value::Lang(expr) => deparse_expr(expr),
        Value::Dots(_) => "...".to_string(),
        Value::Promise(p) => deparse_expr(&p.expr()),
    }
}

/// Deparse split into lines, as the `deparse` builtin returns
pub fn deparse_lines(value: &Value) -> Vec<String> {
    deparse_value(value).split('\n').map(str::to_string).collect()
}

fn deparse_vector(v: &Vector) -> String {
    let names = v.names();
    let body = deparse_data(v.data(), names);
    let extra: Vec<String> = v
        .attributes()
        .map(|attrs| {
            attrs
                .iter()
                .filter(|(name, _)| *name != "names")
                .map(|(name, value)| format!("{} = {}", quote_name(name), deparse_value(value)))
                .collect()
        })
        .unwrap_or_default();
    if extra.is_empty() {
        body
    } else {
        format!("structure({}, {})", body, extra.join(", "))
    }
}

fn typed_na(data: &VectorData) -> &'static str {
    match data {
        VectorData::Integer(_) => "NA_integer_",
        VectorData::Double(_) => "NA_real_",
        VectorData::Character(_) => "NA_character_",
        VectorData::Complex(_) => "NA_complex_",
        _ => "NA",
    }
}

fn deparse_data(data: &VectorData, names: Option<&[Option<RStr>]>) -> String {
    let n = data.len();
    if n == 0 {
        return match data {
            VectorData::Logical(_) => "logical(0)",
            VectorData::Integer(_) => "integer(0)",
            VectorData::Double(_) => "numeric(0)",
            VectorData::Complex(_) => "complex(0)",
            VectorData::Character(_) => "character(0)",
            VectorData::Raw(_) => "raw(0)",
            VectorData::List(_) => "list()",
        }
        .to_string();
    }

    let has_names = names.is_some_and(|ns| ns.iter().any(|s| s.as_deref().is_some_and(|s| !s.is_empty())));

    if let (VectorData::Integer(v), false) = (data, has_names) {
        if n >= 2 && !v.contains(&NA_INTEGER) {
            let step = v[1].wrapping_sub(v[0]);
            if (step == 1 || step == -1) && v.windows(2).all(|w| w[1].wrapping_sub(w[0]) == step) {
                return format!("{}:{}", v[0], v[n - 1]);
            }
        }
    }

    let all_na = (0..n).all(|i| data.is_na_at(i)) && !matches!(data, VectorData::List(_));
    let elements: Vec<String> = (0..n)
        .map(|i| {
            if all_na && !matches!(data, VectorData::Logical(_)) && !is_nan_element(data, i) {
                return typed_na(data).to_string();
            }
            deparse_element(data, i)
        })
        .collect();

    let elements: Vec<String> = match names {
        Some(ns) if has_names => elements
            .into_iter()
            .zip(ns.iter())
            .map(|(e, name)| match name.as_deref() {
                Some(name) if !name.is_empty() => format!("{} = {}", quote_name(name), e),
                _ => e,
            })
            .collect(),
        _ => elements,
    };

    match data {
        VectorData::List(_) => format!("list({})", elements.join(", ")),
        VectorData::Raw(_) => {
            if n == 1 && !has_names {
                format!("as.raw({})", elements[0])
            } else {
                format!("as.raw(c({}))", elements.join(", "))
            }
        }
        _ => {
            if n == 1 && !has_names {
                elements.into_iter().next().unwrap_or_default()
            } else {
                format!("c({})", elements.join(", "))
            }
        }
    }
}

fn is_nan_element(data: &VectorData, i: usize) -> bool {
    match data {
        VectorData::Double(v) => na::is_nan_not_na(v[i]),
        _ => false,
    }
}

fn deparse_element(data: &VectorData, i: usize) -> String {
    match data {
        VectorData::Logical(v) => format_logical(v[i]).to_string(),
        VectorData::Integer(v) => {
            if v[i] == NA_INTEGER {
                "NA".to_string()
            } else {
                format!("{}L", v[i])
            }
        }
        VectorData::Double(v) => format_double(v[i], DOUBLE_DIGITS),
        VectorData::Complex(v) => format_complex(v[i], DOUBLE_DIGITS),
        VectorData::Character(v) => match &v[i] {
            Some(s) => quote_string(s),
            None => "NA".to_string(),
        },
        VectorData::Raw(v) => format!("0x{}", format_raw(v[i])),
        VectorData::List(v) => deparse_value(&v[i]),
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// Source text of an expression
pub fn deparse_expr(expr: &Expr) -> String {
    deparse_expr_at(expr, 0)
}

fn deparse_args(args: &[Arg], depth: usize) -> String {
    args.iter()
        .map(|arg| {
            let value = deparse_expr_at(&arg.value, depth);
            match &arg.name {
                Some(name) if matches!(arg.value, Expr::MissingArg) => format!("{} = ", quote_name(name)),
                Some(name) => format!("{} = {}", quote_name(name), value),
                None => value,
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn deparse_function(formals: &[Formal], body: &Expr, depth: usize) -> String {
    let params: Vec<String> = formals
        .iter()
        .map(|f| match &f.default {
            Some(default) => format!("{} = {}", quote_name(&f.name), deparse_expr_at(default, depth)),
            None => quote_name(&f.name),
        })
        .collect();
    format!("function({}) {}", params.join(", "), deparse_expr_at(body, depth))
}

fn deparse_expr_at(expr: &Expr, depth: usize) -> String {
    match expr {
        Expr::Constant(v) => deparse_value(v),
        Expr::Symbol(name) => quote_name(name),
        Expr::MissingArg => String::new(),
        Expr::Function { formals, body } => deparse_function(formals, body, depth),
        Expr::Call(f, args) => {
            if let Expr::Symbol(name) = f.as_ref() {
                if let Some(text) = deparse_special(name, args, depth) {
                    return text;
                }
                return format!("{}({})", quote_name(name), deparse_args(args, depth));
            }
            let head = deparse_expr_at(f, depth);
            let head = if matches!(f.as_ref(), Expr::Function { .. }) {
                format!("({})", head)
            } else {
                head
            };
            format!("{}({})", head, deparse_args(args, depth))
        }
    }
}

/// Operators and control flow; `None` falls back to call syntax
fn deparse_special(name: &str, args: &[Arg], depth: usize) -> Option<String> {
    let unnamed = args.iter().all(|a| a.name.is_none());
    match (name, args) {
        ("{", _) => {
            let inner = INDENT.repeat(depth + 1);
            let mut out = String::from("{");
            for arg in args {
                out.push('\n');
                out.push_str(&inner);
                out.push_str(&deparse_expr_at(&arg.value, depth + 1));
            }
            out.push('\n');
            out.push_str(&INDENT.repeat(depth));
            out.push('}');
            Some(out)
        }
        ("(", [inner]) if unnamed => Some(format!("({})", deparse_expr_at(&inner.value, depth))),
        ("if", [cond, then]) if unnamed => Some(format!(
            "if ({}) {}",
            deparse_expr_at(&cond.value, depth),
            deparse_expr_at(&then.value, depth)
        )),
        ("if", [cond, then, otherwise]) if unnamed => Some(format!(
            "if ({}) {} else {}",
            deparse_expr_at(&cond.value, depth),
            deparse_expr_at(&then.value, depth),
            deparse_expr_at(&otherwise.value, depth)
        )),
        ("[" | "[[", [target, rest @ ..]) if target.name.is_none() => {
            let close = if name == "[" { "]" } else { "]]" };
            Some(format!(
                "{}{}{}{}",
                deparse_expr_at(&target.value, depth),
                name,
                deparse_args(rest, depth),
                close
            ))
        }
        ("$", [target, field]) if unnamed => match &field.value {
            Expr::Constant(Value::Vector(v)) if v.kind() == Kind::Character && v.len() == 1 => {
                let field = crate::casts::to_str(&Value::Vector(v.clone())).unwrap_or_default();
                Some(format!("{}${}", deparse_expr_at(&target.value, depth), quote_name(&field)))
            }
            Expr::Symbol(field) => Some(format!("{}${}", deparse_expr_at(&target.value, depth), quote_name(field))),
            _ => None,
        },
        ("-" | "+" | "!", [operand]) if unnamed => {
            Some(format!("{}{}", name, deparse_expr_at(&operand.value, depth)))
        }
        (op, [lhs, rhs]) if unnamed && (BINARY_OPS.contains(&op) || is_percent_op(op)) => {
            let l = deparse_expr_at(&lhs.value, depth);
            let r = deparse_expr_at(&rhs.value, depth);
            if op == ":" || op == "^" {
                Some(format!("{}{}{}", l, op, r))
            } else {
                Some(format!("{} {} {}", l, op, r))
            }
        }
        _ => None,
    }
}

fn is_percent_op(name: &str) -> bool {
    name.len() >= 2 && name.starts_with('%') && name.ends_with('%')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Vector;

    #[test]
    fn test_deparse_scalars() {
        assert_eq!(deparse_value(&Value::int(3)), "3L");
        assert_eq!(deparse_value(&Value::dbl(2.5)), "2.5");
        assert_eq!(deparse_value(&Value::str("a\"b")), "\"a\\\"b\"");
        assert_eq!(deparse_value(&Value::Null), "NULL");
    }

    #[test]
    fn test_deparse_integer_range() {
        assert_eq!(deparse_value(&Vector::integer(vec![1, 2, 3]).into()), "1:3");
        assert_eq!(deparse_value(&Vector::integer(vec![3, 2]).into()), "3:2");
        assert_eq!(deparse_value(&Vector::integer(vec![1, 3]).into()), "c(1L, 3L)");
    }

    #[test]
    fn test_deparse_na() {
        assert_eq!(deparse_value(&Vector::double(vec![1.0, na::na_real()]).into()), "c(1, NA)");
        assert_eq!(deparse_value(&Vector::double(vec![na::na_real()]).into()), "NA_real_");
        assert_eq!(deparse_value(&Value::na_logical()), "NA");
    }

    #[test]
    fn test_deparse_names_and_attributes() {
        let mut v = Vector::double(vec![1.0, 2.0]);
        v.set_names(Some(vec![Some("a".into()), Some("b".into())]));
        assert_eq!(deparse_value(&v.clone().into()), "c(a = 1, b = 2)");
        v.set_attr("class", Value::str("foo"));
        assert_eq!(deparse_value(&v.into()), "structure(c(a = 1, b = 2), class = \"foo\")");
    }

    #[test]
    fn test_deparse_empty() {
        assert_eq!(deparse_value(&Vector::empty(crate::value::Kind::Double).into()), "numeric(0)");
        assert_eq!(deparse_value(&Vector::list(vec![]).into()), "list()");
    }

    #[test]
    fn test_deparse_calls() {
        let call = Expr::call(
            "+",
            vec![Arg::positional(Expr::symbol("x")), Arg::positional(Expr::Constant(Value::dbl(1.0)))],
        );
        assert_eq!(deparse_expr(&call), "x + 1");
        let call = Expr::call(
            "f",
            vec![Arg::named("a", Expr::MissingArg), Arg::positional(Expr::symbol("my var"))],
        );
        assert_eq!(deparse_expr(&call), "f(a = , `my var`)");
    }

    #[test]
    fn test_syntactic_names() {
        assert!(is_syntactic_name("na.rm"));
        assert!(is_syntactic_name(".x"));
        assert!(!is_syntactic_name(".1x"));
        assert!(!is_syntactic_name("if"));
        assert!(!is_syntactic_name("a b"));
        assert!(!is_syntactic_name("_x"));
    }
}

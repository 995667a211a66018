//! Character builtins
//!
//! Patterns go through the `regex` crate. Extended regular expressions and
//! the Perl flavour the language accepts are close enough to its syntax that
//! only replacement strings need translating (`\\1` back references).

use crate::args::Args;
use crate::builtins::coerce::coerce_value;
use crate::builtins::{force_dots, recycled_length, strings, vector_arg, BuiltinSpec};
use crate::casts::{self, to_bool, to_str};
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::na::NA_INTEGER;
use crate::value::{Kind, RStr, Value, Vector, VectorData};
use regex::{Regex, RegexBuilder};

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::eager("nchar", &["x", "type"], builtin_nchar),
    BuiltinSpec::eager("toupper", &["x"], builtin_toupper),
    BuiltinSpec::eager("tolower", &["x"], builtin_tolower),
    BuiltinSpec::eager("trimws", &["x", "which", "whitespace"], builtin_trimws),
    BuiltinSpec::eager("substr", &["x", "start", "stop"], builtin_substr),
    BuiltinSpec::eager("strrep", &["x", "times"], builtin_strrep),
    BuiltinSpec::eager("startsWith", &["x", "prefix"], builtin_starts_with),
    BuiltinSpec::eager("endsWith", &["x", "suffix"], builtin_ends_with),
    BuiltinSpec::eager("paste", &["...", "sep", "collapse"], builtin_paste),
    BuiltinSpec::eager("paste0", &["...", "collapse"], builtin_paste0),
    BuiltinSpec::eager("grepl", &["pattern", "x", "ignore.case", "fixed"], builtin_grepl),
    BuiltinSpec::eager("sub", &["pattern", "replacement", "x", "ignore.case", "fixed"], builtin_sub),
    BuiltinSpec::eager("gsub", &["pattern", "replacement", "x", "ignore.case", "fixed"], builtin_gsub),
    BuiltinSpec::eager("Encoding", &["x"], builtin_encoding),
    BuiltinSpec::eager("setEncoding", &["x", "value"], builtin_set_encoding),
];

/// `x` as strings, refusing non-character input
fn character_arg(value: &Value) -> RResult<Vector> {
    match value {
        Value::Vector(v) if v.kind() == Kind::Character => Ok(v.clone()),
        Value::Null => Ok(Vector::empty(Kind::Character)),
        Value::Missing => Err(Message::ArgumentMissing("x".to_string()).into()),
        _ => Err(Message::NonCharacterArgument.into()),
    }
}

fn text_of(v: &Vector) -> &[Option<RStr>] {
    match v.data() {
        VectorData::Character(s) => s,
        _ => &[],
    }
}

/// Result carrying the names, dim and dimnames of `x`
fn shaped_like(x: &Vector, data: VectorData) -> Vector {
    let mut out = Vector::new(data);
    if out.len() == x.len() {
        for name in ["names", "dim", "dimnames"] {
            if let Some(value) = x.attr(name) {
                out.set_attr(name, value.clone());
            }
        }
    }
    out
}

fn map_strings(interp: &mut Interpreter, args: &Args, f: fn(&str) -> String) -> RResult<Value> {
    let x = vector_arg(&args.get("x"), "x")?;
    let mapped = strings(interp, &x)?
        .into_iter()
        .map(|s| s.map(|s| RStr::from(f(&s))))
        .collect();
    Ok(Value::Vector(shaped_like(&x, VectorData::Character(mapped))))
}

// ============================================================================
// Simple transforms
// ============================================================================

/// Character count; a missing string counts 2 unless `type = "chars"` and `x`
/// is character
fn builtin_nchar(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let kind = casts::string_scalar("type")
        .default_if_missing(Value::str("chars"))
        .apply(interp, args.get("type"))?;
    let kind = to_str(&kind).unwrap_or_default();
    if !["chars", "bytes", "width"].contains(&kind.as_str()) {
        return Err(Message::InvalidArgument("type".to_string()).into());
    }
    let x = vector_arg(&args.get("x"), "x")?;
    if let VectorData::List(items) = x.data() {
        if items.iter().any(|i| !matches!(i, Value::Vector(v) if v.len() == 1)) {
            return Err(Message::NcharNonCharacter.into());
        }
    }
    let is_character = x.kind() == Kind::Character;
    let counts = strings(interp, &x)?
        .into_iter()
        .map(|s| match s {
            Some(s) if kind == "bytes" => s.len() as i32,
            Some(s) => s.chars().count() as i32,
            None if is_character && kind != "bytes" => NA_INTEGER,
            None => 2,
        })
        .collect();
    Ok(Value::Vector(shaped_like(&x, VectorData::Integer(counts))))
}

fn builtin_toupper(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    map_strings(interp, args, str::to_uppercase)
}

fn builtin_tolower(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    map_strings(interp, args, str::to_lowercase)
}

fn builtin_trimws(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let which = casts::string_scalar("which")
        .default_if_missing(Value::str("both"))
        .apply(interp, args.get("which"))?;
    let which = to_str(&which).unwrap_or_default();
    let whitespace = casts::string_scalar("whitespace")
        .default_if_missing(Value::str("[ \t\r\n]"))
        .apply(interp, args.get("whitespace"))?;
    let whitespace = to_str(&whitespace).unwrap_or_default();
    let (left, right) = match which.as_str() {
        "both" => (true, true),
        "left" => (true, false),
        "right" => (false, true),
        _ => return Err(Message::InvalidArgument("which".to_string()).into()),
    };
    let leading = compile(&format!("^(?:{})+", whitespace), false)?;
    let trailing = compile(&format!("(?:{})+$", whitespace), false)?;

    let x = vector_arg(&args.get("x"), "x")?;
    let trimmed = strings(interp, &x)?
        .into_iter()
        .map(|s| {
            s.map(|s| {
                let mut out = s.to_string();
                if left {
                    out = leading.replace(&out, "").into_owned();
                }
                if right {
                    out = trailing.replace(&out, "").into_owned();
                }
                RStr::from(out)
            })
        })
        .collect();
    Ok(Value::Vector(shaped_like(&x, VectorData::Character(trimmed))))
}

/// Characters `start..=stop` (1-based, clamped); NA bounds give NA
fn builtin_substr(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let x = character_arg(&args.get("x"))?;
    let bound = |name: &'static str| casts::Cast::new(name).must_not_be_missing().as_integer();
    let start = bound("start").apply(interp, args.get("start"))?;
    let stop = bound("stop").apply(interp, args.get("stop"))?;
    let (start, stop) = match (start.as_vector().map(Vector::data), stop.as_vector().map(Vector::data)) {
        (Some(VectorData::Integer(a)), Some(VectorData::Integer(b))) => (a.clone(), b.clone()),
        _ => (Vec::new(), Vec::new()),
    };
    let text = text_of(&x);
    if text.is_empty() {
        return Ok(Value::Vector(shaped_like(&x, VectorData::Character(Vec::new()))));
    }
    if start.is_empty() || stop.is_empty() {
        return Err(Message::InvalidSubstringArguments.into());
    }
    let out = text
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let (from, to) = (start[i % start.len()], stop[i % stop.len()]);
            match s {
                Some(s) if from != NA_INTEGER && to != NA_INTEGER => {
                    let from = from.max(1) as usize;
                    let to = to.max(0) as usize;
                    let piece: String = if from > to {
                        String::new()
                    } else {
                        s.chars().skip(from - 1).take(to - from + 1).collect()
                    };
                    Some(RStr::from(piece))
                }
                _ => None,
            }
        })
        .collect();
    Ok(Value::Vector(shaped_like(&x, VectorData::Character(out))))
}

fn builtin_strrep(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let x = vector_arg(&args.get("x"), "x")?;
    let times = casts::Cast::new("times")
        .must_not_be_missing()
        .as_integer()
        .apply(interp, args.get("times"))?;
    let times = match times.as_vector().map(Vector::data) {
        Some(VectorData::Integer(t)) => t.clone(),
        _ => Vec::new(),
    };
    if times.iter().any(|&t| t != NA_INTEGER && t < 0) {
        return Err(Message::InvalidValue("times".to_string()).into());
    }
    let text = strings(interp, &x)?;
    let n = recycled_length(interp, &[text.len(), times.len()]);
    let out: Vec<Option<RStr>> = (0..n)
        .map(|i| match (&text[i % text.len()], times[i % times.len()]) {
            (Some(s), t) if t != NA_INTEGER => Some(RStr::from(s.repeat(t as usize))),
            _ => None,
        })
        .collect();
    let mut out = Vector::new(VectorData::Character(out));
    if n == x.len() {
        crate::builtins::copy_names(&x, &mut out);
    }
    Ok(Value::Vector(out))
}

fn affix_test(args: &Args, affix: &str, test: fn(&str, &str) -> bool) -> RResult<Value> {
    let x = character_arg(&args.get("x"));
    let a = character_arg(&args.get(affix));
    let (x, a) = match (x, a) {
        (Ok(x), Ok(a)) => (x, a),
        _ => return Err(Message::NonCharacterObjects.into()),
    };
    let (x, a) = (text_of(&x), text_of(&a));
    if x.is_empty() || a.is_empty() {
        return Ok(Value::Vector(Vector::empty(Kind::Logical)));
    }
    let n = x.len().max(a.len());
    let out = (0..n)
        .map(|i| match (&x[i % x.len()], &a[i % a.len()]) {
            (Some(s), Some(p)) => Some(test(s, p)),
            _ => None,
        })
        .collect();
    Ok(Value::Vector(Vector::new(VectorData::Logical(out))))
}

fn builtin_starts_with(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    affix_test(args, "prefix", |s, p| s.starts_with(p))
}

fn builtin_ends_with(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    affix_test(args, "suffix", |s, p| s.ends_with(p))
}

// ============================================================================
// paste
// ============================================================================

/// Join the forced `...` element-wise with `sep`, then optionally collapse
///
/// `NULL` arguments are dropped. Other zero-length arguments take part as
/// empty strings unless every argument is empty.
fn paste(interp: &mut Interpreter, args: &Args, sep: &str) -> RResult<Value> {
    let collapse = casts::Cast::new("collapse")
        .default_if_missing(Value::Null)
        .null_passes()
        .must_be(
            |v| matches!(v, Value::Vector(x) if x.kind() == Kind::Character),
            Message::InvalidArgument("collapse".to_string()),
        )
        .must(|v| v.len() >= 1 && !v.data().is_na_at(0), Message::InvalidArgument("collapse".to_string()))
        .first_element()
        .apply(interp, args.get("collapse"))?;

    let mut columns = Vec::new();
    for dot in force_dots(interp, args)? {
        if dot.value.is_null() {
            continue;
        }
        let v = coerce_value(interp, dot.value, Kind::Character)?;
        columns.push(v.into_data());
    }
    let columns: Vec<Vec<Option<RStr>>> = columns
        .into_iter()
        .map(|c| match c {
            VectorData::Character(s) => s,
            _ => Vec::new(),
        })
        .collect();

    let n = columns.iter().map(Vec::len).max().unwrap_or(0);
    let joined: Vec<String> = (0..n)
        .map(|i| {
            let parts: Vec<&str> = columns
                .iter()
                .map(|c| {
                    if c.is_empty() {
                        ""
                    } else {
                        c[i % c.len()].as_deref().unwrap_or("NA")
                    }
                })
                .collect();
            parts.join(sep)
        })
        .collect();

    let out = match to_str(&collapse) {
        Some(collapse) => Vector::strings([joined.join(&collapse)]),
        None => Vector::strings(joined),
    };
    Ok(Value::Vector(out))
}

fn builtin_paste(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let sep = casts::string_scalar("sep")
        .default_if_missing(Value::str(" "))
        .apply(interp, args.get("sep"))?;
    let sep = to_str(&sep).unwrap_or_default();
    paste(interp, args, &sep)
}

fn builtin_paste0(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    paste(interp, args, "")
}

// ============================================================================
// Pattern matching
// ============================================================================

fn compile(pattern: &str, ignore_case: bool) -> RResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()
        .map_err(|err| Message::InvalidRegex(pattern.to_string(), err.to_string()).into())
}

/// Compiled `pattern` argument, honouring `fixed` and `ignore.case`
fn pattern_arg(interp: &mut Interpreter, args: &Args) -> RResult<Regex> {
    let pattern = casts::Cast::new("pattern")
        .must_not_be_missing()
        .as_character()
        .must(|v| v.len() >= 1, Message::InvalidArgument("pattern".to_string()))
        .first_element()
        .apply(interp, args.get("pattern"))?;
    let Some(pattern) = to_str(&pattern) else {
        return Err(Message::InvalidArgument("pattern".to_string()).into());
    };
    let fixed = casts::flag("fixed")
        .default_if_missing(Value::lgl(false))
        .apply(interp, args.get("fixed"))?;
    let ignore_case = casts::flag("ignore.case")
        .default_if_missing(Value::lgl(false))
        .apply(interp, args.get("ignore.case"))?;
    let fixed = to_bool(&fixed).unwrap_or(false);
    let ignore_case = to_bool(&ignore_case).unwrap_or(false);
    if fixed && ignore_case {
        interp.warning(Message::IgnoreCaseWithFixed);
    }
    if fixed {
        compile(&regex::escape(&pattern), false)
    } else {
        compile(&pattern, ignore_case)
    }
}

fn builtin_grepl(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let regex = pattern_arg(interp, args)?;
    let x = vector_arg(&args.get("x"), "x")?;
    let hits = strings(interp, &x)?
        .iter()
        .map(|s| Some(s.as_deref().map_or(false, |s| regex.is_match(s))))
        .collect();
    Ok(Value::Vector(Vector::with_completeness(VectorData::Logical(hits), true)))
}

/// Rewrite `\\1` style back references as `${1}`, escaping literal `$`
fn translate_replacement(replacement: &str, fixed: bool) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' if !fixed => match chars.next() {
                Some(d) if d.is_ascii_digit() => {
                    out.push_str("${");
                    out.push(d);
                    out.push('}');
                }
                Some('$') => out.push_str("$$"),
                Some(other) => out.push(other),
                None => {}
            },
            c => out.push(c),
        }
    }
    out
}

fn substitute(interp: &mut Interpreter, args: &Args, global: bool) -> RResult<Value> {
    let regex = pattern_arg(interp, args)?;
    let fixed = to_bool(&args.get("fixed")).unwrap_or(false);
    let replacement = casts::Cast::new("replacement")
        .must_not_be_missing()
        .as_character()
        .must(|v| v.len() >= 1, Message::InvalidArgument("replacement".to_string()))
        .first_element()
        .apply(interp, args.get("replacement"))?;
    let replacement = to_str(&replacement).map(|r| translate_replacement(&r, fixed));

    let x = vector_arg(&args.get("x"), "x")?;
    let out = strings(interp, &x)?
        .into_iter()
        .map(|s| {
            let s = s?;
            if !regex.is_match(&s) {
                return Some(s);
            }
            // NA replacement only touches strings that match
            let replacement = replacement.as_deref()?;
            let replaced = if global {
                regex.replace_all(&s, replacement)
            } else {
                regex.replace(&s, replacement)
            };
            Some(RStr::from(replaced.as_ref()))
        })
        .collect();
    Ok(Value::Vector(shaped_like(&x, VectorData::Character(out))))
}

fn builtin_sub(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    substitute(interp, args, false)
}

fn builtin_gsub(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    substitute(interp, args, true)
}

// ============================================================================
// Encodings
// ============================================================================

/// Strings carry no encoding mark; every element reports `"unknown"`
fn builtin_encoding(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let x = character_arg(&args.get("x")).map_err(|_| Message::MustBeCharacter("x".to_string()))?;
    Ok(Value::Vector(Vector::strings(vec!["unknown"; x.len()])))
}

fn builtin_set_encoding(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let x = character_arg(&args.get("x")).map_err(|_| Message::MustBeCharacter("x".to_string()))?;
    match args.get("value") {
        Value::Vector(v) if v.kind() == Kind::Character && !v.is_empty() => Ok(Value::Vector(x)),
        _ => Err(Message::InvalidValue("value".to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::eval;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn chr(items: &[&str]) -> Value {
        Value::Vector(Vector::strings(items))
    }

    #[rstest]
    #[case("toupper(\"abc\")", "\"ABC\"")]
    #[case("tolower(c(a = \"AB\"))", "c(a = \"ab\")")]
    #[case("nchar(c(\"abc\", \"\", NA))", "c(3L, 0L, NA)")]
    #[case("nchar(NA)", "2L")]
    #[case("nchar(123)", "3L")]
    #[case("nchar(\"héllo\", \"bytes\")", "6L")]
    #[case("trimws(\"  a b  \")", "\"a b\"")]
    #[case("trimws(\"  a  \", \"left\")", "\"a  \"")]
    #[case("trimws(\"  a  \", \"right\")", "\"  a\"")]
    #[case("substr(\"abcdef\", 2, 4)", "\"bcd\"")]
    #[case("substr(c(\"abc\", \"xyz\"), 0, 10)", "c(\"abc\", \"xyz\")")]
    #[case("substr(\"abc\", 3, 1)", "\"\"")]
    #[case("substr(\"abc\", NA, 1)", "NA_character_")]
    #[case("strrep(\"ab\", 3)", "\"ababab\"")]
    #[case("strrep(c(a = \"x\", b = \"y\"), 2)", "c(a = \"xx\", b = \"yy\")")]
    #[case("strrep(\"x\", 1:3)", "c(\"x\", \"xx\", \"xxx\")")]
    #[case("strrep(NA, 2)", "NA_character_")]
    #[case("startsWith(c(\"apple\", \"banana\", NA), \"a\")", "c(TRUE, FALSE, NA)")]
    #[case("endsWith(\"file.txt\", c(\".txt\", \".csv\"))", "c(TRUE, FALSE)")]
    fn test_transforms(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(eval(source).unwrap(), eval(expected).unwrap(), "{}", source);
    }

    #[test]
    fn test_strrep_negative_times() {
        assert_eq!(
            eval("strrep(\"x\", -1)").unwrap_err().message,
            Message::InvalidValue("times".to_string())
        );
    }

    #[test]
    fn test_affix_requires_character() {
        assert_eq!(eval("startsWith(1, \"a\")").unwrap_err().message, Message::NonCharacterObjects);
    }

    #[rstest]
    #[case("paste(\"a\", \"b\")", &["a b"])]
    #[case("paste(\"a\", 1:3, sep = \"-\")", &["a-1", "a-2", "a-3"])]
    #[case("paste0(\"x\", 1:2)", &["x1", "x2"])]
    #[case("paste(c(\"a\", \"b\"), collapse = \"+\")", &["a+b"])]
    #[case("paste(\"a\", NULL, \"b\")", &["a b"])]
    #[case("paste(\"a\", NA)", &["a NA"])]
    #[case("paste(character(0), collapse = \"\")", &[""])]
    #[case("paste0(\"v\", TRUE)", &["vTRUE"])]
    #[case("paste(quote(x), 1.5)", &["x 1.5"])]
    fn test_paste(#[case] source: &str, #[case] expected: &[&str]) {
        assert_eq!(eval(source).unwrap(), chr(expected));
    }

    #[test]
    fn test_paste_no_arguments() {
        assert_eq!(eval("paste()").unwrap(), Value::Vector(Vector::empty(Kind::Character)));
    }

    #[rstest]
    #[case("grepl(\"^a\", c(\"abc\", \"bac\", NA))", "c(TRUE, FALSE, FALSE)")]
    #[case("grepl(\"A\", \"abc\", ignore.case = TRUE)", "TRUE")]
    #[case("grepl(\".\", \"abc\", fixed = TRUE)", "FALSE")]
    #[case("grepl(\"[[:digit:]]+\", c(\"a1\", \"b\"))", "c(TRUE, FALSE)")]
    #[case("sub(\"o\", \"0\", \"foo\")", "\"f0o\"")]
    #[case("gsub(\"o\", \"0\", \"foo\")", "\"f00\"")]
    #[case("gsub(\"(a)(b)\", \"\\\\2\\\\1\", \"abab\")", "\"baba\"")]
    #[case("gsub(\".\", \"$\", \"a.b\", fixed = TRUE)", "\"a$b\"")]
    #[case("sub(\"x\", \"y\", c(k = \"xx\", NA))", "c(k = \"yx\", NA)")]
    #[case("gsub(\"a\", NA, c(\"a\", \"b\"))", "c(NA, \"b\")")]
    fn test_patterns(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(eval(source).unwrap(), eval(expected).unwrap(), "{}", source);
    }

    #[test]
    fn test_invalid_regex() {
        let err = eval("grepl(\"(\", \"a\")").unwrap_err();
        assert!(matches!(err.message, Message::InvalidRegex(ref p, _) if p == "("));
    }

    #[test]
    fn test_translate_replacement() {
        assert_eq!(translate_replacement("\\1-\\2", false), "${1}-${2}");
        assert_eq!(translate_replacement("$5", false), "$$5");
        assert_eq!(translate_replacement("\\1", true), "\\1");
    }

    #[test]
    fn test_encoding_placeholders() {
        assert_eq!(eval("Encoding(c(\"a\", \"b\"))").unwrap(), chr(&["unknown", "unknown"]));
        assert_eq!(eval("setEncoding(\"a\", \"UTF-8\")").unwrap(), chr(&["a"]));
        assert_eq!(
            eval("Encoding(1)").unwrap_err().message,
            Message::MustBeCharacter("x".to_string())
        );
    }
}

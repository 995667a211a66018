//! Process-wide options registry and platform constants
//!
//! `.Options` starts from a fixed table of defaults. Configuration files may
//! set any option; `RBASE_OPTION_*` environment variables only override keys
//! the registry already knows.

use crate::error::{Message, RResult};
use crate::na::NA_INTEGER;
use crate::value::{Value, Vector, VectorData};
use rbase_config::{Config, OptionValue};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Options known at startup, in the order they are registered
fn default_entries() -> Vec<(&'static str, Value)> {
    vec![
        ("digits", Value::int(7)),
        ("OutDec", Value::str(".")),
        ("scipen", Value::dbl(0.0)),
        ("warn", Value::dbl(0.0)),
        ("warning.length", Value::int(1000)),
        ("nwarnings", Value::int(50)),
        ("expressions", Value::int(5000)),
        ("keep.source", Value::lgl(false)),
        ("echo", Value::lgl(true)),
        ("verbose", Value::lgl(false)),
        ("encoding", Value::str("native.enc")),
        ("width", Value::int(80)),
        ("useFancyQuotes", Value::lgl(true)),
        ("timeout", Value::dbl(60.0)),
        ("check.bounds", Value::lgl(false)),
        ("prompt", Value::str("> ")),
        ("continue", Value::str("+ ")),
        ("stringsAsFactors", Value::lgl(false)),
        ("max.print", Value::int(99999)),
        ("na.action", Value::str("na.omit")),
        ("show.error.messages", Value::lgl(true)),
        ("ts.eps", Value::dbl(1e-05)),
    ]
}

/// `.Options`
#[derive(Debug, Clone)]
pub struct Options {
    entries: BTreeMap<String, Value>,
}

impl Options {
    pub fn defaults() -> Self {
        let entries = default_entries()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Set an option, returning the previous value (`NULL` if unset).
    /// Setting `NULL` removes the option.
    pub fn set(&mut self, name: &str, value: Value) -> RResult<Value> {
        validate(name, &value)?;
        debug!(option = name, value = %value, "option set");
        let old = if value.is_null() {
            self.entries.remove(name)
        } else {
            self.entries.insert(name.to_string(), value)
        };
        Ok(old.unwrap_or(Value::Null))
    }

    /// Sorted `(name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All options as a named list
    pub fn as_list(&self) -> Value {
        Value::Vector(Vector::named_list(
            self.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        ))
    }

    /// Integer view of a numeric option
    pub fn int(&self, name: &str) -> Option<i64> {
        let v = self.get(name)?.as_vector()?;
        match v.data() {
            VectorData::Integer(x) => x.first().filter(|&&i| i != NA_INTEGER).map(|&i| i as i64),
            VectorData::Double(x) => x.first().filter(|x| x.is_finite()).map(|&x| x as i64),
            VectorData::Logical(x) => x.first().copied().flatten().map(|b| b as i64),
            _ => None,
        }
    }

    /// Apply config-file options, then environment overrides for known keys
    pub fn apply_config(&mut self, config: &Config) {
        for (name, value) in config.settings.option_overrides() {
            if let Err(err) = self.set(name, option_value(value)) {
                warn!(option = name, error = %err, "ignoring configured option");
            }
        }
        let known: Vec<String> = self.entries.keys().cloned().collect();
        for name in known {
            if let Some(value) = config.env_override(&name) {
                if let Err(err) = self.set(&name, option_value(value)) {
                    warn!(option = %name, error = %err, "ignoring environment option");
                }
            }
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::defaults()
    }
}

fn option_value(value: &OptionValue) -> Value {
    match value {
        OptionValue::Bool(b) => Value::lgl(*b),
        OptionValue::Integer(i) => match i32::try_from(*i) {
            Ok(i) if i != NA_INTEGER => Value::int(i),
            _ => Value::dbl(*i as f64),
        },
        OptionValue::Float(x) => Value::dbl(*x),
        OptionValue::String(s) => Value::str(s),
    }
}

/// Range checks for options the runtime itself consumes
fn validate(name: &str, value: &Value) -> RResult<()> {
    let range = match name {
        "digits" => (1, 22),
        "expressions" => (25, 500_000),
        "nwarnings" => (1, i32::MAX as i64),
        _ => return Ok(()),
    };
    let number = value.as_vector().and_then(|v| match v.data() {
        VectorData::Integer(x) if x.len() == 1 && x[0] != NA_INTEGER => Some(x[0] as i64),
        VectorData::Double(x) if x.len() == 1 && x[0].is_finite() => Some(x[0] as i64),
        _ => None,
    });
    match number {
        Some(n) if n >= range.0 && n <= range.1 => Ok(()),
        _ => Err(Message::InvalidOptionRange(name.to_string(), range.0, range.1).into()),
    }
}

// ============================================================================
// Platform constants
// ============================================================================

/// `.Machine`
pub fn machine() -> Value {
    let d = |x: f64| Value::dbl(x);
    let i = |x: i32| Value::int(x);
    Value::Vector(Vector::named_list(
        vec![
            ("double.eps", d(f64::EPSILON)),
            ("double.neg.eps", d(f64::EPSILON / 2.0)),
            ("double.xmin", d(f64::MIN_POSITIVE)),
            ("double.xmax", d(f64::MAX)),
            ("double.base", i(2)),
            ("double.digits", i(53)),
            ("double.rounding", i(5)),
            ("double.guard", i(0)),
            ("double.ulp.digits", i(-52)),
            ("double.neg.ulp.digits", i(-53)),
            ("double.exponent", i(11)),
            ("double.min.exp", i(-1022)),
            ("double.max.exp", i(1024)),
            ("integer.max", i(i32::MAX)),
            ("sizeof.long", i(8)),
            ("sizeof.longlong", i(8)),
            ("sizeof.longdouble", i(16)),
            ("sizeof.pointer", i(8)),
            ("sizeof.time_t", i(8)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect(),
    ))
}

/// `.Platform`
pub fn platform() -> Value {
    Value::Vector(Vector::named_list(
        vec![
            ("OS.type", "unix"),
            ("file.sep", "/"),
            ("dynlib.ext", ".so"),
            ("GUI", "unknown"),
            ("endian", "little"),
            ("pkgType", "source"),
            ("path.sep", ":"),
            ("r_arch", ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::str(v)))
        .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbase_config::Settings;
    use std::path::Path;

    #[test]
    fn test_defaults() {
        let options = Options::defaults();
        assert_eq!(options.get("digits"), Some(&Value::int(7)));
        assert_eq!(options.get("OutDec"), Some(&Value::str(".")));
        assert_eq!(options.int("nwarnings"), Some(50));
        assert_eq!(options.get("no.such.option"), None);
    }

    #[test]
    fn test_set_returns_old_and_null_removes() {
        let mut options = Options::defaults();
        assert_eq!(options.set("digits", Value::int(10)).unwrap(), Value::int(7));
        assert_eq!(options.set("my.opt", Value::lgl(true)).unwrap(), Value::Null);
        assert_eq!(options.set("my.opt", Value::Null).unwrap(), Value::lgl(true));
        assert!(!options.contains("my.opt"));
    }

    #[test]
    fn test_digits_range() {
        let mut options = Options::defaults();
        let err = options.set("digits", Value::int(30)).unwrap_err();
        assert_eq!(err.message.to_string(), "invalid 'digits' parameter, allowed 1...22");
    }

    #[test]
    fn test_apply_config_file_and_env() {
        let settings = Settings::from_toml_str(
            "[options]\ndigits = 12\n\"my.flag\" = true\n",
            Path::new("rbase.toml"),
        )
        .unwrap();
        let config = Config {
            settings,
            env_options: vec![
                ("WIDTH".to_string(), OptionValue::Integer(120)),
                ("UNKNOWN_THING".to_string(), OptionValue::Bool(true)),
            ],
            project_root: None,
        };
        let mut options = Options::defaults();
        options.apply_config(&config);
        assert_eq!(options.get("digits"), Some(&Value::int(12)));
        assert_eq!(options.get("my.flag"), Some(&Value::lgl(true)));
        assert_eq!(options.get("width"), Some(&Value::int(120)));
        assert!(!options.contains("unknown.thing"));
    }

    #[test]
    fn test_machine_constants() {
        let machine = machine();
        let list = machine.as_vector().unwrap();
        let names = list.names().unwrap();
        let at = |key: &str| names.iter().position(|n| n.as_deref() == Some(key)).unwrap();
        assert_eq!(list.data().element(at("double.eps")), Value::dbl(2f64.powi(-52)));
        assert_eq!(list.data().element(at("integer.max")), Value::int(2147483647));
    }
}

//! OS-facing builtins: shell commands, paths, temp files, DCF files and
//! process environment variables
//!
//! Console output goes through the context console so embedders can capture
//! it. Missing files never panic: depending on the builtin they yield `NA`,
//! a warning or an error.

use crate::args::Args;
use crate::builtins::matrix::set_dimnames_pair;
use crate::builtins::{force_dots, invalid_argument, strings, BuiltinSpec};
use crate::casts::{self, to_bool, to_str};
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::value::{RStr, Value, Vector, VectorData};
use rand::RngExt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::eager("system", &["command", "intern", "ignore.stdout", "ignore.stderr"], builtin_system)
        .custom_visibility(),
    BuiltinSpec::eager("normalizePath", &["path", "winslash", "mustWork"], builtin_normalize_path),
    BuiltinSpec::eager("path.expand", &["path"], builtin_path_expand),
    BuiltinSpec::eager("file.exists", &["..."], builtin_file_exists),
    BuiltinSpec::eager("basename", &["path"], builtin_basename),
    BuiltinSpec::eager("dirname", &["path"], builtin_dirname),
    BuiltinSpec::eager("tempdir", &[], builtin_tempdir),
    BuiltinSpec::eager("tempfile", &["pattern", "tmpdir", "fileext"], builtin_tempfile),
    BuiltinSpec::eager("readDCF", &["file", "fields", "keep.white"], builtin_read_dcf),
    BuiltinSpec::eager("file.show", &["...", "header", "title"], builtin_file_show).invisible(),
    BuiltinSpec::eager("Sys.getenv", &["x", "unset"], builtin_sys_getenv),
    BuiltinSpec::eager("Sys.setenv", &["..."], builtin_sys_setenv).invisible(),
];

fn character_arg(value: Value, formal: &str) -> RResult<Vec<Option<RStr>>> {
    match value {
        Value::Vector(v) => match v.into_data() {
            VectorData::Character(c) => Ok(c),
            _ => Err(Message::MustBeCharacter(formal.to_string()).into()),
        },
        Value::Missing => Err(Message::ArgumentMissing(formal.to_string()).into()),
        _ => Err(Message::MustBeCharacter(formal.to_string()).into()),
    }
}

/// `NULL` or a character vector of names
fn optional_names(value: Value, formal: &str) -> RResult<Option<Vec<String>>> {
    match value {
        Value::Missing | Value::Null => Ok(None),
        other => Ok(Some(
            character_arg(other, formal)?
                .into_iter()
                .flatten()
                .map(|s| s.to_string())
                .collect(),
        )),
    }
}

fn flag_arg(interp: &mut Interpreter, args: &Args, name: &'static str, default: bool) -> RResult<bool> {
    let value = casts::flag(name)
        .default_if_missing(Value::lgl(default))
        .apply(interp, args.get(name))?;
    Ok(to_bool(&value).unwrap_or(default))
}

fn console_line(interp: &mut Interpreter, line: &str) -> RResult<()> {
    writeln!(interp.ctx.console(), "{}", line).map_err(|e| Message::ConsoleWrite(e.to_string()).into())
}

/// Replace a leading `~` with the home directory
pub(crate) fn expand_tilde(path: &str) -> String {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return path.to_string(),
    };
    match dirs::home_dir() {
        Some(home) => format!("{}{}", home.to_string_lossy(), rest),
        None => path.to_string(),
    }
}

/// Apply `f` to every non-NA, non-empty path
fn map_paths(paths: Vec<Option<RStr>>, f: impl Fn(&str) -> String) -> Vector {
    let out = paths
        .into_iter()
        .map(|p| p.map(|p| if p.is_empty() { p } else { RStr::from(f(&p)) }))
        .collect();
    Vector::character(out)
}

// ============================================================================
// system
// ============================================================================

fn shell_program() -> String {
    std::env::var("SHELL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "/bin/sh".to_string())
}

fn builtin_system(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let command = casts::string_scalar("command").apply(interp, args.get("command"))?;
    let command = to_str(&command).ok_or_else(|| invalid_argument("command"))?;
    let intern = flag_arg(interp, args, "intern", false)?;
    let ignore_stdout = flag_arg(interp, args, "ignore.stdout", false)?;
    let ignore_stderr = flag_arg(interp, args, "ignore.stderr", false)?;

    let shell = shell_program();
    // interned output merges stderr into the captured stream
    let script = if intern && !ignore_stderr {
        format!("exec 2>&1\n{}", command)
    } else {
        command.clone()
    };
    let mut cmd = Command::new(&shell);
    cmd.arg("-c").arg(&script).stdin(Stdio::null());
    cmd.stdout(if ignore_stdout && !intern { Stdio::null() } else { Stdio::piped() });
    cmd.stderr(if ignore_stderr { Stdio::null() } else { Stdio::inherit() });

    debug!(%shell, %command, intern, "running system command");
    let output = cmd.output().map_err(|e| {
        debug!(error = %e, "could not spawn shell");
        Message::CommandFailed
    })?;
    let status = output.status.code().unwrap_or(-1);
    let text = String::from_utf8_lossy(&output.stdout);

    if intern {
        interp.ctx.visible = true;
        let lines: Vec<&str> = if ignore_stdout { Vec::new() } else { text.lines().collect() };
        let mut result = Vector::strings(lines);
        if status != 0 {
            result.set_attr("status", Value::int(status));
            interp.warning(Message::CommandStatus(command, status));
        }
        return Ok(Value::Vector(result));
    }

    for line in text.lines() {
        console_line(interp, line)?;
    }
    interp.ctx.visible = false;
    Ok(Value::int(status))
}

// ============================================================================
// Paths
// ============================================================================

fn builtin_normalize_path(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let paths = character_arg(args.get("path"), "path")?;
    casts::string_scalar("winslash")
        .default_if_missing(Value::str("\\"))
        .apply(interp, args.get("winslash"))?;
    let must_work = casts::Cast::new("mustWork")
        .default_if_missing(Value::na_logical())
        .as_logical()
        .must(|v| !v.is_empty(), Message::InvalidArgument("mustWork".to_string()))
        .first_element()
        .apply(interp, args.get("mustWork"))?;
    let must_work = to_bool(&must_work);

    let mut out = Vec::with_capacity(paths.len());
    for (i, path) in paths.into_iter().enumerate() {
        let Some(path) = path else {
            out.push(None);
            continue;
        };
        let expanded = expand_tilde(&path);
        match fs::canonicalize(&expanded) {
            Ok(resolved) => out.push(Some(RStr::from(resolved.to_string_lossy().as_ref()))),
            Err(_) => {
                let message = Message::NoSuchFile(i + 1, expanded.clone());
                match must_work {
                    Some(true) => return Err(message.into()),
                    None => interp.warning(message),
                    Some(false) => {}
                }
                out.push(Some(RStr::from(expanded)));
            }
        }
    }
    Ok(Value::Vector(Vector::character(out)))
}

fn builtin_path_expand(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let paths = character_arg(args.get("path"), "path")?;
    Ok(Value::Vector(map_paths(paths, expand_tilde)))
}

fn builtin_file_exists(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let mut out = Vec::new();
    for dot in force_dots(interp, args)? {
        for path in character_arg(dot.value, "file").map_err(|_| invalid_argument("file"))? {
            let exists = path.is_some_and(|p| Path::new(&expand_tilde(&p)).exists());
            out.push(Some(exists));
        }
    }
    Ok(Value::Vector(Vector::logical(out)))
}

fn basename(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or("").to_string()
}

fn dirname(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    match trimmed.rfind('/') {
        None => ".".to_string(),
        Some(i) => {
            let parent = trimmed[..i].trim_end_matches('/');
            if parent.is_empty() {
                "/".to_string()
            } else {
                parent.to_string()
            }
        }
    }
}

fn builtin_basename(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let paths = character_arg(args.get("path"), "path")?;
    Ok(Value::Vector(map_paths(paths, |p| basename(&expand_tilde(p)))))
}

fn builtin_dirname(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let paths = character_arg(args.get("path"), "path")?;
    Ok(Value::Vector(map_paths(paths, |p| dirname(&expand_tilde(p)))))
}

// ============================================================================
// Temp files
// ============================================================================

fn path_value(path: &Path) -> Value {
    Value::str(&path.to_string_lossy())
}

fn builtin_tempdir(interp: &mut Interpreter, _args: &Args) -> RResult<Value> {
    let dir = interp.ctx.temp_dir()?;
    Ok(path_value(&dir))
}

fn builtin_tempfile(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let pattern = match args.get("pattern") {
        Value::Missing => vec![Some(RStr::from("file"))],
        other => character_arg(other, "pattern")?,
    };
    let tmpdir = match args.get("tmpdir") {
        Value::Missing => vec![Some(RStr::from(interp.ctx.temp_dir()?.to_string_lossy().as_ref()))],
        other => character_arg(other, "tmpdir")?,
    };
    let fileext = match args.get("fileext") {
        Value::Missing => vec![Some(RStr::from(""))],
        other => character_arg(other, "fileext")?,
    };
    if pattern.is_empty() {
        return Err(invalid_argument("pattern"));
    }
    if tmpdir.is_empty() {
        return Err(invalid_argument("tempdir"));
    }
    if fileext.is_empty() {
        return Err(invalid_argument("fileext"));
    }

    let n = pattern.len().max(tmpdir.len()).max(fileext.len());
    let mut rng = rand::rng();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let part = |v: &[Option<RStr>]| v[i % v.len()].as_deref().unwrap_or("NA").to_string();
        let (prefix, dir, ext) = (part(&pattern), part(&tmpdir), part(&fileext));
        let path = loop {
            let suffix: u32 = rng.random();
            let candidate = PathBuf::from(&dir).join(format!("{}{:x}{}", prefix, suffix, ext));
            if !candidate.exists() {
                break candidate;
            }
        };
        out.push(Some(RStr::from(path.to_string_lossy().as_ref())));
    }
    Ok(Value::Vector(Vector::character(out)))
}

// ============================================================================
// DCF
// ============================================================================

type Record = Vec<(String, String)>;

fn malformed(line: &str) -> Message {
    Message::DcfMalformed(line.chars().take(25).collect())
}

/// Parse DCF text into records of `(field, value)` in file order
fn parse_dcf(text: &str, keep_white: &[String]) -> RResult<Vec<Record>> {
    let keeps = |field: &str| keep_white.iter().any(|k| k == field);
    let mut records = Vec::new();
    let mut current: Record = Vec::new();

    for line in text.lines() {
        if line.starts_with('#') {
            continue;
        }
        if line.trim().is_empty() {
            if !current.is_empty() {
                records.push(std::mem::take(&mut current));
            }
            continue;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            let Some((field, value)) = current.last_mut() else {
                return Err(malformed(line).into());
            };
            value.push('\n');
            if keeps(field) {
                value.push_str(line);
            } else {
                value.push_str(line.trim_start());
            }
            continue;
        }
        let Some((field, value)) = line.split_once(':') else {
            return Err(malformed(line).into());
        };
        if field.is_empty() || field.contains(char::is_whitespace) {
            return Err(malformed(line).into());
        }
        let value = if keeps(field) { value.to_string() } else { value.trim_start().to_string() };
        current.retain(|(f, _)| f != field);
        current.push((field.to_string(), value));
    }
    if !current.is_empty() {
        records.push(current);
    }

    for record in &mut records {
        for (field, value) in record.iter_mut() {
            if !keeps(field) {
                *value = value.trim().to_string();
            }
        }
    }
    Ok(records)
}

fn builtin_read_dcf(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let file = casts::string_scalar("file").apply(interp, args.get("file"))?;
    let file = to_str(&file).ok_or_else(|| invalid_argument("file"))?;
    let fields = optional_names(args.get("fields"), "fields")?;
    let keep_white = optional_names(args.get("keep.white"), "keep.white")?.unwrap_or_default();

    let path = expand_tilde(&file);
    let text = fs::read_to_string(&path).map_err(|e| Message::CannotOpenFile(path.clone(), e.to_string()))?;
    let records = parse_dcf(&text, &keep_white)?;
    debug!(path = %path, records = records.len(), "read DCF file");

    let fields = fields.unwrap_or_else(|| {
        let mut seen: Vec<String> = Vec::new();
        for (field, _) in records.iter().flatten() {
            if !seen.contains(field) {
                seen.push(field.clone());
            }
        }
        seen
    });

    let mut data = Vec::with_capacity(records.len() * fields.len());
    for field in &fields {
        for record in &records {
            let value = record.iter().find(|(f, _)| f == field).map(|(_, v)| RStr::from(v.as_str()));
            data.push(value);
        }
    }
    let mut result = Vector::character(data);
    result.set_dim(&[records.len(), fields.len()]);
    let columns = fields.iter().map(|f| Some(RStr::from(f.as_str()))).collect();
    set_dimnames_pair(&mut result, None, Some(columns));
    Ok(Value::Vector(result))
}

// ============================================================================
// file.show
// ============================================================================

fn builtin_file_show(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let mut files = Vec::new();
    for dot in force_dots(interp, args)? {
        let paths = character_arg(dot.value, "file").map_err(|_| Message::InvalidFilenameSpecification)?;
        files.extend(paths);
    }
    let text_arg = |interp: &mut Interpreter, name: &'static str| -> RResult<Vec<String>> {
        match args.get(name) {
            Value::Missing => Ok(vec![String::new()]),
            Value::Vector(v) => Ok(strings(interp, &v)?
                .into_iter()
                .map(|s| s.map_or_else(|| "NA".to_string(), |s| s.to_string()))
                .collect()),
            _ => Err(invalid_argument(name)),
        }
    };
    let headers = text_arg(interp, "header")?;
    let titles = text_arg(interp, "title")?;

    for title in titles.iter().filter(|t| !t.is_empty()) {
        console_line(interp, &format!("==== {} ====", title))?;
    }
    for (i, file) in files.into_iter().enumerate() {
        if let Some(header) = headers.get(i).filter(|h| !h.is_empty()) {
            console_line(interp, &format!("== {} ==", header))?;
        }
        let path = file.as_deref().map(expand_tilde).unwrap_or_else(|| "NA".to_string());
        match fs::read_to_string(&path) {
            Ok(contents) => {
                for line in contents.lines() {
                    console_line(interp, line)?;
                }
            }
            Err(_) => console_line(interp, &format!("NO FILE {}", path))?,
        }
    }
    Ok(Value::Null)
}

// ============================================================================
// Environment variables
// ============================================================================

fn builtin_sys_getenv(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let unset = casts::Cast::new("unset")
        .default_if_missing(Value::str(""))
        .must_be(casts::is_atomic, Message::InvalidArgument("unset".to_string()))
        .as_character()
        .must(|v| v.len() == 1, Message::InvalidArgument("unset".to_string()))
        .apply(interp, args.get("unset"))?;
    let unset: Option<RStr> = match unset.as_vector().map(Vector::data) {
        Some(VectorData::Character(c)) => c[0].clone(),
        _ => None,
    };

    match args.get("x") {
        Value::Missing | Value::Null => {
            let mut vars: Vec<(String, String)> = std::env::vars_os()
                .map(|(k, v)| (k.to_string_lossy().into_owned(), v.to_string_lossy().into_owned()))
                .collect();
            vars.sort();
            let names = vars.iter().map(|(k, _)| Some(RStr::from(k.as_str()))).collect();
            let mut result = Vector::strings(vars.iter().map(|(_, v)| v.as_str()));
            result.set_names(Some(names));
            Ok(Value::Vector(result))
        }
        other => {
            let names = character_arg(other, "x")?;
            let values = names
                .iter()
                .map(|name| {
                    name.as_deref()
                        .and_then(|n| std::env::var(n).ok())
                        .map(RStr::from)
                        .or_else(|| unset.clone())
                })
                .collect();
            let mut result = Vector::character(values);
            if names.len() > 1 {
                result.set_names(Some(names));
            }
            Ok(Value::Vector(result))
        }
    }
}

fn builtin_sys_setenv(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let dots = force_dots(interp, args)?;
    let mut pairs = Vec::with_capacity(dots.len());
    for dot in dots {
        let name = dot
            .name
            .filter(|n| !n.is_empty())
            .ok_or(Message::AllArgumentsMustBeNamed)?;
        let value = match &dot.value {
            Value::Vector(v) if !v.is_empty() => strings(interp, v)?
                .into_iter()
                .next()
                .flatten()
                .map_or_else(|| "NA".to_string(), |s| s.to_string()),
            _ => return Err(Message::WrongLengthForArgument.into()),
        };
        pairs.push((name, value));
    }
    let mut out = Vec::with_capacity(pairs.len());
    for (name, value) in pairs {
        debug!(name = %name, "setting environment variable");
        let ok = !name.contains('=') && !name.contains('\0') && !value.contains('\0');
        if ok {
            std::env::set_var(&name, &value);
        }
        out.push(Some(ok));
    }
    Ok(Value::Vector(Vector::logical(out)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::{eval, eval_in};
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::cell::RefCell;
    use std::io::Write;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Captured(Rc<RefCell<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    fn capturing() -> (Interpreter, Captured) {
        let mut interp = Interpreter::new();
        let captured = Captured::default();
        interp.ctx.set_console(Box::new(captured.clone()));
        (interp, captured)
    }

    #[test]
    fn test_system_intern_collects_lines() {
        let value = eval("system('echo one; echo two', intern = TRUE)").unwrap();
        assert_eq!(value, Value::Vector(Vector::strings(["one", "two"])));
    }

    #[test]
    fn test_system_intern_status_warns() {
        let mut it = Interpreter::new();
        let value = eval_in(&mut it, "system('echo out; exit 3', intern = TRUE)").unwrap();
        assert_eq!(value.attr("status"), Some(&Value::int(3)));
        assert_eq!(
            it.ctx.warnings()[0].message.to_string(),
            "running command 'echo out; exit 3' had status 3"
        );
    }

    #[test]
    fn test_system_returns_status_invisibly() {
        let (mut it, captured) = capturing();
        let status = eval_in(&mut it, "system('echo hello; exit 2')").unwrap();
        assert_eq!(status, Value::int(2));
        assert!(!it.ctx.visible);
        assert_eq!(captured.text(), "hello\n");
    }

    #[test]
    fn test_normalize_path_must_work() {
        let dir = tempfile::tempdir().unwrap();
        let mut it = Interpreter::new();
        let src = format!("normalizePath('{}/./')", dir.path().display());
        let expected = fs::canonicalize(dir.path()).unwrap();
        assert_eq!(eval_in(&mut it, &src).unwrap(), path_value(&expected));

        let missing = format!("{}/nope", dir.path().display());
        let value = eval_in(&mut it, &format!("normalizePath('{}')", missing)).unwrap();
        assert_eq!(value, Value::str(&missing));
        assert_eq!(
            it.ctx.warnings()[0].message.to_string(),
            format!("path[1]=\"{}\": No such file or directory", missing)
        );

        let quiet = eval_in(&mut it, &format!("normalizePath('{}', mustWork = FALSE)", missing)).unwrap();
        assert_eq!(quiet, Value::str(&missing));
        assert_eq!(it.ctx.warnings().len(), 1);

        let err = eval_in(&mut it, &format!("normalizePath('{}', mustWork = TRUE)", missing)).unwrap_err();
        assert!(err.message.to_string().contains("No such file or directory"));
    }

    #[test]
    fn test_basename_dirname() {
        assert_eq!(basename("a/b/c.txt"), "c.txt");
        assert_eq!(basename("a/b/"), "b");
        assert_eq!(basename("/"), "");
        assert_eq!(dirname("a/b/c.txt"), "a/b");
        assert_eq!(dirname("c.txt"), ".");
        assert_eq!(dirname("/c.txt"), "/");
        assert_eq!(dirname("/"), "/");
        assert_eq!(
            eval("basename(c('x/y', NA, ''))").unwrap(),
            Value::Vector(Vector::character(vec![Some("y".into()), None, Some("".into())]))
        );
    }

    #[test]
    fn test_path_expand() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_tilde("~/x"), format!("{}/x", home.display()));
        assert_eq!(expand_tilde("~user/x"), "~user/x");
        assert_eq!(expand_tilde("/abs"), "/abs");
    }

    #[test]
    fn test_tempfile_is_unique_and_inside_tempdir() {
        let mut it = Interpreter::new();
        let dir = eval_in(&mut it, "tempdir()").unwrap();
        let dir = to_str(&dir).unwrap();
        let files = eval_in(&mut it, "tempfile(c('a', 'b'), fileext = '.txt')").unwrap();
        let files = files.as_vector().unwrap();
        let VectorData::Character(paths) = files.data() else { panic!("not character") };
        assert_eq!(paths.len(), 2);
        assert_ne!(paths[0], paths[1]);
        for path in paths.iter().flatten() {
            assert!(path.starts_with(&dir));
            assert!(path.ends_with(".txt"));
            assert!(!Path::new(&**path).exists());
        }
    }

    #[test]
    fn test_file_exists() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let src = format!("file.exists('{}', '/no/such/file', NA_character_)", file.path().display());
        assert_eq!(
            eval(&src).unwrap(),
            Value::Vector(Vector::logical(vec![Some(true), Some(false), Some(false)]))
        );
        assert_eq!(
            eval("file.exists(NA)").unwrap_err().message,
            Message::InvalidArgument("file".to_string())
        );
    }

    #[test]
    fn test_parse_dcf_records() {
        let text = "Package: foo\nVersion: 1.0\nDescription: first line\n  second line\n# comment\n\nPackage: bar\nDepends:  R\n";
        let records = parse_dcf(text, &[]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0][2], ("Description".to_string(), "first line\nsecond line".to_string()));
        assert_eq!(records[1][1], ("Depends".to_string(), "R".to_string()));
    }

    #[test]
    fn test_parse_dcf_keep_white() {
        let records = parse_dcf("Text:   spaced  \n   indented\n", &["Text".to_string()]).unwrap();
        assert_eq!(records[0][0].1, "   spaced  \n   indented");
    }

    #[test]
    fn test_parse_dcf_malformed() {
        let err = parse_dcf("this line has no colon at all\n", &[]).unwrap_err();
        assert_eq!(err.message.to_string(), "Line starting 'this line has no colon at ...' is malformed!");
        assert!(parse_dcf("  continuation first\n", &[]).is_err());
    }

    #[test]
    fn test_read_dcf_matrix() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "A: 1\nB: x\n\nA: 2\n").unwrap();
        let mut it = Interpreter::new();
        let path = file.path().display().to_string();
        eval_in(&mut it, &format!("m <- readDCF('{}')", path)).unwrap();
        assert_eq!(eval_in(&mut it, "dim(m)").unwrap(), Value::Vector(Vector::integer(vec![2, 2])));
        assert_eq!(eval_in(&mut it, "dimnames(m)[[2]]").unwrap(), Value::Vector(Vector::strings(["A", "B"])));
        assert_eq!(eval_in(&mut it, "m[2, 2]").unwrap(), Value::Vector(Vector::character(vec![None])));
        let picked = eval_in(&mut it, &format!("readDCF('{}', fields = 'B')[, 1]", path)).unwrap();
        assert_eq!(picked, Value::Vector(Vector::character(vec![Some("x".into()), None])));
    }

    #[test]
    fn test_read_dcf_missing_file() {
        let err = eval("readDCF('/no/such/file.dcf')").unwrap_err();
        assert!(err.message.to_string().starts_with("cannot open file '/no/such/file.dcf'"));
    }

    #[test]
    fn test_file_show_writes_console() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "line 1\nline 2\n").unwrap();
        let (mut it, captured) = capturing();
        let src = format!(
            "file.show('{}', '/no/such/file', header = c('first', ''), title = 'Files')",
            file.path().display()
        );
        assert_eq!(eval_in(&mut it, &src).unwrap(), Value::Null);
        assert!(!it.ctx.visible);
        assert_eq!(
            captured.text(),
            "==== Files ====\n== first ==\nline 1\nline 2\nNO FILE /no/such/file\n"
        );
    }

    #[test]
    #[serial]
    fn test_sys_setenv_getenv() {
        let mut it = Interpreter::new();
        let set = eval_in(&mut it, "Sys.setenv(RBASE_TEST_VAR = 'hello', RBASE_TEST_NUM = 3)").unwrap();
        assert_eq!(set, Value::Vector(Vector::logical(vec![Some(true), Some(true)])));
        assert_eq!(eval_in(&mut it, "Sys.getenv('RBASE_TEST_VAR')").unwrap(), Value::str("hello"));
        assert_eq!(eval_in(&mut it, "Sys.getenv('RBASE_TEST_NUM')").unwrap(), Value::str("3"));
        assert_eq!(
            eval_in(&mut it, "Sys.getenv('RBASE_TEST_UNSET_VAR', unset = NA)").unwrap(),
            Value::Vector(Vector::character(vec![None]))
        );
        let both = eval_in(&mut it, "names(Sys.getenv(c('RBASE_TEST_VAR', 'RBASE_TEST_NUM')))").unwrap();
        assert_eq!(both, Value::Vector(Vector::strings(["RBASE_TEST_VAR", "RBASE_TEST_NUM"])));
        let all = eval_in(&mut it, "Sys.getenv()[['RBASE_TEST_VAR']]").unwrap();
        assert_eq!(all, Value::str("hello"));
    }

    #[test]
    #[serial]
    fn test_sys_setenv_requires_names() {
        let err = eval("Sys.setenv('x')").unwrap_err();
        assert_eq!(err.message.to_string(), "all arguments must be named");
    }
}

//! Session lifecycle and configuration loading

mod common;

use common::*;
use pretty_assertions::assert_eq;
use rbase_config::ConfigLoader;
use rbase_runtime::{Message, Session, Value};
use serial_test::serial;
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::rc::Rc;

/// Console sink that can be inspected after the session wrote to it
#[derive(Clone, Default)]
struct Console(Rc<RefCell<Vec<u8>>>);

impl Write for Console {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn load_session(project: &std::path::Path) -> Session {
    let global = project.join("no-global.toml");
    let config = ConfigLoader::with_global_config_path(global)
        .load_from_directory(project)
        .unwrap();
    Session::with_config(&config)
}

#[test]
#[serial]
fn test_project_config_sets_options_and_seed() {
    let project = tempfile::tempdir().unwrap();
    fs::write(
        project.path().join("rbase.toml"),
        "[options]\ndigits = 4\n\"my.flag\" = true\n\n[session]\nseed = 11\n",
    )
    .unwrap();
    let nested = project.path().join("src");
    fs::create_dir(&nested).unwrap();

    let a = load_session(&nested);
    let b = load_session(&nested);
    assert_eq!(a.eval("getOption('digits')").unwrap(), Value::int(4));
    assert_eq!(a.eval("getOption('my.flag')").unwrap(), Value::lgl(true));
    assert_eq!(a.eval("sample(100, 5)").unwrap(), b.eval("sample(100, 5)").unwrap());
}

#[test]
#[serial]
fn test_env_overrides_known_options_only() {
    let project = tempfile::tempdir().unwrap();
    std::env::set_var("RBASE_OPTION_WIDTH", "120");
    std::env::set_var("RBASE_OPTION_NOT_AN_OPTION", "1");
    let session = load_session(project.path());
    std::env::remove_var("RBASE_OPTION_WIDTH");
    std::env::remove_var("RBASE_OPTION_NOT_AN_OPTION");

    assert_eq!(session.eval("getOption('width')").unwrap(), Value::int(120));
    assert_eq!(session.eval("getOption('not.an.option')").unwrap(), Value::Null);
}

#[test]
#[serial]
fn test_configured_tmpdir_hosts_tempdir() {
    let project = tempfile::tempdir().unwrap();
    let parent = tempfile::tempdir().unwrap();
    fs::write(
        project.path().join("rbase.toml"),
        format!("[session]\ntmpdir = \"{}\"\n", parent.path().display()),
    )
    .unwrap();
    let session = load_session(project.path());
    let dir = session.eval("tempdir()").unwrap();
    let dir = match dir.as_vector().map(|v| v.data()) {
        Some(rbase_runtime::VectorData::Character(c)) => c[0].as_deref().unwrap().to_string(),
        other => panic!("tempdir returned {:?}", other),
    };
    assert!(dir.starts_with(&parent.path().display().to_string()));
    assert!(std::path::Path::new(&dir).is_dir());
    drop(session);
    assert!(!std::path::Path::new(&dir).exists());
}

#[test]
fn test_console_receives_file_show_and_system_output() {
    let session = Session::new();
    let console = Console::default();
    session.set_console(Box::new(console.clone()));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "Package: demo").unwrap();
    let source = format!("file.show('{}', title = 'DESCRIPTION')", file.path().display());
    assert_eq!(session.eval(&source).unwrap(), Value::Null);
    assert!(!session.visible());
    assert_eq!(session.eval("system('echo from shell')").unwrap(), Value::int(0));

    let text = String::from_utf8(console.0.borrow().clone()).unwrap();
    assert_eq!(text, "==== DESCRIPTION ====\nPackage: demo\nfrom shell\n");
}

#[test]
fn test_warnings_accumulate_across_evals() {
    let session = Session::new();
    session.eval("as.integer('x')").unwrap();
    session.eval("sqrt(-1)").unwrap();
    let messages: Vec<Message> = session.take_warnings().into_iter().map(|w| w.message).collect();
    assert_eq!(messages, vec![Message::NasIntroducedByCoercion, Message::NansProduced]);
    assert!(session.warnings().is_empty());
}

#[test]
fn test_global_state_and_search_path() {
    let session = Session::new();
    session.eval("e <- new.env(); assign('v', 10, envir = e); attach(e, name = 'extra')").unwrap();
    assert_eq!(session.eval("search()").unwrap(), strs(&[".GlobalEnv", "extra", "package:base"]));
    assert_eq!(session.eval("v").unwrap(), Value::dbl(10.0));
    session.eval("detach('extra')").unwrap();
    assert_eq!(session.eval("v").unwrap_err().message.to_string(), "object 'v' not found");
}

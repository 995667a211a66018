//! Embedding example
//!
//! Evaluates a few expressions in one session, calls a builtin directly and
//! prints the warnings collected along the way.
//!
//! Run with: cargo run --example session_demo -p rbase-runtime

use rbase_runtime::{Session, Value};

fn main() {
    let session = Session::new();

    let steps = [
        "x <- c(a = 3, b = 1, c = NA, d = 7)",
        "cummax(x)",
        "rank(c(10, 20, 20, 30))",
        "paste0(toupper(letters[1:3]), 1:3)",
        "sapply(list(a = 1:3, b = 4:6), sum)",
        "as.integer(c('1', 'two'))",
        "set.seed(1); sample(5)",
    ];
    for source in steps {
        match session.eval(source) {
            Ok(value) if session.visible() => println!("> {}\n{}", source, value),
            Ok(_) => println!("> {}", source),
            Err(err) => println!("> {}\n{}", source, err),
        }
    }

    let args = vec![(None, Value::dbl(12.345)), (Some("digits".to_string()), Value::int(1))];
    match session.call("round", args) {
        Ok(value) => println!("round(12.345, digits = 1) = {}", value),
        Err(err) => println!("{}", err),
    }

    for warning in session.take_warnings() {
        println!("{}", warning);
    }
}

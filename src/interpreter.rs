use crate::environment::Environment;
use crate::evaluator::{self, EVAL};
use crate::reader::{self, Reader};
use crate::{core, printer, Value};
use std::fmt;
use std::fs::read_to_string;
use std::path::Path;
use std::rc::Rc;

pub type Result<T = Value> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Read(reader::Error),
    Eval(evaluator::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Read(e) => write!(f, "syntax error: {}", e),
            Error::Eval(e) => write!(f, "{}", e),
        }
    }
}

impl From<reader::Error> for Error {
    fn from(e: reader::Error) -> Self {
        Error::Read(e)
    }
}

impl From<evaluator::Error> for Error {
    fn from(e: evaluator::Error) -> Self {
        Error::Eval(e)
    }
}

/// A global environment with every primitive bound, but no prelude.
pub fn bare_environment() -> Rc<Environment> {
    let env = Environment::empty();
    core::install(&env);
    env
}

/// The environment the binary runs in: primitives plus the prelude.
pub fn new_environment() -> Rc<Environment> {
    let env = bare_environment();
    read_prelude(&env).expect("error reading prelude");
    env
}

pub fn read(line: &str) -> Result {
    reader::read_str(line).map_err(Error::Read)
}

pub fn eval(obj: &Value, env: &Rc<Environment>) -> Result {
    EVAL(obj, env).map_err(Error::Eval)
}

/// Evaluates every datum in `source` in order and returns the last value (Void if there are
/// none). Stops at the first error.
pub fn eval_str(source: &str, env: &Rc<Environment>) -> Result {
    let mut last = Value::Void;
    for datum in Reader::new(source) {
        last = eval(&datum?, env)?;
    }
    Ok(last)
}

/// Read, evaluate, and `write` the value of each datum in `line`. Void values print as nothing.
pub fn rep(line: &str, env: &Rc<Environment>) -> std::result::Result<String, String> {
    let mut outputs = Vec::new();
    for datum in Reader::new(line) {
        let value = datum
            .map_err(Error::Read)
            .and_then(|obj| eval(&obj, env))
            .map_err(|e| e.to_string())?;
        if !value.is_void() {
            outputs.push(printer::write(&value));
        }
    }
    Ok(outputs.join("\n"))
}

/// Reads and evaluates a whole file in `env`, returning the last value.
pub fn load_file<P: AsRef<Path>>(path: P, env: &Rc<Environment>) -> evaluator::Result {
    let path = path.as_ref();
    log::info!("loading {}", path.display());
    let contents = read_to_string(path)?;
    let mut last = Value::Void;
    for datum in Reader::new(&contents) {
        last = EVAL(&datum?, env)?;
    }
    Ok(last)
}

pub fn read_prelude(env: &Rc<Environment>) -> Result<()> {
    const PRELUDE: &str = include_str!("prelude.lispy");
    eval_str(PRELUDE, env).map(|_| ())
}

use crate::environment::Environment;
use crate::reader::{self, Reader};
use crate::types::Symbol;
use crate::{evaluator, interpreter, printer, Value};
use ansi_term::Colour::Red;
use linefeed::{DefaultTerminal, Interface, ReadResult, Terminal};
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

const PROMPT: &str = "> ";
const CONTINUATION_PROMPT: &str = "  ";

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Eval(evaluator::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Eval(e) => write!(f, "{}", e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub fn setup() -> std::io::Result<Interface<DefaultTerminal>> {
    let interface = linefeed::Interface::new("lispy")?;
    interface.set_prompt(PROMPT)?;
    if let Some(path) = history_path() {
        interface.load_history(path).ok();
    };
    Ok(interface)
}

fn history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|mut path| {
        path.push(".lispy_history");
        path
    })
}

pub fn save_history<T: Terminal>(interface: &Interface<T>) -> std::io::Result<()> {
    match history_path() {
        Some(path) => interface.save_history(path),
        None => Ok(()),
    }
}

/// True if `input` stops partway through a datum, so the user should be asked for more.
fn is_incomplete(input: &str) -> bool {
    Reader::new(input).any(|datum| matches!(datum, Err(reader::Error::UnexpectedEof(_))))
}

fn report_error<T: Terminal>(interface: &Interface<T>, message: &dyn fmt::Display) {
    let text = format!("error: {}", message);
    match atty::is(atty::Stream::Stdout) {
        true => writeln!(interface, "{}", Red.paint(text)).ok(),
        false => writeln!(interface, "{}", text).ok(),
    };
}

/// Evaluates each datum in `input` in turn, printing every non-void value. The first error
/// abandons the rest of the input.
fn process<T: Terminal>(interface: &Interface<T>, input: &str, env: &Rc<Environment>) {
    for datum in Reader::new(input) {
        let result = datum
            .map_err(interpreter::Error::Read)
            .and_then(|obj| interpreter::eval(&obj, env));
        match result {
            Ok(value) if value.is_void() => {}
            Ok(value) => {
                writeln!(interface, "{}", printer::write(&value)).ok();
            }
            Err(e) => {
                report_error(interface, &e);
                break;
            }
        }
    }
}

pub fn repl<T: Terminal>(interface: &Interface<T>, env: &Rc<Environment>) {
    let mut pending = String::new();
    loop {
        match interface.read_line() {
            Ok(ReadResult::Eof) => break,
            Ok(ReadResult::Signal(sig)) => {
                writeln!(interface, "Received signal {:?}", sig).ok();
                pending.clear();
                interface.set_prompt(PROMPT).ok();
            }
            Ok(ReadResult::Input(line)) => {
                interface.add_history_unique(line.clone());
                pending.push_str(&line);
                pending.push('\n');
                if is_incomplete(&pending) {
                    interface.set_prompt(CONTINUATION_PROMPT).ok();
                    continue;
                }
                interface.set_prompt(PROMPT).ok();
                let input = std::mem::take(&mut pending);
                process(interface, &input, env);
            }
            Err(e) => {
                writeln!(interface, "Error: {}", e).ok();
                break;
            }
        }
    }
}

/// `lispy FILE ARGS...` loads FILE with `*ARGV*` bound to ARGS. `lispy` alone starts the REPL.
pub fn launch(args: Vec<String>, env: &Rc<Environment>) -> Result<(), Error> {
    let script_args = args.iter().skip(2).map(|arg| Value::string(arg.as_str()));
    env.define(Symbol::intern("*ARGV*"), Value::list(script_args.collect()));
    match args.get(1) {
        Some(path) => interpreter::load_file(path, env)
            .map(|_| ())
            .map_err(Error::Eval),
        None => {
            let interface = setup()?;
            repl(&interface, env);
            save_history(&interface)?;
            Ok(())
        }
    }
}

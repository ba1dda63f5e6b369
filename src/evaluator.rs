use crate::environment::{self, Environment};
use crate::special_forms::{self, BadForm};
use crate::types::{
    Arity, BadArgCount, Closure, Int, Macro, Primitive, TypeMismatch, Value, REST_PARAMETER,
};
use crate::reader;

use itertools::Itertools;
use std::fmt;
use std::rc::Rc;

pub type Result<T = Value> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Unbound(environment::Unbound),
    TypeMismatch(TypeMismatch),
    BadArgCount(BadArgCount),
    BadForm(BadForm),
    UnknownProcedureType(Value),
    CannotEvaluate(Value),
    DivideByZero,
    BadIndex(Int, usize),
    Read(reader::Error),
    Io(std::io::Error),
    AllocationFailure,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Unbound(e) => write!(f, "{}", e),
            Error::TypeMismatch(e) => write!(f, "wrong type: {}", e),
            Error::BadArgCount(e) => write!(f, "{}", e),
            Error::BadForm(e) => write!(f, "bad syntax: {}", e),
            Error::UnknownProcedureType(obj) => {
                write!(f, "unknown procedure type: {} is not applicable", obj)
            }
            Error::CannotEvaluate(obj) => write!(f, "cannot evaluate {}", obj),
            Error::DivideByZero => write!(f, "cannot divide by zero"),
            Error::BadIndex(i, len) => {
                write!(f, "bad index: {} out of range for length {}", i, len)
            }
            Error::Read(e) => write!(f, "read error: {}", e),
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::AllocationFailure => write!(f, "out of memory"),
        }
    }
}

impl From<TypeMismatch> for Error {
    fn from(t: TypeMismatch) -> Self {
        Self::TypeMismatch(t)
    }
}

impl From<BadArgCount> for Error {
    fn from(e: BadArgCount) -> Self {
        Self::BadArgCount(e)
    }
}

impl From<reader::Error> for Error {
    fn from(e: reader::Error) -> Self {
        match e {
            reader::Error::AllocationFailure => Self::AllocationFailure,
            e => Self::Read(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[allow(non_snake_case)]
pub(crate) fn EVAL(orig_ast: &Value, orig_env: &Rc<Environment>) -> Result {
    let mut ast = orig_ast.clone();
    let mut env = orig_env.clone();
    loop {
        log::trace!("EVAL {}", ast);
        let elements = match &ast {
            Value::Symbol(s) => return env.lookup(s).map_err(Error::Unbound),
            Value::Pair(_) => ast
                .to_vec()
                .map_err(|_| BadForm::ImproperForm(ast.clone()))?,
            obj if obj.is_self_evaluating() => return Ok(obj.clone()),
            obj => return Err(Error::CannotEvaluate(obj.clone())),
        };
        let (head, args) = match elements.split_first() {
            Some(parts) => parts,
            None => return Err(Error::CannotEvaluate(ast.clone())),
        };

        if let Value::Symbol(name) = head {
            match name.as_str() {
                "quote" => return special_forms::apply_quote(args),
                "set!" => return special_forms::apply_set(args, &env),
                "define" => return special_forms::apply_define(args, &env),
                "define-macro" => return special_forms::apply_define_macro(args, &env),
                "lambda" => return special_forms::apply_lambda(args, &env),
                "test" => return special_forms::apply_test(args, &env),
                "if" => {
                    ast = special_forms::apply_if(args, &env)?;
                    continue;
                }
                "cond" => {
                    ast = special_forms::expand_cond(args)?;
                    continue;
                }
                "begin" => {
                    ast = special_forms::apply_begin(args, &env)?;
                    continue;
                }
                "let" => {
                    ast = special_forms::expand_let(args)?;
                    continue;
                }
                "macroexpand" => {
                    Arity::exactly(1).validate_for(args.len(), "macroexpand")?;
                    return macroexpand(&args[0], &env);
                }
                // Anything else names a procedure or macro, handled below.
                _ => (),
            }
        }

        let operator = EVAL(head, &env)?;
        if let Value::Macro(m) = &operator {
            let expansion = expand_macro(m, args)?;
            log::debug!("macro call {} expanded to {}", ast, expansion);
            ast = expansion;
            continue;
        }
        let values = evaluate_arguments(args, &env)?;
        match apply(&operator, values)? {
            ApplyOutcome::Finished(obj) => return Ok(obj),
            ApplyOutcome::EvaluateFurther(next_ast, next_env) => {
                ast = next_ast;
                env = next_env;
            }
        }
    }
}

// Applying a closure only gets as far as its tail form. EVAL keeps looping on that; everyone
// else goes through apply_fully.
pub(crate) enum ApplyOutcome {
    Finished(Value),
    EvaluateFurther(Value, Rc<Environment>),
}

pub(crate) fn apply_fully(callable: &Value, args: Vec<Value>) -> Result {
    apply(callable, args).and_then(|outcome| match outcome {
        ApplyOutcome::Finished(obj) => Ok(obj),
        ApplyOutcome::EvaluateFurther(ast, env) => EVAL(&ast, &env),
    })
}

pub(crate) fn apply(callable: &Value, args: Vec<Value>) -> Result<ApplyOutcome> {
    match callable {
        Value::Primitive(f) => call_primitive(f, &args).map(ApplyOutcome::Finished),
        Value::Closure(f) => {
            let env = make_closure_env(f, args)?;
            let ast = special_forms::apply_begin(&f.body, &env)?;
            Ok(ApplyOutcome::EvaluateFurther(ast, env))
        }
        _ => Err(Error::UnknownProcedureType(callable.clone())),
    }
}

pub fn evaluate_arguments(args: &[Value], env: &Rc<Environment>) -> Result<Vec<Value>> {
    args.iter().map(|obj| EVAL(obj, env)).collect()
}

pub(crate) fn pretty_print_args(args: &[Value]) -> String {
    match args.len() {
        0 => "no args".into(),
        1 => args[0].to_string(),
        _ => format!("\n\t{}", args.iter().join("\n\t")),
    }
}

pub fn call_primitive(func: &Primitive, args: &[Value]) -> Result {
    func.arity.validate_for(args.len(), func.name)?;
    log::trace!("Call {} with {}", func.name, pretty_print_args(args));
    let result = (func.func)(args);
    match &result {
        Ok(val) => log::trace!("Call to {} resulted in {}", func.name, val),
        Err(e) => log::trace!("Call to {} failed: {}", func.name, e),
    }
    result
}

/// Binds parameters to arguments positionally. Counts are never checked: surplus arguments are
/// dropped and parameters without an argument stay unbound. `&rest` takes every argument left,
/// as a list.
fn make_closure_env(func: &Closure, args: Vec<Value>) -> Result<Rc<Environment>> {
    log::trace!("Call {:?} with {}", func, pretty_print_args(&args));
    let mut variables = Vec::new();
    let mut values = Vec::new();
    let mut args = args.into_iter();
    for parameter in func.parameters.iter_list() {
        let symbol = parameter?.as_symbol()?.clone();
        if symbol.as_str() == REST_PARAMETER {
            variables.push(symbol);
            values.push(Value::list(args.by_ref().collect()));
            break;
        }
        if let Some(value) = args.next() {
            variables.push(symbol);
            values.push(value);
        }
    }
    Ok(Environment::extend(variables, values, &func.parent))
}

/// Calls the transformer on the quoted argument expressions. The result still needs evaluating.
fn expand_macro(m: &Macro, args: &[Value]) -> Result {
    apply_fully(&m.transformer, vec![Value::list(args.to_vec())])
}

fn macro_at_head(ast: &Value, env: &Environment) -> Option<Rc<Macro>> {
    let head = ast.as_pair().ok()?.first();
    match env.lookup(head.as_symbol().ok()?) {
        Ok(Value::Macro(m)) => Some(m),
        _ => None,
    }
}

/// Expands `ast` until its head no longer names a macro, without evaluating the result.
pub(crate) fn macroexpand(ast: &Value, env: &Rc<Environment>) -> Result {
    let mut ast = ast.clone();
    while let Some(m) = macro_at_head(&ast, env) {
        let args = ast.as_pair()?.second().to_vec()?;
        ast = expand_macro(&m, &args)?;
        log::trace!("macroexpand produced {}", ast);
    }
    Ok(ast)
}

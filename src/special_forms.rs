use crate::environment::Environment;
use crate::evaluator::{Error, Result, EVAL};
use crate::printer;
use crate::types::{equal, Symbol, TypeMismatch, Value};
use std::fmt;
use std::rc::Rc;

pub const NO_DOCSTRING: &str = "No docstring";

#[derive(Debug)]
pub enum BadForm {
    WrongLength { form: &'static str, got: usize },
    NotASymbol { form: &'static str, got: Value },
    ImproperForm(Value),
    MissingAlternative,
    ExpectedElse(Value),
    BadParameters(Value),
    EmptyBody { form: &'static str },
    EmptyBegin,
    BadBinding(Value),
    BadClause(Value),
    UnevenTestArguments(usize),
}

impl fmt::Display for BadForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BadForm::WrongLength { form, got } => {
                write!(f, "{}: wrong number of parts ({})", form, got)
            }
            BadForm::NotASymbol { form, got } => write!(f, "{}: {} is not a symbol", form, got),
            BadForm::ImproperForm(form) => write!(f, "cannot evaluate improper list {}", form),
            BadForm::MissingAlternative => write!(f, "if: missing alternative"),
            BadForm::ExpectedElse(got) => write!(f, "if: expected else, found {}", got),
            BadForm::BadParameters(params) => {
                write!(f, "lambda: parameters {} are not a list of symbols", params)
            }
            BadForm::EmptyBody { form } => write!(f, "{}: empty body", form),
            BadForm::EmptyBegin => write!(f, "begin: nothing to evaluate"),
            BadForm::BadBinding(binding) => write!(f, "let: malformed binding {}", binding),
            BadForm::BadClause(clause) => write!(f, "cond: malformed clause {}", clause),
            BadForm::UnevenTestArguments(n) => write!(
                f,
                "test: expects (actual => expected) triples, but received {} arguments",
                n
            ),
        }
    }
}

impl From<BadForm> for Error {
    fn from(e: BadForm) -> Self {
        Error::BadForm(e)
    }
}

fn expect_length(
    args: &[Value],
    n: usize,
    form: &'static str,
) -> std::result::Result<(), BadForm> {
    match args.len() == n {
        true => Ok(()),
        false => Err(BadForm::WrongLength {
            form,
            got: args.len(),
        }),
    }
}

fn expect_symbol(obj: &Value, form: &'static str) -> std::result::Result<Symbol, BadForm> {
    obj.as_symbol().map(Symbol::clone).map_err(|_| BadForm::NotASymbol {
        form,
        got: obj.clone(),
    })
}

pub fn apply_quote(args: &[Value]) -> Result {
    expect_length(args, 1, "quote")?;
    Ok(args[0].clone())
}

pub fn apply_set(args: &[Value], env: &Rc<Environment>) -> Result {
    expect_length(args, 2, "set!")?;
    let symbol = expect_symbol(&args[0], "set!")?;
    let value = EVAL(&args[1], env)?;
    env.assign(&symbol, value).map_err(Error::Unbound)?;
    Ok(Value::Void)
}

/// Both `(define name expr)` and the procedure shorthand `(define (name params...) body...)`.
pub fn apply_define(args: &[Value], env: &Rc<Environment>) -> Result {
    let target = args.first().ok_or(BadForm::WrongLength {
        form: "define",
        got: 0,
    })?;
    let (symbol, value) = match target {
        Value::Symbol(symbol) => {
            expect_length(args, 2, "define")?;
            (symbol.clone(), EVAL(&args[1], env)?)
        }
        Value::Pair(signature) => {
            let symbol = expect_symbol(&signature.first(), "define")?;
            let procedure = make_lambda(&signature.second(), &args[1..], env, "define")?;
            (symbol, procedure)
        }
        other => {
            return Err(BadForm::NotASymbol {
                form: "define",
                got: other.clone(),
            }
            .into())
        }
    };
    log::debug!("define {} as {}", symbol, value);
    env.define(symbol, value);
    Ok(Value::Void)
}

/// Evaluates the test and returns the branch to continue with.
pub fn apply_if(args: &[Value], env: &Rc<Environment>) -> Result {
    let alternative = match args.len() {
        2 => return Err(BadForm::MissingAlternative.into()),
        3 => &args[2],
        4 if args[2].is_symbol_named("else") => &args[3],
        4 => return Err(BadForm::ExpectedElse(args[2].clone()).into()),
        n => return Err(BadForm::WrongLength { form: "if", got: n }.into()),
    };
    let condition = EVAL(&args[0], env)?;
    match condition.is_true() {
        true => Ok(args[1].clone()),
        false => Ok(alternative.clone()),
    }
}

/// Rewrites `cond` as nested `if`s. An `else` clause discards every clause after it.
pub fn expand_cond(clauses: &[Value]) -> Result {
    let mut expansion = Value::Boolean(false);
    for clause in clauses.iter().rev() {
        let parts = clause
            .to_vec()
            .map_err(|_| BadForm::BadClause(clause.clone()))?;
        let consequent = match parts.len() {
            0 | 1 => return Err(BadForm::BadClause(clause.clone()).into()),
            2 => parts[1].clone(),
            _ => sequence(&parts[1..]),
        };
        expansion = match parts[0].is_symbol_named("else") {
            true => consequent,
            false => Value::list(vec![
                Value::symbol("if"),
                parts[0].clone(),
                consequent,
                expansion,
            ]),
        };
    }
    log::trace!("cond expanded to {}", expansion);
    Ok(expansion)
}

fn sequence(forms: &[Value]) -> Value {
    let mut list = Vec::with_capacity(forms.len() + 1);
    list.push(Value::symbol("begin"));
    list.extend_from_slice(forms);
    Value::list(list)
}

pub fn apply_lambda(args: &[Value], env: &Rc<Environment>) -> Result {
    let parameters = args.first().ok_or(BadForm::WrongLength {
        form: "lambda",
        got: 0,
    })?;
    make_lambda(parameters, &args[1..], env, "lambda")
}

fn make_lambda(
    parameters: &Value,
    body: &[Value],
    env: &Rc<Environment>,
    form: &'static str,
) -> Result {
    let well_formed = parameters
        .iter_list()
        .all(|p| matches!(p, Ok(Value::Symbol(_))));
    if !well_formed {
        return Err(BadForm::BadParameters(parameters.clone()).into());
    }
    // A lone string is the body, not documentation.
    let (docstring, body) = match body {
        [] => return Err(BadForm::EmptyBody { form }.into()),
        [doc @ Value::String(_), rest @ ..] if !rest.is_empty() => (doc.clone(), rest),
        body => (Value::string(NO_DOCSTRING), body),
    };
    Ok(Value::closure(
        parameters.clone(),
        body.to_vec(),
        env.clone(),
        docstring,
    ))
}

/// Evaluates every form but the last for effect and hands the last back for tail evaluation.
pub fn apply_begin(forms: &[Value], env: &Rc<Environment>) -> Result {
    let (last, init) = forms.split_last().ok_or(BadForm::EmptyBegin)?;
    for form in init {
        EVAL(form, env)?;
    }
    Ok(last.clone())
}

/// Rewrites `(let ((v e) ...) body...)` as `((lambda (v ...) body...) e ...)`.
pub fn expand_let(args: &[Value]) -> Result {
    let (bindings, body) = args.split_first().ok_or(BadForm::WrongLength {
        form: "let",
        got: 0,
    })?;
    if body.is_empty() {
        return Err(BadForm::EmptyBody { form: "let" }.into());
    }
    let bindings = bindings
        .to_vec()
        .map_err(|_| BadForm::BadBinding(bindings.clone()))?;

    let mut variables = Vec::with_capacity(bindings.len());
    let mut initializers = Vec::with_capacity(bindings.len());
    for binding in bindings {
        match binding.to_vec().as_deref() {
            Ok([variable @ Value::Symbol(_), init]) => {
                variables.push(variable.clone());
                initializers.push(init.clone());
            }
            _ => return Err(BadForm::BadBinding(binding).into()),
        }
    }

    let mut lambda = vec![Value::symbol("lambda"), Value::list(variables)];
    lambda.extend_from_slice(body);
    let mut application = vec![Value::list(lambda)];
    application.extend(initializers);
    Ok(Value::list(application))
}

pub fn apply_define_macro(args: &[Value], env: &Rc<Environment>) -> Result {
    expect_length(args, 2, "define-macro")?;
    let symbol = expect_symbol(&args[0], "define-macro")?;
    let transformer = EVAL(&args[1], env)?;
    if !transformer.is_procedure() {
        return Err(Error::TypeMismatch(TypeMismatch::NotAProcedure));
    }
    log::debug!("define-macro {} as {}", symbol, transformer);
    env.define(symbol, Value::new_macro(transformer));
    Ok(Value::Void)
}

/// `(test actual => expected ...)`. Mismatches are reported, never raised.
pub fn apply_test(args: &[Value], env: &Rc<Environment>) -> Result {
    if args.len() % 3 != 0 {
        return Err(BadForm::UnevenTestArguments(args.len()).into());
    }
    let scratch = Environment::extend(vec![], vec![], &env.outermost());
    for triple in args.chunks(3) {
        let (test_case, expected) = (&triple[0], &triple[2]);
        let actual = EVAL(test_case, &scratch)?;
        let wanted = EVAL(expected, &scratch)?;
        if !equal(&actual, &wanted) {
            log::warn!(
                "test failed: {} gave {}, expected {}",
                test_case,
                actual,
                wanted
            );
            println!("{}", mismatch_report(test_case, expected));
        }
    }
    Ok(Value::Void)
}

/// What `test` prints for a triple whose two sides disagree.
pub fn mismatch_report(test_case: &Value, expected: &Value) -> String {
    format!(
        "{}\n!= {}",
        printer::write(test_case),
        printer::write(expected)
    )
}

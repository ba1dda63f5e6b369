use crate::environment::Environment;
use crate::evaluator::{self, apply_fully, Error, EVAL};
use crate::types::{equal, identical, Arity, Float, Int, Symbol, TypeMismatch, Value};
use crate::{interpreter, printer, reader};
use itertools::Itertools;
use std::cmp::Ordering;
use std::convert::TryFrom;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::SystemTime;

pub(crate) struct PrimitiveFn {
    pub name: &'static str,
    pub fn_ptr: fn(&[Value]) -> evaluator::Result,
    pub arity: Arity,
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(Int),
    Float(Float),
}

impl Number {
    fn of(obj: &Value) -> Result<Self, TypeMismatch> {
        match obj {
            Value::Integer(i) => Ok(Number::Int(*i)),
            Value::Float(x) => Ok(Number::Float(*x)),
            _ => Err(TypeMismatch::NotANumber),
        }
    }

    fn to_float(self) -> Float {
        match self {
            Number::Int(i) => i as Float,
            Number::Float(x) => x,
        }
    }

    fn combine(
        self,
        other: Self,
        int_op: fn(Int, Int) -> Int,
        float_op: fn(Float, Float) -> Float,
    ) -> Self {
        match (self, other) {
            (Number::Int(x), Number::Int(y)) => Number::Int(int_op(x, y)),
            (x, y) => Number::Float(float_op(x.to_float(), y.to_float())),
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(i) => Value::Integer(i),
            Number::Float(x) => Value::Float(x),
        }
    }
}

fn grab_numbers(args: &[Value]) -> evaluator::Result<Vec<Number>> {
    let type_check: Result<Vec<_>, _> = args.iter().map(Number::of).collect();
    type_check.map_err(Error::TypeMismatch)
}

fn fold_numbers(
    args: &[Value],
    int_op: fn(Int, Int) -> Int,
    float_op: fn(Float, Float) -> Float,
) -> evaluator::Result {
    let numbers = grab_numbers(args)?;
    let (first, rest) = match numbers.split_first() {
        Some(parts) => parts,
        None => return Err(TypeMismatch::NotANumber.into()),
    };
    let value = rest
        .iter()
        .fold(*first, |acc, &x| acc.combine(x, int_op, float_op));
    Ok(value.into())
}

// Arithmetic

const SUM: PrimitiveFn = PrimitiveFn {
    name: "+",
    fn_ptr: sum_,
    arity: Arity::at_least(0),
};

/// Adds numbers, or joins strings and characters into a new string.
fn sum_(args: &[Value]) -> evaluator::Result {
    match args.first() {
        None => Ok(Value::Integer(0)),
        Some(Value::String(_)) | Some(Value::Character(_)) => concatenate(args),
        Some(_) => fold_numbers(args, Int::wrapping_add, |x, y| x + y),
    }
}

fn concatenate(args: &[Value]) -> evaluator::Result {
    let mut pieces = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Value::String(s) => pieces.push(s.borrow().clone()),
            Value::Character(c) => pieces.push(c.to_string()),
            _ => return Err(TypeMismatch::NotAString.into()),
        }
    }
    let mut joined = String::new();
    joined
        .try_reserve(pieces.iter().map(String::len).sum())
        .map_err(|_| Error::AllocationFailure)?;
    pieces.iter().for_each(|piece| joined.push_str(piece));
    Ok(Value::string(joined))
}

const SUB: PrimitiveFn = PrimitiveFn {
    name: "-",
    fn_ptr: sub_,
    arity: Arity::at_least(1),
};

fn sub_(args: &[Value]) -> evaluator::Result {
    match args {
        [x] => match Number::of(x)? {
            Number::Int(i) => Ok(Value::Integer(i.wrapping_neg())),
            Number::Float(f) => Ok(Value::Float(-f)),
        },
        _ => fold_numbers(args, Int::wrapping_sub, |x, y| x - y),
    }
}

const MUL: PrimitiveFn = PrimitiveFn {
    name: "*",
    fn_ptr: mul_,
    arity: Arity::at_least(0),
};

fn mul_(args: &[Value]) -> evaluator::Result {
    match args.is_empty() {
        true => Ok(Value::Integer(1)),
        false => fold_numbers(args, Int::wrapping_mul, |x, y| x * y),
    }
}

const DIV: PrimitiveFn = PrimitiveFn {
    name: "/",
    fn_ptr: div_,
    arity: Arity::at_least(1),
};

fn divide(x: Number, y: Number) -> evaluator::Result<Number> {
    match (x, y) {
        (Number::Int(_), Number::Int(0)) => Err(Error::DivideByZero),
        (Number::Int(x), Number::Int(y)) if x.wrapping_rem(y) == 0 => {
            Ok(Number::Int(x.wrapping_div(y)))
        }
        (x, y) => Ok(Number::Float(x.to_float() / y.to_float())),
    }
}

/// Integer division stays exact only when there is no remainder.
fn div_(args: &[Value]) -> evaluator::Result {
    let numbers = grab_numbers(args)?;
    let result = match numbers.as_slice() {
        [x] => divide(Number::Int(1), *x)?,
        [first, rest @ ..] => rest
            .iter()
            .try_fold(*first, |acc, &y| divide(acc, y))?,
        [] => return Err(TypeMismatch::NotANumber.into()),
    };
    Ok(result.into())
}

// Comparisons

fn compare(x: &Value, y: &Value) -> Result<Ordering, TypeMismatch> {
    let ordering = match (x, y) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Character(a), Value::Character(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.borrow().cmp(&b.borrow())),
        (Value::Symbol(a), Value::Symbol(b)) => Some(a.as_str().cmp(b.as_str())),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        // Mixed integers and floats compare as floats. NaN compares with nothing.
        _ => match (Number::of(x), Number::of(y)) {
            (Ok(a), Ok(b)) => a.to_float().partial_cmp(&b.to_float()),
            _ => None,
        },
    };
    ordering.ok_or(TypeMismatch::Incomparable)
}

fn comparison_(args: &[Value], accept: fn(Ordering) -> bool) -> evaluator::Result {
    let ordering = compare(&args[0], &args[1])?;
    Ok(Value::Boolean(accept(ordering)))
}

macro_rules! comparison_primitive {
    ($SYMBOL:tt, $NAME:ident) => {
        paste::item! {
            const $NAME: PrimitiveFn = PrimitiveFn {
                name: stringify!($SYMBOL),
                fn_ptr: |args: &[Value]| comparison_(args, Ordering::[<is_ $NAME:lower>]),
                arity: Arity::exactly(2),
            };
        }
    };
}

comparison_primitive!(<, LT);
comparison_primitive!(<=, LE);
comparison_primitive!(>, GT);
comparison_primitive!(>=, GE);

// Equality

const IS: PrimitiveFn = PrimitiveFn {
    name: "is?",
    fn_ptr: is_,
    arity: Arity::exactly(2),
};

const EQ: PrimitiveFn = PrimitiveFn {
    name: "eq?",
    fn_ptr: is_,
    arity: Arity::exactly(2),
};

fn is_(args: &[Value]) -> evaluator::Result {
    Ok(Value::Boolean(identical(&args[0], &args[1])))
}

const EQUAL: PrimitiveFn = PrimitiveFn {
    name: "equal?",
    fn_ptr: equal_,
    arity: Arity::exactly(2),
};

const NUMERIC_EQUAL: PrimitiveFn = PrimitiveFn {
    name: "=",
    fn_ptr: equal_,
    arity: Arity::exactly(2),
};

fn equal_(args: &[Value]) -> evaluator::Result {
    Ok(Value::Boolean(equal(&args[0], &args[1])))
}

const NOT: PrimitiveFn = PrimitiveFn {
    name: "not",
    fn_ptr: not_,
    arity: Arity::exactly(1),
};

fn not_(args: &[Value]) -> evaluator::Result {
    Ok(Value::Boolean(!args[0].is_true()))
}

// Pairs and lists

const CONS: PrimitiveFn = PrimitiveFn {
    name: "cons",
    fn_ptr: cons_,
    arity: Arity::exactly(2),
};

fn cons_(args: &[Value]) -> evaluator::Result {
    Ok(Value::cons(args[0].clone(), args[1].clone()))
}

const CAR: PrimitiveFn = PrimitiveFn {
    name: "car",
    fn_ptr: car_,
    arity: Arity::exactly(1),
};

fn car_(args: &[Value]) -> evaluator::Result {
    Ok(args[0].as_pair()?.first())
}

const CDR: PrimitiveFn = PrimitiveFn {
    name: "cdr",
    fn_ptr: cdr_,
    arity: Arity::exactly(1),
};

fn cdr_(args: &[Value]) -> evaluator::Result {
    Ok(args[0].as_pair()?.second())
}

const SET_CAR: PrimitiveFn = PrimitiveFn {
    name: "set-car!",
    fn_ptr: set_car_,
    arity: Arity::exactly(2),
};

fn set_car_(args: &[Value]) -> evaluator::Result {
    args[0].as_pair()?.set_first(args[1].clone());
    Ok(Value::Void)
}

const SET_CDR: PrimitiveFn = PrimitiveFn {
    name: "set-cdr!",
    fn_ptr: set_cdr_,
    arity: Arity::exactly(2),
};

fn set_cdr_(args: &[Value]) -> evaluator::Result {
    args[0].as_pair()?.set_second(args[1].clone());
    Ok(Value::Void)
}

const LIST: PrimitiveFn = PrimitiveFn {
    name: "list",
    fn_ptr: list_,
    arity: Arity::at_least(0),
};

fn list_(args: &[Value]) -> evaluator::Result {
    Ok(Value::list(args.to_vec()))
}

const NULL_TEST: PrimitiveFn = PrimitiveFn {
    name: "null?",
    fn_ptr: null_test_,
    arity: Arity::exactly(1),
};

fn null_test_(args: &[Value]) -> evaluator::Result {
    Ok(Value::Boolean(args[0].is_nil()))
}

const PAIR_TEST: PrimitiveFn = PrimitiveFn {
    name: "pair?",
    fn_ptr: pair_test_,
    arity: Arity::exactly(1),
};

fn pair_test_(args: &[Value]) -> evaluator::Result {
    Ok(Value::Boolean(matches!(args[0], Value::Pair(_))))
}

// Sequences: lists and strings

const FIRST: PrimitiveFn = PrimitiveFn {
    name: "first",
    fn_ptr: first_,
    arity: Arity::exactly(1),
};

fn first_(args: &[Value]) -> evaluator::Result {
    match &args[0] {
        Value::String(s) => s
            .borrow()
            .chars()
            .next()
            .map(Value::Character)
            .ok_or(Error::BadIndex(0, 0)),
        obj => Ok(obj.as_pair()?.first()),
    }
}

const REST: PrimitiveFn = PrimitiveFn {
    name: "rest",
    fn_ptr: rest_,
    arity: Arity::exactly(1),
};

fn rest_(args: &[Value]) -> evaluator::Result {
    match &args[0] {
        Value::String(s) => {
            let s = s.borrow();
            let mut chars = s.chars();
            match chars.next() {
                Some(_) => Ok(Value::string(chars.as_str())),
                None => Err(Error::BadIndex(1, 0)),
            }
        }
        obj => Ok(obj.as_pair()?.second()),
    }
}

const EMPTY_TEST: PrimitiveFn = PrimitiveFn {
    name: "empty?",
    fn_ptr: empty_test_,
    arity: Arity::exactly(1),
};

fn empty_test_(args: &[Value]) -> evaluator::Result {
    let empty = match &args[0] {
        Value::Nil => true,
        Value::String(s) => s.borrow().is_empty(),
        _ => false,
    };
    Ok(Value::Boolean(empty))
}

const LENGTH: PrimitiveFn = PrimitiveFn {
    name: "length",
    fn_ptr: length_,
    arity: Arity::exactly(1),
};

fn length_(args: &[Value]) -> evaluator::Result {
    let len = match &args[0] {
        Value::String(s) => s.borrow().chars().count(),
        obj => obj.iter_list().try_fold(0, |n, item| item.map(|_| n + 1))?,
    };
    Ok(Value::Integer(len as Int))
}

const INDEX: PrimitiveFn = PrimitiveFn {
    name: "index",
    fn_ptr: index_,
    arity: Arity::Between(2..=3),
};

/// `(index seq i)` is one element; `(index seq start end)` the elements in between. Negative
/// positions count from the end, and an end of -1 means "up to the end". A start after the end
/// gives the slice reversed.
fn index_(args: &[Value]) -> evaluator::Result {
    let (elements, is_string): (Vec<Value>, bool) = match &args[0] {
        Value::String(s) => (s.borrow().chars().map(Value::Character).collect(), true),
        obj => (obj.to_vec()?, false),
    };
    let len = elements.len();
    let len_int = Int::try_from(len).unwrap_or(Int::MAX);
    let normalize = |i: Int, bias: Int| -> evaluator::Result<usize> {
        let position = if i < 0 { len_int + i + bias } else { i };
        match usize::try_from(position) {
            Ok(p) if p <= len => Ok(p),
            _ => Err(Error::BadIndex(i, len)),
        }
    };

    let start = args[1].as_int()?;
    let first = normalize(start, 0)?;
    let end = match args.get(2) {
        None => {
            return elements
                .get(first)
                .cloned()
                .ok_or(Error::BadIndex(start, len))
        }
        Some(end) => normalize(end.as_int()?, 1)?,
    };

    let slice: Vec<Value> = match first <= end {
        true => elements[first..end].to_vec(),
        false => elements[end..first].iter().rev().cloned().collect(),
    };
    match is_string {
        true => Ok(Value::string(
            slice
                .iter()
                .filter_map(|c| c.as_char().ok())
                .collect::<String>(),
        )),
        false => Ok(Value::list(slice)),
    }
}

// Types

const TYPE: PrimitiveFn = PrimitiveFn {
    name: "type",
    fn_ptr: type_,
    arity: Arity::exactly(1),
};

fn type_names(obj: &Value) -> &'static [&'static str] {
    match obj {
        Value::Nil => &["'()"],
        Value::Boolean(_) => &["boolean"],
        Value::Void => &["void"],
        Value::Character(_) => &["character"],
        Value::Symbol(_) => &["symbol"],
        Value::Integer(_) => &["number", "integer"],
        Value::Float(_) => &["number", "float"],
        Value::Primitive(_) => &["procedure", "primitive"],
        Value::Closure(_) => &["procedure", "compound"],
        Value::Macro(_) => &["macro"],
        Value::String(_) => &["sequence", "string"],
        Value::Pair(_) => &["sequence", "pair"],
    }
}

/// A list of strings, most general first: `(type 1)` is `("number" "integer")`.
fn type_(args: &[Value]) -> evaluator::Result {
    let names = type_names(&args[0]).iter().map(|&n| Value::string(n));
    Ok(Value::list(names.collect()))
}

const TYPE_TEST: PrimitiveFn = PrimitiveFn {
    name: "type?",
    fn_ptr: type_test_,
    arity: Arity::exactly(2),
};

fn type_test_(args: &[Value]) -> evaluator::Result {
    Ok(Value::Boolean(
        type_names(&args[0]) == type_names(&args[1]),
    ))
}

const SYMBOL_TEST: PrimitiveFn = PrimitiveFn {
    name: "symbol?",
    fn_ptr: symbol_test_,
    arity: Arity::exactly(1),
};

fn symbol_test_(args: &[Value]) -> evaluator::Result {
    Ok(Value::Boolean(matches!(args[0], Value::Symbol(_))))
}

const STRING_TEST: PrimitiveFn = PrimitiveFn {
    name: "string?",
    fn_ptr: string_test_,
    arity: Arity::exactly(1),
};

fn string_test_(args: &[Value]) -> evaluator::Result {
    Ok(Value::Boolean(matches!(args[0], Value::String(_))))
}

const NUMBER_TEST: PrimitiveFn = PrimitiveFn {
    name: "number?",
    fn_ptr: number_test_,
    arity: Arity::exactly(1),
};

fn number_test_(args: &[Value]) -> evaluator::Result {
    Ok(Value::Boolean(Number::of(&args[0]).is_ok()))
}

const PROCEDURE_TEST: PrimitiveFn = PrimitiveFn {
    name: "procedure?",
    fn_ptr: procedure_test_,
    arity: Arity::exactly(1),
};

fn procedure_test_(args: &[Value]) -> evaluator::Result {
    Ok(Value::Boolean(args[0].is_procedure()))
}

const BOOLEAN_TEST: PrimitiveFn = PrimitiveFn {
    name: "boolean?",
    fn_ptr: boolean_test_,
    arity: Arity::exactly(1),
};

fn boolean_test_(args: &[Value]) -> evaluator::Result {
    Ok(Value::Boolean(matches!(args[0], Value::Boolean(_))))
}

// Conversions

const TO_STRING: PrimitiveFn = PrimitiveFn {
    name: "->string",
    fn_ptr: to_string_,
    arity: Arity::exactly(1),
};

fn to_string_(args: &[Value]) -> evaluator::Result {
    let text = match &args[0] {
        Value::Integer(i) => i.to_string(),
        Value::Float(x) => format!("{:.6}", x),
        Value::Character(c) => c.to_string(),
        Value::Symbol(s) => s.as_str().to_string(),
        Value::String(s) => s.borrow().clone(),
        obj => obj
            .iter_list()
            .map(|c| c.and_then(|c| c.as_char()))
            .collect::<Result<String, TypeMismatch>>()?,
    };
    Ok(Value::string(text))
}

const TO_NUMBER: PrimitiveFn = PrimitiveFn {
    name: "->number",
    fn_ptr: to_number_,
    arity: Arity::exactly(1),
};

fn to_number_(args: &[Value]) -> evaluator::Result {
    match &args[0] {
        Value::String(s) => Ok(reader::parse_number(s.borrow().trim())?),
        Value::Character(c) => Ok(Value::Integer(*c as Int)),
        obj @ Value::Integer(_) | obj @ Value::Float(_) => Ok(obj.clone()),
        _ => Err(TypeMismatch::NotAString.into()),
    }
}

const TO_CHAR: PrimitiveFn = PrimitiveFn {
    name: "->char",
    fn_ptr: to_char_,
    arity: Arity::exactly(1),
};

/// An integer becomes the character with that code; a string becomes a list of its characters.
fn to_char_(args: &[Value]) -> evaluator::Result {
    match &args[0] {
        Value::Integer(i) => u32::try_from(*i)
            .ok()
            .and_then(std::char::from_u32)
            .map(Value::Character)
            .ok_or_else(|| TypeMismatch::NotACharacter.into()),
        Value::String(s) => Ok(Value::list(
            s.borrow().chars().map(Value::Character).collect(),
        )),
        _ => Err(TypeMismatch::NotAString.into()),
    }
}

const STRING_TO_SYMBOL: PrimitiveFn = PrimitiveFn {
    name: "string->symbol",
    fn_ptr: string_to_symbol_,
    arity: Arity::exactly(1),
};

fn string_to_symbol_(args: &[Value]) -> evaluator::Result {
    Ok(Value::symbol(&args[0].as_string()?))
}

// Output

fn print_internal(args: &[Value], mode: printer::PrintMode, end: &str) -> evaluator::Result {
    let text = args.iter().map(|arg| printer::pr_str(arg, mode)).join("");
    let mut stdout = io::stdout();
    write!(stdout, "{}{}", text, end)?;
    stdout.flush()?;
    Ok(Value::Void)
}

const PRINT: PrimitiveFn = PrimitiveFn {
    name: "print",
    fn_ptr: |args| print_internal(args, printer::PrintMode::Directly, "\n"),
    arity: Arity::at_least(0),
};

const DISPLAY: PrimitiveFn = PrimitiveFn {
    name: "display",
    fn_ptr: |args| print_internal(args, printer::PrintMode::Directly, ""),
    arity: Arity::at_least(0),
};

const WRITE: PrimitiveFn = PrimitiveFn {
    name: "write",
    fn_ptr: |args| print_internal(args, printer::PrintMode::ReadableRepresentation, ""),
    arity: Arity::exactly(1),
};

const NEWLINE: PrimitiveFn = PrimitiveFn {
    name: "newline",
    fn_ptr: |_| print_internal(&[], printer::PrintMode::Directly, "\n"),
    arity: Arity::exactly(0),
};

// Procedures

const APPLY: PrimitiveFn = PrimitiveFn {
    name: "apply",
    fn_ptr: apply_,
    arity: Arity::at_least(2),
};

/// `(apply f a b '(c d))` calls `(f a b c d)`.
fn apply_(args: &[Value]) -> evaluator::Result {
    let (callable, rest) = (&args[0], &args[1..]);
    let (last, middle) = match rest.split_last() {
        Some(parts) => parts,
        None => return Err(TypeMismatch::NotAList.into()),
    };
    let mut arguments = middle.to_vec();
    arguments.extend(last.to_vec()?);
    apply_fully(callable, arguments)
}

const MAP: PrimitiveFn = PrimitiveFn {
    name: "map",
    fn_ptr: map_,
    arity: Arity::exactly(2),
};

fn map_(args: &[Value]) -> evaluator::Result {
    let callable = &args[0];
    let mapped: evaluator::Result<Vec<Value>> = args[1]
        .to_vec()?
        .into_iter()
        .map(|item| apply_fully(callable, vec![item]))
        .collect();
    Ok(Value::list(mapped?))
}

const DOC: PrimitiveFn = PrimitiveFn {
    name: "doc",
    fn_ptr: doc_,
    arity: Arity::exactly(1),
};

fn doc_(args: &[Value]) -> evaluator::Result {
    Ok(args[0].as_closure()?.docstring.clone())
}

// System

const TIME: PrimitiveFn = PrimitiveFn {
    name: "time",
    fn_ptr: time_,
    arity: Arity::exactly(0),
};

/// Whole seconds since the Unix epoch.
fn time_(_args: &[Value]) -> evaluator::Result {
    let seconds = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Ok(Value::Integer(Int::try_from(seconds).unwrap_or(Int::MAX)))
}

pub(crate) static CORE: &[PrimitiveFn] = &[
    // Arithmetic
    SUM,
    SUB,
    MUL,
    DIV,
    // Comparisons
    LT,
    LE,
    GT,
    GE,
    // Equality
    IS,
    EQ,
    EQUAL,
    NUMERIC_EQUAL,
    NOT,
    // Pairs and lists
    CONS,
    CAR,
    CDR,
    SET_CAR,
    SET_CDR,
    LIST,
    NULL_TEST,
    PAIR_TEST,
    // Sequences
    FIRST,
    REST,
    EMPTY_TEST,
    LENGTH,
    INDEX,
    // Types
    TYPE,
    TYPE_TEST,
    SYMBOL_TEST,
    STRING_TEST,
    NUMBER_TEST,
    PROCEDURE_TEST,
    BOOLEAN_TEST,
    // Conversions
    TO_STRING,
    TO_NUMBER,
    TO_CHAR,
    STRING_TO_SYMBOL,
    // Output
    PRINT,
    DISPLAY,
    WRITE,
    NEWLINE,
    // Procedures
    APPLY,
    MAP,
    DOC,
    // System
    TIME,
];

/// Binds the constants and every primitive in `env`, which should be the global environment.
pub(crate) fn install(env: &Rc<Environment>) {
    env.define(Symbol::intern("True"), Value::Boolean(true));
    env.define(Symbol::intern("False"), Value::Boolean(false));
    env.define(Symbol::intern("void"), Value::Void);

    for func in CORE {
        env.define(
            Symbol::intern(func.name),
            Value::primitive(func.name, func.arity.clone(), func.fn_ptr),
        );
    }

    // These two need the global environment itself. Hold it weakly so it can still be dropped.
    let global = Rc::downgrade(env);
    env.define(
        Symbol::intern("eval"),
        Value::primitive("eval", Arity::exactly(1), move |args| {
            let env = global.upgrade().expect("eval: global environment destroyed");
            log::info!("Call from lispy to EVAL with {}", args[0]);
            EVAL(&args[0], &env)
        }),
    );
    let global = Rc::downgrade(env);
    env.define(
        Symbol::intern("load"),
        Value::primitive("load", Arity::exactly(1), move |args| {
            let env = global.upgrade().expect("load: global environment destroyed");
            let path = args[0].as_string()?.clone();
            interpreter::load_file(&path, &env)
        }),
    );
    log::debug!("global environment ready: {}", env);
}

#[cfg(test)]
mod tests {
    use super::*;
    use Value::{Boolean, Character, Float, Integer};

    fn list(source: &str) -> Value {
        reader::read_str(source).unwrap()
    }

    #[test]
    fn arithmetic_promotes_to_float() {
        assert_eq!(sum_(&[Integer(1), Integer(2)]).unwrap(), Integer(3));
        assert_eq!(sum_(&[Integer(1), Float(0.5)]).unwrap(), Float(1.5));
        assert_eq!(sum_(&[]).unwrap(), Integer(0));
        assert_eq!(sub_(&[Integer(5)]).unwrap(), Integer(-5));
        assert_eq!(sub_(&[Integer(5), Integer(3), Integer(1)]).unwrap(), Integer(1));
        assert_eq!(mul_(&[Integer(4), Float(0.5)]).unwrap(), Float(2.0));
        assert!(matches!(
            sum_(&[Integer(1), Value::symbol("a")]),
            Err(Error::TypeMismatch(TypeMismatch::NotANumber))
        ));
    }

    #[test]
    fn plus_joins_strings_and_characters() {
        assert_eq!(
            sum_(&[Value::string("ab"), Value::string("cd")]).unwrap(),
            Value::string("abcd")
        );
        assert_eq!(
            sum_(&[Character('x'), Character('y')]).unwrap(),
            Value::string("xy")
        );
        assert!(sum_(&[Value::string("a"), Integer(1)]).is_err());
    }

    #[test]
    fn division_is_exact_only_without_remainder() {
        assert_eq!(div_(&[Integer(6), Integer(3)]).unwrap(), Integer(2));
        assert_eq!(div_(&[Integer(7), Integer(2)]).unwrap(), Float(3.5));
        assert_eq!(div_(&[Float(1.0), Integer(4)]).unwrap(), Float(0.25));
        assert!(matches!(
            div_(&[Integer(1), Integer(0)]),
            Err(Error::DivideByZero)
        ));
    }

    #[test]
    fn comparisons_work_across_comparable_types() {
        assert_eq!((LT.fn_ptr)(&[Integer(1), Integer(2)]).unwrap(), Boolean(true));
        assert_eq!((GE.fn_ptr)(&[Float(2.0), Integer(2)]).unwrap(), Boolean(true));
        assert_eq!(
            (GT.fn_ptr)(&[Value::string("b"), Value::string("a")]).unwrap(),
            Boolean(true)
        );
        assert_eq!((LE.fn_ptr)(&[Character('a'), Character('a')]).unwrap(), Boolean(true));
        assert_eq!((LT.fn_ptr)(&[Boolean(false), Boolean(true)]).unwrap(), Boolean(true));
        assert!(matches!(
            (LT.fn_ptr)(&[Integer(1), Value::string("a")]),
            Err(Error::TypeMismatch(TypeMismatch::Incomparable))
        ));
    }

    #[test]
    fn is_and_equal_differ_on_strings() {
        let a = Value::string("s");
        assert_eq!(is_(&[a.clone(), a.clone()]).unwrap(), Boolean(true));
        assert_eq!(is_(&[a.clone(), Value::string("s")]).unwrap(), Boolean(false));
        assert_eq!(equal_(&[a, Value::string("s")]).unwrap(), Boolean(true));
    }

    #[test]
    fn sequences_include_strings() {
        assert_eq!(length_(&[list("(1 2 3)")]).unwrap(), Integer(3));
        assert_eq!(length_(&[Value::string("héllo")]).unwrap(), Integer(5));
        assert_eq!(first_(&[Value::string("abc")]).unwrap(), Character('a'));
        assert_eq!(rest_(&[Value::string("abc")]).unwrap(), Value::string("bc"));
        assert_eq!(empty_test_(&[Value::string("")]).unwrap(), Boolean(true));
        assert_eq!(empty_test_(&[Value::Nil]).unwrap(), Boolean(true));
        assert_eq!(empty_test_(&[list("(1)")]).unwrap(), Boolean(false));
    }

    #[test]
    fn index_takes_elements_and_slices() {
        let items = list("(a b c d)");
        assert_eq!(index_(&[items.clone(), Integer(1)]).unwrap(), Value::symbol("b"));
        assert_eq!(index_(&[items.clone(), Integer(-1)]).unwrap(), Value::symbol("d"));
        assert_eq!(
            index_(&[items.clone(), Integer(1), Integer(3)]).unwrap(),
            list("(b c)")
        );
        assert_eq!(
            index_(&[items.clone(), Integer(0), Integer(-1)]).unwrap(),
            items
        );
        assert_eq!(
            index_(&[items.clone(), Integer(3), Integer(1)]).unwrap(),
            list("(c b)")
        );
        assert!(matches!(
            index_(&[items.clone(), Integer(4)]),
            Err(Error::BadIndex(4, 4))
        ));
        assert_eq!(
            index_(&[Value::string("hello"), Integer(1), Integer(3)]).unwrap(),
            Value::string("el")
        );
    }

    #[test]
    fn type_lists_general_to_specific() {
        assert_eq!(type_(&[Integer(1)]).unwrap(), list("(\"number\" \"integer\")"));
        assert_eq!(type_(&[Value::Nil]).unwrap(), list("(\"'()\")"));
        assert_eq!(type_test_(&[Integer(1), Integer(7)]).unwrap(), Boolean(true));
        assert_eq!(type_test_(&[Integer(1), Float(7.0)]).unwrap(), Boolean(false));
    }

    #[test]
    fn conversions() {
        assert_eq!(to_string_(&[Integer(42)]).unwrap(), Value::string("42"));
        assert_eq!(to_string_(&[Float(1.5)]).unwrap(), Value::string("1.500000"));
        assert_eq!(to_string_(&[Value::symbol("abc")]).unwrap(), Value::string("abc"));
        assert_eq!(to_string_(&[list(r"(#\h #\i)")]).unwrap(), Value::string("hi"));
        assert_eq!(to_number_(&[Value::string("12")]).unwrap(), Integer(12));
        assert_eq!(to_number_(&[Value::string("1.5")]).unwrap(), Float(1.5));
        assert_eq!(to_number_(&[Character('A')]).unwrap(), Integer(65));
        assert!(matches!(
            to_number_(&[Value::string("1/2")]),
            Err(Error::Read(reader::Error::RationalsNotImplemented(_)))
        ));
        assert_eq!(to_char_(&[Integer(97)]).unwrap(), Character('a'));
        assert_eq!(to_char_(&[Value::string("ab")]).unwrap(), list(r"(#\a #\b)"));
    }

    #[test]
    fn pairs_are_mutable() {
        let pair = cons_(&[Integer(1), Integer(2)]).unwrap();
        set_car_(&[pair.clone(), Integer(9)]).unwrap();
        set_cdr_(&[pair.clone(), Value::Nil]).unwrap();
        assert_eq!(pair, list("(9)"));
        assert!(matches!(
            car_(&[Value::Nil]),
            Err(Error::TypeMismatch(TypeMismatch::NotAPair))
        ));
    }

    #[test]
    fn install_binds_constants_and_primitives() {
        let env = Environment::empty();
        install(&env);
        assert_eq!(env.lookup(&Symbol::intern("True")).unwrap(), Boolean(true));
        assert!(env.lookup(&Symbol::intern("void")).unwrap().is_void());
        for name in &["+", "index", "eval", "load", "->string", "set-car!"] {
            assert!(
                env.lookup(&Symbol::intern(name)).unwrap().is_procedure(),
                "{} should be a procedure",
                name
            );
        }
    }
}

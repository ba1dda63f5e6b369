use crate::environment::Environment;
use crate::evaluator;
use derive_more::Deref;
use std::cell::{Ref, RefCell};
use std::collections::HashSet;
use std::fmt::{self, Formatter};
use std::ops::{RangeFrom, RangeInclusive};
use std::rc::Rc;

pub type Int = i64;
pub type Float = f64;

/// The name of the parameter that collects every remaining argument into a list.
pub const REST_PARAMETER: &str = "&rest";

thread_local! {
    // One table per interpreter thread. `Rc` keeps symbols (and so whole Values) off other
    // threads, so nothing here needs a lock.
    static SYMBOLS: RefCell<HashSet<Rc<str>>> = RefCell::new(HashSet::new());
}

/// An interned identifier. Interning the same text twice hands back the same allocation, so
/// equality is a pointer comparison.
#[derive(Deref, Clone)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn intern(name: &str) -> Self {
        SYMBOLS.with(|table| {
            let mut table = table.borrow_mut();
            if let Some(existing) = table.get(name) {
                return Symbol(existing.clone());
            }
            let fresh: Rc<str> = Rc::from(name);
            table.insert(fresh.clone());
            Symbol(fresh)
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum Arity {
    Between(RangeInclusive<usize>),
    AtLeast(RangeFrom<usize>),
}

#[derive(Debug)]
pub struct BadArgCount {
    name: &'static str,
    expected: Arity,
    got: usize,
}

impl fmt::Display for BadArgCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} expects {} arguments, but received {}",
            self.name, self.expected, self.got
        )
    }
}

impl Arity {
    pub const fn exactly(n: usize) -> Self {
        Self::Between(n..=n)
    }

    pub const fn at_least(n: usize) -> Self {
        Self::AtLeast(n..)
    }

    pub fn contains(&self, n: usize) -> bool {
        match self {
            Self::Between(range) => range.contains(&n),
            Self::AtLeast(range) => range.contains(&n),
        }
    }

    pub fn validate_for(&self, n: usize, name: &'static str) -> Result<(), BadArgCount> {
        match self.contains(n) {
            true => Ok(()),
            false => Err(BadArgCount {
                name,
                expected: self.clone(),
                got: n,
            }),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Between(r) if r.start() == r.end() => write!(f, "exactly {}", r.start()),
            Arity::Between(r) => write!(f, "from {} to {}", r.start(), r.end()),
            Arity::AtLeast(r) => write!(f, "at least {}", r.start),
        }
    }
}

pub type NativeFn = dyn Fn(&[Value]) -> evaluator::Result;

/// A procedure implemented in Rust. Unlike compound procedures, primitives check their arity.
pub struct Primitive {
    pub name: &'static str,
    pub arity: Arity,
    pub func: Box<NativeFn>,
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "primitive #<{}>", self.name)
    }
}

/// A user-defined procedure. `parent` is shared with every other closure made in the same
/// scope, so a frame lives as long as its longest-lived closure or active call.
pub struct Closure {
    pub parameters: Value,
    pub body: Vec<Value>,
    pub parent: Rc<Environment>,
    pub docstring: Value,
}

impl fmt::Debug for Closure {
    // Not derived: the parent may well contain this closure.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Closure{{parameters: {:?}, body: {:?}, docstring: {:?}}}",
            self.parameters, self.body, self.docstring
        )
    }
}

#[derive(Debug)]
pub struct Macro {
    pub transformer: Value,
}

/// A mutable cons cell.
pub struct Pair {
    first: RefCell<Value>,
    second: RefCell<Value>,
}

impl Pair {
    pub fn first(&self) -> Value {
        self.first.borrow().clone()
    }

    pub fn second(&self) -> Value {
        self.second.borrow().clone()
    }

    pub fn set_first(&self, value: Value) {
        self.first.replace(value);
    }

    pub fn set_second(&self, value: Value) {
        self.second.replace(value);
    }
}

#[derive(Clone)]
pub enum Value {
    Nil,
    Boolean(bool),
    Void,
    Character(char),
    Integer(Int),
    Float(Float),
    String(Rc<RefCell<String>>),
    Symbol(Symbol),
    Pair(Rc<Pair>),
    Primitive(Rc<Primitive>),
    Closure(Rc<Closure>),
    Macro(Rc<Macro>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeMismatch {
    NotAnInteger,
    NotANumber,
    NotACharacter,
    NotAString,
    NotASymbol,
    NotAPair,
    NotAList,
    NotAProcedure,
    NotAClosure,
    Incomparable,
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use TypeMismatch::*;
        let expected = match self {
            NotAnInteger => "an integer",
            NotANumber => "a number",
            NotACharacter => "a character",
            NotAString => "a string",
            NotASymbol => "a symbol",
            NotAPair => "a pair",
            NotAList => "a proper list",
            NotAProcedure => "a procedure",
            NotAClosure => "a compound procedure",
            Incomparable => "values of the same comparable type",
        };
        write!(f, "expected {}", expected)
    }
}

impl Value {
    pub fn symbol(name: &str) -> Self {
        Value::Symbol(Symbol::intern(name))
    }

    pub fn cons(first: Value, second: Value) -> Self {
        Value::Pair(Rc::new(Pair {
            first: RefCell::new(first),
            second: RefCell::new(second),
        }))
    }

    pub fn string<S: Into<String>>(text: S) -> Self {
        Value::String(Rc::new(RefCell::new(text.into())))
    }

    pub fn boolean(b: bool) -> Self {
        Value::Boolean(b)
    }

    pub fn primitive<F>(name: &'static str, arity: Arity, func: F) -> Self
    where
        F: Fn(&[Value]) -> evaluator::Result + 'static,
    {
        Value::Primitive(Rc::new(Primitive {
            name,
            arity,
            func: Box::new(func),
        }))
    }

    pub fn closure(
        parameters: Value,
        body: Vec<Value>,
        parent: Rc<Environment>,
        docstring: Value,
    ) -> Self {
        Value::Closure(Rc::new(Closure {
            parameters,
            body,
            parent,
            docstring,
        }))
    }

    pub fn new_macro(transformer: Value) -> Self {
        Value::Macro(Rc::new(Macro { transformer }))
    }

    /// Builds a proper list, terminated by the empty list.
    pub fn list(elements: Vec<Value>) -> Self {
        elements
            .into_iter()
            .rev()
            .fold(Value::Nil, |tail, head| Value::cons(head, tail))
    }

    /// Walks a chain of pairs. Yields an error, then stops, if the chain does not end in the
    /// empty list.
    pub fn iter_list(&self) -> ListIter {
        ListIter {
            cursor: self.clone(),
        }
    }

    pub fn to_vec(&self) -> Result<Vec<Value>, TypeMismatch> {
        self.iter_list().collect()
    }

    pub fn is_self_evaluating(&self) -> bool {
        use Value::*;
        match self {
            Boolean(_) | Integer(_) | Float(_) | Character(_) | String(_) | Void => true,
            Nil | Symbol(_) | Pair(_) | Primitive(_) | Closure(_) | Macro(_) => false,
        }
    }

    /// Everything but `#f` counts as true.
    pub fn is_true(&self) -> bool {
        !matches!(self, Value::Boolean(false))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self, Value::Primitive(_) | Value::Closure(_))
    }

    pub fn is_symbol_named(&self, name: &str) -> bool {
        match self {
            Value::Symbol(s) => s.as_str() == name,
            _ => false,
        }
    }

    pub fn as_int(&self) -> Result<Int, TypeMismatch> {
        match self {
            Value::Integer(x) => Ok(*x),
            _ => Err(TypeMismatch::NotAnInteger),
        }
    }

    pub fn as_char(&self) -> Result<char, TypeMismatch> {
        match self {
            Value::Character(c) => Ok(*c),
            _ => Err(TypeMismatch::NotACharacter),
        }
    }

    pub fn as_string(&self) -> Result<Ref<String>, TypeMismatch> {
        match self {
            Value::String(s) => Ok(s.borrow()),
            _ => Err(TypeMismatch::NotAString),
        }
    }

    pub fn as_symbol(&self) -> Result<&Symbol, TypeMismatch> {
        match self {
            Value::Symbol(s) => Ok(s),
            _ => Err(TypeMismatch::NotASymbol),
        }
    }

    pub fn as_pair(&self) -> Result<&Pair, TypeMismatch> {
        match self {
            Value::Pair(p) => Ok(p),
            _ => Err(TypeMismatch::NotAPair),
        }
    }

    pub fn as_closure(&self) -> Result<&Closure, TypeMismatch> {
        match self {
            Value::Closure(c) => Ok(c),
            _ => Err(TypeMismatch::NotAClosure),
        }
    }
}

pub struct ListIter {
    cursor: Value,
}

impl Iterator for ListIter {
    type Item = Result<Value, TypeMismatch>;

    fn next(&mut self) -> Option<Self::Item> {
        match std::mem::replace(&mut self.cursor, Value::Nil) {
            Value::Nil => None,
            Value::Pair(pair) => {
                self.cursor = pair.second();
                Some(Ok(pair.first()))
            }
            _ => Some(Err(TypeMismatch::NotAList)),
        }
    }
}

/// The `eq?` relation: atoms compare by value, everything with identity compares by identity.
pub fn identical(x: &Value, y: &Value) -> bool {
    use Value::*;
    match (x, y) {
        (String(a), String(b)) => Rc::ptr_eq(a, b),
        (Pair(a), Pair(b)) => Rc::ptr_eq(a, b),
        _ => equal_atoms(x, y),
    }
}

/// The `equal?` relation: strings by content, lists element by element.
pub fn equal(x: &Value, y: &Value) -> bool {
    let mut x = x.clone();
    let mut y = y.clone();
    // Loop down the spine so long lists don't recurse.
    loop {
        match (&x, &y) {
            (Value::Pair(a), Value::Pair(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                if !equal(&a.first(), &b.first()) {
                    return false;
                }
                let (next_x, next_y) = (a.second(), b.second());
                x = next_x;
                y = next_y;
            }
            (Value::String(a), Value::String(b)) => return *a.borrow() == *b.borrow(),
            _ => return equal_atoms(&x, &y),
        }
    }
}

fn equal_atoms(x: &Value, y: &Value) -> bool {
    use Value::*;
    match (x, y) {
        (Nil, Nil) | (Void, Void) => true,
        (Boolean(a), Boolean(b)) => a == b,
        (Character(a), Character(b)) => a == b,
        (Integer(a), Integer(b)) => a == b,
        (Float(a), Float(b)) => a == b,
        (Value::Symbol(a), Value::Symbol(b)) => a == b,
        (Primitive(a), Primitive(b)) => Rc::ptr_eq(a, b),
        (Closure(a), Closure(b)) => Rc::ptr_eq(a, b),
        (Macro(a), Macro(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        equal(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_returns_the_same_symbol() {
        let a = Symbol::intern("lambda");
        let b = Symbol::intern(&String::from("lambda"));
        assert!(Rc::ptr_eq(&a.0, &b.0));
        assert_eq!(a, b);
        assert_ne!(a, Symbol::intern("lambada"));
    }

    #[test]
    fn list_builds_a_chain_of_pairs() {
        let list = Value::list(vec![Value::Integer(1), Value::Integer(2)]);
        let first = list.as_pair().unwrap();
        assert_eq!(first.first(), Value::Integer(1));
        let second = first.second();
        assert_eq!(second.as_pair().unwrap().first(), Value::Integer(2));
        assert!(second.as_pair().unwrap().second().is_nil());
    }

    #[test]
    fn improper_lists_are_not_lists() {
        let dotted = Value::cons(Value::Integer(1), Value::Integer(2));
        assert_eq!(dotted.to_vec(), Err(TypeMismatch::NotAList));
        assert_eq!(Value::Nil.to_vec(), Ok(vec![]));
    }

    #[test]
    fn pairs_are_mutable_cells() {
        let pair = Value::cons(Value::Integer(1), Value::Integer(2));
        let alias = pair.clone();
        pair.as_pair().unwrap().set_first(Value::Integer(9));
        assert_eq!(alias.as_pair().unwrap().first(), Value::Integer(9));
    }

    #[test]
    fn equal_compares_structure_but_identical_does_not() {
        let a = Value::list(vec![Value::string("x"), Value::Integer(1)]);
        let b = Value::list(vec![Value::string("x"), Value::Integer(1)]);
        assert!(equal(&a, &b));
        assert!(!identical(&a, &b));
        assert!(identical(&a, &a.clone()));
        assert!(identical(&Value::symbol("x"), &Value::symbol("x")));
        assert!(!equal(&Value::Integer(1), &Value::Float(1.0)));
    }

    #[test]
    fn only_false_is_false() {
        assert!(!Value::Boolean(false).is_true());
        assert!(Value::Nil.is_true());
        assert!(Value::Integer(0).is_true());
    }

    #[test]
    fn arity_reports_its_range() {
        assert!(Arity::exactly(2).validate_for(2, "cons").is_ok());
        let err = Arity::exactly(2).validate_for(3, "cons").unwrap_err();
        assert_eq!(
            err.to_string(),
            "cons expects exactly 2 arguments, but received 3"
        );
        assert!(Arity::at_least(1).contains(10));
    }
}

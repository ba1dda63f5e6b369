use crate::types::{Symbol, Value};
use itertools::Itertools;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Lookup,
    Assign,
}

#[derive(Debug)]
pub struct Unbound {
    pub symbol: Symbol,
    pub operation: Operation,
}

impl fmt::Display for Unbound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operation {
            Operation::Lookup => write!(f, "unbound variable: {}", self.symbol),
            Operation::Assign => write!(f, "cannot set unbound variable: {}", self.symbol),
        }
    }
}

// Parallel vectors: `values[i]` is bound to `variables[i]`.
#[derive(Default)]
struct Frame {
    variables: Vec<Symbol>,
    values: Vec<Value>,
}

impl Frame {
    fn position(&self, symbol: &Symbol) -> Option<usize> {
        self.variables.iter().position(|var| var == symbol)
    }
}

pub struct Environment {
    frame: RefCell<Frame>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// A single empty frame with nothing around it.
    pub fn empty() -> Rc<Self> {
        Rc::new(Self {
            frame: RefCell::new(Frame::default()),
            parent: None,
        })
    }

    /// Pushes a new frame in front of `base`. Callers must pass equal-length vectors.
    pub fn extend(variables: Vec<Symbol>, values: Vec<Value>, base: &Rc<Self>) -> Rc<Self> {
        debug_assert_eq!(variables.len(), values.len());
        Rc::new(Self {
            frame: RefCell::new(Frame { variables, values }),
            parent: Some(base.clone()),
        })
    }

    fn frames(&self) -> impl Iterator<Item = &Environment> {
        std::iter::successors(Some(self), |env| env.parent.as_deref())
    }

    pub fn lookup(&self, symbol: &Symbol) -> Result<Value, Unbound> {
        self.frames()
            .find_map(|env| {
                let frame = env.frame.borrow();
                frame.position(symbol).map(|i| frame.values[i].clone())
            })
            .ok_or_else(|| Unbound {
                symbol: symbol.clone(),
                operation: Operation::Lookup,
            })
    }

    /// `set!`: overwrite the innermost existing binding, wherever it lives.
    pub fn assign(&self, symbol: &Symbol, value: Value) -> Result<(), Unbound> {
        for env in self.frames() {
            let mut frame = env.frame.borrow_mut();
            if let Some(i) = frame.position(symbol) {
                frame.values[i] = value;
                return Ok(());
            }
        }
        Err(Unbound {
            symbol: symbol.clone(),
            operation: Operation::Assign,
        })
    }

    /// `define`: only ever touches the innermost frame, so it shadows rather than mutates.
    pub fn define(&self, symbol: Symbol, value: Value) {
        let mut frame = self.frame.borrow_mut();
        match frame.position(&symbol) {
            Some(i) => frame.values[i] = value,
            None => {
                frame.variables.push(symbol);
                frame.values.push(value);
            }
        }
    }

    pub fn outermost(self: &Rc<Self>) -> Rc<Self> {
        let mut env = self.clone();
        while let Some(parent) = env.parent.clone() {
            env = parent;
        }
        env
    }

    pub fn depth(&self) -> usize {
        self.frames().count()
    }
}

impl fmt::Display for Environment {
    // Only names: printing values could recurse back into this environment via a closure.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} frames, innermost: [{}]>",
            self.depth(),
            self.frame.borrow().variables.iter().join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Symbol {
        Symbol::intern(name)
    }

    #[test]
    fn lookup_searches_outwards() {
        let global = Environment::empty();
        global.define(sym("x"), Value::Integer(1));
        let inner = Environment::extend(vec![sym("y")], vec![Value::Integer(2)], &global);
        assert_eq!(inner.lookup(&sym("x")).unwrap(), Value::Integer(1));
        assert_eq!(inner.lookup(&sym("y")).unwrap(), Value::Integer(2));
        assert!(global.lookup(&sym("y")).is_err());
    }

    #[test]
    fn define_shadows_but_assign_mutates() {
        let global = Environment::empty();
        global.define(sym("x"), Value::Integer(1));
        let inner = Environment::extend(vec![], vec![], &global);

        inner.define(sym("x"), Value::Integer(2));
        assert_eq!(inner.lookup(&sym("x")).unwrap(), Value::Integer(2));
        assert_eq!(global.lookup(&sym("x")).unwrap(), Value::Integer(1));

        let deeper = Environment::extend(vec![], vec![], &inner);
        deeper.assign(&sym("x"), Value::Integer(3)).unwrap();
        assert_eq!(inner.lookup(&sym("x")).unwrap(), Value::Integer(3));
        assert_eq!(global.lookup(&sym("x")).unwrap(), Value::Integer(1));
    }

    #[test]
    fn redefining_overwrites_in_place() {
        let env = Environment::empty();
        env.define(sym("x"), Value::Integer(1));
        env.define(sym("x"), Value::Integer(2));
        assert_eq!(env.frame.borrow().variables.len(), 1);
        assert_eq!(env.lookup(&sym("x")).unwrap(), Value::Integer(2));
    }

    #[test]
    fn assigning_an_unbound_variable_fails() {
        let env = Environment::empty();
        let err = env.assign(&sym("nowhere"), Value::Nil).unwrap_err();
        assert_eq!(err.operation, Operation::Assign);
        assert_eq!(err.to_string(), "cannot set unbound variable: nowhere");
    }

    #[test]
    fn outermost_walks_to_the_root() {
        let global = Environment::empty();
        let inner = Environment::extend(vec![], vec![], &global);
        let innermost = Environment::extend(vec![], vec![], &inner);
        assert!(Rc::ptr_eq(&innermost.outermost(), &global));
        assert_eq!(innermost.depth(), 3);
    }
}

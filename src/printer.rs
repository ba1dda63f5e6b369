use crate::strings;
use crate::types::{Float, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    /// `write`: text the reader can read back.
    ReadableRepresentation,
    /// `display`: strings and characters as their raw contents.
    Directly,
}

pub fn pr_str(value: &Value, mode: PrintMode) -> String {
    match (value, mode) {
        (Value::String(s), PrintMode::Directly) => s.borrow().clone(),
        (Value::Character(c), PrintMode::Directly) => c.to_string(),
        _ => {
            let mut output = String::new();
            write_into(&mut output, value);
            output
        }
    }
}

pub fn write(value: &Value) -> String {
    pr_str(value, PrintMode::ReadableRepresentation)
}

pub fn display(value: &Value) -> String {
    pr_str(value, PrintMode::Directly)
}

fn write_into(output: &mut String, value: &Value) {
    use Value::*;
    match value {
        Nil => output.push_str("()"),
        Boolean(true) => output.push_str("#t"),
        Boolean(false) => output.push_str("#f"),
        Void => {}
        Character(c) => {
            output.push_str("#\\");
            match c {
                ' ' => output.push_str("space"),
                '\n' => output.push_str("newline"),
                c => output.push(*c),
            }
        }
        Integer(i) => output.push_str(&i.to_string()),
        Float(x) => output.push_str(&float_repr(*x)),
        String(s) => output.push_str(&strings::string_repr(&s.borrow())),
        Symbol(s) => output.push_str(s.as_str()),
        Pair(_) => write_list(output, value),
        Primitive(_) => output.push_str("#<primitive>"),
        Closure(c) => {
            output.push_str("#<procedure> ");
            write_into(output, &c.parameters);
            output.push_str(" (");
            for (i, form) in c.body.iter().enumerate() {
                if i > 0 {
                    output.push(' ');
                }
                write_into(output, form);
            }
            output.push(')');
        }
        Macro(m) => {
            output.push_str("#<macro> ");
            write_into(output, &m.transformer);
        }
    }
}

fn write_list(output: &mut String, list: &Value) {
    output.push('(');
    let mut cursor = list.clone();
    let mut first = true;
    loop {
        match cursor {
            Value::Pair(pair) => {
                if !first {
                    output.push(' ');
                }
                first = false;
                write_into(output, &pair.first());
                cursor = pair.second();
            }
            Value::Nil => break,
            tail => {
                output.push_str(" . ");
                write_into(output, &tail);
                break;
            }
        }
    }
    output.push(')');
}

// Always keep a decimal point or exponent so the reader gives back a float.
fn float_repr(x: Float) -> String {
    format!("{:?}", x)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&write(self))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&write(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_str;

    #[test]
    fn writes_atoms() {
        assert_eq!(write(&Value::Integer(-12)), "-12");
        assert_eq!(write(&Value::Float(2.0)), "2.0");
        assert_eq!(write(&Value::Float(0.25)), "0.25");
        assert_eq!(write(&Value::Boolean(true)), "#t");
        assert_eq!(write(&Value::Nil), "()");
        assert_eq!(write(&Value::Void), "");
        assert_eq!(write(&Value::Character(' ')), r"#\space");
        assert_eq!(write(&Value::Character('\n')), r"#\newline");
        assert_eq!(write(&Value::Character('x')), r"#\x");
        assert_eq!(write(&Value::string("a\"b\n")), r#""a\"b\n""#);
    }

    #[test]
    fn display_is_raw_only_at_the_top() {
        assert_eq!(display(&Value::string("a\"b")), "a\"b");
        assert_eq!(display(&Value::Character('x')), "x");
        let list = Value::list(vec![Value::string("s"), Value::Character('c')]);
        assert_eq!(display(&list), r#"("s" #\c)"#);
    }

    #[test]
    fn writes_improper_tails_with_a_dot() {
        let dotted = Value::cons(
            Value::Integer(1),
            Value::cons(Value::Integer(2), Value::Integer(3)),
        );
        assert_eq!(write(&dotted), "(1 2 . 3)");
    }

    #[test]
    fn round_trips_through_the_reader() {
        for source in &[
            "42",
            "-3.5",
            "1e100",
            "1.7976931348623157e308",
            "#t",
            "#f",
            r"#\a",
            r"#\space",
            r"#\(",
            r#""tab\\ and \"quote\"\n""#,
            "(1 (2.5 \"x\") () sym)",
        ] {
            let datum = read_str(source).unwrap();
            let again = read_str(&write(&datum)).unwrap();
            assert_eq!(datum, again, "round trip of {}", source);
        }
    }
}

use crate::strings::{self, BuildError};
use crate::tokens::{Token, Tokens};
use crate::types::{Int, Value};
use regex::Regex;
use std::fmt;

pub type Result<T = Value> = std::result::Result<T, Error>;

#[derive(Debug, PartialEq, Eq)]
pub enum Unfinished {
    List,
    String,
    Quote,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// Input ran out in the middle of a datum. The REPL uses this to ask for another line.
    UnexpectedEof(Unfinished),
    UnexpectedCloseParen,
    NoDatum,
    BadNumber(String),
    RationalsNotImplemented(String),
    VectorsNotImplemented,
    DottedPairsNotSupported,
    UnknownHashSyntax(String),
    BadCharacter(String),
    BadString(BuildError),
    InvalidToken(String),
    AllocationFailure,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnexpectedEof(Unfinished::List) => write!(f, "missing closing paren"),
            Error::UnexpectedEof(Unfinished::String) => write!(f, "non-terminated string"),
            Error::UnexpectedEof(Unfinished::Quote) => write!(f, "nothing to quote"),
            Error::UnexpectedCloseParen => write!(f, "unexpected ')'"),
            Error::NoDatum => write!(f, "no datum to read"),
            Error::BadNumber(t) => write!(f, "malformed number '{}'", t),
            Error::RationalsNotImplemented(t) => {
                write!(f, "rational numbers not implemented: '{}'", t)
            }
            Error::VectorsNotImplemented => write!(f, "vector syntax not implemented"),
            Error::DottedPairsNotSupported => write!(f, "dotted pair syntax not supported"),
            Error::UnknownHashSyntax(t) => write!(f, "unrecognized syntax '{}'", t),
            Error::BadCharacter(t) => {
                write!(f, "character literal not followed by delimiter: '#\\{}'", t)
            }
            Error::BadString(e) => write!(f, "bad string literal: {}", e),
            Error::InvalidToken(t) => write!(f, "'{}' not followed by delimiter", t),
            Error::AllocationFailure => write!(f, "out of memory"),
        }
    }
}

impl From<BuildError> for Error {
    fn from(e: BuildError) -> Self {
        match e {
            BuildError::OutOfMemory => Error::AllocationFailure,
            e => Error::BadString(e),
        }
    }
}

/// Reads one datum at a time from a piece of source text. After an error the reader carries on
/// from the token after the one that failed.
pub struct Reader<'a> {
    tokens: Tokens<'a>,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            tokens: Tokens::new(input),
        }
    }

    /// The next complete datum, or `None` at end of input.
    pub fn read(&mut self) -> Result<Option<Value>> {
        match self.tokens.next() {
            None => Ok(None),
            Some(token) => self.read_form(token).map(Some),
        }
    }

    fn read_form(&mut self, token: Token) -> Result {
        match token {
            Token::OpenParen => self.read_list(),
            Token::CloseParen => Err(Error::UnexpectedCloseParen),
            Token::Quote => {
                let quoted = match self.tokens.next() {
                    Some(next) => self.read_form(next)?,
                    None => return Err(Error::UnexpectedEof(Unfinished::Quote)),
                };
                Ok(Value::list(vec![Value::symbol("quote"), quoted]))
            }
            Token::VectorOpen => Err(Error::VectorsNotImplemented),
            Token::StringLiteral { terminated: false, .. } => {
                Err(Error::UnexpectedEof(Unfinished::String))
            }
            Token::StringLiteral { body, .. } => Ok(Value::string(strings::build_string(body)?)),
            Token::Character(text) => read_character(text),
            Token::Atom(text) => read_atom(text),
        }
    }

    fn read_list(&mut self) -> Result {
        let mut elements = Vec::new();
        loop {
            match self.tokens.next() {
                None => return Err(Error::UnexpectedEof(Unfinished::List)),
                Some(Token::CloseParen) => break,
                Some(token) => elements.push(self.read_form(token)?),
            }
        }
        Ok(Value::list(elements))
    }
}

impl Iterator for Reader<'_> {
    type Item = Result;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}

/// Reads the first datum in `input`.
pub fn read_str(input: &str) -> Result {
    Reader::new(input).read()?.ok_or(Error::NoDatum)
}

fn read_character(text: &str) -> Result {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Value::Character(c)),
        _ => match text {
            "space" => Ok(Value::Character(' ')),
            "newline" => Ok(Value::Character('\n')),
            _ => Err(Error::BadCharacter(text.into())),
        },
    }
}

fn read_atom(text: &str) -> Result {
    if looks_numeric(text) {
        return parse_number(text);
    }
    match text {
        "." => Err(Error::DottedPairsNotSupported),
        "#t" => Ok(Value::Boolean(true)),
        "#f" => Ok(Value::Boolean(false)),
        "+" | "-" => Ok(Value::symbol(text)),
        _ if text.starts_with('#') => Err(Error::UnknownHashSyntax(text.into())),
        _ if is_symbol(text) => Ok(Value::symbol(text)),
        _ => Err(Error::InvalidToken(text.into())),
    }
}

fn looks_numeric(text: &str) -> bool {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), _) if c.is_ascii_digit() => true,
        (Some('+'), Some(c)) | (Some('-'), Some(c)) => c.is_ascii_digit() || c == '.',
        (Some('.'), Some(c)) => c.is_ascii_digit(),
        _ => false,
    }
}

/// Parses an integer or float. Shared with the `->number` primitive.
pub fn parse_number(text: &str) -> Result {
    lazy_static! {
        static ref NUMBER_RE: Regex =
            Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").unwrap();
    }
    if text.contains('/') {
        return Err(Error::RationalsNotImplemented(text.into()));
    }
    if !NUMBER_RE.is_match(text) {
        return Err(Error::BadNumber(text.into()));
    }
    if text.contains(|c: char| c == '.' || c == 'e' || c == 'E') {
        match text.parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(Value::Float(x)),
            _ => Err(Error::BadNumber(text.into())),
        }
    } else {
        text.parse::<Int>()
            .map(Value::Integer)
            .map_err(|_| Error::BadNumber(text.into()))
    }
}

fn is_initial(c: char) -> bool {
    c.is_alphabetic() || "*/><=?!-&".contains(c)
}

fn is_subsequent(c: char) -> bool {
    is_initial(c) || c.is_ascii_digit() || c == '+'
}

fn is_symbol(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if is_initial(c) => chars.all(is_subsequent),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value::{Boolean, Character, Float, Integer};

    fn read(input: &str) -> Value {
        read_str(input).unwrap()
    }

    fn read_err(input: &str) -> Error {
        read_str(input).unwrap_err()
    }

    #[test]
    fn reads_numbers() {
        assert_eq!(read("42"), Integer(42));
        assert_eq!(read("-7"), Integer(-7));
        assert_eq!(read("+7"), Integer(7));
        assert_eq!(read("3.25"), Float(3.25));
        assert_eq!(read("-.5"), Float(-0.5));
        assert_eq!(read("1."), Float(1.0));
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert_eq!(read_err("12abc"), Error::BadNumber("12abc".into()));
        assert_eq!(read_err("1.2.3"), Error::BadNumber("1.2.3".into()));
        assert_eq!(
            read_err("3/4"),
            Error::RationalsNotImplemented("3/4".into())
        );
    }

    #[test]
    fn rejects_floats_too_large_to_represent() {
        assert_eq!(read_err("1e400"), Error::BadNumber("1e400".into()));
        let long = format!("1{}.0", "0".repeat(400));
        assert_eq!(read_err(&long), Error::BadNumber(long.clone()));
        assert_eq!(read("1e308"), Float(1e308));
    }

    #[test]
    fn reads_symbols() {
        for name in &["+", "-", "->string", "set-car!", "&rest", "equal?", "<=", "/", "x1"] {
            assert_eq!(read(name), Value::symbol(name), "reading {}", name);
        }
    }

    #[test]
    fn tokens_need_a_trailing_delimiter() {
        assert_eq!(read_err("abc'd"), Error::InvalidToken("abc'd".into()));
        assert_eq!(read_err("a.b"), Error::InvalidToken("a.b".into()));
        assert_eq!(read_err(r"#\ab"), Error::BadCharacter("ab".into()));
    }

    #[test]
    fn reads_booleans_and_characters() {
        assert_eq!(read("#t"), Boolean(true));
        assert_eq!(read("#f"), Boolean(false));
        assert_eq!(read(r"#\a"), Character('a'));
        assert_eq!(read(r"#\space"), Character(' '));
        assert_eq!(read(r"#\newline"), Character('\n'));
        assert_eq!(read(r"#\("), Character('('));
        assert_eq!(read_err("#true"), Error::UnknownHashSyntax("#true".into()));
        assert_eq!(read_err("#(1 2)"), Error::VectorsNotImplemented);
    }

    #[test]
    fn reads_strings() {
        assert_eq!(read(r#""a\"b\n""#), Value::string("a\"b\n"));
        assert_eq!(
            read_err(r#""no end"#),
            Error::UnexpectedEof(Unfinished::String)
        );
        assert!(matches!(read_err(r#""\q""#), Error::BadString(_)));
    }

    #[test]
    fn reads_lists_and_quotes() {
        let expected = Value::list(vec![
            Value::symbol("f"),
            Value::list(vec![Value::symbol("quote"), Value::symbol("a")]),
            Value::Nil,
        ]);
        assert_eq!(read("(f 'a ())"), expected);
        assert_eq!(read_err("(f a"), Error::UnexpectedEof(Unfinished::List));
        assert_eq!(read_err(")"), Error::UnexpectedCloseParen);
        assert_eq!(read_err("(a . b)"), Error::DottedPairsNotSupported);
    }

    #[test]
    fn reads_one_datum_per_call() {
        let mut reader = Reader::new("1 ; comment\n (2 3)\n\"four\"");
        assert_eq!(reader.read().unwrap(), Some(Integer(1)));
        assert_eq!(
            reader.read().unwrap(),
            Some(Value::list(vec![Integer(2), Integer(3)]))
        );
        assert_eq!(reader.read().unwrap(), Some(Value::string("four")));
        assert_eq!(reader.read().unwrap(), None);
        assert_eq!(reader.read().unwrap(), None);
    }

    #[test]
    fn carries_on_after_an_error() {
        let results: Vec<_> = Reader::new("1 #q 2").collect();
        assert_eq!(results.len(), 3);
        assert!(results[1].is_err());
        assert_eq!(results[2], Ok(Integer(2)));
    }
}

// Only the escapes \n, \" and \\ exist in a string literal. Implement exactly that rather than
// inheriting rust's string literal behaviour.

use bimap::BiMap;
use std::fmt;
use std::str::Chars;

lazy_static! {
    static ref ESCAPES: BiMap<char, char> = {
        let mut m = BiMap::new();
        m.insert('\\', '\\');
        m.insert('"', '"');
        m.insert('n', '\n');
        m
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum BuildError {
    UnknownEscape(char),
    UnexpectedSingleBackslash,
    OutOfMemory,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::UnknownEscape(c) => write!(f, "unknown escape sequence \\{}", c),
            BuildError::UnexpectedSingleBackslash => write!(f, "string ends with a lone backslash"),
            BuildError::OutOfMemory => write!(f, "out of memory while building string"),
        }
    }
}

struct Unescape<'a> {
    chars: Chars<'a>,
}

impl Iterator for Unescape<'_> {
    type Item = Result<char, BuildError>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = match self.chars.next()? {
            '\\' => match self.chars.next() {
                None => Err(BuildError::UnexpectedSingleBackslash),
                Some(c) => ESCAPES
                    .get_by_left(&c)
                    .copied()
                    .ok_or(BuildError::UnknownEscape(c)),
            },
            c => Ok(c),
        };
        Some(result)
    }
}

/// Turns the body of a string literal (without its quotes) into the string it denotes.
pub(crate) fn build_string(src: &str) -> Result<String, BuildError> {
    let mut output = String::new();
    output
        .try_reserve(src.len())
        .map_err(|_| BuildError::OutOfMemory)?;
    for c in (Unescape { chars: src.chars() }) {
        output.push(c?);
    }
    Ok(output)
}

/// The inverse of `build_string`, quotes included.
pub(crate) fn string_repr(src: &str) -> String {
    let mut output = String::with_capacity(src.len() + 2);
    output.push('"');
    for c in src.chars() {
        match ESCAPES.get_by_right(&c) {
            Some(&escaped) => {
                output.push('\\');
                output.push(escaped);
            }
            None => output.push(c),
        }
    }
    output.push('"');
    output
}

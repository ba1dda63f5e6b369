use regex::Regex;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Token<'a> {
    OpenParen,
    CloseParen,
    Quote,
    /// `#(`, which is reserved for vectors.
    VectorOpen,
    /// The raw body of a string literal, escapes unprocessed.
    StringLiteral { body: &'a str, terminated: bool },
    /// Everything after `#\`.
    Character(&'a str),
    /// A run of non-delimiter characters: numbers, symbols, booleans, and junk.
    Atom(&'a str),
}

/// A lazy tokenizer: each call to `next` consumes leading whitespace and comments, then exactly
/// one token. Delimiters are whitespace, end of input, `(`, `)`, `"` and `;`.
pub struct Tokens<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, offset: 0 }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        lazy_static! {
            static ref TOKEN_RE: Regex = Regex::new(
                r##"(?x)                                # ignore whitespace in this pattern & allow comments
                    ^(?:\s|;[^\n]*)*                    # whitespace and comments, ignored
                    (?:
                        (?P<paren>[()'])                # single special characters
                        |(?P<vector>\#\()               # vector syntax, unsupported
                        |"(?P<string>(?:                # string literal. its contents include:
                            \\(?s:.)                    #    escapes
                            |[^\\"]                     #    anything which isn't a backslash or a quote
                          )*)
                          (?P<close>")?                 #    possibly missing a closing quote
                        |\#\\(?P<character>(?s:.)[^\s()";]*)   # character literal
                        |(?P<atom>[^\s()";]+)           # one or more plain characters
                    )?
                "##
            )
            .unwrap();
        }
        let rest = &self.input[self.offset..];
        let caps = TOKEN_RE.captures(rest)?;
        self.offset += caps.get(0)?.end();

        if let Some(paren) = caps.name("paren") {
            return Some(match paren.as_str() {
                "(" => Token::OpenParen,
                ")" => Token::CloseParen,
                _ => Token::Quote,
            });
        }
        if caps.name("vector").is_some() {
            return Some(Token::VectorOpen);
        }
        if let Some(body) = caps.name("string") {
            return Some(Token::StringLiteral {
                body: body.as_str(),
                terminated: caps.name("close").is_some(),
            });
        }
        if let Some(character) = caps.name("character") {
            return Some(Token::Character(character.as_str()));
        }
        // Nothing but whitespace and comments left.
        caps.name("atom").map(|atom| Token::Atom(atom.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token> {
        Tokens::new(input).collect()
    }

    #[test]
    fn splits_on_delimiters() {
        use Token::*;
        assert_eq!(
            tokenize("(define x 'y) ; trailing comment\n  \"s\"42"),
            vec![
                OpenParen,
                Atom("define"),
                Atom("x"),
                Quote,
                Atom("y"),
                CloseParen,
                StringLiteral {
                    body: "s",
                    terminated: true
                },
                Atom("42"),
            ]
        );
    }

    #[test]
    fn quote_is_not_a_delimiter() {
        assert_eq!(tokenize("a'b"), vec![Token::Atom("a'b")]);
    }

    #[test]
    fn characters_may_be_delimiters() {
        use Token::*;
        assert_eq!(
            tokenize(r"#\( #\space #\a)"),
            vec![Character("("), Character("space"), Character("a"), CloseParen]
        );
    }

    #[test]
    fn strings_may_be_unterminated() {
        assert_eq!(
            tokenize(r#""abc\""#),
            vec![Token::StringLiteral {
                body: r#"abc\""#,
                terminated: false
            }]
        );
    }

    #[test]
    fn vectors_are_recognised() {
        assert_eq!(tokenize("#(1)")[0], Token::VectorOpen);
    }

    #[test]
    fn only_comments_means_no_tokens() {
        assert_eq!(tokenize("  ; nothing here\n ; or here"), vec![]);
    }
}

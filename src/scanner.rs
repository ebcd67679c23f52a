//! Lexical analysis: source text to [`Token`]s.
//!
//! The individual token grammars are small `nom` parsers; [`Scanner`] drives
//! them over the input and keeps track of line and column positions.

use std::sync::Arc;

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1, multispace1},
    combinator::{map, map_res, opt, recognize, value},
    multi::many0_count,
    sequence::preceded,
};

use crate::ast::{Token, TokenKind};
use crate::location::{Location, Position};
use crate::{Error, ParseErrorKind};

/// Operator characters allowed in symbols, besides letters, digits and `-_?:`
const OPERATOR_CHARS: &str = "+-*/%=><!&|";

pub(crate) fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-_?:".contains(c) || OPERATOR_CHARS.contains(c)
}

/// Whitespace and `;` line comments
fn trivia(input: &str) -> IResult<&str, usize> {
    many0_count(alt((
        multispace1,
        recognize(preceded(char(';'), take_while(|c: char| c != '\n'))),
    )))
    .parse(input)
}

/// `-?[0-9]+(\.[0-9]+)?`
fn number(input: &str) -> IResult<&str, TokenKind> {
    map_res(
        recognize((opt(char('-')), digit1, opt((char('.'), digit1)))),
        |lexeme: &str| lexeme.parse::<f64>().map(TokenKind::Number),
    )
    .parse(input)
}

/// A double-quoted string. Strings may span lines. Reaching the end of the
/// input before the closing quote is a `Failure`, so that the scanner can
/// report it as incomplete input rather than as a bad character.
fn string_literal(input: &str) -> IResult<&str, TokenKind> {
    let (rest, _) = char('"').parse(input)?;
    let mut text = String::new();
    let mut chars = rest.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((&rest[i + 1..], TokenKind::String(text))),
            '\\' => match chars.next() {
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, 'r')) => text.push('\r'),
                Some((_, '\\')) => text.push('\\'),
                Some((_, '"')) => text.push('"'),
                Some((_, other)) => {
                    text.push('\\');
                    text.push(other);
                }
                None => break,
            },
            c => text.push(c),
        }
    }

    Err(nom::Err::Failure(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Eof,
    )))
}

/// Identifiers and operators, plus the `true`, `false` and `nil` keywords
fn symbol(input: &str) -> IResult<&str, TokenKind> {
    map(take_while1(is_symbol_char), |word: &str| match word {
        "true" => TokenKind::Bool(true),
        "false" => TokenKind::Bool(false),
        "nil" => TokenKind::Nil,
        _ => TokenKind::Symbol(word.to_owned()),
    })
    .parse(input)
}

fn token(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::LeftParen, char('(')),
        value(TokenKind::RightParen, char(')')),
        string_literal,
        number,
        symbol,
    ))
    .parse(input)
}

/// Converts a source file into tokens, ending with an `Eof` token.
pub struct Scanner<'a> {
    source: &'a str,
    file: Arc<str>,
    cursor: Position,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str, file: impl Into<Arc<str>>) -> Self {
        Scanner {
            source,
            file: file.into(),
            cursor: Position::start(),
        }
    }

    fn remaining(&self) -> &'a str {
        &self.source[self.cursor.offset..]
    }

    /// Move the cursor over `consumed`, which must be a prefix of the remaining input
    fn advance(&mut self, consumed: &str) {
        for c in consumed.chars() {
            if c == '\n' {
                self.cursor.line += 1;
                self.cursor.column = 1;
            } else {
                self.cursor.column += 1;
            }
        }
        self.cursor.offset += consumed.len();
    }

    fn location(&self, start: Position) -> Location {
        Location::new(self.file.clone(), start, self.cursor)
    }

    pub fn scan(mut self) -> Result<Vec<Token>, Error> {
        let mut tokens = Vec::new();

        loop {
            let input = self.remaining();
            if let Ok((rest, _)) = trivia(input) {
                self.advance(&input[..input.len() - rest.len()]);
            }

            let input = self.remaining();
            let start = self.cursor;
            if input.is_empty() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    lexeme: String::new(),
                    location: self.location(start),
                });
                return Ok(tokens);
            }

            match token(input) {
                Ok((rest, kind)) => {
                    let lexeme = &input[..input.len() - rest.len()];
                    self.advance(lexeme);
                    tokens.push(Token {
                        kind,
                        lexeme: lexeme.to_owned(),
                        location: self.location(start),
                    });
                }
                Err(nom::Err::Failure(_)) => {
                    self.advance(input);
                    return Err(Error::parse(
                        ParseErrorKind::Incomplete,
                        "unterminated string",
                        &self.location(start),
                    ));
                }
                Err(_) => {
                    let unexpected = input.chars().next().unwrap_or_default();
                    return Err(Error::parse(
                        ParseErrorKind::InvalidSyntax,
                        format!("unexpected character `{unexpected}`"),
                        &self.location(start),
                    ));
                }
            }
        }
    }
}

/// Tokenize `source`, attributing locations to `file`
pub fn scan(source: &str, file: impl Into<Arc<str>>) -> Result<Vec<Token>, Error> {
    Scanner::new(source, file).scan()
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        scan(source, "test.tatu")
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn symbol(name: &str) -> TokenKind {
        TokenKind::Symbol(name.to_owned())
    }

    #[test]
    fn test_token_kinds_data_driven() {
        use TokenKind::*;

        let test_cases = vec![
            ("", vec![Eof]),
            ("  ; only a comment\n", vec![Eof]),
            ("42", vec![Number(42.0), Eof]),
            ("-3.25", vec![Number(-3.25), Eof]),
            ("- 3", vec![symbol("-"), Number(3.0), Eof]),
            ("1.", vec![]), // `.` is not a valid character
            ("12abc", vec![Number(12.0), symbol("abc"), Eof]),
            ("true false nil", vec![Bool(true), Bool(false), Nil, Eof]),
            ("nil?", vec![symbol("nil?"), Eof]),
            (
                "(vec:push v 1)",
                vec![LeftParen, symbol("vec:push"), symbol("v"), Number(1.0), RightParen, Eof],
            ),
            (
                "(% <= >= != && ||)",
                vec![
                    LeftParen,
                    symbol("%"),
                    symbol("<="),
                    symbol(">="),
                    symbol("!="),
                    symbol("&&"),
                    symbol("||"),
                    RightParen,
                    Eof,
                ],
            ),
            (r#""a\nb\t\"c\"\\""#, vec![String("a\nb\t\"c\"\\".into()), Eof]),
            (r#""keep \d""#, vec![String("keep \\d".into()), Eof]),
            ("\"multi\nline\"", vec![String("multi\nline".into()), Eof]),
            ("\"ñandú\"", vec![String("ñandú".into()), Eof]),
            ("x ; trailing\ny", vec![symbol("x"), symbol("y"), Eof]),
        ];

        for (i, (source, expected)) in test_cases.into_iter().enumerate() {
            let result = scan(source, "test.tatu");
            if expected.is_empty() {
                assert!(result.is_err(), "Test case #{}: expected error for {source:?}", i + 1);
            } else {
                let actual: Vec<_> = result.unwrap().into_iter().map(|t| t.kind).collect();
                assert_eq!(actual, expected, "Test case #{}: {source:?}", i + 1);
            }
        }
    }

    #[test]
    fn test_locations() {
        let tokens = scan("(var x\n  \"ñ\")", "main.tatu").unwrap();
        let positions: Vec<_> = tokens
            .iter()
            .map(|t| (t.lexeme.as_str(), t.location.start.line, t.location.start.column))
            .collect();
        assert_eq!(
            positions,
            vec![
                ("(", 1, 1),
                ("var", 1, 2),
                ("x", 1, 6),
                ("\"ñ\"", 2, 3),
                (")", 2, 6),
                ("", 2, 7),
            ]
        );
        assert_eq!(&*tokens[0].location.file, "main.tatu");
        assert_eq!(tokens[3].location.start.offset, 9);
        assert_eq!(tokens[3].location.end.offset, 13);
    }

    #[test]
    fn test_scan_errors() {
        let error = scan("(print \"oops)", "main.tatu").unwrap_err();
        assert_eq!(error.parse_kind(), Some(ParseErrorKind::Incomplete));
        assert_eq!(error.to_string(), "[Line 1][Column 8] Error: unterminated string");

        let error = scan("(+ 1\n  #t)", "main.tatu").unwrap_err();
        assert_eq!(error.parse_kind(), Some(ParseErrorKind::InvalidSyntax));
        assert_eq!(error.to_string(), "[Line 2][Column 3] Error: unexpected character `#`");
    }

    #[test]
    fn test_keywords_are_not_symbols() {
        assert_eq!(kinds("truest"), vec![symbol("truest"), TokenKind::Eof]);
        assert_eq!(kinds("nil"), vec![TokenKind::Nil, TokenKind::Eof]);
    }
}

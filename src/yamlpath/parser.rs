//! Path expression parser.

use std::str::FromStr;

use super::ast::{Path, Step};
use super::error::YamlPathError;

/// Parser for textual path expressions such as `$.spec.ports[0].name`.
pub struct Parser {
    input: Vec<char>,
    position: usize,
}

impl Parser {
    /// Creates a new parser for the given expression.
    pub fn new(expr: &str) -> Self {
        Self {
            input: expr.chars().collect(),
            position: 0,
        }
    }

    /// Parses the expression into a Path.
    pub fn parse(expr: &str) -> Result<Path, YamlPathError> {
        let mut parser = Parser::new(expr);
        parser.parse_path()
    }

    fn parse_path(&mut self) -> Result<Path, YamlPathError> {
        let mut steps = Vec::new();

        self.skip_whitespace();
        if self.is_eof() {
            return Err(YamlPathError::UnexpectedEnd {
                expected: "'$' or a key".to_string(),
            });
        }

        let rooted = self.peek() == Some('$');
        if rooted {
            self.next();
        }

        loop {
            self.skip_whitespace();
            let pos = self.position;
            match self.peek() {
                None => break,
                Some('.') => {
                    self.next();
                    self.skip_whitespace();
                    if self.peek() == Some('[') {
                        steps.push(self.parse_bracket_expression()?);
                    } else {
                        steps.push(Step::Key(self.parse_identifier()?));
                    }
                }
                Some('[') => steps.push(self.parse_bracket_expression()?),
                Some(_) if steps.is_empty() && !rooted => {
                    steps.push(Step::Key(self.parse_identifier()?));
                }
                Some(ch) => {
                    return Err(YamlPathError::UnexpectedToken {
                        position: pos,
                        found: ch.to_string(),
                        expected: "'.' or '['".to_string(),
                    })
                }
            }
        }

        Ok(Path::from(steps))
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Returns the next character and advances position.
    fn next(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Expects a specific character and advances, or returns an error.
    fn expect(&mut self, expected: char) -> Result<(), YamlPathError> {
        self.skip_whitespace();
        let pos = self.position;
        match self.next() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(YamlPathError::UnexpectedToken {
                position: pos,
                found: ch.to_string(),
                expected: format!("'{}'", expected),
            }),
            None => Err(YamlPathError::UnexpectedEnd {
                expected: format!("'{}'", expected),
            }),
        }
    }

    /// Parses a bare key. Dots, brackets and whitespace end it.
    fn parse_identifier(&mut self) -> Result<String, YamlPathError> {
        let start = self.position;
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if matches!(ch, '.' | '[' | ']') || ch.is_whitespace() {
                break;
            }
            name.push(ch);
            self.next();
        }
        if !name.is_empty() {
            return Ok(name);
        }
        match self.peek() {
            Some(ch) => Err(YamlPathError::UnexpectedToken {
                position: start,
                found: ch.to_string(),
                expected: "a key".to_string(),
            }),
            None => Err(YamlPathError::UnexpectedEnd {
                expected: "a key".to_string(),
            }),
        }
    }

    /// Parses bracket expression: [index], ['key'] or ["key"]
    fn parse_bracket_expression(&mut self) -> Result<Step, YamlPathError> {
        self.expect('[')?;
        self.skip_whitespace();

        let step = match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                self.next();
                Step::Key(self.parse_quoted(quote)?)
            }
            Some('-' | '0'..='9') => Step::Index(self.parse_bracket_number()?),
            Some(ch) => {
                return Err(YamlPathError::UnexpectedToken {
                    position: self.position,
                    found: ch.to_string(),
                    expected: "an index or a quoted key".to_string(),
                })
            }
            None => {
                return Err(YamlPathError::UnexpectedEnd {
                    expected: "an index or a quoted key".to_string(),
                })
            }
        };

        self.expect(']')?;
        Ok(step)
    }

    /// Parses the rest of a quoted key, after the opening quote.
    fn parse_quoted(&mut self, quote: char) -> Result<String, YamlPathError> {
        let mut value = String::new();
        loop {
            match self.next() {
                Some(ch) if ch == quote => return Ok(value),
                Some('\\') => match self.next() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(ch @ ('\\' | '\'' | '"')) => value.push(ch),
                    Some(ch) => {
                        return Err(YamlPathError::InvalidSyntax {
                            message: format!("invalid escape sequence '\\{}'", ch),
                        })
                    }
                    None => {
                        return Err(YamlPathError::UnexpectedEnd {
                            expected: "an escaped character".to_string(),
                        })
                    }
                },
                Some(ch) => value.push(ch),
                None => {
                    return Err(YamlPathError::UnexpectedEnd {
                        expected: format!("closing quote {}", quote),
                    })
                }
            }
        }
    }

    /// Parses a number inside brackets. Negative numbers parse here and are
    /// rejected later by path validation.
    fn parse_bracket_number(&mut self) -> Result<isize, YamlPathError> {
        let mut num = String::new();
        if self.peek() == Some('-') {
            num.push('-');
            self.next();
        }
        while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
            num.push(ch);
            self.next();
        }
        num.parse::<isize>()
            .map_err(|_| YamlPathError::InvalidSyntax {
                message: format!("invalid index: {}", num),
            })
    }
}

impl FromStr for Path {
    type Err = YamlPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parser::parse(s)
    }
}

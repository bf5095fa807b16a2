//! Structured literal parser for annotation values.
//!
//! Annotation values are written in a restricted, JSON-like object literal
//! syntax: single, double or backtick quoted strings, bare object keys,
//! trailing commas, `true`/`false`/`null`/`undefined`, and the bare
//! placeholders `string`, `number`, `boolean` and `id`. Nothing is evaluated.

use serde_json::{Map, Number, Value};

use crate::fillers::FillerSource;

/// Bare placeholder expanded to a random, type-conformant value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    String,
    Number,
    Boolean,
    Id,
}

impl Placeholder {
    fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "string" => Some(Placeholder::String),
            "number" => Some(Placeholder::Number),
            "boolean" => Some(Placeholder::Boolean),
            "id" => Some(Placeholder::Id),
            _ => None,
        }
    }

    pub fn fill(self, filler: &mut dyn FillerSource) -> Value {
        match self {
            Placeholder::String => Value::String(filler.word()),
            Placeholder::Number => Value::from(filler.int()),
            Placeholder::Boolean => Value::Bool(filler.boolean()),
            Placeholder::Id => Value::String(filler.id()),
        }
    }
}

/// A parsed annotation literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Placeholder(Placeholder),
    List(Vec<Literal>),
    Object(Vec<(String, Literal)>),
}

impl Literal {
    pub fn has_placeholder(&self) -> bool {
        match self {
            Literal::Placeholder(_) => true,
            Literal::List(items) => items.iter().any(Literal::has_placeholder),
            Literal::Object(entries) => entries.iter().any(|(_, v)| v.has_placeholder()),
            _ => false,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Literal::Bool(_) | Literal::Number(_) | Literal::String(_))
    }

    /// Convert to JSON, expanding placeholders through `filler`.
    pub fn resolve(&self, filler: &mut dyn FillerSource) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(n.clone()),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Placeholder(p) => p.fill(filler),
            Literal::List(items) => Value::Array(items.iter().map(|i| i.resolve(filler)).collect()),
            Literal::Object(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key.clone(), value.resolve(filler));
                }
                Value::Object(map)
            }
        }
    }

    /// Convert to JSON when the literal carries no placeholder.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Literal::Null => Some(Value::Null),
            Literal::Bool(b) => Some(Value::Bool(*b)),
            Literal::Number(n) => Some(Value::Number(n.clone())),
            Literal::String(s) => Some(Value::String(s.clone())),
            Literal::Placeholder(_) => None,
            Literal::List(items) => items
                .iter()
                .map(Literal::to_value)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            Literal::Object(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key.clone(), value.to_value()?);
                }
                Some(Value::Object(map))
            }
        }
    }
}

/// Literal syntax error with the character offset it was found at.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at column {column}")]
pub struct LiteralError {
    pub column: usize,
    pub message: String,
}

/// Parse one complete literal; trailing input other than whitespace or a
/// single trailing comma is an error.
pub fn parse_literal(text: &str) -> Result<Literal, LiteralError> {
    let mut parser = LiteralParser::new(text);
    let literal = parser.value()?;
    parser.skip_whitespace();
    if parser.peek() == Some(',') {
        parser.advance();
        parser.skip_whitespace();
    }
    if let Some(c) = parser.peek() {
        return Err(parser.error(format!("unexpected trailing '{c}'")));
    }
    Ok(literal)
}

/// Parse a scalar-ish annotation value. A lone bare word that is not a
/// keyword or placeholder reads as a string (`Fruit` == `'Fruit'`).
pub fn parse_lenient(text: &str) -> Result<Literal, LiteralError> {
    let trimmed = text.trim().trim_end_matches(',').trim_end();
    match parse_literal(trimmed) {
        Ok(literal) => Ok(literal),
        Err(_) if is_identifier(trimmed) => Ok(Literal::String(trimmed.to_string())),
        Err(e) => Err(e),
    }
}

pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

struct LiteralParser {
    chars: Vec<char>,
    pos: usize,
}

impl LiteralParser {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            column: self.pos + 1,
            message: message.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn value(&mut self) -> Result<Literal, LiteralError> {
        self.skip_whitespace();
        match self.peek() {
            Some('{') => self.object(),
            Some('[') => self.list(),
            Some(q @ ('\'' | '"' | '`')) => self.string(q).map(Literal::String),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => self.keyword(),
            Some(c) => Err(self.error(format!("unexpected '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn object(&mut self) -> Result<Literal, LiteralError> {
        self.expect('{')?;
        let mut entries: Vec<(String, Literal)> = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.advance();
                return Ok(Literal::Object(entries));
            }

            let key = match self.peek() {
                Some(q @ ('\'' | '"')) => self.string(q)?,
                Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => self.identifier(),
                Some(c) => return Err(self.error(format!("expected object key, found '{c}'"))),
                None => return Err(self.error("unterminated object")),
            };
            if entries.iter().any(|(k, _)| *k == key) {
                return Err(self.error(format!("duplicate key '{key}'")));
            }
            self.expect(':')?;
            let value = self.value()?;
            entries.push((key, value));

            self.skip_whitespace();
            match self.advance() {
                Some(',') => continue,
                Some('}') => return Ok(Literal::Object(entries)),
                Some(c) => {
                    self.pos -= 1;
                    return Err(self.error(format!("expected ',' or '}}', found '{c}'")));
                }
                None => return Err(self.error("unterminated object")),
            }
        }
    }

    fn list(&mut self) -> Result<Literal, LiteralError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(']') {
                self.advance();
                return Ok(Literal::List(items));
            }

            items.push(self.value()?);

            self.skip_whitespace();
            match self.advance() {
                Some(',') => continue,
                Some(']') => return Ok(Literal::List(items)),
                Some(c) => {
                    self.pos -= 1;
                    return Err(self.error(format!("expected ',' or ']', found '{c}'")));
                }
                None => return Err(self.error("unterminated list")),
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<String, LiteralError> {
        self.advance();
        let mut out = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.advance() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some(c) => out.push(c),
                    None => return Err(self.error("unterminated escape")),
                },
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn number(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.advance();
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-' | '_'))
        {
            self.advance();
        }
        let raw: String = self.chars[start..self.pos]
            .iter()
            .filter(|c| **c != '_')
            .collect();

        if let Ok(int) = raw.parse::<i64>() {
            return Ok(Literal::Number(Number::from(int)));
        }
        raw.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Literal::Number)
            .ok_or_else(|| LiteralError {
                column: start + 1,
                message: format!("invalid number '{raw}'"),
            })
    }

    fn identifier(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        {
            self.advance();
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn keyword(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        let ident = self.identifier();
        match ident.as_str() {
            "true" => Ok(Literal::Bool(true)),
            "false" => Ok(Literal::Bool(false)),
            "null" | "undefined" => Ok(Literal::Null),
            other => Placeholder::from_ident(other)
                .map(Literal::Placeholder)
                .ok_or_else(|| LiteralError {
                    column: start + 1,
                    message: format!("unknown identifier '{other}'"),
                }),
        }
    }
}

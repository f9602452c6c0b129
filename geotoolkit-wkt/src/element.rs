//! WKT element tree.
//!
//! A WKT definition is a tree of elements: `KEYWORD[value, value, ...]` where values are quoted
//! texts, numbers, bare words (enumeration values such as `NORTH`) or nested elements. Both `[]`
//! and `()` delimiters are accepted, but an element must be closed with the delimiter matching
//! the one that opened it.

use crate::error::WktError;

/// Maximum nesting depth of elements.
pub const MAX_DEPTH: usize = 32;

/// Value inside an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Quoted text, with `""` escapes resolved.
    Text(String),
    /// Number as written in the definition.
    Number(String),
    /// Bare word.
    Word(String),
    /// Nested element.
    Element(Element),
}

/// Element of a WKT definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Keyword in upper case.
    pub keyword: String,
    /// Values in declaration order.
    pub values: Vec<Value>,
    /// Byte offset of the keyword in the source text.
    pub position: usize,
}

impl Element {
    /// Reads a text containing exactly one element (surrounding whitespace is allowed).
    pub fn parse(text: &str) -> Result<Element, WktError> {
        let mut reader = Reader { text, position: 0 };
        reader.skip_whitespace();
        let element = reader.read_element(0)?;
        reader.skip_whitespace();

        if reader.position < text.len() {
            return Err(reader.error("unexpected text after the end of the element"));
        }

        Ok(element)
    }

    /// Nested elements with the given keyword.
    pub fn children<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.values.iter().filter_map(move |value| match value {
            Value::Element(element) if element.keyword.eq_ignore_ascii_case(keyword) => {
                Some(element)
            }
            _ => None,
        })
    }

    /// The first nested element with the given keyword.
    pub fn child(&self, keyword: &str) -> Option<&Element> {
        self.elements()
            .find(|element| element.keyword.eq_ignore_ascii_case(keyword))
    }

    /// The first nested element with the given keyword, or an error if there is none.
    pub fn required_child(&self, keyword: &'static str) -> Result<&Element, WktError> {
        self.child(keyword).ok_or_else(|| WktError::Missing {
            element: self.keyword.clone(),
            missing: keyword,
        })
    }

    /// All nested elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.values.iter().filter_map(|value| match value {
            Value::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Quoted text at the given position.
    pub fn text(&self, index: usize) -> Result<&str, WktError> {
        match self.values.get(index) {
            Some(Value::Text(text)) => Ok(text),
            Some(_) => Err(self.invalid(format!("value {index} is not a quoted text"))),
            None => Err(self.missing("quoted text")),
        }
    }

    /// Number at the given position.
    pub fn number(&self, index: usize) -> Result<f64, WktError> {
        match self.values.get(index) {
            Some(Value::Number(raw)) => raw
                .parse()
                .map_err(|_| self.invalid(format!("{raw} is not a number"))),
            Some(_) => Err(self.invalid(format!("value {index} is not a number"))),
            None => Err(self.missing("numeric value")),
        }
    }

    /// Bare word at the given position.
    pub fn word(&self, index: usize) -> Result<&str, WktError> {
        match self.values.get(index) {
            Some(Value::Word(word)) => Ok(word),
            Some(_) => Err(self.invalid(format!("value {index} is not a word"))),
            None => Err(self.missing("enumeration value")),
        }
    }

    /// Quoted text or number at the given position, as written. Used for authority codes that
    /// may be declared either way.
    pub fn text_or_number(&self, index: usize) -> Result<&str, WktError> {
        match self.values.get(index) {
            Some(Value::Text(value)) | Some(Value::Number(value)) => Ok(value),
            Some(_) => Err(self.invalid(format!("value {index} is not a text or number"))),
            None => Err(self.missing("code")),
        }
    }

    /// All numbers of the element.
    pub fn numbers(&self) -> Result<Vec<f64>, WktError> {
        (0..self.values.len()).map(|i| self.number(i)).collect()
    }

    pub(crate) fn invalid(&self, message: String) -> WktError {
        WktError::InvalidValue {
            element: self.keyword.clone(),
            message,
        }
    }

    fn missing(&self, missing: &'static str) -> WktError {
        WktError::Missing {
            element: self.keyword.clone(),
            missing,
        }
    }
}

struct Reader<'a> {
    text: &'a str,
    position: usize,
}

impl Reader<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.position..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, message: impl Into<String>) -> WktError {
        WktError::Syntax {
            position: self.position,
            message: message.into(),
        }
    }

    fn read_word(&mut self) -> &str {
        let start = self.position;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.bump();
        }

        &self.text[start..self.position]
    }

    fn read_element(&mut self, depth: usize) -> Result<Element, WktError> {
        if depth >= MAX_DEPTH {
            return Err(WktError::TooDeep(MAX_DEPTH));
        }

        let position = self.position;
        if !self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            return Err(self.error("expected element keyword"));
        }

        let keyword = self.read_word().to_ascii_uppercase();
        self.skip_whitespace();

        let close = match self.bump() {
            Some('[') => ']',
            Some('(') => ')',
            _ => return Err(self.error(format!("expected '[' or '(' after {keyword}"))),
        };

        let mut values = vec![];
        loop {
            self.skip_whitespace();
            values.push(self.read_value(depth)?);
            self.skip_whitespace();

            match self.bump() {
                Some(',') => continue,
                Some(c) if c == close => break,
                Some(c) => {
                    self.position -= c.len_utf8();
                    return Err(self.error(format!("expected ',' or '{close}', found '{c}'")));
                }
                None => return Err(self.error(format!("element {keyword} is not closed"))),
            }
        }

        Ok(Element {
            keyword,
            values,
            position,
        })
    }

    fn read_value(&mut self, depth: usize) -> Result<Value, WktError> {
        match self.peek() {
            Some('"') => self.read_text().map(Value::Text),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => {
                self.read_number().map(Value::Number)
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let start = self.position;
                let word = self.read_word().to_string();
                self.skip_whitespace();
                if matches!(self.peek(), Some('[') | Some('(')) {
                    self.position = start;
                    self.read_element(depth + 1).map(Value::Element)
                } else {
                    Ok(Value::Word(word))
                }
            }
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
            None => Err(self.error("unexpected end of text")),
        }
    }

    fn read_text(&mut self) -> Result<String, WktError> {
        let start = self.position;
        self.bump();

        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') if self.peek() == Some('"') => {
                    self.bump();
                    text.push('"');
                }
                Some('"') => return Ok(text),
                Some(c) => text.push(c),
                None => {
                    return Err(WktError::Syntax {
                        position: start,
                        message: "quoted text is not closed".into(),
                    })
                }
            }
        }
    }

    fn read_number(&mut self) -> Result<String, WktError> {
        let start = self.position;
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.bump();
        }

        let mut digits = 0;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => digits += 1,
                '.' => {}
                'e' | 'E' => {
                    self.bump();
                    if matches!(self.peek(), Some('-') | Some('+')) {
                        self.bump();
                    }
                    continue;
                }
                _ => break,
            }
            self.bump();
        }

        if digits == 0 {
            return Err(WktError::Syntax {
                position: start,
                message: "expected a number".into(),
            });
        }

        Ok(self.text[start..self.position].to_string())
    }
}

/// Keyword of the outermost element, read without parsing the rest of the text.
pub fn leading_keyword(text: &str) -> Option<&str> {
    let trimmed = text.trim_start();
    let end = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(trimmed.len());
    let keyword = &trimmed[..end];

    let rest = trimmed[end..].trim_start();
    if keyword.is_empty() || !(rest.starts_with('[') || rest.starts_with('(')) {
        return None;
    }

    Some(keyword)
}

use crate::error::SelectorError;

/// Attribute comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    /// `[attr]`
    Exists,
    /// `[attr=v]`
    Equals,
    /// `[attr*=v]`
    Contains,
    /// `[attr^=v]`
    StartsWith,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorPart {
    Class(String),
    Id(String),
    Attr {
        name: String,
        op: AttrOp,
        value: String,
    },
    Not(Box<Selector>),
}

/// One parsed compound selector: optional tag followed by any number of
/// class / id / attribute / `:not()` parts. This is deliberately only the
/// subset the discovery rules use; combinators, selector lists and other
/// pseudo-classes are reported as unsupported so callers can skip the rule.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    pub tag: Option<String>,
    pub parts: Vec<SelectorPart>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Selector, SelectorError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SelectorError::Empty);
        }
        let mut parser = Parser {
            chars: input.char_indices().peekable(),
            input,
        };
        parser.compound()
    }
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    input: &'a str,
}

impl<'a> Parser<'a> {
    fn compound(&mut self) -> Result<Selector, SelectorError> {
        let mut selector = Selector::default();

        if matches!(self.peek(), Some(c) if c == '*') {
            self.bump();
        } else if matches!(self.peek(), Some(c) if is_ident_start(c)) {
            selector.tag = Some(self.ident().to_ascii_lowercase());
        }

        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.bump();
                    selector.parts.push(SelectorPart::Class(self.ident()));
                }
                '#' => {
                    self.bump();
                    selector.parts.push(SelectorPart::Id(self.ident()));
                }
                '[' => selector.parts.push(self.attribute()?),
                ':' => selector.parts.push(self.pseudo()?),
                // Anything else (combinators, commas, stray syntax) is out
                // of the supported subset.
                other => {
                    return Err(SelectorError::Unsupported(format!(
                        "'{}' in \"{}\"",
                        other, self.input
                    )))
                }
            }
        }

        if selector.tag.is_none() && selector.parts.is_empty() {
            return Err(SelectorError::Unsupported(self.input.to_string()));
        }
        Ok(selector)
    }

    fn attribute(&mut self) -> Result<SelectorPart, SelectorError> {
        self.bump(); // '['
        let name = self.ident().to_ascii_lowercase();
        if name.is_empty() {
            return Err(SelectorError::Unsupported(self.input.to_string()));
        }

        let op = match self.peek() {
            Some(']') => {
                self.bump();
                return Ok(SelectorPart::Attr {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                });
            }
            Some('=') => {
                self.bump();
                AttrOp::Equals
            }
            Some('*') => {
                self.bump();
                self.expect('=')?;
                AttrOp::Contains
            }
            Some('^') => {
                self.bump();
                self.expect('=')?;
                AttrOp::StartsWith
            }
            _ => return Err(SelectorError::Unterminated(self.input.to_string())),
        };

        let value = self.attr_value()?;
        // Flags such as the case-insensitivity suffix `[attr=v i]` are not
        // part of the subset.
        match self.peek() {
            Some(']') => {
                self.bump();
                Ok(SelectorPart::Attr { name, op, value })
            }
            Some(_) => Err(SelectorError::Unsupported(self.input.to_string())),
            None => Err(SelectorError::Unterminated(self.input.to_string())),
        }
    }

    fn attr_value(&mut self) -> Result<String, SelectorError> {
        match self.peek() {
            Some(quote) if quote == '"' || quote == '\'' => {
                self.bump();
                let mut value = String::new();
                loop {
                    match self.bump() {
                        Some(c) if c == quote => return Ok(value),
                        Some(c) => value.push(c),
                        None => return Err(SelectorError::Unterminated(self.input.to_string())),
                    }
                }
            }
            _ => {
                let mut value = String::new();
                while let Some(c) = self.peek() {
                    if c == ']' || c == ' ' {
                        break;
                    }
                    value.push(c);
                    self.bump();
                }
                Ok(value)
            }
        }
    }

    fn pseudo(&mut self) -> Result<SelectorPart, SelectorError> {
        self.bump(); // ':'
        let name = self.ident();
        if name != "not" {
            return Err(SelectorError::Unsupported(format!(
                ":{} in \"{}\"",
                name, self.input
            )));
        }
        self.expect('(')?;
        let mut inner = String::new();
        let mut depth = 1usize;
        loop {
            match self.bump() {
                Some('(') => {
                    depth += 1;
                    inner.push('(');
                }
                Some(')') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    inner.push(')');
                }
                Some(c) => inner.push(c),
                None => return Err(SelectorError::Unterminated(self.input.to_string())),
            }
        }
        Ok(SelectorPart::Not(Box::new(Selector::parse(&inner)?)))
    }

    fn ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if is_ident_char(c) {
                out.push(c);
                self.bump();
            } else {
                break;
            }
        }
        out
    }

    fn expect(&mut self, expected: char) -> Result<(), SelectorError> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            _ => Err(SelectorError::Unterminated(self.input.to_string())),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

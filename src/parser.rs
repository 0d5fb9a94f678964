// src/parser.rs

/// One step below the root of a bracketed parameter key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySegment {
    /// `[name]`
    Key(String),
    /// `[]`, appends to a list
    Append,
}

/// `filters[title]` → root `filters`, segments `[Key("title")]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    pub root: String,
    pub segments: Vec<KeySegment>,
}

#[derive(Debug)]
pub enum ParseError {
    InvalidSyntax(String),
}

pub fn parse_key(input: &str) -> Result<KeyPath, ParseError> {
    let mut p = Parser::new(input);
    let root = p.capture_root()?;
    let mut segments = Vec::new();
    while !p.eof() {
        p.expect('[')?;
        if p.consume_char(']') {
            segments.push(KeySegment::Append);
            continue;
        }
        let name = p.capture_until(']')?;
        p.expect(']')?;
        segments.push(KeySegment::Key(name.to_string()));
    }
    Ok(KeyPath { root, segments })
}

pub struct Parser<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Parser<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    fn capture_root(&mut self) -> Result<String, ParseError> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == '[' {
                break;
            }
            self.i += c.len_utf8();
        }
        if self.i == start {
            return Err(ParseError::InvalidSyntax("parameter name expected".into()));
        }
        Ok(self.s[start..self.i].to_string())
    }

    pub fn capture_until(&mut self, end: char) -> Result<&'a str, ParseError> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == end {
                break;
            }
            self.i += c.len_utf8();
        }
        if self.peek_char() != Some(end) {
            return Err(ParseError::InvalidSyntax(format!(
                "expected '{end}' in {:?}",
                self.s
            )));
        }
        Ok(&self.s[start..self.i])
    }

    pub fn expect(&mut self, c: char) -> Result<(), ParseError> {
        if self.consume_char(c) {
            Ok(())
        } else {
            Err(ParseError::InvalidSyntax(format!(
                "expected '{}' at offset {} in {:?}",
                c, self.i, self.s
            )))
        }
    }

    pub fn consume_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.i += c.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn peek_char(&self) -> Option<char> {
        self.s[self.i..].chars().next()
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nested_key() {
        let path = parse_key("filters[title]").unwrap();
        assert_eq!(path.root, "filters");
        assert_eq!(path.segments, vec![KeySegment::Key("title".into())]);
    }

    #[test]
    fn append_and_deep_keys() {
        let path = parse_key("filters[tags][]").unwrap();
        assert_eq!(
            path.segments,
            vec![KeySegment::Key("tags".into()), KeySegment::Append]
        );
        assert!(parse_key("page").unwrap().segments.is_empty());
    }

    #[test]
    fn malformed_keys() {
        assert!(parse_key("filters[title").is_err());
        assert!(parse_key("[title]").is_err());
        assert!(parse_key("filters[a]x").is_err());
    }
}

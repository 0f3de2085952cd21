use std::{
    fmt::{Display, Formatter},
    str::Chars,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Line(pub usize);

impl Display for Line {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Forward-only position in the source buffer that keeps track of the current line.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    source: &'a str,
    chars: Chars<'a>,
    line: Line,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, chars: source.chars(), line: Line(1) }
    }

    pub fn line(&self) -> Line {
        self.line
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    pub fn peek_next(&self) -> Option<char> {
        self.chars.clone().nth(1)
    }

    pub fn consume_if(&mut self, predicate: impl Fn(char) -> bool) -> Option<char> {
        match self.peek() {
            Some(c) if predicate(c) => self.next(),
            _ => None,
        }
    }

    pub fn consume_if_matches(&mut self, expected: char) -> bool {
        self.consume_if(|c| c == expected).is_some()
    }

    pub fn consume_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.consume_if(&predicate).is_some() {}
    }

    fn offset(&self) -> usize {
        self.source.len() - self.chars.as_str().len()
    }

    /// Source text between `self` and a cursor that has advanced further over the same source.
    pub fn slice_until(&self, end: &Cursor<'a>) -> &'a str {
        debug_assert!(std::ptr::eq(self.source, end.source));
        &self.source[self.offset()..end.offset()]
    }
}

impl<'a> From<&'a str> for Cursor<'a> {
    fn from(source: &'a str) -> Self {
        Self::new(source)
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line.0 += 1;
        }
        c
    }
}

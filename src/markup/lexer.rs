//! Inline lexer.
//!
//! Scans left to right. At each position the constructs are tried in a fixed
//! order (bold, italic, math, bullet marker, numbered marker) and the first
//! that matches wins; text between matches is emitted as [`Token::Text`].
//!
//! Delimited spans are non-greedy, never nest, never cross a line break and
//! must have non-empty content. Anything that does not match is plain text,
//! so lexing cannot fail.

/// Which constructs a lexer recognises.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grammar {
    emphasis: bool,
    math: bool,
    lists: bool,
}

impl Grammar {
    /// Block bodies: everything.
    pub const BODY: Self = Self {
        emphasis: true,
        math: true,
        lists: true,
    };
    /// A single list line: emphasis and math only.
    pub const ITEM: Self = Self {
        emphasis: true,
        math: true,
        lists: false,
    };
    /// Retrieved-context passages: math only.
    pub const MATH_ONLY: Self = Self {
        emphasis: false,
        math: true,
        lists: false,
    };
}

/// A lexed fragment borrowing from the source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    /// Unmatched text.
    Text(&'a str),
    /// Content of `**...**`.
    Bold(&'a str),
    /// Content of `*...*`.
    Italic(&'a str),
    /// Content of `$...$`.
    Math(&'a str),
    /// Rest of a line that followed `\n- ` or `\n• `.
    Bullet(&'a str),
    /// Number and rest of a line that followed `\nN. `.
    Numbered(u64, &'a str),
}

/// Iterator of [`Token`]s over a string.
#[derive(Clone, Debug)]
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    grammar: Grammar,
    pending: Option<Token<'a>>,
}

impl<'a> Lexer<'a> {
    /// Lex `src` with the given grammar.
    #[must_use]
    pub const fn new(src: &'a str, grammar: Grammar) -> Self {
        Self {
            src,
            pos: 0,
            grammar,
            pending: None,
        }
    }

    /// Try every construct at byte offset `at`. Returns the token and the
    /// offset just past it.
    ///
    /// Only ASCII bytes start a construct, so `at` is always a char boundary
    /// when this returns `Some`.
    fn match_at(&self, at: usize) -> Option<(Token<'a>, usize)> {
        match self.src.as_bytes()[at] {
            b'*' if self.grammar.emphasis => self
                .delimited(at, "**")
                .map(|(content, end)| (Token::Bold(content), end))
                .or_else(|| {
                    self.delimited(at, "*")
                        .map(|(content, end)| (Token::Italic(content), end))
                }),
            b'$' if self.grammar.math => self
                .delimited(at, "$")
                .map(|(content, end)| (Token::Math(content), end)),
            b'\n' if self.grammar.lists => self.list_marker(at),
            _ => None,
        }
    }

    fn delimited(&self, at: usize, delim: &str) -> Option<(&'a str, usize)> {
        let src = self.src;
        if !src[at..].starts_with(delim) {
            return None;
        }
        let open_end = at + delim.len();
        let line = &src[open_end..];
        let line = line
            .find(['\n', '\r'])
            .map_or(line, |line_end| &line[..line_end]);
        let close = line.find(delim)?;
        if close == 0 {
            return None;
        }
        Some((&line[..close], open_end + close + delim.len()))
    }

    fn list_marker(&self, at: usize) -> Option<(Token<'a>, usize)> {
        let rest = &self.src[at + 1..];

        if let Some(after) = rest
            .strip_prefix("- ")
            .or_else(|| rest.strip_prefix("\u{2022} "))
        {
            let (item, len) = rest_of_line(after);
            let end = at + 1 + (rest.len() - after.len()) + len;
            return Some((Token::Bullet(item), end));
        }

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 || !rest[digits..].starts_with(". ") {
            return None;
        }
        // Digit runs too long for u64 are not list markers.
        let number = rest[..digits].parse::<u64>().ok()?;
        let after = &rest[digits + 2..];
        let (item, len) = rest_of_line(after);
        Some((Token::Numbered(number, item), at + 1 + digits + 2 + len))
    }
}

/// Text up to the next newline (without a trailing `\r`), and the byte
/// length consumed. The newline itself is left for the next marker.
fn rest_of_line(s: &str) -> (&str, usize) {
    let len = s.find('\n').unwrap_or(s.len());
    (s[..len].trim_end_matches('\r'), len)
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if let Some(token) = self.pending.take() {
            return Some(token);
        }
        let start = self.pos;
        let len = self.src.len();
        if start >= len {
            return None;
        }

        for at in start..len {
            if let Some((token, end)) = self.match_at(at) {
                self.pos = end;
                if at == start {
                    return Some(token);
                }
                self.pending = Some(token);
                return Some(Token::Text(&self.src[start..at]));
            }
        }

        self.pos = len;
        Some(Token::Text(&self.src[start..]))
    }
}

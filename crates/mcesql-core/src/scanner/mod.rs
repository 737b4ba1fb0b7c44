//! Scanner - turns raw query text into position-tagged tokens
//!
//! There is exactly one implementation of quote, bracket and comment
//! tracking in the crate. Everything that needs to know whether an offset is
//! "code" goes through [`scan`], either directly with a [`ScanVisitor`] or via
//! the token stream built by [`tokenize`].
//!
//! Offsets are byte offsets into the original text and always fall on char
//! boundaries. Unterminated strings, identifiers and comments run to the end
//! of input.

use std::ops::Range;

use crate::error::Span;

/// Lexical state of the scanner at a given character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanState {
    Default,
    /// Inside `'...'`
    SingleQuoted,
    /// Inside `"..."`
    DoubleQuoted,
    /// Inside `[...]`
    Bracketed,
    /// Inside `-- ...` up to the newline
    LineComment,
    /// Inside `/* ... */`
    BlockComment,
}

/// Callbacks driven by [`scan`]
///
/// `on_char` sees every character that is not part of a word, including the
/// ones inside strings and comments; `state` says which. `depth` is the
/// parenthesis nesting at that character: an opening `(` reports the depth
/// outside it, a closing `)` the depth after it closes.
pub trait ScanVisitor {
    fn on_char(&mut self, _offset: usize, _ch: char, _state: ScanState, _depth: usize) {}

    /// A maximal run of identifier characters in default state
    fn on_word(&mut self, _start: usize, _end: usize, _depth: usize) {}

    /// Entering or leaving a string, quoted identifier or comment.
    ///
    /// When entering, `offset` is the offset of the opening delimiter. When
    /// leaving, it is the offset just past the closing delimiter (or the end
    /// of input for unterminated spans).
    fn on_state_change(&mut self, _offset: usize, _from: ScanState, _to: ScanState, _depth: usize) {
    }
}

pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Walk `sql` once, reporting characters, words and state changes
pub fn scan<V: ScanVisitor + ?Sized>(sql: &str, visitor: &mut V) {
    let chars: Vec<(usize, char)> = sql.char_indices().collect();
    let offset_at = |i: usize| chars.get(i).map_or(sql.len(), |&(offset, _)| offset);

    let mut state = ScanState::Default;
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let (offset, ch) = chars[i];
        let next = chars.get(i + 1).map(|&(_, c)| c);

        match state {
            ScanState::Default => {
                if is_word_char(ch) {
                    let mut j = i + 1;
                    while j < chars.len() && is_word_char(chars[j].1) {
                        j += 1;
                    }
                    visitor.on_word(offset, offset_at(j), depth);
                    i = j;
                    continue;
                }

                let entered = match ch {
                    '\'' => Some((ScanState::SingleQuoted, 1)),
                    '"' => Some((ScanState::DoubleQuoted, 1)),
                    '[' => Some((ScanState::Bracketed, 1)),
                    '-' if next == Some('-') => Some((ScanState::LineComment, 2)),
                    '/' if next == Some('*') => Some((ScanState::BlockComment, 2)),
                    _ => None,
                };

                if let Some((to, width)) = entered {
                    visitor.on_state_change(offset, state, to, depth);
                    for k in i..i + width {
                        visitor.on_char(chars[k].0, chars[k].1, to, depth);
                    }
                    state = to;
                    i += width;
                    continue;
                }

                match ch {
                    '(' => {
                        visitor.on_char(offset, ch, state, depth);
                        depth += 1;
                    }
                    ')' => {
                        depth = depth.saturating_sub(1);
                        visitor.on_char(offset, ch, state, depth);
                    }
                    _ => visitor.on_char(offset, ch, state, depth),
                }
                i += 1;
            }

            ScanState::SingleQuoted | ScanState::DoubleQuoted | ScanState::Bracketed => {
                let close = match state {
                    ScanState::SingleQuoted => '\'',
                    ScanState::DoubleQuoted => '"',
                    _ => ']',
                };
                visitor.on_char(offset, ch, state, depth);
                if ch == close {
                    if next == Some(close) {
                        // doubled delimiter is an escape, not the end
                        visitor.on_char(offset_at(i + 1), close, state, depth);
                        i += 2;
                        continue;
                    }
                    visitor.on_state_change(offset_at(i + 1), state, ScanState::Default, depth);
                    state = ScanState::Default;
                }
                i += 1;
            }

            ScanState::LineComment => {
                if ch == '\n' {
                    visitor.on_state_change(offset, state, ScanState::Default, depth);
                    state = ScanState::Default;
                }
                visitor.on_char(offset, ch, state, depth);
                i += 1;
            }

            ScanState::BlockComment => {
                visitor.on_char(offset, ch, state, depth);
                if ch == '*' && next == Some('/') {
                    visitor.on_char(offset_at(i + 1), '/', state, depth);
                    visitor.on_state_change(offset_at(i + 2), state, ScanState::Default, depth);
                    state = ScanState::Default;
                    i += 2;
                    continue;
                }
                i += 1;
            }
        }
    }

    if state != ScanState::Default {
        visitor.on_state_change(sql.len(), state, ScanState::Default, depth);
    }
}

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Letters, digits and underscores; keywords, names and numbers
    Word,
    /// Any other single non-whitespace character
    Symbol,
    Whitespace,
    /// `[bracketed identifier]`
    Bracket,
    /// `"double-quoted identifier"`
    Quoted,
    /// `'string literal'`
    String,
    /// Line or block comment
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
    /// Parenthesis depth at the token
    pub depth: usize,
}

impl<'a> Token<'a> {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    /// Whitespace and comments
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }

    /// Word token equal to `keyword`, ignoring ASCII case
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }

    pub fn is_any_keyword(&self, keywords: &[&str]) -> bool {
        self.kind == TokenKind::Word && keywords.iter().any(|k| self.text.eq_ignore_ascii_case(k))
    }

    pub fn is_symbol(&self, ch: char) -> bool {
        self.kind == TokenKind::Symbol && self.text.starts_with(ch)
    }

    pub fn is_number(&self) -> bool {
        self.kind == TokenKind::Word && self.text.chars().all(|c| c.is_ascii_digit())
    }

    pub fn is_string(&self) -> bool {
        self.kind == TokenKind::String
    }

    /// Something that can name a table, column or alias
    pub fn is_identifier(&self) -> bool {
        match self.kind {
            TokenKind::Word => !self.is_number(),
            TokenKind::Bracket | TokenKind::Quoted => true,
            _ => false,
        }
    }

    /// Identifier text with brackets or quotes removed
    pub fn ident_value(&self) -> String {
        crate::schema::unquote(self.text)
    }

    pub fn upper(&self) -> String {
        self.text.to_ascii_uppercase()
    }
}

struct TokenCollector<'a> {
    sql: &'a str,
    tokens: Vec<Token<'a>>,
    open: Option<(usize, usize)>,
    whitespace: Option<(usize, usize)>,
}

impl<'a> TokenCollector<'a> {
    fn push(&mut self, kind: TokenKind, start: usize, end: usize, depth: usize) {
        self.flush_whitespace(start);
        self.tokens.push(Token {
            kind,
            text: &self.sql[start..end],
            start,
            end,
            depth,
        });
    }

    fn flush_whitespace(&mut self, end: usize) {
        if let Some((start, depth)) = self.whitespace.take() {
            if start < end {
                self.tokens.push(Token {
                    kind: TokenKind::Whitespace,
                    text: &self.sql[start..end],
                    start,
                    end,
                    depth,
                });
            }
        }
    }
}

impl ScanVisitor for TokenCollector<'_> {
    fn on_char(&mut self, offset: usize, ch: char, state: ScanState, depth: usize) {
        if state != ScanState::Default {
            return;
        }
        if ch.is_whitespace() {
            self.whitespace.get_or_insert((offset, depth));
        } else {
            self.push(TokenKind::Symbol, offset, offset + ch.len_utf8(), depth);
        }
    }

    fn on_word(&mut self, start: usize, end: usize, depth: usize) {
        self.push(TokenKind::Word, start, end, depth);
    }

    fn on_state_change(&mut self, offset: usize, from: ScanState, _to: ScanState, depth: usize) {
        if from == ScanState::Default {
            self.flush_whitespace(offset);
            self.open = Some((offset, depth));
            return;
        }
        let kind = match from {
            ScanState::SingleQuoted => TokenKind::String,
            ScanState::DoubleQuoted => TokenKind::Quoted,
            ScanState::Bracketed => TokenKind::Bracket,
            _ => TokenKind::Comment,
        };
        if let Some((start, depth)) = self.open.take() {
            self.push(kind, start, offset, depth);
        }
    }
}

/// Tokenize `sql`; concatenating the token texts reproduces the input
pub fn tokenize(sql: &str) -> Vec<Token<'_>> {
    let mut collector = TokenCollector {
        sql,
        tokens: Vec::new(),
        open: None,
        whitespace: None,
    };
    scan(sql, &mut collector);
    collector.flush_whitespace(sql.len());
    collector.tokens
}

struct SegmentSplitter {
    boundaries: Vec<usize>,
}

impl ScanVisitor for SegmentSplitter {
    fn on_char(&mut self, offset: usize, ch: char, state: ScanState, _depth: usize) {
        if ch == ';' && state == ScanState::Default {
            self.boundaries.push(offset);
        }
    }
}

/// Byte ranges of the statements in `sql`, split on `;` outside strings and
/// comments. Blank segments are dropped; separators are not included.
pub fn statement_segments(sql: &str) -> Vec<Range<usize>> {
    let mut splitter = SegmentSplitter {
        boundaries: Vec::new(),
    };
    scan(sql, &mut splitter);

    let mut segments = Vec::new();
    let mut start = 0;
    for boundary in splitter.boundaries.into_iter().chain(std::iter::once(sql.len())) {
        if !sql[start..boundary].trim().is_empty() {
            segments.push(start..boundary);
        }
        start = (boundary + 1).min(sql.len());
    }
    segments
}

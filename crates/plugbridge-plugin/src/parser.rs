//! Host-pluggable source parsing behind `HookContext::parse`.

use plugbridge_core::{BridgeError, BridgeResult, TextPosition};

/// Options accepted by [`SourceParser::parse`].
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// File name reported in parse errors.
    pub file_name: Option<String>,
}

/// Node classification in the structural tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxKind {
    /// The whole source.
    Root,
    /// A `(...)` group.
    Parens,
    /// A `[...]` group.
    Brackets,
    /// A `{...}` group.
    Braces,
    /// A string literal.
    String,
    /// A run of non-delimiter text.
    Token,
}

/// A node spanning `start..end` byte offsets of the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    /// Node kind.
    pub kind: SyntaxKind,
    /// Start byte offset, inclusive.
    pub start: usize,
    /// End byte offset, exclusive.
    pub end: usize,
    /// Nested groups and tokens.
    pub children: Vec<SyntaxNode>,
}

/// The result of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    /// Root node covering the whole source.
    pub root: SyntaxNode,
}

/// The parsing seam. Hosts with a real frontend install their own
/// implementation; everything else gets [`DefaultParser`].
pub trait SourceParser: Send + Sync {
    /// Parses source text into a structural tree.
    fn parse(&self, code: &str, options: &ParseOptions) -> BridgeResult<SyntaxTree>;
}

/// Structural fallback parser: strings, comments and balanced
/// delimiter groups, with positioned errors on mismatches.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParser;

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    file: Option<&'a str>,
}

impl<'a> Scanner<'a> {
    fn new(code: &'a str, options: &'a ParseOptions) -> Self {
        Self {
            bytes: code.as_bytes(),
            pos: 0,
            line: 0,
            column: 0,
            file: options.file_name.as_deref(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    fn error(&self, message: impl Into<String>) -> BridgeError {
        let mut message = message.into();
        if let Some(file) = self.file {
            message = format!("{file}: {message}");
        }
        BridgeError::parse_at(message, TextPosition::new(self.line, self.column))
    }

    /// Consumes a string literal opened by `quote`; the opening quote
    /// is already consumed.
    fn string(&mut self, quote: u8, start: usize) -> BridgeResult<SyntaxNode> {
        while let Some(b) = self.bump() {
            if b == b'\\' {
                self.bump();
            } else if b == quote {
                return Ok(SyntaxNode {
                    kind: SyntaxKind::String,
                    start,
                    end: self.pos,
                    children: Vec::new(),
                });
            }
        }
        Err(self.error("unterminated string literal"))
    }

    /// Skips a comment when positioned just past a `/`. Returns true
    /// if a comment was consumed.
    fn comment(&mut self) -> BridgeResult<bool> {
        match self.peek() {
            Some(b'/') => {
                while let Some(b) = self.bump() {
                    if b == b'\n' {
                        break;
                    }
                }
                Ok(true)
            }
            Some(b'*') => {
                self.bump();
                let mut prev = 0u8;
                while let Some(b) = self.bump() {
                    if prev == b'*' && b == b'/' {
                        return Ok(true);
                    }
                    prev = b;
                }
                Err(self.error("unterminated block comment"))
            }
            _ => Ok(false),
        }
    }

    /// Parses child nodes until `close` (or end of input when `close`
    /// is `None`).
    fn group_body(&mut self, close: Option<u8>) -> BridgeResult<Vec<SyntaxNode>> {
        let mut children = Vec::new();
        let mut token_start: Option<usize> = None;
        loop {
            let at = self.pos;
            let Some(b) = self.peek() else {
                if let Some(close) = close {
                    return Err(self.error(format!("unclosed '{}'", closer_name(close))));
                }
                flush_token(&mut children, &mut token_start, at);
                return Ok(children);
            };
            match b {
                b'"' | b'\'' | b'`' => {
                    flush_token(&mut children, &mut token_start, at);
                    self.bump();
                    children.push(self.string(b, at)?);
                }
                b'/' => {
                    self.bump();
                    if self.comment()? {
                        flush_token(&mut children, &mut token_start, at);
                    } else {
                        token_start.get_or_insert(at);
                    }
                }
                b'(' | b'[' | b'{' => {
                    flush_token(&mut children, &mut token_start, at);
                    self.bump();
                    let body = self.group_body(Some(matching_close(b)))?;
                    children.push(SyntaxNode {
                        kind: group_kind(b),
                        start: at,
                        end: self.pos,
                        children: body,
                    });
                }
                b')' | b']' | b'}' => {
                    if close == Some(b) {
                        flush_token(&mut children, &mut token_start, at);
                        self.bump();
                        return Ok(children);
                    }
                    return Err(self.error(format!("unexpected '{}'", b as char)));
                }
                _ => {
                    if b.is_ascii_whitespace() {
                        flush_token(&mut children, &mut token_start, at);
                    } else {
                        token_start.get_or_insert(at);
                    }
                    self.bump();
                }
            }
        }
    }
}

fn flush_token(children: &mut Vec<SyntaxNode>, start: &mut Option<usize>, end: usize) {
    if let Some(s) = start.take()
        && end > s
    {
        children.push(SyntaxNode {
            kind: SyntaxKind::Token,
            start: s,
            end,
            children: Vec::new(),
        });
    }
}

fn matching_close(open: u8) -> u8 {
    match open {
        b'(' => b')',
        b'[' => b']',
        _ => b'}',
    }
}

fn closer_name(close: u8) -> char {
    match close {
        b')' => '(',
        b']' => '[',
        _ => '{',
    }
}

fn group_kind(open: u8) -> SyntaxKind {
    match open {
        b'(' => SyntaxKind::Parens,
        b'[' => SyntaxKind::Brackets,
        _ => SyntaxKind::Braces,
    }
}

impl SourceParser for DefaultParser {
    fn parse(&self, code: &str, options: &ParseOptions) -> BridgeResult<SyntaxTree> {
        let mut scanner = Scanner::new(code, options);
        let children = scanner.group_body(None)?;
        Ok(SyntaxTree {
            root: SyntaxNode {
                kind: SyntaxKind::Root,
                start: 0,
                end: code.len(),
                children,
            },
        })
    }
}

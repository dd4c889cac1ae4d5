//! Tokenizer for component scripts.

use super::diagnostic::{Diagnostic, Span};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Punct(char),
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(s) => write!(f, "`{s}`"),
            Self::Int(v) => write!(f, "`{v}`"),
            Self::Float(v) => write!(f, "`{v}`"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Punct(c) => write!(f, "`{c}`"),
            Self::Eof => f.write_str("end of file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

const PUNCT: &[char] = &['{', '}', '(', ')', ';', ':', ',', '=', '.'];

/// Tokenize `source`. Stops at the first lexical error.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Diagnostic> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let eof = token.kind == TokenKind::Eof;
        tokens.push(token);
        if eof {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }

    fn skip_trivia(&mut self) -> Result<(), Diagnostic> {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(c), _) if c.is_whitespace() => {
                    self.next_char();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.next_char() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.span();
                    self.next_char();
                    self.next_char();
                    loop {
                        match self.next_char() {
                            Some('*') if self.peek() == Some('/') => {
                                self.next_char();
                                break;
                            }
                            Some(_) => {}
                            None => {
                                return Err(Diagnostic::error("unterminated block comment").at(start));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, Diagnostic> {
        self.skip_trivia()?;
        let span = self.span();

        let Some(ch) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span,
            });
        };

        let kind = if ch.is_alphabetic() || ch == '_' {
            TokenKind::Ident(self.take_while(|c| c.is_alphanumeric() || c == '_').to_string())
        } else if ch.is_ascii_digit() || (ch == '-' && self.peek_second().is_some_and(|c| c.is_ascii_digit())) {
            self.number(span)?
        } else if ch == '"' {
            self.string(span)?
        } else if PUNCT.contains(&ch) {
            self.next_char();
            TokenKind::Punct(ch)
        } else {
            return Err(Diagnostic::error(format!("unexpected character `{ch}`")).at(span));
        };

        Ok(Token { kind, span })
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.next_char();
        }
        &self.input[start..self.pos]
    }

    fn number(&mut self, span: Span) -> Result<TokenKind, Diagnostic> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.next_char();
        }
        self.take_while(|c| c.is_ascii_digit());
        let is_float = self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit());
        if is_float {
            self.next_char();
            self.take_while(|c| c.is_ascii_digit());
        }

        let text = &self.input[start..self.pos];
        let kind = if is_float {
            text.parse().map(TokenKind::Float).ok()
        } else {
            text.parse().map(TokenKind::Int).ok()
        };
        kind.ok_or_else(|| Diagnostic::error(format!("invalid number literal `{text}`")).at(span))
    }

    fn string(&mut self, span: Span) -> Result<TokenKind, Diagnostic> {
        self.next_char();
        let mut out = String::new();
        loop {
            match self.next_char() {
                Some('"') => return Ok(TokenKind::Str(out)),
                Some('\\') => match self.next_char() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c @ ('"' | '\\')) => out.push(c),
                    Some(c) => {
                        return Err(Diagnostic::error(format!("unknown escape `\\{c}`")).at(span));
                    }
                    None => break,
                },
                Some('\n') | None => break,
                Some(c) => out.push(c),
            }
        }
        Err(Diagnostic::error("unterminated string literal").at(span))
    }
}

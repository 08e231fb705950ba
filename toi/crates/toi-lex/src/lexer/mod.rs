//! The tokenizer proper, split into one module per token family, mirroring
//! the grammar families in spec §4.A: comments, identifiers/keywords,
//! numbers, strings, and the operator/punctuation table.

mod comment;
mod identifier;
mod number;
mod operator;
mod string;

use crate::cursor::Cursor;
use crate::{LexError, Literal, Token, TokenKind};
use toi_util::symbol::Symbol;

/// Drives the cursor across a full source file and accumulates tokens and
/// errors. One `Lexer` is used for exactly one `run()`.
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
    /// True when nothing but inline whitespace has been seen since the
    /// start of the current line (or the start of the file).
    at_line_start: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            tokens: Vec::new(),
            errors: Vec::new(),
            at_line_start: true,
        }
    }

    pub fn run(mut self) -> (Vec<Token>, Vec<LexError>) {
        while !self.cursor.is_at_end() {
            self.skip_inline_whitespace();
            if self.cursor.is_at_end() {
                break;
            }
            if comment::try_consume(&mut self.cursor, self.at_line_start) {
                continue;
            }
            self.scan_one();
        }
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            lexeme: Symbol::intern(""),
            literal: None,
            pos: self.cursor.position(),
            line: self.cursor.line(),
            col: self.cursor.column(),
        });
        (self.tokens, self.errors)
    }

    /// Skips spaces and tabs only — newlines are significant tokens and
    /// must never be swallowed here.
    fn skip_inline_whitespace(&mut self) {
        while matches!(self.cursor.current_char(), ' ' | '\t') {
            self.cursor.advance();
        }
    }

    fn scan_one(&mut self) {
        let start_pos = self.cursor.position();
        let start_line = self.cursor.line();
        let start_col = self.cursor.column();
        let c = self.cursor.current_char();

        if c == '\n' || c == '\r' {
            self.cursor.advance();
            if c == '\r' && self.cursor.current_char() == '\n' {
                self.cursor.advance();
            }
            self.emit(TokenKind::Newline, "\n", None, start_pos, start_line, start_col);
            return;
        }

        if identifier::is_ident_start(c) {
            let (kind, lexeme) = identifier::scan(&mut self.cursor);
            self.emit(kind, &lexeme, None, start_pos, start_line, start_col);
            return;
        }

        if c.is_ascii_digit() {
            match number::scan(&mut self.cursor) {
                Ok((lexeme, value)) => self.emit(
                    TokenKind::Number,
                    &lexeme,
                    Some(Literal::Int(value)),
                    start_pos,
                    start_line,
                    start_col,
                ),
                Err(()) => {
                    self.errors.push(LexError::LeadingZero {
                        line: start_line,
                        col: start_col,
                    });
                    // Recover with a zero-valued token so the caller still
                    // gets a complete token stream to walk.
                    self.emit(
                        TokenKind::Number,
                        "0",
                        Some(Literal::Int(0)),
                        start_pos,
                        start_line,
                        start_col,
                    );
                }
            }
            return;
        }

        if c == '"' {
            match string::scan(&mut self.cursor) {
                Ok((lexeme, value)) => self.emit(
                    TokenKind::String,
                    &lexeme,
                    Some(Literal::Str(value)),
                    start_pos,
                    start_line,
                    start_col,
                ),
                Err(()) => self.errors.push(LexError::UnterminatedString {
                    line: start_line,
                    col: start_col,
                }),
            }
            return;
        }

        if let Some((kind, lexeme)) = operator::scan(&mut self.cursor) {
            self.emit(kind, &lexeme, None, start_pos, start_line, start_col);
            return;
        }

        self.errors.push(LexError::UnexpectedChar {
            line: start_line,
            col: start_col,
            ch: c,
        });
        self.cursor.advance();
    }

    fn emit(
        &mut self,
        kind: TokenKind,
        lexeme: &str,
        literal: Option<Literal>,
        pos: usize,
        line: u32,
        col: u32,
    ) {
        self.at_line_start = kind == TokenKind::Newline;
        self.tokens.push(Token {
            kind,
            lexeme: Symbol::intern(lexeme),
            literal,
            pos,
            line,
            col,
        });
    }
}

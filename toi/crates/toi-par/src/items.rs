//! Function and type declarations (spec §4.C).
//!
//! Both share a shape: a fixed-size list of names, then a body (a brace
//! block for functions, nothing executable for types). Declaring either
//! registers it in `declared_functions`/`declared_types` *before* the
//! function body is parsed, so a function can call itself.

use crate::ast::*;
use crate::{ParseError, Parser};
use toi_lex::TokenKind;
use toi_util::builtins;
use toi_util::symbol::Symbol;

const MAX_ARITY: usize = 50;
const MAX_FIELDS: usize = 50;

impl Parser {
    /// `name | param1 param2 … | [outParam] { BODY }`. Distinguished from
    /// an assignment or call by the two-token lookahead (identifier then
    /// `|`), matching the "no more than two tokens of lookahead"
    /// invariant of spec §3.
    pub(crate) fn looks_like_function_decl(&self) -> bool {
        self.peek_kind() == TokenKind::Identifier && self.peek_at(1) == TokenKind::Pipe
    }

    pub(crate) fn parse_function_decl(&mut self) -> Result<Statement, ParseError> {
        let name_tok = self.expect(TokenKind::Identifier, "function name")?;
        let name = name_tok.lexeme;
        self.check_name_available(name, name_tok.span())?;

        self.expect(TokenKind::Pipe, "`|`")?;
        let mut params = Vec::new();
        while self.check(TokenKind::Identifier) {
            let tok = self.advance();
            if params.contains(&tok.lexeme) {
                return Err(ParseError {
                    line: tok.line,
                    col: tok.col,
                    message: format!("duplicate parameter `{}`", tok.lexeme.as_str()),
                });
            }
            params.push(tok.lexeme);
        }
        self.expect(TokenKind::Pipe, "`|`")?;

        if params.len() > MAX_ARITY {
            return Err(ParseError {
                line: name_tok.line,
                col: name_tok.col,
                message: format!(
                    "function `{}` declares {} parameters, exceeding the maximum of {}",
                    name.as_str(),
                    params.len(),
                    MAX_ARITY
                ),
            });
        }

        let out_param = if self.check(TokenKind::Identifier) {
            let tok = self.advance();
            if params.contains(&tok.lexeme) {
                return Err(ParseError {
                    line: tok.line,
                    col: tok.col,
                    message: format!(
                        "out-variable `{}` collides with a parameter name",
                        tok.lexeme.as_str()
                    ),
                });
            }
            Some(tok.lexeme)
        } else {
            None
        };

        self.declared_functions.insert(name, params.len());

        self.function_depth += 1;
        let body = self.parse_block()?;
        self.function_depth -= 1;

        let span = self.span_from(name_tok.span());
        Ok(Statement::FunctionDecl {
            name,
            params,
            out_param,
            body,
            span,
        })
    }

    /// `type Name { field1 field2 … }`.
    pub(crate) fn parse_type_decl(&mut self) -> Result<Statement, ParseError> {
        let type_tok = self.expect(TokenKind::Type, "`type`")?;
        let name_tok = self.expect(TokenKind::Identifier, "type name")?;
        let name = name_tok.lexeme;
        self.check_name_available(name, name_tok.span())?;

        self.expect(TokenKind::LBrace, "`{`")?;
        let mut fields = Vec::new();
        while self.check(TokenKind::Identifier) {
            let tok = self.advance();
            if fields.contains(&tok.lexeme) {
                return Err(ParseError {
                    line: tok.line,
                    col: tok.col,
                    message: format!("duplicate field `{}`", tok.lexeme.as_str()),
                });
            }
            fields.push(tok.lexeme);
        }
        let close = self.expect(TokenKind::RBrace, "`}`")?;

        if fields.is_empty() {
            return Err(ParseError {
                line: name_tok.line,
                col: name_tok.col,
                message: format!("type `{}` must declare at least one field", name.as_str()),
            });
        }
        if fields.len() > MAX_FIELDS {
            return Err(ParseError {
                line: name_tok.line,
                col: name_tok.col,
                message: format!(
                    "type `{}` declares {} fields, exceeding the maximum of {}",
                    name.as_str(),
                    fields.len(),
                    MAX_FIELDS
                ),
            });
        }

        self.declared_types.insert(name, fields.len());

        let span = type_tok.span().merge(close.span());
        Ok(Statement::TypeDecl { name, fields, span })
    }

    fn check_name_available(&self, name: Symbol, span: toi_util::span::Span) -> Result<(), ParseError> {
        if builtins::is_builtin(name.as_str()) {
            return Err(ParseError {
                line: span.line,
                col: span.column,
                message: format!("`{}` is a builtin and cannot be redeclared", name.as_str()),
            });
        }
        if self.declared_functions.contains_key(&name) || self.declared_types.contains_key(&name) {
            return Err(ParseError {
                line: span.line,
                col: span.column,
                message: format!("`{}` is already declared", name.as_str()),
            });
        }
        Ok(())
    }
}

//! toi-par — recursive-descent/Pratt-hybrid parser turning a token stream
//! into a [`Statement`] tree (spec §4.C).
//!
//! The parser fails fast: the first syntactic problem aborts parsing and
//! is reported as a `(line, col, message)` triple. Recovery is not
//! attempted, matching the "Error policy" of spec §4.C.

pub mod ast;
mod expr;
mod items;
mod stmt;

pub use ast::*;

use std::collections::HashMap;
use toi_lex::{Token, TokenKind};
use toi_util::span::Span;
use toi_util::symbol::Symbol;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{line}:{col}: {message}")]
pub struct ParseError {
    pub line: u32,
    pub col: u32,
    pub message: String,
}

/// A call to a name the parser has not yet seen declared, recorded for
/// resolution once the whole file has been parsed (spec §4.C, "Call
/// resolution"; spec §9, "Forward function references").
struct ForwardCall {
    name: Symbol,
    arity: usize,
    span: Span,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    declared_functions: HashMap<Symbol, usize>,
    declared_types: HashMap<Symbol, usize>,
    forward_calls: Vec<ForwardCall>,
    loop_depth: u32,
    function_depth: u32,
}

/// Parses a full source file's tokens into its top-level block.
pub fn parse(tokens: Vec<Token>) -> Result<Block, ParseError> {
    Parser::new(tokens).parse_program()
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            declared_functions: HashMap::new(),
            declared_types: HashMap::new(),
            forward_calls: Vec::new(),
            loop_depth: 0,
            function_depth: 0,
        }
    }

    fn parse_program(mut self) -> Result<Block, ParseError> {
        let mut block = self.parse_statements_until_eof()?;
        self.resolve_forward_calls(&mut block)?;
        Ok(block)
    }

    fn parse_statements_until_eof(&mut self) -> Result<Block, ParseError> {
        let mut statements = Vec::new();
        self.skip_newlines();
        while !self.at_end() {
            statements.push(self.parse_statement()?);
            self.skip_newlines();
        }
        Ok(statements)
    }

    /// Checks every recorded forward call against the final function/type
    /// tables. A forward call that resolves to a declared type named a
    /// constructor the parser could not have known about at the call
    /// site, so its node's `CallKind` (set to `User` provisionally when
    /// recorded) is patched to `Constructor` here.
    fn resolve_forward_calls(&mut self, block: &mut Block) -> Result<(), ParseError> {
        let mut constructor_spans: Vec<Span> = Vec::new();
        for call in &self.forward_calls {
            match self.declared_functions.get(&call.name) {
                Some(arity) if *arity == call.arity => {}
                Some(arity) => {
                    return Err(ParseError {
                        line: call.span.line,
                        col: call.span.column,
                        message: format!(
                            "function `{}` called with {} argument(s), declared with {}",
                            call.name.as_str(),
                            call.arity,
                            arity
                        ),
                    });
                }
                None => {
                    if let Some(fields) = self.declared_types.get(&call.name) {
                        if *fields == call.arity {
                            constructor_spans.push(call.span);
                            continue;
                        }
                        return Err(ParseError {
                            line: call.span.line,
                            col: call.span.column,
                            message: format!(
                                "type `{}` constructed with {} argument(s), declared with {} field(s)",
                                call.name.as_str(),
                                call.arity,
                                fields
                            ),
                        });
                    }
                    return Err(ParseError {
                        line: call.span.line,
                        col: call.span.column,
                        message: format!("undefined function or type `{}`", call.name.as_str()),
                    });
                }
            }
        }
        if !constructor_spans.is_empty() {
            for stmt in block.iter_mut() {
                patch_constructor_calls(stmt, &constructor_spans);
            }
        }
        Ok(())
    }

    // --- token cursor -----------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos];
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!(
                "expected {}, found `{}`",
                what,
                self.peek().lexeme.as_str()
            )))
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    /// Every non-block statement must be followed by `Newline` or `}`
    /// (spec §4.C).
    fn expect_statement_end(&mut self) -> Result<(), ParseError> {
        if self.check(TokenKind::Newline) {
            self.advance();
            Ok(())
        } else if self.check(TokenKind::RBrace) || self.at_end() {
            Ok(())
        } else {
            Err(self.error_here(format!(
                "expected end of statement, found `{}`",
                self.peek().lexeme.as_str()
            )))
        }
    }

    fn error_here(&self, message: String) -> ParseError {
        let tok = self.peek();
        ParseError {
            line: tok.line,
            col: tok.col,
            message,
        }
    }

    /// Merges `start` with the span of the token just consumed. Call
    /// after finishing a node to cover it end-to-end.
    fn span_from(&self, start: Span) -> Span {
        let last = self.pos.saturating_sub(1);
        start.merge(self.tokens[last].span())
    }
}

fn patch_constructor_calls(stmt: &mut Statement, spans: &[Span]) {
    match stmt {
        Statement::Block(stmts, _) => {
            for s in stmts.iter_mut() {
                patch_constructor_calls(s, spans);
            }
        }
        Statement::If {
            cond,
            then_branch,
            else_branch,
            ..
        } => {
            patch_constructor_calls_expr(cond, spans);
            for s in then_branch.iter_mut() {
                patch_constructor_calls(s, spans);
            }
            if let Some(else_branch) = else_branch {
                for s in else_branch.iter_mut() {
                    patch_constructor_calls(s, spans);
                }
            }
        }
        Statement::While {
            cond,
            body,
            after_body,
            ..
        } => {
            patch_constructor_calls_expr(cond, spans);
            for s in body.iter_mut() {
                patch_constructor_calls(s, spans);
            }
            if let Some(after_body) = after_body {
                for s in after_body.iter_mut() {
                    patch_constructor_calls(s, spans);
                }
            }
        }
        Statement::FunctionDecl { body, .. } => {
            for s in body.iter_mut() {
                patch_constructor_calls(s, spans);
            }
        }
        Statement::Assign { expr, .. } => patch_constructor_calls_expr(expr, spans),
        Statement::FieldAssign { target, expr, .. } => {
            patch_constructor_calls_expr(target, spans);
            patch_constructor_calls_expr(expr, spans);
        }
        Statement::ExprStmt(expr) => patch_constructor_calls_expr(expr, spans),
        Statement::ExitLoop(_)
        | Statement::NextIteration(_)
        | Statement::ExitFunction(_)
        | Statement::TypeDecl { .. } => {}
    }
}

fn patch_constructor_calls_expr(expr: &mut Expression, spans: &[Span]) {
    match expr {
        Expression::Literal(..) | Expression::Variable(..) => {}
        Expression::Binary { left, right, .. } => {
            patch_constructor_calls_expr(left, spans);
            patch_constructor_calls_expr(right, spans);
        }
        Expression::FunctionCall { args, kind, span, .. } => {
            for a in args.iter_mut() {
                patch_constructor_calls_expr(a, spans);
            }
            if *kind == CallKind::User && spans.contains(span) {
                *kind = CallKind::Constructor;
            }
        }
        Expression::ContainerAccess { container, index, .. } => {
            patch_constructor_calls_expr(container, spans);
            patch_constructor_calls_expr(index, spans);
        }
        Expression::FieldAccess { target, .. } => {
            patch_constructor_calls_expr(target, spans);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toi_lex::tokenize;

    fn parse_ok(src: &str) -> Block {
        let (tokens, errors) = tokenize(src);
        assert!(errors.is_empty(), "lex errors: {errors:?}");
        parse(tokens).unwrap_or_else(|e| panic!("parse error: {e}"))
    }

    #[test]
    fn simple_assignment_parses() {
        let block = parse_ok("x = 1\n");
        assert_eq!(block.len(), 1);
        assert!(matches!(block[0], Statement::Assign { .. }));
    }

    #[test]
    fn forward_reference_to_later_function_resolves() {
        let block = parse_ok("println(add(1, 2))\nadd | a b | r { r = a + b }\n");
        assert_eq!(block.len(), 2);
    }

    #[test]
    fn arity_mismatch_on_forward_call_is_an_error() {
        let (tokens, _) = tokenize("println(add(1))\nadd | a b | r { r = a + b }\n");
        let err = parse(tokens).unwrap_err();
        assert!(err.message.contains("add"));
    }

    #[test]
    fn exit_loop_must_be_followed_by_newline_or_brace() {
        let (tokens, _) = tokenize("while 1 {\nexit loop x = 1\n}\n");
        assert!(parse(tokens).is_err());
    }

    #[test]
    fn undefined_call_is_an_error() {
        let (tokens, _) = tokenize("x = mystery(1)\n");
        let err = parse(tokens).unwrap_err();
        assert!(err.message.contains("mystery"));
    }

    /// `==` is one tier looser than `<>` (spec §4.C lists them as two of
    /// the fourteen tiers, not one merged tier), so `a == b <> c` groups
    /// as `a == (b <> c)`, not `(a == b) <> c`.
    #[test]
    fn equal_equal_is_looser_than_not_equal() {
        let block = parse_ok("x = a == b <> c\n");
        let Statement::Assign { expr, .. } = &block[0] else {
            panic!("expected an assignment");
        };
        let Expression::Binary { op: BinOp::Eq, right, .. } = expr else {
            panic!("expected top-level `==`, got {expr:?}");
        };
        assert!(matches!(**right, Expression::Binary { op: BinOp::NotEq, .. }));
    }
}

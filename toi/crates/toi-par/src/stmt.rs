//! Statement parsing (spec §4.C).

use crate::ast::*;
use crate::{ParseError, Parser};
use toi_lex::TokenKind;
use toi_util::symbol::Symbol;

impl Parser {
    /// `{ stmt* }`, with newlines used purely as statement separators and
    /// skipped both around and between statements.
    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.expect(TokenKind::LBrace, "`{`")?;
        self.skip_newlines();
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) {
            if self.at_end() {
                return Err(self.error_here("unterminated block, expected `}`".into()));
            }
            statements.push(self.parse_statement()?);
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "`}`")?;
        Ok(statements)
    }

    pub(crate) fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek_kind() {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Exit => self.parse_exit(),
            TokenKind::Next => self.parse_next_iteration(),
            TokenKind::Type => self.parse_type_decl(),
            _ if self.looks_like_function_decl() => self.parse_function_decl(),
            _ => self.parse_assignment_or_expr(),
        }
    }

    fn parse_if(&mut self) -> Result<Statement, ParseError> {
        let start = self.expect(TokenKind::If, "`if`")?.span();
        let cond = self.parse_expression()?;
        let then_branch = self.parse_block()?;

        let else_branch = if self.check(TokenKind::Otherwise) {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };

        let span = self.span_from(start);
        Ok(Statement::If {
            cond,
            then_branch,
            else_branch,
            span,
        })
    }

    fn parse_while(&mut self) -> Result<Statement, ParseError> {
        let start = self.expect(TokenKind::While, "`while`")?.span();
        let cond = self.parse_expression()?;

        self.loop_depth += 1;
        let body = self.parse_block()?;
        self.loop_depth -= 1;

        let span = self.span_from(start);
        Ok(Statement::While {
            cond,
            body,
            after_body: None,
            span,
        })
    }

    /// `for value = [container] key { BODY }` desugars per spec §4.C into
    /// a block that captures the container and its keys, then a `while`
    /// whose `after_body` advances the index — see [`Statement::While`].
    fn parse_for(&mut self) -> Result<Statement, ParseError> {
        let start = self.expect(TokenKind::For, "`for`")?.span();
        let value_tok = self.expect(TokenKind::Identifier, "loop value name")?;
        let value_name = value_tok.lexeme;
        self.expect(TokenKind::Equal, "`=`")?;
        self.expect(TokenKind::LBracket, "`[`")?;
        let container_expr = self.parse_expression()?;
        self.expect(TokenKind::RBracket, "`]`")?;
        let key_tok = self.expect(TokenKind::Identifier, "loop key name")?;
        let key_name = key_tok.lexeme;

        self.loop_depth += 1;
        let user_body = self.parse_block()?;
        self.loop_depth -= 1;

        let span = self.span_from(start);

        let container_sym = Symbol::intern("_for_container");
        let keys_sym = Symbol::intern("_for_keys");
        let index_sym = Symbol::intern("_for_index");

        let assign_container = Statement::Assign {
            name: container_sym,
            expr: container_expr,
            span,
        };
        let assign_keys = Statement::Assign {
            name: keys_sym,
            expr: self.call1("keys", Expression::Variable(container_sym, span), span),
            span,
        };
        let assign_index = Statement::Assign {
            name: index_sym,
            expr: Expression::Literal(LiteralValue::Int(0), span),
            span,
        };

        let cond = Expression::Binary {
            op: BinOp::Lt,
            left: Box::new(Expression::Variable(index_sym, span)),
            right: Box::new(self.call1(
                "len",
                Expression::Variable(keys_sym, span),
                span,
            )),
            span,
        };

        let assign_key = Statement::Assign {
            name: key_name,
            expr: self.call2(
                "get",
                Expression::Variable(keys_sym, span),
                Expression::Variable(index_sym, span),
                span,
            ),
            span,
        };
        let assign_value = Statement::Assign {
            name: value_name,
            expr: self.call2(
                "get",
                Expression::Variable(container_sym, span),
                Expression::Variable(key_name, span),
                span,
            ),
            span,
        };

        let mut body = vec![assign_key, assign_value];
        body.extend(user_body);

        let after_body = vec![Statement::Assign {
            name: index_sym,
            expr: Expression::Binary {
                op: BinOp::Add,
                left: Box::new(Expression::Variable(index_sym, span)),
                right: Box::new(Expression::Literal(LiteralValue::Int(1), span)),
                span,
            },
            span,
        }];

        let while_stmt = Statement::While {
            cond,
            body,
            after_body: Some(after_body),
            span,
        };

        Ok(Statement::Block(
            vec![assign_container, assign_keys, assign_index, while_stmt],
            span,
        ))
    }

    fn call1(&self, name: &str, arg: Expression, span: toi_util::span::Span) -> Expression {
        Expression::FunctionCall {
            name: Symbol::intern(name),
            args: vec![arg],
            kind: CallKind::Builtin,
            span,
        }
    }

    fn call2(
        &self,
        name: &str,
        a: Expression,
        b: Expression,
        span: toi_util::span::Span,
    ) -> Expression {
        Expression::FunctionCall {
            name: Symbol::intern(name),
            args: vec![a, b],
            kind: CallKind::Builtin,
            span,
        }
    }

    fn parse_exit(&mut self) -> Result<Statement, ParseError> {
        let start = self.expect(TokenKind::Exit, "`exit`")?.span();
        if self.matches(TokenKind::Loop) {
            if self.loop_depth == 0 {
                return Err(ParseError {
                    line: start.line,
                    col: start.column,
                    message: "`exit loop` outside of a loop".into(),
                });
            }
            let span = self.span_from(start);
            self.expect_statement_end()?;
            Ok(Statement::ExitLoop(span))
        } else if self.matches(TokenKind::Function) {
            if self.function_depth == 0 {
                return Err(ParseError {
                    line: start.line,
                    col: start.column,
                    message: "`exit function` outside of a function".into(),
                });
            }
            let span = self.span_from(start);
            self.expect_statement_end()?;
            Ok(Statement::ExitFunction(span))
        } else {
            Err(self.error_here("expected `loop` or `function` after `exit`".into()))
        }
    }

    fn parse_next_iteration(&mut self) -> Result<Statement, ParseError> {
        let start = self.expect(TokenKind::Next, "`next`")?.span();
        self.expect(TokenKind::Iteration, "`iteration`")?;
        if self.loop_depth == 0 {
            return Err(ParseError {
                line: start.line,
                col: start.column,
                message: "`next iteration` outside of a loop".into(),
            });
        }
        let span = self.span_from(start);
        self.expect_statement_end()?;
        Ok(Statement::NextIteration(span))
    }

    /// Parses an expression and, if followed by `=`, rewrites it into an
    /// assignment: a bare identifier becomes `Assign`, a container access
    /// becomes a `set(...)` call (spec §3, "the AST contains no 'l-value'
    /// concept"), and a field access becomes `FieldAssign`.
    fn parse_assignment_or_expr(&mut self) -> Result<Statement, ParseError> {
        let expr = self.parse_expression()?;
        let stmt = if self.matches(TokenKind::Equal) {
            let rhs = self.parse_expression()?;
            let span = expr.span().merge(rhs.span());
            match expr {
                Expression::Variable(name, _) => Statement::Assign {
                    name,
                    expr: rhs,
                    span,
                },
                Expression::ContainerAccess {
                    container, index, ..
                } => Statement::ExprStmt(Expression::FunctionCall {
                    name: Symbol::intern("set"),
                    args: vec![*container, *index, rhs],
                    kind: CallKind::Builtin,
                    span,
                }),
                Expression::FieldAccess { target, field, .. } => Statement::FieldAssign {
                    target: *target,
                    field,
                    expr: rhs,
                    span,
                },
                _ => {
                    return Err(ParseError {
                        line: span.line,
                        col: span.column,
                        message: "invalid assignment target".into(),
                    })
                }
            }
        } else {
            Statement::ExprStmt(expr)
        };

        self.expect_statement_end()?;
        Ok(stmt)
    }
}

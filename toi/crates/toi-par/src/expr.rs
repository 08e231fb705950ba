//! Expression parsing — precedence climbing over the fourteen tiers of
//! spec §4.C, bottoming out at the primary level (literals, identifiers,
//! calls, parenthesized expressions, container/field access chains).

use crate::ast::*;
use crate::{ForwardCall, ParseError, Parser};
use toi_lex::{Literal, TokenKind};
use toi_util::builtins;
use toi_util::span::Span;
use toi_util::symbol::Symbol;

/// Precedence tiers, loosest to tightest, matching spec §4.C. Container
/// access and field access are handled separately in
/// [`Parser::parse_container_or_field`], one tier tighter than any of
/// these.
#[derive(Clone, Copy, PartialEq)]
enum Prec {
    Or,
    And,
    Bor,
    Xor,
    Band,
    Eq,        // ==
    NotEq,     // <>
    Greater,   // >
    GreaterEq, // >=
    Less,      // <
    LessEq,    // <=
    Additive,  // + -
    Multiplic, // * / %
    Concat,    // _
}

impl Prec {
    fn next(self) -> Option<Prec> {
        use Prec::*;
        Some(match self {
            Or => And,
            And => Bor,
            Bor => Xor,
            Xor => Band,
            Band => Eq,
            Eq => NotEq,
            NotEq => Greater,
            Greater => GreaterEq,
            GreaterEq => Less,
            Less => LessEq,
            LessEq => Additive,
            Additive => Multiplic,
            Multiplic => Concat,
            Concat => return None,
        })
    }

    /// Binary operator accepted at this tier, if the current token is one.
    fn op_for(self, kind: TokenKind) -> Option<BinOp> {
        use TokenKind::*;
        match (self, kind) {
            (Prec::Or, Or) => Some(BinOp::Or),
            (Prec::And, And) => Some(BinOp::And),
            (Prec::Bor, Bor) => Some(BinOp::BOr),
            (Prec::Xor, Xor) => Some(BinOp::Xor),
            (Prec::Band, Band) => Some(BinOp::BAnd),
            (Prec::Eq, EqualEqual) => Some(BinOp::Eq),
            (Prec::NotEq, NotEqual) => Some(BinOp::NotEq),
            (Prec::Greater, Greater) => Some(BinOp::Gt),
            (Prec::GreaterEq, GreaterEqual) => Some(BinOp::Ge),
            (Prec::Less, Less) => Some(BinOp::Lt),
            (Prec::LessEq, LessEqual) => Some(BinOp::Le),
            (Prec::Additive, Plus) => Some(BinOp::Add),
            (Prec::Additive, Minus) => Some(BinOp::Sub),
            (Prec::Multiplic, Star) => Some(BinOp::Mul),
            (Prec::Multiplic, Slash) => Some(BinOp::Div),
            (Prec::Multiplic, Percent) => Some(BinOp::Rem),
            (Prec::Concat, Concat) => Some(BinOp::Concat),
            _ => None,
        }
    }
}

impl Parser {
    pub(crate) fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_tier(Prec::Or)
    }

    /// Climbs one precedence tier, left-associating operators found at
    /// that tier, then recursing to the next-tighter tier for operands.
    fn parse_tier(&mut self, tier: Prec) -> Result<Expression, ParseError> {
        let next = tier.next();
        let mut left = self.parse_operand(next)?;

        while let Some(op) = tier.op_for(self.peek_kind()) {
            self.advance();
            let right = self.parse_operand(next)?;
            let span = left.span().merge(right.span());
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    fn parse_operand(&mut self, next: Option<Prec>) -> Result<Expression, ParseError> {
        match next {
            Some(next) => self.parse_tier(next),
            None => self.parse_container_or_field(),
        }
    }

    /// Container access (`[…]`) and field access (`.ident`), the two
    /// tightest tiers short of a bare primary.
    fn parse_container_or_field(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.check(TokenKind::LBracket) {
                self.advance();
                let index = self.parse_expression()?;
                let close = self.expect(TokenKind::RBracket, "`]`")?;
                let span = expr.span().merge(close.span());
                expr = Expression::ContainerAccess {
                    container: Box::new(expr),
                    index: Box::new(index),
                    span,
                };
            } else if self.check(TokenKind::Dot) {
                self.advance();
                let name_tok = self.expect(TokenKind::Identifier, "field name")?;
                let span = expr.span().merge(name_tok.span());
                expr = Expression::FieldAccess {
                    target: Box::new(expr),
                    field: name_tok.lexeme,
                    span,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Number => {
                self.advance();
                let Some(Literal::Int(v)) = tok.literal else {
                    return Err(self.error_here("malformed number literal".into()));
                };
                Ok(Expression::Literal(LiteralValue::Int(v), tok.span()))
            }
            TokenKind::String => {
                self.advance();
                let Some(Literal::Str(s)) = tok.literal else {
                    return Err(self.error_here("malformed string literal".into()));
                };
                Ok(Expression::Literal(LiteralValue::Str(s), tok.span()))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(inner)
            }
            TokenKind::Identifier => {
                self.advance();
                if self.check(TokenKind::LParen) {
                    self.parse_call(tok.lexeme, tok.span())
                } else {
                    Ok(Expression::Variable(tok.lexeme, tok.span()))
                }
            }
            _ => Err(self.error_here(format!(
                "expected an expression, found `{}`",
                tok.lexeme.as_str()
            ))),
        }
    }

    /// Parses a call's argument list and resolves the callee: a known
    /// builtin or declared function/type is arity-checked immediately;
    /// an unresolved name is queued in `forward_calls` for resolution
    /// once the whole file has been parsed (spec §4.C "Call resolution";
    /// spec §9 "Forward function references"). A forward call that turns
    /// out to name a type is patched from `User` to `Constructor` by
    /// [`Parser::resolve_forward_calls`] once the name is known.
    fn parse_call(&mut self, name: Symbol, start_span: Span) -> Result<Expression, ParseError> {
        self.expect(TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        let close = self.expect(TokenKind::RParen, "`)`")?;
        let span = start_span.merge(close.span());
        let arity = args.len();

        let kind = if let Some(&declared_arity) = self.declared_functions.get(&name) {
            if declared_arity != arity {
                return Err(ParseError {
                    line: span.line,
                    col: span.column,
                    message: format!(
                        "function `{}` called with {} argument(s), declared with {}",
                        name.as_str(),
                        arity,
                        declared_arity
                    ),
                });
            }
            CallKind::User
        } else if let Some(&field_count) = self.declared_types.get(&name) {
            if field_count != arity {
                return Err(ParseError {
                    line: span.line,
                    col: span.column,
                    message: format!(
                        "type `{}` constructed with {} argument(s), declared with {} field(s)",
                        name.as_str(),
                        arity,
                        field_count
                    ),
                });
            }
            CallKind::Constructor
        } else if let Some(builtin_arity) = builtins::arity_of(name.as_str()) {
            if builtin_arity >= 0 && builtin_arity as usize != arity {
                return Err(ParseError {
                    line: span.line,
                    col: span.column,
                    message: format!(
                        "builtin `{}` called with {} argument(s), expects {}",
                        name.as_str(),
                        arity,
                        builtin_arity
                    ),
                });
            }
            CallKind::Builtin
        } else {
            self.forward_calls.push(ForwardCall { name, arity, span });
            CallKind::User
        };

        Ok(Expression::FunctionCall {
            name,
            args,
            kind,
            span,
        })
    }
}

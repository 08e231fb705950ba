//! The tree interpreter (spec §4.E).
//!
//! Control-flow side-exits are represented as an explicit tagged `Flow`
//! result rather than borrowing the host language's exception mechanism
//! (spec §9, "Tree interpreter control-flow sentinels"): a `while` loop
//! matches `Flow::ExitLoop` to break and `Flow::NextIteration` to run
//! `after_body` then continue; a function call matches `Flow::ExitFunction`.

use std::collections::HashMap;
use std::rc::Rc;

use toi_par::{BinOp, Block, CallKind, Expression, LiteralValue, Statement};
use toi_util::span::Span;
use toi_util::symbol::Symbol;

use crate::builtins::{self, HostIo};
use crate::env::{self, Env};
use crate::value::{TypeDef, Value};

#[derive(Debug, Clone, thiserror::Error)]
#[error("{line}:{col}: {message}")]
pub struct InterpError {
    pub line: u32,
    pub col: u32,
    pub message: String,
}

fn err_at(span: Span, message: String) -> InterpError {
    InterpError {
        line: span.line,
        col: span.column,
        message,
    }
}

/// A side-exit a statement can signal to its enclosing loop or function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Normal,
    ExitLoop,
    NextIteration,
    ExitFunction,
}

struct FuncInfo {
    params: Vec<Symbol>,
    out_param: Option<Symbol>,
    body: Rc<Block>,
}

/// Runs `block` to completion against a fresh global scope. Function and
/// type declarations are pre-registered before any statement executes, so
/// forward references resolve the same way they did at parse time (spec
/// §9, "Forward function references") regardless of where in the file a
/// call site sits relative to its declaration.
pub fn run(block: &Block, host: &mut dyn HostIo) -> Result<(), InterpError> {
    let mut interp = Interpreter {
        functions: HashMap::new(),
        types: HashMap::new(),
        global: env::new_root(),
        host,
    };
    interp.collect_decls(block);
    let global = interp.global.clone();
    interp.exec_block(block, &global)?;
    Ok(())
}

struct Interpreter<'h> {
    functions: HashMap<Symbol, Rc<FuncInfo>>,
    types: HashMap<Symbol, Rc<TypeDef>>,
    global: Env,
    host: &'h mut dyn HostIo,
}

impl<'h> Interpreter<'h> {
    fn collect_decls(&mut self, block: &Block) {
        for stmt in block {
            self.collect_decls_stmt(stmt);
        }
    }

    fn collect_decls_stmt(&mut self, stmt: &Statement) {
        match stmt {
            Statement::FunctionDecl {
                name,
                params,
                out_param,
                body,
                ..
            } => {
                self.functions.insert(
                    *name,
                    Rc::new(FuncInfo {
                        params: params.clone(),
                        out_param: *out_param,
                        body: Rc::new(body.clone()),
                    }),
                );
                self.collect_decls(body);
            }
            Statement::TypeDecl { name, fields, .. } => {
                self.types.insert(
                    *name,
                    Rc::new(TypeDef {
                        name: *name,
                        fields: fields.clone(),
                    }),
                );
            }
            Statement::Block(stmts, _) => self.collect_decls(stmts),
            Statement::If {
                then_branch,
                else_branch,
                ..
            } => {
                self.collect_decls(then_branch);
                if let Some(e) = else_branch {
                    self.collect_decls(e);
                }
            }
            Statement::While { body, after_body, .. } => {
                self.collect_decls(body);
                if let Some(a) = after_body {
                    self.collect_decls(a);
                }
            }
            _ => {}
        }
    }

    fn exec_block(&mut self, block: &Block, scope: &Env) -> Result<Flow, InterpError> {
        for stmt in block {
            let flow = self.exec_stmt(stmt, scope)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Statement, scope: &Env) -> Result<Flow, InterpError> {
        match stmt {
            Statement::Block(stmts, _) => self.exec_block(stmts, scope),
            Statement::If {
                cond,
                then_branch,
                else_branch,
                span,
            } => {
                if self.eval(cond, scope)?.truthy().map_err(|m| err_at(*span, m))? {
                    self.exec_block(then_branch, scope)
                } else if let Some(else_branch) = else_branch {
                    self.exec_block(else_branch, scope)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Statement::While {
                cond,
                body,
                after_body,
                span,
            } => loop {
                if !self.eval(cond, scope)?.truthy().map_err(|m| err_at(*span, m))? {
                    return Ok(Flow::Normal);
                }
                match self.exec_block(body, scope)? {
                    Flow::ExitLoop => return Ok(Flow::Normal),
                    Flow::ExitFunction => return Ok(Flow::ExitFunction),
                    Flow::Normal | Flow::NextIteration => {
                        if let Some(after_body) = after_body {
                            if self.exec_block(after_body, scope)? == Flow::ExitFunction {
                                return Ok(Flow::ExitFunction);
                            }
                        }
                    }
                }
            },
            Statement::ExitLoop(_) => Ok(Flow::ExitLoop),
            Statement::NextIteration(_) => Ok(Flow::NextIteration),
            Statement::ExitFunction(_) => Ok(Flow::ExitFunction),
            Statement::FunctionDecl { .. } | Statement::TypeDecl { .. } => Ok(Flow::Normal),
            Statement::Assign { name, expr, .. } => {
                let v = self.eval(expr, scope)?;
                env::set(scope, *name, v);
                Ok(Flow::Normal)
            }
            Statement::FieldAssign {
                target,
                field,
                expr,
                span,
            } => {
                let target_val = self.eval(target, scope)?;
                let value = self.eval(expr, scope)?;
                match target_val {
                    Value::Instance(ty, fields) => {
                        let idx = field_index(&ty, *field)
                            .ok_or_else(|| err_at(*span, format!("no field `{}`", field.as_str())))?;
                        fields.borrow_mut()[idx] = value;
                        Ok(Flow::Normal)
                    }
                    other => Err(err_at(
                        *span,
                        format!("cannot set a field on {}", other.type_name()),
                    )),
                }
            }
            Statement::ExprStmt(expr) => {
                self.eval(expr, scope)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn eval(&mut self, expr: &Expression, scope: &Env) -> Result<Value, InterpError> {
        match expr {
            Expression::Literal(LiteralValue::Int(i), _) => Ok(Value::Int(*i)),
            Expression::Literal(LiteralValue::Str(s), _) => Ok(Value::str(s.clone())),
            Expression::Variable(name, span) => env::get(scope, *name)
                .ok_or_else(|| err_at(*span, format!("undefined variable `{}`", name.as_str()))),
            Expression::Binary { op, left, right, span } => self.eval_binary(*op, left, right, scope, *span),
            Expression::FunctionCall { name, args, kind, span } => {
                let values = args
                    .iter()
                    .map(|a| self.eval(a, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                match kind {
                    CallKind::Builtin => {
                        builtins::call(name.as_str(), values, self.host).map_err(|m| err_at(*span, m))
                    }
                    CallKind::User => self.call_function(*name, values, *span),
                    CallKind::Constructor => self.construct(*name, values, *span),
                }
            }
            Expression::ContainerAccess { container, index, span } => {
                let c = self.eval(container, scope)?;
                let i = self.eval(index, scope)?;
                builtins::call("get", vec![c, i], self.host).map_err(|m| err_at(*span, m))
            }
            Expression::FieldAccess { target, field, span } => {
                match self.eval(target, scope)? {
                    Value::Instance(ty, fields) => {
                        let idx = field_index(&ty, *field)
                            .ok_or_else(|| err_at(*span, format!("no field `{}`", field.as_str())))?;
                        Ok(fields.borrow()[idx].clone())
                    }
                    other => Err(err_at(
                        *span,
                        format!("cannot access a field on {}", other.type_name()),
                    )),
                }
            }
        }
    }

    fn eval_binary(
        &mut self,
        op: BinOp,
        left: &Expression,
        right: &Expression,
        scope: &Env,
        span: Span,
    ) -> Result<Value, InterpError> {
        if op == BinOp::Or {
            let l = self.eval(left, scope)?;
            return if l.truthy().map_err(|m| err_at(span, m))? {
                Ok(l)
            } else {
                self.eval(right, scope)
            };
        }
        if op == BinOp::And {
            let l = self.eval(left, scope)?;
            return if !l.truthy().map_err(|m| err_at(span, m))? {
                Ok(l)
            } else {
                self.eval(right, scope)
            };
        }

        let l = self.eval(left, scope)?;
        let r = self.eval(right, scope)?;
        let to_err = |m: String| err_at(span, m);

        match op {
            BinOp::Add => Ok(Value::Int(l.as_int().map_err(to_err)? + r.as_int().map_err(to_err)?)),
            BinOp::Sub => Ok(Value::Int(l.as_int().map_err(to_err)? - r.as_int().map_err(to_err)?)),
            BinOp::Mul => Ok(Value::Int(l.as_int().map_err(to_err)? * r.as_int().map_err(to_err)?)),
            BinOp::Div => {
                let (a, b) = (l.as_int().map_err(to_err)?, r.as_int().map_err(to_err)?);
                if b == 0 {
                    return Err(err_at(span, "division by zero".into()));
                }
                Ok(Value::Int(a / b))
            }
            BinOp::Rem => {
                let (a, b) = (l.as_int().map_err(to_err)?, r.as_int().map_err(to_err)?);
                if b == 0 {
                    return Err(err_at(span, "division by zero".into()));
                }
                Ok(Value::Int(a % b))
            }
            BinOp::Concat => {
                let (a, b) = (l.as_str().map_err(to_err)?, r.as_str().map_err(to_err)?);
                Ok(Value::str(format!("{a}{b}")))
            }
            BinOp::Eq => Ok(Value::Int((l == r) as i64)),
            BinOp::NotEq => Ok(Value::Int((l != r) as i64)),
            BinOp::Gt => Ok(Value::Int((l.as_int().map_err(to_err)? > r.as_int().map_err(to_err)?) as i64)),
            BinOp::Ge => Ok(Value::Int((l.as_int().map_err(to_err)? >= r.as_int().map_err(to_err)?) as i64)),
            BinOp::Lt => Ok(Value::Int((l.as_int().map_err(to_err)? < r.as_int().map_err(to_err)?) as i64)),
            BinOp::Le => Ok(Value::Int((l.as_int().map_err(to_err)? <= r.as_int().map_err(to_err)?) as i64)),
            BinOp::BAnd => Ok(Value::Int(l.as_int().map_err(to_err)? & r.as_int().map_err(to_err)?)),
            BinOp::BOr => Ok(Value::Int(l.as_int().map_err(to_err)? | r.as_int().map_err(to_err)?)),
            BinOp::Xor => Ok(Value::Int(l.as_int().map_err(to_err)? ^ r.as_int().map_err(to_err)?)),
            BinOp::And | BinOp::Or => unreachable!("handled above"),
        }
    }

    /// A called function's frame has no parent at all: it sees only its own
    /// parameters and locals, never the caller's or the top level's (spec
    /// §4.E). This has to match the compiled VM, which resolves
    /// `READ_VARIABLE`/`SET_VARIABLE` against a flat per-function variable
    /// table built at compile time with no link to any enclosing scope —
    /// anything looser here would make the two engines disagree on scripts
    /// where a function references a same-named top-level variable.
    fn call_function(&mut self, name: Symbol, args: Vec<Value>, span: Span) -> Result<Value, InterpError> {
        let info = self
            .functions
            .get(&name)
            .cloned()
            .ok_or_else(|| err_at(span, format!("undefined function `{}`", name.as_str())))?;

        let frame = env::new_root();
        for (param, value) in info.params.iter().zip(args) {
            env::bind_local(&frame, *param, value);
        }

        // Whatever the body's last flow was (normal fall-through or an
        // explicit `exit function`), the call boundary consumes it.
        self.exec_block(&info.body, &frame)?;

        Ok(match info.out_param {
            Some(out) => env::get(&frame, out).unwrap_or(Value::Unit),
            None => Value::Unit,
        })
    }

    fn construct(&mut self, name: Symbol, args: Vec<Value>, span: Span) -> Result<Value, InterpError> {
        let ty = self
            .types
            .get(&name)
            .cloned()
            .ok_or_else(|| err_at(span, format!("undefined type `{}`", name.as_str())))?;
        Ok(Value::Instance(ty, Rc::new(std::cell::RefCell::new(args))))
    }
}

fn field_index(ty: &TypeDef, field: Symbol) -> Option<usize> {
    ty.fields.iter().position(|f| *f == field)
}

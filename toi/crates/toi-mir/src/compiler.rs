//! The bytecode compiler (spec §4.F).
//!
//! Lowers the syntax tree produced by `toi-par` into the flat per-function
//! opcode buffers described by [`crate::program`]. Unlike the tree
//! interpreter, the compiler has no module-level or `RefCell`-shared state:
//! every piece of in-progress data (the constant pool, a function's variable
//! table, its open loops' patch lists) is threaded explicitly through
//! [`FnCompiler`], one instance per function body plus one for the top level.
//! All instances funnel into the same constant pool, so a string or int
//! literal used by two different functions is stored once (spec §4.F, "the
//! outer and inner compilers share the constant pool").

use indexmap::IndexMap;

use toi_par::{BinOp, Block, CallKind, Expression, LiteralValue, Statement};
use toi_util::span::Span;
use toi_util::symbol::Symbol;

use crate::opcode::{BinaryOp, Op, MAX_CONSTANTS, MAX_JUMP};
use crate::program::{CompiledFunction, CompiledProgram, CompiledType, Constant};

#[derive(Debug, Clone, thiserror::Error)]
#[error("{line}:{col}: {message}")]
pub struct CompileError {
    pub line: u32,
    pub col: u32,
    pub message: String,
}

fn err_at(span: Span, message: String) -> CompileError {
    CompileError {
        line: span.line,
        col: span.column,
        message,
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Lowers a parsed program to a [`CompiledProgram`] (spec §4.F).
///
/// Function and type declarations are collected first, exactly as the tree
/// interpreter hoists them (spec §9, "Forward function references"), so a
/// function compiled earlier in `functions`' iteration order can still be
/// called by name from code compiled later — name resolution for
/// `CALL_FUNCTION`/`INSTANTIATE` happens at run time against the VM's
/// function/type tables, never against compile-time declaration order.
pub fn compile(block: &Block) -> CompileResult<CompiledProgram> {
    let mut decl_functions: IndexMap<Symbol, FuncDeclInfo<'_>> = IndexMap::new();
    let mut types: IndexMap<Symbol, CompiledType> = IndexMap::new();
    collect_decls(block, &mut decl_functions, &mut types);

    let mut constants: Vec<Constant> = Vec::new();
    let mut functions: IndexMap<Symbol, CompiledFunction> = IndexMap::new();
    for (name, info) in &decl_functions {
        let compiled = compile_function(info, &mut constants)?;
        functions.insert(*name, compiled);
    }

    let mut top = FnCompiler::new(&mut constants, &[], None);
    top.compile_block(block)?;
    top.patch_exit_function(Span::point(0, 0))?;

    Ok(CompiledProgram {
        constants,
        functions,
        types,
        top_level_variables: top.variables,
        top_level_code: top.code,
    })
}

struct FuncDeclInfo<'a> {
    params: Vec<Symbol>,
    out_param: Option<Symbol>,
    body: &'a Block,
}

fn collect_decls<'a>(
    block: &'a Block,
    functions: &mut IndexMap<Symbol, FuncDeclInfo<'a>>,
    types: &mut IndexMap<Symbol, CompiledType>,
) {
    for stmt in block {
        collect_decls_stmt(stmt, functions, types);
    }
}

fn collect_decls_stmt<'a>(
    stmt: &'a Statement,
    functions: &mut IndexMap<Symbol, FuncDeclInfo<'a>>,
    types: &mut IndexMap<Symbol, CompiledType>,
) {
    match stmt {
        Statement::FunctionDecl {
            name,
            params,
            out_param,
            body,
            ..
        } => {
            functions.insert(
                *name,
                FuncDeclInfo {
                    params: params.clone(),
                    out_param: *out_param,
                    body,
                },
            );
            collect_decls(body, functions, types);
        }
        Statement::TypeDecl { name, fields, .. } => {
            types.insert(
                *name,
                CompiledType {
                    fields: fields.clone(),
                },
            );
        }
        Statement::Block(stmts, _) => collect_decls(stmts, functions, types),
        Statement::If {
            then_branch,
            else_branch,
            ..
        } => {
            collect_decls(then_branch, functions, types);
            if let Some(e) = else_branch {
                collect_decls(e, functions, types);
            }
        }
        Statement::While { body, after_body, .. } => {
            collect_decls(body, functions, types);
            if let Some(a) = after_body {
                collect_decls(a, functions, types);
            }
        }
        _ => {}
    }
}

fn compile_function(info: &FuncDeclInfo<'_>, constants: &mut Vec<Constant>) -> CompileResult<CompiledFunction> {
    let mut fc = FnCompiler::new(constants, &info.params, info.out_param);
    fc.compile_block(info.body)?;
    fc.patch_exit_function(Span::point(0, 0))?;
    Ok(CompiledFunction {
        params: info.params.clone(),
        out_param: info.out_param,
        variables: fc.variables,
        code: fc.code,
    })
}

/// One open `while` loop's patch lists: `exit loop` always forward-jumps past
/// the whole loop; `next iteration` forward-jumps to `afterBody` when the
/// loop desugared from a `for` has one, or back-jumps straight to the
/// condition for a plain `while` (spec §4.F).
struct LoopFrame {
    cond_start: usize,
    has_after_body: bool,
    exit_patches: Vec<usize>,
    continue_patches: Vec<usize>,
}

/// Compiles one function body (or the top level) into a flat opcode buffer.
///
/// `params` is fixed before compilation starts; `variables` grows as
/// `Assign` statements are compiled, in the order each name is first
/// assigned. A variable's index into `READ_VARIABLE`/`SET_VARIABLE` is its
/// position in `params` followed by its position in `variables` — matching
/// the way [`CompiledFunction`] keeps the two lists separate (and the
/// serialized format writes them as separate sections, spec §6).
struct FnCompiler<'c> {
    constants: &'c mut Vec<Constant>,
    params: Vec<Symbol>,
    variables: Vec<Symbol>,
    code: Vec<u8>,
    loops: Vec<LoopFrame>,
    exit_function_patches: Vec<usize>,
}

impl<'c> FnCompiler<'c> {
    fn new(constants: &'c mut Vec<Constant>, params: &[Symbol], out_param: Option<Symbol>) -> Self {
        let mut variables = Vec::new();
        if let Some(out) = out_param {
            variables.push(out);
        }
        Self {
            constants,
            params: params.to_vec(),
            variables,
            code: Vec::new(),
            loops: Vec::new(),
            exit_function_patches: Vec::new(),
        }
    }

    fn patch_exit_function(&mut self, span: Span) -> CompileResult<()> {
        let end = self.code.len();
        let patches = std::mem::take(&mut self.exit_function_patches);
        for p in patches {
            self.patch_jump(p, end, span)?;
        }
        Ok(())
    }

    fn compile_block(&mut self, block: &Block) -> CompileResult<()> {
        for stmt in block {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    fn compile_stmt(&mut self, stmt: &Statement) -> CompileResult<()> {
        match stmt {
            Statement::Block(stmts, _) => self.compile_block(stmts),
            Statement::If {
                cond,
                then_branch,
                else_branch,
                span,
            } => self.compile_if(cond, then_branch, else_branch.as_ref(), *span),
            Statement::While {
                cond,
                body,
                after_body,
                span,
            } => self.compile_while(cond, body, after_body.as_ref(), *span),
            Statement::ExitLoop(span) => self.compile_exit_loop(*span),
            Statement::NextIteration(span) => self.compile_next_iteration(*span),
            Statement::ExitFunction(_) => {
                self.emit_exit_function();
                Ok(())
            }
            Statement::FunctionDecl { .. } | Statement::TypeDecl { .. } => Ok(()),
            Statement::Assign { name, expr, span } => {
                self.compile_expr(expr)?;
                let idx = self.declare_variable(*name, *span)?;
                self.emit_u8(Op::SetVariable, idx as u8);
                Ok(())
            }
            Statement::FieldAssign {
                target,
                field,
                expr,
                span,
            } => {
                self.compile_expr(target)?;
                self.compile_expr(expr)?;
                let idx = self.ensure_name_constant(field.as_str(), *span)?;
                self.emit_u8(Op::SetField, idx);
                Ok(())
            }
            Statement::ExprStmt(expr) => {
                self.compile_expr(expr)?;
                self.code.push(Op::Pop.byte());
                Ok(())
            }
        }
    }

    fn compile_if(
        &mut self,
        cond: &Expression,
        then_branch: &Block,
        else_branch: Option<&Block>,
        span: Span,
    ) -> CompileResult<()> {
        self.compile_expr(cond)?;
        let jif = self.emit_jump(Op::JumpIfFalse);
        self.compile_block(then_branch)?;
        if let Some(else_b) = else_branch {
            let jfwd = self.emit_jump(Op::JumpForward);
            let else_start = self.code.len();
            self.patch_jump(jif, else_start, span)?;
            self.compile_block(else_b)?;
            let end = self.code.len();
            self.patch_jump(jfwd, end, span)?;
        } else {
            let end = self.code.len();
            self.patch_jump(jif, end, span)?;
        }
        Ok(())
    }

    fn compile_while(
        &mut self,
        cond: &Expression,
        body: &Block,
        after_body: Option<&Block>,
        span: Span,
    ) -> CompileResult<()> {
        let cond_start = self.code.len();
        self.compile_expr(cond)?;
        let jif = self.emit_jump(Op::JumpIfFalse);
        self.loops.push(LoopFrame {
            cond_start,
            has_after_body: after_body.is_some(),
            exit_patches: Vec::new(),
            continue_patches: Vec::new(),
        });
        self.compile_block(body)?;
        let after_start = self.code.len();
        if let Some(ab) = after_body {
            self.compile_block(ab)?;
        }
        let frame = self.loops.pop().expect("pushed immediately above");
        for p in frame.continue_patches {
            self.patch_jump(p, after_start, span)?;
        }
        self.emit_jump_back(cond_start, span)?;
        let loop_end = self.code.len();
        self.patch_jump(jif, loop_end, span)?;
        for p in frame.exit_patches {
            self.patch_jump(p, loop_end, span)?;
        }
        Ok(())
    }

    fn compile_exit_loop(&mut self, _span: Span) -> CompileResult<()> {
        let patch = self.emit_jump(Op::JumpForward);
        self.loops
            .last_mut()
            .expect("parser rejects `exit loop` outside a loop")
            .exit_patches
            .push(patch);
        Ok(())
    }

    fn compile_next_iteration(&mut self, span: Span) -> CompileResult<()> {
        let (has_after_body, cond_start) = {
            let frame = self
                .loops
                .last()
                .expect("parser rejects `next iteration` outside a loop");
            (frame.has_after_body, frame.cond_start)
        };
        if has_after_body {
            let patch = self.emit_jump(Op::JumpForward);
            self.loops.last_mut().unwrap().continue_patches.push(patch);
            Ok(())
        } else {
            self.emit_jump_back(cond_start, span)
        }
    }

    fn emit_exit_function(&mut self) {
        let patch = self.emit_jump(Op::JumpForward);
        self.exit_function_patches.push(patch);
    }

    fn compile_expr(&mut self, expr: &Expression) -> CompileResult<()> {
        match expr {
            Expression::Literal(LiteralValue::Int(i), span) => self.compile_int_literal(*i, *span),
            Expression::Literal(LiteralValue::Str(s), span) => {
                let idx = self.ensure_constant(Constant::Str(s.clone()), *span)?;
                self.emit_u8(Op::LoadConstant, idx);
                Ok(())
            }
            Expression::Variable(name, span) => {
                let idx = self
                    .variable_index(*name)
                    .ok_or_else(|| err_at(*span, format!("undefined variable `{}`", name.as_str())))?;
                self.emit_u8(Op::ReadVariable, idx as u8);
                Ok(())
            }
            Expression::Binary { op, left, right, span } => self.compile_binary(*op, left, right, *span),
            Expression::FunctionCall { name, args, kind, span } => self.compile_call(*name, args, *kind, *span),
            Expression::ContainerAccess { container, index, span } => {
                self.compile_expr(container)?;
                self.compile_expr(index)?;
                let idx = self.ensure_name_constant("get", *span)?;
                self.emit_u8(Op::CallBuiltin, idx);
                Ok(())
            }
            Expression::FieldAccess { target, field, span } => {
                self.compile_expr(target)?;
                let idx = self.ensure_name_constant(field.as_str(), *span)?;
                self.emit_u8(Op::FieldAccess, idx);
                Ok(())
            }
        }
    }

    fn compile_int_literal(&mut self, i: i64, span: Span) -> CompileResult<()> {
        if (0..=255).contains(&i) {
            self.code.push(Op::InlineNumber.byte());
            self.code.push(i as u8);
        } else {
            let idx = self.ensure_constant(Constant::Int(i), span)?;
            self.emit_u8(Op::LoadConstant, idx);
        }
        Ok(())
    }

    fn compile_binary(
        &mut self,
        op: BinOp,
        left: &Expression,
        right: &Expression,
        span: Span,
    ) -> CompileResult<()> {
        match op {
            BinOp::Or => self.compile_short_circuit(left, right, true),
            BinOp::And => self.compile_short_circuit(left, right, false),
            _ => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                let (sub, trailing_not) = binary_sub_op(op);
                self.code.push(Op::Binary.byte());
                self.code.push(sub.byte());
                if trailing_not {
                    self.code.push(Op::Not.byte());
                }
                let _ = span;
                Ok(())
            }
        }
    }

    /// `or`/`and` never reach a `BINARY` opcode: a falsy-tested
    /// `DUPLICATE [NOT] JUMP_IF_FALSE POP` sequence either short-circuits on
    /// the duplicated left value or falls through to discard it and
    /// evaluate the right operand (spec §4.F).
    fn compile_short_circuit(&mut self, left: &Expression, right: &Expression, is_or: bool) -> CompileResult<()> {
        self.compile_expr(left)?;
        self.code.push(Op::Duplicate.byte());
        if is_or {
            self.code.push(Op::Not.byte());
        }
        let patch = self.emit_jump(Op::JumpIfFalse);
        self.code.push(Op::Pop.byte());
        self.compile_expr(right)?;
        let end = self.code.len();
        self.patch_jump(patch, end, left.span())
    }

    fn compile_call(&mut self, name: Symbol, args: &[Expression], kind: CallKind, span: Span) -> CompileResult<()> {
        for a in args {
            self.compile_expr(a)?;
        }
        match kind {
            CallKind::Builtin => {
                let idx = self.ensure_name_constant(name.as_str(), span)?;
                if toi_util::builtins::is_variadic(name.as_str()) {
                    if args.len() > u8::MAX as usize {
                        return Err(err_at(
                            span,
                            format!(
                                "call to `{}` has {} arguments, more than the one-byte argument count allows",
                                name.as_str(),
                                args.len()
                            ),
                        ));
                    }
                    self.code.push(Op::CallVariadic.byte());
                    self.code.push(idx);
                    self.code.push(args.len() as u8);
                } else {
                    self.emit_u8(Op::CallBuiltin, idx);
                }
            }
            CallKind::User => {
                let idx = self.ensure_name_constant(name.as_str(), span)?;
                self.emit_u8(Op::CallFunction, idx);
            }
            CallKind::Constructor => {
                let idx = self.ensure_name_constant(name.as_str(), span)?;
                self.emit_u8(Op::Instantiate, idx);
            }
        }
        Ok(())
    }

    fn variable_index(&self, name: Symbol) -> Option<usize> {
        if let Some(i) = self.params.iter().position(|p| *p == name) {
            return Some(i);
        }
        self.variables
            .iter()
            .position(|v| *v == name)
            .map(|i| i + self.params.len())
    }

    fn declare_variable(&mut self, name: Symbol, span: Span) -> CompileResult<usize> {
        if let Some(i) = self.variable_index(name) {
            return Ok(i);
        }
        if self.params.len() + self.variables.len() >= MAX_CONSTANTS {
            return Err(err_at(span, format!("more than {MAX_CONSTANTS} variables in one scope")));
        }
        self.variables.push(name);
        Ok(self.params.len() + self.variables.len() - 1)
    }

    fn ensure_constant(&mut self, value: Constant, span: Span) -> CompileResult<u8> {
        if let Some(pos) = self.constants.iter().position(|c| *c == value) {
            return Ok(pos as u8);
        }
        if self.constants.len() >= MAX_CONSTANTS {
            return Err(err_at(
                span,
                format!("constant pool exceeds the {MAX_CONSTANTS}-entry limit"),
            ));
        }
        self.constants.push(value);
        Ok((self.constants.len() - 1) as u8)
    }

    fn ensure_name_constant(&mut self, name: &str, span: Span) -> CompileResult<u8> {
        self.ensure_constant(Constant::Str(name.to_string()), span)
    }

    fn emit_u8(&mut self, op: Op, operand: u8) {
        self.code.push(op.byte());
        self.code.push(operand);
    }

    fn emit_jump(&mut self, op: Op) -> usize {
        self.code.push(op.byte());
        self.code.push(0);
        self.code.push(0);
        self.code.len() - 2
    }

    fn patch_jump(&mut self, patch_at: usize, target: usize, span: Span) -> CompileResult<()> {
        let from = patch_at + 2;
        let delta = if target >= from { target - from } else { from - target };
        self.write_delta(patch_at, delta, span)
    }

    fn emit_jump_back(&mut self, target: usize, span: Span) -> CompileResult<()> {
        self.code.push(Op::JumpBack.byte());
        self.code.push(0);
        self.code.push(0);
        let from = self.code.len();
        let delta = from - target;
        self.write_delta(from - 2, delta, span)
    }

    fn write_delta(&mut self, at: usize, delta: usize, span: Span) -> CompileResult<()> {
        if delta > MAX_JUMP as usize {
            return Err(err_at(span, format!("jump offset {delta} exceeds the {MAX_JUMP}-byte cap")));
        }
        let bytes = (delta as u16).to_be_bytes();
        self.code[at] = bytes[0];
        self.code[at + 1] = bytes[1];
        Ok(())
    }
}

fn binary_sub_op(op: BinOp) -> (BinaryOp, bool) {
    match op {
        BinOp::Add => (BinaryOp::Plus, false),
        BinOp::Sub => (BinaryOp::Subtract, false),
        BinOp::Mul => (BinaryOp::Multiply, false),
        BinOp::Div => (BinaryOp::Divide, false),
        BinOp::Rem => (BinaryOp::Remainder, false),
        BinOp::Concat => (BinaryOp::Concat, false),
        BinOp::Eq => (BinaryOp::Equal, false),
        BinOp::NotEq => (BinaryOp::Equal, true),
        BinOp::Gt => (BinaryOp::GreaterThan, false),
        BinOp::Ge => (BinaryOp::LessThan, true),
        BinOp::Lt => (BinaryOp::LessThan, false),
        BinOp::Le => (BinaryOp::GreaterThan, true),
        BinOp::BAnd => (BinaryOp::BinaryAnd, false),
        BinOp::BOr => (BinaryOp::BinaryOr, false),
        BinOp::Xor => (BinaryOp::BinaryXor, false),
        BinOp::And | BinOp::Or => unreachable!("and/or are compiled by compile_short_circuit"),
    }
}

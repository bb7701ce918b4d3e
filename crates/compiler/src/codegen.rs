//! P-code generator.
//!
//! Walks the annotated tree and lowers it to stack operations. Operator
//! precedence is already resolved by the tree shape, so lowering is a plain
//! post-order emit: left operand, right operand, opcode, with `I2F`
//! inserted wherever the semantic pass recorded a widening.
//!
//! Control flow is emitted against monotonically numbered labels; a second
//! pass replaces the `Label` sentinels with absolute indices and rewrites
//! the jump targets.

use crate::symbol::SymbolTable;
use crate::typed::{
    TypedBlock, TypedElse, TypedExpr, TypedExprKind, TypedProgram, TypedStmt, TypedStmtKind,
};
use crate::ast::{BinOp, Lit, UnOp};
use skt_core::pcode::ConstPool;
use skt_core::{Instruction, Program, Type, Value};
use std::collections::HashMap;
use std::fmt;

/// Error type for code generation.
///
/// These only fire when the precondition (zero semantic errors) was
/// violated or the generator itself is buggy; they are not user diagnostics.
#[derive(Debug)]
pub enum CodeGenError {
    /// The annotated tree still contains an unresolved type.
    Unresolved { line: usize, column: usize },
    /// A jump referenced a label that was never placed.
    DanglingLabel(usize),
}

impl fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeGenError::Unresolved { line, column } => write!(
                f,
                "cannot generate code at {}:{}: expression type is unresolved",
                line, column
            ),
            CodeGenError::DanglingLabel(id) => {
                write!(f, "jump references label L{} which was never placed", id)
            }
        }
    }
}

impl std::error::Error for CodeGenError {}

/// Lower an annotated program to P-code.
///
/// Precondition: the analysis produced zero error-severity diagnostics.
pub fn generate(program: &TypedProgram, symbols: &SymbolTable) -> Result<Program, CodeGenError> {
    let mut generator = Generator::new();
    generator.gen_block(&program.block)?;
    generator.emit(Instruction::Halt);
    let code = generator.resolve_labels()?;
    Ok(Program {
        code,
        constants: generator.constants,
        globals: symbols
            .entries()
            .iter()
            .map(|e| (e.name.clone(), e.declared_type))
            .collect(),
    })
}

struct Generator {
    code: Vec<Instruction>,
    constants: ConstPool,
    next_label: usize,
}

impl Generator {
    fn new() -> Self {
        Generator {
            code: Vec::new(),
            constants: ConstPool::new(),
            next_label: 0,
        }
    }

    fn emit(&mut self, instr: Instruction) {
        self.code.push(instr);
    }

    fn fresh_label(&mut self) -> usize {
        let id = self.next_label;
        self.next_label += 1;
        id
    }

    fn place_label(&mut self, id: usize) {
        self.emit(Instruction::Label(id));
    }

    fn gen_block(&mut self, block: &TypedBlock) -> Result<(), CodeGenError> {
        for stmt in block {
            self.gen_stmt(stmt)?;
        }
        Ok(())
    }

    fn gen_stmt(&mut self, stmt: &TypedStmt) -> Result<(), CodeGenError> {
        match &stmt.node {
            // storage shape comes from the program's globals listing
            TypedStmtKind::Decl { .. } => Ok(()),

            TypedStmtKind::Assign {
                name,
                target_ty,
                value,
                widen,
            } => {
                if target_ty.is_none() {
                    return Err(CodeGenError::Unresolved {
                        line: stmt.span.line,
                        column: stmt.span.column,
                    });
                }
                self.gen_expr(value)?;
                if *widen {
                    self.emit(Instruction::I2F);
                }
                self.emit(Instruction::Store(name.clone()));
                Ok(())
            }

            TypedStmtKind::If {
                cond,
                then_block,
                else_branch,
            } => {
                let else_label = self.fresh_label();
                let end_label = self.fresh_label();
                self.gen_expr(cond)?;
                self.emit(Instruction::JumpIfFalse(else_label));
                self.gen_block(then_block)?;
                self.emit(Instruction::Jump(end_label));
                self.place_label(else_label);
                match else_branch {
                    Some(TypedElse::Block(block)) => self.gen_block(block)?,
                    Some(TypedElse::If(chained)) => self.gen_stmt(chained)?,
                    None => {}
                }
                self.place_label(end_label);
                Ok(())
            }

            TypedStmtKind::While { cond, body } => {
                let start_label = self.fresh_label();
                let end_label = self.fresh_label();
                self.place_label(start_label);
                self.gen_expr(cond)?;
                self.emit(Instruction::JumpIfFalse(end_label));
                self.gen_block(body)?;
                self.emit(Instruction::Jump(start_label));
                self.place_label(end_label);
                Ok(())
            }

            TypedStmtKind::DoWhile { body, cond } => {
                let start_label = self.fresh_label();
                let end_label = self.fresh_label();
                self.place_label(start_label);
                self.gen_block(body)?;
                self.gen_expr(cond)?;
                self.emit(Instruction::JumpIfFalse(end_label));
                self.emit(Instruction::Jump(start_label));
                self.place_label(end_label);
                Ok(())
            }

            TypedStmtKind::Read { targets } => {
                for (name, ty) in targets {
                    let ty = ty.ok_or(CodeGenError::Unresolved {
                        line: stmt.span.line,
                        column: stmt.span.column,
                    })?;
                    self.emit(Instruction::Read(name.clone(), ty));
                }
                Ok(())
            }

            TypedStmtKind::Write { items } => {
                for item in items {
                    let ty = self.gen_expr(item)?;
                    self.emit(Instruction::Write(ty));
                }
                // one newline per cout statement
                self.emit(Instruction::WriteLn);
                Ok(())
            }
        }
    }

    /// Emit code leaving the expression's value on top of the stack.
    /// Returns the expression's resolved type.
    fn gen_expr(&mut self, expr: &TypedExpr) -> Result<Type, CodeGenError> {
        let ty = expr.ty.ok_or(CodeGenError::Unresolved {
            line: expr.span.line,
            column: expr.span.column,
        })?;
        match &expr.node {
            TypedExprKind::Literal(lit) => {
                let value = match lit {
                    Lit::Int(n) => Value::Int(*n),
                    Lit::Real(x) => Value::Float(*x),
                    Lit::Bool(b) => Value::Bool(*b),
                    Lit::Str(s) => Value::Str(s.clone()),
                };
                let index = self.constants.intern(value);
                self.emit(Instruction::PushConst(index));
            }
            TypedExprKind::Ident(name) => {
                self.emit(Instruction::PushVar(name.clone()));
            }
            TypedExprKind::Unary { op, operand } => {
                self.gen_expr(operand)?;
                match op {
                    UnOp::Plus => {}
                    UnOp::Neg => self.emit(Instruction::Neg),
                    UnOp::Not => self.emit(Instruction::Not),
                }
            }
            TypedExprKind::Binary {
                op,
                lhs,
                rhs,
                widen_lhs,
                widen_rhs,
            } => {
                self.gen_expr(lhs)?;
                if *widen_lhs {
                    self.emit(Instruction::I2F);
                }
                self.gen_expr(rhs)?;
                if *widen_rhs {
                    self.emit(Instruction::I2F);
                }
                self.emit(opcode_for(*op));
            }
        }
        Ok(ty)
    }

    /// Replace `Label` sentinels with absolute indices and rewrite jump
    /// targets. Every referenced label must have been placed exactly once.
    fn resolve_labels(&self) -> Result<Vec<Instruction>, CodeGenError> {
        let mut addresses: HashMap<usize, usize> = HashMap::new();
        let mut index = 0;
        for instr in &self.code {
            if let Instruction::Label(id) = instr {
                addresses.insert(*id, index);
            } else {
                index += 1;
            }
        }

        let mut resolved = Vec::with_capacity(index);
        for instr in &self.code {
            match instr {
                Instruction::Label(_) => {}
                Instruction::Jump(id) => {
                    let addr = *addresses.get(id).ok_or(CodeGenError::DanglingLabel(*id))?;
                    resolved.push(Instruction::Jump(addr));
                }
                Instruction::JumpIfFalse(id) => {
                    let addr = *addresses.get(id).ok_or(CodeGenError::DanglingLabel(*id))?;
                    resolved.push(Instruction::JumpIfFalse(addr));
                }
                other => resolved.push(other.clone()),
            }
        }
        Ok(resolved)
    }
}

fn opcode_for(op: BinOp) -> Instruction {
    match op {
        BinOp::Add => Instruction::Add,
        BinOp::Sub => Instruction::Sub,
        BinOp::Mul => Instruction::Mul,
        BinOp::Div => Instruction::Div,
        BinOp::Mod => Instruction::Mod,
        BinOp::Pow => Instruction::Pow,
        BinOp::Eq => Instruction::Eq,
        BinOp::Ne => Instruction::Ne,
        BinOp::Lt => Instruction::Lt,
        BinOp::Le => Instruction::Le,
        BinOp::Gt => Instruction::Gt,
        BinOp::Ge => Instruction::Ge,
        BinOp::And => Instruction::And,
        BinOp::Or => Instruction::Or,
    }
}

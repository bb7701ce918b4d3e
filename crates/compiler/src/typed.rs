//! Annotated AST: the semantic analyzer's output.
//!
//! A fresh tree mirroring the parse tree with a resolved type on every
//! expression (`None` = unresolved, only when the subtree references an
//! undeclared identifier) plus the widening decisions the code generator
//! must realize with `I2F`. The parse tree itself is never mutated, so
//! outline views can keep using it while analysis runs.
//!
//! Compound assignments (`x += e`) and `x++`/`x--` arrive here already
//! desugared into plain assignments over a binary expression.

use crate::ast::{BinOp, Lit, UnOp};
use crate::token::Span;
use skt_core::Type;

#[derive(Debug, Clone, PartialEq)]
pub struct TypedProgram {
    pub block: TypedBlock,
    pub span: Span,
}

pub type TypedBlock = Vec<TypedStmt>;

#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    pub node: TypedExprKind,
    pub span: Span,
    /// Resolved type; `None` means unresolved.
    pub ty: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedExprKind {
    Literal(Lit),
    Ident(String),
    Unary {
        op: UnOp,
        operand: Box<TypedExpr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<TypedExpr>,
        rhs: Box<TypedExpr>,
        /// Emit `I2F` after the left operand.
        widen_lhs: bool,
        /// Emit `I2F` after the right operand.
        widen_rhs: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedElse {
    Block(TypedBlock),
    If(Box<TypedStmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedStmt {
    pub node: TypedStmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedStmtKind {
    Decl {
        ty: Type,
        names: Vec<(String, Span)>,
    },
    Assign {
        name: String,
        /// The target's declared type; `None` when the target is undeclared.
        target_ty: Option<Type>,
        value: TypedExpr,
        /// Emit `I2F` before the store (int value into a float variable).
        widen: bool,
    },
    If {
        cond: TypedExpr,
        then_block: TypedBlock,
        else_branch: Option<TypedElse>,
    },
    While {
        cond: TypedExpr,
        body: TypedBlock,
    },
    DoWhile {
        body: TypedBlock,
        cond: TypedExpr,
    },
    Read {
        /// Each target with its declared type (`None` when undeclared).
        targets: Vec<(String, Option<Type>)>,
    },
    Write {
        items: Vec<TypedExpr>,
    },
}

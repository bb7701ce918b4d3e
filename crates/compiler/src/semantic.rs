//! Semantic analyzer.
//!
//! A single walk over the parse tree that declares symbols, resolves
//! references, and type-checks expressions and statements. It produces a
//! fresh annotated tree plus the symbol table and a diagnostic list; the
//! annotated tree is returned even when diagnostics exist so editors can
//! show partial results.
//!
//! Numeric widening is implicit: `int` flows into `float` wherever the two
//! meet, and the analyzer records each widening so the code generator can
//! realize it with `I2F`. The reverse direction is rejected.

use crate::ast::{
    AssignOp, BinOp, Block, ElseBranch, Expr, ExprKind, Lit, Program, Stmt, StmtKind, UnOp,
};
use crate::symbol::{SymbolTable, GLOBAL_SCOPE};
use crate::token::Span;
use crate::typed::{
    TypedBlock, TypedElse, TypedExpr, TypedExprKind, TypedProgram, TypedStmt, TypedStmtKind,
};
use skt_core::Type;
use std::fmt;

/// Diagnostic severity. `UninitializedUse` is the only warning; everything
/// else blocks code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticErrorKind {
    UndeclaredVariable,
    DuplicateDeclaration,
    TypeIncompatibility,
    InvalidOperand,
    UninitializedUse,
    UnsupportedOperation,
}

impl fmt::Display for SemanticErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub severity: Severity,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub variable: Option<String>,
    pub expected: Option<Type>,
    pub actual: Option<Type>,
}

/// Everything the analyzer hands downstream.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub typed: TypedProgram,
    pub symbols: SymbolTable,
    pub errors: Vec<SemanticError>,
}

impl Analysis {
    /// True when any diagnostic is error-severity (warnings do not block
    /// code generation).
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| e.severity == Severity::Error)
    }
}

/// Analyze a parse tree.
pub fn analyze(program: &Program) -> Analysis {
    let mut analyzer = Analyzer::new();
    let block = analyzer.check_block(&program.block);
    Analysis {
        typed: TypedProgram {
            block,
            span: program.span,
        },
        symbols: analyzer.symbols,
        errors: analyzer.errors,
    }
}

struct Analyzer {
    symbols: SymbolTable,
    /// Innermost scope last. Only `"global"` is ever pushed today; the
    /// stack exists so nested scopes can be introduced without reshaping
    /// the lookup path.
    scopes: Vec<String>,
    errors: Vec<SemanticError>,
}

impl Analyzer {
    fn new() -> Self {
        Analyzer {
            symbols: SymbolTable::new(),
            scopes: vec![GLOBAL_SCOPE.to_string()],
            errors: Vec::new(),
        }
    }

    fn current_scope(&self) -> &str {
        self.scopes.last().expect("scope stack is never empty")
    }

    fn error(&mut self, kind: SemanticErrorKind, message: String, span: Span) -> &mut SemanticError {
        let severity = if kind == SemanticErrorKind::UninitializedUse {
            Severity::Warning
        } else {
            Severity::Error
        };
        self.errors.push(SemanticError {
            kind,
            severity,
            message,
            line: span.line,
            column: span.column,
            variable: None,
            expected: None,
            actual: None,
        });
        self.errors.last_mut().expect("just pushed")
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn check_block(&mut self, block: &Block) -> TypedBlock {
        block.iter().map(|stmt| self.check_stmt(stmt)).collect()
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> TypedStmt {
        let node = match &stmt.node {
            StmtKind::Decl { ty, names } => self.check_decl(*ty, names),
            StmtKind::Assign {
                name,
                name_span,
                op,
                value,
            } => self.check_assign(name, *name_span, *op, value, stmt.span),
            StmtKind::IncDec {
                name,
                name_span,
                dec,
            } => self.check_incdec(name, *name_span, *dec, stmt.span),
            StmtKind::If {
                cond,
                then_block,
                else_branch,
            } => {
                let cond = self.check_condition(cond);
                let then_block = self.check_block(then_block);
                let else_branch = else_branch.as_ref().map(|e| match e {
                    ElseBranch::Block(block) => TypedElse::Block(self.check_block(block)),
                    ElseBranch::If(chained) => TypedElse::If(Box::new(self.check_stmt(chained))),
                });
                TypedStmtKind::If {
                    cond,
                    then_block,
                    else_branch,
                }
            }
            StmtKind::While { cond, body } => {
                let cond = self.check_condition(cond);
                let body = self.check_block(body);
                TypedStmtKind::While { cond, body }
            }
            StmtKind::DoWhile { body, cond } => {
                let body = self.check_block(body);
                let cond = self.check_condition(cond);
                TypedStmtKind::DoWhile { body, cond }
            }
            StmtKind::Read { targets } => self.check_read(targets),
            StmtKind::Write { items } => TypedStmtKind::Write {
                items: items.iter().map(|e| self.check_expr(e)).collect(),
            },
        };
        TypedStmt {
            node,
            span: stmt.span,
        }
    }

    fn check_decl(&mut self, ty: Type, names: &[(String, Span)]) -> TypedStmtKind {
        for (name, span) in names {
            let scope = self.current_scope().to_string();
            if !self.symbols.declare(name, ty, &scope, span.line, span.column) {
                let err = self.error(
                    SemanticErrorKind::DuplicateDeclaration,
                    format!("variable '{}' is already declared", name),
                    *span,
                );
                err.variable = Some(name.clone());
            }
        }
        TypedStmtKind::Decl {
            ty,
            names: names.to_vec(),
        }
    }

    fn check_assign(
        &mut self,
        name: &str,
        name_span: Span,
        op: AssignOp,
        value: &Expr,
        stmt_span: Span,
    ) -> TypedStmtKind {
        let target_ty = self.resolve_target(name, name_span);
        let rhs = self.check_expr(value);

        // desugar `x op= e` into `x = x op e` without re-resolving (and
        // re-diagnosing) the target
        let value = match op.binary_op() {
            Some(bin) => {
                let lhs = TypedExpr {
                    node: TypedExprKind::Ident(name.to_string()),
                    span: name_span,
                    ty: target_ty,
                };
                self.combine_binary(bin, lhs, rhs, stmt_span)
            }
            None => rhs,
        };

        let widen = self.check_assignable(name, target_ty, &value, stmt_span);
        self.symbols.mark_initialized(name, &self.scopes);
        TypedStmtKind::Assign {
            name: name.to_string(),
            target_ty,
            value,
            widen,
        }
    }

    fn check_incdec(
        &mut self,
        name: &str,
        name_span: Span,
        dec: bool,
        stmt_span: Span,
    ) -> TypedStmtKind {
        let target_ty = self.resolve_target(name, name_span);
        if let Some(ty) = target_ty {
            if !ty.is_numeric() {
                let op = if dec { "--" } else { "++" };
                let err = self.error(
                    SemanticErrorKind::InvalidOperand,
                    format!("'{}' requires a numeric variable, '{}' is {}", op, name, ty),
                    name_span,
                );
                err.variable = Some(name.to_string());
                err.actual = Some(ty);
            }
        }
        let lhs = TypedExpr {
            node: TypedExprKind::Ident(name.to_string()),
            span: name_span,
            ty: target_ty,
        };
        let one = TypedExpr {
            node: TypedExprKind::Literal(Lit::Int(1)),
            span: name_span,
            ty: Some(Type::Int),
        };
        let bin = if dec { BinOp::Sub } else { BinOp::Add };
        // a non-numeric target was already diagnosed above; skip the
        // operator check so it is not reported twice
        let value = if target_ty.is_none_or(|t| t.is_numeric()) {
            self.combine_binary(bin, lhs, one, stmt_span)
        } else {
            TypedExpr {
                node: TypedExprKind::Binary {
                    op: bin,
                    lhs: Box::new(lhs),
                    rhs: Box::new(one),
                    widen_lhs: false,
                    widen_rhs: false,
                },
                span: stmt_span,
                ty: target_ty,
            }
        };
        self.symbols.mark_initialized(name, &self.scopes);
        TypedStmtKind::Assign {
            name: name.to_string(),
            target_ty,
            value,
            widen: false,
        }
    }

    fn check_read(&mut self, targets: &[(String, Span)]) -> TypedStmtKind {
        let mut typed_targets = Vec::with_capacity(targets.len());
        for (name, span) in targets {
            let ty = self.resolve_target(name, *span);
            self.symbols.mark_initialized(name, &self.scopes);
            typed_targets.push((name.clone(), ty));
        }
        TypedStmtKind::Read {
            targets: typed_targets,
        }
    }

    /// Look up an assignment/read target, diagnosing an undeclared name.
    fn resolve_target(&mut self, name: &str, span: Span) -> Option<Type> {
        match self.symbols.lookup(name, &self.scopes) {
            Some(entry) => Some(entry.declared_type),
            None => {
                let err = self.error(
                    SemanticErrorKind::UndeclaredVariable,
                    format!("variable '{}' is not declared", name),
                    span,
                );
                err.variable = Some(name.to_string());
                None
            }
        }
    }

    /// Conditions of `if`/`while`/`do-while` must be bool.
    fn check_condition(&mut self, cond: &Expr) -> TypedExpr {
        let typed = self.check_expr(cond);
        if let Some(ty) = typed.ty {
            if ty != Type::Bool {
                let err = self.error(
                    SemanticErrorKind::TypeIncompatibility,
                    format!("condition must be bool, found {}", ty),
                    typed.span,
                );
                err.expected = Some(Type::Bool);
                err.actual = Some(ty);
            }
        }
        typed
    }

    /// Is `value` assignable to `name`'s declared type? Returns whether the
    /// store needs a widening `I2F`.
    fn check_assignable(
        &mut self,
        name: &str,
        target_ty: Option<Type>,
        value: &TypedExpr,
        span: Span,
    ) -> bool {
        let (Some(target), Some(actual)) = (target_ty, value.ty) else {
            // undeclared target or unresolved value: already diagnosed
            return false;
        };
        if target == actual {
            return false;
        }
        if target == Type::Float && actual == Type::Int {
            return true;
        }
        let err = self.error(
            SemanticErrorKind::TypeIncompatibility,
            format!(
                "cannot assign {} to variable '{}' of type {}",
                actual, name, target
            ),
            span,
        );
        err.variable = Some(name.to_string());
        err.expected = Some(target);
        err.actual = Some(actual);
        false
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn check_expr(&mut self, expr: &Expr) -> TypedExpr {
        match &expr.node {
            ExprKind::Literal(lit) => {
                let ty = match lit {
                    Lit::Int(_) => Type::Int,
                    Lit::Real(_) => Type::Float,
                    Lit::Bool(_) => Type::Bool,
                    Lit::Str(_) => Type::Str,
                };
                TypedExpr {
                    node: TypedExprKind::Literal(lit.clone()),
                    span: expr.span,
                    ty: Some(ty),
                }
            }
            ExprKind::Ident(name) => {
                let ty = match self.symbols.lookup(name, &self.scopes) {
                    Some(entry) => {
                        let ty = entry.declared_type;
                        if !entry.initialized {
                            let err = self.error(
                                SemanticErrorKind::UninitializedUse,
                                format!("variable '{}' may be used before it is assigned", name),
                                expr.span,
                            );
                            err.variable = Some(name.clone());
                        }
                        Some(ty)
                    }
                    None => {
                        let err = self.error(
                            SemanticErrorKind::UndeclaredVariable,
                            format!("variable '{}' is not declared", name),
                            expr.span,
                        );
                        err.variable = Some(name.clone());
                        None
                    }
                };
                TypedExpr {
                    node: TypedExprKind::Ident(name.clone()),
                    span: expr.span,
                    ty,
                }
            }
            ExprKind::Unary { op, operand } => self.check_unary(*op, operand, expr.span),
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.check_expr(lhs);
                let rhs = self.check_expr(rhs);
                self.combine_binary(*op, lhs, rhs, expr.span)
            }
        }
    }

    fn check_unary(&mut self, op: UnOp, operand: &Expr, span: Span) -> TypedExpr {
        let operand = self.check_expr(operand);
        let ty = match (op, operand.ty) {
            // unresolved operand: stay unresolved, no extra diagnostics
            (_, None) => None,
            (UnOp::Not, Some(Type::Bool)) => Some(Type::Bool),
            (UnOp::Not, Some(other)) => {
                let err = self.error(
                    SemanticErrorKind::InvalidOperand,
                    format!("'!' requires a bool operand, found {}", other),
                    span,
                );
                err.expected = Some(Type::Bool);
                err.actual = Some(other);
                Some(Type::Bool)
            }
            (UnOp::Neg | UnOp::Plus, Some(ty)) if ty.is_numeric() => Some(ty),
            (UnOp::Neg | UnOp::Plus, Some(other)) => {
                let sign = if op == UnOp::Neg { "-" } else { "+" };
                let err = self.error(
                    SemanticErrorKind::InvalidOperand,
                    format!("unary '{}' requires a numeric operand, found {}", sign, other),
                    span,
                );
                err.actual = Some(other);
                Some(Type::Int)
            }
        };
        TypedExpr {
            node: TypedExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
            ty,
        }
    }

    /// Type a binary node from already-typed operands, recording widening.
    fn combine_binary(
        &mut self,
        op: BinOp,
        lhs: TypedExpr,
        rhs: TypedExpr,
        span: Span,
    ) -> TypedExpr {
        let mut widen_lhs = false;
        let mut widen_rhs = false;

        let ty = match (lhs.ty, rhs.ty) {
            // cascade avoidance: an unresolved operand was already reported
            (None, _) | (_, None) => None,
            (Some(lt), Some(rt)) => {
                if op.is_logical() {
                    if lt != Type::Bool || rt != Type::Bool {
                        let bad = if lt != Type::Bool { lt } else { rt };
                        let err = self.error(
                            SemanticErrorKind::InvalidOperand,
                            format!("operator '{}' requires bool operands, found {}", op, bad),
                            span,
                        );
                        err.expected = Some(Type::Bool);
                        err.actual = Some(bad);
                    }
                    Some(Type::Bool)
                } else if op == BinOp::Mod {
                    if lt != Type::Int || rt != Type::Int {
                        let bad = if lt != Type::Int { lt } else { rt };
                        let kind = if bad.is_numeric() {
                            SemanticErrorKind::UnsupportedOperation
                        } else {
                            SemanticErrorKind::InvalidOperand
                        };
                        let err = self.error(
                            kind,
                            format!("operator '%' requires int operands, found {}", bad),
                            span,
                        );
                        err.expected = Some(Type::Int);
                        err.actual = Some(bad);
                    }
                    Some(Type::Int)
                } else if op.is_arithmetic() {
                    match self.numeric_operands(op, lt, rt, span) {
                        Some(()) => {
                            let result = if lt == Type::Float || rt == Type::Float {
                                widen_lhs = lt == Type::Int;
                                widen_rhs = rt == Type::Int;
                                Type::Float
                            } else {
                                Type::Int
                            };
                            Some(result)
                        }
                        None => {
                            // report once; keep the operands' shared type
                            // (or a numeric guess) so the error does not
                            // re-surface at every enclosing node
                            Some(if lt == rt {
                                lt
                            } else if lt == Type::Float || rt == Type::Float {
                                Type::Float
                            } else {
                                Type::Int
                            })
                        }
                    }
                } else if op.is_relational() {
                    if self.numeric_operands(op, lt, rt, span).is_some() {
                        widen_lhs = lt == Type::Int && rt == Type::Float;
                        widen_rhs = rt == Type::Int && lt == Type::Float;
                    }
                    Some(Type::Bool)
                } else {
                    // equality: same type after numeric promotion
                    if lt.is_numeric() && rt.is_numeric() {
                        widen_lhs = lt == Type::Int && rt == Type::Float;
                        widen_rhs = rt == Type::Int && lt == Type::Float;
                    } else if lt != rt {
                        let err = self.error(
                            SemanticErrorKind::TypeIncompatibility,
                            format!("cannot compare {} with {}", lt, rt),
                            span,
                        );
                        err.expected = Some(lt);
                        err.actual = Some(rt);
                    }
                    Some(Type::Bool)
                }
            }
        };

        TypedExpr {
            node: TypedExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                widen_lhs,
                widen_rhs,
            },
            span,
            ty,
        }
    }

    /// Require both operands of `op` to be numeric; strings are a type
    /// incompatibility, bools an invalid operand.
    fn numeric_operands(&mut self, op: BinOp, lt: Type, rt: Type, span: Span) -> Option<()> {
        for bad in [lt, rt] {
            if !bad.is_numeric() {
                let kind = if bad == Type::Str {
                    SemanticErrorKind::TypeIncompatibility
                } else {
                    SemanticErrorKind::InvalidOperand
                };
                let err = self.error(
                    kind,
                    format!("operator '{}' requires numeric operands, found {}", op, bad),
                    span,
                );
                err.actual = Some(bad);
                return None;
            }
        }
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn analyze_source(source: &str) -> Analysis {
        let (tokens, lex_errors) = tokenize(source);
        assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);
        let (program, parse_errors) = parse(&tokens);
        assert!(parse_errors.is_empty(), "parse errors: {:?}", parse_errors);
        analyze(&program.expect("program should parse"))
    }

    fn errors_of_kind(analysis: &Analysis, kind: SemanticErrorKind) -> Vec<&SemanticError> {
        analysis.errors.iter().filter(|e| e.kind == kind).collect()
    }

    #[test]
    fn test_undeclared_variable() {
        let analysis = analyze_source("main { suma = 45; }");
        let undeclared = errors_of_kind(&analysis, SemanticErrorKind::UndeclaredVariable);
        assert_eq!(undeclared.len(), 1);
        assert_eq!(undeclared[0].variable.as_deref(), Some("suma"));
        assert_eq!(analysis.errors.len(), 1, "no cascading errors expected");
    }

    #[test]
    fn test_float_to_int_assignment_rejected() {
        let analysis = analyze_source("main { int x; x = 32.32; }");
        let incompat = errors_of_kind(&analysis, SemanticErrorKind::TypeIncompatibility);
        assert_eq!(incompat.len(), 1);
        assert_eq!(incompat[0].expected, Some(Type::Int));
        assert_eq!(incompat[0].actual, Some(Type::Float));
        assert_eq!(incompat[0].expected.unwrap().to_string(), "int");
        assert_eq!(incompat[0].actual.unwrap().to_string(), "float");
    }

    #[test]
    fn test_int_to_float_widens() {
        let analysis = analyze_source("main { int x; float a; x = 5; a = x; }");
        assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
        match &analysis.typed.block[3].node {
            TypedStmtKind::Assign { widen, .. } => assert!(widen),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_duplicate_declaration() {
        let analysis = analyze_source("main { int x; float x; }");
        let dups = errors_of_kind(&analysis, SemanticErrorKind::DuplicateDeclaration);
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].variable.as_deref(), Some("x"));
        // the first entry wins
        let entry = analysis.symbols.lookup("x", &[GLOBAL_SCOPE.to_string()]).unwrap();
        assert_eq!(entry.declared_type, Type::Int);
    }

    #[test]
    fn test_integration_program_with_multiple_errors() {
        let analysis = analyze_source(
            "main {\n\
             \tint x, y, z;\n\
             \tfloat a, b, c;\n\
             \tsuma = 45;\n\
             \tx = 32.32;\n\
             \ty = 14.54;\n\
             \ta = 3.1;\n\
             \ty = a + 3;\n\
             \tcin >> mas;\n\
             }",
        );
        let undeclared = errors_of_kind(&analysis, SemanticErrorKind::UndeclaredVariable);
        let incompat = errors_of_kind(&analysis, SemanticErrorKind::TypeIncompatibility);
        assert!(undeclared.len() >= 2, "{:?}", analysis.errors);
        let names: Vec<_> = undeclared.iter().filter_map(|e| e.variable.as_deref()).collect();
        assert!(names.contains(&"suma"));
        assert!(names.contains(&"mas"));
        assert!(incompat.len() >= 3, "{:?}", analysis.errors);
    }

    #[test]
    fn test_promotion_in_arithmetic() {
        let analysis = analyze_source("main { int x; float a; x = 1; a = 0.5; a = a + x; }");
        assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
        match &analysis.typed.block[4].node {
            TypedStmtKind::Assign { value, widen, .. } => {
                assert!(!widen, "result is already float");
                assert_eq!(value.ty, Some(Type::Float));
                match &value.node {
                    TypedExprKind::Binary {
                        widen_lhs,
                        widen_rhs,
                        ..
                    } => {
                        assert!(!widen_lhs);
                        assert!(widen_rhs, "the int operand widens");
                    }
                    other => panic!("{:?}", other),
                }
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_mod_requires_int_operands() {
        let analysis = analyze_source("main { float a; int x; a = 1.0; x = 1; x = x % 2; a = a % 2.0; }");
        let unsupported = errors_of_kind(&analysis, SemanticErrorKind::UnsupportedOperation);
        assert_eq!(unsupported.len(), 1);
    }

    #[test]
    fn test_logical_operators_require_bool() {
        let analysis = analyze_source("main { bool p; int x; p = true; x = 1; p = p && x > 0; p = p || x; }");
        let invalid = errors_of_kind(&analysis, SemanticErrorKind::InvalidOperand);
        assert_eq!(invalid.len(), 1, "{:?}", analysis.errors);
    }

    #[test]
    fn test_arithmetic_on_strings_is_type_incompatibility() {
        let analysis = analyze_source("main { string s; s = \"a\"; s = s + \"b\"; }");
        let incompat = errors_of_kind(&analysis, SemanticErrorKind::TypeIncompatibility);
        assert!(!incompat.is_empty());
    }

    #[test]
    fn test_string_assignment_and_equality_are_fine() {
        let analysis = analyze_source(
            "main { string s, t; bool same; s = \"a\"; t = s; same = s == t; }",
        );
        assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
    }

    #[test]
    fn test_condition_must_be_bool() {
        let analysis = analyze_source("main { int x; x = 1; while x { x--; } }");
        let incompat = errors_of_kind(&analysis, SemanticErrorKind::TypeIncompatibility);
        assert_eq!(incompat.len(), 1);
        assert_eq!(incompat[0].expected, Some(Type::Bool));
    }

    #[test]
    fn test_compound_assignment_follows_assignment_rules() {
        // x += 0.5 desugars to x = x + 0.5, a float result into an int
        let analysis = analyze_source("main { int x; x = 1; x += 0.5; }");
        let incompat = errors_of_kind(&analysis, SemanticErrorKind::TypeIncompatibility);
        assert_eq!(incompat.len(), 1);
        assert_eq!(incompat[0].expected, Some(Type::Int));
        assert_eq!(incompat[0].actual, Some(Type::Float));
    }

    #[test]
    fn test_incdec_requires_numeric_target() {
        let analysis = analyze_source("main { bool p; p = true; p++; }");
        let invalid = errors_of_kind(&analysis, SemanticErrorKind::InvalidOperand);
        assert_eq!(invalid.len(), 1);
    }

    #[test]
    fn test_undeclared_reference_does_not_cascade() {
        // one error for 'n', none for the enclosing '+' or the assignment
        let analysis = analyze_source("main { int x; x = n + 1; }");
        assert_eq!(analysis.errors.len(), 1, "{:?}", analysis.errors);
        assert_eq!(
            analysis.errors[0].kind,
            SemanticErrorKind::UndeclaredVariable
        );
        // and the expression stays unresolved
        match &analysis.typed.block[1].node {
            TypedStmtKind::Assign { value, .. } => assert_eq!(value.ty, None),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_uninitialized_use_is_a_warning() {
        let analysis = analyze_source("main { int x, y; y = x + 1; }");
        let warnings = errors_of_kind(&analysis, SemanticErrorKind::UninitializedUse);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, Severity::Warning);
        assert!(!analysis.has_errors(), "warnings do not block codegen");
    }

    #[test]
    fn test_cin_initializes_its_target() {
        let analysis = analyze_source("main { int n; cin >> n; cout << n; }");
        assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
    }

    #[test]
    fn test_nested_declarations_land_in_global_scope() {
        let analysis = analyze_source(
            "main { int x; x = 1; if x > 0 { int inner; inner = 2; } while x > 5 { int deep; deep = 1; } }",
        );
        assert!(analysis.symbols.is_declared("inner", GLOBAL_SCOPE));
        assert!(analysis.symbols.is_declared("deep", GLOBAL_SCOPE));
        // every declared symbol appears in the listing
        let names: Vec<_> = analysis.symbols.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["x", "inner", "deep"]);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let source = "main { int x; float a; x = 2; a = x + 0.5; cout << a; }";
        let a = analyze_source(source);
        let b = analyze_source(source);
        assert_eq!(a.typed, b.typed);
        assert_eq!(a.errors, b.errors);
        assert_eq!(a.symbols.entries(), b.symbols.entries());
    }
}

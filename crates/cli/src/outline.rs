//! Plain-text outline of a syntax tree, one node per line.

use sktc::ast::{ElseBranch, Expr, ExprKind, Lit, Program, Stmt, StmtKind};
use std::fmt::Write as _;

/// Render the tree with two-space indentation per level.
pub fn render(program: &Program) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "program");
    for stmt in &program.block {
        render_stmt(&mut out, stmt, 1);
    }
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn render_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
    indent(out, depth);
    match &stmt.node {
        StmtKind::Decl { ty, names } => {
            let names: Vec<&str> = names.iter().map(|(n, _)| n.as_str()).collect();
            let _ = writeln!(out, "decl {} {}", ty, names.join(", "));
        }
        StmtKind::Assign { name, op, value, .. } => {
            let _ = writeln!(out, "assign {} {}", name, op);
            render_expr(out, value, depth + 1);
        }
        StmtKind::IncDec { name, dec, .. } => {
            let _ = writeln!(out, "{}{}", name, if *dec { "--" } else { "++" });
        }
        StmtKind::If {
            cond,
            then_block,
            else_branch,
        } => {
            let _ = writeln!(out, "if");
            render_expr(out, cond, depth + 1);
            indent(out, depth);
            let _ = writeln!(out, "then");
            for stmt in then_block {
                render_stmt(out, stmt, depth + 1);
            }
            match else_branch {
                Some(ElseBranch::Block(block)) => {
                    indent(out, depth);
                    let _ = writeln!(out, "else");
                    for stmt in block {
                        render_stmt(out, stmt, depth + 1);
                    }
                }
                Some(ElseBranch::If(chained)) => {
                    indent(out, depth);
                    let _ = writeln!(out, "else");
                    render_stmt(out, chained, depth + 1);
                }
                None => {}
            }
        }
        StmtKind::While { cond, body } => {
            let _ = writeln!(out, "while");
            render_expr(out, cond, depth + 1);
            for stmt in body {
                render_stmt(out, stmt, depth + 1);
            }
        }
        StmtKind::DoWhile { body, cond } => {
            let _ = writeln!(out, "do-while");
            for stmt in body {
                render_stmt(out, stmt, depth + 1);
            }
            render_expr(out, cond, depth + 1);
        }
        StmtKind::Read { targets } => {
            let names: Vec<&str> = targets.iter().map(|(n, _)| n.as_str()).collect();
            let _ = writeln!(out, "cin >> {}", names.join(" >> "));
        }
        StmtKind::Write { items } => {
            let _ = writeln!(out, "cout");
            for item in items {
                render_expr(out, item, depth + 1);
            }
        }
    }
}

fn render_expr(out: &mut String, expr: &Expr, depth: usize) {
    indent(out, depth);
    match &expr.node {
        ExprKind::Literal(lit) => {
            let _ = match lit {
                Lit::Int(n) => writeln!(out, "int {}", n),
                Lit::Real(x) => writeln!(out, "float {}", x),
                Lit::Bool(b) => writeln!(out, "bool {}", b),
                Lit::Str(s) => writeln!(out, "string {:?}", s),
            };
        }
        ExprKind::Ident(name) => {
            let _ = writeln!(out, "ident {}", name);
        }
        ExprKind::Unary { op, operand } => {
            let _ = writeln!(out, "unary {:?}", op);
            render_expr(out, operand, depth + 1);
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let _ = writeln!(out, "binary {}", op);
            render_expr(out, lhs, depth + 1);
            render_expr(out, rhs, depth + 1);
        }
    }
}

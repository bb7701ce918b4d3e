//! Syntax analyzer.
//!
//! Hand-written recursive descent with one-token lookahead over the token
//! list from the lexer (comment and error tokens are filtered out first).
//! On a syntax
//! error the parser records a [`ParseError`] and re-synchronizes at the next
//! statement boundary, so it returns a partial tree alongside the error list
//! instead of giving up at the first problem.

use crate::ast::{
    AssignOp, BinOp, Block, ElseBranch, Expr, ExprKind, Lit, Program, Stmt, StmtKind, UnOp,
};
use crate::token::{Span, Token, TokenKind};
use skt_core::Type;
use std::fmt;

/// What kind of syntax error was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnexpectedToken,
    MissingSemicolon,
    MissingComma,
    MissingBrace,
    UnexpectedEndOfInput,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A recorded syntax error. `found` is the offending token's lexeme, or
/// `"EOF"` when input ran out.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub expected: Option<Vec<String>>,
    pub found: String,
}

/// Parse a token list into a program tree.
///
/// Returns `(Some(program), errors)` even when errors are non-empty. The
/// tree is absent only when the input is empty or the very first token
/// cannot start `main`.
pub fn parse(tokens: &[Token]) -> (Option<Program>, Vec<ParseError>) {
    let significant: Vec<Token> = tokens
        .iter()
        .filter(|t| !matches!(t.kind, TokenKind::Comment | TokenKind::Error))
        .cloned()
        .collect();
    let mut parser = Parser::new(significant);
    let program = parser.parse_program();
    (program, parser.errors)
}

/// Signals that the current construct was abandoned after recording an
/// error; the caller re-synchronizes.
struct Abort;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
    /// Position of the last panic-mode sync, to force progress if the
    /// parser would otherwise sync twice at the same spot.
    last_sync: Option<usize>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            errors: Vec::new(),
            last_sync: None,
        }
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// True when the current token's lexeme is `text`.
    fn check(&self, text: &str) -> bool {
        self.current().is_some_and(|t| t.lexeme == text)
    }

    fn check_kind(&self, kind: TokenKind) -> bool {
        self.current().is_some_and(|t| t.kind == kind)
    }

    /// Consume the current token when its lexeme is `text`.
    fn consume(&mut self, text: &str) -> bool {
        if self.check(text) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Lexeme of the current token, or `"EOF"`.
    fn found_text(&self) -> String {
        self.current()
            .map(|t| t.lexeme.clone())
            .unwrap_or_else(|| "EOF".to_string())
    }

    /// Position to report an error at: the current token's span start, or
    /// the end of the last token when input ran out.
    fn error_position(&self) -> (usize, usize) {
        if let Some(t) = self.current() {
            (t.span.line, t.span.column)
        } else if let Some(t) = self.tokens.last() {
            (t.span.end_line, t.span.end_column)
        } else {
            (1, 1)
        }
    }

    fn push_error(
        &mut self,
        kind: ParseErrorKind,
        message: String,
        expected: Option<Vec<String>>,
    ) {
        let (line, column) = self.error_position();
        let found = self.found_text();
        self.errors.push(ParseError {
            kind,
            message,
            line,
            column,
            expected,
            found,
        });
    }

    fn unexpected(&mut self, expected: &[&str]) -> Abort {
        let found = self.found_text();
        let kind = if self.is_at_end() {
            ParseErrorKind::UnexpectedEndOfInput
        } else {
            ParseErrorKind::UnexpectedToken
        };
        self.push_error(
            kind,
            format!("unexpected '{}', expected one of: {}", found, expected.join(", ")),
            Some(expected.iter().map(|s| s.to_string()).collect()),
        );
        Abort
    }

    /// Require a `;`. When absent, the statement is diagnosed once and the
    /// semicolon is treated as present so parsing continues.
    fn expect_semicolon(&mut self) {
        if self.consume(";") {
            return;
        }
        let found = self.found_text();
        self.push_error(
            ParseErrorKind::MissingSemicolon,
            format!("falta un punto y coma ';' antes de '{}'", found),
            Some(vec![";".to_string()]),
        );
    }

    // ------------------------------------------------------------------
    // Panic-mode recovery
    // ------------------------------------------------------------------

    /// True when the current token can begin (or delimit) a statement.
    fn at_statement_sync(&self) -> bool {
        match self.current() {
            None => true,
            Some(t) => match t.kind {
                TokenKind::Identifier => true,
                TokenKind::ReservedWord => matches!(
                    t.lexeme.as_str(),
                    "if" | "while" | "do" | "cin" | "cout" | "int" | "float" | "bool" | "string"
                ),
                TokenKind::Symbol => matches!(t.lexeme.as_str(), ";" | "{" | "}"),
                _ => false,
            },
        }
    }

    /// Discard tokens until a statement boundary. Never syncs twice at the
    /// same position without consuming at least one token.
    fn synchronize(&mut self) {
        if self.last_sync == Some(self.pos) && !self.is_at_end() {
            self.pos += 1;
        }
        while !self.is_at_end() && !self.at_statement_sync() {
            self.pos += 1;
        }
        // a stray ';' ends the bad statement; step over it
        if self.check(";") {
            self.pos += 1;
        }
        self.last_sync = Some(self.pos);
    }

    // ------------------------------------------------------------------
    // Grammar productions
    // ------------------------------------------------------------------

    /// program := 'main' '{' block '}'
    fn parse_program(&mut self) -> Option<Program> {
        if self.is_at_end() {
            self.push_error(
                ParseErrorKind::UnexpectedEndOfInput,
                "empty input, expected 'main'".to_string(),
                Some(vec!["main".to_string()]),
            );
            return None;
        }
        let start_span = self.current().map(|t| t.span);
        if !self.consume("main") {
            self.unexpected(&["main"]);
            return None;
        }
        if !self.consume("{") {
            self.push_error(
                ParseErrorKind::MissingBrace,
                format!("expected '{{' after 'main', found '{}'", self.found_text()),
                Some(vec!["{".to_string()]),
            );
        }
        let block = self.parse_block();
        let end_span = self.current().map(|t| t.span);
        if !self.consume("}") {
            self.push_error(
                ParseErrorKind::MissingBrace,
                "expected '}' closing the main block".to_string(),
                Some(vec!["}".to_string()]),
            );
        } else if !self.is_at_end() {
            let _ = self.unexpected(&["EOF"]);
        }
        let span = match (start_span, end_span.or_else(|| self.tokens.last().map(|t| t.span))) {
            (Some(a), Some(b)) => a.merge(b),
            (Some(a), None) => a,
            _ => Span::new(1, 1, 1, 2),
        };
        Some(Program { block, span })
    }

    /// block := elem* — runs until `}` or EOF, re-syncing after errors.
    fn parse_block(&mut self) -> Block {
        let mut stmts = Vec::new();
        while !self.is_at_end() && !self.check("}") {
            match self.parse_elem() {
                Ok(stmt) => stmts.push(stmt),
                Err(Abort) => self.synchronize(),
            }
        }
        stmts
    }

    fn parse_elem(&mut self) -> Result<Stmt, Abort> {
        let token = match self.current() {
            Some(t) => t.clone(),
            None => return Err(self.unexpected(&["statement"])),
        };
        match token.kind {
            TokenKind::ReservedWord => match token.lexeme.as_str() {
                "int" | "float" | "bool" | "string" => self.parse_decl(),
                "if" => self.parse_if(),
                "while" => self.parse_while(),
                "do" => self.parse_do_while(),
                "cin" => self.parse_read(),
                "cout" => self.parse_write(),
                _ => {
                    let abort = self.unexpected(&["statement"]);
                    self.pos += 1; // discard the offending token
                    Err(abort)
                }
            },
            TokenKind::Identifier => self.parse_assign_or_incdec(),
            _ => {
                let abort = self.unexpected(&["statement"]);
                self.pos += 1; // discard the offending token
                Err(abort)
            }
        }
    }

    /// decl := type ident (',' ident)* ';' — a missing comma between two
    /// identifiers is diagnosed and the list continues.
    fn parse_decl(&mut self) -> Result<Stmt, Abort> {
        let ty_token = self.advance().expect("caller checked a type keyword");
        let ty = Type::from_keyword(&ty_token.lexeme).expect("caller checked a type keyword");
        let mut span = ty_token.span;
        let mut names: Vec<(String, Span)> = Vec::new();

        loop {
            if self.check_kind(TokenKind::Identifier) {
                let t = self.advance().expect("checked identifier");
                span = span.merge(t.span);
                names.push((t.lexeme, t.span));
            } else {
                let _ = self.unexpected(&["identifier"]);
                // declaration-list sync: , ; } EOF
                while !self.is_at_end() && !self.check(",") && !self.check(";") && !self.check("}")
                {
                    self.pos += 1;
                }
            }
            if self.consume(",") {
                continue;
            }
            if self.check_kind(TokenKind::Identifier) {
                self.push_error(
                    ParseErrorKind::MissingComma,
                    "falta una coma ',' entre identificadores de la declaración".to_string(),
                    Some(vec![",".to_string()]),
                );
                continue;
            }
            break;
        }

        self.expect_semicolon();
        if names.is_empty() {
            return Err(Abort);
        }
        Ok(Stmt {
            node: StmtKind::Decl { ty, names },
            span,
        })
    }

    /// assignment := ident assignOp expr ';'  |  ident ('++'|'--') ';'
    fn parse_assign_or_incdec(&mut self) -> Result<Stmt, Abort> {
        let name_token = self.advance().expect("caller checked an identifier");
        let name_span = name_token.span;

        if self.check("++") || self.check("--") {
            let op_token = self.advance().expect("checked ++/--");
            self.expect_semicolon();
            return Ok(Stmt {
                node: StmtKind::IncDec {
                    name: name_token.lexeme,
                    name_span,
                    dec: op_token.lexeme == "--",
                },
                span: name_span.merge(op_token.span),
            });
        }

        if self.check_kind(TokenKind::AssignmentOperator) {
            let op_token = self.advance().expect("checked assignment operator");
            let op = match op_token.lexeme.as_str() {
                "=" => AssignOp::Assign,
                "+=" => AssignOp::Add,
                "-=" => AssignOp::Sub,
                "*=" => AssignOp::Mul,
                "/=" => AssignOp::Div,
                "%=" => AssignOp::Mod,
                "^=" => AssignOp::Pow,
                _ => unreachable!("lexer only produces the seven assignment operators"),
            };
            let value = self.parse_expr()?;
            self.expect_semicolon();
            let span = name_span.merge(value.span);
            return Ok(Stmt {
                node: StmtKind::Assign {
                    name: name_token.lexeme,
                    name_span,
                    op,
                    value,
                },
                span,
            });
        }

        Err(self.unexpected(&["=", "+=", "-=", "*=", "/=", "%=", "^=", "++", "--"]))
    }

    /// if := 'if' expr '{' block '}' ( 'else' ('{' block '}' | if) )?
    /// The conditional is unbracketed.
    fn parse_if(&mut self) -> Result<Stmt, Abort> {
        let if_token = self.advance().expect("caller checked 'if'");
        let cond = self.parse_expr()?;
        self.expect_brace_open("if")?;
        let then_block = self.parse_block();
        let mut span = if_token.span;
        span = self.expect_brace_close("if", span)?;

        let else_branch = if self.consume("else") {
            if self.check("if") {
                let chained = self.parse_if()?;
                span = span.merge(chained.span);
                Some(ElseBranch::If(Box::new(chained)))
            } else {
                self.expect_brace_open("else")?;
                let block = self.parse_block();
                span = self.expect_brace_close("else", span)?;
                Some(ElseBranch::Block(block))
            }
        } else {
            None
        };

        Ok(Stmt {
            node: StmtKind::If {
                cond,
                then_block,
                else_branch,
            },
            span,
        })
    }

    /// while := 'while' expr '{' block '}'
    fn parse_while(&mut self) -> Result<Stmt, Abort> {
        let while_token = self.advance().expect("caller checked 'while'");
        let cond = self.parse_expr()?;
        self.expect_brace_open("while")?;
        let body = self.parse_block();
        let span = self.expect_brace_close("while", while_token.span)?;
        Ok(Stmt {
            node: StmtKind::While { cond, body },
            span,
        })
    }

    /// do-while := 'do' '{' block '}' 'while' expr ';'
    fn parse_do_while(&mut self) -> Result<Stmt, Abort> {
        let do_token = self.advance().expect("caller checked 'do'");
        self.expect_brace_open("do")?;
        let body = self.parse_block();
        let mut span = self.expect_brace_close("do", do_token.span)?;
        if !self.consume("while") {
            return Err(self.unexpected(&["while"]));
        }
        let cond = self.parse_expr()?;
        span = span.merge(cond.span);
        self.expect_semicolon();
        Ok(Stmt {
            node: StmtKind::DoWhile { body, cond },
            span,
        })
    }

    /// read := 'cin' '>>' ident ('>>' ident)* ';'
    fn parse_read(&mut self) -> Result<Stmt, Abort> {
        let cin_token = self.advance().expect("caller checked 'cin'");
        let mut span = cin_token.span;
        let mut targets = Vec::new();
        if !self.consume(">>") {
            return Err(self.unexpected(&[">>"]));
        }
        loop {
            if !self.check_kind(TokenKind::Identifier) {
                return Err(self.unexpected(&["identifier"]));
            }
            let t = self.advance().expect("checked identifier");
            span = span.merge(t.span);
            targets.push((t.lexeme, t.span));
            if !self.consume(">>") {
                break;
            }
        }
        self.expect_semicolon();
        Ok(Stmt {
            node: StmtKind::Read { targets },
            span,
        })
    }

    /// write := 'cout' '<<' outItem ('<<' outItem)* ';'
    fn parse_write(&mut self) -> Result<Stmt, Abort> {
        let cout_token = self.advance().expect("caller checked 'cout'");
        let mut span = cout_token.span;
        let mut items = Vec::new();
        if !self.consume("<<") {
            return Err(self.unexpected(&["<<"]));
        }
        loop {
            let item = self.parse_expr()?;
            span = span.merge(item.span);
            items.push(item);
            if !self.consume("<<") {
                break;
            }
        }
        self.expect_semicolon();
        Ok(Stmt {
            node: StmtKind::Write { items },
            span,
        })
    }

    fn expect_brace_open(&mut self, context: &str) -> Result<(), Abort> {
        if self.consume("{") {
            return Ok(());
        }
        self.push_error(
            ParseErrorKind::MissingBrace,
            format!(
                "expected '{{' to open the {} body, found '{}'",
                context,
                self.found_text()
            ),
            Some(vec!["{".to_string()]),
        );
        Err(Abort)
    }

    fn expect_brace_close(&mut self, context: &str, span: Span) -> Result<Span, Abort> {
        if let Some(close_span) = self.current().map(|t| t.span) {
            if self.consume("}") {
                return Ok(span.merge(close_span));
            }
        }
        self.push_error(
            ParseErrorKind::MissingBrace,
            format!("expected '}}' closing the {} block", context),
            Some(vec!["}".to_string()]),
        );
        Err(Abort)
    }

    // ------------------------------------------------------------------
    // Expressions — precedence climbing, weakest to tightest:
    //   || , && , == != , < <= > >= , + - , * / % , ^ (right) , unary
    // ------------------------------------------------------------------

    fn parse_expr(&mut self) -> Result<Expr, Abort> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, Abort> {
        let mut lhs = self.parse_and()?;
        while self.consume("||") {
            let rhs = self.parse_and()?;
            lhs = binary(BinOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, Abort> {
        let mut lhs = self.parse_equality()?;
        while self.consume("&&") {
            let rhs = self.parse_equality()?;
            lhs = binary(BinOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, Abort> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = if self.check("==") {
                BinOp::Eq
            } else if self.check("!=") {
                BinOp::Ne
            } else {
                break;
            };
            self.pos += 1;
            let rhs = self.parse_relational()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Expr, Abort> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = if self.check("<=") {
                BinOp::Le
            } else if self.check(">=") {
                BinOp::Ge
            } else if self.check("<") {
                BinOp::Lt
            } else if self.check(">") {
                BinOp::Gt
            } else {
                break;
            };
            self.pos += 1;
            let rhs = self.parse_additive()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, Abort> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = if self.check("+") {
                BinOp::Add
            } else if self.check("-") {
                BinOp::Sub
            } else {
                break;
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, Abort> {
        let mut lhs = self.parse_power()?;
        loop {
            let op = if self.check("*") {
                BinOp::Mul
            } else if self.check("/") {
                BinOp::Div
            } else if self.check("%") {
                BinOp::Mod
            } else {
                break;
            };
            self.pos += 1;
            let rhs = self.parse_power()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    /// `^` is right-associative: `2 ^ 3 ^ 2` is `2 ^ (3 ^ 2)`.
    fn parse_power(&mut self) -> Result<Expr, Abort> {
        let base = self.parse_unary()?;
        if self.consume("^") {
            let exponent = self.parse_power()?;
            return Ok(binary(BinOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Expr, Abort> {
        let op = if self.check("!") {
            Some(UnOp::Not)
        } else if self.check("-") {
            Some(UnOp::Neg)
        } else if self.check("+") {
            Some(UnOp::Plus)
        } else {
            None
        };
        if let Some(op) = op {
            let op_span = self.current().expect("checked operator").span;
            self.pos += 1;
            let operand = self.parse_unary()?;
            let span = op_span.merge(operand.span);
            return Ok(Expr {
                node: ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            });
        }
        self.parse_primary()
    }

    /// primary := literal | identifier | '(' expr ')'
    fn parse_primary(&mut self) -> Result<Expr, Abort> {
        let token = match self.current() {
            Some(t) => t.clone(),
            None => return Err(self.unexpected(&["expression"])),
        };
        match token.kind {
            TokenKind::Integer => {
                self.pos += 1;
                let value = token
                    .lexeme
                    .parse::<i64>()
                    .expect("lexer rejects out-of-range integers");
                Ok(literal(Lit::Int(value), token.span))
            }
            TokenKind::Real => {
                self.pos += 1;
                let value = token
                    .lexeme
                    .parse::<f64>()
                    .expect("lexer only emits valid reals");
                Ok(literal(Lit::Real(value), token.span))
            }
            TokenKind::Boolean => {
                self.pos += 1;
                Ok(literal(Lit::Bool(token.lexeme == "true"), token.span))
            }
            TokenKind::String => {
                self.pos += 1;
                Ok(literal(Lit::Str(unescape_string(&token.lexeme)), token.span))
            }
            TokenKind::Identifier => {
                self.pos += 1;
                Ok(Expr {
                    node: ExprKind::Ident(token.lexeme),
                    span: token.span,
                })
            }
            TokenKind::Symbol if token.lexeme == "(" => {
                self.pos += 1;
                let inner = self.parse_expr()?;
                if !self.consume(")") {
                    return Err(self.unexpected(&[")"]));
                }
                Ok(inner)
            }
            _ => Err(self.unexpected(&["expression"])),
        }
    }
}

fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    let span = lhs.span.merge(rhs.span);
    Expr {
        node: ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    }
}

fn literal(lit: Lit, span: Span) -> Expr {
    Expr {
        node: ExprKind::Literal(lit),
        span,
    }
}

/// Strip the quotes and resolve the `\n \t \" \\` escapes of a string
/// literal lexeme. Unknown escapes are kept verbatim.
fn unescape_string(lexeme: &str) -> String {
    let inner = &lexeme[1..lexeme.len().saturating_sub(1)];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

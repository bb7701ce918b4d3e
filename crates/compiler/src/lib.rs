//! skt Compiler Library
//!
//! Four-stage pipeline from source text to P-code:
//!
//! 1. [`lexer`] — tokens with spans and lexical error recovery
//! 2. [`parser`] — recursive-descent parse with panic-mode recovery
//! 3. [`semantic`] — symbol table, scope resolution, type checking
//! 4. [`codegen`] — P-code for the stack VM in `skt-vm`
//!
//! Each stage is a pure function over its input and returns its artifact
//! together with a diagnostic list; a stage's artifact may be present even
//! when its diagnostics are not empty. [`compile`] chains the stages with
//! the standard gating: the parser tolerates lexical errors, semantic
//! analysis needs a tree, and code generation needs an analysis with zero
//! error-severity diagnostics.
//!
//! ```rust
//! use sktc::compile;
//!
//! let result = compile("main { int n; n = 2; cout << n * 21; }");
//! assert!(result.program.is_some());
//! ```

pub mod ast;
pub mod codegen;
pub mod lexer;
pub mod parser;
pub mod semantic;
pub mod symbol;
pub mod token;
pub mod typed;

pub use codegen::{generate, CodeGenError};
pub use lexer::{tokenize, tokenize_file, write_token_file};
pub use parser::{parse, ParseError, ParseErrorKind};
pub use semantic::{analyze, Analysis, SemanticError, SemanticErrorKind, Severity};
pub use symbol::{SymbolEntry, SymbolTable, GLOBAL_SCOPE};
pub use token::{ErrorToken, LexicalErrorKind, Span, Token, TokenKind};

use std::path::Path;

/// Everything the pipeline produced for one source text.
///
/// Later artifacts are `None` when their stage did not run; diagnostics are
/// cumulative across the stages that did.
#[derive(Debug)]
pub struct CompileResult {
    pub tokens: Vec<Token>,
    pub lex_errors: Vec<ErrorToken>,
    pub ast: Option<ast::Program>,
    pub parse_errors: Vec<ParseError>,
    pub analysis: Option<Analysis>,
    pub program: Option<skt_core::Program>,
    /// Set only when code generation itself failed; with the gating above
    /// this indicates a compiler bug, not a user error.
    pub codegen_error: Option<CodeGenError>,
}

impl CompileResult {
    /// True when every stage ran and produced a program.
    pub fn succeeded(&self) -> bool {
        self.program.is_some()
    }
}

/// Run the full pipeline over `source`.
pub fn compile(source: &str) -> CompileResult {
    let (tokens, lex_errors) = lexer::tokenize(source);
    let (ast, parse_errors) = parser::parse(&tokens);

    let analysis = ast.as_ref().map(semantic::analyze);

    let mut program = None;
    let mut codegen_error = None;
    if let Some(analysis) = &analysis {
        if !analysis.has_errors() {
            match codegen::generate(&analysis.typed, &analysis.symbols) {
                Ok(p) => program = Some(p),
                Err(e) => codegen_error = Some(e),
            }
        }
    }

    CompileResult {
        tokens,
        lex_errors,
        ast,
        parse_errors,
        analysis,
        program,
        codegen_error,
    }
}

/// Parse a source file that has already been tokenized to a `.sktt`
/// sidecar. The sidecar is informational and not round-trippable, so the
/// tokens are re-derived from the source; its presence gates the call.
pub fn parse_file(source_path: &Path) -> Result<(Option<ast::Program>, Vec<ParseError>), String> {
    let token_path = source_path.with_extension("sktt");
    if !token_path.exists() {
        return Err(format!(
            "archivo de tokens no encontrado: '{}'",
            token_path.display()
        ));
    }
    let (tokens, _) = lexer::tokenize_file(source_path)?;
    Ok(parser::parse(&tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_clean_program() {
        let result = compile("main { int n; n = 21; cout << n * 2; }");
        assert!(result.lex_errors.is_empty());
        assert!(result.parse_errors.is_empty());
        assert!(result.succeeded());
    }

    #[test]
    fn test_semantic_errors_block_codegen_but_not_analysis() {
        let result = compile("main { x = 1; }");
        let analysis = result.analysis.expect("analysis still runs");
        assert!(analysis.has_errors());
        assert!(result.program.is_none());
        assert!(result.codegen_error.is_none());
    }

    #[test]
    fn test_parser_tolerates_lexical_errors() {
        let result = compile("main { int x; x = 1 @ ; }");
        assert!(!result.lex_errors.is_empty());
        assert!(result.ast.is_some(), "a partial tree is still produced");
    }

    #[test]
    fn test_no_tree_means_no_analysis() {
        let result = compile("");
        assert!(result.ast.is_none());
        assert!(result.analysis.is_none());
        assert!(result.program.is_none());
    }

    #[test]
    fn test_parse_file_requires_token_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("programa.skt");
        std::fs::write(&source, "main { }").unwrap();

        let err = parse_file(&source).unwrap_err();
        assert!(err.contains("tokens no encontrado"), "got: {}", err);

        // with the sidecar present, parsing proceeds from the source bytes
        let (tokens, _) = tokenize("main { }");
        write_token_file(&source.with_extension("sktt"), &tokens).unwrap();
        let (ast, errors) = parse_file(&source).unwrap();
        assert!(ast.is_some());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_compile_is_deterministic() {
        let source = "main { int x; x = 1; if x > 0 { cout << \"positivo\"; } }";
        let a = compile(source);
        let b = compile(source);
        assert_eq!(a.tokens, b.tokens);
        assert_eq!(a.program, b.program);
    }
}

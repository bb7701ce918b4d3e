//! Token and lexical-error records produced by the scanner.

use serde::Serialize;
use std::fmt;

/// Token classification.
///
/// The variant names are wire identity for downstream tools (editors key
/// semantic highlighting off them), so serializers emit them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Integer,
    Real,
    Boolean,
    String,
    Identifier,
    ReservedWord,
    Comment,
    ArithmeticOperator,
    RelationalOperator,
    LogicalOperator,
    AssignmentOperator,
    ShiftOperator,
    Symbol,
    /// A rejected source slice; the matching diagnostic is an [`ErrorToken`].
    Error,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A source span. Lines and columns are 1-based; `end_column` is exclusive.
/// A tab advances the column by 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize, end_line: usize, end_column: usize) -> Self {
        debug_assert!(
            end_line > line || (end_line == line && end_column > column),
            "span must not be empty: {}:{}..{}:{}",
            line,
            column,
            end_line,
            end_column
        );
        Span {
            line,
            column,
            end_line,
            end_column,
        }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        let (line, column) = if (self.line, self.column) <= (other.line, other.column) {
            (self.line, self.column)
        } else {
            (other.line, other.column)
        };
        let (end_line, end_column) =
            if (self.end_line, self.end_column) >= (other.end_line, other.end_column) {
                (self.end_line, self.end_column)
            } else {
                (other.end_line, other.end_column)
            };
        Span {
            line,
            column,
            end_line,
            end_column,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An immutable token: classification, exact source slice, and span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    #[serde(flatten)]
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }
}

/// What went wrong while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LexicalErrorKind {
    IllegalCharacter,
    UnterminatedString,
    UnterminatedComment,
    MalformedNumber,
}

impl fmt::Display for LexicalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// An error token. The offending source slice is preserved in `lexeme` so
/// editors can underline exactly what the scanner rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorToken {
    pub kind: LexicalErrorKind,
    pub message: String,
    pub lexeme: String,
    #[serde(flatten)]
    pub span: Span,
}

/// The reserved words of the language, in no particular order.
pub const RESERVED_WORDS: &[&str] = &[
    "main", "if", "else", "while", "do", "int", "float", "bool", "string", "true", "false", "cin",
    "cout",
];

/// True when `word` is reserved.
pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge_takes_extremes() {
        let a = Span::new(1, 5, 1, 8);
        let b = Span::new(2, 1, 3, 4);
        let merged = a.merge(b);
        assert_eq!(merged, Span::new(1, 5, 3, 4));
        // merge is symmetric
        assert_eq!(b.merge(a), merged);
    }

    #[test]
    fn test_reserved_word_table() {
        assert!(is_reserved_word("while"));
        assert!(is_reserved_word("cout"));
        assert!(!is_reserved_word("whilex"));
        assert!(!is_reserved_word("Main"));
    }

    #[test]
    fn test_kind_names_are_wire_identity() {
        // Serialized names must match the published catalogue verbatim.
        let json = serde_json::to_string(&TokenKind::ArithmeticOperator).unwrap();
        assert_eq!(json, "\"ArithmeticOperator\"");
        let json = serde_json::to_string(&TokenKind::ReservedWord).unwrap();
        assert_eq!(json, "\"ReservedWord\"");
    }
}

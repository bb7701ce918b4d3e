//! Lexical analyzer.
//!
//! A DFA-style scanner that walks the source one code point at a time,
//! tracking 1-based line/column positions (tab counts as 4 visual columns).
//! It never fails: anything it cannot classify becomes an [`ErrorToken`] and
//! scanning resumes at the next character, so editors always get a full
//! token list for highlighting.

use crate::token::{is_reserved_word, ErrorToken, LexicalErrorKind, Span, Token, TokenKind};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Tab stop width in visual columns.
const TAB_WIDTH: usize = 4;

/// Scan `text` into an ordered token list plus an ordered error list.
///
/// Comment tokens are emitted (kind `Comment`) so editors can grey them
/// out, and rejected slices are emitted as `Error`-kind tokens so the
/// stream covers the whole source; the parser filters both. For identical
/// input the output is identical, span fields included.
pub fn tokenize(text: &str) -> (Vec<Token>, Vec<ErrorToken>) {
    let mut scanner = Scanner::new(text);
    scanner.run();
    (scanner.tokens, scanner.errors)
}

/// Read `path` and tokenize its contents.
pub fn tokenize_file(path: &Path) -> Result<(Vec<Token>, Vec<ErrorToken>), String> {
    let source = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read source file '{}': {}", path.display(), e))?;
    Ok(tokenize(&source))
}

/// Write the human-readable `.sktt` sidecar listing: one token per line,
/// span then kind then lexeme. Purely informational; nothing parses it back.
pub fn write_token_file(path: &Path, tokens: &[Token]) -> Result<(), String> {
    let mut out = String::new();
    for token in tokens {
        let _ = writeln!(
            out,
            "{}:{}-{}:{}\t{}\t{}",
            token.span.line,
            token.span.column,
            token.span.end_line,
            token.span.end_column,
            token.kind,
            token.lexeme.escape_default()
        );
    }
    fs::write(path, out)
        .map_err(|e| format!("Failed to write token file '{}': {}", path.display(), e))
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    errors: Vec<ErrorToken>,
}

impl Scanner {
    fn new(text: &str) -> Self {
        Scanner {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn run(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '/' if self.peek_at(1) == Some('/') => self.line_comment(),
                '/' if self.peek_at(1) == Some('*') => self.block_comment(),
                '"' => self.string_literal(),
                '0'..='9' => self.number(),
                'a'..='z' | 'A'..='Z' | '_' => self.word(),
                _ => self.operator_or_illegal(),
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// Consume one character, updating the position bookkeeping.
    fn advance(&mut self) -> char {
        let c = self.chars[self.pos];
        self.pos += 1;
        match c {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\t' => self.column += TAB_WIDTH,
            _ => self.column += 1,
        }
        c
    }

    fn mark(&self) -> (usize, usize, usize) {
        (self.pos, self.line, self.column)
    }

    fn span_from(&self, mark: (usize, usize, usize)) -> Span {
        Span::new(mark.1, mark.2, self.line, self.column)
    }

    fn lexeme_from(&self, mark: (usize, usize, usize)) -> String {
        self.chars[mark.0..self.pos].iter().collect()
    }

    fn push_token(&mut self, kind: TokenKind, mark: (usize, usize, usize)) {
        let token = Token::new(kind, self.lexeme_from(mark), self.span_from(mark));
        self.tokens.push(token);
    }

    /// Record a lexical error. The offending slice also enters the main
    /// token stream as an `Error`-kind token so the stream stays contiguous
    /// over the source; the parser filters those out.
    fn push_error(&mut self, kind: LexicalErrorKind, message: String, mark: (usize, usize, usize)) {
        let lexeme = self.lexeme_from(mark);
        let span = self.span_from(mark);
        self.tokens
            .push(Token::new(TokenKind::Error, lexeme.clone(), span));
        self.errors.push(ErrorToken {
            kind,
            message,
            lexeme,
            span,
        });
    }

    fn line_comment(&mut self) {
        let mark = self.mark();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        self.push_token(TokenKind::Comment, mark);
    }

    /// Block comments do not nest: the first `*/` closes the comment.
    fn block_comment(&mut self) {
        let mark = self.mark();
        self.advance(); // /
        self.advance(); // *
        loop {
            match self.peek() {
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    self.push_token(TokenKind::Comment, mark);
                    return;
                }
                Some(_) => {
                    self.advance();
                }
                None => {
                    self.push_error(
                        LexicalErrorKind::UnterminatedComment,
                        "block comment is never closed (expected '*/')".to_string(),
                        mark,
                    );
                    return;
                }
            }
        }
    }

    /// String literal with `\n \t \" \\` escapes. A raw newline or EOF
    /// before the closing quote yields one `UnterminatedString` error token.
    fn string_literal(&mut self) {
        let mark = self.mark();
        self.advance(); // opening quote
        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    self.push_token(TokenKind::String, mark);
                    return;
                }
                Some('\\') if matches!(self.peek_at(1), Some('n' | 't' | '"' | '\\')) => {
                    self.advance();
                    self.advance();
                }
                Some('\n') | None => {
                    self.push_error(
                        LexicalErrorKind::UnterminatedString,
                        "string literal is never closed (expected '\"')".to_string(),
                        mark,
                    );
                    return;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// A digit run, optionally `.` plus a digit run. The sign is never part
    /// of the literal; a dangling `.` makes the whole run malformed.
    fn number(&mut self) {
        let mark = self.mark();
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }
        if self.peek() == Some('.') {
            if matches!(self.peek_at(1), Some('0'..='9')) {
                self.advance(); // .
                while matches!(self.peek(), Some('0'..='9')) {
                    self.advance();
                }
                self.push_token(TokenKind::Real, mark);
            } else {
                self.advance(); // take the dangling dot into the error slice
                let lexeme = self.lexeme_from(mark);
                self.push_error(
                    LexicalErrorKind::MalformedNumber,
                    format!("'{}' is not a valid number (digits must follow '.')", lexeme),
                    mark,
                );
            }
            return;
        }
        let lexeme = self.lexeme_from(mark);
        if lexeme.parse::<i64>().is_ok() {
            self.push_token(TokenKind::Integer, mark);
        } else {
            self.push_error(
                LexicalErrorKind::MalformedNumber,
                format!("integer literal '{}' does not fit in 64 bits", lexeme),
                mark,
            );
        }
    }

    fn word(&mut self) {
        let mark = self.mark();
        while matches!(self.peek(), Some('a'..='z' | 'A'..='Z' | '0'..='9' | '_')) {
            self.advance();
        }
        let lexeme = self.lexeme_from(mark);
        let kind = match lexeme.as_str() {
            "true" | "false" => TokenKind::Boolean,
            w if is_reserved_word(w) => TokenKind::ReservedWord,
            _ => TokenKind::Identifier,
        };
        self.push_token(kind, mark);
    }

    /// Longest-match operator scan; anything left over is one
    /// `IllegalCharacter` error token spanning exactly that code point.
    fn operator_or_illegal(&mut self) {
        let mark = self.mark();
        let first = self.chars[self.pos];
        let second = self.peek_at(1);

        if let Some(second) = second {
            let pair: String = [first, second].iter().collect();
            if let Some(kind) = two_char_operator(&pair) {
                self.advance();
                self.advance();
                self.push_token(kind, mark);
                return;
            }
        }
        if let Some(kind) = single_char_operator(first) {
            self.advance();
            self.push_token(kind, mark);
            return;
        }

        self.advance();
        self.push_error(
            LexicalErrorKind::IllegalCharacter,
            format!("illegal character '{}'", first),
            mark,
        );
    }
}

fn two_char_operator(pair: &str) -> Option<TokenKind> {
    match pair {
        "==" | "!=" | "<=" | ">=" => Some(TokenKind::RelationalOperator),
        "&&" | "||" => Some(TokenKind::LogicalOperator),
        "<<" | ">>" => Some(TokenKind::ShiftOperator),
        "+=" | "-=" | "*=" | "/=" | "%=" | "^=" => Some(TokenKind::AssignmentOperator),
        "++" | "--" => Some(TokenKind::ArithmeticOperator),
        _ => None,
    }
}

fn single_char_operator(c: char) -> Option<TokenKind> {
    match c {
        '+' | '-' | '*' | '/' | '%' | '^' => Some(TokenKind::ArithmeticOperator),
        '<' | '>' => Some(TokenKind::RelationalOperator),
        '=' => Some(TokenKind::AssignmentOperator),
        '!' => Some(TokenKind::LogicalOperator),
        ';' | ',' | '{' | '}' | '(' | ')' => Some(TokenKind::Symbol),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, _) = tokenize(source);
        tokens.iter().map(|t| t.kind).collect()
    }

    fn lexemes(source: &str) -> Vec<String> {
        let (tokens, _) = tokenize(source);
        tokens.into_iter().map(|t| t.lexeme).collect()
    }

    #[test]
    fn test_classifies_reserved_words_and_identifiers() {
        assert_eq!(
            kinds("main contador"),
            vec![TokenKind::ReservedWord, TokenKind::Identifier]
        );
        // reserved words are case-sensitive
        assert_eq!(kinds("Main"), vec![TokenKind::Identifier]);
    }

    #[test]
    fn test_boolean_literals_are_their_own_kind() {
        assert_eq!(kinds("true false"), vec![TokenKind::Boolean, TokenKind::Boolean]);
    }

    #[test]
    fn test_numeric_literals() {
        assert_eq!(kinds("42"), vec![TokenKind::Integer]);
        assert_eq!(kinds("3.25"), vec![TokenKind::Real]);
        // sign is a separate operator token
        assert_eq!(
            kinds("-7"),
            vec![TokenKind::ArithmeticOperator, TokenKind::Integer]
        );
    }

    #[test]
    fn test_dangling_dot_is_malformed_number() {
        let (tokens, errors) = tokenize("12.");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexicalErrorKind::MalformedNumber);
        assert_eq!(errors[0].lexeme, "12.");
        // the rejected slice stays in the token stream as an Error token
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].lexeme, "12.");
    }

    #[test]
    fn test_integer_overflow_is_malformed_number() {
        let (_, errors) = tokenize("99999999999999999999");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexicalErrorKind::MalformedNumber);
    }

    #[test]
    fn test_longest_match_operators() {
        assert_eq!(
            lexemes("<= << < = == +="),
            vec!["<=", "<<", "<", "=", "==", "+="]
        );
        assert_eq!(lexemes("x++;"), vec!["x", "++", ";"]);
    }

    #[test]
    fn test_operator_kinds() {
        assert_eq!(kinds("+"), vec![TokenKind::ArithmeticOperator]);
        assert_eq!(kinds("&&"), vec![TokenKind::LogicalOperator]);
        assert_eq!(kinds(">>"), vec![TokenKind::ShiftOperator]);
        assert_eq!(kinds("%="), vec![TokenKind::AssignmentOperator]);
        assert_eq!(kinds("{"), vec![TokenKind::Symbol]);
    }

    #[test]
    fn test_line_and_column_tracking() {
        let (tokens, _) = tokenize("int x;\n\ty = 4;");
        // "int" at 1:1..1:4
        assert_eq!(tokens[0].span, Span::new(1, 1, 1, 4));
        // "x" at 1:5
        assert_eq!(tokens[1].span.column, 5);
        // tab counts four columns, so "y" lands at 2:5
        assert_eq!(tokens[3].span.line, 2);
        assert_eq!(tokens[3].span.column, 5);
    }

    #[test]
    fn test_string_literal_with_escapes() {
        let (tokens, errors) = tokenize(r#""hola \"skt\"\n""#);
        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, r#""hola \"skt\"\n""#);
    }

    #[test]
    fn test_unterminated_string_stops_at_newline() {
        let (tokens, errors) = tokenize("\"sin cerrar\nint");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexicalErrorKind::UnterminatedString);
        assert_eq!(errors[0].span.end_line, 1);
        // scanning resumes after the newline
        assert_eq!(tokens.last().unwrap().lexeme, "int");
    }

    #[test]
    fn test_comments_are_tokens() {
        let (tokens, errors) = tokenize("// nota\nint /* bloque */ x");
        assert!(errors.is_empty());
        let comment_count = tokens.iter().filter(|t| t.kind == TokenKind::Comment).count();
        assert_eq!(comment_count, 2);
    }

    #[test]
    fn test_block_comments_do_not_nest() {
        let (tokens, errors) = tokenize("/* a /* b */ x");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].lexeme, "/* a /* b */");
        assert_eq!(tokens[1].lexeme, "x");
    }

    #[test]
    fn test_unterminated_block_comment_spans_to_eof() {
        let (tokens, errors) = tokenize("int /* nunca\ntermina");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexicalErrorKind::UnterminatedComment);
        assert_eq!(errors[0].span.end_line, 2);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].kind, TokenKind::Error);
    }

    #[test]
    fn test_illegal_character_spans_one_code_point() {
        let (tokens, errors) = tokenize("x @ y");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexicalErrorKind::IllegalCharacter);
        assert_eq!(errors[0].lexeme, "@");
        assert_eq!(errors[0].span, Span::new(1, 3, 1, 4));
        // recovery continues with the next token; the '@' slice survives
        // in the stream as an Error token between its neighbors
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TokenKind::Identifier, TokenKind::Error, TokenKind::Identifier]
        );
    }

    #[test]
    fn test_span_order_invariant() {
        let (tokens, _) = tokenize("main {\n  int x;\n  x = 1 + 2;\n}\n");
        for t in &tokens {
            assert!(
                (t.span.line, t.span.column) <= (t.span.end_line, t.span.end_column),
                "bad span on {:?}",
                t
            );
            assert!(t.span.end_line >= t.span.line);
            if t.span.end_line == t.span.line {
                assert!(t.span.end_column > t.span.column);
            }
        }
    }

    #[test]
    fn test_tokenize_is_idempotent() {
        let source = "main { int x; x = 3 ^ 2; cout << x; }";
        assert_eq!(tokenize(source), tokenize(source));
    }

    #[test]
    fn test_tokens_reconstruct_source_without_whitespace() {
        let source = "main{int x;// c\nx=1.5;/* b */}";
        let (tokens, errors) = tokenize(source);
        assert!(errors.is_empty());
        let rebuilt: String = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        let stripped: String = source.split_whitespace().collect();
        assert_eq!(
            rebuilt.split_whitespace().collect::<String>(),
            stripped,
            "lexemes must cover the source minus whitespace"
        );
    }

    #[test]
    fn test_tokens_reconstruct_source_with_illegal_characters() {
        // Error tokens keep the stream contiguous, so reconstruction holds
        // even for input the scanner rejects.
        let source = "main{x=@1;#}";
        let (tokens, errors) = tokenize(source);
        assert_eq!(errors.len(), 2);
        let rebuilt: String = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_tokenize_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("programa.skt");
        std::fs::write(&path, "main { int x; }").unwrap();
        let (from_file, errors) = tokenize_file(&path).unwrap();
        assert!(errors.is_empty());
        let (from_buffer, _) = tokenize("main { int x; }");
        assert_eq!(from_file, from_buffer);
    }

    #[test]
    fn test_token_file_sidecar_lists_every_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("programa.sktt");
        let (tokens, _) = tokenize("main { }");
        write_token_file(&path, &tokens).unwrap();
        let listing = std::fs::read_to_string(&path).unwrap();
        assert_eq!(listing.lines().count(), tokens.len());
        assert!(listing.contains("ReservedWord"));
    }

    #[test]
    fn test_tokenizing_many_statements_is_fast() {
        let mut source = String::from("main {\n");
        for i in 0..100 {
            source.push_str(&format!("int var_{0}; var_{0} = {0};\n", i));
        }
        source.push('}');
        let started = std::time::Instant::now();
        let (tokens, errors) = tokenize(&source);
        assert!(errors.is_empty());
        assert!(tokens.len() > 700);
        assert!(started.elapsed().as_millis() < 1000);
    }
}

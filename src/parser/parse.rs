//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including the error type, helper methods, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, statement recovery
//! - `declarations`: top-level items, variable and container declarations
//! - `statements`: control flow, output and other statements
//! - `expressions`: expressions with precedence climbing
//!
//! # Error Recovery
//!
//! A statement that fails to parse does not abort the program. The parser
//! records it as [`StmtKind::Unsupported`] and resynchronizes at the next `;`
//! or block boundary, so the transformer can surface it as a diagnostic and
//! the rest of the program still runs up to that point.

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token};
use thiserror::Error;

/// Parser error type
#[derive(Debug, Clone, Error)]
#[error("Parse error at line {}, column {}: {message}", .location.line, .location.column)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Recursive descent parser for the restricted language
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse the entire program
    ///
    /// Never fails: statements that cannot be parsed become
    /// [`StmtKind::Unsupported`] items.
    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::new();

        while !self.is_at_end() {
            let start = self.position;
            let location = self.current_location();
            match self.parse_item() {
                Ok(items) => program.items.extend(items),
                Err(err) => {
                    self.synchronize();
                    if self.position == start || self.check(&Token::RBrace(location)) {
                        self.advance();
                    }
                    program
                        .items
                        .push(Item::Statement(self.finish_stmt(Self::unsupported(err), location)));
                }
            }
        }

        program
    }

    /// Parse one statement, turning a parse failure into an `Unsupported` statement
    pub(crate) fn parse_statement_recovering(&mut self) -> Vec<Stmt> {
        let start = self.position;
        let location = self.current_location();
        match self.parse_statement() {
            Ok(stmts) => stmts,
            Err(err) => {
                self.synchronize();
                if self.position == start {
                    self.advance();
                }
                vec![self.finish_stmt(Self::unsupported(err), location)]
            }
        }
    }

    fn unsupported(err: ParseError) -> StmtKind {
        StmtKind::Unsupported {
            reason: err.message,
        }
    }

    /// Skip to the end of the broken statement: past the next `;` at brace
    /// depth zero, past a block that was entered, or up to the `}` closing
    /// the enclosing block.
    pub(crate) fn synchronize(&mut self) {
        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.peek_token() {
                Token::LBrace(_) => depth += 1,
                Token::RBrace(_) => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        self.match_token(&Token::Semicolon(self.current_location()));
                        return;
                    }
                }
                Token::Semicolon(_) if depth == 0 => {
                    self.advance();
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Wrap a parsed statement with its line bookkeeping
    pub(crate) fn finish_stmt(&self, kind: StmtKind, location: SourceLocation) -> Stmt {
        let end_line = if self.position > 0 {
            self.previous_location().line.max(location.line)
        } else {
            location.line
        };
        Stmt {
            kind,
            location,
            end_line,
            ends_line: self.leaves_line(end_line),
        }
    }

    /// Whether the next token starts on a later line than `line`
    pub(crate) fn leaves_line(&self, line: usize) -> bool {
        self.is_at_end() || self.current_location().line > line
    }

    /// Parse a braced block, recording whether its `}` stands alone on its line
    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.expect_lbrace("to open block")?;

        let mut statements = Vec::new();
        while !self.check(&Token::RBrace(self.current_location())) && !self.is_at_end() {
            statements.extend(self.parse_statement_recovering());
        }

        let close = self.current_location();
        let before = self.previous_location().line;
        self.expect_rbrace("to close block")?;

        let after_alone = match self.peek() {
            Token::Semicolon(loc) if loc.line == close.line => match self.peek_ahead(1) {
                Some(Token::Eof(_)) | None => true,
                Some(next) => next.location().line > close.line,
            },
            _ => self.leaves_line(close.line),
        };

        Ok(Block {
            statements,
            braced: true,
            close: Some(close),
            close_alone: before < close.line && after_alone,
        })
    }

    /// Parse a control-flow body: a braced block or a single statement
    pub(crate) fn parse_body(&mut self) -> Result<Block, ParseError> {
        if self.check(&Token::LBrace(self.current_location())) {
            self.parse_block()
        } else {
            Ok(Block::unbraced(self.parse_statement()?))
        }
    }

    // ===== Helper methods =====

    /// Consume a `std::` qualifier if present
    pub(crate) fn skip_std_prefix(&mut self) {
        if self.is_std_prefix() {
            self.advance();
            self.advance();
        }
    }

    pub(crate) fn is_std_prefix(&self) -> bool {
        matches!(self.peek(), Token::Ident(name, _) if name == "std")
            && matches!(self.peek_ahead(1), Some(Token::ColonColon(_)))
    }

    /// Identifier at `offset` tokens ahead, looking through a `std::` prefix
    pub(crate) fn ident_after_std(&self, offset: usize) -> Option<(&str, usize)> {
        match self.peek_ahead(offset) {
            Some(Token::Ident(name, _)) if name == "std" => {
                match (self.peek_ahead(offset + 1), self.peek_ahead(offset + 2)) {
                    (Some(Token::ColonColon(_)), Some(Token::Ident(inner, _))) => {
                        Some((inner.as_str(), offset + 3))
                    }
                    _ => Some(("std", offset + 1)),
                }
            }
            Some(Token::Ident(name, _)) => Some((name.as_str(), offset + 1)),
            _ => None,
        }
    }

    pub(crate) fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    pub(crate) fn check_ahead(&self, n: usize, token: &Token) -> bool {
        self.peek_ahead(n)
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub(crate) fn peek_token(&self) -> Token {
        self.tokens[self.position].clone()
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.previous().location()
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    pub(crate) fn error<T>(&self, message: impl Into<String>) -> Result<T, ParseError> {
        Err(ParseError {
            message: message.into(),
            location: self.current_location(),
        })
    }

    pub(crate) fn expect_token(&mut self, token: &Token, message: &str) -> Result<(), ParseError> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            self.error(format!("{}, found {}", message, self.peek()))
        }
    }

    pub(crate) fn expect_lparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::LParen(self.current_location()),
            &format!("Expected '(' {ctx}"),
        )
    }

    pub(crate) fn expect_rparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::RParen(self.current_location()),
            &format!("Expected ')' {ctx}"),
        )
    }

    pub(crate) fn expect_lbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::LBrace(self.current_location()),
            &format!("Expected '{{' {ctx}"),
        )
    }

    pub(crate) fn expect_rbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::RBrace(self.current_location()),
            &format!("Expected '}}' {ctx}"),
        )
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::Semicolon(self.current_location()),
            &format!("Expected ';' {ctx}"),
        )
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let Token::Ident(name, _) = self.peek_token() {
            self.advance();
            Ok(name)
        } else {
            self.error(format!("Expected identifier, found {}", self.peek()))
        }
    }
}

/// Source spelling of a type-ish token, used to describe parameter types
pub(crate) fn spelling(token: &Token) -> Option<&str> {
    Some(match token {
        Token::Ident(name, _) => name.as_str(),
        Token::Int(_) => "int",
        Token::Float(_) => "float",
        Token::Double(_) => "double",
        Token::Long(_) => "long",
        Token::Short(_) => "short",
        Token::Char(_) => "char",
        Token::Bool(_) => "bool",
        Token::StringType(_) => "string",
        Token::Void(_) => "void",
        Token::Auto(_) => "auto",
        Token::Const(_) => "const",
        Token::Struct(_) => "struct",
        Token::Class(_) => "class",
        Token::Star(_) => "*",
        Token::Amp(_) => "&",
        Token::Lt(_) => "<",
        Token::Gt(_) => ">",
        Token::ColonColon(_) => "::",
        Token::LBracket(_) => "[",
        Token::RBracket(_) => "]",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        Parser::new(source).unwrap().parse_program()
    }

    #[test]
    fn test_parse_simple_function() {
        let program = parse("int main() { return 0; }");

        assert_eq!(program.items.len(), 1);
        match &program.items[0] {
            Item::Function(FunctionDef {
                name,
                params,
                return_type,
                body,
                ..
            }) => {
                assert_eq!(name, "main");
                assert!(params.is_empty());
                assert_eq!(return_type, "int");
                assert_eq!(body.statements.len(), 1);
            }
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_close_brace_alone() {
        let program = parse("int main() {\n  int x = 1;\n}\n");
        let Item::Function(f) = &program.items[0] else {
            panic!("Expected function");
        };
        assert!(f.body.close_alone);
        assert_eq!(f.body.close.map(|l| l.line), Some(3));

        let program = parse("int main() { int x = 1; }");
        let Item::Function(f) = &program.items[0] else {
            panic!("Expected function");
        };
        assert!(!f.body.close_alone);
    }

    #[test]
    fn test_statements_sharing_a_line() {
        let program = parse("int main() {\n  int a = 1; int b = 2;\n}");
        let Item::Function(f) = &program.items[0] else {
            panic!("Expected function");
        };
        assert!(!f.body.statements[0].ends_line);
        assert!(f.body.statements[1].ends_line);
    }

    #[test]
    fn test_recovery_keeps_following_statements() {
        let program = parse("int main() {\n  int x = ;\n  int y = 2;\n}");
        let Item::Function(f) = &program.items[0] else {
            panic!("Expected function");
        };
        assert_eq!(f.body.statements.len(), 2);
        assert!(matches!(
            f.body.statements[0].kind,
            StmtKind::Unsupported { .. }
        ));
        assert!(matches!(
            f.body.statements[1].kind,
            StmtKind::VarDecl { ref name, .. } if name == "y"
        ));
    }

    #[test]
    fn test_top_level_garbage_does_not_loop() {
        let program = parse("}\nint main() {}\n");
        assert!(program.functions().any(|f| f.name == "main"));
    }
}

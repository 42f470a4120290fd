//! Statement parsing implementation
//!
//! This module handles parsing of statements:
//!
//! - Declarations (delegated to `declarations`)
//! - Control flow: `if`/`else`, `while`, `for`, `return`, `break`, `continue`
//! - Output: `cout << a << b << endl;`
//! - `delete p;`
//! - Expression statements and nested blocks
//!
//! Every statement comes back wrapped in a [`Stmt`] carrying its first
//! location, its last line, and whether anything follows it on that line.
//! Pause injection is driven entirely by that bookkeeping.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse a statement; declarations with several declarators yield several
    pub(crate) fn parse_statement(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let start = self.current_location();

        if self.starts_declaration() {
            return self.parse_declaration();
        }

        let kind = match self.peek_token() {
            Token::LBrace(_) => StmtKind::Block(self.parse_block()?),
            Token::If(_) => self.parse_if()?,
            Token::While(_) => self.parse_while()?,
            Token::For(_) => self.parse_for()?,
            Token::Return(_) => {
                self.advance();
                let value = if self.check(&Token::Semicolon(self.current_location())) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.expect_semicolon("after return")?;
                StmtKind::Return(value)
            }
            Token::Break(_) => {
                self.advance();
                self.expect_semicolon("after 'break'")?;
                StmtKind::Break
            }
            Token::Continue(_) => {
                self.advance();
                self.expect_semicolon("after 'continue'")?;
                StmtKind::Continue
            }
            Token::Delete(_) => {
                self.advance();
                if self.match_token(&Token::LBracket(self.current_location())) {
                    self.expect_token(
                        &Token::RBracket(self.current_location()),
                        "Expected ']' after 'delete['",
                    )?;
                }
                let target = self.parse_expression()?;
                self.expect_semicolon("after delete")?;
                StmtKind::Delete(target)
            }
            Token::Semicolon(_) => {
                self.advance();
                StmtKind::Empty
            }
            _ if self.starts_print() => self.parse_print()?,
            _ if self.starts_input() => {
                return self.error("Input streams are not supported");
            }
            _ => {
                let expr = self.parse_expression()?;
                self.expect_semicolon("after expression")?;
                StmtKind::Expr(expr)
            }
        };

        Ok(vec![self.finish_stmt(kind, start)])
    }

    /// Parse if statement; `else if` chains nest as unbraced else bodies
    fn parse_if(&mut self) -> Result<StmtKind, ParseError> {
        self.advance(); // consume 'if'
        self.expect_lparen("after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect_rparen("after if condition")?;

        let then_block = self.parse_body()?;

        let (else_block, else_location) = if self.match_token(&Token::Else(self.current_location())) {
            let else_location = self.previous_location();
            (Some(self.parse_body()?), Some(else_location))
        } else {
            (None, None)
        };

        Ok(StmtKind::If {
            condition,
            then_block,
            else_block,
            else_location,
        })
    }

    fn parse_while(&mut self) -> Result<StmtKind, ParseError> {
        self.advance(); // consume 'while'
        self.expect_lparen("after 'while'")?;
        let condition = self.parse_expression()?;
        self.expect_rparen("after while condition")?;

        let body = self.parse_body()?;

        Ok(StmtKind::While { condition, body })
    }

    fn parse_for(&mut self) -> Result<StmtKind, ParseError> {
        self.advance(); // consume 'for'
        self.expect_lparen("after 'for'")?;

        // Init (declaration or expression)
        let init = if self.match_token(&Token::Semicolon(self.current_location())) {
            Vec::new()
        } else if self.starts_declaration() {
            self.parse_declaration()?
        } else {
            let start = self.current_location();
            let expr = self.parse_expression()?;
            self.expect_semicolon("after for initializer")?;
            vec![self.finish_stmt(StmtKind::Expr(expr), start)]
        };

        // Condition
        let condition = if self.check(&Token::Semicolon(self.current_location())) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_semicolon("after for condition")?;

        // Step
        let step = if self.check(&Token::RParen(self.current_location())) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_rparen("after for clauses")?;

        let body = self.parse_body()?;

        Ok(StmtKind::For {
            init,
            condition,
            step,
            body,
        })
    }

    fn starts_print(&self) -> bool {
        matches!(self.ident_after_std(0), Some(("cout", _)))
    }

    fn starts_input(&self) -> bool {
        matches!(self.ident_after_std(0), Some(("cin", _)))
    }

    fn is_endl(&self) -> bool {
        matches!(self.ident_after_std(0), Some(("endl", _)))
    }

    /// `cout << e1 << e2 ...;`
    ///
    /// A terminal `endl` is dropped; an `endl` in the middle of the chain is
    /// kept as a newline string so the output text stays faithful.
    fn parse_print(&mut self) -> Result<StmtKind, ParseError> {
        self.skip_std_prefix();
        self.advance(); // consume 'cout'

        let mut args: Vec<Option<Expr>> = Vec::new();
        while self.match_token(&Token::LtLt(self.current_location())) {
            if self.is_endl() {
                self.skip_std_prefix();
                self.advance();
                args.push(None);
            } else {
                args.push(Some(self.parse_expression()?));
            }
        }

        if args.is_empty() {
            return self.error("Expected '<<' after 'cout'");
        }
        self.expect_semicolon("after output statement")?;

        if matches!(args.last(), Some(None)) {
            args.pop();
        }

        let loc = self.previous_location();
        Ok(StmtKind::Print {
            args: args
                .into_iter()
                .map(|arg| arg.unwrap_or_else(|| Expr::StringLiteral("\n".to_string(), loc)))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn body_of(source: &str) -> Vec<Stmt> {
        let program = Parser::new(source).unwrap().parse_program();
        let body = program
            .functions()
            .next()
            .map(|f| f.body.statements.clone())
            .unwrap_or_default();
        body
    }

    #[test]
    fn test_print_strips_terminal_endl() {
        let stmts = body_of("int main() {\n cout << \"x = \" << x << endl;\n}");
        match &stmts[0].kind {
            StmtKind::Print { args } => assert_eq!(args.len(), 2),
            other => panic!("Expected print, got {:?}", other),
        }
    }

    #[test]
    fn test_print_keeps_middle_endl() {
        let stmts = body_of("int main() {\n std::cout << 1 << std::endl << 2;\n}");
        match &stmts[0].kind {
            StmtKind::Print { args } => {
                assert_eq!(args.len(), 3);
                assert!(matches!(&args[1], Expr::StringLiteral(s, _) if s == "\n"));
            }
            other => panic!("Expected print, got {:?}", other),
        }
    }

    #[test]
    fn test_else_if_chain() {
        let stmts = body_of(
            "int main() {\n if (x > 5) {\n  x = 1;\n } else if (x > 2) {\n  x = 2;\n } else {\n  x = 3;\n }\n}",
        );
        let StmtKind::If {
            else_block: Some(else_block),
            else_location: Some(else_location),
            ..
        } = &stmts[0].kind
        else {
            panic!("Expected if with else");
        };
        assert_eq!(else_location.line, 4);
        assert!(!else_block.braced);
        assert!(matches!(else_block.statements[0].kind, StmtKind::If { .. }));
    }

    #[test]
    fn test_for_with_declaration() {
        let stmts = body_of("int main() {\n for (int i = 0; i < 3; i++) {\n  x += i;\n }\n}");
        match &stmts[0].kind {
            StmtKind::For {
                init,
                condition,
                step,
                body,
            } => {
                assert_eq!(init.len(), 1);
                assert!(condition.is_some());
                assert!(step.is_some());
                assert!(body.braced && body.close_alone);
            }
            other => panic!("Expected for, got {:?}", other),
        }
    }

    #[test]
    fn test_input_stream_is_unsupported() {
        let stmts = body_of("int main() {\n cin >> x;\n}");
        assert!(matches!(stmts[0].kind, StmtKind::Unsupported { .. }));
    }

    #[test]
    fn test_delete() {
        let stmts = body_of("int main() {\n delete p;\n delete[] arr;\n}");
        assert!(matches!(stmts[0].kind, StmtKind::Delete(_)));
        assert!(matches!(stmts[1].kind, StmtKind::Delete(_)));
    }
}

//! Expression parsing implementation
//!
//! This module handles parsing of expressions using precedence climbing
//! for binary operators and recursive descent for other expression forms.
//!
//! # Supported Expressions
//!
//! - Literals: integers, floats, characters, strings, `true`/`false`, `nullptr`
//! - Identifiers, optionally `std::`-qualified
//! - Binary operators: arithmetic, comparison, logical
//! - Unary operators: `-`, `!`, `&`, `*`, `++`, `--`
//! - Postfix: `[]`, `.`, `->`, `()`, `++`, `--`
//! - Ternary: `? :`
//! - Allocation: `new T()`
//!
//! `<<` is deliberately absent: it only appears in output statements, which
//! the statement parser handles.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{spelling, ParseError, Parser};

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    /// Parse assignment or ternary (right-associative)
    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_ternary()?;

        let loc = self.current_location();
        let op = match self.peek() {
            Token::Eq(_) => None,
            Token::PlusEq(_) => Some(BinOp::Add),
            Token::MinusEq(_) => Some(BinOp::Sub),
            Token::StarEq(_) => Some(BinOp::Mul),
            Token::SlashEq(_) => Some(BinOp::Div),
            Token::PercentEq(_) => Some(BinOp::Mod),
            _ => return Ok(expr),
        };
        self.advance();

        let value = Box::new(self.parse_assignment()?);
        Ok(Expr::Assign {
            target: Box::new(expr),
            op,
            value,
            location: loc,
        })
    }

    /// Parse ternary: condition ? then_expr : else_expr
    fn parse_ternary(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_logical_or()?;

        if self.match_token(&Token::Question(self.current_location())) {
            let loc = self.previous_location();
            let then_expr = Box::new(self.parse_expression()?);
            self.expect_token(
                &Token::Colon(self.current_location()),
                "Expected ':' in ternary expression",
            )?;
            let else_expr = Box::new(self.parse_ternary()?);

            return Ok(Expr::Ternary {
                condition: Box::new(expr),
                then_expr,
                else_expr,
                location: loc,
            });
        }

        Ok(expr)
    }

    /// Parse logical OR (||)
    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_logical_and()?;

        while self.match_token(&Token::OrOr(self.current_location())) {
            let loc = self.previous_location();
            let right = Box::new(self.parse_logical_and()?);
            left = Expr::Binary {
                op: BinOp::Or,
                left: Box::new(left),
                right,
                location: loc,
            };
        }

        Ok(left)
    }

    /// Parse logical AND (&&)
    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;

        while self.match_token(&Token::AndAnd(self.current_location())) {
            let loc = self.previous_location();
            let right = Box::new(self.parse_equality()?);
            left = Expr::Binary {
                op: BinOp::And,
                left: Box::new(left),
                right,
                location: loc,
            };
        }

        Ok(left)
    }

    /// Parse one left-associative precedence level
    fn parse_binary_level(
        &mut self,
        ops: fn(&Token) -> Option<BinOp>,
        next: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let mut left = next(self)?;

        while let Some(op) = ops(self.peek()) {
            let loc = self.current_location();
            self.advance();
            let right = Box::new(next(self)?);
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right,
                location: loc,
            };
        }

        Ok(left)
    }

    /// Parse equality (== !=)
    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            |t| match t {
                Token::EqEq(_) => Some(BinOp::Eq),
                Token::NotEq(_) => Some(BinOp::Ne),
                _ => None,
            },
            Self::parse_relational,
        )
    }

    /// Parse relational (< <= > >=)
    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            |t| match t {
                Token::Lt(_) => Some(BinOp::Lt),
                Token::Le(_) => Some(BinOp::Le),
                Token::Gt(_) => Some(BinOp::Gt),
                Token::Ge(_) => Some(BinOp::Ge),
                _ => None,
            },
            Self::parse_additive,
        )
    }

    /// Parse additive (+ -)
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            |t| match t {
                Token::Plus(_) => Some(BinOp::Add),
                Token::Minus(_) => Some(BinOp::Sub),
                _ => None,
            },
            Self::parse_multiplicative,
        )
    }

    /// Parse multiplicative (* / %)
    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            |t| match t {
                Token::Star(_) => Some(BinOp::Mul),
                Token::Slash(_) => Some(BinOp::Div),
                Token::Percent(_) => Some(BinOp::Mod),
                _ => None,
            },
            Self::parse_unary,
        )
    }

    /// Parse unary (! - + & * ++ -- new)
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let loc = self.current_location();

        if self.match_token(&Token::Plus(loc)) {
            // Unary plus: just return the operand
            return self.parse_unary();
        }

        if self.check(&Token::New(loc)) {
            return self.parse_new();
        }

        let op = match self.peek() {
            Token::Bang(_) => Some(UnOp::Not),
            Token::Minus(_) => Some(UnOp::Neg),
            Token::Amp(_) => Some(UnOp::AddrOf),
            Token::Star(_) => Some(UnOp::Deref),
            Token::PlusPlus(_) => Some(UnOp::PreInc),
            Token::MinusMinus(_) => Some(UnOp::PreDec),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let operand = Box::new(self.parse_unary()?);
            return Ok(Expr::Unary {
                op,
                operand,
                location: loc,
            });
        }

        self.parse_postfix()
    }

    /// `new T`, `new T()`, `new T(args)`
    fn parse_new(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        self.advance(); // consume 'new'
        self.skip_std_prefix();

        let type_name = match spelling(self.peek()) {
            Some(name) if self.peek().is_primitive_type() || matches!(self.peek(), Token::Ident(..)) => {
                name.to_string()
            }
            _ => return self.error(format!("Expected type name after 'new', found {}", self.peek())),
        };
        self.advance();

        if self.check(&Token::LBracket(self.current_location())) {
            return self.error("Array allocation with new[] is not supported");
        }

        let args = if self.match_token(&Token::LParen(self.current_location())) {
            let args = self.parse_argument_list()?;
            self.expect_rparen("after constructor arguments")?;
            args
        } else {
            Vec::new()
        };

        Ok(Expr::New {
            type_name,
            args,
            location,
        })
    }

    /// Parse postfix (++ -- [] . -> ())
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            let loc = self.current_location();

            if self.match_token(&Token::PlusPlus(loc)) {
                expr = Expr::Unary {
                    op: UnOp::PostInc,
                    operand: Box::new(expr),
                    location: loc,
                };
            } else if self.match_token(&Token::MinusMinus(loc)) {
                expr = Expr::Unary {
                    op: UnOp::PostDec,
                    operand: Box::new(expr),
                    location: loc,
                };
            } else if self.match_token(&Token::LBracket(loc)) {
                let index = Box::new(self.parse_expression()?);
                self.expect_token(
                    &Token::RBracket(self.current_location()),
                    "Expected ']' after array index",
                )?;
                expr = Expr::Index {
                    array: Box::new(expr),
                    index,
                    location: loc,
                };
            } else if self.match_token(&Token::Dot(loc)) {
                let member = self.expect_identifier()?;
                if self.match_token(&Token::LParen(self.current_location())) {
                    let args = self.parse_argument_list()?;
                    self.expect_rparen("after method arguments")?;
                    expr = Expr::MethodCall {
                        object: Box::new(expr),
                        method: member,
                        args,
                        location: loc,
                    };
                } else {
                    expr = Expr::Member {
                        object: Box::new(expr),
                        field: member,
                        location: loc,
                    };
                }
            } else if self.match_token(&Token::Arrow(loc)) {
                let field = self.expect_identifier()?;
                expr = Expr::PointerField {
                    object: Box::new(expr),
                    field,
                    location: loc,
                };
            } else if self.match_token(&Token::LParen(loc)) {
                // Function call
                let args = self.parse_argument_list()?;
                self.expect_rparen("after function arguments")?;

                let Expr::Variable(name, _) = expr else {
                    return Err(ParseError {
                        message: "Function call must be on identifier".to_string(),
                        location: loc,
                    });
                };

                expr = Expr::Call {
                    name,
                    args,
                    location: loc,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse argument list: (expr, expr, ...)
    fn parse_argument_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();

        if self.check(&Token::RParen(self.current_location())) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        Ok(args)
    }

    /// Parse primary (literals, variables, parenthesized expressions)
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let loc = self.current_location();

        let expr = match self.peek_token() {
            Token::IntLiteral(n, loc) => Expr::IntLiteral(n, loc),
            Token::FloatLiteral(x, loc) => Expr::FloatLiteral(x, loc),
            Token::CharLiteral(c, loc) => Expr::CharLiteral(c, loc),
            Token::StringLiteral(s, loc) => Expr::StringLiteral(s, loc),
            Token::True(loc) => Expr::BoolLiteral(true, loc),
            Token::False(loc) => Expr::BoolLiteral(false, loc),
            Token::Null(loc) => Expr::Null(loc),
            Token::Ident(..) => {
                self.skip_std_prefix();
                let name = self.expect_identifier()?;
                return Ok(Expr::Variable(name, loc));
            }
            Token::LParen(_) => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_rparen("after expression")?;
                return Ok(expr);
            }
            other => return self.error(format!("Unexpected token: {}", other)),
        };

        self.advance();
        Ok(expr)
    }
}

//! Restricted-language front end
//!
//! This module turns source text into a syntax tree:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parser struct, helpers and statement recovery
//! - [`ast`]: Syntax tree definitions
//!
//! # Supported Subset
//!
//! - Types: `int`, `float`, `double`, `char`, `bool`, `string`, `auto`, `void`,
//!   pointers to user types, arrays, `stack<T>` and `queue<T>`
//! - Statements: declarations, assignments, `if`/`else`, `while`, `for`,
//!   `return`, `break`, `continue`, `delete`, `cout << ...`
//! - Expressions: arithmetic, comparison, logical, ternary, calls, container
//!   methods, `p->field`, `new T()`
//! - Preprocessor lines and `using namespace` are skipped
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary
//! operators. Every statement carries the line bookkeeping the pause injector
//! needs (first line, last line, whether it ends its line).

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;

pub use parse::{ParseError, Parser};

/// Tokenize and parse a whole program
///
/// Only tokenization can fail; statements the parser cannot handle come back
/// as [`ast::StmtKind::Unsupported`].
pub fn parse(source: &str) -> Result<ast::Program, ParseError> {
    Ok(Parser::new(source)?.parse_program())
}

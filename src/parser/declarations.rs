//! Declaration parsing implementation
//!
//! This module handles top-level items and declaration statements:
//!
//! - Function definitions: `type name(params) { ... }` (prototypes are skipped)
//! - Struct/class definitions: `struct Name { ... };` (field names only)
//! - `using namespace X;`
//! - Variable declarations: primitives, pointers, arrays
//! - Container declarations: `stack<T> s;`, `std::queue<T> q;`
//!
//! # Grammar
//!
//! ```text
//! item         ::= using | struct_def | function_def | statement
//! function_def ::= type "*"* identifier "(" params ")" (block | ";")
//! declaration  ::= type declarator ("," declarator)* ";"
//! declarator   ::= "*"* identifier ("[" expr? "]")? ("=" (expr | "{" exprs "}"))?
//! container    ::= ("std" "::")? ("stack" | "queue") "<" ... ">" identifier ";"
//! ```
//!
//! Declaring an object by value (`Node n;`) is rejected: heap objects exist
//! only behind pointers returned by `new`.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{spelling, ParseError, Parser};

impl Parser {
    /// Parse one top-level item (may expand to several statements)
    pub(crate) fn parse_item(&mut self) -> Result<Vec<Item>, ParseError> {
        let loc = self.current_location();

        if self.check(&Token::Using(loc)) {
            return Ok(vec![self.parse_using()?]);
        }

        if matches!(self.peek(), Token::Struct(_) | Token::Class(_))
            && self.check_ahead(1, &Token::Ident(String::new(), loc))
            && self.check_ahead(2, &Token::LBrace(loc))
        {
            return Ok(vec![Item::Struct(self.parse_struct_definition()?)]);
        }

        if self.looks_like_function() {
            return Ok(self
                .parse_function_definition()?
                .map(Item::Function)
                .into_iter()
                .collect());
        }

        Ok(self
            .parse_statement()?
            .into_iter()
            .map(Item::Statement)
            .collect())
    }

    /// `using namespace X;`
    fn parse_using(&mut self) -> Result<Item, ParseError> {
        let location = self.current_location();
        self.advance(); // consume 'using'
        self.expect_token(
            &Token::Namespace(self.current_location()),
            "Expected 'namespace' after 'using'",
        )?;
        let namespace = self.expect_identifier()?;
        self.expect_semicolon("after using directive")?;
        Ok(Item::Using {
            namespace,
            location,
        })
    }

    /// Lookahead: return type, optional `*`/`&`, name, `(`
    fn looks_like_function(&self) -> bool {
        let loc = self.current_location();
        let mut i = 0;
        if self.check_ahead(i, &Token::Const(loc)) {
            i += 1;
        }

        match self.peek_ahead(i) {
            Some(t) if t.is_primitive_type() => {
                while self.peek_ahead(i).is_some_and(Token::is_primitive_type) {
                    i += 1;
                }
            }
            Some(Token::Struct(_)) | Some(Token::Class(_)) => i += 2,
            Some(Token::Ident(name, _)) if name == "std" => {
                i += 2;
                if !matches!(
                    self.peek_ahead(i),
                    Some(Token::Ident(..)) | Some(Token::StringType(_))
                ) {
                    return false;
                }
                i += 1;
            }
            Some(Token::Ident(name, _)) if name != "cout" => i += 1,
            _ => return false,
        }

        while matches!(self.peek_ahead(i), Some(Token::Star(_)) | Some(Token::Amp(_))) {
            i += 1;
        }

        matches!(self.peek_ahead(i), Some(Token::Ident(..)))
            && self.check_ahead(i + 1, &Token::LParen(loc))
    }

    /// Parse function definition; `None` for a bodiless prototype
    pub(crate) fn parse_function_definition(&mut self) -> Result<Option<FunctionDef>, ParseError> {
        let location = self.current_location();

        let mut return_type = String::new();
        while !(matches!(self.peek(), Token::Ident(..))
            && self.check_ahead(1, &Token::LParen(location)))
        {
            if self.is_at_end() {
                return self.error("Expected function name");
            }
            push_spelling(&mut return_type, spelling(self.peek()).unwrap_or("?"));
            self.advance();
        }

        let name = self.expect_identifier()?;
        let params = self.parse_params()?;

        if self.match_token(&Token::Semicolon(self.current_location())) {
            return Ok(None);
        }

        let body = self.parse_block()?;

        Ok(Some(FunctionDef {
            name,
            params,
            return_type,
            body,
            location,
        }))
    }

    /// Parse a parenthesized, comma-separated, typed-or-untyped parameter list
    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        self.expect_lparen("after function name")?;
        let loc = self.current_location();

        let mut params = Vec::new();
        if self.check(&Token::Void(loc)) && self.check_ahead(1, &Token::RParen(loc)) {
            self.advance();
        }

        while !self.check(&Token::RParen(self.current_location())) {
            let mut parts = Vec::new();
            let mut angle_depth = 0usize;
            loop {
                match self.peek() {
                    Token::Eof(_) => return self.error("Unterminated parameter list"),
                    Token::Comma(_) | Token::RParen(_) if angle_depth == 0 => break,
                    Token::Lt(_) => angle_depth += 1,
                    Token::Gt(_) => angle_depth = angle_depth.saturating_sub(1),
                    _ => {}
                }
                parts.push(self.peek_token());
                self.advance();
            }

            let Some(name_index) = parts.iter().rposition(|t| matches!(t, Token::Ident(..))) else {
                return self.error("Expected parameter name");
            };
            let Token::Ident(name, _) = &parts[name_index] else {
                return self.error("Expected parameter name");
            };

            let mut type_name = String::new();
            for part in &parts[..name_index] {
                if let Some(text) = spelling(part) {
                    push_spelling(&mut type_name, text);
                }
            }

            params.push(Param {
                name: name.clone(),
                type_name: (!type_name.is_empty()).then_some(type_name),
            });

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        self.expect_rparen("after parameters")?;
        Ok(params)
    }

    /// Parse struct/class definition, keeping only data member names
    fn parse_struct_definition(&mut self) -> Result<StructDef, ParseError> {
        let location = self.current_location();
        self.advance(); // consume 'struct' / 'class'

        let name = self.expect_identifier()?;
        self.expect_lbrace("after struct name")?;

        let mut fields: Vec<String> = Vec::new();
        let mut depth = 0usize;
        let mut parens = 0usize;
        loop {
            match self.peek_token() {
                Token::Eof(_) => return self.error("Unterminated struct definition"),
                Token::RBrace(_) if depth == 0 => break,
                Token::LBrace(_) => depth += 1,
                Token::RBrace(_) => depth -= 1,
                Token::LParen(_) => parens += 1,
                Token::RParen(_) => parens = parens.saturating_sub(1),
                Token::Ident(field, _)
                    if depth == 0
                        && parens == 0
                        && matches!(
                            self.peek_ahead(1),
                            Some(Token::Semicolon(_))
                                | Some(Token::Eq(_))
                                | Some(Token::LBracket(_))
                                | Some(Token::Comma(_))
                        ) =>
                {
                    if !fields.contains(&field) {
                        fields.push(field);
                    }
                }
                _ => {}
            }
            self.advance();
        }

        self.expect_rbrace("after struct body")?;
        self.match_token(&Token::Semicolon(self.current_location()));

        Ok(StructDef {
            name,
            fields,
            location,
        })
    }

    /// Whether the upcoming tokens begin a declaration statement
    pub(crate) fn starts_declaration(&self) -> bool {
        let loc = self.current_location();
        match self.peek() {
            Token::Const(_) => true,
            t if t.is_primitive_type() => true,
            Token::Struct(_) | Token::Class(_) => {
                self.check_ahead(1, &Token::Ident(String::new(), loc))
            }
            Token::Ident(..) => {
                if self.is_std_prefix() && self.check_ahead(2, &Token::StringType(loc)) {
                    return true;
                }
                if self.container_kind_ahead().is_some() {
                    return true;
                }
                match self.ident_after_std(0) {
                    Some((name, next)) if name != "cout" && name != "std" => {
                        match self.peek_ahead(next) {
                            Some(Token::Ident(..)) => true,
                            Some(Token::Star(_)) => {
                                matches!(self.peek_ahead(next + 1), Some(Token::Ident(..)))
                                    && matches!(
                                        self.peek_ahead(next + 2),
                                        Some(Token::Eq(_))
                                            | Some(Token::Semicolon(_))
                                            | Some(Token::Comma(_))
                                            | Some(Token::LBracket(_))
                                    )
                            }
                            _ => false,
                        }
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// `stack<` / `std::queue<` ahead
    fn container_kind_ahead(&self) -> Option<ContainerKind> {
        let (name, next) = self.ident_after_std(0)?;
        let kind = ContainerKind::from_source_name(name)?;
        self.check_ahead(next, &Token::Lt(self.current_location()))
            .then_some(kind)
    }

    /// Parse a declaration statement; one [`Stmt`] per declarator
    pub(crate) fn parse_declaration(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let start = self.current_location();

        if let Some(kind) = self.container_kind_ahead() {
            let kind = self.parse_container_declaration(kind)?;
            return Ok(vec![self.finish_stmt(kind, start)]);
        }

        let (type_name, primitive) = self.parse_type_name()?;

        let mut decls = Vec::new();
        loop {
            let location = if decls.is_empty() {
                start
            } else {
                self.current_location()
            };

            let mut pointer = false;
            while self.match_token(&Token::Star(self.current_location())) {
                pointer = true;
            }
            if self.check(&Token::Amp(self.current_location())) {
                return self.error("Reference declarations are not supported");
            }

            let name = self.expect_identifier()?;
            if !primitive && !pointer {
                return Err(ParseError {
                    message: format!(
                        "Value-typed object declaration '{} {}' is not supported; allocate it with new",
                        type_name, name
                    ),
                    location,
                });
            }

            let (array, init) = match self.parse_declarator_tail(location)? {
                DeclaratorTail::Scalar(init) => (None, init),
                DeclaratorTail::Array(spec) => (Some(spec), None),
            };

            decls.push((
                StmtKind::VarDecl {
                    name,
                    type_name: type_name.clone(),
                    pointer,
                    array,
                    init,
                },
                location,
            ));

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        self.expect_semicolon("after declaration")?;

        let count = decls.len();
        Ok(decls
            .into_iter()
            .enumerate()
            .map(|(i, (kind, location))| {
                let mut stmt = self.finish_stmt(kind, location);
                if i + 1 < count {
                    stmt.ends_line = false;
                }
                stmt
            })
            .collect())
    }

    /// Parse `[size]` and `= init` after a declarator name
    fn parse_declarator_tail(&mut self, location: SourceLocation) -> Result<DeclaratorTail, ParseError> {
        let mut size: Option<Option<Expr>> = None;
        if self.match_token(&Token::LBracket(self.current_location())) {
            if self.match_token(&Token::RBracket(self.current_location())) {
                size = Some(None);
            } else {
                let expr = self.parse_expression()?;
                self.expect_token(
                    &Token::RBracket(self.current_location()),
                    "Expected ']' after array size",
                )?;
                size = Some(Some(expr));
            }
        }

        if !self.match_token(&Token::Eq(self.current_location())) {
            return match size {
                None => Ok(DeclaratorTail::Scalar(None)),
                Some(Some(n)) => Ok(DeclaratorTail::Array(ArraySpec::Sized(n))),
                Some(None) => Err(ParseError {
                    message: "Array declaration needs a size or an initializer".to_string(),
                    location,
                }),
            };
        }

        if self.check(&Token::LBrace(self.current_location())) {
            if size.is_none() {
                return self.error("Brace initializers are only supported for arrays");
            }
            return Ok(DeclaratorTail::Array(ArraySpec::Literal(self.parse_brace_list()?)));
        }

        if size.is_some() {
            return self.error("Expected '{' to initialize array");
        }
        Ok(DeclaratorTail::Scalar(Some(self.parse_expression()?)))
    }

    /// `{ expr, expr, ... }`
    fn parse_brace_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect_lbrace("to open initializer list")?;
        let mut items = Vec::new();
        while !self.check(&Token::RBrace(self.current_location())) {
            items.push(self.parse_expression()?);
            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }
        self.expect_rbrace("to close initializer list")?;
        Ok(items)
    }

    /// Base type of a declaration; the flag is true for primitive types
    fn parse_type_name(&mut self) -> Result<(String, bool), ParseError> {
        self.match_token(&Token::Const(self.current_location()));

        let mut name = String::new();
        while self.peek().is_primitive_type() {
            push_spelling(&mut name, spelling(self.peek()).unwrap_or("?"));
            self.advance();
        }
        if !name.is_empty() {
            self.match_token(&Token::Const(self.current_location()));
            return Ok((name, true));
        }

        if self.is_std_prefix() && self.check_ahead(2, &Token::StringType(self.current_location())) {
            self.skip_std_prefix();
            self.advance();
            return Ok(("string".to_string(), true));
        }

        if !self.match_token(&Token::Struct(self.current_location())) {
            self.match_token(&Token::Class(self.current_location()));
        }
        let name = self.expect_identifier()?;
        self.match_token(&Token::Const(self.current_location()));
        Ok((name, false))
    }

    /// `stack<T> name;` after the kind has been recognized
    fn parse_container_declaration(&mut self, kind: ContainerKind) -> Result<StmtKind, ParseError> {
        self.skip_std_prefix();
        self.advance(); // consume 'stack' / 'queue'

        self.expect_token(
            &Token::Lt(self.current_location()),
            "Expected '<' after container type",
        )?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek() {
                Token::Eof(_) | Token::Semicolon(_) => {
                    return self.error("Unterminated container element type");
                }
                Token::Lt(_) => depth += 1,
                Token::Gt(_) => depth -= 1,
                Token::GtGt(_) => depth = depth.saturating_sub(2),
                _ => {}
            }
            self.advance();
        }

        let name = self.expect_identifier()?;
        self.expect_semicolon("after container declaration")?;

        Ok(StmtKind::ContainerDecl { name, kind })
    }
}

enum DeclaratorTail {
    Scalar(Option<Expr>),
    Array(ArraySpec),
}

/// Append a type fragment, spacing only between two words
fn push_spelling(out: &mut String, piece: &str) {
    let word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    if word(out.chars().last()) && word(piece.chars().next()) {
        out.push(' ');
    }
    out.push_str(piece);
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn body_of(source: &str) -> Vec<Stmt> {
        let program = Parser::new(source).unwrap().parse_program();
        for item in program.items {
            if let Item::Function(f) = item {
                return f.body.statements;
            }
        }
        panic!("no function in {:?}", source);
    }

    #[test]
    fn test_function_params_typed_and_untyped() {
        let program = Parser::new("int add(int a, Node* b, c) { return a; }")
            .unwrap()
            .parse_program();
        let f = program.functions().next().unwrap();
        assert_eq!(f.params.len(), 3);
        assert_eq!(f.params[0].type_name.as_deref(), Some("int"));
        assert_eq!(f.params[1].name, "b");
        assert_eq!(f.params[1].type_name.as_deref(), Some("Node*"));
        assert_eq!(f.params[2].type_name, None);
    }

    #[test]
    fn test_prototype_is_skipped() {
        let program = Parser::new("int add(int a, int b);\nint main() {}")
            .unwrap()
            .parse_program();
        assert_eq!(program.items.len(), 1);
    }

    #[test]
    fn test_container_declaration() {
        let stmts = body_of("int main() {\n std::stack<int> s;\n queue<Node*> q;\n}");
        assert!(matches!(
            stmts[0].kind,
            StmtKind::ContainerDecl { ref name, kind: ContainerKind::Stack } if name == "s"
        ));
        assert!(matches!(
            stmts[1].kind,
            StmtKind::ContainerDecl { ref name, kind: ContainerKind::Queue } if name == "q"
        ));
    }

    #[test]
    fn test_pointer_and_array_declarations() {
        let stmts = body_of(
            "int main() {\n Node* p = new Node();\n int a[] = {1, 2, 3};\n int b[4];\n}",
        );
        assert!(matches!(
            stmts[0].kind,
            StmtKind::VarDecl { pointer: true, init: Some(Expr::New { .. }), .. }
        ));
        assert!(matches!(
            stmts[1].kind,
            StmtKind::VarDecl { array: Some(ArraySpec::Literal(ref items)), .. } if items.len() == 3
        ));
        assert!(matches!(
            stmts[2].kind,
            StmtKind::VarDecl { array: Some(ArraySpec::Sized(_)), .. }
        ));
    }

    #[test]
    fn test_value_typed_object_is_unsupported() {
        let stmts = body_of("int main() {\n Node n;\n int x = 1;\n}");
        assert!(matches!(stmts[0].kind, StmtKind::Unsupported { .. }));
        assert!(matches!(stmts[1].kind, StmtKind::VarDecl { .. }));
    }

    #[test]
    fn test_struct_definition_fields() {
        let program = Parser::new("struct Node {\n int val;\n Node* next;\n};")
            .unwrap()
            .parse_program();
        match &program.items[0] {
            Item::Struct(def) => {
                assert_eq!(def.name, "Node");
                assert_eq!(def.fields, vec!["val".to_string(), "next".to_string()]);
            }
            other => panic!("Expected struct, got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_declarators_share_one_line() {
        let stmts = body_of("int main() {\n int a = 1, b = 2;\n}");
        assert_eq!(stmts.len(), 2);
        assert!(!stmts[0].ends_line);
        assert!(stmts[1].ends_line);
    }
}

// AST (Abstract Syntax Tree) definitions for the restricted source language

use std::fmt;

/// Source location information for error reporting and pause placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// The two container kinds a declaration can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Stack,
    Queue,
}

impl ContainerKind {
    /// Type tag of the backing heap object
    pub fn type_tag(self) -> &'static str {
        match self {
            ContainerKind::Stack => "Stack",
            ContainerKind::Queue => "Queue",
        }
    }

    /// Source spelling (`stack<T>` / `queue<T>`)
    pub fn from_source_name(name: &str) -> Option<Self> {
        match name {
            "stack" => Some(ContainerKind::Stack),
            "queue" => Some(ContainerKind::Queue),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_tag())
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,     // -x
    Not,     // !x
    PreInc,  // ++x
    PreDec,  // --x
    PostInc, // x++
    PostDec, // x--
    Deref,   // *x
    AddrOf,  // &x
}

/// Function parameter; the type is absent for untyped parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub type_name: Option<String>,
}

/// A statement sequence, braced or a single unbraced body
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub braced: bool,
    /// Closing `}` location, braced blocks only
    pub close: Option<SourceLocation>,
    /// The closing `}` (optionally followed by `;`) is the only thing on its line
    pub close_alone: bool,
}

impl Block {
    pub fn unbraced(statements: Vec<Stmt>) -> Self {
        Block {
            statements,
            braced: false,
            close: None,
            close_alone: false,
        }
    }
}

/// Initializer shape of an array declaration
#[derive(Debug, Clone, PartialEq)]
pub enum ArraySpec {
    /// `T a[n];`
    Sized(Expr),
    /// `T a[] = {..};` or `T a[n] = {..};`
    Literal(Vec<Expr>),
}

/// Function definition
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: String,
    pub body: Block,
    pub location: SourceLocation,
}

/// Struct/class definition; only the field names are kept
#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<String>,
    pub location: SourceLocation,
}

/// Top-level items in source order
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Function(FunctionDef),
    Struct(StructDef),
    Using {
        namespace: String,
        location: SourceLocation,
    },
    Statement(Stmt),
}

/// A statement with the line bookkeeping pause injection relies on
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub location: SourceLocation,
    /// Line of the statement's last token
    pub end_line: usize,
    /// Nothing else follows the statement on its last line
    pub ends_line: bool,
}

/// Statement forms
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    VarDecl {
        name: String,
        type_name: String,
        pointer: bool,
        array: Option<ArraySpec>,
        init: Option<Expr>,
    },
    ContainerDecl {
        name: String,
        kind: ContainerKind,
    },
    Expr(Expr),
    /// `cout << a << b;` with a trailing `endl` already stripped
    Print {
        args: Vec<Expr>,
    },
    Delete(Expr),
    If {
        condition: Expr,
        then_block: Block,
        else_block: Option<Block>,
        else_location: Option<SourceLocation>,
    },
    While {
        condition: Expr,
        body: Block,
    },
    For {
        init: Vec<Stmt>,
        condition: Option<Expr>,
        step: Option<Expr>,
        body: Block,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Block(Block),
    Empty,
    /// A statement that could not be parsed or uses an unsupported form
    Unsupported {
        reason: String,
    },
}

impl StmtKind {
    /// Control-flow statements own a header line and a body
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            StmtKind::If { .. } | StmtKind::While { .. } | StmtKind::For { .. } | StmtKind::Block(_)
        )
    }
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLiteral(i64, SourceLocation),
    FloatLiteral(f64, SourceLocation),
    CharLiteral(char, SourceLocation),
    StringLiteral(String, SourceLocation),
    BoolLiteral(bool, SourceLocation),
    Null(SourceLocation),
    Variable(String, SourceLocation),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        location: SourceLocation,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        location: SourceLocation,
    },
    /// `target = value` or `target op= value`
    Assign {
        target: Box<Expr>,
        op: Option<BinOp>,
        value: Box<Expr>,
        location: SourceLocation,
    },
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
        location: SourceLocation,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        location: SourceLocation,
    },
    MethodCall {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
        location: SourceLocation,
    },
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
        location: SourceLocation,
    },
    /// `p->field`
    PointerField {
        object: Box<Expr>,
        field: String,
        location: SourceLocation,
    },
    /// `obj.field` (not a method call)
    Member {
        object: Box<Expr>,
        field: String,
        location: SourceLocation,
    },
    /// `new T()`
    New {
        type_name: String,
        args: Vec<Expr>,
        location: SourceLocation,
    },
}

impl Expr {
    /// Get the source location of this expression
    pub fn location(&self) -> SourceLocation {
        match self {
            Expr::IntLiteral(_, loc)
            | Expr::FloatLiteral(_, loc)
            | Expr::CharLiteral(_, loc)
            | Expr::StringLiteral(_, loc)
            | Expr::BoolLiteral(_, loc)
            | Expr::Null(loc)
            | Expr::Variable(_, loc) => *loc,
            Expr::Binary { location, .. }
            | Expr::Unary { location, .. }
            | Expr::Assign { location, .. }
            | Expr::Ternary { location, .. }
            | Expr::Call { location, .. }
            | Expr::MethodCall { location, .. }
            | Expr::Index { location, .. }
            | Expr::PointerField { location, .. }
            | Expr::Member { location, .. }
            | Expr::New { location, .. } => *location,
        }
    }
}

/// Top-level program structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub items: Vec<Item>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    /// Function definitions in source order
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(f) => Some(f),
            _ => None,
        })
    }
}

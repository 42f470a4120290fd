//! Instrumented form
//!
//! The executable output of the transformer: a small statement language with
//! explicit pause points, memory-model calls and awaited calls. Blocks are
//! shared slices so the executor can hold cursors into them without copying.
//!
//! # Shape
//!
//! - Calls to defined functions never appear inside expressions. They are
//!   hoisted into [`Op::Call`], optionally binding a temporary, so every
//!   suspension happens between operations.
//! - `p->f = v` becomes an [`Op::Assign`] to a [`Place::Field`], rendered as
//!   a `memory.setField` call.
//! - [`Op::Pause`] names the tracked variables whose values the pause reports.
//!
//! The [`Display`](fmt::Display) impls render the form as script text, which
//! is what `logiclens emit` prints.

use crate::memory::value::Value;
use crate::parser::ast::{BinOp, ContainerKind};
use crate::transform::diagnostics::Diagnostic;
use indexmap::IndexMap;
use std::fmt::{self, Write};
use std::rc::Rc;

/// A shared sequence of operations
pub type Block = Rc<[Op]>;

/// Unary operators that survive lowering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// An assignable location
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    Var(String),
    /// Heap field through a pointer
    Field { object: Expr, field: String },
    /// Array element
    Index { base: Box<Place>, index: Expr },
}

/// Expressions; none of them can suspend
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(Value),
    Var(String),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `++x`, `x--`, ...
    IncDec {
        place: Box<Place>,
        delta: i64,
        prefix: bool,
    },
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// `memory.malloc("T")`
    Alloc(String),
    /// `memory.getField(p, "f")`
    GetField { object: Box<Expr>, field: String },
    /// Fresh container adapter
    NewContainer(ContainerKind),
    /// Container method call
    Method {
        target: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    Index { base: Box<Expr>, index: Box<Expr> },
    Array(Vec<Expr>),
    /// Sequence of `n` undefined elements
    ArrayOfSize(Box<Expr>),
    /// Call to a name no definition provides; fails when evaluated
    Call { function: String, args: Vec<Expr> },
}

impl Expr {
    pub fn is_const(&self) -> bool {
        matches!(self, Expr::Const(_))
    }

    /// `!!e`
    pub fn truthy(self) -> Expr {
        Expr::not(Expr::not(self))
    }

    pub fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }
}

/// Operations of the instrumented form
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Let {
        name: String,
        init: Option<Expr>,
        line: usize,
    },
    Assign {
        place: Place,
        op: Option<BinOp>,
        value: Expr,
        line: usize,
    },
    Eval {
        expr: Expr,
        line: usize,
    },
    /// Awaited call to a defined function
    Call {
        dest: Option<String>,
        function: String,
        args: Vec<Expr>,
        line: usize,
    },
    Print {
        args: Vec<Expr>,
        line: usize,
    },
    Free {
        target: Expr,
        line: usize,
    },
    If {
        condition: Expr,
        then_ops: Block,
        else_ops: Block,
        line: usize,
    },
    /// Runs `body` until a `Break`; `step` runs after each body pass and on `Continue`
    Loop {
        body: Block,
        step: Block,
        line: usize,
    },
    Break {
        line: usize,
    },
    Continue {
        line: usize,
    },
    Return {
        value: Option<Expr>,
        line: usize,
    },
    /// Suspension point reporting the values of `capture`
    Pause {
        line: usize,
        capture: Vec<String>,
    },
    /// A construct that could not be lowered
    Fail {
        line: usize,
        message: String,
    },
    /// Nested lexical scope
    Scope {
        body: Block,
    },
}

impl Op {
    /// Source line the operation came from
    pub fn line(&self) -> Option<usize> {
        match self {
            Op::Let { line, .. }
            | Op::Assign { line, .. }
            | Op::Eval { line, .. }
            | Op::Call { line, .. }
            | Op::Print { line, .. }
            | Op::Free { line, .. }
            | Op::If { line, .. }
            | Op::Loop { line, .. }
            | Op::Break { line }
            | Op::Continue { line }
            | Op::Return { line, .. }
            | Op::Pause { line, .. }
            | Op::Fail { line, .. } => Some(*line),
            Op::Scope { .. } => None,
        }
    }
}

/// A lowered function definition
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub line: usize,
}

/// Output of the transformer
#[derive(Debug, Clone, PartialEq)]
pub struct Instrumented {
    pub functions: IndexMap<String, Rc<Function>>,
    /// Top-level statements followed by the entry call
    pub top_level: Block,
    pub diagnostics: Vec<Diagnostic>,
}

impl Instrumented {
    pub fn function(&self, name: &str) -> Option<&Rc<Function>> {
        self.functions.get(name)
    }

    /// Whether any construct was lowered to a failing operation
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.kind.is_error())
    }

    /// Every pause point in textual order: functions first, then top level
    pub fn pauses(&self) -> Vec<(usize, Vec<String>)> {
        fn walk(ops: &[Op], found: &mut Vec<(usize, Vec<String>)>) {
            for op in ops {
                match op {
                    Op::Pause { line, capture } => found.push((*line, capture.clone())),
                    Op::If {
                        then_ops, else_ops, ..
                    } => {
                        walk(then_ops, found);
                        walk(else_ops, found);
                    }
                    Op::Loop { body, step, .. } => {
                        walk(body, found);
                        walk(step, found);
                    }
                    Op::Scope { body } => walk(body, found),
                    _ => {}
                }
            }
        }

        let mut found = Vec::new();
        for function in self.functions.values() {
            walk(&function.body, &mut found);
        }
        walk(&self.top_level, &mut found);
        found
    }
}

// ===== Rendering =====

const INDENT: &str = "  ";

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_const(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Str(s) => write!(f, "{:?}", s),
        Value::Char(c) => write!(f, "{:?}", c),
        Value::Null => f.write_str("null"),
        other => write!(f, "{}", other),
    }
}

/// Binary and ternary operands get parentheses
struct Operand<'a>(&'a Expr);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expr::Binary { .. } | Expr::Ternary { .. } => write!(f, "({})", self.0),
            other => write!(f, "{}", other),
        }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Var(name) => f.write_str(name),
            Place::Field { object, field } => write!(f, "memory.getField({}, {:?})", object, field),
            Place::Index { base, index } => write!(f, "{}[{}]", base, index),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(value) => write_const(f, value),
            Expr::Var(name) => f.write_str(name),
            Expr::Binary { op, left, right } => {
                write!(f, "{} {} {}", Operand(left), op.symbol(), Operand(right))
            }
            Expr::Unary { op, operand } => {
                let symbol = match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Not => "!",
                };
                write!(f, "{}{}", symbol, Operand(operand))
            }
            Expr::IncDec {
                place,
                delta,
                prefix,
            } => {
                let symbol = if *delta > 0 { "++" } else { "--" };
                if *prefix {
                    write!(f, "{}{}", symbol, place)
                } else {
                    write!(f, "{}{}", place, symbol)
                }
            }
            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
            } => write!(
                f,
                "{} ? {} : {}",
                Operand(condition),
                Operand(then_expr),
                Operand(else_expr)
            ),
            Expr::Alloc(type_name) => write!(f, "memory.malloc({:?})", type_name),
            Expr::GetField { object, field } => {
                write!(f, "memory.getField({}, {:?})", object, field)
            }
            Expr::NewContainer(kind) => write!(f, "new Cpp{}()", kind),
            Expr::Method {
                target,
                method,
                args,
            } => {
                write!(f, "{}.{}(", Operand(target), method)?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expr::Index { base, index } => write!(f, "{}[{}]", Operand(base), index),
            Expr::Array(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            Expr::ArrayOfSize(size) => write!(f, "new Array({})", size),
            Expr::Call { function, args } => {
                write!(f, "{}(", function)?;
                write_list(f, args)?;
                f.write_str(")")
            }
        }
    }
}

fn write_assign(
    f: &mut fmt::Formatter<'_>,
    place: &Place,
    op: Option<BinOp>,
    value: &Expr,
) -> fmt::Result {
    match (place, op) {
        (Place::Field { object, field }, None) => {
            write!(f, "memory.setField({}, {:?}, {});", object, field, value)
        }
        (Place::Field { object, field }, Some(op)) => write!(
            f,
            "memory.setField({}, {:?}, {} {} {});",
            object,
            field,
            place,
            op.symbol(),
            Operand(value)
        ),
        (place, None) => write!(f, "{} = {};", place, value),
        (place, Some(op)) => write!(f, "{} {}= {};", place, op.symbol(), value),
    }
}

fn write_ops(f: &mut fmt::Formatter<'_>, ops: &[Op], depth: usize) -> fmt::Result {
    for op in ops {
        write_op(f, op, depth)?;
    }
    Ok(())
}

fn write_op(f: &mut fmt::Formatter<'_>, op: &Op, depth: usize) -> fmt::Result {
    let pad = INDENT.repeat(depth);
    f.write_str(&pad)?;
    match op {
        Op::Let { name, init: None, .. } => write!(f, "let {};", name)?,
        Op::Let {
            name,
            init: Some(init),
            ..
        } => write!(f, "let {} = {};", name, init)?,
        Op::Assign {
            place, op, value, ..
        } => write_assign(f, place, *op, value)?,
        Op::Eval { expr, .. } => write!(f, "{};", expr)?,
        Op::Call {
            dest,
            function,
            args,
            ..
        } => {
            if let Some(dest) = dest {
                write!(f, "let {} = ", dest)?;
            }
            write!(f, "await {}(", function)?;
            write_list(f, args)?;
            f.write_str(");")?;
        }
        Op::Print { args, .. } => {
            f.write_str("console.log(")?;
            write_list(f, args)?;
            f.write_str(");")?;
        }
        Op::Free { target, .. } => write!(f, "memory.free({});", target)?,
        Op::If {
            condition,
            then_ops,
            else_ops,
            ..
        } => {
            writeln!(f, "if ({}) {{", condition)?;
            write_ops(f, then_ops, depth + 1)?;
            if !else_ops.is_empty() {
                writeln!(f, "{}}} else {{", pad)?;
                write_ops(f, else_ops, depth + 1)?;
            }
            write!(f, "{}}}", pad)?;
        }
        Op::Loop { body, step, .. } => {
            if step.is_empty() {
                writeln!(f, "while (true) {{")?;
            } else {
                let mut header = String::new();
                for (i, op) in step.iter().enumerate() {
                    if i > 0 {
                        header.push_str(", ");
                    }
                    let rendered = op.to_string();
                    header.push_str(rendered.trim().trim_end_matches(';'));
                }
                writeln!(f, "for (;; {}) {{", header)?;
            }
            write_ops(f, body, depth + 1)?;
            write!(f, "{}}}", pad)?;
        }
        Op::Break { .. } => f.write_str("break;")?,
        Op::Continue { .. } => f.write_str("continue;")?,
        Op::Return { value: None, .. } => f.write_str("return;")?,
        Op::Return {
            value: Some(value),
            ..
        } => write!(f, "return {};", value)?,
        Op::Pause { line, capture } => {
            if capture.is_empty() {
                write!(f, "await pause({}, {{}});", line)?;
            } else {
                write!(f, "await pause({}, {{ ", line)?;
                write_list(f, capture)?;
                f.write_str(" });")?;
            }
        }
        Op::Fail { line, message } => write!(f, "fail({}, {:?});", line, message)?,
        Op::Scope { body } => {
            writeln!(f, "{{")?;
            write_ops(f, body, depth + 1)?;
            write!(f, "{}}}", pad)?;
        }
    }
    f.write_char('\n')
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_op(f, self, 0)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "async function {}(", self.name)?;
        write_list(f, &self.params)?;
        writeln!(f, ") {{")?;
        write_ops(f, &self.body, 1)?;
        writeln!(f, "}}")
    }
}

impl fmt::Display for Instrumented {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for function in self.functions.values() {
            writeln!(f, "{}", function)?;
        }
        write_ops(f, &self.top_level, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    #[test]
    fn test_render_memory_calls() {
        let op = Op::Assign {
            place: Place::Field {
                object: var("a"),
                field: "next".to_string(),
            },
            op: None,
            value: var("b"),
            line: 4,
        };
        assert_eq!(op.to_string(), "memory.setField(a, \"next\", b);\n");

        let read = Expr::GetField {
            object: Box::new(var("a")),
            field: "next".to_string(),
        };
        assert_eq!(read.to_string(), "memory.getField(a, \"next\")");
        assert_eq!(
            Expr::Alloc("Node".to_string()).to_string(),
            "memory.malloc(\"Node\")"
        );
    }

    #[test]
    fn test_render_pause() {
        let op = Op::Pause {
            line: 2,
            capture: vec!["x".to_string(), "y".to_string()],
        };
        assert_eq!(op.to_string(), "await pause(2, { x, y });\n");

        let empty = Op::Pause {
            line: 9,
            capture: Vec::new(),
        };
        assert_eq!(empty.to_string(), "await pause(9, {});\n");
    }

    #[test]
    fn test_render_nested_binary_parenthesized() {
        let expr = Expr::Binary {
            op: BinOp::Mul,
            left: Box::new(Expr::Binary {
                op: BinOp::Add,
                left: Box::new(var("a")),
                right: Box::new(Expr::Const(Value::Int(1))),
            }),
            right: Box::new(Expr::Const(Value::Int(2))),
        };
        assert_eq!(expr.to_string(), "(a + 1) * 2");
    }

    #[test]
    fn test_render_call_with_temp() {
        let op = Op::Call {
            dest: Some("$t0".to_string()),
            function: "add".to_string(),
            args: vec![var("x"), Expr::Const(Value::Str("s".to_string()))],
            line: 3,
        };
        assert_eq!(op.to_string(), "let $t0 = await add(x, \"s\");\n");
    }
}

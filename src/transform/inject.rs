//! Pause-point injection
//!
//! Walks function bodies and top-level statements, lowering each statement
//! through [`Lowerer`] and placing [`Op::Pause`] points the way a line-oriented
//! reader of the source would expect:
//!
//! - after every statement that ends its line, one pause reporting every
//!   tracked name (not only the ones the statement touched)
//! - at the start of a multi-line `if`/`else`/`while`/`for` body, a pause on
//!   the header line, which only fires when that body is entered
//! - before a `}` standing alone on its line, a pause with an empty payload
//! - a control-flow statement written entirely on one line pauses once,
//!   after the whole statement, and nothing inside it pauses
//! - `return`, `break` and `continue` never pause, nor do function headers
//!
//! Tracked names are per function, seeded from the parameters. Declarations
//! and plain `name = value` assignments add to the set; `for` initializers
//! do not.

use crate::parser::ast::{self, Block, FunctionDef, Stmt, StmtKind};
use crate::transform::diagnostics::{Diagnostic, DiagnosticKind};
use crate::transform::instrumented::{Expr, Function, Op};
use crate::transform::lower::Lowerer;
use indexmap::IndexSet;
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Statements get their pause points
    Stepped,
    /// Inside a one-line control-flow statement: no pauses, no tracking
    Inline,
}

pub(crate) struct Injector<'a> {
    lowerer: Lowerer<'a>,
    tracked: IndexSet<String>,
}

impl<'a> Injector<'a> {
    pub(crate) fn new(functions: &'a FxHashSet<String>) -> Self {
        Injector {
            lowerer: Lowerer::new(functions),
            tracked: IndexSet::new(),
        }
    }

    pub(crate) fn finish(self) -> Vec<Diagnostic> {
        self.lowerer.into_diagnostics()
    }

    pub(crate) fn function(&mut self, def: &FunctionDef) -> Function {
        self.tracked = def.params.iter().map(|p| p.name.clone()).collect();
        let body = self.body(&def.body, None, Mode::Stepped);
        Function {
            name: def.name.clone(),
            params: def.params.iter().map(|p| p.name.clone()).collect(),
            body: body.into(),
            line: def.location.line,
        }
    }

    /// Statements outside any function share their own tracked set
    pub(crate) fn top_level<'s>(&mut self, statements: impl IntoIterator<Item = &'s Stmt>) -> Vec<Op> {
        self.tracked = IndexSet::new();
        let mut out = Vec::new();
        for stmt in statements {
            self.statement(stmt, &mut out, Mode::Stepped);
        }
        out
    }

    fn pause(&self, line: usize) -> Op {
        Op::Pause {
            line,
            capture: self.tracked.iter().cloned().collect(),
        }
    }

    fn track(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VarDecl { name, .. } | StmtKind::ContainerDecl { name, .. } => {
                self.tracked.insert(name.clone());
            }
            StmtKind::Expr(ast::Expr::Assign {
                target, op: None, ..
            }) => {
                if let ast::Expr::Variable(name, _) = target.as_ref() {
                    self.tracked.insert(name.clone());
                }
            }
            _ => {}
        }
    }

    /// Header pause line for a body, if the body starts below its header
    fn header_for(body: &Block, header_line: usize) -> Option<usize> {
        let starts_below = body
            .statements
            .first()
            .is_some_and(|first| first.location.line > header_line);
        (body.braced || starts_below).then_some(header_line)
    }

    fn body(&mut self, block: &Block, header: Option<usize>, mode: Mode) -> Vec<Op> {
        let mut ops = Vec::new();
        if let (Mode::Stepped, Some(line)) = (mode, header) {
            ops.push(self.pause(line));
        }

        for stmt in &block.statements {
            self.statement(stmt, &mut ops, mode);
        }

        if mode == Mode::Stepped && block.close_alone {
            if let Some(close) = block.close {
                ops.push(Op::Pause {
                    line: close.line,
                    capture: Vec::new(),
                });
            }
        }
        ops
    }

    fn statement(&mut self, stmt: &Stmt, out: &mut Vec<Op>, mode: Mode) {
        let line = stmt.location.line;
        match &stmt.kind {
            StmtKind::Empty => {}
            StmtKind::Unsupported { reason } => {
                self.lowerer
                    .fail(line, DiagnosticKind::ParseFailure, reason.clone(), out)
            }
            kind if kind.is_compound() => {
                if mode == Mode::Stepped && line == stmt.end_line {
                    self.compound(stmt, out, Mode::Inline);
                    if stmt.ends_line {
                        out.push(self.pause(stmt.end_line));
                    }
                } else {
                    self.compound(stmt, out, mode);
                }
            }
            StmtKind::Return(_) | StmtKind::Break | StmtKind::Continue => self.lowerer.simple(stmt, out),
            _ => {
                self.lowerer.simple(stmt, out);
                if mode == Mode::Stepped {
                    self.track(stmt);
                    if stmt.ends_line {
                        out.push(self.pause(stmt.end_line));
                    }
                }
            }
        }
    }

    fn compound(&mut self, stmt: &Stmt, out: &mut Vec<Op>, mode: Mode) {
        let line = stmt.location.line;
        match &stmt.kind {
            StmtKind::If {
                condition,
                then_block,
                else_block,
                else_location,
            } => {
                let Some(condition) = self.lowerer.condition(condition, line, out) else {
                    return;
                };
                let then_ops = self.body(then_block, Self::header_for(then_block, line), mode);
                let else_ops = match (else_block, else_location) {
                    (Some(block), Some(location)) => {
                        // `else if` lets the nested `if` place its own header pause
                        let else_if = !block.braced
                            && matches!(block.statements.as_slice(), [only] if matches!(only.kind, StmtKind::If { .. }));
                        let header = if else_if {
                            None
                        } else {
                            Self::header_for(block, location.line)
                        };
                        self.body(block, header, mode)
                    }
                    _ => Vec::new(),
                };
                out.push(Op::If {
                    condition,
                    then_ops: then_ops.into(),
                    else_ops: else_ops.into(),
                    line,
                });
            }
            StmtKind::While { condition, body } => {
                let mut ops = Vec::new();
                let Some(condition) = self.lowerer.condition(condition, line, &mut ops) else {
                    out.extend(ops);
                    return;
                };
                ops.push(break_unless(condition, line));
                ops.extend(self.body(body, Self::header_for(body, line), mode));
                out.push(Op::Loop {
                    body: ops.into(),
                    step: Vec::new().into(),
                    line,
                });
            }
            StmtKind::For {
                init,
                condition,
                step,
                body,
            } => {
                let mut scope = Vec::new();
                for init in init {
                    self.lowerer.simple(init, &mut scope);
                }

                let mut ops = Vec::new();
                if let Some(condition) = condition {
                    let Some(condition) = self.lowerer.condition(condition, line, &mut ops) else {
                        scope.extend(ops);
                        out.push(Op::Scope { body: scope.into() });
                        return;
                    };
                    ops.push(break_unless(condition, line));
                }
                ops.extend(self.body(body, Self::header_for(body, line), mode));

                let mut step_ops = Vec::new();
                if let Some(step) = step {
                    self.lowerer.effect(step, line, &mut step_ops);
                }

                scope.push(Op::Loop {
                    body: ops.into(),
                    step: step_ops.into(),
                    line,
                });
                out.push(Op::Scope { body: scope.into() });
            }
            StmtKind::Block(block) => {
                let body = self.body(block, None, mode);
                out.push(Op::Scope { body: body.into() });
            }
            _ => self.lowerer.simple(stmt, out),
        }
    }
}

/// `if (!condition) break;`
fn break_unless(condition: Expr, line: usize) -> Op {
    Op::If {
        condition: condition.not(),
        then_ops: vec![Op::Break { line }].into(),
        else_ops: Vec::new().into(),
        line,
    }
}

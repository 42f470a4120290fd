//! Statement and expression lowering
//!
//! Performs the rewrites from syntax tree to instrumented form:
//!
//! 1. container declarations become freshly constructed adapters
//! 2. parameter types are dropped (see [`super::inject`])
//! 3. pointer declarations become untyped bindings
//! 4. array declarations become sequences, sized or literal
//! 5. remaining primitive declarations lose their type
//! 6. `new T()` becomes `memory.malloc("T")`
//! 7. `p->f = v` becomes a field set, bare `p->f` a field get
//! 8. `cout << a << b` becomes one print with `a, b` as arguments
//! 9. `#include` and `using namespace` disappear (handled by the front end)
//!
//! On top of that, calls to defined functions are hoisted out of expressions
//! into awaited [`Op::Call`]s bound to `$tN` temporaries. Operands evaluated
//! before a hoisted call are spilled into temporaries too, so left-to-right
//! evaluation order survives, and `&&`/`||`/`?:` only run the hoisted calls
//! of the side they actually evaluate.

use crate::interpreter::constants::TEMP_PREFIX;
use crate::memory::value::Value;
use crate::parser::ast::{self, ArraySpec, BinOp, Stmt, StmtKind, UnOp};
use crate::transform::diagnostics::{Diagnostic, DiagnosticKind};
use crate::transform::instrumented::{Expr, Op, Place, UnaryOp};
use rustc_hash::FxHashSet;
use std::iter;

/// A construct with no instrumented equivalent
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Unsupported(pub(crate) String);

type Lowered<T> = Result<T, Unsupported>;

pub(crate) struct Lowerer<'a> {
    functions: &'a FxHashSet<String>,
    next_temp: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lowerer<'a> {
    pub(crate) fn new(functions: &'a FxHashSet<String>) -> Self {
        Lowerer {
            functions,
            next_temp: 0,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn fresh_temp(&mut self) -> String {
        let name = format!("{}{}", TEMP_PREFIX, self.next_temp);
        self.next_temp += 1;
        name
    }

    /// Record a diagnostic and emit the failing operation standing in for the construct
    pub(crate) fn fail(&mut self, line: usize, kind: DiagnosticKind, message: String, out: &mut Vec<Op>) {
        out.push(Op::Fail {
            line,
            message: message.clone(),
        });
        self.diagnostics.push(Diagnostic::new(line, kind, message));
    }

    /// Lower a non-compound statement
    pub(crate) fn simple(&mut self, stmt: &Stmt, out: &mut Vec<Op>) {
        let line = stmt.location.line;
        let mut ops = Vec::new();
        match self.try_simple(stmt, line, &mut ops) {
            Ok(()) => out.extend(ops),
            Err(Unsupported(message)) => self.fail(line, DiagnosticKind::Unsupported, message, out),
        }
    }

    /// Lower an expression evaluated for its effect (a `for` step)
    pub(crate) fn effect(&mut self, expr: &ast::Expr, line: usize, out: &mut Vec<Op>) {
        let mut ops = Vec::new();
        match self.expression_statement(expr, line, &mut ops) {
            Ok(()) => out.extend(ops),
            Err(Unsupported(message)) => self.fail(line, DiagnosticKind::Unsupported, message, out),
        }
    }

    /// Lower a branch or loop condition; `None` means a failing op was emitted instead
    pub(crate) fn condition(&mut self, expr: &ast::Expr, line: usize, out: &mut Vec<Op>) -> Option<Expr> {
        let mut prelude = Vec::new();
        match self.expr(expr, line, &mut prelude) {
            Ok(condition) => {
                out.extend(prelude);
                Some(condition)
            }
            Err(Unsupported(message)) => {
                self.fail(line, DiagnosticKind::Unsupported, message, out);
                None
            }
        }
    }

    fn try_simple(&mut self, stmt: &Stmt, line: usize, out: &mut Vec<Op>) -> Lowered<()> {
        match &stmt.kind {
            StmtKind::VarDecl {
                name, array, init, ..
            } => {
                let init = match (array, init) {
                    (Some(ArraySpec::Sized(size)), _) => {
                        Some(Expr::ArrayOfSize(Box::new(self.expr(size, line, out)?)))
                    }
                    (Some(ArraySpec::Literal(items)), _) => Some(Expr::Array(self.operands(items, line, out)?)),
                    (None, Some(init)) => Some(self.expr(init, line, out)?),
                    (None, None) => None,
                };
                out.push(Op::Let {
                    name: name.clone(),
                    init,
                    line,
                });
            }
            StmtKind::ContainerDecl { name, kind } => out.push(Op::Let {
                name: name.clone(),
                init: Some(Expr::NewContainer(*kind)),
                line,
            }),
            StmtKind::Expr(expr) => self.expression_statement(expr, line, out)?,
            StmtKind::Print { args } => {
                let args = self.operands(args, line, out)?;
                out.push(Op::Print { args, line });
            }
            StmtKind::Delete(target) => {
                let target = self.expr(target, line, out)?;
                out.push(Op::Free { target, line });
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(value) => Some(self.expr(value, line, out)?),
                    None => None,
                };
                out.push(Op::Return { value, line });
            }
            StmtKind::Break => out.push(Op::Break { line }),
            StmtKind::Continue => out.push(Op::Continue { line }),
            StmtKind::Empty => {}
            StmtKind::Unsupported { reason } => return Err(Unsupported(reason.clone())),
            StmtKind::If { .. } | StmtKind::While { .. } | StmtKind::For { .. } | StmtKind::Block(_) => {
                return Err(Unsupported(
                    "Control flow is not allowed in this position".to_string(),
                ))
            }
        }
        Ok(())
    }

    fn expression_statement(&mut self, expr: &ast::Expr, line: usize, out: &mut Vec<Op>) -> Lowered<()> {
        match expr {
            ast::Expr::Assign {
                target, op, value, ..
            } => {
                let value = self.expr(value, line, out)?;
                let place = self.place(target, line, out)?;
                out.push(Op::Assign {
                    place,
                    op: *op,
                    value,
                    line,
                });
            }
            ast::Expr::Call { name, args, .. } if self.functions.contains(name) => {
                let args = self.operands(args, line, out)?;
                out.push(Op::Call {
                    dest: None,
                    function: name.clone(),
                    args,
                    line,
                });
            }
            other => {
                let expr = self.expr(other, line, out)?;
                out.push(Op::Eval { expr, line });
            }
        }
        Ok(())
    }

    /// Lower an expression, pushing hoisted calls and spills onto `out`
    pub(crate) fn expr(&mut self, expr: &ast::Expr, line: usize, out: &mut Vec<Op>) -> Lowered<Expr> {
        let lowered = match expr {
            ast::Expr::IntLiteral(n, _) => Expr::Const(Value::Int(*n)),
            ast::Expr::FloatLiteral(x, _) => Expr::Const(Value::Float(*x)),
            ast::Expr::CharLiteral(c, _) => Expr::Const(Value::Char(*c)),
            ast::Expr::StringLiteral(s, _) => Expr::Const(Value::Str(s.clone())),
            ast::Expr::BoolLiteral(b, _) => Expr::Const(Value::Bool(*b)),
            ast::Expr::Null(_) => Expr::Const(Value::Null),
            ast::Expr::Variable(name, _) => Expr::Var(name.clone()),

            ast::Expr::Binary {
                op: op @ (BinOp::And | BinOp::Or),
                left,
                right,
                ..
            } => self.short_circuit(*op, left, right, line, out)?,
            ast::Expr::Binary { op, left, right, .. } => {
                let (left, right) = self.pair(left, right, line, out)?;
                Expr::Binary {
                    op: *op,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }

            ast::Expr::Unary { op, operand, .. } => match op {
                UnOp::Neg => Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(self.expr(operand, line, out)?),
                },
                UnOp::Not => self.expr(operand, line, out)?.not(),
                UnOp::PreInc | UnOp::PreDec | UnOp::PostInc | UnOp::PostDec => Expr::IncDec {
                    place: Box::new(self.place(operand, line, out)?),
                    delta: if matches!(op, UnOp::PreInc | UnOp::PostInc) { 1 } else { -1 },
                    prefix: matches!(op, UnOp::PreInc | UnOp::PreDec),
                },
                UnOp::Deref => return Err(deref_unsupported()),
                UnOp::AddrOf => {
                    return Err(Unsupported(
                        "Taking an address with '&' is not supported".to_string(),
                    ))
                }
            },

            ast::Expr::Assign { .. } => {
                return Err(Unsupported(
                    "Assignment inside an expression is not supported; assign in its own statement".to_string(),
                ))
            }

            ast::Expr::Ternary {
                condition,
                then_expr,
                else_expr,
                ..
            } => self.ternary(condition, then_expr, else_expr, line, out)?,

            ast::Expr::Call { name, args, .. } => {
                let args = self.operands(args, line, out)?;
                if self.functions.contains(name) {
                    let temp = self.fresh_temp();
                    out.push(Op::Call {
                        dest: Some(temp.clone()),
                        function: name.clone(),
                        args,
                        line,
                    });
                    Expr::Var(temp)
                } else {
                    self.diagnostics.push(Diagnostic::new(
                        line,
                        DiagnosticKind::UnknownFunction,
                        format!("Call to '{}', which is not defined in this program", name),
                    ));
                    Expr::Call {
                        function: name.clone(),
                        args,
                    }
                }
            }

            ast::Expr::MethodCall {
                object,
                method,
                args,
                ..
            } => {
                let mut values = self.operands(iter::once(&**object).chain(args), line, out)?;
                let target = values.remove(0);
                Expr::Method {
                    target: Box::new(target),
                    method: method.clone(),
                    args: values,
                }
            }

            ast::Expr::Index { array, index, .. } => {
                let (base, index) = self.pair(array, index, line, out)?;
                Expr::Index {
                    base: Box::new(base),
                    index: Box::new(index),
                }
            }

            ast::Expr::PointerField { object, field, .. } => Expr::GetField {
                object: Box::new(self.expr(object, line, out)?),
                field: field.clone(),
            },

            ast::Expr::Member { field, .. } => return Err(member_unsupported(field)),

            ast::Expr::New { type_name, args, .. } => {
                if !args.is_empty() {
                    return Err(Unsupported(format!(
                        "Constructor arguments are not supported: allocate with 'new {}()' and set fields with '->'",
                        type_name
                    )));
                }
                Expr::Alloc(type_name.clone())
            }
        };
        Ok(lowered)
    }

    /// Lower an assignment target
    fn place(&mut self, expr: &ast::Expr, line: usize, out: &mut Vec<Op>) -> Lowered<Place> {
        match expr {
            ast::Expr::Variable(name, _) => Ok(Place::Var(name.clone())),
            ast::Expr::PointerField { object, field, .. } => Ok(Place::Field {
                object: self.expr(object, line, out)?,
                field: field.clone(),
            }),
            ast::Expr::Index { array, index, .. } => {
                let base = self.place(array, line, out)?;
                let index = self.expr(index, line, out)?;
                Ok(Place::Index {
                    base: Box::new(base),
                    index,
                })
            }
            ast::Expr::Member { field, .. } => Err(member_unsupported(field)),
            ast::Expr::Unary { op: UnOp::Deref, .. } => Err(deref_unsupported()),
            _ => Err(Unsupported("Left side of the assignment is not assignable".to_string())),
        }
    }

    /// Two operands in order, spilling the first if the second hoists a call
    fn pair(
        &mut self,
        first: &ast::Expr,
        second: &ast::Expr,
        line: usize,
        out: &mut Vec<Op>,
    ) -> Lowered<(Expr, Expr)> {
        let mut first = self.expr(first, line, out)?;
        let mut prelude = Vec::new();
        let second = self.expr(second, line, &mut prelude)?;
        if !prelude.is_empty() {
            self.spill(&mut first, line, out);
            out.extend(prelude);
        }
        Ok((first, second))
    }

    /// Operand list in order, spilling earlier operands before each hoisted call
    fn operands<'e>(
        &mut self,
        exprs: impl IntoIterator<Item = &'e ast::Expr>,
        line: usize,
        out: &mut Vec<Op>,
    ) -> Lowered<Vec<Expr>> {
        let mut lowered: Vec<Expr> = Vec::new();
        for expr in exprs {
            let mut prelude = Vec::new();
            let value = self.expr(expr, line, &mut prelude)?;
            if !prelude.is_empty() {
                for earlier in lowered.iter_mut() {
                    self.spill(earlier, line, out);
                }
                out.extend(prelude);
            }
            lowered.push(value);
        }
        Ok(lowered)
    }

    /// Bind an already-lowered operand to a temporary
    fn spill(&mut self, expr: &mut Expr, line: usize, out: &mut Vec<Op>) {
        let is_temp = matches!(expr, Expr::Var(name) if name.starts_with(TEMP_PREFIX));
        if expr.is_const() || is_temp {
            return;
        }
        let temp = self.fresh_temp();
        let value = std::mem::replace(expr, Expr::Var(temp.clone()));
        out.push(Op::Let {
            name: temp,
            init: Some(value),
            line,
        });
    }

    fn short_circuit(
        &mut self,
        op: BinOp,
        left: &ast::Expr,
        right: &ast::Expr,
        line: usize,
        out: &mut Vec<Op>,
    ) -> Lowered<Expr> {
        let left = self.expr(left, line, out)?;
        let mut prelude = Vec::new();
        let right = self.expr(right, line, &mut prelude)?;
        if prelude.is_empty() {
            return Ok(Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        // $t = !!left; if ($t) { ...; $t = !!right; }  (negated test for ||)
        let temp = self.fresh_temp();
        out.push(Op::Let {
            name: temp.clone(),
            init: Some(left.truthy()),
            line,
        });
        prelude.push(Op::Assign {
            place: Place::Var(temp.clone()),
            op: None,
            value: right.truthy(),
            line,
        });
        let condition = match op {
            BinOp::Or => Expr::Var(temp.clone()).not(),
            _ => Expr::Var(temp.clone()),
        };
        out.push(Op::If {
            condition,
            then_ops: prelude.into(),
            else_ops: Vec::new().into(),
            line,
        });
        Ok(Expr::Var(temp))
    }

    fn ternary(
        &mut self,
        condition: &ast::Expr,
        then_expr: &ast::Expr,
        else_expr: &ast::Expr,
        line: usize,
        out: &mut Vec<Op>,
    ) -> Lowered<Expr> {
        let condition = self.expr(condition, line, out)?;
        let mut then_ops = Vec::new();
        let then_value = self.expr(then_expr, line, &mut then_ops)?;
        let mut else_ops = Vec::new();
        let else_value = self.expr(else_expr, line, &mut else_ops)?;

        if then_ops.is_empty() && else_ops.is_empty() {
            return Ok(Expr::Ternary {
                condition: Box::new(condition),
                then_expr: Box::new(then_value),
                else_expr: Box::new(else_value),
            });
        }

        let temp = self.fresh_temp();
        out.push(Op::Let {
            name: temp.clone(),
            init: None,
            line,
        });
        for (ops, value) in [(&mut then_ops, then_value), (&mut else_ops, else_value)] {
            ops.push(Op::Assign {
                place: Place::Var(temp.clone()),
                op: None,
                value,
                line,
            });
        }
        out.push(Op::If {
            condition,
            then_ops: then_ops.into(),
            else_ops: else_ops.into(),
            line,
        });
        Ok(Expr::Var(temp))
    }
}

fn deref_unsupported() -> Unsupported {
    Unsupported("Dereferencing with '*' is not supported; reach fields with '->'".to_string())
}

fn member_unsupported(field: &str) -> Unsupported {
    Unsupported(format!(
        "Member access '.{}' needs a value-typed object; use a pointer and '->{}'",
        field, field
    ))
}

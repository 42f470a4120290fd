//! Expression evaluation
//!
//! Expressions of the instrumented form never suspend: every call to a
//! defined function was hoisted into its own operation by the transformer.
//! Evaluation therefore runs to completion against the current activation,
//! the heap and the container table.

use crate::interpreter::engine::Machine;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::access::{check_array_len, index_value};
use crate::interpreter::ops::binary::evaluate_binary_op;
use crate::interpreter::ops::unary::evaluate_unary_op;
use crate::memory::value::Value;
use crate::memory::Memory;
use crate::parser::ast::BinOp;
use crate::transform::instrumented::Expr;

impl Machine {
    pub(crate) fn evaluate(&mut self, expr: &Expr, memory: &mut Memory, line: usize) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Const(value) => Ok(value.clone()),

            Expr::Var(name) => self.read_var(name, line),

            Expr::Binary { op: BinOp::And, left, right } => {
                if !self.evaluate(left, memory, line)?.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.evaluate(right, memory, line)?.is_truthy()))
            }

            Expr::Binary { op: BinOp::Or, left, right } => {
                if self.evaluate(left, memory, line)?.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.evaluate(right, memory, line)?.is_truthy()))
            }

            Expr::Binary { op, left, right } => {
                let left = self.evaluate(left, memory, line)?;
                let right = self.evaluate(right, memory, line)?;
                evaluate_binary_op(*op, &left, &right, line)
            }

            Expr::Unary { op, operand } => {
                let value = self.evaluate(operand, memory, line)?;
                evaluate_unary_op(*op, value, line)
            }

            Expr::IncDec { place, delta, prefix } => {
                self.evaluate_inc_dec(place, *delta, *prefix, memory, line)
            }

            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                if self.evaluate(condition, memory, line)?.is_truthy() {
                    self.evaluate(then_expr, memory, line)
                } else {
                    self.evaluate(else_expr, memory, line)
                }
            }

            Expr::Alloc(type_tag) => Ok(Value::Address(memory.allocate(type_tag))),

            Expr::GetField { object, field } => {
                let object = self.evaluate(object, memory, line)?;
                self.read_field(&object, field, memory, line)
            }

            Expr::NewContainer(kind) => self
                .containers
                .create(*kind, memory)
                .map(Value::Address)
                .map_err(|err| RuntimeError::container(err, line)),

            Expr::Method { target, method, args } => {
                let target = self.evaluate(target, memory, line)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.evaluate(arg, memory, line)?);
                }
                self.call_method(&target, method, values, memory, line)
            }

            Expr::Index { base, index } => {
                let base = self.evaluate(base, memory, line)?;
                let index = self.evaluate(index, memory, line)?;
                index_value(&base, &index, line)
            }

            Expr::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.evaluate(item, memory, line)?);
                }
                Ok(Value::Array(values))
            }

            Expr::ArrayOfSize(size) => {
                let size = self.evaluate(size, memory, line)?;
                match size.as_int().map(usize::try_from) {
                    Some(Ok(n)) => {
                        check_array_len(n, line)?;
                        Ok(Value::Array(vec![Value::Undefined; n]))
                    }
                    _ => Err(RuntimeError::type_error(
                        format!("invalid array size {}", size),
                        line,
                    )),
                }
            }

            Expr::Call { function, .. } => Err(RuntimeError::UndefinedFunction {
                name: function.clone(),
                line,
            }),
        }
    }

    fn call_method(
        &mut self,
        target: &Value,
        method: &str,
        args: Vec<Value>,
        memory: &mut Memory,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        let container = target
            .as_address()
            .and_then(|address| self.containers.get_mut(address));

        match container {
            Some(container) => container
                .call(memory, method, args)
                .map_err(|err| RuntimeError::container(err, line)),
            None => Err(RuntimeError::NotAContainer {
                method: method.to_string(),
                found: target.type_name(),
                line,
            }),
        }
    }
}

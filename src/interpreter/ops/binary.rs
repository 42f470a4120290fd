//! Binary operator evaluation
//!
//! Integer arithmetic stays integral (truncating division, checked overflow)
//! as long as both operands are integers, chars or bools. A floating operand
//! makes the whole operation floating. `+` with a string on either side
//! concatenates the display forms.

use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::BinOp;
use std::cmp::Ordering;

/// Evaluate a non-short-circuit binary operator on two values
pub(crate) fn evaluate_binary_op(
    op: BinOp,
    left: &Value,
    right: &Value,
    line: usize,
) -> Result<Value, RuntimeError> {
    use BinOp::*;

    match op {
        Add if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) => {
            Ok(Value::Str(format!("{}{}", left, right)))
        }
        Add | Sub | Mul | Div | Mod => arithmetic(op, left, right, line),
        Eq => Ok(Value::Bool(values_equal(left, right))),
        Ne => Ok(Value::Bool(!values_equal(left, right))),
        Lt | Le | Gt | Ge => {
            let ordering = compare(left, right).ok_or_else(|| mismatch(op, left, right, line))?;
            Ok(Value::Bool(match op {
                Lt => ordering == Ordering::Less,
                Le => ordering != Ordering::Greater,
                Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
    }
}

fn mismatch(op: BinOp, left: &Value, right: &Value, line: usize) -> RuntimeError {
    RuntimeError::type_error(
        format!(
            "cannot apply '{}' to {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ),
        line,
    )
}

fn arithmetic(op: BinOp, left: &Value, right: &Value, line: usize) -> Result<Value, RuntimeError> {
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        return checked_int_op(op, a, b, line).map(Value::Int);
    }

    match (left.as_float(), right.as_float()) {
        (Some(a), Some(b)) => Ok(Value::Float(match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
            _ => a % b,
        })),
        _ => Err(mismatch(op, left, right, line)),
    }
}

#[inline]
fn checked_int_op(op: BinOp, a: i64, b: i64, line: usize) -> Result<i64, RuntimeError> {
    let overflow = |symbol: &str| RuntimeError::IntegerOverflow {
        operation: format!("{} {} {}", a, symbol, b),
        line,
    };

    match op {
        BinOp::Add => a.checked_add(b).ok_or_else(|| overflow("+")),
        BinOp::Sub => a.checked_sub(b).ok_or_else(|| overflow("-")),
        BinOp::Mul => a.checked_mul(b).ok_or_else(|| overflow("*")),
        BinOp::Div => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero {
                    operation: "Division",
                    line,
                });
            }
            a.checked_div(b).ok_or_else(|| overflow("/"))
        }
        _ => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero {
                    operation: "Modulo",
                    line,
                });
            }
            a.checked_rem(b).ok_or_else(|| overflow("%"))
        }
    }
}

/// `==` semantics: numbers by value, strings by content, addresses by identity
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null | Value::Undefined, Value::Null | Value::Undefined) => true,
        (Value::Address(a), Value::Address(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        _ => match (left.as_int(), right.as_int()) {
            (Some(a), Some(b)) => a == b,
            _ => match (left.as_float(), right.as_float()) {
                (Some(a), Some(b)) => a == b,
                _ => left == right,
            },
        },
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (left.as_float(), right.as_float()) {
        return a.partial_cmp(&b);
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Address(a), Value::Address(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::value::Address;

    fn eval(op: BinOp, l: Value, r: Value) -> Result<Value, RuntimeError> {
        evaluate_binary_op(op, &l, &r, 1)
    }

    #[test]
    fn test_integer_division_truncates() {
        assert_eq!(eval(BinOp::Div, Value::Int(7), Value::Int(2)), Ok(Value::Int(3)));
        assert_eq!(eval(BinOp::Div, Value::Int(-7), Value::Int(2)), Ok(Value::Int(-3)));
        assert_eq!(eval(BinOp::Mod, Value::Int(-7), Value::Int(2)), Ok(Value::Int(-1)));
    }

    #[test]
    fn test_float_promotion() {
        assert_eq!(
            eval(BinOp::Div, Value::Int(7), Value::Float(2.0)),
            Ok(Value::Float(3.5))
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(
            eval(BinOp::Div, Value::Int(1), Value::Int(0)),
            Err(RuntimeError::DivisionByZero { .. })
        ));
        assert!(matches!(
            eval(BinOp::Mod, Value::Int(1), Value::Int(0)),
            Err(RuntimeError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_overflow() {
        assert!(matches!(
            eval(BinOp::Add, Value::Int(i64::MAX), Value::Int(1)),
            Err(RuntimeError::IntegerOverflow { .. })
        ));
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(
            eval(BinOp::Add, Value::from("n = "), Value::Int(4)),
            Ok(Value::from("n = 4"))
        );
    }

    #[test]
    fn test_char_promotes() {
        assert_eq!(eval(BinOp::Add, Value::Char('a'), Value::Int(1)), Ok(Value::Int(98)));
        assert_eq!(eval(BinOp::Lt, Value::Char('a'), Value::Char('b')), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_pointer_equality() {
        let p = Value::Address(Address(0x1000));
        assert_eq!(eval(BinOp::Eq, p.clone(), p.clone()), Ok(Value::Bool(true)));
        assert_eq!(eval(BinOp::Ne, p, Value::Null), Ok(Value::Bool(true)));
        assert_eq!(eval(BinOp::Eq, Value::Null, Value::Undefined), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_type_mismatch() {
        assert!(matches!(
            eval(BinOp::Sub, Value::from("a"), Value::Int(1)),
            Err(RuntimeError::TypeError { .. })
        ));
        assert!(matches!(
            eval(BinOp::Lt, Value::Undefined, Value::Int(1)),
            Err(RuntimeError::TypeError { .. })
        ));
    }
}

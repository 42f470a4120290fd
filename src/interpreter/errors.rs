//! Runtime error types for the executor
//!
//! This module defines [`RuntimeError`], which represents all errors that can occur
//! while running an instrumented program (as opposed to transform errors).
//!
//! All runtime errors are fatal to the run: the scheduler reports them to its
//! observers and returns to idle.

use crate::containers::ContainerError;
use crate::memory::MemoryError;
use thiserror::Error;

/// Runtime errors that can occur during execution
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Reference to a name no scope declares
    #[error("Undefined variable '{name}' at line {line}")]
    UndefinedVariable { name: String, line: usize },

    /// Call to a name no function definition provides
    #[error("Undefined function '{name}' at line {line}")]
    UndefinedFunction { name: String, line: usize },

    /// Assignment to a name that was never declared
    #[error("Assignment to undeclared variable '{name}' at line {line}")]
    UndeclaredAssignment { name: String, line: usize },

    /// Operands of the wrong kind
    #[error("Type error at line {line}: {message}")]
    TypeError { message: String, line: usize },

    /// Integer division or modulo by zero
    #[error("{operation} by zero at line {line}")]
    DivisionByZero { operation: &'static str, line: usize },

    /// Integer overflow in arithmetic operation
    #[error("Integer overflow in operation: {operation} at line {line}")]
    IntegerOverflow { operation: String, line: usize },

    /// Container method failure, including popping an empty container
    #[error("{source} at line {line}")]
    Container { source: ContainerError, line: usize },

    /// Heap access failure under the strict access policy
    #[error("{source} at line {line}")]
    Memory { source: MemoryError, line: usize },

    /// Method call on a value that is not a container
    #[error("'{method}' called on {found}, which is not a stack or queue, at line {line}")]
    NotAContainer {
        method: String,
        found: &'static str,
        line: usize,
    },

    /// Too many operations between two pause points
    #[error("Execution exceeded {budget} operations without pausing at line {line}")]
    StepBudgetExceeded { budget: usize, line: usize },

    /// Activation depth limit reached
    #[error("Call depth limit of {depth} exceeded at line {line}")]
    CallDepthExceeded { depth: usize, line: usize },

    /// An array size or element write past the array length limit
    #[error("Array of {length} elements exceeds the limit of {limit} at line {line}")]
    ArrayTooLarge { length: usize, limit: usize, line: usize },

    /// A construct the transformer could not rewrite
    #[error("Unsupported construct at line {line}: {message}")]
    Unsupported { message: String, line: usize },

    /// `break` or `continue` with no enclosing loop
    #[error("'{keyword}' outside of a loop at line {line}")]
    OutsideLoop { keyword: &'static str, line: usize },
}

impl RuntimeError {
    /// Source line the error occurred on
    pub fn line(&self) -> usize {
        match self {
            RuntimeError::UndefinedVariable { line, .. }
            | RuntimeError::UndefinedFunction { line, .. }
            | RuntimeError::UndeclaredAssignment { line, .. }
            | RuntimeError::TypeError { line, .. }
            | RuntimeError::DivisionByZero { line, .. }
            | RuntimeError::IntegerOverflow { line, .. }
            | RuntimeError::Container { line, .. }
            | RuntimeError::Memory { line, .. }
            | RuntimeError::NotAContainer { line, .. }
            | RuntimeError::StepBudgetExceeded { line, .. }
            | RuntimeError::CallDepthExceeded { line, .. }
            | RuntimeError::ArrayTooLarge { line, .. }
            | RuntimeError::Unsupported { line, .. }
            | RuntimeError::OutsideLoop { line, .. } => *line,
        }
    }

    pub(crate) fn type_error(message: impl Into<String>, line: usize) -> Self {
        RuntimeError::TypeError {
            message: message.into(),
            line,
        }
    }

    pub(crate) fn memory(source: MemoryError, line: usize) -> Self {
        RuntimeError::Memory { source, line }
    }

    pub(crate) fn container(source: ContainerError, line: usize) -> Self {
        match source {
            ContainerError::Memory(source) => RuntimeError::Memory { source, line },
            source => RuntimeError::Container { source, line },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::ContainerKind;

    #[test]
    fn test_messages_carry_line() {
        let err = RuntimeError::UndefinedVariable {
            name: "y".to_string(),
            line: 7,
        };
        assert_eq!(err.to_string(), "Undefined variable 'y' at line 7");
        assert_eq!(err.line(), 7);
    }

    #[test]
    fn test_empty_container_message() {
        let err = RuntimeError::container(ContainerError::Empty(ContainerKind::Stack), 4);
        assert_eq!(err.to_string(), "Stack is empty at line 4");
    }
}

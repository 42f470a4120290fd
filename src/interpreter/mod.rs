//! Resumable executor
//!
//! This module runs the [`Instrumented`](crate::transform::Instrumented) form:
//! - [`engine`]: the [`Machine`] and its cursor-based resume loop
//! - [`env`]: block-scoped variables of one activation
//! - [`expressions`] and [`ops`]: expression, operator and place evaluation
//! - [`errors`]: runtime error types
//!
//! # Execution Model
//!
//! A run is a [`Machine`] plus the [`Memory`](crate::memory::Memory) it
//! mutates. [`Machine::resume`] executes operations until it reaches a pause
//! point, returning [`Yield::Paused`], or the end of the program. Between two
//! resumes nothing runs, so the caller decides when (and whether) to continue.

pub mod constants;
pub mod engine;
pub mod env;
pub mod errors;
pub mod expressions;
pub mod ops;

pub use engine::{Limits, Machine, Yield};
pub use errors::RuntimeError;

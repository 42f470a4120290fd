//! Memory model for the executor
//!
//! This module provides the core memory abstractions:
//! - [`value`]: Runtime value representation
//! - [`stack`]: Observable call stack of frames
//! - [`heap`]: Arena of heap objects with tombstone tracking
//!
//! [`Memory`] is the facade the executor, the container adapters and the
//! scheduler talk to. It owns both halves and applies the [`AccessPolicy`].
//!
//! # Access Policy
//!
//! Field access through an address that is unknown, freed or not an address
//! at all is governed by one named policy:
//!
//! | Operation            | `Permissive` (default) | `Strict`            |
//! |----------------------|------------------------|---------------------|
//! | `set_field` on miss  | silent no-op           | `MemoryError`       |
//! | `get_field` on miss  | `Undefined`            | `MemoryError`       |
//! | `free` on miss       | no-op                  | no-op / double free |
//!
//! Reading a field that was never set on a live object yields `Undefined`
//! under both policies.

pub mod heap;
pub mod stack;
pub mod value;

use heap::{Heap, HeapObject};
use indexmap::IndexMap;
use stack::{CallStack, Frame};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::trace;
use value::{Address, Value};

/// Errors raised by heap access under [`AccessPolicy::Strict`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("invalid pointer: address {0} was never allocated")]
    UnknownAddress(Address),

    #[error("use after free: address {0} has been freed")]
    UseAfterFree(Address),

    #[error("double free of address {0}")]
    DoubleFree(Address),

    #[error("expected a pointer, got {0}")]
    NotAnAddress(&'static str),
}

/// How heap accesses through bad addresses are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessPolicy {
    /// Unknown addresses degrade to no-ops and `undefined` reads
    #[default]
    Permissive,
    /// Unknown, freed and non-address accesses are errors
    Strict,
}

/// Call stack + heap arena
#[derive(Debug, Clone, Default)]
pub struct Memory {
    stack: CallStack,
    heap: Heap,
    policy: AccessPolicy,
}

impl Memory {
    pub fn new(policy: AccessPolicy) -> Self {
        Memory {
            stack: CallStack::new(),
            heap: Heap::new(),
            policy,
        }
    }

    // ===== Heap =====

    /// Issue a fresh address holding an empty object of `type_tag`
    pub fn allocate(&mut self, type_tag: &str) -> Address {
        let addr = self.heap.allocate(type_tag);
        trace!(%addr, type_tag, "allocate");
        addr
    }

    /// Remove the object at `addr` if present
    ///
    /// Freeing an address that was never issued is a no-op under both
    /// policies; a second free of the same address is an error only when
    /// strict.
    pub fn free(&mut self, addr: Address) -> Result<(), MemoryError> {
        trace!(%addr, "free");
        match self.heap.free(addr) {
            Ok(()) | Err(MemoryError::UnknownAddress(_)) => Ok(()),
            Err(err) => self.tolerate(err),
        }
    }

    pub fn set_field(&mut self, addr: Address, field: &str, value: Value) -> Result<(), MemoryError> {
        match self.heap.get_mut(addr) {
            Ok(object) => {
                object.fields.insert(field.to_string(), value);
                Ok(())
            }
            Err(err) => self.tolerate(err),
        }
    }

    pub fn get_field(&self, addr: Address, field: &str) -> Result<Value, MemoryError> {
        match self.heap.get(addr) {
            Ok(object) => Ok(object.fields.get(field).cloned().unwrap_or_default()),
            Err(err) => self.tolerate(err).map(|_| Value::Undefined),
        }
    }

    /// Resolve a value used as a pointer
    ///
    /// `nullptr`, `undefined` and other non-addresses yield `None` when
    /// permissive, which turns the surrounding access into a no-op.
    pub fn expect_address(&self, value: &Value) -> Result<Option<Address>, MemoryError> {
        match value {
            Value::Address(addr) => Ok(Some(*addr)),
            other => self
                .tolerate(MemoryError::NotAnAddress(other.type_name()))
                .map(|_| None),
        }
    }

    /// Look up a live object
    pub fn object(&self, addr: Address) -> Option<&HeapObject> {
        self.heap.get(addr).ok()
    }

    fn tolerate(&self, err: MemoryError) -> Result<(), MemoryError> {
        match self.policy {
            AccessPolicy::Permissive => {
                trace!(%err, "ignored by permissive policy");
                Ok(())
            }
            AccessPolicy::Strict => Err(err),
        }
    }

    // ===== Call stack =====

    pub fn push_frame(&mut self, name: &str) -> &Frame {
        self.stack.push_frame(name)
    }

    pub fn pop_frame(&mut self) -> Option<&Frame> {
        self.stack.pop_frame()
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.stack.current_frame()
    }

    pub fn update_variables(&mut self, variables: IndexMap<String, Value>) {
        self.stack.update_variables(variables);
    }

    pub fn set_line(&mut self, line: usize) {
        self.stack.set_line(line);
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    // ===== Observers =====

    pub fn snapshot_stack(&self) -> Vec<Frame> {
        self.stack.frames().to_vec()
    }

    pub fn snapshot_heap(&self) -> BTreeMap<Address, HeapObject> {
        self.heap.snapshot()
    }

    /// Reset call stack, heap and address counter; safe to repeat
    pub fn clear(&mut self) {
        self.stack.clear();
        self.heap.clear();
    }
}

//! Heap-backed container adapters
//!
//! [`StackAdapter`] (LIFO) and [`QueueAdapter`] (FIFO) keep a private element
//! sequence for their own logic and mirror it into a heap object so the memory
//! snapshot always shows true contents. After construction and after every
//! `push`/`pop` the adapter re-publishes the *entire* sequence as the `items`
//! field and its length as the `size` field; there is no other place container
//! state can be observed from.
//!
//! [`ContainerTable`] maps heap addresses to adapters so that a source-level
//! variable holding the address can dispatch method calls.

mod table;

pub use table::{Container, ContainerTable};

use crate::memory::value::{Address, Value};
use crate::memory::{Memory, MemoryError};
pub use crate::parser::ast::ContainerKind;
use std::collections::VecDeque;
use thiserror::Error;

/// Errors raised by container operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContainerError {
    /// `pop`/`top`/`front`/`back` on a container with no elements
    #[error("{0} is empty")]
    Empty(ContainerKind),

    #[error("{kind} has no method '{method}'")]
    UnknownMethod { kind: ContainerKind, method: String },

    #[error("{kind}::{method} expects {expected} argument(s), got {got}")]
    Arity {
        kind: ContainerKind,
        method: String,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

const ITEMS_FIELD: &str = "items";
const SIZE_FIELD: &str = "size";

fn publish<'a>(
    memory: &mut Memory,
    address: Address,
    items: impl Iterator<Item = &'a Value>,
    len: usize,
) -> Result<(), ContainerError> {
    memory.set_field(address, ITEMS_FIELD, Value::Array(items.cloned().collect()))?;
    memory.set_field(address, SIZE_FIELD, Value::Int(len as i64))?;
    Ok(())
}

/// LIFO container mirrored into a heap object tagged `Stack`
#[derive(Debug, Clone)]
pub struct StackAdapter {
    address: Address,
    items: Vec<Value>,
}

impl StackAdapter {
    pub fn new(memory: &mut Memory) -> Result<Self, ContainerError> {
        let adapter = StackAdapter {
            address: memory.allocate(ContainerKind::Stack.type_tag()),
            items: Vec::new(),
        };
        adapter.publish(memory)?;
        Ok(adapter)
    }

    pub fn push(&mut self, memory: &mut Memory, value: Value) -> Result<(), ContainerError> {
        self.items.push(value);
        self.publish(memory)
    }

    /// Remove and return the last element
    pub fn pop(&mut self, memory: &mut Memory) -> Result<Value, ContainerError> {
        let value = self
            .items
            .pop()
            .ok_or(ContainerError::Empty(ContainerKind::Stack))?;
        self.publish(memory)?;
        Ok(value)
    }

    pub fn top(&self) -> Result<Value, ContainerError> {
        self.items
            .last()
            .cloned()
            .ok_or(ContainerError::Empty(ContainerKind::Stack))
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn publish(&self, memory: &mut Memory) -> Result<(), ContainerError> {
        publish(memory, self.address, self.items.iter(), self.items.len())
    }
}

/// FIFO container mirrored into a heap object tagged `Queue`
#[derive(Debug, Clone)]
pub struct QueueAdapter {
    address: Address,
    items: VecDeque<Value>,
}

impl QueueAdapter {
    pub fn new(memory: &mut Memory) -> Result<Self, ContainerError> {
        let adapter = QueueAdapter {
            address: memory.allocate(ContainerKind::Queue.type_tag()),
            items: VecDeque::new(),
        };
        adapter.publish(memory)?;
        Ok(adapter)
    }

    pub fn push(&mut self, memory: &mut Memory, value: Value) -> Result<(), ContainerError> {
        self.items.push_back(value);
        self.publish(memory)
    }

    /// Remove and return the first element
    pub fn pop(&mut self, memory: &mut Memory) -> Result<Value, ContainerError> {
        let value = self
            .items
            .pop_front()
            .ok_or(ContainerError::Empty(ContainerKind::Queue))?;
        self.publish(memory)?;
        Ok(value)
    }

    pub fn front(&self) -> Result<Value, ContainerError> {
        self.items
            .front()
            .cloned()
            .ok_or(ContainerError::Empty(ContainerKind::Queue))
    }

    pub fn back(&self) -> Result<Value, ContainerError> {
        self.items
            .back()
            .cloned()
            .ok_or(ContainerError::Empty(ContainerKind::Queue))
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn publish(&self, memory: &mut Memory) -> Result<(), ContainerError> {
        publish(memory, self.address, self.items.iter(), self.items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn items_field(memory: &Memory, address: Address) -> Value {
        memory.get_field(address, ITEMS_FIELD).unwrap()
    }

    #[test]
    fn test_construction_publishes_empty_state() {
        let mut memory = Memory::default();
        let stack = StackAdapter::new(&mut memory).unwrap();
        let heap = memory.snapshot_heap();
        let object = &heap[&stack.address()];

        assert_eq!(object.type_tag, "Stack");
        assert_eq!(object.fields[ITEMS_FIELD], Value::Array(vec![]));
        assert_eq!(object.fields[SIZE_FIELD], Value::Int(0));
    }

    #[test]
    fn test_empty_container_errors() {
        let mut memory = Memory::default();
        let mut stack = StackAdapter::new(&mut memory).unwrap();
        let mut queue = QueueAdapter::new(&mut memory).unwrap();

        let stack_empty = ContainerError::Empty(ContainerKind::Stack);
        let queue_empty = ContainerError::Empty(ContainerKind::Queue);
        assert_eq!(stack.pop(&mut memory), Err(stack_empty.clone()));
        assert_eq!(stack.top(), Err(stack_empty));
        assert_eq!(queue.pop(&mut memory), Err(queue_empty.clone()));
        assert_eq!(queue.front(), Err(queue_empty.clone()));
        assert_eq!(queue.back(), Err(queue_empty));
        assert_eq!(
            ContainerError::Empty(ContainerKind::Stack).to_string(),
            "Stack is empty"
        );
    }

    #[test]
    fn test_pop_republishes_whole_sequence() {
        let mut memory = Memory::default();
        let mut stack = StackAdapter::new(&mut memory).unwrap();
        for n in [10, 20, 30] {
            stack.push(&mut memory, Value::Int(n)).unwrap();
        }
        assert_eq!(stack.pop(&mut memory), Ok(Value::Int(30)));

        let object = memory.object(stack.address()).unwrap();
        assert_eq!(
            object.fields[ITEMS_FIELD],
            Value::Array(vec![Value::Int(10), Value::Int(20)])
        );
        assert_eq!(object.fields[SIZE_FIELD], Value::Int(2));
    }

    #[derive(Debug, Clone)]
    enum QueueOp {
        Push(i64),
        Pop,
    }

    fn queue_op() -> impl Strategy<Value = QueueOp> {
        prop_oneof![
            3 => any::<i64>().prop_map(QueueOp::Push),
            1 => Just(QueueOp::Pop),
        ]
    }

    proptest! {
        /// top() is the last pushed value and size() the push count.
        #[test]
        fn prop_stack_top_is_last_push(values in prop::collection::vec(any::<i64>(), 1..40)) {
            let mut memory = Memory::default();
            let mut stack = StackAdapter::new(&mut memory).unwrap();
            for v in &values {
                stack.push(&mut memory, Value::Int(*v)).unwrap();
            }

            prop_assert_eq!(stack.top().unwrap(), Value::Int(*values.last().unwrap()));
            prop_assert_eq!(stack.size(), values.len());
            prop_assert_eq!(
                items_field(&memory, stack.address()),
                Value::Array(values.iter().map(|v| Value::Int(*v)).collect())
            );
        }

        /// front() is the oldest surviving push and back() the newest.
        #[test]
        fn prop_queue_front_back(ops in prop::collection::vec(queue_op(), 1..60)) {
            let mut memory = Memory::default();
            let mut queue = QueueAdapter::new(&mut memory).unwrap();
            let mut model: VecDeque<i64> = VecDeque::new();
            let mut last_pushed = None;

            for op in ops {
                match op {
                    QueueOp::Push(v) => {
                        queue.push(&mut memory, Value::Int(v)).unwrap();
                        model.push_back(v);
                        last_pushed = Some(v);
                    }
                    QueueOp::Pop => {
                        let expected = model.pop_front();
                        let got = queue.pop(&mut memory);
                        match expected {
                            Some(v) => prop_assert_eq!(got, Ok(Value::Int(v))),
                            None => prop_assert_eq!(got, Err(ContainerError::Empty(ContainerKind::Queue))),
                        }
                    }
                }

                if let (Some(front), Some(last)) = (model.front(), last_pushed) {
                    prop_assert_eq!(queue.front().unwrap(), Value::Int(*front));
                    prop_assert_eq!(queue.back().unwrap(), Value::Int(last));
                }
                prop_assert_eq!(queue.size(), model.len());
                prop_assert_eq!(queue.empty(), model.is_empty());
            }
        }
    }
}

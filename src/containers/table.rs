// Address -> adapter dispatch for container method calls

use super::{ContainerError, ContainerKind, QueueAdapter, StackAdapter};
use crate::memory::value::{Address, Value};
use crate::memory::Memory;
use rustc_hash::FxHashMap;

/// A live container adapter of either kind
#[derive(Debug, Clone)]
pub enum Container {
    Stack(StackAdapter),
    Queue(QueueAdapter),
}

impl Container {
    pub fn kind(&self) -> ContainerKind {
        match self {
            Container::Stack(_) => ContainerKind::Stack,
            Container::Queue(_) => ContainerKind::Queue,
        }
    }

    pub fn address(&self) -> Address {
        match self {
            Container::Stack(s) => s.address(),
            Container::Queue(q) => q.address(),
        }
    }

    /// Dispatch a source-level method call
    pub fn call(
        &mut self,
        memory: &mut Memory,
        method: &str,
        mut args: Vec<Value>,
    ) -> Result<Value, ContainerError> {
        let kind = self.kind();
        let expected = if method == "push" { 1 } else { 0 };
        if args.len() != expected {
            return Err(ContainerError::Arity {
                kind,
                method: method.to_string(),
                expected,
                got: args.len(),
            });
        }

        match (self, method) {
            (Container::Stack(s), "push") => {
                s.push(memory, args.remove(0))?;
                Ok(Value::Undefined)
            }
            (Container::Queue(q), "push") => {
                q.push(memory, args.remove(0))?;
                Ok(Value::Undefined)
            }
            (Container::Stack(s), "pop") => s.pop(memory),
            (Container::Queue(q), "pop") => q.pop(memory),
            (Container::Stack(s), "top") => s.top(),
            (Container::Queue(q), "front") => q.front(),
            (Container::Queue(q), "back") => q.back(),
            (Container::Stack(s), "size") => Ok(Value::Int(s.size() as i64)),
            (Container::Queue(q), "size") => Ok(Value::Int(q.size() as i64)),
            (Container::Stack(s), "empty") => Ok(Value::Bool(s.empty())),
            (Container::Queue(q), "empty") => Ok(Value::Bool(q.empty())),
            _ => Err(ContainerError::UnknownMethod {
                kind,
                method: method.to_string(),
            }),
        }
    }
}

/// All adapters created during one run, keyed by backing address
#[derive(Debug, Clone, Default)]
pub struct ContainerTable {
    by_address: FxHashMap<Address, Container>,
}

impl ContainerTable {
    pub fn new() -> Self {
        ContainerTable::default()
    }

    /// Construct an adapter of `kind` and return its backing address
    pub fn create(&mut self, kind: ContainerKind, memory: &mut Memory) -> Result<Address, ContainerError> {
        let container = match kind {
            ContainerKind::Stack => Container::Stack(StackAdapter::new(memory)?),
            ContainerKind::Queue => Container::Queue(QueueAdapter::new(memory)?),
        };
        let address = container.address();
        self.by_address.insert(address, container);
        Ok(address)
    }

    pub fn get_mut(&mut self, address: Address) -> Option<&mut Container> {
        self.by_address.get_mut(&address)
    }

    pub fn clear(&mut self) {
        self.by_address.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_by_address() {
        let mut memory = Memory::default();
        let mut table = ContainerTable::new();
        let addr = table.create(ContainerKind::Queue, &mut memory).unwrap();

        let queue = table.get_mut(addr).unwrap();
        queue.call(&mut memory, "push", vec![Value::Int(1)]).unwrap();
        queue.call(&mut memory, "push", vec![Value::Int(2)]).unwrap();
        assert_eq!(queue.call(&mut memory, "front", vec![]), Ok(Value::Int(1)));
        assert_eq!(queue.call(&mut memory, "back", vec![]), Ok(Value::Int(2)));
        assert_eq!(queue.call(&mut memory, "size", vec![]), Ok(Value::Int(2)));
    }

    #[test]
    fn test_wrong_method_for_kind() {
        let mut memory = Memory::default();
        let mut table = ContainerTable::new();
        let addr = table.create(ContainerKind::Stack, &mut memory).unwrap();
        let stack = table.get_mut(addr).unwrap();

        assert!(matches!(
            stack.call(&mut memory, "front", vec![]),
            Err(ContainerError::UnknownMethod { .. })
        ));
        assert!(matches!(
            stack.call(&mut memory, "push", vec![]),
            Err(ContainerError::Arity { expected: 1, got: 0, .. })
        ));
    }
}

//! Reading and writing places: variables, heap fields and array elements

use crate::interpreter::constants::MAX_ARRAY_LEN;
use crate::interpreter::engine::Machine;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::{Address, Value};
use crate::memory::Memory;
use crate::transform::instrumented::Place;

/// A place with its index and object expressions already evaluated
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
    Var(String),
    Field {
        address: Option<Address>,
        field: String,
    },
    Element {
        base: Box<Slot>,
        index: Value,
    },
}

impl Machine {
    /// Evaluate the expressions inside `place` exactly once
    pub(crate) fn resolve_place(&mut self, place: &Place, memory: &mut Memory, line: usize) -> Result<Slot, RuntimeError> {
        match place {
            Place::Var(name) => Ok(Slot::Var(name.clone())),
            Place::Field { object, field } => {
                let object = self.evaluate(object, memory, line)?;
                let address = memory
                    .expect_address(&object)
                    .map_err(|err| RuntimeError::memory(err, line))?;
                Ok(Slot::Field {
                    address,
                    field: field.clone(),
                })
            }
            Place::Index { base, index } => {
                let index = self.evaluate(index, memory, line)?;
                let base = self.resolve_place(base, memory, line)?;
                Ok(Slot::Element {
                    base: Box::new(base),
                    index,
                })
            }
        }
    }

    pub(crate) fn read_slot(&self, slot: &Slot, memory: &Memory, line: usize) -> Result<Value, RuntimeError> {
        match slot {
            Slot::Var(name) => self.read_var(name, line),
            Slot::Field { address: None, .. } => Ok(Value::Undefined),
            Slot::Field {
                address: Some(address),
                field,
            } => memory
                .get_field(*address, field)
                .map_err(|err| RuntimeError::memory(err, line)),
            Slot::Element { base, index } => {
                let base = self.read_slot(base, memory, line)?;
                index_value(&base, index, line)
            }
        }
    }

    pub(crate) fn write_slot(
        &mut self,
        slot: &Slot,
        value: Value,
        memory: &mut Memory,
        line: usize,
    ) -> Result<(), RuntimeError> {
        match slot {
            Slot::Var(name) => match self.lookup_mut(name) {
                Some(target) => {
                    *target = value;
                    Ok(())
                }
                None => Err(RuntimeError::UndeclaredAssignment {
                    name: name.clone(),
                    line,
                }),
            },
            Slot::Field { address: None, .. } => Ok(()),
            Slot::Field {
                address: Some(address),
                field,
            } => memory
                .set_field(*address, field, value)
                .map_err(|err| RuntimeError::memory(err, line)),
            Slot::Element { base, index } => {
                let position = element_position(index, line)?;
                let mut items = match self.read_slot(base, memory, line)? {
                    Value::Array(items) => items,
                    other => {
                        return Err(RuntimeError::type_error(
                            format!("cannot assign an element of {}", other.type_name()),
                            line,
                        ))
                    }
                };
                if position >= items.len() {
                    check_array_len(position + 1, line)?;
                    items.resize(position + 1, Value::Undefined);
                }
                items[position] = value;
                self.write_slot(base, Value::Array(items), memory, line)
            }
        }
    }

    pub(crate) fn read_var(&self, name: &str, line: usize) -> Result<Value, RuntimeError> {
        self.lookup(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedVariable {
                name: name.to_string(),
                line,
            })
    }

    /// `memory.getField(object, field)`
    pub(crate) fn read_field(
        &self,
        object: &Value,
        field: &str,
        memory: &Memory,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        let address = memory
            .expect_address(object)
            .map_err(|err| RuntimeError::memory(err, line))?;
        self.read_slot(
            &Slot::Field {
                address,
                field: field.to_string(),
            },
            memory,
            line,
        )
    }
}

/// Arrays may not grow past [`MAX_ARRAY_LEN`] elements
pub(crate) fn check_array_len(len: usize, line: usize) -> Result<(), RuntimeError> {
    if len > MAX_ARRAY_LEN {
        return Err(RuntimeError::ArrayTooLarge {
            length: len,
            limit: MAX_ARRAY_LEN,
            line,
        });
    }
    Ok(())
}

fn element_position(index: &Value, line: usize) -> Result<usize, RuntimeError> {
    index
        .as_int()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| RuntimeError::type_error(format!("invalid array index {}", index), line))
}

/// `base[index]`; positions past the end read as undefined
pub(crate) fn index_value(base: &Value, index: &Value, line: usize) -> Result<Value, RuntimeError> {
    let Some(position) = index.as_int() else {
        return Err(RuntimeError::type_error(
            format!("array index must be an integer, got {}", index.type_name()),
            line,
        ));
    };
    let Ok(position) = usize::try_from(position) else {
        return Ok(Value::Undefined);
    };

    match base {
        Value::Array(items) => Ok(items.get(position).cloned().unwrap_or_default()),
        Value::Str(text) => Ok(text.chars().nth(position).map(Value::Char).unwrap_or_default()),
        other => Err(RuntimeError::type_error(
            format!("cannot index {}", other.type_name()),
            line,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_reads() {
        let array = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(index_value(&array, &Value::Int(1), 1), Ok(Value::Int(2)));
        assert_eq!(index_value(&array, &Value::Int(5), 1), Ok(Value::Undefined));
        assert_eq!(index_value(&array, &Value::Int(-1), 1), Ok(Value::Undefined));
        assert_eq!(
            index_value(&Value::from("abc"), &Value::Int(2), 1),
            Ok(Value::Char('c'))
        );
    }

    #[test]
    fn test_array_length_limit() {
        assert!(check_array_len(MAX_ARRAY_LEN, 1).is_ok());
        assert!(matches!(
            check_array_len(MAX_ARRAY_LEN + 1, 7),
            Err(RuntimeError::ArrayTooLarge { line: 7, .. })
        ));
    }

    #[test]
    fn test_index_type_errors() {
        assert!(index_value(&Value::Int(3), &Value::Int(0), 2).is_err());
        assert!(index_value(&Value::Array(Vec::new()), &Value::from("k"), 2).is_err());
    }
}

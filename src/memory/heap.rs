//! Heap arena
//!
//! Heap objects live in an index-based slot table. An [`Address`] maps to its
//! slot arithmetically (`HEAP_ADDRESS_START + index * HEAP_ADDRESS_STRIDE`), so
//! lookups never hash and addresses come out strictly increasing.
//!
//! Freed objects are kept as tombstones until the next [`Heap::clear`]: their
//! slot is never handed out again, which keeps stale pointer comparisons
//! meaningful and lets the strict access policy tell a use-after-free apart
//! from a pointer that was never issued.

use super::value::{Address, Value};
use super::MemoryError;
use crate::interpreter::constants::{HEAP_ADDRESS_START, HEAP_ADDRESS_STRIDE};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

/// State of a heap slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockState {
    Allocated,
    Tombstone, // Freed; the address stays retired
}

/// One allocated unit: a type tag and an insertion-ordered field bag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeapObject {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub fields: IndexMap<String, Value>,
}

impl HeapObject {
    pub fn new(type_tag: impl Into<String>) -> Self {
        HeapObject {
            type_tag: type_tag.into(),
            fields: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct HeapSlot {
    object: HeapObject,
    state: BlockState,
}

/// The heap arena
#[derive(Debug, Clone, Default)]
pub struct Heap {
    slots: Vec<HeapSlot>,
}

impl Heap {
    pub fn new() -> Self {
        Heap::default()
    }

    /// Allocate an empty object tagged `type_tag` at a fresh address
    pub fn allocate(&mut self, type_tag: &str) -> Address {
        let addr = Self::address_of(self.slots.len());
        self.slots.push(HeapSlot {
            object: HeapObject::new(type_tag),
            state: BlockState::Allocated,
        });
        addr
    }

    /// Free an object (mark as tombstone)
    pub fn free(&mut self, addr: Address) -> Result<(), MemoryError> {
        match self.slot_index(addr).and_then(|i| self.slots.get_mut(i)) {
            Some(slot) if slot.state == BlockState::Allocated => {
                slot.state = BlockState::Tombstone;
                slot.object.fields.clear();
                Ok(())
            }
            Some(_) => Err(MemoryError::DoubleFree(addr)),
            None => Err(MemoryError::UnknownAddress(addr)),
        }
    }

    /// Get a live object (error if freed or never allocated)
    pub fn get(&self, addr: Address) -> Result<&HeapObject, MemoryError> {
        match self.slot_index(addr).and_then(|i| self.slots.get(i)) {
            Some(slot) if slot.state == BlockState::Allocated => Ok(&slot.object),
            Some(_) => Err(MemoryError::UseAfterFree(addr)),
            None => Err(MemoryError::UnknownAddress(addr)),
        }
    }

    /// Get a mutable live object
    pub fn get_mut(&mut self, addr: Address) -> Result<&mut HeapObject, MemoryError> {
        match self.slot_index(addr).and_then(|i| self.slots.get_mut(i)) {
            Some(slot) if slot.state == BlockState::Allocated => Ok(&mut slot.object),
            Some(_) => Err(MemoryError::UseAfterFree(addr)),
            None => Err(MemoryError::UnknownAddress(addr)),
        }
    }

    /// Live objects keyed by address, in allocation order
    pub fn snapshot(&self) -> BTreeMap<Address, HeapObject> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.state == BlockState::Allocated)
            .map(|(i, slot)| (Self::address_of(i), slot.object.clone()))
            .collect()
    }

    /// Drop every object and restart the address counter
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    fn address_of(index: usize) -> Address {
        Address(HEAP_ADDRESS_START + index as u64 * HEAP_ADDRESS_STRIDE)
    }

    fn slot_index(&self, addr: Address) -> Option<usize> {
        let offset = addr.0.checked_sub(HEAP_ADDRESS_START)?;
        if offset % HEAP_ADDRESS_STRIDE != 0 {
            return None;
        }
        usize::try_from(offset / HEAP_ADDRESS_STRIDE).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_are_increasing_and_unique() {
        let mut heap = Heap::new();
        let a = heap.allocate("Node");
        let b = heap.allocate("Node");
        assert!(b > a);
        assert_eq!(a, Address(HEAP_ADDRESS_START));
    }

    #[test]
    fn test_free_keeps_address_retired() {
        let mut heap = Heap::new();
        let a = heap.allocate("Node");
        heap.free(a).unwrap();
        let b = heap.allocate("Node");
        assert_ne!(a, b);
        assert!(matches!(heap.get(a), Err(MemoryError::UseAfterFree(_))));
        assert!(matches!(heap.free(a), Err(MemoryError::DoubleFree(_))));
    }

    #[test]
    fn test_unknown_address() {
        let heap = Heap::new();
        assert!(matches!(
            heap.get(Address(0x1008)),
            Err(MemoryError::UnknownAddress(_))
        ));
        assert!(matches!(
            heap.get(Address(0x10)),
            Err(MemoryError::UnknownAddress(_))
        ));
    }

    #[test]
    fn test_snapshot_skips_tombstones() {
        let mut heap = Heap::new();
        let a = heap.allocate("A");
        let b = heap.allocate("B");
        heap.free(a).unwrap();
        let snap = heap.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[&b].type_tag, "B");
    }

    #[test]
    fn test_clear_resets_counter() {
        let mut heap = Heap::new();
        heap.allocate("A");
        heap.allocate("B");
        heap.clear();
        assert_eq!(heap.allocate("C"), Address(HEAP_ADDRESS_START));
    }
}

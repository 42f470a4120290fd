// Observable state published to front ends

use crate::memory::heap::HeapObject;
use crate::memory::value::{Address, Value};
use crate::memory::Memory;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

pub use crate::memory::stack::Frame as FrameSnapshot;

/// Captured program output
#[derive(Debug, Clone, Default)]
pub struct OutputLog {
    pub lines: Vec<OutputLine>,
}

impl OutputLog {
    pub fn new() -> Self {
        OutputLog::default()
    }

    /// Append one print statement's text; embedded newlines start new lines
    pub fn push(&mut self, line: usize, text: String) {
        for part in text.split('\n') {
            self.lines.push(OutputLine {
                text: part.to_string(),
                line,
            });
        }
    }

    /// Get all lines as a vector of strings
    pub fn texts(&self) -> Vec<String> {
        self.lines.iter().map(|l| l.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// A line of program output with the source line that printed it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputLine {
    pub text: String,
    pub line: usize,
}

/// What observers see at a pause or a state change
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Snapshot {
    /// Line of the outstanding pause; `None` when nothing is paused
    pub line: Option<usize>,
    pub variables: IndexMap<String, Value>,
    pub heap: BTreeMap<Address, HeapObject>,
    pub stack: Vec<FrameSnapshot>,
    pub running: bool,
}

impl Snapshot {
    /// Snapshot taken at a pause point
    pub fn paused(line: usize, variables: IndexMap<String, Value>, memory: &Memory) -> Self {
        Snapshot {
            line: Some(line),
            variables,
            heap: memory.snapshot_heap(),
            stack: memory.snapshot_stack(),
            running: true,
        }
    }

    /// Snapshot after a run ended; the heap stays inspectable
    pub fn finished(memory: &Memory) -> Self {
        Snapshot {
            line: None,
            variables: IndexMap::new(),
            heap: memory.snapshot_heap(),
            stack: memory.snapshot_stack(),
            running: false,
        }
    }

    /// Nothing running, nothing to show
    pub fn empty() -> Self {
        Snapshot::default()
    }

    /// Heap objects tagged `type_tag`
    pub fn objects_of_type<'a>(&'a self, type_tag: &'a str) -> impl Iterator<Item = (&'a Address, &'a HeapObject)> {
        self.heap.iter().filter(move |(_, obj)| obj.type_tag == type_tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_splits_embedded_newlines() {
        let mut log = OutputLog::new();
        log.push(3, "a\nb".to_string());
        log.push(4, "c".to_string());
        assert_eq!(log.texts(), vec!["a", "b", "c"]);
        assert_eq!(log.lines[1].line, 3);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let mut memory = Memory::default();
        memory.push_frame("global");
        let addr = memory.allocate("Node");
        memory.set_field(addr, "val", Value::Int(1)).unwrap();
        let mut variables = IndexMap::new();
        variables.insert("p".to_string(), Value::Address(addr));
        variables.insert("q".to_string(), Value::Undefined);

        let json = serde_json::to_value(Snapshot::paused(2, variables, &memory)).unwrap();
        assert_eq!(json["line"], 2);
        assert_eq!(json["variables"]["p"], "0x1000");
        assert!(json["variables"]["q"].is_null());
        assert_eq!(json["heap"]["0x1000"]["type"], "Node");
        assert_eq!(json["heap"]["0x1000"]["fields"]["val"], 1);
        assert_eq!(json["running"], true);
    }
}

// Constants for the executor and memory model

/// First address issued by the heap arena after a `clear()`
pub const HEAP_ADDRESS_START: u64 = 0x1000;

/// Distance between consecutive heap addresses
pub const HEAP_ADDRESS_STRIDE: u64 = 0x10;

/// Name of the frame that holds top-level declarations
pub const ROOT_FRAME_NAME: &str = "global";

/// Entry function invoked automatically after the top-level statements
pub const ENTRY_FUNCTION: &str = "main";

/// Default number of operations allowed between two pause points
pub const DEFAULT_STEP_BUDGET: usize = 100_000;

/// Largest array a program may create or grow into
pub const MAX_ARRAY_LEN: usize = 1 << 20;

/// Default maximum number of nested function activations
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Prefix of compiler-introduced temporaries; never a valid source identifier
pub const TEMP_PREFIX: &str = "$t";

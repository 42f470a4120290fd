//! # Introduction
//!
//! logiclens runs programs written in a small C-like language one visible
//! step at a time, publishing the call stack and the heap at every step so a
//! front end can draw them.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Lexer → Parser → Syntax tree → Transformer → Instrumented form
//!        → Machine (resumable) ⇄ Scheduler → Snapshots → observers / TUI
//! ```
//!
//! 1. [`parser`]: tokenises the source and builds a syntax tree that keeps
//!    the line layout pause placement depends on.
//! 2. [`transform`]: rewrites declarations, pointer access and output into
//!    memory-model operations, hoists calls, and injects pause points.
//! 3. [`interpreter`]: a resumable executor for the instrumented form.
//! 4. [`memory`] and [`containers`]: the simulated call stack, heap arena
//!    and the heap-backed `stack`/`queue` adapters.
//! 5. [`scheduler`] and [`session`]: run/advance/reset lifecycle and
//!    observer notification.
//! 6. [`snapshot`]: what observers see at each pause.
//! 7. [`ui`]: ratatui-based TUI; not part of the stable library API.
//!
//! ## Supported language
//!
//! Types: `int`, `double`, `char`, `bool`, `string`, `auto`, pointers to
//! named types, `stack<T>`, `queue<T>`, arrays.
//! Control flow: `if/else`, `while`, `for`, `break`, `continue`, `return`.
//! Heap: `new T()`, `delete p`, `p->field`.
//! Output: `cout << ... << endl`.

pub mod containers;
pub mod interpreter;
pub mod logging;
pub mod memory;
pub mod parser;
pub mod scheduler;
pub mod session;
pub mod snapshot;
pub mod transform;
pub mod ui;

pub use session::{Session, SessionConfig, SessionError};

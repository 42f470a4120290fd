//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]**: application state, keyboard event loop, pane focus
//! - **[`panes`]**: stateless render functions for each visible pane (source,
//!   stack, heap, output, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The UI only consumes what a [`Session`](crate::Session) publishes: the
//! current snapshot, the output log and the scheduler state. Construct an
//! [`App`] and call [`App::run`](app::App::run) to start the event loop.

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;

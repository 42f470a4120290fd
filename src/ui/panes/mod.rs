//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: Source code with syntax highlighting and the paused line
//! - [`stack`]: Call stack frames with their published variables
//! - [`heap`]: Live heap objects with their fields
//! - [`output`]: Program output, rewrite diagnostics and the last error
//! - [`status`]: Status bar with keybindings and scheduler state
//!
//! Each pane module exports a `render_*` function; scrolling panes take their
//! offset by `&mut` and clamp it to the content they draw.

pub mod heap;
pub mod output;
pub mod source;
pub mod stack;
pub mod status;

pub use heap::render_heap_pane;
pub use output::{render_output_pane, OutputRenderData};
pub use source::{render_source_pane, SourceScrollState};
pub use stack::render_stack_pane;
pub use status::{render_status_bar, StatusRenderData};

use crate::memory::value::Value;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders, List, ListItem},
};

pub(crate) fn pane_block(title: &str, is_focused: bool) -> Block<'_> {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

/// Clamp `offset` and cut `items` down to what fits in `height` rows
pub(crate) fn visible_list<'a>(items: Vec<ListItem<'a>>, height: u16, offset: &mut usize) -> List<'a> {
    let visible_height = height.saturating_sub(2).max(1) as usize; // borders
    let total = items.len();

    if total > visible_height {
        *offset = (*offset).min(total - visible_height);
    } else {
        *offset = 0;
    }

    List::new(
        items
            .into_iter()
            .skip(*offset)
            .take(visible_height)
            .collect::<Vec<_>>(),
    )
}

/// A value styled by kind
pub(crate) fn value_span(value: &Value) -> Span<'static> {
    let style = match value {
        Value::Address(_) => Style::default().fg(DEFAULT_THEME.pointer),
        Value::Null | Value::Undefined => Style::default().fg(DEFAULT_THEME.comment),
        Value::Str(_) | Value::Char(_) => Style::default().fg(DEFAULT_THEME.string),
        Value::Int(_) | Value::Float(_) | Value::Bool(_) => Style::default().fg(DEFAULT_THEME.number),
        Value::Array(_) => Style::default().fg(DEFAULT_THEME.fg),
    };
    let text = match value {
        Value::Str(s) => format!("\"{}\"", s),
        Value::Char(c) => format!("'{}'", c),
        Value::Address(addr) => format!("→ {}", addr),
        other => other.to_string(),
    };
    Span::styled(text, style)
}

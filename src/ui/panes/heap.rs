//! Heap pane rendering
//!
//! One entry per live heap object: its address and type tag, then its
//! fields in insertion order. Container objects show their element sequence
//! like any other field.

use super::{pane_block, value_span, visible_list};
use crate::memory::heap::HeapObject;
use crate::memory::value::Address;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::ListItem,
    Frame,
};
use std::collections::BTreeMap;

/// Render the heap pane
pub fn render_heap_pane(
    frame: &mut Frame,
    area: Rect,
    heap: &BTreeMap<Address, HeapObject>,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let mut items = Vec::new();

    if heap.is_empty() {
        items.push(ListItem::new("(no allocations)").style(Style::default().fg(DEFAULT_THEME.comment)));
    }

    for (addr, object) in heap {
        items.push(ListItem::new(Line::from(vec![
            Span::styled(addr.to_string(), Style::default().fg(DEFAULT_THEME.pointer)),
            Span::styled(" | ", Style::default().fg(DEFAULT_THEME.comment)),
            Span::styled(
                object.type_tag.clone(),
                Style::default()
                    .fg(DEFAULT_THEME.type_name)
                    .add_modifier(Modifier::BOLD),
            ),
        ])));

        for (field, value) in &object.fields {
            items.push(ListItem::new(Line::from(vec![
                Span::raw("  ."),
                Span::styled(field.clone(), Style::default().fg(DEFAULT_THEME.fg)),
                Span::styled(" = ", Style::default().fg(DEFAULT_THEME.comment)),
                value_span(value),
            ])));
        }
    }

    let title = format!(" Heap ({} live) ", heap.len());
    let list = visible_list(items, area.height, scroll_offset).block(pane_block(&title, is_focused));
    frame.render_widget(list, area);
}

//! Call stack pane rendering
//!
//! Frames are listed innermost first. Each frame shows its name, the last
//! line it paused on and every variable it has published so far.

use super::{pane_block, value_span, visible_list};
use crate::snapshot::FrameSnapshot;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::ListItem,
    Frame,
};

/// Render the call stack pane
pub fn render_stack_pane(
    frame: &mut Frame,
    area: Rect,
    frames: &[FrameSnapshot],
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let mut items = Vec::new();

    if frames.is_empty() {
        items.push(ListItem::new("(not running)").style(Style::default().fg(DEFAULT_THEME.comment)));
    }

    for (depth, stack_frame) in frames.iter().rev().enumerate() {
        let name_style = if depth == 0 {
            Style::default()
                .fg(DEFAULT_THEME.function)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DEFAULT_THEME.comment)
        };

        let mut header = vec![Span::styled(stack_frame.name.clone(), name_style)];
        if let Some(line) = stack_frame.line {
            header.push(Span::styled(
                format!("  line {}", line),
                Style::default().fg(DEFAULT_THEME.comment),
            ));
        }
        items.push(ListItem::new(Line::from(header)));

        if stack_frame.variables.is_empty() {
            items.push(ListItem::new(Span::styled(
                "  (no variables)",
                Style::default().fg(DEFAULT_THEME.comment),
            )));
        }
        for (name, value) in &stack_frame.variables {
            items.push(ListItem::new(Line::from(vec![
                Span::raw("  "),
                Span::styled(name.clone(), Style::default().fg(DEFAULT_THEME.fg)),
                Span::styled(" = ", Style::default().fg(DEFAULT_THEME.comment)),
                value_span(value),
            ])));
        }
        items.push(ListItem::new(""));
    }

    let list = visible_list(items, area.height, scroll_offset).block(pane_block(" Call Stack ", is_focused));
    frame.render_widget(list, area);
}

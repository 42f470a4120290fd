//! Output pane rendering
//!
//! Program output first, then any rewrite diagnostics and the error that
//! ended the last run.

use super::{pane_block, visible_list};
use crate::interpreter::RuntimeError;
use crate::snapshot::OutputLog;
use crate::transform::Diagnostic;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::{ListItem, Padding},
    Frame,
};

/// Data needed to render the output pane
pub struct OutputRenderData<'a> {
    pub output: &'a OutputLog,
    pub diagnostics: &'a [Diagnostic],
    pub error: Option<&'a RuntimeError>,
}

/// Render the output pane
pub fn render_output_pane(
    frame: &mut Frame,
    area: Rect,
    data: OutputRenderData,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let mut items: Vec<ListItem> = data
        .output
        .lines
        .iter()
        .map(|line| ListItem::new(line.text.clone()).style(Style::default().fg(DEFAULT_THEME.fg)))
        .collect();

    for diagnostic in data.diagnostics {
        let color = if diagnostic.kind.is_error() {
            DEFAULT_THEME.error
        } else {
            DEFAULT_THEME.secondary
        };
        items.push(ListItem::new(diagnostic.to_string()).style(Style::default().fg(color)));
    }

    if let Some(error) = data.error {
        items.push(
            ListItem::new(format!("error: {}", error)).style(
                Style::default()
                    .fg(DEFAULT_THEME.error)
                    .add_modifier(Modifier::BOLD),
            ),
        );
    }

    if items.is_empty() {
        items.push(ListItem::new("(no output)").style(Style::default().fg(DEFAULT_THEME.comment)));
    }

    let block = pane_block(" Output ", is_focused).padding(Padding::new(1, 0, 0, 0));
    let list = visible_list(items, area.height, scroll_offset).block(block);
    frame.render_widget(list, area);
}

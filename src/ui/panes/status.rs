//! Status bar rendering with keybindings and state indicators

use crate::scheduler::SchedulerState;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Data needed to render the status bar
pub struct StatusRenderData<'a> {
    pub message: &'a str,
    pub state: SchedulerState,
    /// Pauses reached so far in the current run
    pub pauses: u64,
    pub failed: bool,
}

/// Render the status bar at the bottom
pub fn render_status_bar(frame: &mut Frame, area: Rect, data: StatusRenderData) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let (badge, badge_color) = match data.state {
        _ if data.failed => (" ERROR ", DEFAULT_THEME.error),
        SchedulerState::Running => (" RUNNING ", DEFAULT_THEME.success),
        SchedulerState::Aborted => (" ABORTED ", DEFAULT_THEME.secondary),
        SchedulerState::Idle => (" IDLE ", DEFAULT_THEME.primary),
    };
    let bar = Style::default().bg(DEFAULT_THEME.current_line_bg);

    let left_spans = vec![
        Span::styled(
            badge,
            Style::default()
                .bg(badge_color)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" Pause {} ", data.pauses), bar.fg(DEFAULT_THEME.comment)),
        Span::styled("| ", bar.fg(DEFAULT_THEME.comment)),
        Span::styled(
            data.message.to_string(),
            bar.fg(if data.failed {
                DEFAULT_THEME.error
            } else {
                DEFAULT_THEME.fg
            }),
        ),
    ];

    frame.render_widget(
        Paragraph::new(Line::from(left_spans))
            .style(bar)
            .alignment(Alignment::Left),
        layout[0],
    );

    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = bar.fg(DEFAULT_THEME.fg);
    let sep_style = bar.fg(DEFAULT_THEME.comment);

    let mut right_spans = Vec::new();
    for (i, (key, desc)) in [("r", "run"), ("n/→/⎵", "advance"), ("x", "reset"), ("⇥", "focus"), ("q", "quit")]
        .into_iter()
        .enumerate()
    {
        if i > 0 {
            right_spans.push(Span::styled("│", sep_style));
        }
        right_spans.push(Span::styled(format!(" {} ", key), key_style));
        right_spans.push(Span::styled(format!(" {} ", desc), desc_style));
    }

    frame.render_widget(
        Paragraph::new(Line::from(right_spans))
            .style(bar)
            .alignment(Alignment::Right),
        layout[1],
    );
}

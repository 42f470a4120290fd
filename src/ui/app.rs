//! Main TUI application state and logic

use crate::scheduler::SchedulerState;
use crate::session::Session;
use crate::transform::Diagnostic;
use crate::ui::panes::{self, OutputRenderData, SourceScrollState, StatusRenderData};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Stack,
    Heap,
    Output,
}

impl FocusedPane {
    /// Move focus to the next pane (clockwise: source -> output -> stack -> heap)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Output,
            FocusedPane::Output => FocusedPane::Stack,
            FocusedPane::Stack => FocusedPane::Heap,
            FocusedPane::Heap => FocusedPane::Source,
        }
    }
}

/// The main application state
pub struct App {
    pub session: Session,

    /// The source code being visualized
    pub source_code: String,

    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub source_scroll: SourceScrollState,
    pub stack_scroll: usize,
    pub heap_scroll: usize,
    pub output_scroll: usize,

    /// Diagnostics of the last transform
    pub diagnostics: Vec<Diagnostic>,

    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,
}

impl App {
    pub fn new(session: Session, source_code: String) -> Self {
        App {
            session,
            source_code,
            focused_pane: FocusedPane::Source,
            source_scroll: SourceScrollState::default(),
            stack_scroll: 0,
            heap_scroll: 0,
            output_scroll: 0,
            diagnostics: Vec::new(),
            should_quit: false,
            status_message: String::from("Press r to run"),
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[0]);

        // Left column: Source (top) | Output (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(columns[0]);

        // Right column: Stack (top) | Heap (bottom)
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[1]);

        let snapshot = self.session.snapshot();
        let error = self.session.scheduler().last_error();

        panes::render_source_pane(
            frame,
            left_rows[0],
            &self.source_code,
            snapshot.line,
            error.map(|e| e.line()),
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        panes::render_output_pane(
            frame,
            left_rows[1],
            OutputRenderData {
                output: self.session.output(),
                diagnostics: &self.diagnostics,
                error,
            },
            self.focused_pane == FocusedPane::Output,
            &mut self.output_scroll,
        );

        panes::render_stack_pane(
            frame,
            right_rows[0],
            &snapshot.stack,
            self.focused_pane == FocusedPane::Stack,
            &mut self.stack_scroll,
        );

        panes::render_heap_pane(
            frame,
            right_rows[1],
            &snapshot.heap,
            self.focused_pane == FocusedPane::Heap,
            &mut self.heap_scroll,
        );

        panes::render_status_bar(
            frame,
            main_chunks[1],
            StatusRenderData {
                message: &self.status_message,
                state: self.session.state(),
                pauses: self
                    .session
                    .scheduler()
                    .pause_token()
                    .map_or(0, |token| token.seq + 1),
                failed: error.is_some(),
            },
        );
    }

    pub(crate) fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Char('r') => self.start_run(),
            KeyCode::Char('n') | KeyCode::Char(' ') | KeyCode::Right => self.advance(),
            KeyCode::Char('x') => {
                self.session.reset();
                self.status_message = match self.session.state() {
                    SchedulerState::Aborted => "Run aborted".to_string(),
                    _ => "Reset".to_string(),
                };
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Source => {
                    // Scrolling up makes the current line move down visually
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_add(1));
                    }
                }
                FocusedPane::Stack => self.stack_scroll = self.stack_scroll.saturating_sub(1),
                FocusedPane::Heap => self.heap_scroll = self.heap_scroll.saturating_sub(1),
                FocusedPane::Output => self.output_scroll = self.output_scroll.saturating_sub(1),
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Source => {
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_sub(1));
                    }
                }
                FocusedPane::Stack => self.stack_scroll = self.stack_scroll.saturating_add(1),
                FocusedPane::Heap => self.heap_scroll = self.heap_scroll.saturating_add(1),
                FocusedPane::Output => self.output_scroll = self.output_scroll.saturating_add(1),
            },
            _ => {}
        }
    }

    fn start_run(&mut self) {
        if self.session.is_running() {
            self.session.reset();
        }

        match self.session.run(&self.source_code) {
            Ok(diagnostics) => {
                self.diagnostics = diagnostics.to_vec();
            }
            Err(err) => {
                self.diagnostics.clear();
                self.status_message = err.to_string();
                return;
            }
        }
        self.after_step();
    }

    fn advance(&mut self) {
        if !self.session.is_running() {
            self.status_message = "Nothing to advance; press r to run".to_string();
            return;
        }
        self.session.advance();
        self.after_step();
    }

    fn after_step(&mut self) {
        // Auto-scroll output to the bottom
        self.output_scroll = usize::MAX;

        if let Some(error) = self.session.scheduler().last_error() {
            self.status_message = error.to_string();
        } else if !self.session.is_running() {
            self.status_message = "Program finished".to_string();
        } else if let Some(line) = self.session.snapshot().line {
            self.status_message = format!("Paused at line {}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_focus_cycles() {
        let mut pane = FocusedPane::Source;
        for _ in 0..4 {
            pane = pane.next();
        }
        assert_eq!(pane, FocusedPane::Source);
    }

    #[test]
    fn test_keys_drive_session() {
        let source = "int main() {\n int x = 1;\n x = 2;\n}".to_string();
        let mut app = App::new(Session::default(), source);

        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.session.snapshot().line, Some(2));
        assert_eq!(app.status_message, "Paused at line 2");

        press(&mut app, KeyCode::Right);
        assert_eq!(app.session.snapshot().line, Some(3));

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.session.state(), SchedulerState::Aborted);
        assert_eq!(app.status_message, "Run aborted");

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}

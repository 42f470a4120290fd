// logiclens: step-by-step execution with call stack and heap visualization

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use logiclens::logging::{self, LogLevel, LogTarget};
use logiclens::memory::AccessPolicy;
use logiclens::snapshot::Snapshot;
use logiclens::ui::App;
use logiclens::{transform, Session, SessionConfig};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Run small C-like programs one visible step at a time
#[derive(Parser, Debug)]
#[command(name = "logiclens", version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Treat bad pointers, use-after-free and double free as errors
    #[arg(long, global = true)]
    strict: bool,

    /// Operations allowed between two pauses
    #[arg(long, value_name = "N", global = true)]
    step_budget: Option<usize>,

    /// Maximum nested call depth
    #[arg(long, value_name = "N", global = true)]
    max_depth: Option<usize>,

    /// Write logs to this file (the TUI never logs to the terminal)
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    /// More log output; repeat for more detail
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the interactive viewer
    View {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the instrumented form and its diagnostics
    Emit {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Advance through every pause and print each snapshot
    Trace {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// One JSON object per pause
        #[arg(long)]
        json: bool,
    },
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        let defaults = SessionConfig::default();
        SessionConfig {
            access_policy: if self.strict {
                AccessPolicy::Strict
            } else {
                AccessPolicy::Permissive
            },
            step_budget: self.step_budget.unwrap_or(defaults.step_budget),
            max_call_depth: self.max_depth.unwrap_or(defaults.max_call_depth),
        }
    }

    fn log_target(&self) -> LogTarget {
        match (&self.log_file, &self.command) {
            (Some(path), _) => LogTarget::File(path.clone()),
            (None, Commands::View { .. }) => LogTarget::Off,
            (None, _) => LogTarget::Stderr,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(LogLevel::from_verbosity(args.verbose), args.log_target())
        .context("Failed to open log file")?;

    let config = args.session_config();
    match &args.command {
        Commands::View { file } => view(&read_source(file)?, config),
        Commands::Emit { file } => emit(&read_source(file)?),
        Commands::Trace { file, json } => trace(&read_source(file)?, config, *json),
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn emit(source: &str) -> Result<()> {
    let program = transform::transform(source).context("Failed to transform source")?;
    print!("{}", program);
    for diagnostic in &program.diagnostics {
        eprintln!("{}", diagnostic);
    }
    Ok(())
}

fn trace(source: &str, config: SessionConfig, json: bool) -> Result<()> {
    let mut session = Session::new(config);
    for diagnostic in session.run(source).context("Failed to start run")? {
        eprintln!("{}", diagnostic);
    }

    while session.scheduler().pause_token().is_some() {
        let snapshot = session.snapshot();
        if json {
            println!("{}", serde_json::to_string(snapshot)?);
        } else {
            println!("{}", describe(snapshot));
        }
        session.advance();
    }

    if !json {
        for line in &session.output().lines {
            println!("> {}", line.text);
        }
    }

    if let Some(error) = session.scheduler().last_error() {
        bail!("Runtime error: {}", error);
    }
    Ok(())
}

fn describe(snapshot: &Snapshot) -> String {
    let variables: Vec<String> = snapshot
        .variables
        .iter()
        .map(|(name, value)| format!("{} = {}", name, value))
        .collect();
    format!(
        "line {:>3} | {} | heap: {} object(s)",
        snapshot.line.unwrap_or_default(),
        variables.join(", "),
        snapshot.heap.len()
    )
}

fn view(source: &str, config: SessionConfig) -> Result<()> {
    let mut app = App::new(Session::new(config), source.to_string());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.context("TUI error")
}

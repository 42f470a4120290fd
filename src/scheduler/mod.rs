//! Execution scheduler
//!
//! Owns one run at a time and decides when it moves. The lifecycle is
//!
//! ```text
//! Idle ──run──▶ Running ──finish/error──▶ Idle
//!                  │
//!                  └──reset──▶ Aborted
//! ```
//!
//! While Running, at most one [`PauseToken`] is outstanding. Execution only
//! moves forward on [`Scheduler::advance`]; there is no timer and no
//! background thread. Every pause and every terminal state change is pushed
//! to the registered [`Observer`]s as an [`Update`].
//!
//! Execution errors never escape `run`/`advance`: they are logged, reported
//! as [`Update::Failed`], and the scheduler returns to Idle.

use crate::interpreter::{Limits, Machine, RuntimeError, Yield};
use crate::memory::{AccessPolicy, Memory};
use crate::snapshot::{OutputLog, Snapshot};
use crate::transform::Instrumented;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Scheduler lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    #[default]
    Idle,
    Running,
    /// The last run was reset before it finished
    Aborted,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerState::Idle => write!(f, "idle"),
            SchedulerState::Running => write!(f, "running"),
            SchedulerState::Aborted => write!(f, "aborted"),
        }
    }
}

/// The suspension a run is currently waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PauseToken {
    /// Position of this pause within the run, starting at 0
    pub seq: u64,
    pub line: usize,
}

/// Notification pushed to observers
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Paused(Snapshot),
    Finished(Snapshot),
    Failed {
        error: RuntimeError,
        snapshot: Snapshot,
    },
    Reset,
}

/// Receives scheduler updates
pub trait Observer {
    fn notify(&mut self, update: &Update);
}

impl<F: FnMut(&Update)> Observer for F {
    fn notify(&mut self, update: &Update) {
        self(update)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("a program is already running; reset it first")]
    AlreadyRunning,
}

/// Drives a [`Machine`] one pause at a time
pub struct Scheduler {
    state: SchedulerState,
    memory: Memory,
    output: OutputLog,
    machine: Option<Machine>,
    token: Option<PauseToken>,
    next_seq: u64,
    snapshot: Snapshot,
    last_error: Option<RuntimeError>,
    limits: Limits,
    observers: Vec<Box<dyn Observer>>,
}

impl Scheduler {
    pub fn new(policy: AccessPolicy, limits: Limits) -> Self {
        Scheduler {
            state: SchedulerState::Idle,
            memory: Memory::new(policy),
            output: OutputLog::new(),
            machine: None,
            token: None,
            next_seq: 0,
            snapshot: Snapshot::empty(),
            last_error: None,
            limits,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: impl Observer + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    pub fn pause_token(&self) -> Option<PauseToken> {
        self.token
    }

    /// The most recent snapshot pushed to observers
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn output(&self) -> &OutputLog {
        &self.output
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn last_error(&self) -> Option<&RuntimeError> {
        self.last_error.as_ref()
    }

    /// Start a run and execute it up to its first pause
    pub fn run(&mut self, program: Rc<Instrumented>) -> Result<(), SchedulerError> {
        if self.state == SchedulerState::Running {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.memory.clear();
        self.output.clear();
        self.token = None;
        self.next_seq = 0;
        self.last_error = None;
        self.state = SchedulerState::Running;
        info!(functions = program.functions.len(), "run started");

        self.machine = Some(Machine::new(program, self.limits, &mut self.memory));
        self.drive();
        Ok(())
    }

    /// Release the outstanding pause; a no-op when none is outstanding
    pub fn advance(&mut self) {
        match self.token.take() {
            Some(token) => {
                debug!(seq = token.seq, line = token.line, "advance");
                self.drive();
            }
            None => debug!("advance ignored: no outstanding pause"),
        }
    }

    /// Drop the current run and clear all observable state
    pub fn reset(&mut self) {
        if self.state == SchedulerState::Running {
            warn!(token = ?self.token, "run aborted by reset");
            self.state = SchedulerState::Aborted;
        } else {
            self.state = SchedulerState::Idle;
        }

        self.token = None;
        self.machine = None;
        self.memory.clear();
        self.output.clear();
        self.last_error = None;
        self.snapshot = Snapshot::empty();
        self.publish(Update::Reset);
    }

    fn drive(&mut self) {
        let Some(machine) = self.machine.as_mut() else {
            return;
        };

        match machine.resume(&mut self.memory, &mut self.output) {
            Ok(Yield::Paused { line, variables }) => {
                let token = PauseToken {
                    seq: self.next_seq,
                    line,
                };
                self.next_seq += 1;
                self.token = Some(token);
                self.snapshot = Snapshot::paused(line, variables, &self.memory);
                debug!(seq = token.seq, line, "paused");
                self.publish(Update::Paused(self.snapshot.clone()));
            }
            Ok(Yield::Finished) => {
                self.stop();
                info!(pauses = self.next_seq, "run finished");
                self.publish(Update::Finished(self.snapshot.clone()));
            }
            Err(error) => {
                self.stop();
                warn!(%error, "run failed");
                self.last_error = Some(error.clone());
                self.publish(Update::Failed {
                    error,
                    snapshot: self.snapshot.clone(),
                });
            }
        }
    }

    fn stop(&mut self) {
        self.machine = None;
        self.token = None;
        self.state = SchedulerState::Idle;
        self.snapshot = Snapshot::finished(&self.memory);
    }

    fn publish(&mut self, update: Update) {
        for observer in &mut self.observers {
            observer.notify(&update);
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new(AccessPolicy::default(), Limits::default())
    }
}

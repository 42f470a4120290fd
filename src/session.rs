//! Per-run session
//!
//! A [`Session`] bundles everything one visualized program needs: the
//! configuration, the transformed program and the [`Scheduler`] that owns the
//! memory model. Front ends hold one session and talk to it through
//! [`Session::run`], [`Session::advance`] and [`Session::reset`].

use crate::interpreter::constants::{DEFAULT_MAX_CALL_DEPTH, DEFAULT_STEP_BUDGET};
use crate::interpreter::Limits;
use crate::memory::AccessPolicy;
use crate::scheduler::{Observer, Scheduler, SchedulerError, SchedulerState};
use crate::snapshot::{OutputLog, Snapshot};
use crate::transform::{self, Diagnostic, Instrumented, TransformError};
use std::rc::Rc;
use thiserror::Error;
use tracing::info;

/// Session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub access_policy: AccessPolicy,
    pub step_budget: usize,
    pub max_call_depth: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            access_policy: AccessPolicy::default(),
            step_budget: DEFAULT_STEP_BUDGET,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl SessionConfig {
    pub fn limits(&self) -> Limits {
        Limits {
            step_budget: self.step_budget,
            max_call_depth: self.max_call_depth,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// One front end's view of the system
pub struct Session {
    config: SessionConfig,
    scheduler: Scheduler,
    program: Option<Rc<Instrumented>>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Session {
            config,
            scheduler: Scheduler::new(config.access_policy, config.limits()),
            program: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn subscribe(&mut self, observer: impl Observer + 'static) {
        self.scheduler.subscribe(observer);
    }

    /// Transform `source` and start running it
    ///
    /// Returns the rewrite diagnostics; the run starts even when some are
    /// errors, since the affected constructs only fail once reached.
    pub fn run(&mut self, source: &str) -> Result<&[Diagnostic], SessionError> {
        if self.scheduler.is_running() {
            return Err(SchedulerError::AlreadyRunning.into());
        }

        let program = Rc::new(transform::transform(source)?);
        info!(
            diagnostics = program.diagnostics.len(),
            pauses = program.pauses().len(),
            "source transformed"
        );
        self.scheduler.run(Rc::clone(&program))?;
        let program = self.program.insert(program);
        Ok(&program.diagnostics)
    }

    pub fn advance(&mut self) {
        self.scheduler.advance();
    }

    pub fn reset(&mut self) {
        self.scheduler.reset();
    }

    /// Advance until the run is no longer running, returning every pause snapshot
    pub fn run_to_end(&mut self) -> Vec<Snapshot> {
        let mut pauses = Vec::new();
        while self.scheduler.pause_token().is_some() {
            pauses.push(self.scheduler.snapshot().clone());
            self.scheduler.advance();
        }
        pauses
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn snapshot(&self) -> &Snapshot {
        self.scheduler.snapshot()
    }

    pub fn output(&self) -> &OutputLog {
        self.scheduler.output()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The program of the most recent run
    pub fn program(&self) -> Option<&Instrumented> {
        self.program.as_deref()
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.access_policy, AccessPolicy::Permissive);
        assert_eq!(config.limits(), Limits::default());
    }

    #[test]
    fn test_transform_error_does_not_start() {
        let mut session = Session::default();
        let err = session.run("int main() {\n int x = 1 | 2;\n}").unwrap_err();
        assert!(matches!(err, SessionError::Transform(_)));
        assert_eq!(session.state(), SchedulerState::Idle);
        assert!(session.program().is_none());
    }

    #[test]
    fn test_run_to_end_collects_pauses() {
        let mut session = Session::default();
        let diagnostics = session.run("int main() {\n int x = 1;\n x = 2;\n}").unwrap();
        assert!(diagnostics.is_empty());
        let pauses = session.run_to_end();
        let lines: Vec<Option<usize>> = pauses.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![Some(2), Some(3), Some(4)]);
        assert_eq!(session.state(), SchedulerState::Idle);
    }
}

//! ---
//! ems_section: "03-persistence-logging"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Structured logging context and lifecycle events for analysis runs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Structured logging for R-CABLE.
//!
//! Events carry a fixed set of context fields (`project`, `run`, `segment`, `bus`) so
//! that a run's log lines can be filtered by cable or bus without parsing messages.

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

#[doc(hidden)]
pub use tracing as __tracing;

/// Install a plain development subscriber. Later calls are no-ops.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer())
        .try_init();
}

/// Context attached to events emitted through the `cable_*` macros.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogContext<'a> {
    /// Project or input file the run belongs to.
    pub project: Option<&'a str>,
    /// Analysis run identifier.
    pub run: Option<&'a str>,
    /// Cable segment identifier.
    pub segment: Option<&'a str>,
    /// Bus name.
    pub bus: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a project name.
    pub fn with_project(mut self, project: &'a str) -> Self {
        self.project = Some(project);
        self
    }

    /// Attach a run identifier.
    pub fn with_run(mut self, run: &'a str) -> Self {
        self.run = Some(run);
        self
    }

    /// Attach a segment identifier.
    pub fn with_segment(mut self, segment: &'a str) -> Self {
        self.segment = Some(segment);
        self
    }

    /// Attach a bus name.
    pub fn with_bus(mut self, bus: &'a str) -> Self {
        self.bus = Some(bus);
        self
    }
}

/// Outcome of a run lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Step finished and every item was resolved.
    Completed,
    /// Step finished but some items carry warnings or failures.
    Degraded,
    /// Step aborted.
    Aborted,
}

impl RunOutcome {
    /// Stable lower-case label used in the `outcome` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Completed => "completed",
            RunOutcome::Degraded => "degraded",
            RunOutcome::Aborted => "aborted",
        }
    }
}

/// Emit a lifecycle event for an analysis step. Level follows the outcome.
pub fn log_run_event(context: Option<&LogContext>, event: &str, message: &str, outcome: RunOutcome) {
    let empty = LogContext::default();
    let ctx = context.unwrap_or(&empty);
    match outcome {
        RunOutcome::Completed => {
            crate::cable_event!(tracing::Level::INFO, ctx, { event = event, outcome = outcome.as_str() }, "{}", message)
        }
        RunOutcome::Degraded => {
            crate::cable_event!(tracing::Level::WARN, ctx, { event = event, outcome = outcome.as_str() }, "{}", message)
        }
        RunOutcome::Aborted => {
            crate::cable_event!(tracing::Level::ERROR, ctx, { event = event, outcome = outcome.as_str() }, "{}", message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::Write,
        sync::{Arc, Mutex},
    };

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture(emit: impl FnOnce()) -> String {
        let sink = Captured::default();
        let writer = sink.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, emit);
        let bytes = sink.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn macros_attach_context_fields() {
        let output = capture(|| {
            let ctx = LogContext::new()
                .with_project("plant-a")
                .with_segment("C-101")
                .with_bus("MCC-1");
            cable_info!(context = ctx, "sized at {} mm²", 95);
            cable_debug!("no context");
        });
        assert!(output.contains("project=\"plant-a\""));
        assert!(output.contains("segment=\"C-101\""));
        assert!(output.contains("bus=\"MCC-1\""));
        assert!(output.contains("sized at 95 mm²"));
        assert!(output.contains("no context"));
    }

    #[test]
    fn warn_and_error_macros_use_their_levels() {
        let output = capture(|| {
            let ctx = LogContext::new().with_run("run-1");
            cable_warn!(context = ctx.clone(), "drop over limit");
            cable_error!(context = ctx, "no root");
        });
        assert!(output.contains("WARN"));
        assert!(output.contains("ERROR"));
        assert!(output.contains("run=\"run-1\""));
    }

    #[test]
    fn run_events_follow_outcome() {
        let output = capture(|| {
            let ctx = LogContext::new().with_run("run-2");
            log_run_event(Some(&ctx), "analysis.sizing", "all approved", RunOutcome::Completed);
            log_run_event(None, "analysis.paths", "2 unreachable", RunOutcome::Degraded);
            log_run_event(None, "analysis.roots", "cycles only", RunOutcome::Aborted);
        });
        assert!(output.contains("outcome=\"completed\""));
        assert!(output.contains("outcome=\"degraded\""));
        assert!(output.contains("outcome=\"aborted\""));
        assert!(output.contains("event=\"analysis.roots\""));
    }

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }
}

//! Collaborators the orchestrator talks to once per bus cycle.

use derive_new::new;

use crate::error::Diagnostic;
use crate::servo::servo::OperationMode;

/// Inputs of one bus cycle, in user units.
#[derive(Debug, Clone, Copy, PartialEq, Default, new)]
pub struct ProcessData {
    pub status_word: u16,
    pub actual_position: f64,
    pub actual_velocity: f64,
    pub actual_torque: f64,
    /// The master reached OP and the domain was exchanged this cycle.
    pub operational: bool,
}

pub trait ProcessDataChannel {
    fn exchange(&mut self) -> ProcessData;
    fn write(&mut self, control_word: u16, target_value: f64);
}

pub trait ModeSelect {
    fn set_operation_mode(&mut self, mode: OperationMode);
}

pub trait DiagnosticsSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticsSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Forwards every report to the `log` facade.
#[derive(Debug, Default)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        log::error!(
            "axis {}: {} (value {})",
            diagnostic.axis,
            diagnostic.code,
            diagnostic.value
        );
    }
}

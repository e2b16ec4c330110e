//! Paces an [`Orchestrator`] at the bus period.

use tokio::time::{sleep_until, Duration, Instant};

use ctrl_402::{
    bus::{DiagnosticsSink, ModeSelect, ProcessDataChannel},
    top_level::top_level::Orchestrator,
};

/// Cycles until `done` holds, checked before every cycle. Returns the number
/// of cycles run.
///
/// A stalled bus keeps this loop idling; wrap it in `tokio::time::timeout`
/// when that matters.
pub async fn run_until<B, D, F>(
    orchestrator: &mut Orchestrator,
    bus: &mut B,
    diagnostics: &mut D,
    cycle_time: Duration,
    mut done: F,
) -> usize
where
    B: ProcessDataChannel + ModeSelect + ?Sized,
    D: DiagnosticsSink + ?Sized,
    F: FnMut(&Orchestrator) -> bool,
{
    let mut next_cycle = Instant::now() + cycle_time;
    let mut cycles = 0;

    while !done(&*orchestrator) {
        orchestrator.cycle(bus, diagnostics);
        cycles += 1;

        sleep_until(next_cycle).await;
        next_cycle += cycle_time;
    }
    cycles
}

/// Requests a shutdown and cycles until the axis is disabled and shut down.
pub async fn run_to_shutdown<B, D>(
    orchestrator: &mut Orchestrator,
    bus: &mut B,
    diagnostics: &mut D,
    cycle_time: Duration,
) -> usize
where
    B: ProcessDataChannel + ModeSelect + ?Sized,
    D: DiagnosticsSink + ?Sized,
{
    orchestrator.shutdown();
    let cycles = run_until(orchestrator, bus, diagnostics, cycle_time, Orchestrator::is_shut_down).await;
    log::info!("axis {}: shut down after {} cycles", orchestrator.context().axis, cycles);
    cycles
}

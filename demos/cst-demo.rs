//! Cyclic synchronous torque against the simulated drive: ramp to 25 mNm,
//! back to 18 mNm, then a normal stop.

use cia402::{
    config::{DriveConfig, Limits},
    cyclic::{run_to_shutdown, run_until},
    domain::Scaling,
    profile::profile::MotionProfile,
    servo::servo::OperationMode,
    sim::SimulatedBus,
    top_level::top_level::{Orchestrator, Phase},
    LogSink,
};
use tokio::time::Duration;

const RAW_PER_MNM: f64 = 1.0;
const TORQUE_STEPS_MNM: [f64; 2] = [25.0, 18.0];

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = DriveConfig {
        cycle_period: Duration::from_millis(1),
        limits: Limits::default().with_max_torque(40.0),
        torque_slope: 10.0,
        ..Default::default()
    };
    let cycle_time = config.cycle_period;

    let mut bus = SimulatedBus::new(Scaling::new(1.0, 1.0, RAW_PER_MNM), cycle_time);
    let mut orchestrator = Orchestrator::new(0, config.clone());
    let mut diagnostics = LogSink;

    orchestrator.enable(OperationMode::Torque)?;
    run_until(&mut orchestrator, &mut bus, &mut diagnostics, cycle_time, |o| {
        o.phase() == Phase::RunningProfile
    })
    .await;

    for &target in TORQUE_STEPS_MNM.iter() {
        let profile = MotionProfile::linear(
            orchestrator.context().actual_value(),
            target,
            config.torque_slope,
            config.cycle_seconds(),
        )?;
        log::info!("torque ramp to {} mNm, {} steps", target, profile.step_count());
        orchestrator.run_profile(profile)?;
        run_until(&mut orchestrator, &mut bus, &mut diagnostics, cycle_time, |o| {
            o.context().profile.is_none()
        })
        .await;
        log::info!("torque actual {} mNm", orchestrator.context().actual_torque);
    }

    orchestrator.stop();
    run_until(&mut orchestrator, &mut bus, &mut diagnostics, cycle_time, |o| {
        o.phase() == Phase::NormalStop && o.pending().is_none()
    })
    .await;

    run_to_shutdown(&mut orchestrator, &mut bus, &mut diagnostics, cycle_time).await;
    Ok(())
}

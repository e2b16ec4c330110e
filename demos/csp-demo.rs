//! Cyclic synchronous position against the simulated drive.
//!
//! `cargo run --example csp-demo [startup.csv]`, `RUST_LOG=info` to watch it.

use cia402::{
    config::DriveConfig,
    cyclic::{run_to_shutdown, run_until},
    domain::Scaling,
    profile::profile::MotionProfile,
    servo::servo::OperationMode,
    sim::SimulatedBus,
    startup::{FromStartup, StartupParameters},
    top_level::top_level::{Orchestrator, Phase},
    LogSink,
};

const STARTUP: &str = "
# index, subindex, axis 0
0x607D, 1, -10       # min position, degrees
0x607D, 2, 360       # max position, degrees
0x6081, 0, 350       # profile velocity, rpm
0x6083, 0, 350       # profile acceleration, rpm/s
0x6084, 0, 350       # profile deceleration, rpm/s
0x60C2, 1, 1         # interpolation period, ms
";

const TICKS_PER_DEGREE: f64 = 65536.0 / 360.0;
const RPM_TO_DEG_PER_S: f64 = 6.0;
const TARGET_DEGREES: f64 = 200.0;

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let params = match std::env::args().nth(1) {
        Some(path) => StartupParameters::from_file(path)?,
        None => StartupParameters::parse(STARTUP)?,
    };
    let config = DriveConfig::from_startup(&params, 0)?;
    let cycle_time = config.cycle_period;

    let mut bus = SimulatedBus::new(Scaling::new(TICKS_PER_DEGREE, 1.0, 1.0), cycle_time);
    let mut orchestrator = Orchestrator::new(0, config.clone());
    let mut diagnostics = LogSink;

    orchestrator.enable(OperationMode::Position)?;
    run_until(&mut orchestrator, &mut bus, &mut diagnostics, cycle_time, |o| {
        o.phase() == Phase::RunningProfile
    })
    .await;

    for &target in [TARGET_DEGREES, 0.0].iter() {
        let profile = MotionProfile::trapezoidal(
            orchestrator.context().actual_value(),
            target,
            config.profile_velocity * RPM_TO_DEG_PER_S,
            config.profile_acceleration * RPM_TO_DEG_PER_S,
            config.profile_deceleration * RPM_TO_DEG_PER_S,
            config.cycle_seconds(),
        )?;
        orchestrator.run_profile(profile)?;
        let cycles = run_until(&mut orchestrator, &mut bus, &mut diagnostics, cycle_time, |o| {
            o.context().profile.is_none()
        })
        .await;
        if orchestrator.take_profile_completed() {
            log::info!(
                "reached {:.3} deg in {} cycles",
                bus.drive.position(),
                cycles
            );
        }
    }

    run_to_shutdown(&mut orchestrator, &mut bus, &mut diagnostics, cycle_time).await;
    Ok(())
}

//! CiA402 drive state machine, motion profiles and the per-axis cyclic
//! orchestrator. Nothing in here touches the bus; see [`bus`] for the
//! collaborator traits a master implements.

pub mod servo {
    pub mod cia402;
    pub mod planner;
    pub mod servo;
    pub mod servo_pdo;
}

pub mod profile {
    pub mod linear;
    pub mod profile;
    pub mod trapezoid;
}

pub mod top_level {
    pub mod top_level;
}

pub mod bus;
pub mod config;
pub mod error;

pub use bus::{DiagnosticsSink, LogSink, ModeSelect, ProcessData, ProcessDataChannel};
pub use config::{DriveConfig, Limits};
pub use error::{ConfigError, Diagnostic, DriveError, ErrorCode};
pub use profile::profile::MotionProfile;
pub use servo::cia402::{Command, DriveState, StatusWord};
pub use servo::servo::{DriveContext, OperationMode};
pub use top_level::top_level::{Orchestrator, Phase, Request};

use std::cmp::Ordering;

use super::cia402::{apply, Command, DriveState};

/// Picks the single command that moves the drive one step towards `target`.
///
/// Only `SwitchOnDisabled <-> ReadySwitchOn <-> SwitchedOn <-> OpEnabled` is
/// walked actively. Fault is answered with a fault reset, every other state
/// waits for the drive's automatic transition. With `skip_state` the shortcut
/// transitions 5, 8, 9 and 10 are used on the way down and transition 12
/// (quick stop -> switch on disabled) is forced instead of awaited.
pub fn next_command(current: DriveState, target: DriveState, skip_state: bool) -> Command {
    match current {
        DriveState::Fault => Command::FaultReset,
        DriveState::SwitchOnDisabled
        | DriveState::ReadySwitchOn
        | DriveState::SwitchedOn
        | DriveState::OpEnabled => match current.cmp(&target) {
            Ordering::Less => step_up(current),
            Ordering::Greater => step_down(current, target, skip_state),
            Ordering::Equal => Command::None,
        },
        DriveState::QuickStop => {
            if skip_state && target == DriveState::SwitchOnDisabled {
                // transition 12
                Command::DisableVoltage
            } else {
                Command::None
            }
        }
        DriveState::NotReady | DriveState::FaultReactionActive => Command::None,
    }
}

/// Planner and encoder in one go: the control word to send this cycle.
pub fn go_to_state(current: DriveState, target: DriveState, control_word: u16, skip_state: bool) -> u16 {
    apply(next_command(current, target, skip_state), control_word)
}

fn step_up(current: DriveState) -> Command {
    match current {
        // transition 2
        DriveState::SwitchOnDisabled => Command::Shutdown,
        // transition 3
        DriveState::ReadySwitchOn => Command::SwitchOn,
        // transition 4
        DriveState::SwitchedOn => Command::EnableOperation,
        DriveState::OpEnabled
        | DriveState::NotReady
        | DriveState::QuickStop
        | DriveState::FaultReactionActive
        | DriveState::Fault => Command::None,
    }
}

fn step_down(current: DriveState, target: DriveState, skip_state: bool) -> Command {
    match (current, target, skip_state) {
        // transition 5
        (DriveState::OpEnabled, DriveState::SwitchedOn, true) => Command::DisableOperation,
        // transition 8
        (DriveState::OpEnabled, DriveState::ReadySwitchOn, true) => Command::Shutdown,
        // transition 9
        (DriveState::OpEnabled, DriveState::SwitchOnDisabled, true) => Command::DisableVoltage,
        // transition 11
        (DriveState::OpEnabled, _, _) => Command::QuickStop,
        // transition 10
        (DriveState::SwitchedOn, DriveState::SwitchOnDisabled, true) => Command::DisableVoltage,
        // transition 6
        (DriveState::SwitchedOn, _, _) => Command::Shutdown,
        // transition 7
        (DriveState::ReadySwitchOn, _, _) => Command::DisableVoltage,
        (DriveState::SwitchOnDisabled, _, _)
        | (DriveState::NotReady, _, _)
        | (DriveState::QuickStop, _, _)
        | (DriveState::FaultReactionActive, _, _)
        | (DriveState::Fault, _, _) => Command::None,
    }
}

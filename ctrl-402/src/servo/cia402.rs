pub const CTRL_SWITCH_ON_BIT: u16 = 0x0001;
pub const CTRL_ENABLE_VOLTAGE_BIT: u16 = 0x0002;
pub const CTRL_QUICK_STOP_BIT: u16 = 0x0004;
pub const CTRL_ENABLE_OPERATION_BIT: u16 = 0x0008;
pub const CTRL_FAULT_RESET_BIT: u16 = 0x0080;
// const CTRL_HALT_BIT: u16 = 0x0100;

const STATUS_WORD_MASK_A: u16 = 0x006f;
const STATUS_WORD_MASK_B: u16 = 0x004f;

// mask B
const STATUS_NOT_READY: u16 = 0x0000;
const STATUS_SWITCH_ON_DISABLED: u16 = 0x0040;
const STATUS_FAULT_REACTION_ACTIVE: u16 = 0x000f;
const STATUS_FAULT: u16 = 0x0008;

// mask A
const STATUS_READY_SWITCH_ON: u16 = 0x0021;
const STATUS_SWITCHED_ON: u16 = 0x0023;
const STATUS_OP_ENABLED: u16 = 0x0027;
const STATUS_QUICK_STOP: u16 = 0x0007;

pub const STATUS_FAULT_BIT: u16 = 0x0008;
pub const STATUS_VOLTAGE_ENABLED_BIT: u16 = 0x0010;
pub const STATUS_TARGET_REACHED_BIT: u16 = 0x0400;

/// CiA402 drive states.
///
/// The declaration order is significant: `SwitchOnDisabled < ReadySwitchOn <
/// SwitchedOn < OpEnabled` is the ladder [`next_command`](super::planner::next_command)
/// walks one rung per cycle. The remaining states are left by automatic
/// transitions of the drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DriveState {
    NotReady,
    SwitchOnDisabled,
    ReadySwitchOn,
    SwitchedOn,
    OpEnabled,
    QuickStop,
    FaultReactionActive,
    Fault,
}

impl Default for DriveState {
    fn default() -> Self {
        DriveState::NotReady
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Shutdown,
    SwitchOn,
    DisableVoltage,
    QuickStop,
    DisableOperation,
    EnableOperation,
    FaultReset,
    None,
}

/// Classifies a status word.
///
/// Patterns that match neither mask table fall back to
/// [`DriveState::NotReady`], which keeps the orchestrator from progressing.
pub fn decode(status_word: u16) -> DriveState {
    match status_word & STATUS_WORD_MASK_B {
        STATUS_NOT_READY => return DriveState::NotReady,
        STATUS_SWITCH_ON_DISABLED => return DriveState::SwitchOnDisabled,
        STATUS_FAULT_REACTION_ACTIVE => return DriveState::FaultReactionActive,
        STATUS_FAULT => return DriveState::Fault,
        _ => {}
    }

    match status_word & STATUS_WORD_MASK_A {
        STATUS_READY_SWITCH_ON => DriveState::ReadySwitchOn,
        STATUS_SWITCHED_ON => DriveState::SwitchedOn,
        STATUS_OP_ENABLED => DriveState::OpEnabled,
        STATUS_QUICK_STOP => DriveState::QuickStop,
        _ => DriveState::NotReady,
    }
}

/// Applies `command` to the previous control word.
///
/// Only the five state machine bits are touched; halt, mode specific and
/// manufacturer bits pass through.
pub fn apply(command: Command, control_word: u16) -> u16 {
    match command {
        Command::Shutdown => {
            (control_word & !CTRL_FAULT_RESET_BIT & !CTRL_SWITCH_ON_BIT)
                | CTRL_QUICK_STOP_BIT
                | CTRL_ENABLE_VOLTAGE_BIT
        }
        Command::SwitchOn | Command::DisableOperation => {
            (control_word & !CTRL_FAULT_RESET_BIT & !CTRL_ENABLE_OPERATION_BIT)
                | CTRL_QUICK_STOP_BIT
                | CTRL_ENABLE_VOLTAGE_BIT
                | CTRL_SWITCH_ON_BIT
        }
        Command::DisableVoltage => control_word & !CTRL_FAULT_RESET_BIT & !CTRL_ENABLE_VOLTAGE_BIT,
        Command::QuickStop => {
            (control_word & !CTRL_FAULT_RESET_BIT & !CTRL_QUICK_STOP_BIT) | CTRL_ENABLE_VOLTAGE_BIT
        }
        Command::EnableOperation => {
            (control_word & !CTRL_FAULT_RESET_BIT)
                | CTRL_ENABLE_OPERATION_BIT
                | CTRL_QUICK_STOP_BIT
                | CTRL_ENABLE_VOLTAGE_BIT
                | CTRL_SWITCH_ON_BIT
        }
        Command::FaultReset => control_word | CTRL_FAULT_RESET_BIT,
        Command::None => control_word,
    }
}

/// Raw status word with a few helpers beyond the state classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusWord(pub u16);

impl StatusWord {
    pub fn state(self) -> DriveState {
        decode(self.0)
    }

    pub fn is_fault(self) -> bool {
        self.0 & STATUS_FAULT_BIT == STATUS_FAULT_BIT
    }

    pub fn voltage_enabled(self) -> bool {
        self.0 & STATUS_VOLTAGE_ENABLED_BIT == STATUS_VOLTAGE_ENABLED_BIT
    }

    pub fn target_reached(self) -> bool {
        self.0 & STATUS_TARGET_REACHED_BIT == STATUS_TARGET_REACHED_BIT
    }
}

impl From<u16> for StatusWord {
    fn from(raw: u16) -> Self {
        StatusWord(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_canonical_patterns() {
        assert_eq!(decode(0x0000), DriveState::NotReady);
        assert_eq!(decode(0x0040), DriveState::SwitchOnDisabled);
        assert_eq!(decode(0x0021), DriveState::ReadySwitchOn);
        assert_eq!(decode(0x0023), DriveState::SwitchedOn);
        assert_eq!(decode(0x0027), DriveState::OpEnabled);
        assert_eq!(decode(0x0007), DriveState::QuickStop);
        assert_eq!(decode(0x000f), DriveState::FaultReactionActive);
        assert_eq!(decode(0x0008), DriveState::Fault);
    }

    #[test]
    fn ignores_bits_outside_the_masks() {
        // voltage enabled, remote, target reached
        assert_eq!(decode(0x0637), DriveState::OpEnabled);
        assert_eq!(decode(0x0250), DriveState::SwitchOnDisabled);
        assert_eq!(decode(0x0218), DriveState::Fault);
    }

    // Unrecognised patterns silently decode to NotReady. This mirrors the
    // drive master this crate was modelled on; keep it until the behaviour is
    // confirmed to be a bug rather than a fail-safe default.
    #[test]
    fn unknown_patterns_fall_back_to_not_ready() {
        assert_eq!(decode(0xffff), DriveState::NotReady);
        assert_eq!(decode(0x0001), DriveState::NotReady);
        assert_eq!(decode(0x0061), DriveState::NotReady);
    }

    #[test]
    fn decode_is_total() {
        for raw in 0..=u16::MAX {
            let _ = decode(raw);
        }
    }

    #[test]
    fn ladder_order() {
        assert!(DriveState::SwitchOnDisabled < DriveState::ReadySwitchOn);
        assert!(DriveState::ReadySwitchOn < DriveState::SwitchedOn);
        assert!(DriveState::SwitchedOn < DriveState::OpEnabled);
    }

    #[test]
    fn control_word_recipes() {
        assert_eq!(apply(Command::Shutdown, 0x0000), 0x0006);
        assert_eq!(apply(Command::Shutdown, 0x008f), 0x000e);
        assert_eq!(apply(Command::SwitchOn, 0x0006), 0x0007);
        assert_eq!(apply(Command::SwitchOn, 0x008f), 0x0007);
        assert_eq!(apply(Command::EnableOperation, 0x0007), 0x000f);
        assert_eq!(apply(Command::DisableOperation, 0x000f), 0x0007);
        assert_eq!(apply(Command::QuickStop, 0x000f), 0x000b);
        assert_eq!(apply(Command::DisableVoltage, 0x000f), 0x000d);
        assert_eq!(apply(Command::FaultReset, 0x0006), 0x0086);
        assert_eq!(apply(Command::None, 0x1234), 0x1234);
    }

    #[test]
    fn foreign_bits_pass_through() {
        // halt and a manufacturer bit
        let cw = 0x8100;
        assert_eq!(apply(Command::EnableOperation, cw), 0x810f);
        assert_eq!(apply(Command::DisableVoltage, cw | 0x0f), 0x810d);
    }

    #[test]
    fn status_word_helpers() {
        let sw = StatusWord::from(0x0437);
        assert_eq!(sw.state(), DriveState::OpEnabled);
        assert!(sw.voltage_enabled());
        assert!(sw.target_reached());
        assert!(!sw.is_fault());
        assert!(StatusWord(0x0008).is_fault());
    }
}

//! A CiA402 drive that lives on a [`DomainChannel`] instead of a real bus.

use std::time::Duration;

use ctrl_402::{
    bus::{ModeSelect, ProcessData, ProcessDataChannel},
    servo::{
        cia402::{DriveState, CTRL_ENABLE_VOLTAGE_BIT, CTRL_FAULT_RESET_BIT, CTRL_QUICK_STOP_BIT},
        servo::OperationMode,
        servo_pdo::{ServoRxPdo, ServoTxPdo},
    },
};

use crate::domain::{DomainChannel, Scaling};

const STATUS_NOT_READY: u16 = 0x0000;
const STATUS_SWITCH_ON_DISABLED: u16 = 0x0040;
const STATUS_READY_SWITCH_ON: u16 = 0x0031;
const STATUS_SWITCHED_ON: u16 = 0x0033;
const STATUS_OP_ENABLED: u16 = 0x0037;
const STATUS_QUICK_STOP: u16 = 0x0017;
const STATUS_FAULT_REACTION_ACTIVE: u16 = 0x001f;
const STATUS_FAULT: u16 = 0x0008;

/// Degrees per second in one rpm.
const DEG_PER_S_PER_RPM: f64 = 6.0;

/// Ideal servo: follows every setpoint within one cycle and brakes with a
/// fixed deceleration in quick stop.
#[derive(Debug, Clone)]
pub struct SimulatedDrive {
    state: DriveState,
    mode: Option<OperationMode>,
    position: f64,
    velocity: f64,
    torque: f64,
    cycle: f64,
    /// rpm/s
    pub quick_stop_deceleration: f64,
    fault_requested: bool,
    operational: bool,
    commands: Vec<u16>,
}

impl SimulatedDrive {
    pub fn new(cycle_period: Duration) -> Self {
        Self {
            state: DriveState::NotReady,
            mode: None,
            position: 0.0,
            velocity: 0.0,
            torque: 0.0,
            cycle: cycle_period.as_secs_f64(),
            quick_stop_deceleration: 10_000.0,
            fault_requested: false,
            operational: true,
            commands: Vec::new(),
        }
    }

    pub fn state(&self) -> DriveState {
        self.state
    }

    pub fn mode(&self) -> Option<OperationMode> {
        self.mode
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn torque(&self) -> f64 {
        self.torque
    }

    /// Moves the axis from outside, e.g. a collision or a hand crank.
    pub fn set_position(&mut self, degrees: f64) {
        self.position = degrees;
    }

    pub fn set_velocity(&mut self, rpm: f64) {
        self.velocity = rpm;
    }

    pub fn set_operational(&mut self, operational: bool) {
        self.operational = operational;
    }

    /// Raises a fault with the next cycle, from any state.
    pub fn inject_fault(&mut self) {
        self.fault_requested = true;
    }

    /// Every control word the drive received, oldest first.
    pub fn commands(&self) -> &[u16] {
        &self.commands
    }

    pub fn status_word(&self) -> u16 {
        match self.state {
            DriveState::NotReady => STATUS_NOT_READY,
            DriveState::SwitchOnDisabled => STATUS_SWITCH_ON_DISABLED,
            DriveState::ReadySwitchOn => STATUS_READY_SWITCH_ON,
            DriveState::SwitchedOn => STATUS_SWITCHED_ON,
            DriveState::OpEnabled => STATUS_OP_ENABLED,
            DriveState::QuickStop => STATUS_QUICK_STOP,
            DriveState::FaultReactionActive => STATUS_FAULT_REACTION_ACTIVE,
            DriveState::Fault => STATUS_FAULT,
        }
    }

    /// One bus cycle as seen from the slave: take the outputs, update the
    /// inputs. Does nothing while the bus is down.
    pub fn serve(&mut self, domain: &mut DomainChannel) {
        domain.set_operational(self.operational);
        if !self.operational {
            return;
        }
        let scaling = domain.scaling();
        self.step(domain.rx(), domain.target_raw(), &scaling);
        domain.set_tx(ServoTxPdo {
            status_word: self.status_word(),
            position_actual_value: scaling.position_raw(self.position),
            velocity_actual_value: scaling.velocity_raw(self.velocity),
            torque_actual_value: scaling.torque_raw(self.torque),
        });
    }

    fn step(&mut self, rx: ServoRxPdo, target_value: i32, scaling: &Scaling) {
        let ServoRxPdo {
            control_word,
            mode_of_operation,
            ..
        } = rx;
        self.commands.push(control_word);
        self.mode = OperationMode::from_code(mode_of_operation);

        let next = self.next_state(control_word);
        if next != self.state {
            log::trace!("sim: {:?} -> {:?} on 0x{:04X}", self.state, next, control_word);
            self.state = next;
        }
        self.follow(target_value, scaling);
    }

    fn next_state(&mut self, control_word: u16) -> DriveState {
        if std::mem::replace(&mut self.fault_requested, false) {
            return DriveState::FaultReactionActive;
        }
        let voltage = control_word & CTRL_ENABLE_VOLTAGE_BIT != 0;
        let quick_stop = control_word & CTRL_QUICK_STOP_BIT == 0;
        let command = control_word & 0x000f;

        match self.state {
            DriveState::NotReady => DriveState::SwitchOnDisabled,
            DriveState::FaultReactionActive => DriveState::Fault,
            DriveState::Fault if control_word & CTRL_FAULT_RESET_BIT != 0 => DriveState::SwitchOnDisabled,
            DriveState::Fault => DriveState::Fault,
            _ if !voltage => DriveState::SwitchOnDisabled,
            DriveState::QuickStop => DriveState::QuickStop,
            DriveState::OpEnabled if quick_stop => DriveState::QuickStop,
            _ if quick_stop => DriveState::SwitchOnDisabled,
            DriveState::SwitchOnDisabled | DriveState::SwitchedOn | DriveState::OpEnabled
                if command & 0x07 == 0x06 =>
            {
                DriveState::ReadySwitchOn
            }
            DriveState::ReadySwitchOn | DriveState::OpEnabled if command == 0x07 => DriveState::SwitchedOn,
            DriveState::SwitchedOn if command == 0x0f => DriveState::OpEnabled,
            state => state,
        }
    }

    fn follow(&mut self, target_value: i32, scaling: &Scaling) {
        match (self.state, self.mode) {
            (DriveState::OpEnabled, Some(OperationMode::Position)) => {
                let target = scaling.target(OperationMode::Position, target_value);
                self.velocity = (target - self.position) / self.cycle / DEG_PER_S_PER_RPM;
                self.position = target;
                self.torque = 0.0;
            }
            (DriveState::OpEnabled, Some(OperationMode::Velocity)) => {
                self.velocity = scaling.target(OperationMode::Velocity, target_value);
                self.position += self.velocity * DEG_PER_S_PER_RPM * self.cycle;
                self.torque = 0.0;
            }
            (DriveState::OpEnabled, Some(OperationMode::Torque)) => {
                self.torque = scaling.target(OperationMode::Torque, target_value);
            }
            (DriveState::QuickStop, _) => {
                let brake = (self.quick_stop_deceleration * self.cycle).min(self.velocity.abs());
                self.velocity -= brake.copysign(self.velocity);
                self.position += self.velocity * DEG_PER_S_PER_RPM * self.cycle;
                self.torque = 0.0;
            }
            _ => {
                self.velocity = 0.0;
                self.torque = 0.0;
            }
        }
    }
}

/// A [`DomainChannel`] with a [`SimulatedDrive`] behind it.
pub struct SimulatedBus {
    pub domain: DomainChannel,
    pub drive: SimulatedDrive,
}

impl SimulatedBus {
    pub fn new(scaling: Scaling, cycle_period: Duration) -> Self {
        Self {
            domain: DomainChannel::new(scaling),
            drive: SimulatedDrive::new(cycle_period),
        }
    }
}

impl ProcessDataChannel for SimulatedBus {
    fn exchange(&mut self) -> ProcessData {
        self.drive.serve(&mut self.domain);
        self.domain.exchange()
    }

    fn write(&mut self, control_word: u16, target_value: f64) {
        self.domain.write(control_word, target_value);
    }
}

impl ModeSelect for SimulatedBus {
    fn set_operation_mode(&mut self, mode: OperationMode) {
        self.domain.set_operation_mode(mode);
    }
}

use crate::{
    bus::{DiagnosticsSink, ModeSelect, ProcessDataChannel},
    config::DriveConfig,
    error::{Diagnostic, DriveError, ErrorCode},
    profile::profile::MotionProfile,
    servo::{
        cia402::{apply, Command, DriveState},
        planner::next_command,
        servo::{DriveContext, OperationMode},
    },
};

/// Where the orchestrator is in the session of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Init,
    ModeSet,
    Enabling,
    RunningProfile,
    NormalStop,
    QuickStop,
    Shutdown,
}

/// High level operator request, pending until its drive state is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Request {
    EnterOperation,
    RunProfile,
    Stop,
    QuickStop,
    Shutdown,
}

impl Request {
    pub fn target_state(self) -> DriveState {
        match self {
            Request::EnterOperation | Request::RunProfile => DriveState::OpEnabled,
            Request::Stop | Request::QuickStop | Request::Shutdown => DriveState::SwitchOnDisabled,
        }
    }
}

/// Cyclic driver of one axis.
///
/// Call [`cycle`](Orchestrator::cycle) once per bus period. Operator requests
/// only record intent; the drive is walked towards it one command per cycle.
pub struct Orchestrator {
    ctx: DriveContext,
    config: DriveConfig,
    phase: Phase,
    state: fn(&mut Orchestrator),
    pending: Option<Request>,
    mode_request: Option<OperationMode>,
    profile_completed: bool,
    in_breach: bool,
    stalled: bool,
    /// Survives a breach overriding the pending shutdown.
    shutdown_requested: bool,
}

impl Orchestrator {
    pub fn new(axis: u16, config: DriveConfig) -> Self {
        Self {
            ctx: DriveContext::new(axis, config.limits),
            config,
            phase: Phase::Init,
            state: Orchestrator::state_init,
            pending: None,
            mode_request: None,
            profile_completed: false,
            in_breach: false,
            stalled: false,
            shutdown_requested: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn context(&self) -> &DriveContext {
        &self.ctx
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    pub fn pending(&self) -> Option<Request> {
        self.pending
    }

    pub fn latched_error(&self) -> Option<ErrorCode> {
        self.ctx.error
    }

    /// True once after the active profile streamed its last step.
    pub fn take_profile_completed(&mut self) -> bool {
        std::mem::replace(&mut self.profile_completed, false)
    }

    pub fn is_shut_down(&self) -> bool {
        self.phase == Phase::Shutdown
    }

    /// Selects `mode` and brings the drive to operation enabled.
    pub fn enable(&mut self, mode: OperationMode) -> Result<(), DriveError> {
        self.check_accepting()?;
        if mode != self.ctx.mode && matches!(self.phase, Phase::Enabling | Phase::RunningProfile) {
            self.abort_profile("operation mode change");
            self.goto(Phase::ModeSet);
        }
        self.ctx.mode = mode;
        self.pending = Some(Request::EnterOperation);
        self.shutdown_requested = false;
        Ok(())
    }

    /// Streams `profile`, replacing whatever is in flight.
    pub fn run_profile(&mut self, profile: MotionProfile) -> Result<(), DriveError> {
        self.check_accepting()?;
        if self.ctx.mode == OperationMode::Position {
            if let Some((code, value)) = self.ctx.limits.check_target(profile.target()) {
                log::warn!("axis {}: rejected profile, {} at {}", self.ctx.axis, code, value);
                return Err(DriveError::LimitExceeded { code, value });
            }
        }
        if self.ctx.profile.is_some() {
            log::debug!("axis {}: replacing in-flight profile", self.ctx.axis);
        }
        log::info!(
            "axis {}: profile to {} in {} steps",
            self.ctx.axis,
            profile.target(),
            profile.step_count()
        );
        self.ctx.profile = Some(profile);
        self.profile_completed = false;
        self.pending = Some(Request::RunProfile);
        Ok(())
    }

    /// Lets the active profile finish, then disables the drive along the ladder.
    pub fn stop(&mut self) {
        if self.phase != Phase::Shutdown {
            self.pending = Some(Request::Stop);
        }
    }

    pub fn quick_stop(&mut self) {
        if self.phase != Phase::Shutdown {
            self.abort_profile("quick stop request");
            self.pending = Some(Request::QuickStop);
        }
    }

    /// Disables the drive (through quick stop when needed) and ends the session.
    pub fn shutdown(&mut self) {
        if self.phase != Phase::Shutdown {
            self.pending = Some(Request::Shutdown);
            self.shutdown_requested = true;
        }
    }

    /// Clears a latched limit error and enables again with the current mode.
    pub fn reenable(&mut self) -> Result<(), DriveError> {
        if self.phase == Phase::Shutdown {
            return Err(DriveError::Shutdown);
        }
        if let Some(code) = self.ctx.error.take() {
            log::info!("axis {}: {} cleared by operator", self.ctx.axis, code);
        }
        self.in_breach = false;
        self.shutdown_requested = false;
        self.pending = Some(Request::EnterOperation);
        Ok(())
    }

    /// One bus cycle: exchange, decode, plan, stream, check limits.
    pub fn cycle<B, D>(&mut self, bus: &mut B, diagnostics: &mut D)
    where
        B: ProcessDataChannel + ModeSelect + ?Sized,
        D: DiagnosticsSink + ?Sized,
    {
        let data = bus.exchange();
        if !data.operational {
            if !self.stalled {
                log::warn!("axis {}: bus not operational, holding outputs", self.ctx.axis);
                self.stalled = true;
            }
            return;
        }
        if self.stalled {
            log::info!("axis {}: bus operational again", self.ctx.axis);
            self.stalled = false;
        }

        let previous = self.ctx.observe(&data);
        if self.ctx.state == DriveState::NotReady && previous != DriveState::NotReady {
            log::warn!(
                "axis {}: status word 0x{:04X} reads as not ready, holding",
                self.ctx.axis,
                data.status_word
            );
        } else if previous != self.ctx.state {
            log::debug!(
                "axis {}: drive {:?} -> {:?} (0x{:04X})",
                self.ctx.axis,
                previous,
                self.ctx.state,
                data.status_word
            );
            if self.ctx.state == DriveState::Fault {
                log::warn!("axis {}: drive fault, resetting", self.ctx.axis);
            }
        }

        self.escalate();
        (self.state)(self);

        if let Some(mode) = self.mode_request.take() {
            log::debug!("axis {}: mode of operation {:?}", self.ctx.axis, mode);
            bus.set_operation_mode(mode);
        }

        self.plan();
        self.stream();
        bus.write(self.ctx.control_word, self.ctx.setpoint);

        self.check_limits(diagnostics);
    }

    fn check_accepting(&self) -> Result<(), DriveError> {
        if self.phase == Phase::Shutdown {
            return Err(DriveError::Shutdown);
        }
        match self.ctx.error {
            Some(code) => Err(DriveError::Latched(code)),
            None => Ok(()),
        }
    }

    fn goto(&mut self, phase: Phase) {
        log::debug!("axis {}: {:?} -> {:?}", self.ctx.axis, self.phase, phase);
        self.phase = phase;
        self.state = match phase {
            Phase::Init => Orchestrator::state_init,
            Phase::ModeSet => Orchestrator::state_mode_set,
            Phase::Enabling => Orchestrator::state_enabling,
            Phase::RunningProfile => Orchestrator::state_running_profile,
            Phase::NormalStop => Orchestrator::state_normal_stop,
            Phase::QuickStop => Orchestrator::state_quick_stop,
            Phase::Shutdown => Orchestrator::state_shutdown,
        };
    }

    fn abort_profile(&mut self, reason: &str) {
        if let Some(profile) = self.ctx.profile.take() {
            log::warn!(
                "axis {}: profile aborted at step {}/{}: {}",
                self.ctx.axis,
                profile.index(),
                profile.step_count(),
                reason
            );
        }
        if self.pending == Some(Request::RunProfile) {
            self.pending = None;
        }
    }

    /// Setpoint to send while nothing is streamed.
    fn hold_value(&self) -> f64 {
        match self.ctx.mode {
            OperationMode::Position => self.ctx.actual_position,
            OperationMode::Velocity | OperationMode::Torque => 0.0,
        }
    }

    fn standstill(&self) -> bool {
        self.ctx.actual_velocity.abs() <= self.config.standstill_velocity
    }

    /// Stop requests reachable from any phase.
    fn escalate(&mut self) {
        match (self.pending, self.phase) {
            (_, Phase::Shutdown) => {}
            (Some(Request::QuickStop), phase) if phase != Phase::QuickStop => {
                self.abort_profile("quick stop");
                self.goto(Phase::QuickStop);
            }
            (Some(Request::Shutdown), phase) if phase != Phase::QuickStop => {
                if self.ctx.state == DriveState::SwitchOnDisabled {
                    self.goto(Phase::Shutdown);
                } else {
                    self.abort_profile("shutdown");
                    self.goto(Phase::QuickStop);
                }
            }
            (Some(Request::Stop), Phase::Init)
            | (Some(Request::Stop), Phase::ModeSet)
            | (Some(Request::Stop), Phase::Enabling)
            | (Some(Request::Stop), Phase::RunningProfile)
                if self.ctx.profile.is_none() =>
            {
                self.goto(Phase::NormalStop);
            }
            _ => {}
        }
    }

    fn wants_operation(&self) -> bool {
        matches!(self.pending, Some(Request::EnterOperation) | Some(Request::RunProfile))
            || self.finishing_profile()
    }

    /// A stop waits for the profile in flight.
    fn finishing_profile(&self) -> bool {
        self.pending == Some(Request::Stop) && self.ctx.profile.is_some()
    }

    fn state_init(&mut self) {
        self.ctx.setpoint = self.hold_value();
        if self.wants_operation() {
            self.goto(Phase::ModeSet);
        }
    }

    fn state_mode_set(&mut self) {
        self.ctx.setpoint = self.hold_value();
        self.mode_request = Some(self.ctx.mode);
        self.goto(Phase::Enabling);
    }

    fn state_enabling(&mut self) {
        if self.ctx.state != DriveState::OpEnabled {
            self.ctx.setpoint = self.hold_value();
            return;
        }
        log::info!("axis {}: operation enabled ({:?})", self.ctx.axis, self.ctx.mode);
        if self.pending == Some(Request::EnterOperation) {
            self.pending = None;
        }
        self.goto(Phase::RunningProfile);
    }

    fn state_running_profile(&mut self) {
        match self.ctx.state {
            DriveState::OpEnabled => {
                if self.pending == Some(Request::EnterOperation) {
                    self.pending = None;
                }
                return;
            }
            // unrecognised status word, wait for a valid one
            DriveState::NotReady => return,
            _ => {}
        }
        // dropped out of operation enabled: fault or external disable
        self.abort_profile("drive left operation enabled");
        self.ctx.setpoint = self.hold_value();
        if self.pending.is_none() {
            self.pending = Some(Request::EnterOperation);
        }
        self.goto(Phase::Enabling);
    }

    fn state_normal_stop(&mut self) {
        self.ctx.setpoint = self.hold_value();
        if self.wants_operation() {
            self.goto(Phase::ModeSet);
        } else if self.ctx.state == DriveState::SwitchOnDisabled && self.pending == Some(Request::Stop) {
            log::info!("axis {}: stopped", self.ctx.axis);
            self.pending = None;
        }
    }

    fn state_quick_stop(&mut self) {
        self.ctx.setpoint = self.hold_value();
        if self.wants_operation() {
            self.goto(Phase::ModeSet);
            return;
        }
        if self.ctx.state != DriveState::SwitchOnDisabled {
            return;
        }
        match self.pending {
            Some(Request::Shutdown) | Some(Request::QuickStop) if self.shutdown_requested => {
                self.pending = None;
                self.goto(Phase::Shutdown);
            }
            Some(Request::QuickStop) => {
                log::info!("axis {}: quick stop complete", self.ctx.axis);
                self.pending = None;
            }
            _ => {}
        }
    }

    fn state_shutdown(&mut self) {
        self.pending = None;
    }

    /// Target and skip flag handed to the planner for `request`.
    fn plan_target(&self, request: Request) -> (DriveState, bool) {
        match request {
            Request::EnterOperation | Request::RunProfile => (DriveState::OpEnabled, false),
            Request::Stop if self.ctx.profile.is_some() => (DriveState::OpEnabled, false),
            Request::Stop if self.ctx.state == DriveState::OpEnabled => (DriveState::SwitchedOn, true),
            Request::Stop => (request.target_state(), false),
            Request::QuickStop | Request::Shutdown => (
                request.target_state(),
                self.ctx.state == DriveState::QuickStop && self.standstill(),
            ),
        }
    }

    fn plan(&mut self) {
        if matches!(self.phase, Phase::ModeSet | Phase::Shutdown) {
            return;
        }
        let request = match self.pending {
            Some(request) => request,
            None => return,
        };
        let (target, skip_state) = self.plan_target(request);
        if self.ctx.state == target {
            return;
        }
        let command = next_command(self.ctx.state, target, skip_state);
        if command != Command::None {
            log::debug!(
                "axis {}: {:?} in {:?} towards {:?}",
                self.ctx.axis,
                command,
                self.ctx.state,
                target
            );
        }
        self.ctx.control_word = apply(command, self.ctx.control_word);
    }

    fn stream(&mut self) {
        if self.phase != Phase::RunningProfile || self.ctx.state != DriveState::OpEnabled {
            return;
        }
        let profile = match self.ctx.profile.as_mut() {
            Some(profile) => profile,
            None => return,
        };
        if let Some(setpoint) = profile.next_setpoint() {
            self.ctx.setpoint = setpoint;
        }
        if profile.is_finished() {
            log::info!("axis {}: profile finished at {}", self.ctx.axis, self.ctx.setpoint);
            self.ctx.profile = None;
            self.profile_completed = true;
            if self.pending == Some(Request::RunProfile) {
                self.pending = None;
            }
        }
    }

    fn check_limits<D: DiagnosticsSink + ?Sized>(&mut self, diagnostics: &mut D) {
        if self.phase == Phase::Shutdown {
            return;
        }
        let (code, value) = match self
            .ctx
            .limits
            .check_actual(self.ctx.actual_position, self.ctx.actual_torque)
        {
            Some(violation) => violation,
            None => {
                self.in_breach = false;
                return;
            }
        };
        if self.in_breach {
            return;
        }

        self.in_breach = true;
        log::error!("axis {}: {} at {}", self.ctx.axis, code, value);
        diagnostics.report(Diagnostic::new(self.ctx.axis, code, value));
        if self.ctx.error.is_none() {
            self.ctx.error = Some(code);
        }
        self.abort_profile("limit exceeded");
        self.pending = Some(Request::QuickStop);
        if self.phase != Phase::QuickStop {
            self.goto(Phase::QuickStop);
        }
    }
}

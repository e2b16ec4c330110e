//! Process-data image of one servo and its conversion to user units.

use std::collections::HashMap;

use derive_new::new;
use ethercat_types::{Idx, PdoEntryIdx, PdoEntryInfo, PdoEntryPos, PdoIdx, SubIdx};

use ctrl_402::{
    bus::{ModeSelect, ProcessData, ProcessDataChannel},
    servo::{
        servo::OperationMode,
        servo_pdo::{ServoRxPdo, ServoTxPdo, PDO_SIZE, RX_PDO_SIZE},
    },
};

const RX_PDO_INDEX: u16 = 0x1600;
const TX_PDO_INDEX: u16 = 0x1A00;

const CONTROL_WORD: u16 = 0x6040;
const TARGET_POSITION: u16 = 0x607A;
const TARGET_VELOCITY: u16 = 0x60FF;
const TARGET_TORQUE: u16 = 0x6071;
const MODES_OF_OPERATION: u16 = 0x6060;

/// Mapping gap, keeps the RxPDO image the same size in every mode.
const PADDING: u16 = 0x0000;

const STATUS_WORD: u16 = 0x6041;
const POSITION_ACTUAL_VALUE: u16 = 0x6064;
const VELOCITY_ACTUAL_VALUE: u16 = 0x606C;
const TORQUE_ACTUAL_VALUE: u16 = 0x6077;

/// One PDO and the entries mapped into it, in mapping order.
#[derive(Debug, Clone, PartialEq)]
pub struct PdoCfg {
    pub idx: PdoIdx,
    pub entries: Vec<PdoEntryInfo>,
}

/// Raw drive units per user unit.
#[derive(Debug, Clone, Copy, PartialEq, new)]
pub struct Scaling {
    pub ticks_per_degree: f64,
    pub raw_per_rpm: f64,
    pub raw_per_mnm: f64,
}

impl Default for Scaling {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

fn saturate_i32(value: f64) -> i32 {
    value.round().max(f64::from(i32::MIN)).min(f64::from(i32::MAX)) as i32
}

fn saturate_i16(value: f64) -> i16 {
    value.round().max(f64::from(i16::MIN)).min(f64::from(i16::MAX)) as i16
}

impl Scaling {
    /// Target value for the RxPDO, interpreted by `mode`. Torque targets
    /// saturate at the INT16 range of 0x6071.
    pub fn target_raw(&self, mode: OperationMode, value: f64) -> i32 {
        match mode {
            OperationMode::Torque => i32::from(saturate_i16(value * self.per_unit(mode))),
            OperationMode::Position | OperationMode::Velocity => saturate_i32(value * self.per_unit(mode)),
        }
    }

    pub fn target(&self, mode: OperationMode, raw: i32) -> f64 {
        f64::from(raw) / self.per_unit(mode)
    }

    fn per_unit(&self, mode: OperationMode) -> f64 {
        match mode {
            OperationMode::Position => self.ticks_per_degree,
            OperationMode::Velocity => self.raw_per_rpm,
            OperationMode::Torque => self.raw_per_mnm,
        }
    }

    pub fn position(&self, raw: i32) -> f64 {
        f64::from(raw) / self.ticks_per_degree
    }

    pub fn velocity(&self, raw: i32) -> f64 {
        f64::from(raw) / self.raw_per_rpm
    }

    pub fn torque(&self, raw: i16) -> f64 {
        f64::from(raw) / self.raw_per_mnm
    }

    pub fn position_raw(&self, degrees: f64) -> i32 {
        saturate_i32(degrees * self.ticks_per_degree)
    }

    pub fn velocity_raw(&self, rpm: f64) -> i32 {
        saturate_i32(rpm * self.raw_per_rpm)
    }

    pub fn torque_raw(&self, mnm: f64) -> i16 {
        saturate_i16(mnm * self.raw_per_mnm)
    }
}

fn pdo_entry(index: u16, subindex: u8, bit_len: u8, name: &str, pos: u8) -> PdoEntryInfo {
    PdoEntryInfo {
        entry_idx: PdoEntryIdx {
            idx: Idx::from(index),
            sub_idx: SubIdx::from(subindex),
        },
        bit_len,
        name: name.to_string(),
        pos: PdoEntryPos::from(pos),
    }
}

/// RxPDO mapping; the target object follows the operation mode.
pub fn rx_pdo(mode: OperationMode) -> PdoCfg {
    let mut entries = vec![pdo_entry(CONTROL_WORD, 0, 16, "control_word", 0)];
    match mode {
        OperationMode::Position => entries.push(pdo_entry(TARGET_POSITION, 0, 32, "target_position", 1)),
        OperationMode::Velocity => entries.push(pdo_entry(TARGET_VELOCITY, 0, 32, "target_velocity", 1)),
        OperationMode::Torque => {
            entries.push(pdo_entry(TARGET_TORQUE, 0, 16, "target_torque", 1));
            entries.push(pdo_entry(PADDING, 0, 16, "padding", 2));
        }
    }
    let pos = entries.len() as u8;
    entries.push(pdo_entry(MODES_OF_OPERATION, 0, 8, "modes_of_operation", pos));
    PdoCfg {
        idx: PdoIdx::from(RX_PDO_INDEX),
        entries,
    }
}

pub fn tx_pdo() -> PdoCfg {
    PdoCfg {
        idx: PdoIdx::from(TX_PDO_INDEX),
        entries: vec![
            pdo_entry(STATUS_WORD, 0, 16, "status_word", 0),
            pdo_entry(POSITION_ACTUAL_VALUE, 0, 32, "position_actual_value", 1),
            pdo_entry(VELOCITY_ACTUAL_VALUE, 0, 32, "velocity_actual_value", 2),
            pdo_entry(TORQUE_ACTUAL_VALUE, 0, 16, "torque_actual_value", 3),
        ],
    }
}

/// Byte offset and bit length of every mapped object, RxPDO first. Gaps
/// take up space but get no entry.
pub fn entry_offsets(mode: OperationMode) -> HashMap<PdoEntryIdx, (u8, usize)> {
    let mut offsets = HashMap::new();
    let mut byte = 0;
    for pdo in [rx_pdo(mode), tx_pdo()].iter() {
        for entry in &pdo.entries {
            if u16::from(entry.entry_idx.idx) != PADDING {
                offsets.insert(entry.entry_idx, (entry.bit_len, byte));
            }
            byte += usize::from(entry.bit_len) / 8;
        }
    }
    offsets
}

/// One servo's slice of the domain: RxPDO image followed by the TxPDO image.
#[derive(Debug, Clone)]
pub struct DomainChannel {
    image: [u8; PDO_SIZE],
    scaling: Scaling,
    mode: OperationMode,
    operational: bool,
}

impl DomainChannel {
    pub fn new(scaling: Scaling) -> Self {
        Self {
            image: [0; PDO_SIZE],
            scaling,
            mode: OperationMode::default(),
            operational: false,
        }
    }

    pub fn scaling(&self) -> Scaling {
        self.scaling
    }

    pub fn mode(&self) -> OperationMode {
        self.mode
    }

    /// Master state as seen by the last receive: link up and all slaves in OP.
    pub fn set_operational(&mut self, operational: bool) {
        if operational != self.operational {
            log::debug!("domain operational: {}", operational);
        }
        self.operational = operational;
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn image(&self) -> &[u8] {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut [u8] {
        &mut self.image
    }

    pub fn rx(&self) -> ServoRxPdo {
        ServoRxPdo::from_bytes(&self.image[..RX_PDO_SIZE]).unwrap_or_default()
    }

    pub fn tx(&self) -> ServoTxPdo {
        ServoTxPdo::from_bytes(&self.image[RX_PDO_SIZE..]).unwrap_or_default()
    }

    pub fn set_rx(&mut self, rx: ServoRxPdo) {
        self.image[..RX_PDO_SIZE].copy_from_slice(&rx.to_bytes());
    }

    pub fn set_tx(&mut self, tx: ServoTxPdo) {
        self.image[RX_PDO_SIZE..].copy_from_slice(&tx.to_bytes());
    }

    /// Raw target as the drive reads it in the current mode.
    pub fn target_raw(&self) -> i32 {
        let target = self.rx().target_value;
        match self.mode {
            OperationMode::Torque => i32::from(target as u16 as i16),
            OperationMode::Position | OperationMode::Velocity => target,
        }
    }
}

impl ProcessDataChannel for DomainChannel {
    fn exchange(&mut self) -> ProcessData {
        let ServoTxPdo {
            status_word,
            position_actual_value,
            velocity_actual_value,
            torque_actual_value,
        } = self.tx();

        ProcessData::new(
            status_word,
            self.scaling.position(position_actual_value),
            self.scaling.velocity(velocity_actual_value),
            self.scaling.torque(torque_actual_value),
            self.operational,
        )
    }

    fn write(&mut self, control_word: u16, target_value: f64) {
        let mut rx = self.rx();
        rx.control_word = control_word;
        let raw = self.scaling.target_raw(self.mode, target_value);
        rx.target_value = match self.mode {
            // low half is 0x6071, high half the padding entry
            OperationMode::Torque => i32::from(raw as i16 as u16),
            OperationMode::Position | OperationMode::Velocity => raw,
        };
        self.set_rx(rx);
    }
}

impl ModeSelect for DomainChannel {
    fn set_operation_mode(&mut self, mode: OperationMode) {
        self.mode = mode;
        let mut rx = self.rx();
        rx.mode_of_operation = mode.code();
        self.set_rx(rx);
    }
}

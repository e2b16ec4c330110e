pub const RX_PDO_SIZE: usize = std::mem::size_of::<ServoRxPdo>();
pub const TX_PDO_SIZE: usize = std::mem::size_of::<ServoTxPdo>();
pub const PDO_SIZE: usize = RX_PDO_SIZE + TX_PDO_SIZE;

/// Drive -> master: 0x6041, 0x6064, 0x606C, 0x6077.
#[repr(C, packed)]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ServoTxPdo {
    pub status_word: u16,
    pub position_actual_value: i32,
    pub velocity_actual_value: i32,
    pub torque_actual_value: i16,
}

/// Master -> drive: 0x6040, target, 0x6060.
///
/// The target is 0x607A or 0x60FF, or the 16 bit 0x6071 in the low half with
/// a mapping gap above it.
#[repr(C, packed)]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ServoRxPdo {
    pub control_word: u16,
    pub target_value: i32,
    pub mode_of_operation: i8,
}

impl ServoTxPdo {
    /// Reads the little-endian image; `None` if `bytes` is too short.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < TX_PDO_SIZE {
            return None;
        }
        Some(Self {
            status_word: u16::from_le_bytes([bytes[0], bytes[1]]),
            position_actual_value: i32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
            velocity_actual_value: i32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]),
            torque_actual_value: i16::from_le_bytes([bytes[10], bytes[11]]),
        })
    }

    pub fn to_bytes(&self) -> [u8; TX_PDO_SIZE] {
        let Self {
            status_word,
            position_actual_value,
            velocity_actual_value,
            torque_actual_value,
        } = *self;

        let mut out = [0_u8; TX_PDO_SIZE];
        out[0..2].copy_from_slice(&status_word.to_le_bytes());
        out[2..6].copy_from_slice(&position_actual_value.to_le_bytes());
        out[6..10].copy_from_slice(&velocity_actual_value.to_le_bytes());
        out[10..12].copy_from_slice(&torque_actual_value.to_le_bytes());
        out
    }
}

impl ServoRxPdo {
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < RX_PDO_SIZE {
            return None;
        }
        Some(Self {
            control_word: u16::from_le_bytes([bytes[0], bytes[1]]),
            target_value: i32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
            mode_of_operation: bytes[6] as i8,
        })
    }

    pub fn to_bytes(&self) -> [u8; RX_PDO_SIZE] {
        let Self {
            control_word,
            target_value,
            mode_of_operation,
        } = *self;

        let mut out = [0_u8; RX_PDO_SIZE];
        out[0..2].copy_from_slice(&control_word.to_le_bytes());
        out[2..6].copy_from_slice(&target_value.to_le_bytes());
        out[6] = mode_of_operation as u8;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_sizes() {
        assert_eq!(RX_PDO_SIZE, 7);
        assert_eq!(TX_PDO_SIZE, 12);
        assert_eq!(PDO_SIZE, 19);
    }

    #[test]
    fn reads_tx_image() {
        let v: [u8; TX_PDO_SIZE] = [0x37, 0x02, 129, 212, 253, 254, 0x10, 0, 0, 0, 0xff, 0xff];
        let tx = ServoTxPdo::from_bytes(&v).unwrap();
        let status_word = tx.status_word;
        let position = tx.position_actual_value;
        let velocity = tx.velocity_actual_value;
        let torque = tx.torque_actual_value;

        assert_eq!(status_word, 0x0237);
        assert_eq!(position, -16_919_423);
        assert_eq!(velocity, 16);
        assert_eq!(torque, -1);
        assert_eq!(tx.to_bytes(), v);
    }

    #[test]
    fn writes_rx_image() {
        let rx = ServoRxPdo {
            control_word: 0x000f,
            target_value: -2,
            mode_of_operation: 8,
        };
        assert_eq!(rx.to_bytes(), [0x0f, 0, 0xfe, 0xff, 0xff, 0xff, 8]);
        assert_eq!(ServoRxPdo::from_bytes(&rx.to_bytes()), Some(rx));
    }

    #[test]
    fn short_images_are_rejected() {
        assert_eq!(ServoTxPdo::from_bytes(&[0; 11]), None);
        assert_eq!(ServoRxPdo::from_bytes(&[0; 6]), None);
    }
}

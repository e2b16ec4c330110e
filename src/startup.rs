//! Startup parameters: one object per line, one value column per axis.
//!
//! ```text
//! # index, subindex, axis 0, axis 1
//! 0x607D, 1, -3600, -3600
//! 0x607D, 2,  3600,  3600
//! ```

use std::{collections::HashMap, convert::TryFrom, fs, path::Path, time::Duration};

use ethercat_types::{Idx, PdoEntryIdx, SubIdx};

use ctrl_402::{
    config::{DriveConfig, Limits},
    error::ConfigError,
};

pub const SOFTWARE_POSITION_LIMIT: u16 = 0x607D;
pub const MAX_TORQUE: u16 = 0x6072;
pub const PROFILE_VELOCITY: u16 = 0x6081;
pub const PROFILE_ACCELERATION: u16 = 0x6083;
pub const PROFILE_DECELERATION: u16 = 0x6084;
pub const TORQUE_SLOPE: u16 = 0x6087;
pub const INTERPOLATION_TIME_PERIOD: u16 = 0x60C2;

pub trait StartupParameterSource {
    /// Raw 32 bit value of `index:subindex` for `axis`.
    fn lookup(&self, index: u16, subindex: u8, axis: usize) -> Option<u32>;
    fn axes(&self) -> usize;
}

fn entry(index: u16, subindex: u8) -> PdoEntryIdx {
    PdoEntryIdx {
        idx: Idx::from(index),
        sub_idx: SubIdx::from(subindex),
    }
}

#[derive(Debug, Clone, Default)]
pub struct StartupParameters {
    axes: usize,
    objects: Vec<(u16, u8)>,
    rows: Vec<Vec<u32>>,
    index: HashMap<PdoEntryIdx, usize>,
}

impl StartupParameters {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref())?;
        log::debug!("read startup parameters from {}", path.as_ref().display());
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut params = Self::default();

        for (number, raw) in text.lines().enumerate() {
            let line = number + 1;
            let content: String = raw
                .split('#')
                .next()
                .unwrap_or_default()
                .chars()
                .filter(|c| !matches!(c, ' ' | '\t' | '\r'))
                .collect();
            if content.is_empty() {
                continue;
            }

            let tokens: Vec<&str> = content.split(',').collect();
            let expected = if params.rows.is_empty() {
                tokens.len().max(3)
            } else {
                params.axes + 2
            };
            if tokens.len() != expected {
                return Err(ConfigError::ParameterCount {
                    line,
                    expected,
                    found: tokens.len(),
                });
            }

            let index = u16::try_from(parse_number(tokens[0], line)?).map_err(|_| parse_error(tokens[0], line))?;
            let subindex = u8::try_from(parse_number(tokens[1], line)?).map_err(|_| parse_error(tokens[1], line))?;
            let values = tokens[2..]
                .iter()
                .map(|token| parse_value(token, line))
                .collect::<Result<Vec<_>, _>>()?;

            params.axes = values.len();
            params.push(index, subindex, values);
        }

        if params.rows.is_empty() {
            return Err(ConfigError::Empty);
        }
        log::debug!(
            "{} startup parameters for {} axes",
            params.rows.len(),
            params.axes
        );
        Ok(params)
    }

    fn push(&mut self, index: u16, subindex: u8, values: Vec<u32>) {
        // a repeated object is written again; lookups see the last value
        self.index.insert(entry(index, subindex), self.rows.len());
        self.objects.push((index, subindex));
        self.rows.push(values);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: u16, subindex: u8, axis: usize) -> Option<u32> {
        let row = *self.index.get(&entry(index, subindex))?;
        self.rows[row].get(axis).copied()
    }

    /// `(index, subindex, value)` in file order, e.g. for SDO downloads.
    pub fn for_axis(&self, axis: usize) -> impl Iterator<Item = (u16, u8, u32)> + '_ {
        self.objects
            .iter()
            .zip(self.rows.iter())
            .filter_map(move |(&(index, subindex), row)| row.get(axis).map(|v| (index, subindex, *v)))
    }
}

impl StartupParameterSource for StartupParameters {
    fn lookup(&self, index: u16, subindex: u8, axis: usize) -> Option<u32> {
        self.get(index, subindex, axis)
    }

    fn axes(&self) -> usize {
        self.axes
    }
}

fn parse_error(token: &str, line: usize) -> ConfigError {
    ConfigError::Parse {
        line,
        token: token.to_owned(),
    }
}

/// Integer with C `strtol(.., 0)` prefixes: `0x` hex, leading `0` octal.
fn parse_number(token: &str, line: usize) -> Result<i64, ConfigError> {
    let (negative, digits) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };
    let (radix, digits) = if digits.starts_with("0x") || digits.starts_with("0X") {
        (16, &digits[2..])
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };
    if digits.is_empty() || digits.starts_with(|c: char| c == '+' || c == '-') {
        return Err(parse_error(token, line));
    }

    let magnitude = i64::from_str_radix(digits, radix).map_err(|_| parse_error(token, line))?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Negative values are stored as their two's complement.
fn parse_value(token: &str, line: usize) -> Result<u32, ConfigError> {
    let value = parse_number(token, line)?;
    u32::try_from(value)
        .or_else(|_| i32::try_from(value).map(|v| v as u32))
        .map_err(|_| parse_error(token, line))
}

/// Builds a value from well-known objects of a startup parameter source.
pub trait FromStartup: Sized {
    fn from_startup<S: StartupParameterSource + ?Sized>(source: &S, axis: usize) -> Result<Self, ConfigError>;
}

impl FromStartup for DriveConfig {
    fn from_startup<S: StartupParameterSource + ?Sized>(source: &S, axis: usize) -> Result<Self, ConfigError> {
        if axis >= source.axes() {
            return Err(ConfigError::NoSuchAxis {
                axis,
                axes: source.axes(),
            });
        }
        let signed = |index, subindex| source.lookup(index, subindex, axis).map(|v| v as i32 as f64);
        let unsigned = |index, subindex| source.lookup(index, subindex, axis).map(f64::from);

        let mut config = DriveConfig::default();

        match (signed(SOFTWARE_POSITION_LIMIT, 1), signed(SOFTWARE_POSITION_LIMIT, 2)) {
            (Some(min), Some(max)) if min == 0.0 && max == 0.0 => {}
            (Some(min), Some(max)) => config.limits = Limits::position(min, max),
            (Some(min), None) => config.limits.min_position = Some(min),
            (None, Some(max)) => config.limits.max_position = Some(max),
            (None, None) => {}
        }
        if let Some(max) = unsigned(MAX_TORQUE, 0).filter(|max| *max > 0.0) {
            config.limits.max_torque = Some(max);
        }

        if let Some(v) = unsigned(PROFILE_VELOCITY, 0) {
            config.profile_velocity = v;
        }
        if let Some(v) = unsigned(PROFILE_ACCELERATION, 0) {
            config.profile_acceleration = v;
        }
        if let Some(v) = unsigned(PROFILE_DECELERATION, 0) {
            config.profile_deceleration = v;
        }
        if let Some(v) = unsigned(TORQUE_SLOPE, 0) {
            config.torque_slope = v;
        }

        if let Some(ms) = source.lookup(INTERPOLATION_TIME_PERIOD, 1, axis) {
            if ms == 0 {
                return Err(ConfigError::NonPositive {
                    name: "interpolation period",
                    value: 0.0,
                });
            }
            config.cycle_period = Duration::from_millis(u64::from(ms));
        }

        log::debug!("axis {}: {:?}", axis, config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strtol_prefixes() {
        assert_eq!(parse_number("42", 1).unwrap(), 42);
        assert_eq!(parse_number("0x607D", 1).unwrap(), 0x607D);
        assert_eq!(parse_number("0X1f", 1).unwrap(), 31);
        assert_eq!(parse_number("010", 1).unwrap(), 8);
        assert_eq!(parse_number("0", 1).unwrap(), 0);
        assert_eq!(parse_number("-12", 1).unwrap(), -12);
        assert!(parse_number("", 1).is_err());
        assert!(parse_number("0x", 1).is_err());
        assert!(parse_number("--1", 1).is_err());
        assert!(parse_number("09", 1).is_err());
        assert!(parse_number("1.5", 1).is_err());
    }

    #[test]
    fn values_wrap_to_32_bits() {
        assert_eq!(parse_value("-1", 1).unwrap(), 0xFFFF_FFFF);
        assert_eq!(parse_value("-3600", 1).unwrap(), (-3600_i32) as u32);
        assert_eq!(parse_value("0xFFFFFFFF", 1).unwrap(), u32::MAX);
        assert!(parse_value("0x100000000", 1).is_err());
    }
}

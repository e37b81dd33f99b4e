//! Unit identity, as returned by UnitData and at the head of SetupRequest.

use crate::errors::DecodeError;

use super::{country_code, require_len};

/// Bytes before the protocol version in a UnitData reply.
pub(crate) const IDENTITY_LEN: usize = 11;

/// Identity plus the protocol version byte.
pub(crate) const UNIT_DATA_LEN: usize = IDENTITY_LEN + 1;

/// The kind of unit behind the serial link.
///
/// # Variants
///
/// * [UnitType::Validator] - `0x00`, a banknote validator
/// * [UnitType::SmartHopper] - `0x03`, a coin hopper
/// * [UnitType::SmartPayout] - `0x06`, a validator with a note payout
/// * [UnitType::Nv11] - `0x07`, a validator with a note float
/// * [UnitType::Unknown] - anything else, kept as reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitType {
    Validator,
    SmartHopper,
    SmartPayout,
    Nv11,
    Unknown(u8),
}

impl UnitType {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0x00 => Self::Validator,
            0x03 => Self::SmartHopper,
            0x06 => Self::SmartPayout,
            0x07 => Self::Nv11,
            a => Self::Unknown(a),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Self::Validator => 0x00,
            Self::SmartHopper => 0x03,
            Self::SmartPayout => 0x06,
            Self::Nv11 => 0x07,
            Self::Unknown(a) => a,
        }
    }
}

/// Decoded reply to the UnitData command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitData {
    pub unit_type: UnitType,
    pub firmware_version: String,
    pub country_code: String,
    pub value_multiplier: u32,
    pub protocol_version: u8,
}

impl UnitData {
    /// Decodes the data of an OK reply (the bytes after the status byte).
    ///
    /// ```text
    /// 0      type
    /// 1..5   firmware version
    /// 5..8   country code
    /// 8..11  value multiplier digits
    /// 11     protocol version
    /// ```
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        require_len(data, UNIT_DATA_LEN)?;
        let identity = Identity::decode(data)?;

        Ok(UnitData {
            unit_type: identity.unit_type,
            firmware_version: identity.firmware_version,
            country_code: identity.country_code,
            value_multiplier: identity.value_multiplier,
            protocol_version: data[IDENTITY_LEN],
        })
    }
}

/// The first eleven bytes shared by UnitData and SetupRequest replies.
pub(crate) struct Identity {
    pub unit_type: UnitType,
    pub firmware_version: String,
    pub country_code: String,
    pub value_multiplier: u32,
}

impl Identity {
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        require_len(data, IDENTITY_LEN)?;
        Ok(Identity {
            unit_type: UnitType::from_u8(data[0]),
            firmware_version: firmware_version(&data[1..5]),
            country_code: country_code(&data[5..8]),
            value_multiplier: value_multiplier(&data[8..11]),
        })
    }
}

/// Firmware bytes are ASCII on most units, but some report raw digit values.
fn firmware_version(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0..=9 => (b'0' + b) as char,
            0x20..=0x7E => b as char,
            _ => '?',
        })
        .collect()
}

/// Each byte is one decimal digit, least significant first.
pub(crate) fn value_multiplier(digits: &[u8]) -> u32 {
    digits[2] as u32 * 100 + digits[1] as u32 * 10 + digits[0] as u32
}

//! Wire-level constants, command and status codes, and the SSP CRC.

pub mod envelope;
pub mod frame;
pub mod sequence;

pub use frame::Frame;
pub use sequence::{SequenceController, SequenceState};

use std::fmt;

use crc::{Algorithm, Crc};

/// SSP uses CRC-16 with polynomial 0x8005 and seed 0xFFFF, unreflected,
/// no final XOR. This is CRC-16/CMS in the CRC catalogue.
pub const SSP_CRC16: Algorithm<u16> = crc::CRC_16_CMS;

const SSP_CRC: Crc<u16> = Crc::<u16>::new(&SSP_CRC16);

/// Start of every frame.
pub const STX: u8 = 0x7F;

/// Marks an encrypted body in place of the command byte.
pub const STEX: u8 = 0x7E;

/// Largest frame, start byte to checksum, the driver will build or accept.
pub const MAX_FRAME_LEN: usize = 1024;

/// Bytes in a frame that are not command or data: STX, SEQ/ID, LEN, CRCL, CRCH.
pub const FRAME_OVERHEAD: usize = 5;

/// The default read timeout for a single reply, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// The default interval between poll commands, in milliseconds.
pub const POLL_PERIOD_MS: u64 = 250;

/// Protocol version assumed until the host negotiates one.
pub const DEFAULT_PROTOCOL_VERSION: u8 = 6;

/// Computes the SSP checksum over `data`.
///
/// `data` is everything after the start byte: SEQ/ID, LEN, command and data.
pub fn checksum(data: &[u8]) -> u16 {
    SSP_CRC.checksum(data)
}

/// Computes the SSP checksum over `data` in wire order (low byte first).
pub fn checksum_bytes(data: &[u8]) -> [u8; 2] {
    checksum(data).to_le_bytes()
}

/// Every command the host can send to an SSP slave.
///
/// Most of these are only ever sent through [`crate::commands::Simple`];
/// the codes are kept together so logs can name what went over the wire.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SspCommand {
    Reset = 0x01,
    SetChannelInhibits = 0x02,
    DisplayOn = 0x03,
    DisplayOff = 0x04,
    SetupRequest = 0x05,
    HostProtocolVersion = 0x06,
    Poll = 0x07,
    RejectBanknote = 0x08,
    Disable = 0x09,
    Enable = 0x0A,
    GetSerialNumber = 0x0C,
    UnitData = 0x0D,
    ChannelValueRequest = 0x0E,
    ChannelSecurityData = 0x0F,
    ChannelReTeachData = 0x10,
    Sync = 0x11,
    LastRejectCode = 0x17,
    Hold = 0x18,
    GetFirmwareVersion = 0x20,
    GetDatasetVersion = 0x21,
    GetAllLevels = 0x22,
    GetBarCodeReaderConfiguration = 0x23,
    SetBarCodeConfiguration = 0x24,
    GetBarCodeInhibitStatus = 0x25,
    SetBarCodeInhibitStatus = 0x26,
    GetBarCodeData = 0x27,
    SetRefillMode = 0x30,
    PayoutAmount = 0x33,
    SetDenominationLevel = 0x34,
    GetDenominationLevel = 0x35,
    CommunicationPassThrough = 0x37,
    HaltPayout = 0x38,
    SetDenominationRoute = 0x3B,
    GetDenominationRoute = 0x3C,
    FloatAmount = 0x3D,
    GetMinimumPayout = 0x3E,
    EmptyAll = 0x3F,
    SetCoinMechInhibits = 0x40,
    GetNotePositions = 0x41,
    PayoutNote = 0x42,
    StackNote = 0x43,
    FloatByDenomination = 0x44,
    SetValueReportingType = 0x45,
    PayoutByDenomination = 0x46,
    SetCoinMechGlobalInhibit = 0x49,
    SetGenerator = 0x4A,
    SetModulus = 0x4B,
    RequestKeyExchange = 0x4C,
    SetBaudRate = 0x4D,
    GetBuildRevision = 0x4F,
    SetHopperOptions = 0x50,
    GetHopperOptions = 0x51,
    SmartEmpty = 0x52,
    CashboxPayoutOperationData = 0x53,
    ConfigureBezel = 0x54,
    PollWithAck = 0x56,
    EventAck = 0x57,
    GetCounters = 0x58,
    ResetCounters = 0x59,
    CoinMechOptions = 0x5A,
    DisablePayoutDevice = 0x5B,
    EnablePayoutDevice = 0x5C,
    SetFixedEncryptionKey = 0x60,
    ResetFixedEncryptionKey = 0x61,
    RequestTebsBarcode = 0x65,
    RequestTebsLog = 0x66,
    TebsUnlockEnable = 0x67,
    TebsUnlockDisable = 0x68,
}

impl From<SspCommand> for u8 {
    fn from(command: SspCommand) -> u8 {
        command as u8
    }
}

/// The generic status a slave puts in the first payload byte of every reply.
///
/// # Variants
///
/// * [GenericStatus::Ok] - `0xF0`, the command was accepted
/// * [GenericStatus::CommandNotKnown] - `0xF2`
/// * [GenericStatus::WrongNoParameters] - `0xF3`
/// * [GenericStatus::ParameterOutOfRange] - `0xF4`
/// * [GenericStatus::CommandCannotBeProcessed] - `0xF5`, usually followed by an error byte
/// * [GenericStatus::SoftwareError] - `0xF6`
/// * [GenericStatus::Fail] - `0xF8`
/// * [GenericStatus::KeyNotSet] - `0xFA`, an encrypted command arrived before key negotiation
/// * [GenericStatus::Other] - any byte outside the known set, kept so it can be logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericStatus {
    Ok,
    CommandNotKnown,
    WrongNoParameters,
    ParameterOutOfRange,
    CommandCannotBeProcessed,
    SoftwareError,
    Fail,
    KeyNotSet,
    Other(u8),
}

impl GenericStatus {
    /// Converts the first byte of a reply payload to a [GenericStatus].
    pub fn from_u8(v: u8) -> Self {
        match v {
            0xF0 => Self::Ok,
            0xF2 => Self::CommandNotKnown,
            0xF3 => Self::WrongNoParameters,
            0xF4 => Self::ParameterOutOfRange,
            0xF5 => Self::CommandCannotBeProcessed,
            0xF6 => Self::SoftwareError,
            0xF8 => Self::Fail,
            0xFA => Self::KeyNotSet,
            a => Self::Other(a),
        }
    }

    /// Converts the [GenericStatus] back to its wire byte.
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Ok => 0xF0,
            Self::CommandNotKnown => 0xF2,
            Self::WrongNoParameters => 0xF3,
            Self::ParameterOutOfRange => 0xF4,
            Self::CommandCannotBeProcessed => 0xF5,
            Self::SoftwareError => 0xF6,
            Self::Fail => 0xF8,
            Self::KeyNotSet => 0xFA,
            Self::Other(a) => a,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl fmt::Display for GenericStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("OK"),
            Self::CommandNotKnown => f.write_str("COMMAND_NOT_KNOWN"),
            Self::WrongNoParameters => f.write_str("WRONG_NO_PARAMETERS"),
            Self::ParameterOutOfRange => f.write_str("PARAMETER_OUT_OF_RANGE"),
            Self::CommandCannotBeProcessed => f.write_str("COMMAND_CANNOT_BE_PROCESSED"),
            Self::SoftwareError => f.write_str("SOFTWARE_ERROR"),
            Self::Fail => f.write_str("FAIL"),
            Self::KeyNotSet => f.write_str("KEY_NOT_SET"),
            Self::Other(a) => write!(f, "UNKNOWN(0x{a:02X})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bitwise reference for the SSP CRC, straight from the protocol manual.
    fn reference_crc(data: &[u8]) -> u16 {
        let mut crc: u16 = 0xFFFF;
        for &b in data {
            crc ^= (b as u16) << 8;
            for _ in 0..8 {
                if crc & 0x8000 != 0 {
                    crc = (crc << 1) ^ 0x8005;
                } else {
                    crc <<= 1;
                }
            }
        }
        crc
    }

    #[test]
    fn checksum_matches_catalogue_check_value() {
        assert_eq!(checksum(b"123456789"), 0xAEE7);
    }

    #[test]
    fn checksum_matches_sync_trace() {
        // 7F 80 01 11 65 82 is a sync command captured from a validator.
        assert_eq!(checksum(&[0x80, 0x01, 0x11]), 0x8265);
        assert_eq!(checksum_bytes(&[0x80, 0x01, 0x11]), [0x65, 0x82]);
    }

    #[test]
    fn checksum_matches_device_replies() {
        // 7F 80 01 F0 23 80
        assert_eq!(checksum_bytes(&[0x80, 0x01, 0xF0]), [0x23, 0x80]);
        // 7F 80 05 F0 00 1C 96 2C D4 97
        assert_eq!(
            checksum_bytes(&[0x80, 0x05, 0xF0, 0x00, 0x1C, 0x96, 0x2C]),
            [0xD4, 0x97]
        );
    }

    #[test]
    fn checksum_agrees_with_bitwise_reference() {
        let samples: [&[u8]; 4] = [
            &[],
            &[0x00],
            &[0x80, 0x01, 0x61],
            &[0x00, 0x0D, 0xF0, 0x00, 0x30, 0x33, 0x37, 0x32, 0x45, 0x55, 0x52, 0x01, 0x00, 0x00, 0x06],
        ];
        for s in samples {
            assert_eq!(checksum(s), reference_crc(s), "sample {s:02X?}");
        }
    }

    #[test]
    fn generic_status_round_trips_known_codes() {
        for b in [0xF0, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF8, 0xFA] {
            let status = GenericStatus::from_u8(b);
            assert!(!matches!(status, GenericStatus::Other(_)));
            assert_eq!(status.to_u8(), b);
        }
        assert_eq!(GenericStatus::from_u8(0xF1), GenericStatus::Other(0xF1));
        assert!(GenericStatus::from_u8(0xF0).is_ok());
    }
}

//! Typed views of reply payloads.
//!
//! Every reply carries a generic status byte in the command slot followed
//! by command specific data. [Response] splits the two; the submodules
//! turn the data into structures for the commands that return any.

mod channels;
mod counters;
mod reject;
mod setup;
mod unit;

pub use channels::{ChannelEntry, ChannelTable};
pub use counters::Counters;
pub use reject::RejectReason;
pub use setup::SetupData;
pub use unit::{UnitData, UnitType};

use crate::errors::DecodeError;
use crate::protocol::{Frame, GenericStatus};

/// A reply split into its status and data.
///
/// # Members
///
/// * `status` - The generic status byte the slave answered with
/// * `data` - The bytes after the status byte, exactly as declared by LEN
/// * `sequence_bit` - The flag the slave echoed in SEQ/ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: GenericStatus,
    pub data: Vec<u8>,
    pub sequence_bit: bool,
}

impl Response {
    pub fn from_frame(frame: Frame) -> Self {
        Response {
            status: GenericStatus::from_u8(frame.command),
            sequence_bit: frame.sequence_bit(),
            data: frame.data,
        }
    }

    /// Builds a response from a bare payload (status byte first), as found
    /// inside a decrypted envelope.
    pub fn from_payload(seq_addr: u8, payload: &[u8]) -> Result<Self, DecodeError> {
        let (&status, data) = payload.split_first().ok_or(DecodeError::EmptyFrame)?;
        Ok(Response {
            status: GenericStatus::from_u8(status),
            data: data.to_vec(),
            sequence_bit: seq_addr & 0x80 != 0,
        })
    }

    /// Number of bytes after the status byte.
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// The data, or [DecodeError::Status] if the slave did not answer OK.
    pub fn ok_data(&self) -> Result<&[u8], DecodeError> {
        if self.status.is_ok() {
            Ok(&self.data)
        } else {
            Err(DecodeError::Status(self.status))
        }
    }
}

/// Fails with [DecodeError::MalformedResponse] unless `data` holds at least
/// `expected` bytes.
pub(crate) fn require_len(data: &[u8], expected: usize) -> Result<(), DecodeError> {
    if data.len() < expected {
        return Err(DecodeError::MalformedResponse {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Reads a little-endian u32 at `at`. The caller has already checked the length.
pub(crate) fn le_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

/// Three ASCII letters, taken as-is.
pub(crate) fn country_code(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Decodes the reply to GetSerialNumber: a big-endian u32.
pub fn decode_serial_number(data: &[u8]) -> Result<u32, DecodeError> {
    require_len(data, 4)?;
    Ok(u32::from_be_bytes([data[0], data[1], data[2], data[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_splits_status_from_data() {
        let frame = Frame::new(0x80, 0xF0, &[0x01, 0x02]);
        let response = Response::from_frame(frame);

        assert!(response.is_ok());
        assert!(response.sequence_bit);
        assert_eq!(response.data_len(), 2);
        assert_eq!(response.ok_data().unwrap(), &[0x01, 0x02]);
    }

    #[test]
    fn error_status_surfaces_through_ok_data() {
        let response = Response::from_frame(Frame::new(0x00, 0xF2, &[]));
        assert_eq!(response.status, GenericStatus::CommandNotKnown);
        assert!(matches!(
            response.ok_data(),
            Err(DecodeError::Status(GenericStatus::CommandNotKnown))
        ));
    }

    #[test]
    fn from_payload_needs_a_status_byte() {
        assert!(matches!(Response::from_payload(0x80, &[]), Err(DecodeError::EmptyFrame)));

        let response = Response::from_payload(0x00, &[0xF5, 0x03]).unwrap();
        assert_eq!(response.status, GenericStatus::CommandCannotBeProcessed);
        assert_eq!(response.data, vec![0x03]);
        assert!(!response.sequence_bit);
    }

    #[test]
    fn serial_number_is_big_endian() {
        // From 7F 80 05 F0 00 1C 96 2C D4 97
        assert_eq!(decode_serial_number(&[0x00, 0x1C, 0x96, 0x2C]).unwrap(), 1_873_452);
        assert!(matches!(
            decode_serial_number(&[0x00, 0x1C]),
            Err(DecodeError::MalformedResponse { expected: 4, actual: 2 })
        ));
    }
}

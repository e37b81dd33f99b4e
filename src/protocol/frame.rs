//! Encodes and decodes SSP frames.
//!
//! ```text
//! +------+----------------+----------+---------+--------+--------+--------+
//! | STX  |  SEQ/SLAVE ID  |  LENGTH  | COMMAND |  DATA  |  CRCL  |  CRCH  |
//! +------+----------------+----------+---------+--------+--------+--------+
//! ```
//!
//! LENGTH counts the command byte plus the data bytes. The CRC covers
//! everything between STX and the CRC itself. In a reply the COMMAND slot
//! holds the generic status byte instead.

use crate::checks::FrameChecks;
use crate::errors::DecodeError;

use super::{checksum, checksum_bytes, FRAME_OVERHEAD, MAX_FRAME_LEN, STX};

/// Offsets of the fixed fields in a raw frame.
pub mod index {
    pub const STX: usize = 0;
    pub const SEQ_ADDR: usize = 1;
    pub const LEN: usize = 2;
    pub const COMMAND: usize = 3;
    pub const DATA: usize = 4;
}

/// STX, SEQ/ID and LEN.
pub const HEADER_LEN: usize = 3;

/// A single decoded frame.
///
/// # Members
///
/// * `seq_addr` - Bit 7 is the sequence flag, bits 0-6 the slave address
/// * `command` - The command code (requests) or generic status byte (replies)
/// * `data` - Everything between the command byte and the checksum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub seq_addr: u8,
    pub command: u8,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(seq_addr: u8, command: u8, data: &[u8]) -> Self {
        Frame {
            seq_addr,
            command,
            data: data.to_vec(),
        }
    }

    /// The sequence flag carried in bit 7 of SEQ/ID.
    pub fn sequence_bit(&self) -> bool {
        self.seq_addr & 0x80 != 0
    }

    /// The slave address carried in bits 0-6 of SEQ/ID.
    pub fn address(&self) -> u8 {
        self.seq_addr & 0x7F
    }

    /// The value of the LEN field: the command byte plus the data.
    pub fn payload_len(&self) -> usize {
        self.data.len() + 1
    }

    pub fn encode(&self) -> Result<Vec<u8>, DecodeError> {
        encode(self.seq_addr, self.command, &self.data)
    }

    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        decode(raw)
    }
}

/// Fails with [DecodeError::FrameTooLarge] if `data_len` bytes of data
/// cannot be carried in one frame.
pub fn ensure_fits(data_len: usize) -> Result<(), DecodeError> {
    let payload_len = data_len + 1;
    let total = payload_len + FRAME_OVERHEAD;

    // The LEN field is a single byte, and the whole frame has a hard cap
    if payload_len > u8::MAX as usize || total > MAX_FRAME_LEN {
        return Err(DecodeError::FrameTooLarge(total));
    }

    Ok(())
}

/// Builds the wire bytes for one frame.
pub fn encode(seq_addr: u8, command: u8, data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    ensure_fits(data.len())?;

    let mut frame = Vec::with_capacity(data.len() + 1 + FRAME_OVERHEAD);
    frame.push(STX);
    frame.push(seq_addr);
    frame.push((data.len() + 1) as u8);
    frame.push(command);
    frame.extend_from_slice(data);

    // The checksum covers everything after the start byte
    let crc = checksum_bytes(&frame[index::SEQ_ADDR..]);
    frame.extend_from_slice(&crc);

    Ok(frame)
}

/// Returns the full length of the frame at the start of `raw`, once the
/// header has arrived.
pub fn frame_len(raw: &[u8]) -> Option<usize> {
    raw.get(index::LEN)
        .map(|&len| HEADER_LEN + len as usize + 2)
}

/// Decodes a frame, checking the start byte and the checksum.
pub fn decode(raw: &[u8]) -> Result<Frame, DecodeError> {
    decode_with_checks(raw, FrameChecks::STX | FrameChecks::CRC)
}

/// Decodes a frame, performing only the requested checks.
pub fn decode_with_checks(raw: &[u8], checks: FrameChecks) -> Result<Frame, DecodeError> {
    decode_prefix(raw, checks).map(|(frame, _)| frame)
}

/// Decodes the frame at the start of `raw` and returns it with the number
/// of bytes it occupied.
///
/// The LEN field is authoritative. Anything in `raw` past the declared
/// frame is not part of the result; callers can compare the returned
/// length against `raw.len()` to see how much residue there was.
pub fn decode_prefix(raw: &[u8], checks: FrameChecks) -> Result<(Frame, usize), DecodeError> {
    if raw.len() < HEADER_LEN {
        return Err(DecodeError::Truncated {
            expected: HEADER_LEN,
            actual: raw.len(),
        });
    }

    if checks.contains(FrameChecks::STX) && raw[index::STX] != STX {
        return Err(DecodeError::InvalidStx(raw[index::STX]));
    }

    let len = raw[index::LEN] as usize;
    if len == 0 {
        return Err(DecodeError::EmptyFrame);
    }

    let total = HEADER_LEN + len + 2;
    if raw.len() < total {
        return Err(DecodeError::Truncated {
            expected: total,
            actual: raw.len(),
        });
    }

    if checks.contains(FrameChecks::CRC) {
        let expected = checksum(&raw[index::SEQ_ADDR..HEADER_LEN + len]);
        let actual = u16::from_le_bytes([raw[total - 2], raw[total - 1]]);
        if expected != actual {
            return Err(DecodeError::ChecksumMismatch { expected, actual });
        }
    }

    let frame = Frame {
        seq_addr: raw[index::SEQ_ADDR],
        command: raw[index::COMMAND],
        data: raw[index::DATA..HEADER_LEN + len].to_vec(),
    };

    Ok((frame, total))
}

//! The SSP encryption envelope.
//!
//! An encrypted command travels as an ordinary frame whose command byte is
//! [STEX] and whose data is a block-encrypted body:
//!
//! ```text
//! +---------+----------+---------+------------+---------+--------+
//! | eLENGTH |  eCOUNT  |  eDATA  |  ePACKING  |  eCRCL  |  eCRCH |
//! +---------+----------+---------+------------+---------+--------+
//! ```
//!
//! eLENGTH counts eDATA, eCOUNT is a little-endian message counter shared by
//! host and slave, ePACKING pads the body to a whole number of cipher blocks
//! and eCRC is the SSP CRC over everything before it.
//!
//! Only the envelope lives here. Producing the key is the caller's job; the
//! block cipher is plugged in through [BlockCipher].

use crate::errors::DecodeError;

use super::{checksum, checksum_bytes, STEX};

/// Cipher block size in bytes.
pub const BLOCK_LEN: usize = 16;

/// eLENGTH, eCOUNT and eCRC.
const BODY_OVERHEAD: usize = 1 + 4 + 2;

/// A block cipher operating in place on 16 byte blocks.
pub trait BlockCipher: Send + Sync {
    fn encrypt_block(&self, block: &mut [u8; BLOCK_LEN]);
    fn decrypt_block(&self, block: &mut [u8; BLOCK_LEN]);
}

/// The cipher plus the message counter for one encrypted session.
pub struct EncryptionContext {
    cipher: Box<dyn BlockCipher>,
    count: u32,
}

impl EncryptionContext {
    pub fn new(cipher: Box<dyn BlockCipher>) -> Self {
        EncryptionContext { cipher, count: 0 }
    }

    /// The counter value the next envelope will carry.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Wraps `payload` (command byte plus data) using the current counter.
    pub fn seal(&self, payload: &[u8]) -> Result<Vec<u8>, DecodeError> {
        seal(self.cipher.as_ref(), self.count, payload)
    }

    /// Unwraps a reply body and checks it carries the current counter.
    pub fn open(&self, body: &[u8]) -> Result<Vec<u8>, DecodeError> {
        let (count, payload) = open(self.cipher.as_ref(), body)?;
        if count != self.count {
            return Err(DecodeError::Envelope(format!(
                "counter mismatch: expected {}, got {}",
                self.count, count
            )));
        }
        Ok(payload)
    }

    /// Moves to the next counter value once an exchange has completed.
    pub fn advance(&mut self) {
        self.count = self.count.wrapping_add(1);
    }
}

/// Builds the encrypted body for `payload`.
///
/// The returned bytes do not include [STEX]; they are the frame data that
/// follows it.
pub fn seal(cipher: &dyn BlockCipher, count: u32, payload: &[u8]) -> Result<Vec<u8>, DecodeError> {
    if payload.len() > u8::MAX as usize {
        return Err(DecodeError::FrameTooLarge(payload.len()));
    }

    // Pad so the whole body fills complete blocks
    let unpadded = BODY_OVERHEAD + payload.len();
    let padded = (unpadded + BLOCK_LEN - 1) / BLOCK_LEN * BLOCK_LEN;

    let mut body = Vec::with_capacity(padded);
    body.push(payload.len() as u8);
    body.extend_from_slice(&count.to_le_bytes());
    body.extend_from_slice(payload);
    body.resize(padded - 2, 0);

    let crc = checksum_bytes(&body);
    body.extend_from_slice(&crc);

    for_each_block(&mut body, |block| cipher.encrypt_block(block));

    Ok(body)
}

/// Decrypts and validates an encrypted body, returning the counter and the
/// payload it carried.
pub fn open(cipher: &dyn BlockCipher, body: &[u8]) -> Result<(u32, Vec<u8>), DecodeError> {
    if body.is_empty() || body.len() % BLOCK_LEN != 0 {
        return Err(DecodeError::Envelope(format!(
            "body of {} bytes is not a whole number of blocks",
            body.len()
        )));
    }

    let mut plain = body.to_vec();
    for_each_block(&mut plain, |block| cipher.decrypt_block(block));

    let crc_at = plain.len() - 2;
    let expected = checksum(&plain[..crc_at]);
    let actual = u16::from_le_bytes([plain[crc_at], plain[crc_at + 1]]);
    if expected != actual {
        return Err(DecodeError::ChecksumMismatch { expected, actual });
    }

    let len = plain[0] as usize;
    if BODY_OVERHEAD + len > plain.len() {
        return Err(DecodeError::Envelope(format!(
            "eLENGTH {} does not fit in a {} byte body",
            len,
            plain.len()
        )));
    }

    let count = u32::from_le_bytes([plain[1], plain[2], plain[3], plain[4]]);
    let payload = plain[5..5 + len].to_vec();

    Ok((count, payload))
}

fn for_each_block(buf: &mut [u8], mut f: impl FnMut(&mut [u8; BLOCK_LEN])) {
    for chunk in buf.chunks_exact_mut(BLOCK_LEN) {
        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(chunk);
        f(&mut block);
        chunk.copy_from_slice(&block);
    }
}

/// True if a frame's command/status byte marks an encrypted body.
pub fn is_sealed(command: u8) -> bool {
    command == STEX
}

use thiserror::Error;

use crate::protocol::GenericStatus;

/// Errors raised while encoding or decoding frames and response payloads.
///
/// These never involve the transport; they describe bytes that do not
/// have the shape the protocol requires.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("frame truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("checksum mismatch: frame carries 0x{actual:04X}, computed 0x{expected:04X}")]
    ChecksumMismatch { expected: u16, actual: u16 },
    #[error("malformed response: expected at least {expected} bytes, got {actual}")]
    MalformedResponse { expected: usize, actual: usize },
    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),
    #[error("invalid start byte 0x{0:02X}")]
    InvalidStx(u8),
    #[error("no start byte found in reply")]
    MissingStx,
    #[error("frame declares an empty payload")]
    EmptyFrame,
    #[error("reply addressed from slave {actual}, expected {expected}")]
    AddressMismatch { expected: u8, actual: u8 },
    #[error("reply carries sequence bit {actual}, expected {expected}")]
    SequenceMismatch { expected: bool, actual: bool },
    #[error("device replied {0}")]
    Status(GenericStatus),
    #[error("encryption envelope error: {0}")]
    Envelope(String),
}

/// Errors raised by a request/response exchange with the device.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("not connected")]
    NotConnected,
    #[error("write failed: {0}")]
    WriteFailed(#[source] std::io::Error),
    #[error("read failed: {0}")]
    ReadFailed(#[source] std::io::Error),
    #[error("close failed: {0}")]
    CloseFailed(#[source] std::io::Error),
    #[error("timeout waiting for reply")]
    Timeout,
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("Serialport Error")]
    SerialportError(#[from] serialport::Error),
    #[error("poller is already running")]
    AlreadyPolling,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while loading or validating an [`crate::config::SspConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing configuration value: {0}")]
    Missing(&'static str),
    #[error("invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("IO Error")]
    IoError(#[from] std::io::Error),
    #[error("TOML Error: {0}")]
    Toml(#[from] toml::de::Error),
}

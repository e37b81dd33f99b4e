/// Frame decoding checks
use bitflags::bitflags;

bitflags! {
    /// These flags determine what checks a frame decode will perform
    /// on the received bytes. The length check is not optional: a frame
    /// shorter than its LEN byte claims is always [crate::errors::DecodeError::Truncated].
    pub struct FrameChecks: u8 {
        const NONE = 0b00000000;
        /// The first byte must be [crate::protocol::STX].
        const STX = 0b00000001;
        /// The trailing CRC must match the frame contents.
        const CRC = 0b00000010;
        /// The reply must come from the slave address the command went to.
        const ADDRESS = 0b00000100;
        /// The reply must echo the sequence bit its command was sent with.
        const SEQUENCE = 0b00001000;
        const ALL = Self::STX.bits | Self::CRC.bits | Self::ADDRESS.bits | Self::SEQUENCE.bits;
    }
}

impl Default for FrameChecks {
    fn default() -> Self {
        Self::ALL
    }
}

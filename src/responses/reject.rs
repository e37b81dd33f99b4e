//! Why the last note was rejected, as returned by LastRejectCode.

use std::fmt;

use crate::errors::DecodeError;

use super::require_len;

/// Reject reason codes.
///
/// Codes the unit documents only by number are kept as
/// [RejectReason::Unspecified]; codes past the known table are
/// [RejectReason::Other].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    NoteAccepted,
    NoteLengthIncorrect,
    Unspecified(u8),
    ChannelInhibited,
    SecondNoteInserted,
    RecognisedInMoreThanOneChannel,
    NoteTooLong,
    MechanismSlowOrStalled,
    StrimmingAttempt,
    FraudChannelReject,
    NoNotesInserted,
    PeakDetectFail,
    TwistedNoteDetected,
    EscrowTimeout,
    BarCodeScanFail,
    RearSensor2Fail,
    SlotFail1,
    SlotFail2,
    LensOverSample,
    WidthDetectFail,
    ShortNoteDetected,
    Other(u8),
}

impl RejectReason {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0x00 => Self::NoteAccepted,
            0x01 => Self::NoteLengthIncorrect,
            0x02..=0x05 | 0x08 | 0x0A | 0x0C => Self::Unspecified(v),
            0x06 => Self::ChannelInhibited,
            0x07 => Self::SecondNoteInserted,
            0x09 => Self::RecognisedInMoreThanOneChannel,
            0x0B => Self::NoteTooLong,
            0x0D => Self::MechanismSlowOrStalled,
            0x0E => Self::StrimmingAttempt,
            0x0F => Self::FraudChannelReject,
            0x10 => Self::NoNotesInserted,
            0x11 => Self::PeakDetectFail,
            0x12 => Self::TwistedNoteDetected,
            0x13 => Self::EscrowTimeout,
            0x14 => Self::BarCodeScanFail,
            0x15 => Self::RearSensor2Fail,
            0x16 => Self::SlotFail1,
            0x17 => Self::SlotFail2,
            0x18 => Self::LensOverSample,
            0x19 => Self::WidthDetectFail,
            0x1A => Self::ShortNoteDetected,
            a => Self::Other(a),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Self::NoteAccepted => 0x00,
            Self::NoteLengthIncorrect => 0x01,
            Self::Unspecified(a) => a,
            Self::ChannelInhibited => 0x06,
            Self::SecondNoteInserted => 0x07,
            Self::RecognisedInMoreThanOneChannel => 0x09,
            Self::NoteTooLong => 0x0B,
            Self::MechanismSlowOrStalled => 0x0D,
            Self::StrimmingAttempt => 0x0E,
            Self::FraudChannelReject => 0x0F,
            Self::NoNotesInserted => 0x10,
            Self::PeakDetectFail => 0x11,
            Self::TwistedNoteDetected => 0x12,
            Self::EscrowTimeout => 0x13,
            Self::BarCodeScanFail => 0x14,
            Self::RearSensor2Fail => 0x15,
            Self::SlotFail1 => 0x16,
            Self::SlotFail2 => 0x17,
            Self::LensOverSample => 0x18,
            Self::WidthDetectFail => 0x19,
            Self::ShortNoteDetected => 0x1A,
            Self::Other(a) => a,
        }
    }

    /// Decodes the data of an OK LastRejectCode reply.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        require_len(data, 1)?;
        Ok(Self::from_u8(data[0]))
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoteAccepted => "Note accepted",
            Self::NoteLengthIncorrect => "Note length incorrect",
            Self::Unspecified(a) => return write!(f, "Reject reason {a}"),
            Self::ChannelInhibited => "Channel inhibited",
            Self::SecondNoteInserted => "Second note inserted",
            Self::RecognisedInMoreThanOneChannel => "Note recognised in more than one channel",
            Self::NoteTooLong => "Note too long",
            Self::MechanismSlowOrStalled => "Mechanism slow / stalled",
            Self::StrimmingAttempt => "Strimming attempt",
            Self::FraudChannelReject => "Fraud channel reject",
            Self::NoNotesInserted => "No notes inserted",
            Self::PeakDetectFail => "Peak detect fail",
            Self::TwistedNoteDetected => "Twisted note detected",
            Self::EscrowTimeout => "Escrow time-out",
            Self::BarCodeScanFail => "Bar code scan fail",
            Self::RearSensor2Fail => "Rear sensor 2 fail",
            Self::SlotFail1 => "Slot fail 1",
            Self::SlotFail2 => "Slot fail 2",
            Self::LensOverSample => "Lens over sample",
            Self::WidthDetectFail => "Width detect fail",
            Self::ShortNoteDetected => "Short note detected",
            Self::Other(a) => return write!(f, "Unknown reject reason 0x{a:02X}"),
        };
        f.write_str(text)
    }
}

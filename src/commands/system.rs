//! Implements commands that control the unit and report nothing back but a status

use super::Command;
use crate::errors::DecodeError;
use crate::events::{decode_poll, PollEvent};
use crate::protocol::SspCommand;
use crate::responses::Response;

macro_rules! generic_command {
    ($(#[$doc:meta])* $name:ident => $code:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Debug, Default)]
        pub struct $name;

        impl Command for $name {
            type Response = ();

            fn encode_request(&self) -> Result<(u8, Vec<u8>), DecodeError> {
                Ok((SspCommand::$code.into(), vec![]))
            }

            fn decode_response(&self, response: Response) -> Result<(), DecodeError> {
                response.ok_data().map(|_| ())
            }
        }
    };
}

generic_command!(
    /// Resets the sequence flag on both sides. Always sent with flag 0.
    Synchronize => Sync
);
generic_command!(
    /// Restarts the unit. It will drop off the bus while it resets.
    Reset => Reset
);
generic_command!(
    /// Lets the unit accept notes.
    Enable => Enable
);
generic_command!(
    /// Stops the unit accepting notes.
    Disable => Disable
);
generic_command!(DisplayOn => DisplayOn);
generic_command!(DisplayOff => DisplayOff);
generic_command!(
    /// Zeroes the note activity counters.
    ResetCounters => ResetCounters
);

/// Asks the unit to talk a given protocol version.
///
/// The unit answers FAIL if it does not support the version.
#[derive(Copy, Clone, Debug)]
pub struct HostProtocolVersion(pub u8);

impl Command for HostProtocolVersion {
    type Response = ();

    fn encode_request(&self) -> Result<(u8, Vec<u8>), DecodeError> {
        Ok((SspCommand::HostProtocolVersion.into(), vec![self.0]))
    }

    fn decode_response(&self, response: Response) -> Result<(), DecodeError> {
        response.ok_data().map(|_| ())
    }
}

/// Sets which channels may accept notes. Bit 0 is channel 1; a set bit
/// enables the channel.
#[derive(Copy, Clone, Debug)]
pub struct SetChannelInhibits(pub u16);

impl Command for SetChannelInhibits {
    type Response = ();

    fn encode_request(&self) -> Result<(u8, Vec<u8>), DecodeError> {
        Ok((SspCommand::SetChannelInhibits.into(), self.0.to_le_bytes().to_vec()))
    }

    fn decode_response(&self, response: Response) -> Result<(), DecodeError> {
        response.ok_data().map(|_| ())
    }
}

/// Asks for the events since the last poll.
///
/// # Members
///
/// * `protocol_version` - The negotiated version, which decides the size of event data
#[derive(Copy, Clone, Debug)]
pub struct Poll {
    pub protocol_version: u8,
}

impl Command for Poll {
    type Response = Vec<PollEvent>;

    fn encode_request(&self) -> Result<(u8, Vec<u8>), DecodeError> {
        Ok((SspCommand::Poll.into(), vec![]))
    }

    fn decode_response(&self, response: Response) -> Result<Self::Response, DecodeError> {
        decode_poll(response.ok_data()?, self.protocol_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventCode;
    use crate::protocol::{Frame, GenericStatus};

    fn reply(status: u8, data: &[u8]) -> Response {
        Response::from_frame(Frame::new(0x80, status, data))
    }

    #[test]
    fn generic_commands_have_no_data() {
        assert_eq!(Synchronize.encode_request().unwrap(), (0x11, vec![]));
        assert_eq!(Enable.encode_request().unwrap(), (0x0A, vec![]));
        assert_eq!(Disable.encode_request().unwrap(), (0x09, vec![]));
        assert_eq!(ResetCounters.encode_request().unwrap(), (0x59, vec![]));
    }

    #[test]
    fn generic_commands_need_ok() {
        assert!(Enable.decode_response(reply(0xF0, &[])).is_ok());
        assert!(matches!(
            Enable.decode_response(reply(0xF5, &[])),
            Err(DecodeError::Status(GenericStatus::CommandCannotBeProcessed))
        ));
    }

    #[test]
    fn channel_inhibits_are_low_byte_first() {
        assert_eq!(
            SetChannelInhibits(0x00FF).encode_request().unwrap(),
            (0x02, vec![0xFF, 0x00])
        );
    }

    #[test]
    fn host_protocol_version_carries_version() {
        assert_eq!(HostProtocolVersion(6).encode_request().unwrap(), (0x06, vec![0x06]));
        assert!(matches!(
            HostProtocolVersion(9).decode_response(reply(0xF8, &[])),
            Err(DecodeError::Status(GenericStatus::Fail))
        ));
    }

    #[test]
    fn poll_decodes_events() {
        let poll = Poll { protocol_version: 6 };
        let events = poll.decode_response(reply(0xF0, &[0xF1, 0xE8])).unwrap();
        assert_eq!(events[0].code, EventCode::SlaveReset);
        assert_eq!(events[1].code, EventCode::Disabled);
    }
}

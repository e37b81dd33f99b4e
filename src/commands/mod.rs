// Module that contains the typed commands that can be sent to an SSP unit

mod simple;
pub use simple::Simple;

mod system;
pub use system::{
    Disable, DisplayOff, DisplayOn, Enable, HostProtocolVersion, Poll, Reset, ResetCounters,
    SetChannelInhibits, Synchronize,
};

mod query;
pub use query::{
    ChannelValueRequest, GetCounters, GetSerialNumber, LastRejectCode, SetupRequest,
    UnitDataRequest,
};

use crate::errors::DecodeError;
use crate::responses::Response;

/// A command trait that every command implements
pub trait Command {
    type Response;

    /// Encodes the command code and its data
    fn encode_request(&self) -> Result<(u8, Vec<u8>), DecodeError>;

    /// Decodes the slave's reply to this command
    fn decode_response(&self, response: Response) -> Result<Self::Response, DecodeError>;
}

//! Implements a structure for sending arbitrary commands.

use super::Command;
use crate::errors::DecodeError;
use crate::responses::Response;

/// Any command, sent as-is. The reply comes back undecoded, whatever its
/// status.
///
/// # Members
///
/// * `0` - The command code to send
/// * `1` - The data that follows the command code
#[derive(Copy, Clone, Debug)]
pub struct Simple<'a>(pub u8, pub &'a [u8]);

impl<'a> Command for Simple<'a> {
    type Response = Response;

    fn encode_request(&self) -> Result<(u8, Vec<u8>), DecodeError> {
        Ok((self.0, self.1.to_vec()))
    }

    fn decode_response(&self, response: Response) -> Result<Self::Response, DecodeError> {
        Ok(response)
    }
}

//! Implements commands that read information back from the unit

use super::Command;
use crate::errors::DecodeError;
use crate::protocol::SspCommand;
use crate::responses::{
    decode_serial_number, ChannelTable, Counters, RejectReason, Response, SetupData, UnitData,
};

#[derive(Copy, Clone, Debug, Default)]
pub struct UnitDataRequest;

impl Command for UnitDataRequest {
    type Response = UnitData;

    fn encode_request(&self) -> Result<(u8, Vec<u8>), DecodeError> {
        Ok((SspCommand::UnitData.into(), vec![]))
    }

    fn decode_response(&self, response: Response) -> Result<Self::Response, DecodeError> {
        UnitData::decode(response.ok_data()?)
    }
}

/// Reads the channel value table.
///
/// # Members
///
/// * `protocol_version` - The negotiated version, which decides the table layout
#[derive(Copy, Clone, Debug)]
pub struct ChannelValueRequest {
    pub protocol_version: u8,
}

impl Command for ChannelValueRequest {
    type Response = ChannelTable;

    fn encode_request(&self) -> Result<(u8, Vec<u8>), DecodeError> {
        Ok((SspCommand::ChannelValueRequest.into(), vec![]))
    }

    fn decode_response(&self, response: Response) -> Result<Self::Response, DecodeError> {
        ChannelTable::decode(response.ok_data()?, self.protocol_version)
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct SetupRequest;

impl Command for SetupRequest {
    type Response = SetupData;

    fn encode_request(&self) -> Result<(u8, Vec<u8>), DecodeError> {
        Ok((SspCommand::SetupRequest.into(), vec![]))
    }

    fn decode_response(&self, response: Response) -> Result<Self::Response, DecodeError> {
        SetupData::decode(response.ok_data()?)
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct GetSerialNumber;

impl Command for GetSerialNumber {
    type Response = u32;

    fn encode_request(&self) -> Result<(u8, Vec<u8>), DecodeError> {
        Ok((SspCommand::GetSerialNumber.into(), vec![]))
    }

    fn decode_response(&self, response: Response) -> Result<Self::Response, DecodeError> {
        decode_serial_number(response.ok_data()?)
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct GetCounters;

impl Command for GetCounters {
    type Response = Counters;

    fn encode_request(&self) -> Result<(u8, Vec<u8>), DecodeError> {
        Ok((SspCommand::GetCounters.into(), vec![]))
    }

    fn decode_response(&self, response: Response) -> Result<Self::Response, DecodeError> {
        Counters::decode(response.ok_data()?)
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct LastRejectCode;

impl Command for LastRejectCode {
    type Response = RejectReason;

    fn encode_request(&self) -> Result<(u8, Vec<u8>), DecodeError> {
        Ok((SspCommand::LastRejectCode.into(), vec![]))
    }

    fn decode_response(&self, response: Response) -> Result<Self::Response, DecodeError> {
        RejectReason::decode(response.ok_data()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Frame, GenericStatus};

    fn ok(data: &[u8]) -> Response {
        Response::from_frame(Frame::new(0x80, 0xF0, data))
    }

    #[test]
    fn query_codes() {
        assert_eq!(UnitDataRequest.encode_request().unwrap().0, 0x0D);
        assert_eq!(SetupRequest.encode_request().unwrap().0, 0x05);
        assert_eq!(GetSerialNumber.encode_request().unwrap().0, 0x0C);
        assert_eq!(GetCounters.encode_request().unwrap().0, 0x58);
        assert_eq!(LastRejectCode.encode_request().unwrap().0, 0x17);
        assert_eq!(
            ChannelValueRequest { protocol_version: 6 }.encode_request().unwrap(),
            (0x0E, vec![])
        );
    }

    #[test]
    fn serial_number_from_reply() {
        assert_eq!(
            GetSerialNumber.decode_response(ok(&[0x00, 0x1C, 0x96, 0x2C])).unwrap(),
            1_873_452
        );
    }

    #[test]
    fn channel_values_use_requested_layout() {
        let table = ChannelValueRequest { protocol_version: 4 }
            .decode_response(ok(&[0x02, 0x05, 0x0A]))
            .unwrap();
        assert_eq!(table.values(), vec![5, 10]);
    }

    #[test]
    fn non_ok_reply_is_a_status_error() {
        let reply = Response::from_frame(Frame::new(0x80, 0xF2, &[]));
        assert!(matches!(
            UnitDataRequest.decode_response(reply),
            Err(DecodeError::Status(GenericStatus::CommandNotKnown))
        ));
    }

    #[test]
    fn last_reject_code_names_reason() {
        assert_eq!(
            LastRejectCode.decode_response(ok(&[0x06])).unwrap(),
            RejectReason::ChannelInhibited
        );
    }
}

//! Full unit setup, as returned by SetupRequest.

use crate::errors::DecodeError;

use super::channels::{expanded_arrays, ChannelEntry, EXPANDED_FROM_VERSION};
use super::require_len;
use super::unit::{Identity, UnitType, IDENTITY_LEN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupData {
    pub unit_type: UnitType,
    pub firmware_version: String,
    pub country_code: String,
    pub value_multiplier: u32,
    pub channels: Vec<ChannelEntry>,
    pub real_value_multiplier: u32,
    pub protocol_version: u8,
}

impl SetupData {
    /// Decodes the data of an OK reply.
    ///
    /// ```text
    /// 0..11              identity (see UnitData)
    /// 11                 n, number of channels
    /// 12..12+n           channel values
    /// 12+n..12+2n        channel security levels
    /// 12+2n..15+2n       real value multiplier, 24-bit LE
    /// 15+2n              protocol version
    /// 16+2n..16+5n       country codes      (protocol 6+, optional)
    /// 16+5n..16+9n       full values, u32   (protocol 6+, optional)
    /// ```
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        require_len(data, IDENTITY_LEN + 1)?;
        let identity = Identity::decode(data)?;

        let n = data[IDENTITY_LEN] as usize;
        let values_at = IDENTITY_LEN + 1;
        let security_at = values_at + n;
        let multiplier_at = security_at + n;
        let version_at = multiplier_at + 3;
        let expanded_at = version_at + 1;
        require_len(data, expanded_at)?;

        let real_value_multiplier = u32::from_le_bytes([
            data[multiplier_at],
            data[multiplier_at + 1],
            data[multiplier_at + 2],
            0,
        ]);
        let protocol_version = data[version_at];

        let expanded = if protocol_version >= EXPANDED_FROM_VERSION
            && data.len() >= expanded_at + n * 7
        {
            Some(expanded_arrays(&data[expanded_at..], n))
        } else {
            None
        };

        let channels = (0..n)
            .map(|i| {
                let value_byte = data[values_at + i];
                let (country_code, value) = match &expanded {
                    Some(arrays) => (arrays[i].0.clone(), arrays[i].1),
                    None => (identity.country_code.clone(), value_byte as u32),
                };
                ChannelEntry {
                    channel: i as u8 + 1,
                    value,
                    value_byte,
                    country_code: Some(country_code),
                    security: Some(data[security_at + i]),
                }
            })
            .collect();

        Ok(SetupData {
            unit_type: identity.unit_type,
            firmware_version: identity.firmware_version,
            country_code: identity.country_code,
            value_multiplier: identity.value_multiplier,
            channels,
            real_value_multiplier,
            protocol_version,
        })
    }
}

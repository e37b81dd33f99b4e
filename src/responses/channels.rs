//! The channel value table returned by ChannelValueRequest.

use crate::errors::DecodeError;

use super::{country_code, le_u32, require_len};

/// Protocol version from which channel tables carry country codes and
/// full 32-bit values.
pub(crate) const EXPANDED_FROM_VERSION: u8 = 6;

/// One denomination slot.
///
/// # Members
///
/// * `channel` - 1-based channel number
/// * `value` - The channel value. Legacy tables only carry the value byte,
///   which must still be scaled by the unit's value multiplier
/// * `value_byte` - The per-channel byte as sent; 0 means "see the full value"
/// * `country_code` - Present on protocol 6 and later tables
/// * `security` - Present only in SetupRequest replies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    pub channel: u8,
    pub value: u32,
    pub value_byte: u8,
    pub country_code: Option<String>,
    pub security: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTable {
    pub highest_channel: u8,
    pub channels: Vec<ChannelEntry>,
}

type ChannelLayout = fn(&[u8]) -> Result<ChannelTable, DecodeError>;

/// Layouts by the lowest protocol version that uses them, newest first.
const CHANNEL_LAYOUTS: &[(u8, ChannelLayout)] = &[
    (EXPANDED_FROM_VERSION, decode_expanded),
    (0, decode_legacy),
];

impl ChannelTable {
    /// Decodes the data of an OK reply using the layout for `protocol_version`.
    pub fn decode(data: &[u8], protocol_version: u8) -> Result<Self, DecodeError> {
        layout_for(protocol_version)(data)
    }

    /// Channel values in channel order.
    pub fn values(&self) -> Vec<u32> {
        self.channels.iter().map(|c| c.value).collect()
    }

    pub fn get(&self, channel: u8) -> Option<&ChannelEntry> {
        self.channels.iter().find(|c| c.channel == channel)
    }
}

fn layout_for(protocol_version: u8) -> ChannelLayout {
    CHANNEL_LAYOUTS
        .iter()
        .find(|(from, _)| protocol_version >= *from)
        .map(|(_, layout)| *layout)
        .unwrap_or(decode_legacy)
}

/// `n`, then one value byte per channel.
fn decode_legacy(data: &[u8]) -> Result<ChannelTable, DecodeError> {
    require_len(data, 1)?;
    let n = data[0] as usize;
    require_len(data, 1 + n)?;

    let channels = data[1..1 + n]
        .iter()
        .enumerate()
        .map(|(i, &b)| ChannelEntry {
            channel: i as u8 + 1,
            value: b as u32,
            value_byte: b,
            country_code: None,
            security: None,
        })
        .collect();

    Ok(ChannelTable {
        highest_channel: data[0],
        channels,
    })
}

/// `n`, then `n` value bytes, `n` country codes and `n` full values.
fn decode_expanded(data: &[u8]) -> Result<ChannelTable, DecodeError> {
    require_len(data, 1)?;
    let n = data[0] as usize;
    require_len(data, 1 + n * 8)?;

    let value_bytes = &data[1..1 + n];
    let expanded = expanded_arrays(&data[1 + n..], n);

    let channels = value_bytes
        .iter()
        .zip(expanded)
        .enumerate()
        .map(|(i, (&b, (country, value)))| ChannelEntry {
            channel: i as u8 + 1,
            value,
            value_byte: b,
            country_code: Some(country),
            security: None,
        })
        .collect();

    Ok(ChannelTable {
        highest_channel: data[0],
        channels,
    })
}

/// Splits `n` country codes followed by `n` LE u32 values.
///
/// The caller has checked that `data` holds at least `7 * n` bytes.
pub(crate) fn expanded_arrays(data: &[u8], n: usize) -> Vec<(String, u32)> {
    let values_at = n * 3;
    (0..n)
        .map(|i| {
            (
                country_code(&data[i * 3..i * 3 + 3]),
                le_u32(data, values_at + i * 4),
            )
        })
        .collect()
}

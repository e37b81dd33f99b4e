//! Note activity counters, as returned by GetCounters.

use crate::errors::DecodeError;

use super::{le_u32, require_len};

/// Lifetime note counters kept by the unit.
///
/// Units that report fewer than five counters leave the rest at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub stacked: u32,
    pub stored: u32,
    pub dispensed: u32,
    pub transferred_to_stacker: u32,
    pub rejected: u32,
}

impl Counters {
    /// Decodes the data of an OK reply: a count byte followed by that many
    /// little-endian u32 counters.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        require_len(data, 1)?;
        let n = data[0] as usize;
        require_len(data, 1 + n * 4)?;

        let mut values = [0u32; 5];
        for (i, slot) in values.iter_mut().enumerate().take(n) {
            *slot = le_u32(data, 1 + i * 4);
        }

        let [stacked, stored, dispensed, transferred_to_stacker, rejected] = values;
        Ok(Counters {
            stacked,
            stored,
            dispensed,
            transferred_to_stacker,
            rejected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame;

    #[test]
    fn decodes_counters_reply() {
        let raw = [
            0x7F, 0x80, 0x16, 0xF0, 0x05, 0x2C, 0x01, 0x00, 0x00, 0xD2, 0x00, 0x00, 0x00, 0xB4,
            0x00, 0x00, 0x00, 0x68, 0x01, 0x00, 0x00, 0x19, 0x00, 0x00, 0x00, 0xF1, 0x82,
        ];
        let reply = frame::decode(&raw).unwrap();
        let counters = Counters::decode(&reply.data).unwrap();

        assert_eq!(
            counters,
            Counters {
                stacked: 300,
                stored: 210,
                dispensed: 180,
                transferred_to_stacker: 360,
                rejected: 25,
            }
        );
    }

    #[test]
    fn fewer_counters_leave_the_rest_zero() {
        let mut data = vec![0x01];
        data.extend_from_slice(&7u32.to_le_bytes());
        let counters = Counters::decode(&data).unwrap();
        assert_eq!(counters.stacked, 7);
        assert_eq!(counters.rejected, 0);
    }

    #[test]
    fn short_counter_list_is_malformed() {
        assert!(matches!(
            Counters::decode(&[0x02, 0x01, 0x00, 0x00, 0x00]),
            Err(DecodeError::MalformedResponse { expected: 9, actual: 5 })
        ));
    }
}

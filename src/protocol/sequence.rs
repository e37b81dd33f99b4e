//! The alternating sequence flag carried in bit 7 of SEQ/ID.
//!
//! The slave uses the flag to spot a repeated frame: a command that
//! arrives with the same flag as the previous one is a retransmission.

/// Which flag the next command will carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    Expect0,
    Expect1,
}

/// Owns the sequence flag for one connection.
#[derive(Debug, Clone)]
pub struct SequenceController {
    state: SequenceState,
}

impl SequenceController {
    /// A new connection has not been synchronised yet, so it starts where
    /// a sync would leave it.
    pub fn new() -> Self {
        SequenceController {
            state: SequenceState::Expect0,
        }
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    /// Returns the flag for the command about to be sent and flips the state.
    pub fn next_bit(&mut self) -> bool {
        match self.state {
            SequenceState::Expect0 => {
                self.state = SequenceState::Expect1;
                false
            }
            SequenceState::Expect1 => {
                self.state = SequenceState::Expect0;
                true
            }
        }
    }

    /// Pins the next flag to 0. Used for the sync command.
    pub fn reset(&mut self) {
        self.state = SequenceState::Expect0;
    }
}

impl Default for SequenceController {
    fn default() -> Self {
        Self::new()
    }
}

/// Packs a sequence flag and a slave address into a SEQ/ID byte.
pub fn seq_addr(bit: bool, address: u8) -> u8 {
    let flag = if bit { 0x80 } else { 0x00 };
    flag | (address & 0x7F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_alternate_from_zero() {
        let mut seq = SequenceController::new();
        let bits: Vec<bool> = (0..6).map(|_| seq.next_bit()).collect();
        assert_eq!(bits, vec![false, true, false, true, false, true]);
    }

    #[test]
    fn reset_always_yields_zero_next() {
        let mut seq = SequenceController::new();
        for n in 0..5 {
            for _ in 0..n {
                seq.next_bit();
            }
            seq.reset();
            assert_eq!(seq.state(), SequenceState::Expect0);
            assert!(!seq.next_bit());
            assert!(seq.next_bit());
        }
    }

    #[test]
    fn seq_addr_packs_flag_and_address() {
        assert_eq!(seq_addr(true, 0), 0x80);
        assert_eq!(seq_addr(false, 0x10), 0x10);
        assert_eq!(seq_addr(true, 0x10), 0x90);
        // Only seven bits of address fit
        assert_eq!(seq_addr(false, 0xFF), 0x7F);
    }
}

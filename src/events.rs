//! Events reported in the reply to a Poll command.
//!
//! A poll reply's data is a run of events, each a code byte optionally
//! followed by event data. How much data follows depends on the code and
//! on the negotiated protocol version, so decoding is driven by
//! [EventCode::shape].

use crate::errors::DecodeError;
use crate::responses::{country_code, le_u32, require_len};

/// Protocol version from which value events carry country codes.
const MULTI_CURRENCY_FROM_VERSION: u8 = 6;

macro_rules! event_codes {
    ($($(#[$doc:meta])* $name:ident = $code:literal,)*) => {
        /// A poll event code.
        ///
        /// Codes this crate does not know are kept as [EventCode::Unknown].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum EventCode {
            $($(#[$doc])* $name,)*
            Unknown(u8),
        }

        impl EventCode {
            pub fn from_u8(v: u8) -> Self {
                match v {
                    $($code => Self::$name,)*
                    a => Self::Unknown(a),
                }
            }

            pub fn to_u8(self) -> u8 {
                match self {
                    $(Self::$name => $code,)*
                    Self::Unknown(a) => a,
                }
            }
        }
    };
}

event_codes! {
    TebsCashboxOutOfService = 0x90,
    TebsCashboxTamper = 0x91,
    TebsCashboxInService = 0x92,
    TebsCashboxUnlockEnabled = 0x93,
    JamRecovery = 0xB0,
    ErrorDuringPayout = 0xB1,
    SmartEmptying = 0xB3,
    SmartEmptied = 0xB4,
    ChannelDisable = 0xB5,
    Initialising = 0xB6,
    CoinMechError = 0xB7,
    Emptying = 0xC2,
    Emptied = 0xC3,
    CoinMechJammed = 0xC4,
    CoinMechReturnPressed = 0xC5,
    PayoutOutOfService = 0xC6,
    NoteFloatRemoved = 0xC7,
    NoteFloatAttached = 0xC8,
    NoteTransferredToStacker = 0xC9,
    NotePaidIntoStackerAtPowerUp = 0xCA,
    NotePaidIntoStoreAtPowerUp = 0xCB,
    Stacking = 0xCC,
    NoteDispensedAtPowerUp = 0xCD,
    NoteHeldInBezel = 0xCE,
    BarCodeTicketAcknowledge = 0xD1,
    Dispensed = 0xD2,
    Jammed = 0xD5,
    Halted = 0xD6,
    Floating = 0xD7,
    Floated = 0xD8,
    TimeOut = 0xD9,
    Dispensing = 0xDA,
    NoteStoredInPayout = 0xDB,
    IncompletePayout = 0xDC,
    IncompleteFloat = 0xDD,
    CashboxPaid = 0xDE,
    CoinCredit = 0xDF,
    NotePathOpen = 0xE0,
    NoteClearedFromFront = 0xE1,
    NoteClearedToCashbox = 0xE2,
    CashboxRemoved = 0xE3,
    CashboxReplaced = 0xE4,
    BarCodeTicketValidated = 0xE5,
    FraudAttempt = 0xE6,
    StackerFull = 0xE7,
    Disabled = 0xE8,
    UnsafeNoteJam = 0xE9,
    SafeNoteJam = 0xEA,
    NoteStacked = 0xEB,
    NoteRejected = 0xEC,
    NoteRejecting = 0xED,
    /// A note has passed validation; its channel follows.
    Credit = 0xEE,
    /// A note is being read. Channel 0 means it is not yet identified.
    Read = 0xEF,
    /// The unit has reset and needs to be set up again.
    SlaveReset = 0xF1,
}

/// How much data follows an event code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Empty,
    Channel,
    Value,
    ValueList,
    IncompleteList,
    ErrorList,
}

impl EventCode {
    fn shape(self) -> Shape {
        use EventCode::*;
        match self {
            Read | Credit | NoteClearedFromFront | NoteClearedToCashbox | FraudAttempt => {
                Shape::Channel
            }
            Dispensing | Dispensed | Jammed | Halted | Floating | Floated | TimeOut
            | CashboxPaid | SmartEmptying | SmartEmptied => Shape::ValueList,
            IncompletePayout | IncompleteFloat => Shape::IncompleteList,
            ErrorDuringPayout => Shape::ErrorList,
            CoinCredit | NoteHeldInBezel | NoteTransferredToStacker
            | NotePaidIntoStackerAtPowerUp | NotePaidIntoStoreAtPowerUp
            | NoteDispensedAtPowerUp => Shape::Value,
            _ => Shape::Empty,
        }
    }
}

/// An amount, with its currency on protocol 6 and later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryValue {
    pub value: u32,
    pub country_code: Option<String>,
}

/// The outcome of a payout or float that stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompleteValue {
    pub dispensed: u32,
    pub requested: u32,
    pub country_code: Option<String>,
}

/// Decoded event data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventData {
    None,
    Channel(u8),
    Values(Vec<CountryValue>),
    Incomplete(Vec<IncompleteValue>),
    PayoutError { values: Vec<CountryValue>, error: u8 },
}

/// A single event from a poll reply.
///
/// # Members
///
/// * `code` - The event code
/// * `data` - The event data, decoded
/// * `raw` - The bytes that followed the code. For an unknown code this is
///   everything left in the reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollEvent {
    pub code: EventCode,
    pub data: EventData,
    pub raw: Vec<u8>,
}

impl PollEvent {
    /// The channel number carried by read, credit and similar events.
    pub fn channel(&self) -> Option<u8> {
        match self.data {
            EventData::Channel(c) => Some(c),
            _ => None,
        }
    }

    /// The amounts carried by value events.
    pub fn values(&self) -> &[CountryValue] {
        match &self.data {
            EventData::Values(v) => v,
            EventData::PayoutError { values, .. } => values,
            _ => &[],
        }
    }
}

/// Decodes the data of a Poll reply into events, in the order reported.
///
/// Decoding stops at the first unknown code, since its length cannot be
/// known; that event keeps the rest of the reply in `raw`.
pub fn decode_poll(data: &[u8], protocol_version: u8) -> Result<Vec<PollEvent>, DecodeError> {
    let multi = protocol_version >= MULTI_CURRENCY_FROM_VERSION;
    let mut events = Vec::new();
    let mut at = 0;

    while at < data.len() {
        let code = EventCode::from_u8(data[at]);
        at += 1;
        let rest = &data[at..];

        if let EventCode::Unknown(_) = code {
            events.push(PollEvent {
                code,
                data: EventData::None,
                raw: rest.to_vec(),
            });
            break;
        }

        let (event_data, used) = decode_data(code.shape(), rest, multi).map_err(|e| {
            // Report lengths relative to the whole reply
            match e {
                DecodeError::MalformedResponse { expected, actual } => {
                    DecodeError::MalformedResponse {
                        expected: at + expected,
                        actual: at + actual,
                    }
                }
                other => other,
            }
        })?;
        events.push(PollEvent {
            code,
            data: event_data,
            raw: rest[..used].to_vec(),
        });
        at += used;
    }

    Ok(events)
}

fn decode_data(shape: Shape, rest: &[u8], multi: bool) -> Result<(EventData, usize), DecodeError> {
    match shape {
        Shape::Empty => Ok((EventData::None, 0)),
        Shape::Channel => {
            require_len(rest, 1)?;
            Ok((EventData::Channel(rest[0]), 1))
        }
        Shape::Value => {
            let (value, used) = country_value(rest, 0, multi)?;
            Ok((EventData::Values(vec![value]), used))
        }
        Shape::ValueList => {
            let (values, used) = value_list(rest, multi)?;
            Ok((EventData::Values(values), used))
        }
        Shape::ErrorList => {
            let (values, used) = value_list(rest, multi)?;
            require_len(rest, used + 1)?;
            Ok((
                EventData::PayoutError {
                    values,
                    error: rest[used],
                },
                used + 1,
            ))
        }
        Shape::IncompleteList => {
            if !multi {
                require_len(rest, 8)?;
                let entry = IncompleteValue {
                    dispensed: le_u32(rest, 0),
                    requested: le_u32(rest, 4),
                    country_code: None,
                };
                return Ok((EventData::Incomplete(vec![entry]), 8));
            }

            require_len(rest, 1)?;
            let n = rest[0] as usize;
            require_len(rest, 1 + n * 11)?;
            let entries = (0..n)
                .map(|i| {
                    let at = 1 + i * 11;
                    IncompleteValue {
                        dispensed: le_u32(rest, at),
                        requested: le_u32(rest, at + 4),
                        country_code: Some(country_code(&rest[at + 8..at + 11])),
                    }
                })
                .collect();
            Ok((EventData::Incomplete(entries), 1 + n * 11))
        }
    }
}

/// One value at `at`, followed by a country code when `multi`.
fn country_value(rest: &[u8], at: usize, multi: bool) -> Result<(CountryValue, usize), DecodeError> {
    let width = if multi { 7 } else { 4 };
    require_len(rest, at + width)?;
    let value = CountryValue {
        value: le_u32(rest, at),
        country_code: multi.then(|| country_code(&rest[at + 4..at + 7])),
    };
    Ok((value, width))
}

/// A single value on legacy protocols, or a counted list of values with
/// country codes on protocol 6 and later.
fn value_list(rest: &[u8], multi: bool) -> Result<(Vec<CountryValue>, usize), DecodeError> {
    if !multi {
        let (value, used) = country_value(rest, 0, false)?;
        return Ok((vec![value], used));
    }

    require_len(rest, 1)?;
    let n = rest[0] as usize;
    let mut values = Vec::with_capacity(n);
    let mut used = 1;
    for _ in 0..n {
        let (value, width) = country_value(rest, used, true)?;
        values.push(value);
        used += width;
    }
    Ok((values, used))
}

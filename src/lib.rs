//! Host side driver for SSP cash handling units (banknote validators,
//! payouts and hoppers).
//!
//! [protocol] holds the frame codec and sequence flag, [channel] runs one
//! exchange at a time over a [io::Transport], [responses] and [events]
//! decode what comes back, and [poller] keeps polling in the background.
//! [device::Device] ties these together for a unit on a serial port.

pub mod channel;
pub mod checks;
pub mod commands;
pub mod config;
pub mod device;
pub mod devices;
pub mod errors;
pub mod events;
pub mod io;
pub mod poller;
pub mod protocol;
pub mod responses;

pub use channel::CommandChannel;
pub use config::SspConfig;
pub use device::Device;
pub use errors::{ConfigError, DecodeError, DeviceError};
pub use protocol::GenericStatus;
pub use responses::Response;

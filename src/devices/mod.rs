use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::info;

use crate::config::SspConfig;
use crate::errors::DeviceError;

pub mod ports;

pub use ports::{discover_ports, SspPortClass, SspSerialInfo};

/// Opens the serial port named in `config` with the SSP line settings:
/// 8 data bits, no parity, 2 stop bits, no flow control.
pub fn open_serial(config: &SspConfig) -> Result<SerialStream, DeviceError> {
    config.validate()?;

    let stream = tokio_serial::new(&config.port_name, config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::Two)
        .flow_control(FlowControl::None)
        .timeout(config.read_timeout())
        .open_native_async()?;

    info!(port = %config.port_name, baud = config.baud_rate, "serial port opened");
    Ok(stream)
}

use serialport::{SerialPortInfo, SerialPortType};

use crate::errors::DeviceError;

/// USB vendor id used by Innovative Technology units with a native USB port.
const ITL_VID: u16 = 0x191C;

/// How sure discovery is that a port has an SSP unit behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SspPortClass {
    /// The USB vendor id belongs to a known SSP unit maker
    Native,
    /// A USB serial adapter; an SSP unit may be on the other side
    UsbSerial,
}

/// Represents information about a candidate SSP serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SspSerialInfo {
    pub port_info: SerialPortInfo,
    pub class: SspPortClass,
}

/// Finds USB serial ports that may lead to an SSP unit, native ports first.
pub fn discover_ports() -> Result<Vec<SspSerialInfo>, DeviceError> {
    // Get all serial devices
    let available_ports = serialport::available_ports()?;
    Ok(classify(available_ports))
}

fn classify(available_ports: Vec<SerialPortInfo>) -> Vec<SspSerialInfo> {
    let mut ports: Vec<SspSerialInfo> = available_ports
        .into_iter()
        .filter_map(|port| {
            // SSP units are reached over USB, either natively or through an adapter
            let class = match &port.port_type {
                SerialPortType::UsbPort(info) if info.vid == ITL_VID => SspPortClass::Native,
                SerialPortType::UsbPort(_) => SspPortClass::UsbSerial,
                _ => return None,
            };
            Some(SspSerialInfo {
                port_info: port,
                class,
            })
        })
        .collect();

    ports.sort_by(|a, b| a.class.cmp(&b.class));
    ports
}

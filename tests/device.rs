use std::time::Duration;

use nv_ssp::events::EventCode;
use nv_ssp::io::mock::{reply_frame, MockTransport};
use nv_ssp::io::StreamTransport;
use nv_ssp::poller::PollerEvent;
use nv_ssp::protocol::{frame, GenericStatus, SspCommand, STX};
use nv_ssp::responses::UnitType;
use nv_ssp::{DecodeError, Device, DeviceError, SspConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio_stream::StreamExt;

fn config() -> SspConfig {
    let mut config = SspConfig::new("test");
    config.read_timeout_ms = 200;
    config.poll_period_ms = 10;
    config
}

/// A validator on the far end of a byte stream.
async fn run_slave(mut stream: DuplexStream) {
    let mut buf = Vec::new();
    let mut polls = 0;

    loop {
        let mut chunk = [0u8; 64];
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        while let Some(total) = frame::frame_len(&buf) {
            if buf.len() < total || buf[0] != STX {
                break;
            }
            let request = frame::decode(&buf[..total]).unwrap();
            buf.drain(..total);

            let data: Vec<u8> = match request.command {
                0x0D => vec![0x00, 0x07, 0x07, 0x09, 0x05, 0x45, 0x55, 0x52, 0x01, 0x00, 0x00, 0x06],
                0x0E => {
                    let mut d = vec![0x02, 0x00, 0x00];
                    d.extend_from_slice(b"EUREUR");
                    d.extend_from_slice(&500u32.to_le_bytes());
                    d.extend_from_slice(&1000u32.to_le_bytes());
                    d
                }
                0x0C => vec![0x00, 0x1C, 0x96, 0x2C],
                0x07 => {
                    polls += 1;
                    if polls == 1 {
                        vec![0xF1]
                    } else {
                        vec![0xE8]
                    }
                }
                _ => vec![],
            };

            let reply = reply_frame(request.seq_addr, GenericStatus::Ok, &data);
            if stream.write_all(&reply).await.is_err() {
                return;
            }
        }
    }
}

#[tokio::test]
async fn full_session_over_a_byte_stream() {
    let (host, slave) = tokio::io::duplex(1024);
    tokio::spawn(run_slave(slave));

    let mut device = Device::new(StreamTransport::new(host), &config());

    device.sync().await.unwrap();
    device.host_protocol_version(6).await.unwrap();

    let unit = device.unit_data().await.unwrap();
    assert_eq!(unit.unit_type, UnitType::Validator);
    assert_eq!(unit.firmware_version, "7795");
    assert_eq!(unit.country_code, "EUR");
    assert_eq!(unit.value_multiplier, 1);
    assert_eq!(unit.protocol_version, 6);

    let channels = device.channel_values().await.unwrap();
    assert_eq!(channels.values(), vec![500, 1000]);

    assert_eq!(device.serial_number().await.unwrap(), 1_873_452);
    device.enable().await.unwrap();

    let mut events = device.poll_stream().unwrap();
    let mut codes = Vec::new();
    while codes.len() < 2 {
        match events.next().await {
            Some(PollerEvent::Event(event)) => codes.push(event.code),
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(codes, vec![EventCode::SlaveReset, EventCode::Disabled]);

    // Foreground commands still work while polling
    device.disable().await.unwrap();

    device.close().await.unwrap();
}

#[tokio::test]
async fn identity_reply_one_byte_short_is_malformed() {
    let mock = MockTransport::new();
    mock.set_responder(|req| {
        nv_ssp::io::mock::reply_to(
            req,
            GenericStatus::Ok,
            &[0x00, 0x07, 0x07, 0x09, 0x05, 0x45, 0x55, 0x52, 0x01, 0x00, 0x06],
        )
    });

    let device = Device::new(mock.clone(), &config());
    assert!(matches!(
        device.unit_data().await,
        Err(DeviceError::Decode(DecodeError::MalformedResponse { expected: 12, actual: 11 }))
    ));
}

#[tokio::test]
async fn typed_commands_surface_non_ok_status() {
    let mock = MockTransport::new();
    mock.set_responder(|req| nv_ssp::io::mock::reply_to(req, GenericStatus::CommandCannotBeProcessed, &[0x01]));

    let device = Device::new(mock.clone(), &config());
    assert!(matches!(
        device.enable().await,
        Err(DeviceError::Decode(DecodeError::Status(GenericStatus::CommandCannotBeProcessed)))
    ));

    // The raw path hands the same reply back untouched
    let response = device
        .send_request(nv_ssp::commands::Simple(SspCommand::Enable.into(), &[]))
        .await
        .unwrap();
    assert_eq!(response.status, GenericStatus::CommandCannotBeProcessed);
    assert_eq!(response.data, vec![0x01]);
}

#[tokio::test]
async fn device_reports_timeout_when_unit_is_silent() {
    let mock = MockTransport::new();
    let mut config = config();
    config.read_timeout_ms = 10;

    let device = Device::new(mock, &config);
    let started = tokio::time::Instant::now();
    assert!(matches!(device.sync().await, Err(DeviceError::Timeout)));
    assert!(started.elapsed() >= Duration::from_millis(10));
}

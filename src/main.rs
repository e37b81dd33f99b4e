use anyhow::Context;
use tokio_stream::StreamExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nv_ssp::commands::SetChannelInhibits;
use nv_ssp::devices::discover_ports;
use nv_ssp::poller::PollerEvent;
use nv_ssp::{Device, SspConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Either a TOML config file, a port name, or nothing to list candidate ports
    let config = match std::env::args().nth(1) {
        Some(arg) if arg.ends_with(".toml") => {
            SspConfig::load(&arg).with_context(|| format!("loading {arg}"))?
        }
        Some(port) => SspConfig::new(port),
        None => {
            for port in discover_ports()? {
                println!("{} ({:?})", port.port_info.port_name, port.class);
            }
            return Ok(());
        }
    };

    let mut device = Device::open(&config)?;

    device.sync().await?;
    device.host_protocol_version(config.protocol_version).await?;

    let unit = device.unit_data().await?;
    info!(?unit, "unit identified");
    let serial = device.serial_number().await?;
    info!(serial, "serial number");

    let channels = device.channel_values().await?;
    for channel in &channels.channels {
        info!(
            channel = channel.channel,
            value = channel.value,
            country = channel.country_code.as_deref().unwrap_or(&unit.country_code),
            "channel"
        );
    }

    device.send_request(SetChannelInhibits(0xFFFF)).await?;
    device.enable().await?;

    let mut events = device.poll_stream()?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.next() => match event {
                Some(PollerEvent::Event(event)) => println!("{:?} {:?}", event.code, event.data),
                Some(PollerEvent::Status(status)) => println!("poll status {status}"),
                Some(PollerEvent::Error(e)) => println!("poll error: {e}"),
                None => break,
            },
        }
    }

    device.stop_polling().await;
    device.disable().await?;
    device.close().await?;

    Ok(())
}

use std::sync::Arc;

use tokio_serial::SerialStream;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::info;

use crate::channel::CommandChannel;
use crate::commands::{
    ChannelValueRequest, Command, Disable, Enable, GetCounters, GetSerialNumber,
    HostProtocolVersion, LastRejectCode, SetupRequest, Synchronize, UnitDataRequest,
};
use crate::config::SspConfig;
use crate::errors::DeviceError;
use crate::io::{StreamTransport, Transport};
use crate::poller::{EventPoller, EventSink, PollerEvent, PollerState};
use crate::responses::{ChannelTable, Counters, RejectReason, SetupData, UnitData};

/// This represents one SSP unit on a serial link.
///
/// Commands sent through the device and the background poller share one
/// [CommandChannel], so they never interleave on the wire.
pub struct Device<T: Transport> {
    channel: Arc<CommandChannel<T>>,
    poller: EventPoller<T>,
}

impl Device<StreamTransport<SerialStream>> {
    /// Opens the serial port named in `config`.
    pub fn open(config: &SspConfig) -> Result<Self, DeviceError> {
        let stream = crate::devices::open_serial(config)?;
        Ok(Self::new(StreamTransport::new(stream), config))
    }
}

impl<T: Transport> Device<T> {
    /// Creates a device over an already open transport
    pub fn new(transport: T, config: &SspConfig) -> Self {
        let channel = Arc::new(CommandChannel::from_config(transport, config));
        let poller = EventPoller::new(channel.clone()).with_period(config.poll_period());
        Device { channel, poller }
    }

    pub fn channel(&self) -> &Arc<CommandChannel<T>> {
        &self.channel
    }

    /// The protocol version replies are currently decoded against.
    pub fn protocol_version(&self) -> u8 {
        self.channel.protocol_version()
    }

    /// Sends a typed command and decodes its reply
    pub async fn send_request<C: Command>(&self, command: C) -> Result<C::Response, DeviceError> {
        let (code, data) = command.encode_request()?;
        let response = self.channel.send(code, &data).await?;
        Ok(command.decode_response(response)?)
    }

    pub async fn sync(&self) -> Result<(), DeviceError> {
        self.send_request(Synchronize).await
    }

    /// Negotiates `version`. Later replies are decoded against it once the
    /// unit accepts.
    pub async fn host_protocol_version(&self, version: u8) -> Result<(), DeviceError> {
        self.send_request(HostProtocolVersion(version)).await?;
        self.channel.set_protocol_version(version);
        info!(version, "protocol version negotiated");
        Ok(())
    }

    pub async fn unit_data(&self) -> Result<UnitData, DeviceError> {
        self.send_request(UnitDataRequest).await
    }

    pub async fn setup_request(&self) -> Result<SetupData, DeviceError> {
        self.send_request(SetupRequest).await
    }

    pub async fn channel_values(&self) -> Result<ChannelTable, DeviceError> {
        let protocol_version = self.channel.protocol_version();
        self.send_request(ChannelValueRequest { protocol_version }).await
    }

    pub async fn enable(&self) -> Result<(), DeviceError> {
        self.send_request(Enable).await
    }

    pub async fn disable(&self) -> Result<(), DeviceError> {
        self.send_request(Disable).await
    }

    pub async fn serial_number(&self) -> Result<u32, DeviceError> {
        self.send_request(GetSerialNumber).await
    }

    pub async fn counters(&self) -> Result<Counters, DeviceError> {
        self.send_request(GetCounters).await
    }

    pub async fn last_reject_code(&self) -> Result<RejectReason, DeviceError> {
        self.send_request(LastRejectCode).await
    }

    pub fn start_polling<S: EventSink>(&mut self, sink: S) -> Result<(), DeviceError> {
        self.poller.start(sink)
    }

    /// Starts polling and returns the events as a stream.
    pub fn poll_stream(&mut self) -> Result<UnboundedReceiverStream<PollerEvent>, DeviceError> {
        self.poller.start_stream()
    }

    pub async fn stop_polling(&mut self) {
        self.poller.stop().await
    }

    pub fn polling_state(&self) -> PollerState {
        self.poller.state()
    }

    /// Stops polling, then closes the transport.
    pub async fn close(&mut self) -> Result<(), DeviceError> {
        self.poller.stop().await;
        self.channel.close().await
    }
}

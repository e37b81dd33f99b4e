//! The command channel: one request, one reply, one at a time.
//!
//! SSP is strictly half-duplex, so a [CommandChannel] holds its transport
//! and sequence controller behind a single async mutex. Every exchange
//! (write the command, read the whole reply) runs under that lock, which
//! is what keeps the poller and application commands from interleaving.

use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, trace};

use crate::checks::FrameChecks;
use crate::config::SspConfig;
use crate::errors::{DecodeError, DeviceError};
use crate::io::Transport;
use crate::protocol::envelope::{self, EncryptionContext};
use crate::protocol::{
    frame, sequence, Frame, SequenceController, SequenceState, SspCommand, DEFAULT_PROTOCOL_VERSION,
    DEFAULT_TIMEOUT_MS, MAX_FRAME_LEN, STEX, STX,
};
use crate::responses::Response;

struct Inner<T> {
    transport: T,
    sequence: SequenceController,
}

/// A serialised request/response channel to one slave.
pub struct CommandChannel<T: Transport> {
    inner: Mutex<Inner<T>>,
    address: u8,
    read_timeout: Duration,
    checks: FrameChecks,
    protocol_version: AtomicU8,
}

impl<T: Transport> CommandChannel<T> {
    /// A channel to the slave at `address`, with the default read timeout.
    pub fn new(transport: T, address: u8) -> Self {
        CommandChannel {
            inner: Mutex::new(Inner {
                transport,
                sequence: SequenceController::new(),
            }),
            address: address & 0x7F,
            read_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            checks: FrameChecks::ALL,
            protocol_version: AtomicU8::new(DEFAULT_PROTOCOL_VERSION),
        }
    }

    pub fn from_config(transport: T, config: &SspConfig) -> Self {
        let channel = Self::new(transport, config.address).with_read_timeout(config.read_timeout());
        channel.set_protocol_version(config.protocol_version);
        channel
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Selects which integrity checks replies must pass.
    pub fn with_checks(mut self, checks: FrameChecks) -> Self {
        self.checks = checks;
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// The protocol version reply payloads are decoded against.
    pub fn protocol_version(&self) -> u8 {
        self.protocol_version.load(Ordering::Relaxed)
    }

    pub fn set_protocol_version(&self, version: u8) {
        self.protocol_version.store(version, Ordering::Relaxed);
    }

    pub async fn sequence_state(&self) -> SequenceState {
        self.inner.lock().await.sequence.state()
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.lock().await.transport.is_open()
    }

    /// Sends `command` with `data` and waits for the reply.
    ///
    /// A reply with a non-OK generic status is still a successful exchange;
    /// callers inspect [Response::status].
    pub async fn send(&self, command: u8, data: &[u8]) -> Result<Response, DeviceError> {
        let mut inner = self.inner.lock().await;
        let frame = self.exchange(&mut inner, command, data).await?;
        Ok(Response::from_frame(frame))
    }

    /// Resets the sequence and sends Sync.
    pub async fn sync(&self) -> Result<Response, DeviceError> {
        self.send(SspCommand::Sync.into(), &[]).await
    }

    /// Sends `command` inside an encryption envelope.
    ///
    /// The counter in `ctx` only advances once a sealed reply has been
    /// opened. A reply the slave sends in clear (such as KEY_NOT_SET) is
    /// returned as-is.
    pub async fn send_sealed(
        &self,
        ctx: &mut EncryptionContext,
        command: u8,
        data: &[u8],
    ) -> Result<Response, DeviceError> {
        let mut payload = Vec::with_capacity(data.len() + 1);
        payload.push(command);
        payload.extend_from_slice(data);
        let body = ctx.seal(&payload)?;

        let frame = {
            let mut inner = self.inner.lock().await;
            self.exchange(&mut inner, STEX, &body).await?
        };

        if !envelope::is_sealed(frame.command) {
            return Ok(Response::from_frame(frame));
        }

        let plain = ctx.open(&frame.data)?;
        ctx.advance();
        Ok(Response::from_payload(frame.seq_addr, &plain)?)
    }

    /// Closes the transport. Later sends fail with [DeviceError::NotConnected].
    pub async fn close(&self) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock().await;
        if inner.transport.is_open() {
            inner.transport.close().await.map_err(DeviceError::CloseFailed)?;
            info!(address = self.address, "channel closed");
        }
        Ok(())
    }

    async fn exchange(
        &self,
        inner: &mut Inner<T>,
        command: u8,
        data: &[u8],
    ) -> Result<Frame, DeviceError> {
        // Size is checked first so an oversized request leaves the sequence alone
        frame::ensure_fits(data.len())?;

        if !inner.transport.is_open() {
            return Err(DeviceError::NotConnected);
        }

        if command == u8::from(SspCommand::Sync) {
            inner.sequence.reset();
        }
        let bit = inner.sequence.next_bit();
        let request = frame::encode(sequence::seq_addr(bit, self.address), command, data)?;

        debug!(command, seq = bit, len = data.len(), "sending command");
        trace!(bytes = ?request, "TX");

        let stale = inner
            .transport
            .discard_input()
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotConnected => DeviceError::NotConnected,
                _ => DeviceError::ReadFailed(e),
            })?;
        if stale > 0 {
            debug!(bytes = stale, "discarded unread input before sending");
        }

        let written = inner.transport.write(&request).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotConnected => DeviceError::NotConnected,
            _ => DeviceError::WriteFailed(e),
        })?;
        if written != request.len() {
            return Err(DeviceError::WriteFailed(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {written} of {} bytes", request.len()),
            )));
        }

        let reply = self.read_reply(&mut inner.transport, bit).await?;
        debug!(status = reply.command, len = reply.data.len(), "received reply");
        Ok(reply)
    }

    /// Reads until a whole frame carrying `bit` has arrived, skipping noise
    /// before STX and replies left over from an earlier command.
    async fn read_reply(&self, transport: &mut T, bit: bool) -> Result<Frame, DeviceError> {
        let mut buf: Vec<u8> = Vec::new();
        let mut discarded = 0usize;
        let mut stale_bit = None;

        loop {
            if self.checks.contains(FrameChecks::STX) {
                let skip = buf.iter().position(|&b| b == STX).unwrap_or(buf.len());
                if skip > 0 {
                    trace!(bytes = ?&buf[..skip], "discarding bytes before STX");
                    buf.drain(..skip);
                    discarded += skip;
                }
                if discarded > MAX_FRAME_LEN {
                    return Err(DecodeError::MissingStx.into());
                }
            }

            if let Some(total) = frame::frame_len(&buf) {
                if buf.len() >= total {
                    match self.take_frame(&mut buf, bit)? {
                        Ok(frame) => return Ok(frame),
                        Err(actual) => {
                            stale_bit = Some(actual);
                            continue;
                        }
                    }
                }
            }

            let chunk = match transport.read(self.read_timeout).await {
                Ok(chunk) => chunk,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => Vec::new(),
                Err(e) if e.kind() == io::ErrorKind::NotConnected => {
                    return Err(DeviceError::NotConnected)
                }
                Err(e) => return Err(DeviceError::ReadFailed(e)),
            };

            if chunk.is_empty() {
                if !buf.is_empty() {
                    // Partial frame; let the codec say how short it is
                    frame::decode_prefix(&buf, self.checks)?;
                }
                if let Some(actual) = stale_bit {
                    return Err(DecodeError::SequenceMismatch { expected: bit, actual }.into());
                }
                if discarded > 0 {
                    return Err(DecodeError::MissingStx.into());
                }
                return Err(DeviceError::Timeout);
            }

            trace!(bytes = ?chunk, "RX");
            buf.extend_from_slice(&chunk);
        }
    }

    /// Decodes the complete frame at the front of `buf` and removes it.
    ///
    /// A frame whose sequence bit differs from `bit` answered some earlier
    /// command; it comes back as `Err(its bit)` so the caller keeps reading.
    fn take_frame(&self, buf: &mut Vec<u8>, bit: bool) -> Result<Result<Frame, bool>, DeviceError> {
        let (frame, used) = frame::decode_prefix(buf, self.checks)?;
        buf.drain(..used);

        if self.checks.contains(FrameChecks::ADDRESS) && frame.address() != self.address {
            return Err(DecodeError::AddressMismatch {
                expected: self.address,
                actual: frame.address(),
            }
            .into());
        }

        if self.checks.contains(FrameChecks::SEQUENCE) && frame.sequence_bit() != bit {
            debug!(expected = bit, actual = frame.sequence_bit(), "dropping stale reply");
            return Ok(Err(frame.sequence_bit()));
        }

        if !buf.is_empty() {
            trace!(residue = ?&buf[..], "dropping bytes past end of reply");
        }
        Ok(Ok(frame))
    }
}

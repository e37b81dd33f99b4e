//! The byte-stream transport the protocol engine talks through.
//!
//! The engine never opens ports itself. It is handed something that
//! implements [Transport]: a serial port wrapped in [StreamTransport], an
//! in-memory duplex pipe, or the scripted `mock::MockTransport` that the
//! `mock` feature enables.

#[cfg(any(test, feature = "mock"))]
pub mod mock;

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::MAX_FRAME_LEN;

pub trait Read: AsyncRead + Unpin + Send + 'static {}
impl<T: AsyncRead + Unpin + Send + 'static> Read for T {}

pub trait Write: AsyncWrite + Unpin + Send + 'static {}
impl<T: AsyncWrite + Unpin + Send + 'static> Write for T {}

pub trait Stream: Read + Write {}
impl<T: Read + Write> Stream for T {}

/// A half-duplex byte link to one slave.
///
/// A read that sees no bytes within `timeout` must fail with
/// [io::ErrorKind::TimedOut]; a closed transport must fail with
/// [io::ErrorKind::NotConnected].
#[async_trait]
pub trait Transport: Send + 'static {
    /// Writes all of `data`, returning how many bytes went out.
    async fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Waits up to `timeout` for bytes and returns whatever has arrived.
    async fn read(&mut self, timeout: Duration) -> io::Result<Vec<u8>>;

    async fn close(&mut self) -> io::Result<()>;

    fn is_open(&self) -> bool;

    /// Drops whatever input is already waiting, returning how many bytes
    /// went. Called before every request so a late reply to an earlier
    /// command is never read as the answer to the next one.
    async fn discard_input(&mut self) -> io::Result<usize> {
        let mut discarded = 0;
        loop {
            match self.read(Duration::ZERO).await {
                Ok(bytes) if bytes.is_empty() => return Ok(discarded),
                Ok(bytes) => discarded += bytes.len(),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => return Ok(discarded),
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl Transport for Box<dyn Transport> {
    async fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        (**self).write(data).await
    }

    async fn read(&mut self, timeout: Duration) -> io::Result<Vec<u8>> {
        (**self).read(timeout).await
    }

    async fn close(&mut self) -> io::Result<()> {
        (**self).close().await
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    async fn discard_input(&mut self) -> io::Result<usize> {
        (**self).discard_input().await
    }
}

/// Wraps any tokio stream (serial port, duplex pipe, socket) as a [Transport].
pub struct StreamTransport<S: Stream> {
    stream: Option<S>,
}

impl<S: Stream> StreamTransport<S> {
    pub fn new(stream: S) -> Self {
        StreamTransport {
            stream: Some(stream),
        }
    }

    /// Gives back the wrapped stream, unless the transport was closed.
    pub fn into_inner(self) -> Option<S> {
        self.stream
    }

    fn stream(&mut self) -> io::Result<&mut S> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport is closed"))
    }
}

#[async_trait]
impl<S: Stream> Transport for StreamTransport<S> {
    async fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let stream = self.stream()?;
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(data.len())
    }

    async fn read(&mut self, timeout: Duration) -> io::Result<Vec<u8>> {
        let stream = self.stream()?;
        let mut buf = vec![0u8; MAX_FRAME_LEN];

        match tokio::time::timeout(timeout, stream.read(&mut buf)).await {
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "no bytes before read timeout",
            )),
            Ok(Ok(0)) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream closed by peer",
            )),
            Ok(Ok(n)) => {
                buf.truncate(n);
                Ok(buf)
            }
            Ok(Err(e)) => Err(e),
        }
    }

    async fn close(&mut self) -> io::Result<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stream_transport_moves_bytes_both_ways() {
        let (host, mut device) = tokio::io::duplex(64);
        let mut transport = StreamTransport::new(host);

        assert_eq!(transport.write(&[0x7F, 0x80, 0x01, 0x11, 0x65, 0x82]).await.unwrap(), 6);

        let mut seen = [0u8; 6];
        device.read_exact(&mut seen).await.unwrap();
        assert_eq!(seen, [0x7F, 0x80, 0x01, 0x11, 0x65, 0x82]);

        device.write_all(&[0x7F, 0x80, 0x01, 0xF0, 0x23, 0x80]).await.unwrap();
        let got = transport.read(Duration::from_millis(100)).await.unwrap();
        assert_eq!(got, vec![0x7F, 0x80, 0x01, 0xF0, 0x23, 0x80]);
    }

    #[tokio::test]
    async fn stream_transport_read_times_out() {
        let (host, _device) = tokio::io::duplex(64);
        let mut transport = StreamTransport::new(host);

        let err = transport.read(Duration::from_millis(10)).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn waiting_input_is_discarded() {
        let (host, mut device) = tokio::io::duplex(64);
        let mut transport = StreamTransport::new(host);

        device.write_all(&[0x7F, 0x00, 0x01, 0xF0, 0x20, 0x0A]).await.unwrap();
        assert_eq!(transport.discard_input().await.unwrap(), 6);
        assert_eq!(transport.discard_input().await.unwrap(), 0);

        let err = transport.read(Duration::from_millis(10)).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn closed_stream_transport_is_not_connected() {
        let (host, _device) = tokio::io::duplex(64);
        let mut transport = StreamTransport::new(host);

        transport.close().await.unwrap();
        assert!(!transport.is_open());

        let err = transport.write(&[0x00]).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }
}

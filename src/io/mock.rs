//! An in-memory [Transport] for tests and demos.
//!
//! Replies are either queued up front with [MockTransport::push_reply] or
//! produced on demand by a responder closure that sees each decoded request.
//! Every write is recorded along with when its reply was fully handed back,
//! so tests can check that exchanges never overlap.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::Transport;
use crate::protocol::{frame, Frame, GenericStatus};

/// What the mock does after the host writes a request.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Hand these bytes back to subsequent reads.
    Bytes(Vec<u8>),
    /// Say nothing, so the host's read times out.
    Silence,
    /// Fail the next read with this error kind.
    ReadError(io::ErrorKind),
    /// Fail the write itself with this error kind.
    WriteError(io::ErrorKind),
    /// Accept only this many bytes of the request and say nothing.
    ShortWrite(usize),
}

/// One recorded request and when its reply finished draining.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub request: Vec<u8>,
    pub written_at: Instant,
    pub answered_at: Option<Instant>,
}

type Responder = Box<dyn FnMut(&Frame) -> MockReply + Send>;

struct MockState {
    open: bool,
    script: VecDeque<MockReply>,
    responder: Option<Responder>,
    pending: VecDeque<u8>,
    pending_error: Option<io::ErrorKind>,
    exchanges: Vec<Exchange>,
    reply_delay: Duration,
    chunk_size: Option<usize>,
    close_error: Option<io::ErrorKind>,
}

/// A scripted slave. Clones share state, so a test can keep a handle while
/// the driver owns another.
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport {
            state: Arc::new(Mutex::new(MockState {
                open: true,
                script: VecDeque::new(),
                responder: None,
                pending: VecDeque::new(),
                pending_error: None,
                exchanges: Vec::new(),
                reply_delay: Duration::ZERO,
                chunk_size: None,
                close_error: None,
            })),
        }
    }

    /// Queues a reply for a future write. Queued replies are used before the
    /// responder is consulted.
    pub fn push_reply(&self, reply: MockReply) {
        self.lock().script.push_back(reply);
    }

    /// Queues raw reply bytes for a future write.
    pub fn push_bytes(&self, bytes: impl Into<Vec<u8>>) {
        self.push_reply(MockReply::Bytes(bytes.into()));
    }

    /// Answers every unscripted request with whatever `responder` returns.
    pub fn set_responder<F>(&self, responder: F)
    where
        F: FnMut(&Frame) -> MockReply + Send + 'static,
    {
        self.lock().responder = Some(Box::new(responder));
    }

    /// Delays every read by `delay`, like a slow slave.
    pub fn set_reply_delay(&self, delay: Duration) {
        self.lock().reply_delay = delay;
    }

    /// Hands replies back at most `size` bytes per read.
    pub fn set_chunk_size(&self, size: usize) {
        self.lock().chunk_size = Some(size.max(1));
    }

    pub fn set_open(&self, open: bool) {
        self.lock().open = open;
    }

    /// Makes the next close fail with `kind`. The mock stays open.
    pub fn fail_close(&self, kind: io::ErrorKind) {
        self.lock().close_error = Some(kind);
    }

    /// Puts `bytes` on the line before any request, like a reply that
    /// turned up after the host gave up on it.
    pub fn inject_input(&self, bytes: impl IntoIterator<Item = u8>) {
        self.lock().pending.extend(bytes);
    }

    /// Every request written so far, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.lock()
            .exchanges
            .iter()
            .map(|e| e.request.clone())
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.lock().exchanges.len()
    }

    pub fn exchanges(&self) -> Vec<Exchange> {
        self.lock().exchanges.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut guard = self.lock();
        let state = &mut *guard;
        if !state.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "mock is closed"));
        }

        state.exchanges.push(Exchange {
            request: data.to_vec(),
            written_at: Instant::now(),
            answered_at: None,
        });

        let reply = match state.script.pop_front() {
            Some(reply) => reply,
            None => match (state.responder.as_mut(), frame::decode(data)) {
                (Some(responder), Ok(request)) => responder(&request),
                _ => MockReply::Silence,
            },
        };

        match reply {
            MockReply::Bytes(bytes) => state.pending.extend(bytes),
            MockReply::Silence => {}
            MockReply::ReadError(kind) => state.pending_error = Some(kind),
            MockReply::WriteError(kind) => {
                return Err(io::Error::new(kind, "scripted write failure"))
            }
            MockReply::ShortWrite(n) => return Ok(n.min(data.len())),
        }

        Ok(data.len())
    }

    async fn read(&mut self, timeout: Duration) -> io::Result<Vec<u8>> {
        let delay = {
            let state = self.lock();
            if !state.open {
                return Err(io::Error::new(io::ErrorKind::NotConnected, "mock is closed"));
            }
            state.reply_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        {
            let mut state = self.lock();
            if let Some(kind) = state.pending_error.take() {
                return Err(io::Error::new(kind, "scripted read failure"));
            }
            if !state.pending.is_empty() {
                let n = state
                    .chunk_size
                    .unwrap_or(usize::MAX)
                    .min(state.pending.len());
                let out: Vec<u8> = state.pending.drain(..n).collect();
                if state.pending.is_empty() {
                    if let Some(last) = state.exchanges.last_mut() {
                        last.answered_at = Some(Instant::now());
                    }
                }
                return Ok(out);
            }
        }

        tokio::time::sleep(timeout).await;
        Err(io::Error::new(io::ErrorKind::TimedOut, "mock read timed out"))
    }

    async fn close(&mut self) -> io::Result<()> {
        let mut state = self.lock();
        if let Some(kind) = state.close_error.take() {
            return Err(io::Error::new(kind, "scripted close failure"));
        }
        state.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.lock().open
    }

    async fn discard_input(&mut self) -> io::Result<usize> {
        let mut state = self.lock();
        if !state.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "mock is closed"));
        }
        state.pending_error = None;
        let discarded = state.pending.len();
        state.pending.clear();
        Ok(discarded)
    }
}

/// Builds a reply frame with `status` followed by `data`.
pub fn reply_frame(seq_addr: u8, status: GenericStatus, data: &[u8]) -> Vec<u8> {
    // Test replies are always small enough to fit
    frame::encode(seq_addr, status.to_u8(), data).unwrap_or_default()
}

/// Builds a reply to `request` that echoes its SEQ/ID byte, the way a real
/// slave does.
pub fn reply_to(request: &Frame, status: GenericStatus, data: &[u8]) -> MockReply {
    MockReply::Bytes(reply_frame(request.seq_addr, status, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_reply_is_read_back() {
        let mut mock = MockTransport::new();
        mock.push_bytes(reply_frame(0x80, GenericStatus::Ok, &[]));

        mock.write(&[0x7F, 0x80, 0x01, 0x11, 0x65, 0x82]).await.unwrap();
        let got = mock.read(Duration::from_millis(10)).await.unwrap();

        assert_eq!(got, vec![0x7F, 0x80, 0x01, 0xF0, 0x23, 0x80]);
        assert_eq!(mock.write_count(), 1);
        assert!(mock.exchanges()[0].answered_at.is_some());
    }

    #[tokio::test]
    async fn responder_sees_decoded_request() {
        let mut mock = MockTransport::new();
        mock.set_responder(|req| reply_to(req, GenericStatus::Ok, &[req.command]));

        let request = frame::encode(0x00, 0x0D, &[]).unwrap();
        mock.write(&request).await.unwrap();
        let raw = mock.read(Duration::from_millis(10)).await.unwrap();

        let reply = frame::decode(&raw).unwrap();
        assert_eq!(reply.seq_addr, 0x00);
        assert_eq!(reply.data, vec![0x0D]);
    }

    #[tokio::test]
    async fn chunked_reply_arrives_in_pieces() {
        let mut mock = MockTransport::new();
        mock.set_chunk_size(2);
        mock.push_bytes(vec![1, 2, 3, 4, 5]);

        mock.write(&[0]).await.unwrap();
        assert_eq!(mock.read(Duration::from_millis(10)).await.unwrap(), vec![1, 2]);
        assert_eq!(mock.read(Duration::from_millis(10)).await.unwrap(), vec![3, 4]);
        assert!(mock.exchanges()[0].answered_at.is_none());
        assert_eq!(mock.read(Duration::from_millis(10)).await.unwrap(), vec![5]);
        assert!(mock.exchanges()[0].answered_at.is_some());
    }

    #[tokio::test]
    async fn silence_times_out() {
        let mut mock = MockTransport::new();
        mock.write(&[0]).await.unwrap();
        let err = mock.read(Duration::from_millis(5)).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn injected_input_is_discarded() {
        let mut mock = MockTransport::new();
        mock.inject_input([0x7F, 0x00, 0x01]);

        assert_eq!(mock.discard_input().await.unwrap(), 3);
        let err = mock.read(Duration::from_millis(5)).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn short_write_reports_partial_count() {
        let mut mock = MockTransport::new();
        mock.push_reply(MockReply::ShortWrite(2));
        assert_eq!(mock.write(&[1, 2, 3, 4, 5, 6]).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn closed_mock_refuses_io() {
        let mut mock = MockTransport::new();
        mock.close().await.unwrap();
        assert!(!mock.is_open());
        assert_eq!(
            mock.write(&[0]).await.unwrap_err().kind(),
            io::ErrorKind::NotConnected
        );
    }
}

//! Background polling.
//!
//! An [EventPoller] spawns a task that sends Poll through the shared
//! [CommandChannel] once per period and publishes what comes back to an
//! [EventSink]. Because it goes through the channel like any other caller,
//! application commands issued while polling simply wait their turn.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::channel::CommandChannel;
use crate::errors::DeviceError;
use crate::events::{decode_poll, PollEvent};
use crate::io::Transport;
use crate::protocol::{GenericStatus, SspCommand, POLL_PERIOD_MS};

/// Something the poller reports.
///
/// # Variants
///
/// * [PollerEvent::Event] - An event decoded from an OK poll reply
/// * [PollerEvent::Status] - The slave answered Poll with a non-OK status
/// * [PollerEvent::Error] - The poll exchange itself failed. Polling continues
#[derive(Debug, Clone)]
pub enum PollerEvent {
    Event(PollEvent),
    Status(GenericStatus),
    Error(Arc<DeviceError>),
}

/// Where the poller delivers [PollerEvent]s.
pub trait EventSink: Send + 'static {
    fn publish(&mut self, event: PollerEvent);
}

impl EventSink for mpsc::UnboundedSender<PollerEvent> {
    fn publish(&mut self, event: PollerEvent) {
        // A dropped receiver just means nobody is listening any more
        let _ = self.send(event);
    }
}

impl EventSink for mpsc::Sender<PollerEvent> {
    fn publish(&mut self, event: PollerEvent) {
        if let Err(mpsc::error::TrySendError::Full(event)) = self.try_send(event) {
            warn!(?event, "event sink full, dropping event");
        }
    }
}

impl EventSink for broadcast::Sender<PollerEvent> {
    fn publish(&mut self, event: PollerEvent) {
        let _ = self.send(event);
    }
}

/// Adapts a closure into an [EventSink].
pub struct FnSink<F>(pub F);

impl<F> EventSink for FnSink<F>
where
    F: FnMut(PollerEvent) + Send + 'static,
{
    fn publish(&mut self, event: PollerEvent) {
        (self.0)(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Stopped,
    Running,
}

struct PollerTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct EventPoller<T: Transport> {
    channel: Arc<CommandChannel<T>>,
    period: Duration,
    task: Option<PollerTask>,
}

impl<T: Transport> EventPoller<T> {
    pub fn new(channel: Arc<CommandChannel<T>>) -> Self {
        EventPoller {
            channel,
            period: Duration::from_millis(POLL_PERIOD_MS),
            task: None,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn state(&self) -> PollerState {
        match self.task {
            Some(_) => PollerState::Running,
            None => PollerState::Stopped,
        }
    }

    /// Starts polling, publishing to `sink`. Must be called from within a
    /// tokio runtime.
    pub fn start<S: EventSink>(&mut self, sink: S) -> Result<(), DeviceError> {
        if self.task.is_some() {
            return Err(DeviceError::AlreadyPolling);
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            self.channel.clone(),
            self.period,
            sink,
            cancel.clone(),
        ));
        info!(period_ms = self.period.as_millis() as u64, "poller started");

        self.task = Some(PollerTask { cancel, handle });
        Ok(())
    }

    /// Starts polling and returns the events as a stream.
    pub fn start_stream(&mut self) -> Result<UnboundedReceiverStream<PollerEvent>, DeviceError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.start(tx)?;
        Ok(UnboundedReceiverStream::new(rx))
    }

    /// Stops polling and waits for the task to finish.
    ///
    /// A poll already on the wire is allowed to complete, so once this
    /// returns no further poll will be sent. Stopping a stopped poller is a
    /// no-op.
    pub async fn stop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };

        task.cancel.cancel();
        if let Err(e) = task.handle.await {
            warn!(error = %e, "poller task ended abnormally");
        }
        info!("poller stopped");
    }
}

impl<T: Transport> Drop for EventPoller<T> {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.cancel.cancel();
        }
    }
}

async fn poll_loop<T: Transport, S: EventSink>(
    channel: Arc<CommandChannel<T>>,
    period: Duration,
    mut sink: S,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // The tick and the cancel can become ready together
        if cancel.is_cancelled() {
            break;
        }

        // Not raced against the cancel: an exchange, once begun, completes
        match channel.send(SspCommand::Poll.into(), &[]).await {
            Ok(response) if response.is_ok() => {
                match decode_poll(&response.data, channel.protocol_version()) {
                    Ok(events) => {
                        for event in events {
                            debug!(code = ?event.code, "poll event");
                            sink.publish(PollerEvent::Event(event));
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "undecodable poll reply");
                        sink.publish(PollerEvent::Error(Arc::new(e.into())));
                    }
                }
            }
            Ok(response) => {
                warn!(status = %response.status, "poll answered with non-OK status");
                sink.publish(PollerEvent::Status(response.status));
            }
            Err(e) => {
                warn!(error = %e, "poll failed");
                sink.publish(PollerEvent::Error(Arc::new(e)));
            }
        }
    }
}

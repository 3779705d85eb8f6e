//! Channel receiver with cached end-of-stream state
//!
//! [`Receiver`] wraps a single `crossbeam_channel::Receiver<ChannelMessage<T>>`
//! and unwraps `ChannelMessage` transparently in `recv`. It remembers
//! end-of-stream, so once a source has closed its output every later call
//! returns `Shutdown` without touching the channel.

use crossbeam_channel::Receiver as CrossbeamReceiver;
use std::sync::atomic::{AtomicBool, Ordering};

use super::errors::{WorkError, WorkResult};
use super::sender::ChannelMessage;

/// A single crossbeam receiver.
///
/// The end-of-stream flag is externally owned so it persists across
/// `work()` calls of the owning node.
pub struct Receiver<'a, T> {
    receiver: &'a CrossbeamReceiver<ChannelMessage<T>>,
    eos: &'a AtomicBool,
}

impl<'a, T> Receiver<'a, T> {
    pub fn new(receiver: &'a CrossbeamReceiver<ChannelMessage<T>>, eos: &'a AtomicBool) -> Self {
        Self { receiver, eos }
    }

    /// Blocking receive.
    ///
    /// Returns `Err(WorkError::Shutdown)` once end-of-stream has been seen
    /// or every sender has gone away.
    pub fn recv(&mut self) -> WorkResult<T> {
        if self.eos.load(Ordering::Relaxed) {
            return Err(WorkError::Shutdown);
        }
        match self.receiver.recv() {
            Ok(ChannelMessage::Sample(item)) => Ok(item),
            Ok(ChannelMessage::EndOfStream) => {
                self.eos.store(true, Ordering::Relaxed);
                tracing::debug!("Receiver - EndOfStream received");
                Err(WorkError::Shutdown)
            }
            Err(_) => {
                tracing::debug!("Receiver - channel disconnected, returning Shutdown");
                Err(WorkError::Shutdown)
            }
        }
    }
}

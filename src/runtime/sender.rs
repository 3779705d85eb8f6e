//! Broadcast sender with explicit end-of-stream signaling

use crossbeam_channel::{SendError, Sender as CrossbeamSender};

/// Channel message wrapper for end-of-stream signaling
///
/// A finite capture has a definite end. Sources say so with `EndOfStream`
/// instead of relying on every clone of the sender being dropped, so a
/// decoder blocked on its input wakes up as soon as the capture is done.
///
/// Nodes never see this enum directly: `Sender::send()` wraps values in
/// `Sample(T)` and `Receiver::recv()` unwraps them.
#[derive(Clone, Debug)]
pub enum ChannelMessage<T> {
    /// A data item
    Sample(T),
    /// No more data will be sent
    EndOfStream,
}

/// Broadcast sender that delivers every value to all connected inputs
pub struct Sender<T> {
    destinations: Vec<CrossbeamSender<ChannelMessage<T>>>,
}

impl<T: Clone> Sender<T> {
    /// Create a new Sender from a vector of crossbeam senders
    pub fn new(destinations: Vec<CrossbeamSender<ChannelMessage<T>>>) -> Self {
        Self { destinations }
    }

    /// Send a value to all destinations
    ///
    /// Fails only if every destination has hung up. A sender with no
    /// destinations silently drops the value.
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        let mut any_success = false;
        let mut last_error = None;

        for dest in &self.destinations {
            match dest.send(ChannelMessage::Sample(value.clone())) {
                Ok(()) => any_success = true,
                Err(SendError(ChannelMessage::Sample(v))) => last_error = Some(SendError(v)),
                Err(SendError(ChannelMessage::EndOfStream)) => {}
            }
        }

        match last_error {
            Some(e) if !any_success => Err(e),
            _ => Ok(()),
        }
    }

    /// Signal end-of-stream to all destinations
    ///
    /// Downstream receivers return `WorkError::Shutdown` from then on.
    pub fn close(&self) {
        for dest in &self.destinations {
            let _ = dest.send(ChannelMessage::EndOfStream);
        }
    }
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            destinations: self.destinations.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn test_broadcast_reaches_every_destination() {
        let (tx1, rx1) = bounded::<ChannelMessage<u8>>(4);
        let (tx2, rx2) = bounded::<ChannelMessage<u8>>(4);
        let sender = Sender::new(vec![tx1, tx2]);

        sender.send(7).unwrap();
        sender.close();

        for rx in [rx1, rx2] {
            assert!(matches!(rx.recv().unwrap(), ChannelMessage::Sample(7)));
            assert!(matches!(rx.recv().unwrap(), ChannelMessage::EndOfStream));
        }
    }

    #[test]
    fn test_send_fails_only_when_all_receivers_gone() {
        let (tx1, rx1) = bounded::<ChannelMessage<u8>>(4);
        let (tx2, rx2) = bounded::<ChannelMessage<u8>>(4);
        let sender = Sender::new(vec![tx1, tx2]);

        drop(rx1);
        assert!(sender.send(1).is_ok());

        drop(rx2);
        let err = sender.send(2).unwrap_err();
        assert_eq!(err.0, 2);
    }

    #[test]
    fn test_unconnected_sender_drops_values() {
        let sender = Sender::<u8>::new(Vec::new());
        assert!(sender.send(3).is_ok());
    }
}

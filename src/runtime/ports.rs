//! Port schemas and type-erased channel endpoints
//!
//! A node declares its ports as [`PortSchema`]s; the [`Pipeline`] creates
//! the channels and hands each node its [`InputPort`]s and [`OutputPort`]s.
//!
//! [`Pipeline`]: super::pipeline::Pipeline

use crossbeam_channel::Receiver as CrossbeamReceiver;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::AtomicBool;

use super::receiver::Receiver;
use super::sender::{ChannelMessage, Sender};

/// Direction of a port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

/// Schema describing a port's metadata
#[derive(Debug, Clone)]
pub struct PortSchema {
    pub name: String,
    pub type_id: TypeId,
    pub index: usize,
    pub direction: PortDirection,
}

impl PortSchema {
    /// Create a new port schema carrying items of type `T`
    pub fn new<T: 'static>(name: impl Into<String>, index: usize, direction: PortDirection) -> Self {
        Self {
            name: name.into(),
            type_id: TypeId::of::<T>(),
            index,
            direction,
        }
    }
}

/// Type-erased input port wrapping a crossbeam receiver
pub struct InputPort {
    channel: Box<dyn Any + Send>,
    eos: AtomicBool,
}

impl InputPort {
    /// Create from type-erased box (for internal use by Pipeline).
    pub(crate) fn from_type_erased(channel: Box<dyn Any + Send>) -> Self {
        Self {
            channel,
            eos: AtomicBool::new(false),
        }
    }

    /// Create a typed input port directly (for tests and hand-wired graphs).
    pub fn new<T: Send + 'static>(receiver: CrossbeamReceiver<ChannelMessage<T>>) -> Self {
        Self::from_type_erased(Box::new(receiver))
    }

    /// Get a Receiver over this port.
    ///
    /// Returns None if the port is unconnected or carries another type.
    pub fn get<T: Send + 'static>(&self) -> Option<Receiver<'_, T>> {
        let receiver = self
            .channel
            .downcast_ref::<CrossbeamReceiver<ChannelMessage<T>>>()?;
        Some(Receiver::new(receiver, &self.eos))
    }
}

/// Type-erased output port wrapping a broadcast [`Sender`]
pub struct OutputPort {
    channel: Box<dyn Any + Send>,
}

impl OutputPort {
    /// Create from type-erased box (for internal use by Pipeline).
    pub(crate) fn from_type_erased(channel: Box<dyn Any + Send>) -> Self {
        Self { channel }
    }

    /// Create a typed output port directly (for tests and hand-wired graphs).
    pub fn new<T: Send + Clone + 'static>(sender: Sender<T>) -> Self {
        Self::from_type_erased(Box::new(sender))
    }

    /// Get a Sender for this port (cheaply cloned from internal storage).
    ///
    /// Returns None if the port is unconnected or carries another type.
    pub fn get<T: Send + Clone + 'static>(&self) -> Option<Sender<T>> {
        self.channel.downcast_ref::<Sender<T>>().cloned()
    }
}

impl fmt::Debug for InputPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InputPort")
    }
}

impl fmt::Debug for OutputPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputPort")
    }
}

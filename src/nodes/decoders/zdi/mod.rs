//! ZDI (Zilog Debug Interface) protocol decoder
//!
//! The decoder is layered bottom-up:
//! - [`scanner`]: waits on edge/level conditions over the sample stream
//! - [`framing`]: turns bits into a [`Transaction`](super::Transaction) plus bit annotations
//! - [`classifier`]: maps a transaction to an action, updating the [`SessionState`]
//! - [`decoder`]: drives the above as a pipeline node

pub mod classifier;
pub mod decoder;
pub mod framing;
pub mod metadata;
pub mod scanner;
pub mod session;
pub mod sink;

#[cfg(test)]
pub(crate) mod waveform;

pub use decoder::ZdiDecoder;
pub use metadata::ZDI_DECODER;
pub use scanner::SampleStream;
pub use session::{CpuRegister, SessionState};
pub use sink::AnnotationSink;

//! Pipeline nodes
//!
//! - **Sources** produce samples ([`CaptureSource`])
//! - **Decoders** turn samples into annotations ([`ZdiDecoder`](decoders::ZdiDecoder))
//! - **Sinks** consume results ([`AnnotationCollector`])

mod capture;
mod collector;
pub mod decoders;

pub use capture::CaptureSource;
pub use collector::AnnotationCollector;

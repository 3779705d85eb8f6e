//! ZDI (Zilog Debug Interface) protocol decoder with a streaming node-based API
//!
//! Decodes two-wire eZ80 debug traffic (ZDA data, ZCL clock) from logic
//! analyzer captures into time-ranged annotations: raw bits, register and
//! value fields, and the debug action each transaction performs.
//!
//! # Architecture
//!
//! - **CaptureSource**: Streams recorded samples from memory or CSV
//! - **ZdiDecoder**: Frames transactions and classifies them against session state
//! - **Scheduler**: Thread-per-node execution with crossbeam channels
//!
//! # Example
//!
//! ```no_run
//! use zdi::{AnnotationCollector, CaptureSource, Pipeline, ZdiDecoder};
//!
//! let collector = AnnotationCollector::new();
//! let annotations = collector.annotations();
//!
//! let mut pipeline = Pipeline::new();
//! pipeline.add_process("source", CaptureSource::open("capture.csv")?)?;
//! pipeline.add_process("zdi", ZdiDecoder::new())?;
//! pipeline.add_process("collector", collector)?;
//! pipeline.connect("source", "samples", "zdi", "samples")?;
//! pipeline.connect("zdi", "annotations", "collector", "annotations")?;
//! pipeline.build()?.wait();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use thiserror::Error;

pub mod nodes;
pub mod runtime;

// Re-export decoder data types
pub use nodes::decoders::{Action, Annotation, AnnotationClass, AnnotationRow, Direction, Transaction};

// Re-export data types from runtime
pub use runtime::LogicSample;

// Re-export nodes
pub use nodes::decoders::ZdiDecoder;
pub use nodes::{AnnotationCollector, CaptureSource};

// Re-export streaming runtime components
pub use runtime::{
    ConnectionError, InputPort, OutputPort, Pipeline, PortDirection, PortSchema, ProcessNode,
    Scheduler, WorkError, WorkResult, register_type,
};

#[derive(Error, Debug)]
pub enum ZdiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] Box<ConnectionError>),
}

pub type Result<T> = std::result::Result<T, ZdiError>;

/// Decode a whole capture through a source, decoder and collector pipeline
pub fn decode_capture(source: CaptureSource) -> Result<Vec<Annotation>> {
    let collector = AnnotationCollector::new();
    let annotations = collector.annotations();

    let mut decoder = ZdiDecoder::new();
    if let Some(hz) = source.samplerate() {
        decoder.set_samplerate(hz);
    }

    let mut pipeline = Pipeline::new();
    pipeline.add_process("source", source)?;
    pipeline.add_process("zdi", decoder)?;
    pipeline.add_process("collector", collector)?;
    pipeline.connect("source", "samples", "zdi", "samples")?;
    pipeline.connect("zdi", "annotations", "collector", "annotations")?;
    pipeline.build()?.wait();

    let mut collected = annotations.lock().unwrap_or_else(|p| p.into_inner());
    Ok(std::mem::take(&mut *collected))
}

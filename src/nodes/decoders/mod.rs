//! Protocol decoder nodes

pub mod types;
pub mod zdi;

// Re-export common types
pub use types::{Action, Annotation, AnnotationClass, AnnotationRow, Direction, Transaction};

// Re-export decoders
pub use zdi::ZdiDecoder;

//! Destinations for decoder annotations

use crate::nodes::decoders::types::Annotation;
use crate::runtime::{Sender, WorkError, WorkResult};

/// Receives annotations in emission order
pub trait AnnotationSink {
    fn emit(&mut self, annotation: Annotation) -> WorkResult;
}

impl AnnotationSink for Vec<Annotation> {
    fn emit(&mut self, annotation: Annotation) -> WorkResult {
        self.push(annotation);
        Ok(())
    }
}

impl AnnotationSink for Sender<Annotation> {
    fn emit(&mut self, annotation: Annotation) -> WorkResult {
        self.send(annotation).map_err(WorkError::from)
    }
}

//! Sink node gathering annotations into shared storage

use crate::nodes::decoders::Annotation;
use crate::runtime::node::{InputPort, OutputPort, ProcessNode, WorkError, WorkResult};
use crate::runtime::ports::{PortDirection, PortSchema};
use std::sync::{Arc, Mutex};

pub struct AnnotationCollector {
    name: String,
    annotations: Arc<Mutex<Vec<Annotation>>>,
}

impl AnnotationCollector {
    pub fn new() -> Self {
        Self {
            name: "annotation_collector".to_string(),
            annotations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// With custom name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Handle to the collected annotations; take it before adding the node
    /// to a pipeline
    pub fn annotations(&self) -> Arc<Mutex<Vec<Annotation>>> {
        Arc::clone(&self.annotations)
    }
}

impl Default for AnnotationCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessNode for AnnotationCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        0
    }

    fn input_schema(&self) -> Vec<PortSchema> {
        vec![PortSchema::new::<Annotation>("annotations", 0, PortDirection::Input)]
    }

    fn work(&mut self, inputs: &[InputPort], _outputs: &[OutputPort]) -> WorkResult<usize> {
        let mut input = inputs
            .first()
            .and_then(|p| p.get::<Annotation>())
            .ok_or_else(|| WorkError::NodeError("Missing annotation input".into()))?;

        let annotation = input.recv()?;
        self.annotations
            .lock()
            .map_err(|_| WorkError::NodeError("Annotation store poisoned".into()))?
            .push(annotation);
        Ok(1)
    }
}

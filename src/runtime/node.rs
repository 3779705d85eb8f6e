//! Node trait for streaming processing
//!
//! Nodes actively process data when `work()` is called by the scheduler.

pub use super::errors::{WorkError, WorkResult};
pub use super::ports::{InputPort, OutputPort, PortSchema};

/// A processing node
/// - Sources have 0 inputs and N outputs
/// - Sinks have N inputs and 0 outputs
/// - Processors have N inputs and M outputs
pub trait ProcessNode: Send {
    /// Get a debug name for this node
    fn name(&self) -> &str;

    /// Check if this node should stop processing
    fn should_stop(&self) -> bool {
        false
    }

    /// Number of input ports this node requires
    fn num_inputs(&self) -> usize;

    /// Number of output ports this node provides
    fn num_outputs(&self) -> usize;

    /// Schema for all input ports (name + type + index)
    fn input_schema(&self) -> Vec<PortSchema> {
        Vec::new()
    }

    /// Schema for all output ports (name + type + index)
    fn output_schema(&self) -> Vec<PortSchema> {
        Vec::new()
    }

    /// Read from inputs, process, write to outputs.
    ///
    /// Returns Ok(n) where n is the number of items produced.
    /// `Err(WorkError::Shutdown)` ends the node normally.
    fn work(&mut self, inputs: &[InputPort], outputs: &[OutputPort]) -> WorkResult<usize>;
}

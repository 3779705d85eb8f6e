//! Pipeline builder for constructing node graphs

use super::errors::ConnectionError;
use super::node::{InputPort, OutputPort, ProcessNode};
use super::ports::PortSchema;
use super::scheduler::Scheduler;
use super::type_registry::TYPE_REGISTRY;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use tracing::{debug, info};

/// Pipeline builder that manages nodes and connections
pub struct Pipeline {
    nodes: Vec<(usize, Box<dyn ProcessNode>)>,
    node_names: HashMap<String, usize>,
    node_schemas: HashMap<usize, (Vec<PortSchema>, Vec<PortSchema>)>,
    connections: Vec<PendingConnection>,
    next_id: usize,
    default_buffer_size: usize,
}

struct PendingConnection {
    from_node: usize,
    from_port: usize,
    to_node: usize,
    to_port: usize,
    type_id: TypeId,
    buffer_size: usize,
}

impl Pipeline {
    /// Create a new pipeline
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            node_names: HashMap::new(),
            node_schemas: HashMap::new(),
            connections: Vec::new(),
            next_id: 0,
            default_buffer_size: 1000,
        }
    }

    /// Set the default buffer size for connections
    pub fn with_default_buffer_size(mut self, size: usize) -> Self {
        self.default_buffer_size = size;
        self
    }

    /// Add a process node by name (ports come from the node's schemas)
    pub fn add_process<N: ProcessNode + 'static>(
        &mut self,
        name: impl Into<String>,
        node: N,
    ) -> Result<(), Box<ConnectionError>> {
        let name = name.into();

        if self.node_names.contains_key(&name) {
            return Err(Box::new(ConnectionError::DuplicateNode(name)));
        }

        let id = self.next_id;
        self.next_id += 1;

        self.node_schemas
            .insert(id, (node.input_schema(), node.output_schema()));
        self.node_names.insert(name, id);
        self.nodes.push((id, Box::new(node)));

        Ok(())
    }

    /// Connect two nodes by name and port name
    pub fn connect(
        &mut self,
        from_node: &str,
        from_port: &str,
        to_node: &str,
        to_port: &str,
    ) -> Result<(), Box<ConnectionError>> {
        self.connect_with_buffer(from_node, from_port, to_node, to_port, self.default_buffer_size)
    }

    /// Connect with custom buffer size
    pub fn connect_with_buffer(
        &mut self,
        from_node: &str,
        from_port: &str,
        to_node: &str,
        to_port: &str,
        buffer_size: usize,
    ) -> Result<(), Box<ConnectionError>> {
        let from_schema = self.find_port(from_node, from_port, |(_, outputs)| outputs)?;
        let to_schema = self.find_port(to_node, to_port, |(inputs, _)| inputs)?;

        if from_schema.type_id != to_schema.type_id {
            return Err(Box::new(ConnectionError::TypeMismatch {
                from_node: from_node.to_string(),
                from_port: from_port.to_string(),
                from_type: from_schema.type_id,
                to_node: to_node.to_string(),
                to_port: to_port.to_string(),
                to_type: to_schema.type_id,
            }));
        }

        let from_id = self.node_names[from_node];
        let to_id = self.node_names[to_node];
        let (from_index, to_index, type_id) = (from_schema.index, to_schema.index, from_schema.type_id);

        if self
            .connections
            .iter()
            .any(|c| c.to_node == to_id && c.to_port == to_index)
        {
            return Err(Box::new(ConnectionError::DuplicateConnection {
                node: to_node.to_string(),
                port: to_port.to_string(),
            }));
        }

        self.connections.push(PendingConnection {
            from_node: from_id,
            from_port: from_index,
            to_node: to_id,
            to_port: to_index,
            type_id,
            buffer_size,
        });

        Ok(())
    }

    fn find_port(
        &self,
        node: &str,
        port: &str,
        side: impl Fn(&(Vec<PortSchema>, Vec<PortSchema>)) -> &Vec<PortSchema>,
    ) -> Result<PortSchema, Box<ConnectionError>> {
        let schemas = self
            .node_names
            .get(node)
            .and_then(|id| self.node_schemas.get(id))
            .ok_or_else(|| Box::new(ConnectionError::NodeNotFound(node.to_string())))?;
        side(schemas)
            .iter()
            .find(|s| s.name == port)
            .cloned()
            .ok_or_else(|| {
                Box::new(ConnectionError::PortNotFound {
                    node: node.to_string(),
                    port: port.to_string(),
                })
            })
    }

    /// Build the pipeline and return a running scheduler
    pub fn build(mut self) -> Result<Scheduler, Box<ConnectionError>> {
        info!(
            "Building pipeline with {} nodes and {} connections",
            self.nodes.len(),
            self.connections.len()
        );

        let registry = TYPE_REGISTRY
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Phase 1: create all channels
        type PortKey = (usize, usize);
        let mut receivers: HashMap<PortKey, Box<dyn Any + Send>> = HashMap::new();
        let mut senders: HashMap<PortKey, (TypeId, Vec<Box<dyn Any + Send>>)> = HashMap::new();

        for conn in &self.connections {
            let (tx, rx) = registry
                .create_channel(conn.type_id, conn.buffer_size)
                .ok_or(ConnectionError::UnregisteredType(conn.type_id))?;

            receivers.insert((conn.to_node, conn.to_port), rx);
            senders
                .entry((conn.from_node, conn.from_port))
                .or_insert_with(|| (conn.type_id, Vec::new()))
                .1
                .push(tx);
        }

        // Phase 2: hand ports to nodes; unconnected ports get a dummy endpoint
        let mut ready = Vec::with_capacity(self.nodes.len());
        for (node_id, node) in self.nodes.drain(..) {
            debug!("Wiring node {}: {}", node_id, node.name());

            let input_ports: Vec<_> = (0..node.num_inputs())
                .map(|i| {
                    receivers
                        .remove(&(node_id, i))
                        .map(InputPort::from_type_erased)
                        .unwrap_or_else(|| InputPort::from_type_erased(Box::new(())))
                })
                .collect();

            let output_ports = (0..node.num_outputs())
                .map(|i| match senders.remove(&(node_id, i)) {
                    Some((type_id, sender_list)) => registry
                        .wrap_output(type_id, sender_list)
                        .map(OutputPort::from_type_erased)
                        .map_err(|e| Box::new(ConnectionError::Wiring(e))),
                    None => Ok(OutputPort::from_type_erased(Box::new(()))),
                })
                .collect::<Result<Vec<_>, _>>()?;

            ready.push((node, input_ports, output_ports));
        }
        drop(registry);

        let mut scheduler = Scheduler::new();
        for (node, inputs, outputs) in ready {
            scheduler.start_process(node, inputs, outputs);
        }

        info!(
            "Pipeline built successfully with {} threads",
            scheduler.num_threads()
        );
        Ok(scheduler)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::decoders::Annotation;
    use crate::runtime::errors::WorkResult;
    use crate::runtime::ports::PortDirection;
    use crate::runtime::LogicSample;

    struct TestSource;
    impl ProcessNode for TestSource {
        fn name(&self) -> &str {
            "test_source"
        }
        fn should_stop(&self) -> bool {
            true
        }
        fn num_inputs(&self) -> usize {
            0
        }
        fn num_outputs(&self) -> usize {
            1
        }
        fn output_schema(&self) -> Vec<PortSchema> {
            vec![PortSchema::new::<LogicSample>("out", 0, PortDirection::Output)]
        }
        fn work(&mut self, _inputs: &[InputPort], _outputs: &[OutputPort]) -> WorkResult<usize> {
            Ok(0)
        }
    }

    struct TestSink;
    impl ProcessNode for TestSink {
        fn name(&self) -> &str {
            "test_sink"
        }
        fn should_stop(&self) -> bool {
            true
        }
        fn num_inputs(&self) -> usize {
            1
        }
        fn num_outputs(&self) -> usize {
            0
        }
        fn input_schema(&self) -> Vec<PortSchema> {
            vec![PortSchema::new::<LogicSample>("in", 0, PortDirection::Input)]
        }
        fn work(&mut self, _inputs: &[InputPort], _outputs: &[OutputPort]) -> WorkResult<usize> {
            Ok(0)
        }
    }

    struct AnnotationSink;
    impl ProcessNode for AnnotationSink {
        fn name(&self) -> &str {
            "annotation_sink"
        }
        fn num_inputs(&self) -> usize {
            1
        }
        fn num_outputs(&self) -> usize {
            0
        }
        fn input_schema(&self) -> Vec<PortSchema> {
            vec![PortSchema::new::<Annotation>("in", 0, PortDirection::Input)]
        }
        fn work(&mut self, _inputs: &[InputPort], _outputs: &[OutputPort]) -> WorkResult<usize> {
            Ok(0)
        }
    }

    #[test]
    fn test_single_connection() {
        let mut pipeline = Pipeline::new();
        pipeline.add_process("source", TestSource).unwrap();
        pipeline.add_process("sink", TestSink).unwrap();

        assert!(pipeline.connect("source", "out", "sink", "in").is_ok());
    }

    #[test]
    fn test_duplicate_input_connection_rejected() {
        let mut pipeline = Pipeline::new();
        pipeline.add_process("source1", TestSource).unwrap();
        pipeline.add_process("source2", TestSource).unwrap();
        pipeline.add_process("sink", TestSink).unwrap();

        pipeline.connect("source1", "out", "sink", "in").unwrap();
        let result = pipeline.connect("source2", "out", "sink", "in");
        assert!(result.unwrap_err().to_string().contains("already connected"));
    }

    #[test]
    fn test_broadcast_output_allowed() {
        let mut pipeline = Pipeline::new();
        pipeline.add_process("source", TestSource).unwrap();
        pipeline.add_process("sink1", TestSink).unwrap();
        pipeline.add_process("sink2", TestSink).unwrap();

        assert!(pipeline.connect("source", "out", "sink1", "in").is_ok());
        assert!(pipeline.connect("source", "out", "sink2", "in").is_ok());
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let mut pipeline = Pipeline::new();
        pipeline.add_process("source", TestSource).unwrap();
        pipeline.add_process("sink", AnnotationSink).unwrap();

        let err = pipeline.connect("source", "out", "sink", "in").unwrap_err();
        assert!(matches!(*err, ConnectionError::TypeMismatch { .. }));
    }

    #[test]
    fn test_unknown_node_and_port() {
        let mut pipeline = Pipeline::new();
        pipeline.add_process("source", TestSource).unwrap();
        pipeline.add_process("sink", TestSink).unwrap();

        let err = pipeline.connect("source", "out", "nowhere", "in").unwrap_err();
        assert!(matches!(*err, ConnectionError::NodeNotFound(_)));
        let err = pipeline.connect("source", "wrong_port", "sink", "in").unwrap_err();
        assert!(matches!(*err, ConnectionError::PortNotFound { .. }));
    }

    #[test]
    fn test_duplicate_node_name_rejected() {
        let mut pipeline = Pipeline::new();
        assert!(pipeline.add_process("node1", TestSource).is_ok());
        let err = pipeline.add_process("node1", TestSource).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(pipeline.add_process("node2", TestSource).is_ok());
    }

    #[test]
    fn test_build_and_wait() {
        let mut pipeline = Pipeline::new().with_default_buffer_size(16);
        pipeline.add_process("source", TestSource).unwrap();
        pipeline.add_process("sink", TestSink).unwrap();
        pipeline.connect("source", "out", "sink", "in").unwrap();

        let scheduler = pipeline.build().unwrap();
        assert_eq!(scheduler.num_threads(), 2);
        scheduler.wait();
    }
}

//! Thread-per-node scheduler for streaming graphs
//!
//! Spawns a dedicated thread for each node and calls `work()` in a loop
//! until the node reports `should_stop()`, returns `Shutdown` (end of
//! stream), or fails. Dropping a node's ports on exit disconnects its
//! neighbours.

use super::errors::WorkError;
use super::node::ProcessNode;
use super::ports::{InputPort, OutputPort};
use std::collections::HashMap;
use std::sync::mpsc::{Receiver as StdReceiver, Sender as StdSender, channel};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Runtime scheduler that executes a streaming graph
pub struct Scheduler {
    threads: Vec<(String, JoinHandle<()>)>,
    completion_tx: StdSender<String>,
    completion_rx: StdReceiver<String>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (completion_tx, completion_rx) = channel();
        Self {
            threads: Vec::new(),
            completion_tx,
            completion_rx,
        }
    }

    /// Start a process node in its own thread
    pub fn start_process(
        &mut self,
        mut node: Box<dyn ProcessNode>,
        inputs: Vec<InputPort>,
        outputs: Vec<OutputPort>,
    ) {
        let completion_tx = self.completion_tx.clone();
        let name = node.name().to_string();
        let thread_name = name.clone();

        debug!("Starting process node: {}", name);

        let handle = thread::spawn(move || {
            let mut items_produced = 0usize;

            loop {
                if node.should_stop() {
                    break;
                }

                match node.work(&inputs, &outputs) {
                    Ok(n) => items_produced += n,
                    Err(WorkError::Shutdown) => {
                        debug!("[{}] End of stream", thread_name);
                        break;
                    }
                    Err(e) => {
                        error!("[{}] Work error: {}", thread_name, e);
                        break;
                    }
                }
            }

            info!("[{}] Shutdown. Produced {} items.", thread_name, items_produced);

            drop(outputs);
            drop(inputs);
            drop(node);

            let _ = completion_tx.send(thread_name);
        });

        self.threads.push((name, handle));
    }

    /// Wait for all node threads to complete, joining them as they finish
    pub fn wait(self) {
        let Scheduler {
            threads,
            completion_tx,
            completion_rx,
            ..
        } = self;

        // Channel closes once every node thread has dropped its clone
        drop(completion_tx);

        let total_threads = threads.len();
        let mut completed = 0;
        let mut threads_by_name: HashMap<String, JoinHandle<()>> = threads.into_iter().collect();

        info!("Waiting for {} threads to complete...", total_threads);

        while completed < total_threads {
            let Ok(thread_name) = completion_rx.recv() else {
                break;
            };
            completed += 1;
            if let Some(handle) = threads_by_name.remove(&thread_name) {
                match handle.join() {
                    Ok(()) => debug!(
                        "[{}] Thread completed ({}/{})",
                        thread_name, completed, total_threads
                    ),
                    Err(e) => error!(
                        "[{}] Thread panicked ({}/{}): {:?}",
                        thread_name, completed, total_threads, e
                    ),
                }
            }
        }

        // Anything left panicked before reporting
        for (thread_name, handle) in threads_by_name {
            if let Err(e) = handle.join() {
                error!("[{}] Thread panicked: {:?}", thread_name, e);
            }
        }

        info!("All {} threads completed", total_threads);
    }

    /// Get the number of running threads
    pub fn num_threads(&self) -> usize {
        self.threads.len()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::errors::WorkResult;
    use crate::runtime::sender::{ChannelMessage, Sender};
    use crossbeam_channel::bounded;
    use std::sync::{Arc, Mutex};

    struct CountingSource {
        count: u32,
        max: u32,
    }

    impl ProcessNode for CountingSource {
        fn name(&self) -> &str {
            "counting_source"
        }

        fn num_inputs(&self) -> usize {
            0
        }

        fn num_outputs(&self) -> usize {
            1
        }

        fn work(&mut self, _inputs: &[InputPort], outputs: &[OutputPort]) -> WorkResult<usize> {
            let output = outputs[0]
                .get::<u32>()
                .ok_or_else(|| WorkError::NodeError("Missing output channel".to_string()))?;

            if self.count < self.max {
                output.send(self.count)?;
                self.count += 1;
                Ok(1)
            } else {
                output.close();
                Err(WorkError::Shutdown)
            }
        }
    }

    struct CollectingSink {
        received: Arc<Mutex<Vec<u32>>>,
    }

    impl ProcessNode for CollectingSink {
        fn name(&self) -> &str {
            "collecting_sink"
        }

        fn num_inputs(&self) -> usize {
            1
        }

        fn num_outputs(&self) -> usize {
            0
        }

        fn work(&mut self, inputs: &[InputPort], _outputs: &[OutputPort]) -> WorkResult<usize> {
            let mut input = inputs[0]
                .get::<u32>()
                .ok_or_else(|| WorkError::NodeError("Missing input channel".to_string()))?;

            let value = input.recv()?;
            self.received.lock().unwrap().push(value);
            Ok(1)
        }
    }

    #[test]
    fn test_scheduler_runs_to_end_of_stream() {
        let mut scheduler = Scheduler::new();
        let (tx, rx) = bounded::<ChannelMessage<u32>>(10);
        let received = Arc::new(Mutex::new(Vec::new()));

        scheduler.start_process(
            Box::new(CountingSource { count: 0, max: 5 }),
            vec![],
            vec![OutputPort::new(Sender::new(vec![tx]))],
        );
        scheduler.start_process(
            Box::new(CollectingSink {
                received: Arc::clone(&received),
            }),
            vec![InputPort::new(rx)],
            vec![],
        );
        assert_eq!(scheduler.num_threads(), 2);

        scheduler.wait();

        assert_eq!(*received.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }
}

//! Type registry for dynamic channel creation
//!
//! The pipeline only knows a connection's `TypeId`; the registry turns that
//! back into a typed bounded channel and a typed broadcast [`Sender`].

use super::sender::{ChannelMessage, Sender};
use crossbeam_channel::{Sender as CrossbeamSender, bounded};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type ErasedEndpoint = Box<dyn Any + Send>;
type ChannelCreatorFn = Box<dyn Fn(usize) -> (ErasedEndpoint, ErasedEndpoint) + Send + Sync>;
type OutputWrapperFn =
    Box<dyn Fn(Vec<ErasedEndpoint>) -> Result<ErasedEndpoint, String> + Send + Sync>;

pub(crate) struct TypeRegistry {
    channel_creators: HashMap<TypeId, ChannelCreatorFn>,
    output_wrappers: HashMap<TypeId, OutputWrapperFn>,
}

impl TypeRegistry {
    fn new() -> Self {
        Self {
            channel_creators: HashMap::new(),
            output_wrappers: HashMap::new(),
        }
    }

    fn register<T: 'static + Send + Clone>(&mut self) {
        let type_id = TypeId::of::<T>();

        self.channel_creators.insert(
            type_id,
            Box::new(|buffer_size: usize| {
                let (tx, rx) = bounded::<ChannelMessage<T>>(buffer_size);
                (Box::new(tx) as ErasedEndpoint, Box::new(rx) as ErasedEndpoint)
            }),
        );

        self.output_wrappers.insert(
            type_id,
            Box::new(|senders: Vec<ErasedEndpoint>| {
                let typed_senders = senders
                    .into_iter()
                    .map(|sender| {
                        sender
                            .downcast::<CrossbeamSender<ChannelMessage<T>>>()
                            .map(|tx| *tx)
                            .map_err(|_| "Type mismatch in sender".to_string())
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Box::new(Sender::new(typed_senders)) as ErasedEndpoint)
            }),
        );
    }

    pub(crate) fn create_channel(
        &self,
        type_id: TypeId,
        buffer_size: usize,
    ) -> Option<(ErasedEndpoint, ErasedEndpoint)> {
        self.channel_creators
            .get(&type_id)
            .map(|creator| creator(buffer_size))
    }

    pub(crate) fn wrap_output(
        &self,
        type_id: TypeId,
        senders: Vec<ErasedEndpoint>,
    ) -> Result<ErasedEndpoint, String> {
        self.output_wrappers
            .get(&type_id)
            .ok_or_else(|| format!("Type {:?} not registered", type_id))?(senders)
    }
}

lazy_static::lazy_static! {
    pub(crate) static ref TYPE_REGISTRY: Arc<Mutex<TypeRegistry>> = {
        let mut registry = TypeRegistry::new();

        use crate::nodes::decoders::Annotation;
        use crate::runtime::LogicSample;
        registry.register::<LogicSample>();
        registry.register::<Annotation>();

        Arc::new(Mutex::new(registry))
    };
}

/// Register a custom type for use in pipelines
/// Call this before building pipelines that use custom types
pub fn register_type<T: 'static + Send + Clone>() {
    TYPE_REGISTRY
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .register::<T>();
}

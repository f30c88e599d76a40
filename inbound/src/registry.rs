//! Maps configured class identifiers to transform constructors.
//!
//! The host builds one registry at startup, then instantiates a
//! [`TransformHandle`] per topic from that topic's [`TransformConfig`].

use crate::config::TransformConfig;
use crate::error::{RegistryError, TransformError};
use crate::operation::record::RecordOperation;
use crate::reader::AerospikeReader;
use crate::transform::{
    InboundMessageTransform, InboundMessageTransformer, Lifetime, TransformerAdapter,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Everything a transform receives at construction.
#[derive(Clone)]
pub struct TransformContext {
    topic: String,
    config: Arc<TransformConfig>,
    reader: Arc<dyn AerospikeReader>,
}

impl TransformContext {
    pub fn new(topic: &str, config: TransformConfig, reader: Arc<dyn AerospikeReader>) -> Self {
        Self {
            topic: topic.to_string(),
            config: Arc::new(config),
            reader,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn config(&self) -> &Arc<TransformConfig> {
        &self.config
    }

    pub fn reader(&self) -> &Arc<dyn AerospikeReader> {
        &self.reader
    }
}

type SharedTransform<T> = Arc<dyn InboundMessageTransform<T> + Sync>;
type SingletonFactory<T> =
    Box<dyn Fn(&TransformContext) -> Result<SharedTransform<T>, TransformError> + Send + Sync>;
type PerMessageFactory<T> = Arc<
    dyn Fn(&TransformContext) -> Result<Box<dyn InboundMessageTransform<T>>, TransformError>
        + Send
        + Sync,
>;

enum Factory<T> {
    Singleton(SingletonFactory<T>),
    PerMessage(PerMessageFactory<T>),
}

pub struct TransformRegistry<T> {
    factories: HashMap<String, Factory<T>>,
}

impl<T: 'static> TransformRegistry<T> {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers a transform shared by all workers for the lifetime of the
    /// handle.
    pub fn register_singleton<X, F>(&mut self, class: &str, factory: F) -> Result<(), RegistryError>
    where
        X: InboundMessageTransform<T> + Sync + 'static,
        F: Fn(&TransformContext) -> Result<X, TransformError> + Send + Sync + 'static,
    {
        self.insert(
            class,
            Factory::Singleton(Box::new(move |ctx| {
                Ok(Arc::new(factory(ctx)?) as SharedTransform<T>)
            })),
        )
    }

    /// Registers a transform built afresh for every message.
    pub fn register_per_message<X, F>(&mut self, class: &str, factory: F) -> Result<(), RegistryError>
    where
        X: InboundMessageTransform<T> + 'static,
        F: Fn(&TransformContext) -> Result<X, TransformError> + Send + Sync + 'static,
    {
        self.insert(
            class,
            Factory::PerMessage(Arc::new(move |ctx| {
                Ok(Box::new(factory(ctx)?) as Box<dyn InboundMessageTransform<T>>)
            })),
        )
    }

    pub fn register_transformer_singleton<X, F>(
        &mut self,
        class: &str,
        factory: F,
    ) -> Result<(), RegistryError>
    where
        X: InboundMessageTransformer<T> + Sync + 'static,
        F: Fn(&TransformContext) -> Result<X, TransformError> + Send + Sync + 'static,
    {
        self.register_singleton(class, move |ctx| Ok(TransformerAdapter::new(factory(ctx)?)))
    }

    pub fn register_transformer_per_message<X, F>(
        &mut self,
        class: &str,
        factory: F,
    ) -> Result<(), RegistryError>
    where
        X: InboundMessageTransformer<T> + 'static,
        F: Fn(&TransformContext) -> Result<X, TransformError> + Send + Sync + 'static,
    {
        self.register_per_message(class, move |ctx| Ok(TransformerAdapter::new(factory(ctx)?)))
    }

    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }

    /// Registered class identifiers, sorted.
    pub fn classes(&self) -> Vec<&str> {
        let mut classes: Vec<&str> = self.factories.keys().map(|k| k.as_str()).collect();
        classes.sort_unstable();
        classes
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Builds the transform selected by `config` for `topic`.
    ///
    /// Per-message transforms are built once here as well so that bad
    /// params surface at startup rather than on the first message.
    pub fn instantiate(
        &self,
        topic: &str,
        config: TransformConfig,
        reader: Arc<dyn AerospikeReader>,
    ) -> Result<TransformHandle<T>, RegistryError> {
        let class = config.class_name().to_string();
        let factory = self
            .factories
            .get(&class)
            .ok_or_else(|| RegistryError::UnknownClass(class.clone()))?;
        let context = TransformContext::new(topic, config, reader);
        let instance = match factory {
            Factory::Singleton(f) => Instance::Singleton(f(&context).map_err(|e| {
                RegistryError::Factory {
                    class: class.clone(),
                    source: e,
                }
            })?),
            Factory::PerMessage(f) => {
                f(&context).map_err(|e| RegistryError::Factory {
                    class: class.clone(),
                    source: e,
                })?;
                Instance::PerMessage(f.clone())
            }
        };
        log::debug!(
            "Instantiated transform [{class}] for topic [{topic}]",
            class = class,
            topic = topic
        );
        Ok(TransformHandle { context, instance })
    }

    fn insert(&mut self, class: &str, factory: Factory<T>) -> Result<(), RegistryError> {
        if self.factories.contains_key(class) {
            return Err(RegistryError::DuplicateClass(class.to_string()));
        }
        log::debug!("Registering transform: [{class}]", class = class);
        self.factories.insert(class.to_string(), factory);
        Ok(())
    }
}

impl<T: 'static> Default for TransformRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

enum Instance<T> {
    Singleton(SharedTransform<T>),
    PerMessage(PerMessageFactory<T>),
}

/// An instantiated transform, safe to share between host workers.
pub struct TransformHandle<T> {
    context: TransformContext,
    instance: Instance<T>,
}

impl<T: 'static> TransformHandle<T> {
    pub fn class_name(&self) -> &str {
        self.context.config.class_name()
    }

    pub fn topic(&self) -> &str {
        &self.context.topic
    }

    pub fn lifetime(&self) -> Lifetime {
        match self.instance {
            Instance::Singleton(_) => Lifetime::Singleton,
            Instance::PerMessage(_) => Lifetime::PerMessage,
        }
    }

    /// Transforms one message. Composite results are rejected unless the
    /// config sets `unsafe-composite-record-operations`.
    pub fn transform(&self, input: &T) -> Result<Vec<RecordOperation>, TransformError> {
        let ops = match &self.instance {
            Instance::Singleton(transform) => transform.transform(input)?,
            Instance::PerMessage(factory) => factory(&self.context)?.transform(input)?,
        };
        if !self.context.config.allows_composite() && ops.iter().any(|op| op.is_composite()) {
            log::error!(
                "Transform [{class}] returned a composite operation but composite operations are not enabled",
                class = self.class_name()
            );
            return Err(TransformError::CompositeNotAllowed(
                self.class_name().to_string(),
            ));
        }
        Ok(ops)
    }
}

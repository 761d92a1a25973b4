//! Collaborator registry injected into inspectors.
//!
//! # Responsibilities
//! - Map content types to consumers and producers (in registration order)
//! - Map parameter sources to generators
//! - Map result destinations to handlers
//!
//! # Design Decisions
//! - Built once before serving, then shared read-only behind an `Arc`
//! - Registration order is kept so `*/*` expands deterministically
//! - Re-registering a key replaces the previous entry

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::codec::{
    Consumer, JsonConsumer, JsonProducer, OctetStreamConsumer, OctetStreamProducer, Producer,
    TextConsumer, TextProducer,
};
use crate::definition::{Destination, Source, MIME_ALL};
use crate::service::generator::{BodyGenerator, ParameterGenerator, TextGenerator};
use crate::service::handler::{DataHandler, DestinationHandler, ErrorHandler, MetaHandler};

#[derive(Clone, Default)]
pub struct Registry {
    consumers: IndexMap<String, Arc<dyn Consumer>>,
    producers: IndexMap<String, Arc<dyn Producer>>,
    generators: HashMap<Source, Arc<dyn ParameterGenerator>>,
    handlers: HashMap<Destination, Arc<dyn DestinationHandler>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in codecs, generators and handlers.
    pub fn with_defaults() -> Self {
        Self::new()
            .with_consumer(Arc::new(JsonConsumer))
            .with_consumer(Arc::new(TextConsumer))
            .with_consumer(Arc::new(OctetStreamConsumer))
            .with_producer(Arc::new(JsonProducer))
            .with_producer(Arc::new(TextProducer))
            .with_producer(Arc::new(OctetStreamProducer))
            .with_generator(Arc::new(TextGenerator::path()))
            .with_generator(Arc::new(TextGenerator::query()))
            .with_generator(Arc::new(TextGenerator::header()))
            .with_generator(Arc::new(BodyGenerator))
            .with_handler(Arc::new(MetaHandler))
            .with_handler(Arc::new(ErrorHandler))
            .with_handler(Arc::new(DataHandler))
    }

    pub fn with_consumer(mut self, consumer: Arc<dyn Consumer>) -> Self {
        self.consumers
            .insert(consumer.content_type().to_string(), consumer);
        self
    }

    pub fn with_producer(mut self, producer: Arc<dyn Producer>) -> Self {
        self.producers
            .insert(producer.content_type().to_string(), producer);
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn ParameterGenerator>) -> Self {
        self.generators.insert(generator.source().clone(), generator);
        self
    }

    pub fn with_handler(mut self, handler: Arc<dyn DestinationHandler>) -> Self {
        self.handlers
            .insert(handler.destination().clone(), handler);
        self
    }

    pub fn consumer(&self, content_type: &str) -> Option<Arc<dyn Consumer>> {
        self.consumers.get(content_type).cloned()
    }

    pub fn producer(&self, content_type: &str) -> Option<Arc<dyn Producer>> {
        self.producers.get(content_type).cloned()
    }

    pub fn all_consumers(&self) -> impl Iterator<Item = &Arc<dyn Consumer>> {
        self.consumers.values()
    }

    pub fn all_producers(&self) -> impl Iterator<Item = &Arc<dyn Producer>> {
        self.producers.values()
    }

    pub fn generator(&self, source: &Source) -> Option<Arc<dyn ParameterGenerator>> {
        self.generators.get(source).cloned()
    }

    pub fn handler(&self, destination: &Destination) -> Option<Arc<dyn DestinationHandler>> {
        self.handlers.get(destination).cloned()
    }

    /// Resolves declared consumer types. `Err` carries the first unknown type.
    pub fn resolve_consumers(&self, types: &[String]) -> Result<Vec<Arc<dyn Consumer>>, String> {
        resolve(&self.consumers, types)
    }

    /// Resolves declared producer types. `Err` carries the first unknown type.
    pub fn resolve_producers(&self, types: &[String]) -> Result<Vec<Arc<dyn Producer>>, String> {
        resolve(&self.producers, types)
    }
}

/// Explicit types first, in declaration order; `*/*` appends every remaining entry.
fn resolve<T: ?Sized>(
    table: &IndexMap<String, Arc<T>>,
    types: &[String],
) -> Result<Vec<Arc<T>>, String> {
    let mut all = false;
    let mut explicit = HashSet::new();
    let mut resolved = Vec::new();
    for ct in types {
        if ct == MIME_ALL {
            all = true;
            continue;
        }
        let entry = table.get(ct).ok_or_else(|| ct.clone())?;
        if explicit.insert(ct.as_str()) {
            resolved.push(entry.clone());
        }
    }
    if all {
        for (ct, entry) in table {
            if !explicit.contains(ct.as_str()) {
                resolved.push(entry.clone());
            }
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{MIME_JSON, MIME_OCTET_STREAM, MIME_TEXT};

    fn names(producers: &[Arc<dyn Producer>]) -> Vec<&str> {
        producers.iter().map(|p| p.content_type()).collect()
    }

    #[test]
    fn test_wildcard_expands_remaining() {
        let registry = Registry::with_defaults();
        let resolved = registry
            .resolve_producers(&[MIME_TEXT.to_string(), MIME_ALL.to_string()])
            .unwrap();
        assert_eq!(names(&resolved), vec![MIME_TEXT, MIME_JSON, MIME_OCTET_STREAM]);
    }

    #[test]
    fn test_unknown_type() {
        let registry = Registry::with_defaults();
        let err = registry
            .resolve_consumers(&["application/xml".to_string()])
            .err();
        assert_eq!(err.as_deref(), Some("application/xml"));
    }

    #[test]
    fn test_lookups() {
        let registry = Registry::with_defaults();
        assert!(registry.generator(&Source::QUERY).is_some());
        assert!(registry.generator(&Source::new("Cookie")).is_none());
        assert_eq!(
            registry.handler(&Destination::DATA).map(|h| h.priority()),
            Some(30)
        );
        assert!(Registry::new().consumer(MIME_JSON).is_none());
    }
}

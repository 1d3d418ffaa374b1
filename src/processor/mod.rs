//! Config Processor Pipeline
//!
//! A [`ConfigProcessor`] applies one transformation to a [`RawConfig`]. The
//! [`Pipeline`] runs an ordered list of them over one alias's configuration,
//! stopping at the first failure.
//!
//! Every processor runs at most once per configuration: [`ConfigProcessor::process`]
//! rejects a configuration already carrying its marker, and works on a staged
//! copy so a failure never leaves the configuration half-transformed.
//!
//! Standard order:
//!
//! ```text
//! relay-connection -> shorthand -> inheritance -> named -> visibility
//!     -> deprecation -> default-resolver -> references
//! ```

pub mod default_resolver;
pub mod deprecation;
pub mod inheritance;
pub mod named;
pub mod reference;
pub mod relay;
pub mod shorthand;
pub mod visibility;

pub use default_resolver::DefaultResolverProcessor;
pub use deprecation::DeprecationProcessor;
pub use inheritance::InheritanceProcessor;
pub use named::NamedProcessor;
pub use reference::ReferenceProcessor;
pub use relay::RelayConnectionProcessor;
pub use shorthand::ShorthandProcessor;
pub use visibility::VisibilityProcessor;

use serde_json::{Map, Value};
use tracing::{debug, info_span};

use crate::error::{ConfigError, Result, SchemaError};
use crate::raw::RawConfig;

/// One transformation step over a raw configuration
pub trait ConfigProcessor: Send + Sync {
    /// Stable identifier, used as the applied-marker
    fn name(&self) -> &'static str;

    /// Transform the configuration in place
    fn apply(&self, config: &mut RawConfig) -> std::result::Result<(), ConfigError>;

    /// Apply exactly once, all or nothing
    fn process(&self, config: &mut RawConfig) -> std::result::Result<(), ConfigError> {
        if config.is_applied(self.name()) {
            return Err(ConfigError::AlreadyProcessed(self.name()));
        }
        let mut staged = config.clone();
        self.apply(&mut staged)?;
        staged.mark_applied(self.name());
        *config = staged;
        Ok(())
    }
}

/// Options for assembling the standard pipeline
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Resolver injected into object fields that declare none
    pub default_field_resolver: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            default_field_resolver: crate::resolvers::PROPERTY_RESOLVER.to_string(),
        }
    }
}

/// An ordered list of processors
#[derive(Default)]
pub struct Pipeline {
    processors: Vec<Box<dyn ConfigProcessor>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in processors in their required order
    pub fn standard(options: &PipelineOptions) -> Self {
        Self::new()
            .with(RelayConnectionProcessor)
            .with(ShorthandProcessor)
            .with(InheritanceProcessor)
            .with(NamedProcessor)
            .with(VisibilityProcessor)
            .with(DeprecationProcessor)
            .with(DefaultResolverProcessor::new(options.default_field_resolver.clone()))
            .with(ReferenceProcessor)
    }

    /// Append a processor
    pub fn with(mut self, processor: impl ConfigProcessor + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Run every processor in order, aborting at the first failure
    pub fn run(&self, config: &mut RawConfig) -> Result<()> {
        let span = info_span!("pipeline", alias = %config.alias());
        let _enter = span.enter();

        for processor in &self.processors {
            debug!(processor = processor.name(), types = config.len(), "applying processor");
            processor.process(config).map_err(|source| SchemaError::Config {
                alias: config.alias().to_string(),
                processor: processor.name(),
                source,
            })?;
        }

        debug!(types = config.len(), "pipeline finished");
        Ok(())
    }
}

/// The `fields` table of a `config` table
pub(crate) fn fields_mut<'a>(
    type_name: &str,
    config: &'a mut Map<String, Value>,
) -> std::result::Result<&'a mut Map<String, Value>, ConfigError> {
    match config.get_mut("fields") {
        Some(Value::Object(fields)) => Ok(fields),
        Some(other) => Err(crate::raw::not_a_table(&format!("{}.fields", type_name), other)),
        None => Err(crate::raw::missing(type_name, "fields")),
    }
}

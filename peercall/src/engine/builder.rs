//! Engine builder.

use crate::config::EngineConfig;
use crate::engine::CorrelationEngine;
use crate::error::{ConfigError, PeerCallError};
use crate::invocation::{TargetRegistry, TargetResolver};
use crate::messaging::{JsonCodec, MessageCodec, Transport};
use crate::providers::{Providers, TokioProviders};
use std::rc::Rc;
use std::time::Duration;

/// Builder for [`CorrelationEngine`] with fluent API.
///
/// A transport is required. Without a resolver the engine hosts no targets
/// and refuses every inbound invocation.
///
/// # Example
///
/// ```rust,ignore
/// let targets = Rc::new(TargetRegistry::new());
///
/// let engine = EngineBuilder::new()
///     .transport(network.join(PeerId::new(1)))
///     .resolver(targets.clone())
///     .default_timeout(Duration::from_secs(5))
///     .build()?;
/// engine.start();
/// ```
pub struct EngineBuilder<P = TokioProviders, C = JsonCodec> {
    config: EngineConfig,
    providers: P,
    codec: C,
    transport: Option<Rc<dyn Transport>>,
    resolver: Option<Rc<dyn TargetResolver>>,
}

impl EngineBuilder {
    /// Create a builder with default settings, Tokio providers and JSON frames.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            providers: TokioProviders::new(),
            codec: JsonCodec,
            transport: None,
            resolver: None,
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, C> EngineBuilder<P, C>
where
    P: Providers,
    C: MessageCodec,
{
    /// Replace all settings at once, e.g. with [`EngineConfig::from_json`].
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Timeout for requests that don't set their own. Zero disables it.
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.config.default_timeout = timeout;
        self
    }

    /// How often overdue requests are released.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    /// Path of the engine in the target namespace.
    pub fn engine_path(mut self, path: impl Into<String>) -> Self {
        self.config.engine_path = path.into();
        self
    }

    /// Set the transport, taking ownership of it.
    pub fn transport(self, transport: impl Transport + 'static) -> Self {
        self.shared_transport(Rc::new(transport))
    }

    /// Set a transport that is shared with other code.
    pub fn shared_transport(mut self, transport: Rc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the resolver for inbound invocation targets.
    pub fn resolver(mut self, resolver: Rc<dyn TargetResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Run on other providers.
    pub fn providers<Q: Providers>(self, providers: Q) -> EngineBuilder<Q, C> {
        EngineBuilder {
            config: self.config,
            providers,
            codec: self.codec,
            transport: self.transport,
            resolver: self.resolver,
        }
    }

    /// Encode frames with another codec.
    pub fn codec<D: MessageCodec>(self, codec: D) -> EngineBuilder<P, D> {
        EngineBuilder {
            config: self.config,
            providers: self.providers,
            codec,
            transport: self.transport,
            resolver: self.resolver,
        }
    }

    /// Build the engine. It is not started.
    ///
    /// # Errors
    ///
    /// Returns an error if no transport was given or the settings are invalid.
    pub fn build(self) -> Result<Rc<CorrelationEngine<P, C>>, PeerCallError> {
        self.config.validate()?;

        let transport = self.transport.ok_or(ConfigError::MissingTransport)?;
        let resolver = self
            .resolver
            .unwrap_or_else(|| Rc::new(TargetRegistry::new()));

        tracing::info!(
            peer = %transport.local_peer(),
            engine_path = %self.config.engine_path,
            "correlation engine created"
        );

        Ok(Rc::new(CorrelationEngine::new(
            self.config,
            self.providers,
            self.codec,
            transport,
            resolver,
        )))
    }
}

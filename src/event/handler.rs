use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::error::{HandlerError, RegistryError};
use super::registry::{settle, RegistryState, RegistryStats};
use super::types::{EventType, OneOrMany};
use crate::config::RegistryConfig;

/// Trait for components that react to published events asynchronously
///
/// Handlers are matched by `Arc` identity: unsubscribe with a clone of the
/// same `Arc` that was subscribed.
#[async_trait]
pub trait EventHandler<P = Value>: Send + Sync {
    /// Handle one published event
    async fn handle(&self, event_type: &EventType, data: Option<&P>)
        -> Result<(), HandlerError>;

    /// Get a human-readable name for this handler (for logging/debugging)
    fn name(&self) -> &'static str;
}

/// A no-op event handler for testing
pub struct NoOpEventHandler;

#[async_trait]
impl<P: Sync> EventHandler<P> for NoOpEventHandler {
    async fn handle(
        &self,
        _event_type: &EventType,
        _data: Option<&P>,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "NoOpEventHandler"
    }
}

/// Shared handle to an async handler, as stored by [`AsyncRegistry`]
pub type SharedHandler<P = Value> = Arc<dyn EventHandler<P>>;

impl<P> From<SharedHandler<P>> for OneOrMany<SharedHandler<P>> {
    fn from(handler: SharedHandler<P>) -> Self {
        OneOrMany::One(handler)
    }
}

impl<P> From<&SharedHandler<P>> for OneOrMany<SharedHandler<P>> {
    fn from(handler: &SharedHandler<P>) -> Self {
        OneOrMany::One(Arc::clone(handler))
    }
}

impl<P, H: EventHandler<P> + 'static> From<Arc<H>> for OneOrMany<SharedHandler<P>> {
    fn from(handler: Arc<H>) -> Self {
        OneOrMany::One(handler)
    }
}

impl<P, H: EventHandler<P> + 'static> From<&Arc<H>> for OneOrMany<SharedHandler<P>> {
    fn from(handler: &Arc<H>) -> Self {
        OneOrMany::One(handler.clone())
    }
}

impl<P> From<Vec<SharedHandler<P>>> for OneOrMany<SharedHandler<P>> {
    fn from(handlers: Vec<SharedHandler<P>>) -> Self {
        OneOrMany::Many(handlers)
    }
}

/// Registry whose subscribers are async [`EventHandler`]s
///
/// Same subscription rules as [`Registry`](super::Registry). `publish`
/// awaits each handler in subscription order before starting the next one,
/// and returns once every handler of every type has finished.
pub struct AsyncRegistry<P = Value> {
    state: Arc<Mutex<RegistryState<SharedHandler<P>>>>,
    config: RegistryConfig,
}

impl<P: Sync> AsyncRegistry<P> {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        info!(
            failure_policy = %config.failure_policy,
            timeout_ms = config.handler_timeout.map(|t| t.as_millis() as u64),
            "Creating async subscriber registry"
        );
        Self {
            state: Arc::new(Mutex::new(RegistryState::new())),
            config,
        }
    }

    pub fn subscribe(
        &self,
        types: impl Into<OneOrMany<EventType>>,
        handlers: impl Into<OneOrMany<SharedHandler<P>>>,
    ) {
        let types: OneOrMany<EventType> = types.into();
        let handlers: OneOrMany<SharedHandler<P>> = handlers.into();
        let (types, handlers) = (types.into_vec(), handlers.into_vec());

        for handler in &handlers {
            debug!(handler = handler.name(), types = ?types, "Registering event handler");
        }
        self.state.lock().table.subscribe(&types, &handlers);
    }

    pub fn unsubscribe(
        &self,
        types: impl Into<OneOrMany<EventType>>,
        handlers: impl Into<OneOrMany<SharedHandler<P>>>,
    ) -> Result<(), RegistryError> {
        let types: OneOrMany<EventType> = types.into();
        let handlers: OneOrMany<SharedHandler<P>> = handlers.into();
        let (types, handlers) = (types.into_vec(), handlers.into_vec());

        let removed = self.state.lock().table.unsubscribe(&types, &handlers)?;
        debug!(types = ?types, removed, "Unsubscribed event handlers");
        Ok(())
    }

    /// Delivers `data` to each handler in turn, awaiting each one.
    ///
    /// With a configured `handler_timeout`, a handler that runs longer is
    /// abandoned and reported as [`HandlerError::Timeout`].
    pub async fn publish(
        &self,
        types: impl Into<OneOrMany<EventType>>,
        data: Option<P>,
    ) -> Result<(), RegistryError> {
        let types: OneOrMany<EventType> = types.into();
        for event_type in types {
            let snapshot = self.state.lock().begin_publish(&event_type);
            let Some(handlers) = snapshot else {
                debug!(event_type = %event_type, "No handlers for event type");
                continue;
            };

            debug!(
                event_type = %event_type,
                handlers = handlers.len(),
                "Dispatching event"
            );

            for (position, handler) in handlers.iter().enumerate() {
                let result = self
                    .run_handler(handler.as_ref(), &event_type, data.as_ref())
                    .await;
                settle(self.config.failure_policy, &event_type, position, result)?;
            }
        }
        Ok(())
    }

    async fn run_handler(
        &self,
        handler: &dyn EventHandler<P>,
        event_type: &EventType,
        data: Option<&P>,
    ) -> Result<(), HandlerError> {
        let Some(limit) = self.config.handler_timeout else {
            return handler.handle(event_type, data).await;
        };

        match timeout(limit, handler.handle(event_type, data)).await {
            Ok(result) => result,
            Err(_elapsed) => {
                warn!(
                    handler = handler.name(),
                    event_type = %event_type,
                    timeout_ms = limit.as_millis() as u64,
                    "Handler timed out"
                );
                Err(HandlerError::Timeout)
            }
        }
    }

    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.state.lock().table.subscriber_count(event_type)
    }

    pub fn is_registered(&self, event_type: &str) -> bool {
        self.state.lock().table.contains(event_type)
    }

    pub fn stats(&self) -> RegistryStats {
        self.state.lock().stats()
    }
}

impl<P> Clone for AsyncRegistry<P> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            config: self.config.clone(),
        }
    }
}

impl<P: Sync> Default for AsyncRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

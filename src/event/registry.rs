use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

use super::callback::Callback;
use super::error::{HandlerError, RegistryError};
use super::table::{SameHandle, SubscriberTable};
use super::types::{EventType, OneOrMany};
use crate::config::{FailurePolicy, RegistryConfig};

/// Snapshot of registry activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryStats {
    pub event_types: usize,
    pub total_subscriptions: usize,
    pub publish_count: u64,
    pub last_published_at: Option<DateTime<Utc>>,
}

/// Subscriber table plus publish bookkeeping, guarded as one unit
pub(crate) struct RegistryState<H> {
    pub table: SubscriberTable<H>,
    publish_count: u64,
    last_published_at: Option<DateTime<Utc>>,
}

impl<H: SameHandle + Clone> RegistryState<H> {
    pub fn new() -> Self {
        Self {
            table: SubscriberTable::new(),
            publish_count: 0,
            last_published_at: None,
        }
    }

    /// Snapshot for one publish; counts the publish when the type is known
    pub fn begin_publish(&mut self, event_type: &EventType) -> Option<Vec<H>> {
        let snapshot = self.table.snapshot(event_type)?;
        self.publish_count += 1;
        self.last_published_at = Some(Utc::now());
        Some(snapshot)
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            event_types: self.table.event_types().len(),
            total_subscriptions: self.table.total_subscriptions(),
            publish_count: self.publish_count,
            last_published_at: self.last_published_at,
        }
    }
}

/// Applies the failure policy to one subscriber result.
///
/// Returns `Err` only when delivery must stop.
pub(crate) fn settle(
    policy: FailurePolicy,
    event_type: &EventType,
    position: usize,
    result: Result<(), HandlerError>,
) -> Result<(), RegistryError> {
    match (result, policy) {
        (Ok(()), _) => Ok(()),
        (Err(e), FailurePolicy::Propagate) => {
            debug!(
                event_type = %event_type,
                position,
                error = %e,
                "Subscriber failed, aborting publish"
            );
            Err(RegistryError::Handler {
                event_type: event_type.clone(),
                source: e,
            })
        }
        (Err(e), FailurePolicy::Isolate) => {
            warn!(
                event_type = %event_type,
                position,
                error = %e,
                "Subscriber failed, continuing"
            );
            Ok(())
        }
    }
}

/// In-process publish/subscribe registry
///
/// Maps event types to ordered lists of [`Callback`]s. Cloning a `Registry`
/// gives another handle to the same subscriptions.
///
/// ```
/// use pubsub::{Callback, Registry};
/// use serde_json::{json, Value};
///
/// let registry: Registry = Registry::new();
/// let loaded = Callback::<Value>::infallible(|data| println!("loaded: {data:?}"));
///
/// registry.subscribe(["App.loaded", "App.done"], &loaded);
/// registry.publish("App.loaded", Some(json!({ "v": 1 }))).unwrap();
/// registry.unsubscribe("App.loaded", &loaded).unwrap();
/// ```
pub struct Registry<P = Value> {
    state: Arc<Mutex<RegistryState<Callback<P>>>>,
    config: RegistryConfig,
}

impl<P> Registry<P> {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        info!(
            failure_policy = %config.failure_policy,
            "Creating subscriber registry"
        );
        Self {
            state: Arc::new(Mutex::new(RegistryState::new())),
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Registers every callback for every event type, in order.
    ///
    /// Unknown types get an empty list first. Duplicates are kept: the same
    /// callback subscribed twice runs twice.
    pub fn subscribe(
        &self,
        types: impl Into<OneOrMany<EventType>>,
        callbacks: impl Into<OneOrMany<Callback<P>>>,
    ) {
        let types: OneOrMany<EventType> = types.into();
        let callbacks: OneOrMany<Callback<P>> = callbacks.into();
        let (types, callbacks) = (types.into_vec(), callbacks.into_vec());

        let appended = self.state.lock().table.subscribe(&types, &callbacks);
        debug!(types = ?types, appended, "Subscribed callbacks");
    }

    /// Removes one occurrence of each callback from each event type.
    ///
    /// Fails with [`RegistryError::UnknownEventType`] if any type was never
    /// subscribed, in which case nothing is removed. Callbacks that are not
    /// subscribed are ignored.
    pub fn unsubscribe(
        &self,
        types: impl Into<OneOrMany<EventType>>,
        callbacks: impl Into<OneOrMany<Callback<P>>>,
    ) -> Result<(), RegistryError> {
        let types: OneOrMany<EventType> = types.into();
        let callbacks: OneOrMany<Callback<P>> = callbacks.into();
        let (types, callbacks) = (types.into_vec(), callbacks.into_vec());

        let removed = self.state.lock().table.unsubscribe(&types, &callbacks)?;
        debug!(types = ?types, removed, "Unsubscribed callbacks");
        Ok(())
    }

    /// Calls every subscriber of each event type with `data`.
    ///
    /// Subscribers are those present when delivery to the type starts;
    /// callbacks may subscribe or unsubscribe while running. Types nobody
    /// subscribed to are skipped. Subscriber errors follow the configured
    /// [`FailurePolicy`].
    pub fn publish(
        &self,
        types: impl Into<OneOrMany<EventType>>,
        data: Option<P>,
    ) -> Result<(), RegistryError> {
        let types: OneOrMany<EventType> = types.into();
        for event_type in types {
            // Lock released before any callback runs
            let snapshot = self.state.lock().begin_publish(&event_type);
            let Some(callbacks) = snapshot else {
                debug!(event_type = %event_type, "No subscribers for event type");
                continue;
            };

            debug!(
                event_type = %event_type,
                subscribers = callbacks.len(),
                "Publishing event"
            );

            for (position, callback) in callbacks.iter().enumerate() {
                settle(
                    self.config.failure_policy,
                    &event_type,
                    position,
                    callback.call(data.as_ref()),
                )?;
            }
        }
        Ok(())
    }

    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.state.lock().table.subscriber_count(event_type)
    }

    /// Whether anything ever subscribed to this type
    pub fn is_registered(&self, event_type: &str) -> bool {
        self.state.lock().table.contains(event_type)
    }

    pub fn event_types(&self) -> Vec<EventType> {
        self.state.lock().table.event_types()
    }

    pub fn stats(&self) -> RegistryStats {
        self.state.lock().stats()
    }
}

impl<P> Clone for Registry<P> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            config: self.config.clone(),
        }
    }
}

impl<P> Default for Registry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for Registry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Process-wide registry with JSON payloads, configured from the
/// environment on first use (invalid settings fall back to defaults)
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(|| {
        let config = RegistryConfig::from_env().unwrap_or_else(|e| {
            warn!(error = %e, "Invalid registry configuration, using defaults");
            RegistryConfig::default()
        });
        Registry::with_config(config)
    })
}

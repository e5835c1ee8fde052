// In-process publish/subscribe dispatcher
//
// Callers subscribe callbacks to named event types and publish events with an
// optional payload; every subscriber of the type is called in order.

pub mod config;
pub mod event;
pub mod logging;

// Re-export commonly used types for easier access
pub use config::{ConfigError, FailurePolicy, RegistryConfig};
pub use event::{
    global, AsyncRegistry, Callback, EventHandler, EventType, HandlerError, NoOpEventHandler,
    OneOrMany, Registry, RegistryError, RegistryStats, SharedHandler,
};

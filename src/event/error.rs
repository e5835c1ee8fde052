use thiserror::Error;

use super::types::EventType;

/// Errors a subscriber can report back to the registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("Handler failed: {0}")]
    Failed(String),

    #[error("Handler timed out")]
    Timeout,
}

impl HandlerError {
    /// Create a failure with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        HandlerError::Failed(msg.into())
    }
}

/// Errors returned by registry operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Unsubscribe targeted a type nothing ever subscribed to
    #[error("Type {0} does not exist")]
    UnknownEventType(EventType),

    /// A subscriber failed while the failure policy was `Propagate`
    #[error("Subscriber of {event_type} failed: {source}")]
    Handler {
        event_type: EventType,
        #[source]
        source: HandlerError,
    },
}

// Subscription registry and dispatch
//
// `Registry` delivers synchronously to plain callbacks; `AsyncRegistry`
// awaits async handlers. Both share the same subscriber table.

// Public API - what other modules can use
pub use callback::Callback;
pub use error::{HandlerError, RegistryError};
pub use handler::{AsyncRegistry, EventHandler, NoOpEventHandler, SharedHandler};
pub use registry::{global, Registry, RegistryStats};
pub use types::{EventType, OneOrMany};

// Internal modules
mod callback;
mod error;
mod handler;
mod registry;
mod table;
mod types;

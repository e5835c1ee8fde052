use async_trait::async_trait;
use pubsub::{
    logging, AsyncRegistry, Callback, EventHandler, EventType, HandlerError, Registry,
    RegistryConfig,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

/// Logs every event it receives
struct AuditHandler;

#[async_trait]
impl EventHandler for AuditHandler {
    async fn handle(
        &self,
        event_type: &EventType,
        data: Option<&Value>,
    ) -> Result<(), HandlerError> {
        info!(event_type = %event_type, data = ?data, "Audit handler received event");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "AuditHandler"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init_tracing();

    let config = match RegistryConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    info!(config = ?config, "Starting pubsub demo");

    let registry: Registry = Registry::with_config(config.clone());
    let load_stack = Callback::infallible(|data: Option<&Value>| {
        info!(data = ?data, "Loading stack");
    });
    let clock = Callback::infallible(|_: Option<&Value>| info!("Clock tick"));

    registry.subscribe("App.loaded", &load_stack);
    registry.subscribe("App.done", vec![load_stack.clone(), clock]);

    let steps = [
        registry.publish("App.loaded", Some(json!({ "data": "ready" }))),
        registry.publish(["App.loaded", "App.done"], None),
        registry.unsubscribe("App.done", &load_stack),
        registry.publish("App.done", None),
    ];
    for step in steps {
        if let Err(e) = step {
            error!(error = %e, "Registry operation failed");
        }
    }

    let async_registry: AsyncRegistry = AsyncRegistry::with_config(config);
    async_registry.subscribe(["App.loaded", "App.done"], Arc::new(AuditHandler));
    if let Err(e) = async_registry
        .publish("App.done", Some(json!({ "elapsed_ms": 12 })))
        .await
    {
        error!(error = %e, "Async publish failed");
    }

    info!(
        sync_stats = ?registry.stats(),
        async_stats = ?async_registry.stats(),
        "Demo finished"
    );
}

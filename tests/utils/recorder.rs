use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use pubsub::{Callback, EventHandler, EventType, HandlerError};

// ============================================================================
// Call Recording Infrastructure
// ============================================================================

/// Shared log of `(label, payload)` pairs written by recording callbacks
#[derive(Clone, Default)]
pub struct CallRecorder {
    calls: Arc<Mutex<Vec<(String, Option<Value>)>>>,
}

#[allow(dead_code)]
impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback that appends `label` and the payload on every call
    pub fn callback(&self, label: &str) -> Callback<Value> {
        let calls = self.calls.clone();
        let label = label.to_string();
        Callback::infallible(move |data: Option<&Value>| {
            calls.lock().push((label.clone(), data.cloned()));
        })
    }

    /// Callback that records its call, then fails
    pub fn failing_callback(&self, label: &str) -> Callback<Value> {
        let calls = self.calls.clone();
        let label = label.to_string();
        Callback::new(move |data: Option<&Value>| {
            calls.lock().push((label.clone(), data.cloned()));
            Err(HandlerError::failed(format!("{label} refused the event")))
        })
    }

    pub fn handler(&self, label: &'static str) -> Arc<RecordingHandler> {
        Arc::new(RecordingHandler {
            label,
            recorder: self.clone(),
        })
    }

    pub fn labels(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(l, _)| l.clone()).collect()
    }

    pub fn payloads(&self) -> Vec<Option<Value>> {
        self.calls.lock().iter().map(|(_, p)| p.clone()).collect()
    }

    pub fn count(&self, label: &str) -> usize {
        self.calls.lock().iter().filter(|(l, _)| l == label).count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

/// Async handler that writes into a [`CallRecorder`]
pub struct RecordingHandler {
    label: &'static str,
    recorder: CallRecorder,
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(
        &self,
        _event_type: &EventType,
        data: Option<&Value>,
    ) -> Result<(), HandlerError> {
        self.recorder
            .calls
            .lock()
            .push((self.label.to_string(), data.cloned()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        self.label
    }
}

pub mod recorder;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use recorder::{CallRecorder, RecordingHandler};

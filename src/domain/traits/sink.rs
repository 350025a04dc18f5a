use std::sync::Arc;

use async_trait::async_trait;
use crate::application::errors::LogError;

/// Sink trait - append-only persistence for one record type
#[async_trait]
pub trait RecordSink<R: Send + Sync + 'static>: Send + Sync {
    async fn append(&self, record: &R) -> Result<(), LogError>;
}

/// Wraps a sink whose failures must never reach the caller.
///
/// Failures are logged at `warn` and reported only as `false`.
pub struct BestEffort<R: Send + Sync + 'static> {
    sink: Arc<dyn RecordSink<R>>,
    label: &'static str,
}

impl<R: Send + Sync + 'static> BestEffort<R> {
    pub fn new(sink: Arc<dyn RecordSink<R>>, label: &'static str) -> Self {
        Self { sink, label }
    }

    /// Returns whether the record was persisted
    pub async fn submit(&self, record: &R) -> bool {
        match self.sink.append(record).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(sink = self.label, error = %e, "Failed to persist record, continuing");
                false
            }
        }
    }
}

impl<R: Send + Sync + 'static> Clone for BestEffort<R> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            label: self.label,
        }
    }
}

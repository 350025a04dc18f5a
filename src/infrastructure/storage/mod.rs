//! Record persistence: per-day log files and an in-memory store

pub mod codec;
pub mod daily;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::errors::LogError;
use crate::domain::traits::RecordSink;

pub use daily::DailyLogStore;

/// In-memory record store, used by console mode
pub struct MemoryStore<R> {
    records: Arc<RwLock<Vec<R>>>,
}

impl<R: Clone> MemoryStore<R> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn records(&self) -> Vec<R> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

impl<R: Clone> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R> RecordSink<R> for MemoryStore<R>
where
    R: Clone + Send + Sync + 'static,
{
    async fn append(&self, record: &R) -> Result<(), LogError> {
        let mut records = self.records.write().await;
        records.push(record.clone());
        Ok(())
    }
}

//! Execution-trace and query-result persistence. Separate from
//! `ObjectStore` because trace records are structured JSON queried by
//! fingerprint and session id, not opaque blobs.

use async_trait::async_trait;

use crate::error::BoxError;
use crate::model::TraceRecord;

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn append_trace(&self, session_id: &str, record: TraceRecord) -> Result<(), BoxError>;
    async fn load_trace(&self, session_id: &str) -> Result<Vec<TraceRecord>, BoxError>;
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_doubles {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryRecordStore {
        traces: Mutex<HashMap<String, Vec<TraceRecord>>>,
    }

    impl InMemoryRecordStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl RecordStore for InMemoryRecordStore {
        async fn append_trace(&self, session_id: &str, record: TraceRecord) -> Result<(), BoxError> {
            self.traces.lock().await.entry(session_id.to_string()).or_default().push(record);
            Ok(())
        }

        async fn load_trace(&self, session_id: &str) -> Result<Vec<TraceRecord>, BoxError> {
            Ok(self.traces.lock().await.get(session_id).cloned().unwrap_or_default())
        }
    }
}

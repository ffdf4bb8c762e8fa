//! Escrow document store.

mod api;
pub use api::StorageApi;
mod firestore;
pub use firestore::FirestoreStorage;
mod memory;

use crate::types::{Address, AppId, EscrowRecord, RecordStatus};
use async_trait::async_trait;
use std::sync::Arc;

/// Escrow storage interface.
#[derive(Debug, Clone)]
pub struct EscrowStorage {
    inner: Arc<dyn StorageApi>,
}

impl EscrowStorage {
    /// Create [`EscrowStorage`] with a in-memory backend. Used for testing only.
    pub fn in_memory() -> Self {
        Self { inner: Arc::new(memory::InMemoryStorage::default()) }
    }

    /// Create [`EscrowStorage`] with a Firestore backend.
    pub fn firestore(storage: FirestoreStorage) -> Self {
        Self { inner: Arc::new(storage) }
    }
}

#[async_trait]
impl StorageApi for EscrowStorage {
    async fn read_escrow(&self, app_id: AppId) -> api::Result<Option<EscrowRecord>> {
        self.inner.read_escrow(app_id).await
    }

    async fn read_client_escrows(&self, client: &Address) -> api::Result<Vec<EscrowRecord>> {
        self.inner.read_client_escrows(client).await
    }

    async fn write_escrow(&self, record: &EscrowRecord) -> api::Result<()> {
        self.inner.write_escrow(record).await
    }

    async fn update_escrow_status(&self, app_id: AppId, status: RecordStatus) -> api::Result<()> {
        self.inner.update_escrow_status(app_id, status).await
    }
}

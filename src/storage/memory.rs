//! Document store implementation in-memory. For testing only.

use super::{StorageApi, api::Result};
use crate::{
    error::StorageError,
    types::{Address, AppId, EscrowRecord, RecordStatus},
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

/// [`StorageApi`] implementation in-memory. Used for testing
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    escrows: DashMap<AppId, EscrowRecord>,
}

#[async_trait]
impl StorageApi for InMemoryStorage {
    async fn read_escrow(&self, app_id: AppId) -> Result<Option<EscrowRecord>> {
        Ok(self.escrows.get(&app_id).map(|record| record.value().clone()))
    }

    async fn read_client_escrows(&self, client: &Address) -> Result<Vec<EscrowRecord>> {
        let mut records = self
            .escrows
            .iter()
            .filter(|record| record.client_address == *client)
            .map(|record| record.value().clone())
            .collect::<Vec<_>>();
        records.sort_by_key(|record| record.app_id);
        Ok(records)
    }

    async fn write_escrow(&self, record: &EscrowRecord) -> Result<()> {
        self.escrows.insert(record.app_id, record.clone());
        Ok(())
    }

    async fn update_escrow_status(&self, app_id: AppId, status: RecordStatus) -> Result<()> {
        let mut record =
            self.escrows.get_mut(&app_id).ok_or(StorageError::EscrowNotFound(app_id))?;
        record.status = status;
        record.updated_at = Utc::now();
        Ok(())
    }
}

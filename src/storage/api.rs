//! Document store api.

use crate::{
    error::StorageError,
    types::{Address, AppId, EscrowRecord, RecordStatus},
};
use async_trait::async_trait;
use std::fmt::Debug;

/// Type alias for `Result<T, StorageError>`
pub type Result<T> = core::result::Result<T, StorageError>;

/// Document store api.
#[async_trait]
pub trait StorageApi: Debug + Send + Sync {
    /// Reads the [`EscrowRecord`] of an application.
    async fn read_escrow(&self, app_id: AppId) -> Result<Option<EscrowRecord>>;

    /// Reads all [`EscrowRecord`]s created by `client`, ordered by application id.
    async fn read_client_escrows(&self, client: &Address) -> Result<Vec<EscrowRecord>>;

    /// Writes an [`EscrowRecord`], replacing any record of the same application.
    async fn write_escrow(&self, record: &EscrowRecord) -> Result<()>;

    /// Updates the status of an existing record.
    ///
    /// Fails with [`StorageError::EscrowNotFound`] if no record exists.
    async fn update_escrow_status(&self, app_id: AppId, status: RecordStatus) -> Result<()>;
}

//! Account persistence abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{AccountMutation, AccountRecord, AccountSet};

/// Account Set Warehouse Trait
///
/// Implementations:
/// - `JsonFileAccountRepository`: single JSON file shared between processes
/// - `MockAccountRepository` (tests): in-memory
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Get the full account set.
    ///
    /// Lenient: storage that is missing or unreadable yields an empty set.
    async fn find_all(&self) -> CoreResult<AccountSet>;

    /// Get account based on ID
    ///
    /// # Arguments
    /// * `id` - Account ID
    async fn find_by_id(&self, id: &str) -> CoreResult<Option<AccountRecord>> {
        Ok(self.find_all().await?.get(id).cloned())
    }

    /// Apply one mutation against the current durable state and persist it.
    ///
    /// The load, the mutation and the write happen under one exclusive lock;
    /// on any error the durable state is left as it was.
    ///
    /// # Arguments
    /// * `mutation` - the change to apply
    async fn apply(&self, mutation: AccountMutation) -> CoreResult<AccountRecord>;
}

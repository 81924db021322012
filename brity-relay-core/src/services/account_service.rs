//! Account service
//!
//! The operation surface used by the admin front-end and the sending workers.
//! Raw candidates are validated here before any mutation reaches the repository.

use std::sync::Arc;

use serde_json::Value;

use crate::config::StoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::storage::JsonFileAccountRepository;
use crate::traits::AccountRepository;
use crate::types::{AccountMutation, AccountRecord, AccountSummary};
use crate::validation::{normalize_record, validate_candidate};

/// Account service
pub struct AccountService {
    repository: Arc<dyn AccountRepository>,
}

impl AccountService {
    /// Create an account service instance
    #[must_use]
    pub fn new(repository: Arc<dyn AccountRepository>) -> Self {
        Self { repository }
    }

    /// Service backed by the JSON file described by `config`
    #[must_use]
    pub fn from_config(config: StoreConfig) -> Self {
        Self::new(Arc::new(JsonFileAccountRepository::new(config)))
    }

    // ===== Read operations =====

    /// List all accounts in stored order
    pub async fn list_accounts(&self) -> CoreResult<Vec<AccountRecord>> {
        Ok(self.repository.find_all().await?.into_vec())
    }

    /// List redacted account views
    pub async fn list_summaries(&self) -> CoreResult<Vec<AccountSummary>> {
        let accounts = self.repository.find_all().await?;
        Ok(accounts.iter().map(AccountSummary::from).collect())
    }

    /// List account IDs in stored order
    pub async fn list_account_ids(&self) -> CoreResult<Vec<String>> {
        let accounts = self.repository.find_all().await?;
        Ok(accounts.iter().map(|a| a.account_id.clone()).collect())
    }

    /// Get account based on ID
    pub async fn get_account(&self, account_id: &str) -> CoreResult<AccountRecord> {
        self.repository
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(account_id.to_string()))
    }

    /// First account whose email matches `email`, ignoring case and surrounding whitespace
    pub async fn find_by_email(&self, email: &str) -> CoreResult<Option<AccountRecord>> {
        let accounts = self.repository.find_all().await?;
        Ok(accounts.iter().find(|a| a.matches_email(email)).cloned())
    }

    /// Pick the account a worker should send as.
    ///
    /// Priority: explicit `account_id` → account matching `sender_email` →
    /// the selected account → the first account.
    pub async fn resolve_sender(
        &self,
        account_id: Option<&str>,
        sender_email: Option<&str>,
    ) -> CoreResult<AccountRecord> {
        let accounts = self.repository.find_all().await?;

        if let Some(id) = account_id.map(str::trim).filter(|id| !id.is_empty()) {
            return accounts
                .get(id)
                .cloned()
                .ok_or_else(|| CoreError::NotFound(id.to_string()));
        }

        if let Some(email) = sender_email.filter(|e| !e.trim().is_empty()) {
            if let Some(account) = accounts.iter().find(|a| a.matches_email(email)) {
                log::info!("Sender {email} matched account {}", account.account_id);
                return Ok(account.clone());
            }
            log::warn!("Sender {email} does not match any account, falling back");
        }

        accounts
            .selected()
            .or_else(|| accounts.iter().next())
            .cloned()
            .ok_or_else(|| CoreError::NotFound("no accounts configured".to_string()))
    }

    // ===== Mutations =====

    /// Create an account from a validated record
    pub async fn create_account(&self, record: AccountRecord) -> CoreResult<AccountRecord> {
        let record = normalize_record(record)?;
        self.commit(AccountMutation::Create(record)).await
    }

    /// Validate a raw candidate and create it
    pub async fn create_account_from_candidate(
        &self,
        candidate: &Value,
    ) -> CoreResult<AccountRecord> {
        let record = Self::validated(candidate)?;
        self.commit(AccountMutation::Create(record)).await
    }

    /// Replace the account stored under `original_id`
    ///
    /// The new record may carry a different ID as long as no other account uses it.
    pub async fn update_account(
        &self,
        original_id: &str,
        record: AccountRecord,
    ) -> CoreResult<AccountRecord> {
        let record = normalize_record(record)?;
        self.commit(AccountMutation::Update {
            original_id: original_id.to_string(),
            record,
        })
        .await
    }

    /// Validate a raw candidate and update `original_id` with it
    pub async fn update_account_from_candidate(
        &self,
        original_id: &str,
        candidate: &Value,
    ) -> CoreResult<AccountRecord> {
        let record = Self::validated(candidate)?;
        self.commit(AccountMutation::Update {
            original_id: original_id.to_string(),
            record,
        })
        .await
    }

    /// Delete account, returning the removed record
    pub async fn delete_account(&self, account_id: &str) -> CoreResult<AccountRecord> {
        self.commit(AccountMutation::Delete(account_id.to_string()))
            .await
    }

    /// Make `account_id` the only selected account
    pub async fn select_account(&self, account_id: &str) -> CoreResult<AccountRecord> {
        self.commit(AccountMutation::Select(account_id.to_string()))
            .await
    }

    /// Clear the selected flag of `account_id`
    pub async fn deselect_account(&self, account_id: &str) -> CoreResult<AccountRecord> {
        self.commit(AccountMutation::Deselect(account_id.to_string()))
            .await
    }

    fn validated(candidate: &Value) -> CoreResult<AccountRecord> {
        validate_candidate(candidate).inspect_err(|e| log::warn!("Rejected candidate: {e}"))
    }

    async fn commit(&self, mutation: AccountMutation) -> CoreResult<AccountRecord> {
        let kind = mutation.kind();
        let target = mutation.target_id().to_string();

        match self.repository.apply(mutation).await {
            Ok(record) => {
                log::info!(
                    "Account {kind} succeeded: {} ({})",
                    record.account_id,
                    record.email
                );
                Ok(record)
            }
            Err(e) => {
                if e.is_expected() {
                    log::warn!("Account {kind} of {target} failed: {e}");
                } else {
                    log::error!("Account {kind} of {target} failed: {e}");
                }
                Err(e)
            }
        }
    }
}

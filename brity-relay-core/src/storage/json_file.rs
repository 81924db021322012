//! 账号仓库
//!
//! 使用 JSON 文件存储账号集合，多个进程共享同一个文件。
//!
//! Reads go straight to the canonical file. Mutations take the exclusive lock,
//! reload the file, apply the change in memory and write the whole set to a
//! temporary sibling before renaming it over the canonical file, so a reader
//! only ever sees the old or the new complete content.

use std::io::ErrorKind;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::lock::StoreLock;
use crate::config::StoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::traits::AccountRepository;
use crate::types::{AccountMutation, AccountRecord, AccountSet};

/// 基于 JSON 文件的账号仓库
pub struct JsonFileAccountRepository {
    config: StoreConfig,
    lock: StoreLock,
    #[cfg(test)]
    fail_before_rename: AtomicBool,
}

impl JsonFileAccountRepository {
    pub fn new(config: StoreConfig) -> Self {
        let lock = StoreLock::new(
            config.lock_path(),
            config.lock_timeout,
            config.lock_retry_interval,
        );
        Self {
            config,
            lock,
            #[cfg(test)]
            fail_before_rename: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// 读取文件内容
    ///
    /// `None` for a missing or blank file; an oversized file is `Corrupt`.
    async fn read_content(&self) -> CoreResult<Option<String>> {
        let path = &self.config.path;

        let metadata = match fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CoreError::Persistence(format!(
                    "Failed to read store file metadata: {e}"
                )))
            }
        };

        if metadata.len() > self.config.max_file_size {
            return Err(CoreError::Corrupt(format!(
                "Store file too large: {} bytes (max: {} bytes)",
                metadata.len(),
                self.config.max_file_size
            )));
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| CoreError::Persistence(format!("Failed to read store file: {e}")))?;

        Ok(Some(content).filter(|c| !c.trim().is_empty()))
    }

    /// 从文件加载账号集合 (strict, used under the lock by mutations)
    async fn load_from_file(&self) -> CoreResult<AccountSet> {
        match self.read_content().await? {
            Some(content) => AccountSet::from_json(&content),
            None => Ok(AccountSet::new()),
        }
    }

    /// 从文件加载账号集合 (lenient, used by reads)
    async fn load_for_read(&self) -> CoreResult<AccountSet> {
        match self.read_content().await? {
            Some(content) => AccountSet::from_json_lenient(&content),
            None => Ok(AccountSet::new()),
        }
    }

    /// 保存账号集合到文件 (write temp → fsync → rename)
    async fn save_to_file(&self, accounts: &AccountSet) -> CoreResult<()> {
        let path = &self.config.path;
        let tmp_path = self.config.temp_path();
        let content = accounts.to_json()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                CoreError::Persistence(format!("Failed to create store directory: {e}"))
            })?;
        }

        let result = async {
            let mut file = fs::File::create(&tmp_path).await.map_err(|e| {
                CoreError::Persistence(format!("Failed to create temp file: {e}"))
            })?;
            file.write_all(content.as_bytes())
                .await
                .map_err(|e| CoreError::Persistence(format!("Failed to write temp file: {e}")))?;
            file.sync_all()
                .await
                .map_err(|e| CoreError::Persistence(format!("Failed to flush temp file: {e}")))?;
            drop(file);

            #[cfg(test)]
            if self.fail_before_rename.load(Ordering::SeqCst) {
                return Err(CoreError::Persistence(
                    "Injected failure before rename".to_string(),
                ));
            }

            fs::rename(&tmp_path, path)
                .await
                .map_err(|e| CoreError::Persistence(format!("Failed to replace store file: {e}")))
        }
        .await;

        if result.is_err() {
            if let Err(e) = fs::remove_file(&tmp_path).await {
                log::debug!("Cleanup: failed to remove {}: {e}", tmp_path.display());
            }
        }
        result
    }

    #[cfg(test)]
    fn set_fail_before_rename(&self, fail: bool) {
        self.fail_before_rename.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountRepository for JsonFileAccountRepository {
    async fn find_all(&self) -> CoreResult<AccountSet> {
        match self.load_for_read().await {
            Ok(accounts) => Ok(accounts),
            Err(e) => {
                log::warn!(
                    "Treating unreadable store {} as empty: {e}",
                    self.config.path.display()
                );
                Ok(AccountSet::new())
            }
        }
    }

    async fn apply(&self, mutation: AccountMutation) -> CoreResult<AccountRecord> {
        let kind = mutation.kind();
        let _guard = self.lock.acquire().await?;

        let mut accounts = self.load_from_file().await?;
        let record = accounts.apply(mutation)?;
        self.save_to_file(&accounts).await?;

        log::debug!(
            "Committed {kind} of {} ({} accounts)",
            record.account_id,
            accounts.len()
        );
        Ok(record)
    }
}

//! 测试辅助模块
//!
//! 提供 mock 实现和便捷的测试工厂方法。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::services::AccountService;
use crate::traits::AccountRepository;
use crate::types::{AccountMutation, AccountRecord, AccountSet};

// ===== MockAccountRepository =====

pub struct MockAccountRepository {
    accounts: RwLock<AccountSet>,
    /// 如果 Some，apply 时在保存阶段返回此错误（用于测试失败路径）
    save_error: RwLock<Option<String>>,
    apply_calls: RwLock<usize>,
}

impl MockAccountRepository {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(AccountSet::new()),
            save_error: RwLock::new(None),
            apply_calls: RwLock::new(0),
        }
    }

    pub async fn set_save_error(&self, err: Option<String>) {
        *self.save_error.write().await = err;
    }

    pub async fn apply_calls(&self) -> usize {
        *self.apply_calls.read().await
    }
}

#[async_trait]
impl AccountRepository for MockAccountRepository {
    async fn find_all(&self) -> CoreResult<AccountSet> {
        Ok(self.accounts.read().await.clone())
    }

    async fn apply(&self, mutation: AccountMutation) -> CoreResult<AccountRecord> {
        *self.apply_calls.write().await += 1;

        let mut store = self.accounts.write().await;
        let mut next = store.clone();
        let record = next.apply(mutation)?;

        if let Some(ref msg) = *self.save_error.read().await {
            return Err(CoreError::Persistence(msg.clone()));
        }
        *store = next;
        Ok(record)
    }
}

// ===== Factories =====

pub fn test_record(id: &str) -> AccountRecord {
    AccountRecord::new(id, format!("{id}@example.com")).with_header("accept", "application/json")
}

pub fn create_test_account_service() -> (AccountService, Arc<MockAccountRepository>) {
    let repo = Arc::new(MockAccountRepository::new());
    let svc = AccountService::new(repo.clone());
    (svc, repo)
}

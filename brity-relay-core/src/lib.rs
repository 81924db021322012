//! Brity Relay Core Library
//!
//! The account credential store shared by the admin front-end and the
//! sending workers:
//! - Record validation (untrusted candidates → `AccountRecord`)
//! - Account set semantics (unique IDs, at most one selected account)
//! - JSON file persistence with a cross-process lock and atomic replace
//! - `AccountService`, the operation surface callers use
//!
//! Storage is abstracted behind the `AccountRepository` trait.

pub mod config;
pub mod error;
pub mod services;
pub mod storage;
pub mod traits;
pub mod types;
pub mod validation;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use config::StoreConfig;
pub use error::{CoreError, CoreResult};
pub use services::AccountService;
pub use storage::JsonFileAccountRepository;
pub use traits::AccountRepository;
pub use types::{AccountMutation, AccountRecord, AccountSet, AccountSummary, HeaderMap};

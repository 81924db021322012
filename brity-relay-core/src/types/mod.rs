//! 类型定义模块

mod account;
mod account_set;

pub use account::{AccountRecord, AccountSummary, HeaderMap};
pub use account_set::{AccountMutation, AccountSet};

//! 存储适配器

mod json_file;
mod lock;

pub use json_file::JsonFileAccountRepository;
pub use lock::{StoreLock, StoreLockGuard};

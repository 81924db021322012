//! 业务逻辑服务层

mod account_service;

pub use account_service::AccountService;

pub mod accounts;
pub mod camps;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod health;
pub mod inventory;
pub mod models;
pub mod requests;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use error::{RaktError, Result};

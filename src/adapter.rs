pub mod app_config;
pub mod database_config;
pub mod database_error;
pub mod database_migration;
pub mod driven;
pub mod driver;

pub use app_config::{AdminAccountConfig, AppConfig, StorageKind};
pub use database_config::{ConfigError, DatabaseConfig};
pub use database_error::DatabaseError;
pub use database_migration::DatabaseMigration;

// テスト間の環境変数の競合を防ぐためのロック
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

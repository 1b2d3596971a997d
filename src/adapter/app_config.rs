use crate::adapter::database_config::ConfigError;
use crate::domain::port::LogLevel;
use std::env;

/// 永続化の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    MySql,
    /// プロセス内のみ（開発・デモ用）
    Memory,
}

/// `ADMIN_PASSWORD` が未設定のときの管理者パスワード
pub const DEFAULT_ADMIN_PASSWORD: &str = "password";

/// 起動時に作成する管理者アカウント
#[derive(Debug, Clone)]
pub struct AdminAccountConfig {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl AdminAccountConfig {
    /// 既定のパスワードのままか
    pub fn uses_default_password(&self) -> bool {
        self.password == DEFAULT_ADMIN_PASSWORD
    }
}

/// アプリケーション設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub storage: StorageKind,
    pub log_level: LogLevel,
    pub admin: AdminAccountConfig,
}

impl AppConfig {
    /// 環境変数から設定を読み取る
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue(format!("Invalid SERVER_PORT: {}", e)))?;

        let storage = match env::var("LIBRARY_STORAGE")
            .unwrap_or_else(|_| "mysql".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "mysql" => StorageKind::MySql,
            "memory" => StorageKind::Memory,
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "Invalid LIBRARY_STORAGE: {} (expected mysql or memory)",
                    other
                )))
            }
        };

        let log_level_str = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_level = LogLevel::from_string(&log_level_str).ok_or_else(|| {
            ConfigError::InvalidValue(format!("Invalid LOG_LEVEL: {}", log_level_str))
        })?;

        let admin = AdminAccountConfig {
            name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin".to_string()),
            email: env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@library.com".to_string()),
            password: env::var("ADMIN_PASSWORD")
                .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string()),
        };

        Ok(Self {
            server_host,
            server_port,
            storage,
            log_level,
            admin,
        })
    }

    /// 待ち受けアドレス
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

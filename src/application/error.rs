use crate::domain::error::DomainError;
use crate::domain::port::{PasswordHashError, RepositoryError};

/// アプリケーション層のエラー型
/// ドメインエラー、リポジトリエラー、パスワードハッシュ化エラーをラップする
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    /// ドメインエラー（ビジネスルール違反）
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),
    /// リポジトリエラー（永続化の失敗）
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
    /// パスワードのハッシュ化に失敗
    #[error("Password hashing failed: {0}")]
    PasswordHashingFailed(String),
    /// エンティティが見つからない
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<PasswordHashError> for ApplicationError {
    fn from(err: PasswordHashError) -> Self {
        ApplicationError::PasswordHashingFailed(err.0)
    }
}

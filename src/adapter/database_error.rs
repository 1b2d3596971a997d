use crate::domain::port::RepositoryError;

/// データベースエラー型
/// データベース操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatabaseError {
    /// データベース接続エラー
    #[error("Database connection error: {0}")]
    ConnectionError(String),
    /// SQLクエリエラー
    #[error("Database query error: {0}")]
    QueryError(String),
    /// マイグレーションエラー
    #[error("Migration error: {0}")]
    MigrationError(String),
    /// トランザクションの開始・確定に失敗
    #[error("Transaction error: {0}")]
    TransactionError(String),
}

/// DatabaseErrorからRepositoryErrorへの変換
impl From<DatabaseError> for RepositoryError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConnectionError(msg) => RepositoryError::ConnectionFailed(msg),
            DatabaseError::QueryError(msg)
            | DatabaseError::MigrationError(msg)
            | DatabaseError::TransactionError(msg) => RepositoryError::OperationFailed(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_repository_error() {
        let err: RepositoryError = DatabaseError::ConnectionError("refused".to_string()).into();
        assert_eq!(err, RepositoryError::ConnectionFailed("refused".to_string()));

        let err: RepositoryError = DatabaseError::TransactionError("deadlock".to_string()).into();
        assert_eq!(err, RepositoryError::OperationFailed("deadlock".to_string()));
    }
}

use crate::adapter::database_error::DatabaseError;
use crate::adapter::driven::mysql_rows::{book_from_row, rows_into, BOOK_COLUMNS};
use crate::domain::model::{Book, BookId};
use crate::domain::port::{BookRepository, RepositoryError};
use async_trait::async_trait;

// MySQL関連のインポート
use sqlx::{MySql, Pool};

/// MySQL書籍リポジトリ
/// 一覧・参照用の読み取り専用リポジトリ
#[derive(Clone)]
pub struct MySqlBookRepository {
    pool: Pool<MySql>,
}

impl MySqlBookRepository {
    /// 新しいMySQL書籍リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for MySqlBookRepository {
    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let sql = format!("SELECT {} FROM books WHERE id = ?", BOOK_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("書籍の取得に失敗しました: {}", e)))?;

        row.as_ref().map(book_from_row).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError> {
        // タイトルの昇順で並べる
        let sql = format!("SELECT {} FROM books ORDER BY title ASC", BOOK_COLUMNS);
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("書籍一覧の取得に失敗しました: {}", e))
            })?;

        rows_into(rows, book_from_row)
    }

    async fn find_available(&self) -> Result<Vec<Book>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM books WHERE available > 0 ORDER BY title ASC",
            BOOK_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("貸出可能な書籍の取得に失敗しました: {}", e))
            })?;

        rows_into(rows, book_from_row)
    }
}

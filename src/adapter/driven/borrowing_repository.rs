use crate::adapter::database_error::DatabaseError;
use crate::adapter::driven::mysql_rows::{borrowing_from_row, rows_into, BORROWING_COLUMNS};
use crate::domain::model::{Borrowing, BorrowingId, BorrowingStatus, MemberId};
use crate::domain::port::{BorrowingRepository, RepositoryError};
use async_trait::async_trait;
use sqlx::{MySql, Pool};

/// MySQL貸出リポジトリ
/// 一覧は貸出日の降順（同日は作成日時の降順）で返す
#[derive(Clone)]
pub struct MySqlBorrowingRepository {
    pool: Pool<MySql>,
}

impl MySqlBorrowingRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    fn select(condition: &str) -> String {
        format!(
            "SELECT {} FROM borrowings {} ORDER BY borrow_date DESC, created_at DESC",
            BORROWING_COLUMNS, condition
        )
    }

    fn fetch_failed(e: sqlx::Error) -> RepositoryError {
        DatabaseError::QueryError(format!("貸出一覧の取得に失敗しました: {}", e)).into()
    }
}

#[async_trait]
impl BorrowingRepository for MySqlBorrowingRepository {
    async fn find_by_id(&self, id: BorrowingId) -> Result<Option<Borrowing>, RepositoryError> {
        let sql = format!("SELECT {} FROM borrowings WHERE id = ?", BORROWING_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("貸出の取得に失敗しました: {}", e)))?;

        row.as_ref().map(borrowing_from_row).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Borrowing>, RepositoryError> {
        let rows = sqlx::query(&Self::select(""))
            .fetch_all(&self.pool)
            .await
            .map_err(Self::fetch_failed)?;
        rows_into(rows, borrowing_from_row)
    }

    async fn find_by_member(&self, member_id: MemberId) -> Result<Vec<Borrowing>, RepositoryError> {
        let rows = sqlx::query(&Self::select("WHERE member_id = ?"))
            .bind(member_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(Self::fetch_failed)?;
        rows_into(rows, borrowing_from_row)
    }

    async fn find_by_member_and_status(
        &self,
        member_id: MemberId,
        status: BorrowingStatus,
    ) -> Result<Vec<Borrowing>, RepositoryError> {
        let rows = sqlx::query(&Self::select("WHERE member_id = ? AND status = ?"))
            .bind(member_id.to_string())
            .bind(status.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(Self::fetch_failed)?;
        rows_into(rows, borrowing_from_row)
    }

    async fn find_active(&self) -> Result<Vec<Borrowing>, RepositoryError> {
        let rows = sqlx::query(&Self::select("WHERE status = 'borrowed'"))
            .fetch_all(&self.pool)
            .await
            .map_err(Self::fetch_failed)?;
        rows_into(rows, borrowing_from_row)
    }
}

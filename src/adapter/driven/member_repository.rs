use crate::adapter::database_error::DatabaseError;
use crate::adapter::driven::mysql_rows::{member_from_row, rows_into, MEMBER_COLUMNS};
use crate::domain::model::{Member, MemberId};
use crate::domain::port::{MemberRepository, RepositoryError};
use async_trait::async_trait;
use sqlx::{MySql, Pool};

/// MySQL会員リポジトリ
#[derive(Clone)]
pub struct MySqlMemberRepository {
    pool: Pool<MySql>,
}

impl MySqlMemberRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    async fn fetch_all(&self, sql: &str) -> Result<Vec<Member>, RepositoryError> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("会員一覧の取得に失敗しました: {}", e))
            })?;
        rows_into(rows, member_from_row)
    }
}

#[async_trait]
impl MemberRepository for MySqlMemberRepository {
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, RepositoryError> {
        let sql = format!("SELECT {} FROM members WHERE id = ?", MEMBER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("会員の取得に失敗しました: {}", e)))?;

        row.as_ref().map(member_from_row).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Member>, RepositoryError> {
        let sql = format!("SELECT {} FROM members ORDER BY name ASC", MEMBER_COLUMNS);
        self.fetch_all(&sql).await
    }

    async fn find_borrowers(&self) -> Result<Vec<Member>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM members WHERE role = 'member' AND can_borrow = TRUE ORDER BY name ASC",
            MEMBER_COLUMNS
        );
        self.fetch_all(&sql).await
    }
}

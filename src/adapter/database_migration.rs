use crate::adapter::database_error::DatabaseError;
use crate::domain::port::Logger;
use sqlx::{MySql, Pool};
use std::sync::Arc;

/// データベースマイグレーションを管理する構造体
pub struct DatabaseMigration {
    pool: Pool<MySql>,
    logger: Arc<dyn Logger>,
}

impl DatabaseMigration {
    const COMPONENT: &'static str = "DatabaseMigration";

    /// 新しいDatabaseMigrationインスタンスを作成
    pub fn new(pool: Pool<MySql>, logger: Arc<dyn Logger>) -> Self {
        Self { pool, logger }
    }

    /// マイグレーションを実行
    /// べき等性を保証（CREATE TABLE IF NOT EXISTS）
    /// 外部キーの参照先を先に作成する
    pub async fn run(&self) -> Result<(), DatabaseError> {
        let migrations = [
            include_str!("../../migrations/001_create_members_table.sql"),
            include_str!("../../migrations/002_create_books_table.sql"),
            include_str!("../../migrations/003_create_borrowings_table.sql"),
        ];

        for (index, migration_sql) in migrations.iter().enumerate() {
            sqlx::query(migration_sql)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    DatabaseError::MigrationError(format!("Migration {} failed: {}", index + 1, e))
                })?;
            self.logger.debug(
                Self::COMPONENT,
                &format!("Migration {} completed", index + 1),
                None,
                None,
            );
        }

        self.logger
            .info(Self::COMPONENT, "All migrations completed", None, None);
        Ok(())
    }
}

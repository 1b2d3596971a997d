use crate::adapter::database_error::DatabaseError;
use crate::adapter::driven::mysql_rows::{
    book_from_row, borrowing_from_row, member_from_row, BOOK_COLUMNS, BORROWING_COLUMNS,
    MEMBER_COLUMNS,
};
use crate::domain::model::{Book, BookId, Borrowing, BorrowingId, Email, Isbn, Member, MemberId};
use crate::domain::port::{LibraryStore, LibraryTransaction, RepositoryError};
use async_trait::async_trait;
use sqlx::{MySql, Pool, Row, Transaction};

fn query_failed(action: &str, e: sqlx::Error) -> RepositoryError {
    DatabaseError::QueryError(format!("{}に失敗しました: {}", action, e)).into()
}

/// MySQLライブラリストア
/// トランザクション内の読み込みは `SELECT ... FOR UPDATE` で行をロックする
#[derive(Clone)]
pub struct MySqlLibraryStore {
    pool: Pool<MySql>,
}

impl MySqlLibraryStore {
    /// 新しいMySQLライブラリストアを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LibraryStore for MySqlLibraryStore {
    async fn begin(&self) -> Result<Box<dyn LibraryTransaction>, RepositoryError> {
        let tx = self.pool.begin().await.map_err(|e| {
            RepositoryError::from(DatabaseError::TransactionError(format!(
                "トランザクションの開始に失敗しました: {}",
                e
            )))
        })?;
        Ok(Box::new(MySqlLibraryTransaction { tx }))
    }
}

/// MySQLトランザクション
/// コミットせずに破棄するとsqlxがロールバックする
pub struct MySqlLibraryTransaction {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl LibraryTransaction for MySqlLibraryTransaction {
    async fn find_book(&mut self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let sql = format!("SELECT {} FROM books WHERE id = ? FOR UPDATE", BOOK_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| query_failed("書籍の取得", e))?;
        row.as_ref().map(book_from_row).transpose()
    }

    async fn save_book(&mut self, book: &Book) -> Result<(), RepositoryError> {
        let details = book.details();
        sqlx::query(
            r#"
            INSERT INTO books
                (id, title, author, isbn, description, cover_image, quantity, available)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                title = VALUES(title),
                author = VALUES(author),
                isbn = VALUES(isbn),
                description = VALUES(description),
                cover_image = VALUES(cover_image),
                quantity = VALUES(quantity),
                available = VALUES(available)
            "#,
        )
        .bind(book.id().to_string())
        .bind(details.title())
        .bind(details.author())
        .bind(details.isbn().as_str())
        .bind(details.description())
        .bind(details.cover_image().map(|url| url.as_str().to_string()))
        .bind(book.quantity())
        .bind(book.available())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| query_failed("書籍の保存", e))?;
        Ok(())
    }

    async fn delete_book(&mut self, id: BookId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| query_failed("書籍の削除", e))?;
        Ok(())
    }

    async fn isbn_exists(
        &mut self,
        isbn: &Isbn,
        excluding: Option<BookId>,
    ) -> Result<bool, RepositoryError> {
        let excluded = excluding.map(|id| id.to_string()).unwrap_or_default();
        let row = sqlx::query("SELECT COUNT(*) AS count FROM books WHERE isbn = ? AND id <> ?")
            .bind(isbn.as_str())
            .bind(excluded)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| query_failed("ISBNの検査", e))?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn find_member(&mut self, id: MemberId) -> Result<Option<Member>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM members WHERE id = ? FOR UPDATE",
            MEMBER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| query_failed("会員の取得", e))?;
        row.as_ref().map(member_from_row).transpose()
    }

    async fn save_member(&mut self, member: &Member) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO members (id, name, email, password, role, can_borrow)
            VALUES (?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                name = VALUES(name),
                email = VALUES(email),
                password = VALUES(password),
                role = VALUES(role),
                can_borrow = VALUES(can_borrow)
            "#,
        )
        .bind(member.id().to_string())
        .bind(member.name())
        .bind(member.email().as_str())
        .bind(member.credential().as_str())
        .bind(member.role().to_string())
        .bind(member.can_borrow())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| query_failed("会員の保存", e))?;
        Ok(())
    }

    async fn email_exists(&mut self, email: &Email) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM members WHERE email = ?")
            .bind(email.as_str())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| query_failed("メールアドレスの検査", e))?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn find_borrowing(
        &mut self,
        id: BorrowingId,
    ) -> Result<Option<Borrowing>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM borrowings WHERE id = ? FOR UPDATE",
            BORROWING_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| query_failed("貸出の取得", e))?;
        row.as_ref().map(borrowing_from_row).transpose()
    }

    async fn save_borrowing(&mut self, borrowing: &Borrowing) -> Result<(), RepositoryError> {
        // 貸出日・返却期限は作成時にのみ書き込む
        sqlx::query(
            r#"
            INSERT INTO borrowings
                (id, member_id, book_id, borrow_date, due_date, return_date, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                return_date = VALUES(return_date),
                status = VALUES(status)
            "#,
        )
        .bind(borrowing.id().to_string())
        .bind(borrowing.member_id().to_string())
        .bind(borrowing.book_id().to_string())
        .bind(borrowing.borrow_date())
        .bind(borrowing.due_date())
        .bind(borrowing.return_date())
        .bind(borrowing.status().to_string())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| query_failed("貸出の保存", e))?;
        Ok(())
    }

    async fn count_active_borrowings_for_book(
        &mut self,
        book_id: BookId,
    ) -> Result<u32, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM borrowings WHERE book_id = ? AND status = 'borrowed'",
        )
        .bind(book_id.to_string())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| query_failed("貸出件数の取得", e))?;
        count_from_row(&row)
    }

    async fn count_active_borrowings_for_member(
        &mut self,
        member_id: MemberId,
    ) -> Result<u32, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM borrowings WHERE member_id = ? AND status = 'borrowed'",
        )
        .bind(member_id.to_string())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| query_failed("貸出件数の取得", e))?;
        count_from_row(&row)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await.map_err(|e| {
            DatabaseError::TransactionError(format!(
                "トランザクションの確定に失敗しました: {}",
                e
            ))
            .into()
        })
    }
}

fn count_from_row(row: &sqlx::mysql::MySqlRow) -> Result<u32, RepositoryError> {
    let count: i64 = row.get("count");
    u32::try_from(count)
        .map_err(|e| RepositoryError::FetchFailed(format!("件数が範囲外です: {}", e)))
}

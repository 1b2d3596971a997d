// MySQLの行からドメインモデルを再構築する
// 不変条件を満たさない行は破損データとして拒否する

use crate::domain::model::{
    Book, BookDetails, BookId, Borrowing, BorrowingId, BorrowingStatus, CoverImageUrl, Email,
    Isbn, Member, MemberId, PasswordCredential, Role,
};
use crate::domain::port::RepositoryError;
use chrono::NaiveDate;
use sqlx::mysql::MySqlRow;
use sqlx::Row;

pub(super) const BOOK_COLUMNS: &str =
    "id, title, author, isbn, description, cover_image, quantity, available";

pub(super) const MEMBER_COLUMNS: &str = "id, name, email, password, role, can_borrow";

pub(super) const BORROWING_COLUMNS: &str =
    "id, member_id, book_id, borrow_date, due_date, return_date, status";

fn column<'r, T>(row: &'r MySqlRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::MySql> + sqlx::Type<sqlx::MySql>,
{
    row.try_get(name).map_err(|e| {
        RepositoryError::FetchFailed(format!("カラム {} の取得に失敗しました: {}", name, e))
    })
}

fn corrupt(entity: &str, e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::FetchFailed(format!("{}データが不正です: {}", entity, e))
}

pub(super) fn book_from_row(row: &MySqlRow) -> Result<Book, RepositoryError> {
    let id = BookId::from_string(&column::<String>(row, "id")?).map_err(|e| corrupt("書籍", e))?;
    let isbn = Isbn::new(column(row, "isbn")?).map_err(|e| corrupt("書籍", e))?;
    let cover_image = column::<Option<String>>(row, "cover_image")?
        .map(CoverImageUrl::new)
        .transpose()
        .map_err(|e| corrupt("書籍", e))?;
    let details = BookDetails::new(
        column(row, "title")?,
        column(row, "author")?,
        isbn,
        column(row, "description")?,
        cover_image,
    )
    .map_err(|e| corrupt("書籍", e))?;

    Book::reconstruct(
        id,
        details,
        column(row, "quantity")?,
        column(row, "available")?,
    )
    .map_err(|e| corrupt("書籍", e))
}

pub(super) fn member_from_row(row: &MySqlRow) -> Result<Member, RepositoryError> {
    let id =
        MemberId::from_string(&column::<String>(row, "id")?).map_err(|e| corrupt("会員", e))?;
    let email = Email::new(column(row, "email")?).map_err(|e| corrupt("会員", e))?;
    let role = Role::from_string(&column::<String>(row, "role")?).map_err(|e| corrupt("会員", e))?;

    Ok(Member::reconstruct(
        id,
        column(row, "name")?,
        email,
        PasswordCredential::new(column(row, "password")?),
        role,
        column(row, "can_borrow")?,
    ))
}

pub(super) fn borrowing_from_row(row: &MySqlRow) -> Result<Borrowing, RepositoryError> {
    let id = BorrowingId::from_string(&column::<String>(row, "id")?)
        .map_err(|e| corrupt("貸出", e))?;
    let member_id = MemberId::from_string(&column::<String>(row, "member_id")?)
        .map_err(|e| corrupt("貸出", e))?;
    let book_id = BookId::from_string(&column::<String>(row, "book_id")?)
        .map_err(|e| corrupt("貸出", e))?;
    let status = BorrowingStatus::from_string(&column::<String>(row, "status")?)
        .map_err(|e| corrupt("貸出", e))?;

    Borrowing::reconstruct(
        id,
        member_id,
        book_id,
        column::<NaiveDate>(row, "borrow_date")?,
        column::<NaiveDate>(row, "due_date")?,
        column::<Option<NaiveDate>>(row, "return_date")?,
        status,
    )
    .map_err(|e| corrupt("貸出", e))
}

pub(super) fn rows_into<T>(
    rows: Vec<MySqlRow>,
    map: fn(&MySqlRow) -> Result<T, RepositoryError>,
) -> Result<Vec<T>, RepositoryError> {
    rows.iter().map(map).collect()
}

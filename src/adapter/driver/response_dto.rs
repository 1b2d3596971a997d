use crate::application::service::{BorrowingHistory, MemberSummary};
use crate::domain::model::{Book, Borrowing, Member};
use crate::domain::reminder::{self, LoanStanding, DEFAULT_DUE_SOON_WINDOW_DAYS};
use chrono::NaiveDate;
use serde::Serialize;

/// 書籍用のレスポンスDTO
#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub description: String,
    pub cover_image: Option<String>,
    pub quantity: u32,
    pub available: u32,
    pub on_loan: u32,
}

impl BookResponse {
    /// ドメインオブジェクトからBookResponseを作成
    pub fn from_book(book: &Book) -> Self {
        let details = book.details();
        Self {
            id: book.id().to_string(),
            title: details.title().to_string(),
            author: details.author().to_string(),
            isbn: details.isbn().to_string(),
            description: details.description().to_string(),
            cover_image: details.cover_image().map(|url| url.as_str().to_string()),
            quantity: book.quantity(),
            available: book.available(),
            on_loan: book.on_loan(),
        }
    }
}

/// 会員用のレスポンスDTO
/// パスワードは含めない
#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub can_borrow: bool,
}

impl MemberResponse {
    pub fn from_member(member: &Member) -> Self {
        Self {
            id: member.id().to_string(),
            name: member.name().to_string(),
            email: member.email().to_string(),
            role: member.role().to_string(),
            can_borrow: member.can_borrow(),
        }
    }
}

/// 会員一覧用のレスポンスDTO（貸出件数付き）
#[derive(Debug, Serialize)]
pub struct MemberSummaryResponse {
    #[serde(flatten)]
    pub member: MemberResponse,
    pub total_borrowings: u32,
    pub active_borrowings: u32,
}

impl MemberSummaryResponse {
    pub fn from_summary(summary: &MemberSummary) -> Self {
        Self {
            member: MemberResponse::from_member(&summary.member),
            total_borrowings: summary.total_borrowings,
            active_borrowings: summary.active_borrowings,
        }
    }
}

/// 貸出用のレスポンスDTO
/// 表示用の状態は今日の日付で判定する
#[derive(Debug, Serialize)]
pub struct BorrowingResponse {
    pub id: String,
    pub member_id: String,
    pub book_id: String,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: String,
    pub standing: LoanStanding,
    pub is_overdue: bool,
    /// 貸出中のみ（延滞中は負の値）
    pub days_until_due: Option<i64>,
}

impl BorrowingResponse {
    pub fn from_borrowing(borrowing: &Borrowing, today: NaiveDate) -> Self {
        Self {
            id: borrowing.id().to_string(),
            member_id: borrowing.member_id().to_string(),
            book_id: borrowing.book_id().to_string(),
            borrow_date: borrowing.borrow_date(),
            due_date: borrowing.due_date(),
            return_date: borrowing.return_date(),
            status: borrowing.status().to_string(),
            standing: reminder::loan_standing(borrowing, today, DEFAULT_DUE_SOON_WINDOW_DAYS),
            is_overdue: borrowing.is_overdue(today),
            days_until_due: borrowing
                .is_active()
                .then(|| borrowing.days_until_due(today)),
        }
    }

    pub fn from_borrowings(borrowings: &[Borrowing], today: NaiveDate) -> Vec<Self> {
        borrowings
            .iter()
            .map(|b| Self::from_borrowing(b, today))
            .collect()
    }
}

/// 会員の貸出履歴用のレスポンスDTO
#[derive(Debug, Serialize)]
pub struct BorrowingHistoryResponse {
    pub active: Vec<BorrowingResponse>,
    pub returned: Vec<BorrowingResponse>,
}

impl BorrowingHistoryResponse {
    pub fn from_history(history: &BorrowingHistory, today: NaiveDate) -> Self {
        Self {
            active: BorrowingResponse::from_borrowings(&history.active, today),
            returned: BorrowingResponse::from_borrowings(&history.returned, today),
        }
    }
}

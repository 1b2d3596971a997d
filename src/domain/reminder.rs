// 延滞・リマインダー判定
// 貸出と今日の日付のみから判定する純粋関数

use crate::domain::model::{Borrowing, BorrowingStatus};
use chrono::NaiveDate;
use serde::Serialize;

/// 返却期限が近いとみなす日数の既定値
pub const DEFAULT_DUE_SOON_WINDOW_DAYS: i64 = 3;

/// リマインダーの窓として受け付ける最大日数
pub const MAX_DUE_SOON_WINDOW_DAYS: i64 = 365;

/// 貸出の表示用の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStanding {
    OnLoan,
    DueSoon,
    Overdue,
    Returned,
    ReturnedLate,
}

/// 貸出の表示用の状態を判定
pub fn loan_standing(borrowing: &Borrowing, today: NaiveDate, window_days: i64) -> LoanStanding {
    match borrowing.status() {
        BorrowingStatus::Returned if borrowing.is_returned_late() => LoanStanding::ReturnedLate,
        BorrowingStatus::Returned => LoanStanding::Returned,
        BorrowingStatus::Borrowed if borrowing.is_overdue(today) => LoanStanding::Overdue,
        BorrowingStatus::Borrowed if borrowing.is_due_soon(today, window_days) => {
            LoanStanding::DueSoon
        }
        BorrowingStatus::Borrowed => LoanStanding::OnLoan,
    }
}

/// 返却期限が近い貸出を返却期限の昇順で返す
pub fn due_soon_reminders<'a>(
    borrowings: &'a [Borrowing],
    today: NaiveDate,
    window_days: i64,
) -> Vec<&'a Borrowing> {
    let mut reminders: Vec<&Borrowing> = borrowings
        .iter()
        .filter(|b| b.is_due_soon(today, window_days))
        .collect();
    reminders.sort_by_key(|b| b.due_date());
    reminders
}

/// 延滞中の貸出を返す
pub fn overdue_borrowings(borrowings: &[Borrowing], today: NaiveDate) -> Vec<&Borrowing> {
    borrowings.iter().filter(|b| b.is_overdue(today)).collect()
}

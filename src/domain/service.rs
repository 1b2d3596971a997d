// ドメインサービス
// 複数の集約にまたがるビジネスロジックを実装

use crate::domain::error::DomainError;
use crate::domain::model::{Book, Borrowing, BorrowingId, Member};
use crate::domain::policy;
use chrono::NaiveDate;

/// 貸出ライフサイクル
/// 貸出の作成・返却と書籍の貸出可能数の増減を組で行う
///
/// 永続化は呼び出し側が同一トランザクション内で行う
pub struct BorrowingLifecycle;

impl BorrowingLifecycle {
    /// 貸出を作成し、書籍の貸出可能数を1減らす
    ///
    /// # Arguments
    /// * `member` - 借りる会員
    /// * `book` - 貸し出す書籍
    /// * `borrow_date` - 貸出日
    ///
    /// # Returns
    /// * `Ok(Borrowing)` - 作成された貸出（返却期限は貸出日の7日後）
    /// * `Err(DomainError::NotAuthorized)` - 会員の貸出が停止されている
    /// * `Err(DomainError::Unavailable)` - 貸出可能な在庫がない
    /// * `Err(DomainError::InvalidValue)` - 返却期限が日付の表現範囲を超える（在庫は変更しない）
    pub fn create_borrowing(
        member: &Member,
        book: &mut Book,
        borrow_date: NaiveDate,
    ) -> Result<Borrowing, DomainError> {
        policy::ensure_can_borrow(member)?;
        policy::ensure_available(book)?;

        let borrowing = Borrowing::open(BorrowingId::new(), member.id(), book.id(), borrow_date)?;
        book.decrement_availability()?;
        Ok(borrowing)
    }

    /// 会員自身が今日の日付で借りる
    pub fn quick_borrow(
        member: &Member,
        book: &mut Book,
        today: NaiveDate,
    ) -> Result<Borrowing, DomainError> {
        Self::create_borrowing(member, book, today)
    }

    /// 貸出を返却済みにし、書籍の貸出可能数を1増やす
    ///
    /// # Returns
    /// * `Ok(())` - 返却成功
    /// * `Err(DomainError::AlreadyReturned)` - 既に返却済み（貸出可能数は変更しない）
    pub fn return_borrowing(
        borrowing: &mut Borrowing,
        book: &mut Book,
        today: NaiveDate,
    ) -> Result<(), DomainError> {
        if borrowing.book_id() != book.id() {
            return Err(DomainError::InvalidState(format!(
                "貸出 {} は書籍 {} のものではありません",
                borrowing.id(),
                book.id()
            )));
        }
        if !borrowing.is_active() {
            return Err(DomainError::AlreadyReturned);
        }

        // 書籍側の検査を先に行い、失敗時に貸出を変更しない
        book.increment_availability()?;
        borrowing.mark_returned(today)
    }
}

use crate::domain::error::DomainError;
use crate::domain::model::{BookId, BorrowingId, BorrowingStatus, MemberId};
use chrono::{Days, Duration, NaiveDate};

/// 貸出期間（日数）
pub const LOAN_PERIOD_DAYS: i64 = 7;

/// 貸出集約
/// 状態遷移: Borrowed → Returned（終端）
///
/// 貸出日は作成時にのみ設定され、変更する手段はない
#[derive(Debug, Clone, PartialEq)]
pub struct Borrowing {
    id: BorrowingId,
    member_id: MemberId,
    book_id: BookId,
    borrow_date: NaiveDate,
    due_date: NaiveDate,
    return_date: Option<NaiveDate>,
    status: BorrowingStatus,
}

impl Borrowing {
    /// 新しい貸出を開始する
    /// 在庫の減算と組で行う必要があるため、ドメインサービスからのみ呼び出す
    ///
    /// # Returns
    /// * `Ok(Borrowing)` - 貸出中の貸出
    /// * `Err(DomainError::InvalidValue)` - 返却期限が日付の表現範囲を超える
    pub(crate) fn open(
        id: BorrowingId,
        member_id: MemberId,
        book_id: BookId,
        borrow_date: NaiveDate,
    ) -> Result<Self, DomainError> {
        let due_date = Self::due_date_for(borrow_date).ok_or_else(|| {
            DomainError::InvalidValue(format!("Borrow date {} is out of range", borrow_date))
        })?;
        Ok(Self {
            id,
            member_id,
            book_id,
            borrow_date,
            due_date,
            return_date: None,
            status: BorrowingStatus::Borrowed,
        })
    }

    /// データベースから取得したデータで貸出を再構築
    ///
    /// # Returns
    /// * `Ok(Borrowing)` - 再構築成功
    /// * `Err(DomainError::InvalidState)` - 期限日・返却日・ステータスの整合性が取れていない
    pub fn reconstruct(
        id: BorrowingId,
        member_id: MemberId,
        book_id: BookId,
        borrow_date: NaiveDate,
        due_date: NaiveDate,
        return_date: Option<NaiveDate>,
        status: BorrowingStatus,
    ) -> Result<Self, DomainError> {
        if Self::due_date_for(borrow_date) != Some(due_date) {
            return Err(DomainError::InvalidState(format!(
                "貸出 {} の返却期限が貸出日から{}日後ではありません",
                id, LOAN_PERIOD_DAYS
            )));
        }
        match (status, return_date) {
            (BorrowingStatus::Borrowed, None) | (BorrowingStatus::Returned, Some(_)) => {}
            _ => {
                return Err(DomainError::InvalidState(format!(
                    "貸出 {} の返却日とステータスが一致しません",
                    id
                )))
            }
        }
        Ok(Self {
            id,
            member_id,
            book_id,
            borrow_date,
            due_date,
            return_date,
            status,
        })
    }

    fn due_date_for(borrow_date: NaiveDate) -> Option<NaiveDate> {
        borrow_date.checked_add_signed(Duration::days(LOAN_PERIOD_DAYS))
    }

    pub fn id(&self) -> BorrowingId {
        self.id
    }

    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn borrow_date(&self) -> NaiveDate {
        self.borrow_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn return_date(&self) -> Option<NaiveDate> {
        self.return_date
    }

    pub fn status(&self) -> BorrowingStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == BorrowingStatus::Borrowed
    }

    /// 返却済みにする
    /// 在庫の加算と組で行う必要があるため、ドメインサービスからのみ呼び出す
    pub(crate) fn mark_returned(&mut self, today: NaiveDate) -> Result<(), DomainError> {
        match self.status {
            BorrowingStatus::Borrowed => {
                self.status = BorrowingStatus::Returned;
                self.return_date = Some(today);
                Ok(())
            }
            BorrowingStatus::Returned => Err(DomainError::AlreadyReturned),
        }
    }

    /// 延滞中か（貸出中で、今日が返却期限を過ぎている）
    /// 返却期限当日は延滞に含まない
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_active() && today > self.due_date
    }

    /// 返却期限を過ぎて返却されたか
    pub fn is_returned_late(&self) -> bool {
        match (self.status, self.return_date) {
            (BorrowingStatus::Returned, Some(returned)) => returned > self.due_date,
            _ => false,
        }
    }

    /// 返却期限までの日数（延滞中は負の値）
    pub fn days_until_due(&self, today: NaiveDate) -> i64 {
        (self.due_date - today).num_days()
    }

    /// 返却期限が近いか（今日 < 返却期限 <= 今日 + window_days）
    /// 窓の終端が日付の表現範囲を超える場合は近いとみなさない
    pub fn is_due_soon(&self, today: NaiveDate, window_days: i64) -> bool {
        let window_end = u64::try_from(window_days)
            .ok()
            .and_then(|days| today.checked_add_days(Days::new(days)));
        match window_end {
            Some(end) => self.is_active() && today < self.due_date && self.due_date <= end,
            None => false,
        }
    }
}

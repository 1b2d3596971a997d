use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{Actor, Borrowing, BorrowingId, BorrowingStatus, MemberId};
use crate::domain::port::{BorrowingRepository, Clock};
use crate::domain::reminder;
use chrono::NaiveDate;
use std::sync::Arc;

/// 貸出一覧の絞り込み条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowingFilter {
    Borrowed,
    Returned,
    /// 貸出中かつ返却期限切れ
    Overdue,
}

impl BorrowingFilter {
    /// 文字列からBorrowingFilterを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "borrowed" => Ok(BorrowingFilter::Borrowed),
            "returned" => Ok(BorrowingFilter::Returned),
            "overdue" => Ok(BorrowingFilter::Overdue),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な絞り込み条件: {}",
                s
            ))),
        }
    }

    fn matches(&self, borrowing: &Borrowing, today: NaiveDate) -> bool {
        match self {
            BorrowingFilter::Borrowed => borrowing.status() == BorrowingStatus::Borrowed,
            BorrowingFilter::Returned => borrowing.status() == BorrowingStatus::Returned,
            BorrowingFilter::Overdue => borrowing.is_overdue(today),
        }
    }
}

/// 会員の貸出履歴
#[derive(Debug, Clone, Default)]
pub struct BorrowingHistory {
    pub active: Vec<Borrowing>,
    pub returned: Vec<Borrowing>,
}

/// 貸出クエリサービス
/// 管理者はすべての貸出を、一般会員は自分の貸出のみ参照できる
pub struct BorrowingQueryService {
    borrowing_repository: Arc<dyn BorrowingRepository>,
    clock: Arc<dyn Clock>,
}

impl BorrowingQueryService {
    pub fn new(borrowing_repository: Arc<dyn BorrowingRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            borrowing_repository,
            clock,
        }
    }

    /// 判定に使う今日の日付
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// 貸出一覧（貸出日の降順）
    ///
    /// # Arguments
    /// * `actor` - 操作者（一般会員は自分の貸出のみ）
    /// * `filter` - 絞り込み条件
    pub async fn list_borrowings(
        &self,
        actor: &Actor,
        filter: Option<BorrowingFilter>,
    ) -> Result<Vec<Borrowing>, ApplicationError> {
        let borrowings = if actor.is_admin() {
            self.borrowing_repository.find_all().await?
        } else {
            self.borrowing_repository
                .find_by_member(actor.member_id())
                .await?
        };

        let today = self.today();
        Ok(match filter {
            Some(filter) => borrowings
                .into_iter()
                .filter(|b| filter.matches(b, today))
                .collect(),
            None => borrowings,
        })
    }

    /// 貸出を取得（管理者または借りた本人）
    pub async fn get_borrowing(
        &self,
        actor: &Actor,
        borrowing_id: BorrowingId,
    ) -> Result<Borrowing, ApplicationError> {
        let borrowing = self
            .borrowing_repository
            .find_by_id(borrowing_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("貸出が見つかりません: {}", borrowing_id))
            })?;
        actor.require_self_or_admin(borrowing.member_id())?;
        Ok(borrowing)
    }

    /// 会員の貸出履歴を貸出中と返却済みに分けて取得
    pub async fn member_history(
        &self,
        actor: &Actor,
        member_id: MemberId,
    ) -> Result<BorrowingHistory, ApplicationError> {
        actor.require_self_or_admin(member_id)?;

        let active = self
            .borrowing_repository
            .find_by_member_and_status(member_id, BorrowingStatus::Borrowed)
            .await?;
        let returned = self
            .borrowing_repository
            .find_by_member_and_status(member_id, BorrowingStatus::Returned)
            .await?;
        Ok(BorrowingHistory { active, returned })
    }

    /// 返却期限が近い貸出（返却期限の昇順）
    pub async fn due_soon_reminders(
        &self,
        actor: &Actor,
        member_id: MemberId,
        window_days: i64,
    ) -> Result<Vec<Borrowing>, ApplicationError> {
        actor.require_self_or_admin(member_id)?;

        let active = self
            .borrowing_repository
            .find_by_member_and_status(member_id, BorrowingStatus::Borrowed)
            .await?;
        Ok(reminder::due_soon_reminders(&active, self.today(), window_days)
            .into_iter()
            .cloned()
            .collect())
    }

    /// 延滞中の貸出（管理者のみ）
    pub async fn overdue_borrowings(
        &self,
        actor: &Actor,
    ) -> Result<Vec<Borrowing>, ApplicationError> {
        actor.require_admin()?;

        let active = self.borrowing_repository.find_active().await?;
        Ok(reminder::overdue_borrowings(&active, self.today())
            .into_iter()
            .cloned()
            .collect())
    }
}

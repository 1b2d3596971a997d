use crate::application::ApplicationError;
use crate::domain::model::{Actor, Member, MemberId};
use crate::domain::port::{BorrowingRepository, MemberRepository};
use std::collections::HashMap;
use std::sync::Arc;

/// 会員と貸出件数の集計
#[derive(Debug, Clone)]
pub struct MemberSummary {
    pub member: Member,
    pub total_borrowings: u32,
    pub active_borrowings: u32,
}

/// 会員クエリサービス
pub struct MemberQueryService {
    member_repository: Arc<dyn MemberRepository>,
    borrowing_repository: Arc<dyn BorrowingRepository>,
}

impl MemberQueryService {
    pub fn new(
        member_repository: Arc<dyn MemberRepository>,
        borrowing_repository: Arc<dyn BorrowingRepository>,
    ) -> Self {
        Self {
            member_repository,
            borrowing_repository,
        }
    }

    /// 会員を取得（管理者または本人）
    pub async fn get_member(
        &self,
        actor: &Actor,
        member_id: MemberId,
    ) -> Result<Member, ApplicationError> {
        actor.require_self_or_admin(member_id)?;
        self.find_member(member_id).await
    }

    /// 操作者の会員情報を取得
    /// HTTP境界での操作者の特定に使う
    pub async fn find_member(&self, member_id: MemberId) -> Result<Member, ApplicationError> {
        self.member_repository
            .find_by_id(member_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("会員が見つかりません: {}", member_id))
            })
    }

    /// 会員一覧と貸出件数（管理者のみ）
    ///
    /// # Returns
    /// * `Ok(Vec<MemberSummary>)` - 名前の昇順
    pub async fn list_members_with_counts(
        &self,
        actor: &Actor,
    ) -> Result<Vec<MemberSummary>, ApplicationError> {
        actor.require_admin()?;

        let members = self.member_repository.find_all().await?;
        let borrowings = self.borrowing_repository.find_all().await?;

        // 会員ごとに (総数, 貸出中) を集計
        let mut counts: HashMap<MemberId, (u32, u32)> = HashMap::new();
        for borrowing in &borrowings {
            let entry = counts.entry(borrowing.member_id()).or_insert((0, 0));
            entry.0 += 1;
            if borrowing.is_active() {
                entry.1 += 1;
            }
        }

        Ok(members
            .into_iter()
            .map(|member| {
                let (total, active) = counts.get(&member.id()).copied().unwrap_or((0, 0));
                MemberSummary {
                    member,
                    total_borrowings: total,
                    active_borrowings: active,
                }
            })
            .collect())
    }

    /// 貸出可能な一般会員（貸出記録フォームの選択肢）
    pub async fn eligible_borrowers(&self, actor: &Actor) -> Result<Vec<Member>, ApplicationError> {
        actor.require_admin()?;
        self.member_repository
            .find_borrowers()
            .await
            .map_err(ApplicationError::from)
    }
}

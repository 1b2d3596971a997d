use crate::domain::error::DomainError;
use crate::domain::model::{Email, MemberId, PasswordCredential, Role};
use crate::domain::policy;

/// 会員集約
/// 役割と貸出許可フラグを管理する
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    id: MemberId,
    name: String,
    email: Email,
    credential: PasswordCredential,
    role: Role,
    can_borrow: bool,
}

impl Member {
    pub const MAX_NAME_LENGTH: usize = 255;

    /// 会員登録
    /// 登録直後は一般会員で貸出可能
    pub fn register(
        id: MemberId,
        name: String,
        email: Email,
        credential: PasswordCredential,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            name: Self::validate_name(name)?,
            email,
            credential,
            role: Role::Member,
            can_borrow: true,
        })
    }

    /// 管理者アカウントを作成
    /// 管理者自身は貸出を行わない
    pub fn admin(
        id: MemberId,
        name: String,
        email: Email,
        credential: PasswordCredential,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            name: Self::validate_name(name)?,
            email,
            credential,
            role: Role::Admin,
            can_borrow: false,
        })
    }

    /// データベースから取得したデータで会員を再構築
    pub fn reconstruct(
        id: MemberId,
        name: String,
        email: Email,
        credential: PasswordCredential,
        role: Role,
        can_borrow: bool,
    ) -> Self {
        Self {
            id,
            name,
            email,
            credential,
            role,
            can_borrow,
        }
    }

    fn validate_name(name: String) -> Result<String, DomainError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::InvalidValue("name is required".to_string()));
        }
        if name.chars().count() > Self::MAX_NAME_LENGTH {
            return Err(DomainError::InvalidValue(format!(
                "name must not exceed {} characters",
                Self::MAX_NAME_LENGTH
            )));
        }
        Ok(name)
    }

    pub fn id(&self) -> MemberId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn credential(&self) -> &PasswordCredential {
        &self.credential
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// 貸出許可フラグ
    pub fn can_borrow(&self) -> bool {
        self.can_borrow
    }

    /// この会員を操作者として扱う
    pub fn as_actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }

    /// パスワードを変更する
    /// 現在のパスワードの照合は呼び出し側で行う
    pub fn change_credential(&mut self, credential: PasswordCredential) {
        self.credential = credential;
    }

    /// 貸出許可を反転する
    /// 許可 → 停止 は貸出中の件数が0のときのみ可能
    ///
    /// # Arguments
    /// * `active_borrowing_count` - この会員の貸出中の件数
    ///
    /// # Returns
    /// * `Ok(bool)` - 変更後の貸出許可フラグ
    /// * `Err(DomainError::Conflict)` - 貸出中の書籍がある
    pub fn toggle_borrowing_permission(
        &mut self,
        active_borrowing_count: u32,
    ) -> Result<bool, DomainError> {
        if self.can_borrow {
            policy::guard_permission_revoke(self, active_borrowing_count)?;
        }
        self.can_borrow = !self.can_borrow;
        Ok(self.can_borrow)
    }
}

/// 操作者
/// 各操作に明示的に渡される認証済み会員（IDと役割）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    member_id: MemberId,
    role: Role,
}

impl Actor {
    pub fn new(member_id: MemberId, role: Role) -> Self {
        Self { member_id, role }
    }

    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Member => false,
        }
    }

    /// 管理者であることを要求する
    pub fn require_admin(&self) -> Result<(), DomainError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Member => Err(DomainError::NotAuthorized(
                "この操作は管理者のみ実行できます".to_string(),
            )),
        }
    }

    /// 本人であることを要求する（管理者でも他人は不可）
    pub fn require_self(&self, member_id: MemberId) -> Result<(), DomainError> {
        if self.member_id == member_id {
            Ok(())
        } else {
            Err(DomainError::NotAuthorized(
                "本人以外は変更できません".to_string(),
            ))
        }
    }

    /// 本人または管理者であることを要求する
    pub fn require_self_or_admin(&self, member_id: MemberId) -> Result<(), DomainError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Member if self.member_id == member_id => Ok(()),
            Role::Member => Err(DomainError::NotAuthorized(
                "他の会員の情報は参照できません".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member() -> Member {
        Member::register(
            MemberId::new(),
            "Nicholas Bednar".to_string(),
            Email::new("ora.romaguera@example.com".to_string()).unwrap(),
            PasswordCredential::new("hash".to_string()),
        )
        .unwrap()
    }

    #[test]
    fn test_register_defaults() {
        let member = member();
        assert_eq!(member.role(), Role::Member);
        assert!(member.can_borrow());
    }

    #[test]
    fn test_admin_cannot_borrow_by_default() {
        let admin = Member::admin(
            MemberId::new(),
            "Admin".to_string(),
            Email::new("admin@library.com".to_string()).unwrap(),
            PasswordCredential::new("hash".to_string()),
        )
        .unwrap();
        assert_eq!(admin.role(), Role::Admin);
        assert!(!admin.can_borrow());
    }

    #[test]
    fn test_register_with_empty_name_fails() {
        let result = Member::register(
            MemberId::new(),
            " ".to_string(),
            Email::new("someone@example.com".to_string()).unwrap(),
            PasswordCredential::new("hash".to_string()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_revoke_with_active_borrowings_fails() {
        let mut member = member();
        let result = member.toggle_borrowing_permission(1);
        assert!(matches!(result, Err(DomainError::Conflict(_))));
        assert!(member.can_borrow()); // 変更されない
    }

    #[test]
    fn test_revoke_without_active_borrowings() {
        let mut member = member();
        assert_eq!(member.toggle_borrowing_permission(0), Ok(false));
        assert!(!member.can_borrow());
    }

    #[test]
    fn test_restore_is_always_permitted() {
        let mut member = member();
        member.toggle_borrowing_permission(0).unwrap();
        // 停止 → 許可 は貸出件数に関係なく可能
        assert_eq!(member.toggle_borrowing_permission(2), Ok(true));
    }

    #[test]
    fn test_actor_role_checks() {
        let member_id = MemberId::new();
        let member_actor = Actor::new(member_id, Role::Member);
        let admin_actor = Actor::new(MemberId::new(), Role::Admin);

        assert!(member_actor.require_admin().is_err());
        assert!(admin_actor.require_admin().is_ok());
        assert!(member_actor.require_self_or_admin(member_id).is_ok());
        assert!(member_actor.require_self_or_admin(MemberId::new()).is_err());
        assert!(admin_actor.require_self_or_admin(member_id).is_ok());
        assert!(member_actor.require_self(member_id).is_ok());
        assert!(admin_actor.require_self(member_id).is_err());
    }

    #[test]
    fn test_change_credential_keeps_identity() {
        let mut member = member();
        let id = member.id();
        member.change_credential(PasswordCredential::new("new-hash".to_string()));
        assert_eq!(member.credential(), &PasswordCredential::new("new-hash".to_string()));
        assert_eq!(member.id(), id);
        assert!(member.can_borrow());
    }
}

// アプリケーションサービス
// 更新系ユースケースはすべてひとつのストアトランザクション内で実行する

pub mod book_query_service;
pub mod borrowing_query_service;
pub mod member_query_service;

pub use book_query_service::BookQueryService;
pub use borrowing_query_service::{BorrowingFilter, BorrowingHistory, BorrowingQueryService};
pub use member_query_service::{MemberQueryService, MemberSummary};

use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{
    Actor, Book, BookDetails, BookId, Borrowing, BorrowingId, Email, Member, MemberId,
};
use crate::domain::policy;
use crate::domain::port::{Clock, LibraryStore, Logger, PasswordHasher};
use crate::domain::service::BorrowingLifecycle;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

/// ガードによる拒否を警告ログに残してアプリケーションエラーに変換する
fn reject_on_guard<T>(
    logger: &dyn Logger,
    component: &str,
    result: Result<T, DomainError>,
    context: HashMap<String, String>,
) -> Result<T, ApplicationError> {
    result.map_err(|err| {
        logger.warn(component, &err.to_string(), None, Some(context));
        ApplicationError::DomainError(err)
    })
}

fn book_not_found(id: BookId) -> ApplicationError {
    ApplicationError::NotFound(format!("書籍が見つかりません: {}", id))
}

fn member_not_found(id: MemberId) -> ApplicationError {
    ApplicationError::NotFound(format!("会員が見つかりません: {}", id))
}

fn borrowing_not_found(id: BorrowingId) -> ApplicationError {
    ApplicationError::NotFound(format!("貸出が見つかりません: {}", id))
}

/// 書籍アプリケーションサービス
/// 蔵書の登録・更新・削除（管理者のみ）
pub struct BookApplicationService {
    store: Arc<dyn LibraryStore>,
    logger: Arc<dyn Logger>,
}

impl BookApplicationService {
    const COMPONENT: &'static str = "BookApplicationService";

    /// 新しいアプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `store` - ライブラリストア
    /// * `logger` - ロガー
    pub fn new(store: Arc<dyn LibraryStore>, logger: Arc<dyn Logger>) -> Self {
        Self { store, logger }
    }

    /// 書籍を登録
    /// 貸出可能数は蔵書数と同じ値で始まる
    ///
    /// # Returns
    /// * `Ok(Book)` - 登録された書籍
    /// * `Err(ApplicationError)` - 権限がない、ISBNが重複している、など
    pub async fn create_book(
        &self,
        actor: &Actor,
        details: BookDetails,
        quantity: u32,
    ) -> Result<Book, ApplicationError> {
        actor.require_admin()?;

        let mut tx = self.store.begin().await?;
        if tx.isbn_exists(details.isbn(), None).await? {
            return Err(DomainError::AlreadyExists(format!(
                "ISBN {} has already been taken",
                details.isbn()
            ))
            .into());
        }

        let book = Book::new(BookId::new(), details, quantity)?;
        tx.save_book(&book).await?;
        tx.commit().await?;

        let mut context = HashMap::new();
        context.insert("book_id".to_string(), book.id().to_string());
        context.insert("quantity".to_string(), book.quantity().to_string());
        self.logger.info(
            Self::COMPONENT,
            &format!("Book created: {}", book.title()),
            None,
            Some(context),
        );
        Ok(book)
    }

    /// 書籍を更新
    /// 蔵書数の変更時は貸出可能数を「新しい蔵書数 - 貸出中の件数」で再計算する
    ///
    /// # Arguments
    /// * `actor` - 操作者（管理者）
    /// * `book_id` - 書籍ID
    /// * `details` - 新しい書誌情報
    /// * `new_quantity` - 新しい蔵書数
    ///
    /// # Returns
    /// * `Ok(Book)` - 更新後の書籍
    /// * `Err(ApplicationError)` - 貸出中の件数を下回る、ISBNが重複している、など
    pub async fn update_book(
        &self,
        actor: &Actor,
        book_id: BookId,
        details: BookDetails,
        new_quantity: u32,
    ) -> Result<Book, ApplicationError> {
        actor.require_admin()?;

        let mut tx = self.store.begin().await?;
        let mut book = tx
            .find_book(book_id)
            .await?
            .ok_or_else(|| book_not_found(book_id))?;

        if tx.isbn_exists(details.isbn(), Some(book_id)).await? {
            return Err(DomainError::AlreadyExists(format!(
                "ISBN {} has already been taken",
                details.isbn()
            ))
            .into());
        }

        let active = tx.count_active_borrowings_for_book(book_id).await?;
        let mut context = HashMap::new();
        context.insert("book_id".to_string(), book_id.to_string());
        context.insert("requested_quantity".to_string(), new_quantity.to_string());
        context.insert("borrowed".to_string(), active.to_string());
        reject_on_guard(
            self.logger.as_ref(),
            Self::COMPONENT,
            policy::guard_quantity_reduction(&book, new_quantity, active),
            context,
        )?;

        book.update_details(details);
        book.resize_quantity(new_quantity, active)?;
        tx.save_book(&book).await?;
        tx.commit().await?;

        self.logger.info(
            Self::COMPONENT,
            &format!("Book updated: {}", book.title()),
            None,
            None,
        );
        Ok(book)
    }

    /// 書籍を削除
    /// 貸出中の書籍は削除できない
    pub async fn delete_book(
        &self,
        actor: &Actor,
        book_id: BookId,
    ) -> Result<(), ApplicationError> {
        actor.require_admin()?;

        let mut tx = self.store.begin().await?;
        let book = tx
            .find_book(book_id)
            .await?
            .ok_or_else(|| book_not_found(book_id))?;

        let active = tx.count_active_borrowings_for_book(book_id).await?;
        let mut context = HashMap::new();
        context.insert("book_id".to_string(), book_id.to_string());
        context.insert("borrowed".to_string(), active.to_string());
        reject_on_guard(
            self.logger.as_ref(),
            Self::COMPONENT,
            policy::guard_book_deletion(&book, active),
            context,
        )?;

        tx.delete_book(book_id).await?;
        tx.commit().await?;

        self.logger.info(
            Self::COMPONENT,
            &format!("Book deleted: {}", book.title()),
            None,
            None,
        );
        Ok(())
    }
}

/// 会員アプリケーションサービス
pub struct MemberApplicationService {
    store: Arc<dyn LibraryStore>,
    password_hasher: Arc<dyn PasswordHasher>,
    logger: Arc<dyn Logger>,
}

impl MemberApplicationService {
    const COMPONENT: &'static str = "MemberApplicationService";

    pub fn new(
        store: Arc<dyn LibraryStore>,
        password_hasher: Arc<dyn PasswordHasher>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            store,
            password_hasher,
            logger,
        }
    }

    /// 会員登録
    /// 一般会員・貸出可能として登録する
    ///
    /// # Arguments
    /// * `name` - 氏名
    /// * `email` - メールアドレス（一意）
    /// * `password` - 平文パスワード（ハッシュ化して保存）
    pub async fn register_member(
        &self,
        name: String,
        email: Email,
        password: &str,
    ) -> Result<Member, ApplicationError> {
        // ハッシュ化はトランザクションの外で行う
        let credential = self.password_hasher.hash(password)?;

        let mut tx = self.store.begin().await?;
        if tx.email_exists(&email).await? {
            return Err(DomainError::AlreadyExists(format!(
                "Email {} has already been taken",
                email
            ))
            .into());
        }

        let member = Member::register(MemberId::new(), name, email, credential)?;
        tx.save_member(&member).await?;
        tx.commit().await?;

        let mut context = HashMap::new();
        context.insert("member_id".to_string(), member.id().to_string());
        self.logger.info(
            Self::COMPONENT,
            &format!("Member registered: {}", member.email()),
            None,
            Some(context),
        );
        Ok(member)
    }

    /// 管理者アカウントが未登録であれば作成する
    ///
    /// # Returns
    /// * `Ok(Some(Member))` - 作成した管理者
    /// * `Ok(None)` - 同じメールアドレスが登録済み
    pub async fn ensure_admin_account(
        &self,
        name: String,
        email: Email,
        password: &str,
    ) -> Result<Option<Member>, ApplicationError> {
        let credential = self.password_hasher.hash(password)?;

        let mut tx = self.store.begin().await?;
        if tx.email_exists(&email).await? {
            self.logger.debug(
                Self::COMPONENT,
                &format!("Admin account already exists: {}", email),
                None,
                None,
            );
            return Ok(None);
        }

        let admin = Member::admin(MemberId::new(), name, email, credential)?;
        tx.save_member(&admin).await?;
        tx.commit().await?;

        self.logger.info(
            Self::COMPONENT,
            &format!("Admin account created: {}", admin.email()),
            None,
            None,
        );
        Ok(Some(admin))
    }

    /// 本人のパスワードを変更する
    /// 現在のパスワードを照合してから新しいパスワードのハッシュで置き換える
    ///
    /// # Arguments
    /// * `actor` - 操作者（変更対象の会員本人）
    /// * `member_id` - 変更対象の会員ID
    /// * `current_password` - 現在の平文パスワード
    /// * `new_password` - 新しい平文パスワード
    ///
    /// # Returns
    /// * `Ok(Member)` - 変更後の会員
    /// * `Err(DomainError::NotAuthorized)` - 本人以外による変更
    /// * `Err(DomainError::IncorrectPassword)` - 現在のパスワードが一致しない
    pub async fn change_password(
        &self,
        actor: &Actor,
        member_id: MemberId,
        current_password: &str,
        new_password: &str,
    ) -> Result<Member, ApplicationError> {
        actor.require_self(member_id)?;
        let credential = self.password_hasher.hash(new_password)?;

        let mut tx = self.store.begin().await?;
        let mut member = tx
            .find_member(member_id)
            .await?
            .ok_or_else(|| member_not_found(member_id))?;

        if !self
            .password_hasher
            .verify(current_password, member.credential())
        {
            self.logger.warn(
                Self::COMPONENT,
                &format!("Password change rejected for {}", member.email()),
                None,
                None,
            );
            return Err(DomainError::IncorrectPassword.into());
        }

        member.change_credential(credential);
        tx.save_member(&member).await?;
        tx.commit().await?;

        let mut context = HashMap::new();
        context.insert("member_id".to_string(), member_id.to_string());
        self.logger.info(
            Self::COMPONENT,
            &format!("Password changed: {}", member.email()),
            None,
            Some(context),
        );
        Ok(member)
    }

    /// 会員の貸出許可を反転する（管理者のみ）
    /// 貸出中の書籍がある会員の貸出は停止できない
    pub async fn toggle_borrowing_permission(
        &self,
        actor: &Actor,
        member_id: MemberId,
    ) -> Result<Member, ApplicationError> {
        actor.require_admin()?;

        let mut tx = self.store.begin().await?;
        let mut member = tx
            .find_member(member_id)
            .await?
            .ok_or_else(|| member_not_found(member_id))?;

        let active = tx.count_active_borrowings_for_member(member_id).await?;
        let mut context = HashMap::new();
        context.insert("member_id".to_string(), member_id.to_string());
        context.insert("borrowed".to_string(), active.to_string());
        let can_borrow = reject_on_guard(
            self.logger.as_ref(),
            Self::COMPONENT,
            member.toggle_borrowing_permission(active),
            context,
        )?;

        tx.save_member(&member).await?;
        tx.commit().await?;

        let status = if can_borrow { "enabled" } else { "disabled" };
        self.logger.info(
            Self::COMPONENT,
            &format!("Borrowing {} for {}", status, member.name()),
            None,
            None,
        );
        Ok(member)
    }
}

/// 貸出アプリケーションサービス
/// 貸出の作成・返却と書籍の貸出可能数の更新をひとつのトランザクションで行う
pub struct BorrowingApplicationService {
    store: Arc<dyn LibraryStore>,
    clock: Arc<dyn Clock>,
    logger: Arc<dyn Logger>,
}

impl BorrowingApplicationService {
    const COMPONENT: &'static str = "BorrowingApplicationService";

    pub fn new(
        store: Arc<dyn LibraryStore>,
        clock: Arc<dyn Clock>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            store,
            clock,
            logger,
        }
    }

    /// 管理者が貸出日を指定して貸出を記録する
    ///
    /// # Arguments
    /// * `actor` - 操作者（管理者）
    /// * `member_id` - 借りる会員
    /// * `book_id` - 貸し出す書籍
    /// * `borrow_date` - 貸出日
    ///
    /// # Returns
    /// * `Ok(Borrowing)` - 作成された貸出
    /// * `Err(ApplicationError)` - 会員の貸出停止、在庫切れ、会員・書籍が存在しない
    pub async fn create_borrowing(
        &self,
        actor: &Actor,
        member_id: MemberId,
        book_id: BookId,
        borrow_date: NaiveDate,
    ) -> Result<Borrowing, ApplicationError> {
        actor.require_admin()?;
        self.borrow(member_id, book_id, borrow_date).await
    }

    /// 会員自身が今日の日付で借りる
    pub async fn quick_borrow(
        &self,
        actor: &Actor,
        book_id: BookId,
    ) -> Result<Borrowing, ApplicationError> {
        self.borrow(actor.member_id(), book_id, self.clock.today())
            .await
    }

    async fn borrow(
        &self,
        member_id: MemberId,
        book_id: BookId,
        borrow_date: NaiveDate,
    ) -> Result<Borrowing, ApplicationError> {
        let mut tx = self.store.begin().await?;
        let member = tx
            .find_member(member_id)
            .await?
            .ok_or_else(|| member_not_found(member_id))?;
        let mut book = tx
            .find_book(book_id)
            .await?
            .ok_or_else(|| book_not_found(book_id))?;

        let mut context = HashMap::new();
        context.insert("member_id".to_string(), member_id.to_string());
        context.insert("book_id".to_string(), book_id.to_string());
        let borrowing = reject_on_guard(
            self.logger.as_ref(),
            Self::COMPONENT,
            BorrowingLifecycle::create_borrowing(&member, &mut book, borrow_date),
            context,
        )?;

        tx.save_book(&book).await?;
        tx.save_borrowing(&borrowing).await?;
        tx.commit().await?;

        let mut context = HashMap::new();
        context.insert("borrowing_id".to_string(), borrowing.id().to_string());
        context.insert("due_date".to_string(), borrowing.due_date().to_string());
        context.insert("available".to_string(), book.available().to_string());
        self.logger.info(
            Self::COMPONENT,
            &format!("{} borrowed \"{}\"", member.name(), book.title()),
            None,
            Some(context),
        );
        Ok(borrowing)
    }

    /// 貸出を返却済みにする（管理者のみ）
    /// 返却日は今日
    pub async fn return_borrowing(
        &self,
        actor: &Actor,
        borrowing_id: BorrowingId,
    ) -> Result<Borrowing, ApplicationError> {
        actor.require_admin()?;

        let mut tx = self.store.begin().await?;
        let mut borrowing = tx
            .find_borrowing(borrowing_id)
            .await?
            .ok_or_else(|| borrowing_not_found(borrowing_id))?;
        let mut book = tx
            .find_book(borrowing.book_id())
            .await?
            .ok_or_else(|| book_not_found(borrowing.book_id()))?;

        let mut context = HashMap::new();
        context.insert("borrowing_id".to_string(), borrowing_id.to_string());
        reject_on_guard(
            self.logger.as_ref(),
            Self::COMPONENT,
            BorrowingLifecycle::return_borrowing(&mut borrowing, &mut book, self.clock.today()),
            context,
        )?;

        tx.save_book(&book).await?;
        tx.save_borrowing(&borrowing).await?;
        tx.commit().await?;

        self.logger.info(
            Self::COMPONENT,
            &format!("\"{}\" returned", book.title()),
            None,
            None,
        );
        Ok(borrowing)
    }
}

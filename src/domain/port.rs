// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::model::{
    Book, BookId, Borrowing, BorrowingId, BorrowingStatus, Email, Isbn, Member, MemberId,
    PasswordCredential,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use uuid::Uuid;

/// ログレベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// 文字列からLogLevelを作成（大文字小文字は区別しない）
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// ロガートレイト
/// ログ出力を抽象化するポート
pub trait Logger: Send + Sync {
    /// デバッグレベルのログを出力
    fn debug(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 情報レベルのログを出力
    fn info(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 警告レベルのログを出力
    fn warn(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// エラーレベルのログを出力
    fn error(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );
}

/// 時計トレイト
/// 「今日」の日付を提供する
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// パスワードハッシュ化エラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Password hashing failed: {0}")]
pub struct PasswordHashError(pub String);

/// パスワードハッシュ化トレイト
/// ハッシュ方式はアダプターに委ねる
pub trait PasswordHasher: Send + Sync {
    /// 平文パスワードをハッシュ化する
    fn hash(&self, password: &str) -> Result<PasswordCredential, PasswordHashError>;

    /// 平文パスワードとハッシュを照合する
    fn verify(&self, password: &str, credential: &PasswordCredential) -> bool;
}

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// 操作に失敗
    #[error("Operation failed: {0}")]
    OperationFailed(String),
    /// データの取得に失敗
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
}

/// ライブラリストアトレイト
/// 書籍・会員・貸出の更新をひとつのトランザクションとして扱う
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// トランザクションを開始する
    ///
    /// # Returns
    /// * `Ok(Box<dyn LibraryTransaction>)` - 開始したトランザクション
    /// * `Err(RepositoryError)` - 開始失敗
    async fn begin(&self) -> Result<Box<dyn LibraryTransaction>, RepositoryError>;
}

/// ライブラリトランザクショントレイト
///
/// 読み込んだ行はコミットまたは破棄まで更新ロックされる
/// `commit` を呼ばずに破棄した場合、すべての書き込みは取り消される
#[async_trait]
pub trait LibraryTransaction: Send {
    /// 書籍を更新ロック付きで取得する
    async fn find_book(&mut self, id: BookId) -> Result<Option<Book>, RepositoryError>;

    /// 書籍を保存する（存在しなければ作成）
    async fn save_book(&mut self, book: &Book) -> Result<(), RepositoryError>;

    /// 書籍を削除する
    async fn delete_book(&mut self, id: BookId) -> Result<(), RepositoryError>;

    /// ISBNが他の書籍で使用されているか
    ///
    /// # Arguments
    /// * `isbn` - 検査するISBN
    /// * `excluding` - 検査から除外する書籍ID（更新時の自分自身）
    async fn isbn_exists(
        &mut self,
        isbn: &Isbn,
        excluding: Option<BookId>,
    ) -> Result<bool, RepositoryError>;

    /// 会員を更新ロック付きで取得する
    async fn find_member(&mut self, id: MemberId) -> Result<Option<Member>, RepositoryError>;

    /// 会員を保存する（存在しなければ作成）
    async fn save_member(&mut self, member: &Member) -> Result<(), RepositoryError>;

    /// メールアドレスが登録済みか
    async fn email_exists(&mut self, email: &Email) -> Result<bool, RepositoryError>;

    /// 貸出を更新ロック付きで取得する
    async fn find_borrowing(
        &mut self,
        id: BorrowingId,
    ) -> Result<Option<Borrowing>, RepositoryError>;

    /// 貸出を保存する（存在しなければ作成）
    async fn save_borrowing(&mut self, borrowing: &Borrowing) -> Result<(), RepositoryError>;

    /// 書籍の貸出中の件数
    async fn count_active_borrowings_for_book(
        &mut self,
        book_id: BookId,
    ) -> Result<u32, RepositoryError>;

    /// 会員の貸出中の件数
    async fn count_active_borrowings_for_member(
        &mut self,
        member_id: MemberId,
    ) -> Result<u32, RepositoryError>;

    /// すべての書き込みを確定する
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// 書籍リポジトリトレイト
/// 一覧・参照用（読み取り専用）
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// 書籍IDで書籍を検索する
    ///
    /// # Returns
    /// * `Ok(Some(Book))` - 書籍が見つかった
    /// * `Ok(None)` - 書籍が見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError>;

    /// すべての書籍をタイトルの昇順で取得する
    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError>;

    /// 貸出可能な在庫がある書籍をタイトルの昇順で取得する
    async fn find_available(&self) -> Result<Vec<Book>, RepositoryError>;
}

/// 会員リポジトリトレイト
#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, RepositoryError>;

    /// すべての会員を名前の昇順で取得する
    async fn find_all(&self) -> Result<Vec<Member>, RepositoryError>;

    /// 貸出可能な一般会員を名前の昇順で取得する
    async fn find_borrowers(&self) -> Result<Vec<Member>, RepositoryError>;
}

/// 貸出リポジトリトレイト
/// 一覧はすべて貸出日の降順で返す
#[async_trait]
pub trait BorrowingRepository: Send + Sync {
    async fn find_by_id(&self, id: BorrowingId) -> Result<Option<Borrowing>, RepositoryError>;

    async fn find_all(&self) -> Result<Vec<Borrowing>, RepositoryError>;

    async fn find_by_member(&self, member_id: MemberId) -> Result<Vec<Borrowing>, RepositoryError>;

    async fn find_by_member_and_status(
        &self,
        member_id: MemberId,
        status: BorrowingStatus,
    ) -> Result<Vec<Borrowing>, RepositoryError>;

    /// 貸出中の貸出をすべて取得する
    async fn find_active(&self) -> Result<Vec<Borrowing>, RepositoryError>;
}

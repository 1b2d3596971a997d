use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// 書籍の一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    /// 新しい一意のBookIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから BookId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からBookIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

/// 会員の一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(Uuid);

impl MemberId {
    /// 新しい一意のMemberIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから MemberId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からMemberIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

/// 貸出の一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BorrowingId(Uuid);

impl BorrowingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for BorrowingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for BorrowingId {
    fn default() -> Self {
        Self::new()
    }
}

/// ISBNを表す値オブジェクト
/// 13桁の数字のみを受け付ける
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Isbn(String);

impl Isbn {
    /// ISBNの桁数
    pub const LENGTH: usize = 13;

    pub fn new(value: String) -> Result<Self, DomainError> {
        let value = value.trim().to_string();
        if !Self::is_valid(&value) {
            return Err(DomainError::InvalidValue(
                "ISBN must be exactly 13 digits (0-9)".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 13桁の数字かチェック
    pub fn is_valid(value: &str) -> bool {
        value.len() == Self::LENGTH && value.chars().all(|c| c.is_ascii_digit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// メールアドレスを表す値オブジェクト
/// 比較のため小文字に正規化して保持する
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    pub fn new(value: String) -> Result<Self, DomainError> {
        let value = value.trim().to_lowercase();
        if !Self::is_valid(&value) {
            return Err(DomainError::InvalidValue(format!(
                "Invalid email address: {}",
                value
            )));
        }
        Ok(Self(value))
    }

    /// ローカル部とドメイン部を持ち、ドメイン部にドットを含むかチェック
    pub fn is_valid(value: &str) -> bool {
        let value = value.trim();
        if value.chars().any(char::is_whitespace) {
            return false;
        }
        match value.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            }
            None => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 表紙画像のURL
/// http(s)で始まり、画像の拡張子で終わる必要がある（クエリ文字列は許容）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverImageUrl(String);

impl CoverImageUrl {
    pub const MAX_LENGTH: usize = 2048;
    const EXTENSIONS: [&'static str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

    pub fn new(value: String) -> Result<Self, DomainError> {
        let value = value.trim().to_string();
        if !Self::is_valid(&value) {
            return Err(DomainError::InvalidValue(
                "Cover URL must end with jpg, jpeg, png, gif, or webp".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn is_valid(value: &str) -> bool {
        if value.len() > Self::MAX_LENGTH {
            return false;
        }
        let rest = match value
            .strip_prefix("https://")
            .or_else(|| value.strip_prefix("http://"))
        {
            Some(rest) => rest,
            None => return false,
        };
        let path = rest.split(['?', '#']).next().unwrap_or_default();
        // ホスト部のみのURLは不可
        if !path.contains('/') || path.starts_with('/') {
            return false;
        }
        let path = path.to_ascii_lowercase();
        Self::EXTENSIONS.iter().any(|ext| path.ends_with(ext))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 書籍の書誌情報
/// タイトル・著者・ISBN・説明・表紙画像をまとめた値オブジェクト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDetails {
    title: String,
    author: String,
    isbn: Isbn,
    description: String,
    cover_image: Option<CoverImageUrl>,
}

impl BookDetails {
    pub const MAX_TEXT_LENGTH: usize = 255;
    pub const MIN_DESCRIPTION_LENGTH: usize = 10;

    /// 新しい書誌情報を作成
    /// バリデーション:
    /// - タイトル、著者は空でなく255文字以内
    /// - 説明は10文字以上
    pub fn new(
        title: String,
        author: String,
        isbn: Isbn,
        description: String,
        cover_image: Option<CoverImageUrl>,
    ) -> Result<Self, DomainError> {
        let title = Self::required_text("title", title)?;
        let author = Self::required_text("author", author)?;

        let description = description.trim().to_string();
        if description.chars().count() < Self::MIN_DESCRIPTION_LENGTH {
            return Err(DomainError::InvalidValue(
                "Description must be at least 10 characters".to_string(),
            ));
        }

        Ok(Self {
            title,
            author,
            isbn,
            description,
            cover_image,
        })
    }

    fn required_text(field: &str, value: String) -> Result<String, DomainError> {
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(DomainError::InvalidValue(format!("{} is required", field)));
        }
        if value.chars().count() > Self::MAX_TEXT_LENGTH {
            return Err(DomainError::InvalidValue(format!(
                "{} must not exceed {} characters",
                field,
                Self::MAX_TEXT_LENGTH
            )));
        }
        Ok(value)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn isbn(&self) -> &Isbn {
        &self.isbn
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn cover_image(&self) -> Option<&CoverImageUrl> {
        self.cover_image.as_ref()
    }
}

/// パスワード資格情報
/// ハッシュ化済みの文字列で、ドメイン層では中身を解釈しない
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordCredential(String);

impl PasswordCredential {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordCredential(***)")
    }
}

/// 会員の役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// 管理者（蔵書・会員・貸出の管理）
    Admin,
    /// 一般会員
    Member,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role_str = match self {
            Role::Admin => "admin",
            Role::Member => "member",
        };
        write!(f, "{}", role_str)
    }
}

impl Role {
    /// 文字列からRoleを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            _ => Err(DomainError::InvalidValue(format!("無効な役割: {}", s))),
        }
    }
}

/// 貸出のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BorrowingStatus {
    /// 貸出中
    Borrowed,
    /// 返却済み（終端状態）
    Returned,
}

impl fmt::Display for BorrowingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status_str = match self {
            BorrowingStatus::Borrowed => "borrowed",
            BorrowingStatus::Returned => "returned",
        };
        write!(f, "{}", status_str)
    }
}

impl BorrowingStatus {
    /// 文字列からBorrowingStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "borrowed" => Ok(BorrowingStatus::Borrowed),
            "returned" => Ok(BorrowingStatus::Returned),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な貸出ステータス: {}",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_id_creation() {
        let id1 = BookId::new();
        let id2 = BookId::new();
        assert_ne!(id1, id2, "Each BookId should be unique");
    }

    #[test]
    fn test_member_id_from_string_round_trip() {
        let id = MemberId::new();
        let parsed = MemberId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(MemberId::from_string("not-a-uuid").is_err());
    }

    #[test]
    fn test_isbn_valid() {
        let isbn = Isbn::new("9784873119786".to_string()).unwrap();
        assert_eq!(isbn.as_str(), "9784873119786");
    }

    #[test]
    fn test_isbn_invalid() {
        assert!(Isbn::new("978487311978".to_string()).is_err()); // 12桁
        assert!(Isbn::new("97848731197860".to_string()).is_err()); // 14桁
        assert!(Isbn::new("978-4873119786".to_string()).is_err());
        assert!(Isbn::new("97848731197ab".to_string()).is_err());
    }

    #[test]
    fn test_email_is_normalized() {
        let email = Email::new("  Reader@Library.COM ".to_string()).unwrap();
        assert_eq!(email.as_str(), "reader@library.com");
    }

    #[test]
    fn test_email_invalid() {
        assert!(Email::new("reader".to_string()).is_err());
        assert!(Email::new("@library.com".to_string()).is_err());
        assert!(Email::new("reader@library".to_string()).is_err());
        assert!(Email::new("re ader@library.com".to_string()).is_err());
    }

    #[test]
    fn test_cover_image_url() {
        assert!(CoverImageUrl::is_valid("https://covers.example.com/book.jpg"));
        assert!(CoverImageUrl::is_valid("http://covers.example.com/a/b.JPEG?size=l"));
        assert!(CoverImageUrl::is_valid("https://covers.example.com/book.webp"));
        assert!(!CoverImageUrl::is_valid("https://covers.example.com/book.pdf"));
        assert!(!CoverImageUrl::is_valid("ftp://covers.example.com/book.png"));
        assert!(!CoverImageUrl::is_valid("https://book.png"));
    }

    #[test]
    fn test_book_details_description_too_short() {
        let isbn = Isbn::new("9784873119786".to_string()).unwrap();
        let result = BookDetails::new(
            "The Rust Book".to_string(),
            "Steve Klabnik".to_string(),
            isbn,
            "short".to_string(),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_book_details_empty_title() {
        let isbn = Isbn::new("9784873119786".to_string()).unwrap();
        let result = BookDetails::new(
            "   ".to_string(),
            "Steve Klabnik".to_string(),
            isbn,
            "A book about the Rust language".to_string(),
            None,
        );
        assert_eq!(
            result.unwrap_err(),
            DomainError::InvalidValue("title is required".to_string())
        );
    }

    #[test]
    fn test_password_credential_debug_is_redacted() {
        let credential = PasswordCredential::new("$argon2id$secret".to_string());
        assert!(!format!("{:?}", credential).contains("secret"));
    }

    #[test]
    fn test_status_from_string() {
        assert_eq!(
            BorrowingStatus::from_string("borrowed").unwrap(),
            BorrowingStatus::Borrowed
        );
        assert_eq!(
            BorrowingStatus::from_string("returned").unwrap(),
            BorrowingStatus::Returned
        );
        assert!(BorrowingStatus::from_string("Borrowed").is_err());
        assert_eq!(Role::from_string("admin").unwrap(), Role::Admin);
        assert!(Role::from_string("librarian").is_err());
    }
}

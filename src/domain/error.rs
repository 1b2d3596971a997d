/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// 操作する権限がない（貸出停止中の会員、管理者専用の操作など）
    #[error("Not authorized: {0}")]
    NotAuthorized(String),
    /// 貸出可能な在庫がない
    #[error("Book is not available: {0}")]
    Unavailable(String),
    /// 既に返却済みの貸出を返却しようとした
    #[error("This book has already been returned")]
    AlreadyReturned,
    /// 依存する状態があるため変更できない（貸出中の書籍の削除など）
    #[error("Conflict: {0}")]
    Conflict(String),
    /// 貸出中の冊数を下回る数量への変更
    #[error(
        "Cannot reduce total quantity to {requested}: {borrowed} copies are currently borrowed"
    )]
    Capacity { requested: u32, borrowed: u32 },
    /// 貸出可能数が0の状態で減算しようとした
    #[error("Insufficient inventory")]
    InsufficientInventory,
    /// 一意制約違反（ISBN、メールアドレス）
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    /// 現在のパスワードが一致しない
    #[error("The current password is incorrect")]
    IncorrectPassword,
    /// 無効な値
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// 不変条件を満たさない状態
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

// ガード・ポリシー
// 状態を変更する前に前提条件を検査する
// いずれのガードも失敗時に何も変更しない

use crate::domain::error::DomainError;
use crate::domain::model::{Book, Member};

/// 書籍の削除可否を検査
///
/// # Arguments
/// * `book` - 削除対象の書籍
/// * `active_borrowing_count` - この書籍の貸出中の件数
///
/// # Returns
/// * `Err(DomainError::Conflict)` - 貸出中の書籍がある
pub fn guard_book_deletion(book: &Book, active_borrowing_count: u32) -> Result<(), DomainError> {
    if active_borrowing_count > 0 {
        return Err(DomainError::Conflict(format!(
            "Cannot delete \"{}\": {} copies are currently borrowed",
            book.title(),
            active_borrowing_count
        )));
    }
    Ok(())
}

/// 蔵書数の変更可否を検査
pub fn guard_quantity_reduction(
    _book: &Book,
    new_quantity: u32,
    active_borrowing_count: u32,
) -> Result<(), DomainError> {
    if new_quantity < active_borrowing_count {
        return Err(DomainError::Capacity {
            requested: new_quantity,
            borrowed: active_borrowing_count,
        });
    }
    Ok(())
}

/// 貸出許可の停止可否を検査
/// 許可 → 停止 の変更時のみ呼び出される
pub fn guard_permission_revoke(
    member: &Member,
    active_borrowing_count: u32,
) -> Result<(), DomainError> {
    if active_borrowing_count > 0 {
        return Err(DomainError::Conflict(format!(
            "Cannot disable borrowing for {}: {} books are currently borrowed",
            member.name(),
            active_borrowing_count
        )));
    }
    Ok(())
}

/// 会員が貸出可能かを検査
pub fn ensure_can_borrow(member: &Member) -> Result<(), DomainError> {
    if !member.can_borrow() {
        return Err(DomainError::NotAuthorized(format!(
            "{} is not allowed to borrow books",
            member.name()
        )));
    }
    Ok(())
}

/// 書籍に貸出可能な在庫があるかを検査
pub fn ensure_available(book: &Book) -> Result<(), DomainError> {
    if !book.is_available() {
        return Err(DomainError::Unavailable(book.title().to_string()));
    }
    Ok(())
}

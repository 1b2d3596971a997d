use crate::domain::error::DomainError;
use crate::domain::model::{BookDetails, BookId};

/// 書籍集約
/// 蔵書数（quantity）と貸出可能数（available）を管理する
///
/// 不変条件: `0 <= available <= quantity` かつ `quantity >= 1`
/// 貸出可能数は貸出ライフサイクルからのみ増減する
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    id: BookId,
    details: BookDetails,
    quantity: u32,
    available: u32,
}

impl Book {
    /// 新しい書籍を作成
    /// 作成直後は全冊が貸出可能
    ///
    /// # Arguments
    /// * `id` - 書籍ID
    /// * `details` - 書誌情報
    /// * `quantity` - 蔵書数（1以上）
    pub fn new(id: BookId, details: BookDetails, quantity: u32) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidValue(
                "Quantity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            id,
            details,
            quantity,
            available: quantity,
        })
    }

    /// データベースから取得したデータで書籍を再構築
    pub fn reconstruct(
        id: BookId,
        details: BookDetails,
        quantity: u32,
        available: u32,
    ) -> Result<Self, DomainError> {
        if quantity == 0 || available > quantity {
            return Err(DomainError::InvalidState(format!(
                "書籍 {} の在庫数が不正です: quantity={}, available={}",
                id, quantity, available
            )));
        }
        Ok(Self {
            id,
            details,
            quantity,
            available,
        })
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn details(&self) -> &BookDetails {
        &self.details
    }

    pub fn title(&self) -> &str {
        self.details.title()
    }

    /// 蔵書数を取得
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// 貸出可能数を取得
    pub fn available(&self) -> u32 {
        self.available
    }

    /// 貸出中の冊数（蔵書数 - 貸出可能数）
    pub fn on_loan(&self) -> u32 {
        self.quantity - self.available
    }

    /// 貸出可能な在庫があるか
    pub fn is_available(&self) -> bool {
        self.available > 0
    }

    /// 書誌情報を更新
    pub fn update_details(&mut self, details: BookDetails) {
        self.details = details;
    }

    /// 貸出可能数を1減らす
    ///
    /// # Returns
    /// * `Ok(())` - 減算成功
    /// * `Err(DomainError::InsufficientInventory)` - 貸出可能数が0
    pub fn decrement_availability(&mut self) -> Result<(), DomainError> {
        if self.available == 0 {
            return Err(DomainError::InsufficientInventory);
        }
        self.available -= 1;
        Ok(())
    }

    /// 貸出可能数を1増やす（返却時のみ）
    pub fn increment_availability(&mut self) -> Result<(), DomainError> {
        if self.available >= self.quantity {
            return Err(DomainError::InvalidState(format!(
                "書籍 {} の貸出可能数が蔵書数を超えます",
                self.id
            )));
        }
        self.available += 1;
        Ok(())
    }

    /// 蔵書数を変更し、貸出可能数を再計算する
    ///
    /// # Arguments
    /// * `new_quantity` - 新しい蔵書数
    /// * `active_borrowed_count` - この書籍の貸出中の件数
    ///
    /// # Returns
    /// * `Ok(())` - 変更成功（available = new_quantity - active_borrowed_count）
    /// * `Err(DomainError::Capacity)` - 貸出中の件数を下回る
    pub fn resize_quantity(
        &mut self,
        new_quantity: u32,
        active_borrowed_count: u32,
    ) -> Result<(), DomainError> {
        if new_quantity < active_borrowed_count {
            return Err(DomainError::Capacity {
                requested: new_quantity,
                borrowed: active_borrowed_count,
            });
        }
        if new_quantity == 0 {
            return Err(DomainError::InvalidValue(
                "Quantity must be at least 1".to_string(),
            ));
        }
        self.quantity = new_quantity;
        self.available = new_quantity - active_borrowed_count;
        Ok(())
    }
}

use crate::adapter::driver::validation::{FieldSource, FieldValue};
use serde::{Deserialize, Serialize};

/// 書籍登録・更新用のリクエストDTO
/// 値の検証は規則テーブルで行うため、すべて任意項目として受け取る
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub quantity: Option<i64>,
}

impl FieldSource for BookRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "title" => FieldValue::from_text(&self.title),
            "author" => FieldValue::from_text(&self.author),
            "isbn" => FieldValue::from_text(&self.isbn),
            "description" => FieldValue::from_text(&self.description),
            "cover_image" => FieldValue::from_text(&self.cover_image),
            "quantity" => FieldValue::from_number(self.quantity),
            _ => FieldValue::Missing,
        }
    }
}

/// 会員登録用のリクエストDTO
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterMemberRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

impl FieldSource for RegisterMemberRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "name" => FieldValue::from_text(&self.name),
            "email" => FieldValue::from_text(&self.email),
            "password" => FieldValue::from_text(&self.password),
            "password_confirmation" => FieldValue::from_text(&self.password_confirmation),
            _ => FieldValue::Missing,
        }
    }
}

/// パスワード変更用のリクエストDTO
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

impl FieldSource for ChangePasswordRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "current_password" => FieldValue::from_text(&self.current_password),
            "password" => FieldValue::from_text(&self.password),
            "password_confirmation" => FieldValue::from_text(&self.password_confirmation),
            _ => FieldValue::Missing,
        }
    }
}

/// 貸出記録用のリクエストDTO（管理者）
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateBorrowingRequest {
    pub member_id: Option<String>,
    pub book_id: Option<String>,
    pub borrow_date: Option<String>,
}

impl FieldSource for CreateBorrowingRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "member_id" => FieldValue::from_text(&self.member_id),
            "book_id" => FieldValue::from_text(&self.book_id),
            "borrow_date" => FieldValue::from_text(&self.borrow_date),
            _ => FieldValue::Missing,
        }
    }
}

/// 書籍一覧取得用のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct BooksQueryParams {
    pub available: Option<bool>,
}

/// 貸出一覧取得用のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct BorrowingsQueryParams {
    pub status: Option<String>,
}

/// リマインダー取得用のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct RemindersQueryParams {
    pub window_days: Option<i64>,
}

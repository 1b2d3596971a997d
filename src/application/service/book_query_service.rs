use crate::application::ApplicationError;
use crate::domain::model::{Book, BookId};
use crate::domain::port::BookRepository;
use std::sync::Arc;

/// 書籍クエリサービス
/// 読み取り専用の書籍操作を提供する
pub struct BookQueryService {
    book_repository: Arc<dyn BookRepository>,
}

impl BookQueryService {
    /// 新しい書籍クエリサービスを作成
    ///
    /// # Arguments
    /// * `book_repository` - 書籍リポジトリ
    pub fn new(book_repository: Arc<dyn BookRepository>) -> Self {
        Self { book_repository }
    }

    /// 書籍IDで書籍を取得
    ///
    /// # Returns
    /// * `Ok(Book)` - 書籍が見つかった
    /// * `Err(ApplicationError::NotFound)` - 書籍が見つからなかった
    pub async fn get_book(&self, book_id: BookId) -> Result<Book, ApplicationError> {
        self.book_repository
            .find_by_id(book_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("書籍が見つかりません: {}", book_id)))
    }

    /// すべての書籍をタイトルの昇順で取得
    pub async fn get_all_books(&self) -> Result<Vec<Book>, ApplicationError> {
        self.book_repository
            .find_all()
            .await
            .map_err(ApplicationError::from)
    }

    /// 貸出可能な書籍のみを取得
    pub async fn get_available_books(&self) -> Result<Vec<Book>, ApplicationError> {
        self.book_repository
            .find_available()
            .await
            .map_err(ApplicationError::from)
    }
}

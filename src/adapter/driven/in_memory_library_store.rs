use crate::domain::model::{
    Book, BookId, Borrowing, BorrowingId, BorrowingStatus, Email, Isbn, Member, MemberId, Role,
};
use crate::domain::port::{
    BookRepository, BorrowingRepository, LibraryStore, LibraryTransaction, MemberRepository,
    RepositoryError,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// ストア全体の状態
#[derive(Debug, Clone, Default)]
struct LibraryState {
    books: HashMap<BookId, Book>,
    members: HashMap<MemberId, Member>,
    /// 作成順
    borrowings: Vec<Borrowing>,
}

impl LibraryState {
    fn active_count(&self, predicate: impl Fn(&Borrowing) -> bool) -> u32 {
        self.borrowings
            .iter()
            .filter(|b| b.is_active() && predicate(b))
            .count() as u32
    }

    /// 貸出日の降順（同日は新しく作成されたものが先）
    fn borrowings_newest_first(&self, predicate: impl Fn(&Borrowing) -> bool) -> Vec<Borrowing> {
        let mut result: Vec<Borrowing> = self
            .borrowings
            .iter()
            .rev()
            .filter(|b| predicate(b))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.borrow_date().cmp(&a.borrow_date()));
        result
    }
}

/// インメモリライブラリストア
/// テストと `LIBRARY_STORAGE=memory` で使用する
///
/// トランザクションは状態全体の排他ロックを保持し、作業用のコピーに書き込む
/// コミット時にのみコピーを反映する
#[derive(Clone, Default)]
pub struct InMemoryLibraryStore {
    state: Arc<Mutex<LibraryState>>,
}

impl InMemoryLibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// トランザクションが状態のロックを保持しているか
    #[cfg(test)]
    pub(crate) fn is_locked(&self) -> bool {
        self.state.try_lock().is_err()
    }
}

#[async_trait]
impl LibraryStore for InMemoryLibraryStore {
    async fn begin(&self) -> Result<Box<dyn LibraryTransaction>, RepositoryError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryLibraryTransaction { guard, working }))
    }
}

/// インメモリトランザクション
pub struct InMemoryLibraryTransaction {
    guard: OwnedMutexGuard<LibraryState>,
    working: LibraryState,
}

#[async_trait]
impl LibraryTransaction for InMemoryLibraryTransaction {
    async fn find_book(&mut self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        Ok(self.working.books.get(&id).cloned())
    }

    async fn save_book(&mut self, book: &Book) -> Result<(), RepositoryError> {
        self.working.books.insert(book.id(), book.clone());
        Ok(())
    }

    async fn delete_book(&mut self, id: BookId) -> Result<(), RepositoryError> {
        self.working.books.remove(&id);
        // 外部キーの ON DELETE CASCADE と同じ扱い
        self.working.borrowings.retain(|b| b.book_id() != id);
        Ok(())
    }

    async fn isbn_exists(
        &mut self,
        isbn: &Isbn,
        excluding: Option<BookId>,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .working
            .books
            .values()
            .any(|b| b.details().isbn() == isbn && Some(b.id()) != excluding))
    }

    async fn find_member(&mut self, id: MemberId) -> Result<Option<Member>, RepositoryError> {
        Ok(self.working.members.get(&id).cloned())
    }

    async fn save_member(&mut self, member: &Member) -> Result<(), RepositoryError> {
        self.working.members.insert(member.id(), member.clone());
        Ok(())
    }

    async fn email_exists(&mut self, email: &Email) -> Result<bool, RepositoryError> {
        Ok(self.working.members.values().any(|m| m.email() == email))
    }

    async fn find_borrowing(
        &mut self,
        id: BorrowingId,
    ) -> Result<Option<Borrowing>, RepositoryError> {
        Ok(self
            .working
            .borrowings
            .iter()
            .find(|b| b.id() == id)
            .cloned())
    }

    async fn save_borrowing(&mut self, borrowing: &Borrowing) -> Result<(), RepositoryError> {
        match self
            .working
            .borrowings
            .iter_mut()
            .find(|b| b.id() == borrowing.id())
        {
            Some(existing) => *existing = borrowing.clone(),
            None => self.working.borrowings.push(borrowing.clone()),
        }
        Ok(())
    }

    async fn count_active_borrowings_for_book(
        &mut self,
        book_id: BookId,
    ) -> Result<u32, RepositoryError> {
        Ok(self.working.active_count(|b| b.book_id() == book_id))
    }

    async fn count_active_borrowings_for_member(
        &mut self,
        member_id: MemberId,
    ) -> Result<u32, RepositoryError> {
        Ok(self.working.active_count(|b| b.member_id() == member_id))
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let InMemoryLibraryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl BookRepository for InMemoryLibraryStore {
    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        Ok(self.state.lock().await.books.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError> {
        let state = self.state.lock().await;
        let mut books: Vec<Book> = state.books.values().cloned().collect();
        books.sort_by(|a, b| a.title().cmp(b.title()));
        Ok(books)
    }

    async fn find_available(&self) -> Result<Vec<Book>, RepositoryError> {
        let books = BookRepository::find_all(self).await?;
        Ok(books.into_iter().filter(|b| b.is_available()).collect())
    }
}

#[async_trait]
impl MemberRepository for InMemoryLibraryStore {
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, RepositoryError> {
        Ok(self.state.lock().await.members.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Member>, RepositoryError> {
        let state = self.state.lock().await;
        let mut members: Vec<Member> = state.members.values().cloned().collect();
        members.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(members)
    }

    async fn find_borrowers(&self) -> Result<Vec<Member>, RepositoryError> {
        let members = MemberRepository::find_all(self).await?;
        Ok(members
            .into_iter()
            .filter(|m| m.role() == Role::Member && m.can_borrow())
            .collect())
    }
}

#[async_trait]
impl BorrowingRepository for InMemoryLibraryStore {
    async fn find_by_id(&self, id: BorrowingId) -> Result<Option<Borrowing>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.borrowings.iter().find(|b| b.id() == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Borrowing>, RepositoryError> {
        Ok(self.state.lock().await.borrowings_newest_first(|_| true))
    }

    async fn find_by_member(&self, member_id: MemberId) -> Result<Vec<Borrowing>, RepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .borrowings_newest_first(|b| b.member_id() == member_id))
    }

    async fn find_by_member_and_status(
        &self,
        member_id: MemberId,
        status: BorrowingStatus,
    ) -> Result<Vec<Borrowing>, RepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .borrowings_newest_first(|b| b.member_id() == member_id && b.status() == status))
    }

    async fn find_active(&self) -> Result<Vec<Borrowing>, RepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .borrowings_newest_first(|b| b.is_active()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{BookDetails, Isbn};

    fn book() -> Book {
        let details = BookDetails::new(
            "Hands-on Rust".to_string(),
            "Herbert Wolverson".to_string(),
            Isbn::new("9781680508161".to_string()).unwrap(),
            "Effective learning through 2D game development".to_string(),
            None,
        )
        .unwrap();
        Book::new(BookId::new(), details, 2).unwrap()
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let store = InMemoryLibraryStore::new();
        let book = book();

        let mut tx = store.begin().await.unwrap();
        tx.save_book(&book).await.unwrap();
        tx.commit().await.unwrap();

        let found = BookRepository::find_by_id(&store, book.id()).await.unwrap();
        assert_eq!(found, Some(book));
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = InMemoryLibraryStore::new();
        let book = book();

        {
            let mut tx = store.begin().await.unwrap();
            tx.save_book(&book).await.unwrap();
            assert!(tx.find_book(book.id()).await.unwrap().is_some());
            // コミットせずに破棄
        }

        let found = BookRepository::find_by_id(&store, book.id()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_isbn_exists_excludes_own_book() {
        let store = InMemoryLibraryStore::new();
        let book = book();

        let mut tx = store.begin().await.unwrap();
        tx.save_book(&book).await.unwrap();
        let isbn = book.details().isbn().clone();
        assert!(tx.isbn_exists(&isbn, None).await.unwrap());
        assert!(!tx.isbn_exists(&isbn, Some(book.id())).await.unwrap());
    }
}

use library_catalog::adapter::driven::{ConsoleLogger, FixedClock, InMemoryLibraryStore};
use library_catalog::application::service::{
    BookApplicationService, BorrowingApplicationService, BorrowingFilter, BorrowingQueryService,
    MemberApplicationService, MemberQueryService,
};
use library_catalog::application::ApplicationError;
use library_catalog::domain::error::DomainError;
use library_catalog::domain::model::{
    Actor, Book, BookDetails, BookId, Borrowing, BorrowingId, BorrowingStatus, Email, Isbn,
    Member, MemberId, PasswordCredential, Role,
};
use library_catalog::domain::port::{
    BookRepository, LibraryStore, LibraryTransaction, LogLevel, Logger, PasswordHashError,
    PasswordHasher, RepositoryError,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn logger() -> Arc<dyn Logger> {
    Arc::new(ConsoleLogger::with_min_level(LogLevel::Error))
}

fn details(title: &str, isbn: &str) -> BookDetails {
    BookDetails::new(
        title.to_string(),
        "Test Author".to_string(),
        Isbn::new(isbn.to_string()).unwrap(),
        "A book used by the lifecycle tests".to_string(),
        None,
    )
    .unwrap()
}

// テスト用の軽量パスワードハッシュ
struct PlainPasswordHasher;

impl PasswordHasher for PlainPasswordHasher {
    fn hash(&self, password: &str) -> Result<PasswordCredential, PasswordHashError> {
        Ok(PasswordCredential::new(format!("plain:{}", password)))
    }

    fn verify(&self, password: &str, credential: &PasswordCredential) -> bool {
        credential.as_str() == format!("plain:{}", password)
    }
}

/// 保存済みの書籍・会員を用意したテスト用の図書館
struct Library {
    store: Arc<InMemoryLibraryStore>,
    books: BookApplicationService,
    members: MemberApplicationService,
    borrowings: BorrowingApplicationService,
    admin: Actor,
}

impl Library {
    async fn new(today: NaiveDate) -> Self {
        let store = Arc::new(InMemoryLibraryStore::new());
        Self::with_store(store.clone(), store, today).await
    }

    async fn with_store(
        inspect: Arc<InMemoryLibraryStore>,
        store: Arc<dyn LibraryStore>,
        today: NaiveDate,
    ) -> Self {
        let members =
            MemberApplicationService::new(store.clone(), Arc::new(PlainPasswordHasher), logger());
        let admin = members
            .ensure_admin_account(
                "Admin".to_string(),
                Email::new("admin@library.com".to_string()).unwrap(),
                "password",
            )
            .await
            .unwrap()
            .unwrap();

        Self {
            store: inspect,
            books: BookApplicationService::new(store.clone(), logger()),
            members,
            borrowings: BorrowingApplicationService::new(
                store,
                Arc::new(FixedClock::new(today)),
                logger(),
            ),
            admin: admin.as_actor(),
        }
    }

    async fn add_book(&self, title: &str, isbn: &str, quantity: u32) -> Book {
        self.books
            .create_book(&self.admin, details(title, isbn), quantity)
            .await
            .unwrap()
    }

    async fn add_member(&self, name: &str, email: &str) -> Member {
        self.members
            .register_member(
                name.to_string(),
                Email::new(email.to_string()).unwrap(),
                "password123",
            )
            .await
            .unwrap()
    }

    async fn book(&self, id: BookId) -> Book {
        BookRepository::find_by_id(self.store.as_ref(), id)
            .await
            .unwrap()
            .unwrap()
    }

    fn query_service(&self, today: NaiveDate) -> BorrowingQueryService {
        BorrowingQueryService::new(self.store.clone(), Arc::new(FixedClock::new(today)))
    }
}

// 書籍を1冊貸し出すと貸出可能数が1減り、返却期限は7日後になる
#[tokio::test]
async fn test_create_borrowing_decrements_available() {
    let library = Library::new(date(2024, 1, 3)).await;
    let book = library.add_book("Zero To Production", "9798862839542", 3).await;
    let member = library.add_member("Member A", "a@example.com").await;

    let borrowing = library
        .borrowings
        .create_borrowing(&library.admin, member.id(), book.id(), date(2024, 1, 3))
        .await
        .unwrap();

    assert_eq!(borrowing.status(), BorrowingStatus::Borrowed);
    assert_eq!(borrowing.due_date(), date(2024, 1, 10));
    assert_eq!(library.book(book.id()).await.available(), 2);
}

// 貸出可能数が0の書籍は貸し出せず、在庫は変化しない
#[tokio::test]
async fn test_create_borrowing_fails_when_unavailable() {
    let library = Library::new(date(2024, 1, 3)).await;
    let book = library.add_book("Rust in Action", "9781617294556", 1).await;
    let first = library.add_member("First", "first@example.com").await;
    let second = library.add_member("Second", "second@example.com").await;

    library
        .borrowings
        .create_borrowing(&library.admin, first.id(), book.id(), date(2024, 1, 3))
        .await
        .unwrap();
    let result = library
        .borrowings
        .create_borrowing(&library.admin, second.id(), book.id(), date(2024, 1, 3))
        .await;

    assert!(matches!(
        result,
        Err(ApplicationError::DomainError(DomainError::Unavailable(_)))
    ));
    assert_eq!(library.book(book.id()).await.available(), 0);
}

// 返却期限を過ぎた貸出中の貸出は延滞として一覧に出る
#[tokio::test]
async fn test_overdue_borrowing_is_reported() {
    let library = Library::new(date(2024, 1, 3)).await;
    let book = library.add_book("Programming Rust", "9781492052593", 2).await;
    let member = library.add_member("Member A", "a@example.com").await;

    let borrowing = library
        .borrowings
        .create_borrowing(&library.admin, member.id(), book.id(), date(2024, 1, 3))
        .await
        .unwrap();
    assert!(borrowing.is_overdue(date(2024, 1, 15)));

    let queries = library.query_service(date(2024, 1, 15));
    let overdue = queries.overdue_borrowings(&library.admin).await.unwrap();
    assert_eq!(overdue, vec![borrowing.clone()]);

    let filtered = queries
        .list_borrowings(&library.admin, Some(BorrowingFilter::Overdue))
        .await
        .unwrap();
    assert_eq!(filtered, vec![borrowing]);

    // 返却期限当日は延滞ではない
    let on_due_date = library.query_service(date(2024, 1, 10));
    assert!(on_due_date
        .overdue_borrowings(&library.admin)
        .await
        .unwrap()
        .is_empty());
}

// 返却すると貸出可能数が戻り、二重返却は在庫を変えずに失敗する
#[tokio::test]
async fn test_return_then_second_return_fails() {
    let library = Library::new(date(2024, 1, 8)).await;
    let book = library.add_book("Rust Atomics and Locks", "9781098119447", 2).await;
    let member = library.add_member("Member A", "a@example.com").await;

    let borrowing = library
        .borrowings
        .create_borrowing(&library.admin, member.id(), book.id(), date(2024, 1, 3))
        .await
        .unwrap();
    assert_eq!(library.book(book.id()).await.available(), 1);

    let returned = library
        .borrowings
        .return_borrowing(&library.admin, borrowing.id())
        .await
        .unwrap();
    assert_eq!(returned.status(), BorrowingStatus::Returned);
    assert_eq!(returned.return_date(), Some(date(2024, 1, 8)));
    assert_eq!(returned.borrow_date(), date(2024, 1, 3));
    assert_eq!(library.book(book.id()).await.available(), 2);

    let second = library
        .borrowings
        .return_borrowing(&library.admin, borrowing.id())
        .await;
    assert!(matches!(
        second,
        Err(ApplicationError::DomainError(DomainError::AlreadyReturned))
    ));
    assert_eq!(library.book(book.id()).await.available(), 2);
}

// 他の書籍の貸出は蔵書数の変更に影響しない
#[tokio::test]
async fn test_resize_ignores_borrowings_of_other_books() {
    let library = Library::new(date(2024, 1, 3)).await;
    let book = library.add_book("Hands-on Rust", "9781680508161", 5).await;
    let other = library.add_book("Rust for Rustaceans", "9781718501850", 2).await;
    let first = library.add_member("First", "first@example.com").await;
    let second = library.add_member("Second", "second@example.com").await;
    for member in [&first, &second] {
        library
            .borrowings
            .create_borrowing(&library.admin, member.id(), other.id(), date(2024, 1, 3))
            .await
            .unwrap();
    }

    let resized = library
        .books
        .update_book(
            &library.admin,
            book.id(),
            details("Hands-on Rust", "9781680508161"),
            1,
        )
        .await
        .unwrap();
    assert_eq!(resized.quantity(), 1);
    assert_eq!(resized.available(), 1);
}

// 貸出中の冊数を下回る蔵書数には変更できず、ちょうど同数なら貸出可能数は0
#[tokio::test]
async fn test_resize_respects_active_borrowings() {
    let library = Library::new(date(2024, 1, 3)).await;
    let book = library.add_book("Hands-on Rust", "9781680508161", 3).await;
    for (name, email) in [("First", "first@example.com"), ("Second", "second@example.com")] {
        let member = library.add_member(name, email).await;
        library
            .borrowings
            .create_borrowing(&library.admin, member.id(), book.id(), date(2024, 1, 3))
            .await
            .unwrap();
    }

    let too_small = library
        .books
        .update_book(
            &library.admin,
            book.id(),
            details("Hands-on Rust", "9781680508161"),
            1,
        )
        .await;
    assert!(matches!(
        too_small,
        Err(ApplicationError::DomainError(DomainError::Capacity {
            requested: 1,
            borrowed: 2
        }))
    ));
    assert_eq!(library.book(book.id()).await.quantity(), 3);

    let exact = library
        .books
        .update_book(
            &library.admin,
            book.id(),
            details("Hands-on Rust", "9781680508161"),
            2,
        )
        .await
        .unwrap();
    assert_eq!(exact.available(), 0);
}

// 貸出中の会員の貸出許可は停止できない
#[tokio::test]
async fn test_toggle_permission_blocked_by_active_borrowing() {
    let library = Library::new(date(2024, 1, 3)).await;
    let book = library.add_book("Rust in Action", "9781617294556", 1).await;
    let member = library.add_member("Member A", "a@example.com").await;
    let borrowing = library
        .borrowings
        .create_borrowing(&library.admin, member.id(), book.id(), date(2024, 1, 3))
        .await
        .unwrap();

    let result = library
        .members
        .toggle_borrowing_permission(&library.admin, member.id())
        .await;
    assert!(matches!(
        result,
        Err(ApplicationError::DomainError(DomainError::Conflict(_)))
    ));

    // 返却後は停止でき、停止中の会員は借りられない
    library
        .borrowings
        .return_borrowing(&library.admin, borrowing.id())
        .await
        .unwrap();
    let suspended = library
        .members
        .toggle_borrowing_permission(&library.admin, member.id())
        .await
        .unwrap();
    assert!(!suspended.can_borrow());

    let refused = library
        .borrowings
        .quick_borrow(&suspended.as_actor(), book.id())
        .await;
    assert!(matches!(
        refused,
        Err(ApplicationError::DomainError(DomainError::NotAuthorized(_)))
    ));
    assert_eq!(library.book(book.id()).await.available(), 1);

    // もう一度切り替えると再び借りられる
    let restored = library
        .members
        .toggle_borrowing_permission(&library.admin, member.id())
        .await
        .unwrap();
    assert!(restored.can_borrow());
}

#[tokio::test]
async fn test_book_with_active_borrowing_cannot_be_deleted() {
    let library = Library::new(date(2024, 1, 3)).await;
    let book = library.add_book("Rust in Action", "9781617294556", 2).await;
    let member = library.add_member("Member A", "a@example.com").await;
    let borrowing = library
        .borrowings
        .quick_borrow(&member.as_actor(), book.id())
        .await
        .unwrap();

    let result = library.books.delete_book(&library.admin, book.id()).await;
    assert!(matches!(
        result,
        Err(ApplicationError::DomainError(DomainError::Conflict(_)))
    ));

    library
        .borrowings
        .return_borrowing(&library.admin, borrowing.id())
        .await
        .unwrap();
    library
        .books
        .delete_book(&library.admin, book.id())
        .await
        .unwrap();
    assert!(BookRepository::find_by_id(library.store.as_ref(), book.id())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_quick_borrow_uses_today() {
    let library = Library::new(date(2024, 3, 1)).await;
    let book = library.add_book("Zero To Production", "9798862839542", 1).await;
    let member = library.add_member("Member A", "a@example.com").await;

    let borrowing = library
        .borrowings
        .quick_borrow(&member.as_actor(), book.id())
        .await
        .unwrap();
    assert_eq!(borrowing.member_id(), member.id());
    assert_eq!(borrowing.borrow_date(), date(2024, 3, 1));
    assert_eq!(borrowing.due_date(), date(2024, 3, 8));
}

#[tokio::test]
async fn test_admin_only_operations_reject_members() {
    let library = Library::new(date(2024, 1, 3)).await;
    let book = library.add_book("Rust in Action", "9781617294556", 2).await;
    let member = library.add_member("Member A", "a@example.com").await;
    let actor = member.as_actor();

    let create = library
        .borrowings
        .create_borrowing(&actor, member.id(), book.id(), date(2024, 1, 3))
        .await;
    assert!(matches!(
        create,
        Err(ApplicationError::DomainError(DomainError::NotAuthorized(_)))
    ));

    let borrowing = library.borrowings.quick_borrow(&actor, book.id()).await.unwrap();
    let give_back = library.borrowings.return_borrowing(&actor, borrowing.id()).await;
    assert!(matches!(
        give_back,
        Err(ApplicationError::DomainError(DomainError::NotAuthorized(_)))
    ));

    let toggle = library
        .members
        .toggle_borrowing_permission(&actor, member.id())
        .await;
    assert!(matches!(
        toggle,
        Err(ApplicationError::DomainError(DomainError::NotAuthorized(_)))
    ));

    let overdue = library
        .query_service(date(2024, 1, 3))
        .overdue_borrowings(&actor)
        .await;
    assert!(matches!(
        overdue,
        Err(ApplicationError::DomainError(DomainError::NotAuthorized(_)))
    ));
}

#[tokio::test]
async fn test_members_only_see_their_own_borrowings() {
    let library = Library::new(date(2024, 1, 3)).await;
    let book = library.add_book("Programming Rust", "9781492052593", 3).await;
    let alice = library.add_member("Alice", "alice@example.com").await;
    let bob = library.add_member("Bob", "bob@example.com").await;

    let alices = library
        .borrowings
        .quick_borrow(&alice.as_actor(), book.id())
        .await
        .unwrap();
    let bobs = library
        .borrowings
        .quick_borrow(&bob.as_actor(), book.id())
        .await
        .unwrap();

    let queries = library.query_service(date(2024, 1, 3));
    let visible = queries.list_borrowings(&alice.as_actor(), None).await.unwrap();
    assert_eq!(visible, vec![alices.clone()]);

    let all = queries.list_borrowings(&library.admin, None).await.unwrap();
    assert_eq!(all.len(), 2);

    let denied = queries.get_borrowing(&alice.as_actor(), bobs.id()).await;
    assert!(matches!(
        denied,
        Err(ApplicationError::DomainError(DomainError::NotAuthorized(_)))
    ));
    let own = queries.get_borrowing(&alice.as_actor(), alices.id()).await.unwrap();
    assert_eq!(own, alices);
}

#[tokio::test]
async fn test_member_history_and_reminders() {
    let library = Library::new(date(2024, 1, 3)).await;
    let first = library.add_book("Rust in Action", "9781617294556", 1).await;
    let second = library.add_book("Programming Rust", "9781492052593", 1).await;
    let member = library.add_member("Member A", "a@example.com").await;

    let early = library
        .borrowings
        .create_borrowing(&library.admin, member.id(), first.id(), date(2024, 1, 1))
        .await
        .unwrap();
    let late = library
        .borrowings
        .create_borrowing(&library.admin, member.id(), second.id(), date(2024, 1, 3))
        .await
        .unwrap();

    // 2024-01-06: early は期限まで2日、late は4日
    let queries = library.query_service(date(2024, 1, 6));
    let reminders = queries
        .due_soon_reminders(&member.as_actor(), member.id(), 3)
        .await
        .unwrap();
    assert_eq!(reminders, vec![early.clone()]);

    let wider = queries
        .due_soon_reminders(&member.as_actor(), member.id(), 4)
        .await
        .unwrap();
    assert_eq!(wider, vec![early.clone(), late.clone()]);

    library
        .borrowings
        .return_borrowing(&library.admin, early.id())
        .await
        .unwrap();
    let history = queries.member_history(&member.as_actor(), member.id()).await.unwrap();
    assert_eq!(history.active, vec![late]);
    assert_eq!(history.returned.len(), 1);
    assert_eq!(history.returned[0].id(), early.id());
}

#[tokio::test]
async fn test_member_listing_counts_borrowings() {
    let library = Library::new(date(2024, 1, 3)).await;
    let book = library.add_book("Rust in Action", "9781617294556", 2).await;
    let member = library.add_member("Member A", "a@example.com").await;
    let first = library
        .borrowings
        .quick_borrow(&member.as_actor(), book.id())
        .await
        .unwrap();
    library
        .borrowings
        .return_borrowing(&library.admin, first.id())
        .await
        .unwrap();
    library
        .borrowings
        .quick_borrow(&member.as_actor(), book.id())
        .await
        .unwrap();

    let queries = MemberQueryService::new(library.store.clone(), library.store.clone());
    let summaries = queries.list_members_with_counts(&library.admin).await.unwrap();
    let summary = summaries
        .iter()
        .find(|s| s.member.id() == member.id())
        .unwrap();
    assert_eq!(summary.total_borrowings, 2);
    assert_eq!(summary.active_borrowings, 1);

    let borrowers = queries.eligible_borrowers(&library.admin).await.unwrap();
    assert_eq!(borrowers, vec![member]);
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let library = Library::new(date(2024, 1, 3)).await;
    library.add_member("Member A", "a@example.com").await;

    let result = library
        .members
        .register_member(
            "Another".to_string(),
            Email::new("A@Example.com".to_string()).unwrap(),
            "password123",
        )
        .await;
    assert!(matches!(
        result,
        Err(ApplicationError::DomainError(DomainError::AlreadyExists(_)))
    ));
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let library = Library::new(date(2024, 1, 3)).await;
    let book = library.add_book("Rust in Action", "9781617294556", 1).await;

    let unknown_member = library
        .borrowings
        .create_borrowing(&library.admin, MemberId::new(), book.id(), date(2024, 1, 3))
        .await;
    assert!(matches!(unknown_member, Err(ApplicationError::NotFound(_))));

    let unknown_borrowing = library
        .borrowings
        .return_borrowing(&library.admin, BorrowingId::new())
        .await;
    assert!(matches!(unknown_borrowing, Err(ApplicationError::NotFound(_))));
    assert_eq!(library.book(book.id()).await.available(), 1);
}

// 貸出の保存に失敗するストア
struct FailingStore {
    inner: Arc<InMemoryLibraryStore>,
}

struct FailingTransaction {
    inner: Box<dyn LibraryTransaction>,
}

#[async_trait]
impl LibraryStore for FailingStore {
    async fn begin(&self) -> Result<Box<dyn LibraryTransaction>, RepositoryError> {
        let inner = self.inner.begin().await?;
        Ok(Box::new(FailingTransaction { inner }))
    }
}

#[async_trait]
impl LibraryTransaction for FailingTransaction {
    async fn find_book(&mut self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        self.inner.find_book(id).await
    }

    async fn save_book(&mut self, book: &Book) -> Result<(), RepositoryError> {
        self.inner.save_book(book).await
    }

    async fn delete_book(&mut self, id: BookId) -> Result<(), RepositoryError> {
        self.inner.delete_book(id).await
    }

    async fn isbn_exists(
        &mut self,
        isbn: &Isbn,
        excluding: Option<BookId>,
    ) -> Result<bool, RepositoryError> {
        self.inner.isbn_exists(isbn, excluding).await
    }

    async fn find_member(&mut self, id: MemberId) -> Result<Option<Member>, RepositoryError> {
        self.inner.find_member(id).await
    }

    async fn save_member(&mut self, member: &Member) -> Result<(), RepositoryError> {
        self.inner.save_member(member).await
    }

    async fn email_exists(&mut self, email: &Email) -> Result<bool, RepositoryError> {
        self.inner.email_exists(email).await
    }

    async fn find_borrowing(
        &mut self,
        id: BorrowingId,
    ) -> Result<Option<Borrowing>, RepositoryError> {
        self.inner.find_borrowing(id).await
    }

    async fn save_borrowing(&mut self, _borrowing: &Borrowing) -> Result<(), RepositoryError> {
        Err(RepositoryError::OperationFailed(
            "connection lost".to_string(),
        ))
    }

    async fn count_active_borrowings_for_book(
        &mut self,
        book_id: BookId,
    ) -> Result<u32, RepositoryError> {
        self.inner.count_active_borrowings_for_book(book_id).await
    }

    async fn count_active_borrowings_for_member(
        &mut self,
        member_id: MemberId,
    ) -> Result<u32, RepositoryError> {
        self.inner.count_active_borrowings_for_member(member_id).await
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.inner.commit().await
    }
}

// 書籍の更新後に貸出の保存が失敗しても、書籍の貸出可能数は変わらない
#[tokio::test]
async fn test_failed_borrowing_leaves_book_unchanged() {
    let inner = Arc::new(InMemoryLibraryStore::new());
    let failing: Arc<dyn LibraryStore> = Arc::new(FailingStore {
        inner: inner.clone(),
    });
    let library = Library::with_store(inner.clone(), failing, date(2024, 1, 3)).await;
    let book = library.add_book("Rust in Action", "9781617294556", 2).await;
    let member = library.add_member("Member A", "a@example.com").await;

    let result = library
        .borrowings
        .create_borrowing(&library.admin, member.id(), book.id(), date(2024, 1, 3))
        .await;
    assert!(matches!(result, Err(ApplicationError::RepositoryError(_))));

    assert_eq!(library.book(book.id()).await.available(), 2);
    let borrowings = library
        .query_service(date(2024, 1, 3))
        .list_borrowings(&library.admin, None)
        .await
        .unwrap();
    assert!(borrowings.is_empty());
}

// 返却中に貸出の保存が失敗しても、書籍の貸出可能数と貸出の状態は変わらない
#[tokio::test]
async fn test_failed_return_leaves_book_and_borrowing_unchanged() {
    let library = Library::new(date(2024, 1, 8)).await;
    let book = library.add_book("Rust in Action", "9781617294556", 2).await;
    let member = library.add_member("Member A", "a@example.com").await;
    let borrowing = library
        .borrowings
        .create_borrowing(&library.admin, member.id(), book.id(), date(2024, 1, 3))
        .await
        .unwrap();
    assert_eq!(library.book(book.id()).await.available(), 1);

    let failing = BorrowingApplicationService::new(
        Arc::new(FailingStore {
            inner: library.store.clone(),
        }),
        Arc::new(FixedClock::new(date(2024, 1, 8))),
        logger(),
    );
    let result = failing.return_borrowing(&library.admin, borrowing.id()).await;
    assert!(matches!(result, Err(ApplicationError::RepositoryError(_))));

    assert_eq!(library.book(book.id()).await.available(), 1);
    let stored = library
        .query_service(date(2024, 1, 8))
        .get_borrowing(&library.admin, borrowing.id())
        .await
        .unwrap();
    assert_eq!(stored.status(), BorrowingStatus::Borrowed);
    assert_eq!(stored.return_date(), None);

    // ストアが回復すれば同じ貸出を返却できる
    let returned = library
        .borrowings
        .return_borrowing(&library.admin, borrowing.id())
        .await
        .unwrap();
    assert_eq!(returned.status(), BorrowingStatus::Returned);
    assert_eq!(library.book(book.id()).await.available(), 2);
}

// 返却期限が日付の範囲を超える貸出日は拒否され、在庫は変わらない
#[tokio::test]
async fn test_borrow_date_at_calendar_end_is_rejected() {
    let library = Library::new(date(2024, 1, 3)).await;
    let book = library.add_book("Rust in Action", "9781617294556", 1).await;
    let member = library.add_member("Member A", "a@example.com").await;

    let result = library
        .borrowings
        .create_borrowing(&library.admin, member.id(), book.id(), NaiveDate::MAX)
        .await;
    assert!(matches!(
        result,
        Err(ApplicationError::DomainError(DomainError::InvalidValue(_)))
    ));
    assert_eq!(library.book(book.id()).await.available(), 1);
}

#[tokio::test]
async fn test_member_changes_own_password() {
    let library = Library::new(date(2024, 1, 3)).await;
    let member = library.add_member("Member A", "a@example.com").await;

    let wrong = library
        .members
        .change_password(&member.as_actor(), member.id(), "not-my-password", "new-password")
        .await;
    assert!(matches!(
        wrong,
        Err(ApplicationError::DomainError(DomainError::IncorrectPassword))
    ));

    let updated = library
        .members
        .change_password(&member.as_actor(), member.id(), "password123", "new-password")
        .await
        .unwrap();
    assert!(PlainPasswordHasher.verify("new-password", updated.credential()));

    // 変更後は古いパスワードでは変更できない
    let stale = library
        .members
        .change_password(&member.as_actor(), member.id(), "password123", "another-one")
        .await;
    assert!(matches!(
        stale,
        Err(ApplicationError::DomainError(DomainError::IncorrectPassword))
    ));
}

#[tokio::test]
async fn test_admin_is_created_once() {
    let library = Library::new(date(2024, 1, 3)).await;
    let again = library
        .members
        .ensure_admin_account(
            "Admin".to_string(),
            Email::new("admin@library.com".to_string()).unwrap(),
            "password",
        )
        .await
        .unwrap();
    assert!(again.is_none());
    assert_eq!(library.admin.role(), Role::Admin);
}

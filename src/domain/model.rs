// ドメインモデル（エンティティと値オブジェクト）

mod book;
mod borrowing;
mod member;
mod value_objects;

pub use value_objects::{
    BookDetails, BookId, BorrowingId, BorrowingStatus, CoverImageUrl, Email, Isbn, MemberId,
    PasswordCredential, Role,
};

pub use book::Book;
pub use borrowing::{Borrowing, LOAN_PERIOD_DAYS};
pub use member::{Actor, Member};

// 駆動される側アダプター（ストア・リポジトリ・ロガーなどの実装）

mod argon2_password_hasher;
mod book_repository;
mod borrowing_repository;
mod console_logger;
mod in_memory_library_store;
mod member_repository;
mod mysql_library_store;
mod mysql_rows;
mod system_clock;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use book_repository::MySqlBookRepository;
pub use borrowing_repository::MySqlBorrowingRepository;
pub use console_logger::{ConsoleLogger, LogEntry};
pub use in_memory_library_store::{InMemoryLibraryStore, InMemoryLibraryTransaction};
pub use member_repository::MySqlMemberRepository;
pub use mysql_library_store::{MySqlLibraryStore, MySqlLibraryTransaction};
pub use system_clock::{FixedClock, SystemClock};

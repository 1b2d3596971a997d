// アプリケーション層
// ユースケースごとにトランザクションを開き、ドメインの操作を組み立てる

pub mod error;
pub mod service;

pub use error::ApplicationError;

// ドメイン層
// 外部に依存しないビジネスルールを配置する

pub mod error;
pub mod model;
pub mod policy;
pub mod port;
pub mod reminder;
pub mod service;

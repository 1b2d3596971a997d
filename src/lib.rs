// 図書館蔵書管理システム
// 書籍・会員・貸出の整合性を管理するヘキサゴナルアーキテクチャ構成

pub mod adapter;
pub mod application;
pub mod domain;

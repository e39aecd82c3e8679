//! 12条点検 入力フォーム・点検台帳管理
//!
//! 基本情報と劣化項目を入力し、CSVの点検台帳に追記・検索・編集する。

pub mod cli;
pub mod config;
pub mod draft;
pub mod encoding;
pub mod error;
pub mod export;
pub mod form;
pub mod master;
pub mod session;
pub mod store;
pub mod vocabulary;

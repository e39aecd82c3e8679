//! 12条点検 共通ライブラリ
//!
//! CLIから利用される型とファイルI/Oを含まない処理:
//! 点検データの型、読み仮名の正規化、語彙マスタと入力補完、CSVの読み書き

pub mod types;
pub mod kana;
pub mod csv;
pub mod columns;
pub mod vocabulary;
pub mod suggest;
pub mod error;

pub use types::{DeteriorationItem, InspectionHeader, ItemDraft, PersistedRow, Scope};
pub use vocabulary::{Category, CategoryIndex, VocabularyEntry, VocabularyIndex};
pub use suggest::suggest;
pub use error::{Error, LoadError, Result};

//! 語彙マスタの読み込み
//!
//! 読めなかった場合も処理は止めず、警告と組み込みの既定語彙を返す。

use crate::encoding;
use std::path::Path;
use tenken_common::{Error, LoadError, VocabularyIndex};

/// マスタファイルを読み込む
///
/// 失敗時は `(既定語彙, Some(警告))`。
pub fn load_vocabulary(path: &Path) -> (VocabularyIndex, Option<LoadError>) {
    match read_vocabulary(path) {
        Ok(index) => {
            tracing::debug!(path = %path.display(), entries = index.entries().len(), "マスタを読み込みました");
            (index, None)
        }
        Err(e) => {
            tracing::warn!(error = %e, "マスタを読み込めないため既定の語彙を使います");
            (VocabularyIndex::builtin(), Some(e))
        }
    }
}

fn read_vocabulary(path: &Path) -> Result<VocabularyIndex, LoadError> {
    if !path.exists() {
        return Err(LoadError::Missing(path.display().to_string()));
    }
    let bytes = std::fs::read(path).map_err(|_| LoadError::Missing(path.display().to_string()))?;
    parse_vocabulary(&bytes)
}

/// バイト列からマスタを解釈する
pub fn parse_vocabulary(bytes: &[u8]) -> Result<VocabularyIndex, LoadError> {
    let mut no_columns = false;
    let decoded = encoding::decode_with(bytes, |text| {
        VocabularyIndex::from_csv_str(text).map_err(|e| {
            if matches!(e, Error::Load(LoadError::NoColumns)) {
                no_columns = true;
            }
            e
        })
    });

    match decoded {
        Some((index, _)) => Ok(index),
        None if no_columns => Err(LoadError::NoColumns),
        None => Err(LoadError::Undecodable { tried: encoding::tried_labels() }),
    }
}

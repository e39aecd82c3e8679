//! エラー型定義

use thiserror::Error;

/// 語彙マスタ読み込みの警告
///
/// いずれも致命的ではなく、呼び出し側は既定語彙にフォールバックする。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("マスタファイルが見つかりません: {0}")]
    Missing(String),

    #[error("マスタファイルを読み込めません（試行: {tried}）")]
    Undecodable { tried: String },

    #[error("マスタに場所・劣化名の列がありません")]
    NoColumns,
}

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("入力エラー: {0}")]
    Validation(String),

    #[error("CSV解析エラー（{line}行目）: {message}")]
    Csv { line: usize, message: String },

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_validation() {
        let error = Error::Validation("場所を入力してください".to_string());
        assert_eq!(format!("{}", error), "入力エラー: 場所を入力してください");
    }

    #[test]
    fn test_error_display_csv() {
        let error = Error::Csv { line: 3, message: "引用符が閉じていません".to_string() };
        let display = format!("{}", error);
        assert!(display.contains("3行目"));
        assert!(display.contains("引用符"));
    }

    #[test]
    fn test_error_from_load() {
        let error: Error = LoadError::NoColumns.into();
        assert!(matches!(error, Error::Load(LoadError::NoColumns)));
        assert_eq!(format!("{}", error), "マスタに場所・劣化名の列がありません");
    }

    #[test]
    fn test_load_error_undecodable() {
        let error = LoadError::Undecodable { tried: "UTF-8, Shift_JIS".to_string() };
        assert!(format!("{}", error).contains("UTF-8, Shift_JIS"));
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TenkenError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("入力エラー: {0}")]
    Validation(String),

    #[error("指定された行が見つかりません: {index}（件数: {len}）")]
    NotFound { index: usize, len: usize },

    #[error("保存エラー: {0}")]
    Persistence(String),

    #[error("マスタ読み込みエラー: {0}")]
    Load(#[from] tenken_common::LoadError),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("入力操作エラー: {0}")]
    Input(String),

    #[error("{0}")]
    Common(tenken_common::Error),
}

impl From<tenken_common::Error> for TenkenError {
    fn from(err: tenken_common::Error) -> Self {
        match err {
            tenken_common::Error::Validation(msg) => TenkenError::Validation(msg),
            tenken_common::Error::Load(load) => TenkenError::Load(load),
            other => TenkenError::Common(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, TenkenError>;

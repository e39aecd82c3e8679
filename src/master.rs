//! 既定の語彙マスタの作成
//!
//! Excelで開けるよう Shift_JIS で書き出す。

use crate::encoding;
use crate::error::{Result, TenkenError};
use std::path::Path;
use tenken_common::csv;
use tenken_common::vocabulary::DEFAULT_PAIRS;

/// 既定マスタのCSV文字列
pub fn default_master_csv(with_readings: bool) -> String {
    let header: &[&str] = if with_readings {
        &["場所", "場所_読み", "劣化名", "劣化名_読み"]
    } else {
        &["場所", "劣化名"]
    };

    let rows: Vec<Vec<&str>> = DEFAULT_PAIRS
        .iter()
        .map(|&(location, location_key, deterioration, deterioration_key)| {
            if with_readings {
                vec![location, location_key, deterioration, deterioration_key]
            } else {
                vec![location, deterioration]
            }
        })
        .collect();

    csv::to_csv_string(header, &rows)
}

/// 既定マスタを書き出す。既にあれば `force` のときだけ上書き
pub fn init_master(path: &Path, force: bool, with_readings: bool) -> Result<usize> {
    if path.exists() && !force {
        return Err(TenkenError::Validation(format!(
            "マスタファイルが既にあります: {}（上書きは --force）",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let bytes = encoding::encode_shift_jis(&default_master_csv(with_readings))?;
    std::fs::write(path, bytes)
        .map_err(|e| TenkenError::Persistence(format!("{}: {}", path.display(), e)))?;

    tracing::info!(path = %path.display(), rows = DEFAULT_PAIRS.len(), "既定マスタを作成しました");
    Ok(DEFAULT_PAIRS.len())
}

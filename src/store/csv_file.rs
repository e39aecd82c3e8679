//! CSVファイルの台帳
//!
//! 読み込みは文字コードを順に試し、書き出しは常にBOM付きUTF-8。

use super::RecordStore;
use crate::encoding;
use crate::error::{Result, TenkenError};
use std::path::{Path, PathBuf};
use tenken_common::{columns, csv, PersistedRow};

#[derive(Debug, Clone)]
pub struct CsvRecordStore {
    path: PathBuf,
}

impl CsvRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn persistence_error(&self, e: impl std::fmt::Display) -> TenkenError {
        TenkenError::Persistence(format!("{}: {}", self.path.display(), e))
    }
}

/// 台帳CSVのバイト列を解釈する
pub fn decode_rows(bytes: &[u8]) -> Option<Vec<PersistedRow>> {
    encoding::decode_with(bytes, |text| {
        csv::parse(text).and_then(|records| columns::rows_from_records(&records))
    })
    .map(|(rows, _)| rows)
}

/// 台帳行をBOM付きUTF-8のCSVにする
pub fn encode_rows(rows: &[PersistedRow]) -> Vec<u8> {
    encoding::encode_utf8_with_bom(&columns::rows_to_csv(rows))
}

impl RecordStore for CsvRecordStore {
    fn load(&self) -> Result<Vec<PersistedRow>> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "台帳ファイルがないため空として扱います");
            return Ok(Vec::new());
        }

        let bytes = std::fs::read(&self.path).map_err(|e| self.persistence_error(e))?;
        let rows = decode_rows(&bytes).ok_or_else(|| {
            self.persistence_error(format!(
                "台帳を読み込めません（試行: {}）",
                encoding::tried_labels()
            ))
        })?;

        tracing::debug!(path = %self.path.display(), rows = rows.len(), "台帳を読み込みました");
        Ok(rows)
    }

    fn write_all(&mut self, rows: &[PersistedRow]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.persistence_error(e))?;
            }
        }

        std::fs::write(&self.path, encode_rows(rows)).map_err(|e| self.persistence_error(e))?;
        tracing::debug!(path = %self.path.display(), rows = rows.len(), "台帳を書き込みました");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(number: u32) -> PersistedRow {
        PersistedRow {
            inspection_date: "2025-04-01".into(),
            inspector_name: "山田".into(),
            site_name: "A現場".into(),
            building_name: "1号棟".into(),
            remarks: "備考, カンマ入り".into(),
            number,
            location: "屋上".into(),
            deterioration_name: "漏水".into(),
            photo_number: format!("P{}", number),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path().join("none.csv"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_write_creates_parent_and_bom() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("inspection_data.csv");
        let mut store = CsvRecordStore::new(&path);
        store.write_all(&[sample(1)]).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(encoding::UTF8_BOM));
        assert_eq!(store.load().unwrap(), vec![sample(1)]);
    }

    #[test]
    fn test_reads_shift_jis_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.csv");
        let text = "点検日,点検者名,現場名,建物名,備考,劣化番号,場所,劣化名,写真番号\r\n\
                    2024-10-01,田中,B現場,2号棟,,1,外壁,腐食,\r\n";
        std::fs::write(&path, encoding::encode_shift_jis(text).unwrap()).unwrap();

        let rows = CsvRecordStore::new(&path).load().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].inspector_name, "田中");
        assert_eq!(rows[0].deterioration_name, "腐食");
    }

    #[test]
    fn test_unreadable_file_is_persistence_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        std::fs::write(&path, "id,memo\n1,x\n").unwrap();

        let err = CsvRecordStore::new(&path).load().unwrap_err();
        assert!(matches!(err, TenkenError::Persistence(_)));
    }

    #[test]
    fn test_append_keeps_unknown_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inspection_data.csv");
        std::fs::write(&path, "現場ID,点検日,現場名,建物名,場所,劣化名\nX-001,2025-04-01,A現場,1号棟,屋上,漏水\n").unwrap();

        let mut store = CsvRecordStore::new(&path);
        store.append(&[sample(1)]).unwrap();

        let text = String::from_utf8(std::fs::read(&path).unwrap()).unwrap();
        assert!(text.lines().next().unwrap().ends_with(",現場ID"));
        let rows = store.load().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number, 0);
        assert_eq!(rows[0].extra_value("現場ID"), Some("X-001"));
        assert_eq!(rows[1].extra_value("現場ID"), Some(""));
    }

    #[test]
    fn test_write_to_directory_path_fails() {
        let dir = tempdir().unwrap();
        let mut store = CsvRecordStore::new(dir.path());
        let err = store.write_all(&[sample(1)]).unwrap_err();
        assert!(matches!(err, TenkenError::Persistence(_)));
    }
}

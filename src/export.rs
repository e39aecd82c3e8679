//! 台帳の書き出し
//!
//! 検索で絞り込んだ行を、台帳と同じ形式のCSVかExcelで保存する。

use crate::cli::ExportFormat;
use crate::error::{Result, TenkenError};
use crate::store::csv_file::encode_rows;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook};
use std::path::{Path, PathBuf};
use tenken_common::columns::{header_for, row_cells};
use tenken_common::PersistedRow;

const DEFAULT_FILE_STEM: &str = "点検台帳";
const SHEET_NAME: &str = "点検データ";

fn output_path_for_format(output: &Path, extension: &str) -> PathBuf {
    if output.is_dir() {
        output.join(format!("{}.{}", DEFAULT_FILE_STEM, extension))
    } else if output.extension().is_none() {
        output.with_extension(extension)
    } else {
        output.to_path_buf()
    }
}

/// 形式に応じて書き出し、保存先を返す
pub fn export_rows(rows: &[PersistedRow], format: &ExportFormat, output: &Path) -> Result<PathBuf> {
    let path = match format {
        ExportFormat::Csv => {
            let path = output_path_for_format(output, "csv");
            write_csv(rows, &path)?;
            path
        }
        ExportFormat::Excel => {
            let path = output_path_for_format(output, "xlsx");
            write_excel(rows, &path)?;
            path
        }
    };
    tracing::info!(path = %path.display(), rows = rows.len(), "書き出しました");
    Ok(path)
}

/// 台帳と同じBOM付きUTF-8のCSV
pub fn write_csv(rows: &[PersistedRow], path: &Path) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, encode_rows(rows))
        .map_err(|e| TenkenError::Persistence(format!("{}: {}", path.display(), e)))
}

/// 1シートのExcelブック（見出し行は太字）
pub fn write_excel(rows: &[PersistedRow], path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let buffer = build_workbook(rows)?;
    std::fs::write(path, buffer)
        .map_err(|e| TenkenError::Persistence(format!("{}: {}", path.display(), e)))
}

/// Excelブックをバイト列で生成
pub fn build_workbook(rows: &[PersistedRow]) -> Result<Vec<u8>> {
    let header = header_for(rows);
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin);

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .map_err(|e| excel_error("シート名設定エラー", e))?;

    for (col, name) in header.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, name.as_str(), &header_format)
            .map_err(|e| excel_error("見出し書き込みエラー", e))?;
    }

    for (i, row) in rows.iter().enumerate() {
        let line = (i + 1) as u32;
        for (col, cell) in row_cells(row, &header).iter().enumerate() {
            worksheet
                .write_string(line, col as u16, cell.as_str())
                .map_err(|e| excel_error("セル書き込みエラー", e))?;
        }
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| excel_error("ウィンドウ枠固定エラー", e))?;

    workbook
        .save_to_buffer()
        .map_err(|e| excel_error("Excel保存エラー", e))
}

fn excel_error(context: &str, e: impl std::fmt::Display) -> TenkenError {
    TenkenError::ExcelGeneration(format!("{}: {}", context, e))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::csv_file::decode_rows;
    use tempfile::tempdir;

    fn sample(number: u32) -> PersistedRow {
        PersistedRow {
            inspection_date: "2025-04-01".into(),
            inspector_name: "山田".into(),
            site_name: "A現場".into(),
            building_name: "1号棟".into(),
            number,
            location: "屋上".into(),
            deterioration_name: "漏水".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_output_path_for_format() {
        let dir = tempdir().unwrap();
        assert_eq!(output_path_for_format(dir.path(), "csv"), dir.path().join("点検台帳.csv"));
        assert_eq!(
            output_path_for_format(&dir.path().join("out"), "xlsx"),
            dir.path().join("out.xlsx")
        );
        assert_eq!(
            output_path_for_format(&dir.path().join("a.txt"), "csv"),
            dir.path().join("a.txt")
        );
    }

    #[test]
    fn test_csv_export_reloads_identically() {
        let dir = tempdir().unwrap();
        let rows = vec![sample(1), sample(2)];
        let path = export_rows(&rows, &ExportFormat::Csv, &dir.path().join("filtered.csv")).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(decode_rows(&bytes).unwrap(), rows);
    }

    #[test]
    fn test_excel_export_writes_zip() {
        let dir = tempdir().unwrap();
        let path = export_rows(&[sample(1)], &ExportFormat::Excel, &dir.path().join("out")).unwrap();
        assert_eq!(path.extension().unwrap(), "xlsx");
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}

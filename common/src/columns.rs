//! 台帳CSVの列定義
//!
//! 列名は表計算ソフトで開くことを前提に日本語。
//! 読み込み時は英語名も受け付ける。

use crate::error::{Error, Result};
use crate::types::{PersistedRow, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;

/// 台帳の列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    InspectionDate,
    InspectorName,
    SiteName,
    BuildingName,
    Remarks,
    Number,
    Location,
    DeteriorationName,
    PhotoNumber,
    LastUpdatedAt,
    UpdatedBy,
    UpdateCount,
}

/// 列定義（列, 日本語見出し, 英語名）
pub const RECORD_COLUMNS: &[(Column, &str, &str)] = &[
    (Column::InspectionDate, "点検日", "inspectionDate"),
    (Column::InspectorName, "点検者名", "inspectorName"),
    (Column::SiteName, "現場名", "siteName"),
    (Column::BuildingName, "建物名", "buildingName"),
    (Column::Remarks, "備考", "remarks"),
    (Column::Number, "劣化番号", "number"),
    (Column::Location, "場所", "location"),
    (Column::DeteriorationName, "劣化名", "deteriorationName"),
    (Column::PhotoNumber, "写真番号", "photoNumber"),
    (Column::LastUpdatedAt, "最終更新日時", "lastUpdatedAt"),
    (Column::UpdatedBy, "更新者", "updatedBy"),
    (Column::UpdateCount, "更新回数", "updateCount"),
];

/// 必須列の数（先頭から）。残りは更新情報列
pub const BASE_COLUMN_COUNT: usize = 9;

impl Column {
    pub fn from_header(name: &str) -> Option<Self> {
        let name = name.trim().trim_start_matches('\u{FEFF}');
        RECORD_COLUMNS
            .iter()
            .find(|(_, ja, en)| *ja == name || en.eq_ignore_ascii_case(name))
            .map(|(col, _, _)| *col)
    }
}

/// 書き出す見出し行
///
/// いずれかの行が更新情報を持つときだけ更新情報列を含める。
/// 読み込み時に引き継いだ未知の列は、その後ろに初出順で並べる。
pub fn header_for(rows: &[PersistedRow]) -> Vec<String> {
    let count = if rows.iter().any(PersistedRow::has_update_info) {
        RECORD_COLUMNS.len()
    } else {
        BASE_COLUMN_COUNT
    };
    let mut header: Vec<String> = RECORD_COLUMNS
        .iter()
        .take(count)
        .map(|(_, ja, _)| ja.to_string())
        .collect();
    for (name, _) in rows.iter().flat_map(|r| r.extra.iter()) {
        if !header[count..].contains(name) {
            header.push(name.clone());
        }
    }
    header
}

/// 行を見出しに合わせたセル列に変換
pub fn row_cells(row: &PersistedRow, header: &[String]) -> Vec<String> {
    let known = header
        .iter()
        .take_while(|name| Column::from_header(name).is_some())
        .count();
    let mut cells = row.cells();
    cells.truncate(known);
    cells.extend(
        header[known..]
            .iter()
            .map(|name| row.extra_value(name).unwrap_or_default().to_string()),
    );
    cells
}

/// 数値セルを解釈する（表計算ソフトが書く "3.0" も整数とみなす）
///
/// u32 に収まらない値は None。
pub fn parse_count(cell: &str) -> Option<u32> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Ok(n) = cell.parse::<u32>() {
        return Some(n);
    }
    cell.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && *f >= 0.0 && *f <= f64::from(u32::MAX) && f.fract() == 0.0)
        .map(|f| f as u32)
}

fn parse_timestamp(cell: &str) -> Option<NaiveDateTime> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(cell, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(cell, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

fn optional_text(cell: &str) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

/// パース済みCSVレコード（先頭が見出し）を台帳行に変換する
///
/// 未知の列は `extra` に持ち越す。劣化番号の列がなければ番号は0、
/// 更新情報列がなければ None のまま。既知の列が1つもなければエラー。
pub fn rows_from_records(records: &[Vec<String>]) -> Result<Vec<PersistedRow>> {
    let Some((header, body)) = records.split_first() else {
        return Ok(Vec::new());
    };

    let columns: Vec<Option<Column>> = header.iter().map(|h| Column::from_header(h)).collect();
    if columns.iter().all(Option::is_none) {
        return Err(Error::Csv {
            line: 1,
            message: "台帳の列がありません".to_string(),
        });
    }
    let names: Vec<String> = header
        .iter()
        .map(|h| h.trim_start_matches('\u{FEFF}').to_string())
        .collect();

    let mut rows = Vec::with_capacity(body.len());
    for record in body {
        let mut row = PersistedRow::default();
        for ((column, name), cell) in columns.iter().zip(&names).zip(record.iter()) {
            let Some(column) = column else {
                row.extra.push((name.clone(), cell.clone()));
                continue;
            };
            match column {
                Column::InspectionDate => row.inspection_date = cell.clone(),
                Column::InspectorName => row.inspector_name = cell.clone(),
                Column::SiteName => row.site_name = cell.clone(),
                Column::BuildingName => row.building_name = cell.clone(),
                Column::Remarks => row.remarks = cell.clone(),
                Column::Number => row.number = parse_count(cell).unwrap_or(0),
                Column::Location => row.location = cell.clone(),
                Column::DeteriorationName => row.deterioration_name = cell.clone(),
                Column::PhotoNumber => row.photo_number = cell.clone(),
                Column::LastUpdatedAt => row.last_updated_at = parse_timestamp(cell),
                Column::UpdatedBy => row.updated_by = optional_text(cell),
                Column::UpdateCount => row.update_count = parse_count(cell),
            }
        }
        rows.push(row);
    }

    Ok(rows)
}

/// 台帳行をCSVテキストに変換する
pub fn rows_to_csv(rows: &[PersistedRow]) -> String {
    let header = header_for(rows);
    let body: Vec<Vec<String>> = rows.iter().map(|r| row_cells(r, &header)).collect();
    crate::csv::to_csv_string(&header, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv;

    #[test]
    fn test_from_header_accepts_aliases_and_bom() {
        assert_eq!(Column::from_header("劣化番号"), Some(Column::Number));
        assert_eq!(Column::from_header("\u{FEFF}点検日"), Some(Column::InspectionDate));
        assert_eq!(Column::from_header("siteName"), Some(Column::SiteName));
        assert_eq!(Column::from_header("不明"), None);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("3"), Some(3));
        assert_eq!(parse_count("3.0"), Some(3));
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("nan"), None);
        assert_eq!(parse_count("2.5"), None);
        assert_eq!(parse_count("4294967295"), Some(u32::MAX));
        assert_eq!(parse_count("4294967296"), None);
        assert_eq!(parse_count("1e10"), None);
    }

    #[test]
    fn test_header_without_update_info() {
        let rows = vec![PersistedRow::default()];
        assert_eq!(header_for(&rows).len(), BASE_COLUMN_COUNT);
    }

    #[test]
    fn test_header_with_update_info() {
        let rows = vec![
            PersistedRow::default(),
            PersistedRow { update_count: Some(1), ..Default::default() },
        ];
        let header = header_for(&rows);
        assert_eq!(header.len(), RECORD_COLUMNS.len());
        assert_eq!(header.last().map(String::as_str), Some("更新回数"));
    }

    #[test]
    fn test_legacy_file_without_update_columns() {
        let text = "点検日,点検者名,現場名,建物名,備考,劣化番号,場所,劣化名,写真番号\n\
                    2025-04-01,山田,A現場,1号棟,,1,屋上,漏水,P1\n";
        let rows = rows_from_records(&csv::parse(text).unwrap()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].number, 1);
        assert_eq!(rows[0].update_count, None);
        assert_eq!(rows[0].updated_by, None);
    }

    #[test]
    fn test_reordered_and_unknown_columns() {
        let text = "場所,劣化番号,メモ,現場名,更新回数\n外壁,4,xx,B現場,2.0\n";
        let rows = rows_from_records(&csv::parse(text).unwrap()).unwrap();
        assert_eq!(rows[0].location, "外壁");
        assert_eq!(rows[0].number, 4);
        assert_eq!(rows[0].site_name, "B現場");
        assert_eq!(rows[0].update_count, Some(2));
        assert_eq!(rows[0].extra, vec![("メモ".to_string(), "xx".to_string())]);
    }

    #[test]
    fn test_unknown_columns_are_written_back() {
        let text = "現場ID,点検日,現場名,建物名,場所,劣化名,劣化データ\n\
                    X-001,2025-04-01,A現場,1号棟,屋上,漏水,\"[屋上, 漏水]\"\n";
        let rows = rows_from_records(&csv::parse(text).unwrap()).unwrap();
        assert_eq!(rows[0].number, 0);
        assert_eq!(rows[0].extra_value("現場ID"), Some("X-001"));

        let mut rows = rows;
        rows.push(PersistedRow { number: 1, location: "外壁".to_string(), ..Default::default() });
        let written = rows_to_csv(&rows);
        let header = header_for(&rows);
        assert_eq!(header[BASE_COLUMN_COUNT..].to_vec(), vec!["現場ID".to_string(), "劣化データ".to_string()]);

        let restored = rows_from_records(&csv::parse(&written).unwrap()).unwrap();
        assert_eq!(restored[0], rows[0]);
        assert_eq!(restored[1].extra_value("現場ID"), Some(""));
    }

    #[test]
    fn test_missing_number_column_reads_as_zero() {
        let records = csv::parse("場所,劣化名\n屋上,漏水\n").unwrap();
        let rows = rows_from_records(&records).unwrap();
        assert_eq!(rows[0].number, 0);
        assert_eq!(rows[0].location, "屋上");
    }

    #[test]
    fn test_no_known_columns_is_error() {
        let records = csv::parse("a,b\n1,2\n").unwrap();
        assert!(rows_from_records(&records).is_err());
    }

    #[test]
    fn test_csv_roundtrip_with_update_info() {
        let rows = vec![
            PersistedRow {
                inspection_date: "2025-04-01".to_string(),
                inspector_name: "山田".to_string(),
                site_name: "A現場".to_string(),
                building_name: "1号棟".to_string(),
                remarks: "北面, 要確認".to_string(),
                number: 1,
                location: "屋上".to_string(),
                deterioration_name: "漏水".to_string(),
                photo_number: "P1".to_string(),
                ..Default::default()
            },
            PersistedRow {
                number: 2,
                last_updated_at: NaiveDateTime::parse_from_str("2025-04-02 13:45:00", TIMESTAMP_FORMAT).ok(),
                updated_by: Some("佐藤".to_string()),
                update_count: Some(1),
                ..Default::default()
            },
        ];
        let text = rows_to_csv(&rows);
        let restored = rows_from_records(&csv::parse(&text).unwrap()).unwrap();
        assert_eq!(restored, rows);
    }
}

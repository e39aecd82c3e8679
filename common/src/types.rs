//! 点検データの型定義
//!
//! - InspectionHeader: 点検ごとの基本情報（保存時に各行へ展開）
//! - DeteriorationItem: 入力中の劣化項目（下書き）
//! - PersistedRow: 台帳CSVの1行（基本情報 + 劣化項目 + 更新情報）

use chrono::{Local, NaiveDate, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};

/// 点検日の書式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 更新日時の書式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 現在時刻（秒単位に丸める）
pub fn now_timestamp() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

/// 点検の基本情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InspectionHeader {
    pub inspection_date: NaiveDate,
    pub inspector_name: String,
    pub site_name: String,
    pub building_name: String,
    pub remarks: String,
}

impl Default for InspectionHeader {
    fn default() -> Self {
        Self {
            inspection_date: Local::now().date_naive(),
            inspector_name: String::new(),
            site_name: String::new(),
            building_name: String::new(),
            remarks: String::new(),
        }
    }
}

impl InspectionHeader {
    pub fn scope(&self) -> Scope {
        Scope::new(&self.site_name, &self.building_name)
    }

    pub fn date_string(&self) -> String {
        self.inspection_date.format(DATE_FORMAT).to_string()
    }
}

/// 番号付けの単位（現場名, 建物名）
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub site_name: String,
    pub building_name: String,
}

impl Scope {
    pub fn new(site_name: &str, building_name: &str) -> Self {
        Self {
            site_name: site_name.trim().to_string(),
            building_name: building_name.trim().to_string(),
        }
    }

    /// 現場名・建物名の両方が入力済みか
    pub fn is_complete(&self) -> bool {
        !self.site_name.is_empty() && !self.building_name.is_empty()
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.site_name, self.building_name)
    }
}

/// 入力フォームの劣化項目欄（未確定）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemDraft {
    pub location: String,
    pub deterioration_name: String,
    pub photo_number: String,
}

impl ItemDraft {
    pub fn new(location: &str, deterioration_name: &str, photo_number: &str) -> Self {
        Self {
            location: location.to_string(),
            deterioration_name: deterioration_name.to_string(),
            photo_number: photo_number.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.location.is_empty() && self.deterioration_name.is_empty() && self.photo_number.is_empty()
    }
}

/// 劣化項目（下書き）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeteriorationItem {
    /// 劣化番号（スコープ内で一意、1始まり）
    pub number: u32,
    pub location: String,
    pub deterioration_name: String,
    pub photo_number: String,
    pub site_name: String,
    pub building_name: String,
    pub created_at: NaiveDateTime,
    pub last_updated_at: NaiveDateTime,
    pub updated_by: String,
    pub update_count: u32,
}

impl DeteriorationItem {
    pub fn scope(&self) -> Scope {
        Scope::new(&self.site_name, &self.building_name)
    }

    /// 入力欄へ書き戻す値
    pub fn to_draft(&self) -> ItemDraft {
        ItemDraft::new(&self.location, &self.deterioration_name, &self.photo_number)
    }
}

/// 台帳CSVの1行
///
/// 更新情報の3列は古いファイルには存在しないため Option で保持する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRow {
    /// 点検日（既存ファイルの表記をそのまま保持）
    pub inspection_date: String,
    pub inspector_name: String,
    pub site_name: String,
    pub building_name: String,
    pub remarks: String,
    pub number: u32,
    pub location: String,
    pub deterioration_name: String,
    pub photo_number: String,
    #[serde(default)]
    pub last_updated_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub update_count: Option<u32>,
    /// 読み込んだファイルにあった未知の列（見出し, 値）。書き出し時に末尾へ戻す
    #[serde(default)]
    pub extra: Vec<(String, String)>,
}

impl PersistedRow {
    /// 基本情報を展開して行を作る
    ///
    /// 編集済みの下書きだけ更新情報を持ち越す。
    pub fn from_parts(header: &InspectionHeader, item: &DeteriorationItem) -> Self {
        let edited = item.update_count > 0;
        Self {
            inspection_date: header.date_string(),
            inspector_name: header.inspector_name.clone(),
            site_name: item.site_name.clone(),
            building_name: item.building_name.clone(),
            remarks: header.remarks.clone(),
            number: item.number,
            location: item.location.clone(),
            deterioration_name: item.deterioration_name.clone(),
            photo_number: item.photo_number.clone(),
            last_updated_at: edited.then_some(item.last_updated_at),
            updated_by: edited
                .then(|| item.updated_by.clone())
                .filter(|name| !name.is_empty()),
            update_count: edited.then_some(item.update_count),
            extra: Vec::new(),
        }
    }

    pub fn scope(&self) -> Scope {
        Scope::new(&self.site_name, &self.building_name)
    }

    pub fn has_update_info(&self) -> bool {
        self.last_updated_at.is_some() || self.updated_by.is_some() || self.update_count.is_some()
    }

    /// 更新情報を刻印する（更新回数は欠損を0とみなして+1）
    pub fn stamp(&mut self, updated_by: &str, now: NaiveDateTime) {
        self.last_updated_at = Some(now);
        self.updated_by = Some(updated_by.to_string());
        self.update_count = Some(self.update_count.unwrap_or(0).saturating_add(1));
    }

    /// 台帳行を下書き項目に戻す
    pub fn to_item(&self, now: NaiveDateTime) -> DeteriorationItem {
        let touched = self.last_updated_at.unwrap_or(now);
        DeteriorationItem {
            number: self.number,
            location: self.location.clone(),
            deterioration_name: self.deterioration_name.clone(),
            photo_number: self.photo_number.clone(),
            site_name: self.site_name.clone(),
            building_name: self.building_name.clone(),
            created_at: touched,
            last_updated_at: touched,
            updated_by: self.updated_by.clone().unwrap_or_else(|| self.inspector_name.clone()),
            update_count: self.update_count.unwrap_or(0),
        }
    }

    /// 各列の文字列表現（列順）
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.inspection_date.clone(),
            self.inspector_name.clone(),
            self.site_name.clone(),
            self.building_name.clone(),
            self.remarks.clone(),
            self.number.to_string(),
            self.location.clone(),
            self.deterioration_name.clone(),
            self.photo_number.clone(),
            self.last_updated_at
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
            self.updated_by.clone().unwrap_or_default(),
            self.update_count.map(|c| c.to_string()).unwrap_or_default(),
        ]
    }

    /// 未知の列の値
    pub fn extra_value(&self, name: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// いずれかの列が検索語を含むか（大文字小文字を区別しない部分一致）
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.cells()
            .iter()
            .map(String::as_str)
            .chain(self.extra.iter().map(|(_, value)| value.as_str()))
            .any(|cell| cell.to_lowercase().contains(&needle))
    }
}

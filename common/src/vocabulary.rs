//! 場所・劣化名の語彙マスタ
//!
//! マスタCSVの各行は「場所」「劣化名」とそれぞれの読み仮名を持つ。
//! 区分ごとに重複を除いた語の一覧・読みの一覧・読み→語の対応を保持する。

use crate::csv;
use crate::error::{LoadError, Result};
use crate::suggest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 語彙の区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Location,
    Deterioration,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Location => write!(f, "場所"),
            Category::Deterioration => write!(f, "劣化名"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "location" | "loc" | "場所" => Ok(Category::Location),
            "deterioration" | "det" | "劣化名" | "劣化" => Ok(Category::Deterioration),
            _ => Err(format!("Unknown category: {}. Use location or deterioration", s)),
        }
    }
}

/// マスタの1語
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    pub term: String,
    pub phonetic_key: String,
    pub category: Category,
}

/// 既定の (場所, 読み, 劣化名, 読み)
pub const DEFAULT_PAIRS: &[(&str, &str, &str, &str)] = &[
    ("1階廊下", "いっかいろうか", "ひび割れ", "ひびわれ"),
    ("2階廊下", "にかいろうか", "剥離", "はくり"),
    ("屋上", "おくじょう", "漏水", "ろうすい"),
    ("外壁", "がいへき", "腐食", "ふしょく"),
    ("階段", "かいだん", "変形", "へんけい"),
    ("玄関", "げんかん", "欠損", "けっそん"),
    ("機械室", "きかいしつ", "さび", "さび"),
    ("駐車場", "ちゅうしゃじょう", "変色", "へんしょく"),
];

const LOCATION_HEADERS: &[&str] = &["場所", "location"];
const LOCATION_PHONETIC_HEADERS: &[&str] = &["場所_読み", "場所読み", "location_phonetic"];
const DETERIORATION_HEADERS: &[&str] = &["劣化名", "deteriorationname"];
const DETERIORATION_PHONETIC_HEADERS: &[&str] =
    &["劣化名_読み", "劣化名読み", "deteriorationname_phonetic"];

/// 区分ごとの索引
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryIndex {
    /// 語の一覧（初出順、重複なし）
    terms: Vec<String>,
    /// 読みの一覧（初出順、重複なし）
    phonetic_keys: Vec<String>,
    /// 読み→語（重複する読みは後勝ち）
    key_to_term: HashMap<String, String>,
}

impl CategoryIndex {
    fn add(&mut self, term: &str, phonetic_key: &str) {
        let term = term.trim();
        if term.is_empty() {
            return;
        }
        if !self.terms.iter().any(|t| t == term) {
            self.terms.push(term.to_string());
        }

        let key = phonetic_key.trim();
        if key.is_empty() {
            return;
        }
        if !self.phonetic_keys.iter().any(|k| k == key) {
            self.phonetic_keys.push(key.to_string());
        }
        self.key_to_term.insert(key.to_string(), term.to_string());
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn phonetic_keys(&self) -> &[String] {
        &self.phonetic_keys
    }

    pub fn key_to_term(&self) -> &HashMap<String, String> {
        &self.key_to_term
    }

    /// 入力に対する補完候補
    pub fn suggest(&self, input: &str) -> Vec<String> {
        suggest::suggest(input, &self.terms, &self.phonetic_keys, &self.key_to_term)
    }
}

/// 語彙マスタ全体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocabularyIndex {
    entries: Vec<VocabularyEntry>,
    locations: CategoryIndex,
    deteriorations: CategoryIndex,
}

impl VocabularyIndex {
    pub fn from_entries(entries: Vec<VocabularyEntry>) -> Self {
        let mut index = Self::default();
        for entry in &entries {
            index.category_mut(entry.category).add(&entry.term, &entry.phonetic_key);
        }
        index.entries = entries;
        index
    }

    /// 組み込みの既定語彙
    pub fn builtin() -> Self {
        let mut entries = Vec::with_capacity(DEFAULT_PAIRS.len() * 2);
        for (location, location_key, deterioration, deterioration_key) in DEFAULT_PAIRS {
            entries.push(VocabularyEntry {
                term: location.to_string(),
                phonetic_key: location_key.to_string(),
                category: Category::Location,
            });
            entries.push(VocabularyEntry {
                term: deterioration.to_string(),
                phonetic_key: deterioration_key.to_string(),
                category: Category::Deterioration,
            });
        }
        Self::from_entries(entries)
    }

    /// マスタCSV文字列から読み込み
    ///
    /// 列は見出し名で探す。語の列が1つもなければ `LoadError::NoColumns`。
    pub fn from_csv_str(content: &str) -> Result<Self> {
        let records = csv::parse(content)?;
        let Some((header, body)) = records.split_first() else {
            return Err(LoadError::NoColumns.into());
        };

        let find = |names: &[&str]| {
            header.iter().position(|h| {
                let h = h.trim().trim_start_matches('\u{FEFF}').to_lowercase();
                names.iter().any(|n| *n == h)
            })
        };
        let location = find(LOCATION_HEADERS);
        let location_key = find(LOCATION_PHONETIC_HEADERS);
        let deterioration = find(DETERIORATION_HEADERS);
        let deterioration_key = find(DETERIORATION_PHONETIC_HEADERS);

        if location.is_none() && deterioration.is_none() {
            return Err(LoadError::NoColumns.into());
        }

        let cell = |record: &[String], idx: Option<usize>| -> String {
            idx.and_then(|i| record.get(i)).cloned().unwrap_or_default()
        };

        let mut entries = Vec::new();
        for record in body.iter().map(Vec::as_slice) {
            let pairs = [
                (Category::Location, location, location_key),
                (Category::Deterioration, deterioration, deterioration_key),
            ];
            for (category, term_idx, key_idx) in pairs {
                let term = cell(record, term_idx);
                if term.trim().is_empty() {
                    continue;
                }
                entries.push(VocabularyEntry {
                    term: term.trim().to_string(),
                    phonetic_key: cell(record, key_idx).trim().to_string(),
                    category,
                });
            }
        }

        Ok(Self::from_entries(entries))
    }

    pub fn entries(&self) -> &[VocabularyEntry] {
        &self.entries
    }

    pub fn category(&self, category: Category) -> &CategoryIndex {
        match category {
            Category::Location => &self.locations,
            Category::Deterioration => &self.deteriorations,
        }
    }

    fn category_mut(&mut self, category: Category) -> &mut CategoryIndex {
        match category {
            Category::Location => &mut self.locations,
            Category::Deterioration => &mut self.deteriorations,
        }
    }

    pub fn suggest(&self, category: Category, input: &str) -> Vec<String> {
        self.category(category).suggest(input)
    }
}

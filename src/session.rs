//! 入力セッション
//!
//! 点検の基本情報・下書きリスト・台帳行の編集対象をひとまとめにした状態。
//! コマンド1回ごとにJSONから読み込み、操作後に書き戻す。

use crate::draft::DraftItemList;
use crate::error::{Result, TenkenError};
use crate::store::{append_unsaved, RecordStore, SaveOutcome};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tenken_common::types::{now_timestamp, DATE_FORMAT};
use tenken_common::{DeteriorationItem, InspectionHeader, ItemDraft, PersistedRow};

/// 台帳から呼び出して編集中の行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowEdit {
    /// 読み込み時点の行位置
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// バージョン（互換性チェック用）
    version: u32,
    pub header: InspectionHeader,
    pub drafts: DraftItemList,
    #[serde(default)]
    pub row_edit: Option<RowEdit>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            header: InspectionHeader::default(),
            drafts: DraftItemList::default(),
            row_edit: None,
        }
    }
}

impl SessionState {
    const CURRENT_VERSION: u32 = 1;

    /// 新しいセッション（点検者名の初期値つき）
    pub fn new(default_inspector: Option<&str>) -> Self {
        let mut session = Self::default();
        if let Some(name) = default_inspector {
            session.header.inspector_name = name.to_string();
        }
        session
    }

    /// セッションファイルを読み込み。なければ新規、壊れていれば警告して新規
    pub fn load(path: &Path, default_inspector: Option<&str>) -> Self {
        if !path.exists() {
            return Self::new(default_inspector);
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "セッションを開けません");
                return Self::new(default_inspector);
            }
        };

        match serde_json::from_reader::<_, SessionState>(BufReader::new(file)) {
            Ok(session) if session.version == Self::CURRENT_VERSION => session,
            Ok(_) => {
                tracing::warn!("セッションのバージョン不一致、新規に作成します");
                Self::new(default_inspector)
            }
            Err(e) => {
                tracing::warn!(error = %e, "セッションを解析できません、新規に作成します");
                Self::new(default_inspector)
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// セッションファイルを削除。存在しなければ false
    pub fn clear(path: &Path) -> Result<bool> {
        if path.exists() {
            std::fs::remove_file(path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// 基本情報を差し替え、スコープが確定したら台帳から読み込む
    ///
    /// 戻り値は台帳から読み込んだかどうか。
    pub fn set_header<S: RecordStore + ?Sized>(&mut self, header: InspectionHeader, store: &S) -> Result<bool> {
        self.header = header;
        let scope = self.header.scope();
        self.drafts.load_for_scope(&scope, store, now_timestamp())
    }

    /// 入力欄の内容で劣化項目を追加（編集中なら上書き）
    pub fn submit_item<S: RecordStore + ?Sized>(
        &mut self,
        pending: ItemDraft,
        store: &S,
    ) -> Result<DeteriorationItem> {
        self.drafts.set_pending(pending.clone());
        let item = self
            .drafts
            .add_or_update(pending, &self.header, store, now_timestamp())?;
        Ok(item.clone())
    }

    /// 未保存の項目を台帳へ書き込む
    pub fn save_drafts<S: RecordStore + ?Sized>(&mut self, store: &mut S) -> Result<SaveOutcome> {
        append_unsaved(store, &self.header, &mut self.drafts)
    }

    /// 編集中の項目を入力欄の内容で確定する。失敗したら編集を取りやめる
    pub fn submit_edit<S: RecordStore + ?Sized>(
        &mut self,
        pending: ItemDraft,
        store: &S,
    ) -> Result<DeteriorationItem> {
        let result = self.submit_item(pending, store);
        if result.is_err() {
            self.drafts.cancel_edit();
        }
        result
    }

    /// 台帳の行を呼び出し、編集用の入力値を返す
    ///
    /// 基本情報と下書きリストには触れない。
    pub fn begin_row_edit<S: RecordStore + ?Sized>(&mut self, index: usize, store: &S) -> Result<ItemDraft> {
        let rows = store.load()?;
        let row = rows
            .get(index)
            .ok_or(TenkenError::NotFound { index, len: rows.len() })?;

        self.row_edit = Some(RowEdit { index });
        Ok(ItemDraft::new(&row.location, &row.deterioration_name, &row.photo_number))
    }

    /// 台帳行の編集を取りやめる
    pub fn cancel_row_edit(&mut self) {
        self.row_edit = None;
    }

    /// 呼び出した行の場所・劣化名・写真番号を書き換える
    ///
    /// 点検日などそのほかの列は行の値のまま。更新者は現在の点検者。
    pub fn commit_row_edit<S: RecordStore + ?Sized>(
        &mut self,
        pending: ItemDraft,
        store: &mut S,
    ) -> Result<PersistedRow> {
        let edit = self
            .row_edit
            .clone()
            .ok_or_else(|| TenkenError::Validation("編集中の台帳行がありません".into()))?;
        if pending.location.trim().is_empty() {
            return Err(TenkenError::Validation("場所を入力してください".into()));
        }
        if pending.deterioration_name.trim().is_empty() {
            return Err(TenkenError::Validation("劣化名を入力してください".into()));
        }

        let changes = RowChanges {
            location: Some(pending.location.trim().to_string()),
            deterioration_name: Some(pending.deterioration_name.trim().to_string()),
            photo_number: Some(pending.photo_number.trim().to_string()),
            ..Default::default()
        };
        let updated = update_stored_row(store, edit.index, changes, &self.header.inspector_name)?;

        self.row_edit = None;
        Ok(updated)
    }
}

/// 台帳行を直接書き換えるときの変更内容（None の項目は元の値のまま）
#[derive(Debug, Clone, Default)]
pub struct RowChanges {
    pub inspection_date: Option<NaiveDate>,
    pub inspector_name: Option<String>,
    pub site_name: Option<String>,
    pub building_name: Option<String>,
    pub remarks: Option<String>,
    pub number: Option<u32>,
    pub location: Option<String>,
    pub deterioration_name: Option<String>,
    pub photo_number: Option<String>,
}

impl RowChanges {
    pub fn is_empty(&self) -> bool {
        self.inspection_date.is_none()
            && self.inspector_name.is_none()
            && self.site_name.is_none()
            && self.building_name.is_none()
            && self.remarks.is_none()
            && self.number.is_none()
            && self.location.is_none()
            && self.deterioration_name.is_none()
            && self.photo_number.is_none()
    }

    fn apply(self, row: &PersistedRow) -> PersistedRow {
        let mut row = row.clone();
        if let Some(date) = self.inspection_date {
            row.inspection_date = date.format(DATE_FORMAT).to_string();
        }
        if let Some(v) = self.inspector_name {
            row.inspector_name = v;
        }
        if let Some(v) = self.site_name {
            row.site_name = v;
        }
        if let Some(v) = self.building_name {
            row.building_name = v;
        }
        if let Some(v) = self.remarks {
            row.remarks = v;
        }
        if let Some(v) = self.number {
            row.number = v;
        }
        if let Some(v) = self.location {
            row.location = v;
        }
        if let Some(v) = self.deterioration_name {
            row.deterioration_name = v;
        }
        if let Some(v) = self.photo_number {
            row.photo_number = v;
        }
        row
    }
}

/// 台帳の行を変更内容で上書きし、`updated_by` を更新者として刻印する
pub fn update_stored_row<S: RecordStore + ?Sized>(
    store: &mut S,
    index: usize,
    changes: RowChanges,
    updated_by: &str,
) -> Result<PersistedRow> {
    let rows = store.load()?;
    let row = rows
        .get(index)
        .ok_or(TenkenError::NotFound { index, len: rows.len() })?;
    store.update_row(index, changes.apply(row), updated_by)
}

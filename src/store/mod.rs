//! 点検台帳ストア
//!
//! 台帳は追記専用の表で、1行 = 1点検 × 1劣化項目。
//! 書き込みはすべて全体の書き換えになるため、バックエンドは
//! `load` と `write_all` だけを実装し、残りの操作は既定実装を使う。
//!
//! 行の識別は読み込み時点の位置（0始まり）。ファイルが途中で
//! 書き換えられると別の行を指す可能性がある。

pub mod csv_file;
pub mod memory;

pub use csv_file::CsvRecordStore;
pub use memory::MemoryRecordStore;

use crate::draft::DraftItemList;
use crate::error::{Result, TenkenError};
use tenken_common::types::now_timestamp;
use tenken_common::{InspectionHeader, PersistedRow, Scope};

/// 位置付きの台帳行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedRow {
    pub index: usize,
    pub row: PersistedRow,
}

/// 保存の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// 書き込んだ行数
    Written(usize),
    /// 未保存の項目がなかった
    NothingToSave,
}

/// `n` の次の劣化番号。上限なら `Validation`
pub(crate) fn number_after(n: u32) -> Result<u32> {
    n.checked_add(1)
        .ok_or_else(|| TenkenError::Validation(format!("劣化番号が上限（{}）に達しています", u32::MAX)))
}

fn require_updater(updated_by: &str) -> Result<&str> {
    let name = updated_by.trim();
    if name.is_empty() {
        return Err(TenkenError::Validation("更新者（点検者名）を入力してください".into()));
    }
    Ok(name)
}

impl SaveOutcome {
    pub fn written(&self) -> usize {
        match self {
            SaveOutcome::Written(n) => *n,
            SaveOutcome::NothingToSave => 0,
        }
    }
}

pub trait RecordStore {
    /// 現在の全行
    fn load(&self) -> Result<Vec<PersistedRow>>;

    /// 全行を置き換える
    fn write_all(&mut self, rows: &[PersistedRow]) -> Result<()>;

    /// 末尾に追加する
    fn append(&mut self, new_rows: &[PersistedRow]) -> Result<usize> {
        if new_rows.is_empty() {
            return Ok(0);
        }
        let mut rows = self.load()?;
        rows.extend_from_slice(new_rows);
        self.write_all(&rows)?;
        Ok(new_rows.len())
    }

    /// 全列の文字列表現に対する部分一致検索（大文字小文字を区別しない）
    ///
    /// 検索語が空なら全行。並びは保存順のまま。
    fn query(&self, term: Option<&str>) -> Result<Vec<IndexedRow>> {
        let term = term.map(str::trim).filter(|t| !t.is_empty());
        Ok(self
            .load()?
            .into_iter()
            .enumerate()
            .filter(|(_, row)| term.map_or(true, |t| row.matches(t)))
            .map(|(index, row)| IndexedRow { index, row })
            .collect())
    }

    /// 指定位置の行を `row` で置き換え、`updated_by` の名前で更新情報を刻印する
    ///
    /// 更新情報の3列は置き換え前の行から引き継ぐ。
    fn update_row(&mut self, index: usize, row: PersistedRow, updated_by: &str) -> Result<PersistedRow> {
        let updated_by = require_updater(updated_by)?;
        let mut rows = self.load()?;
        let len = rows.len();
        let Some(slot) = rows.get_mut(index) else {
            return Err(TenkenError::NotFound { index, len });
        };

        let mut updated = PersistedRow {
            last_updated_at: slot.last_updated_at,
            updated_by: slot.updated_by.clone(),
            update_count: slot.update_count,
            ..row
        };
        updated.stamp(updated_by, now_timestamp());
        *slot = updated.clone();

        self.write_all(&rows)?;
        tracing::info!(index, count = ?updated.update_count, "台帳の行を更新しました");
        Ok(updated)
    }

    /// 表全体を置き換える。全行に更新情報を刻印する
    fn bulk_replace(&mut self, mut table: Vec<PersistedRow>, updated_by: &str) -> Result<usize> {
        let updated_by = require_updater(updated_by)?;
        let now = now_timestamp();
        for row in &mut table {
            row.stamp(updated_by, now);
        }
        self.write_all(&table)?;
        tracing::info!(rows = table.len(), "台帳を一括更新しました");
        Ok(table.len())
    }

    /// スコープ内の最大の劣化番号（行がなければ0）
    fn max_number_in_scope(&self, scope: &Scope) -> Result<u32> {
        Ok(self
            .load()?
            .iter()
            .filter(|r| r.scope() == *scope)
            .map(|r| r.number)
            .max()
            .unwrap_or(0))
    }

    /// スコープ内の行（保存順）
    fn rows_in_scope(&self, scope: &Scope) -> Result<Vec<PersistedRow>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|r| r.scope() == *scope)
            .collect())
    }
}

/// 未保存の下書き項目を台帳に追記する
///
/// 同じスコープに同じ番号以上の行があれば、スコープ内最大+1に振り直す。
/// 書き込みに成功したときだけ下書きを保存済みにする。
pub fn append_unsaved<S: RecordStore + ?Sized>(
    store: &mut S,
    header: &InspectionHeader,
    drafts: &mut DraftItemList,
) -> Result<SaveOutcome> {
    let mut rows = store.load()?;
    let existing = rows.len();
    let mut assigned = Vec::new();

    for (position, entry) in drafts.entries().iter().enumerate() {
        if entry.saved {
            continue;
        }

        let mut row = PersistedRow::from_parts(header, &entry.item);
        let scope = row.scope();
        let max_in_scope = rows
            .iter()
            .filter(|r| r.scope() == scope)
            .map(|r| r.number)
            .max();
        if let Some(max) = max_in_scope {
            if max >= row.number {
                let next = number_after(max)?;
                tracing::info!(
                    scope = %scope,
                    from = row.number,
                    to = next,
                    "劣化番号が重複するため振り直します"
                );
                row.number = next;
            }
        }

        assigned.push((position, row.number));
        rows.push(row);
    }

    if assigned.is_empty() {
        return Ok(SaveOutcome::NothingToSave);
    }

    store.write_all(&rows)?;
    drafts.mark_saved(&assigned);

    let written = rows.len() - existing;
    tracing::info!(written, "台帳に保存しました");
    Ok(SaveOutcome::Written(written))
}

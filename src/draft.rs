//! 劣化項目の下書きリスト
//!
//! 今回の点検で入力中の劣化項目を保持する。劣化番号は
//! （現場名, 建物名）ごとに「既知の最大番号 + 1」で採番する。
//!
//! ## 採番の規則
//! - スコープが確定している場合、削除しても番号は振り直さない
//! - 現場名・建物名のどちらかが未入力の下書きは、削除時に 1..N へ振り直す

use crate::error::{Result, TenkenError};
use crate::store::{number_after, RecordStore};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tenken_common::{DeteriorationItem, InspectionHeader, ItemDraft, Scope};

/// 下書きの1項目と保存済みフラグ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftEntry {
    pub item: DeteriorationItem,
    /// 現在の値が台帳の行と一致しているか
    pub saved: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftItemList {
    entries: Vec<DraftEntry>,
    /// スコープごとの次の劣化番号
    #[serde(with = "counter_map")]
    counters: BTreeMap<Scope, u32>,
    /// 入力欄の値
    pending: ItemDraft,
    /// 編集中の項目位置
    edit_target: Option<usize>,
    /// 台帳から読み込み済みのスコープ
    loaded_scope: Option<Scope>,
}

/// JSONのキーに構造体を使えないため、(スコープ, 番号) の配列で保存する
mod counter_map {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;
    use tenken_common::Scope;

    pub fn serialize<S: Serializer>(map: &BTreeMap<Scope, u32>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeMap<Scope, u32>, D::Error> {
        let pairs: Vec<(Scope, u32)> = Vec::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

impl DraftItemList {
    pub fn entries(&self) -> &[DraftEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DraftEntry> {
        self.entries.get(index)
    }

    pub fn pending(&self) -> &ItemDraft {
        &self.pending
    }

    pub fn set_pending(&mut self, pending: ItemDraft) {
        self.pending = pending;
    }

    pub fn edit_target(&self) -> Option<usize> {
        self.edit_target
    }

    pub fn loaded_scope(&self) -> Option<&Scope> {
        self.loaded_scope.as_ref()
    }

    pub fn unsaved_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.saved).count()
    }

    /// スコープの次の番号（カウンタがなければ未使用のまま None）
    pub fn next_number(&self, scope: &Scope) -> Option<u32> {
        self.counters.get(scope).copied()
    }

    /// 項目を追加する。編集中の項目があればその位置を上書きする
    ///
    /// 場所・劣化名が空なら `Validation` エラーで、状態は変えない。
    pub fn add_or_update<S: RecordStore + ?Sized>(
        &mut self,
        pending: ItemDraft,
        header: &InspectionHeader,
        store: &S,
        now: NaiveDateTime,
    ) -> Result<&DeteriorationItem> {
        let location = pending.location.trim();
        let deterioration_name = pending.deterioration_name.trim();
        if location.is_empty() {
            return Err(TenkenError::Validation("場所を入力してください".into()));
        }
        if deterioration_name.is_empty() {
            return Err(TenkenError::Validation("劣化名を入力してください".into()));
        }
        let photo_number = pending.photo_number.trim();

        let position = if let Some(target) = self.edit_target {
            let len = self.entries.len();
            let entry = self
                .entries
                .get_mut(target)
                .ok_or(TenkenError::NotFound { index: target, len })?;

            let item = &mut entry.item;
            item.location = location.to_string();
            item.deterioration_name = deterioration_name.to_string();
            item.photo_number = photo_number.to_string();
            item.last_updated_at = now;
            item.updated_by = header.inspector_name.clone();
            item.update_count += 1;
            entry.saved = false;

            self.edit_target = None;
            tracing::info!(number = entry.item.number, "劣化項目を更新しました");
            target
        } else {
            let scope = header.scope();
            let number = self.take_number(&scope, store)?;
            self.entries.push(DraftEntry {
                item: DeteriorationItem {
                    number,
                    location: location.to_string(),
                    deterioration_name: deterioration_name.to_string(),
                    photo_number: photo_number.to_string(),
                    site_name: scope.site_name.clone(),
                    building_name: scope.building_name.clone(),
                    created_at: now,
                    last_updated_at: now,
                    updated_by: header.inspector_name.clone(),
                    update_count: 0,
                },
                saved: false,
            });
            tracing::info!(number, scope = %scope, "劣化項目を追加しました");
            self.entries.len() - 1
        };

        self.pending = ItemDraft::default();
        Ok(&self.entries[position].item)
    }

    /// スコープの番号を1つ払い出す。初回は台帳と下書きの最大番号から始める
    fn take_number<S: RecordStore + ?Sized>(&mut self, scope: &Scope, store: &S) -> Result<u32> {
        let next = match self.counters.get(scope) {
            Some(&next) => next,
            None => {
                let persisted = store.max_number_in_scope(scope)?;
                let drafted = self.max_draft_number(scope);
                number_after(persisted.max(drafted))?
            }
        };
        self.counters.insert(scope.clone(), number_after(next)?);
        Ok(next)
    }

    fn max_draft_number(&self, scope: &Scope) -> u32 {
        self.entries
            .iter()
            .filter(|e| e.item.scope() == *scope)
            .map(|e| e.item.number)
            .max()
            .unwrap_or(0)
    }

    /// 項目を編集対象にし、値を入力欄へ写す
    pub fn begin_edit(&mut self, index: usize) -> Result<ItemDraft> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(TenkenError::NotFound { index, len })?;

        entry.saved = false;
        self.pending = entry.item.to_draft();
        self.edit_target = Some(index);
        Ok(self.pending.clone())
    }

    /// 編集を取りやめる
    pub fn cancel_edit(&mut self) {
        self.edit_target = None;
        self.pending = ItemDraft::default();
    }

    /// 項目を削除する
    pub fn delete(&mut self, index: usize) -> Result<DeteriorationItem> {
        if index >= self.entries.len() {
            return Err(TenkenError::NotFound { index, len: self.entries.len() });
        }

        let removed = self.entries.remove(index).item;
        self.edit_target = match self.edit_target {
            Some(t) if t == index => {
                self.pending = ItemDraft::default();
                None
            }
            Some(t) if t > index => Some(t - 1),
            other => other,
        };

        let scope = removed.scope();
        if !scope.is_complete() {
            let mut n = 0;
            for entry in self.entries.iter_mut().filter(|e| e.item.scope() == scope) {
                n += 1;
                entry.item.number = n;
            }
            self.counters.insert(scope, n + 1);
        }

        tracing::info!(number = removed.number, "劣化項目を削除しました");
        Ok(removed)
    }

    /// スコープが変わったら台帳から該当行を読み込み、下書きを置き換える
    ///
    /// 現場名・建物名のどちらかが空、前回と同じスコープ、編集中のいずれかなら何もしない。
    pub fn load_for_scope<S: RecordStore + ?Sized>(
        &mut self,
        scope: &Scope,
        store: &S,
        now: NaiveDateTime,
    ) -> Result<bool> {
        if !scope.is_complete() || self.loaded_scope.as_ref() == Some(scope) || self.edit_target.is_some() {
            return Ok(false);
        }

        let rows = store.rows_in_scope(scope)?;
        let discarded = self.unsaved_count();
        if discarded > 0 {
            tracing::warn!(discarded, "未保存の劣化項目を破棄してスコープを切り替えます");
        }

        self.entries = rows
            .iter()
            .map(|row| DraftEntry { item: row.to_item(now), saved: true })
            .collect();
        // 上限に達したスコープは追加時にエラーにする
        match self.max_draft_number(scope).checked_add(1) {
            Some(next) => self.counters.insert(scope.clone(), next),
            None => self.counters.remove(scope),
        };
        self.loaded_scope = Some(scope.clone());

        tracing::info!(scope = %scope, items = self.entries.len(), "台帳から劣化項目を読み込みました");
        Ok(true)
    }

    /// 保存済みにする（台帳側で振り直された番号も反映）
    pub(crate) fn mark_saved(&mut self, assigned: &[(usize, u32)]) {
        for &(position, number) in assigned {
            let Some(entry) = self.entries.get_mut(position) else { continue };
            entry.saved = true;
            if entry.item.number != number {
                entry.item.number = number;
                let scope = entry.item.scope();
                match number.checked_add(1) {
                    Some(after) => {
                        let next = self.counters.entry(scope).or_insert(after);
                        if *next < after {
                            *next = after;
                        }
                    }
                    None => {
                        self.counters.remove(&scope);
                    }
                }
            }
        }
    }
}

//! 劣化項目の下書きリストのテスト
//!
//! スコープごとの採番・削除時の振り直し・台帳からの読み込みを検証

use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use tenken_common::{InspectionHeader, ItemDraft, PersistedRow, Scope};
use tenken_rust::draft::DraftItemList;
use tenken_rust::error::TenkenError;
use tenken_rust::store::{append_unsaved, MemoryRecordStore};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 4, 1).unwrap().and_hms_opt(10, 0, 0).unwrap()
}

fn header(site: &str, building: &str) -> InspectionHeader {
    InspectionHeader {
        inspection_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
        inspector_name: "山田".to_string(),
        site_name: site.to_string(),
        building_name: building.to_string(),
        remarks: String::new(),
    }
}

fn persisted(site: &str, building: &str, number: u32) -> PersistedRow {
    PersistedRow {
        inspection_date: "2025-03-01".to_string(),
        site_name: site.to_string(),
        building_name: building.to_string(),
        number,
        location: "屋上".to_string(),
        deterioration_name: "漏水".to_string(),
        ..Default::default()
    }
}

/// SiteA/Bldg1 で1番・2番を作り、1番を消しても2番は2番のまま
#[test]
fn test_scoped_delete_keeps_remaining_number() {
    let store = MemoryRecordStore::default();
    let h = header("SiteA", "Bldg1");
    let mut list = DraftItemList::default();

    let first = list.add_or_update(ItemDraft::new("1階廊下", "ひび割れ", ""), &h, &store, now()).unwrap().number;
    let second = list.add_or_update(ItemDraft::new("屋上", "漏水", ""), &h, &store, now()).unwrap().number;
    assert_eq!((first, second), (1, 2));

    list.delete(0).unwrap();
    assert_eq!(list.entries()[0].item.number, 2);
}

/// 場所が空なら入力エラーで、下書きは変わらない
#[test]
fn test_empty_location_leaves_draft_unchanged() {
    let store = MemoryRecordStore::default();
    let h = header("SiteA", "Bldg1");
    let mut list = DraftItemList::default();
    list.add_or_update(ItemDraft::new("屋上", "漏水", ""), &h, &store, now()).unwrap();
    let before = list.clone();

    let err = list
        .add_or_update(ItemDraft::new("   ", "腐食", "P1"), &h, &store, now())
        .unwrap_err();
    assert!(matches!(err, TenkenError::Validation(_)));
    assert_eq!(list, before);
}

/// 削除・編集の範囲外指定
#[test]
fn test_out_of_range_indices() {
    let mut list = DraftItemList::default();
    assert!(matches!(list.delete(0), Err(TenkenError::NotFound { .. })));
    assert!(matches!(list.begin_edit(3), Err(TenkenError::NotFound { .. })));
}

/// 保存後に編集すると未保存に戻り、再保存で新しい番号の行が追記される
#[test]
fn test_edit_after_save_appends_again() {
    let mut store = MemoryRecordStore::default();
    let h = header("SiteA", "Bldg1");
    let mut list = DraftItemList::default();
    list.add_or_update(ItemDraft::new("屋上", "漏水", ""), &h, &store, now()).unwrap();
    append_unsaved(&mut store, &h, &mut list).unwrap();

    list.begin_edit(0).unwrap();
    list.add_or_update(ItemDraft::new("屋上", "腐食", ""), &h, &store, now()).unwrap();
    assert_eq!(list.unsaved_count(), 1);

    append_unsaved(&mut store, &h, &mut list).unwrap();
    let rows = store.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].number, 2);
    assert_eq!(rows[1].update_count, Some(1));
    assert_eq!(list.entries()[0].item.number, 2);
    assert_eq!(list.unsaved_count(), 0);
}

/// スコープ切り替えで台帳の行が保存済みとして読み込まれる
#[test]
fn test_switching_scope_loads_rows() {
    let store = MemoryRecordStore::new(vec![
        persisted("SiteA", "Bldg1", 1),
        persisted("SiteA", "Bldg2", 5),
        persisted("SiteA", "Bldg2", 6),
    ]);
    let mut list = DraftItemList::default();

    assert!(list.load_for_scope(&Scope::new("SiteA", "Bldg2"), &store, now()).unwrap());
    assert_eq!(list.len(), 2);
    assert_eq!(list.unsaved_count(), 0);

    let h = header("SiteA", "Bldg2");
    let item = list.add_or_update(ItemDraft::new("外壁", "腐食", ""), &h, &store, now()).unwrap();
    assert_eq!(item.number, 7);

    assert!(list.load_for_scope(&Scope::new("SiteA", "Bldg1"), &store, now()).unwrap());
    assert_eq!(list.len(), 1);
    assert_eq!(list.loaded_scope(), Some(&Scope::new("SiteA", "Bldg1")));
}

proptest! {
    /// 削除なしでN件追加すると番号は k..k+N-1（k = 台帳の最大 + 1）
    #[test]
    fn prop_numbers_are_consecutive_per_scope(
        persisted_max in proptest::option::of(1..50u32),
        plan in proptest::collection::vec(0..3usize, 1..20),
    ) {
        let scopes = [("SiteA", "Bldg1"), ("SiteA", "Bldg2"), ("SiteB", "Bldg1")];
        let store = match persisted_max {
            Some(max) => MemoryRecordStore::new(vec![persisted("SiteA", "Bldg1", max)]),
            None => MemoryRecordStore::default(),
        };
        let mut list = DraftItemList::default();
        let mut issued: Vec<Vec<u32>> = vec![Vec::new(); scopes.len()];

        for (i, &s) in plan.iter().enumerate() {
            let (site, building) = scopes[s];
            let location = format!("場所{}", i);
            let item = list
                .add_or_update(ItemDraft::new(&location, "ひび割れ", ""), &header(site, building), &store, now())
                .unwrap();
            issued[s].push(item.number);
        }

        for (s, numbers) in issued.iter().enumerate() {
            let k = if s == 0 { persisted_max.unwrap_or(0) + 1 } else { 1 };
            let expected: Vec<u32> = (k..k + numbers.len() as u32).collect();
            prop_assert_eq!(numbers, &expected);
        }
    }

    /// 未確定スコープでは削除後の番号が常に 1..N
    #[test]
    fn prop_unscoped_delete_renumbers(
        count in 1..10usize,
        deletes in proptest::collection::vec(0..10usize, 1..5),
    ) {
        let store = MemoryRecordStore::default();
        let h = header("", "");
        let mut list = DraftItemList::default();
        for i in 0..count {
            list.add_or_update(ItemDraft::new(&format!("場所{}", i), "さび", ""), &h, &store, now()).unwrap();
        }

        for d in deletes {
            if list.is_empty() {
                break;
            }
            list.delete(d % list.len()).unwrap();
            let numbers: Vec<u32> = list.entries().iter().map(|e| e.item.number).collect();
            let expected: Vec<u32> = (1..=list.len() as u32).collect();
            prop_assert_eq!(numbers, expected);
        }

        let next = list.add_or_update(ItemDraft::new("追加", "さび", ""), &h, &store, now()).unwrap().number;
        prop_assert_eq!(next as usize, list.len());
    }
}

//! 対話式の入力フォーム
//!
//! 基本情報の入力 → 劣化項目の追加・編集・削除 → 台帳に保存、を
//! メニューで繰り返す。操作ごとにセッションを書き戻す。

use crate::draft::DraftEntry;
use crate::error::{Result, TenkenError};
use crate::session::SessionState;
use crate::store::{CsvRecordStore, IndexedRow, RecordStore, SaveOutcome};
use chrono::NaiveDate;
use dialoguer::{Confirm, Input, Select};
use std::path::PathBuf;
use tenken_common::types::DATE_FORMAT;
use tenken_common::{Category, InspectionHeader, ItemDraft, VocabularyIndex};

const KEEP_INPUT: &str = "（入力のまま）";

pub struct FormContext {
    pub store: CsvRecordStore,
    pub vocabulary: VocabularyIndex,
    pub session_path: PathBuf,
    pub max_suggestions: usize,
}

enum MenuAction {
    Header,
    AddItem,
    EditItem,
    DeleteItem,
    Save,
    Browse,
    Quit,
}

const MENU: &[(&str, MenuAction)] = &[
    ("基本情報を入力", MenuAction::Header),
    ("劣化項目を追加", MenuAction::AddItem),
    ("劣化項目を編集", MenuAction::EditItem),
    ("劣化項目を削除", MenuAction::DeleteItem),
    ("台帳に保存", MenuAction::Save),
    ("台帳を検索・編集", MenuAction::Browse),
    ("終了", MenuAction::Quit),
];

/// 入力フォームを実行
pub fn run_form(ctx: &mut FormContext, session: &mut SessionState) -> Result<()> {
    println!("📋 12条点検 入力フォーム\n");

    loop {
        print_header(&session.header);
        print_drafts(session.drafts.entries(), session.drafts.edit_target());
        println!();

        let labels: Vec<&str> = MENU.iter().map(|(label, _)| *label).collect();
        let choice = Select::new()
            .with_prompt("操作を選択")
            .items(&labels)
            .default(0)
            .interact()
            .map_err(input_error)?;

        let outcome = match MENU[choice].1 {
            MenuAction::Header => edit_header(ctx, session),
            MenuAction::AddItem => add_item(ctx, session),
            MenuAction::EditItem => edit_item(ctx, session),
            MenuAction::DeleteItem => delete_item(session),
            MenuAction::Save => save(ctx, session),
            MenuAction::Browse => browse(ctx, session),
            MenuAction::Quit => {
                if session.drafts.unsaved_count() > 0 {
                    println!("⚠ 未保存の劣化項目が{}件あります（セッションに残します）", session.drafts.unsaved_count());
                }
                session.save(&ctx.session_path)?;
                return Ok(());
            }
        };

        if let Err(e) = outcome {
            println!("⚠ {}\n", e);
        }
        session.save(&ctx.session_path)?;
    }
}

fn input_error(e: dialoguer::Error) -> TenkenError {
    TenkenError::Input(e.to_string())
}

fn prompt_text(prompt: &str, initial: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .with_initial_text(initial)
        .allow_empty(true)
        .interact_text()
        .map(|s| s.trim().to_string())
        .map_err(input_error)
}

fn edit_header(ctx: &FormContext, session: &mut SessionState) -> Result<()> {
    let current = session.header.clone();
    let date_text = prompt_text("点検日 (YYYY-MM-DD)", &current.date_string())?;
    let inspection_date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT)
        .map_err(|_| TenkenError::Validation(format!("点検日の形式が不正です: {}", date_text)))?;

    let header = InspectionHeader {
        inspection_date,
        inspector_name: prompt_text("点検者名", &current.inspector_name)?,
        site_name: prompt_text("現場名", &current.site_name)?,
        building_name: prompt_text("建物名", &current.building_name)?,
        remarks: prompt_text("備考", &current.remarks)?,
    };

    if session.set_header(header, &ctx.store)? {
        println!("✔ 台帳から{}件の劣化項目を読み込みました\n", session.drafts.len());
    } else {
        println!("✔ 基本情報を更新しました\n");
    }
    Ok(())
}

/// 補完候補（表示上限つき）
pub fn pick_suggestions(vocabulary: &VocabularyIndex, category: Category, input: &str, max: usize) -> Vec<String> {
    let mut candidates = vocabulary.suggest(category, input);
    candidates.truncate(max);
    candidates
}

/// 入力に候補があれば選ばせる
fn prompt_with_suggestions(ctx: &FormContext, category: Category, initial: &str) -> Result<String> {
    let typed = prompt_text(&category.to_string(), initial)?;
    let candidates = pick_suggestions(&ctx.vocabulary, category, &typed, ctx.max_suggestions);
    if candidates.is_empty() || candidates.iter().any(|c| *c == typed) {
        return Ok(typed);
    }

    let mut items = candidates.clone();
    items.push(KEEP_INPUT.to_string());
    let choice = Select::new()
        .with_prompt(format!("{}の候補", category))
        .items(&items)
        .default(0)
        .interact()
        .map_err(input_error)?;

    Ok(candidates.get(choice).cloned().unwrap_or(typed))
}

fn prompt_item(ctx: &FormContext, initial: &ItemDraft) -> Result<ItemDraft> {
    Ok(ItemDraft {
        location: prompt_with_suggestions(ctx, Category::Location, &initial.location)?,
        deterioration_name: prompt_with_suggestions(ctx, Category::Deterioration, &initial.deterioration_name)?,
        photo_number: prompt_text("写真番号", &initial.photo_number)?,
    })
}

fn add_item(ctx: &FormContext, session: &mut SessionState) -> Result<()> {
    let pending = prompt_item(ctx, &ItemDraft::default())?;
    let item = session.submit_item(pending, &ctx.store)?;
    println!("✔ 劣化番号 {} を追加しました\n", item.number);
    Ok(())
}

fn select_draft(session: &SessionState, prompt: &str) -> Result<Option<usize>> {
    if session.drafts.is_empty() {
        println!("劣化項目がありません\n");
        return Ok(None);
    }
    let items: Vec<String> = session
        .drafts
        .entries()
        .iter()
        .enumerate()
        .map(|(i, e)| format_draft_line(i, e, false))
        .collect();
    let choice = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact_opt()
        .map_err(input_error)?;
    Ok(choice)
}

fn edit_item(ctx: &FormContext, session: &mut SessionState) -> Result<()> {
    let Some(index) = select_draft(session, "編集する項目")? else {
        return Ok(());
    };
    let initial = session.drafts.begin_edit(index)?;
    let pending = match prompt_item(ctx, &initial) {
        Ok(p) => p,
        Err(e) => {
            session.drafts.cancel_edit();
            return Err(e);
        }
    };
    let item = session.submit_edit(pending, &ctx.store)?;
    println!("✔ 劣化番号 {} を更新しました\n", item.number);
    Ok(())
}

fn delete_item(session: &mut SessionState) -> Result<()> {
    let Some(index) = select_draft(session, "削除する項目")? else {
        return Ok(());
    };
    let confirmed = Confirm::new()
        .with_prompt("削除しますか？")
        .default(false)
        .interact()
        .map_err(input_error)?;
    if confirmed {
        let removed = session.drafts.delete(index)?;
        println!("✔ 劣化番号 {} を削除しました\n", removed.number);
    }
    Ok(())
}

fn save(ctx: &mut FormContext, session: &mut SessionState) -> Result<()> {
    match session.save_drafts(&mut ctx.store)? {
        SaveOutcome::Written(n) => println!("✔ {}件を台帳に保存しました\n", n),
        SaveOutcome::NothingToSave => println!("保存する劣化項目がありません\n"),
    }
    Ok(())
}

fn browse(ctx: &mut FormContext, session: &mut SessionState) -> Result<()> {
    let term = prompt_text("検索語（空欄で全件）", "")?;
    let hits = ctx.store.query(Some(term.as_str()))?;
    if hits.is_empty() {
        println!("該当する行がありません\n");
        return Ok(());
    }

    let items: Vec<String> = hits.iter().map(format_row_line).collect();
    let Some(choice) = Select::new()
        .with_prompt("編集する行（Escで戻る）")
        .items(&items)
        .default(0)
        .interact_opt()
        .map_err(input_error)?
    else {
        return Ok(());
    };

    let index = hits[choice].index;
    let initial = session.begin_row_edit(index, &ctx.store)?;
    let updated = prompt_item(ctx, &initial).and_then(|pending| session.commit_row_edit(pending, &mut ctx.store));
    let updated = match updated {
        Ok(row) => row,
        Err(e) => {
            session.cancel_row_edit();
            return Err(e);
        }
    };
    println!(
        "✔ {}行目を更新しました（更新回数: {}）\n",
        index + 1,
        updated.update_count.unwrap_or(0)
    );
    Ok(())
}

pub fn print_header(header: &InspectionHeader) {
    println!(
        "点検日: {}  点検者: {}  現場: {}  建物: {}",
        header.date_string(),
        header.inspector_name,
        header.site_name,
        header.building_name
    );
    if !header.remarks.is_empty() {
        println!("備考: {}", header.remarks);
    }
}

/// 下書き1行分の表示
pub fn format_draft_line(position: usize, entry: &DraftEntry, editing: bool) -> String {
    let item = &entry.item;
    let mark = if editing {
        "✎"
    } else if entry.saved {
        "✔"
    } else {
        " "
    };
    format!(
        "{:>3}. {} No.{} {} / {} 写真:{}",
        position + 1,
        mark,
        item.number,
        item.location,
        item.deterioration_name,
        if item.photo_number.is_empty() { "-" } else { item.photo_number.as_str() }
    )
}

pub fn print_drafts(entries: &[DraftEntry], edit_target: Option<usize>) {
    if entries.is_empty() {
        println!("（劣化項目なし）");
        return;
    }
    println!("劣化項目（✔=保存済み）:");
    for (i, entry) in entries.iter().enumerate() {
        println!("  {}", format_draft_line(i, entry, edit_target == Some(i)));
    }
}

/// 台帳1行分の表示
pub fn format_row_line(hit: &IndexedRow) -> String {
    let row = &hit.row;
    format!(
        "{:>4}. {} {} {} / {} No.{} {} / {} 写真:{}",
        hit.index + 1,
        row.inspection_date,
        row.inspector_name,
        row.site_name,
        row.building_name,
        row.number,
        row.location,
        row.deterioration_name,
        if row.photo_number.is_empty() { "-" } else { row.photo_number.as_str() }
    )
}

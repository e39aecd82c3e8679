use clap::Parser;
use tenken_rust::{cli, config, error, export, form, master, session, store, vocabulary};
use cli::{Cli, Commands, ItemAction, MasterAction};
use config::Config;
use error::{Result, TenkenError};
use session::{RowChanges, SessionState};
use store::{CsvRecordStore, RecordStore, SaveOutcome};
use tenken_common::{Category, ItemDraft, VocabularyIndex};

fn init_tracing(cli: &Cli) {
    // --verbose: RUST_LOG があればそれを優先、なければ info
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli) {
        eprintln!("エラー: {}", e);
        std::process::exit(1);
    }
}

/// 表示番号（1始まり）を位置に変換し、範囲外ならエラー
fn position(display: usize, len: usize) -> Result<usize> {
    match cli::to_position(display) {
        Some(pos) if pos < len => Ok(pos),
        _ => Err(TenkenError::NotFound { index: display, len }),
    }
}

fn load_vocabulary(config: &Config) -> VocabularyIndex {
    let (index, warning) = vocabulary::load_vocabulary(&config.master_path());
    if let Some(e) = warning {
        println!("⚠ {}（既定の語彙を使用します）", e);
    }
    index
}

/// 更新者として記録する点検者名（セッション → 設定の順）
fn current_inspector(session: &SessionState, config: &Config) -> String {
    let name = session.header.inspector_name.trim();
    if name.is_empty() {
        config.default_inspector.clone().unwrap_or_default()
    } else {
        name.to_string()
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }

    let mut store = CsvRecordStore::new(config.record_path());
    let session_path = config.session_path();
    let load_session = || SessionState::load(&session_path, config.default_inspector.as_deref());

    match cli.command {
        Commands::Form => {
            let mut session = load_session();
            let mut ctx = form::FormContext {
                store,
                vocabulary: load_vocabulary(&config),
                session_path: session_path.clone(),
                max_suggestions: config.max_suggestions,
            };
            form::run_form(&mut ctx, &mut session)?;
            println!("\n✅ 入力を終了しました");
        }

        Commands::Header { date, inspector, site, building, remarks } => {
            let mut session = load_session();
            let mut header = session.header.clone();
            if let Some(d) = date {
                header.inspection_date = d;
            }
            if let Some(v) = inspector {
                header.inspector_name = v.trim().to_string();
            }
            if let Some(v) = site {
                header.site_name = v.trim().to_string();
            }
            if let Some(v) = building {
                header.building_name = v.trim().to_string();
            }
            if let Some(v) = remarks {
                header.remarks = v;
            }

            let loaded = session.set_header(header, &store)?;
            session.save(&session_path)?;

            form::print_header(&session.header);
            if loaded {
                println!("✔ 台帳から{}件の劣化項目を読み込みました", session.drafts.len());
            } else {
                println!("✔ 基本情報を更新しました");
            }
        }

        Commands::Item { action } => {
            let mut session = load_session();
            match action {
                ItemAction::Add { location, deterioration, photo } => {
                    let item = session.submit_item(ItemDraft::new(&location, &deterioration, &photo), &store)?;
                    session.save(&session_path)?;
                    println!("✔ 劣化番号 {} を追加しました（{} / {}）", item.number, item.location, item.deterioration_name);
                }
                ItemAction::Edit { index, location, deterioration, photo } => {
                    let pos = position(index, session.drafts.len())?;
                    let mut pending = session.drafts.begin_edit(pos)?;
                    if let Some(v) = location {
                        pending.location = v;
                    }
                    if let Some(v) = deterioration {
                        pending.deterioration_name = v;
                    }
                    if let Some(v) = photo {
                        pending.photo_number = v;
                    }
                    let item = session.submit_edit(pending, &store)?;
                    session.save(&session_path)?;
                    println!("✔ 劣化番号 {} を更新しました（更新回数: {}）", item.number, item.update_count);
                }
                ItemAction::Delete { index } => {
                    let pos = position(index, session.drafts.len())?;
                    let removed = session.drafts.delete(pos)?;
                    session.save(&session_path)?;
                    println!("✔ 劣化番号 {} を削除しました", removed.number);
                }
                ItemAction::List => {
                    form::print_header(&session.header);
                    form::print_drafts(session.drafts.entries(), session.drafts.edit_target());
                    let unsaved = session.drafts.unsaved_count();
                    if unsaved > 0 {
                        println!("⚠ 未保存: {}件", unsaved);
                    }
                }
            }
        }

        Commands::Save => {
            let mut session = load_session();
            match session.save_drafts(&mut store)? {
                SaveOutcome::Written(n) => {
                    session.save(&session_path)?;
                    println!("✔ {}件を台帳に保存しました: {}", n, store.path().display());
                }
                SaveOutcome::NothingToSave => println!("保存する劣化項目がありません"),
            }
        }

        Commands::Suggest { input, category } => {
            let vocabulary = load_vocabulary(&config);
            let candidates = form::pick_suggestions(&vocabulary, category, &input, config.max_suggestions);
            if candidates.is_empty() {
                println!("候補がありません");
            } else {
                println!("{}の候補:", category);
                for c in candidates {
                    println!("  {}", c);
                }
            }
        }

        Commands::List { search } => {
            let hits = store.query(search.as_deref())?;
            if hits.is_empty() {
                println!("該当する行がありません");
            } else {
                for hit in &hits {
                    println!("{}", form::format_row_line(hit));
                }
                println!("\n📋 {}件", hits.len());
            }
        }

        Commands::Update {
            row,
            date,
            inspector,
            site,
            building,
            remarks,
            number,
            location,
            deterioration,
            photo,
        } => {
            let changes = RowChanges {
                inspection_date: date,
                inspector_name: inspector,
                site_name: site,
                building_name: building,
                remarks,
                number,
                location,
                deterioration_name: deterioration,
                photo_number: photo,
            };
            if changes.is_empty() {
                return Err(TenkenError::Validation("変更する項目を指定してください".into()));
            }
            let len = store.load()?.len();
            let pos = position(row, len)?;
            let updated_by = current_inspector(&load_session(), &config);
            let updated = session::update_stored_row(&mut store, pos, changes, &updated_by)?;
            println!(
                "✔ {}行目を更新しました（更新者: {} / 更新回数: {}）",
                row,
                updated.updated_by.unwrap_or_default(),
                updated.update_count.unwrap_or(0)
            );
        }

        Commands::Import { input } => {
            let bytes = std::fs::read(&input)?;
            let rows = store::csv_file::decode_rows(&bytes).ok_or_else(|| {
                TenkenError::Persistence(format!("{} を読み込めません", input.display()))
            })?;
            let updated_by = current_inspector(&load_session(), &config);
            let count = store.bulk_replace(rows, &updated_by)?;
            println!("✔ 台帳を{}行で置き換えました", count);
        }

        Commands::Export { output, search, format } => {
            let rows: Vec<_> = store
                .query(search.as_deref())?
                .into_iter()
                .map(|hit| hit.row)
                .collect();
            let path = export::export_rows(&rows, &format, &output)?;
            println!("✔ {}件を出力: {}", rows.len(), path.display());
        }

        Commands::Master { action } => match action {
            MasterAction::Init { force, with_readings } => {
                let path = config.master_path();
                let count = master::init_master(&path, force, with_readings)?;
                println!("✔ 既定マスタ（{}件）を作成しました: {}", count, path.display());
            }
            MasterAction::Show => {
                let vocabulary = load_vocabulary(&config);
                for category in [Category::Location, Category::Deterioration] {
                    println!("{}: {}", category, vocabulary.category(category).terms().join(", "));
                }
            }
        },

        Commands::Session { show, clear } => {
            if show || !clear {
                if session_path.exists() {
                    let session = load_session();
                    println!("セッション: {}", session_path.display());
                    form::print_header(&session.header);
                    form::print_drafts(session.drafts.entries(), session.drafts.edit_target());
                } else {
                    println!("セッションファイルが存在しません: {}", session_path.display());
                }
            }

            if clear {
                if SessionState::clear(&session_path)? {
                    println!("✔ セッションを破棄しました");
                } else {
                    println!("セッションファイルが存在しません");
                }
            }
        }

        Commands::Config { set_inspector, set_data_dir, show } => {
            if let Some(name) = set_inspector {
                config.set_default_inspector(name)?;
                println!("✔ 点検者名の初期値を設定しました");
            }
            if let Some(dir) = set_data_dir {
                config.set_data_dir(dir)?;
                println!("✔ データフォルダを設定しました");
            }

            if show {
                println!("設定:");
                println!("  データフォルダ: {}", config.data_dir.display());
                println!("  台帳: {}", config.record_path().display());
                println!("  マスタ: {}", config.master_path().display());
                println!("  点検者名: {}", config.default_inspector.as_deref().unwrap_or("未設定"));
                println!("  補完候補の上限: {}", config.max_suggestions);
            }
        }
    }

    Ok(())
}

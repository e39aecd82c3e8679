use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tenken_common::Category;

#[derive(Parser)]
#[command(name = "tenken")]
#[command(about = "12条点検 入力フォーム・点検台帳管理ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// データフォルダ（台帳・マスタ・セッション）
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 対話式の入力フォーム
    Form,

    /// 点検の基本情報を設定
    Header {
        /// 点検日 (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// 点検者名
        #[arg(long)]
        inspector: Option<String>,

        /// 現場名
        #[arg(long)]
        site: Option<String>,

        /// 建物名
        #[arg(long)]
        building: Option<String>,

        /// 備考
        #[arg(long)]
        remarks: Option<String>,
    },

    /// 劣化項目の下書きを操作
    Item {
        #[command(subcommand)]
        action: ItemAction,
    },

    /// 未保存の劣化項目を台帳に保存
    Save,

    /// 入力補完の候補を表示
    Suggest {
        /// 入力中の文字列（読み仮名・語の先頭）
        #[arg(required = true)]
        input: String,

        /// 区分 (location/deterioration)
        #[arg(short, long, default_value = "location")]
        category: Category,
    },

    /// 台帳を一覧表示
    List {
        /// 検索語（全列の部分一致、大文字小文字を区別しない）
        #[arg(short, long)]
        search: Option<String>,
    },

    /// 台帳の行を直接編集
    Update {
        /// 行番号（list の表示番号）
        #[arg(required = true)]
        row: usize,

        /// 点検日 (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        inspector: Option<String>,

        #[arg(long)]
        site: Option<String>,

        #[arg(long)]
        building: Option<String>,

        #[arg(long)]
        remarks: Option<String>,

        /// 劣化番号
        #[arg(long)]
        number: Option<u32>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        deterioration: Option<String>,

        #[arg(long)]
        photo: Option<String>,
    },

    /// 編集済みの表で台帳を一括置換
    Import {
        /// 台帳と同じ列構成のCSV
        #[arg(required = true)]
        input: PathBuf,
    },

    /// 台帳をCSV/Excelに書き出し
    Export {
        /// 出力ファイル/ディレクトリ
        #[arg(short, long)]
        output: PathBuf,

        /// 検索語で絞り込み
        #[arg(short, long)]
        search: Option<String>,

        /// 出力形式 (csv/excel)
        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,
    },

    /// 語彙マスタ管理
    Master {
        #[command(subcommand)]
        action: MasterAction,
    },

    /// 入力セッションの確認・破棄
    Session {
        /// セッション内容を表示
        #[arg(long)]
        show: bool,

        /// セッションを破棄
        #[arg(long)]
        clear: bool,
    },

    /// 設定を表示/編集
    Config {
        /// 点検者名の初期値を設定
        #[arg(long)]
        set_inspector: Option<String>,

        /// データフォルダを設定
        #[arg(long)]
        set_data_dir: Option<PathBuf>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
pub enum ItemAction {
    /// 劣化項目を追加（編集中ならその項目を上書き）
    Add {
        #[arg(short, long)]
        location: String,

        #[arg(short, long)]
        deterioration: String,

        /// 写真番号
        #[arg(short, long, default_value = "")]
        photo: String,
    },

    /// 劣化項目を編集
    Edit {
        /// 項目番号（item list の表示番号）
        #[arg(required = true)]
        index: usize,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(short, long)]
        deterioration: Option<String>,

        #[arg(short, long)]
        photo: Option<String>,
    },

    /// 劣化項目を削除
    Delete {
        #[arg(required = true)]
        index: usize,
    },

    /// 下書きを一覧表示
    List,
}

#[derive(Subcommand)]
pub enum MasterAction {
    /// 既定のマスタファイルを作成（Shift_JIS）
    Init {
        /// 既存ファイルを上書き
        #[arg(long)]
        force: bool,

        /// 読み仮名の列も出力
        #[arg(long)]
        with_readings: bool,
    },

    /// マスタの語を一覧表示
    Show,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Excel,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            _ => Err(format!("Unknown format: {}. Use csv or excel", s)),
        }
    }
}

/// 表示番号（1始まり）を位置に変換
pub fn to_position(display: usize) -> Option<usize> {
    display.checked_sub(1)
}

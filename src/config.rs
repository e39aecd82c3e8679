use crate::error::{Result, TenkenError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "TENKEN_DATA_DIR";
pub const INSPECTOR_ENV: &str = "TENKEN_INSPECTOR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 台帳・マスタ・セッションを置くフォルダ
    pub data_dir: PathBuf,
    pub record_file: String,
    pub master_file: String,
    pub session_file: String,
    /// 点検者名の初期値
    pub default_inspector: Option<String>,
    /// 表示する補完候補の上限
    pub max_suggestions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            record_file: "inspection_data.csv".into(),
            master_file: "master_data.csv".into(),
            session_file: ".session.json".into(),
            default_inspector: None,
            max_suggestions: 10,
        }
    }
}

impl Config {
    /// 設定ファイルを読み込み、環境変数で上書きする
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = Self::load_from(&config_path)?;

        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(name) = std::env::var(INSPECTOR_ENV) {
            if !name.trim().is_empty() {
                config.default_inspector = Some(name);
            }
        }

        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            tracing::debug!(path = %path.display(), "設定を読み込みました");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| TenkenError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("tenken").join("config.json"))
    }

    pub fn record_path(&self) -> PathBuf {
        self.data_dir.join(&self.record_file)
    }

    pub fn master_path(&self) -> PathBuf {
        self.data_dir.join(&self.master_file)
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join(&self.session_file)
    }

    pub fn set_default_inspector(&mut self, name: String) -> Result<()> {
        self.default_inspector = Some(name);
        self.save()
    }

    pub fn set_data_dir(&mut self, dir: PathBuf) -> Result<()> {
        self.data_dir = dir;
        self.save()
    }
}

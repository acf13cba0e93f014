use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// データディレクトリを上書きする環境変数
pub const DATA_DIR_ENV: &str = "PRICING_AUTO_DATA_DIR";
/// マッピング表ディレクトリを上書きする環境変数
pub const MAPPING_DIR_ENV: &str = "PRICING_AUTO_MAPPING_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 価格表の置き場所
    pub data_dir: PathBuf,
    /// マッピング表の置き場所（省略時は data_dir）
    pub mapping_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// 公式テーブルの JSON（省略時は組み込み）
    pub formula_file: Option<PathBuf>,
    /// バッチを並列実行するか
    pub parallel_batch: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PricingError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("pricing-auto").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            data_dir: PathBuf::from("runtime").join("data"),
            mapping_dir: None,
            output_dir: PathBuf::from("runtime").join("outputs"),
            formula_file: None,
            parallel_batch: true,
        }
    }

    /// 価格表ディレクトリ（環境変数を優先）
    pub fn resolved_data_dir(&self) -> PathBuf {
        // 環境変数を優先
        match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => self.data_dir.clone(),
        }
    }

    /// マッピング表ディレクトリ（環境変数 → 設定 → 価格表ディレクトリ）
    pub fn resolved_mapping_dir(&self) -> PathBuf {
        match std::env::var(MAPPING_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => self
                .mapping_dir
                .clone()
                .unwrap_or_else(|| self.resolved_data_dir()),
        }
    }

    pub fn set_data_dir(&mut self, dir: PathBuf) -> Result<()> {
        self.data_dir = dir;
        self.save()
    }

    pub fn set_mapping_dir(&mut self, dir: PathBuf) -> Result<()> {
        self.mapping_dir = Some(dir);
        self.save()
    }

    pub fn set_formula_file(&mut self, path: PathBuf) -> Result<()> {
        if !path.is_file() {
            return Err(PricingError::FileNotFound(path.display().to_string()));
        }
        self.formula_file = Some(path);
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from("runtime").join("data"));
        assert!(config.mapping_dir.is_none());
        assert!(config.parallel_batch);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"data_dir": "/srv/prices"}"#).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/prices"));
        assert_eq!(config.output_dir, PathBuf::from("runtime").join("outputs"));
        assert!(config.formula_file.is_none());
    }
}

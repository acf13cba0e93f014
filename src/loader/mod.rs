//! 参照データのロード
//!
//! 価格表2つ・マッピング表2つ・公式テーブルを一度だけ読み込み、
//! 照会エンジンに渡す不変スナップショットを作る。

pub mod mapping_csv;
pub mod meta;
pub mod pn_list;
pub mod sheet;

pub use mapping_csv::{load_rule_table, parse_rule_table};
pub use meta::{FileMeta, SnapshotMeta};
pub use pn_list::{parse_pn_text, read_pn_list};
pub use sheet::{read_sheet, Table};

use crate::config::Config;
use crate::error::{PricingError, Result};
use pricing_auto_common::{Catalog, CatalogSide, FormulaBook, ReferenceSnapshot};
use std::path::{Path, PathBuf};

pub const PRIMARY_FILE: &str = "FrancePrice.xlsx";
pub const SECONDARY_FILES: [&str; 2] = ["SysPrice.xls", "SysPrice.xlsx"];
pub const PRIMARY_MAPPING_FILE: &str = "productline_map_france_full.csv";
pub const SECONDARY_MAPPING_FILE: &str = "productline_map_sys_full.csv";

/// 参照ファイルの場所
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePaths {
    pub primary: PathBuf,
    pub secondary: PathBuf,
    pub primary_mapping: PathBuf,
    pub secondary_mapping: PathBuf,
}

impl ReferencePaths {
    /// 4ファイルを探す。1つでも欠けていれば確認したパスを添えてエラー
    pub fn locate(data_dir: &Path, mapping_dir: &Path) -> Result<Self> {
        let primary = require(PRIMARY_FILE, &[data_dir.join(PRIMARY_FILE)])?;
        let secondary_candidates: Vec<PathBuf> =
            SECONDARY_FILES.iter().map(|f| data_dir.join(f)).collect();
        let secondary = require("SysPrice", &secondary_candidates)?;
        let primary_mapping = require(PRIMARY_MAPPING_FILE, &[mapping_dir.join(PRIMARY_MAPPING_FILE)])?;
        let secondary_mapping =
            require(SECONDARY_MAPPING_FILE, &[mapping_dir.join(SECONDARY_MAPPING_FILE)])?;

        Ok(Self {
            primary,
            secondary,
            primary_mapping,
            secondary_mapping,
        })
    }
}

fn require(name: &str, candidates: &[PathBuf]) -> Result<PathBuf> {
    candidates
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .ok_or_else(|| PricingError::MissingReferenceFile {
            name: name.to_string(),
            tried: candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// ロード済みのスナップショットとメタ情報
#[derive(Debug, Clone)]
pub struct LoadedSnapshot {
    pub snapshot: ReferenceSnapshot,
    pub meta: SnapshotMeta,
}

/// 価格表を読み、PN 索引付きの Catalog にする
pub fn load_catalog(side: CatalogSide, path: &Path) -> Result<Catalog> {
    let table = read_sheet(path)?;
    let catalog = Catalog::new(side, &table.headers, table.records)?;
    tracing::info!(
        side = %side,
        path = %path.display(),
        rows = catalog.len(),
        pn_column = catalog.pn_column(),
        "価格表を読み込み"
    );
    Ok(catalog)
}

/// 指定ファイル群からスナップショットを作る
pub fn load_from_paths(paths: &ReferencePaths, formula_file: Option<&Path>) -> Result<LoadedSnapshot> {
    let primary = load_catalog(CatalogSide::Primary, &paths.primary)?;
    let secondary = load_catalog(CatalogSide::Secondary, &paths.secondary)?;
    let primary_rules = load_rule_table(&paths.primary_mapping)?;
    let secondary_rules = load_rule_table(&paths.secondary_mapping)?;

    let (formulas, formula_source) = match formula_file {
        Some(path) => {
            if !path.is_file() {
                return Err(PricingError::FileNotFound(path.display().to_string()));
            }
            (FormulaBook::from_file(path)?, path.display().to_string())
        }
        None => (FormulaBook::builtin(), "builtin".to_string()),
    };

    let files = vec![
        meta::file_meta("primary", &paths.primary, primary.len())?,
        meta::file_meta("secondary", &paths.secondary, secondary.len())?,
        meta::file_meta("primary_mapping", &paths.primary_mapping, primary_rules.len())?,
        meta::file_meta("secondary_mapping", &paths.secondary_mapping, secondary_rules.len())?,
    ];
    let meta = SnapshotMeta::new(files, formula_source);
    tracing::info!(fingerprint = %meta.fingerprint, "参照データのロード完了");

    Ok(LoadedSnapshot {
        snapshot: ReferenceSnapshot {
            primary,
            secondary,
            primary_rules,
            secondary_rules,
            formulas,
        },
        meta,
    })
}

/// 設定に従ってスナップショットを作る
pub fn load_snapshot(config: &Config) -> Result<LoadedSnapshot> {
    let paths = ReferencePaths::locate(&config.resolved_data_dir(), &config.resolved_mapping_dir())?;
    load_from_paths(&paths, config.formula_file.as_deref())
}

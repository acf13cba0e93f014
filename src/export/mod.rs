pub mod excel;
pub mod report;

use crate::error::Result;
use pricing_auto_common::{BatchOutcome, ExportLevel};
use std::path::{Path, PathBuf};

pub use report::{BatchReport, REPORT_FILE};

/// 書き出したファイル
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub workbook: PathBuf,
    pub report: PathBuf,
}

/// バッチ結果を取込用 Excel とレポート JSON に書き出す
pub fn export_batch(outcome: &BatchOutcome, level: ExportLevel, output_dir: &Path) -> Result<ExportPaths> {
    std::fs::create_dir_all(output_dir)?;

    let workbook = output_dir.join(level.file_name());
    println!("- Excelを生成中... (レベル: {})", level);
    excel::generate_excel(&outcome.results, &outcome.not_found, level, &workbook)?;
    println!("✔ Excel出力: {}", workbook.display());

    let report = output_dir.join(REPORT_FILE);
    BatchReport::from_outcome(outcome, level, &workbook).save(&report)?;
    println!("✔ レポート出力: {}", report.display());

    Ok(ExportPaths { workbook, report })
}

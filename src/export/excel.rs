//! Excel出力（CLI版）
//!
//! ブック本体は共通ライブラリの excel_core でメモリ上に作り、ここではファイルに書くだけ。

use crate::error::{PricingError, Result};
use pricing_auto_common::export::excel_core::generate_price_workbook;
use pricing_auto_common::{ComputationResult, ExportLevel};
use std::path::Path;

pub fn generate_excel(
    results: &[ComputationResult],
    not_found: &[String],
    level: ExportLevel,
    output_path: &Path,
) -> Result<()> {
    let buffer = generate_price_workbook(results, not_found, level).map_err(PricingError::ExcelGeneration)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output_path, buffer)?;
    tracing::info!(path = %output_path.display(), rows = results.len(), "Excelを出力");
    Ok(())
}

//! バッチレポート（report.json）

use crate::error::Result;
use chrono::Local;
use pricing_auto_common::{BatchCounts, BatchOutcome, ExportLevel};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const REPORT_FILE: &str = "report.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub generated_at: String,
    pub level: String,
    pub workbook: String,
    pub totals: BatchCounts,
    pub not_found: Vec<String>,
    pub warnings: Vec<String>,
}

impl BatchReport {
    pub fn from_outcome(outcome: &BatchOutcome, level: ExportLevel, workbook: &Path) -> Self {
        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            level: level.to_string(),
            workbook: workbook.display().to_string(),
            totals: outcome.counts.clone(),
            not_found: outcome.not_found.clone(),
            warnings: outcome.warnings.clone(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

//! 表形式ファイルの読み込み
//!
//! 先頭シートの1行目をヘッダーとし、以降の行を CatalogRecord にする。
//! 数値セルは10進文字列、空セルは持たない。

use crate::error::{PricingError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use pricing_auto_common::CatalogRecord;
use std::path::Path;

/// ヘッダーと行
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub records: Vec<CatalogRecord>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// セルを文字列化（整数値の float は小数点なし）
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{:.0}", f)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// xlsx / xls の先頭シートを読む
pub fn read_sheet(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(PricingError::FileNotFound(path.display().to_string()));
    }

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| PricingError::SheetRead(format!("{}: {}", path.display(), e)))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| PricingError::SheetRead(format!("{}: シートがありません", path.display())))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| PricingError::SheetRead(format!("{} [{}]: {}", path.display(), sheet_name, e)))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(cell_text).collect(),
        None => return Ok(Table::default()),
    };

    let records = rows
        .map(|row| {
            CatalogRecord::from_pairs(
                headers
                    .iter()
                    .zip(row.iter())
                    .filter(|(h, _)| !h.is_empty())
                    .map(|(h, cell)| (h.clone(), cell_text(cell))),
            )
        })
        .filter(|r| !r.is_empty())
        .collect();

    Ok(Table { headers, records })
}

//! バッチ入力の PN リスト
//!
//! - .txt: 1行1件。空白・`,`・`;` で区切った先頭トークンを使い、`#` 行は無視
//! - .csv: PN 列があればその列、なければ1列目
//! - .xlsx / .xls: PN 列

use super::sheet::read_sheet;
use crate::error::{PricingError, Result};
use csv::ReaderBuilder;
use pricing_auto_common::{detect_pn_column, Error as CoreError};
use std::path::Path;

pub fn read_pn_list(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(PricingError::FileNotFound(path.display().to_string()));
    }

    let suffix = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match suffix.as_str() {
        "txt" => Ok(parse_pn_text(&std::fs::read_to_string(path)?)),
        "csv" => parse_pn_csv(std::fs::File::open(path)?),
        "xlsx" | "xls" => {
            let table = read_sheet(path)?;
            let column = detect_pn_column(&table.headers).ok_or_else(|| CoreError::MissingPnColumn {
                catalog: "PN list".to_string(),
                headers: table.headers.join(", "),
            })?;
            Ok(table
                .records
                .iter()
                .filter_map(|r| r.text(&column))
                .map(|s| s.to_string())
                .collect())
        }
        _ => Err(PricingError::UnsupportedInput(path.display().to_string())),
    }
}

/// テキストから PN を取り出す
pub fn parse_pn_text(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim_start_matches('\u{feff}').trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            line.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
                .find(|t| !t.is_empty())
                .map(|t| t.to_string())
        })
        .collect()
}

fn parse_pn_csv<R: std::io::Read>(reader: R) -> Result<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let index = detect_pn_column(&headers)
        .and_then(|c| headers.iter().position(|h| *h == c))
        .unwrap_or(0);

    let mut pns = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(pn) = record.get(index).map(str::trim).filter(|s| !s.is_empty()) {
            pns.push(pn.to_string());
        }
    }
    Ok(pns)
}

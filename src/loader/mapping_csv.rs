//! マッピング表 CSV の読み込み
//!
//! 列: priority, field1, match_type1, pattern1, field2, match_type2, pattern2,
//! category, price_group_hint（ヘッダー名で参照、大文字小文字は無視）

use crate::error::{PricingError, Result};
use csv::ReaderBuilder;
use pricing_auto_common::{Condition, MappingRule, MatchType, RuleTable};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

const REQUIRED_COLUMNS: &[&str] = &["field1", "match_type1", "pattern1", "category"];

pub fn load_rule_table(path: &Path) -> Result<RuleTable> {
    if !path.exists() {
        return Err(PricingError::FileNotFound(path.display().to_string()));
    }
    let file = std::fs::File::open(path)?;
    let table = parse_rule_table(file)
        .map_err(|e| PricingError::MappingParse(format!("{}: {}", path.display(), e)))?;
    tracing::info!(path = %path.display(), rules = table.len(), "マッピング表を読み込み");
    Ok(table)
}

/// CSV 本文からマッピング表を作る
pub fn parse_rule_table<R: Read>(reader: R) -> Result<RuleTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim_start_matches('\u{feff}').trim().to_lowercase(), i))
        .collect();

    if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !columns.contains_key(**c)) {
        return Err(PricingError::MappingParse(format!("column '{}' is missing", missing)));
    }

    let mut rules = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let get = |name: &str| -> Option<String> {
            columns
                .get(name)
                .and_then(|&i| record.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("nan"))
                .map(str::to_string)
        };

        let priority = match get("priority") {
            Some(p) => match p.parse::<f64>() {
                Ok(v) if v.is_finite() => Some(v),
                _ => {
                    tracing::warn!(line = line + 2, priority = %p, "priority が数値ではないため末尾扱い");
                    None
                }
            },
            None => None,
        };

        let condition = |n: u8| -> Option<Condition> {
            let field = get(&format!("field{}", n))?;
            let raw_type = get(&format!("match_type{}", n)).unwrap_or_default();
            let match_type = raw_type.parse::<MatchType>().ok();
            if match_type.is_none() {
                tracing::warn!(line = line + 2, match_type = %raw_type, "不明な一致方式のため一致しない行として扱う");
            }
            Some(Condition {
                field,
                match_type,
                pattern: get(&format!("pattern{}", n)).unwrap_or_default(),
            })
        };

        rules.push(MappingRule {
            priority,
            first: condition(1),
            second: condition(2),
            category: get("category").unwrap_or_default(),
            price_group_hint: get("price_group_hint"),
        });
    }

    Ok(RuleTable::from_rules(rules))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricing_auto_common::CatalogRecord;

    const CSV: &str = "\u{feff}priority,field1,match_type1,pattern1,field2,match_type2,pattern2,category,price_group_hint\n\
20,First Product Line,contains,camera,,,,HAC,HAC\n\
10,Second Product Line,equals,ipc2,,,,IPC,IPC\n\
,Second Product Line,contains,IPC,,,,IPC-LATE,\n";

    #[test]
    fn test_parse_rule_table_sorts_by_priority() {
        let table = parse_rule_table(CSV.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rules()[0].priority, Some(10.0));
        assert_eq!(table.rules()[2].category, "IPC-LATE");
        assert!(table.rules()[2].price_group_hint.is_none());

        let record = CatalogRecord::new()
            .with("First Product Line", "Network Camera")
            .with("Second Product Line", "IPC2");
        assert_eq!(table.apply(&record).category, "IPC");
    }

    #[test]
    fn test_fractional_priority_keeps_order() {
        let csv = "priority,field1,match_type1,pattern1,category\n1.5,Series,contains,X,A\n1.2,Series,contains,X,B\n";
        let table = parse_rule_table(csv.as_bytes()).unwrap();
        assert_eq!(table.rules()[0].priority, Some(1.2));

        let record = CatalogRecord::new().with("Series", "X");
        assert_eq!(table.apply(&record).category, "B");
    }

    #[test]
    fn test_missing_required_column() {
        let result = parse_rule_table("priority,field1\n1,Series\n".as_bytes());
        assert!(matches!(result, Err(PricingError::MappingParse(_))));
    }

    #[test]
    fn test_bad_match_type_never_matches() {
        let csv = "priority,field1,match_type1,pattern1,category\n1,Series,regex,.*,X\n";
        let table = parse_rule_table(csv.as_bytes()).unwrap();
        let record = CatalogRecord::new().with("Series", "anything");
        assert!(table.apply(&record).is_unknown());
    }
}

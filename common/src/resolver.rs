//! 公式グループ解決と公式行の選択
//!
//! 1. 実効グループ: EAS 別名 → series_key がグループ名ならそれ → price_group
//! 2. グループ内: 完全一致（大文字小文字無視）→ 双方向の部分一致 → `_default_`

use crate::formula::{ChannelDiscounts, FormulaBook, DEFAULT_SERIES_KEY};
use serde::{Deserialize, Serialize};

/// EAS と電子防盗門は同じ公式グループ
pub const EAS_GROUP: &str = "EAS";

/// 公式が見つからない場合の識別子
pub const FORMULA_NOT_FOUND: &str = "formula:not_found";

const EAS_ALIASES: &[&str] = &[
    "EAS",
    "ELECTRONIC ANTI-THEFT SYSTEM",
    "ELECTRONIC ANTI-THEFT SYSTEM (EAS)",
    "ELECTRONIC ANTI-THEFT SYSTEM（EAS）",
    "电子防盗",
    "电子防盗门",
    "电子防盗系统",
];

const EAS_MARKERS: &[&str] = &["EAS", "电子防盗", "ANTI-THEFT"];

/// シリーズ文字列が EAS 系を指しているか
pub fn implies_eas(series_key: &str, series_display: &str) -> bool {
    let key = series_key.trim().to_uppercase();
    let display = series_display.trim().to_uppercase();
    let hit = |needle: &str| key.contains(needle) || display.contains(needle);

    EAS_MARKERS.iter().any(|m| hit(m)) || EAS_ALIASES.iter().any(|a| hit(&a.to_uppercase()))
}

/// 公式テーブル上の実効グループ名
pub fn resolve_effective_group(
    book: &FormulaBook,
    price_group: &str,
    series_key: &str,
    series_display: &str,
) -> String {
    let group = price_group.trim();
    let key = series_key.trim();

    if implies_eas(key, series_display) {
        return EAS_GROUP.to_string();
    }
    if !key.is_empty() && book.has_group(key) {
        return key.to_string();
    }
    group.to_string()
}

/// 公式選択結果
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaPick<'a> {
    pub group: String,
    pub discounts: Option<&'a ChannelDiscounts>,
    /// 一致した行のキー（`_default_` を含む）
    pub matched_key: Option<String>,
}

impl FormulaPick<'_> {
    pub fn is_found(&self) -> bool {
        self.discounts.is_some()
    }

    /// 監査用の公式識別子
    pub fn formula_id(&self) -> String {
        match &self.matched_key {
            Some(key) => format_formula_id(&self.group, key),
            None => FORMULA_NOT_FOUND.to_string(),
        }
    }
}

pub fn format_formula_id(group: &str, key: &str) -> String {
    format!("formula[{}][{}]", group, key)
}

/// グループ内で公式行を選ぶ
pub fn pick_formula<'a>(book: &'a FormulaBook, group: &str, series_key: &str) -> FormulaPick<'a> {
    let not_found = FormulaPick {
        group: group.to_string(),
        discounts: None,
        matched_key: None,
    };
    if !book.has_group(group) {
        return not_found;
    }

    let wanted = series_key.trim().to_uppercase();
    let hit = |key: &str, discounts: &'a ChannelDiscounts| FormulaPick {
        group: group.to_string(),
        discounts: Some(discounts),
        matched_key: Some(key.to_string()),
    };

    if !wanted.is_empty() {
        let named = || book.group_rows(group).filter(|r| r.series_key != DEFAULT_SERIES_KEY);

        if let Some(row) = named().find(|r| r.series_key.trim().to_uppercase() == wanted) {
            return hit(&row.series_key, &row.discounts);
        }
        if let Some(row) = named().find(|r| {
            let k = r.series_key.trim().to_uppercase();
            k.contains(&wanted) || wanted.contains(&k)
        }) {
            return hit(&row.series_key, &row.discounts);
        }
    }

    match book.group_rows(group).find(|r| r.series_key == DEFAULT_SERIES_KEY) {
        Some(row) => hit(DEFAULT_SERIES_KEY, &row.discounts),
        None => not_found,
    }
}

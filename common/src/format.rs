//! 表示用の丸め
//!
//! コア内部は全精度のまま保持し、出力時にだけ桁数を決める。

use crate::types::{ComputationResult, PriceField};

/// 値の大きさに応じた小数桁数（100以上: 0 / 1以上: 2 / それ未満: 4）
pub fn decimals_for(value: f64) -> usize {
    let magnitude = value.abs();
    if magnitude >= 100.0 {
        0
    } else if magnitude >= 1.0 {
        2
    } else {
        4
    }
}

/// 表示用に丸めた値
pub fn round_for_display(value: f64) -> f64 {
    let factor = 10f64.powi(decimals_for(value) as i32);
    (value * factor).round() / factor
}

/// 表示用の文字列
pub fn format_price(value: f64) -> String {
    format!("{:.*}", decimals_for(value), value)
}

/// 照会結果を1列1行のテキストにする（算出値には `*`）
pub fn result_lines(result: &ComputationResult) -> Vec<String> {
    if result.is_not_found() {
        return vec![format!("{}: not found", result.pn)];
    }

    let v = &result.final_values;
    let mut lines = vec![format!("Part No.: {}", v.part_no)];
    for (label, value) in [
        ("Series", &v.series),
        ("External Model", &v.external_model),
        ("Internal Model", &v.internal_model),
        ("Sales Status", &v.sales_status),
        ("Description", &v.description),
    ] {
        if let Some(value) = value {
            lines.push(format!("{}: {}", label, value));
        }
    }

    for field in PriceField::ALL {
        let value = v
            .prices
            .get(field)
            .map(format_price)
            .unwrap_or_else(|| "-".to_string());
        let mark = if result.is_calculated(field) { " *" } else { "" };
        lines.push(format!("{}: {}{}", field, value, mark));
    }

    if let Some(meta) = &result.meta {
        lines.push(format!(
            "category: {} / price group: {} / series: {} ({})",
            meta.category,
            meta.price_group.as_deref().unwrap_or("-"),
            if meta.series_display.is_empty() { "-" } else { meta.series_display.as_str() },
            if meta.series_key.is_empty() { "-" } else { meta.series_key.as_str() },
        ));
        lines.push(format!("formula: {}", meta.formula_id));
        lines.push(format!(
            "match: primary={} secondary={}",
            meta.primary_match, meta.secondary_match
        ));
        if meta.used_secondary_catalog {
            lines.push(format!(
                "cost basis: secondary {} ({})",
                meta.basis_field.map(|b| b.column()).unwrap_or("-"),
                meta.sales_type
            ));
        }
        if !meta.auto_success {
            lines.push("automatic pricing not attempted".to_string());
        }
    }

    lines.extend(result.warnings.iter().map(|w| format!("warning: {}", w)));
    lines
}

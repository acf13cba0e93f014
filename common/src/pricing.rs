//! 価格算出
//!
//! Primary 行にある価格はそのまま使い、欠けている段階だけを埋める。
//!
//! 1. 7段階すべて揃っていれば何もしない
//! 2. FOB: Primary になければ Secondary の基準価格 × 0.9 × (1 + 上乗せ率)
//! 3. DDP A: Primary になければ FOB にカテゴリの諸掛チェーンを適用
//! 4. チャネル価格: 公式があれば DDP A から割引率で逆算
//!
//! UNKNOWN カテゴリは計算しない。

use crate::formula::{ChannelDiscounts, FormulaBook};
use crate::series::{uplift_line_key, SeriesInfo};
use crate::types::{fields, BasisField, CatalogRecord, PriceField, PriceTiers, SalesType, UNKNOWN_CATEGORY};
use std::collections::BTreeSet;

/// Secondary の基準価格から FOB を出すときの係数
pub const SECONDARY_COST_FACTOR: f64 = 0.9;

/// 1件分の入力
#[derive(Debug, Clone, Copy)]
pub struct PricingInput<'a> {
    pub primary: Option<&'a CatalogRecord>,
    pub secondary: Option<&'a CatalogRecord>,
    pub category: &'a str,
    pub series: &'a SeriesInfo,
    /// 解決できた場合のチャネル公式
    pub discounts: Option<&'a ChannelDiscounts>,
}

/// 算出結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingOutcome {
    pub prices: PriceTiers,
    pub calculated: BTreeSet<PriceField>,
    pub auto_success: bool,
    pub used_secondary_catalog: bool,
    pub sales_type: SalesType,
    pub basis_field: Option<BasisField>,
    pub warnings: Vec<String>,
}

impl PricingOutcome {
    fn write(&mut self, field: PriceField, value: f64) {
        self.prices.set(field, value);
        self.calculated.insert(field);
    }
}

/// 公式テーブルを参照して欠けた価格段階を埋める
pub struct PriceComputer<'a> {
    book: &'a FormulaBook,
}

impl<'a> PriceComputer<'a> {
    pub fn new(book: &'a FormulaBook) -> Self {
        Self { book }
    }

    pub fn compute(&self, input: &PricingInput<'_>) -> PricingOutcome {
        let mut out = PricingOutcome {
            prices: input.primary.map(PriceTiers::from_record).unwrap_or_default(),
            sales_type: input
                .secondary
                .map(|s| SalesType::from_tag(s.text(fields::SALES_TYPE)))
                .unwrap_or_default(),
            ..Default::default()
        };

        if let Some(primary) = input.primary {
            for field in PriceField::ALL {
                if primary.is_non_numeric(field.column()) {
                    out.warnings.push(format!(
                        "non-numeric {} '{}' treated as absent",
                        field,
                        primary.text(field.column()).unwrap_or_default()
                    ));
                }
            }
        }

        let category = input.category.trim();
        if category.is_empty() || category == UNKNOWN_CATEGORY {
            tracing::debug!("カテゴリ不明のため自動算出をスキップ");
            return out;
        }
        out.auto_success = true;

        if out.prices.is_complete() {
            return out;
        }

        if input.discounts.is_none() {
            out.warnings
                .push(format!("no channel formula resolved for category {}", category));
        }

        let cost = match out.prices.positive(PriceField::CostPrice) {
            Some(cost) => Some(cost),
            None => self.cost_from_secondary(input, category, &mut out),
        };

        let landed = match out.prices.positive(PriceField::LandedCost) {
            Some(landed) => Some(landed),
            None => {
                let derived = cost.and_then(|c| self.book.landed_cost(c, category));
                if let Some(d) = derived {
                    out.write(PriceField::LandedCost, d);
                } else if cost.is_some() {
                    tracing::debug!(category, "諸掛チェーン未定義のため DDP A を算出できない");
                }
                derived
            }
        };

        if let (Some(landed), Some(discounts)) = (landed, input.discounts) {
            for (field, value) in discounts.channel_prices(landed) {
                if !out.prices.contains(field) {
                    out.write(field, value);
                }
            }
        }

        out
    }

    /// Secondary の販売区分に応じた基準価格から FOB を推定
    fn cost_from_secondary(
        &self,
        input: &PricingInput<'_>,
        category: &str,
        out: &mut PricingOutcome,
    ) -> Option<f64> {
        let secondary = input.secondary?;
        let Some(basis) = out.sales_type.basis_field() else {
            let tag = secondary.text(fields::SALES_TYPE).unwrap_or("<empty>");
            tracing::warn!(tag, "販売区分が不明なため Secondary から FOB を推定できない");
            out.warnings
                .push(format!("unknown sales type '{}'; no secondary cost basis", tag));
            return None;
        };

        let base = secondary.number(basis.column()).filter(|v| *v > 0.0)?;
        let line_key = uplift_line_key(category, &input.series.display, input.primary, input.secondary);
        let uplift = self.book.uplift_pct(&line_key);
        let mut cost = base * SECONDARY_COST_FACTOR;
        if uplift > 0.0 {
            cost *= 1.0 + uplift;
        }
        tracing::debug!(basis = basis.column(), base, line_key = %line_key, uplift, cost, "Secondary から FOB を推定");

        out.write(PriceField::CostPrice, cost);
        out.used_secondary_catalog = true;
        out.basis_field = Some(basis);
        Some(cost)
    }
}

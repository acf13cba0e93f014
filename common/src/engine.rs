//! 照会パイプライン
//!
//! PN 正規化 → 両価格表の照合 → 分類 → シリーズ判定 → 公式選択 → 価格算出
//! を1件ずつ実行する。参照データはロード後不変なので、バッチは並列でも順序を保つ。

use crate::catalog::{Catalog, CatalogMatch};
use crate::classifier::classify;
use crate::formula::FormulaBook;
use crate::mapping::RuleTable;
use crate::pn_key::PnKeys;
use crate::pricing::{PriceComputer, PricingInput};
use crate::resolver::{pick_formula, resolve_effective_group};
use crate::series::detect_series;
use crate::types::{
    fields, CatalogRecord, CatalogSide, ComputationResult, FinalValues, QueryStatus, ResultMeta,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// 一度だけロードする参照データ一式
#[derive(Debug, Clone)]
pub struct ReferenceSnapshot {
    pub primary: Catalog,
    pub secondary: Catalog,
    pub primary_rules: RuleTable,
    pub secondary_rules: RuleTable,
    pub formulas: FormulaBook,
}

impl ReferenceSnapshot {
    /// 空の価格表・マッピング表と組み込み公式
    pub fn empty() -> Self {
        Self {
            primary: Catalog::empty(CatalogSide::Primary),
            secondary: Catalog::empty(CatalogSide::Secondary),
            primary_rules: RuleTable::default(),
            secondary_rules: RuleTable::default(),
            formulas: FormulaBook::builtin(),
        }
    }
}

/// バッチ集計
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    pub total: usize,
    pub ok: usize,
    pub not_found: usize,
    /// 分類できず自動算出しなかった件数
    pub unclassified: usize,
    /// 1列以上算出した件数
    pub calculated: usize,
}

/// バッチ結果（入力順）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub results: Vec<ComputationResult>,
    pub not_found: Vec<String>,
    /// `PN: 内容` 形式
    pub warnings: Vec<String>,
    pub counts: BatchCounts,
}

impl BatchOutcome {
    fn collect(results: Vec<ComputationResult>) -> Self {
        let mut counts = BatchCounts {
            total: results.len(),
            ..Default::default()
        };
        let mut not_found = Vec::new();
        let mut warnings = Vec::new();

        for r in &results {
            if r.is_not_found() {
                counts.not_found += 1;
                not_found.push(r.pn.clone());
                continue;
            }
            counts.ok += 1;
            if !r.auto_success() {
                counts.unclassified += 1;
            }
            if !r.calculated_fields.is_empty() {
                counts.calculated += 1;
            }
            warnings.extend(r.warnings.iter().map(|w| format!("{}: {}", r.pn, w)));
        }

        Self {
            results,
            not_found,
            warnings,
            counts,
        }
    }
}

/// 照会エンジン
#[derive(Debug, Clone)]
pub struct PricingEngine {
    snapshot: ReferenceSnapshot,
}

impl PricingEngine {
    pub fn new(snapshot: ReferenceSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &ReferenceSnapshot {
        &self.snapshot
    }

    /// PN 1件を照会
    pub fn query_one(&self, pn: &str) -> ComputationResult {
        let pn = pn.trim();
        let keys = PnKeys::new(pn);
        let primary = self.snapshot.primary.lookup(&keys);
        let secondary = self.snapshot.secondary.lookup(&keys);

        if !primary.is_matched() && !secondary.is_matched() {
            tracing::debug!(pn, "両価格表とも不一致");
            return ComputationResult::not_found(pn);
        }

        let mut warnings = Vec::new();
        for m in [&primary, &secondary] {
            if let Some(base) = &m.backfilled_from {
                warnings.push(format!("missing prices backfilled from base PN {}", base));
            }
        }

        let p = primary.record();
        let s = secondary.record();
        let snapshot = &self.snapshot;

        let classification = classify(p, s, &snapshot.primary_rules, &snapshot.secondary_rules);
        let price_group = if classification.is_unknown() {
            None
        } else {
            Some(
                classification
                    .price_group_hint
                    .clone()
                    .unwrap_or_else(|| classification.category.clone()),
            )
        };
        let group = price_group.as_deref().unwrap_or_default();

        let series = detect_series(p, s, group);
        let effective = resolve_effective_group(&snapshot.formulas, group, &series.key, &series.display);
        let pick = pick_formula(&snapshot.formulas, &effective, &series.key);
        if !pick.is_found() {
            tracing::debug!(pn, group = %effective, "チャネル公式が見つからない");
        }

        let outcome = PriceComputer::new(&snapshot.formulas).compute(&PricingInput {
            primary: p,
            secondary: s,
            category: &classification.category,
            series: &series,
            discounts: pick.discounts,
        });
        warnings.extend(outcome.warnings);

        let mut final_values = display_values(p, s);
        final_values.part_no = pn.to_string();
        final_values.prices = outcome.prices;

        ComputationResult {
            pn: pn.to_string(),
            status: QueryStatus::Ok,
            final_values,
            calculated_fields: outcome.calculated,
            meta: Some(ResultMeta {
                category: classification.category.clone(),
                price_group,
                series_display: series.display.clone(),
                series_key: series.key.clone(),
                formula_id: pick.formula_id(),
                auto_success: outcome.auto_success,
                used_secondary_catalog: outcome.used_secondary_catalog,
                sales_type: outcome.sales_type,
                basis_field: outcome.basis_field,
                primary_match: primary.mode,
                secondary_match: secondary.mode,
                primary_matched_pn: matched_pn(&primary),
                secondary_matched_pn: matched_pn(&secondary),
            }),
            warnings,
        }
    }

    /// 複数 PN を入力順に照会（空行は除外）
    pub fn query_many<S: AsRef<str> + Sync>(&self, pns: &[S], parallel: bool) -> BatchOutcome {
        self.query_many_with_progress(pns, parallel, || {})
    }

    /// `query_many` と同じ。1件終わるごとに `on_done` を呼ぶ
    pub fn query_many_with_progress<S, F>(&self, pns: &[S], parallel: bool, on_done: F) -> BatchOutcome
    where
        S: AsRef<str> + Sync,
        F: Fn() + Sync,
    {
        let pns: Vec<&str> = pns
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .collect();

        let run = |pn: &&str| {
            let result = self.query_one(pn);
            on_done();
            result
        };
        let results: Vec<ComputationResult> = if parallel {
            pns.par_iter().map(run).collect()
        } else {
            pns.iter().map(run).collect()
        };

        let outcome = BatchOutcome::collect(results);
        tracing::info!(
            total = outcome.counts.total,
            not_found = outcome.counts.not_found,
            unclassified = outcome.counts.unclassified,
            "バッチ照会完了"
        );
        outcome
    }
}

fn matched_pn(m: &CatalogMatch<'_>) -> Option<String> {
    m.matched_pn.clone()
}

/// 表示項目: Primary 優先、Primary がなければ Secondary から
fn display_values(primary: Option<&CatalogRecord>, secondary: Option<&CatalogRecord>) -> FinalValues {
    let owned = |v: Option<&str>| v.map(|s| s.to_string());

    match (primary, secondary) {
        (Some(p), _) => FinalValues {
            series: owned(p.first_text(&[fields::SERIES, fields::SERIES_ZH])),
            external_model: owned(p.text(fields::EXTERNAL_MODEL)),
            internal_model: owned(p.text(fields::INTERNAL_MODEL)),
            sales_status: owned(p.text(fields::SALES_STATUS)),
            description: owned(p.text(fields::DESCRIPTION)),
            ..Default::default()
        },
        (None, Some(s)) => FinalValues {
            series: owned(s.first_text(&[fields::SECOND_PRODUCT_LINE, fields::CATALOG_NAME])),
            external_model: owned(s.text(fields::EXTERNAL_MODEL)),
            internal_model: owned(s.text(fields::INTERNAL_MODEL)),
            sales_status: owned(s.text(fields::RELEASE_STATUS)),
            description: None,
            ..Default::default()
        },
        (None, None) => FinalValues::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{Condition, MappingRule, MatchType};
    use crate::types::{MatchMode, PriceField};

    fn engine() -> PricingEngine {
        let primary = Catalog::with_pn_column(
            CatalogSide::Primary,
            "Part No.",
            vec![
                CatalogRecord::new()
                    .with("Part No.", "1.0.01.04.42701")
                    .with("Series", "IPC2")
                    .with("Internal Model", "DH-IPC-HFW2431S")
                    .with("FOB C(EUR)", "50"),
                CatalogRecord::new()
                    .with("Part No.", "2.0.01.01.00001")
                    .with("Description", "Unmapped gadget"),
            ],
        );
        let secondary = Catalog::with_pn_column(
            CatalogSide::Secondary,
            "Part Num",
            vec![CatalogRecord::new()
                .with("Part Num", "1.0.01.19.10001")
                .with("Internal Model", "DHI-NVR4104HS-P-4KS3")
                .with("Sales Type", "SMB")
                .with("Min Price", "100")
                .with("Release Status", "Released")],
        );
        let primary_rules = RuleTable::from_rules(vec![MappingRule::new(
            1.0,
            Condition::new("Series", MatchType::Contains, "IPC"),
            "IPC",
        )
        .hint("IPC")]);

        PricingEngine::new(ReferenceSnapshot {
            primary,
            secondary,
            primary_rules,
            secondary_rules: RuleTable::default(),
            formulas: FormulaBook::builtin(),
        })
    }

    #[test]
    fn test_query_one_primary_only() {
        let result = engine().query_one(" 1.0.01.04.42701 ");
        assert_eq!(result.status, QueryStatus::Ok);
        let meta = result.meta.as_ref().unwrap();
        assert_eq!(meta.category, "IPC");
        assert_eq!(meta.series_key, "IPC2");
        assert_eq!(meta.formula_id, "formula[IPC][IPC2]");
        assert_eq!(meta.primary_match, MatchMode::Exact);
        assert_eq!(meta.secondary_match, MatchMode::Unmatched);
        assert!(result.is_calculated(PriceField::LandedCost));
        assert!(!result.is_calculated(PriceField::CostPrice));
        assert!(result.final_values.prices.is_complete());
    }

    #[test]
    fn test_query_one_secondary_heuristic() {
        let result = engine().query_one("1.0.01.19.10001-0026");
        let meta = result.meta.as_ref().unwrap();
        assert_eq!(meta.category, "NVR");
        assert_eq!(meta.secondary_match, MatchMode::Base);
        assert_eq!(meta.secondary_matched_pn.as_deref(), Some("1.0.01.19.10001"));
        assert!(meta.used_secondary_catalog);
        assert_eq!(result.final_values.part_no, "1.0.01.19.10001-0026");
        assert_eq!(result.final_values.sales_status.as_deref(), Some("Released"));
        // 100 × 0.9 × 1.05（NVR4）
        let cost = result.final_values.prices.get(PriceField::CostPrice).unwrap();
        assert!((cost - 94.5).abs() < 1e-9);
    }

    #[test]
    fn test_query_one_unclassified() {
        let result = engine().query_one("2.0.01.01.00001");
        let meta = result.meta.as_ref().unwrap();
        assert!(!meta.auto_success);
        assert_eq!(meta.category, "UNKNOWN");
        assert!(meta.price_group.is_none());
        assert!(result.calculated_fields.is_empty());
    }

    #[test]
    fn test_query_many_keeps_order_and_skips_blank() {
        let pns = ["MISSING-1", "", "1.0.01.04.42701", "  ", "1.0.01.19.10001"];
        for parallel in [false, true] {
            let outcome = engine().query_many(&pns, parallel);
            let got: Vec<_> = outcome.results.iter().map(|r| r.pn.as_str()).collect();
            assert_eq!(got, vec!["MISSING-1", "1.0.01.04.42701", "1.0.01.19.10001"]);
            assert_eq!(outcome.not_found, vec!["MISSING-1".to_string()]);
            assert_eq!(outcome.counts.total, 3);
            assert_eq!(outcome.counts.ok, 2);
        }
    }

    #[test]
    fn test_query_many_reports_progress() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let done = AtomicUsize::new(0);
        let pns = ["A", "", "1.0.01.04.42701", "B"];
        let outcome = engine().query_many_with_progress(&pns, true, || {
            done.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(done.load(Ordering::Relaxed), 3);
        assert_eq!(outcome.counts.not_found, 2);
    }
}

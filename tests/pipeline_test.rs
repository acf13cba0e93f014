//! 照会パイプラインの結合テスト
//!
//! 価格表・マッピング表を直接組み立て、PricingEngine の結果を確認する

use pricing_auto_common::{
    BasisField, Catalog, CatalogRecord, CatalogSide, Condition, FormulaBook, MappingRule, MatchType,
    PriceField, PricingEngine, QueryStatus, ReferenceSnapshot, RuleTable, FORMULA_NOT_FOUND,
};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn rule(priority: f64, field: &str, pattern: &str, category: &str, hint: &str) -> MappingRule {
    MappingRule::new(priority, Condition::new(field, MatchType::Contains, pattern), category).hint(hint)
}

fn engine(primary: Vec<CatalogRecord>, secondary: Vec<CatalogRecord>) -> PricingEngine {
    PricingEngine::new(ReferenceSnapshot {
        primary: Catalog::with_pn_column(CatalogSide::Primary, "Part No.", primary),
        secondary: Catalog::with_pn_column(CatalogSide::Secondary, "Part Num", secondary),
        primary_rules: RuleTable::from_rules(vec![
            rule(1.0, "Series", "HDCVI", "HAC", "HAC"),
            rule(2.0, "Series", "Network Camera", "IPC", "IPC"),
            rule(3.0, "Series", "Widget", "IPC", "WIDGETS"),
            rule(4.0, "First Product Line", "Anti-theft", "电子防盗门", "电子防盗门"),
        ]),
        secondary_rules: RuleTable::from_rules(vec![rule(1.0, "Second Product Line", "IPC", "IPC", "IPC")]),
        formulas: FormulaBook::builtin(),
    })
}

fn primary(pn: &str) -> CatalogRecord {
    CatalogRecord::new().with("Part No.", pn)
}

fn secondary(pn: &str) -> CatalogRecord {
    CatalogRecord::new().with("Part Num", pn)
}

/// Secondary のみ・SMB・Min Price 100・上乗せ 10% → FOB 99
#[test]
fn test_secondary_only_cost_from_min_price() {
    let engine = engine(
        vec![],
        vec![secondary("1.0.01.04.30001")
            .with("Second Product Line", "IPC3")
            .with("Sales Type", "SMB")
            .with("Min Price", "100")],
    );

    let result = engine.query_one("1.0.01.04.30001");
    assert_eq!(result.status, QueryStatus::Ok);
    let cost = result.final_values.prices.get(PriceField::CostPrice).unwrap();
    assert!(approx(cost, 99.0));
    assert!(result.is_calculated(PriceField::CostPrice));

    let meta = result.meta.as_ref().unwrap();
    assert!(meta.used_secondary_catalog);
    assert_eq!(meta.basis_field, Some(BasisField::MinPrice));
    assert_eq!(meta.category, "IPC");
    assert!(meta.formula_id.starts_with("formula[IPC]"));
}

/// どちらにもない PN
#[test]
fn test_absent_pn_is_not_found() {
    let engine = engine(vec![primary("1.0.01.04.42701")], vec![]);

    let result = engine.query_one("9.9.99.99.99999");
    assert!(result.is_not_found());
    assert!(result.meta.is_none());
    assert!(result.final_values.prices.iter().next().is_none());
    assert!(result.final_values.series.is_none());

    let outcome = engine.query_many(&["9.9.99.99.99999", "1.0.01.04.42701"], false);
    assert_eq!(outcome.not_found, vec!["9.9.99.99.99999".to_string()]);
}

/// 分類できても価格グループに公式がない場合
#[test]
fn test_missing_formula_group_reports_sentinel() {
    let engine = engine(
        vec![primary("1.0.01.04.50001")
            .with("Series", "Widget line")
            .with("FOB C(EUR)", "100")],
        vec![],
    );

    let result = engine.query_one("1.0.01.04.50001");
    let meta = result.meta.as_ref().unwrap();
    assert_eq!(meta.price_group.as_deref(), Some("WIDGETS"));
    assert_eq!(meta.formula_id, FORMULA_NOT_FOUND);

    let prices = &result.final_values.prices;
    let landed = prices.get(PriceField::LandedCost).unwrap();
    assert!(approx(landed, 100.0 * 1.10 * 1.008 * 1.02 * 1.000198));
    for field in PriceField::CHANNEL {
        assert!(prices.get(field).is_none(), "{} should stay empty", field);
    }
    assert!(result.warnings.iter().any(|w| w.contains("no channel formula")));
}

/// 7列すべて揃っていれば価格表の値をそのまま返す
#[test]
fn test_complete_primary_is_verbatim() {
    let mut record = primary("1.0.01.04.42701").with("Series", "Network Camera IPC2");
    for (i, field) in PriceField::ALL.iter().enumerate() {
        record.set(field.column(), format!("{}", 100 + i));
    }
    let engine = engine(
        vec![record],
        vec![secondary("1.0.01.04.42701")
            .with("Sales Type", "SMB")
            .with("Min Price", "1")],
    );

    let result = engine.query_one("1.0.01.04.42701");
    assert!(result.calculated_fields.is_empty());
    for (i, field) in PriceField::ALL.iter().enumerate() {
        assert_eq!(result.final_values.prices.get(*field), Some((100 + i) as f64));
    }
    assert!(!result.meta.as_ref().unwrap().used_secondary_catalog);
}

/// Primary のルールが Secondary のルールより優先
#[test]
fn test_primary_rules_take_precedence() {
    let engine = engine(
        vec![primary("1.0.01.02.10001").with("Series", "HDCVI Camera")],
        vec![secondary("1.0.01.02.10001").with("Second Product Line", "IPC2")],
    );

    let result = engine.query_one("1.0.01.02.10001");
    assert_eq!(result.meta.as_ref().unwrap().category, "HAC");
}

/// チャネル価格 = DDP A / (1 - 割引率)、MSRP = Ivory / (1 - 率)
#[test]
fn test_channel_prices_follow_discounts() {
    let engine = engine(
        vec![primary("1.0.01.02.20001")
            .with("Series", "HDCVI Camera")
            .with("FOB C(EUR)", "50")],
        vec![],
    );

    let result = engine.query_one("1.0.01.02.20001");
    let prices = &result.final_values.prices;
    let landed = prices.get(PriceField::LandedCost).unwrap();
    let installer = prices.get(PriceField::Installer).unwrap();

    assert_eq!(result.meta.as_ref().unwrap().formula_id, "formula[HAC][_default_]");
    assert!(approx(prices.get(PriceField::Reseller).unwrap(), landed / (1.0 - 0.12)));
    assert!(approx(prices.get(PriceField::Tier1Distributor).unwrap(), landed / (1.0 - 0.17)));
    assert!(approx(installer, landed / (1.0 - 0.25)));
    assert!(approx(prices.get(PriceField::RecommendedRetail).unwrap(), installer / (1.0 - 0.60)));
}

/// EAS の別名は同じ公式に解決される
#[test]
fn test_eas_aliases_resolve_to_same_formula() {
    let engine = engine(
        vec![
            primary("1.0.99.01.00001")
                .with("First Product Line", "Anti-theft")
                .with("Series", "Electronic Anti-theft System"),
            primary("1.0.99.01.00002")
                .with("First Product Line", "Anti-theft")
                .with("Series", "EAS"),
        ],
        vec![],
    );

    let a = engine.query_one("1.0.99.01.00001");
    let b = engine.query_one("1.0.99.01.00002");
    let id_a = &a.meta.as_ref().unwrap().formula_id;
    assert_eq!(id_a, "formula[EAS][_default_]");
    assert_eq!(id_a, &b.meta.as_ref().unwrap().formula_id);
}

/// 末尾4桁サフィックス付き PN は基本 PN にフォールバック
#[test]
fn test_suffix_pn_falls_back_to_base() {
    let engine = engine(
        vec![primary("1.0.01.02.30001")
            .with("Series", "HDCVI Camera")
            .with("FOB C(EUR)", "10")],
        vec![],
    );

    let result = engine.query_one("1.0.01.02.30001-0026");
    assert_eq!(result.status, QueryStatus::Ok);
    assert_eq!(result.final_values.part_no, "1.0.01.02.30001-0026");
    assert_eq!(
        result.meta.as_ref().unwrap().primary_matched_pn.as_deref(),
        Some("1.0.01.02.30001")
    );
}

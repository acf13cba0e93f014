//! 価格表レコードと算出結果の型定義
//!
//! - CatalogRecord: 国別価格表（Primary）/ システム価格表（Secondary）の1行
//! - PriceField: 7つの価格段階
//! - ComputationResult: PN 1件ごとの最終出力

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// 価格表の列名
pub mod fields {
    pub const PART_NO: &str = "Part No.";
    pub const PART_NUM: &str = "Part Num";
    pub const SERIES: &str = "Series";
    pub const SERIES_ZH: &str = "系列";
    pub const EXTERNAL_MODEL: &str = "External Model";
    pub const INTERNAL_MODEL: &str = "Internal Model";
    pub const DESCRIPTION: &str = "Description";
    pub const SALES_STATUS: &str = "Sales Status";
    pub const RELEASE_STATUS: &str = "Release Status";
    pub const FIRST_PRODUCT_LINE: &str = "First Product Line";
    pub const SECOND_PRODUCT_LINE: &str = "Second Product Line";
    pub const CATALOG_NAME: &str = "Catelog Name";
    pub const SALES_TYPE: &str = "Sales Type";
    pub const MIN_PRICE: &str = "Min Price";
    pub const AREA_PRICE: &str = "Area Price";
}

/// 分類不能を表すカテゴリ
pub const UNKNOWN_CATEGORY: &str = "UNKNOWN";

/// 価格表の系統
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSide {
    /// 国別の正式価格表（7段階の価格列を持つ）
    Primary,
    /// 社内システム価格表（原価系の列と販売区分を持つ）
    Secondary,
}

impl fmt::Display for CatalogSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSide::Primary => write!(f, "primary"),
            CatalogSide::Secondary => write!(f, "secondary"),
        }
    }
}

/// 価格表の1行（列名 → セル文字列）
///
/// 数値セルはローダー側で10進文字列に変換済み。空セルは保持しない。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    fields: BTreeMap<String, String>,
}

impl CatalogRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// (列名, 値) の組から生成
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (k, v) in pairs {
            record.set(k, v);
        }
        record
    }

    /// ビルダー形式で列を追加
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// 列を設定（空文字は未設定扱い）
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let name = name.into();
        if value.trim().is_empty() {
            self.fields.remove(&name);
        } else {
            self.fields.insert(name, value);
        }
    }

    /// 前後空白を除いた非空の値（"nan" は欠損扱い）
    pub fn text(&self, name: &str) -> Option<&str> {
        let v = self.fields.get(name)?.trim();
        if v.is_empty() || v.eq_ignore_ascii_case("nan") {
            None
        } else {
            Some(v)
        }
    }

    /// 候補列のうち最初に値がある列
    pub fn first_text(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|n| self.text(n))
    }

    /// 大文字化した値（欠損は空文字）
    pub fn upper(&self, name: &str) -> String {
        self.text(name).map(|v| v.to_uppercase()).unwrap_or_default()
    }

    /// 数値として解釈できる値。解釈できないセルは欠損と同じ扱い
    pub fn number(&self, name: &str) -> Option<f64> {
        parse_number(self.text(name)?)
    }

    /// 値はあるが数値として解釈できない列か
    pub fn is_non_numeric(&self, name: &str) -> bool {
        self.text(name).is_some() && self.number(name).is_none()
    }

    /// 指定列のうち値がある列を順に返す
    pub fn texts(&self, names: &[&str]) -> Vec<&str> {
        names.iter().filter_map(|n| self.text(n)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// セル文字列を数値に変換（前後の空白のみ除去、桁区切りは不可）
pub fn parse_number(s: &str) -> Option<f64> {
    let value = s.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// 7段階の価格列
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriceField {
    /// 出荷原価（FOB）
    #[serde(rename = "FOB C(EUR)")]
    CostPrice,
    /// 輸入諸掛込み原価（DDP A）
    #[serde(rename = "DDP A(EUR)")]
    LandedCost,
    /// 推奨再販価格
    #[serde(rename = "Suggested Reseller(EUR)")]
    Reseller,
    /// 一次代理店
    #[serde(rename = "Gold(EUR)")]
    Tier1Distributor,
    /// 二次代理店
    #[serde(rename = "Silver(EUR)")]
    Tier2Distributor,
    /// 施工業者
    #[serde(rename = "Ivory(EUR)")]
    Installer,
    /// 希望小売価格
    #[serde(rename = "MSRP(EUR)")]
    RecommendedRetail,
}

impl PriceField {
    pub const ALL: [PriceField; 7] = [
        PriceField::CostPrice,
        PriceField::LandedCost,
        PriceField::Reseller,
        PriceField::Tier1Distributor,
        PriceField::Tier2Distributor,
        PriceField::Installer,
        PriceField::RecommendedRetail,
    ];

    /// チャネル価格（DDP A から算出する5列）
    pub const CHANNEL: [PriceField; 5] = [
        PriceField::Reseller,
        PriceField::Tier1Distributor,
        PriceField::Tier2Distributor,
        PriceField::Installer,
        PriceField::RecommendedRetail,
    ];

    /// 価格表上の列名
    pub fn column(&self) -> &'static str {
        match self {
            PriceField::CostPrice => "FOB C(EUR)",
            PriceField::LandedCost => "DDP A(EUR)",
            PriceField::Reseller => "Suggested Reseller(EUR)",
            PriceField::Tier1Distributor => "Gold(EUR)",
            PriceField::Tier2Distributor => "Silver(EUR)",
            PriceField::Installer => "Ivory(EUR)",
            PriceField::RecommendedRetail => "MSRP(EUR)",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// 価格段階ごとの値（未確定の段階は持たない）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTiers {
    values: BTreeMap<PriceField, f64>,
}

impl PriceTiers {
    /// レコードの価格列を読み取る（数値でない列は欠損扱い）
    pub fn from_record(record: &CatalogRecord) -> Self {
        let values = PriceField::ALL
            .iter()
            .filter_map(|f| record.number(f.column()).map(|v| (*f, v)))
            .collect();
        Self { values }
    }

    pub fn get(&self, field: PriceField) -> Option<f64> {
        self.values.get(&field).copied()
    }

    /// 正の値のみ返す
    pub fn positive(&self, field: PriceField) -> Option<f64> {
        self.get(field).filter(|v| *v > 0.0)
    }

    pub fn set(&mut self, field: PriceField, value: f64) {
        self.values.insert(field, value);
    }

    pub fn contains(&self, field: PriceField) -> bool {
        self.values.contains_key(&field)
    }

    /// 7列すべて揃っているか
    pub fn is_complete(&self) -> bool {
        PriceField::ALL.iter().all(|f| self.contains(*f))
    }

    pub fn iter(&self) -> impl Iterator<Item = (PriceField, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}

/// PN の照合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// raw key で一致
    Exact,
    /// base key（地域サフィックス除去）で一致
    Base,
    #[default]
    #[serde(rename = "none")]
    Unmatched,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Exact => write!(f, "exact"),
            MatchMode::Base => write!(f, "base"),
            MatchMode::Unmatched => write!(f, "none"),
        }
    }
}

/// システム価格表の販売区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalesType {
    Smb,
    Distribution,
    Project,
    #[default]
    Unknown,
}

impl SalesType {
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(|t| t.trim().to_uppercase()).as_deref() {
            Some("SMB") => SalesType::Smb,
            Some("DISTRIBUTION") => SalesType::Distribution,
            Some("PROJECT") => SalesType::Project,
            _ => SalesType::Unknown,
        }
    }

    /// 原価の基準にする列（区分不明なら None）
    pub fn basis_field(&self) -> Option<BasisField> {
        match self {
            SalesType::Smb | SalesType::Distribution => Some(BasisField::MinPrice),
            SalesType::Project => Some(BasisField::AreaPrice),
            SalesType::Unknown => None,
        }
    }
}

impl fmt::Display for SalesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SalesType::Smb => write!(f, "SMB"),
            SalesType::Distribution => write!(f, "DISTRIBUTION"),
            SalesType::Project => write!(f, "PROJECT"),
            SalesType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// システム価格表のどの列を原価の基準にしたか
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasisField {
    #[serde(rename = "Min Price")]
    MinPrice,
    #[serde(rename = "Area Price")]
    AreaPrice,
}

impl BasisField {
    pub fn column(&self) -> &'static str {
        match self {
            BasisField::MinPrice => fields::MIN_PRICE,
            BasisField::AreaPrice => fields::AREA_PRICE,
        }
    }
}

/// 照会ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Ok,
    NotFound,
}

/// 表示用の最終値
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalValues {
    pub part_no: String,
    pub series: Option<String>,
    pub external_model: Option<String>,
    pub internal_model: Option<String>,
    pub sales_status: Option<String>,
    pub description: Option<String>,
    pub prices: PriceTiers,
}

/// 分類・公式選択の監査情報
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMeta {
    pub category: String,
    pub price_group: Option<String>,
    pub series_display: String,
    pub series_key: String,
    /// 採用した公式の識別子（見つからない場合は番兵文字列）
    pub formula_id: String,
    /// false のときは自動算出を試みていない
    pub auto_success: bool,
    pub used_secondary_catalog: bool,
    pub sales_type: SalesType,
    pub basis_field: Option<BasisField>,
    pub primary_match: MatchMode,
    pub secondary_match: MatchMode,
    pub primary_matched_pn: Option<String>,
    pub secondary_matched_pn: Option<String>,
}

/// PN 1件の算出結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationResult {
    pub pn: String,
    pub status: QueryStatus,
    pub final_values: FinalValues,
    /// 価格表の値ではなくパイプラインが書き込んだ列
    pub calculated_fields: BTreeSet<PriceField>,
    pub meta: Option<ResultMeta>,
    pub warnings: Vec<String>,
}

impl ComputationResult {
    /// どちらの価格表にも存在しない PN
    pub fn not_found(pn: &str) -> Self {
        Self {
            pn: pn.to_string(),
            status: QueryStatus::NotFound,
            final_values: FinalValues::default(),
            calculated_fields: BTreeSet::new(),
            meta: None,
            warnings: Vec::new(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == QueryStatus::NotFound
    }

    pub fn auto_success(&self) -> bool {
        self.meta.as_ref().map(|m| m.auto_success).unwrap_or(false)
    }

    pub fn is_calculated(&self, field: PriceField) -> bool {
        self.calculated_fields.contains(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_text_ignores_blank_and_nan() {
        let record = CatalogRecord::new()
            .with("A", "  value ")
            .with("B", "   ")
            .with("C", "NaN");
        assert_eq!(record.text("A"), Some("value"));
        assert_eq!(record.text("B"), None);
        assert_eq!(record.text("C"), None);
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_record_number() {
        let record = CatalogRecord::new()
            .with("FOB C(EUR)", "12.5")
            .with("DDP A(EUR)", "n/a")
            .with("MSRP(EUR)", " 1 000 ");
        assert_eq!(record.number("FOB C(EUR)"), Some(12.5));
        assert_eq!(record.number("DDP A(EUR)"), None);
        assert!(record.is_non_numeric("DDP A(EUR)"));
        // 桁区切りの空白は数値として扱わない
        assert_eq!(record.number("MSRP(EUR)"), None);
        assert!(record.is_non_numeric("MSRP(EUR)"));
        assert_eq!(parse_number(" 12 "), Some(12.0));
    }

    #[test]
    fn test_price_tiers_from_record() {
        let record = CatalogRecord::new()
            .with("FOB C(EUR)", "10")
            .with("Gold(EUR)", "abc");
        let tiers = PriceTiers::from_record(&record);
        assert_eq!(tiers.get(PriceField::CostPrice), Some(10.0));
        assert!(!tiers.contains(PriceField::Tier1Distributor));
        assert!(!tiers.is_complete());
    }

    #[test]
    fn test_sales_type_basis() {
        assert_eq!(SalesType::from_tag(Some(" smb ")), SalesType::Smb);
        assert_eq!(SalesType::from_tag(Some("Project")).basis_field(), Some(BasisField::AreaPrice));
        assert_eq!(SalesType::from_tag(Some("DISTRIBUTION")).basis_field(), Some(BasisField::MinPrice));
        assert_eq!(SalesType::from_tag(None).basis_field(), None);
        assert_eq!(SalesType::from_tag(Some("RETAIL")), SalesType::Unknown);
    }

    #[test]
    fn test_price_field_serializes_as_column() {
        let json = serde_json::to_string(&PriceField::Tier1Distributor).unwrap();
        assert_eq!(json, "\"Gold(EUR)\"");
        let json = serde_json::to_string(&MatchMode::Unmatched).unwrap();
        assert_eq!(json, "\"none\"");
    }
}

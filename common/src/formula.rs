//! 価格公式テーブル
//!
//! - 輸入諸掛チェーン: カテゴリ → 増分率の列（`price *= 1 + p` を順に適用）
//! - チャネル公式: 価格グループ → シリーズキー → 各チャネルの割引率
//! - 上乗せ率: 製品ラインキー → Secondary 原価から出した FOB への上乗せ率
//!
//! 組み込み既定値のほか、JSON ファイルで差し替え可能。

use crate::error::{Error, Result};
use crate::types::PriceField;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// グループ内の汎用行のキー
pub const DEFAULT_SERIES_KEY: &str = "_default_";

/// カテゴリ別の輸入諸掛チェーン
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandedCostRule {
    pub category: String,
    pub increments: Vec<f64>,
}

/// チャネルごとの割引率（DDP A = 売価 × (1 - 割引率)）
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelDiscounts {
    #[serde(default)]
    pub reseller: Option<f64>,
    #[serde(default)]
    pub gold: Option<f64>,
    #[serde(default)]
    pub silver: Option<f64>,
    #[serde(default)]
    pub ivory: Option<f64>,
    /// MSRP は施工業者価格を基準にする
    #[serde(default)]
    pub msrp_on_installer: Option<f64>,
}

impl ChannelDiscounts {
    /// DDP A から各チャネル価格を算出
    ///
    /// 割引率が未定義のチャネルは出力しない。ただし再販価格は
    /// 未定義なら DDP A そのもの。
    pub fn channel_prices(&self, landed_cost: f64) -> Vec<(PriceField, f64)> {
        let from_landed = |p: Option<f64>| p.map(|p| landed_cost / (1.0 - p));

        let installer = from_landed(self.ivory);
        let retail = match (installer, self.msrp_on_installer) {
            (Some(i), Some(m)) => Some(i / (1.0 - m)),
            _ => None,
        };

        [
            (PriceField::Reseller, from_landed(self.reseller).or(Some(landed_cost))),
            (PriceField::Tier1Distributor, from_landed(self.gold)),
            (PriceField::Tier2Distributor, from_landed(self.silver)),
            (PriceField::Installer, installer),
            (PriceField::RecommendedRetail, retail),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect()
    }

    fn rates(&self) -> [Option<f64>; 5] {
        [self.reseller, self.gold, self.silver, self.ivory, self.msrp_on_installer]
    }
}

/// チャネル公式の1行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelFormulaRow {
    pub group: String,
    pub series_key: String,
    pub discounts: ChannelDiscounts,
}

/// 上乗せ率の1行（0.10 = +10%）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpliftRow {
    pub line_key: String,
    pub pct: f64,
}

/// 公式テーブル一式（ロード後は不変）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaBook {
    pub landed_cost: Vec<LandedCostRule>,
    /// グループ内の行順が部分一致の評価順
    pub channel: Vec<ChannelFormulaRow>,
    pub uplift: Vec<UpliftRow>,
}

impl Default for FormulaBook {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FormulaBook {
    /// JSON から読み込み、値域を検証
    pub fn from_json(json: &str) -> Result<Self> {
        let book: FormulaBook = serde_json::from_str(json)?;
        book.validate()?;
        Ok(book)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let book = Self::from_json(&content)?;
        tracing::info!(
            path = %path.display(),
            groups = book.groups().len(),
            "公式テーブルを読み込み"
        );
        Ok(book)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 割引率は [0, 1)、増分率・上乗せ率は有限値であること
    pub fn validate(&self) -> Result<()> {
        for row in &self.channel {
            for rate in row.discounts.rates().into_iter().flatten() {
                if !(0.0..1.0).contains(&rate) {
                    return Err(Error::Config(format!(
                        "discount out of range [0, 1): {} in {}/{}",
                        rate, row.group, row.series_key
                    )));
                }
            }
        }
        for rule in &self.landed_cost {
            if rule.increments.iter().any(|p| !p.is_finite() || *p <= -1.0) {
                return Err(Error::Config(format!(
                    "invalid landed-cost increment for {}",
                    rule.category
                )));
            }
        }
        for row in &self.uplift {
            if !row.pct.is_finite() {
                return Err(Error::Config(format!("invalid uplift for {}", row.line_key)));
            }
        }
        Ok(())
    }

    /// カテゴリの輸入諸掛チェーン（完全一致）
    pub fn landed_cost_chain(&self, category: &str) -> Option<&[f64]> {
        let category = category.trim();
        self.landed_cost
            .iter()
            .find(|r| r.category == category)
            .map(|r| r.increments.as_slice())
    }

    /// FOB から DDP A を算出。FOB が正でないかチェーンがなければ None
    pub fn landed_cost(&self, cost_price: f64, category: &str) -> Option<f64> {
        if cost_price <= 0.0 {
            return None;
        }
        let chain = self.landed_cost_chain(category)?;
        Some(chain.iter().fold(cost_price, |price, p| price * (1.0 + p)))
    }

    /// 価格グループが存在するか
    pub fn has_group(&self, group: &str) -> bool {
        self.channel.iter().any(|r| r.group == group)
    }

    /// グループの行（定義順）
    pub fn group_rows<'a>(&'a self, group: &str) -> impl Iterator<Item = &'a ChannelFormulaRow> + 'a {
        let group = group.to_string();
        self.channel.iter().filter(move |r| r.group == group)
    }

    /// 重複なしのグループ名（定義順）
    pub fn groups(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for row in &self.channel {
            if !out.contains(&row.group.as_str()) {
                out.push(&row.group);
            }
        }
        out
    }

    /// 上乗せ率（未登録は 0）
    pub fn uplift_pct(&self, line_key: &str) -> f64 {
        if line_key.is_empty() {
            return 0.0;
        }
        self.uplift
            .iter()
            .find(|r| r.line_key == line_key)
            .map(|r| r.pct)
            .unwrap_or(0.0)
    }

    /// 組み込みの既定テーブル
    pub fn builtin() -> Self {
        Self {
            landed_cost: builtin_landed_cost(),
            channel: builtin_channel(),
            uplift: builtin_uplift(),
        }
    }
}

const FRONT_END: [f64; 4] = [0.10, 0.008, 0.02, 0.000198];
const RECORDER: [f64; 4] = [0.10, 0.052, 0.02, 0.000198];
const FLAT: [f64; 4] = [0.10, 0.0, 0.02, 0.000198];

fn chain(category: &str, increments: [f64; 4]) -> LandedCostRule {
    LandedCostRule {
        category: category.to_string(),
        increments: increments.to_vec(),
    }
}

fn builtin_landed_cost() -> Vec<LandedCostRule> {
    vec![
        chain("IPC", FRONT_END),
        chain("HAC", FRONT_END),
        chain("PTZ", FRONT_END),
        chain("THERMAL", FRONT_END),
        chain("NVR", RECORDER),
        chain("IVSS", RECORDER),
        chain("EVS", RECORDER),
        chain("XVR", RECORDER),
        chain("TRANSMISSION", FLAT),
        chain("IT交换机路由器", FLAT),
        chain("VDP", FLAT),
        chain("ALARM", [0.05, 0.0, 0.02, 0.000198]),
        chain("ACCESS CONTROL", [0.10, 0.021, 0.02, 0.000198]),
        chain("ACCESSORY", [0.10, 0.011, 0.02, 0.000198]),
        chain("ACCESSORY线缆", [0.10, 0.037, 0.02, 0.000198]),
        chain("监视器", FLAT),
        chain("IT监视器", FLAT),
        chain("商显/TV-WALL", [0.10, 0.14, 0.02, 0.000198]),
        chain("键盘/解码器", [0.10, 0.034, 0.02, 0.000198]),
        chain("交通", FRONT_END),
        chain("车载前端", FRONT_END),
        chain("车载后端", RECORDER),
        chain("硬盘/存储介质", FLAT),
        chain("视频会议", [0.10, 0.034, 0.02, 0.000198]),
        chain("电子防盗门", FLAT),
        chain("安检机", [0.15, 0.0, 0.02, 0.000198]),
        chain("电子白板", [0.15, 0.034, 0.02, 0.000198]),
        chain("烟感", [0.10, 0.02, 0.02, 0.000198]),
    ]
}

fn discounts(reseller: Option<f64>, gold: f64, silver: f64, ivory: f64, msrp: f64) -> ChannelDiscounts {
    ChannelDiscounts {
        reseller,
        gold: Some(gold),
        silver: Some(silver),
        ivory: Some(ivory),
        msrp_on_installer: Some(msrp),
    }
}

fn builtin_channel() -> Vec<ChannelFormulaRow> {
    let table: &[(&str, &str, ChannelDiscounts)] = &[
        ("IPC", "PSDW", discounts(Some(0.12), 0.22, 0.30, 0.35, 0.50)),
        ("IPC", "针孔", discounts(Some(0.12), 0.25, 0.30, 0.35, 0.60)),
        ("IPC", "IPC5", discounts(Some(0.12), 0.27, 0.30, 0.35, 0.60)),
        ("IPC", "IPC5/7/MULTI-SENSOR / SPECIAL", discounts(Some(0.12), 0.22, 0.30, 0.35, 0.60)),
        ("IPC", "IPC3-S2", discounts(Some(0.12), 0.22, 0.30, 0.35, 0.60)),
        ("IPC", "IPC2-PRO", discounts(Some(0.12), 0.25, 0.30, 0.35, 0.60)),
        ("IPC", "IPC2", discounts(Some(0.12), 0.20, 0.30, 0.35, 0.60)),
        ("IPC", "IPC1", discounts(Some(0.12), 0.20, 0.25, 0.30, 0.60)),
        ("IPC", DEFAULT_SERIES_KEY, discounts(Some(0.12), 0.22, 0.30, 0.35, 0.60)),
        ("HAC", DEFAULT_SERIES_KEY, discounts(Some(0.12), 0.17, 0.20, 0.25, 0.60)),
        ("PTZ", "PTZ/SDT/EXPLOSION PROOF / SD10/8 / 7", discounts(Some(0.12), 0.22, 0.30, 0.35, 0.50)),
        ("PTZ", "SD6/5/4/3/2/1", discounts(Some(0.12), 0.22, 0.30, 0.35, 0.60)),
        ("PTZ", DEFAULT_SERIES_KEY, discounts(Some(0.12), 0.22, 0.30, 0.35, 0.50)),
        ("THERMAL", "TPC", discounts(Some(0.12), 0.20, 0.25, 0.30, 0.20)),
        ("THERMAL", "TPC4 TPC5", discounts(Some(0.12), 0.25, 0.30, 0.35, 0.20)),
        ("THERMAL", DEFAULT_SERIES_KEY, discounts(Some(0.12), 0.20, 0.25, 0.30, 0.20)),
        ("NVR", DEFAULT_SERIES_KEY, discounts(Some(0.12), 0.22, 0.30, 0.35, 0.50)),
        ("IVSS", DEFAULT_SERIES_KEY, discounts(Some(0.12), 0.22, 0.30, 0.35, 0.50)),
        ("EVS", DEFAULT_SERIES_KEY, discounts(Some(0.00), 0.25, 0.30, 0.35, 0.40)),
        ("XVR", DEFAULT_SERIES_KEY, discounts(Some(0.12), 0.17, 0.20, 0.25, 0.60)),
        ("VDP", DEFAULT_SERIES_KEY, discounts(Some(0.12), 0.22, 0.29, 0.35, 0.50)),
        ("ACCESS CONTROL", DEFAULT_SERIES_KEY, discounts(Some(0.12), 0.22, 0.35, 0.40, 0.60)),
        ("ALARM", DEFAULT_SERIES_KEY, discounts(Some(0.30), 0.30, 0.30, 0.35, 0.60)),
        ("TRANSMISSION", DEFAULT_SERIES_KEY, discounts(Some(0.12), 0.20, 0.23, 0.25, 0.60)),
        ("TRANSMISSION L3", DEFAULT_SERIES_KEY, discounts(Some(0.12), 0.20, 0.23, 0.25, 0.40)),
        ("无线网桥", DEFAULT_SERIES_KEY, discounts(Some(0.12), 0.16, 0.21, 0.26, 0.40)),
        ("ACCESSORY", "ACCESSORY", discounts(Some(0.12), 0.22, 0.30, 0.35, 0.60)),
        ("ACCESSORY", "ACCESSORY 线缆", discounts(Some(0.12), 0.22, 0.25, 0.30, 0.60)),
        ("ACCESSORY", DEFAULT_SERIES_KEY, discounts(Some(0.12), 0.22, 0.30, 0.35, 0.60)),
        ("监视器/商显/LCD", DEFAULT_SERIES_KEY, discounts(Some(0.12), 0.15, 0.20, 0.25, 0.40)),
        ("CCTV监视器", DEFAULT_SERIES_KEY, discounts(Some(0.12), 0.20, 0.22, 0.25, 0.40)),
        ("IT监视器", DEFAULT_SERIES_KEY, discounts(Some(0.12), 0.15, 0.15, 0.15, 0.20)),
        ("键盘/解码器", DEFAULT_SERIES_KEY, discounts(Some(0.15), 0.25, 0.30, 0.35, 0.40)),
        ("交通/停车场", DEFAULT_SERIES_KEY, discounts(Some(0.15), 0.25, 0.30, 0.35, 0.40)),
        ("车载", DEFAULT_SERIES_KEY, discounts(Some(0.15), 0.25, 0.30, 0.35, 0.40)),
        ("软件", DEFAULT_SERIES_KEY, discounts(Some(0.15), 0.25, 0.30, 0.35, 0.60)),
        ("硬盘/存储介质", DEFAULT_SERIES_KEY, discounts(Some(0.10), 0.10, 0.15, 0.20, 0.20)),
        ("电子白板", DEFAULT_SERIES_KEY, discounts(Some(0.10), 0.15, 0.15, 0.15, 0.20)),
        ("安检", DEFAULT_SERIES_KEY, discounts(Some(0.15), 0.30, 0.35, 0.40, 0.40)),
        ("EAS", DEFAULT_SERIES_KEY, discounts(Some(0.12), 0.15, 0.20, 0.25, 0.40)),
        ("ESL", DEFAULT_SERIES_KEY, discounts(Some(0.05), 0.05, 0.10, 0.15, 0.40)),
        ("充电桩", DEFAULT_SERIES_KEY, discounts(None, 0.15, 0.15, 0.15, 0.20)),
    ];

    table
        .iter()
        .map(|(group, key, d)| ChannelFormulaRow {
            group: group.to_string(),
            series_key: key.to_string(),
            discounts: *d,
        })
        .collect()
}

fn builtin_uplift() -> Vec<UpliftRow> {
    [
        ("IPC1", 0.00),
        ("IPC2", 0.05),
        ("IPC3", 0.10),
        ("IPC5", 0.05),
        ("IPC7", 0.10),
        ("IPC8", 0.10),
        ("NVR4", 0.05),
        ("NVR5 EI2", 0.10),
        ("NVR6 XI", 0.10),
        ("IVD/IVSS/EVS", 0.10),
        ("PTZ", 0.05),
        ("ITC", 0.05),
        ("SCP", 0.05),
        ("TPC", 0.05),
    ]
    .into_iter()
    .map(|(key, pct)| UpliftRow {
        line_key: key.to_string(),
        pct,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_landed_cost_chain() {
        let book = FormulaBook::builtin();
        let ddp = book.landed_cost(100.0, "IPC").unwrap();
        assert!(approx(ddp, 100.0 * 1.10 * 1.008 * 1.02 * 1.000198));
        assert!(book.landed_cost(0.0, "IPC").is_none());
        assert!(book.landed_cost(100.0, "NO SUCH").is_none());
    }

    #[test]
    fn test_channel_prices_law() {
        let d = discounts(Some(0.12), 0.22, 0.30, 0.35, 0.60);
        let prices: std::collections::BTreeMap<_, _> = d.channel_prices(100.0).into_iter().collect();
        assert!(approx(prices[&PriceField::Reseller], 100.0 / 0.88));
        assert!(approx(prices[&PriceField::Tier1Distributor], 100.0 / 0.78));
        let installer = prices[&PriceField::Installer];
        assert!(approx(installer, 100.0 / 0.65));
        assert!(approx(prices[&PriceField::RecommendedRetail], installer / 0.40));
    }

    #[test]
    fn test_reseller_defaults_to_landed_cost() {
        let d = discounts(None, 0.15, 0.15, 0.15, 0.20);
        let prices: std::collections::BTreeMap<_, _> = d.channel_prices(50.0).into_iter().collect();
        assert!(approx(prices[&PriceField::Reseller], 50.0));
    }

    #[test]
    fn test_retail_needs_installer() {
        let d = ChannelDiscounts {
            msrp_on_installer: Some(0.5),
            ..Default::default()
        };
        let fields: Vec<_> = d.channel_prices(10.0).into_iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec![PriceField::Reseller]);
    }

    #[test]
    fn test_uplift_lookup() {
        let book = FormulaBook::builtin();
        assert!(approx(book.uplift_pct("IPC3"), 0.10));
        assert!(approx(book.uplift_pct("UNKNOWN LINE"), 0.0));
        assert!(approx(book.uplift_pct(""), 0.0));
    }

    #[test]
    fn test_groups_keep_order() {
        let book = FormulaBook::builtin();
        let groups = book.groups();
        assert_eq!(groups[0], "IPC");
        assert!(groups.contains(&"EAS"));
        let keys: Vec<_> = book.group_rows("PTZ").map(|r| r.series_key.as_str()).collect();
        assert_eq!(keys.last(), Some(&DEFAULT_SERIES_KEY));
    }

    #[test]
    fn test_json_round_trip_and_validation() {
        let json = FormulaBook::builtin().to_json_pretty().unwrap();
        let book = FormulaBook::from_json(&json).unwrap();
        assert_eq!(book.channel.len(), FormulaBook::builtin().channel.len());
        assert_eq!(book.landed_cost_chain("ALARM").map(|c| c.len()), Some(4));
        assert!(approx(book.uplift_pct("NVR4"), 0.05));
        assert!(book.channel.iter().any(|r| r.group == "充电桩" && r.discounts.reseller.is_none()));

        let bad = r#"{"landed_cost":[],"uplift":[],"channel":[
            {"group":"X","series_key":"_default_","discounts":{"gold":1.0}}]}"#;
        assert!(matches!(FormulaBook::from_json(bad), Err(Error::Config(_))));
    }
}

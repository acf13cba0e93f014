//! 製品カテゴリ・価格グループ判定
//!
//! ## 判定順序
//! 1. Primary マッピング表（Primary 行に対して）
//! 2. Secondary マッピング表（アクセサリのケーブル類は表より先に振り分け）
//! 3. 録画機ファミリーの文字列ヒューリスティック
//!
//! UNKNOWN 以外の結果が出た層で確定し、最後にカテゴリ別の別名正規化をかける。

use crate::mapping::{Classification, RuleTable};
use crate::types::{fields, CatalogRecord};
use regex::Regex;

/// Secondary の第1製品ラインがこの値ならアクセサリ扱い
pub const ACCESSORY_LINE: &str = "ACCESSORY";
/// ケーブル類の振り分け先
pub const ACCESSORY_CABLE_CATEGORY: &str = "ACCESSORY线缆";
pub const ACCESSORY_GROUP: &str = "ACCESSORY";

const CABLE_KEYWORDS: &[&str] = &["CABLE", "线缆", "HDMI", "EXTENDER", "延长器"];
const CABLE_TEXT_FIELDS: &[&str] = &[
    fields::SECOND_PRODUCT_LINE,
    fields::CATALOG_NAME,
    fields::EXTERNAL_MODEL,
    fields::INTERNAL_MODEL,
];

/// モニター系カテゴリを寄せる価格グループ
pub const MONITOR_GROUP: &str = "监视器/商显/LCD";
const MONITOR_CATEGORIES: &[&str] = &["监视器", "商显/TV-WALL", "商显", "LCD"];

/// 電子防盗門: DDP はカテゴリ自身、チャネル価格は入退室管理の公式を借りる
pub const EAS_DOOR_CATEGORY: &str = "电子防盗门";
pub const ACCESS_CONTROL_GROUP: &str = "ACCESS CONTROL";

const PRIMARY_TEXT_FIELDS: &[&str] = &[
    fields::INTERNAL_MODEL,
    fields::EXTERNAL_MODEL,
    fields::SERIES,
    fields::SERIES_ZH,
    fields::DESCRIPTION,
    fields::SECOND_PRODUCT_LINE,
];
const SECONDARY_TEXT_FIELDS: &[&str] = &[
    fields::INTERNAL_MODEL,
    fields::EXTERNAL_MODEL,
    fields::SECOND_PRODUCT_LINE,
    fields::CATALOG_NAME,
    fields::FIRST_PRODUCT_LINE,
];

/// 録画機ファミリー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderFamily {
    /// 一体型インテリジェント録画機
    Ivss,
    /// 組込み映像サーバー
    Evs,
    /// ハイブリッド録画機
    Xvr,
    /// ネットワーク録画機
    Nvr,
}

impl RecorderFamily {
    pub fn category(&self) -> &'static str {
        match self {
            RecorderFamily::Ivss => "IVSS",
            RecorderFamily::Evs => "EVS",
            RecorderFamily::Xvr => "XVR",
            RecorderFamily::Nvr => "NVR",
        }
    }

    pub fn classification(&self) -> Classification {
        Classification::new(self.category(), Some(self.category()))
    }
}

/// ファミリー判定器（述語と結果の組）
pub struct FamilyDetector {
    pub family: RecorderFamily,
    pub predicate: fn(&str) -> bool,
}

fn contains_ivss(s: &str) -> bool {
    s.contains("IVSS")
}

fn contains_evs(s: &str) -> bool {
    s.contains("EVS")
}

fn contains_xvr(s: &str) -> bool {
    s.contains("XVR")
}

fn matches_nvr(s: &str) -> bool {
    lazy_static::lazy_static! {
        static ref NVR_WORD: Regex = Regex::new(r"\bNVR\b").unwrap();
        static ref NVR_DIGIT: Regex = Regex::new(r"\bNVR[0-9]").unwrap();
    }
    NVR_WORD.is_match(s) || NVR_DIGIT.is_match(s)
}

/// 固有名の強いものから順に並べた判定器
pub const RECORDER_DETECTORS: &[FamilyDetector] = &[
    FamilyDetector { family: RecorderFamily::Ivss, predicate: contains_ivss },
    FamilyDetector { family: RecorderFamily::Evs, predicate: contains_evs },
    FamilyDetector { family: RecorderFamily::Xvr, predicate: contains_xvr },
    FamilyDetector { family: RecorderFamily::Nvr, predicate: matches_nvr },
];

/// 大文字化済みテキストから録画機ファミリーを判定
pub fn detect_recorder_family(text: &str) -> Option<RecorderFamily> {
    RECORDER_DETECTORS
        .iter()
        .find(|d| (d.predicate)(text))
        .map(|d| d.family)
}

/// 両価格表の説明系の列を連結して大文字化
pub fn build_search_text(primary: Option<&CatalogRecord>, secondary: Option<&CatalogRecord>) -> String {
    let mut parts = Vec::new();
    if let Some(p) = primary {
        parts.extend(p.texts(PRIMARY_TEXT_FIELDS));
    }
    if let Some(s) = secondary {
        parts.extend(s.texts(SECONDARY_TEXT_FIELDS));
    }
    parts.join(" ").to_uppercase()
}

/// アクセサリ行のうちケーブル・HDMI延長器類を先に振り分ける
pub fn accessory_pre_route(secondary: &CatalogRecord) -> Option<Classification> {
    if secondary.upper(fields::FIRST_PRODUCT_LINE) != ACCESSORY_LINE {
        return None;
    }
    let text = secondary.texts(CABLE_TEXT_FIELDS).join(" ").to_uppercase();
    if CABLE_KEYWORDS.iter().any(|k| text.contains(k)) {
        Some(Classification::new(ACCESSORY_CABLE_CATEGORY, Some(ACCESSORY_GROUP)))
    } else {
        None
    }
}

/// カテゴリ別の価格グループ別名を正規化
///
/// どの層で判定されたかに関わらず同じ処理を通す。
pub fn normalize_aliases(mut c: Classification) -> Classification {
    let category = c.category.trim().to_string();
    if MONITOR_CATEGORIES.contains(&category.as_str()) {
        c.price_group_hint = Some(MONITOR_GROUP.to_string());
    } else if category == EAS_DOOR_CATEGORY {
        c.price_group_hint = Some(ACCESS_CONTROL_GROUP.to_string());
    }
    c.category = category;
    c
}

/// 3層でカテゴリと価格グループを判定。失敗時は UNKNOWN（例外なし）
pub fn classify(
    primary: Option<&CatalogRecord>,
    secondary: Option<&CatalogRecord>,
    primary_rules: &RuleTable,
    secondary_rules: &RuleTable,
) -> Classification {
    if let Some(p) = primary {
        let c = primary_rules.apply(p);
        if !c.is_unknown() {
            return normalize_aliases(c);
        }
    }

    if let Some(s) = secondary {
        if let Some(c) = accessory_pre_route(s) {
            return normalize_aliases(c);
        }
        let c = secondary_rules.apply(s);
        if !c.is_unknown() {
            return normalize_aliases(c);
        }
    }

    let text = build_search_text(primary, secondary);
    match detect_recorder_family(&text) {
        Some(family) => {
            tracing::debug!(family = family.category(), "マッピング不一致、録画機ヒューリスティックで判定");
            normalize_aliases(family.classification())
        }
        None => Classification::unknown(),
    }
}

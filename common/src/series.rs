//! シリーズ判定
//!
//! - series_display: 表示専用（公式選択には使わない）
//! - series_key: 価格グループ内で公式の派生行を選ぶキー
//! - uplift_line_key: Secondary 原価から FOB を出すときの上乗せ率キー
//!
//! series_key と uplift_line_key は似ているが粒度が異なるため別関数にしている。

use crate::types::{fields, CatalogRecord};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 録画機の上位バケット
pub const RECORDER_FLAGSHIP: &str = "IVSS / NVR6 / NVR5-I/L";
/// 録画機の中位・エントリーバケット
pub const RECORDER_MID: &str = "NVR5-EI/ NVR4 / NVR 2";

pub const THERMAL_TWIN: &str = "TPC4 TPC5";
pub const THERMAL_GENERIC: &str = "TPC";

/// 世代トークン（具体的なものから順に）
const CAMERA_GENERATIONS: &[&str] = &["IPC8", "IPC7", "IPC5", "IPC3", "IPC2", "IPC1"];

const PRIMARY_PIECES_CAMERA: &[&str] = &[
    fields::SERIES,
    fields::SERIES_ZH,
    fields::EXTERNAL_MODEL,
    fields::INTERNAL_MODEL,
    fields::DESCRIPTION,
];
const PRIMARY_PIECES_MODEL_FIRST: &[&str] = &[
    fields::INTERNAL_MODEL,
    fields::EXTERNAL_MODEL,
    fields::SERIES,
    fields::SERIES_ZH,
    fields::DESCRIPTION,
];
const SECONDARY_PIECES: &[&str] = &[
    fields::INTERNAL_MODEL,
    fields::EXTERNAL_MODEL,
    fields::SECOND_PRODUCT_LINE,
    fields::CATALOG_NAME,
];

/// シリーズ判定結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesInfo {
    pub display: String,
    /// 空なら `_default_` 公式
    pub key: String,
}

/// series_key を抽出する製品ファミリー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesFamily {
    /// ネットワークカメラ（世代）
    Camera,
    /// PTZ（型番トークン）
    Ptz,
    /// NVR / IVSS / EVS / XVR（上位・中位）
    Recorder,
    /// サーマル（TPC 系）
    Thermal,
}

impl SeriesFamily {
    /// 価格グループから抽出ルールを選ぶ。対象外は None
    pub fn for_group(price_group: &str) -> Option<Self> {
        match price_group.trim().to_uppercase().as_str() {
            "IPC" => Some(SeriesFamily::Camera),
            "PTZ" => Some(SeriesFamily::Ptz),
            "NVR" | "IVSS" | "EVS" | "XVR" => Some(SeriesFamily::Recorder),
            "THERMAL" => Some(SeriesFamily::Thermal),
            _ => None,
        }
    }

    pub fn extract(&self, primary: Option<&CatalogRecord>, secondary: Option<&CatalogRecord>) -> String {
        match self {
            SeriesFamily::Camera => {
                camera_generation(&join_upper(primary, PRIMARY_PIECES_CAMERA, secondary, SECONDARY_PIECES))
                    .unwrap_or_default()
            }
            SeriesFamily::Ptz => {
                ptz_model_token(&join_upper(primary, PRIMARY_PIECES_MODEL_FIRST, secondary, SECONDARY_PIECES))
                    .unwrap_or_default()
            }
            SeriesFamily::Recorder => recorder_bucket(&join_upper(
                primary,
                PRIMARY_PIECES_MODEL_FIRST,
                secondary,
                SECONDARY_PIECES,
            ))
            .unwrap_or_default()
            .to_string(),
            SeriesFamily::Thermal => {
                let series = primary
                    .and_then(|p| p.first_text(&[fields::SERIES, fields::SERIES_ZH]))
                    .unwrap_or_default()
                    .to_uppercase();
                thermal_family(&series).unwrap_or_default().to_string()
            }
        }
    }
}

fn join_upper(
    primary: Option<&CatalogRecord>,
    primary_fields: &[&str],
    secondary: Option<&CatalogRecord>,
    secondary_fields: &[&str],
) -> String {
    let mut parts = Vec::new();
    if let Some(p) = primary {
        parts.extend(p.texts(primary_fields));
    }
    if let Some(s) = secondary {
        parts.extend(s.texts(secondary_fields));
    }
    parts.join(" ").to_uppercase()
}

/// 表示用シリーズ: Primary の Series/系列 → Secondary の製品ライン/カタログ名
pub fn series_display(primary: Option<&CatalogRecord>, secondary: Option<&CatalogRecord>) -> String {
    primary
        .and_then(|p| p.first_text(&[fields::SERIES, fields::SERIES_ZH]))
        .or_else(|| secondary.and_then(|s| s.first_text(&[fields::SECOND_PRODUCT_LINE, fields::CATALOG_NAME])))
        .unwrap_or_default()
        .to_string()
}

/// (series_display, series_key) を判定
pub fn detect_series(
    primary: Option<&CatalogRecord>,
    secondary: Option<&CatalogRecord>,
    price_group: &str,
) -> SeriesInfo {
    let key = SeriesFamily::for_group(price_group)
        .map(|family| family.extract(primary, secondary))
        .unwrap_or_default();
    SeriesInfo {
        display: series_display(primary, secondary),
        key,
    }
}

/// カメラ世代: `IPCn` トークン → `H[DF]W` 直後の数字
pub fn camera_generation(text: &str) -> Option<String> {
    lazy_static::lazy_static! {
        static ref HW_DIGIT: Regex = Regex::new(r"H[DF]W([0-9])").unwrap();
    }

    if let Some(token) = CAMERA_GENERATIONS.iter().find(|t| text.contains(*t)) {
        return Some(token.to_string());
    }
    let digit = HW_DIGIT.captures(text)?.get(1)?.as_str();
    let key = format!("IPC{}", digit);
    CAMERA_GENERATIONS.contains(&key.as_str()).then_some(key)
}

/// PTZ 型番トークン（ベンダー接頭辞を外し、最初の `-` まで）
pub fn ptz_model_token(text: &str) -> Option<String> {
    lazy_static::lazy_static! {
        static ref VENDOR_MODEL: Regex =
            Regex::new(r"\b(?:DHI|DH)\s*-\s*([A-Z0-9]+(?:-[A-Z0-9]+)*)\b").unwrap();
        static ref SD_MODEL: Regex = Regex::new(r"\b(SD[0-9A-Z]+(?:-[A-Z0-9]+)*)\b").unwrap();
        static ref PTZ_MODEL: Regex = Regex::new(r"\b(PTZ[0-9A-Z]+(?:-[A-Z0-9]+)*)\b").unwrap();
        static ref VENDOR_PREFIX: Regex = Regex::new(r"^(DHI|DH)\s*-\s*").unwrap();
    }

    let candidate = [&*VENDOR_MODEL, &*SD_MODEL, &*PTZ_MODEL]
        .iter()
        .find_map(|re| re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str().to_string()))?;
    let stripped = VENDOR_PREFIX.replace(candidate.trim(), "");
    let token = stripped.split('-').next().unwrap_or_default().trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// 録画機の上位/中位バケット
///
/// IVSS と第6世代は上位、第2・第4世代は中位。第5世代は
/// `EI` 表記なら中位、`-I/L`・`-I`・`-L` なら上位、それ以外は中位。
pub fn recorder_bucket(text: &str) -> Option<&'static str> {
    lazy_static::lazy_static! {
        static ref NVR_GEN: Regex = Regex::new(r"\bNVR\s*([0-9])").unwrap();
        static ref EI_WORD: Regex = Regex::new(r"\bEI\b").unwrap();
        static ref EI_SUFFIX: Regex = Regex::new(r"-EI\b").unwrap();
        static ref IL_SUFFIX: Regex = Regex::new(r"-I/L\b").unwrap();
        static ref I_SUFFIX: Regex = Regex::new(r"-I\b").unwrap();
        static ref L_SUFFIX: Regex = Regex::new(r"-L\b").unwrap();
    }

    if text.contains("IVSS") {
        return Some(RECORDER_FLAGSHIP);
    }
    let generation = NVR_GEN.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())?;
    match generation {
        "6" => Some(RECORDER_FLAGSHIP),
        "4" | "2" => Some(RECORDER_MID),
        "5" => {
            if EI_WORD.is_match(text) || EI_SUFFIX.is_match(text) {
                Some(RECORDER_MID)
            } else if IL_SUFFIX.is_match(text) || I_SUFFIX.is_match(text) || L_SUFFIX.is_match(text) {
                Some(RECORDER_FLAGSHIP)
            } else {
                Some(RECORDER_MID)
            }
        }
        _ => None,
    }
}

/// サーマル: TPC4/TPC5 → 2機種ファミリー、その他 TPC → 汎用
pub fn thermal_family(series: &str) -> Option<&'static str> {
    if series.contains("TPC4") || series.contains("TPC5") {
        Some(THERMAL_TWIN)
    } else if series.contains("TPC") {
        Some(THERMAL_GENERIC)
    } else {
        None
    }
}

/// 上乗せ率テーブルのキーを判定（該当なしは空文字）
pub fn uplift_line_key(
    category: &str,
    series_display: &str,
    primary: Option<&CatalogRecord>,
    secondary: Option<&CatalogRecord>,
) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if !series_display.is_empty() {
        parts.push(series_display);
    }
    if let Some(p) = primary {
        parts.extend(p.texts(PRIMARY_PIECES_CAMERA));
    }
    if let Some(s) = secondary {
        parts.extend(s.texts(&[
            fields::SECOND_PRODUCT_LINE,
            fields::CATALOG_NAME,
            fields::EXTERNAL_MODEL,
            fields::INTERNAL_MODEL,
            fields::FIRST_PRODUCT_LINE,
        ]));
    }
    let text = parts.join(" ").to_uppercase();

    match category.trim().to_uppercase().as_str() {
        "IPC" => camera_generation(&text).unwrap_or_default(),
        "NVR" | "IVSS" | "EVS" => {
            if ["IVD", "IVSS", "EVS"].iter().any(|t| text.contains(t)) {
                "IVD/IVSS/EVS".to_string()
            } else if text.contains("NVR6") && text.contains("XI") {
                "NVR6 XI".to_string()
            } else if text.contains("NVR5") && text.contains("EI2") {
                "NVR5 EI2".to_string()
            } else if text.contains("NVR4") {
                "NVR4".to_string()
            } else {
                String::new()
            }
        }
        cat @ ("PTZ" | "ITC" | "SCP") => cat.to_string(),
        "THERMAL" if text.contains("TPC") => THERMAL_GENERIC.to_string(),
        _ => String::new(),
    }
}

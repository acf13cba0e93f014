//! PN 正規化
//!
//! - raw key: 前後空白除去 + 大文字化のみ（完全一致用）
//! - base key: さらに空白を除去し、末尾の `-dddd`（4桁）地域サフィックスを落とす

use regex::Regex;

/// 完全一致用のキー
pub fn raw_key(pn: &str) -> String {
    pn.trim().to_uppercase()
}

/// 同一基底製品の照合用キー
///
/// `1.0.01.04.42701-0026` → `1.0.01.04.42701`。4桁以外のサフィックスは残す。
pub fn base_key(pn: &str) -> String {
    lazy_static::lazy_static! {
        static ref SUFFIX_RE: Regex = Regex::new(r"^(.*?)-([0-9]{4})$").unwrap();
    }

    let s: String = raw_key(pn).chars().filter(|c| *c != ' ').collect();
    match SUFFIX_RE.captures(&s) {
        Some(caps) => caps[1].to_string(),
        None => s,
    }
}

/// raw/base の組
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PnKeys {
    pub raw: String,
    pub base: String,
}

impl PnKeys {
    pub fn new(pn: &str) -> Self {
        Self {
            raw: raw_key(pn),
            base: base_key(pn),
        }
    }

    /// サフィックスが落とされたか
    pub fn has_suffix(&self) -> bool {
        !self.base.is_empty() && self.base != self.raw
    }
}

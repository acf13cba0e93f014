//! 価格表と PN 照合
//!
//! 価格表ごとに raw key / base key の索引を構築し（重複は先勝ち）、
//! exact → base の順で照合する。サフィックス付き PN の場合は
//! base PN の行から欠けている価格列だけを補完する。

use crate::error::{Error, Result};
use crate::pn_key::{self, PnKeys};
use crate::types::{CatalogRecord, CatalogSide, MatchMode, PriceField};
use std::borrow::Cow;
use std::collections::HashMap;

/// PN 列名の候補（優先順）
pub const PN_COLUMN_CANDIDATES: &[&str] = &[
    "Part No.",
    "Part No",
    "PART NO.",
    "PART NO",
    "PartNo",
    "Part Num",
    "PartNum",
    "PN",
    "pn",
    "P/N",
    "Part Number",
    "PART NUM",
];

/// ヘッダーから PN 列を探す
///
/// 候補の完全一致 → 大文字小文字無視の一致 → `PART`+`NO` / `PART`+`NUM` を含む列
pub fn detect_pn_column<S: AsRef<str>>(headers: &[S]) -> Option<String> {
    for candidate in PN_COLUMN_CANDIDATES {
        if let Some(h) = headers.iter().find(|h| h.as_ref() == *candidate) {
            return Some(h.as_ref().to_string());
        }
    }

    for candidate in PN_COLUMN_CANDIDATES {
        let lower = candidate.to_lowercase();
        if let Some(h) = headers.iter().find(|h| h.as_ref().trim().to_lowercase() == lower) {
            return Some(h.as_ref().to_string());
        }
    }

    headers
        .iter()
        .find(|h| {
            let up = h.as_ref().to_uppercase();
            up.contains("PART") && (up.contains("NO") || up.contains("NUM"))
        })
        .map(|h| h.as_ref().to_string())
}

/// 索引付きの価格表（ロード後は不変）
#[derive(Debug, Clone)]
pub struct Catalog {
    side: CatalogSide,
    pn_column: String,
    records: Vec<CatalogRecord>,
    raw_index: HashMap<String, usize>,
    base_index: HashMap<String, usize>,
}

impl Catalog {
    /// ヘッダーから PN 列を検出して構築。見つからなければエラー
    pub fn new<S: AsRef<str>>(
        side: CatalogSide,
        headers: &[S],
        records: Vec<CatalogRecord>,
    ) -> Result<Self> {
        let pn_column = detect_pn_column(headers).ok_or_else(|| Error::MissingPnColumn {
            catalog: side.to_string(),
            headers: headers
                .iter()
                .map(|h| h.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        })?;
        Ok(Self::with_pn_column(side, pn_column, records))
    }

    /// PN 列名を明示して構築
    pub fn with_pn_column(
        side: CatalogSide,
        pn_column: impl Into<String>,
        records: Vec<CatalogRecord>,
    ) -> Self {
        let pn_column = pn_column.into();
        let mut raw_index = HashMap::new();
        let mut base_index = HashMap::new();

        for (i, record) in records.iter().enumerate() {
            let Some(pn) = record.text(&pn_column) else {
                continue;
            };
            let raw = pn_key::raw_key(pn);
            let base = pn_key::base_key(pn);
            if !raw.is_empty() {
                raw_index.entry(raw).or_insert(i);
            }
            if !base.is_empty() {
                base_index.entry(base).or_insert(i);
            }
        }

        Self {
            side,
            pn_column,
            records,
            raw_index,
            base_index,
        }
    }

    /// 空の価格表
    pub fn empty(side: CatalogSide) -> Self {
        Self::with_pn_column(side, "Part No.", Vec::new())
    }

    pub fn side(&self) -> CatalogSide {
        self.side
    }

    pub fn pn_column(&self) -> &str {
        &self.pn_column
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// raw key 完全一致の行
    pub fn by_raw(&self, raw: &str) -> Option<&CatalogRecord> {
        self.raw_index.get(raw).map(|&i| &self.records[i])
    }

    /// exact → base の順で照合
    pub fn find(&self, keys: &PnKeys) -> (Option<&CatalogRecord>, MatchMode) {
        if !keys.raw.is_empty() {
            if let Some(&i) = self.raw_index.get(&keys.raw) {
                return (Some(&self.records[i]), MatchMode::Exact);
            }
        }
        if !keys.base.is_empty() {
            if let Some(&i) = self.base_index.get(&keys.base) {
                return (Some(&self.records[i]), MatchMode::Base);
            }
        }
        (None, MatchMode::Unmatched)
    }

    /// 照合 + base PN 行からの価格補完
    pub fn lookup(&self, keys: &PnKeys) -> CatalogMatch<'_> {
        let (record, mode) = self.find(keys);
        let Some(record) = record else {
            return CatalogMatch::unmatched();
        };

        let matched_pn = record.text(&self.pn_column).map(|s| s.to_string());
        let (record, backfilled_from) = if keys.has_suffix() {
            self.backfill_prices(record, &keys.base)
        } else {
            (Cow::Borrowed(record), None)
        };

        CatalogMatch {
            record: Some(record),
            mode,
            matched_pn,
            backfilled_from,
        }
    }

    /// base PN の行から欠けている価格列を補う
    ///
    /// 既に値がある列は上書きしない。何も補えなければ借用のまま返す。
    pub fn backfill_prices<'a>(
        &'a self,
        record: &'a CatalogRecord,
        base_key: &str,
    ) -> (Cow<'a, CatalogRecord>, Option<String>) {
        let Some(base_row) = self.by_raw(base_key) else {
            return (Cow::Borrowed(record), None);
        };
        if std::ptr::eq(base_row, record) {
            return (Cow::Borrowed(record), None);
        }

        let mut patched: Option<CatalogRecord> = None;
        for field in PriceField::ALL {
            let column = field.column();
            if record.number(column).is_some() {
                continue;
            }
            if let Some(value) = base_row.text(column).filter(|_| base_row.number(column).is_some()) {
                patched
                    .get_or_insert_with(|| record.clone())
                    .set(column, value);
            }
        }

        match patched {
            Some(p) => {
                let fallback_pn = base_row
                    .text(&self.pn_column)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| base_key.to_string());
                tracing::debug!(side = %self.side, base = %fallback_pn, "base PN から価格列を補完");
                (Cow::Owned(p), Some(fallback_pn))
            }
            None => (Cow::Borrowed(record), None),
        }
    }
}

/// 片側の照合結果
#[derive(Debug, Clone)]
pub struct CatalogMatch<'a> {
    pub record: Option<Cow<'a, CatalogRecord>>,
    pub mode: MatchMode,
    /// 価格表上の PN 表記
    pub matched_pn: Option<String>,
    /// 価格列を補った base PN
    pub backfilled_from: Option<String>,
}

impl<'a> CatalogMatch<'a> {
    pub fn unmatched() -> Self {
        Self {
            record: None,
            mode: MatchMode::Unmatched,
            matched_pn: None,
            backfilled_from: None,
        }
    }

    pub fn record(&self) -> Option<&CatalogRecord> {
        self.record.as_deref()
    }

    pub fn is_matched(&self) -> bool {
        self.record.is_some()
    }
}

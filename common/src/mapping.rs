//! 製品ライン・マッピング表
//!
//! priority 昇順で評価し、最初に一致した行が (category, price_group_hint) を決める。
//! 条件は最大2つ、一致方式は equals / contains のみ。

use crate::types::{CatalogRecord, UNKNOWN_CATEGORY};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// 一致方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Equals,
    Contains,
}

impl std::str::FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equals" => Ok(MatchType::Equals),
            "contains" => Ok(MatchType::Contains),
            _ => Err(format!("Unknown match type: {}. Use equals or contains", s)),
        }
    }
}

/// 1つの一致条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    /// None は一致方式が不正な行（常に不一致）
    pub match_type: Option<MatchType>,
    pub pattern: String,
}

impl Condition {
    pub fn new(field: impl Into<String>, match_type: MatchType, pattern: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            match_type: Some(match_type),
            pattern: pattern.into(),
        }
    }

    /// 値・パターンとも大文字化して比較
    pub fn matches(&self, record: &CatalogRecord) -> bool {
        let value = record.upper(&self.field);
        let pattern = self.pattern.trim().to_uppercase();
        match self.match_type {
            Some(MatchType::Equals) => value == pattern,
            Some(MatchType::Contains) => value.contains(&pattern),
            None => false,
        }
    }
}

/// マッピング表の1行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRule {
    /// 小さいほど優先
    pub priority: Option<f64>,
    /// None は field1 が空の行（評価対象外）
    pub first: Option<Condition>,
    pub second: Option<Condition>,
    pub category: String,
    pub price_group_hint: Option<String>,
}

impl MappingRule {
    pub fn new(priority: f64, first: Condition, category: impl Into<String>) -> Self {
        Self {
            priority: Some(priority),
            first: Some(first),
            second: None,
            category: category.into(),
            price_group_hint: None,
        }
    }

    pub fn and(mut self, second: Condition) -> Self {
        self.second = Some(second);
        self
    }

    pub fn hint(mut self, price_group: impl Into<String>) -> Self {
        self.price_group_hint = Some(price_group.into());
        self
    }

    pub fn matches(&self, record: &CatalogRecord) -> bool {
        let Some(first) = &self.first else {
            return false;
        };
        if !first.matches(record) {
            return false;
        }
        match &self.second {
            Some(second) => second.matches(record),
            None => true,
        }
    }
}

/// マッピング結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: String,
    pub price_group_hint: Option<String>,
}

impl Classification {
    pub fn new(category: impl Into<String>, price_group_hint: Option<&str>) -> Self {
        Self {
            category: category.into(),
            price_group_hint: price_group_hint.map(|s| s.to_string()),
        }
    }

    pub fn unknown() -> Self {
        Self {
            category: UNKNOWN_CATEGORY.to_string(),
            price_group_hint: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.category.is_empty() || self.category == UNKNOWN_CATEGORY
    }
}

/// priority 順に並べ替え済みのマッピング表
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<MappingRule>,
}

impl RuleTable {
    /// priority 昇順に安定ソート（priority なしの行は末尾・ファイル順）
    pub fn from_rules(mut rules: Vec<MappingRule>) -> Self {
        rules.sort_by(|a, b| match (a.priority, b.priority) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        Self { rules }
    }

    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 最初に一致した行の結果。カテゴリが空の行は UNKNOWN
    pub fn apply(&self, record: &CatalogRecord) -> Classification {
        for rule in &self.rules {
            if !rule.matches(record) {
                continue;
            }
            let category = rule.category.trim();
            if category.is_empty() {
                return Classification::unknown();
            }
            let hint = rule
                .price_group_hint
                .as_deref()
                .map(str::trim)
                .filter(|h| !h.is_empty());
            return Classification::new(category, hint);
        }
        Classification::unknown()
    }
}

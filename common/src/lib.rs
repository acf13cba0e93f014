//! Pricing Auto Common Library
//!
//! 価格表の照合・分類・公式選択・価格算出のコアと、CLI から使う出力ユーティリティ

pub mod types;
pub mod error;
pub mod pn_key;
pub mod catalog;
pub mod mapping;
pub mod classifier;
pub mod series;
pub mod formula;
pub mod resolver;
pub mod pricing;
pub mod engine;
pub mod format;
pub mod export;

pub use types::{
    BasisField, CatalogRecord, CatalogSide, ComputationResult, FinalValues, MatchMode, PriceField,
    PriceTiers, QueryStatus, ResultMeta, SalesType,
};
pub use error::{Error, Result};
pub use pn_key::{base_key, raw_key, PnKeys};
pub use catalog::{detect_pn_column, Catalog, CatalogMatch};
pub use mapping::{Classification, Condition, MappingRule, MatchType, RuleTable};
pub use classifier::classify;
pub use series::{detect_series, uplift_line_key, SeriesInfo};
pub use formula::{ChannelDiscounts, ChannelFormulaRow, FormulaBook, LandedCostRule, UpliftRow};
pub use resolver::{pick_formula, resolve_effective_group, FormulaPick, FORMULA_NOT_FOUND};
pub use pricing::{PriceComputer, PricingInput, PricingOutcome};
pub use engine::{BatchCounts, BatchOutcome, PricingEngine, ReferenceSnapshot};
pub use export::ExportLevel;

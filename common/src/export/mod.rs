//! Export core modules shared by the CLI.

#[cfg(feature = "excel")]
pub mod excel_core;

use crate::types::{fields, PriceField};
use std::fmt;
use std::str::FromStr;

/// 出力レベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportLevel {
    /// 国別: 原価・DDP A・MSRP のみ
    #[default]
    Country,
    /// 国別＋顧客別: 7段階すべて
    CountryCustomer,
}

impl ExportLevel {
    /// 出力ファイル名
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportLevel::Country => "Country_import_upload_Model.xlsx",
            ExportLevel::CountryCustomer => "Country&Customer_import_upload_Model.xlsx",
        }
    }

    /// 出力する価格列
    pub fn price_fields(&self) -> &'static [PriceField] {
        const COUNTRY: [PriceField; 3] = [
            PriceField::CostPrice,
            PriceField::LandedCost,
            PriceField::RecommendedRetail,
        ];
        match self {
            ExportLevel::Country => &COUNTRY,
            ExportLevel::CountryCustomer => &PriceField::ALL,
        }
    }
}

/// 価格列の前に並べる説明列
pub const DESCRIPTIVE_COLUMNS: [&str; 6] = [
    fields::PART_NO,
    fields::SERIES,
    fields::EXTERNAL_MODEL,
    fields::INTERNAL_MODEL,
    fields::SALES_STATUS,
    fields::DESCRIPTION,
];

impl FromStr for ExportLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '&'], "_").as_str() {
            "country" => Ok(ExportLevel::Country),
            "country_customer" => Ok(ExportLevel::CountryCustomer),
            _ => Err(format!("Unknown level: {}. Use country or country_customer", s)),
        }
    }
}

impl fmt::Display for ExportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportLevel::Country => write!(f, "country"),
            ExportLevel::CountryCustomer => write!(f, "country_customer"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_str() {
        assert_eq!("country".parse::<ExportLevel>().unwrap(), ExportLevel::Country);
        assert_eq!("Country-Customer".parse::<ExportLevel>().unwrap(), ExportLevel::CountryCustomer);
        assert_eq!("country&customer".parse::<ExportLevel>().unwrap(), ExportLevel::CountryCustomer);
        assert!("customer".parse::<ExportLevel>().is_err());
    }

    #[test]
    fn test_level_columns() {
        assert_eq!(ExportLevel::Country.price_fields().len(), 3);
        assert_eq!(ExportLevel::CountryCustomer.price_fields().len(), 7);
        assert!(ExportLevel::CountryCustomer.file_name().starts_with("Country&Customer"));
    }
}

//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use pricing_auto::error::PricingError;
use pricing_auto::loader;
use pricing_auto_common::{Catalog, CatalogRecord, CatalogSide};
use std::path::Path;
use tempfile::tempdir;

/// 存在しない価格表を読んだ場合
#[test]
fn test_read_nonexistent_sheet() {
    let result = loader::read_sheet(Path::new("/nonexistent/path/SysPrice.xls"));
    assert!(matches!(result, Err(PricingError::FileNotFound(_))));
}

/// xlsx として読めないファイル
#[test]
fn test_read_broken_sheet() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("FrancePrice.xlsx");
    std::fs::write(&path, "not a workbook").unwrap();

    let result = loader::read_sheet(&path);
    assert!(matches!(result, Err(PricingError::SheetRead(_))));
}

/// マッピング表に必須列がない
#[test]
fn test_mapping_without_category_column() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("productline_map_sys_full.csv");
    std::fs::write(&path, "priority,field1,match_type1,pattern1\n1,Series,contains,IPC\n").unwrap();

    let err = loader::load_rule_table(&path).unwrap_err();
    assert!(matches!(err, PricingError::MappingParse(_)));
    assert!(err.to_string().contains("category"));
}

/// PN 列のない価格表は索引を作らずエラー
#[test]
fn test_catalog_without_pn_column() {
    let headers = ["Model", "FOB C(EUR)"];
    let records = vec![CatalogRecord::new().with("Model", "X").with("FOB C(EUR)", "1")];

    let common_err = Catalog::new(CatalogSide::Primary, &headers[..], records).unwrap_err();
    let err: PricingError = common_err.into();

    assert!(matches!(err, PricingError::Core(_)));
    let display = format!("{}", err);
    assert!(display.contains("primary"));
    assert!(display.contains("Model"));
}

/// PricingErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        PricingError::Config("テスト設定エラー".to_string()),
        PricingError::FileNotFound("FrancePrice.xlsx".to_string()),
        PricingError::MissingReferenceFile {
            name: "SysPrice".to_string(),
            tried: "a/SysPrice.xls, a/SysPrice.xlsx".to_string(),
        },
        PricingError::SheetRead("壊れたシート".to_string()),
        PricingError::MappingParse("列不足".to_string()),
        PricingError::UnsupportedInput("pns.pdf".to_string()),
        PricingError::ExcelGeneration("Excel生成エラー".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// 参照ファイル不足のメッセージに確認したパスが入る
#[test]
fn test_missing_reference_message() {
    let err = PricingError::MissingReferenceFile {
        name: "SysPrice".to_string(),
        tried: "data/SysPrice.xls, data/SysPrice.xlsx".to_string(),
    };
    let display = format!("{}", err);

    assert!(display.contains("SysPrice"));
    assert!(display.contains("data/SysPrice.xlsx"));
}

/// IOエラーからの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: PricingError = io_err.into();

    assert!(matches!(err, PricingError::Io(_)));
    let display = format!("{}", err);
    assert!(display.contains("IO"));
}

/// JSONエラーからの変換
#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{ invalid }").unwrap_err();
    let err: PricingError = json_err.into();

    assert!(matches!(err, PricingError::Json(_)));
}

/// common::Errorは透過的に表示される
#[test]
fn test_error_chain_transparent() {
    let common_err = pricing_auto_common::Error::Config("公式テーブル不正".to_string());
    let err: PricingError = common_err.into();

    let display = format!("{}", err);
    assert!(display.contains("公式テーブル不正"));
}

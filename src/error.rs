use thiserror::Error;

#[derive(Error, Debug)]
pub enum PricingError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("参照ファイルがありません: {name}（確認したパス: {tried}）")]
    MissingReferenceFile { name: String, tried: String },

    #[error("シート読み込みエラー: {0}")]
    SheetRead(String),

    #[error("マッピング表の解析に失敗: {0}")]
    MappingParse(String),

    #[error("未対応の入力形式です: {0}（.txt / .csv / .xlsx / .xls）")]
    UnsupportedInput(String),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error(transparent)]
    Core(#[from] pricing_auto_common::Error),

    #[error("JSON解析エラー: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV解析エラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PricingError>;

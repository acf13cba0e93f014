//! エラー型定義
//!
//! パイプライン内部の「見つからない」「分類できない」は結果側で表現するため、
//! ここに並ぶのは呼び出し元へ伝播すべき致命的なものだけ。

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("PN column not found in {catalog} catalog (headers: {headers})")]
    MissingPnColumn { catalog: String, headers: String },
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

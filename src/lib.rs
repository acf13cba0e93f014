//! pricing-auto
//!
//! 参照データのロード・設定・ログ・CLI・ファイル出力。
//! 照会パイプライン本体は `pricing_auto_common` にある。

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod loader;
pub mod logging;

//! 参照データのメタ情報
//!
//! 読み込み時刻・ファイル・行数と、4ファイルの SHA-256 をまとめた指紋。

use crate::error::Result;
use chrono::Local;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// 1ファイル分の情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub role: String,
    pub path: String,
    pub rows: usize,
    pub sha256: String,
}

/// スナップショット全体の情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub loaded_at: String,
    pub files: Vec<FileMeta>,
    /// 全ファイルのハッシュを順に連結して再ハッシュしたもの
    pub fingerprint: String,
    pub formula_source: String,
}

impl SnapshotMeta {
    pub fn new(files: Vec<FileMeta>, formula_source: impl Into<String>) -> Self {
        let mut hasher = Sha256::new();
        for f in &files {
            hasher.update(f.role.as_bytes());
            hasher.update(f.sha256.as_bytes());
        }
        Self {
            loaded_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            files,
            fingerprint: hex::encode(hasher.finalize()),
            formula_source: formula_source.into(),
        }
    }
}

/// ファイル内容の SHA-256（16進）
pub fn file_sha256(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

pub fn file_meta(role: &str, path: &Path, rows: usize) -> Result<FileMeta> {
    Ok(FileMeta {
        role: role.to_string(),
        path: path.display().to_string(),
        rows,
        sha256: file_sha256(path)?,
    })
}

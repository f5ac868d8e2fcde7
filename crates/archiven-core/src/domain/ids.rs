//! Domain identifiers.
//!
//! # ULID ベースの FileId
//! FileId は ULID (Universally Unique Lexicographically Sortable Identifier) を包む newtype です。
//!
//! ## ULID の特性
//! - **時刻でソート可能**: timestamp が先頭にあるため、生成順序でソートできる
//! - **分散生成可能**: 調整なしで複数ノードで生成できる
//! - **文字列表現が固定長**: Crockford base32 の 26 文字
//!
//! 呼び出し側にとって FileId は不透明なハンドルです。
//! 文字列から組み立てられるのは `FromStr` 経由のみで、ULID として不正な文字列は
//! [`InvalidFileId`] になります（ストア側で INVALID_ID に対応付けられる）。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Identifier of an archived file.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(Ulid);

impl FileId {
    /// ULID から FileId を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// 内部の ULID を取得
    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for FileId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 文字列が FileId として解釈できない
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid file id: {0:?}")]
pub struct InvalidFileId(pub String);

impl FromStr for FileId {
    type Err = InvalidFileId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s)
            .map(Self::from_ulid)
            .map_err(|_| InvalidFileId(s.to_string()))
    }
}

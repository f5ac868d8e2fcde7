//! FileRecord - アーカイブされた 1 ファイルのメタデータ
//!
//! # 不変条件
//! - `id` はストアが書き込み完了時に割り当てる（空になることはない）
//! - `size` は実際に書き込まれたバイト数（呼び出し側の申告値は使わない）
//! - `uploaded_at` はストア側の時計で決まる
//! - 作成後は変更されない（update 操作は存在しない）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::FileId;

/// Metadata of one archived document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: FileId,

    /// Original filename as supplied by the uploader. Never interpreted as a path.
    pub name: String,

    /// Exact number of bytes persisted.
    pub size: u64,

    pub content_type: String,

    pub uploaded_at: DateTime<Utc>,
}

impl FileRecord {
    /// 一覧の並び順（uploaded_at 降順、同時刻は id 降順）で比較する
    pub fn listing_order(&self, other: &Self) -> std::cmp::Ordering {
        other
            .uploaded_at
            .cmp(&self.uploaded_at)
            .then_with(|| other.id.cmp(&self.id))
    }
}

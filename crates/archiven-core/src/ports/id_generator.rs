//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::FileId;
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は FileId を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数のリクエストから同時に使える）
pub trait IdGenerator: Send + Sync {
    fn generate_file_id(&self) -> FileId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って現在時刻ベースの ULID を生成します。
/// テスト時に FixedClock を渡すと timestamp 部分が決定的になります。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_file_id(&self) -> FileId {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        FileId::from(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}

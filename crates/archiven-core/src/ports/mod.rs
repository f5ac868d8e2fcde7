//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（オブジェクトストレージ、ファイルシステム、時計など）への
//! インターフェースを提供し、実装の詳細を隠蔽します。

pub mod blob_store;
pub mod clock;
pub mod id_generator;

// 主要な trait を再エクスポート
pub use self::blob_store::{BlobStore, ByteStream, FileContent, StoreError};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};

//! archiven-core
//!
//! ファイルアーカイブの中核部分。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, file, validation, pagination, errors）
//! - **ports**: 抽象化レイヤー（BlobStore, Clock, IdGenerator）
//! - **impls**: ports の実装（InMemoryBlobStore, LocalFsBlobStore）
//! - **app**: アプリケーション層（ArchiveService, ArchiveServiceBuilder）

pub mod domain;
pub mod ports;
pub mod impls;
pub mod app;

pub use app::{ArchiveService, ArchiveServiceBuilder};
pub use domain::{ArchiveError, FileId, FileRecord, PagedResult, Pagination, UploadPolicy};
pub use ports::{BlobStore, ByteStream, FileContent, StoreError};

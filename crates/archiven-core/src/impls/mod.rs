//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryBlobStore**: 開発用・テスト用のリファレンス実装
//! - **LocalFsBlobStore**: ローカルファイルシステムへの永続化
//!
//! どちらも [`catalog::Catalog`] でメタデータの並び順を管理します。

pub mod catalog;
pub mod fs_blob;
pub mod inmem_blob;

// 主要な型を再エクスポート
pub use self::fs_blob::LocalFsBlobStore;
pub use self::inmem_blob::InMemoryBlobStore;

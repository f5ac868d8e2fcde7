//! App - アプリケーション層
//!
//! ports と domain を組み合わせて 3 つのユースケース（upload / fetch / list）を実装します。
//! HTTP 層やクライアントコードが呼び出すのはこの層だけです。
//!
//! # 主要コンポーネント
//! - **ArchiveServiceBuilder**: 構築とワイヤリング（起動時検証）
//! - **ArchiveService**: ユースケースの実装

pub mod builder;
pub mod service;

// 主要な型を再エクスポート
pub use self::builder::{ArchiveServiceBuilder, BuildError};
pub use self::service::ArchiveService;

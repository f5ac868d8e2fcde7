//! Errors - アーカイブ操作のエラー分類
//!
//! # 分類
//! - Validation: クライアント起因（ストレージには触れない）
//! - NotFound: 指定 id のレコードが存在しない
//! - InvalidId: id の形式が不正
//! - Storage: バックエンド障害（接続、書き込み、デコード）

use thiserror::Error;

use super::validation::ValidationError;
use crate::ports::StoreError;

/// ArchiveError は ArchiveService が返すエラー
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("invalid file id: {0}")]
    InvalidId(String),

    #[error("storage failure during {operation}")]
    Storage {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ArchiveError {
    /// ストアのエラーを分類する（NotFound/InvalidId はそのまま伝搬）
    pub(crate) fn from_store(operation: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ArchiveError::NotFound(id),
            StoreError::InvalidId(id) => ArchiveError::InvalidId(id),
            source => ArchiveError::Storage { operation, source },
        }
    }

    /// 呼び出し側で回復可能な（想定内の）エラーか
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ArchiveError::Storage { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::ReasonCode;

    #[test]
    fn store_lookup_errors_keep_their_kind() {
        assert!(matches!(
            ArchiveError::from_store("read", StoreError::NotFound("x".into())),
            ArchiveError::NotFound(id) if id == "x"
        ));
        assert!(matches!(
            ArchiveError::from_store("read", StoreError::InvalidId("y".into())),
            ArchiveError::InvalidId(id) if id == "y"
        ));
    }

    #[test]
    fn backend_failures_become_storage_errors() {
        let io = std::io::Error::other("disk on fire");
        let err = ArchiveError::from_store("write", StoreError::Io(io));
        assert!(matches!(err, ArchiveError::Storage { operation: "write", .. }));
        assert!(!err.is_client_error());
        // 表示には内部の原因を含めない
        assert_eq!(err.to_string(), "storage failure during write");
    }

    #[test]
    fn validation_is_a_client_error() {
        let err: ArchiveError =
            ValidationError::new(ReasonCode::SizeExceeded, "too big").into();
        assert!(err.is_client_error());
    }
}

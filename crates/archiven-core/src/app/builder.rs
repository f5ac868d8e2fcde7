//! ArchiveServiceBuilder - ArchiveService の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - store が未設定 → BuildError::MissingStore
//! - allow-list が空（何も受理できない）→ BuildError::EmptyAllowList
//! - max_file_size が 0 → BuildError::ZeroMaxFileSize

use std::sync::Arc;

use super::service::ArchiveService;
use crate::domain::UploadPolicy;
use crate::ports::BlobStore;

/// ArchiveServiceBuilder は ArchiveService を構築
///
/// # 使用例
/// ```ignore
/// let service = ArchiveServiceBuilder::new()
///     .store(Arc::new(InMemoryBlobStore::new()))
///     .policy(UploadPolicy::default())
///     .build()?;
/// ```
pub struct ArchiveServiceBuilder {
    store: Option<Arc<dyn BlobStore>>,
    policy: UploadPolicy,
}

/// BuildError は構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no blob store configured")]
    MissingStore,

    #[error("upload policy allows no content types")]
    EmptyAllowList,

    #[error("upload policy max_file_size must be greater than zero")]
    ZeroMaxFileSize,
}

impl ArchiveServiceBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            policy: UploadPolicy::default(),
        }
    }

    pub fn store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn policy(mut self, policy: UploadPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<ArchiveService, BuildError> {
        let store = self.store.ok_or(BuildError::MissingStore)?;
        if self.policy.allowed_types.iter().all(|t| t.trim().is_empty()) {
            return Err(BuildError::EmptyAllowList);
        }
        if self.policy.max_file_size == 0 {
            return Err(BuildError::ZeroMaxFileSize);
        }
        Ok(ArchiveService::new(store, self.policy))
    }
}

impl Default for ArchiveServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryBlobStore;

    #[test]
    fn test_build_success() {
        let service = ArchiveServiceBuilder::new()
            .store(Arc::new(InMemoryBlobStore::new()))
            .build();
        assert!(service.is_ok());
    }

    #[test]
    fn test_build_missing_store() {
        let service = ArchiveServiceBuilder::new().build();
        assert!(matches!(service, Err(BuildError::MissingStore)));
    }

    #[test]
    fn test_build_empty_allow_list() {
        let service = ArchiveServiceBuilder::new()
            .store(Arc::new(InMemoryBlobStore::new()))
            .policy(UploadPolicy::new([""], 1024))
            .build();
        assert!(matches!(service, Err(BuildError::EmptyAllowList)));
    }

    #[test]
    fn test_build_zero_max_size() {
        let service = ArchiveServiceBuilder::new()
            .store(Arc::new(InMemoryBlobStore::new()))
            .policy(UploadPolicy::new(["application/pdf"], 0))
            .build();
        assert!(matches!(service, Err(BuildError::ZeroMaxFileSize)));
    }
}

//! ArchiveService - upload / fetch / list のユースケース
//!
//! # データフロー
//! - upload: UploadPolicy で検査 → BlobStore::write → FileRecord
//! - fetch: BlobStore::read をそのまま委譲（NotFound / InvalidId は区別して伝搬）
//! - list: Pagination で正規化 → BlobStore::list_page → BlobStore::count → PagedResult
//!
//! サービス自身は可変状態もロックも持ちません。並行性の扱いは BlobStore に任せます。
//! list の 2 回の呼び出しはスナップショットで囲まないため、同時アップロードがあると
//! `total` と `items` が書き込まれた件数分だけ食い違うことがあります（既知の挙動）。
//! 失敗した書き込みはリトライしません。

use bytes::Bytes;
use futures::StreamExt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{ArchiveError, FileRecord, PagedResult, Pagination, UploadPolicy};
use crate::ports::{BlobStore, ByteStream, FileContent, StoreError};

pub struct ArchiveService {
    store: Arc<dyn BlobStore>,
    policy: UploadPolicy,
}

impl ArchiveService {
    pub fn new(store: Arc<dyn BlobStore>, policy: UploadPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// ファイルを検査して保存する
    ///
    /// 検査に失敗した場合、BlobStore には一切触れません。
    /// 申告サイズとは別に、実際に流れてきたバイト数も `max_file_size` で打ち切ります
    /// （その場合もレコードは残らず、SIZE_EXCEEDED として返る）。
    #[instrument(
        skip_all,
        fields(operation = "upload", file_name = %name, content_type = %content_type, declared_size = declared_size)
    )]
    pub async fn upload(
        &self,
        name: &str,
        content_type: &str,
        content: ByteStream<'_>,
        declared_size: u64,
    ) -> Result<FileRecord, ArchiveError> {
        if let Err(err) = self.policy.validate(name, content_type, declared_size) {
            warn!(reason = %err.reason, message = %err.message, "upload rejected");
            return Err(err.into());
        }

        let exceeded = Arc::new(AtomicBool::new(false));
        let content = limit_size(content, self.policy.max_file_size, exceeded.clone());

        match self.store.write(name, content_type, content).await {
            Ok(record) => {
                info!(file_id = %record.id, file_size = record.size, "file uploaded");
                Ok(record)
            }
            Err(_) if exceeded.load(Ordering::Acquire) => {
                let err = self.policy.size_exceeded();
                warn!(reason = %err.reason, "upload aborted while streaming");
                Err(err.into())
            }
            Err(err) => {
                error!(error = %err, "failed to store file");
                Err(ArchiveError::from_store("write", err))
            }
        }
    }

    /// レコードと本体ストリームを返す
    ///
    /// 返された [`FileContent`] は呼び出し側が最後まで読むか drop して解放すること。
    #[instrument(skip(self), fields(operation = "fetch"))]
    pub async fn fetch(&self, id: &str) -> Result<(FileRecord, FileContent), ArchiveError> {
        self.store
            .read(id)
            .await
            .map_err(|err| lookup_error("read", id, err))
    }

    /// レコードのみを返す（本体は開かない）
    #[instrument(skip(self), fields(operation = "describe"))]
    pub async fn describe(&self, id: &str) -> Result<FileRecord, ArchiveError> {
        self.store
            .stat(id)
            .await
            .map_err(|err| lookup_error("stat", id, err))
    }

    /// ページ単位の一覧（不正な page / per_page は既定値に正規化）
    #[instrument(skip(self), fields(operation = "list"))]
    pub async fn list_paginated(
        &self,
        page: i64,
        per_page: i64,
    ) -> Result<PagedResult, ArchiveError> {
        let pagination = Pagination::normalize(page, per_page);
        let window = pagination.window();

        let items = self
            .store
            .list_page(window.skip, window.limit)
            .await
            .map_err(|err| storage_error("list_page", err))?;
        let total = self
            .store
            .count()
            .await
            .map_err(|err| storage_error("count", err))?;

        Ok(PagedResult::new(items, total, pagination))
    }
}

fn lookup_error(operation: &'static str, id: &str, err: StoreError) -> ArchiveError {
    let err = ArchiveError::from_store(operation, err);
    match &err {
        ArchiveError::Storage { source, .. } => {
            error!(file_id = %id, error = %source, "storage lookup failed")
        }
        other => debug!(file_id = %id, error = %other, "lookup miss"),
    }
    err
}

fn storage_error(operation: &'static str, err: StoreError) -> ArchiveError {
    error!(error = %err, "{operation} failed");
    ArchiveError::from_store(operation, err)
}

/// `max` バイトを超えた時点でエラーを流し、`exceeded` を立てる
fn limit_size<'a>(content: ByteStream<'a>, max: u64, exceeded: Arc<AtomicBool>) -> ByteStream<'a> {
    let mut seen = 0u64;
    content
        .map(move |chunk| -> io::Result<Bytes> {
            let chunk = chunk?;
            seen += chunk.len() as u64;
            if seen > max {
                exceeded.store(true, Ordering::Release);
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "upload exceeds maximum file size",
                ));
            }
            Ok(chunk)
        })
        .boxed()
}

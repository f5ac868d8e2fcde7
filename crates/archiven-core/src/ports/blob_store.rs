//! BlobStore port - ファイル本体とメタデータの永続化
//!
//! BlobStore はストレージ技術（オブジェクトストレージ、DB の blob 機能、
//! ファイルシステムなど）を隠蔽する capability interface です。
//!
//! # 契約
//! - **write**: 全体をメモリに載せずにストリームで書き込む。`size` は実際に転送された
//!   バイト数から求める。id は書き込み完了と同時に割り当て、途中で失敗した
//!   書き込みは読み出し可能なレコードを残さない（all-or-nothing）。
//! - **read**: チャンク単位で順に読めるストリームを返す。ストリームは呼び出し側が
//!   drop（または [`FileContent::close`]）した時点でストレージ側の資源を解放する。
//! - **list_page**: `uploaded_at` 降順、同時刻は `id` 降順。
//! - **count**: 総件数。list_page と同一スナップショットである保証はない。
//!
//! 実装は `Send + Sync` で、並行アクセスに対して安全でなければならない。

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;

use crate::domain::FileRecord;
use crate::domain::ids::InvalidFileId;

/// 長さ未知のバイトストリーム（チャンク単位）
pub type ByteStream<'a> = BoxStream<'a, io::Result<Bytes>>;

/// StoreError はバックエンドのエラー
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("invalid file id: {0}")]
    InvalidId(String),

    /// 呼び出し側から渡された content ストリームが失敗した（切断など）
    #[error("content stream failed: {0}")]
    Stream(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("metadata codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl From<InvalidFileId> for StoreError {
    fn from(err: InvalidFileId) -> Self {
        StoreError::InvalidId(err.0)
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// content をストリームで書き込み、確定したレコードを返す
    async fn write(
        &self,
        name: &str,
        content_type: &str,
        content: ByteStream<'_>,
    ) -> Result<FileRecord, StoreError>;

    /// レコードと本体ストリームを返す
    async fn read(&self, id: &str) -> Result<(FileRecord, FileContent), StoreError>;

    /// レコードのみを返す（本体は開かない）
    async fn stat(&self, id: &str) -> Result<FileRecord, StoreError>;

    async fn list_page(&self, skip: u64, limit: u64) -> Result<Vec<FileRecord>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}

/// FileContent は読み出し中のファイル本体
///
/// `Stream<Item = io::Result<Bytes>>` として順に消費します。
/// drop するとストレージ側の資源（ファイルハンドルなど）が解放されます。
pub struct FileContent {
    inner: ByteStream<'static>,
}

impl FileContent {
    pub fn new(stream: impl Stream<Item = io::Result<Bytes>> + Send + 'static) -> Self {
        Self {
            inner: stream.boxed(),
        }
    }

    /// 読み出しを終了して資源を解放する
    pub fn close(self) {
        drop(self);
    }

    /// 残りをすべて読み込む（小さなファイルとテスト向け）
    pub async fn read_to_end(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.inner.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }
}

impl Stream for FileContent {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for FileContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileContent").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn file_content_yields_chunks_in_order() {
        let chunks = vec![Ok(Bytes::from_static(b"ab")), Ok(Bytes::from_static(b"cd"))];
        let mut content = FileContent::new(stream::iter(chunks));
        assert_eq!(content.next().await.unwrap().unwrap(), Bytes::from_static(b"ab"));
        assert_eq!(content.next().await.unwrap().unwrap(), Bytes::from_static(b"cd"));
        assert!(content.next().await.is_none());
    }

    #[tokio::test]
    async fn read_to_end_surfaces_mid_stream_errors() {
        let chunks = vec![
            Ok(Bytes::from_static(b"ab")),
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone")),
        ];
        let err = FileContent::new(stream::iter(chunks))
            .read_to_end()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn invalid_id_maps_to_store_error() {
        let err: StoreError = "nope".parse::<crate::domain::FileId>().unwrap_err().into();
        assert!(matches!(err, StoreError::InvalidId(id) if id == "nope"));
    }
}

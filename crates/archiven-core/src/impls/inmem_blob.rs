//! InMemoryBlobStore - 開発用・テスト用の BlobStore
//!
//! # 実装詳細
//! - 本体は受け取ったチャンク（`Bytes`）の列のまま保持し、連結しない
//! - 読み出しはチャンク列を順に再生する（`Bytes` の clone は参照カウントのみ）
//! - ストリームを最後まで受け取ってから RwLock を取り、索引に登録する
//!   → 途中で失敗した書き込みは何も残さない

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, stream};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::catalog::Catalog;
use crate::domain::{FileId, FileRecord};
use crate::ports::{
    BlobStore, ByteStream, Clock, FileContent, IdGenerator, StoreError, SystemClock,
    UlidGenerator,
};

#[derive(Default)]
struct InMemoryState {
    catalog: Catalog,
    blobs: HashMap<FileId, Arc<Vec<Bytes>>>,
}

/// InMemoryBlobStore はプロセス内に保持する BlobStore
///
/// # 使用例
/// ```ignore
/// let store = InMemoryBlobStore::new();
/// let record = store.write("a.pdf", "application/pdf", content).await?;
/// let (record, content) = store.read(&record.id.to_string()).await?;
/// ```
pub struct InMemoryBlobStore {
    state: RwLock<InMemoryState>,
    clock: Arc<dyn Clock>,
    ids: UlidGenerator<Arc<dyn Clock>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// テスト用: 時計を差し替える
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(InMemoryState::default()),
            ids: UlidGenerator::new(clock.clone()),
            clock,
        }
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn write(
        &self,
        name: &str,
        content_type: &str,
        mut content: ByteStream<'_>,
    ) -> Result<FileRecord, StoreError> {
        let mut chunks = Vec::new();
        let mut size = 0u64;
        while let Some(chunk) = content.next().await {
            let chunk = chunk.map_err(StoreError::Stream)?;
            size += chunk.len() as u64;
            if !chunk.is_empty() {
                chunks.push(chunk);
            }
        }

        let record = FileRecord {
            id: self.ids.generate_file_id(),
            name: name.to_string(),
            size,
            content_type: content_type.to_string(),
            uploaded_at: self.clock.now(),
        };

        let mut state = self.state.write().await;
        state.blobs.insert(record.id, Arc::new(chunks));
        state.catalog.insert(record.clone());
        Ok(record)
    }

    async fn read(&self, id: &str) -> Result<(FileRecord, FileContent), StoreError> {
        let file_id: FileId = id.parse()?;
        let state = self.state.read().await;
        let (Some(record), Some(chunks)) =
            (state.catalog.get(&file_id), state.blobs.get(&file_id))
        else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        let chunks = Arc::clone(chunks);
        let content = stream::iter((0..chunks.len()).map(move |i| Ok(chunks[i].clone())));
        Ok((record.clone(), FileContent::new(content)))
    }

    async fn stat(&self, id: &str) -> Result<FileRecord, StoreError> {
        let file_id: FileId = id.parse()?;
        self.state
            .read()
            .await
            .catalog
            .get(&file_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list_page(&self, skip: u64, limit: u64) -> Result<Vec<FileRecord>, StoreError> {
        Ok(self.state.read().await.catalog.page(skip, limit))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.state.read().await.catalog.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::{Duration, TimeZone, Utc};
    use std::io;
    use ulid::Ulid;

    fn chunked(parts: &[&'static [u8]]) -> ByteStream<'static> {
        let chunks: Vec<io::Result<Bytes>> =
            parts.iter().map(|p| Ok(Bytes::from_static(*p))).collect();
        stream::iter(chunks).boxed()
    }

    #[tokio::test]
    async fn write_then_read_roundtrip() {
        let store = InMemoryBlobStore::new();
        let record = store
            .write("a.pdf", "application/pdf", chunked(&[b"%PDF-", b"1.7", b""]))
            .await
            .unwrap();
        assert_eq!(record.size, 8);
        assert_eq!(record.name, "a.pdf");

        let (found, content) = store.read(&record.id.to_string()).await.unwrap();
        assert_eq!(found, record);
        assert_eq!(content.read_to_end().await.unwrap(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn read_replays_original_chunks() {
        let store = InMemoryBlobStore::new();
        let record = store
            .write("a.pdf", "application/pdf", chunked(&[b"ab", b"cd", b"ef"]))
            .await
            .unwrap();
        let (_, content) = store.read(&record.id.to_string()).await.unwrap();
        let chunks: Vec<Bytes> = content.map(|c| c.unwrap()).collect().await;
        assert_eq!(chunks.len(), 3);
    }

    #[tokio::test]
    async fn failed_stream_leaves_no_record() {
        let store = InMemoryBlobStore::new();
        let content = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "client went away")),
        ])
        .boxed();

        let err = store
            .write("a.pdf", "application/pdf", content)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Stream(_)));
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.list_page(0, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids_are_distinguished() {
        let store = InMemoryBlobStore::new();
        let missing = Ulid::new().to_string();
        assert!(matches!(
            store.read(&missing).await,
            Err(StoreError::NotFound(id)) if id == missing
        ));
        assert!(matches!(
            store.read("not-an-id").await,
            Err(StoreError::InvalidId(_))
        ));
        assert!(matches!(
            store.stat("not-an-id").await,
            Err(StoreError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn uploaded_at_comes_from_the_store_clock() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(start));
        let store = InMemoryBlobStore::with_clock(clock.clone());

        let first = store.write("1.pdf", "application/pdf", chunked(&[b"1"])).await.unwrap();
        clock.advance(Duration::seconds(1));
        let second = store.write("2.pdf", "application/pdf", chunked(&[b"2"])).await.unwrap();

        assert_eq!(first.uploaded_at, start);
        assert_eq!(second.uploaded_at, start + Duration::seconds(1));

        let listed = store.list_page(0, 10).await.unwrap();
        assert_eq!(listed, vec![second, first]);
    }

    #[tokio::test]
    async fn concurrent_writes_are_all_recorded() {
        let store = Arc::new(InMemoryBlobStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let name = format!("{i}.pdf");
                store
                    .write(&name, "application/pdf", chunked(&[b"x"]))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.count().await.unwrap(), 16);
    }
}

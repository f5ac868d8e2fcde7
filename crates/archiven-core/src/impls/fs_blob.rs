//! LocalFsBlobStore - ローカルファイルシステムに永続化する BlobStore
//!
//! # ディレクトリ構成
//! ```text
//! <root>/
//!   tmp/          書き込み途中のファイル（*.part, *.json）
//!   blobs/<id>    本体
//!   meta/<id>.json メタデータ（FileRecord）
//! ```
//!
//! # 書き込みの手順
//! 1. `tmp/<id>.part` にチャンクを順に書き込み、バイト数を数える
//! 2. fsync して `blobs/<id>` に rename
//! 3. メタデータを `tmp/<id>.json` に書いてから `meta/<id>.json` に rename
//! 4. 索引（Catalog）に登録
//!
//! メタデータの rename が可視化の境界です。それ以前に失敗した場合や、
//! ステージング中に呼び出し側が future を drop した場合は [`Cleanup`] が途中のファイルを消します。
//! 手順 2 以降（[`Commit`]）は別タスクで実行するため、呼び出し側の drop では中断されません。
//! 起動時には `tmp/` に残ったファイルを掃除し、`meta/` から索引を再構築します
//! （本体が無いメタデータは読み飛ばす）。

use async_trait::async_trait;
use futures::StreamExt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use super::catalog::Catalog;
use crate::domain::{FileId, FileRecord};
use crate::ports::{
    BlobStore, ByteStream, Clock, FileContent, IdGenerator, StoreError, SystemClock,
    UlidGenerator,
};

/// 読み出し時のチャンクサイズ（既定値）
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

const TMP_DIR: &str = "tmp";
const BLOBS_DIR: &str = "blobs";
const META_DIR: &str = "meta";

pub struct LocalFsBlobStore {
    root: PathBuf,
    catalog: Arc<RwLock<Catalog>>,
    clock: Arc<dyn Clock>,
    ids: UlidGenerator<Arc<dyn Clock>>,
    read_chunk_size: usize,
}

impl LocalFsBlobStore {
    /// `root` 以下を開く（なければ作成する）
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_clock(root, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock(
        root: impl AsRef<Path>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        for dir in [TMP_DIR, BLOBS_DIR, META_DIR] {
            fs::create_dir_all(root.join(dir)).await?;
        }

        let store = Self {
            catalog: Arc::new(RwLock::new(Catalog::new())),
            ids: UlidGenerator::new(clock.clone()),
            clock,
            root,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        };
        store.purge_staging().await?;
        store.load_catalog().await?;
        Ok(store)
    }

    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, id: &FileId) -> PathBuf {
        self.root.join(BLOBS_DIR).join(id.to_string())
    }

    fn meta_path(&self, id: &FileId) -> PathBuf {
        self.root.join(META_DIR).join(format!("{id}.json"))
    }

    fn staging_path(&self, id: &FileId, ext: &str) -> PathBuf {
        self.root.join(TMP_DIR).join(format!("{id}.{ext}"))
    }

    async fn purge_staging(&self) -> Result<(), StoreError> {
        let mut entries = fs::read_dir(self.root.join(TMP_DIR)).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            debug!(path = %path.display(), "removing leftover staging file");
            if let Err(e) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "failed to remove staging file");
            }
        }
        Ok(())
    }

    async fn load_catalog(&self) -> Result<(), StoreError> {
        let mut catalog = self.catalog.write().await;
        let mut entries = fs::read_dir(self.root.join(META_DIR)).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let record = match load_record(&path).await {
                Ok(record) => record,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable metadata");
                    continue;
                }
            };
            if !fs::try_exists(self.blob_path(&record.id)).await.unwrap_or(false) {
                warn!(path = %path.display(), file_id = %record.id, "skipping metadata without blob");
                continue;
            }
            catalog.insert(record);
        }
        info!(root = %self.root.display(), files = catalog.len(), "file store opened");
        Ok(())
    }

    /// content を path に書き込み、書き込んだバイト数を返す
    async fn stage(&self, path: &Path, mut content: ByteStream<'_>) -> Result<u64, StoreError> {
        let mut file = fs::File::create(path).await?;
        let mut size = 0u64;
        while let Some(chunk) = content.next().await {
            let chunk = chunk.map_err(StoreError::Stream)?;
            file.write_all(&chunk).await?;
            size += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;
        Ok(size)
    }

    fn parse_id(id: &str) -> Result<FileId, StoreError> {
        Ok(id.parse::<FileId>()?)
    }
}

async fn load_record(path: &Path) -> Result<FileRecord, StoreError> {
    let raw = fs::read(path).await?;
    Ok(serde_json::from_slice(&raw)?)
}

#[async_trait]
impl BlobStore for LocalFsBlobStore {
    async fn write(
        &self,
        name: &str,
        content_type: &str,
        content: ByteStream<'_>,
    ) -> Result<FileRecord, StoreError> {
        let id = self.ids.generate_file_id();
        let mut cleanup = Cleanup::default();

        let part = self.staging_path(&id, "part");
        cleanup.track(part.clone());
        let size = self.stage(&part, content).await?;

        let record = FileRecord {
            id,
            name: name.to_string(),
            size,
            content_type: content_type.to_string(),
            uploaded_at: self.clock.now(),
        };
        let commit = Commit {
            part,
            blob: self.blob_path(&id),
            meta_tmp: self.staging_path(&id, "json"),
            meta: self.meta_path(&id),
            record: record.clone(),
            catalog: Arc::clone(&self.catalog),
        };

        // ここから先は呼び出し側が drop しても最後まで走る
        tokio::spawn(commit.run(cleanup))
            .await
            .map_err(|e| StoreError::Io(io::Error::other(e)))??;

        debug!(file_id = %id, size, "blob committed");
        Ok(record)
    }

    async fn read(&self, id: &str) -> Result<(FileRecord, FileContent), StoreError> {
        let record = self.stat(id).await?;
        let file = fs::File::open(self.blob_path(&record.id))
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => StoreError::NotFound(id.to_string()),
                _ => StoreError::Io(e),
            })?;
        let content = ReaderStream::with_capacity(file, self.read_chunk_size);
        Ok((record, FileContent::new(content)))
    }

    async fn stat(&self, id: &str) -> Result<FileRecord, StoreError> {
        let file_id = Self::parse_id(id)?;
        self.catalog
            .read()
            .await
            .get(&file_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list_page(&self, skip: u64, limit: u64) -> Result<Vec<FileRecord>, StoreError> {
        Ok(self.catalog.read().await.page(skip, limit))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.catalog.read().await.len() as u64)
    }
}

/// ステージング済みの本体を確定させる処理
///
/// 失敗した場合は `cleanup` が drop され、途中のファイルが消える。
struct Commit {
    part: PathBuf,
    blob: PathBuf,
    meta_tmp: PathBuf,
    meta: PathBuf,
    record: FileRecord,
    catalog: Arc<RwLock<Catalog>>,
}

impl Commit {
    async fn run(self, mut cleanup: Cleanup) -> Result<(), StoreError> {
        cleanup.track(self.blob.clone());
        fs::rename(&self.part, &self.blob).await?;

        cleanup.track(self.meta_tmp.clone());
        fs::write(&self.meta_tmp, serde_json::to_vec_pretty(&self.record)?).await?;
        fs::rename(&self.meta_tmp, &self.meta).await?;
        cleanup.disarm();

        self.catalog.write().await.insert(self.record);
        Ok(())
    }
}

/// 書き込み途中のファイルを drop 時に削除するガード
///
/// write の future が途中で drop された場合（クライアント切断など）も
/// 同期的に後始末される。
#[derive(Default)]
struct Cleanup {
    paths: Vec<PathBuf>,
}

impl Cleanup {
    fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    fn disarm(&mut self) {
        self.paths.clear();
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed incomplete upload"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove incomplete upload"),
            }
        }
    }
}

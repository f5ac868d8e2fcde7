//! Catalog - メタデータの索引
//!
//! `(uploaded_at, id)` の BTreeSet で一覧順を保持し、
//! HashMap で id からレコードを引きます。
//! 一覧は BTreeSet を逆順に辿るだけなので、並べ替えは発生しません。

use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};

use crate::domain::{FileId, FileRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct OrderKey {
    uploaded_at: DateTime<Utc>,
    id: FileId,
}

impl From<&FileRecord> for OrderKey {
    fn from(record: &FileRecord) -> Self {
        Self {
            uploaded_at: record.uploaded_at,
            id: record.id,
        }
    }
}

#[derive(Debug, Default)]
pub struct Catalog {
    order: BTreeSet<OrderKey>,
    records: HashMap<FileId, FileRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// レコードを登録する（同じ id が既にあれば置き換える）
    pub fn insert(&mut self, record: FileRecord) {
        if let Some(previous) = self.records.get(&record.id) {
            self.order.remove(&OrderKey::from(previous));
        }
        self.order.insert(OrderKey::from(&record));
        self.records.insert(record.id, record);
    }

    pub fn get(&self, id: &FileId) -> Option<&FileRecord> {
        self.records.get(id)
    }

    /// uploaded_at 降順（同時刻は id 降順）で skip/limit を適用する
    pub fn page(&self, skip: u64, limit: u64) -> Vec<FileRecord> {
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        self.order
            .iter()
            .rev()
            .skip(skip)
            .take(limit)
            .filter_map(|key| self.records.get(&key.id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ulid::Ulid;

    fn record(id: u128, secs: i64) -> FileRecord {
        FileRecord {
            id: FileId::from_ulid(Ulid(id)),
            name: format!("{id}.pdf"),
            size: 0,
            content_type: "application/pdf".into(),
            uploaded_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    fn ids(records: &[FileRecord]) -> Vec<u128> {
        records.iter().map(|r| r.id.as_ulid().0).collect()
    }

    #[test]
    fn pages_newest_first_with_id_tiebreak() {
        let mut catalog = Catalog::new();
        catalog.insert(record(1, 10));
        catalog.insert(record(2, 30));
        catalog.insert(record(3, 20));
        catalog.insert(record(4, 30));

        assert_eq!(ids(&catalog.page(0, 10)), vec![4, 2, 3, 1]);
        assert_eq!(ids(&catalog.page(1, 2)), vec![2, 3]);
        assert_eq!(ids(&catalog.page(3, 2)), vec![1]);
        assert!(catalog.page(4, 2).is_empty());
        assert!(catalog.page(u64::MAX, u64::MAX).is_empty());
    }

    #[test]
    fn reinsert_does_not_duplicate() {
        let mut catalog = Catalog::new();
        catalog.insert(record(1, 10));
        catalog.insert(record(1, 50));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.page(0, 10).len(), 1);
        assert_eq!(catalog.get(&FileId::from_ulid(Ulid(1))).unwrap().uploaded_at.timestamp(), 50);
    }
}

//! Pagination calculator.
//!
//! `(page, per_page)` の要求を `(skip, limit)` のウィンドウに変換し、
//! 総件数から総ページ数を求めます。
//!
//! 不正な入力はエラーにせず、既定値へ黙って正規化します。

use serde::{Deserialize, Serialize};

use super::file::FileRecord;

pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

/// Normalized pagination request (`page >= 1`, `1 <= per_page <= 100`).
///
/// [`Pagination::normalize`] 以外では作れない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u64,
    per_page: u32,
}

/// The `(skip, limit)` pair selecting one page of an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub skip: u64,
    pub limit: u64,
}

impl Pagination {
    /// 生の入力を正規化する
    ///
    /// - `page < 1` → 1（大きすぎる page はそのまま保持し、空のページになる）
    /// - `per_page < 1` または `per_page > 100` → 10
    pub fn normalize(page: i64, per_page: i64) -> Self {
        let page = u64::try_from(page).ok().filter(|p| *p >= 1).unwrap_or(1);
        let per_page = u32::try_from(per_page)
            .ok()
            .filter(|pp| (1..=MAX_PER_PAGE).contains(pp))
            .unwrap_or(DEFAULT_PER_PAGE);
        Self { page, per_page }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn window(&self) -> Window {
        Window {
            skip: (self.page - 1).saturating_mul(u64::from(self.per_page)),
            limit: u64::from(self.per_page),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// `ceil(total / per_page)`（total == 0 なら 0）
pub fn total_pages(total: u64, per_page: u32) -> u64 {
    let per_page = u64::from(per_page.max(1));
    total / per_page + u64::from(total % per_page != 0)
}

/// One page of a listing.
///
/// `total` と `items` は別々の呼び出しで得られるため、同時書き込みがあると
/// 書き込まれた件数分だけ食い違うことがある（スナップショットは取らない）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedResult {
    pub items: Vec<FileRecord>,
    pub total: u64,
    pub page: u64,
    pub per_page: u32,
    pub total_pages: u64,
}

impl PagedResult {
    pub fn new(items: Vec<FileRecord>, total: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page(),
            per_page: pagination.per_page(),
            total_pages: total_pages(total, pagination.per_page()),
        }
    }
}

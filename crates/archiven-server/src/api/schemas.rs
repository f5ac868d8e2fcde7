use serde::{Deserialize, Serialize};

use archiven_core::domain::ReasonCode;
use archiven_core::{FileRecord, PagedResult};

/// Metadata of one archived file as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResponse {
    pub name: String,
    pub size: u64,
    pub content_type: String,
    /// RFC 3339
    pub upload_date: String,
    pub download_url: String,
}

impl FileResponse {
    pub fn from_record(record: &FileRecord, download_url: String) -> Self {
        Self {
            name: record.name.clone(),
            size: record.size,
            content_type: record.content_type.clone(),
            upload_date: record.uploaded_at.to_rfc3339(),
            download_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationResponse {
    pub total: u64,
    pub page: u64,
    pub per_page: u32,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub data: Vec<FileResponse>,
    pub pagination: PaginationResponse,
}

impl ListResponse {
    pub fn from_page(page: &PagedResult, download_url: impl Fn(&FileRecord) -> String) -> Self {
        Self {
            data: page
                .items
                .iter()
                .map(|record| FileResponse::from_record(record, download_url(record)))
                .collect(),
            pagination: PaginationResponse {
                total: page.total,
                page: page.page,
                per_page: page.per_page,
                total_pages: page.total_pages,
            },
        }
    }
}

/// Query string of `GET /files`. Values are kept raw so that junk falls back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl ListParams {
    /// 数値として読めない値は 0 として扱い、正規化に任せる
    pub fn parsed(&self) -> (i64, i64) {
        (lenient(self.page.as_deref()), lenient(self.per_page.as_deref()))
    }
}

fn lenient(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonCode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            reason: None,
            details: Vec::new(),
        }
    }

    pub fn with_reason(mut self, reason: ReasonCode) -> Self {
        self.reason = Some(reason);
        self
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }
}

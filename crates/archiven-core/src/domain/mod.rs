//! Domain model (IDs, file records, validation, pagination, errors).

pub mod errors;
pub mod file;
pub mod ids;
pub mod pagination;
pub mod validation;

pub use self::errors::ArchiveError;
pub use self::file::FileRecord;
pub use self::ids::FileId;
pub use self::pagination::{PagedResult, Pagination, Window, total_pages};
pub use self::validation::{ReasonCode, UploadPolicy, ValidationError};

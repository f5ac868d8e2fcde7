//! Validation gate - 永続化の前にアップロードを受理/拒否する
//!
//! 純粋関数のみで構成され、共有可変状態を持ちません。
//! どんな入力（空文字列を含む）に対しても panic せず、
//! 拒否時は機械可読な [`ReasonCode`] と人間向けメッセージを返します。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 既定の上限: 10 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// 拡張子（ドットを含む）の最大長
pub const MAX_EXTENSION_LEN: usize = 10;

/// ファイル名に含められない文字（パス区切り・ワイルドカードなど）
const FORBIDDEN_NAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Machine-readable rejection reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    MissingType,
    TypeNotAllowed,
    SizeExceeded,
    InvalidName,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::MissingType => "MISSING_TYPE",
            ReasonCode::TypeNotAllowed => "TYPE_NOT_ALLOWED",
            ReasonCode::SizeExceeded => "SIZE_EXCEEDED",
            ReasonCode::InvalidName => "INVALID_NAME",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ValidationError はクライアント起因の拒否
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}: {message}")]
pub struct ValidationError {
    pub reason: ReasonCode,
    pub message: String,
}

impl ValidationError {
    pub fn new(reason: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

/// UploadPolicy はアップロードの受理条件
///
/// # 設定
/// - `allowed_types`: 受理する MIME type の allow-list（任意の件数）
/// - `max_file_size`: バイト単位の上限
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadPolicy {
    pub allowed_types: Vec<String>,
    pub max_file_size: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_types: vec!["application/pdf".to_string()],
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl UploadPolicy {
    pub fn new(allowed_types: impl IntoIterator<Item = impl Into<String>>, max_file_size: u64) -> Self {
        Self {
            allowed_types: allowed_types.into_iter().map(Into::into).collect(),
            max_file_size,
        }
    }

    /// アップロードを検査する
    ///
    /// # 検査順序
    /// 1. 申告サイズ（上限超過 → SIZE_EXCEEDED）
    /// 2. content type（空 → MISSING_TYPE、allow-list 外 → TYPE_NOT_ALLOWED）
    /// 3. ファイル名（INVALID_NAME）
    ///
    /// 最初に失敗した検査の理由だけを返す。
    pub fn validate(
        &self,
        name: &str,
        content_type: &str,
        declared_size: u64,
    ) -> Result<(), ValidationError> {
        self.validate_size(declared_size)?;
        self.validate_content_type(content_type)?;
        validate_name(name)
    }

    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        if content_type.is_empty() {
            return Err(ValidationError::new(
                ReasonCode::MissingType,
                "content type is required",
            ));
        }
        if !self.allowed_types.iter().any(|allowed| allowed == content_type) {
            return Err(ValidationError::new(
                ReasonCode::TypeNotAllowed,
                format!("allowed types: {}", self.allowed_types.join(", ")),
            ));
        }
        Ok(())
    }

    pub fn validate_size(&self, size: u64) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(self.size_exceeded());
        }
        Ok(())
    }

    pub(crate) fn size_exceeded(&self) -> ValidationError {
        ValidationError::new(
            ReasonCode::SizeExceeded,
            format!(
                "file size exceeds maximum allowed: {}",
                human_bytes(self.max_file_size)
            ),
        )
    }
}

/// ファイル名を検査する（空、禁止文字、長すぎる拡張子）
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::new(
            ReasonCode::InvalidName,
            "file name is required",
        ));
    }
    if name.contains(FORBIDDEN_NAME_CHARS) {
        return Err(ValidationError::new(
            ReasonCode::InvalidName,
            "invalid file name format",
        ));
    }
    if let Some(dot) = name.rfind('.')
        && name[dot..].len() > MAX_EXTENSION_LEN
    {
        return Err(ValidationError::new(
            ReasonCode::InvalidName,
            format!("file extension longer than {MAX_EXTENSION_LEN} bytes"),
        ));
    }
    Ok(())
}

/// 1024 単位の読みやすい表記（例: 10 MiB）
fn human_bytes(n: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = n as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if value.fract() == 0.0 {
        format!("{} {}", value as u64, UNITS[unit])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn pdf_only() -> UploadPolicy {
        UploadPolicy::new(["application/pdf"], DEFAULT_MAX_FILE_SIZE)
    }

    #[test]
    fn accepts_allowed_pdf() {
        assert_eq!(pdf_only().validate("report.pdf", "application/pdf", 1024), Ok(()));
    }

    #[test]
    fn rejects_type_outside_allow_list() {
        let err = pdf_only()
            .validate("notes.txt", "text/plain", 1024)
            .unwrap_err();
        assert_eq!(err.reason, ReasonCode::TypeNotAllowed);
        assert!(err.message.contains("application/pdf"));
    }

    #[test]
    fn rejects_missing_type() {
        let err = pdf_only().validate("report.pdf", "", 1024).unwrap_err();
        assert_eq!(err.reason, ReasonCode::MissingType);
    }

    #[test]
    fn rejects_one_byte_over_the_ceiling() {
        let policy = pdf_only();
        let err = policy
            .validate("report.pdf", "application/pdf", policy.max_file_size + 1)
            .unwrap_err();
        assert_eq!(err.reason, ReasonCode::SizeExceeded);
        assert_eq!(err.message, "file size exceeds maximum allowed: 10 MiB");
        assert!(
            policy
                .validate("report.pdf", "application/pdf", policy.max_file_size)
                .is_ok()
        );
    }

    #[rstest]
    #[case::size_before_type("notes.txt", "text/plain", 11, ReasonCode::SizeExceeded)]
    #[case::size_before_missing_type("a.pdf", "", 11, ReasonCode::SizeExceeded)]
    #[case::type_before_name("a|b.txt", "text/plain", 1, ReasonCode::TypeNotAllowed)]
    fn first_failing_check_wins(
        #[case] name: &str,
        #[case] content_type: &str,
        #[case] size: u64,
        #[case] want: ReasonCode,
    ) {
        let policy = UploadPolicy::new(["application/pdf"], 10);
        assert_eq!(policy.validate(name, content_type, size).unwrap_err().reason, want);
    }

    #[test]
    fn allow_list_can_hold_many_types() {
        let policy = UploadPolicy::new(["application/pdf", "image/png", "text/plain"], 10);
        assert!(policy.validate("a.png", "image/png", 1).is_ok());
        assert!(policy.validate("a.txt", "text/plain", 1).is_ok());
        assert!(policy.validate("a.gif", "image/gif", 1).is_err());
    }

    #[test]
    fn empty_allow_list_rejects_everything() {
        let policy = UploadPolicy::new(Vec::<String>::new(), 10);
        let err = policy.validate("a.pdf", "application/pdf", 1).unwrap_err();
        assert_eq!(err.reason, ReasonCode::TypeNotAllowed);
    }

    #[rstest]
    #[case::empty("")]
    #[case::slash("../secret.pdf")]
    #[case::backslash("..\\secret.pdf")]
    #[case::colon("C:report.pdf")]
    #[case::star("*.pdf")]
    #[case::question("what?.pdf")]
    #[case::quote("\"quoted\".pdf")]
    #[case::angle("<script>.pdf")]
    #[case::pipe("a|b.pdf")]
    #[case::long_extension("archive.abcdefghij")]
    #[case::multibyte_extension("報告.ドキュメント")]
    fn rejects_invalid_names(#[case] name: &str) {
        let err = pdf_only()
            .validate(name, "application/pdf", 1)
            .unwrap_err();
        assert_eq!(err.reason, ReasonCode::InvalidName);
    }

    #[rstest]
    #[case::plain("report.pdf")]
    #[case::no_extension("README")]
    #[case::nine_char_extension("archive.abcdefghi")]
    #[case::spaces_and_unicode("請求書 2024.pdf")]
    #[case::many_dots("v1.2.3.pdf")]
    fn accepts_valid_names(#[case] name: &str) {
        assert_eq!(validate_name(name), Ok(()));
    }

    #[test]
    fn reason_codes_serialize_screaming_snake() {
        let json = serde_json::to_string(&ReasonCode::TypeNotAllowed).unwrap();
        assert_eq!(json, "\"TYPE_NOT_ALLOWED\"");
        assert_eq!(ReasonCode::SizeExceeded.to_string(), "SIZE_EXCEEDED");
    }

    #[test]
    fn policy_defaults_apply_to_missing_fields() {
        let policy: UploadPolicy = serde_json::from_str(r#"{"max_file_size": 42}"#).unwrap();
        assert_eq!(policy.max_file_size, 42);
        assert_eq!(policy.allowed_types, vec!["application/pdf".to_string()]);
    }
}

//! Upload validation policy and object key layout.

use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::encoding::EncodingProfile;
use crate::job::JobId;
use crate::wire::UploadUrlRequest;

/// Default upload size limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Default allow-list of video MIME types.
pub const DEFAULT_ALLOWED_TYPES: &[&str] = &[
    "video/mp4",
    "video/quicktime",
    "video/webm",
    "video/x-msvideo",
    "video/x-matroska",
];

/// Prefix for client uploads.
pub const UPLOAD_PREFIX: &str = "uploads";
/// Prefix for transcode results.
pub const OUTPUT_PREFIX: &str = "outputs";

/// Reasons an upload request is rejected before any state is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("filename, contentType, and fileSize are required")]
    MissingFields,

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("File size exceeds limit of {limit}.")]
    TooLarge { size: u64, limit: String },

    #[error("Invalid file type. Please upload one of: {allowed}")]
    UnsupportedType { content_type: String, allowed: String },
}

/// Size limit and MIME allow-list applied to upload URL requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_size_bytes: u64,
    pub allowed_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_types: DEFAULT_ALLOWED_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// An accepted upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedUpload {
    pub filename: String,
    /// Lowercased content type
    pub content_type: String,
    pub size: u64,
}

impl UploadPolicy {
    pub fn new(max_size_bytes: u64, allowed_types: Vec<String>) -> Self {
        Self {
            max_size_bytes,
            allowed_types: allowed_types.into_iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    /// Whether the content type is on the allow-list (case-insensitive).
    pub fn allows_type(&self, content_type: &str) -> bool {
        let content_type = content_type.to_lowercase();
        self.allowed_types.iter().any(|t| *t == content_type)
    }

    /// Validate a request.
    pub fn check(&self, request: &UploadUrlRequest) -> Result<AcceptedUpload, UploadRejection> {
        let (Some(filename), Some(content_type), Some(size)) = (
            request.filename.as_deref(),
            request.content_type.as_deref(),
            request.file_size,
        ) else {
            return Err(UploadRejection::MissingFields);
        };

        if filename.is_empty() || content_type.is_empty() {
            return Err(UploadRejection::MissingFields);
        }

        if request.validate().is_err() {
            return Err(UploadRejection::InvalidFilename(
                "must be at most 255 bytes".to_string(),
            ));
        }
        check_filename(filename)?;

        if size > self.max_size_bytes {
            return Err(UploadRejection::TooLarge {
                size,
                limit: describe_size(self.max_size_bytes),
            });
        }

        if !self.allows_type(content_type) {
            return Err(UploadRejection::UnsupportedType {
                content_type: content_type.to_string(),
                allowed: self.allowed_types.join(", "),
            });
        }

        Ok(AcceptedUpload {
            filename: filename.to_string(),
            content_type: content_type.to_lowercase(),
            size,
        })
    }
}

/// `10MB`, `1.5MB`, `512KB` or `100 bytes`.
fn describe_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    let scaled = |unit: u64, suffix: &str| {
        if bytes % unit == 0 {
            format!("{}{}", bytes / unit, suffix)
        } else {
            format!("{:.1}{}", bytes as f64 / unit as f64, suffix)
        }
    };

    if bytes >= MB {
        scaled(MB, "MB")
    } else if bytes >= KB {
        scaled(KB, "KB")
    } else {
        format!("{} bytes", bytes)
    }
}

fn check_filename(filename: &str) -> Result<(), UploadRejection> {
    if filename.contains('/') || filename.contains('\\') {
        return Err(UploadRejection::InvalidFilename(
            "must not contain path separators".to_string(),
        ));
    }
    // With separators excluded, only a bare dot name can point outside the prefix.
    if filename == "." || filename == ".." {
        return Err(UploadRejection::InvalidFilename(
            "must not be '.' or '..'".to_string(),
        ));
    }
    if filename.chars().any(char::is_control) {
        return Err(UploadRejection::InvalidFilename(
            "must not contain control characters".to_string(),
        ));
    }
    Ok(())
}

/// Object key for a new client upload: `uploads/<uuid>-<filename>`.
pub fn upload_object_key(filename: &str) -> String {
    format!("{}/{}-{}", UPLOAD_PREFIX, Uuid::new_v4(), filename)
}

/// Deterministic result key: `outputs/<job_id>.<ext>`.
pub fn result_object_key(job_id: &JobId, profile: &EncodingProfile) -> String {
    format!("{}/{}.{}", OUTPUT_PREFIX, job_id, profile.container_ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(filename: &str, content_type: &str, size: u64) -> UploadUrlRequest {
        UploadUrlRequest {
            filename: Some(filename.to_string()),
            content_type: Some(content_type.to_string()),
            file_size: Some(size),
        }
    }

    #[test]
    fn test_accepts_allowed_video() {
        let policy = UploadPolicy::default();
        let accepted = policy.check(&request("clip.mp4", "video/mp4", 2 * 1024 * 1024)).unwrap();
        assert_eq!(accepted.filename, "clip.mp4");
        assert_eq!(accepted.content_type, "video/mp4");

        // Case-insensitive type match, boundary size
        assert!(policy
            .check(&request("clip.mov", "Video/QuickTime", DEFAULT_MAX_UPLOAD_BYTES))
            .is_ok());
    }

    #[test]
    fn test_rejects_oversize() {
        let policy = UploadPolicy::default();
        let err = policy
            .check(&request("clip.mp4", "video/mp4", DEFAULT_MAX_UPLOAD_BYTES + 1))
            .unwrap_err();
        assert_eq!(
            err,
            UploadRejection::TooLarge {
                size: DEFAULT_MAX_UPLOAD_BYTES + 1,
                limit: "10MB".to_string(),
            }
        );
        assert_eq!(err.to_string(), "File size exceeds limit of 10MB.");
    }

    #[test]
    fn test_small_limits_are_described_exactly() {
        let policy = UploadPolicy::new(512 * 1024, vec!["video/mp4".into()]);
        let err = policy.check(&request("clip.mp4", "video/mp4", 600 * 1024)).unwrap_err();
        assert_eq!(err.to_string(), "File size exceeds limit of 512KB.");

        assert_eq!(describe_size(1536 * 1024), "1.5MB");
        assert_eq!(describe_size(100), "100 bytes");
    }

    #[test]
    fn test_rejects_disallowed_type() {
        let policy = UploadPolicy::default();
        let err = policy
            .check(&request("archive.zip", "application/zip", 1024))
            .unwrap_err();
        assert!(matches!(err, UploadRejection::UnsupportedType { .. }));
        assert!(err.to_string().contains("video/mp4"));
    }

    #[test]
    fn test_rejects_missing_fields() {
        let policy = UploadPolicy::default();
        let req = UploadUrlRequest {
            filename: Some("clip.mp4".into()),
            content_type: None,
            file_size: Some(10),
        };
        assert_eq!(policy.check(&req), Err(UploadRejection::MissingFields));
        assert_eq!(
            policy.check(&request("", "video/mp4", 10)),
            Err(UploadRejection::MissingFields)
        );
    }

    #[test]
    fn test_rejects_bad_filenames() {
        let policy = UploadPolicy::default();
        for name in ["../etc/passwd", "a/b.mp4", "a\\b.mp4", "bad\nname.mp4", "..", "."] {
            assert!(
                matches!(
                    policy.check(&request(name, "video/mp4", 10)),
                    Err(UploadRejection::InvalidFilename(_))
                ),
                "{name} should be rejected"
            );
        }
        for name in ["my..clip.mp4", "..hidden.mp4", "clip.mp4.."] {
            assert!(policy.check(&request(name, "video/mp4", 10)).is_ok(), "{name} should be accepted");
        }
        let long = format!("{}.mp4", "a".repeat(300));
        assert!(matches!(
            policy.check(&request(&long, "video/mp4", 10)),
            Err(UploadRejection::InvalidFilename(_))
        ));
    }

    #[test]
    fn test_object_keys() {
        let key = upload_object_key("clip.mp4");
        assert!(key.starts_with("uploads/"));
        assert!(key.ends_with("-clip.mp4"));
        let uuid_part = &key["uploads/".len()..key.len() - "-clip.mp4".len()];
        assert!(Uuid::parse_str(uuid_part).is_ok());

        let job_id = JobId::from_string("job-1");
        assert_eq!(
            result_object_key(&job_id, &EncodingProfile::standard()),
            "outputs/job-1.mp4"
        );
    }
}

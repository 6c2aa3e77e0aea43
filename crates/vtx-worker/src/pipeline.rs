//! Transcode pipeline: resolve, download, encode, upload, clean up.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};
use vtx_media::{EncodeOutcome, Encoder, MediaError};
use vtx_models::{result_object_key, EncodingProfile, Job, JobId, StoreUri};
use vtx_storage::ObjectStore;

use crate::error::PipelineError;
use crate::logging::JobLogger;

/// Runs one job from source object to result object.
///
/// Scratch files are named after the job id, so pipelines sharing a work
/// directory never collide.
pub struct TranscodePipeline {
    objects: Arc<dyn ObjectStore>,
    encoder: Arc<dyn Encoder>,
    profile: EncodingProfile,
    work_dir: PathBuf,
}

impl TranscodePipeline {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        encoder: Arc<dyn Encoder>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            objects,
            encoder,
            profile: EncodingProfile::standard(),
            work_dir: work_dir.into(),
        }
    }

    pub fn profile(&self) -> &EncodingProfile {
        &self.profile
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Scratch paths for `job_id`: `(input, output)`.
    pub fn scratch_paths(&self, job_id: &JobId) -> (PathBuf, PathBuf) {
        let stem = scratch_stem(job_id);
        let ext = &self.profile.container_ext;
        (
            self.work_dir.join(format!("input-{}.{}", stem, ext)),
            self.work_dir.join(format!("output-{}.{}", stem, ext)),
        )
    }

    /// Process `job`, returning the result reference.
    ///
    /// Scratch files are removed before this returns, whatever the outcome.
    pub async fn run(&self, job: &Job) -> Result<StoreUri, PipelineError> {
        let logger = JobLogger::new(&job.id, "transcode");

        let source = StoreUri::parse(&job.file_url)
            .map_err(|e| PipelineError::MalformedReference(format!("{}: {}", job.file_url, e)))?;

        tokio::fs::create_dir_all(&self.work_dir).await.map_err(|e| {
            PipelineError::transfer(format!(
                "could not prepare scratch directory {}: {}",
                self.work_dir.display(),
                e
            ))
        })?;

        let (input, output) = self.scratch_paths(&job.id);
        let _scratch = ScratchFiles::new(vec![input.clone(), output.clone()]);

        self.objects
            .download_file(&source, &input)
            .await
            .map_err(|e| PipelineError::transfer(format!("download of {} failed: {}", source, e)))?;
        logger.log_step("download", &source.to_string());

        match self.encoder.run(&self.profile, &input, &output).await {
            Ok(EncodeOutcome::Success) => logger.log_step("encode", "encoder exited 0"),
            Ok(EncodeOutcome::Failed { exit_code }) => {
                return Err(PipelineError::EncodeFailure { exit_code })
            }
            Err(e) => return Err(map_media_error(e)),
        }

        let result = source.with_key(result_object_key(&job.id, &self.profile));
        self.objects
            .upload_file(&output, &result, &self.profile.content_type)
            .await
            .map_err(|e| PipelineError::transfer(format!("upload to {} failed: {}", result, e)))?;
        logger.log_step("upload", &result.to_string());

        Ok(result)
    }
}

fn map_media_error(err: MediaError) -> PipelineError {
    match err {
        MediaError::Timeout(secs) => PipelineError::EncodeTimeout { secs },
        MediaError::FileNotFound(path) => {
            PipelineError::transfer(format!("downloaded input missing at {}", path.display()))
        }
        other => PipelineError::EncoderUnavailable(other.to_string()),
    }
}

/// Filename-safe form of a job id. Bytes outside `[A-Za-z0-9-]` become `_xx`
/// hex escapes, so distinct ids never share scratch files.
fn scratch_stem(job_id: &JobId) -> String {
    let mut stem = String::with_capacity(job_id.as_str().len());
    for byte in job_id.as_str().bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("_{:02x}", byte));
        }
    }
    stem
}

/// Removes its files when dropped. Errors are logged, never raised.
struct ScratchFiles {
    paths: Vec<PathBuf>,
}

impl ScratchFiles {
    fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            match std::fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "Removed scratch file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), "Failed to remove scratch file: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_stem_sanitizes() {
        assert_eq!(
            scratch_stem(&JobId::from_string("4b7c2f9e-0000-4000-8000-000000000000")),
            "4b7c2f9e-0000-4000-8000-000000000000"
        );
        assert_eq!(scratch_stem(&JobId::from_string("../etc/passwd")), "_2e_2e_2fetc_2fpasswd");
    }

    #[test]
    fn test_scratch_stem_keeps_ids_apart() {
        let slash = scratch_stem(&JobId::from_string("a/b"));
        let underscore = scratch_stem(&JobId::from_string("a_b"));
        assert_eq!(slash, "a_2fb");
        assert_eq!(underscore, "a_5fb");
        assert_ne!(slash, underscore);
    }

    #[test]
    fn test_scratch_files_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("input-a.mp4");
        let missing = dir.path().join("output-a.mp4");
        std::fs::write(&a, b"x").unwrap();

        drop(ScratchFiles::new(vec![a.clone(), missing]));
        assert!(!a.exists());
    }

    #[test]
    fn test_media_error_mapping() {
        assert_eq!(
            map_media_error(MediaError::Timeout(30)),
            PipelineError::EncodeTimeout { secs: 30 }
        );
        assert!(matches!(
            map_media_error(MediaError::FfmpegNotFound),
            PipelineError::EncoderUnavailable(_)
        ));
    }
}

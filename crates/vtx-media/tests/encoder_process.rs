//! FfmpegEncoder against stand-in executables.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serial_test::serial;
use tempfile::TempDir;
use vtx_media::{EncodeOutcome, Encoder, FfmpegEncoder, MediaError};
use vtx_models::EncodingProfile;

/// Write an executable shell script standing in for ffmpeg.
fn fake_ffmpeg(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-ffmpeg");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn input_file(dir: &Path) -> PathBuf {
    let path = dir.join("input.mp4");
    std::fs::write(&path, b"not really a video").unwrap();
    path
}

#[tokio::test]
#[serial]
async fn test_success_writes_output() {
    let dir = TempDir::new().unwrap();
    // Last argument is the output path.
    let bin = fake_ffmpeg(
        dir.path(),
        r#"for last; do :; done
echo "frame=1 fps=30" >&2
echo encoded > "$last""#,
    );
    let input = input_file(dir.path());
    let output = dir.path().join("output.mp4");

    let outcome = FfmpegEncoder::new(bin)
        .run(&EncodingProfile::standard(), &input, &output)
        .await
        .unwrap();

    assert_eq!(outcome, EncodeOutcome::Success);
    assert_eq!(std::fs::read_to_string(&output).unwrap().trim(), "encoded");
}

#[tokio::test]
#[serial]
async fn test_nonzero_exit_is_failed_outcome() {
    let dir = TempDir::new().unwrap();
    let bin = fake_ffmpeg(dir.path(), "echo 'Invalid data found when processing input' >&2\nexit 3");
    let input = input_file(dir.path());

    let outcome = FfmpegEncoder::new(bin)
        .run(&EncodingProfile::standard(), &input, &dir.path().join("out.mp4"))
        .await
        .unwrap();

    assert_eq!(outcome, EncodeOutcome::Failed { exit_code: Some(3) });
}

#[tokio::test]
#[serial]
async fn test_large_stderr_is_drained() {
    let dir = TempDir::new().unwrap();
    // Far more than a pipe buffer; a child that is not drained would block forever.
    let bin = fake_ffmpeg(
        dir.path(),
        "i=0\nwhile [ $i -lt 5000 ]; do echo \"frame=$i fps=30 q=28.0 size=1024kB time=00:00:01.00 bitrate=1000kbits/s\" >&2; i=$((i+1)); done\nexit 0",
    );
    let input = input_file(dir.path());

    let outcome = tokio::time::timeout(
        Duration::from_secs(30),
        FfmpegEncoder::new(bin).run(&EncodingProfile::standard(), &input, &dir.path().join("o.mp4")),
    )
    .await
    .expect("encoder did not finish")
    .unwrap();

    assert!(outcome.is_success());
}

#[tokio::test]
#[serial]
async fn test_timeout_kills_process() {
    let dir = TempDir::new().unwrap();
    let bin = fake_ffmpeg(dir.path(), "exec sleep 30");
    let input = input_file(dir.path());

    let err = FfmpegEncoder::new(bin)
        .with_timeout(Some(Duration::from_millis(200)))
        .run(&EncodingProfile::standard(), &input, &dir.path().join("o.mp4"))
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::Timeout(_)));
}

#[tokio::test]
#[serial]
async fn test_timeout_returns_while_grandchild_holds_stderr() {
    let dir = TempDir::new().unwrap();
    // No exec: the shell is killed but its background sleep keeps stderr open.
    let bin = fake_ffmpeg(dir.path(), "sleep 30 &\nwait");
    let input = input_file(dir.path());

    let err = tokio::time::timeout(
        Duration::from_secs(10),
        FfmpegEncoder::new(bin)
            .with_timeout(Some(Duration::from_millis(200)))
            .run(&EncodingProfile::standard(), &input, &dir.path().join("o.mp4")),
    )
    .await
    .expect("timed-out encode did not return")
    .unwrap_err();

    assert!(matches!(err, MediaError::Timeout(_)));
}

#[tokio::test]
#[serial]
async fn test_missing_binary_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let input = input_file(dir.path());

    let err = FfmpegEncoder::new(dir.path().join("no-such-ffmpeg"))
        .run(&EncodingProfile::standard(), &input, &dir.path().join("o.mp4"))
        .await
        .unwrap_err();

    assert!(err.is_unavailable());
}

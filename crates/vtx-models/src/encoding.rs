//! The fixed transcode profile.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Video codec (H.264)
pub const VIDEO_CODEC: &str = "libx264";
/// Audio codec
pub const AUDIO_CODEC: &str = "aac";
/// Audio bitrate
pub const AUDIO_BITRATE: &str = "128k";
/// Constant Rate Factor
pub const CRF: u8 = 23;
/// Encoding preset
pub const PRESET: &str = "fast";
/// Output width; height follows the source aspect ratio
pub const TARGET_WIDTH: u32 = 640;
/// Output frame rate cap
pub const MAX_FPS: u32 = 30;
/// Output container extension
pub const CONTAINER_EXT: &str = "mp4";
/// Output content type
pub const OUTPUT_CONTENT_TYPE: &str = "video/mp4";

/// Encoding parameters handed to the encoder.
///
/// There is exactly one profile; `standard()` is the only constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EncodingProfile {
    pub video_codec: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub crf: u8,
    pub preset: String,
    pub width: u32,
    pub max_fps: u32,
    /// Move the moov atom to the front for progressive playback
    pub faststart: bool,
    pub container_ext: String,
    pub content_type: String,
}

impl EncodingProfile {
    pub fn standard() -> Self {
        Self {
            video_codec: VIDEO_CODEC.to_string(),
            audio_codec: AUDIO_CODEC.to_string(),
            audio_bitrate: AUDIO_BITRATE.to_string(),
            crf: CRF,
            preset: PRESET.to_string(),
            width: TARGET_WIDTH,
            max_fps: MAX_FPS,
            faststart: true,
            container_ext: CONTAINER_EXT.to_string(),
            content_type: OUTPUT_CONTENT_TYPE.to_string(),
        }
    }

    /// FFmpeg `-vf` chain: scale to width keeping aspect (even height), then cap fps.
    pub fn video_filter(&self) -> String {
        format!("scale={}:-2,fps={}", self.width, self.max_fps)
    }
}

impl Default for EncodingProfile {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_profile() {
        let profile = EncodingProfile::standard();
        assert_eq!(profile.video_codec, "libx264");
        assert_eq!(profile.audio_codec, "aac");
        assert_eq!(profile.audio_bitrate, "128k");
        assert_eq!(profile.crf, 23);
        assert_eq!(profile.preset, "fast");
        assert!(profile.faststart);
        assert_eq!(profile.video_filter(), "scale=640:-2,fps=30");
    }
}

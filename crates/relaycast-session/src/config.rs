//! Session configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use relaycast_engine::{ColorRange, ColorSpace, ScaleType, SpeakerLayout, VideoFormat};

/// Default audio encoder implementation id (AAC family).
pub const DEFAULT_AUDIO_ENCODER_ID: &str = "ffmpeg_aac";

/// Default video encoder implementation id (H.264 family).
pub const DEFAULT_VIDEO_ENCODER_ID: &str = "obs_x264";

/// Default graphics backend module.
pub const DEFAULT_GRAPHICS_MODULE: &str = "libobs-d3d11";

/// Global audio context settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Sample rate in Hz (default: 44100).
    pub sample_rate: u32,

    /// Channel layout (default: stereo).
    pub speakers: SpeakerLayout,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            speakers: SpeakerLayout::Stereo,
        }
    }
}

/// Global video context settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSettings {
    /// Canvas and output width in pixels (default: 1280).
    pub width: u32,

    /// Canvas and output height in pixels (default: 720).
    pub height: u32,

    /// Frame rate numerator (default: 60).
    pub fps_num: u32,

    /// Frame rate denominator (default: 1).
    pub fps_den: u32,

    /// Output frame format (default: NV12).
    pub output_format: VideoFormat,

    /// Scaling filter (default: bilinear).
    pub scale_type: ScaleType,

    /// Color space (default: engine default).
    pub colorspace: ColorSpace,

    /// Color range (default: engine default).
    pub range: ColorRange,

    /// Graphics backend module (default: `libobs-d3d11`).
    pub graphics_module: String,

    /// Graphics adapter index (default: 0).
    pub adapter: u32,

    /// Whether color conversion runs on the GPU (default: true).
    pub gpu_conversion: bool,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps_num: 60,
            fps_den: 1,
            output_format: VideoFormat::Nv12,
            scale_type: ScaleType::Bilinear,
            colorspace: ColorSpace::Default,
            range: ColorRange::Default,
            graphics_module: DEFAULT_GRAPHICS_MODULE.to_string(),
            adapter: 0,
            gpu_conversion: true,
        }
    }
}

/// Configuration for `initialize()`.
///
/// The three paths have no usable defaults and must point at the
/// engine's installed asset/module directories; everything else
/// defaults to the values above.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Engine asset data directory.
    pub data_path: PathBuf,

    /// Plugin module binary directory.
    pub module_bin_path: PathBuf,

    /// Plugin module data directory.
    pub module_data_path: PathBuf,

    /// Engine locale (default: "en-US").
    pub locale: String,

    /// Global audio context settings.
    pub audio: AudioSettings,

    /// Global video context settings.
    pub video: VideoSettings,

    /// Audio encoder implementation id.
    pub audio_encoder_id: String,

    /// Video encoder implementation id.
    pub video_encoder_id: String,
}

impl SessionConfig {
    /// Config with default contexts and encoders for the given engine
    /// directories.
    pub fn with_paths(
        data_path: impl Into<PathBuf>,
        module_bin_path: impl Into<PathBuf>,
        module_data_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            data_path: data_path.into(),
            module_bin_path: module_bin_path.into(),
            module_data_path: module_data_path.into(),
            locale: "en-US".to_string(),
            audio: AudioSettings::default(),
            video: VideoSettings::default(),
            audio_encoder_id: DEFAULT_AUDIO_ENCODER_ID.to_string(),
            video_encoder_id: DEFAULT_VIDEO_ENCODER_ID.to_string(),
        }
    }
}

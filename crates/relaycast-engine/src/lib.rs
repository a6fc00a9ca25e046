//! Capability interface to the external multimedia engine.
//!
//! The session layer never talks to the engine directly; everything it
//! needs (process startup, global context resets, module loading,
//! encoder/service/output lifecycles) goes through the [`MediaEngine`]
//! trait. Raw engine objects are referred to by opaque ids and owned
//! through the RAII wrappers ([`AudioEncoder`], [`VideoEncoder`],
//! [`StreamService`], [`StreamOutput`]).

mod handles;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use handles::{AudioEncoder, StreamOutput, StreamService, VideoEncoder};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEngine;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Opaque id of an engine-native encoder instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncoderId(pub u64);

/// Opaque id of an engine-native service descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceId(pub u64);

/// Opaque id of an engine-native output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputId(pub u64);

/// Speaker layout for the global audio context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeakerLayout {
    Mono,
    Stereo,
    Surround51,
    Surround71,
}

/// Raw frame format produced by the video pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoFormat {
    Nv12,
    I420,
    Rgba,
}

/// Scaling filter used when base and output sizes differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleType {
    Point,
    Bilinear,
    Bicubic,
    Lanczos,
}

/// Color space for the video context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorSpace {
    #[default]
    Default,
    Rec601,
    Rec709,
}

/// Color range for the video context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorRange {
    #[default]
    Default,
    Partial,
    Full,
}

/// Parameters for a global audio context reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioContextInfo {
    /// Sample rate in Hz.
    pub samples_per_sec: u32,

    /// Channel layout.
    pub speakers: SpeakerLayout,
}

/// Parameters for a global video context reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoContextInfo {
    /// Graphics backend module the engine should load.
    pub graphics_module: String,

    /// Frame rate numerator.
    pub fps_num: u32,

    /// Frame rate denominator.
    pub fps_den: u32,

    /// Canvas width in pixels.
    pub base_width: u32,

    /// Canvas height in pixels.
    pub base_height: u32,

    /// Output width in pixels.
    pub output_width: u32,

    /// Output height in pixels.
    pub output_height: u32,

    /// Output frame format.
    pub output_format: VideoFormat,

    /// Graphics adapter index.
    pub adapter: u32,

    /// Whether color conversion runs on the GPU.
    pub gpu_conversion: bool,

    /// Color space.
    pub colorspace: ColorSpace,

    /// Color range.
    pub range: ColorRange,

    /// Scaling filter.
    pub scale_type: ScaleType,
}

/// Shared handle to a [`MediaEngine`] implementation.
pub type EngineRef = Arc<dyn MediaEngine>;

/// Operations the session layer consumes from the multimedia engine.
///
/// Context resets report an integer status where 0 means success.
/// Creation calls return `None` where the engine hands back a null
/// object (unknown id, missing module). Release calls never fail;
/// engine-side shutdown errors are the engine's to swallow.
pub trait MediaEngine: Send + Sync {
    /// Start the engine for this process. Returns false if the engine
    /// refuses to come up (missing runtime resources, already running).
    fn startup(&self, locale: &str) -> bool;

    /// Tear the engine down. Must not be called while any encoder,
    /// service or output handle is still alive.
    fn shutdown(&self);

    /// Engine version string; `None` until the engine has started.
    fn version_string(&self) -> Option<String>;

    /// Register an asset search path.
    fn add_data_path(&self, path: &Path);

    /// Reset the global audio context. 0 on success.
    fn reset_audio(&self, info: &AudioContextInfo) -> i32;

    /// Reset the global video context. 0 on success.
    fn reset_video(&self, info: &VideoContextInfo) -> i32;

    /// Register a plugin module search path (binaries + data).
    fn add_module_path(&self, bin_path: &Path, data_path: &Path);

    /// Load every discoverable plugin module. Load failures of
    /// individual modules are not reported here.
    fn load_all_modules(&self);

    /// Names of the modules currently loaded.
    fn loaded_modules(&self) -> Vec<String>;

    /// Run post-load hooks of the loaded modules.
    fn post_load_modules(&self);

    /// Create a named audio encoder. `None` on an unknown id.
    fn create_audio_encoder(&self, id: &str, name: &str) -> Option<EncoderId>;

    /// Create a named video encoder. `None` on an unknown id.
    fn create_video_encoder(&self, id: &str, name: &str) -> Option<EncoderId>;

    /// Bind an audio encoder to the current global audio context.
    fn bind_audio_encoder(&self, encoder: EncoderId);

    /// Bind a video encoder to the current global video context.
    fn bind_video_encoder(&self, encoder: EncoderId);

    /// Release an encoder instance.
    fn release_encoder(&self, encoder: EncoderId);

    /// Create a service descriptor of the given kind with opaque
    /// JSON settings. `None` on an unknown kind.
    fn create_service(&self, kind: &str, name: &str, settings: &serde_json::Value)
        -> Option<ServiceId>;

    /// Release a service descriptor.
    fn release_service(&self, service: ServiceId);

    /// Create an output of the given kind. `None` on an unknown kind.
    fn create_output(&self, kind: &str, name: &str) -> Option<OutputId>;

    /// Attach the video encoder feeding an output.
    fn set_output_video_encoder(&self, output: OutputId, encoder: EncoderId);

    /// Attach an audio encoder feeding an output on a logical track.
    fn set_output_audio_encoder(&self, output: OutputId, encoder: EncoderId, track: usize);

    /// Bind the service an output transmits to.
    fn set_output_service(&self, output: OutputId, service: ServiceId);

    /// Start transmitting. Returns false on refusal; the reason is
    /// then available through [`MediaEngine::output_last_error`].
    fn start_output(&self, output: OutputId) -> bool;

    /// Stop transmitting. Safe to call on an output that is not
    /// running.
    fn stop_output(&self, output: OutputId);

    /// Last error reported by an output, if any.
    fn output_last_error(&self, output: OutputId) -> Option<String>;

    /// Release an output. The output must not be running.
    fn release_output(&self, output: OutputId);
}

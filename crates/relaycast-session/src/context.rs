//! Global engine context setup: data paths, audio/video contexts,
//! plugin modules.

use std::env;
use std::path::Path;

use tracing::{debug, info, instrument};

use relaycast_engine::{AudioContextInfo, EngineRef, MediaEngine, VideoContextInfo};

use crate::config::{AudioSettings, VideoSettings};
use crate::error::SessionError;

/// Configures the engine's process-global contexts.
pub struct ContextInitializer {
    engine: EngineRef,
}

impl ContextInitializer {
    pub fn new(engine: EngineRef) -> Self {
        Self { engine }
    }

    /// Register the asset search path.
    ///
    /// Also changes the process working directory to `data_path`: the
    /// engine's graphics module resolves some effect files relative to
    /// the working directory instead of the registered data path, so
    /// without the chdir the video context fails to come up.
    #[instrument(skip(self))]
    pub fn set_data_paths(&self, data_path: &Path) -> Result<(), SessionError> {
        if !data_path.is_dir() {
            return Err(SessionError::PathConfig {
                path: data_path.to_path_buf(),
                reason: "not an existing directory".to_string(),
            });
        }

        self.engine.add_data_path(data_path);

        env::set_current_dir(data_path).map_err(|e| SessionError::PathConfig {
            path: data_path.to_path_buf(),
            reason: e.to_string(),
        })?;

        debug!("Data path registered");
        Ok(())
    }

    /// Reset the global audio context.
    ///
    /// Must run before any encoder exists; the engine refuses an audio
    /// reset while an audio-dependent object is active.
    #[instrument(skip(self, settings))]
    pub fn init_audio(&self, settings: &AudioSettings) -> Result<(), SessionError> {
        let info = AudioContextInfo {
            samples_per_sec: settings.sample_rate,
            speakers: settings.speakers,
        };

        let status = self.engine.reset_audio(&info);
        if status != 0 {
            return Err(SessionError::AudioContext { status });
        }

        info!(
            sample_rate = settings.sample_rate,
            speakers = ?settings.speakers,
            "Audio context initialized"
        );
        Ok(())
    }

    /// Reset the global video context.
    #[instrument(skip(self, settings))]
    pub fn init_video(&self, settings: &VideoSettings) -> Result<(), SessionError> {
        let info = VideoContextInfo {
            graphics_module: settings.graphics_module.clone(),
            fps_num: settings.fps_num,
            fps_den: settings.fps_den,
            base_width: settings.width,
            base_height: settings.height,
            output_width: settings.width,
            output_height: settings.height,
            output_format: settings.output_format,
            adapter: settings.adapter,
            gpu_conversion: settings.gpu_conversion,
            colorspace: settings.colorspace,
            range: settings.range,
            scale_type: settings.scale_type,
        };

        let status = self.engine.reset_video(&info);
        if status != 0 {
            return Err(SessionError::VideoContext { status });
        }

        info!(
            width = settings.width,
            height = settings.height,
            fps_num = settings.fps_num,
            fps_den = settings.fps_den,
            "Video context initialized"
        );
        Ok(())
    }

    /// Register the module search path, load every discoverable plugin
    /// module and run post-load hooks.
    ///
    /// The engine gives no reliable per-module failure signal here; a
    /// missing required module surfaces later as an encoder-creation
    /// failure.
    #[instrument(skip(self))]
    pub fn load_modules(&self, bin_path: &Path, data_path: &Path) {
        self.engine.add_module_path(bin_path, data_path);
        self.engine.load_all_modules();

        let modules = self.engine.loaded_modules();
        info!(count = modules.len(), "Loaded modules: {}", modules.join(", "));

        self.engine.post_load_modules();
    }
}

//! Encoder creation against the current global contexts.

use tracing::{debug, instrument};

use relaycast_engine::{AudioEncoder, EngineRef, MediaEngine, VideoEncoder};

use crate::error::SessionError;

/// Engine-side instance name for the session's audio encoder.
const AUDIO_ENCODER_NAME: &str = "audio_encoder";

/// Engine-side instance name for the session's video encoder.
const VIDEO_ENCODER_NAME: &str = "video_encoder";

/// Creates the session's two encoder instances.
///
/// This is the first point at which a missing or incompatible plugin
/// module becomes observable: the engine hands back a null handle for
/// an id no loaded module provides.
pub struct EncoderFactory {
    engine: EngineRef,
}

impl EncoderFactory {
    pub fn new(engine: EngineRef) -> Self {
        Self { engine }
    }

    /// Create the named audio encoder and bind it to the global audio
    /// context.
    #[instrument(skip(self))]
    pub fn create_audio_encoder(&self, id: &str) -> Result<AudioEncoder, SessionError> {
        let raw = self
            .engine
            .create_audio_encoder(id, AUDIO_ENCODER_NAME)
            .ok_or_else(|| SessionError::EncoderCreation {
                kind: "audio",
                id: id.to_string(),
            })?;
        self.engine.bind_audio_encoder(raw);

        debug!(id, "Audio encoder created");
        Ok(AudioEncoder::from_raw(self.engine.clone(), raw))
    }

    /// Create the named video encoder and bind it to the global video
    /// context.
    #[instrument(skip(self))]
    pub fn create_video_encoder(&self, id: &str) -> Result<VideoEncoder, SessionError> {
        let raw = self
            .engine
            .create_video_encoder(id, VIDEO_ENCODER_NAME)
            .ok_or_else(|| SessionError::EncoderCreation {
                kind: "video",
                id: id.to_string(),
            })?;
        self.engine.bind_video_encoder(raw);

        debug!(id, "Video encoder created");
        Ok(VideoEncoder::from_raw(self.engine.clone(), raw))
    }
}

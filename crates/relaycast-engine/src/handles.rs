//! Ownership-tagged wrappers around raw engine handles.
//!
//! Each wrapper owns exactly one engine object and runs its release
//! call exactly once, on drop. Replacing a wrapper (or letting it go
//! out of scope) is the only release path; nothing else in the
//! workspace calls the engine's release functions.

use std::sync::Arc;

use tracing::debug;

use crate::{EncoderId, MediaEngine, OutputId, ServiceId};

/// An engine-native audio encoder bound to the global audio context.
pub struct AudioEncoder {
    engine: Arc<dyn MediaEngine>,
    id: EncoderId,
}

impl AudioEncoder {
    /// Wrap a raw encoder id. The wrapper takes over the release
    /// obligation for `id`.
    pub fn from_raw(engine: Arc<dyn MediaEngine>, id: EncoderId) -> Self {
        Self { engine, id }
    }

    /// Raw id, for attaching to an output.
    pub fn id(&self) -> EncoderId {
        self.id
    }
}

impl Drop for AudioEncoder {
    fn drop(&mut self) {
        debug!(id = self.id.0, "Releasing audio encoder");
        self.engine.release_encoder(self.id);
    }
}

/// An engine-native video encoder bound to the global video context.
pub struct VideoEncoder {
    engine: Arc<dyn MediaEngine>,
    id: EncoderId,
}

impl VideoEncoder {
    /// Wrap a raw encoder id. The wrapper takes over the release
    /// obligation for `id`.
    pub fn from_raw(engine: Arc<dyn MediaEngine>, id: EncoderId) -> Self {
        Self { engine, id }
    }

    /// Raw id, for attaching to an output.
    pub fn id(&self) -> EncoderId {
        self.id
    }
}

impl Drop for VideoEncoder {
    fn drop(&mut self) {
        debug!(id = self.id.0, "Releasing video encoder");
        self.engine.release_encoder(self.id);
    }
}

/// An engine-native service descriptor (destination + credential).
pub struct StreamService {
    engine: Arc<dyn MediaEngine>,
    id: ServiceId,
}

impl StreamService {
    /// Wrap a raw service id. The wrapper takes over the release
    /// obligation for `id`.
    pub fn from_raw(engine: Arc<dyn MediaEngine>, id: ServiceId) -> Self {
        Self { engine, id }
    }

    /// Raw id, for binding to an output.
    pub fn id(&self) -> ServiceId {
        self.id
    }
}

impl Drop for StreamService {
    fn drop(&mut self) {
        debug!(id = self.id.0, "Releasing service");
        self.engine.release_service(self.id);
    }
}

/// An engine-native network output.
///
/// The output tracks whether it is transmitting and always stops
/// before release; a running output is never handed back to the
/// engine's release function.
pub struct StreamOutput {
    engine: Arc<dyn MediaEngine>,
    id: OutputId,
    active: bool,
}

impl StreamOutput {
    /// Wrap a raw output id. The wrapper takes over the release
    /// obligation for `id`.
    pub fn from_raw(engine: Arc<dyn MediaEngine>, id: OutputId) -> Self {
        Self {
            engine,
            id,
            active: false,
        }
    }

    /// Attach the video encoder feeding this output.
    pub fn attach_video(&self, encoder: &VideoEncoder) {
        self.engine.set_output_video_encoder(self.id, encoder.id());
    }

    /// Attach an audio encoder feeding this output on `track`.
    pub fn attach_audio(&self, encoder: &AudioEncoder, track: usize) {
        self.engine
            .set_output_audio_encoder(self.id, encoder.id(), track);
    }

    /// Bind the service this output transmits to.
    pub fn bind_service(&self, service: &StreamService) {
        self.engine.set_output_service(self.id, service.id());
    }

    /// Start transmitting. On refusal returns the engine's last-error
    /// string, or "Unknown Error" when the engine reports none.
    pub fn start(&mut self) -> Result<(), String> {
        if self.engine.start_output(self.id) {
            self.active = true;
            Ok(())
        } else {
            Err(self
                .engine
                .output_last_error(self.id)
                .unwrap_or_else(|| "Unknown Error".to_string()))
        }
    }

    /// Stop transmitting. No-op when not active.
    pub fn stop(&mut self) {
        if self.active {
            self.engine.stop_output(self.id);
            self.active = false;
        }
    }

    /// Whether the output is currently transmitting.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for StreamOutput {
    fn drop(&mut self) {
        self.stop();
        debug!(id = self.id.0, "Releasing output");
        self.engine.release_output(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockEngine;

    #[test]
    fn test_encoder_released_once_on_drop() {
        let engine = MockEngine::started();
        let id = engine.create_audio_encoder("ffmpeg_aac", "audio_encoder").unwrap();
        assert_eq!(engine.alive_encoders(), 1);

        let encoder = AudioEncoder::from_raw(engine.clone(), id);
        drop(encoder);
        assert_eq!(engine.alive_encoders(), 0);
    }

    #[test]
    fn test_output_stops_before_release() {
        let engine = MockEngine::started();
        let id = engine.create_output("rtmp_output", "rtmp_stream").unwrap();

        let mut output = StreamOutput::from_raw(engine.clone(), id);
        output.start().unwrap();
        assert!(output.is_active());
        assert!(engine.output_running(id));

        drop(output);
        assert!(!engine.output_running(id));
        assert_eq!(engine.alive_outputs(), 0);
        assert!(!engine.released_while_running(id));
    }

    #[test]
    fn test_output_start_reports_engine_error() {
        let engine = MockEngine::started();
        engine.fail_output_start(Some("connection refused".to_string()));
        let id = engine.create_output("rtmp_output", "rtmp_stream").unwrap();

        let mut output = StreamOutput::from_raw(engine.clone(), id);
        let err = output.start().unwrap_err();
        assert_eq!(err, "connection refused");
        assert!(!output.is_active());
    }

    #[test]
    fn test_output_start_without_engine_reason() {
        let engine = MockEngine::started();
        engine.fail_output_start(None);
        let id = engine.create_output("rtmp_output", "rtmp_stream").unwrap();

        let mut output = StreamOutput::from_raw(engine.clone(), id);
        assert_eq!(output.start().unwrap_err(), "Unknown Error");
    }

    #[test]
    fn test_stop_is_idempotent() {
        let engine = MockEngine::started();
        let id = engine.create_output("rtmp_output", "rtmp_stream").unwrap();

        let mut output = StreamOutput::from_raw(engine.clone(), id);
        output.stop();
        output.stop();
        assert_eq!(engine.stop_calls(id), 0);

        output.start().unwrap();
        output.stop();
        output.stop();
        assert_eq!(engine.stop_calls(id), 1);
    }
}

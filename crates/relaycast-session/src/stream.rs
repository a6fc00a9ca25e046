//! Service descriptor and network output creation.

use serde_json::json;
use tracing::{debug, instrument};

use relaycast_engine::{
    AudioEncoder, EngineRef, MediaEngine, StreamOutput, StreamService, VideoEncoder,
};

use crate::error::SessionError;

/// Engine service kind for RTMP destinations with a known provider.
const SERVICE_KIND: &str = "rtmp_common";

/// Engine-side instance name for the session's service.
const SERVICE_NAME: &str = "twitch_service";

/// Provider field interpreted by the service kind.
const SERVICE_PROVIDER: &str = "Twitch";

/// Engine output kind for RTMP transmission.
const OUTPUT_KIND: &str = "rtmp_output";

/// Engine-side instance name for the session's output.
const OUTPUT_NAME: &str = "rtmp_stream";

/// Logical audio track the audio encoder feeds.
const AUDIO_TRACK: usize = 0;

/// Creates the service/output pair on top of the session's encoders.
pub struct StreamConfigurator {
    engine: EngineRef,
}

impl StreamConfigurator {
    pub fn new(engine: EngineRef) -> Self {
        Self { engine }
    }

    /// Create a service descriptor for the given destination URL and
    /// stream credential. Both are opaque to this layer; the engine's
    /// service settings object is plain JSON.
    #[instrument(skip(self, credential))]
    pub fn create_service(
        &self,
        destination: &str,
        credential: &str,
    ) -> Result<StreamService, SessionError> {
        let settings = json!({
            "service": SERVICE_PROVIDER,
            "server": destination,
            "key": credential,
        });

        let raw = self
            .engine
            .create_service(SERVICE_KIND, SERVICE_NAME, &settings)
            .ok_or(SessionError::ServiceCreation)?;

        debug!(destination, "Service created");
        Ok(StreamService::from_raw(self.engine.clone(), raw))
    }

    /// Create a network output wired to the given encoders (audio on
    /// track 0) and service.
    #[instrument(skip_all)]
    pub fn create_output(
        &self,
        audio_encoder: &AudioEncoder,
        video_encoder: &VideoEncoder,
        service: &StreamService,
    ) -> Result<StreamOutput, SessionError> {
        let raw = self
            .engine
            .create_output(OUTPUT_KIND, OUTPUT_NAME)
            .ok_or(SessionError::OutputCreation)?;

        let output = StreamOutput::from_raw(self.engine.clone(), raw);
        output.attach_video(video_encoder);
        output.attach_audio(audio_encoder, AUDIO_TRACK);
        output.bind_service(service);

        debug!("Output created and wired");
        Ok(output)
    }
}

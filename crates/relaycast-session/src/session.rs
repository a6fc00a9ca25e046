//! The streaming-session lifecycle manager.

use tracing::{debug, info, instrument, warn};

use relaycast_engine::{AudioEncoder, EngineRef, StreamOutput, StreamService, VideoEncoder};

use crate::bootstrap::EngineBootstrap;
use crate::config::SessionConfig;
use crate::context::ContextInitializer;
use crate::encoders::EncoderFactory;
use crate::error::SessionError;
use crate::state::SessionState;
use crate::stream::StreamConfigurator;

/// A live-streaming session over an external multimedia engine.
///
/// Owns the four engine resources exclusively and drives them through
/// the `Uninitialized → Initialized → Configured → Streaming` state
/// machine. Single-threaded: every operation completes on the calling
/// thread, and callers serialize access externally.
pub struct StreamSession {
    // Field order is drop order: the output must go before the
    // service it references, both before the encoders they are wired
    // to, and the engine shuts down only after all of them.
    output: Option<StreamOutput>,
    service: Option<StreamService>,
    audio_encoder: Option<AudioEncoder>,
    video_encoder: Option<VideoEncoder>,
    bootstrap: Option<EngineBootstrap>,
    state: SessionState,
    engine: EngineRef,
}

impl StreamSession {
    /// A session over the given engine. Nothing touches the engine
    /// until [`StreamSession::initialize`].
    pub fn new(engine: EngineRef) -> Self {
        Self {
            output: None,
            service: None,
            audio_encoder: None,
            video_encoder: None,
            bootstrap: None,
            state: SessionState::Uninitialized,
            engine,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Engine version string; `"???"` until the engine has started.
    pub fn version(&self) -> String {
        match &self.bootstrap {
            Some(bootstrap) => bootstrap.version(),
            None => "???".to_string(),
        }
    }

    /// Bring up the engine, the global contexts, the plugin modules
    /// and the two encoders, in that order.
    ///
    /// On a step failure the global contexts already set are left in
    /// place (they are process-wide and cheap to leave configured) and
    /// the started engine stays up, but any encoder created by this
    /// call is released before the error propagates; the session stays
    /// `Uninitialized` and the call may be retried. After a success,
    /// calling this again fails with `AlreadyInitialized`.
    #[instrument(name = "session_initialize", skip(self, config))]
    pub fn initialize(&mut self, config: &SessionConfig) -> Result<(), SessionError> {
        if self.state.is_initialized() {
            return Err(SessionError::AlreadyInitialized);
        }

        info!(
            data_path = %config.data_path.display(),
            module_bin_path = %config.module_bin_path.display(),
            module_data_path = %config.module_data_path.display(),
            "Initializing session"
        );

        // A failed attempt keeps the engine started; don't start twice.
        if self.bootstrap.is_none() {
            self.bootstrap = Some(EngineBootstrap::start(self.engine.clone(), &config.locale)?);
        }

        let contexts = ContextInitializer::new(self.engine.clone());
        contexts.set_data_paths(&config.data_path)?;
        contexts.init_audio(&config.audio)?;
        contexts.init_video(&config.video)?;
        contexts.load_modules(&config.module_bin_path, &config.module_data_path);

        let factory = EncoderFactory::new(self.engine.clone());
        let audio_encoder = factory.create_audio_encoder(&config.audio_encoder_id)?;
        // An error here drops `audio_encoder`, releasing its handle.
        let video_encoder = factory.create_video_encoder(&config.video_encoder_id)?;

        self.audio_encoder = Some(audio_encoder);
        self.video_encoder = Some(video_encoder);
        self.transition_to(SessionState::Initialized);

        info!("Session initialized");
        Ok(())
    }

    /// Install a service/output pair for the given destination and
    /// credential.
    ///
    /// Any previously installed pair is stopped and fully released
    /// first. If output creation fails after the new service was
    /// created, the new service is released and no pair is left
    /// installed (the old pair is not restored); the session falls
    /// back to `Initialized`.
    #[instrument(name = "session_configure", skip(self, credential))]
    pub fn configure_stream(
        &mut self,
        destination: &str,
        credential: &str,
    ) -> Result<(), SessionError> {
        if !self.state.is_initialized() {
            return Err(SessionError::NotInitialized);
        }

        if self.output.is_some() || self.service.is_some() {
            debug!("Replacing existing service/output pair");
            self.release_pair();
        }

        let audio_encoder = self.audio_encoder.as_ref().ok_or(SessionError::NotInitialized)?;
        let video_encoder = self.video_encoder.as_ref().ok_or(SessionError::NotInitialized)?;

        let configurator = StreamConfigurator::new(self.engine.clone());
        let service = configurator.create_service(destination, credential)?;
        // An error here drops `service`, releasing the new descriptor
        // while the session stays unconfigured.
        let output = configurator.create_output(audio_encoder, video_encoder, &service)?;

        self.service = Some(service);
        self.output = Some(output);
        self.transition_to(SessionState::Configured);

        info!(destination, "Stream configured");
        Ok(())
    }

    /// Start transmitting. A no-op when already streaming.
    #[instrument(name = "session_start", skip(self))]
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state.is_streaming() {
            debug!("Already streaming, ignoring start");
            return Ok(());
        }

        let output = self.output.as_mut().ok_or(SessionError::NotInitialized)?;
        output
            .start()
            .map_err(|reason| SessionError::StreamStart { reason })?;

        self.transition_to(SessionState::Streaming);
        info!("Streaming started");
        Ok(())
    }

    /// Stop transmitting. A no-op unless streaming; never fails.
    #[instrument(name = "session_stop", skip(self))]
    pub fn stop(&mut self) {
        if !self.state.is_streaming() {
            debug!("Not streaming, ignoring stop");
            return;
        }

        if let Some(output) = &mut self.output {
            output.stop();
        } else {
            // Streaming implies an installed output.
            warn!("Streaming state with no output");
        }

        self.transition_to(SessionState::Configured);
        info!("Streaming stopped");
    }

    /// Stop and release the current service/output pair.
    fn release_pair(&mut self) {
        if let Some(mut output) = self.output.take() {
            output.stop();
        }
        self.service = None;
        if self.state.is_configured() {
            self.transition_to(SessionState::Initialized);
        }
    }

    fn transition_to(&mut self, new_state: SessionState) {
        debug!(
            previous = self.state.name(),
            current = new_state.name(),
            "State transition"
        );
        self.state = new_state;
    }
}

// Teardown is the reverse of setup and entirely drop-driven: the
// output stops itself and is released first, then the service, the
// encoders, and finally the engine. None of it can fail.

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::path::PathBuf;
    use std::sync::Arc;

    use relaycast_engine::MockEngine;

    fn init_test_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "relaycast_session=debug".into()),
            )
            .with_test_writer()
            .try_init();
    }

    fn test_config() -> SessionConfig {
        // The data path must exist (set_data_paths chdirs into it).
        SessionConfig::with_paths(env::temp_dir(), "/opt/engine/modules/bin", "/opt/engine/modules/data")
    }

    fn initialized_session() -> (Arc<MockEngine>, StreamSession) {
        init_test_logging();
        let engine = MockEngine::new();
        let mut session = StreamSession::new(engine.clone());
        session.initialize(&test_config()).unwrap();
        (engine, session)
    }

    #[test]
    fn test_initialize_runs_steps_in_dependency_order() {
        let (engine, session) = initialized_session();
        assert_eq!(session.state(), SessionState::Initialized);
        assert_eq!(
            engine.call_log(),
            vec![
                "startup",
                "add_data_path",
                "reset_audio",
                "reset_video",
                "add_module_path",
                "load_all_modules",
                "post_load_modules",
                "create_audio_encoder",
                "bind_audio_encoder",
                "create_video_encoder",
                "bind_video_encoder",
            ]
        );
        assert_eq!(engine.alive_encoders(), 2);
        assert!(engine.modules_loaded());
        assert_eq!(engine.post_load_calls(), 1);
    }

    #[test]
    fn test_initialize_records_configured_contexts() {
        let (engine, _session) = initialized_session();
        let audio = engine.audio_info().unwrap();
        assert_eq!(audio.samples_per_sec, 44100);
        let video = engine.video_info().unwrap();
        assert_eq!((video.base_width, video.base_height), (1280, 720));
        assert_eq!((video.output_width, video.output_height), (1280, 720));
        assert_eq!((video.fps_num, video.fps_den), (60, 1));
        assert_eq!(video.graphics_module, "libobs-d3d11");
    }

    #[test]
    fn test_initialize_changes_working_directory() {
        let (_engine, _session) = initialized_session();
        assert_eq!(
            env::current_dir().unwrap().canonicalize().unwrap(),
            env::temp_dir().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_second_initialize_fails_and_keeps_encoders() {
        let (engine, mut session) = initialized_session();
        let err = session.initialize(&test_config()).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyInitialized));
        assert_eq!(session.state(), SessionState::Initialized);
        assert_eq!(engine.alive_encoders(), 2);
        assert_eq!(engine.encoders_created(), 2);
        assert_eq!(engine.startup_calls(), 1);
    }

    #[test]
    fn test_engine_startup_failure() {
        init_test_logging();
        let engine = MockEngine::new();
        engine.fail_startup();
        let mut session = StreamSession::new(engine.clone());

        let err = session.initialize(&test_config()).unwrap_err();
        assert!(matches!(err, SessionError::EngineStartup(_)));
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert_eq!(session.version(), "???");
        assert!(!engine.is_started());
    }

    #[test]
    fn test_bad_data_path_fails_before_engine_calls() {
        init_test_logging();
        let engine = MockEngine::new();
        let mut session = StreamSession::new(engine.clone());
        let mut config = test_config();
        config.data_path = PathBuf::from("/nonexistent/engine/data");

        let err = session.initialize(&config).unwrap_err();
        assert!(matches!(err, SessionError::PathConfig { .. }));
        // Engine is up, but no path was registered and nothing else ran.
        assert!(engine.is_started());
        assert!(engine.data_paths().is_empty());
        assert!(engine.audio_info().is_none());
    }

    #[test]
    fn test_audio_context_failure_leaves_engine_started() {
        init_test_logging();
        let engine = MockEngine::new();
        engine.set_audio_status(-4);
        let mut session = StreamSession::new(engine.clone());

        let err = session.initialize(&test_config()).unwrap_err();
        assert!(matches!(err, SessionError::AudioContext { status: -4 }));
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert!(engine.is_started());
        assert_eq!(engine.shutdown_calls(), 0);
        assert_eq!(engine.encoders_created(), 0);
    }

    #[test]
    fn test_video_context_failure_carries_status() {
        init_test_logging();
        let engine = MockEngine::new();
        engine.set_video_status(7);
        let mut session = StreamSession::new(engine.clone());

        let err = session.initialize(&test_config()).unwrap_err();
        assert!(matches!(err, SessionError::VideoContext { status: 7 }));
        assert_eq!(engine.encoders_created(), 0);
    }

    #[test]
    fn test_video_encoder_failure_releases_audio_encoder() {
        init_test_logging();
        let engine = MockEngine::new();
        engine.fail_encoder("obs_x264");
        let mut session = StreamSession::new(engine.clone());

        let err = session.initialize(&test_config()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::EncoderCreation { kind: "video", .. }
        ));
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert_eq!(engine.encoders_created(), 1);
        assert_eq!(engine.alive_encoders(), 0);

        // Retry succeeds without a second engine startup.
        engine.clear_encoder_failures();
        session.initialize(&test_config()).unwrap();
        assert_eq!(session.state(), SessionState::Initialized);
        assert_eq!(engine.startup_calls(), 1);
        assert_eq!(engine.alive_encoders(), 2);
    }

    #[test]
    fn test_configure_before_initialize_creates_nothing() {
        init_test_logging();
        let engine = MockEngine::new();
        let mut session = StreamSession::new(engine.clone());

        let err = session.configure_stream("rtmp://x", "key1").unwrap_err();
        assert!(matches!(err, SessionError::NotInitialized));
        assert_eq!(engine.services_created(), 0);
        assert_eq!(engine.outputs_created(), 0);
    }

    #[test]
    fn test_configure_wires_output_to_encoders_and_service() {
        let (engine, mut session) = initialized_session();
        session.configure_stream("rtmp://x", "key1").unwrap();
        assert_eq!(session.state(), SessionState::Configured);

        let output = engine.last_output().unwrap();
        let service = engine.last_service().unwrap();
        let video = engine.output_video_encoder(output).unwrap();
        let audio = engine.output_audio_encoder(output, 0).unwrap();
        assert!(engine.video_bound(video));
        assert!(engine.audio_bound(audio));
        assert_eq!(engine.output_bound_service(output), Some(service));

        let settings = engine.service_settings(service).unwrap();
        assert_eq!(settings["server"], "rtmp://x");
        assert_eq!(settings["key"], "key1");
        assert_eq!(settings["service"], "Twitch");
    }

    #[test]
    fn test_reconfigure_releases_previous_pair_first() {
        let (engine, mut session) = initialized_session();
        session.configure_stream("rtmp://x", "key1").unwrap();
        let first_output = engine.last_output().unwrap();

        session.configure_stream("rtmp://y", "key2").unwrap();
        assert_eq!(engine.services_created(), 2);
        assert_eq!(engine.outputs_created(), 2);
        assert_eq!(engine.alive_services(), 1);
        assert_eq!(engine.alive_outputs(), 1);
        assert_ne!(engine.last_output().unwrap(), first_output);
        assert!(!engine.double_released());

        let settings = engine.service_settings(engine.last_service().unwrap()).unwrap();
        assert_eq!(settings["server"], "rtmp://y");
        assert_eq!(settings["key"], "key2");
    }

    #[test]
    fn test_reconfigure_while_streaming_stops_old_output() {
        let (engine, mut session) = initialized_session();
        session.configure_stream("rtmp://x", "key1").unwrap();
        session.start().unwrap();
        let first_output = engine.last_output().unwrap();

        session.configure_stream("rtmp://y", "key2").unwrap();
        assert_eq!(session.state(), SessionState::Configured);
        assert_eq!(engine.stop_calls(first_output), 1);
        assert!(!engine.released_while_running(first_output));
    }

    #[test]
    fn test_output_failure_releases_new_service() {
        let (engine, mut session) = initialized_session();
        session.configure_stream("rtmp://x", "key1").unwrap();

        engine.fail_output_create();
        let err = session.configure_stream("rtmp://y", "key2").unwrap_err();
        assert!(matches!(err, SessionError::OutputCreation));

        // Fail-forward: neither the new service nor the old pair is
        // left installed.
        assert_eq!(engine.alive_services(), 0);
        assert_eq!(engine.alive_outputs(), 0);
        assert_eq!(session.state(), SessionState::Initialized);
        assert!(matches!(
            session.start().unwrap_err(),
            SessionError::NotInitialized
        ));

        // A later configure recovers.
        engine.clear_output_create_failure();
        session.configure_stream("rtmp://z", "key3").unwrap();
        assert_eq!(session.state(), SessionState::Configured);
    }

    #[test]
    fn test_service_failure_leaves_session_unconfigured() {
        let (engine, mut session) = initialized_session();
        engine.fail_service_create();

        let err = session.configure_stream("rtmp://x", "key1").unwrap_err();
        assert!(matches!(err, SessionError::ServiceCreation));
        assert_eq!(session.state(), SessionState::Initialized);
        assert_eq!(engine.alive_services(), 0);
        assert_eq!(engine.alive_outputs(), 0);
    }

    #[test]
    fn test_start_without_configure_makes_no_engine_call() {
        let (engine, mut session) = initialized_session();
        let err = session.start().unwrap_err();
        assert!(matches!(err, SessionError::NotInitialized));
        assert!(!engine.call_log().contains(&"start_output"));
    }

    #[test]
    fn test_start_is_idempotent_while_streaming() {
        let (engine, mut session) = initialized_session();
        session.configure_stream("rtmp://x", "key1").unwrap();
        session.start().unwrap();
        session.start().unwrap();
        assert_eq!(session.state(), SessionState::Streaming);
        assert_eq!(engine.start_calls(engine.last_output().unwrap()), 1);
    }

    #[test]
    fn test_start_failure_stays_configured_and_is_retryable() {
        let (engine, mut session) = initialized_session();
        session.configure_stream("rtmp://x", "key1").unwrap();
        engine.fail_output_start(Some("connection refused".to_string()));

        match session.start().unwrap_err() {
            SessionError::StreamStart { reason } => assert_eq!(reason, "connection refused"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(session.state(), SessionState::Configured);

        // Reconfiguring and retrying works once the engine cooperates.
        let engine2 = MockEngine::new();
        let mut session2 = StreamSession::new(engine2.clone());
        session2.initialize(&test_config()).unwrap();
        session2.configure_stream("rtmp://x", "key1").unwrap();
        session2.start().unwrap();
        assert_eq!(session2.state(), SessionState::Streaming);
    }

    #[test]
    fn test_start_failure_without_reason_reports_unknown_error() {
        let (engine, mut session) = initialized_session();
        session.configure_stream("rtmp://x", "key1").unwrap();
        engine.fail_output_start(None);

        match session.start().unwrap_err() {
            SessionError::StreamStart { reason } => assert_eq!(reason, "Unknown Error"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_stop_is_noop_unless_streaming() {
        let (engine, mut session) = initialized_session();
        session.stop();
        assert_eq!(session.state(), SessionState::Initialized);

        session.configure_stream("rtmp://x", "key1").unwrap();
        session.stop();
        assert_eq!(session.state(), SessionState::Configured);
        assert_eq!(engine.stop_calls(engine.last_output().unwrap()), 0);

        session.start().unwrap();
        session.stop();
        session.stop();
        assert_eq!(session.state(), SessionState::Configured);
        assert_eq!(engine.stop_calls(engine.last_output().unwrap()), 1);
    }

    #[test]
    fn test_full_lifecycle_scenario() {
        let (engine, mut session) = initialized_session();

        session.configure_stream("rtmp://x", "key1").unwrap();
        session.start().unwrap();
        assert_eq!(session.state(), SessionState::Streaming);
        assert!(engine.output_running(engine.last_output().unwrap()));

        session.stop();
        assert_eq!(session.state(), SessionState::Configured);

        session.configure_stream("rtmp://y", "key2").unwrap();
        assert_eq!(session.state(), SessionState::Configured);
        assert_eq!(engine.alive_services(), 1);
        assert_eq!(engine.alive_outputs(), 1);
        assert_eq!(engine.services_created(), 2);

        session.start().unwrap();
        assert_eq!(session.state(), SessionState::Streaming);
    }

    #[test]
    fn test_version_sentinel_before_and_after_initialize() {
        init_test_logging();
        let engine = MockEngine::new();
        let mut session = StreamSession::new(engine.clone());
        assert_eq!(session.version(), "???");

        session.initialize(&test_config()).unwrap();
        assert_eq!(session.version(), "31.0.0-mock");
    }

    #[test]
    fn test_drop_tears_down_in_reverse_dependency_order() {
        let (engine, mut session) = initialized_session();
        session.configure_stream("rtmp://x", "key1").unwrap();
        session.start().unwrap();
        let output = engine.last_output().unwrap();

        drop(session);

        assert_eq!(engine.alive_outputs(), 0);
        assert_eq!(engine.alive_services(), 0);
        assert_eq!(engine.alive_encoders(), 0);
        assert_eq!(engine.shutdown_calls(), 1);
        assert!(!engine.double_released());
        assert!(!engine.released_while_running(output));

        let log = engine.call_log();
        let pos = |name: &str| log.iter().rposition(|c| *c == name).unwrap();
        assert!(pos("stop_output") < pos("release_output"));
        assert!(pos("release_output") < pos("release_service"));
        assert!(pos("release_service") < pos("release_encoder"));
        assert!(pos("release_encoder") < pos("shutdown"));
    }
}

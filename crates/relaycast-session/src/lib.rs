//! Streaming-session lifecycle manager.
//!
//! Drives a live audio/video streaming session over an external
//! multimedia engine: ordered initialization of the engine's global
//! audio/video contexts and plugin modules, creation of the session's
//! encoder pair, repeatable service/output configuration, and the
//! idempotent start/stop state machine. The engine itself is consumed
//! only through [`relaycast_engine::MediaEngine`]; host bindings sit
//! on top of [`StreamerApi`].

mod api;
mod bootstrap;
mod config;
mod context;
mod encoders;
mod error;
mod session;
mod state;
mod stream;

pub use api::StreamerApi;
pub use bootstrap::EngineBootstrap;
pub use config::{
    AudioSettings, SessionConfig, VideoSettings, DEFAULT_AUDIO_ENCODER_ID,
    DEFAULT_GRAPHICS_MODULE, DEFAULT_VIDEO_ENCODER_ID,
};
pub use context::ContextInitializer;
pub use encoders::EncoderFactory;
pub use error::SessionError;
pub use session::StreamSession;
pub use state::SessionState;
pub use stream::StreamConfigurator;

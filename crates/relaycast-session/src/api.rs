//! Host-facing facade.
//!
//! Host bindings marshal arguments and expect a plain success/failure
//! signal; no structured error crosses this boundary. Every failure is
//! logged here as a diagnostic before being flattened to `false`.

use tracing::{error, info};

use relaycast_engine::EngineRef;

use crate::config::SessionConfig;
use crate::session::StreamSession;

/// The five host operations over a [`StreamSession`].
pub struct StreamerApi {
    session: StreamSession,
}

impl StreamerApi {
    pub fn new(engine: EngineRef) -> Self {
        Self {
            session: StreamSession::new(engine),
        }
    }

    /// Module + engine version string. The engine part is the `"???"`
    /// sentinel until the engine has started; this never fails.
    pub fn version(&self) -> String {
        format!(
            "{} v{} - engine v{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            self.session.version()
        )
    }

    /// Initialize the session. Returns false on failure.
    pub fn initialize(&mut self, config: &SessionConfig) -> bool {
        match self.session.initialize(config) {
            Ok(()) => true,
            Err(e) => {
                error!("{e}");
                false
            }
        }
    }

    /// Configure the stream destination. Returns false on failure.
    pub fn configure_stream(&mut self, destination: &str, credential: &str) -> bool {
        match self.session.configure_stream(destination, credential) {
            Ok(()) => true,
            Err(e) => {
                error!("{e}");
                false
            }
        }
    }

    /// Start streaming. Returns false on failure.
    pub fn start(&mut self) -> bool {
        match self.session.start() {
            Ok(()) => true,
            Err(e) => {
                error!("{e}");
                false
            }
        }
    }

    /// Stop streaming. Never fails.
    pub fn stop(&mut self) -> bool {
        self.session.stop();
        info!("Stop requested");
        true
    }

    /// The session behind the facade.
    pub fn session(&self) -> &StreamSession {
        &self.session
    }
}

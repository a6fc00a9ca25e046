//! Process-wide engine startup and teardown.

use tracing::{debug, info};

use relaycast_engine::{EngineRef, MediaEngine};

use crate::error::SessionError;

/// Owns the started engine runtime.
///
/// Constructed only by a successful [`EngineBootstrap::start`];
/// dropped last, after every dependent handle, which makes drop the
/// single shutdown path. Shutdown is best-effort and silent.
pub struct EngineBootstrap {
    engine: EngineRef,
}

impl EngineBootstrap {
    /// Bring the engine up with the given locale.
    pub fn start(engine: EngineRef, locale: &str) -> Result<Self, SessionError> {
        if !engine.startup(locale) {
            return Err(SessionError::EngineStartup(format!(
                "engine refused to start (locale '{locale}')"
            )));
        }
        info!(locale, "Engine started");
        Ok(Self { engine })
    }

    /// Engine version string, or the `"???"` sentinel when
    /// unavailable.
    pub fn version(&self) -> String {
        self.engine
            .version_string()
            .unwrap_or_else(|| "???".to_string())
    }
}

impl Drop for EngineBootstrap {
    fn drop(&mut self) {
        debug!("Shutting down engine");
        self.engine.shutdown();
    }
}

//! Session state machine types.

use serde::{Deserialize, Serialize};

/// The lifecycle state of a streaming session.
///
/// Transitions: `Uninitialized → Initialized` via `initialize()`,
/// `→ Configured` via `configure_stream()`, `Configured ↔ Streaming`
/// via `start()`/`stop()`. `Configured` is reachable again from
/// `Streaming` because `configure_stream()` auto-stops first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Engine contexts and encoders not yet set up.
    #[default]
    Uninitialized,

    /// Contexts set, modules loaded, both encoders alive.
    Initialized,

    /// A service/output pair is installed and ready to start.
    Configured,

    /// The output is transmitting.
    Streaming,
}

impl SessionState {
    /// Returns true if `initialize()` has completed.
    pub fn is_initialized(self) -> bool {
        !matches!(self, Self::Uninitialized)
    }

    /// Returns true if a service/output pair is installed.
    pub fn is_configured(self) -> bool {
        matches!(self, Self::Configured | Self::Streaming)
    }

    /// Returns true if the output is transmitting.
    pub fn is_streaming(self) -> bool {
        matches!(self, Self::Streaming)
    }

    /// Returns a simple string representation of the state.
    pub fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Initialized => "Initialized",
            Self::Configured => "Configured",
            Self::Streaming => "Streaming",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(!SessionState::Uninitialized.is_initialized());
        assert!(SessionState::Initialized.is_initialized());
        assert!(!SessionState::Initialized.is_configured());
        assert!(SessionState::Configured.is_configured());
        assert!(SessionState::Streaming.is_configured());
        assert!(SessionState::Streaming.is_streaming());
        assert!(!SessionState::Configured.is_streaming());
    }

    #[test]
    fn test_state_names() {
        assert_eq!(SessionState::default().name(), "Uninitialized");
        assert_eq!(SessionState::Streaming.name(), "Streaming");
    }
}

// ── Core error types ──
//
// Errors surfaced by site setup and the integration registry. Request
// failures during steady-state polling never reach this type: the
// coordinator records them on `EndpointState` instead.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Setup errors ─────────────────────────────────────────────────
    /// The startup poll failed; the host should retry setup later.
    #[error("Site '{site}' is not ready: {source}")]
    NotReady {
        site: String,
        #[source]
        source: solax_api::Error,
    },

    #[error("Site '{unique_id}' is already configured")]
    AlreadyConfigured { unique_id: String },

    #[error("Site not found: {name}")]
    SiteNotFound { name: String },

    #[error("Coordinator for '{site}' has already been shut down")]
    CoordinatorClosed { site: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── API errors ───────────────────────────────────────────────────
    #[error(transparent)]
    Api(#[from] solax_api::Error),
}

impl CoreError {
    /// Whether the host should schedule another setup attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotReady { .. })
    }
}

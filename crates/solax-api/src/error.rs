use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `solax-api` crate.
///
/// Every failure of a single fetch collapses into this enum. Only
/// [`Timeout`](Self::Timeout) is produced after retrying; all other variants
/// are returned on the first attempt that hits them. `solax-core` decides
/// whether a failure is fatal (startup) or merely makes data stale.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Every attempt timed out.
    #[error("Request timed out after {attempts} attempt(s) of {timeout:?} each")]
    Timeout { attempts: u32, timeout: Duration },

    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success HTTP status.
    #[error("SolaX endpoint returned HTTP {status}")]
    Status { status: u16 },

    /// URL construction failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The underlying `reqwest::Client` could not be built.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Data ────────────────────────────────────────────────────────
    /// The body was not JSON, with the raw body for debugging.
    #[error("Received non-JSON data from SolaX: {message}")]
    MalformedPayload { message: String, body: String },

    /// The body was JSON but did not have the expected shape.
    #[error("Received unexpected JSON from SolaX: {0}")]
    Schema(#[from] SchemaError),
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// Only timeouts qualify: a bad payload or an unreachable host will not
    /// fix itself within one poll.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` for failures reaching the endpoint at all.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Status { .. } | Self::InvalidUrl(_) | Self::ClientBuild(_)
        )
    }
}

/// A response failed validation. One variant per cause; `path` is a
/// dotted/indexed location such as `data[0].batList[0].dataDict[3].value`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("missing required field `{path}`")]
    Missing { path: String },

    #[error("`{path}` should be {expected}")]
    WrongType { path: String, expected: &'static str },

    #[error("`{path}` must not be empty")]
    Empty { path: String },

    #[error("`{path}` is not a number: {value}")]
    NotNumeric { path: String, value: String },

    #[error("`{path}` should have {expected} entries, found {actual}")]
    WrongLength {
        path: String,
        expected: usize,
        actual: usize,
    },
}

impl SchemaError {
    /// Location in the document where validation failed.
    pub fn path(&self) -> &str {
        match self {
            Self::Missing { path }
            | Self::WrongType { path, .. }
            | Self::Empty { path }
            | Self::NotNumeric { path, .. }
            | Self::WrongLength { path, .. } => path,
        }
    }
}

use polars::error::PolarsError;
use thiserror::Error;

/// Result alias for the public API.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by lookups, downloads and dataset loading.
///
/// The type is `Clone` so a single failed download can be handed to every
/// caller that was waiting on it.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The address tokenizer could not make sense of the input.
    #[error("failed to parse {address:?}: {reason}")]
    Parse { address: String, reason: String },

    /// No usable state could be determined from the address.
    #[error("could not determine a state for {0:?}")]
    NoState(String),

    /// No address range segment matched the street and house number.
    #[error("no address range matched {0:?}")]
    NoMatch(String),

    /// Geocoded coordinates fall outside every loaded census block.
    #[error("no census block contains ({lat}, {lon})")]
    NoBlock { lat: f64, lon: f64 },

    /// A GEOID failed structural validation.
    #[error("invalid GEOID {geoid:?}: {reason}")]
    InvalidGeoid { geoid: String, reason: String },

    /// Remote fetch failed. `status` is 0 for connection-level failures.
    #[error("download failed for {url} (status {status}): {message}")]
    Download { url: String, status: u16, message: String },

    /// Data is missing locally and automatic download is turned off.
    #[error("{kind} data for {key} is not available locally (auto-download disabled)")]
    DataNotAvailable { kind: String, key: String },

    /// A state, variable group or level name was not recognized.
    #[error("unknown {what}: {name}. Valid values: {valid}")]
    UnknownKey { what: &'static str, name: String, valid: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O, codec or query-engine failure.
    #[error("{0}")]
    Data(String),
}

impl Error {
    /// HTTP status of a failed download, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Download { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn download(url: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Error::Download { url: url.into(), status, message: message.into() }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        // Typed errors raised inside anyhow-based helpers keep their variant.
        match err.downcast::<Error>() {
            Ok(inner) => inner,
            Err(err) => Error::Data(format!("{err:#}")),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self { Error::Data(format!("I/O error: {err}")) }
}

impl From<PolarsError> for Error {
    fn from(err: PolarsError) -> Self { Error::Data(format!("query error: {err}")) }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self { Error::Data(format!("JSON error: {err}")) }
}

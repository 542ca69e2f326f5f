//! Error kinds per the error handling design (§7).
//!
//! `ConfigError` and `InvariantError` are the only two kinds that ever
//! terminate a run; everything else (`TransferDenied`, `TransferFailed`,
//! `CacheFull`) is a normal, recoverable flow-control outcome represented
//! by plain return-value enums elsewhere (`RcvResult`, `UnicastResult`,
//! `AdmitResult`, ...), never by `Result`.

use std::fmt;

/// Malformed or missing scenario configuration. Reported before a
/// simulation starts; never produced mid-run.
#[derive(Debug, Clone)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(String),
    Io(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(field) => write!(f, "missing required config field: {field}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
            ConfigError::Io(msg) => write!(f, "failed to read config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// An internal contract was violated: a connection missing an endpoint,
/// a reception id that should exist but doesn't, time moving backward,
/// eviction of a pinned message. These indicate a bug in the engine or
/// its caller, not a runtime condition to recover from.
#[derive(Debug, Clone)]
pub struct InvariantError(pub String);

impl InvariantError {
    pub fn new(msg: impl Into<String>) -> Self {
        InvariantError(msg.into())
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invariant violated: {}", self.0)
    }
}

impl std::error::Error for InvariantError {}

/// Panics with an `InvariantError`-shaped message. Used at the handful of
/// call sites where §7 says the only correct response is to abort with
/// context (connection endpoint lookup, reception id lookup, clock
/// regression, eviction of a pinned message).
#[track_caller]
pub fn invariant_fail(msg: impl Into<String>) -> ! {
    panic!("{}", InvariantError::new(msg));
}

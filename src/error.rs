//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ProbeError: Failures while querying an upstream source
//! - ConfigError: Malformed or unusable target descriptors
//! - FatalError: Conditions that abort the run before any target is processed
//!
//! Update-action failures are not an error type: they are ordinary
//! ActionOutcome records in the run report.
//!
//! Everything below FatalError is recovered at the target boundary and
//! recorded in the run report; only FatalError stops the run.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while querying one upstream source for the latest version.
///
/// A probe failure is a normal per-target outcome, never a panic: the
/// decision engine turns it into a PROBE_FAILED decision and the run
/// continues with the next target. Timeouts surface as `Network`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// Transport-level failure (connection refused, DNS, timeout)
    #[error("network error while querying {src} for '{subject}': {message}")]
    Network {
        subject: String,
        src: String,
        message: String,
    },

    /// The source answered but the payload could not be interpreted
    #[error("could not parse {src} response for '{subject}': {message}")]
    Parse {
        subject: String,
        src: String,
        message: String,
    },

    /// The subject is unknown to the source
    #[error("'{subject}' not found in {src}")]
    NotFound { subject: String, src: String },

    /// The source refused the query due to rate limiting
    #[error("rate limited by {src}")]
    RateLimited { src: String },
}

impl ProbeError {
    /// Creates a new Network error
    pub fn network(
        subject: impl Into<String>,
        source: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ProbeError::Network {
            subject: subject.into(),
            src: source.into(),
            message: message.into(),
        }
    }

    /// Creates a new Parse error
    pub fn parse(
        subject: impl Into<String>,
        source: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ProbeError::Parse {
            subject: subject.into(),
            src: source.into(),
            message: message.into(),
        }
    }

    /// Creates a new NotFound error
    pub fn not_found(subject: impl Into<String>, source: impl Into<String>) -> Self {
        ProbeError::NotFound {
            subject: subject.into(),
            src: source.into(),
        }
    }

    /// Creates a new RateLimited error
    pub fn rate_limited(source: impl Into<String>) -> Self {
        ProbeError::RateLimited {
            src: source.into(),
        }
    }

    /// Short machine-readable kind tag used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Network { .. } => "network",
            ProbeError::Parse { .. } => "parse",
            ProbeError::NotFound { .. } => "not-found",
            ProbeError::RateLimited { .. } => "rate-limited",
        }
    }

    /// The source name this error originated from
    pub fn source_name(&self) -> &str {
        match self {
            ProbeError::Network { src, .. }
            | ProbeError::Parse { src, .. }
            | ProbeError::NotFound { src, .. }
            | ProbeError::RateLimited { src } => src,
        }
    }
}

/// Errors related to target descriptor configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a descriptor file
    #[error("failed to read descriptor {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax error in a descriptor
    #[error("failed to parse descriptor {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// Descriptor parsed but is not a usable target
    #[error("invalid target descriptor: {message}")]
    InvalidDescriptor { message: String },

    /// Descriptor references a source kind no probe is registered for
    #[error("unknown source kind '{kind}'")]
    UnknownSourceKind { kind: String },

    /// Descriptor is missing a parameter its source kind requires
    #[error("source kind '{kind}' requires parameter '{param}'")]
    MissingParameter { kind: String, param: String },
}

impl ConfigError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new ParseError
    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ConfigError::ParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidDescriptor error
    pub fn invalid(message: impl Into<String>) -> Self {
        ConfigError::InvalidDescriptor {
            message: message.into(),
        }
    }

    /// Creates a new MissingParameter error
    pub fn missing_parameter(kind: impl Into<String>, param: impl Into<String>) -> Self {
        ConfigError::MissingParameter {
            kind: kind.into(),
            param: param.into(),
        }
    }
}

/// Conditions that abort the whole run before any target is processed
#[derive(Error, Debug)]
pub enum FatalError {
    /// The targets directory does not exist or is not a directory
    #[error("targets directory not found: {path}")]
    TargetsDirMissing { path: PathBuf },

    /// A target requires root and the process is not privileged
    #[error("insufficient privilege: {detail}")]
    InsufficientPrivilege { detail: String },

    /// A tool the run cannot proceed without is absent
    #[error("required dependency '{name}' is not available")]
    MissingDependency { name: String },
}

impl FatalError {
    /// Process exit code for this fatal condition.
    ///
    /// 1 general, 2 insufficient privilege, 5 integrity (a core
    /// dependency the run cannot do without is absent).
    pub fn exit_code(&self) -> u8 {
        match self {
            FatalError::TargetsDirMissing { .. } => 1,
            FatalError::InsufficientPrivilege { .. } => 2,
            FatalError::MissingDependency { .. } => 5,
        }
    }
}

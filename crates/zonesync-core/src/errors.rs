//! Error types shared across the reconciliation core and its providers

use thiserror::Error;

/// Errors produced while translating, planning, or applying zone changes
#[derive(Error, Debug)]
pub enum DnsError {
    /// The provider account has no zone for this domain. Expected for
    /// brand-new zones; callers route it to `ensure_zone_exists`.
    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    #[error("Unsupported record type: {0}")]
    UnsupportedRecordType(String),

    /// The existing-state snapshot names a key the native listing does not
    /// contain. Indicates the snapshot disagrees with itself.
    #[error("No record set found to delete: {fqdn} ({record_type})")]
    NoMatchingRecordSet { fqdn: String, record_type: String },

    /// Records grouped under one key must agree on TTL, since the native
    /// set stores a single TTL.
    #[error("Records for {key} disagree on TTL: {first} vs {second}")]
    TtlMismatch { key: String, first: u32, second: u32 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No provider registered under: {0}")]
    UnknownProvider(String),

    /// Execution stopped at the correction with this index; everything
    /// before it was applied, everything after it was not attempted.
    #[error("Correction {index} failed ({message}): {source}")]
    CorrectionFailed {
        index: usize,
        message: String,
        #[source]
        source: Box<DnsError>,
    },

    #[error("Operation cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the workspace
pub type Result<T> = std::result::Result<T, DnsError>;

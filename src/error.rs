//! Error types for telemetry decoding and lap analysis.
//!
//! All errors implement the `std::error::Error` trait and carry structured
//! context. Every error is terminal for the call that raised it: nothing in
//! this crate retries internally, and no stage returns partial results on
//! failure. The caller may re-invoke the full operation after a corrective
//! action (for example, selecting a different file).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry decoding and analysis.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Telemetry file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Read of {length} bytes at offset {offset} exceeds source size {size}")]
    OutOfRange { offset: u64, length: u64, size: u64 },

    #[error("Malformed header: {details}")]
    MalformedHeader { details: String },

    #[error("Unknown telemetry channel '{channel}'")]
    UnknownChannel { channel: String },

    #[error("No usable laps after filtering ({rows_seen} rows examined)")]
    NoUsableLaps { rows_seen: usize },

    #[error("Insufficient lap data for track map: {details}")]
    InsufficientLapData { details: String },

    #[error("Track map mesh is empty: only {surviving} samples survived interpolation")]
    EmptyMesh { surviving: usize },

    #[error("Invalid track map document: {reason}")]
    InvalidTrackMapDocument { reason: String },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Type conversion error: {details}")]
    TypeConversion { details: String },

    #[error("Decode cancelled after {processed_records} records")]
    Cancelled { processed_records: u64 },
}

impl TelemetryError {
    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        TelemetryError::File { path, source }
    }

    /// Helper constructor for parse errors.
    pub fn parse(context: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for malformed-header errors.
    pub fn malformed_header(details: impl Into<String>) -> Self {
        TelemetryError::MalformedHeader { details: details.into() }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_traits_validation() {
        // Compile-time check: TelemetryError must be Send + Sync + 'static
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<TelemetryError>();

        let error = TelemetryError::malformed_header("test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn error_messages_carry_context() {
        let err = TelemetryError::OutOfRange { offset: 100, length: 50, size: 120 };
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
        assert!(msg.contains("120"));

        let err = TelemetryError::UnknownChannel { channel: "SpeedX".to_string() };
        assert!(err.to_string().contains("SpeedX"));

        let err = TelemetryError::parse("header", "truncated");
        assert!(err.to_string().contains("header"));
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn from_io_error_maps_to_file_variant() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: TelemetryError = io_err.into();
        assert!(matches!(err, TelemetryError::File { .. }));
    }
}

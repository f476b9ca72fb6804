//! Session metadata parsing.
//!
//! The metadata section of a disk telemetry file is a YAML-like structured
//! text document carrying track, session, result, driver, and sector
//! boundary information. The simulator emits it with unescaped free-text
//! values and stray control characters, so parsing runs a cleaning pass
//! first (see [`crate::yaml_utils`]) and then deserializes into typed
//! structs where every leaf field is optional.
//!
//! Tolerance contract: a missing or unmatched key yields an absent optional
//! field, never an error. Only a document that fails to parse at all (not
//! text, not YAML-shaped) is rejected.

use crate::yaml_utils::{extract_metadata_text, preprocess_metadata_yaml};
use crate::{Result, TelemetryError};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod drivers;
pub mod sessions;
pub mod timing;
pub mod weekend;

pub use drivers::{DriverEntry, DriverRoster};
pub use sessions::{ResultPosition, SessionEntry, SessionList};
pub use timing::{RawSector, SectorBoundary, SplitTimeInfo, normalize_sector_boundaries};
pub use weekend::WeekendInfo;

/// Parsed session metadata document.
///
/// Parsed once per opened source and immutable thereafter.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct SessionMetadata {
    pub weekend_info: Option<WeekendInfo>,
    pub session_info: Option<SessionList>,
    pub split_time_info: Option<SplitTimeInfo>,
    pub driver_info: Option<DriverRoster>,
}

impl SessionMetadata {
    /// Parse the metadata document from its raw byte span.
    pub fn parse_bytes(span: &[u8]) -> Result<Self> {
        Self::parse(&extract_metadata_text(span))
    }

    /// Parse the metadata document from text.
    pub fn parse(text: &str) -> Result<Self> {
        let cleaned = preprocess_metadata_yaml(text)?;
        let metadata: SessionMetadata =
            serde_yaml_ng::from_str(&cleaned).map_err(|e| TelemetryError::Parse {
                context: "Session metadata deserialization".to_string(),
                details: format!("YAML parsing failed: {}", e),
            })?;

        debug!(
            track = metadata
                .weekend_info
                .as_ref()
                .and_then(|w| w.display_name())
                .unwrap_or("<unknown>"),
            sessions = metadata.session_info.as_ref().map(|s| s.sessions.len()).unwrap_or(0),
            "Parsed session metadata"
        );

        Ok(metadata)
    }

    /// Normalized sector boundary list.
    ///
    /// Always starts at 0% and ends at 100%, synthesizing the endpoints when
    /// the document omits them.
    pub fn sector_boundaries(&self) -> Vec<SectorBoundary> {
        let raw = self
            .split_time_info
            .as_ref()
            .and_then(|info| info.sectors.as_deref())
            .unwrap_or_default();
        normalize_sector_boundaries(raw)
    }

    /// Car index of the recording driver, when the roster names one.
    pub fn driver_car_index(&self) -> Option<i32> {
        self.driver_info.as_ref().and_then(|info| info.driver_car_idx)
    }
}

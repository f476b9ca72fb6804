//! Track-boundary mesh synthesis from two edge laps.
//!
//! Two reference laps driven along the left and right edges of the track
//! give, after resampling at a common set of lap distances, a left/right
//! boundary mesh suitable for rendering a track map. Synthesis is a pure
//! function of its inputs: the mesh is never mutated in place, only
//! rebuilt, and the core performs no caching.
//!
//! The mesh doubles as a JSON exchange document (`version: 1`); see
//! [`TrackMapMesh::from_json`] for the loader's whole-document validation.

use crate::interp::interpolate;
use crate::laps::LapPoint;
use crate::{Result, TelemetryError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Current exchange document version.
pub const MESH_VERSION: u32 = 1;

/// Default number of boundary samples along the lap.
pub const DEFAULT_SAMPLE_COUNT: usize = 900;

/// Inputs for one mesh synthesis pass.
///
/// Both point lists must be sorted ascending by distance (the
/// distance-sorted view of a [`crate::laps::LapSeries`] already is).
pub struct TrackMapInput<'a> {
    pub left_points: &'a [LapPoint],
    pub right_points: &'a [LapPoint],
    pub left_lap: i32,
    pub right_lap: i32,
    /// Explicit track key; when absent one is canonicalized from the name.
    pub track_key: Option<String>,
    pub track_name: Option<String>,
    pub track_config_name: Option<String>,
    pub track_id: Option<i32>,
    pub corners: Vec<Corner>,
    pub sample_count: usize,
}

impl<'a> TrackMapInput<'a> {
    pub fn new(
        left_points: &'a [LapPoint],
        right_points: &'a [LapPoint],
        left_lap: i32,
        right_lap: i32,
    ) -> Self {
        Self {
            left_points,
            right_points,
            left_lap,
            right_lap,
            track_key: None,
            track_name: None,
            track_config_name: None,
            track_id: None,
            corners: Vec::new(),
            sample_count: DEFAULT_SAMPLE_COUNT,
        }
    }
}

/// A corner position supplied by the caller (e.g. from a turn database).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub distance_km: f64,
    pub lat: f64,
    pub lon: f64,
}

/// One side's GPS fix at a sampled distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSample {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<f64>,
}

/// Left/right boundary fixes at one sampled distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryPoint {
    pub distance_km: f64,
    pub left: EdgeSample,
    pub right: EdgeSample,
}

/// A corner marker on the synthesized map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CornerMarker {
    pub distance_km: f64,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<f64>,
}

/// Synthesized track-boundary mesh and exchange document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMapMesh {
    pub version: u32,
    /// Canonical track identity; absent for preview meshes, which cannot be
    /// persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_config_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<i32>,
    pub left_lap: i32,
    pub right_lap: i32,
    /// Boundary points sorted ascending by distance.
    pub points: Vec<BoundaryPoint>,
    /// Corner markers sorted ascending by distance.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corners: Vec<CornerMarker>,
}

impl TrackMapMesh {
    /// Serialize to the JSON exchange format.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| TelemetryError::InvalidTrackMapDocument {
            reason: format!("Serialization failed: {}", e),
        })
    }

    /// Load and validate an exchange document.
    ///
    /// The whole document is rejected (no partial acceptance) unless the
    /// version is 1, the track key is non-empty, at least two boundary
    /// points are present with numeric coordinates, and every corner
    /// carries numeric position fields.
    pub fn from_json(text: &str) -> Result<Self> {
        let mesh: TrackMapMesh =
            serde_json::from_str(text).map_err(|e| TelemetryError::InvalidTrackMapDocument {
                reason: format!("Malformed document: {}", e),
            })?;

        if mesh.version != MESH_VERSION {
            return Err(TelemetryError::InvalidTrackMapDocument {
                reason: format!("Unsupported version {} (expected {})", mesh.version, MESH_VERSION),
            });
        }

        match mesh.track_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(TelemetryError::InvalidTrackMapDocument {
                    reason: "Track key is missing or empty".to_string(),
                });
            }
        }

        if mesh.points.len() < 2 {
            return Err(TelemetryError::InvalidTrackMapDocument {
                reason: format!("Need at least 2 boundary points, found {}", mesh.points.len()),
            });
        }

        Ok(mesh)
    }
}

/// Canonical track key: lowercase, hyphen-joined form of the display name,
/// with the configuration name appended unless already a substring.
pub fn canonical_track_key(name: &str, config: Option<&str>) -> String {
    let mut combined = name.to_string();
    if let Some(config) = config
        && !config.trim().is_empty()
        && !name.to_lowercase().contains(&config.to_lowercase())
    {
        combined.push(' ');
        combined.push_str(config);
    }

    let mut key = String::with_capacity(combined.len());
    let mut pending_hyphen = false;
    for ch in combined.chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !key.is_empty() {
                key.push('-');
            }
            pending_hyphen = false;
            key.extend(ch.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    key
}

/// Build a sampled left/right boundary mesh plus corner markers from two
/// edge laps.
pub fn build_track_map(input: TrackMapInput<'_>) -> Result<TrackMapMesh> {
    if input.left_points.len() < 2 || input.right_points.len() < 2 {
        return Err(TelemetryError::InsufficientLapData {
            details: format!(
                "Edge laps need at least 2 points each (left {}, right {})",
                input.left_points.len(),
                input.right_points.len()
            ),
        });
    }
    if input.sample_count < 2 {
        return Err(TelemetryError::InsufficientLapData {
            details: format!("Sample count must be at least 2, got {}", input.sample_count),
        });
    }

    let left_max = input.left_points.last().map(|p| p.distance_km).unwrap_or(0.0);
    let right_max = input.right_points.last().map(|p| p.distance_km).unwrap_or(0.0);
    let cover_distance = left_max.min(right_max);
    if !(cover_distance > 0.0) {
        return Err(TelemetryError::InsufficientLapData {
            details: format!("Cover distance {} must be positive", cover_distance),
        });
    }

    let mut points = Vec::with_capacity(input.sample_count);
    for i in 0..input.sample_count {
        let distance_km = i as f64 / (input.sample_count - 1) as f64 * cover_distance;

        let left = sample_edge(input.left_points, distance_km);
        let right = sample_edge(input.right_points, distance_km);

        // A sample survives only when both sides have a GPS fix; gaps are
        // dropped, never zero-filled
        let (Some(left), Some(right)) = (left, right) else {
            continue;
        };

        points.push(BoundaryPoint { distance_km, left, right });
    }

    if points.len() < 2 {
        return Err(TelemetryError::EmptyMesh { surviving: points.len() });
    }

    let mut corners: Vec<CornerMarker> = input
        .corners
        .iter()
        .map(|corner| CornerMarker {
            distance_km: corner.distance_km,
            lat: corner.lat,
            lon: corner.lon,
            altitude_m: corner_altitude(
                input.left_points,
                input.right_points,
                corner.distance_km,
            ),
        })
        .collect();
    corners.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    let track_key = input.track_key.or_else(|| {
        input
            .track_name
            .as_deref()
            .map(|name| canonical_track_key(name, input.track_config_name.as_deref()))
    });

    debug!(
        "Synthesized track map: {} boundary points, {} corners, cover {:.3} km",
        points.len(),
        corners.len(),
        cover_distance
    );

    Ok(TrackMapMesh {
        version: MESH_VERSION,
        track_key,
        track_name: input.track_name,
        track_config_name: input.track_config_name,
        track_id: input.track_id,
        left_lap: input.left_lap,
        right_lap: input.right_lap,
        points,
        corners,
    })
}

fn sample_edge(points: &[LapPoint], distance_km: f64) -> Option<EdgeSample> {
    let lat = interpolate(points, distance_km, |p| p.distance_km, |p| Some(p.lat))?;
    let lon = interpolate(points, distance_km, |p| p.distance_km, |p| Some(p.lon))?;
    let altitude_m = interpolate(points, distance_km, |p| p.distance_km, |p| p.altitude_m);
    Some(EdgeSample { lat, lon, altitude_m })
}

fn corner_altitude(left: &[LapPoint], right: &[LapPoint], distance_km: f64) -> Option<f64> {
    let left_alt = interpolate(left, distance_km, |p| p.distance_km, |p| p.altitude_m);
    let right_alt = interpolate(right, distance_km, |p| p.distance_km, |p| p.altitude_m);
    match (left_alt, right_alt) {
        (Some(l), Some(r)) => Some((l + r) / 2.0),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}

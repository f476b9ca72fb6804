//! Lap reconstruction from decoded sample rows.
//!
//! Decoded rows are grouped into per-lap, zero-based point series with two
//! views over the same point set: one sorted ascending by lap distance, one
//! ascending by lap time. Lap distances arrive from the simulator in metres
//! and are stored in kilometres after zero-basing.

use crate::disk::SampleBatch;
use crate::sectors::SectorTime;
use crate::{Result, TelemetryError};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Minimum retained rows for a lap to survive reconstruction.
pub const MIN_LAP_POINTS: usize = 20;

/// Channel names feeding lap reconstruction.
///
/// Elapsed time, lap number, lap distance, and GPS latitude/longitude are
/// required; the rest are optional and silently skipped when the decoded
/// batch does not carry them. `extras` are vehicle channels carried through
/// onto every point (speed, throttle, ...).
#[derive(Debug, Clone)]
pub struct LapChannels {
    pub time: String,
    pub lap: String,
    pub distance: String,
    pub latitude: String,
    pub longitude: String,
    pub altitude: Option<String>,
    pub session_num: Option<String>,
    pub car_index: Option<String>,
    pub extras: Vec<String>,
}

impl Default for LapChannels {
    fn default() -> Self {
        Self {
            time: "SessionTime".to_string(),
            lap: "Lap".to_string(),
            distance: "LapDist".to_string(),
            latitude: "Lat".to_string(),
            longitude: "Lon".to_string(),
            altitude: Some("Alt".to_string()),
            session_num: Some("SessionNum".to_string()),
            car_index: None,
            extras: Vec::new(),
        }
    }
}

impl LapChannels {
    /// All channel names, for building a decode request.
    pub fn request_names(&self) -> Vec<String> {
        let mut names = vec![
            self.time.clone(),
            self.lap.clone(),
            self.distance.clone(),
            self.latitude.clone(),
            self.longitude.clone(),
        ];
        names.extend(self.altitude.clone());
        names.extend(self.session_num.clone());
        names.extend(self.car_index.clone());
        names.extend(self.extras.iter().cloned());
        names
    }
}

/// Composite lap identity, disambiguating lap numbers across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LapKey {
    /// Session number, when a session-number channel was decoded.
    pub session_num: Option<i32>,
    pub lap: i32,
}

/// One lap-relative sample point.
#[derive(Debug, Clone, PartialEq)]
pub struct LapPoint {
    /// Lap-relative distance in kilometres, zero-based per lap.
    pub distance_km: f64,
    /// Lap-relative time in seconds, zero-based per lap.
    pub time_sec: f64,
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: Option<f64>,
    /// Extra vehicle channel values, aligned with [`LapChannels::extras`].
    pub extras: Vec<Option<f64>>,
}

/// A reconstructed lap: the same point set under two total orders.
#[derive(Debug, Clone)]
pub struct LapSeries {
    pub key: LapKey,
    pub lap_number: i32,
    /// Points sorted ascending by distance.
    pub points_by_distance: Vec<LapPoint>,
    /// Points sorted ascending by time.
    pub points_by_time: Vec<LapPoint>,
    /// Maximum of the distance-sorted view, in kilometres.
    pub total_distance_km: f64,
    /// Per-sector deltas, attached by the sector timer.
    pub sector_times: Vec<SectorTime>,
}

impl LapSeries {
    pub fn point_count(&self) -> usize {
        self.points_by_distance.len()
    }
}

/// How rows were filtered by car during reconstruction.
///
/// When the recording driver's car index cannot be resolved, filtering is
/// explicitly reported as [`CarFilter::Unfiltered`] rather than silently
/// merging multiple cars' samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarFilter {
    /// Rows were restricted to this car index.
    Applied(i32),
    /// No car filtering took place; rows may mix cars.
    Unfiltered,
}

/// Result of one reconstruction pass.
#[derive(Debug, Clone)]
pub struct LapReconstruction {
    pub laps: BTreeMap<LapKey, LapSeries>,
    pub car_filter: CarFilter,
}

struct RawPoint {
    distance_m: f64,
    time_sec: f64,
    lat: f64,
    lon: f64,
    altitude_m: Option<f64>,
    extras: Vec<Option<f64>>,
}

/// Group decoded rows into zero-based, dual-sorted lap series.
pub fn reconstruct_laps(
    batch: &SampleBatch,
    channels: &LapChannels,
    target_car: Option<i32>,
) -> Result<LapReconstruction> {
    let require = |name: &str| {
        batch
            .channels
            .position(name)
            .ok_or_else(|| TelemetryError::UnknownChannel { channel: name.to_string() })
    };

    let time_pos = require(&channels.time)?;
    let lap_pos = require(&channels.lap)?;
    let dist_pos = require(&channels.distance)?;
    let lat_pos = require(&channels.latitude)?;
    let lon_pos = require(&channels.longitude)?;

    let alt_pos = channels.altitude.as_deref().and_then(|n| batch.channels.position(n));
    let session_pos = channels.session_num.as_deref().and_then(|n| batch.channels.position(n));
    let car_pos = channels.car_index.as_deref().and_then(|n| batch.channels.position(n));
    let extra_pos: Vec<Option<usize>> =
        channels.extras.iter().map(|n| batch.channels.position(n)).collect();

    let car_filter = match (car_pos, target_car) {
        (Some(_), Some(idx)) => CarFilter::Applied(idx),
        _ => {
            if target_car.is_some() || car_pos.is_some() {
                warn!(
                    "Car filtering degraded to unfiltered: channel present={}, target present={}",
                    car_pos.is_some(),
                    target_car.is_some()
                );
            }
            CarFilter::Unfiltered
        }
    };

    let mut grouped: BTreeMap<LapKey, Vec<RawPoint>> = BTreeMap::new();
    let rows_seen = batch.rows.len();

    for row in &batch.rows {
        let lap = row.value(lap_pos).as_f64();
        let distance_m = row.value(dist_pos).as_f64();
        let time_sec = row.value(time_pos).as_f64();
        let lat = row.value(lat_pos).as_f64();
        let lon = row.value(lon_pos).as_f64();

        // Rows with a non-finite lap, distance, or GPS fix carry no usable
        // position and are dropped
        let (Some(lap), Some(distance_m), Some(time_sec), Some(lat), Some(lon)) =
            (lap, distance_m, time_sec, lat, lon)
        else {
            continue;
        };
        if !lap.is_finite()
            || !distance_m.is_finite()
            || !time_sec.is_finite()
            || !lat.is_finite()
            || !lon.is_finite()
        {
            continue;
        }

        if let CarFilter::Applied(target) = car_filter {
            let row_car = car_pos
                .and_then(|pos| row.value(pos).as_f64())
                .map(|v| v as i32);
            if row_car != Some(target) {
                continue;
            }
        }

        let session_num =
            session_pos.and_then(|pos| row.value(pos).as_f64()).map(|v| v as i32);

        let key = LapKey { session_num, lap: lap as i32 };
        let altitude_m = alt_pos.and_then(|pos| row.value(pos).as_f64()).filter(|v| v.is_finite());
        let extras = extra_pos
            .iter()
            .map(|pos| pos.and_then(|p| row.value(p).as_f64()))
            .collect();

        grouped.entry(key).or_default().push(RawPoint {
            distance_m,
            time_sec,
            lat,
            lon,
            altitude_m,
            extras,
        });
    }

    let mut laps = BTreeMap::new();
    for (key, raw_points) in grouped {
        if key.lap <= 0 || raw_points.len() < MIN_LAP_POINTS {
            continue;
        }
        laps.insert(key, build_series(key, raw_points));
    }

    debug!("Reconstructed {} laps from {} rows ({:?})", laps.len(), rows_seen, car_filter);

    if laps.is_empty() {
        return Err(TelemetryError::NoUsableLaps { rows_seen });
    }

    Ok(LapReconstruction { laps, car_filter })
}

fn build_series(key: LapKey, raw_points: Vec<RawPoint>) -> LapSeries {
    let min_distance =
        raw_points.iter().map(|p| p.distance_m).fold(f64::INFINITY, f64::min);
    let min_time = raw_points.iter().map(|p| p.time_sec).fold(f64::INFINITY, f64::min);

    let points: Vec<LapPoint> = raw_points
        .into_iter()
        .map(|p| LapPoint {
            distance_km: (p.distance_m - min_distance) / 1000.0,
            time_sec: p.time_sec - min_time,
            lat: p.lat,
            lon: p.lon,
            altitude_m: p.altitude_m,
            extras: p.extras,
        })
        .collect();

    let mut points_by_distance = points.clone();
    points_by_distance.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    let mut points_by_time = points;
    points_by_time.sort_by(|a, b| a.time_sec.total_cmp(&b.time_sec));

    let total_distance_km =
        points_by_distance.last().map(|p| p.distance_km).unwrap_or(0.0);

    LapSeries {
        key,
        lap_number: key.lap,
        points_by_distance,
        points_by_time,
        total_distance_km,
        sector_times: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lap_key_orders_by_session_then_lap() {
        let a = LapKey { session_num: Some(0), lap: 9 };
        let b = LapKey { session_num: Some(1), lap: 1 };
        let c = LapKey { session_num: Some(1), lap: 2 };
        assert!(a < b && b < c);

        // No collision for large lap numbers across sessions
        let big = LapKey { session_num: Some(0), lap: 10_001 };
        assert_ne!(big, LapKey { session_num: Some(1), lap: 1 });
    }

    #[test]
    fn request_names_include_optionals_and_extras() {
        let mut channels = LapChannels::default();
        channels.extras = vec!["Speed".to_string(), "Throttle".to_string()];
        let names = channels.request_names();
        assert!(names.contains(&"SessionTime".to_string()));
        assert!(names.contains(&"Alt".to_string()));
        assert!(names.contains(&"Throttle".to_string()));
        assert!(!names.contains(&"CarIdx".to_string()));
    }

    #[test]
    fn build_series_zero_bases_and_sorts() {
        let key = LapKey { session_num: None, lap: 1 };
        let raw: Vec<RawPoint> = (0..5)
            .rev()
            .map(|i| RawPoint {
                distance_m: 100.0 + i as f64 * 250.0,
                time_sec: 50.0 + i as f64 * 10.0,
                lat: -27.0,
                lon: 153.0,
                altitude_m: Some(30.0),
                extras: vec![],
            })
            .collect();

        let series = build_series(key, raw);
        assert_eq!(series.point_count(), 5);
        assert_eq!(series.points_by_distance[0].distance_km, 0.0);
        assert_eq!(series.points_by_time[0].time_sec, 0.0);
        assert!((series.total_distance_km - 1.0).abs() < 1e-12);

        let dists: Vec<f64> =
            series.points_by_distance.iter().map(|p| p.distance_km).collect();
        assert!(dists.windows(2).all(|w| w[0] <= w[1]));
        let times: Vec<f64> = series.points_by_time.iter().map(|p| p.time_sec).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }
}

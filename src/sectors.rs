//! Per-sector elapsed-time deltas from boundary percentages.

use crate::interp::interpolate;
use crate::laps::LapSeries;
use crate::session::SectorBoundary;
use tracing::trace;

/// One sector's timing within a lap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectorTime {
    pub sector_num: i32,
    /// Time spent in this sector, in seconds. A delta from the previous
    /// boundary's absolute time, not a cumulative total.
    pub time_sec: f64,
    /// Absolute distance of the sector's start boundary, in kilometres.
    pub distance_km: f64,
}

/// Compute per-sector time deltas for a lap.
///
/// Each boundary's absolute distance is its percentage of the lap's total
/// distance; its absolute time is interpolated against the distance-sorted
/// view. Boundaries whose distance falls outside the lap's range are
/// skipped. Boundary 0 implies time 0.
pub fn compute_sector_times(
    lap: &LapSeries,
    boundaries: &[SectorBoundary],
) -> Vec<SectorTime> {
    let mut sector_times = Vec::with_capacity(boundaries.len());
    let mut previous_time = 0.0;

    for boundary in boundaries {
        let distance_km = boundary.start_pct / 100.0 * lap.total_distance_km;
        let Some(absolute_time) = interpolate(
            &lap.points_by_distance,
            distance_km,
            |p| p.distance_km,
            |p| Some(p.time_sec),
        ) else {
            trace!(
                "Skipping sector {} boundary at {:.3} km: outside lap range",
                boundary.sector_num, distance_km
            );
            continue;
        };

        sector_times.push(SectorTime {
            sector_num: boundary.sector_num,
            time_sec: absolute_time - previous_time,
            distance_km,
        });
        previous_time = absolute_time;
    }

    sector_times
}

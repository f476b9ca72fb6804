//! Sector boundary information.

use serde::{Deserialize, Serialize};

/// Split timing section as recorded in the metadata document.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct SplitTimeInfo {
    pub sectors: Option<Vec<RawSector>>,
}

/// One raw sector entry; the recorded start is a fraction of lap distance.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct RawSector {
    pub sector_num: Option<i32>,
    pub sector_start_pct: Option<f64>,
}

/// Normalized sector boundary: start position as a percent of lap distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectorBoundary {
    pub sector_num: i32,
    pub start_pct: f64,
}

/// Normalize raw sector entries into a usable boundary list.
///
/// Entries missing either field are dropped, duplicated sector numbers keep
/// the first occurrence, and the list is sorted ascending. A `0%` boundary
/// is prepended when absent and a synthesized `100%` boundary is appended
/// when the last existing boundary sits below 100.
pub fn normalize_sector_boundaries(raw: &[RawSector]) -> Vec<SectorBoundary> {
    let mut boundaries: Vec<SectorBoundary> = Vec::with_capacity(raw.len() + 2);
    for sector in raw {
        let (Some(sector_num), Some(start_frac)) = (sector.sector_num, sector.sector_start_pct)
        else {
            continue;
        };
        if !start_frac.is_finite() {
            continue;
        }
        if boundaries.iter().any(|b| b.sector_num == sector_num) {
            continue;
        }
        // Recorded as a 0..1 fraction of lap distance
        boundaries.push(SectorBoundary { sector_num, start_pct: start_frac * 100.0 });
    }

    boundaries.sort_by(|a, b| a.start_pct.total_cmp(&b.start_pct));

    if !boundaries.iter().any(|b| b.start_pct == 0.0) {
        boundaries.insert(0, SectorBoundary { sector_num: 0, start_pct: 0.0 });
    }

    let max_num = boundaries.iter().map(|b| b.sector_num).max().unwrap_or(0);
    if boundaries.last().map(|b| b.start_pct < 100.0).unwrap_or(true) {
        boundaries.push(SectorBoundary { sector_num: max_num + 1, start_pct: 100.0 });
    }

    boundaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(sector_num: i32, start_frac: f64) -> RawSector {
        RawSector { sector_num: Some(sector_num), sector_start_pct: Some(start_frac) }
    }

    #[test]
    fn synthesizes_missing_endpoints() {
        let boundaries = normalize_sector_boundaries(&[raw(1, 0.333), raw(2, 0.666)]);
        assert_eq!(boundaries.len(), 4);
        assert_eq!(boundaries[0].sector_num, 0);
        assert_eq!(boundaries[0].start_pct, 0.0);
        assert_eq!(boundaries[3].sector_num, 3);
        assert_eq!(boundaries[3].start_pct, 100.0);
    }

    #[test]
    fn keeps_existing_zero_boundary() {
        let boundaries = normalize_sector_boundaries(&[raw(0, 0.0), raw(1, 0.5)]);
        assert_eq!(boundaries.len(), 3);
        assert_eq!(boundaries[0].sector_num, 0);
        assert_eq!(boundaries[2].start_pct, 100.0);
    }

    #[test]
    fn empty_input_yields_full_lap_boundaries() {
        let boundaries = normalize_sector_boundaries(&[]);
        assert_eq!(boundaries.len(), 2);
        assert_eq!(boundaries[0].start_pct, 0.0);
        assert_eq!(boundaries[1].start_pct, 100.0);
    }

    #[test]
    fn drops_incomplete_entries_and_duplicates() {
        let incomplete = RawSector { sector_num: Some(5), sector_start_pct: None };
        let boundaries =
            normalize_sector_boundaries(&[raw(0, 0.0), incomplete, raw(1, 0.4), raw(1, 0.6)]);
        let nums: Vec<i32> = boundaries.iter().map(|b| b.sector_num).collect();
        assert_eq!(nums, vec![0, 1, 2]);
    }

    #[test]
    fn sorts_ascending_by_start() {
        let boundaries = normalize_sector_boundaries(&[raw(2, 0.7), raw(1, 0.3), raw(0, 0.0)]);
        let starts: Vec<f64> = boundaries.iter().map(|b| b.start_pct).collect();
        assert!(starts.windows(2).all(|w| w[0] <= w[1]));
    }
}

//! Per-session entries and ranked results.

use serde::{Deserialize, Serialize};

/// Session list from the metadata document.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct SessionList {
    /// Current session number
    pub current_session_num: Option<i32>,
    /// All recorded sessions
    pub sessions: Vec<SessionEntry>,
}

/// One recorded session.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct SessionEntry {
    /// Session number
    pub session_num: Option<i32>,
    /// Lap count ("unlimited" or a number)
    pub session_laps: Option<String>,
    /// Session duration ("unlimited" or seconds text)
    pub session_time: Option<String>,
    /// Session type (Practice, Qualify, Race, ...)
    pub session_type: Option<String>,
    /// Ranked result positions
    pub results_positions: Option<Vec<ResultPosition>>,
}

/// One ranked result row.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct ResultPosition {
    /// Finishing position
    pub position: Option<i32>,
    /// Car index the result belongs to
    pub car_idx: Option<i32>,
    /// Lap on which the fastest time was set
    pub fastest_lap: Option<i32>,
    /// Fastest lap time in seconds
    pub fastest_time: Option<f64>,
    /// Incident count
    pub incidents: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_list_with_results() {
        let yaml = r#"
CurrentSessionNum: 1
Sessions:
- SessionNum: 0
  SessionType: Practice
- SessionNum: 1
  SessionLaps: "12"
  SessionType: Race
  ResultsPositions:
  - Position: 1
    CarIdx: 4
    FastestLap: 7
    FastestTime: 92.413
    Incidents: 0
  - Position: 2
    CarIdx: 9
"#;
        let list: SessionList = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(list.current_session_num, Some(1));
        assert_eq!(list.sessions.len(), 2);

        let race = &list.sessions[1];
        assert_eq!(race.session_type.as_deref(), Some("Race"));
        let results = race.results_positions.as_ref().unwrap();
        assert_eq!(results[0].fastest_time, Some(92.413));
        assert_eq!(results[1].car_idx, Some(9));
        assert!(results[1].fastest_time.is_none());
    }
}

//! Weekend and track information.
//!
//! Every field is optional: the metadata document is tolerant by contract,
//! and a missing key yields an absent field, never an error.

use serde::{Deserialize, Serialize};

/// Weekend and track information from the session metadata document.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct WeekendInfo {
    /// Internal track name
    pub track_name: Option<String>,
    /// Track display name
    pub track_display_name: Option<String>,
    /// Track configuration name
    pub track_config_name: Option<String>,
    /// Track ID
    #[serde(rename = "TrackID")]
    pub track_id: Option<i32>,
    /// Track length, as recorded (e.g. "5.04 km")
    pub track_length: Option<String>,
    /// Number of turns
    pub track_num_turns: Option<i32>,
    /// Track city
    pub track_city: Option<String>,
    /// Track state/province
    pub track_state: Option<String>,
    /// Track country
    pub track_country: Option<String>,
    /// Category (Road, Oval, etc.)
    pub category: Option<String>,
    /// Official session flag
    pub official: Option<i32>,
}

impl WeekendInfo {
    /// Display name with the internal name as fallback.
    pub fn display_name(&self) -> Option<&str> {
        self.track_display_name.as_deref().or(self.track_name.as_deref())
    }

    /// Track length in kilometres, when the recorded text parses.
    pub fn track_length_km(&self) -> Option<f64> {
        let text = self.track_length.as_deref()?;
        let numeric: String =
            text.chars().take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-').collect();
        numeric.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_become_absent_fields() {
        let info: WeekendInfo = serde_yaml_ng::from_str("TrackDisplayName: Okayama").unwrap();
        assert_eq!(info.track_display_name.as_deref(), Some("Okayama"));
        assert!(info.track_id.is_none());
        assert!(info.track_num_turns.is_none());
        assert!(info.category.is_none());
    }

    #[test]
    fn track_length_parses_leading_number() {
        let info = WeekendInfo {
            track_length: Some("5.04 km".to_string()),
            ..WeekendInfo::default()
        };
        assert_eq!(info.track_length_km(), Some(5.04));

        let bad = WeekendInfo { track_length: Some("unknown".to_string()), ..WeekendInfo::default() };
        assert!(bad.track_length_km().is_none());
    }

    #[test]
    fn display_name_falls_back_to_internal_name() {
        let info = WeekendInfo { track_name: Some("okayama full".into()), ..WeekendInfo::default() };
        assert_eq!(info.display_name(), Some("okayama full"));
    }
}

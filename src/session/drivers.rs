//! Driver roster information.
//!
//! Carried for car-index resolution: lap reconstruction filters rows to the
//! recording driver's car when the roster can name it.

use serde::{Deserialize, Serialize};

/// Driver section of the metadata document.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct DriverRoster {
    /// Car index of the recording driver
    pub driver_car_idx: Option<i32>,
    /// All entered drivers
    pub drivers: Option<Vec<DriverEntry>>,
}

/// One entered driver.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct DriverEntry {
    pub car_idx: Option<i32>,
    pub user_name: Option<String>,
    pub car_number: Option<String>,
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Full status record.

use serde::Deserialize;

use crate::error::ParseError;

/// Status record as returned by `getFullStatus`.
///
/// Only the `last_state` block is read; the vendor nests the most recent
/// telemetry there.
///
/// # Examples
///
/// ```
/// use emeraldenergy::response::FullStatus;
///
/// let status = FullStatus::from_value(serde_json::json!({
///     "id": "abc",
///     "last_state": { "temp_current": 52.5, "temp_set": 60, "switch": 1 }
/// }))
/// .unwrap();
/// assert_eq!(status.current_temperature(), Some(52.5));
/// assert_eq!(status.target_temperature(), Some(60.0));
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FullStatus {
    /// Most recent telemetry snapshot.
    pub last_state: LastState,
}

/// Telemetry snapshot nested under `last_state`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LastState {
    /// Measured water temperature in degrees Celsius.
    #[serde(default)]
    pub temp_current: Option<f64>,

    /// Target water temperature in degrees Celsius.
    #[serde(default)]
    pub temp_set: Option<f64>,
}

impl FullStatus {
    /// Parses a status record.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingField`] when `last_state` is absent and
    /// [`ParseError::Json`] when it is not an object of numbers.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ParseError> {
        if value.get("last_state").is_none_or(serde_json::Value::is_null) {
            return Err(ParseError::MissingField("last_state".to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Returns the measured water temperature.
    #[must_use]
    pub fn current_temperature(&self) -> Option<f64> {
        self.last_state.temp_current
    }

    /// Returns the target water temperature.
    #[must_use]
    pub fn target_temperature(&self) -> Option<f64> {
        self.last_state.temp_set
    }
}

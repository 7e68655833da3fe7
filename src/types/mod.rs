// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by the entity adapters.
//!
//! - [`HwsId`] - Vendor-assigned hot water system identifier
//! - [`OperationMode`] - Hub operation state of a water heater
//! - [`TemperatureUnit`] - Unit reported for water temperatures

mod hws_id;
mod operation_mode;

pub use hws_id::HwsId;
pub use operation_mode::OperationMode;

/// Temperature unit reported by a water heater entity.
///
/// The vendor only reports Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum TemperatureUnit {
    /// Degrees Celsius.
    #[default]
    #[serde(rename = "°C")]
    Celsius,
}

impl TemperatureUnit {
    /// Returns the unit symbol.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
        }
    }
}

/// Display precision of temperatures, in degrees.
pub const PRECISION_WHOLE: f64 = 1.0;

/// Unit of the daily energy reading.
pub const UNIT_KILO_WATT_HOUR: &str = "kWh";

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identity record.

use serde::{Deserialize, Deserializer};

use crate::error::ParseError;

/// Identity of a hot water system as returned by `getInfo`.
///
/// # Examples
///
/// ```
/// use emeraldenergy::response::HwsInfo;
///
/// let info = HwsInfo::from_value(serde_json::json!({
///     "serial_number": "E12345",
///     "brand": "Emerald",
///     "model": "HWS-270"
/// }))
/// .unwrap();
/// assert_eq!(info.display_name(), "Emerald E12345");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HwsInfo {
    /// Manufacturer serial number.
    #[serde(deserialize_with = "string_or_number")]
    pub serial_number: String,

    /// Brand name shown to the user.
    #[serde(default = "default_brand")]
    pub brand: String,
}

impl HwsInfo {
    /// Brand used when the vendor omits one.
    pub const DEFAULT_BRAND: &'static str = "Emerald";

    /// Parses an identity record.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingField`] when `serial_number` is absent
    /// and [`ParseError::Json`] for any other malformed record.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ParseError> {
        if value.get("serial_number").is_none_or(serde_json::Value::is_null) {
            return Err(ParseError::MissingField("serial_number".to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Returns the name shared by all entities of this device.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.brand, self.serial_number)
    }
}

fn default_brand() -> String {
    HwsInfo::DEFAULT_BRAND.to_string()
}

/// The vendor reports some serial numbers as bare integers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

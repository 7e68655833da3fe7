// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hot water system identifier type.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::ParseError;

/// Longest text form `Uuid::parse_str` accepts (`urn:uuid:` prefix).
const MAX_LEN: usize = 45;

/// Vendor-assigned identifier of a hot water system.
///
/// The vendor lists devices by UUID string. The parsed UUID gives a
/// distinct, validated type so device IDs cannot be confused with config
/// entry IDs, while the vendor's text is kept as listed: [`Display`],
/// unique IDs and every call back into the client use it unchanged, in
/// whatever case or form the vendor returned. Equality and hashing only
/// look at the UUID.
///
/// [`Display`]: fmt::Display
///
/// # Examples
///
/// ```
/// use emeraldenergy::types::HwsId;
///
/// let id: HwsId = "2F1C6C5E-7F1A-4C36-9A51-1B7D3A0F5E11".parse().unwrap();
/// assert_eq!(id.to_string(), "2F1C6C5E-7F1A-4C36-9A51-1B7D3A0F5E11");
///
/// let lower: HwsId = "2f1c6c5e-7f1a-4c36-9a51-1b7d3a0f5e11".parse().unwrap();
/// assert_eq!(id, lower);
/// ```
#[derive(Clone, Copy)]
pub struct HwsId {
    uuid: Uuid,
    raw: [u8; MAX_LEN],
    len: u8,
}

impl HwsId {
    /// Creates an identifier from an existing UUID, in hyphenated form.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        let mut buf = Uuid::encode_buffer();
        let text = uuid.hyphenated().encode_lower(&mut buf);
        Self::with_text(uuid, text)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the identifier as the vendor listed it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ASCII text that parsed as a UUID is ever stored
        std::str::from_utf8(&self.raw[..usize::from(self.len)]).unwrap_or_default()
    }

    fn with_text(uuid: Uuid, text: &str) -> Self {
        let mut raw = [0; MAX_LEN];
        let len = text.len().min(MAX_LEN);
        raw[..len].copy_from_slice(&text.as_bytes()[..len]);
        Self {
            uuid,
            raw,
            len: u8::try_from(len).unwrap_or(u8::MAX),
        }
    }
}

impl PartialEq for HwsId {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for HwsId {}

impl Hash for HwsId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl fmt::Debug for HwsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = &self.uuid.to_string()[..8];
        write!(f, "HwsId({short}...)")
    }
}

impl fmt::Display for HwsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HwsId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        Uuid::parse_str(text)
            .map(|uuid| Self::with_text(uuid, text))
            .map_err(|_| ParseError::InvalidHwsId(s.to_string()))
    }
}

impl From<Uuid> for HwsId {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl Serialize for HwsId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HwsId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

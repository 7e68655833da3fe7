// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parsing of vendor device records.
//!
//! The vendor client hands back loosely-typed mappings. The structures in
//! this module pull out the handful of fields the entity adapters read and
//! ignore everything else the vendor includes.

mod info;
mod status;

pub use info::HwsInfo;
pub use status::{FullStatus, LastState};

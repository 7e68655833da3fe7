// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Account setup and refresh routing.
//!
//! The [`EntryManager`] is the hub-facing entry point: it loads accounts
//! created by the [config flow](crate::config_flow), owns their clients and
//! dispatchers, and applies queued refreshes to entities.
//!
//! # Lifecycle
//!
//! 1. [`setup_entry`](EntryManager::setup_entry) builds the client, connects
//!    it off the async runtime, and installs one dispatcher in the client's
//!    callback slot.
//! 2. Every device gets a water heater and, optionally, an energy sensor.
//!    Each registers a listener with the account's dispatcher.
//! 3. Vendor pushes fan out to all listeners, which queue refreshes.
//! 4. [`unload_entry`](EntryManager::unload_entry) unregisters every
//!    listener; later pushes reach nobody.

mod entry_manager;

pub use entry_manager::EntryManager;

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan-out of vendor update notifications.
//!
//! The vendor client only supports a single update callback per account,
//! while the hub mounts several entities per account. The
//! [`CallbackDispatcher`] sits in that single slot and relays each
//! notification to every registered [`Listener`].
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use emeraldenergy::subscription::{CallbackDispatcher, Listener};
//!
//! let dispatcher = Arc::new(CallbackDispatcher::new());
//!
//! // The vendor client receives this in `replace_callback`
//! let vendor_slot = dispatcher.vendor_callback();
//!
//! // Each entity registers its own listener
//! let listener = Listener::labeled("water_heater", || Ok(()));
//! dispatcher.register(&listener);
//!
//! vendor_slot();
//!
//! // On removal the entity unregisters before finishing teardown
//! dispatcher.unregister(&listener);
//! ```
//!
//! Entities must never call `replace_callback` themselves: each call
//! overwrites the slot, leaving only the most recently created entity
//! subscribed.

mod callback;

pub use callback::{CallbackDispatcher, Listener};

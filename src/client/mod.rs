// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vendor API client seam.
//!
//! The Emerald cloud client owns the session, login token, polling and
//! transport. This crate only consumes it, through the blocking
//! [`EmeraldClient`] trait. Every call is pushed onto a
//! [`BlockingExecutor`] so async callers never block on network I/O.
//!
//! # Callback slot
//!
//! A client holds exactly one update callback, installed with
//! [`EmeraldClient::replace_callback`]. The integration installs the
//! account's [`CallbackDispatcher`](crate::subscription::CallbackDispatcher)
//! there and lets entities subscribe to the dispatcher instead.

mod executor;
#[cfg(test)]
pub(crate) mod fake;

pub use executor::BlockingExecutor;

use std::sync::Arc;

use crate::config::AccountConfig;
use crate::error::ClientError;
use crate::types::HwsId;

/// The single callback a vendor client invokes when device state changes.
pub type VendorCallback = Box<dyn Fn() + Send + Sync>;

/// Blocking contract of the vendor API client.
///
/// Implementations are shared between all entities of one account and must
/// tolerate concurrent calls from worker threads. Record-returning methods
/// hand back the vendor's raw mappings; see [`crate::response`] for the
/// fields that are read.
pub trait EmeraldClient: Send + Sync {
    /// Establishes the session with the vendor cloud.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AuthenticationFailed`] for bad credentials and
    /// [`ClientError::ConnectionFailed`] when the service is unreachable.
    fn connect(&self) -> Result<(), ClientError>;

    /// Lists the UUIDs of every hot water system on the account.
    ///
    /// # Errors
    ///
    /// Returns an error if the device list cannot be fetched.
    fn list_hws(&self) -> Result<Vec<String>, ClientError>;

    /// Returns the identity record (`serial_number`, `brand`, ...) of a device.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be fetched.
    fn get_info(&self, id: HwsId) -> Result<serde_json::Value, ClientError>;

    /// Returns the full status record of a device, if the vendor has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn get_full_status(&self, id: HwsId) -> Result<Option<serde_json::Value>, ClientError>;

    /// Returns whether the unit is switched on.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn is_on(&self, id: HwsId) -> Result<bool, ClientError>;

    /// Returns whether the unit is actively heating.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn is_heating(&self, id: HwsId) -> Result<bool, ClientError>;

    /// Returns the vendor mode code (0 boost, 1 normal, 2 quiet).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn current_mode(&self, id: HwsId) -> Result<Option<i64>, ClientError>;

    /// Returns today's energy usage in kWh, or `None` when unavailable.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn get_daily_energy_usage(&self, id: HwsId) -> Result<Option<f64>, ClientError>;

    /// Switches the unit on.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is rejected.
    fn turn_on(&self, id: HwsId) -> Result<(), ClientError>;

    /// Switches the unit off.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is rejected.
    fn turn_off(&self, id: HwsId) -> Result<(), ClientError>;

    /// Selects boost mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is rejected.
    fn set_boost_mode(&self, id: HwsId) -> Result<(), ClientError>;

    /// Selects quiet mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is rejected.
    fn set_quiet_mode(&self, id: HwsId) -> Result<(), ClientError>;

    /// Selects normal mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is rejected.
    fn set_normal_mode(&self, id: HwsId) -> Result<(), ClientError>;

    /// Obtains a login token. `None` means the vendor refused the credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the login request could not be made.
    fn get_login_token(&self) -> Result<Option<String>, ClientError>;

    /// Installs the single update callback, replacing any previous one.
    fn replace_callback(&self, callback: VendorCallback);
}

/// Constructs vendor clients for an account.
///
/// Closures with the matching signature implement this trait, which keeps
/// test setups short.
pub trait ClientFactory: Send + Sync {
    /// Creates a client for the given account. The client is not connected.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be constructed.
    fn create(&self, config: &AccountConfig) -> Result<Arc<dyn EmeraldClient>, ClientError>;
}

impl<F> ClientFactory for F
where
    F: Fn(&AccountConfig) -> Result<Arc<dyn EmeraldClient>, ClientError> + Send + Sync,
{
    fn create(&self, config: &AccountConfig) -> Result<Arc<dyn EmeraldClient>, ClientError> {
        self(config)
    }
}

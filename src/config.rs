// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Account configuration and config entries.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Integration domain, used as prefix for unique IDs and device identifiers.
pub const DOMAIN: &str = "emeraldenergy";

/// Title given to entries created by the config flow.
pub const DEFAULT_TITLE: &str = "Emerald HWS";

/// Entry key for the account username.
pub const CONF_USERNAME: &str = "username";
/// Entry key for the account password.
pub const CONF_PASSWORD: &str = "password";
/// Entry key for the vendor connection timeout, in minutes.
pub const CONF_CONNECTION_TIMEOUT: &str = "connection_timeout";
/// Entry key for the vendor health-check interval, in minutes.
pub const CONF_HEALTH_CHECK: &str = "health_check";
/// Entry key for the energy monitoring switch.
pub const CONF_ENABLE_ENERGY_MONITORING: &str = "enable_energy_monitoring";

/// Default connection timeout: 12 hours.
pub const DEFAULT_CONNECTION_TIMEOUT: u32 = 720;
/// Default health-check interval: 1 hour.
pub const DEFAULT_HEALTH_CHECK: u32 = 60;
/// Energy sensors are created unless disabled.
pub const DEFAULT_ENABLE_ENERGY_MONITORING: bool = true;

/// Credentials and tuning for one vendor account.
///
/// Field names match the keys stored in a config entry, so the struct
/// round-trips through the hub's entry storage unchanged.
///
/// # Examples
///
/// ```
/// use emeraldenergy::config::AccountConfig;
///
/// let config = AccountConfig::new("me@example.com", "hunter2")
///     .with_health_check(30)
///     .with_energy_monitoring(false);
///
/// assert_eq!(config.connection_timeout, 720);
/// assert_eq!(config.health_check, 30);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Vendor account username.
    pub username: String,
    /// Vendor account password.
    pub password: String,
    /// Minutes after which the vendor client re-establishes its session.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u32,
    /// Minutes between vendor client health checks.
    #[serde(default = "default_health_check")]
    pub health_check: u32,
    /// Whether a daily energy sensor is created per device.
    #[serde(default = "default_enable_energy_monitoring")]
    pub enable_energy_monitoring: bool,
}

impl AccountConfig {
    /// Creates a configuration with default tuning.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            health_check: DEFAULT_HEALTH_CHECK,
            enable_energy_monitoring: DEFAULT_ENABLE_ENERGY_MONITORING,
        }
    }

    /// Sets the connection timeout in minutes.
    #[must_use]
    pub fn with_connection_timeout(mut self, minutes: u32) -> Self {
        self.connection_timeout = minutes;
        self
    }

    /// Sets the health-check interval in minutes.
    #[must_use]
    pub fn with_health_check(mut self, minutes: u32) -> Self {
        self.health_check = minutes;
        self
    }

    /// Enables or disables the daily energy sensors.
    #[must_use]
    pub fn with_energy_monitoring(mut self, enabled: bool) -> Self {
        self.enable_energy_monitoring = enabled;
        self
    }

    /// Parses stored entry data, filling in defaults for optional keys.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a credential is absent and
    /// [`ConfigError::InvalidValue`] when a key holds the wrong type.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        for field in [CONF_USERNAME, CONF_PASSWORD] {
            if value.get(field).is_none() {
                return Err(ConfigError::MissingField(field));
            }
        }
        let config: Self = serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            field: "entry",
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that credentials are present and intervals are non-zero.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::MissingField(CONF_USERNAME));
        }
        if self.password.is_empty() {
            return Err(ConfigError::MissingField(CONF_PASSWORD));
        }
        if self.connection_timeout == 0 {
            return Err(ConfigError::InvalidValue {
                field: CONF_CONNECTION_TIMEOUT,
                message: "must be greater than zero".to_string(),
            });
        }
        if self.health_check == 0 {
            return Err(ConfigError::InvalidValue {
                field: CONF_HEALTH_CHECK,
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("connection_timeout", &self.connection_timeout)
            .field("health_check", &self.health_check)
            .field("enable_energy_monitoring", &self.enable_energy_monitoring)
            .finish()
    }
}

fn default_connection_timeout() -> u32 {
    DEFAULT_CONNECTION_TIMEOUT
}

fn default_health_check() -> u32 {
    DEFAULT_HEALTH_CHECK
}

fn default_enable_energy_monitoring() -> bool {
    DEFAULT_ENABLE_ENERGY_MONITORING
}

/// A stored account, as created by the config flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// Identifier of the entry, unique across accounts.
    pub entry_id: String,
    /// Title shown to the user.
    pub title: String,
    /// Account settings.
    pub data: AccountConfig,
}

impl ConfigEntry {
    /// Creates an entry with a freshly generated ID.
    #[must_use]
    pub fn new(title: impl Into<String>, data: AccountConfig) -> Self {
        Self {
            entry_id: uuid::Uuid::new_v4().simple().to_string(),
            title: title.into(),
            data,
        }
    }
}

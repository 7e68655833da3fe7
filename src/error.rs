// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the Emerald integration.
//!
//! This module provides the error hierarchy used across the crate: vendor
//! client failures, parsing of vendor records, configuration validation,
//! and failures reported by dispatcher listeners.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The vendor API client reported a failure.
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// A value supplied by the caller is not valid.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// A vendor record could not be interpreted.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The account configuration is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A blocking worker task failed before producing a result.
    #[error("worker task failed: {0}")]
    Executor(String),

    /// No config entry is loaded under the given ID.
    #[error("config entry not found: {0}")]
    EntryNotFound(String),

    /// A config entry with the given ID is already loaded.
    #[error("config entry already loaded: {0}")]
    EntryAlreadyLoaded(String),

    /// No entity is registered under the given unique ID.
    #[error("entity not found: {0}")]
    EntityNotFound(String),
}

/// Errors related to caller-supplied values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The string does not name a known operation mode.
    #[error("invalid operation mode: {0}")]
    InvalidOperationMode(String),
}

/// Failures reported by a vendor API client implementation.
///
/// Implementations of [`EmeraldClient`](crate::client::EmeraldClient) map
/// their transport and session errors onto these variants; the config flow
/// relies on the distinction between connection and authentication failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The vendor cloud service could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The vendor rejected the account credentials.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The request did not complete in time.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The vendor returned an error for a request.
    #[error("request failed: {0}")]
    Request(String),
}

/// Errors raised while interpreting vendor device records.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The record could not be deserialized.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// An expected field is missing from the record.
    #[error("missing field in record: {0}")]
    MissingField(String),

    /// The vendor returned a device identifier that is not a UUID.
    #[error("invalid hot water system id: {0}")]
    InvalidHwsId(String),
}

/// Errors related to account configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required field was not supplied.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field holds a value outside its allowed domain.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// The offending field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },
}

impl ConfigError {
    /// Returns the name of the field this error refers to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField(field) | Self::InvalidValue { field, .. } => *field,
        }
    }
}

/// Failure returned by a dispatcher listener.
///
/// The dispatcher logs these and carries on with the remaining listeners.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// The refresh channel of the owning entity has been closed.
    #[error("refresh channel closed for {entity}")]
    ChannelClosed {
        /// Unique ID of the entity that could not be scheduled.
        entity: String,
    },

    /// Any other listener failure.
    #[error("{0}")]
    Failed(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hub entities backed by Emerald hot water systems.
//!
//! Each device on an account is exposed as a [`WaterHeater`] and, when
//! energy monitoring is enabled, an [`EnergySensor`]. Both are thin
//! projections of vendor state: they read through the account's client on
//! every refresh and forward commands without updating local state.
//!
//! # Refresh flow
//!
//! ```text
//! vendor push ─▶ CallbackDispatcher::dispatch ─▶ Listener ─▶ RefreshScheduler
//!                                                                  │
//!          entity.update() ◀── EntryManager::refresh ◀── RefreshRequest
//! ```
//!
//! Entities never look up their client or dispatcher through shared state;
//! they receive an [`AccountContext`] at construction.

mod energy_sensor;
mod water_heater;

pub use energy_sensor::EnergySensor;
pub use water_heater::{WaterHeater, WaterHeaterFeature, WaterHeaterState};

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::client::{BlockingExecutor, EmeraldClient};
use crate::config::DOMAIN;
use crate::error::{CallbackError, Result};
use crate::response::HwsInfo;
use crate::subscription::{CallbackDispatcher, Listener};
use crate::types::HwsId;

/// Per-account collaborators handed to every entity of that account.
///
/// Accounts never share a context: each has its own client and dispatcher.
#[derive(Clone)]
pub struct AccountContext {
    client: Arc<dyn EmeraldClient>,
    dispatcher: Arc<CallbackDispatcher>,
    executor: BlockingExecutor,
}

impl AccountContext {
    /// Bundles a client, its dispatcher and the executor used for vendor calls.
    #[must_use]
    pub fn new(
        client: Arc<dyn EmeraldClient>,
        dispatcher: Arc<CallbackDispatcher>,
        executor: BlockingExecutor,
    ) -> Self {
        Self {
            client,
            dispatcher,
            executor,
        }
    }

    /// Returns the vendor client.
    #[must_use]
    pub fn client(&self) -> &Arc<dyn EmeraldClient> {
        &self.client
    }

    /// Returns the account's dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<CallbackDispatcher> {
        &self.dispatcher
    }

    /// Runs a blocking vendor call on the executor.
    ///
    /// # Errors
    ///
    /// Returns the client's error, or [`Error::Executor`](crate::Error::Executor)
    /// if the worker fails.
    pub async fn call<F, T, E>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn EmeraldClient) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<crate::Error> + Send + 'static,
    {
        let client = Arc::clone(&self.client);
        self.executor
            .run(move || f(client.as_ref()))
            .await?
            .map_err(Into::into)
    }
}

impl fmt::Debug for AccountContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountContext")
            .field("dispatcher", &self.dispatcher)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

/// Request to refresh one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    /// Unique ID of the entity to refresh.
    pub unique_id: String,
}

/// Receiving half of the refresh queue.
pub type RefreshReceiver = mpsc::UnboundedReceiver<RefreshRequest>;

/// Queues entity refreshes for the hub.
///
/// Listeners built with [`listener_for`](Self::listener_for) only enqueue a
/// request; the entity performs its vendor reads later, off the dispatching
/// thread.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    sender: mpsc::UnboundedSender<RefreshRequest>,
}

impl RefreshScheduler {
    /// Creates a scheduler and the receiver the hub drains.
    #[must_use]
    pub fn channel() -> (Self, RefreshReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Queues a refresh of the given entity.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError::ChannelClosed`] once the receiver is gone.
    pub fn schedule(&self, unique_id: &str) -> std::result::Result<(), CallbackError> {
        self.sender
            .send(RefreshRequest {
                unique_id: unique_id.to_string(),
            })
            .map_err(|_| CallbackError::ChannelClosed {
                entity: unique_id.to_string(),
            })
    }

    /// Builds the dispatcher listener for an entity.
    #[must_use]
    pub fn listener_for(&self, unique_id: &str) -> Listener {
        let scheduler = self.clone();
        let entity = unique_id.to_string();
        Listener::labeled(unique_id, move || {
            tracing::debug!(entity = %entity, "Update callback received");
            scheduler.schedule(&entity)
        })
    }
}

/// Device registry entry shared by the entities of one hot water system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// `(domain, device UUID)` pairs identifying the device.
    pub identifiers: Vec<(String, String)>,
    /// Display name, `"{brand} {serial}"`.
    pub name: String,
    /// Brand reported by the vendor.
    pub manufacturer: String,
    /// Product line.
    pub model: String,
    /// Manufacturer serial number.
    pub serial_number: String,
}

impl DeviceInfo {
    /// Model reported for every device.
    pub const MODEL: &'static str = "Hot Water System";

    /// Builds the registry entry for a device.
    #[must_use]
    pub fn new(id: HwsId, info: &HwsInfo) -> Self {
        Self {
            identifiers: vec![(DOMAIN.to_string(), id.to_string())],
            name: info.display_name(),
            manufacturer: info.brand.clone(),
            model: Self::MODEL.to_string(),
            serial_number: info.serial_number.clone(),
        }
    }
}

/// Any entity created by the integration.
#[derive(Debug, Clone)]
pub enum Entity {
    /// Water heater entity.
    WaterHeater(Arc<WaterHeater>),
    /// Daily energy sensor.
    EnergySensor(Arc<EnergySensor>),
}

impl Entity {
    /// Returns the unique ID.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        match self {
            Self::WaterHeater(e) => e.unique_id(),
            Self::EnergySensor(e) => e.unique_id(),
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::WaterHeater(e) => e.name(),
            Self::EnergySensor(e) => e.name(),
        }
    }

    /// Returns the backing device.
    #[must_use]
    pub fn hws_id(&self) -> HwsId {
        match self {
            Self::WaterHeater(e) => e.hws_id(),
            Self::EnergySensor(e) => e.hws_id(),
        }
    }

    /// Re-reads vendor state.
    ///
    /// # Errors
    ///
    /// Water heater refresh failures propagate; the energy sensor contains
    /// its own failures and always succeeds.
    pub async fn update(&self) -> Result<()> {
        match self {
            Self::WaterHeater(e) => e.update().await,
            Self::EnergySensor(e) => {
                e.update().await;
                Ok(())
            }
        }
    }

    /// Detaches the entity from its dispatcher.
    pub fn remove(&self) {
        match self {
            Self::WaterHeater(e) => e.remove(),
            Self::EnergySensor(e) => e.remove(),
        }
    }

    /// Returns `true` while the entity receives vendor notifications.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        match self {
            Self::WaterHeater(e) => e.is_subscribed(),
            Self::EnergySensor(e) => e.is_subscribed(),
        }
    }
}

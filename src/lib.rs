// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `emeraldenergy` - Smart-home hub integration for Emerald heat-pump hot
//! water systems.
//!
//! The vendor client talks to the Emerald cloud and exposes a blocking API
//! with a single update-callback slot per account. This crate adapts that
//! client to a hub's entity model:
//!
//! - **Config flow**: validates credentials and creates config entries
//! - **Water heater**: operation mode, temperatures, heating flag
//! - **Energy sensor**: daily kWh usage with a local-midnight reset
//! - **Callback fan-out**: one vendor callback slot shared by every entity
//!   of an account
//!
//! Vendor calls block, so they run on a bounded worker pool
//! ([`client::BlockingExecutor`]) instead of the async runtime.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use emeraldenergy::client::EmeraldClient;
//! use emeraldenergy::config::AccountConfig;
//! use emeraldenergy::config_flow::{ConfigFlow, FlowResult};
//! use emeraldenergy::error::ClientError;
//! use emeraldenergy::manager::EntryManager;
//!
//! # fn vendor_client(config: &AccountConfig) -> Result<Arc<dyn EmeraldClient>, ClientError> {
//! #     unimplemented!()
//! # }
//! #[tokio::main]
//! async fn main() -> emeraldenergy::Result<()> {
//!     let flow = ConfigFlow::new(vendor_client);
//!     let input = json!({ "username": "me@example.com", "password": "hunter2" });
//!
//!     let FlowResult::CreateEntry(entry) = flow.step_user(Some(input)).await else {
//!         return Ok(());
//!     };
//!
//!     let (manager, refreshes) = EntryManager::new(vendor_client);
//!     manager.setup_entry(entry).await?;
//!     manager
//!         .run_refresh_loop(refreshes, std::future::pending())
//!         .await;
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! The crate emits [`tracing`] events and never installs a subscriber.

pub mod client;
pub mod config;
pub mod config_flow;
pub mod entity;
pub mod error;
pub mod manager;
pub mod response;
pub mod subscription;
pub mod types;

#[cfg(test)]
mod test_support;

pub use client::{BlockingExecutor, ClientFactory, EmeraldClient, VendorCallback};
pub use config::{AccountConfig, ConfigEntry};
pub use config_flow::{ConfigFlow, FlowError, FlowResult};
pub use entity::{EnergySensor, Entity, WaterHeater};
pub use error::{CallbackError, ClientError, ConfigError, Error, ParseError, Result, ValueError};
pub use manager::EntryManager;
pub use subscription::{CallbackDispatcher, Listener};
pub use types::{HwsId, OperationMode};

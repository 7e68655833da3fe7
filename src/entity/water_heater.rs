// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Water heater entity.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{AccountContext, DeviceInfo, RefreshScheduler};
use crate::client::EmeraldClient;
use crate::config::DOMAIN;
use crate::error::{Error, Result};
use crate::response::{FullStatus, HwsInfo};
use crate::subscription::Listener;
use crate::types::{HwsId, OperationMode, PRECISION_WHOLE, TemperatureUnit};

/// Features a water heater entity advertises to the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaterHeaterFeature {
    /// The operation mode can be selected.
    OperationMode,
}

/// Last vendor reading held by a [`WaterHeater`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaterHeaterState {
    /// Measured water temperature in degrees Celsius.
    pub current_temperature: Option<f64>,
    /// Target water temperature in degrees Celsius.
    pub target_temperature: Option<f64>,
    /// Whether the unit is switched on.
    pub running: bool,
    /// Vendor mode code.
    pub mode_code: Option<i64>,
    /// Whether the unit is actively heating.
    pub is_heating: bool,
}

impl WaterHeaterState {
    /// Reads the state of a device.
    ///
    /// Returns `None` when the vendor has no status record for the device.
    fn read(client: &dyn EmeraldClient, id: HwsId) -> Result<Option<Self>> {
        let Some(raw) = client.get_full_status(id)? else {
            return Ok(None);
        };
        let status = FullStatus::from_value(raw)?;
        Ok(Some(Self {
            current_temperature: status.current_temperature(),
            target_temperature: status.target_temperature(),
            running: client.is_on(id)?,
            mode_code: client.current_mode(id)?,
            is_heating: client.is_heating(id)?,
        }))
    }

    /// Returns the hub operation state for this reading.
    #[must_use]
    pub fn operation(&self) -> Option<OperationMode> {
        OperationMode::from_status(self.running, self.mode_code)
    }
}

/// A hot water system exposed as a hub water heater.
///
/// Commands go straight to the vendor; the entity's properties only change
/// on the next [`update`](Self::update).
#[derive(Debug)]
pub struct WaterHeater {
    id: HwsId,
    name: String,
    unique_id: String,
    device_info: DeviceInfo,
    context: AccountContext,
    listener: Listener,
    state: Mutex<WaterHeaterState>,
}

impl WaterHeater {
    /// Icon shown by the hub.
    pub const ICON: &'static str = "mdi:water-boiler";

    /// Reads the device's identity and status, then subscribes to the
    /// account's dispatcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the vendor calls fail or the records are malformed.
    pub async fn create(
        context: AccountContext,
        id: HwsId,
        scheduler: &RefreshScheduler,
    ) -> Result<Arc<Self>> {
        let (info, state) = context
            .call(move |client| -> Result<_> {
                let info = HwsInfo::from_value(client.get_info(id)?)?;
                let state = WaterHeaterState::read(client, id)?;
                Ok((info, state))
            })
            .await?;

        let state = state.unwrap_or_else(|| {
            tracing::warn!(hws = %id, "No status available for water heater yet");
            WaterHeaterState::default()
        });

        let unique_id = format!("{DOMAIN}_{id}");
        let listener = scheduler.listener_for(&unique_id);
        let heater = Arc::new(Self {
            id,
            name: info.display_name(),
            unique_id,
            device_info: DeviceInfo::new(id, &info),
            context,
            listener,
            state: Mutex::new(state),
        });

        heater.context.dispatcher().register(&heater.listener);
        tracing::debug!(entity = %heater.unique_id, name = %heater.name, "Created water heater");
        Ok(heater)
    }

    /// Returns the vendor device ID.
    #[must_use]
    pub fn hws_id(&self) -> HwsId {
        self.id
    }

    /// Returns the display name, `"{brand} {serial}"`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the unique ID, `"emeraldenergy_{uuid}"`.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Returns the device registry entry.
    #[must_use]
    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    /// Returns the supported features.
    #[must_use]
    pub fn supported_features(&self) -> &'static [WaterHeaterFeature] {
        &[WaterHeaterFeature::OperationMode]
    }

    /// Returns the selectable operation modes.
    #[must_use]
    pub fn operation_list(&self) -> &'static [OperationMode] {
        &OperationMode::ALL
    }

    /// Returns the temperature unit.
    #[must_use]
    pub fn temperature_unit(&self) -> TemperatureUnit {
        TemperatureUnit::Celsius
    }

    /// Returns the temperature display precision.
    #[must_use]
    pub fn precision(&self) -> f64 {
        PRECISION_WHOLE
    }

    /// Returns a copy of the last reading.
    #[must_use]
    pub fn state(&self) -> WaterHeaterState {
        self.state.lock().clone()
    }

    /// Returns the current operation: `off` when switched off, otherwise the
    /// mode reported by the vendor.
    #[must_use]
    pub fn current_operation(&self) -> Option<OperationMode> {
        self.state.lock().operation()
    }

    /// Returns the measured water temperature.
    #[must_use]
    pub fn current_temperature(&self) -> Option<f64> {
        self.state.lock().current_temperature
    }

    /// Returns the target water temperature.
    #[must_use]
    pub fn target_temperature(&self) -> Option<f64> {
        self.state.lock().target_temperature
    }

    /// Returns whether the unit is actively heating.
    #[must_use]
    pub fn is_heating(&self) -> bool {
        self.state.lock().is_heating
    }

    /// Returns the extra state attributes published with the entity.
    #[must_use]
    pub fn extra_state_attributes(&self) -> serde_json::Value {
        serde_json::json!({ "is_heating": self.is_heating() })
    }

    /// Re-reads status, power, mode and heating flags from the vendor.
    ///
    /// When the vendor has no status record the previous reading is kept.
    ///
    /// # Errors
    ///
    /// Vendor and parse failures are returned to the caller unchanged.
    pub async fn update(&self) -> Result<()> {
        tracing::debug!(entity = %self.unique_id, "Updating water heater state");
        let id = self.id;
        let reading = self
            .context
            .call(move |client| WaterHeaterState::read(client, id))
            .await?;

        match reading {
            Some(state) => *self.state.lock() = state,
            None => {
                tracing::debug!(entity = %self.unique_id, "No status returned, keeping last state");
            }
        }
        Ok(())
    }

    /// Switches the unit on.
    ///
    /// # Errors
    ///
    /// Returns an error if the vendor rejects the command.
    pub async fn turn_on(&self) -> Result<()> {
        let id = self.id;
        self.context.call(move |client| client.turn_on(id)).await
    }

    /// Switches the unit off.
    ///
    /// # Errors
    ///
    /// Returns an error if the vendor rejects the command.
    pub async fn turn_off(&self) -> Result<()> {
        let id = self.id;
        self.context.call(move |client| client.turn_off(id)).await
    }

    /// Selects an operation mode.
    ///
    /// Power is toggled first when the request crosses the on/off boundary,
    /// based on the last reading; then the matching vendor mode is selected.
    ///
    /// # Errors
    ///
    /// Returns the first vendor failure; later calls are not attempted.
    pub async fn set_operation_mode(&self, mode: OperationMode) -> Result<()> {
        tracing::info!(entity = %self.unique_id, mode = %mode, "Setting operation mode");
        let id = self.id;
        let running = self.state.lock().running;
        self.context
            .call(move |client| -> Result<()> {
                if running && mode == OperationMode::Off {
                    client.turn_off(id)?;
                } else if !running && mode != OperationMode::Off {
                    client.turn_on(id)?;
                }
                match mode {
                    OperationMode::Performance => client.set_boost_mode(id)?,
                    OperationMode::Eco => client.set_quiet_mode(id)?,
                    OperationMode::HeatPump => client.set_normal_mode(id)?,
                    OperationMode::Off => {}
                }
                Ok(())
            })
            .await
    }

    /// Parses a hub state string and selects that mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] for unknown mode names.
    pub async fn set_operation_mode_str(&self, mode: &str) -> Result<()> {
        let mode = mode.parse::<OperationMode>().map_err(Error::from)?;
        self.set_operation_mode(mode).await
    }

    /// Returns `true` while subscribed to the dispatcher.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.context.dispatcher().is_registered(&self.listener)
    }

    /// Unsubscribes from the dispatcher. Safe to call more than once.
    pub fn remove(&self) {
        if self.context.dispatcher().unregister(&self.listener) {
            tracing::debug!(entity = %self.unique_id, "Removed water heater");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::BlockingExecutor;
    use crate::client::fake::{Command, FakeClient, FakeDevice};
    use crate::error::ClientError;
    use crate::subscription::CallbackDispatcher;
    use serde_json::json;

    const ID: &str = "6c1f0d2a-52a8-4a0e-8f3c-0e5b8b7d9a01";

    struct Harness {
        client: Arc<FakeClient>,
        dispatcher: Arc<CallbackDispatcher>,
        scheduler: RefreshScheduler,
        receiver: crate::entity::RefreshReceiver,
    }

    impl Harness {
        fn new(device: FakeDevice) -> Self {
            let client = Arc::new(FakeClient::new());
            client.add_device(id(), device);
            let (scheduler, receiver) = RefreshScheduler::channel();
            Self {
                client,
                dispatcher: Arc::new(CallbackDispatcher::new()),
                scheduler,
                receiver,
            }
        }

        fn context(&self) -> AccountContext {
            AccountContext::new(
                self.client.clone(),
                Arc::clone(&self.dispatcher),
                BlockingExecutor::new(),
            )
        }

        async fn heater(&self) -> Arc<WaterHeater> {
            WaterHeater::create(self.context(), id(), &self.scheduler)
                .await
                .unwrap()
        }
    }

    fn id() -> HwsId {
        ID.parse().unwrap()
    }

    #[tokio::test]
    async fn create_reads_identity_and_status() {
        let mut device = FakeDevice::new("E100");
        device.heating = true;
        let harness = Harness::new(device);

        let heater = harness.heater().await;

        assert_eq!(heater.name(), "Emerald E100");
        assert_eq!(heater.unique_id(), format!("emeraldenergy_{ID}"));
        assert_eq!(heater.current_temperature(), Some(50.0));
        assert_eq!(heater.target_temperature(), Some(60.0));
        assert_eq!(heater.current_operation(), Some(OperationMode::HeatPump));
        assert!(heater.is_heating());
        assert_eq!(heater.extra_state_attributes(), json!({ "is_heating": true }));
        assert_eq!(heater.temperature_unit().as_str(), "°C");
        assert!(heater.is_subscribed());
    }

    #[tokio::test]
    async fn static_properties() {
        let harness = Harness::new(FakeDevice::new("E101"));
        let heater = harness.heater().await;

        assert_eq!(heater.operation_list(), &OperationMode::ALL);
        assert_eq!(
            heater.supported_features(),
            &[WaterHeaterFeature::OperationMode]
        );
        assert!((heater.precision() - 1.0).abs() < f64::EPSILON);
        assert_eq!(heater.device_info().serial_number, "E101");
        assert_eq!(WaterHeater::ICON, "mdi:water-boiler");
    }

    #[tokio::test]
    async fn mode_codes_and_power_flag_drive_current_operation() {
        let harness = Harness::new(FakeDevice::new("E102"));
        let heater = harness.heater().await;

        for (code, expected) in [
            (1, Some(OperationMode::HeatPump)),
            (0, Some(OperationMode::Performance)),
            (2, Some(OperationMode::Eco)),
            (9, None),
        ] {
            harness.client.update_device(id(), |d| d.mode = Some(code));
            heater.update().await.unwrap();
            assert_eq!(heater.current_operation(), expected, "mode code {code}");
        }

        harness.client.update_device(id(), |d| {
            d.on = false;
            d.mode = Some(0);
        });
        heater.update().await.unwrap();
        assert_eq!(heater.current_operation(), Some(OperationMode::Off));
    }

    #[tokio::test]
    async fn update_keeps_state_when_status_missing() {
        let harness = Harness::new(FakeDevice::new("E103"));
        let heater = harness.heater().await;
        let before = heater.state();

        harness.client.update_device(id(), |d| {
            d.status = None;
            d.on = false;
        });
        heater.update().await.unwrap();

        assert_eq!(heater.state(), before);
    }

    #[tokio::test]
    async fn update_propagates_vendor_errors() {
        let harness = Harness::new(FakeDevice::new("E104"));
        let heater = harness.heater().await;

        harness
            .client
            .fail("get_full_status", ClientError::ConnectionFailed("offline".into()));
        let result = heater.update().await;

        assert!(matches!(result, Err(Error::Client(ClientError::ConnectionFailed(_)))));
        assert_eq!(heater.current_temperature(), Some(50.0));
    }

    #[tokio::test]
    async fn update_replaces_temperatures() {
        let harness = Harness::new(FakeDevice::new("E105"));
        let heater = harness.heater().await;

        harness.client.update_device(id(), |d| {
            d.status = Some(json!({ "last_state": { "temp_current": 41, "temp_set": 65 } }));
        });
        heater.update().await.unwrap();

        assert_eq!(heater.current_temperature(), Some(41.0));
        assert_eq!(heater.target_temperature(), Some(65.0));
    }

    #[tokio::test]
    async fn create_without_status_starts_empty() {
        let mut device = FakeDevice::new("E106");
        device.status = None;
        let harness = Harness::new(device);

        let heater = harness.heater().await;
        assert_eq!(heater.state(), WaterHeaterState::default());
    }

    #[tokio::test]
    async fn create_fails_on_malformed_info() {
        let mut device = FakeDevice::new("E107");
        device.info = json!({ "brand": "Emerald" });
        let harness = Harness::new(device);

        let result = WaterHeater::create(harness.context(), id(), &harness.scheduler).await;
        assert!(matches!(result, Err(Error::Parse(_))));
        assert!(harness.dispatcher.is_empty());
    }

    #[tokio::test]
    async fn turn_on_and_off_issue_one_call_each() {
        let harness = Harness::new(FakeDevice::new("E108"));
        let heater = harness.heater().await;

        heater.turn_off().await.unwrap();
        heater.turn_on().await.unwrap();

        assert_eq!(
            harness.client.commands(),
            vec![Command::TurnOff(id()), Command::TurnOn(id())]
        );
        // No optimistic update: still the reading taken at creation
        assert_eq!(heater.current_operation(), Some(OperationMode::HeatPump));
    }

    #[tokio::test]
    async fn set_mode_while_running() {
        let harness = Harness::new(FakeDevice::new("E109"));
        let heater = harness.heater().await;

        heater.set_operation_mode(OperationMode::Performance).await.unwrap();
        heater.set_operation_mode(OperationMode::Eco).await.unwrap();
        heater.set_operation_mode(OperationMode::HeatPump).await.unwrap();

        assert_eq!(
            harness.client.commands(),
            vec![Command::Boost(id()), Command::Quiet(id()), Command::Normal(id())]
        );
    }

    #[tokio::test]
    async fn set_off_while_running_turns_off() {
        let harness = Harness::new(FakeDevice::new("E110"));
        let heater = harness.heater().await;

        heater.set_operation_mode(OperationMode::Off).await.unwrap();
        assert_eq!(harness.client.commands(), vec![Command::TurnOff(id())]);
    }

    #[tokio::test]
    async fn set_mode_while_off_turns_on_first() {
        let mut device = FakeDevice::new("E111");
        device.on = false;
        let harness = Harness::new(device);
        let heater = harness.heater().await;

        heater.set_operation_mode(OperationMode::Eco).await.unwrap();
        assert_eq!(
            harness.client.commands(),
            vec![Command::TurnOn(id()), Command::Quiet(id())]
        );
    }

    #[tokio::test]
    async fn set_off_while_off_does_nothing() {
        let mut device = FakeDevice::new("E112");
        device.on = false;
        let harness = Harness::new(device);
        let heater = harness.heater().await;

        heater.set_operation_mode(OperationMode::Off).await.unwrap();
        assert!(harness.client.commands().is_empty());
    }

    #[tokio::test]
    async fn set_mode_from_string() {
        let harness = Harness::new(FakeDevice::new("E113"));
        let heater = harness.heater().await;

        heater.set_operation_mode_str("performance").await.unwrap();
        assert_eq!(harness.client.commands(), vec![Command::Boost(id())]);

        let result = heater.set_operation_mode_str("turbo").await;
        assert!(matches!(result, Err(Error::Value(_))));
    }

    #[tokio::test]
    async fn set_mode_stops_at_first_failure() {
        let mut device = FakeDevice::new("E114");
        device.on = false;
        let harness = Harness::new(device);
        let heater = harness.heater().await;
        harness
            .client
            .fail("turn_on", ClientError::Request("rejected".into()));

        let result = heater.set_operation_mode(OperationMode::Performance).await;
        assert!(result.is_err());
        assert!(harness.client.commands().is_empty());
    }

    #[tokio::test]
    async fn dispatch_schedules_refresh_until_removed() {
        let mut harness = Harness::new(FakeDevice::new("E115"));
        let heater = harness.heater().await;

        harness.dispatcher.dispatch();
        let request = harness.receiver.try_recv().unwrap();
        assert_eq!(request.unique_id, heater.unique_id());

        heater.remove();
        heater.remove();
        assert!(!heater.is_subscribed());

        harness.dispatcher.dispatch();
        assert!(harness.receiver.try_recv().is_err());
    }
}

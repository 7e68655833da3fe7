// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Daily energy sensor entity.

use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime};
use parking_lot::Mutex;

use super::{AccountContext, DeviceInfo, RefreshScheduler};
use crate::config::DOMAIN;
use crate::error::Result;
use crate::response::HwsInfo;
use crate::subscription::Listener;
use crate::types::{HwsId, UNIT_KILO_WATT_HOUR};

#[derive(Debug)]
struct Reading {
    native_value: Option<f64>,
    last_reset: Option<NaiveDateTime>,
    today: NaiveDate,
}

/// Energy used by one hot water system since local midnight, in kWh.
#[derive(Debug)]
pub struct EnergySensor {
    id: HwsId,
    name: String,
    unique_id: String,
    device_info: DeviceInfo,
    context: AccountContext,
    listener: Listener,
    reading: Mutex<Reading>,
}

impl EnergySensor {
    /// Icon shown by the hub.
    pub const ICON: &'static str = "mdi:lightning-bolt";
    /// Hub device class.
    pub const DEVICE_CLASS: &'static str = "energy";
    /// Hub state class.
    pub const STATE_CLASS: &'static str = "total_increasing";

    /// Reads the device identity, subscribes to the account's dispatcher
    /// and takes an initial reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the device info cannot be read. A failed initial
    /// energy read only leaves the value empty.
    pub async fn create(
        context: AccountContext,
        id: HwsId,
        scheduler: &RefreshScheduler,
    ) -> Result<Arc<Self>> {
        Self::create_on(context, id, scheduler, Local::now().date_naive()).await
    }

    async fn create_on(
        context: AccountContext,
        id: HwsId,
        scheduler: &RefreshScheduler,
        today: NaiveDate,
    ) -> Result<Arc<Self>> {
        let info = context
            .call(move |client| -> Result<_> { Ok(HwsInfo::from_value(client.get_info(id)?)?) })
            .await?;

        let unique_id = format!("{DOMAIN}_{id}_daily_energy");
        let listener = scheduler.listener_for(&unique_id);
        let sensor = Arc::new(Self {
            id,
            name: format!("{} Daily Energy", info.display_name()),
            unique_id,
            device_info: DeviceInfo::new(id, &info),
            context,
            listener,
            reading: Mutex::new(Reading {
                native_value: None,
                last_reset: None,
                today,
            }),
        });

        sensor.context.dispatcher().register(&sensor.listener);
        sensor.update_on(today).await;
        Ok(sensor)
    }

    /// Returns the vendor device ID.
    #[must_use]
    pub fn hws_id(&self) -> HwsId {
        self.id
    }

    /// Returns the display name, `"{brand} {serial} Daily Energy"`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the unique ID, `"emeraldenergy_{uuid}_daily_energy"`.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Returns the device registry entry shared with the water heater.
    #[must_use]
    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    /// Returns the unit of [`native_value`](Self::native_value).
    #[must_use]
    pub fn native_unit_of_measurement(&self) -> &'static str {
        UNIT_KILO_WATT_HOUR
    }

    /// Returns today's usage rounded to three decimals, if known.
    #[must_use]
    pub fn native_value(&self) -> Option<f64> {
        self.reading.lock().native_value
    }

    /// Returns local midnight of the last day rollover seen by the sensor.
    #[must_use]
    pub fn last_reset(&self) -> Option<NaiveDateTime> {
        self.reading.lock().last_reset
    }

    /// Re-reads the daily usage.
    ///
    /// Failures are logged and never returned: a vendor error keeps the
    /// last value, while an explicit "no data" answer clears it.
    pub async fn update(&self) {
        self.update_on(Local::now().date_naive()).await;
    }

    async fn update_on(&self, today: NaiveDate) {
        tracing::debug!(entity = %self.unique_id, "Updating energy sensor");
        {
            let mut reading = self.reading.lock();
            if reading.today != today {
                reading.today = today;
                reading.last_reset = Some(today.and_time(chrono::NaiveTime::MIN));
                tracing::info!(
                    entity = %self.unique_id,
                    date = %today,
                    "Daily energy sensor reset"
                );
            }
        }

        let id = self.id;
        let result = self
            .context
            .call(move |client| client.get_daily_energy_usage(id))
            .await;

        match result {
            Ok(Some(kwh)) => {
                self.reading.lock().native_value = Some(round_kwh(kwh));
            }
            Ok(None) => {
                tracing::warn!(hws = %self.id, "Failed to get daily energy");
                self.reading.lock().native_value = None;
            }
            Err(e) => {
                tracing::error!(hws = %self.id, error = %e, "Error updating energy value");
            }
        }
    }

    /// Returns `true` while subscribed to the dispatcher.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.context.dispatcher().is_registered(&self.listener)
    }

    /// Unsubscribes from the dispatcher.
    pub fn remove(&self) {
        if self.context.dispatcher().unregister(&self.listener) {
            tracing::debug!(entity = %self.unique_id, "Removed energy sensor");
        }
    }
}

/// Rounds to three decimals on the exact decimal value of `kwh`.
///
/// Scaling by 1000 first can cross a rounding boundary: 1.0005 is stored
/// just below the midpoint and must round down to 1.0.
fn round_kwh(kwh: f64) -> f64 {
    format!("{kwh:.3}").parse().unwrap_or(kwh)
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory vendor client for unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, mpsc};

use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::oneshot;

use super::{EmeraldClient, VendorCallback};
use crate::config::AccountConfig;
use crate::error::ClientError;
use crate::types::HwsId;

/// Factory type shared by tests that build flows and managers.
pub(crate) type BoxedFactory =
    Box<dyn Fn(&AccountConfig) -> Result<Arc<dyn EmeraldClient>, ClientError> + Send + Sync>;

/// Boxes a factory closure, fixing its signature.
pub(crate) fn boxed_factory(
    f: impl Fn(&AccountConfig) -> Result<Arc<dyn EmeraldClient>, ClientError>
    + Send
    + Sync
    + 'static,
) -> BoxedFactory {
    Box::new(f)
}

/// A factory that hands out `client` for every account.
pub(crate) fn factory_for(client: &Arc<FakeClient>) -> BoxedFactory {
    let client = Arc::clone(client);
    boxed_factory(move |_| Ok(Arc::clone(&client) as Arc<dyn EmeraldClient>))
}

/// Parks the next `get_full_status` call until released.
struct Hold {
    entered: oneshot::Sender<()>,
    release: mpsc::Receiver<()>,
}

/// Commands recorded by [`FakeClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    TurnOn(HwsId),
    TurnOff(HwsId),
    Boost(HwsId),
    Quiet(HwsId),
    Normal(HwsId),
}

#[derive(Debug, Clone)]
pub(crate) struct FakeDevice {
    pub info: serde_json::Value,
    pub status: Option<serde_json::Value>,
    pub on: bool,
    pub heating: bool,
    pub mode: Option<i64>,
    pub energy: Option<f64>,
}

impl FakeDevice {
    pub fn new(serial: &str) -> Self {
        Self {
            info: json!({ "serial_number": serial, "brand": "Emerald" }),
            status: Some(json!({ "last_state": { "temp_current": 50.0, "temp_set": 60.0 } })),
            on: true,
            heating: false,
            mode: Some(1),
            energy: Some(1.23456),
        }
    }
}

/// Programmable stand-in for the vendor client.
///
/// Methods named in `failures` return the stored error instead of data.
#[derive(Default)]
pub(crate) struct FakeClient {
    devices: Mutex<BTreeMap<String, FakeDevice>>,
    extra_ids: Mutex<Vec<String>>,
    failures: Mutex<HashMap<&'static str, ClientError>>,
    commands: Mutex<Vec<Command>>,
    callback: Mutex<Option<VendorCallback>>,
    login_token: Mutex<Option<String>>,
    hold: Mutex<Option<Hold>>,
}

impl FakeClient {
    pub fn new() -> Self {
        let client = Self::default();
        *client.login_token.lock() = Some("token".to_string());
        client
    }

    pub fn add_device(&self, id: HwsId, device: FakeDevice) {
        self.devices.lock().insert(id.to_string(), device);
    }

    /// Lists an ID that has no device record behind it.
    pub fn list_extra(&self, raw: &str) {
        self.extra_ids.lock().push(raw.to_string());
    }

    pub fn update_device(&self, id: HwsId, f: impl FnOnce(&mut FakeDevice)) {
        if let Some(device) = self.devices.lock().get_mut(&id.to_string()) {
            f(device);
        }
    }

    /// Blocks the next `get_full_status` call inside the worker.
    ///
    /// The receiver completes once the call is parked; sending on the
    /// returned sender lets it continue.
    pub fn hold_full_status(&self) -> (oneshot::Receiver<()>, mpsc::Sender<()>) {
        let (entered, entered_rx) = oneshot::channel();
        let (release_tx, release) = mpsc::channel();
        *self.hold.lock() = Some(Hold { entered, release });
        (entered_rx, release_tx)
    }

    pub fn fail(&self, method: &'static str, error: ClientError) {
        self.failures.lock().insert(method, error);
    }

    pub fn recover(&self, method: &'static str) {
        self.failures.lock().remove(method);
    }

    pub fn set_login_token(&self, token: Option<&str>) {
        *self.login_token.lock() = token.map(str::to_string);
    }

    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().clone()
    }

    pub fn has_callback(&self) -> bool {
        self.callback.lock().is_some()
    }

    /// Invokes the installed callback, as the vendor's poller would.
    pub fn fire_callback(&self) {
        if let Some(callback) = self.callback.lock().as_ref() {
            callback();
        }
    }

    fn check(&self, method: &'static str) -> Result<(), ClientError> {
        match self.failures.lock().get(method) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn device<T>(&self, id: HwsId, f: impl FnOnce(&FakeDevice) -> T) -> Result<T, ClientError> {
        self.devices
            .lock()
            .get(&id.to_string())
            .map(f)
            .ok_or_else(|| ClientError::Request(format!("unknown device {id}")))
    }

    fn record(&self, method: &'static str, command: Command) -> Result<(), ClientError> {
        self.check(method)?;
        self.commands.lock().push(command);
        Ok(())
    }
}

impl EmeraldClient for FakeClient {
    fn connect(&self) -> Result<(), ClientError> {
        self.check("connect")
    }

    fn list_hws(&self) -> Result<Vec<String>, ClientError> {
        self.check("list_hws")?;
        let mut ids: Vec<String> = self.devices.lock().keys().cloned().collect();
        ids.extend(self.extra_ids.lock().iter().cloned());
        Ok(ids)
    }

    fn get_info(&self, id: HwsId) -> Result<serde_json::Value, ClientError> {
        self.check("get_info")?;
        self.device(id, |d| d.info.clone())
    }

    fn get_full_status(&self, id: HwsId) -> Result<Option<serde_json::Value>, ClientError> {
        let hold = self.hold.lock().take();
        if let Some(Hold { entered, release }) = hold {
            let _ = entered.send(());
            let _ = release.recv();
        }
        self.check("get_full_status")?;
        self.device(id, |d| d.status.clone())
    }

    fn is_on(&self, id: HwsId) -> Result<bool, ClientError> {
        self.check("is_on")?;
        self.device(id, |d| d.on)
    }

    fn is_heating(&self, id: HwsId) -> Result<bool, ClientError> {
        self.check("is_heating")?;
        self.device(id, |d| d.heating)
    }

    fn current_mode(&self, id: HwsId) -> Result<Option<i64>, ClientError> {
        self.check("current_mode")?;
        self.device(id, |d| d.mode)
    }

    fn get_daily_energy_usage(&self, id: HwsId) -> Result<Option<f64>, ClientError> {
        self.check("get_daily_energy_usage")?;
        self.device(id, |d| d.energy)
    }

    fn turn_on(&self, id: HwsId) -> Result<(), ClientError> {
        self.record("turn_on", Command::TurnOn(id))
    }

    fn turn_off(&self, id: HwsId) -> Result<(), ClientError> {
        self.record("turn_off", Command::TurnOff(id))
    }

    fn set_boost_mode(&self, id: HwsId) -> Result<(), ClientError> {
        self.record("set_boost_mode", Command::Boost(id))
    }

    fn set_quiet_mode(&self, id: HwsId) -> Result<(), ClientError> {
        self.record("set_quiet_mode", Command::Quiet(id))
    }

    fn set_normal_mode(&self, id: HwsId) -> Result<(), ClientError> {
        self.record("set_normal_mode", Command::Normal(id))
    }

    fn get_login_token(&self) -> Result<Option<String>, ClientError> {
        self.check("get_login_token")?;
        Ok(self.login_token.lock().clone())
    }

    fn replace_callback(&self, callback: VendorCallback) {
        *self.callback.lock() = Some(callback);
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifecycle of loaded accounts and their entities.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::client::{BlockingExecutor, ClientFactory, EmeraldClient};
use crate::config::ConfigEntry;
use crate::entity::{
    AccountContext, EnergySensor, Entity, RefreshReceiver, RefreshRequest, RefreshScheduler,
    WaterHeater,
};
use crate::error::{ClientError, Error, Result};
use crate::subscription::CallbackDispatcher;
use crate::types::HwsId;

/// An account that finished setup.
#[derive(Debug)]
struct LoadedEntry {
    context: AccountContext,
    entities: Vec<Entity>,
}

/// Sets up and tears down accounts, and routes refreshes to entities.
///
/// Each loaded entry owns one vendor client and one [`CallbackDispatcher`].
/// Push notifications from the client reach the entities' listeners, which
/// queue [`RefreshRequest`]s; the hub feeds those back through
/// [`refresh`](Self::refresh), [`drain_refreshes`](Self::drain_refreshes) or
/// [`run_refresh_loop`](Self::run_refresh_loop).
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use emeraldenergy::client::EmeraldClient;
/// use emeraldenergy::config::{AccountConfig, ConfigEntry};
/// use emeraldenergy::error::ClientError;
/// use emeraldenergy::manager::EntryManager;
///
/// # fn vendor_client(config: &AccountConfig) -> Result<Arc<dyn EmeraldClient>, ClientError> {
/// #     unimplemented!()
/// # }
/// # async fn example() -> emeraldenergy::Result<()> {
/// let (manager, refreshes) = EntryManager::new(vendor_client);
///
/// let entry = ConfigEntry::new("Emerald HWS", AccountConfig::new("me@example.com", "hunter2"));
/// let entry_id = entry.entry_id.clone();
/// manager.setup_entry(entry).await?;
///
/// for entity in manager.entities(&entry_id).await.unwrap_or_default() {
///     println!("{} ({})", entity.name(), entity.unique_id());
/// }
///
/// manager.run_refresh_loop(refreshes, std::future::pending()).await;
/// # Ok(())
/// # }
/// ```
pub struct EntryManager<F> {
    factory: Arc<F>,
    executor: BlockingExecutor,
    scheduler: RefreshScheduler,
    entries: RwLock<HashMap<String, LoadedEntry>>,
    availability: parking_lot::Mutex<HashMap<String, bool>>,
}

impl<F: ClientFactory + 'static> EntryManager<F> {
    /// Creates a manager and the receiver of its refresh queue.
    #[must_use]
    pub fn new(factory: F) -> (Self, RefreshReceiver) {
        Self::with_executor(factory, BlockingExecutor::new())
    }

    /// Creates a manager that runs vendor calls on `executor`.
    #[must_use]
    pub fn with_executor(factory: F, executor: BlockingExecutor) -> (Self, RefreshReceiver) {
        let (scheduler, receiver) = RefreshScheduler::channel();
        let manager = Self {
            factory: Arc::new(factory),
            executor,
            scheduler,
            entries: RwLock::new(HashMap::new()),
            availability: parking_lot::Mutex::new(HashMap::new()),
        };
        (manager, receiver)
    }

    // =========================================================================
    // Entry lifecycle
    // =========================================================================

    /// Connects an account and creates its entities.
    ///
    /// One water heater is created per device and, when energy monitoring
    /// is enabled, one energy sensor. Device IDs that are not UUIDs are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryAlreadyLoaded`] for a duplicate entry ID, or the
    /// first client, parse or worker failure. Entities created before a
    /// failure are unsubscribed again.
    pub async fn setup_entry(&self, entry: ConfigEntry) -> Result<()> {
        if self.entries.read().await.contains_key(&entry.entry_id) {
            return Err(Error::EntryAlreadyLoaded(entry.entry_id));
        }

        let loaded = match self.load(&entry).await {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!(entry = %entry.entry_id, error = %e, "Failed to set up entry");
                return Err(e);
            }
        };

        let mut entries = self.entries.write().await;
        if entries.contains_key(&entry.entry_id) {
            drop(entries);
            detach(&loaded.entities);
            return Err(Error::EntryAlreadyLoaded(entry.entry_id));
        }

        {
            let mut availability = self.availability.lock();
            for entity in &loaded.entities {
                availability.insert(entity.unique_id().to_string(), true);
            }
        }
        tracing::info!(
            entry = %entry.entry_id,
            title = %entry.title,
            entities = loaded.entities.len(),
            "Set up entry"
        );
        entries.insert(entry.entry_id, loaded);
        Ok(())
    }

    /// Unsubscribes and drops every entity of an entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if the entry is not loaded.
    pub async fn unload_entry(&self, entry_id: &str) -> Result<()> {
        let Some(loaded) = self.entries.write().await.remove(entry_id) else {
            return Err(Error::EntryNotFound(entry_id.to_string()));
        };

        detach(&loaded.entities);
        {
            let mut availability = self.availability.lock();
            for entity in &loaded.entities {
                availability.remove(entity.unique_id());
            }
        }
        tracing::info!(
            entry = %entry_id,
            listeners = loaded.context.dispatcher().len(),
            "Unloaded entry"
        );
        Ok(())
    }

    async fn load(&self, entry: &ConfigEntry) -> Result<LoadedEntry> {
        let factory = Arc::clone(&self.factory);
        let config = entry.data.clone();
        let client = self
            .executor
            .run(move || -> std::result::Result<Arc<dyn EmeraldClient>, ClientError> {
                let client = factory.create(&config)?;
                client.connect()?;
                Ok(client)
            })
            .await??;

        let dispatcher = Arc::new(CallbackDispatcher::new());
        client.replace_callback(dispatcher.vendor_callback());
        let context = AccountContext::new(client, dispatcher, self.executor.clone());

        let ids: Vec<HwsId> = context
            .call(|client| client.list_hws())
            .await?
            .into_iter()
            .filter_map(|raw| match raw.parse::<HwsId>() {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!(entry = %entry.entry_id, error = %e, "Skipping device");
                    None
                }
            })
            .collect();
        tracing::debug!(entry = %entry.entry_id, devices = ids.len(), "Listed devices");

        let mut entities = Vec::new();
        if let Err(e) = self
            .create_entities(
                &context,
                &ids,
                entry.data.enable_energy_monitoring,
                &mut entities,
            )
            .await
        {
            detach(&entities);
            return Err(e);
        }

        Ok(LoadedEntry { context, entities })
    }

    async fn create_entities(
        &self,
        context: &AccountContext,
        ids: &[HwsId],
        energy_monitoring: bool,
        entities: &mut Vec<Entity>,
    ) -> Result<()> {
        for &id in ids {
            let heater = WaterHeater::create(context.clone(), id, &self.scheduler).await?;
            entities.push(Entity::WaterHeater(heater));
        }
        if energy_monitoring {
            for &id in ids {
                let sensor = EnergySensor::create(context.clone(), id, &self.scheduler).await?;
                entities.push(Entity::EnergySensor(sensor));
            }
        } else {
            tracing::info!("Energy monitoring is disabled in configuration");
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns the IDs of all loaded entries, sorted.
    pub async fn entry_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.entries.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Returns the entities of an entry: water heaters first, then sensors.
    pub async fn entities(&self, entry_id: &str) -> Option<Vec<Entity>> {
        self.entries
            .read()
            .await
            .get(entry_id)
            .map(|loaded| loaded.entities.clone())
    }

    /// Looks up an entity of any loaded entry.
    pub async fn entity(&self, unique_id: &str) -> Option<Entity> {
        self.entries
            .read()
            .await
            .values()
            .flat_map(|loaded| loaded.entities.iter())
            .find(|entity| entity.unique_id() == unique_id)
            .cloned()
    }

    /// Returns whether the last refresh of an entity succeeded.
    ///
    /// `None` for entities that are not loaded.
    #[must_use]
    pub fn is_available(&self, unique_id: &str) -> Option<bool> {
        self.availability.lock().get(unique_id).copied()
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Refreshes one entity and records whether it is available.
    ///
    /// Availability is only recorded while the entity is still loaded; an
    /// update that finishes after its entry was unloaded leaves no trace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntityNotFound`] for unknown entities, or the
    /// entity's update failure after marking it unavailable.
    pub async fn refresh(&self, request: &RefreshRequest) -> Result<()> {
        let entity = self
            .entity(&request.unique_id)
            .await
            .ok_or_else(|| Error::EntityNotFound(request.unique_id.clone()))?;

        let result = entity.update().await;
        let available = result.is_ok();
        // Keys only exist for loaded entities, see `setup_entry`/`unload_entry`
        let previous = self
            .availability
            .lock()
            .get_mut(&request.unique_id)
            .map(|slot| std::mem::replace(slot, available));
        if previous.is_none() {
            tracing::debug!(entity = %request.unique_id, "Entity unloaded during refresh");
            return result;
        }

        match &result {
            Err(e) => {
                tracing::error!(entity = %request.unique_id, error = %e, "Entity update failed");
            }
            Ok(()) if previous == Some(false) => {
                tracing::info!(entity = %request.unique_id, "Entity available again");
            }
            Ok(()) => {}
        }
        result
    }

    /// Processes every queued refresh without waiting.
    ///
    /// Returns the number of requests taken from the queue.
    pub async fn drain_refreshes(&self, receiver: &mut RefreshReceiver) -> usize {
        let mut processed = 0;
        while let Ok(request) = receiver.try_recv() {
            self.handle(&request).await;
            processed += 1;
        }
        processed
    }

    /// Processes refreshes until `shutdown` completes or the queue closes.
    pub async fn run_refresh_loop<S>(&self, mut receiver: RefreshReceiver, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::debug!("Refresh loop started");
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                request = receiver.recv() => match request {
                    Some(request) => self.handle(&request).await,
                    None => break,
                },
            }
        }
        tracing::debug!("Refresh loop stopped");
    }

    async fn handle(&self, request: &RefreshRequest) {
        // Failures are logged by `refresh`
        if let Err(Error::EntityNotFound(id)) = self.refresh(request).await {
            tracing::debug!(entity = %id, "Dropping refresh for unloaded entity");
        }
    }
}

impl<F> std::fmt::Debug for EntryManager<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryManager")
            .field("executor", &self.executor)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

fn detach(entities: &[Entity]) {
    for entity in entities {
        entity.remove();
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Listener handles and the callback dispatcher.
//!
//! - [`Listener`] - Identity-comparable handle to a refresh callback
//! - [`CallbackDispatcher`] - Fan-out registry installed in the vendor client's callback slot

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::client::VendorCallback;
use crate::error::CallbackError;

type ListenerFn = dyn Fn() -> Result<(), CallbackError> + Send + Sync;

/// Handle to a callback registered with a [`CallbackDispatcher`].
///
/// Two handles are equal only when one is a clone of the other, so an
/// entity keeps its handle around to unregister exactly what it registered.
///
/// # Examples
///
/// ```
/// use emeraldenergy::subscription::Listener;
///
/// let a = Listener::new(|| Ok(()));
/// let b = Listener::new(|| Ok(()));
///
/// assert_eq!(a, a.clone());
/// assert_ne!(a, b);
/// ```
#[derive(Clone)]
pub struct Listener {
    label: Arc<str>,
    callback: Arc<ListenerFn>,
}

impl Listener {
    /// Creates a listener from a fallible callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn() -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        Self::labeled("listener", callback)
    }

    /// Creates a listener carrying a label used in log records.
    pub fn labeled<F>(label: impl Into<Arc<str>>, callback: F) -> Self
    where
        F: Fn() -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            callback: Arc::new(callback),
        }
    }

    /// Returns the label used in log records.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    fn call(&self) -> Result<(), CallbackError> {
        (self.callback)()
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Fans a single vendor notification out to many listeners.
///
/// The vendor client holds one callback slot per account; every entity of
/// that account registers a [`Listener`] here instead. Listeners run in
/// registration order on the thread that calls [`dispatch`](Self::dispatch).
///
/// # Thread Safety
///
/// Membership is guarded by one lock that is held only while the list is
/// mutated or copied. Callbacks run outside the lock, so a listener may
/// register or unregister (itself included) from inside its own callback.
///
/// # Fault Isolation
///
/// A listener that returns an error or panics is logged and skipped; the
/// remaining listeners still run and `dispatch` never fails.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use emeraldenergy::subscription::{CallbackDispatcher, Listener};
///
/// let dispatcher = CallbackDispatcher::new();
/// let hits = Arc::new(AtomicU32::new(0));
/// let counter = Arc::clone(&hits);
///
/// let listener = Listener::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
///     Ok(())
/// });
/// dispatcher.register(&listener);
/// dispatcher.register(&listener);
///
/// dispatcher.dispatch();
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
///
/// dispatcher.unregister(&listener);
/// dispatcher.dispatch();
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
#[derive(Default)]
pub struct CallbackDispatcher {
    listeners: Mutex<Vec<Listener>>,
}

impl CallbackDispatcher {
    /// Creates a dispatcher with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener unless it is already registered.
    ///
    /// Returns `true` if the listener was added.
    pub fn register(&self, listener: &Listener) -> bool {
        let mut listeners = self.listeners.lock();
        if listeners.contains(listener) {
            return false;
        }
        listeners.push(listener.clone());
        tracing::debug!(
            listener = listener.label(),
            listeners = listeners.len(),
            "Registered callback"
        );
        true
    }

    /// Removes a listener if present.
    ///
    /// Returns `true` if the listener was registered.
    pub fn unregister(&self, listener: &Listener) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(position) = listeners.iter().position(|l| l == listener) else {
            return false;
        };
        listeners.remove(position);
        tracing::debug!(
            listener = listener.label(),
            listeners = listeners.len(),
            "Unregistered callback"
        );
        true
    }

    /// Returns `true` if the listener is currently registered.
    #[must_use]
    pub fn is_registered(&self, listener: &Listener) -> bool {
        self.listeners.lock().contains(listener)
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Returns `true` if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    /// Invokes every registered listener once, in registration order.
    ///
    /// The listener list is copied before iteration. A listener that was
    /// unregistered by an earlier listener of the same cycle is skipped.
    pub fn dispatch(&self) {
        let snapshot = self.listeners.lock().clone();
        tracing::debug!(listeners = snapshot.len(), "Dispatching callback");

        for listener in &snapshot {
            if !self.is_registered(listener) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| listener.call())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(listener = listener.label(), error = %e, "Error in callback");
                }
                Err(payload) => {
                    tracing::error!(
                        listener = listener.label(),
                        panic = panic_message(payload.as_ref()),
                        "Callback panicked"
                    );
                }
            }
        }
    }

    /// Returns a callback suitable for the vendor client's single slot.
    ///
    /// The callback holds a weak reference; once the dispatcher is dropped
    /// it does nothing.
    #[must_use]
    pub fn vendor_callback(self: &Arc<Self>) -> VendorCallback {
        let dispatcher: Weak<Self> = Arc::downgrade(self);
        Box::new(move || match dispatcher.upgrade() {
            Some(dispatcher) => dispatcher.dispatch(),
            None => tracing::trace!("Vendor callback fired after dispatcher was dropped"),
        })
    }
}

impl fmt::Debug for CallbackDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackDispatcher")
            .field("listeners", &self.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

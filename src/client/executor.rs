// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounded worker pool for blocking vendor calls.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::{Error, Result};

/// Runs blocking closures on tokio's blocking thread pool.
///
/// At most `max_workers` closures run at once; further calls wait for a
/// permit. Cloning shares the same permits.
///
/// # Examples
///
/// ```
/// use emeraldenergy::client::BlockingExecutor;
///
/// # async fn example() -> emeraldenergy::Result<()> {
/// let executor = BlockingExecutor::new();
/// let answer = executor.run(|| 6 * 7).await?;
/// assert_eq!(answer, 42);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BlockingExecutor {
    permits: Arc<Semaphore>,
    max_workers: usize,
}

impl BlockingExecutor {
    /// Default number of concurrent blocking calls.
    pub const DEFAULT_MAX_WORKERS: usize = 4;

    /// Creates an executor with the default worker limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_workers(Self::DEFAULT_MAX_WORKERS)
    }

    /// Creates an executor allowing `max_workers` concurrent calls.
    ///
    /// A limit of zero is raised to one.
    #[must_use]
    pub fn with_max_workers(max_workers: usize) -> Self {
        let max_workers = max_workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_workers)),
            max_workers,
        }
    }

    /// Returns the worker limit.
    #[must_use]
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Runs `f` on a worker thread and returns its result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Executor`] if the worker panics or is cancelled.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| Error::Executor(e.to_string()))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            f()
        })
        .await
        .map_err(|e| Error::Executor(e.to_string()))
    }
}

impl Default for BlockingExecutor {
    fn default() -> Self {
        Self::new()
    }
}

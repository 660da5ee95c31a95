/*
 * vAgent SMTP routing rules
 * Copyright (C) 2022 viridIT SAS
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/
use crate::Config;
use std::sync::{Arc, PoisonError, RwLock};

/// Atomically replaceable configuration snapshot.
///
/// Readers take a cheap [`Arc`] clone of the current snapshot and keep using
/// it for the whole invocation; a reload publishes a complete new snapshot.
/// Readers never observe a half-updated configuration.
#[derive(Debug)]
pub struct ConfigHandle(RwLock<Arc<Config>>);

impl ConfigHandle {
    /// wrap an initial snapshot.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self(RwLock::new(Arc::new(config)))
    }

    /// the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Config> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// publish a complete new snapshot.
    pub fn replace(&self, config: Config) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

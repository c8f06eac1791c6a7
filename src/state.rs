// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::ApiKey;
use crate::config::AppConfig;
use crate::identity::IdentityPolicy;
use crate::services::VaultService;
use crate::storage::StorageBackend;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub vault: VaultService,
    pub api_key: ApiKey,
}

impl AppState {
    /// Build the storage backend named by the configuration.
    pub fn new(config: AppConfig) -> Self {
        let storage = StorageBackend::from_config(&config);
        Self::with_storage(config, storage)
    }

    /// Use an already constructed backend.
    pub fn with_storage(config: AppConfig, storage: StorageBackend) -> Self {
        let policy = IdentityPolicy::from_config(&config);
        let api_key = ApiKey::new(&config.api_key);
        Self {
            vault: VaultService::new(Arc::new(storage), Arc::new(policy)),
            api_key,
            config: Arc::new(config),
        }
    }
}

// Copyright 2025 VectorGraph
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Configuration Validation and Error Handling
//!
//! Catches configuration mistakes before a backend is built, with messages
//! that name the offending setting.

use anyhow::{bail, Context, Result};
use url::Url;

use super::index_name::IndexNameHelper;
use crate::core::{BackendConfig, BackendType, IndexingConfig, SearchConfig, StoreConfig};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate complete store configuration
    pub fn validate_store_config(config: &StoreConfig) -> Result<()> {
        Self::validate_backend(&config.backend).context("Backend configuration validation failed")?;

        Self::validate_indexing(&config.indexing)
            .context("Indexing configuration validation failed")?;

        Self::validate_search(&config.search).context("Search configuration validation failed")?;

        Ok(())
    }

    /// Validate backend selection and connection settings
    pub fn validate_backend(config: &BackendConfig) -> Result<()> {
        if config.backend_type == BackendType::Memory {
            return Ok(());
        }

        let connection = &config.connection;
        Self::validate_connection_uri(&connection.uri)
            .with_context(|| format!("Invalid connection URI: {}", connection.uri))?;

        if connection.username.is_empty() {
            bail!("Username cannot be empty");
        }

        if connection.database.is_empty() {
            bail!("Database name cannot be empty");
        }

        if connection.timeout_secs == 0 {
            bail!("Connection timeout must be greater than 0");
        }

        if connection.password.is_empty() {
            tracing::warn!(
                "No password configured for user '{}' on {}",
                connection.username,
                connection.uri
            );
        }

        Ok(())
    }

    /// Validate URI format for the HTTP backend
    pub fn validate_connection_uri(uri: &str) -> Result<()> {
        let parsed = Url::parse(uri).with_context(|| format!("Invalid URL format: {}", uri))?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => bail!("Unsupported URL scheme '{}', expected http or https", other),
        }

        if parsed.host_str().map_or(true, str::is_empty) {
            bail!("URL must specify a host");
        }

        Ok(())
    }

    pub fn validate_indexing(config: &IndexingConfig) -> Result<()> {
        if config.default_index.trim().is_empty() {
            bail!("Default index name cannot be empty");
        }

        IndexNameHelper::default()
            .convert(&config.default_index)
            .map_err(|e| anyhow::anyhow!("Invalid default index: {}", e))?;

        Ok(())
    }

    pub fn validate_search(config: &SearchConfig) -> Result<()> {
        if config.overfetch_factor == 0 {
            bail!("Over-fetch factor must be at least 1");
        }

        if config.max_top_k == 0 {
            bail!("Maximum top-k must be greater than 0");
        }

        Ok(())
    }
}

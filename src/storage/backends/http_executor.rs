// Copyright 2025 VectorGraph
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Neo4j HTTP Executor
//!
//! Runs Cypher statements through Neo4j's transactional HTTP endpoint
//! (`POST {uri}/db/{database}/tx/commit`) with basic authentication. Each
//! statement is committed in its own transaction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

use super::cypher_backend::{CypherExecutor, CypherStatement, Row};
use crate::core::{BackendError, BackendResult, ConnectionConfig};

pub struct HttpCypherExecutor {
    http_client: reqwest::Client,
    endpoint: Url,
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct TxRequest<'a> {
    statements: [TxStatement<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TxStatement<'a> {
    statement: &'a str,
    parameters: &'a Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Debug, Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    code: String,
    message: String,
}

impl HttpCypherExecutor {
    pub fn new(config: &ConnectionConfig) -> BackendResult<Self> {
        let endpoint = Self::commit_endpoint(&config.uri, &config.database)?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn commit_endpoint(uri: &str, database: &str) -> BackendResult<Url> {
        let mut base = Url::parse(uri)
            .map_err(|e| BackendError::Unavailable(format!("Invalid URI '{}': {}", uri, e)))?;

        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        base.join(&format!("db/{}/tx/commit", database))
            .map_err(|e| BackendError::Unavailable(format!("Invalid database '{}': {}", database, e)))
    }
}

fn classify_error(error: TxError) -> BackendError {
    if error.code.starts_with("Neo.ClientError.Security") {
        BackendError::Unavailable(format!("{}: {}", error.code, error.message))
    } else if error.message.contains("no such vector schema index")
        || error.message.contains("no such index")
    {
        BackendError::IndexNotFound(error.message)
    } else {
        BackendError::Query(format!("{}: {}", error.code, error.message))
    }
}

fn parse_response(response: TxResponse) -> BackendResult<Vec<Row>> {
    if let Some(error) = response.errors.into_iter().next() {
        return Err(classify_error(error));
    }

    let Some(result) = response.results.into_iter().next() else {
        return Ok(Vec::new());
    };

    Ok(result
        .data
        .into_iter()
        .map(|data| result.columns.iter().cloned().zip(data.row).collect::<Row>())
        .collect())
}

#[async_trait]
impl CypherExecutor for HttpCypherExecutor {
    fn executor_name(&self) -> &'static str {
        "neo4j-http"
    }

    async fn execute(&self, statement: CypherStatement) -> BackendResult<Vec<Row>> {
        let body = TxRequest {
            statements: [TxStatement {
                statement: &statement.text,
                parameters: &statement.parameters,
            }],
        };

        tracing::debug!("POST {} : {}", self.endpoint, statement.text);

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    BackendError::Unavailable(e.to_string())
                } else {
                    BackendError::Protocol(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(BackendError::Unavailable(format!(
                "Authentication rejected for user '{}' ({})",
                self.username, status
            )));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::Query(format!("HTTP {}: {}", status, text)));
        }

        let parsed = response
            .json::<TxResponse>()
            .await
            .map_err(|e| BackendError::Protocol(e.to_string()))?;

        parse_response(parsed)
    }
}

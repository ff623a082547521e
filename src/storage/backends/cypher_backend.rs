// Copyright 2025 VectorGraph
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Cypher Backend
//!
//! Renders every [`GraphBackend`] operation as a parameterized Cypher
//! statement and hands it to a [`CypherExecutor`]. The executor owns the
//! transport (HTTP, Bolt, ...); this module owns the statements and the
//! decoding of their rows.
//!
//! Index names are validated to `[a-z0-9-]` before they get here, but
//! identifiers are still backtick-quoted since labels with hyphens need it.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::{
    BackendCapabilities, GraphBackend, GraphNode, IndexLayout, ScoredNode, VectorIndexSpec,
};
use crate::core::{BackendError, BackendResult, Vector};

/// One result row, keyed by column name.
pub type Row = Map<String, Value>;

/// Statement text and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CypherStatement {
    pub text: String,
    pub parameters: Map<String, Value>,
}

/// Transport executing Cypher statements against an engine.
#[async_trait]
pub trait CypherExecutor: Send + Sync {
    fn executor_name(&self) -> &'static str;

    /// Run one statement in its own transaction
    async fn execute(&self, statement: CypherStatement) -> BackendResult<Vec<Row>>;
}

fn quote(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

fn params(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl CypherStatement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: Map::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = params(parameters);
        self
    }

    pub fn ping() -> Self {
        Self::new("RETURN 1 AS ok")
    }

    pub fn create_vector_index(spec: &VectorIndexSpec) -> Self {
        let text = format!(
            "CREATE VECTOR INDEX {index} IF NOT EXISTS\n\
             FOR (m:{label}) ON (m.{property})\n\
             OPTIONS {{ indexConfig: {{\n\
             `vector.dimensions`: $vectorSize,\n\
             `vector.similarity_function`: '{similarity}'\n\
             }} }}",
            index = quote(&spec.layout.name),
            label = quote(&spec.layout.label),
            property = quote(&spec.layout.property_key),
            similarity = spec.similarity.similarity_function(),
        );
        Self::new(text).with_parameters(json!({ "vectorSize": spec.dimensions }))
    }

    pub fn list_vector_indexes() -> Self {
        Self::new(
            "SHOW VECTOR INDEXES YIELD name, labelsOrTypes, properties, options\n\
             RETURN name, labelsOrTypes[0] AS label, properties[0] AS propertyKey,\n\
             options.indexConfig['vector.dimensions'] AS dimensions",
        )
    }

    pub fn describe_vector_index(layout: &IndexLayout) -> Self {
        Self::new(
            "SHOW VECTOR INDEXES YIELD name, labelsOrTypes, properties, options\n\
             WHERE name = $indexName\n\
             RETURN name, labelsOrTypes[0] AS label, properties[0] AS propertyKey,\n\
             options.indexConfig['vector.dimensions'] AS dimensions",
        )
        .with_parameters(json!({ "indexName": layout.name }))
    }

    pub fn drop_vector_index(layout: &IndexLayout) -> Self {
        Self::new(format!("DROP INDEX {} IF EXISTS", quote(&layout.name)))
    }

    pub fn delete_label_nodes(layout: &IndexLayout) -> Self {
        Self::new(format!("MATCH (m:{}) DETACH DELETE m", quote(&layout.label)))
    }

    /// Full replace of the node's properties, then the vector property.
    pub fn merge_node(layout: &IndexLayout, node: &GraphNode) -> Self {
        let text = format!(
            "MERGE (m:Memory:{label} {{id: $recordId}})\n\
             SET m = $properties\n\
             WITH m\n\
             CALL db.create.setNodeVectorProperty(m, $propertyKey, $vector)\n\
             RETURN m.id AS recordId",
            label = quote(&layout.label),
        );

        let mut properties = node.properties.clone();
        properties.insert("id".to_string(), Value::String(node.id.clone()));

        Self::new(text).with_parameters(json!({
            "recordId": node.id,
            "properties": properties,
            "propertyKey": layout.property_key,
            "vector": node.vector.clone().unwrap_or_default(),
        }))
    }

    pub fn query_nodes(layout: &IndexLayout, query: &[f32], top_k: usize, with_vectors: bool) -> Self {
        let vector_column = if with_vectors { "node[$propertyKey]" } else { "null" };
        let text = format!(
            "CALL db.index.vector.queryNodes($indexName, $topK, $vector)\n\
             YIELD node, score\n\
             RETURN score, node.id AS recordId, properties(node) AS properties, {} AS vector",
            vector_column
        );
        Self::new(text).with_parameters(json!({
            "indexName": layout.name,
            "topK": top_k,
            "propertyKey": layout.property_key,
            "vector": query,
        }))
    }

    pub fn delete_node(layout: &IndexLayout, id: &str) -> Self {
        Self::new(format!(
            "MATCH (m:{} {{id: $recordId}}) DETACH DELETE m",
            quote(&layout.label)
        ))
        .with_parameters(json!({ "recordId": id }))
    }

    pub fn scan_nodes(layout: &IndexLayout, limit: usize, with_vectors: bool) -> Self {
        let vector_column = if with_vectors { "m[$propertyKey]" } else { "null" };
        let text = format!(
            "MATCH (m:{label})\n\
             RETURN m.id AS recordId, properties(m) AS properties, {vector} AS vector\n\
             ORDER BY recordId\n\
             LIMIT $limit",
            label = quote(&layout.label),
            vector = vector_column,
        );
        Self::new(text).with_parameters(json!({
            "propertyKey": layout.property_key,
            "limit": limit,
        }))
    }
}

fn column<'a>(row: &'a Row, name: &str) -> BackendResult<&'a Value> {
    row.get(name)
        .ok_or_else(|| BackendError::Protocol(format!("Missing column '{}' in result row", name)))
}

fn string_column(row: &Row, name: &str) -> BackendResult<String> {
    match column(row, name)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(BackendError::Protocol(format!(
            "Column '{}' is not a string: {}",
            name, other
        ))),
    }
}

fn vector_column(row: &Row, name: &str) -> BackendResult<Option<Vector>> {
    match row.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_f64().map(|x| x as f32).ok_or_else(|| {
                    BackendError::Protocol(format!("Non-numeric vector component: {}", item))
                })
            })
            .collect::<BackendResult<Vector>>()
            .map(Some),
        Some(other) => Err(BackendError::Protocol(format!(
            "Column '{}' is not a vector: {}",
            name, other
        ))),
    }
}

fn node_from_row(row: &Row, layout: &IndexLayout) -> BackendResult<GraphNode> {
    let id = string_column(row, "recordId")?;
    let mut properties = match row.get("properties") {
        Some(Value::Object(map)) => map.clone(),
        None | Some(Value::Null) => Map::new(),
        Some(other) => {
            return Err(BackendError::Protocol(format!(
                "Column 'properties' is not a map: {}",
                other
            )))
        }
    };
    // The vector travels in its own column
    properties.remove(&layout.property_key);

    Ok(GraphNode {
        id,
        properties,
        vector: vector_column(row, "vector")?,
    })
}

fn spec_from_row(row: &Row) -> BackendResult<VectorIndexSpec> {
    let name = string_column(row, "name")?;
    let derived = IndexLayout::for_index(&name);
    let label = row
        .get("label")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or(derived.label);
    let property_key = row
        .get("propertyKey")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or(derived.property_key);
    let dimensions = row.get("dimensions").and_then(Value::as_u64).unwrap_or(0) as usize;

    Ok(VectorIndexSpec::new(
        IndexLayout {
            name,
            label,
            property_key,
        },
        dimensions,
    ))
}

/// [`GraphBackend`] speaking Cypher through any executor.
#[derive(Clone)]
pub struct CypherBackend {
    executor: Arc<dyn CypherExecutor>,
}

impl CypherBackend {
    pub fn new(executor: Arc<dyn CypherExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl GraphBackend for CypherBackend {
    fn backend_name(&self) -> &'static str {
        self.executor.executor_name()
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            supports_scan: true,
            ..Default::default()
        }
    }

    async fn health_check(&self) -> BackendResult<bool> {
        let rows = self.executor.execute(CypherStatement::ping()).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("ok"))
            .and_then(Value::as_i64)
            == Some(1))
    }

    async fn create_vector_index(&self, spec: &VectorIndexSpec) -> BackendResult<()> {
        self.executor
            .execute(CypherStatement::create_vector_index(spec))
            .await?;
        Ok(())
    }

    async fn list_vector_indexes(&self) -> BackendResult<Vec<VectorIndexSpec>> {
        let rows = self
            .executor
            .execute(CypherStatement::list_vector_indexes())
            .await?;
        rows.iter().map(spec_from_row).collect()
    }

    async fn describe_vector_index(
        &self,
        layout: &IndexLayout,
    ) -> BackendResult<Option<VectorIndexSpec>> {
        let rows = self
            .executor
            .execute(CypherStatement::describe_vector_index(layout))
            .await?;
        rows.first().map(spec_from_row).transpose()
    }

    async fn drop_vector_index(&self, layout: &IndexLayout) -> BackendResult<()> {
        // Schema and data changes cannot share a transaction
        self.executor
            .execute(CypherStatement::delete_label_nodes(layout))
            .await?;
        self.executor
            .execute(CypherStatement::drop_vector_index(layout))
            .await?;
        Ok(())
    }

    async fn merge_node(&self, layout: &IndexLayout, node: GraphNode) -> BackendResult<String> {
        let rows = self
            .executor
            .execute(CypherStatement::merge_node(layout, &node))
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| BackendError::Protocol("Upsert returned no rows".to_string()))?;
        string_column(row, "recordId")
    }

    async fn query_nodes(
        &self,
        layout: &IndexLayout,
        query: &[f32],
        top_k: usize,
        with_vectors: bool,
    ) -> BackendResult<Vec<ScoredNode>> {
        let rows = self
            .executor
            .execute(CypherStatement::query_nodes(layout, query, top_k, with_vectors))
            .await?;

        rows.iter()
            .map(|row| {
                let score = column(row, "score")?.as_f64().ok_or_else(|| {
                    BackendError::Protocol("Column 'score' is not a number".to_string())
                })?;
                Ok(ScoredNode {
                    node: node_from_row(row, layout)?,
                    score,
                })
            })
            .collect()
    }

    async fn delete_node(&self, layout: &IndexLayout, id: &str) -> BackendResult<()> {
        self.executor
            .execute(CypherStatement::delete_node(layout, id))
            .await?;
        Ok(())
    }

    async fn scan_nodes(
        &self,
        layout: &IndexLayout,
        limit: usize,
        with_vectors: bool,
    ) -> BackendResult<Vec<GraphNode>> {
        let rows = self
            .executor
            .execute(CypherStatement::scan_nodes(layout, limit, with_vectors))
            .await?;
        rows.iter().map(|row| node_from_row(row, layout)).collect()
    }
}

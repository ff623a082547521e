// Copyright 2025 VectorGraph
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! VectorGraph CLI - operator access to a vector memory store

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vectorgraph::{
    BackendType, GraphMemory, ListRequest, MemoryDb, MemoryFilter, MemoryRecord, SearchRequest,
    StoreConfig,
};

#[derive(Parser)]
#[command(name = "vectorgraph-cli")]
#[command(about = "VectorGraph vector memory command line interface")]
struct Cli {
    #[arg(short, long, default_value = "vectorgraph.toml")]
    config: PathBuf,

    /// Use the in-process engine instead of the configured backend
    #[arg(long)]
    in_memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List vector indexes
    ListIndexes,
    /// Create a vector index
    CreateIndex { name: String, dimensions: usize },
    /// Drop a vector index and its records
    DeleteIndex { name: String },
    /// Insert or replace a record read from a JSON file
    Upsert { index: String, file: PathBuf },
    /// Nearest-neighbor search
    Search {
        index: String,
        #[arg(short, long)]
        vector: String, // JSON array
        #[arg(short, long, default_value_t = 10)]
        limit: i64,
        #[arg(long, default_value_t = 0.0)]
        min_relevance: f64,
        /// Tag filter as key=value, repeated filters are OR-ed
        #[arg(short, long)]
        filter: Vec<String>,
        #[arg(long)]
        with_vectors: bool,
    },
    /// List records without a query vector
    GetAll {
        index: String,
        #[arg(short, long, default_value_t = 0)]
        limit: i64,
        #[arg(short, long)]
        filter: Vec<String>,
    },
    /// Delete a record by id
    Delete { index: String, id: String },
}

fn load_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = if cli.config.exists() {
        StoreConfig::from_file(&cli.config)?
    } else {
        StoreConfig::default()
    };
    config.apply_env_overrides();
    if cli.in_memory {
        config.backend.backend_type = BackendType::Memory;
    }
    Ok(config)
}

fn parse_filter(raw: &str) -> Result<MemoryFilter> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("Filter '{}' must be written as key=value", raw);
    };
    if key.is_empty() {
        bail!("Filter '{}' has an empty key", raw);
    }
    Ok(MemoryFilter::new().by_tag(key, value))
}

async fn run(command: Commands, memory: &GraphMemory, cancel: &CancellationToken) -> Result<()> {
    match command {
        Commands::ListIndexes => {
            for name in memory.get_indexes(cancel).await? {
                println!("{}", name);
            }
        }
        Commands::CreateIndex { name, dimensions } => {
            memory.create_index(&name, dimensions, cancel).await?;
            info!("Index {} ready", name);
        }
        Commands::DeleteIndex { name } => {
            memory.delete_index(&name, cancel).await?;
            info!("Index {} deleted", name);
        }
        Commands::Upsert { index, file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read record file: {:?}", file))?;
            let record: MemoryRecord = serde_json::from_str(&text)
                .with_context(|| format!("Invalid record in {:?}", file))?;
            let id = memory.upsert(&index, &record, cancel).await?;
            println!("{}", id);
        }
        Commands::Search {
            index,
            vector,
            limit,
            min_relevance,
            filter,
            with_vectors,
        } => {
            let query: Vec<f32> =
                serde_json::from_str(&vector).context("Query vector must be a JSON array")?;
            let mut request = SearchRequest::new(query)
                .limit(limit)
                .min_relevance(min_relevance)
                .with_vectors(with_vectors);
            for raw in &filter {
                request = request.with_filter(parse_filter(raw)?);
            }

            let mut results = memory.get_similar_list(&index, request, cancel).await?;
            while let Some((record, score)) = results.try_next().await? {
                println!("{:.6}\t{}", score, serde_json::to_string(&record)?);
            }
        }
        Commands::GetAll {
            index,
            limit,
            filter,
        } => {
            let mut request = ListRequest::default().limit(limit);
            for raw in &filter {
                request = request.with_filter(parse_filter(raw)?);
            }

            let mut records = memory.get_list(&index, request, cancel).await?;
            while let Some(record) = records.try_next().await? {
                println!("{}", serde_json::to_string(&record)?);
            }
        }
        Commands::Delete { index, id } => {
            memory
                .delete(&index, &MemoryRecord::new(id, Vec::new()), cancel)
                .await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let memory = GraphMemory::connect(config).await?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received interrupt, cancelling");
            on_signal.cancel();
        }
    });

    run(cli.command, &memory, &cancel).await
}

// Copyright 2025 VectorGraph
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Index Name Validation and Normalization
//!
//! Graph engines accept a narrow grammar for index names, labels and
//! property keys. Every caller supplied name goes through
//! [`IndexNameHelper`] before it reaches a backend.
//!
//! Rules (all are checked, every violation is reported):
//! - at most 255 bytes of UTF-8 input, surrounding whitespace included
//! - only ASCII letters, digits and hyphens once trimmed and lowercased
//! - no leading hyphen or underscore
//! - not `.`, `..` or a dots-and-digits name such as `1.2.3`
//!
//! An empty name selects the configured default index.

use std::fmt;
use thiserror::Error;
use tracing::warn;

use crate::core::{MemoryDbError, MemoryResult, DEFAULT_INDEX};

pub const MAX_INDEX_NAME_BYTES: usize = 255;

const SEPARATOR: char = '-';

/// Class of a character rejected in an index name. Repeated characters of
/// the same class are reported once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Whitespace,
    Slash,
    Backslash,
    Dot,
    Colon,
    Underscore,
    Other(char),
}

impl CharClass {
    /// Class of `c`, or `None` when `c` is allowed in a normalized name.
    pub fn of(c: char) -> Option<CharClass> {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == SEPARATOR {
            return None;
        }
        let class = match c {
            '/' => CharClass::Slash,
            '\\' => CharClass::Backslash,
            '.' => CharClass::Dot,
            ':' => CharClass::Colon,
            '_' => CharClass::Underscore,
            c if c.is_whitespace() => CharClass::Whitespace,
            other => CharClass::Other(other),
        };
        Some(class)
    }
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharClass::Whitespace => write!(f, "whitespace"),
            CharClass::Slash => write!(f, "'/'"),
            CharClass::Backslash => write!(f, "'\\'"),
            CharClass::Dot => write!(f, "'.'"),
            CharClass::Colon => write!(f, "':'"),
            CharClass::Underscore => write!(f, "'_'"),
            CharClass::Other(c) => write!(f, "'{}'", c),
        }
    }
}

/// A violated naming rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexNameError {
    #[error("An index name cannot be longer than 255 bytes (got {bytes})")]
    TooLong { bytes: usize },

    #[error("An index name can only contain letters, digits, and hyphens (-), found {0}")]
    InvalidCharacter(CharClass),

    #[error("An index name cannot start with '{0}'")]
    InvalidStart(char),

    #[error("An index name cannot be only dots, or dots and numbers")]
    ReservedName,
}

impl IndexNameError {
    pub fn code(&self) -> &'static str {
        match self {
            IndexNameError::TooLong { .. } => "TooLong",
            IndexNameError::InvalidCharacter(_) => "InvalidCharacter",
            IndexNameError::InvalidStart(_) => "InvalidStart",
            IndexNameError::ReservedName => "ReservedName",
        }
    }
}

/// Outcome of validating one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNameConversion {
    /// Normalized name; empty when validation failed.
    pub actual_index_name: String,
    /// Violated rules in the order they were checked.
    pub errors: Vec<IndexNameError>,
}

impl IndexNameConversion {
    pub fn succeeded(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNameHelper {
    default_index: String,
}

impl Default for IndexNameHelper {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX)
    }
}

impl IndexNameHelper {
    /// `default_index` is what an empty name resolves to. It is normalized,
    /// and a default that is still not a valid index name is replaced by
    /// [`DEFAULT_INDEX`].
    pub fn new(default_index: impl AsRef<str>) -> Self {
        let requested = default_index.as_ref();
        let fallback = Self {
            default_index: DEFAULT_INDEX.to_string(),
        };

        let conversion = fallback.try_convert(&normalize(requested));
        if conversion.succeeded() {
            Self {
                default_index: conversion.actual_index_name,
            }
        } else {
            warn!(
                "Default index '{}' is not a valid index name, using '{}'",
                requested, DEFAULT_INDEX
            );
            fallback
        }
    }

    pub fn default_index(&self) -> &str {
        &self.default_index
    }

    /// Validate `raw`, collecting every violated rule.
    pub fn try_convert(&self, raw: &str) -> IndexNameConversion {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return IndexNameConversion {
                actual_index_name: self.default_index.clone(),
                errors: Vec::new(),
            };
        }

        let candidate = trimmed.to_lowercase();
        let mut errors = Vec::new();

        if raw.len() > MAX_INDEX_NAME_BYTES {
            errors.push(IndexNameError::TooLong { bytes: raw.len() });
        }

        if let Some(first @ ('-' | '_')) = candidate.chars().next() {
            errors.push(IndexNameError::InvalidStart(first));
        }

        // A dots-and-digits name is rejected as a whole; its dots are not
        // reported again as characters.
        if is_reserved(&candidate) {
            errors.push(IndexNameError::ReservedName);
        } else {
            let mut seen: Vec<CharClass> = Vec::new();
            for class in candidate.chars().filter_map(CharClass::of) {
                if !seen.contains(&class) {
                    seen.push(class);
                    errors.push(IndexNameError::InvalidCharacter(class));
                }
            }
        }

        let actual_index_name = if errors.is_empty() {
            normalize(&candidate)
        } else {
            String::new()
        };

        IndexNameConversion {
            actual_index_name,
            errors,
        }
    }

    /// Validate `raw` and return its normalized form.
    pub fn convert(&self, raw: &str) -> MemoryResult<String> {
        let conversion = self.try_convert(raw);
        if conversion.succeeded() {
            Ok(conversion.actual_index_name)
        } else {
            Err(MemoryDbError::InvalidName {
                name: raw.to_string(),
                errors: conversion.errors,
            })
        }
    }
}

/// Trim, lowercase, collapse every run of whitespace, `\`, `/`, `.`, `_`
/// and `:` into a single hyphen, then trim again.
pub fn normalize(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut normalized = String::with_capacity(lowered.len());
    let mut in_separator_run = false;

    for c in lowered.chars() {
        if is_separator(c) {
            if !in_separator_run {
                normalized.push(SEPARATOR);
                in_separator_run = true;
            }
        } else {
            normalized.push(c);
            in_separator_run = false;
        }
    }

    normalized.trim().to_string()
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\\' | '/' | '.' | '_' | ':')
}

fn is_reserved(name: &str) -> bool {
    name == "."
        || name == ".."
        || (name.contains('.') && name.chars().all(|c| c == '.' || c.is_ascii_digit()))
}

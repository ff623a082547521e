// Copyright 2025 VectorGraph
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Tag filter matching applied to search candidates.

use crate::core::{MemoryFilter, TagCollection};

/// True when `tags` satisfy at least one filter (OR). A filter is satisfied
/// when every key it names is present in `tags` with at least one of the
/// accepted values (AND). No filters match everything.
pub fn tags_match_filters(tags: &TagCollection, filters: &[MemoryFilter]) -> bool {
    if filters.is_empty() {
        return true;
    }

    filters.iter().any(|filter| filter_matches(tags, filter))
}

fn filter_matches(tags: &TagCollection, filter: &MemoryFilter) -> bool {
    filter.conditions().all(|(key, accepted)| match tags.get(key) {
        Some(values) => values.iter().any(|value| accepted.contains(value)),
        None => false,
    })
}

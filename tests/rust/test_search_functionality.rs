//! Search and tag filtering integration tests

use super::common::*;
use anyhow::Result;
use futures::TryStreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vectorgraph::storage::MemoryGraphBackend;
use vectorgraph::{
    GraphMemory, IndexNameHelper, MemoryDb, MemoryFilter, MemoryRecord, SearchConfig,
    SearchRequest,
};

async fn seeded_memory(config: SearchConfig) -> Result<(GraphMemory, String)> {
    let memory = GraphMemory::with_backend(
        Arc::new(MemoryGraphBackend::new()),
        IndexNameHelper::default(),
        config,
    );
    let cancel = CancellationToken::new();
    let index = generate_test_index_name();
    memory.create_index(&index, 2, &cancel).await?;

    let records = [
        MemoryRecord::new("north", vec![0.0, 1.0])
            .with_tag("user", "alice")
            .with_tag("type", "news"),
        MemoryRecord::new("north-east", vec![0.7, 0.7])
            .with_tag("user", "bob")
            .with_tag("type", "news"),
        MemoryRecord::new("east", vec![1.0, 0.0])
            .with_tag("user", "alice")
            .with_tag("type", "blog"),
        MemoryRecord::new("south", vec![0.0, -1.0]).with_tag("user", "carol"),
    ];
    for record in &records {
        memory.upsert(&index, record, &cancel).await?;
    }
    Ok((memory, index))
}

async fn search_ids(memory: &GraphMemory, index: &str, request: SearchRequest) -> Result<Vec<String>> {
    let cancel = CancellationToken::new();
    Ok(memory
        .get_similar_list(index, request, &cancel)
        .await?
        .map_ok(|(record, _)| record.id)
        .try_collect()
        .await?)
}

#[cfg(test)]
mod search_tests {
    use super::*;

    #[tokio::test]
    async fn test_results_ordered_by_descending_score() -> Result<()> {
        init_test_env();
        let (memory, index) = seeded_memory(SearchConfig::default()).await?;
        let cancel = CancellationToken::new();

        let results: Vec<_> = memory
            .get_similar_list(&index, SearchRequest::new(vec![0.0, 1.0]).limit(0), &cancel)
            .await?
            .try_collect()
            .await?;

        let ids: Vec<&str> = results.iter().map(|(r, _)| r.id.as_str()).collect();
        assert_eq!(ids, vec!["north", "north-east", "east", "south"]);
        assert!(results.windows(2).all(|pair| pair[0].1 >= pair[1].1));
        assert!(results.iter().all(|(_, score)| (0.0..=1.0).contains(score)));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_filter_set_returns_top_k() -> Result<()> {
        let (memory, index) = seeded_memory(SearchConfig::default()).await?;

        let ids = search_ids(&memory, &index, SearchRequest::new(vec![0.0, 1.0]).limit(2)).await?;
        assert_eq!(ids, vec!["north", "north-east"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_filters_are_or_of_and() -> Result<()> {
        let (memory, index) = seeded_memory(SearchConfig::default()).await?;

        let alice_news = SearchRequest::new(vec![0.0, 1.0])
            .limit(0)
            .with_filter(MemoryFilter::new().by_tag("user", "alice").by_tag("type", "news"));
        assert_eq!(search_ids(&memory, &index, alice_news).await?, vec!["north"]);

        let bob_or_carol = SearchRequest::new(vec![0.0, 1.0])
            .limit(0)
            .with_filter(MemoryFilter::new().by_tag("user", "bob"))
            .with_filter(MemoryFilter::new().by_tag("user", "carol"));
        assert_eq!(
            search_ids(&memory, &index, bob_or_carol).await?,
            vec!["north-east", "south"]
        );

        let any_of_values = SearchRequest::new(vec![0.0, 1.0])
            .limit(0)
            .with_filter(MemoryFilter::new().by_tag("type", "blog").by_tag("type", "news"));
        assert_eq!(search_ids(&memory, &index, any_of_values).await?.len(), 3);

        let missing_key = SearchRequest::new(vec![0.0, 1.0])
            .limit(0)
            .with_filter(MemoryFilter::new().by_tag("lang", "en"));
        assert!(search_ids(&memory, &index, missing_key).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_post_filtering_may_return_fewer_than_limit() -> Result<()> {
        let (memory, index) = seeded_memory(SearchConfig::default()).await?;

        // The two nearest candidates belong to alice and bob; carol's record
        // is outside the window and is not fetched.
        let request = SearchRequest::new(vec![0.0, 1.0])
            .limit(2)
            .with_filter(MemoryFilter::new().by_tag("user", "carol"));
        assert!(search_ids(&memory, &index, request).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_overfetch_widens_candidate_window() -> Result<()> {
        let (memory, index) = seeded_memory(SearchConfig {
            overfetch_factor: 4,
            ..SearchConfig::default()
        })
        .await?;

        let request = SearchRequest::new(vec![0.0, 1.0])
            .limit(1)
            .with_filter(MemoryFilter::new().by_tag("user", "carol"));
        assert_eq!(search_ids(&memory, &index, request).await?, vec!["south"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_min_relevance() -> Result<()> {
        let (memory, index) = seeded_memory(SearchConfig::default()).await?;

        let request = SearchRequest::new(vec![0.0, 1.0]).limit(0).min_relevance(0.8);
        assert_eq!(
            search_ids(&memory, &index, request).await?,
            vec!["north", "north-east"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_searches() -> Result<()> {
        let (memory, index) = seeded_memory(SearchConfig::default()).await?;

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let memory = memory.clone();
                let index = index.clone();
                tokio::spawn(async move {
                    search_ids(&memory, &index, SearchRequest::new(vec![1.0, 0.0]).limit(1)).await
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await??, vec!["east"]);
        }
        Ok(())
    }
}

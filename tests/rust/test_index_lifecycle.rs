//! Index lifecycle integration tests

use super::common::*;
use anyhow::Result;
use tokio_util::sync::CancellationToken;
use vectorgraph::{MemoryDb, MemoryDbError, SearchRequest};

#[cfg(test)]
mod index_lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_index_twice_is_noop() -> Result<()> {
        init_test_env();
        let (memory, _) = create_test_memory();
        let cancel = CancellationToken::new();
        let index = generate_test_index_name();

        memory.create_index(&index, 384, &cancel).await?;
        memory.create_index(&index, 384, &cancel).await?;

        assert_eq!(memory.get_indexes(&cancel).await?, vec![index]);
        println!("✅ Second create is a no-op");
        Ok(())
    }

    #[tokio::test]
    async fn test_recreate_with_other_dimensions_is_rejected() -> Result<()> {
        let (memory, _) = create_test_memory();
        let cancel = CancellationToken::new();
        let index = generate_test_index_name();

        memory.create_index(&index, 8, &cancel).await?;
        let err = memory.create_index(&index, 16, &cancel).await.unwrap_err();

        assert!(matches!(
            err,
            MemoryDbError::DimensionMismatch { expected: 8, actual: 16, .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_follows_creation_order() -> Result<()> {
        let (memory, _) = create_test_memory();
        let cancel = CancellationToken::new();

        for name in ["Alpha", "beta", "Gamma-Notes"] {
            memory.create_index(name, 4, &cancel).await?;
        }

        assert_eq!(
            memory.get_indexes(&cancel).await?,
            vec!["alpha", "beta", "gamma-notes"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_index_removes_records() -> Result<()> {
        let (memory, backend) = create_test_memory();
        let cancel = CancellationToken::new();
        let index = generate_test_index_name();

        memory.create_index(&index, 4, &cancel).await?;
        for i in 0..5 {
            memory
                .upsert(&index, &create_test_record(&format!("r{}", i), 4, i), &cancel)
                .await?;
        }
        let layout = vectorgraph::storage::IndexLayout::for_index(&index);
        assert_eq!(backend.node_count(&layout).await, 5);

        memory.delete_index(&index, &cancel).await?;
        assert_eq!(backend.node_count(&layout).await, 0);
        assert!(memory.get_indexes(&cancel).await?.is_empty());

        let err = memory
            .get_similar_list(&index, SearchRequest::new(vec![0.1; 4]), &cancel)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, MemoryDbError::IndexNotFound(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_missing_index_is_noop() -> Result<()> {
        let (memory, _) = create_test_memory();
        let cancel = CancellationToken::new();

        memory.delete_index(&generate_test_index_name(), &cancel).await?;
        memory.delete_index("", &cancel).await?;
        Ok(())
    }
}

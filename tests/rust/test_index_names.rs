//! Index name validation through the public facade

use super::common::*;
use anyhow::Result;
use tokio_util::sync::CancellationToken;
use vectorgraph::storage::index_name::{normalize, IndexNameError};
use vectorgraph::{IndexNameHelper, MemoryDb, MemoryDbError};

#[cfg(test)]
mod index_name_tests {
    use super::*;

    #[test]
    fn test_each_rejected_character_is_reported_once() {
        init_test_env();
        let helper = IndexNameHelper::default();

        for c in [' ', '/', '\\', '.', ':', '*', '<', '>', '|', '?', '"', '\'', '`', '~', '!'] {
            let name = format!("name{}suffix", c);
            let conversion = helper.try_convert(&name);

            assert_eq!(conversion.errors.len(), 1, "{:?} -> {:?}", name, conversion.errors);
            assert!(matches!(conversion.errors[0], IndexNameError::InvalidCharacter(_)));
        }
    }

    #[test]
    fn test_reserved_and_long_names() {
        let helper = IndexNameHelper::default();

        for name in [".", "..", "1.2.3"] {
            assert_eq!(helper.try_convert(name).errors, vec![IndexNameError::ReservedName]);
        }

        let long = "a".repeat(256);
        assert_eq!(
            helper.try_convert(&long).errors,
            vec![IndexNameError::TooLong { bytes: 256 }]
        );
        assert!(helper.try_convert(&"a".repeat(255)).succeeded());
    }

    #[test]
    fn test_accepted_names() {
        let helper = IndexNameHelper::default();

        for (raw, expected) in [
            ("nondefault", "nondefault"),
            ("WithUppercase", "withuppercase"),
            ("With-Dashes", "with-dashes"),
            ("123numberfirst", "123numberfirst"),
            ("", "default"),
            ("   ", "default"),
        ] {
            let conversion = helper.try_convert(raw);
            assert!(conversion.succeeded(), "{:?} -> {:?}", raw, conversion.errors);
            assert_eq!(conversion.actual_index_name, expected);
            assert_eq!(normalize(&conversion.actual_index_name), expected);
        }
    }

    #[tokio::test]
    async fn test_invalid_name_fails_every_operation_before_the_backend() -> Result<()> {
        init_test_env();
        let (memory, _) = create_test_memory();
        let cancel = CancellationToken::new();

        let err = memory.create_index("bad/name", 4, &cancel).await.unwrap_err();
        match err {
            MemoryDbError::InvalidName { name, errors } => {
                assert_eq!(name, "bad/name");
                assert_eq!(errors.len(), 1);
            }
            other => panic!("unexpected error: {}", other),
        }

        let record = create_test_record("a", 4, 0);
        assert!(matches!(
            memory.upsert("-leading", &record, &cancel).await,
            Err(MemoryDbError::InvalidName { .. })
        ));
        assert!(memory.get_indexes(&cancel).await?.is_empty());

        println!("✅ Invalid names rejected before reaching the engine");
        Ok(())
    }

    #[tokio::test]
    async fn test_configured_default_index() -> Result<()> {
        let backend = std::sync::Arc::new(vectorgraph::storage::MemoryGraphBackend::new());
        let memory = vectorgraph::GraphMemory::with_backend(
            backend,
            IndexNameHelper::new("Team Notes"),
            vectorgraph::SearchConfig::default(),
        );
        let cancel = CancellationToken::new();

        assert_eq!(memory.default_index(), "team-notes");
        memory.create_index("", 3, &cancel).await?;
        assert_eq!(memory.get_indexes(&cancel).await?, vec!["team-notes"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_configured_default_uses_builtin_default() -> Result<()> {
        let memory = vectorgraph::GraphMemory::with_backend(
            std::sync::Arc::new(vectorgraph::storage::MemoryGraphBackend::new()),
            IndexNameHelper::new(""),
            vectorgraph::SearchConfig::default(),
        );
        let cancel = CancellationToken::new();

        memory.create_index("", 3, &cancel).await?;
        assert_eq!(memory.get_indexes(&cancel).await?, vec!["default"]);
        Ok(())
    }
}

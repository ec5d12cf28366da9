use proptest::prelude::*;
use sdk::errors::{CommitLensErrorExt, EngineError};
use sdk::types::{AnswerEnvelope, Citation, SourceType, MAX_CITATIONS};

// Error hints are static and never echo the raw internal message
proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "\\PC*") {
        let errs = vec![
            EngineError::Config(error_str.clone()),
            EngineError::Database(error_str.clone()),
            EngineError::LLMProvider(error_str.clone()),
            EngineError::Embedding(error_str.clone()),
            EngineError::InvalidInput(error_str.clone()),
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            if error_str.len() > 40 {
                prop_assert!(!hint.contains(&error_str));
            }
        }
    }
}

// Citation lists never exceed five entries and keep input order
proptest! {
    #[test]
    fn test_citations_truncate_preserving_order(count in 0usize..40) {
        let sources: Vec<Citation> = (0..count)
            .map(|i| Citation {
                commit_hash: format!("{:040x}", i),
                author: format!("author{}", i),
                score: Some(0.5),
            })
            .collect();

        let envelope = AnswerEnvelope::answered("answer", SourceType::Hybrid)
            .with_sources(sources.clone());
        let kept = envelope.sources.unwrap_or_default();

        prop_assert_eq!(kept.len(), count.min(MAX_CITATIONS));
        for (i, c) in kept.iter().enumerate() {
            prop_assert_eq!(&c.commit_hash, &sources[i].commit_hash);
        }
    }
}

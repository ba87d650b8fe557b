// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod error;
pub mod ingest;
pub mod join;
pub mod metrics;
pub mod pipeline;
pub mod rank;
pub mod render;
pub mod sentiment;

// ---- Re-exports for stable public API ----
pub use crate::ingest::types::{Article, ArticleSource};
pub use crate::join::JoinedRow;
pub use crate::rank::{rank, Direction, Facet, FacetRanking};
pub use crate::sentiment::{Granularity, SentimentProvider, SentimentRecord};

use std::sync::Arc;

use crate::config::{ProviderKind, SentimentConfig};
use crate::sentiment::auth::Authenticator;
use crate::sentiment::{DynProvider, GoogleLanguageProvider, LexiconProvider};

/// Build the configured sentiment provider. Credentials are read here, so an
/// offline run that never analyses anything never needs them.
pub fn build_provider(cfg: &SentimentConfig) -> anyhow::Result<DynProvider> {
    match cfg.provider {
        ProviderKind::Lexicon => Ok(Arc::new(LexiconProvider::new())),
        ProviderKind::Google => {
            let path = cfg.resolved_credentials_path()?;
            let auth = Authenticator::from_file(&path)?;
            tracing::info!(credentials = %path.display(), "google language provider configured");
            Ok(Arc::new(GoogleLanguageProvider::new(cfg, auth)?))
        }
    }
}

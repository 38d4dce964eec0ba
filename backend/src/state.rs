use std::sync::Arc;

use anyhow::Result;
use pageflow_shared::{ListingContextBuilder, MemoryPostStore, Paginator, PostQuery};

use crate::{config::AppConfig, markdown, read_stats::ReadStats};

#[derive(Clone)]
pub struct AppState {
    /// Read-only post queries
    store: Arc<dyn PostQuery>,
    /// Read counters shared by all requests
    read_stats: Arc<ReadStats>,
    listing: ListingContextBuilder,
}

impl AppState {
    pub async fn load(config: &AppConfig) -> Result<Self> {
        let (posts, categories) = markdown::scan_content(&config.content_dir).await?;
        let store = MemoryPostStore::new(posts, categories);
        tracing::info!("Loaded {} posts", store.post_count());

        Ok(Self::new(Arc::new(store), config))
    }

    pub fn new(store: Arc<dyn PostQuery>, config: &AppConfig) -> Self {
        Self {
            store,
            read_stats: Arc::new(ReadStats::new()),
            listing: ListingContextBuilder::new(Paginator::new(config.page_size)),
        }
    }

    pub fn store(&self) -> &dyn PostQuery {
        self.store.as_ref()
    }

    pub fn read_stats(&self) -> &ReadStats {
        &self.read_stats
    }

    pub fn listing(&self) -> &ListingContextBuilder {
        &self.listing
    }
}

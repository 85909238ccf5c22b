use crate::config::AppConfig;
use crate::integrations::blob_store::{BlobStore, LocalBlobStore};
use crate::integrations::insights_client::{self, InsightsProvider};
use crate::persistence::wal::WalWriter;
use crate::store::TreeStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub tree: Arc<TreeStore>,
    pub config: Arc<AppConfig>,
    pub blobs: Arc<dyn BlobStore>,
    pub insights: Arc<dyn InsightsProvider>,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, wal: WalWriter) -> anyhow::Result<Self> {
        let blobs = Arc::new(LocalBlobStore::new(config.blobs_dir(), &config.public_url));
        let insights = insights_client::from_config(&config)?;
        Ok(Self {
            tree: Arc::new(TreeStore::new(wal)),
            config: Arc::new(config),
            blobs,
            insights,
            start_time: chrono::Utc::now(),
        })
    }

    pub fn with_blob_store(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = blobs;
        self
    }

    pub fn with_insights(mut self, insights: Arc<dyn InsightsProvider>) -> Self {
        self.insights = insights;
        self
    }
}

//! Shared fixtures for integration tests

use chrono::{DateTime, TimeZone, Utc};
use provgraph::content::{ArticleRef, ContentItem};
use provgraph::fetch::StaticFetcher;
use provgraph::ledger::{GraphNode, Ledger, MemoryLedger};
use provgraph::publish::{PublishSettings, Publisher};
use provgraph::record::AssetRecord;
use provgraph::signing::{Ed25519Signer, Signer};
use provgraph::storage::{ObjectStore, RecordStorage};
use provgraph::types::{AssetId, NodeId};
use std::sync::Arc;
use tempfile::TempDir;

pub const ORG: &str = "pqr";
pub const ORIGIN: &str = "https://pqr.news";
pub const PHOTO: &str = "https://cdn.pqr.news/photo.jpg";
pub const CHART: &str = "https://cdn.pqr.news/chart.png";

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

pub fn settings() -> PublishSettings {
    let mut settings = PublishSettings::new(ORG, "newsroom");
    settings.origin = ORIGIN.to_string();
    settings
}

/// Owned text item attached to article 1
pub fn text_item(body: &str, published: DateTime<Utc>) -> ContentItem {
    let mut item = ContentItem::text(body, "Headline", published);
    item.article = Some(ArticleRef {
        uri: format!("{}/a/1", ORIGIN),
        id: "1".to_string(),
    });
    item
}

pub fn image_item(locator: &str, title: &str, published: DateTime<Utc>) -> ContentItem {
    ContentItem::image(locator, title, published)
}

pub fn fetcher() -> StaticFetcher {
    StaticFetcher::new()
        .with(PHOTO, b"photo bytes")
        .with(CHART, b"chart bytes")
}

pub fn signer() -> Arc<Ed25519Signer> {
    Arc::new(Ed25519Signer::from_seed(&[9; 32]))
}

/// Memory ledger plus sled object store in a temp dir
pub struct Harness {
    pub ledger: Arc<MemoryLedger>,
    pub storage: Arc<ObjectStore>,
    pub signer: Arc<Ed25519Signer>,
    _dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        Self {
            ledger: Arc::new(MemoryLedger::new()),
            storage: Arc::new(ObjectStore::new(dir.path()).unwrap()),
            signer: signer(),
            _dir: dir,
        }
    }

    pub fn publisher(&self) -> Publisher {
        self.publisher_with(settings())
    }

    pub fn publisher_with(&self, settings: PublishSettings) -> Publisher {
        let signer: Arc<dyn Signer> = self.signer.clone();
        Publisher::new(
            settings,
            self.ledger.clone(),
            self.storage.clone(),
            Arc::new(fetcher()),
            signer,
        )
    }

    /// Current ledger node and stored record for `identity`
    pub async fn current(&self, identity: &AssetId) -> (GraphNode, AssetRecord) {
        let node = self
            .ledger
            .get_node_by_id(&NodeId::from(*identity))
            .await
            .unwrap()
            .expect("asset node");
        let record = self.storage.get_record(&node.uri).await.unwrap();
        (node, record)
    }
}

//! In-memory fakes for the orchestrator's collaborator seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use cartolina::application::preview::{CardRenderer, PreviewService, RenderError};
use cartolina::application::repos::{
    BlobStore, BlobStoreError, CardSourceRepo, PreviewCacheRepo, RepoError,
};
use cartolina::domain::entities::{BusinessCard, FundCard, InviteCard, PreviewEntry, ProductCard};

pub const RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Default)]
pub struct MemoryCacheRepo {
    pub entries: Mutex<HashMap<String, PreviewEntry>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl MemoryCacheRepo {
    pub fn entry(&self, cache_key: &str) -> Option<PreviewEntry> {
        self.entries
            .lock()
            .expect("cache map lock")
            .get(cache_key)
            .cloned()
    }

    pub fn insert(&self, entry: PreviewEntry) {
        self.entries
            .lock()
            .expect("cache map lock")
            .insert(entry.cache_key.clone(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache map lock").len()
    }
}

#[async_trait]
impl PreviewCacheRepo for MemoryCacheRepo {
    async fn lookup(&self, cache_key: &str) -> Result<Option<PreviewEntry>, RepoError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("metadata store offline"));
        }
        Ok(self.entry(cache_key))
    }

    async fn upsert(&self, entry: &PreviewEntry) -> Result<(), RepoError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("metadata store offline"));
        }
        self.insert(entry.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    pub blobs: Mutex<HashMap<String, Bytes>>,
    pub fail_puts: AtomicBool,
}

impl MemoryBlobStore {
    pub fn blob(&self, path: &str) -> Option<Bytes> {
        self.blobs.lock().expect("blob map lock").get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().expect("blob map lock").len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        path: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<(), BlobStoreError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(BlobStoreError::Io(std::io::Error::other(
                "object store offline",
            )));
        }
        self.blobs
            .lock()
            .expect("blob map lock")
            .insert(path.to_string(), bytes);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://cards.test/{path}")
    }
}

/// Renders each payload to its canonical JSON so distinct payloads produce
/// distinct bytes, and counts invocations so tests can assert "no render".
#[derive(Default)]
pub struct CountingRenderer {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl CountingRenderer {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CardRenderer for CountingRenderer {
    async fn render(
        &self,
        payload: &cartolina::domain::payload::CardPayload,
    ) -> Result<Bytes, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RenderError::Upstream { status: 502 });
        }
        let json = serde_json::to_vec(payload).expect("payload serializes");
        Ok(Bytes::from(json))
    }
}

/// Card source whose responses are set directly by each test.
#[derive(Default)]
pub struct ScriptedCards {
    pub product: Mutex<Option<ProductCard>>,
    pub fund: Mutex<Option<FundCard>>,
    pub business: Mutex<Option<BusinessCard>>,
    pub invite: Mutex<Option<InviteCard>>,
    pub fail: AtomicBool,
}

impl ScriptedCards {
    pub fn set_product(&self, card: ProductCard) {
        *self.product.lock().expect("product lock") = Some(card);
    }

    pub fn set_fund(&self, card: FundCard) {
        *self.fund.lock().expect("fund lock") = Some(card);
    }

    pub fn set_invite(&self, card: InviteCard) {
        *self.invite.lock().expect("invite lock") = Some(card);
    }

    fn check(&self) -> Result<(), RepoError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("entity source offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl CardSourceRepo for ScriptedCards {
    async fn product_card(&self, _id: Uuid) -> Result<Option<ProductCard>, RepoError> {
        self.check()?;
        Ok(self.product.lock().expect("product lock").clone())
    }

    async fn fund_card(&self, _id: Uuid) -> Result<Option<FundCard>, RepoError> {
        self.check()?;
        Ok(self.fund.lock().expect("fund lock").clone())
    }

    async fn business_card(&self, _id: Uuid) -> Result<Option<BusinessCard>, RepoError> {
        self.check()?;
        Ok(self.business.lock().expect("business lock").clone())
    }

    async fn invite_card(&self, _code: &str) -> Result<Option<InviteCard>, RepoError> {
        self.check()?;
        Ok(self.invite.lock().expect("invite lock").clone())
    }
}

pub struct Harness {
    pub cache: Arc<MemoryCacheRepo>,
    pub cards: Arc<ScriptedCards>,
    pub renderer: Arc<CountingRenderer>,
    pub blobs: Arc<MemoryBlobStore>,
    pub service: Arc<PreviewService>,
}

pub fn harness() -> Harness {
    let cache = Arc::new(MemoryCacheRepo::default());
    let cards = Arc::new(ScriptedCards::default());
    let renderer = Arc::new(CountingRenderer::default());
    let blobs = Arc::new(MemoryBlobStore::default());
    let service = Arc::new(PreviewService::new(
        cache.clone(),
        cards.clone(),
        renderer.clone(),
        blobs.clone(),
        RETENTION,
    ));
    Harness {
        cache,
        cards,
        renderer,
        blobs,
        service,
    }
}

pub fn sample_product(id: Uuid) -> ProductCard {
    ProductCard {
        id,
        name: "Walnut chess set".to_string(),
        image_url: Some("https://cdn.vetrina.example/p/chess.jpg".to_string()),
        price_cents: 12_900,
        currency: "EUR".to_string(),
        rating: Some(4.5),
        review_count: 18,
        business_name: Some("Atelier Legno".to_string()),
    }
}

pub fn sample_fund(id: Uuid, current_cents: i64, target_cents: i64) -> FundCard {
    FundCard {
        id,
        title: "Community workshop".to_string(),
        cover_url: None,
        current_amount_cents: current_cents,
        target_amount_cents: target_cents,
        currency: "EUR".to_string(),
        owner_name: Some("Giulia".to_string()),
    }
}

pub fn sample_invite(code: &str) -> InviteCard {
    InviteCard {
        code: code.to_string(),
        business_name: Some("Atelier Legno".to_string()),
        role: "manager".to_string(),
    }
}

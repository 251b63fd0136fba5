//! # Sync Orchestrator
//!
//! Runs one full pull or push pass between the product table and Square.
//!
//! ## Pull
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  list_catalog (ITEM + IMAGE, all pages) ──── failure is fatal           │
//! │       │                                                                 │
//! │       ├─► batch_retrieve_counts per chunk ── failed chunk: counts absent│
//! │       ├─► batch_retrieve_objects for unlisted images ── failure: no img │
//! │       ▼                                                                 │
//! │  for each item:                                                         │
//! │     match local (id, then SKU == item_number)                          │
//! │       ├── local soft-deleted ──────────────► skipped_deleted            │
//! │       ├── no variation has a count ────────► skipped_unmapped           │
//! │       ├── matched ──► ConflictResolver ──► Local  ► keep stock, refresh │
//! │       │                                 └► Remote ► take stock + ts    │
//! │       └── new ──────────────────────────► take remote stock            │
//! │       ▼                                                                 │
//! │  upsert_batch(records)  one transaction, per-row failures counted      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Push
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  active products ─► list_catalog ─► CatalogMapping ─► location id       │
//! │       │                                                                 │
//! │  for each product:                                                      │
//! │     Unmapped ─► skip                                                    │
//! │     Mapped   ─► image upload if Square has none (best effort)          │
//! │              ─► stock_changes(product)                                 │
//! │       ▼                                                                 │
//! │  pack changes into batches of ≤ batch_size, never splitting a product   │
//! │  batch_create_changes per batch ── failed batch: logged, excluded      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both passes are idempotent. A repeat pull sees remote timestamps equal to
//! the ones it stored and writes the same records again.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SyncSettings;
use crate::error::{SyncError, SyncResult};
use crate::mapper::{
    fill_missing_images, match_local, remote_stock, resolve_image_url, stock_changes,
    CatalogMapping, ImageIndex, LocalMatch,
};
use crate::protocol::{CatalogObject, InventoryChange, PosCatalog, STATE_IN_STOCK};
use swell_core::catalog::classify_product_type;
use swell_core::conflict::resolve_with;
use swell_core::validation::validate_price_cents;
use swell_core::{InventorySnapshot, InventorySource, Money, Product, ProductType, SyncDirection};
use swell_db::ProductRepository;

const UNTITLED: &str = "Untitled item";

// =============================================================================
// Reports
// =============================================================================

/// Result of one pull pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullReport {
    /// Items considered.
    pub synced: usize,
    /// Records whose image URL came from Square.
    pub images_found: usize,
    pub skipped_unmapped: usize,
    pub skipped_deleted: usize,
    /// Records handed to the batch upsert.
    pub attempted: usize,
    /// Records the upsert could not write.
    pub failed: usize,
    /// Matches whose local inventory was newer and kept.
    pub local_kept: usize,
    /// Count chunks that failed and were treated as absent.
    pub failed_count_chunks: usize,
    /// Image batch-retrieve chunks that failed; their images stay unresolved.
    pub failed_image_chunks: usize,
}

/// Result of one push pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushReport {
    /// Products whose changes landed in a successful batch.
    pub synced: usize,
    pub images_uploaded: usize,
    pub image_failures: usize,
    /// Active products considered.
    pub total_attempted: usize,
    /// Products that resolved to a Square variation.
    pub mapped_count: usize,
    pub failed_batches: usize,
}

/// Either pass's report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "direction", rename_all = "lowercase")]
pub enum SyncReport {
    Pull(PullReport),
    Push(PushReport),
}

impl SyncReport {
    pub fn direction(&self) -> SyncDirection {
        match self {
            SyncReport::Pull(_) => SyncDirection::Pull,
            SyncReport::Push(_) => SyncDirection::Push,
        }
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// One pass's worth of collaborators.
pub struct SyncOrchestrator<C> {
    products: ProductRepository,
    catalog: C,
    settings: SyncSettings,
    location_id: Option<String>,
}

impl<C: PosCatalog> SyncOrchestrator<C> {
    pub fn new(products: ProductRepository, catalog: C, settings: SyncSettings) -> Self {
        SyncOrchestrator {
            products,
            catalog,
            settings,
            location_id: None,
        }
    }

    /// Pins pushes to a location instead of the first ACTIVE one.
    pub fn with_location(mut self, location_id: Option<String>) -> Self {
        self.location_id = location_id.filter(|l| !l.trim().is_empty());
        self
    }

    pub async fn run(&self, direction: SyncDirection) -> SyncResult<SyncReport> {
        match direction {
            SyncDirection::Pull => self.pull().await.map(SyncReport::Pull),
            SyncDirection::Push => self.push().await.map(SyncReport::Push),
        }
    }

    // =========================================================================
    // Pull
    // =========================================================================

    /// Square → storefront.
    pub async fn pull(&self) -> SyncResult<PullReport> {
        let mut report = PullReport::default();

        let objects = self.catalog.list_catalog().await?;
        let items: Vec<&CatalogObject> = objects
            .iter()
            .filter(|o| o.is_item() && !o.is_deleted)
            .collect();
        debug!(objects = objects.len(), items = items.len(), "Catalog listed");

        let counts = self.fetch_counts(&items, &mut report).await;

        let mut images = ImageIndex::from_objects(&objects);
        report.failed_image_chunks = fill_missing_images(
            &self.catalog,
            &mut images,
            &items,
            self.settings.retrieve_batch_size,
        )
        .await;

        let locals = self.products.list_all().await?;
        let id_by_item_number: HashMap<String, String> = locals
            .iter()
            .filter_map(|p| p.item_number.clone().map(|n| (n, p.id.clone())))
            .collect();
        let by_id: HashMap<String, Product> =
            locals.into_iter().map(|p| (p.id.clone(), p)).collect();

        let now = Utc::now();
        let mut records = Vec::with_capacity(items.len());

        for item in &items {
            report.synced += 1;
            let local = match_local(item, &by_id, &id_by_item_number);

            if local.is_some_and(|p| p.is_deleted) {
                debug!(item_id = %item.id, "Local product deleted; skipping");
                report.skipped_deleted += 1;
                continue;
            }

            let Some(stock) = remote_stock(item, &counts) else {
                debug!(item_id = %item.id, "No count record for any variation; skipping");
                report.skipped_unmapped += 1;
                continue;
            };

            let remote_ts = item.latest_updated_at();
            let image_url = resolve_image_url(item.image_ids(), &images).map(str::to_string);
            if image_url.is_some() {
                report.images_found += 1;
            } else if !item.image_ids().is_empty() {
                warn!(item_id = %item.id, "Item image could not be resolved");
            }

            let mut record = match local {
                Some(local) => {
                    let resolution = resolve_with(
                        InventorySnapshot::new(Some(local.updated_at), local.inventory),
                        InventorySnapshot::new(remote_ts, stock.inventory),
                        self.settings.tie_break,
                    );
                    let mut record = local.clone();
                    match resolution.source {
                        InventorySource::Remote => {
                            record.size_inventory = stock.sizes;
                            record.inventory = stock.inventory;
                            record.updated_at = remote_ts.unwrap_or(local.updated_at);
                        }
                        InventorySource::Local => {
                            debug!(product_id = %local.id, "Local inventory newer; keeping it");
                            report.local_kept += 1;
                        }
                    }
                    record
                }
                None => {
                    let mut record = Product::new(UNTITLED, ProductType::Other, Money::zero(), now);
                    record.id = item.id.clone();
                    record.item_number = item
                        .variations()
                        .iter()
                        .find_map(|v| v.sku())
                        .map(str::to_string);
                    record.size_inventory = stock.sizes;
                    record.inventory = stock.inventory;
                    record.updated_at = remote_ts.unwrap_or(now);
                    record
                }
            };

            apply_descriptive_fields(&mut record, item, image_url);
            records.push(record);
        }

        report.attempted = records.len();
        let outcome = self.products.upsert_batch(&records).await?;
        report.failed = outcome.failed.len();

        info!(
            direction = %SyncDirection::Pull,
            synced = report.synced,
            attempted = report.attempted,
            failed = report.failed,
            local_kept = report.local_kept,
            skipped_unmapped = report.skipped_unmapped,
            skipped_deleted = report.skipped_deleted,
            "Pull finished"
        );
        Ok(report)
    }

    /// IN_STOCK units per variation id, summed across locations.
    async fn fetch_counts(
        &self,
        items: &[&CatalogObject],
        report: &mut PullReport,
    ) -> HashMap<String, u32> {
        let variation_ids: Vec<String> = items
            .iter()
            .flat_map(|item| item.variations().iter().map(|v| v.id.clone()))
            .collect();

        let mut counts: HashMap<String, u32> = HashMap::new();
        for chunk in variation_ids.chunks(self.settings.retrieve_batch_size.max(1)) {
            match self.catalog.batch_retrieve_counts(chunk).await {
                Ok(records) => {
                    for record in records.iter().filter(|c| c.state == STATE_IN_STOCK) {
                        let slot = counts.entry(record.catalog_object_id.clone()).or_insert(0);
                        *slot = slot.saturating_add(record.units());
                    }
                }
                Err(e) => {
                    warn!(chunk = chunk.len(), error = %e, "Inventory count chunk failed");
                    report.failed_count_chunks += 1;
                }
            }
        }

        counts
    }

    // =========================================================================
    // Push
    // =========================================================================

    /// Storefront → Square.
    pub async fn push(&self) -> SyncResult<PushReport> {
        let mut report = PushReport::default();

        let products = self.products.list_active().await?;
        let objects = self.catalog.list_catalog().await?;
        let mapping = CatalogMapping::build(&objects);
        let location_id = self.location().await?;
        let now = Utc::now();

        let mut groups: Vec<Vec<InventoryChange>> = Vec::new();
        for product in &products {
            report.total_attempted += 1;

            let LocalMatch::Mapped { variation_id, item } = mapping.resolve_local(product) else {
                debug!(product_id = %product.id, "No Square match; not pushed");
                continue;
            };
            report.mapped_count += 1;

            if let (Some(url), false) = (product.image_url.as_deref(), item.has_image) {
                match self.upload_image(&item.item_id, url).await {
                    Ok(image_id) => {
                        debug!(product_id = %product.id, image_id = %image_id, "Image uploaded");
                        report.images_uploaded += 1;
                    }
                    Err(e) => {
                        warn!(product_id = %product.id, error = %e, "Image upload failed");
                        report.image_failures += 1;
                    }
                }
            }

            groups.push(stock_changes(product, item, variation_id, &location_id, now));
        }

        for batch in pack_batches(groups, self.settings.batch_size) {
            match self.catalog.batch_create_changes(&batch.changes).await {
                Ok(()) => report.synced += batch.products,
                Err(e) => {
                    warn!(
                        products = batch.products,
                        changes = batch.changes.len(),
                        error = %e,
                        "Inventory batch failed"
                    );
                    report.failed_batches += 1;
                }
            }
        }

        info!(
            direction = %SyncDirection::Push,
            synced = report.synced,
            total_attempted = report.total_attempted,
            mapped_count = report.mapped_count,
            failed_batches = report.failed_batches,
            images_uploaded = report.images_uploaded,
            "Push finished"
        );
        Ok(report)
    }

    async fn location(&self) -> SyncResult<String> {
        if let Some(id) = &self.location_id {
            return Ok(id.clone());
        }

        self.catalog
            .list_locations()
            .await?
            .into_iter()
            .find(|l| l.is_active())
            .map(|l| l.id)
            .ok_or(SyncError::NoActiveLocation)
    }

    async fn upload_image(&self, item_id: &str, url: &str) -> SyncResult<String> {
        let image = self.catalog.fetch_image(url).await?;
        self.catalog.upload_image(item_id, image).await
    }
}

/// Copies name, description, type, price and image from Square onto a record.
fn apply_descriptive_fields(record: &mut Product, item: &CatalogObject, image_url: Option<String>) {
    if let Some(name) = item.name().map(str::trim).filter(|n| !n.is_empty()) {
        record.title = name.to_string();
    }
    if let Some(description) = item.item_data.as_ref().and_then(|d| d.description.as_deref()) {
        record.description = description.to_string();
    }
    record.product_type = classify_product_type(&record.title);

    let price = item
        .variations()
        .iter()
        .find_map(|v| v.item_variation_data.as_ref()?.price_money.as_ref())
        .map(|m| m.amount);
    match price {
        Some(cents) if validate_price_cents(cents).is_ok() => record.price_cents = cents,
        Some(cents) => {
            warn!(item_id = %item.id, cents, "Square price out of range; keeping local price")
        }
        None => {}
    }

    if image_url.is_some() {
        record.image_url = image_url;
    }
}

/// A set of whole products' changes for one batch-create call.
#[derive(Debug, Default)]
struct ChangeBatch {
    changes: Vec<InventoryChange>,
    products: usize,
}

/// Packs per-product change groups into batches of at most `batch_size`.
/// A group larger than the limit travels alone.
fn pack_batches(groups: Vec<Vec<InventoryChange>>, batch_size: usize) -> Vec<ChangeBatch> {
    let mut batches = Vec::new();
    let mut current = ChangeBatch::default();

    for group in groups.into_iter().filter(|g| !g.is_empty()) {
        if current.products > 0 && current.changes.len() + group.len() > batch_size {
            batches.push(std::mem::take(&mut current));
        }
        current.changes.extend(group);
        current.products += 1;
    }
    if current.products > 0 {
        batches.push(current);
    }

    batches
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockCatalog;
    use chrono::{DateTime, Duration};
    use swell_core::SizeInventory;
    use swell_db::{Database, DbConfig};

    fn change(id: &str) -> InventoryChange {
        InventoryChange::stock_adjustment(id, "LOC1", 1, Utc::now())
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
            + Duration::minutes(minutes)
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[test]
    fn test_pack_batches_never_splits_a_product() {
        let groups = vec![
            vec![change("a1"), change("a2")],
            vec![change("b1"), change("b2")],
            vec![change("c1")],
        ];

        let batches = pack_batches(groups, 3);

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].changes.len(), 2);
        assert_eq!(batches[0].products, 1);
        assert_eq!(batches[1].changes.len(), 3);
        assert_eq!(batches[1].products, 2);
    }

    #[test]
    fn test_oversized_group_travels_alone() {
        let batches = pack_batches(vec![vec![change("a"); 4], vec![change("b")]], 3);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].changes.len(), 4);
    }

    #[tokio::test]
    async fn test_pull_creates_new_products() {
        let db = db().await;
        let catalog = MockCatalog::new();
        catalog.add_item("ITEM1", "Palm One-Piece", Some(at(0)), &[("V1", "S", 2), ("V2", "M", 3)]);
        catalog.add_image("ITEM1", "IMG1", "https://img.example.com/palm.jpg");

        let report = SyncOrchestrator::new(db.products(), catalog, SyncSettings::default())
            .pull()
            .await
            .unwrap();

        assert_eq!(report.synced, 1);
        assert_eq!(report.attempted, 1);
        assert_eq!(report.images_found, 1);
        let p = db.products().get_by_id("ITEM1").await.unwrap().unwrap();
        assert_eq!(p.product_type, ProductType::OnePiece);
        assert_eq!(p.inventory, 5);
        assert_eq!(p.updated_at, at(0));
        assert_eq!(p.image_url.as_deref(), Some("https://img.example.com/palm.jpg"));
    }

    #[tokio::test]
    async fn test_pull_skips_deleted_and_uncounted() {
        let db = db().await;
        let mut gone = Product::new("Old Top", ProductType::Top, Money::from_cents(100), at(0));
        gone.id = "ITEM_GONE".into();
        gone.is_deleted = true;
        db.products().insert(&gone).await.unwrap();

        let catalog = MockCatalog::new();
        catalog.add_item("ITEM_GONE", "Old Top", Some(at(5)), &[("VG", "S", 1)]);
        catalog.add_uncounted_item("ITEM_NEW", "Wrap", &["VN"]);

        let report = SyncOrchestrator::new(db.products(), catalog, SyncSettings::default())
            .pull()
            .await
            .unwrap();

        assert_eq!(report.synced, 2);
        assert_eq!(report.skipped_deleted, 1);
        assert_eq!(report.skipped_unmapped, 1);
        assert_eq!(report.attempted, 0);
    }

    #[tokio::test]
    async fn test_pull_newer_remote_wins() {
        let db = db().await;
        let mut local = Product::new("Reef Top", ProductType::Top, Money::from_cents(6400), at(0));
        local.id = "ITEM1".into();
        local.set_size_inventory(SizeInventory::from_pairs([("S", 1)]), at(0));
        db.products().insert(&local).await.unwrap();

        let catalog = MockCatalog::new();
        catalog.add_item("ITEM1", "Reef Top", Some(at(10)), &[("V1", "S", 9)]);

        let report = SyncOrchestrator::new(db.products(), catalog, SyncSettings::default())
            .pull()
            .await
            .unwrap();

        assert_eq!(report.local_kept, 0);
        let p = db.products().get_by_id("ITEM1").await.unwrap().unwrap();
        assert_eq!(p.inventory, 9);
        assert_eq!(p.updated_at, at(10));
    }

    #[tokio::test]
    async fn test_pull_matches_by_sku() {
        let db = db().await;
        let mut local = Product::new("Reef Top", ProductType::Top, Money::from_cents(6400), at(0));
        local.item_number = Some("RT-1".into());
        db.products().insert(&local).await.unwrap();

        let catalog = MockCatalog::new();
        catalog.add_item_with_sku("ITEM1", "Reef Top", Some(at(10)), "V1", "RT-1", 4);

        SyncOrchestrator::new(db.products(), catalog, SyncSettings::default())
            .pull()
            .await
            .unwrap();

        assert_eq!(db.products().count().await.unwrap(), 1);
        let p = db.products().get_by_id(&local.id).await.unwrap().unwrap();
        assert_eq!(p.inventory, 4);
    }

    #[tokio::test]
    async fn test_pull_list_failure_is_fatal() {
        let db = db().await;
        let catalog = MockCatalog::new();
        catalog.fail_listing(503);

        let err = SyncOrchestrator::new(db.products(), catalog, SyncSettings::default())
            .pull()
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Square catalog API error: 503");
    }

    #[tokio::test]
    async fn test_failed_count_chunk_degrades() {
        let db = db().await;
        let catalog = MockCatalog::new();
        catalog.add_item("ITEM1", "Reef Top", Some(at(0)), &[("V1", "S", 2)]);
        catalog.add_item("ITEM2", "Palm Bottom", Some(at(0)), &[("V2", "S", 2)]);
        catalog.fail_counts_for("V2");
        let settings = SyncSettings {
            retrieve_batch_size: 1,
            ..SyncSettings::default()
        };

        let report = SyncOrchestrator::new(db.products(), catalog, settings)
            .pull()
            .await
            .unwrap();

        assert_eq!(report.failed_count_chunks, 1);
        assert_eq!(report.skipped_unmapped, 1);
        assert_eq!(report.attempted, 1);
    }

    #[tokio::test]
    async fn test_push_sends_per_size_changes_and_uploads_image() {
        let db = db().await;
        let mut p = Product::new("Reef Top", ProductType::Top, Money::from_cents(6400), Utc::now());
        p.id = "ITEM1".into();
        p.image_url = Some("https://img.example.com/reef.jpg".into());
        p.set_size_inventory(SizeInventory::from_pairs([("S", 3), ("M", 1)]), Utc::now());
        db.products().insert(&p).await.unwrap();

        let catalog = MockCatalog::new();
        catalog.add_item("ITEM1", "Reef Top", None, &[("VS", "S", 0), ("VM", "M", 0)]);
        catalog.add_location("LOC1", "ACTIVE");

        let orchestrator = SyncOrchestrator::new(db.products(), catalog, SyncSettings::default());
        let report = orchestrator.push().await.unwrap();

        assert_eq!(report.synced, 1);
        assert_eq!(report.mapped_count, 1);
        assert_eq!(report.images_uploaded, 1);
        let sent = orchestrator.catalog.sent_changes();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|c| c.adjustment.location_id == "LOC1"));
    }

    #[tokio::test]
    async fn test_pull_keeps_price_when_square_price_out_of_range() {
        let db = db().await;
        let mut local = Product::new("Reef Top", ProductType::Top, Money::from_cents(6400), at(0));
        local.id = "ITEM1".into();
        db.products().insert(&local).await.unwrap();

        let catalog = MockCatalog::new();
        catalog.add_item("ITEM1", "Reef Top", Some(at(10)), &[("V1", "S", 2)]);
        catalog.add_item("ITEM2", "Palm Bottom", Some(at(10)), &[("V2", "S", 2)]);
        catalog.set_price("ITEM1", i64::MAX);
        catalog.set_price("ITEM2", 5200);

        SyncOrchestrator::new(db.products(), catalog, SyncSettings::default())
            .pull()
            .await
            .unwrap();

        let kept = db.products().get_by_id("ITEM1").await.unwrap().unwrap();
        assert_eq!(kept.price_cents, 6400);
        let fresh = db.products().get_by_id("ITEM2").await.unwrap().unwrap();
        assert_eq!(fresh.price_cents, 5200);
    }

    #[tokio::test]
    async fn test_pull_fetches_unlisted_images_in_chunks() {
        let db = db().await;
        let catalog = MockCatalog::new();
        for (item, variation, img) in [("ITEM1", "V1", "IMG1"), ("ITEM2", "V2", "IMG2"), ("ITEM3", "V3", "IMG3")] {
            catalog.add_item(item, "Reef Top", Some(at(0)), &[(variation, "S", 1)]);
            catalog.add_unlisted_image(item, img, &format!("https://img.example.com/{}.jpg", img));
        }
        catalog.fail_retrieve_for("IMG3");
        let settings = SyncSettings {
            retrieve_batch_size: 2,
            ..SyncSettings::default()
        };

        let orchestrator = SyncOrchestrator::new(db.products(), catalog, settings);
        let report = orchestrator.pull().await.unwrap();

        assert_eq!(orchestrator.catalog.retrieve_calls().len(), 2);
        assert!(orchestrator.catalog.retrieve_calls().iter().all(|c| c.len() <= 2));
        assert_eq!(report.failed_image_chunks, 1);
        assert_eq!(report.images_found, 2);
        assert_eq!(report.attempted, 3);
        let p = db.products().get_by_id("ITEM3").await.unwrap().unwrap();
        assert_eq!(p.image_url, None);
    }

    #[tokio::test]
    async fn test_failed_image_upload_still_pushes_stock() {
        let db = db().await;
        let mut p = Product::new("Reef Top", ProductType::Top, Money::from_cents(6400), Utc::now());
        p.id = "ITEM1".into();
        p.image_url = Some("https://img.example.com/reef.jpg".into());
        p.set_size_inventory(SizeInventory::from_pairs([("S", 3), ("M", 1)]), Utc::now());
        db.products().insert(&p).await.unwrap();

        let catalog = MockCatalog::new();
        catalog.add_item("ITEM1", "Reef Top", None, &[("VS", "S", 0), ("VM", "M", 0)]);
        catalog.add_location("LOC1", "ACTIVE");
        catalog.fail_uploads();

        let orchestrator = SyncOrchestrator::new(db.products(), catalog, SyncSettings::default());
        let report = orchestrator.push().await.unwrap();

        assert_eq!(report.image_failures, 1);
        assert_eq!(report.images_uploaded, 0);
        assert_eq!(report.synced, 1);
        assert_eq!(report.mapped_count, 1);
        assert!(orchestrator.catalog.uploaded_images().is_empty());
        let sent = orchestrator.catalog.sent_changes();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().any(|c| c.adjustment.catalog_object_id == "VS" && c.adjustment.quantity == "3"));
    }

    #[tokio::test]
    async fn test_push_without_location_is_fatal() {
        let db = db().await;
        let catalog = MockCatalog::new();
        catalog.add_location("LOC_OFF", "INACTIVE");

        let err = SyncOrchestrator::new(db.products(), catalog, SyncSettings::default())
            .push()
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::NoActiveLocation));
    }

    #[tokio::test]
    async fn test_failed_batch_excluded_from_synced() {
        let db = db().await;
        for id in ["ITEM1", "ITEM2"] {
            let mut p = Product::new("Top", ProductType::Top, Money::from_cents(100), Utc::now());
            p.id = id.into();
            p.set_unsized_inventory(2, Utc::now()).unwrap();
            db.products().insert(&p).await.unwrap();
        }

        let catalog = MockCatalog::new();
        catalog.add_item("ITEM1", "Top", None, &[("V1", "Regular", 0)]);
        catalog.add_item("ITEM2", "Top", None, &[("V2", "Regular", 0)]);
        catalog.fail_changes_for("V2");
        let settings = SyncSettings {
            batch_size: 1,
            ..SyncSettings::default()
        };

        let report = SyncOrchestrator::new(db.products(), catalog, settings)
            .with_location(Some("LOC1".into()))
            .push()
            .await
            .unwrap();

        assert_eq!(report.total_attempted, 2);
        assert_eq!(report.synced, 1);
        assert_eq!(report.failed_batches, 1);
    }
}

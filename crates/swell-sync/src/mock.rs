//! In-memory [`PosCatalog`] for tests.
//!
//! Clones share state, so a test can hand one clone to the orchestrator and
//! inspect what it sent through another.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{SyncError, SyncResult};
use crate::protocol::{
    CatalogItemData, CatalogObject, ImageData, ImageUpload, InventoryChange, InventoryCount,
    Location, MoneyAmount, PosCatalog, VariationData, OBJECT_TYPE_IMAGE, OBJECT_TYPE_ITEM, STATE_IN_STOCK,
};

#[derive(Debug, Default)]
struct State {
    objects: Vec<CatalogObject>,
    unlisted_images: Vec<CatalogObject>,
    counts: Vec<InventoryCount>,
    locations: Vec<Location>,
    list_failure: Option<u16>,
    failing_count_ids: HashSet<String>,
    failing_change_ids: HashSet<String>,
    failing_object_ids: HashSet<String>,
    fail_uploads: bool,
    sent: Vec<InventoryChange>,
    uploads: Vec<String>,
    list_calls: usize,
    retrieve_calls: Vec<Vec<String>>,
}

/// Mock Square catalog.
#[derive(Debug, Clone, Default)]
pub struct MockCatalog {
    state: Arc<Mutex<State>>,
}

fn variation(id: &str, name: &str, sku: Option<&str>) -> CatalogObject {
    CatalogObject {
        object_type: "ITEM_VARIATION".to_string(),
        id: id.to_string(),
        item_variation_data: Some(VariationData {
            name: Some(name.to_string()),
            sku: sku.map(str::to_string),
            ..VariationData::default()
        }),
        ..CatalogObject::default()
    }
}

fn count(variation_id: &str, quantity: u32) -> InventoryCount {
    InventoryCount {
        catalog_object_id: variation_id.to_string(),
        location_id: Some("LOC1".to_string()),
        state: STATE_IN_STOCK.to_string(),
        quantity: quantity.to_string(),
        calculated_at: None,
    }
}

fn image(id: &str, url: &str) -> CatalogObject {
    CatalogObject {
        object_type: OBJECT_TYPE_IMAGE.to_string(),
        id: id.to_string(),
        image_data: Some(ImageData {
            url: Some(url.to_string()),
            name: None,
        }),
        ..CatalogObject::default()
    }
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push_item(&self, id: &str, name: &str, updated_at: Option<DateTime<Utc>>, variations: Vec<CatalogObject>) {
        self.state().objects.push(CatalogObject {
            object_type: OBJECT_TYPE_ITEM.to_string(),
            id: id.to_string(),
            updated_at,
            item_data: Some(CatalogItemData {
                name: Some(name.to_string()),
                variations,
                ..CatalogItemData::default()
            }),
            ..CatalogObject::default()
        });
    }

    fn with_item<F: FnOnce(&mut CatalogObject)>(&self, item_id: &str, f: F) {
        if let Some(item) = self.state().objects.iter_mut().find(|o| o.id == item_id) {
            f(item);
        }
    }

    /// Adds an item whose variations `(id, name, in_stock)` all have counts.
    pub fn add_item(
        &self,
        id: &str,
        name: &str,
        updated_at: Option<DateTime<Utc>>,
        variations: &[(&str, &str, u32)],
    ) {
        let objects = variations
            .iter()
            .map(|(vid, vname, _)| variation(vid, vname, None))
            .collect();
        self.push_item(id, name, updated_at, objects);
        let mut state = self.state();
        for (vid, _, qty) in variations {
            state.counts.push(count(vid, *qty));
        }
    }

    /// Adds a single-variation item whose variation carries a SKU.
    pub fn add_item_with_sku(
        &self,
        id: &str,
        name: &str,
        updated_at: Option<DateTime<Utc>>,
        variation_id: &str,
        sku: &str,
        in_stock: u32,
    ) {
        self.push_item(id, name, updated_at, vec![variation(variation_id, "Regular", Some(sku))]);
        self.state().counts.push(count(variation_id, in_stock));
    }

    /// Adds an item whose variations have no count record at all.
    pub fn add_uncounted_item(&self, id: &str, name: &str, variation_ids: &[&str]) {
        let objects = variation_ids
            .iter()
            .map(|vid| variation(vid, "Regular", None))
            .collect();
        self.push_item(id, name, None, objects);
    }

    /// Lists an image and references it from `item_id`.
    pub fn add_image(&self, item_id: &str, image_id: &str, url: &str) {
        self.attach_image_id(item_id, image_id);
        self.state().objects.push(image(image_id, url));
    }

    /// References an image that only batch-retrieve can return.
    pub fn add_unlisted_image(&self, item_id: &str, image_id: &str, url: &str) {
        self.attach_image_id(item_id, image_id);
        self.state().unlisted_images.push(image(image_id, url));
    }

    fn attach_image_id(&self, item_id: &str, image_id: &str) {
        self.with_item(item_id, |item| {
            if let Some(data) = item.item_data.as_mut() {
                data.image_ids.push(image_id.to_string());
            }
        });
    }

    pub fn set_description(&self, item_id: &str, description: &str) {
        self.with_item(item_id, |item| {
            if let Some(data) = item.item_data.as_mut() {
                data.description = Some(description.to_string());
            }
        });
    }

    pub fn set_name(&self, item_id: &str, name: &str) {
        self.with_item(item_id, |item| {
            if let Some(data) = item.item_data.as_mut() {
                data.name = Some(name.to_string());
            }
        });
    }

    /// Prices every variation of `item_id` at `cents`.
    pub fn set_price(&self, item_id: &str, cents: i64) {
        self.with_item(item_id, |item| {
            let Some(data) = item.item_data.as_mut() else {
                return;
            };
            for v in data.variations.iter_mut() {
                if let Some(vd) = v.item_variation_data.as_mut() {
                    vd.price_money = Some(MoneyAmount {
                        amount: cents,
                        currency: "USD".to_string(),
                    });
                }
            }
        });
    }

    /// Replaces the IN_STOCK count of one variation.
    pub fn set_count(&self, variation_id: &str, in_stock: u32) {
        let mut state = self.state();
        state.counts.retain(|c| c.catalog_object_id != variation_id);
        state.counts.push(count(variation_id, in_stock));
    }

    pub fn add_location(&self, id: &str, status: &str) {
        self.state().locations.push(Location {
            id: id.to_string(),
            name: None,
            status: Some(status.to_string()),
        });
    }

    pub fn fail_listing(&self, status: u16) {
        self.state().list_failure = Some(status);
    }

    /// Makes any count chunk containing this variation fail.
    pub fn fail_counts_for(&self, variation_id: &str) {
        self.state().failing_count_ids.insert(variation_id.to_string());
    }

    /// Makes any change batch touching this variation fail.
    pub fn fail_changes_for(&self, variation_id: &str) {
        self.state().failing_change_ids.insert(variation_id.to_string());
    }

    /// Makes any object batch-retrieve asking for this id fail.
    pub fn fail_retrieve_for(&self, object_id: &str) {
        self.state().failing_object_ids.insert(object_id.to_string());
    }

    pub fn fail_uploads(&self) {
        self.state().fail_uploads = true;
    }

    /// Changes accepted so far.
    pub fn sent_changes(&self) -> Vec<InventoryChange> {
        self.state().sent.clone()
    }

    /// Object ids that received an image.
    pub fn uploaded_images(&self) -> Vec<String> {
        self.state().uploads.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state().list_calls
    }

    /// Ids requested by each object batch-retrieve call, in call order.
    pub fn retrieve_calls(&self) -> Vec<Vec<String>> {
        self.state().retrieve_calls.clone()
    }
}

fn upstream(status: u16) -> SyncError {
    SyncError::SquareApi {
        status,
        body: String::new(),
    }
}

#[async_trait]
impl PosCatalog for MockCatalog {
    async fn list_catalog(&self) -> SyncResult<Vec<CatalogObject>> {
        let mut state = self.state();
        state.list_calls += 1;
        match state.list_failure {
            Some(status) => Err(upstream(status)),
            None => Ok(state.objects.clone()),
        }
    }

    async fn batch_retrieve_objects(&self, object_ids: &[String]) -> SyncResult<Vec<CatalogObject>> {
        let mut state = self.state();
        state.retrieve_calls.push(object_ids.to_vec());
        if object_ids.iter().any(|id| state.failing_object_ids.contains(id)) {
            return Err(upstream(500));
        }
        Ok(state
            .objects
            .iter()
            .chain(state.unlisted_images.iter())
            .filter(|o| object_ids.contains(&o.id))
            .cloned()
            .collect())
    }

    async fn batch_retrieve_counts(&self, variation_ids: &[String]) -> SyncResult<Vec<InventoryCount>> {
        let state = self.state();
        if variation_ids.iter().any(|id| state.failing_count_ids.contains(id)) {
            return Err(upstream(500));
        }
        Ok(state
            .counts
            .iter()
            .filter(|c| variation_ids.contains(&c.catalog_object_id))
            .cloned()
            .collect())
    }

    async fn batch_create_changes(&self, changes: &[InventoryChange]) -> SyncResult<()> {
        let mut state = self.state();
        if changes
            .iter()
            .any(|c| state.failing_change_ids.contains(&c.adjustment.catalog_object_id))
        {
            return Err(upstream(400));
        }
        state.sent.extend_from_slice(changes);
        Ok(())
    }

    async fn fetch_image(&self, url: &str) -> SyncResult<ImageUpload> {
        Ok(ImageUpload {
            bytes: url.as_bytes().to_vec(),
            content_type: "image/jpeg".to_string(),
            file_name: "image.jpg".to_string(),
        })
    }

    async fn upload_image(&self, object_id: &str, _image: ImageUpload) -> SyncResult<String> {
        let mut state = self.state();
        if state.fail_uploads {
            return Err(upstream(500));
        }
        state.uploads.push(object_id.to_string());
        Ok(format!("IMG-{}", state.uploads.len()))
    }

    async fn list_locations(&self) -> SyncResult<Vec<Location>> {
        Ok(self.state().locations.clone())
    }
}

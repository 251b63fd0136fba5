//! # Square Wire Protocol
//!
//! The subset of Square's REST shapes a sync pass touches, plus the
//! [`PosCatalog`] trait the orchestrator talks through.
//!
//! ## Catalog Object Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CatalogObject { type: "ITEM", id: "ITEM1", updated_at, is_deleted }    │
//! │    └── item_data                                                        │
//! │          ├── name, description                                          │
//! │          ├── image_ids: ["IMG1"]                                        │
//! │          └── variations: [                                              │
//! │                CatalogObject { type: "ITEM_VARIATION", id: "VAR1" }     │
//! │                  └── item_variation_data { name: "S", sku, price_money }│
//! │              ]                                                          │
//! │                                                                         │
//! │  CatalogObject { type: "IMAGE", id: "IMG1" }                            │
//! │    └── image_data { url }                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inventory is separate: counts are keyed by
//! `(catalog_object_id, location_id, state)` and carry the quantity as a
//! decimal string.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SyncResult;

pub const OBJECT_TYPE_ITEM: &str = "ITEM";
pub const OBJECT_TYPE_IMAGE: &str = "IMAGE";
pub const STATE_IN_STOCK: &str = "IN_STOCK";
pub const LOCATION_ACTIVE: &str = "ACTIVE";

// =============================================================================
// Catalog Objects
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogObject {
    #[serde(rename = "type")]
    pub object_type: String,
    pub id: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_data: Option<CatalogItemData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_variation_data: Option<VariationData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<ImageData>,
}

impl CatalogObject {
    pub fn is_item(&self) -> bool {
        self.object_type == OBJECT_TYPE_ITEM
    }

    pub fn is_image(&self) -> bool {
        self.object_type == OBJECT_TYPE_IMAGE
    }

    /// Variations of an item; empty for anything else.
    pub fn variations(&self) -> &[CatalogObject] {
        self.item_data
            .as_ref()
            .map(|d| d.variations.as_slice())
            .unwrap_or_default()
    }

    /// Image ids of an item; empty for anything else.
    pub fn image_ids(&self) -> &[String] {
        self.item_data
            .as_ref()
            .map(|d| d.image_ids.as_slice())
            .unwrap_or_default()
    }

    pub fn name(&self) -> Option<&str> {
        self.item_data.as_ref().and_then(|d| d.name.as_deref())
    }

    pub fn variation_name(&self) -> Option<&str> {
        self.item_variation_data
            .as_ref()
            .and_then(|d| d.name.as_deref())
    }

    pub fn sku(&self) -> Option<&str> {
        self.item_variation_data
            .as_ref()
            .and_then(|d| d.sku.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_data
            .as_ref()
            .and_then(|d| d.url.as_deref())
            .filter(|u| !u.is_empty())
    }

    /// Latest of the item's own timestamp and its variations'.
    pub fn latest_updated_at(&self) -> Option<DateTime<Utc>> {
        self.variations()
            .iter()
            .filter_map(|v| v.updated_at)
            .chain(self.updated_at)
            .max()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogItemData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub variations: Vec<CatalogObject>,
    #[serde(default)]
    pub image_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariationData {
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price_money: Option<MoneyAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyAmount {
    /// Smallest currency unit (cents for USD).
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

// =============================================================================
// Inventory
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryCount {
    pub catalog_object_id: String,
    #[serde(default)]
    pub location_id: Option<String>,
    pub state: String,
    /// Decimal string, e.g. `"5"` or `"5.0"`.
    pub quantity: String,
    #[serde(default)]
    pub calculated_at: Option<DateTime<Utc>>,
}

impl InventoryCount {
    /// Whole units in stock; fractional or negative counts clamp down to a
    /// non-negative integer, unparseable ones read as 0.
    pub fn units(&self) -> u32 {
        let whole = self.quantity.trim().split('.').next().unwrap_or("");
        match whole.parse::<i64>() {
            Ok(n) => u32::try_from(n.max(0)).unwrap_or(u32::MAX),
            Err(_) => 0,
        }
    }
}

/// One `ADJUSTMENT` change for `inventory/changes/batch-create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryChange {
    #[serde(rename = "type")]
    pub change_type: String,
    pub adjustment: InventoryAdjustment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryAdjustment {
    pub catalog_object_id: String,
    pub location_id: String,
    pub quantity: String,
    pub from_state: String,
    pub to_state: String,
    pub occurred_at: DateTime<Utc>,
}

impl InventoryChange {
    /// Moves `quantity` units of a variation into IN_STOCK.
    pub fn stock_adjustment(
        variation_id: &str,
        location_id: &str,
        quantity: u32,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        InventoryChange {
            change_type: "ADJUSTMENT".to_string(),
            adjustment: InventoryAdjustment {
                catalog_object_id: variation_id.to_string(),
                location_id: location_id.to_string(),
                quantity: quantity.to_string(),
                from_state: "NONE".to_string(),
                to_state: STATE_IN_STOCK.to_string(),
                occurred_at,
            },
        }
    }
}

// =============================================================================
// Locations and Images
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Location {
    pub fn is_active(&self) -> bool {
        self.status.as_deref() == Some(LOCATION_ACTIVE)
    }
}

/// Downloaded image bytes, ready for a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

// =============================================================================
// Request/Response Envelopes
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListCatalogResponse {
    #[serde(default)]
    pub objects: Vec<CatalogObject>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchRetrieveObjectsRequest<'a> {
    pub object_ids: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BatchRetrieveObjectsResponse {
    #[serde(default)]
    pub objects: Vec<CatalogObject>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchRetrieveCountsRequest<'a> {
    pub catalog_object_ids: &'a [String],
    pub states: [&'static str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BatchRetrieveCountsResponse {
    #[serde(default)]
    pub counts: Vec<InventoryCount>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchChangeRequest<'a> {
    pub idempotency_key: String,
    pub changes: &'a [InventoryChange],
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateImageRequest<'a> {
    pub idempotency_key: String,
    pub object_id: &'a str,
    pub image: CatalogObject,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateImageResponse {
    pub image: CatalogObject,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListLocationsResponse {
    #[serde(default)]
    pub locations: Vec<Location>,
}

// =============================================================================
// Catalog Seam
// =============================================================================

/// Everything a pass needs from the POS.
///
/// [`crate::square::SquareClient`] is the production implementation; tests
/// substitute an in-memory catalog.
#[async_trait]
pub trait PosCatalog: Send + Sync {
    /// Full ITEM + IMAGE listing, all pages.
    async fn list_catalog(&self) -> SyncResult<Vec<CatalogObject>>;

    /// Objects by id for one chunk of ids (images the listing did not include).
    async fn batch_retrieve_objects(&self, object_ids: &[String]) -> SyncResult<Vec<CatalogObject>>;

    /// IN_STOCK counts for one chunk of variation ids, all pages.
    async fn batch_retrieve_counts(&self, variation_ids: &[String]) -> SyncResult<Vec<InventoryCount>>;

    /// Applies one batch of inventory changes.
    async fn batch_create_changes(&self, changes: &[InventoryChange]) -> SyncResult<()>;

    /// Downloads an image the storefront hosts.
    async fn fetch_image(&self, url: &str) -> SyncResult<ImageUpload>;

    /// Attaches an image to a catalog object and returns the new image id.
    async fn upload_image(&self, object_id: &str, image: ImageUpload) -> SyncResult<String>;

    async fn list_locations(&self) -> SyncResult<Vec<Location>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(quantity: &str) -> InventoryCount {
        InventoryCount {
            catalog_object_id: "VAR1".into(),
            location_id: None,
            state: STATE_IN_STOCK.into(),
            quantity: quantity.into(),
            calculated_at: None,
        }
    }

    #[test]
    fn test_count_units() {
        assert_eq!(count("5").units(), 5);
        assert_eq!(count("7.0").units(), 7);
        assert_eq!(count("-2").units(), 0);
        assert_eq!(count("lots").units(), 0);
    }

    #[test]
    fn test_decode_item_with_variations() {
        let json = r#"{
            "type": "ITEM",
            "id": "ITEM1",
            "updated_at": "2024-05-01T10:00:00Z",
            "item_data": {
                "name": "Reef Triangle Top",
                "image_ids": ["IMG1"],
                "variations": [
                    {
                        "type": "ITEM_VARIATION",
                        "id": "VAR1",
                        "updated_at": "2024-05-02T10:00:00Z",
                        "item_variation_data": {
                            "item_id": "ITEM1",
                            "name": "S",
                            "sku": " RT-S ",
                            "price_money": { "amount": 6400, "currency": "USD" }
                        }
                    }
                ]
            }
        }"#;

        let item: CatalogObject = serde_json::from_str(json).unwrap();

        assert!(item.is_item());
        assert_eq!(item.name(), Some("Reef Triangle Top"));
        assert_eq!(item.variations()[0].sku(), Some("RT-S"));
        assert_eq!(item.image_ids(), ["IMG1".to_string()]);
        assert_eq!(
            item.latest_updated_at().unwrap().to_rfc3339(),
            "2024-05-02T10:00:00+00:00"
        );
    }

    #[test]
    fn test_adjustment_wire_shape() {
        let change = InventoryChange::stock_adjustment("VAR1", "LOC1", 3, Utc::now());
        let value = serde_json::to_value(&change).unwrap();

        assert_eq!(value["type"], "ADJUSTMENT");
        assert_eq!(value["adjustment"]["quantity"], "3");
        assert_eq!(value["adjustment"]["from_state"], "NONE");
        assert_eq!(value["adjustment"]["to_state"], "IN_STOCK");
    }
}

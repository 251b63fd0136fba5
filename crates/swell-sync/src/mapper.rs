//! # Catalog Mapper
//!
//! Joins local products to Square catalog objects and translates between the
//! two shapes.
//!
//! ## Lookup Keys
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Square item ITEM1 (variations VAR_S sku "RT-S", VAR_M sku "RT-M")      │
//! │                                                                         │
//! │     "ITEM1" ──► VAR_S        item id maps to its first variation        │
//! │     "VAR_S" ──► VAR_S                                                   │
//! │     "VAR_M" ──► VAR_M                                                   │
//! │     "RT-S"  ──► VAR_S        SKU keys never displace an id key          │
//! │     "RT-M"  ──► VAR_M                                                   │
//! │                                                                         │
//! │  local product: id first, then item_number as a SKU                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::protocol::{CatalogObject, InventoryChange, PosCatalog};
use swell_core::catalog::size_label_for_variation;
use swell_core::{Product, SizeInventory, ONE_SIZE_LABEL};

// =============================================================================
// Mapping
// =============================================================================

/// A Square variation and the size it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariationRef {
    pub id: String,
    /// `None` for size-less variations.
    pub size_label: Option<String>,
}

/// What push needs to know about one Square item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemEntry {
    pub item_id: String,
    pub variations: Vec<VariationRef>,
    pub has_image: bool,
}

/// Result of looking up a local product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalMatch<'a> {
    Mapped {
        variation_id: &'a str,
        item: &'a ItemEntry,
    },
    Unmapped,
}

/// Lookup from local identity to Square variation.
#[derive(Debug, Default)]
pub struct CatalogMapping {
    variation_by_key: HashMap<String, String>,
    item_by_variation: HashMap<String, String>,
    items: HashMap<String, ItemEntry>,
}

impl CatalogMapping {
    /// Builds the lookup from listed catalog objects. Non-items, deleted
    /// items and items without variations are ignored.
    pub fn build(objects: &[CatalogObject]) -> Self {
        let mut mapping = CatalogMapping::default();
        let items: Vec<&CatalogObject> = objects
            .iter()
            .filter(|o| o.is_item() && !o.is_deleted && !o.variations().is_empty())
            .collect();

        for item in &items {
            let variations: Vec<VariationRef> = item
                .variations()
                .iter()
                .map(|v| VariationRef {
                    id: v.id.clone(),
                    size_label: size_label_for_variation(v.variation_name()),
                })
                .collect();

            mapping
                .variation_by_key
                .insert(item.id.clone(), variations[0].id.clone());
            for v in &variations {
                mapping.variation_by_key.insert(v.id.clone(), v.id.clone());
                mapping.item_by_variation.insert(v.id.clone(), item.id.clone());
            }

            mapping.items.insert(
                item.id.clone(),
                ItemEntry {
                    item_id: item.id.clone(),
                    variations,
                    has_image: !item.image_ids().is_empty(),
                },
            );
        }

        // SKUs last so they can only fill gaps.
        for item in &items {
            for v in item.variations() {
                if let Some(sku) = v.sku() {
                    mapping
                        .variation_by_key
                        .entry(sku.to_string())
                        .or_insert_with(|| v.id.clone());
                }
            }
        }

        debug!(
            items = mapping.items.len(),
            keys = mapping.variation_by_key.len(),
            "Catalog mapping built"
        );
        mapping
    }

    /// Finds the Square variation for a local product: id first, then
    /// `item_number` as a SKU.
    pub fn resolve_local(&self, product: &Product) -> LocalMatch<'_> {
        let variation_id = self.variation_by_key.get(&product.id).or_else(|| {
            product
                .item_number
                .as_deref()
                .and_then(|sku| self.variation_by_key.get(sku))
        });

        let Some(variation_id) = variation_id else {
            return LocalMatch::Unmapped;
        };

        match self
            .item_by_variation
            .get(variation_id)
            .and_then(|item_id| self.items.get(item_id))
        {
            Some(item) => LocalMatch::Mapped {
                variation_id: variation_id.as_str(),
                item,
            },
            None => LocalMatch::Unmapped,
        }
    }
}

/// Finds the local product a Square item belongs to: by id, then by any
/// variation SKU equal to a local `item_number`.
pub fn match_local<'a>(
    item: &CatalogObject,
    by_id: &'a HashMap<String, Product>,
    id_by_item_number: &HashMap<String, String>,
) -> Option<&'a Product> {
    by_id.get(&item.id).or_else(|| {
        item.variations()
            .iter()
            .filter_map(|v| v.sku())
            .find_map(|sku| id_by_item_number.get(sku))
            .and_then(|id| by_id.get(id))
    })
}

// =============================================================================
// Images
// =============================================================================

/// Image id → URL, seeded from the listing and topped up by batch-retrieve.
#[derive(Debug, Default)]
pub struct ImageIndex {
    urls: HashMap<String, String>,
}

impl ImageIndex {
    pub fn from_objects(objects: &[CatalogObject]) -> Self {
        let mut index = ImageIndex::default();
        index.extend(objects);
        index
    }

    pub fn extend(&mut self, objects: &[CatalogObject]) {
        for object in objects.iter().filter(|o| o.is_image()) {
            if let Some(url) = object.image_url() {
                self.urls.insert(object.id.clone(), url.to_string());
            }
        }
    }

    /// Referenced image ids the index cannot answer, in first-seen order.
    pub fn missing<'a, I>(&self, items: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a CatalogObject>,
    {
        let mut missing: Vec<String> = Vec::new();
        for item in items {
            for id in item.image_ids() {
                if !self.urls.contains_key(id) && !missing.contains(id) {
                    missing.push(id.clone());
                }
            }
        }
        missing
    }

    /// First resolvable URL among `image_ids`.
    pub fn resolve(&self, image_ids: &[String]) -> Option<&str> {
        image_ids
            .iter()
            .find_map(|id| self.urls.get(id))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Fetches referenced-but-unlisted images with batch-retrieve, at most
/// `chunk_size` ids per call.
///
/// A failed chunk leaves its images unresolved; it never fails the pass.
/// Returns the number of failed chunks.
pub async fn fill_missing_images<C>(
    catalog: &C,
    index: &mut ImageIndex,
    items: &[&CatalogObject],
    chunk_size: usize,
) -> usize
where
    C: PosCatalog + ?Sized,
{
    let missing = index.missing(items.iter().copied());
    let mut failed = 0;

    for chunk in missing.chunks(chunk_size.max(1)) {
        match catalog.batch_retrieve_objects(chunk).await {
            Ok(objects) => {
                index.extend(&objects);
                debug!(requested = chunk.len(), fetched = objects.len(), "Fetched missing images");
            }
            Err(e) => {
                warn!(requested = chunk.len(), error = %e, "Image batch-retrieve chunk failed");
                failed += 1;
            }
        }
    }

    failed
}

/// The URL of the first image in `image_ids` the index knows, if any.
pub fn resolve_image_url<'a>(image_ids: &[String], images: &'a ImageIndex) -> Option<&'a str> {
    images.resolve(image_ids)
}

// =============================================================================
// Inventory Shape
// =============================================================================

/// Stock for one item as Square reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStock {
    /// Empty for a single size-less variation.
    pub sizes: SizeInventory,
    pub inventory: u32,
}

/// Turns per-variation counts into a size map.
///
/// Returns `None` when the item has no variations or none of them has a
/// count record. A lone size-less variation carries its stock on the
/// aggregate; otherwise every variation becomes a size key, size-less ones
/// as `"One Size"`, and a variation without a count record reads as zero.
pub fn remote_stock(item: &CatalogObject, counts: &HashMap<String, u32>) -> Option<RemoteStock> {
    let variations = item.variations();
    if variations.is_empty() || !variations.iter().any(|v| counts.contains_key(&v.id)) {
        return None;
    }

    let labels: Vec<Option<String>> = variations
        .iter()
        .map(|v| size_label_for_variation(v.variation_name()))
        .collect();

    if variations.len() == 1 && labels[0].is_none() {
        let inventory = counts.get(&variations[0].id).copied().unwrap_or(0);
        return Some(RemoteStock {
            sizes: SizeInventory::new(),
            inventory,
        });
    }

    let mut sizes: BTreeMap<String, u32> = BTreeMap::new();
    for (variation, label) in variations.iter().zip(labels) {
        let label = label.unwrap_or_else(|| ONE_SIZE_LABEL.to_string());
        let quantity = counts.get(&variation.id).copied().unwrap_or(0);
        let slot = sizes.entry(label).or_insert(0);
        *slot = slot.saturating_add(quantity);
    }

    let sizes = SizeInventory::from(sizes);
    let inventory = sizes.total();
    Some(RemoteStock { sizes, inventory })
}

/// Inventory changes that carry a local product's stock to Square.
///
/// With sizes whose labels match the item's variations: one change per
/// matched size. Otherwise one change of the aggregate to `variation_id`.
pub fn stock_changes(
    product: &Product,
    item: &ItemEntry,
    variation_id: &str,
    location_id: &str,
    occurred_at: DateTime<Utc>,
) -> Vec<InventoryChange> {
    if product.has_sizes() {
        let by_size: Vec<InventoryChange> = item
            .variations
            .iter()
            .filter_map(|v| {
                let label = v.size_label.as_deref().unwrap_or(ONE_SIZE_LABEL);
                product
                    .size_inventory
                    .get(label)
                    .map(|qty| InventoryChange::stock_adjustment(&v.id, location_id, qty, occurred_at))
            })
            .collect();

        if !by_size.is_empty() {
            return by_size;
        }
    }

    vec![InventoryChange::stock_adjustment(
        variation_id,
        location_id,
        product.inventory,
        occurred_at,
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockCatalog;
    use crate::protocol::{CatalogItemData, ImageData, VariationData};
    use swell_core::{Money, ProductType};

    fn variation(id: &str, name: &str, sku: Option<&str>) -> CatalogObject {
        CatalogObject {
            object_type: "ITEM_VARIATION".into(),
            id: id.into(),
            item_variation_data: Some(VariationData {
                name: Some(name.into()),
                sku: sku.map(str::to_string),
                ..VariationData::default()
            }),
            ..CatalogObject::default()
        }
    }

    fn item(id: &str, variations: Vec<CatalogObject>, image_ids: &[&str]) -> CatalogObject {
        CatalogObject {
            object_type: "ITEM".into(),
            id: id.into(),
            item_data: Some(CatalogItemData {
                name: Some("Reef Triangle Top".into()),
                variations,
                image_ids: image_ids.iter().map(|s| s.to_string()).collect(),
                ..CatalogItemData::default()
            }),
            ..CatalogObject::default()
        }
    }

    fn image(id: &str, url: &str) -> CatalogObject {
        CatalogObject {
            object_type: "IMAGE".into(),
            id: id.into(),
            image_data: Some(ImageData {
                url: Some(url.into()),
                name: None,
            }),
            ..CatalogObject::default()
        }
    }

    fn product(id: &str, item_number: Option<&str>) -> Product {
        let mut p = Product::new("Reef Triangle Top", ProductType::Top, Money::from_cents(6400), Utc::now());
        p.id = id.into();
        p.item_number = item_number.map(str::to_string);
        p
    }

    #[test]
    fn test_resolve_by_id_then_sku() {
        let objects = vec![item(
            "ITEM1",
            vec![variation("VAR_S", "S", Some("RT-S")), variation("VAR_M", "M", Some("RT-M"))],
            &[],
        )];
        let mapping = CatalogMapping::build(&objects);

        match mapping.resolve_local(&product("ITEM1", None)) {
            LocalMatch::Mapped { variation_id, item } => {
                assert_eq!(variation_id, "VAR_S");
                assert_eq!(item.item_id, "ITEM1");
            }
            LocalMatch::Unmapped => panic!("expected mapped"),
        }
        assert!(matches!(
            mapping.resolve_local(&product("local-uuid", Some("RT-M"))),
            LocalMatch::Mapped { variation_id: "VAR_M", .. }
        ));
        assert_eq!(mapping.resolve_local(&product("local-uuid", None)), LocalMatch::Unmapped);
    }

    #[test]
    fn test_sku_never_overwrites_id() {
        // Item B's SKU collides with item A's id.
        let objects = vec![
            item("ITEM_A", vec![variation("VAR_A", "Regular", None)], &[]),
            item("ITEM_B", vec![variation("VAR_B", "Regular", Some("ITEM_A"))], &[]),
        ];
        let mapping = CatalogMapping::build(&objects);

        assert!(matches!(
            mapping.resolve_local(&product("ITEM_A", None)),
            LocalMatch::Mapped { variation_id: "VAR_A", .. }
        ));
    }

    #[test]
    fn test_image_resolution_and_missing() {
        let listed = vec![
            item("ITEM1", vec![variation("V1", "S", None)], &["IMG_GONE", "IMG1"]),
            item("ITEM2", vec![variation("V2", "S", None)], &["IMG2"]),
            image("IMG1", "https://img.example.com/1.jpg"),
        ];
        let index = ImageIndex::from_objects(&listed);

        assert_eq!(
            resolve_image_url(listed[0].image_ids(), &index),
            Some("https://img.example.com/1.jpg")
        );
        assert_eq!(index.resolve(listed[1].image_ids()), None);
        assert_eq!(index.missing(&listed[..2]), vec!["IMG_GONE".to_string(), "IMG2".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_images_fetched_in_chunks() {
        let catalog = MockCatalog::new();
        catalog.add_item("ITEM1", "Reef Top", None, &[("V1", "S", 1)]);
        catalog.add_item("ITEM2", "Palm Bottom", None, &[("V2", "S", 1)]);
        catalog.add_unlisted_image("ITEM1", "IMG1", "https://img.example.com/1.jpg");
        catalog.add_unlisted_image("ITEM1", "IMG2", "https://img.example.com/2.jpg");
        catalog.add_unlisted_image("ITEM2", "IMG3", "https://img.example.com/3.jpg");
        catalog.fail_retrieve_for("IMG3");

        let objects = catalog.list_catalog().await.unwrap();
        let items: Vec<&CatalogObject> = objects.iter().filter(|o| o.is_item()).collect();
        let mut index = ImageIndex::from_objects(&objects);

        let failed = fill_missing_images(&catalog, &mut index, &items, 2).await;

        assert_eq!(failed, 1);
        assert_eq!(
            catalog.retrieve_calls(),
            vec![
                vec!["IMG1".to_string(), "IMG2".to_string()],
                vec!["IMG3".to_string()],
            ]
        );
        assert_eq!(index.resolve(items[0].image_ids()), Some("https://img.example.com/1.jpg"));
        assert_eq!(index.resolve(items[1].image_ids()), None);
        assert_eq!(index.len(), 2);
    }

    #[tokio::test]
    async fn test_nothing_missing_skips_retrieve() {
        let catalog = MockCatalog::new();
        catalog.add_item("ITEM1", "Reef Top", None, &[("V1", "S", 1)]);
        catalog.add_image("ITEM1", "IMG1", "https://img.example.com/1.jpg");

        let objects = catalog.list_catalog().await.unwrap();
        let items: Vec<&CatalogObject> = objects.iter().filter(|o| o.is_item()).collect();
        let mut index = ImageIndex::from_objects(&objects);

        assert_eq!(fill_missing_images(&catalog, &mut index, &items, 2).await, 0);
        assert!(catalog.retrieve_calls().is_empty());
    }

    #[test]
    fn test_single_sizeless_variation_uses_aggregate() {
        let it = item("ITEM1", vec![variation("V1", "Regular", None)], &[]);
        let counts = HashMap::from([("V1".to_string(), 7)]);

        let stock = remote_stock(&it, &counts).unwrap();

        assert!(stock.sizes.is_empty());
        assert_eq!(stock.inventory, 7);
    }

    #[test]
    fn test_sized_variations_become_keys() {
        let it = item(
            "ITEM1",
            vec![variation("VS", "S", None), variation("VM", "M", None), variation("VR", "", None)],
            &[],
        );
        let counts = HashMap::from([("VS".to_string(), 2), ("VR".to_string(), 1)]);

        let stock = remote_stock(&it, &counts).unwrap();

        assert_eq!(stock.sizes.get("S"), Some(2));
        assert_eq!(stock.sizes.get("M"), Some(0));
        assert_eq!(stock.sizes.get(ONE_SIZE_LABEL), Some(1));
        assert_eq!(stock.inventory, 3);
    }

    #[test]
    fn test_no_count_records_is_none() {
        let it = item("ITEM1", vec![variation("V1", "S", None)], &[]);
        assert!(remote_stock(&it, &HashMap::new()).is_none());
        assert!(remote_stock(&item("ITEM2", vec![], &[]), &HashMap::new()).is_none());
    }

    #[test]
    fn test_stock_changes_per_matched_size() {
        let mut p = product("ITEM1", None);
        p.set_size_inventory(SizeInventory::from_pairs([("S", 3), ("M", 0), ("XL", 4)]), Utc::now());
        let entry = ItemEntry {
            item_id: "ITEM1".into(),
            variations: vec![
                VariationRef { id: "VS".into(), size_label: Some("S".into()) },
                VariationRef { id: "VM".into(), size_label: Some("M".into()) },
            ],
            has_image: false,
        };

        let changes = stock_changes(&p, &entry, "VS", "LOC1", Utc::now());

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].adjustment.catalog_object_id, "VS");
        assert_eq!(changes[0].adjustment.quantity, "3");
        assert_eq!(changes[1].adjustment.quantity, "0");
    }

    #[test]
    fn test_stock_changes_fall_back_to_aggregate() {
        let mut p = product("ITEM1", None);
        p.set_size_inventory(SizeInventory::from_pairs([("S", 3), ("M", 2)]), Utc::now());
        let entry = ItemEntry {
            item_id: "ITEM1".into(),
            variations: vec![VariationRef { id: "V1".into(), size_label: None }],
            has_image: true,
        };

        let changes = stock_changes(&p, &entry, "V1", "LOC1", Utc::now());

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].adjustment.quantity, "5");
    }
}

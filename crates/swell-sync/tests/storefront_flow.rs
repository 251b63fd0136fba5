//! Cross-crate scenarios: fulfillment through the ledger, then Square passes.

use chrono::{DateTime, Duration, Utc};
use swell_core::{
    Money, OrderChannel, OrderDraft, OrderItem, Product, ProductType, SizeInventory,
};
use swell_db::{Database, DbConfig};
use swell_sync::mock::MockCatalog;
use swell_sync::{SyncOrchestrator, SyncSettings};

fn at(minutes: i64) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
        + Duration::minutes(minutes)
}

async fn db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

fn draft(product: &Product, size: &str, quantity: u32, channel: OrderChannel) -> OrderDraft {
    OrderDraft {
        customer_name: "Ana Reyes".to_string(),
        customer_email: "ana@example.com".to_string(),
        shipping_cost_cents: 0,
        channel,
        payment_reference: None,
        items: vec![OrderItem {
            product_id: product.id.clone(),
            title: product.title.clone(),
            quantity,
            price_cents: product.price_cents,
            size: size.to_string(),
            image: None,
        }],
    }
}

#[tokio::test]
async fn test_web_then_pos_then_older_pull_keeps_local_stock() {
    let db = db().await;
    let mut product = Product::new(
        "Reef Triangle Top",
        ProductType::Top,
        Money::from_cents(6400),
        Utc::now(),
    );
    product.id = "ITEM1".to_string();
    product.set_size_inventory(SizeInventory::from_pairs([("S", 5), ("M", 5)]), Utc::now());
    db.products().insert(&product).await.unwrap();

    // Web checkout {S, 2}
    let web = draft(&product, "S", 2, OrderChannel::Web);
    let lines = web.line_items();
    db.fulfillment().fulfill(web, lines).await.unwrap();

    let after_web = db.products().get_by_id("ITEM1").await.unwrap().unwrap();
    assert_eq!(after_web.size_inventory, SizeInventory::from_pairs([("S", 3), ("M", 5)]));
    assert_eq!(after_web.inventory, 8);

    // POS sale {M, 5}
    let pos = draft(&product, "M", 5, OrderChannel::Pos);
    let lines = pos.line_items();
    let result = db.fulfillment().fulfill(pos, lines).await.unwrap();
    assert!(!result.short);

    let after_pos = db.products().get_by_id("ITEM1").await.unwrap().unwrap();
    assert_eq!(after_pos.size_inventory, SizeInventory::from_pairs([("S", 3), ("M", 0)]));
    assert_eq!(after_pos.inventory, 3);

    // Square still holds the stale counts, last touched long ago.
    let catalog = MockCatalog::new();
    catalog.add_item("ITEM1", "Reef Triangle Top (Coral)", Some(at(0)), &[("VS", "S", 5), ("VM", "M", 5)]);
    catalog.set_description("ITEM1", "Lined, adjustable ties.");

    let report = SyncOrchestrator::new(db.products(), catalog, SyncSettings::default())
        .pull()
        .await
        .unwrap();

    assert_eq!(report.local_kept, 1);
    let pulled = db.products().get_by_id("ITEM1").await.unwrap().unwrap();
    assert_eq!(pulled.inventory, 3);
    assert_eq!(pulled.size_inventory, after_pos.size_inventory);
    assert_eq!(pulled.updated_at, after_pos.updated_at);
    assert_eq!(pulled.title, "Reef Triangle Top (Coral)");
    assert_eq!(pulled.description, "Lined, adjustable ties.");
    assert_eq!(db.orders().list(10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_repeat_pull_is_idempotent() {
    let db = db().await;
    let catalog = MockCatalog::new();
    catalog.add_item("ITEM1", "Palm Bandeau Top", Some(at(0)), &[("V1", "S", 2), ("V2", "M", 4)]);
    catalog.add_item("ITEM2", "Linen Sarong", Some(at(3)), &[("V3", "Regular", 6)]);
    catalog.add_uncounted_item("ITEM3", "Gift Card", &["V4"]);
    catalog.add_unlisted_image("ITEM2", "IMG9", "https://img.example.com/sarong.jpg");

    let orchestrator = SyncOrchestrator::new(db.products(), catalog, SyncSettings::default());

    let first = orchestrator.pull().await.unwrap();
    let snapshot = db.products().list_all().await.unwrap();

    let second = orchestrator.pull().await.unwrap();
    let again = db.products().list_all().await.unwrap();

    assert_eq!(first.synced, 3);
    assert_eq!(second.synced, 3);
    assert_eq!(second, first);
    assert_eq!(second.images_found, 1);
    assert_eq!(snapshot, again);

    let sarong = again.iter().find(|p| p.id == "ITEM2").unwrap();
    assert!(sarong.size_inventory.is_empty());
    assert_eq!(sarong.inventory, 6);
    assert_eq!(sarong.image_url.as_deref(), Some("https://img.example.com/sarong.jpg"));
}

#[tokio::test]
async fn test_unmapped_product_is_excluded_from_push() {
    let db = db().await;
    let catalog = MockCatalog::new();
    catalog.add_location("LOC1", "ACTIVE");

    for (id, sku) in [("ITEM1", None), ("local-only", Some("RT-9")), ("orphan", None)] {
        let mut p = Product::new("Reef Top", ProductType::Top, Money::from_cents(6400), Utc::now());
        p.id = id.to_string();
        p.item_number = sku.map(str::to_string);
        p.set_unsized_inventory(4, Utc::now()).unwrap();
        db.products().insert(&p).await.unwrap();
    }
    catalog.add_item("ITEM1", "Reef Top", None, &[("V1", "Regular", 0)]);
    catalog.add_item_with_sku("ITEM2", "Reef Top Blue", None, "V2", "RT-9", 0);

    let report = SyncOrchestrator::new(db.products(), catalog.clone(), SyncSettings::default())
        .push()
        .await
        .unwrap();

    assert_eq!(report.total_attempted, 3);
    assert_eq!(report.mapped_count, report.total_attempted - 1);
    assert_eq!(report.synced, 2);
    assert_eq!(report.failed_batches, 0);

    let sent = catalog.sent_changes();
    let mut targets: Vec<&str> = sent
        .iter()
        .map(|c| c.adjustment.catalog_object_id.as_str())
        .collect();
    targets.sort_unstable();
    assert_eq!(targets, ["V1", "V2"]);
}

//! Offline unit tests for katalog-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;
use katalog_core::{AppConfig, CanonicalEntity, Environment, OfferType, RawCapture, StalePrice};
use katalog_db::{OfferRow, PoolConfig, PriceRow, RawCaptureRow};
use rust_decimal::Decimal;
use sqlx::types::Json;
use uuid::Uuid;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        shops_path: PathBuf::from("./config/shops.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        fetch_timeout_secs: 30,
        browser_timeout_secs: 120,
        user_agent: "ua".to_string(),
        batch_size: 10,
        process_cron: "0 */5 * * * *".to_string(),
        rescrape_cron: "0 0 */6 * * *".to_string(),
        rescrape_after_hours: 24,
        rescrape_limit: 50,
        match_exact_threshold: 0.95,
        match_probable_threshold: 0.70,
        home_currency: "RSD".to_string(),
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn raw_capture_row_converts_to_domain_capture() {
    let captured_at = Utc::now();
    let row = RawCaptureRow {
        id: 1,
        shop_id: "gigatron".to_string(),
        shop_name: "Gigatron".to_string(),
        external_id: "samsung-a55".to_string(),
        url: "https://gigatron.example/samsung-a55".to_string(),
        name: "Samsung Galaxy A55 8/256GB".to_string(),
        description: None,
        brand: Some("Samsung".to_string()),
        category: Some("Telefoni".to_string()),
        price: Decimal::new(4_499_900, 2),
        currency: "RSD".to_string(),
        image_urls: vec!["https://gigatron.example/a55.jpg".to_string()],
        specs: Json(BTreeMap::from([("RAM".to_string(), "8GB".to_string())])),
        in_stock: true,
        offer_type: "good".to_string(),
        captured_at,
        processing_state: "unprocessed".to_string(),
        invalid_reason: None,
    };

    let capture = RawCapture::from(row);
    assert_eq!(capture.key(), "gigatron:samsung-a55");
    assert_eq!(capture.price, Decimal::new(4_499_900, 2));
    assert_eq!(capture.specs.get("RAM").map(String::as_str), Some("8GB"));
    assert_eq!(capture.offer_type, OfferType::Good);
    assert_eq!(capture.captured_at, captured_at);
}

#[test]
fn offer_row_converts_to_entity_and_keeps_identity() {
    let id = Uuid::new_v4();
    let row = OfferRow {
        id,
        identity_key: "servis klime||service".to_string(),
        name: "Servis klime".to_string(),
        normalized_name: "servis klime".to_string(),
        brand: None,
        normalized_brand: None,
        category: None,
        description: Some("Ciscenje i dopuna freona".to_string()),
        image_url: None,
        specs: Json(BTreeMap::new()),
        offer_type: "service".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let identity_key = row.identity_key.clone();

    let entity = CanonicalEntity::from(row);
    assert_eq!(entity.id, id);
    assert_eq!(entity.offer_type, OfferType::Service);
    assert_eq!(entity.identity_key(), identity_key);
}

#[test]
fn price_row_converts_to_stale_price() {
    let product_id = Uuid::new_v4();
    let updated_at = Utc::now();
    let row = PriceRow {
        product_id,
        shop_id: "tehnomanija".to_string(),
        shop_name: "Tehnomanija".to_string(),
        price: Decimal::from(12_999),
        currency: "RSD".to_string(),
        url: "https://tehnomanija.example/p/1".to_string(),
        in_stock: false,
        updated_at,
    };

    assert_eq!(
        StalePrice::from(row),
        StalePrice {
            product_id,
            shop_id: "tehnomanija".to_string(),
            url: "https://tehnomanija.example/p/1".to_string(),
            updated_at,
        }
    );
}

use super::*;

fn shop(id: &str) -> ShopConfig {
    let mut selectors = BTreeMap::new();
    selectors.insert("name".to_string(), "h1.product-title".to_string());
    selectors.insert("price".to_string(), ".price, .product-price".to_string());
    ShopConfig {
        id: id.to_string(),
        name: format!("Shop {id}"),
        base_url: format!("https://{id}.example"),
        selectors,
        rate_limit_ms: 0,
        retry_limit: 0,
        retry_backoff_ms: 0,
        requires_js: false,
        offer_type: OfferType::Good,
        enabled: true,
        title_suffixes: Vec::new(),
    }
}

#[test]
fn retry_limit_defaults_and_caps() {
    let mut s = shop("a");
    assert_eq!(s.effective_retry_limit(), 3);
    s.retry_limit = 2;
    assert_eq!(s.effective_retry_limit(), 2);
    s.retry_limit = 50;
    assert_eq!(s.effective_retry_limit(), 5);
}

#[test]
fn retry_backoff_defaults_and_caps() {
    let mut s = shop("a");
    assert_eq!(s.effective_retry_backoff_ms(), 3_000);
    s.retry_backoff_ms = 500;
    assert_eq!(s.effective_retry_backoff_ms(), 500);
    s.retry_backoff_ms = 600_000;
    assert_eq!(s.effective_retry_backoff_ms(), 60_000);
}

#[test]
fn selector_chain_ignores_blank_entries() {
    let mut s = shop("a");
    s.selectors.insert("brand".to_string(), "   ".to_string());
    assert_eq!(s.selector_chain("price"), Some(".price, .product-price"));
    assert_eq!(s.selector_chain("brand"), None);
    assert_eq!(s.selector_chain("category"), None);
}

#[test]
fn validate_accepts_valid_shops() {
    let file = ShopsFile {
        shops: vec![shop("a"), shop("b")],
    };
    assert!(validate_shops(&file).is_ok());
}

#[test]
fn validate_rejects_empty_id() {
    let file = ShopsFile {
        shops: vec![shop(" ")],
    };
    let err = validate_shops(&file).unwrap_err();
    assert!(err.to_string().contains("non-empty"));
}

#[test]
fn validate_rejects_duplicate_id_case_insensitively() {
    let file = ShopsFile {
        shops: vec![shop("tech"), shop("TECH")],
    };
    let err = validate_shops(&file).unwrap_err();
    assert!(err.to_string().contains("duplicate shop id"));
}

#[test]
fn validate_rejects_non_http_base_url() {
    let mut s = shop("a");
    s.base_url = "ftp://a.example".to_string();
    let err = validate_shops(&ShopsFile { shops: vec![s] }).unwrap_err();
    assert!(err.to_string().contains("base_url"));
}

#[test]
fn validate_rejects_missing_price_chain() {
    let mut s = shop("a");
    s.selectors.remove("price");
    let err = validate_shops(&ShopsFile { shops: vec![s] }).unwrap_err();
    assert!(err.to_string().contains("'price' selector chain"));
}

#[test]
fn yaml_defaults_are_applied() {
    let yaml = r#"
shops:
  - id: tech
    name: Tech Shop
    base_url: https://tech.example
    selectors:
      name: h1
      price: .price
"#;
    let file: ShopsFile = serde_yaml::from_str(yaml).unwrap();
    let s = &file.shops[0];
    assert!(s.enabled);
    assert!(!s.requires_js);
    assert_eq!(s.offer_type, OfferType::Good);
    assert_eq!(s.effective_retry_limit(), 3);
}

#[test]
fn load_shops_from_real_file() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join("shops.yaml");
    assert!(path.exists(), "shops.yaml missing at {path:?}");
    let result = load_shops(&path);
    assert!(result.is_ok(), "failed to load shops.yaml: {result:?}");
    assert!(!result.unwrap().shops.is_empty());
}

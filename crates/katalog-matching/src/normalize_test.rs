use super::*;

fn name(raw: &str) -> String {
    NameNormalizer::default().normalize(raw, OfferType::Good)
}

fn service(raw: &str) -> String {
    NameNormalizer::default().normalize(raw, OfferType::Service)
}

#[test]
fn colour_and_size_words_are_dropped() {
    assert_eq!(name("iPhone 15 Pro Max Black"), "iphone 15");
    assert_eq!(name("iPhone 15 Pro Max White"), "iphone 15");
    assert_eq!(name("Apple iPhone 15 Midnight"), "apple iphone 15");
}

#[test]
fn slash_variants_keep_the_storage_size() {
    assert_eq!(name("iPhone 15 12/512GB"), "iphone 15 512");
    assert_eq!(name("Galaxy A55 8/256 GB"), "galaxy a55 256");
}

#[test]
fn memory_suffix_is_stripped_only_from_numbers() {
    assert_eq!(name("Redmi Note 13 256GB"), "redmi note 13 256");
    assert_eq!(name("Redmi Note 13 256 GB"), "redmi note 13 256");
    assert_eq!(name("Megagb router"), "megagb router");
}

#[test]
fn dash_variants_and_underscores_become_spaces() {
    assert_eq!(name("Wi-Fi_ruter\u{2013}AX3000\u{2014}dual"), "wi fi ruter ax3000 dual");
}

#[test]
fn short_tokens_survive_only_when_numeric() {
    assert_eq!(name("Samsung S 24 a 5"), "samsung 24 5");
}

#[test]
fn punctuation_and_foreign_letters_are_removed() {
    assert_eq!(name("  LG OLED55C3 (2023.) \"TV\"! "), "lg oled55c3 2023 tv");
}

#[test]
fn units_are_folded_onto_their_number() {
    assert_eq!(name("Kafa Grand 500 gr"), "kafa grand 500g");
    assert_eq!(name("Mleko 1 l"), "mleko 1l");
    assert_eq!(name("Brasno 5 kilo"), "brasno 5kg");
    assert_eq!(name("Сок 200 мл"), "сок 200ml");
}

#[test]
fn service_durations_are_folded() {
    assert_eq!(service("Masaza 60 min"), "masaza 60min");
    assert_eq!(service("Iznajmljivanje 2 hours"), "iznajmljivanje 2h");
}

#[test]
fn serbian_latin_diacritics_are_transliterated() {
    assert_eq!(name("Čajnik Đorđević Šolja Žuta"), "cajnik djordjevic solja zuta");
}

#[test]
fn serbian_cyrillic_is_kept() {
    assert_eq!(name("Фрижидер Горење ђ љ"), "фрижидер горење");
    assert_eq!(name("Шпорет џезва"), "шпорет џезва");
}

#[test]
fn stop_words_depend_on_offer_type() {
    assert_eq!(service("Usluga zamene ekrana, cena"), "zamene ekrana");
    assert_eq!(name("Usluga zamene ekrana Pro"), "usluga zamene ekrana");
    assert_eq!(service("Servis Pro paket"), "servis pro paket");
}

#[test]
fn empty_and_noise_only_names_normalize_to_empty() {
    assert_eq!(name(""), "");
    assert_eq!(name("   "), "");
    assert_eq!(name("Black / Pro - Max"), "");
}

#[test]
fn normalization_is_idempotent() {
    let samples = [
        "iPhone 15 Pro Max Black",
        "iPhone 15 12/512GB",
        "Kafa 500 black gr",
        "Wi-Fi ruter – AX3000",
        "Сок 200 мл",
        "Čajnik Đorđević",
        "a/b c/12gb x 7",
        "5 pro g",
        "Usluga 1 h cena",
    ];
    let normalizer = NameNormalizer::default();
    for offer_type in [OfferType::Good, OfferType::Service] {
        for raw in samples {
            let once = normalizer.normalize(raw, offer_type);
            let twice = normalizer.normalize(&once, offer_type);
            assert_eq!(once, twice, "not idempotent for {raw:?} ({offer_type})");
        }
    }
}

#[test]
fn tokens_joined_by_dropping_a_stop_word_still_fold() {
    // "black" disappears, leaving "500 gr" which must fold to "500g".
    assert_eq!(name("Kafa 500 black gr"), "kafa 500g");
}

#[test]
fn injected_rules_replace_the_defaults() {
    let mut rules = NormalizationRules::default();
    rules.goods_stop_words.insert("crveni".to_string());
    let normalizer = NameNormalizer::new(Arc::new(rules));
    assert_eq!(
        normalizer.normalize("Telefon crveni", OfferType::Good),
        "telefon"
    );
}

#[test]
fn empty_transliteration_table_drops_diacritic_letters() {
    let rules = NormalizationRules {
        transliterations: Vec::new(),
        ..NormalizationRules::default()
    };
    let normalizer = NameNormalizer::new(Arc::new(rules));
    assert_eq!(normalizer.normalize("Čokolada Šumadija", OfferType::Good), "okolada umadija");
    assert_eq!(name("Čokolada Šumadija"), "cokolada sumadija");
}

#[test]
fn brands_are_compacted_and_aliased() {
    let brands = BrandNormalizer::default();
    assert_eq!(brands.normalize("Samsung"), "samsung");
    assert_eq!(brands.normalize(" LG Electronics "), "lg");
    assert_eq!(brands.normalize("One-Plus"), "oneplus");
    assert_eq!(brands.normalize("real_me"), "realme");
    assert_eq!(brands.normalize("Gorenje"), "gorenje");
    assert_eq!(brands.normalize("Bosch \u{2013} Siemens"), "boschsiemens");
}

#[test]
fn blank_brand_is_absent() {
    let brands = BrandNormalizer::default();
    assert_eq!(brands.normalize_opt(None), None);
    assert_eq!(brands.normalize_opt(Some("  ")), None);
    assert_eq!(brands.normalize_opt(Some("Apple")), Some("apple".to_string()));
}

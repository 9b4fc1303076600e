//! Lookup tables that drive name and brand normalization.
//!
//! [`NormalizationRules::default`] carries the tables tuned for Serbian shop
//! listings. Callers that need other locales build their own value and pass
//! it to the normalizers at construction time.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use katalog_core::OfferType;

use crate::error::MatchingError;

/// Folds `<number> <unit alias>` into `<number><canonical>`, e.g. `500 gr`
/// into `500g`.
#[derive(Debug, Clone)]
pub struct UnitRule {
    canonical: String,
    pattern: Regex,
}

impl UnitRule {
    /// # Errors
    ///
    /// Returns [`MatchingError::UnitPattern`] if the aliases do not form a
    /// valid pattern.
    pub fn new(canonical: &str, aliases: &[&str]) -> Result<Self, MatchingError> {
        let alternatives = aliases
            .iter()
            .map(|alias| regex::escape(alias))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(\d+)\s*({alternatives})\b")).map_err(
            |source| MatchingError::UnitPattern {
                canonical: canonical.to_string(),
                source,
            },
        )?;
        Ok(Self {
            canonical: canonical.to_string(),
            pattern,
        })
    }

    #[must_use]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub(crate) fn apply(&self, text: &str) -> String {
        let replacement = format!("${{1}}{}", self.canonical);
        self.pattern
            .replace_all(text, replacement.as_str())
            .into_owned()
    }
}

const UNIT_ALIASES: &[(&str, &[&str])] = &[
    ("kg", &["kg", "kilo", "кило", "килограм", "килограма"]),
    ("g", &["g", "gr", "грам", "грама"]),
    ("mg", &["mg", "милиграм", "милиграма"]),
    ("l", &["l", "литр", "литра", "литре"]),
    ("ml", &["ml", "мл", "милилитр", "милилитра"]),
    ("h", &["h", "hr", "hour", "hours", "час", "часа"]),
    ("min", &["min", "mins", "мин", "минут", "минута"]),
    ("sec", &["sec", "secs", "сек", "секунд", "секунда"]),
];

static DEFAULT_UNIT_RULES: LazyLock<Vec<UnitRule>> = LazyLock::new(|| {
    UNIT_ALIASES
        .iter()
        .map(|(canonical, aliases)| UnitRule::new(canonical, aliases).expect("valid regex"))
        .collect()
});

const GOODS_STOP_WORDS: &[&str] = &[
    "crni", "black", "white", "midnight", "gb", "mb", "tb", "pro", "max", "mini", "plus",
];

const SERVICE_STOP_WORDS: &[&str] = &[
    "usluga", "usluge", "service", "services", "cena", "cene", "price", "prices",
];

const MEMORY_SUFFIXES: &[&str] = &["gb", "mb", "tb"];

/// Serbian Latin diacritics folded to ASCII before the alphabet filter runs.
/// Without it `č` and friends are not kept characters and vanish, so
/// `čokolada` and `cokolada` would get different dedup keys.
const TRANSLITERATIONS: &[(char, &str)] = &[('č', "c"), ('ć', "c"), ('š', "s"), ('ž', "z"), ('đ', "dj")];

const BRAND_ALIASES: &[(&str, &str)] = &[
    ("samsung", "samsung"),
    ("samsungelectronics", "samsung"),
    ("apple", "apple"),
    ("xiaomi", "xiaomi"),
    ("huawei", "huawei"),
    ("motorola", "motorola"),
    ("lg", "lg"),
    ("lgelectronics", "lg"),
    ("sony", "sony"),
    ("nokia", "nokia"),
    ("oneplus", "oneplus"),
    ("oppo", "oppo"),
    ("vivo", "vivo"),
    ("realme", "realme"),
];

#[derive(Debug, Clone)]
pub struct NormalizationRules {
    pub goods_stop_words: HashSet<String>,
    pub service_stop_words: HashSet<String>,
    /// Stripped from a token only when what remains is a plain number.
    pub memory_suffixes: Vec<String>,
    /// Applied to every character before filtering, so it shapes the
    /// normalized name and with it the dedup key. An empty table turns
    /// transliteration off and unlisted letters outside the kept alphabet
    /// are dropped.
    pub transliterations: Vec<(char, String)>,
    pub unit_rules: Vec<UnitRule>,
    /// Keys are brands after lowercasing and separator removal.
    pub brand_aliases: HashMap<String, String>,
}

impl Default for NormalizationRules {
    fn default() -> Self {
        Self {
            goods_stop_words: to_set(GOODS_STOP_WORDS),
            service_stop_words: to_set(SERVICE_STOP_WORDS),
            memory_suffixes: MEMORY_SUFFIXES.iter().map(ToString::to_string).collect(),
            transliterations: TRANSLITERATIONS
                .iter()
                .map(|(from, to)| (*from, (*to).to_string()))
                .collect(),
            unit_rules: DEFAULT_UNIT_RULES.clone(),
            brand_aliases: BRAND_ALIASES
                .iter()
                .map(|(from, to)| ((*from).to_string(), (*to).to_string()))
                .collect(),
        }
    }
}

impl NormalizationRules {
    #[must_use]
    pub fn stop_words(&self, offer_type: OfferType) -> &HashSet<String> {
        match offer_type {
            OfferType::Good => &self.goods_stop_words,
            OfferType::Service => &self.service_stop_words,
        }
    }
}

fn to_set(words: &[&str]) -> HashSet<String> {
    words.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_rule_folds_latin_and_cyrillic_aliases() {
        let grams = UnitRule::new("g", &["g", "gr", "грам"]).unwrap();
        assert_eq!(grams.apply("kafa 500 gr"), "kafa 500g");
        assert_eq!(grams.apply("kafa 500грам"), "kafa 500g");
        assert_eq!(grams.apply("128 gb"), "128 gb");
    }

    #[test]
    fn default_rules_cover_both_offer_types() {
        let rules = NormalizationRules::default();
        assert!(rules.stop_words(OfferType::Good).contains("midnight"));
        assert!(!rules.stop_words(OfferType::Good).contains("usluga"));
        assert!(rules.stop_words(OfferType::Service).contains("usluga"));
        assert_eq!(rules.unit_rules.len(), UNIT_ALIASES.len());
        assert_eq!(
            rules.brand_aliases.get("lgelectronics").map(String::as_str),
            Some("lg")
        );
    }
}

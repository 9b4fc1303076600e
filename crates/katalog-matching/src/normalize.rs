//! Name and brand normalization used by both candidate lookup and scoring.
//!
//! Name normalization folds away the noise that differs between shops for the
//! same offer: case, dash variants, colour and size words, storage-variant
//! prefixes (`12/512GB` keeps `512`), spacing inside quantities (`500 gr`
//! becomes `500g`), and Serbian Latin diacritics.

use std::sync::Arc;

use katalog_core::OfferType;

use crate::rules::NormalizationRules;

#[derive(Debug, Clone, Default)]
pub struct NameNormalizer {
    rules: Arc<NormalizationRules>,
}

impl NameNormalizer {
    #[must_use]
    pub fn new(rules: Arc<NormalizationRules>) -> Self {
        Self { rules }
    }

    /// Normalizes `raw` into space-separated tokens.
    ///
    /// Idempotent: feeding the output back in returns it unchanged.
    #[must_use]
    pub fn normalize(&self, raw: &str, offer_type: OfferType) -> String {
        let mut current = self.pass(raw, offer_type);
        // Dropping a token can make a number and a unit adjacent, which the
        // next pass folds. Every change shortens the string, so this ends.
        loop {
            let next = self.pass(&current, offer_type);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn pass(&self, raw: &str, offer_type: OfferType) -> String {
        let mut text = self.transliterate(raw.trim().to_lowercase().as_str());
        if text.is_empty() {
            return text;
        }
        for rule in &self.rules.unit_rules {
            text = rule.apply(&text);
        }

        let folded: String = text
            .chars()
            .map(|c| match c {
                '-' | '_' | '\u{2013}' | '\u{2014}' => ' ',
                other => other,
            })
            .filter(|c| is_kept_char(*c))
            .collect();

        let stop_words = self.rules.stop_words(offer_type);
        folded
            .split_whitespace()
            .filter_map(|token| {
                let token = match token.rsplit_once('/') {
                    Some((_, last)) => last,
                    None => token,
                };
                let token = self.strip_memory_suffix(token);
                if token.is_empty() || stop_words.contains(token) {
                    return None;
                }
                if token.chars().count() < 2 && !is_numeric(token) {
                    return None;
                }
                Some(token)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn transliterate(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match self.rules.transliterations.iter().find(|(from, _)| *from == c) {
                Some((_, to)) => out.push_str(to),
                None => out.push(c),
            }
        }
        out
    }

    /// `512gb` becomes `512`. `mygb` is left alone: only the first matching
    /// suffix is tried, and only a numeric remainder is accepted.
    fn strip_memory_suffix<'a>(&self, token: &'a str) -> &'a str {
        let Some(suffix) = self
            .rules
            .memory_suffixes
            .iter()
            .find(|suffix| token.ends_with(suffix.as_str()))
        else {
            return token;
        };
        match token.strip_suffix(suffix.as_str()) {
            Some(rest) if is_numeric(rest) => rest,
            _ => token,
        }
    }
}

/// ASCII letters, Serbian Cyrillic (U+0430..=U+045F), digits, space, and `/`.
fn is_kept_char(c: char) -> bool {
    c.is_ascii_lowercase()
        || c.is_ascii_digit()
        || ('\u{0430}'..='\u{045F}').contains(&c)
        || c == ' '
        || c == '/'
}

pub(crate) fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

#[derive(Debug, Clone, Default)]
pub struct BrandNormalizer {
    rules: Arc<NormalizationRules>,
}

impl BrandNormalizer {
    #[must_use]
    pub fn new(rules: Arc<NormalizationRules>) -> Self {
        Self { rules }
    }

    /// Lowercases, removes whitespace and dash characters, then maps known
    /// spellings to the canonical vendor name. Unknown brands pass through.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> String {
        let compact: String = raw
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '_' | '\u{2013}' | '\u{2014}'))
            .collect();
        match self.rules.brand_aliases.get(&compact) {
            Some(canonical) => canonical.clone(),
            None => compact,
        }
    }

    /// Like [`Self::normalize`], treating a missing or blank brand as absent.
    #[must_use]
    pub fn normalize_opt(&self, raw: Option<&str>) -> Option<String> {
        raw.map(|brand| self.normalize(brand))
            .filter(|brand| !brand.is_empty())
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

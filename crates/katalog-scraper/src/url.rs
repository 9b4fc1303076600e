//! Page URL helpers: external-id derivation and image URL resolution.

use sha2::{Digest, Sha256};

/// Derives the per-shop external id of a product page.
///
/// Given `"https://shop.example/telefoni/iphone-15-128gb?ref=home"`, returns
/// `"iphone-15-128gb"`. Query strings and fragments are ignored. URLs with no
/// usable path segment fall back to the first 16 hex chars of the URL hash,
/// so the id stays stable across captures of the same page.
#[must_use]
pub fn external_id_from_url(page_url: &str) -> String {
    let last_segment = reqwest::Url::parse(page_url).map_or_else(
        |_| {
            page_url
                .split(['?', '#'])
                .next()
                .and_then(|path| path.rsplit('/').find(|s| !s.is_empty()))
                .map(str::to_owned)
        },
        |u| {
            u.path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
                .map(str::to_owned)
        },
    );

    match last_segment {
        Some(segment) if !looks_like_host(&segment, page_url) => segment,
        _ => {
            let digest = format!("{:x}", Sha256::digest(page_url.trim().as_bytes()));
            digest[..16].to_string()
        }
    }
}

/// A bare `example.com` string has no path; its only "segment" is the host.
fn looks_like_host(segment: &str, page_url: &str) -> bool {
    !page_url.contains("://") && page_url.trim_matches('/') == segment
}

/// Extracts the scheme+host origin of a page URL.
///
/// Given `"https://shop.example/p/1"`, returns `"https://shop.example"`.
#[must_use]
pub fn page_origin(page_url: &str) -> Option<String> {
    let url = reqwest::Url::parse(page_url).ok()?;
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

/// Resolves an image reference found on a page against the page's
/// scheme+host. Inline `data:` images and blank references are dropped.
#[must_use]
pub fn resolve_image_url(page_url: &str, reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with("data:") {
        return None;
    }
    if let Ok(absolute) = reqwest::Url::parse(reference) {
        return matches!(absolute.scheme(), "http" | "https").then(|| absolute.to_string());
    }

    let origin = page_origin(page_url)?;
    let base = reqwest::Url::parse(&format!("{origin}/")).ok()?;
    base.join(reference).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_id_is_last_path_segment() {
        assert_eq!(
            external_id_from_url("https://shop.example/telefoni/iphone-15-128gb"),
            "iphone-15-128gb"
        );
    }

    #[test]
    fn external_id_ignores_trailing_slash_query_and_fragment() {
        assert_eq!(
            external_id_from_url("https://shop.example/p/12345/?utm=x#reviews"),
            "12345"
        );
    }

    #[test]
    fn external_id_without_path_hashes_the_url() {
        let id = external_id_from_url("https://shop.example/");
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, external_id_from_url("https://shop.example/"));
        assert_ne!(id, external_id_from_url("https://other.example/"));
    }

    #[test]
    fn external_id_of_unparseable_url_uses_raw_path() {
        assert_eq!(external_id_from_url("/p/abc-1?x=1"), "abc-1");
    }

    #[test]
    fn origin_of_page() {
        assert_eq!(
            page_origin("https://shop.example:8443/a/b").as_deref(),
            Some("https://shop.example:8443")
        );
        assert_eq!(page_origin("not a url"), None);
    }

    #[test]
    fn resolves_root_relative_and_protocol_relative_images() {
        let page = "https://shop.example/telefoni/iphone";
        assert_eq!(
            resolve_image_url(page, "/media/a.jpg").as_deref(),
            Some("https://shop.example/media/a.jpg")
        );
        assert_eq!(
            resolve_image_url(page, "media/b.jpg").as_deref(),
            Some("https://shop.example/media/b.jpg")
        );
        assert_eq!(
            resolve_image_url(page, "//cdn.example/c.jpg").as_deref(),
            Some("https://cdn.example/c.jpg")
        );
    }

    #[test]
    fn keeps_absolute_and_drops_inline_images() {
        let page = "https://shop.example/p/1";
        assert_eq!(
            resolve_image_url(page, "https://cdn.example/x.png").as_deref(),
            Some("https://cdn.example/x.png")
        );
        assert_eq!(resolve_image_url(page, "data:image/png;base64,AAAA"), None);
        assert_eq!(resolve_image_url(page, "  "), None);
    }
}

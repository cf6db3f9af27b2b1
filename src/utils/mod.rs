//! Utility functions and helpers.

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Append query parameters to a URL, yielding the request's effective URL.
///
/// The effective URL doubles as the page-cache key, so parameters must be
/// folded in the same way for every caller.
pub fn with_params(url: &str, params: &[(String, String)]) -> Result<String, url::ParseError> {
    if params.is_empty() {
        return Ok(url.to_string());
    }
    let mut resolved = Url::parse(url)?;
    resolved
        .query_pairs_mut()
        .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    Ok(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://example.com/path/").unwrap();
        assert_eq!(
            resolve_url(&base, "page.html"),
            "https://example.com/path/page.html"
        );
        assert_eq!(
            resolve_url(&base, "/root.html"),
            "https://example.com/root.html"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_with_params_folds_into_query() {
        let url = with_params(
            "https://example.com/browse/BUG-1",
            &[
                ("page".to_string(), "history".to_string()),
                ("_".to_string(), "17".to_string()),
            ],
        )
        .unwrap();
        assert_eq!(url, "https://example.com/browse/BUG-1?page=history&_=17");
    }

    #[test]
    fn test_with_params_appends_to_existing_query() {
        let url = with_params(
            "https://example.com/report?filter=9",
            &[("startIndex".to_string(), "50".to_string())],
        )
        .unwrap();
        assert_eq!(url, "https://example.com/report?filter=9&startIndex=50");
    }

    #[test]
    fn test_with_params_empty_is_identity() {
        assert_eq!(
            with_params("https://example.com/report?filter=9", &[]).unwrap(),
            "https://example.com/report?filter=9"
        );
    }
}

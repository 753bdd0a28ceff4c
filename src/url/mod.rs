//! URL handling for match pages
//!
//! Match pages are addressed by substituting the match identifier into the
//! configured base URL template.

use crate::UrlError;
use url::Url;

/// Placeholder replaced by the match identifier in a base URL template
pub const ID_PLACEHOLDER: &str = "{id}";

/// Resolves the URL of a match page
///
/// If `template` contains `{id}` every occurrence is replaced by the
/// identifier; otherwise the identifier is appended verbatim, so
/// `https://host/partido/estadisticas/id/` becomes
/// `https://host/partido/estadisticas/id/42`.
///
/// # Arguments
///
/// * `template` - The configured base URL
/// * `match_id` - The match identifier
///
/// # Returns
///
/// * `Ok(Url)` - An absolute http(s) URL
/// * `Err(UrlError)` - The resolved string is not a usable URL
///
/// # Examples
///
/// ```
/// use courtside::url::resolve_match_url;
///
/// let url = resolve_match_url("https://example.com/stats/{id}/box", 7).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/stats/7/box");
/// ```
pub fn resolve_match_url(template: &str, match_id: u32) -> Result<Url, UrlError> {
    let template = template.trim();
    let resolved = if template.contains(ID_PLACEHOLDER) {
        template.replace(ID_PLACEHOLDER, &match_id.to_string())
    } else {
        format!("{}{}", template, match_id)
    };

    let url = Url::parse(&resolved).map_err(|e| UrlError::Parse(format!("{}: {}", resolved, e)))?;

    // Mock servers in tests are plain HTTP, so both schemes are accepted
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

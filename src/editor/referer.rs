//! Module name inference from a referring URL.
//!
//! `http://host/_viewer/manual/guide/intro.html` belongs to module `manual`.
//! Route prefixes are skipped and trailing index pages dropped; a first
//! segment that is itself a page means the site has no module layout.

use tracing::{info, warn};
use url::Url;

/// Leading path segments that are editor routes rather than content.
pub const CONTROL_PREFIXES: &[&str] = &["_viewer", "_editor", "_pdf"];

/// Trailing segments naming a directory's index page.
pub const INDEX_NAMES: &[&str] = &["index.htm", "index.html"];

const PAGE_EXTENSIONS: &[&str] = &[".html", ".htm"];

/// Derive the module name of a referer URL or path. Never fails.
pub fn extract_module_name(referer: &str) -> Option<String> {
    let path = referer_path(referer);
    let mut segments: Vec<&str> = path.split('/').collect();

    let skip = segments
        .iter()
        .take_while(|s| s.is_empty() || CONTROL_PREFIXES.contains(*s))
        .count();
    segments.drain(..skip);
    while segments.last().is_some_and(|s| INDEX_NAMES.contains(s)) {
        segments.pop();
    }

    match segments.first() {
        Some(first) if PAGE_EXTENSIONS.iter().any(|ext| first.ends_with(ext)) => {
            warn!("No proper module name at {}", referer);
            None
        }
        Some(first) => {
            info!("Referer module name is {}", first);
            Some((*first).to_string())
        }
        None => {
            warn!("No module name at {}", referer);
            None
        }
    }
}

/// Path component of an absolute URL, or the input itself when it is a bare path.
fn referer_path(referer: &str) -> String {
    match Url::parse(referer) {
        Ok(url) => url.path().to_string(),
        Err(_) => referer
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_from_viewer_url() {
        assert_eq!(
            extract_module_name("http://localhost/_viewer/module/path/to/rst"),
            Some("module".to_string())
        );
    }

    #[test]
    fn test_page_at_top_is_not_a_module() {
        assert_eq!(extract_module_name("http://localhost/_viewer/foo.html"), None);
        assert_eq!(extract_module_name("/_viewer/foo.htm"), None);
    }

    #[test]
    fn test_trailing_index_is_stripped() {
        assert_eq!(
            extract_module_name("http://localhost/_viewer/module/index.html"),
            Some("module".to_string())
        );
    }

    #[test]
    fn test_bare_path_referer() {
        assert_eq!(
            extract_module_name("/_viewer/module/path/to/doc"),
            Some("module".to_string())
        );
    }

    #[test]
    fn test_only_control_prefixes() {
        assert_eq!(extract_module_name("http://localhost/_editor/"), None);
        assert_eq!(extract_module_name("http://localhost/"), None);
        assert_eq!(extract_module_name(""), None);
    }

    #[test]
    fn test_root_index_is_no_module() {
        assert_eq!(extract_module_name("http://localhost/_viewer/index.html"), None);
    }

    #[test]
    fn test_stacked_prefixes_and_query() {
        assert_eq!(
            extract_module_name("http://localhost/_pdf/_viewer/manual?x=1#top"),
            Some("manual".to_string())
        );
    }

    #[test]
    fn test_garbage_never_panics() {
        for input in ["::::", "http://", "%%%", "/_viewer//", "index.html"] {
            let _ = extract_module_name(input);
        }
    }
}

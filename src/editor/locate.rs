//! Mapping from a generated page back to the source document it was built from.
//!
//! The site generator archives each source next to the output and links to it
//! (`_sources/intro.rst.txt`). The locator reads the page, picks that link,
//! strips it down to the bare source file name (`intro.rst`) and searches the
//! source tree for it. Nothing is cached: the tree may change between requests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::EditorConfig;
use crate::errors::{EditorError, Result};
use crate::util::is_safe_relative;

/// How the back-reference link is discovered inside a generated page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkStrategy {
    /// Exactly one archived-source link anywhere in the page; zero or several
    /// yield no source.
    #[default]
    UniqueLink,
    /// First link inside the footer element whose text mentions "source".
    FooterCredit,
}

/// Path of an editable source file, relative to the content root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReference(PathBuf);

impl SourceReference {
    pub fn relative(&self) -> &Path {
        &self.0
    }

    /// Forward-slash form for URLs and command lines.
    pub fn as_str(&self) -> String {
        self.0.to_string_lossy().replace('\\', "/")
    }
}

impl From<&str> for SourceReference {
    fn from(relative: &str) -> Self {
        SourceReference(PathBuf::from(relative))
    }
}

impl std::fmt::Display for SourceReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str())
    }
}

/// File-name matcher for tree searches.
pub enum NameMatch<'a> {
    Exact(&'a str),
    Pattern(&'a Regex),
}

impl NameMatch<'_> {
    fn matches(&self, name: &str) -> bool {
        match self {
            NameMatch::Exact(expected) => *expected == name,
            NameMatch::Pattern(re) => re.is_match(name),
        }
    }
}

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s(?:[^>]*?\s)?href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#)
        .expect("anchor regex is valid")
});

/// Opening tag of an element whose class list holds the `footer` token.
static FOOTER_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<(div|footer)\s(?:[^>]*?\s)?class\s*=\s*["'](?:[^"']*\s)?footer(?:\s[^"']*)?["'][^>]*>"#,
    )
    .expect("footer regex is valid")
});

static BLOCK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(/?)(div|footer)\b[^>]*>").expect("block tag regex is valid")
});

static PDF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^.*\.pdf$").expect("pdf regex is valid"));

struct Anchor<'a> {
    href: &'a str,
    text: &'a str,
}

fn anchors(html: &str) -> impl Iterator<Item = Anchor<'_>> {
    ANCHOR_RE.captures_iter(html).filter_map(|caps| {
        Some(Anchor {
            href: caps.get(1)?.as_str(),
            text: caps.get(2)?.as_str(),
        })
    })
}

/// Inner markup of the first footer element, nested blocks included.
/// An unclosed footer runs to the end of the document.
fn footer_body(html: &str) -> Option<&str> {
    let open = FOOTER_OPEN_RE.captures(html)?;
    let tag = open.get(1)?.as_str();
    let start = open.get(0)?.end();
    let rest = &html[start..];

    let mut depth = 1usize;
    for caps in BLOCK_TAG_RE.captures_iter(rest) {
        if !caps[2].eq_ignore_ascii_case(tag) {
            continue;
        }
        if caps[1].is_empty() {
            depth += 1;
            continue;
        }
        depth -= 1;
        if depth == 0 {
            return Some(&rest[..caps.get(0)?.start()]);
        }
    }
    Some(rest)
}

fn last_segment(href: &str) -> &str {
    href.rsplit('/').next().unwrap_or(href)
}

/// Locates editable sources and derived artifacts under the content root.
#[derive(Clone)]
pub struct SourceLocator {
    config: Arc<EditorConfig>,
}

impl SourceLocator {
    pub fn new(config: Arc<EditorConfig>) -> Self {
        Self { config }
    }

    /// Absolute path of a document under the content root, if it names an
    /// existing file.
    pub fn document_file(&self, doc_path: &str) -> Option<PathBuf> {
        if doc_path.is_empty() || !is_safe_relative(doc_path) {
            return None;
        }
        let full = self.config.doc_root.join(doc_path);
        full.is_file().then_some(full)
    }

    fn archived_suffix(&self) -> String {
        format!(
            "{}{}",
            self.config.source_extension, self.config.archive_suffix
        )
    }

    /// Pick the archived-source href out of a generated page.
    pub fn source_link<'a>(&self, html: &'a str) -> Option<&'a str> {
        let suffix = self.archived_suffix();
        let is_source = |href: &str| !href.is_empty() && last_segment(href).ends_with(&suffix);

        match self.config.link_strategy {
            LinkStrategy::UniqueLink => {
                let mut found = anchors(html).filter(|a| is_source(a.href));
                let first = found.next()?;
                if found.next().is_some() {
                    debug!("Several source links found, no single source");
                    return None;
                }
                Some(first.href)
            }
            LinkStrategy::FooterCredit => {
                let footer = footer_body(html)?;
                anchors(footer)
                    .find(|a| is_source(a.href) && a.text.to_lowercase().contains("source"))
                    .map(|a| a.href)
            }
        }
    }

    /// Strip a source href to the bare file name: `../_sources/a.rst.txt` → `a.rst`.
    pub fn bare_name(&self, href: &str) -> String {
        let name = last_segment(href);
        name.strip_suffix(self.config.archive_suffix.as_str())
            .unwrap_or(name)
            .to_string()
    }

    /// Resolve the editable source behind a generated document.
    ///
    /// `Ok(None)` means the page is view-only. Several files with the same
    /// bare name in one search pass is an `AmbiguousSource` error.
    pub fn locate_source(&self, doc_path: &str) -> Result<Option<SourceReference>> {
        let full = self
            .document_file(doc_path)
            .ok_or_else(|| EditorError::NotFound {
                path: doc_path.to_string(),
            })?;
        let html = std::fs::read(&full).map_err(|e| EditorError::io(&full, e))?;
        let html = String::from_utf8_lossy(&html);

        let Some(href) = self.source_link(&html) else {
            return Ok(None);
        };
        debug!("Found rel to source {}", href);
        let bare = self.bare_name(href);
        debug!("Bare name {}", bare);

        let mut found = self.find_by_name(&self.config.doc_src, &bare);
        if found.is_empty() {
            let top_dir = doc_path.split('/').next().unwrap_or_default();
            debug!(
                "Name is not found at doc_src, trying at top-level dir {}",
                top_dir
            );
            found = self.find_by_name(top_dir, &bare);
        }

        single_match(found, &bare)
    }

    /// Locate the derived PDF artifact of a module.
    pub fn find_derived(&self, module: &str) -> Result<Option<SourceReference>> {
        if module.is_empty() || !is_safe_relative(module) {
            return Ok(None);
        }
        let found = self.find_by_pattern(module, &PDF_RE);
        single_match(found, module)
    }

    /// Files under `top_dir` named exactly `name`.
    pub fn find_by_name(&self, top_dir: &str, name: &str) -> Vec<PathBuf> {
        self.find_matching(top_dir, NameMatch::Exact(name))
    }

    /// Files under `top_dir` whose name matches `pattern`.
    pub fn find_by_pattern(&self, top_dir: &str, pattern: &Regex) -> Vec<PathBuf> {
        self.find_matching(top_dir, NameMatch::Pattern(pattern))
    }

    fn find_matching(&self, top_dir: &str, matcher: NameMatch<'_>) -> Vec<PathBuf> {
        let root = &self.config.doc_root;
        let top = root.join(top_dir);
        if top_dir.is_empty() || !is_safe_relative(top_dir) || !top.is_dir() {
            return Vec::new();
        }

        WalkDir::new(&top)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.file_name().to_str().is_some_and(|n| matcher.matches(n)))
            .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
            .collect()
    }
}

fn single_match(mut found: Vec<PathBuf>, name: &str) -> Result<Option<SourceReference>> {
    match found.len() {
        0 => {
            debug!("Name {} is not found", name);
            Ok(None)
        }
        1 => Ok(found.pop().map(SourceReference)),
        _ => Err(EditorError::AmbiguousSource {
            name: name.to_string(),
        }),
    }
}

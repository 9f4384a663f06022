//! Replaceable heuristics for lesson boundaries and stream capture.
//!
//! Page titles are the only signal for "the user moved to a new lesson", and
//! the manifest file name is the only signal for "this request is the stream
//! worth keeping". Both rules are site-specific, so they sit behind the
//! [`TitlePolicy`] and [`StreamPolicy`] traits and the engine only sees the
//! trait objects.
//!
//! # Example
//!
//! ```rust
//! use grabber_recorder::policy::{ManifestSuffixPolicy, StreamPolicy, SuffixTitlePolicy, TitlePolicy};
//!
//! let titles = SuffixTitlePolicy::default();
//! assert_eq!(titles.normalize("Lesson 1 | Site").unwrap(), "Lesson 1");
//! assert!(titles.normalize("https://example.com/watch").is_err());
//!
//! let streams = ManifestSuffixPolicy::default();
//! assert!(streams.is_master_manifest("https://cdn.example.com/v/main.m3u8?token=1"));
//! assert!(!streams.is_master_manifest("https://cdn.example.com/v/audio.m3u8"));
//! ```

use std::fmt;

use regex::Regex;
use thiserror::Error;

/// Suffix stripped from page titles by default: the last `" | Site"` segment.
pub const DEFAULT_TITLE_SUFFIX_PATTERN: &str = r"\s*\|[^|]*$";

/// File name of an adaptive-stream master manifest.
pub const DEFAULT_MANIFEST_NAME: &str = "main.m3u8";

/// Errors raised while building a policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid title suffix pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("manifest name cannot be empty")]
    EmptyManifestName,
}

/// Why a raw title was not turned into a lesson title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleRejection {
    /// The title is really a URL shown while the page loads.
    LooksLikeUrl,
    /// Nothing is left after normalization.
    Empty,
}

impl fmt::Display for TitleRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LooksLikeUrl => write!(f, "title looks like a url"),
            Self::Empty => write!(f, "title is empty after normalization"),
        }
    }
}

/// Turns raw tab titles into lesson titles.
pub trait TitlePolicy: Send + Sync + fmt::Debug {
    /// Returns the normalized lesson title, or why the title must be ignored.
    fn normalize(&self, raw: &str) -> Result<String, TitleRejection>;
}

/// Decides which completed requests are master manifests.
pub trait StreamPolicy: Send + Sync + fmt::Debug {
    fn is_master_manifest(&self, url: &str) -> bool;
}

/// Default title rule: drop URL-like titles, strip a site suffix, trim.
#[derive(Debug, Clone)]
pub struct SuffixTitlePolicy {
    suffix: Regex,
}

impl SuffixTitlePolicy {
    /// Builds a policy stripping whatever `pattern` matches.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidPattern`] if `pattern` is not a valid
    /// regular expression.
    pub fn new(pattern: &str) -> Result<Self, PolicyError> {
        let suffix = Regex::new(pattern).map_err(|source| PolicyError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { suffix })
    }

    /// The suffix pattern in use.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.suffix.as_str()
    }
}

impl Default for SuffixTitlePolicy {
    fn default() -> Self {
        Self {
            suffix: Regex::new(DEFAULT_TITLE_SUFFIX_PATTERN)
                .expect("default title suffix pattern is valid"),
        }
    }
}

impl TitlePolicy for SuffixTitlePolicy {
    fn normalize(&self, raw: &str) -> Result<String, TitleRejection> {
        if raw.contains("http") {
            return Err(TitleRejection::LooksLikeUrl);
        }

        let stripped = self.suffix.replace(raw, "");
        let title = stripped.trim();

        if title.is_empty() {
            return Err(TitleRejection::Empty);
        }

        Ok(title.to_string())
    }
}

/// Default stream rule: the URL path ends with the manifest file name.
#[derive(Debug, Clone)]
pub struct ManifestSuffixPolicy {
    manifest_name: String,
}

impl ManifestSuffixPolicy {
    /// # Errors
    ///
    /// Returns [`PolicyError::EmptyManifestName`] for a blank name.
    pub fn new(manifest_name: impl Into<String>) -> Result<Self, PolicyError> {
        let manifest_name = manifest_name.into();
        if manifest_name.trim().is_empty() {
            return Err(PolicyError::EmptyManifestName);
        }
        Ok(Self { manifest_name })
    }

    #[must_use]
    pub fn manifest_name(&self) -> &str {
        &self.manifest_name
    }
}

impl Default for ManifestSuffixPolicy {
    fn default() -> Self {
        Self {
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
        }
    }
}

impl StreamPolicy for ManifestSuffixPolicy {
    fn is_master_manifest(&self, url: &str) -> bool {
        strip_query(url).ends_with(&self.manifest_name)
    }
}

/// Returns `url` without its query string and fragment.
fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

//! Profile URL normalization for the identity fast-path
//!
//! Two imported records carrying the same professional-network profile
//! URL are the same person with certainty, however differently the URL
//! was written ("https://www.linkedin.com/in/jdoe" vs
//! "linkedin.com/in/jdoe?trk=share"). Normalization reduces a URL to the
//! bare profile handle so exact comparison works.

use crate::models::{field_text, NodeInfo};
use once_cell::sync::Lazy;
use regex::Regex;

/// Snapshot field carrying the external profile URL
pub const PROFILE_URL_FIELD: &str = "profileUrl";

static PROFILE_HANDLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"linkedin\.com/in/([^/?]+)").unwrap());

/// Normalize a profile URL for comparison
///
/// Lowercases, strips protocol and leading www, and extracts the handle
/// segment after /in/. URLs that don't match the profile pattern come
/// back as the stripped URL so distinct hosts still compare unequal.
pub fn normalize_profile_url(url: &str) -> String {
    let normalized = url.trim().to_lowercase();
    let normalized = normalized
        .strip_prefix("https://")
        .or_else(|| normalized.strip_prefix("http://"))
        .unwrap_or(&normalized);
    let normalized = normalized.strip_prefix("www.").unwrap_or(normalized);

    if let Some(captures) = PROFILE_HANDLE.captures(normalized) {
        return captures[1].to_string();
    }

    normalized.to_string()
}

/// Detect a shared profile identity between two snapshots
///
/// Returns the shared normalized handle when both snapshots carry a
/// profile URL and the normalized forms are equal and non-empty.
pub fn shared_profile_identity(a: &NodeInfo, b: &NodeInfo) -> Option<String> {
    let url_a = field_text(a, PROFILE_URL_FIELD)?;
    let url_b = field_text(b, PROFILE_URL_FIELD)?;
    if url_a.trim().is_empty() || url_b.trim().is_empty() {
        return None;
    }

    let norm_a = normalize_profile_url(&url_a);
    let norm_b = normalize_profile_url(&url_b);
    if !norm_a.is_empty() && norm_a == norm_b {
        Some(norm_a)
    } else {
        None
    }
}

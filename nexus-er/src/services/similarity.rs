//! String-similarity pre-filter
//!
//! Cheap deterministic gate that runs before any scorer call. Two
//! snapshots with zero lexical overlap are not worth a comparison record,
//! let alone an external scoring request.

use crate::models::{field_text, NodeInfo};

const FULL_NAME_THRESHOLD: f64 = 0.3;
const NAME_THRESHOLD: f64 = 0.5;
const AFFILIATION_THRESHOLD: f64 = 0.6;

/// Decide whether two snapshots have enough string similarity to warrant
/// a comparison
///
/// Any single field crossing its threshold is enough: full name, first
/// name, last name, current company, location.
pub fn worth_comparing(a: &NodeInfo, b: &NodeInfo) -> bool {
    // Full name first: catches swapped or partial name fields
    let full_a = full_name(a);
    let full_b = full_name(b);
    if !full_a.is_empty()
        && !full_b.is_empty()
        && simple_similarity(&full_a, &full_b) > FULL_NAME_THRESHOLD
    {
        return true;
    }

    if field_similar(a, b, "firstName", NAME_THRESHOLD)
        || field_similar(a, b, "lastName", NAME_THRESHOLD)
        || field_similar(a, b, "currentCompany", AFFILIATION_THRESHOLD)
        || field_similar(a, b, "location", AFFILIATION_THRESHOLD)
    {
        return true;
    }

    false
}

/// Lightweight string similarity in [0, 1]
///
/// Exact match is 1.0, substring containment is a fixed 0.7, otherwise
/// the ratio of positionally matching characters over the longer length.
pub fn simple_similarity(str1: &str, str2: &str) -> f64 {
    let s1 = str1.trim().to_lowercase();
    let s2 = str2.trim().to_lowercase();
    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }
    if s1 == s2 {
        return 1.0;
    }
    if s1.contains(&s2) || s2.contains(&s1) {
        return 0.7;
    }

    let c1: Vec<char> = s1.chars().collect();
    let c2: Vec<char> = s2.chars().collect();
    let matches = c1.iter().zip(c2.iter()).filter(|(a, b)| a == b).count();

    matches as f64 / c1.len().max(c2.len()) as f64
}

fn field_similar(a: &NodeInfo, b: &NodeInfo, key: &str, threshold: f64) -> bool {
    let va = field_text(a, key).unwrap_or_default();
    let vb = field_text(b, key).unwrap_or_default();
    let va = va.trim();
    let vb = vb.trim();
    if va.is_empty() || vb.is_empty() {
        return false;
    }
    simple_similarity(va, vb) > threshold
}

fn full_name(info: &NodeInfo) -> String {
    let parts: Vec<String> = ["firstName", "lastName"]
        .iter()
        .filter_map(|key| field_text(info, key))
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect();
    parts.join(" ")
}

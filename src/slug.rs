//! Job slugs: `<normalized-title>-<id>`.
//!
//! The title fragment is cosmetic and lossy. The trailing id is the only
//! identity a slug carries, so two jobs with the same title still get
//! distinct, decodable slugs.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum length of the title fragment, applied before the id suffix.
pub const MAX_TITLE_FRAGMENT: usize = 100;

static TRAILING_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-(\d+)$").expect("trailing id pattern is valid"));

/// Encode a title and id into a URL path segment.
///
/// Lower-cases the title, drops everything except ASCII letters, digits,
/// whitespace and hyphens, folds separator runs into one hyphen, strips
/// hyphens at both ends, cuts to [`MAX_TITLE_FRAGMENT`] and appends `-<id>`.
/// A title with nothing usable yields `-<id>`.
pub fn generate_job_slug(title: &str, id: u64) -> String {
    let lowered = title.to_lowercase();
    let mut fragment = String::with_capacity(lowered.len());
    let mut pending_separator = false;

    for ch in lowered.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_separator && !fragment.is_empty() {
                fragment.push('-');
            }
            pending_separator = false;
            fragment.push(ch);
        } else if ch.is_whitespace() || ch == '-' {
            pending_separator = true;
        }
        // Anything else is removed without separating its neighbours
    }

    // ASCII only at this point, so byte length == char count. A cut may
    // leave a trailing hyphen; it stays.
    fragment.truncate(MAX_TITLE_FRAGMENT);

    format!("{}-{}", fragment, id)
}

/// Decode the trailing `-<digits>` of a slug. `None` means not found.
pub fn extract_job_id_from_slug(slug: &str) -> Option<u64> {
    TRAILING_ID
        .captures(slug)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Canonical route for a job page.
pub fn job_path(title: &str, id: u64) -> String {
    format!("/jobs/{}", generate_job_slug(title, id))
}

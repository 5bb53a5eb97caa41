//! Candidate-name extraction from completion output
//!
//! Completion models are asked to return `{"selected_names": [...]}` but are
//! free to wrap it in prose, mangle it, or ignore the instruction entirely.
//! Extraction therefore fails soft: any shape problem yields an empty list
//! and the caller falls back to the top search hit.

use serde::Deserialize;

#[derive(Deserialize)]
struct Extraction {
    selected_names: Vec<String>,
}

/// Parse candidate names out of a completion response, in response order.
///
/// Slices from the first `{` to the last `}` (brace depth is not matched)
/// and parses the slice as JSON. Returns an empty vec on any failure.
pub fn extract_names(response: &str) -> Vec<String> {
    let start = match response.find('{') {
        Some(i) => i,
        None => return Vec::new(),
    };
    let end = match response.rfind('}') {
        Some(i) if i > start => i,
        _ => return Vec::new(),
    };

    match serde_json::from_str::<Extraction>(&response[start..=end]) {
        Ok(extraction) => extraction.selected_names,
        Err(_) => Vec::new(),
    }
}

//! Extraction of generated files from agent output

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::models::task::GeneratedFiles;

pub const INDEX_FILE: &str = "index.html";
pub const STYLES_FILE: &str = "styles.css";
pub const SCRIPT_FILE: &str = "script.js";

static FENCED_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(\w+)?\n(.*?)\n```").expect("FENCED_BLOCK_RE regex should compile")
});

/// Canonical filename for a fence language tag
fn canonical_filename(lang: &str) -> Option<&'static str> {
    match lang.to_ascii_lowercase().as_str() {
        "html" => Some(INDEX_FILE),
        "css" => Some(STYLES_FILE),
        "javascript" | "js" => Some(SCRIPT_FILE),
        _ => None,
    }
}

/// Collect the html, css and js fenced blocks from `output`.
///
/// Blocks with other or missing language tags are ignored. When a type
/// appears more than once, the last block wins.
pub fn parse_agent_output(output: &str) -> GeneratedFiles {
    let mut files = GeneratedFiles::new();

    for captures in FENCED_BLOCK_RE.captures_iter(output) {
        let Some(lang) = captures.get(1) else {
            continue;
        };
        let Some(filename) = canonical_filename(lang.as_str()) else {
            debug!("Skipping fenced block tagged '{}'", lang.as_str());
            continue;
        };
        let code = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
        files.insert(filename.to_string(), code.trim().to_string());
    }

    files
}

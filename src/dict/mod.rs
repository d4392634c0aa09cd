//! Dictionary store: the three optional word lists driving sanitization.
//!
//! All three files live in the config dir and are plain text:
//!
//! - `ignore.dict` — one word per line; matching tokens are dropped.
//! - `banned.dict` — one word per line; a line containing one is dropped.
//! - `replace.dict` — `key=value` per line; applied in file order.
//!
//! Matching is case-insensitive throughout, so ignore/banned entries and
//! replace keys are stored lowercased. Missing or unreadable files yield
//! empty collections — never an error — and the files are re-read on every
//! pipeline run so edits take effect without a restart.

use std::collections::HashSet;
use std::path::Path;

use crate::config::AppPaths;

/// The three user dictionaries consumed by the sanitizer.
#[derive(Debug, Clone, Default)]
pub struct Dictionaries {
    /// Words removed when a whitespace-delimited token matches exactly.
    pub ignore: HashSet<String>,
    /// Words whose presence anywhere in a line drops the whole line.
    pub banned: Vec<String>,
    /// Ordered `(from, to)` substring replacements, chained per token.
    ///
    /// Order is significant: each pair operates on the output of the
    /// previous one.
    pub replace: Vec<(String, String)>,
}

impl Dictionaries {
    /// Load all three dictionaries from their standard locations.
    pub fn load(paths: &AppPaths) -> Self {
        Self {
            ignore: read_words(&paths.ignore_file).collect(),
            banned: read_words(&paths.banned_file).collect(),
            replace: read_replacements(&paths.replace_file),
        }
    }

    /// Load from an explicit directory (useful for tests).
    pub fn load_from(dir: &Path) -> Self {
        Self::load(&AppPaths::for_dir(dir))
    }

    pub fn is_empty(&self) -> bool {
        self.ignore.is_empty() && self.banned.is_empty() && self.replace.is_empty()
    }
}

/// Read a one-word-per-line file into lowercased entries.
///
/// Blank lines are skipped — an empty banned word would otherwise match
/// every line. A missing file yields an empty iterator.
fn read_words(path: &Path) -> impl Iterator<Item = String> {
    read_optional(path)
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .into_iter()
}

/// Read a `key=value`-per-line file into ordered replacement pairs.
///
/// Only the first `=` splits key from value; both sides are trimmed. Lines
/// without an `=` or with an empty key are skipped. Keys are lowercased for
/// case-insensitive matching; values are kept verbatim.
fn read_replacements(path: &Path) -> Vec<(String, String)> {
    read_optional(path)
        .lines()
        .filter_map(|line| {
            let (from, to) = line.split_once('=')?;
            let from = from.trim().to_lowercase();
            if from.is_empty() {
                return None;
            }
            Some((from, to.trim().to_string()))
        })
        .collect()
}

fn read_optional(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::debug!("dictionary {} not read: {e}", path.display());
            String::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

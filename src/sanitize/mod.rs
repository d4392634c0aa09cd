//! Text sanitizer: turns raw clipboard text into speakable text.
//!
//! Per line, strictly in this order:
//!
//! 1. Drop the whole line if any banned word occurs in it (case-insensitive
//!    substring).
//! 2. Split on literal spaces, collapsing runs of spaces.
//! 3. Drop tokens that exactly match an ignore word (case-insensitive).
//! 4. Apply every replace pair in dictionary order as a case-insensitive
//!    substring replace-all, each pair operating on the output of the
//!    previous one.
//!
//! CRLF, CR and LF are all accepted as line separators; the output joins
//! lines with `\n`. The result may be the empty string — that is a valid
//! "nothing to synthesize" outcome, not an error.

use crate::dict::Dictionaries;

/// Sanitize `text` using the loaded dictionaries.
///
/// Pure and deterministic; a fixed point of itself once no dictionary entry
/// matches the output anymore.
pub fn sanitize(text: &str, dicts: &Dictionaries) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    let lines: Vec<String> = normalized
        .split('\n')
        .filter(|line| !is_banned(line, dicts))
        .map(|line| sanitize_line(line, dicts))
        .collect();

    lines.join("\n")
}

fn is_banned(line: &str, dicts: &Dictionaries) -> bool {
    if dicts.banned.is_empty() {
        return false;
    }
    let lower = line.to_lowercase();
    dicts.banned.iter().any(|word| lower.contains(word))
}

fn sanitize_line(line: &str, dicts: &Dictionaries) -> String {
    let words: Vec<String> = line
        .split(' ')
        .filter(|token| !token.is_empty())
        .filter(|token| !dicts.ignore.contains(&token.to_lowercase()))
        .map(|token| {
            let mut word = token.to_string();
            for (from, to) in &dicts.replace {
                word = replace_all_ci(&word, from, to);
            }
            word
        })
        .collect();

    words.join(" ")
}

/// Case-insensitive substring replace-all.
///
/// `from` must already be lowercased (the dictionary loader guarantees
/// this). Matching compares the lowercase expansion of each input char
/// against `from`, so non-ASCII words match regardless of case.
fn replace_all_ci(input: &str, from: &str, to: &str) -> String {
    let needle: Vec<char> = from.chars().collect();
    if needle.is_empty() {
        return input.to_string();
    }

    let haystack: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < haystack.len() {
        match match_len_at(&haystack, i, &needle) {
            Some(consumed) => {
                out.push_str(to);
                i += consumed;
            }
            None => {
                out.push(haystack[i]);
                i += 1;
            }
        }
    }

    out
}

/// Number of haystack chars starting at `start` whose lowercase expansion
/// equals `needle`, or `None` when there is no match at this position.
fn match_len_at(haystack: &[char], start: usize, needle: &[char]) -> Option<usize> {
    let mut ni = 0;
    let mut hi = start;

    while ni < needle.len() {
        let c = *haystack.get(hi)?;
        for lc in c.to_lowercase() {
            if ni >= needle.len() || needle[ni] != lc {
                return None;
            }
            ni += 1;
        }
        hi += 1;
    }

    Some(hi - start)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

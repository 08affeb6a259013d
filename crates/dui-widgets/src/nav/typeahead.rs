#![forbid(unsafe_code)]

//! Typeahead buffer.
//!
//! Characters accumulate into a rolling buffer that clears after
//! [`TYPEAHEAD_TIMEOUT`] without input. Matching is a case-insensitive
//! prefix test over item labels, starting at the current item:
//!
//! - a multi-character query may stay on the current item (`"ap"` keeps
//!   "Apple" focused while typing);
//! - a single character, or the same character repeated (`"bbb"`), always
//!   moves past the current item, cycling among matches.

use unicode_segmentation::UnicodeSegmentation;
use web_time::Duration;

/// Inactivity after which the buffer resets.
pub const TYPEAHEAD_TIMEOUT: Duration = Duration::from_millis(1000);

/// Rolling typeahead buffer driven by explicit timestamps.
#[derive(Debug, Clone, Default)]
pub struct Typeahead {
    buffer: String,
    last_input: Option<Duration>,
}

impl Typeahead {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current buffer contents.
    pub fn query(&self) -> &str {
        &self.buffer
    }

    /// Whether the buffer holds input typed within [`TYPEAHEAD_TIMEOUT`] of
    /// `now`.
    pub fn is_active(&self, now: Duration) -> bool {
        !self.buffer.is_empty()
            && self
                .last_input
                .is_some_and(|last| now.saturating_sub(last) < TYPEAHEAD_TIMEOUT)
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.last_input = None;
    }

    /// Append `ch` typed at virtual time `now`, expiring a stale buffer first.
    pub fn push(&mut self, ch: char, now: Duration) -> &str {
        if let Some(last) = self.last_input
            && now.saturating_sub(last) >= TYPEAHEAD_TIMEOUT
        {
            self.buffer.clear();
        }
        self.buffer.push(ch);
        self.last_input = Some(now);
        &self.buffer
    }

    /// Index of the label matching the current buffer.
    pub fn find(&self, labels: &[String], current: Option<usize>) -> Option<usize> {
        find_match(labels, &self.buffer, current)
    }
}

/// The search string after collapsing a repeated single character.
fn normalize(query: &str) -> &str {
    let mut graphemes = query.graphemes(true);
    let Some(first) = graphemes.next() else {
        return query;
    };
    if graphemes.all(|g| g == first) {
        first
    } else {
        query
    }
}

/// Case-insensitive prefix match starting at `current`, wrapping.
pub fn find_match(labels: &[String], query: &str, current: Option<usize>) -> Option<usize> {
    if labels.is_empty() || query.is_empty() {
        return None;
    }
    let search = normalize(query).to_lowercase();
    let single = search.graphemes(true).count() == 1;
    let start = current.filter(|&i| i < labels.len()).unwrap_or(0);
    (0..labels.len())
        .map(|offset| (start + offset) % labels.len())
        .filter(|&i| !(single && Some(i) == current))
        .find(|&i| labels[i].to_lowercase().starts_with(&search))
}

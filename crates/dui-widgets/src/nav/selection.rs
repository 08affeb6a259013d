#![forbid(unsafe_code)]

//! Selected-value sets for selection-bearing composites.
//!
//! Selection is independent of keyboard focus: arrow keys move focus, and
//! only activation mutates the selected set.
//!
//! | Mode | `select(v)` | `toggle(v)` |
//! |------|-------------|-------------|
//! | Single | replaces the selection with `v` | selects `v`, or clears it when `v` is selected and empty is allowed |
//! | Multiple | adds `v` | flips membership of `v` |

use dui_runtime::SelectionMode;

/// Ordered set of selected values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    mode: SelectionMode,
    allow_empty: bool,
    values: Vec<String>,
}

impl Selection {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            allow_empty: true,
            values: Vec::new(),
        }
    }

    /// Whether a single-mode selection may be toggled off.
    #[must_use]
    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn is_selected(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Select `value`. Returns whether the set changed.
    pub fn select(&mut self, value: &str) -> bool {
        match self.mode {
            SelectionMode::Single => {
                if self.values.len() == 1 && self.values[0] == value {
                    return false;
                }
                self.values.clear();
                self.values.push(value.to_owned());
                true
            }
            SelectionMode::Multiple => {
                if self.is_selected(value) {
                    return false;
                }
                self.values.push(value.to_owned());
                true
            }
        }
    }

    /// Deselect `value`, honoring `allow_empty` in single mode.
    pub fn deselect(&mut self, value: &str) -> bool {
        if !self.is_selected(value) {
            return false;
        }
        if self.mode == SelectionMode::Single && !self.allow_empty {
            return false;
        }
        self.values.retain(|v| v != value);
        true
    }

    /// Flip `value`. Returns whether the set changed.
    pub fn toggle(&mut self, value: &str) -> bool {
        if self.is_selected(value) {
            self.deselect(value)
        } else {
            self.select(value)
        }
    }

    /// Replace the whole selection (single mode keeps the first value).
    pub fn set<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values.clear();
        for v in values {
            let v = v.into();
            if !self.values.contains(&v) {
                self.values.push(v);
            }
            if self.mode == SelectionMode::Single {
                break;
            }
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_mode_is_exclusive() {
        let mut s = Selection::new(SelectionMode::Single);
        assert!(s.select("left"));
        assert!(s.select("center"));
        assert_eq!(s.values(), ["center"]);
        assert!(!s.select("center"));
    }

    #[test]
    fn multiple_mode_toggles_membership() {
        let mut s = Selection::new(SelectionMode::Multiple);
        s.toggle("a");
        s.toggle("b");
        assert_eq!(s.values(), ["a", "b"]);
        s.toggle("a");
        assert_eq!(s.values(), ["b"]);
    }

    #[test]
    fn single_mode_respects_allow_empty() {
        let mut s = Selection::new(SelectionMode::Single).allow_empty(false);
        s.select("x");
        assert!(!s.toggle("x"));
        assert_eq!(s.values(), ["x"]);

        let mut s = Selection::new(SelectionMode::Single);
        s.select("x");
        assert!(s.toggle("x"));
        assert!(s.is_empty());
    }

    #[test]
    fn set_dedups_and_truncates_single() {
        let mut s = Selection::new(SelectionMode::Single);
        s.set(["a", "b"]);
        assert_eq!(s.values(), ["a"]);
        let mut m = Selection::new(SelectionMode::Multiple);
        m.set(["a", "b", "a"]);
        assert_eq!(m.values(), ["a", "b"]);
    }
}

#![forbid(unsafe_code)]

//! Focus acquisition, trapping, and restoration for disclosure content.
//!
//! # Invariants
//!
//! 1. The restore target is captured exactly once per acquisition, before
//!    focus moves.
//! 2. While trapping, Tab/Shift+Tab never move focus outside the container.
//! 3. Restoration is skipped when the captured element is detached or no
//!    longer focusable.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | No tabbable descendant | Empty or all-disabled content | Container itself takes focus |
//! | Container unfocusable | No tabindex on a non-native element | Focus stays where it was |
//! | Release without acquire | Redundant close | No-op |

use dui_core::dom::{Dom, ElementId};

/// Per-instance focus bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct FocusManager {
    container: Option<ElementId>,
    restore: Option<ElementId>,
    trap: bool,
}

impl FocusManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether focus is currently held.
    pub fn is_active(&self) -> bool {
        self.container.is_some()
    }

    /// Whether Tab is being trapped.
    pub fn is_trapping(&self) -> bool {
        self.trap && self.is_active()
    }

    /// The element focus returns to on release.
    pub fn restore_target(&self) -> Option<ElementId> {
        self.restore
    }

    /// Capture the restore target and move focus into `container`.
    ///
    /// `initial` wins when focusable; otherwise the first tabbable
    /// descendant; otherwise the container itself.
    pub fn acquire(
        &mut self,
        dom: &Dom,
        container: ElementId,
        trap: bool,
        initial: Option<ElementId>,
    ) -> Option<ElementId> {
        if self.container.is_none() {
            self.restore = dom.active_element();
        }
        self.container = Some(container);
        self.trap = trap;

        let target = initial
            .filter(|&id| dom.is_focusable(id))
            .or_else(|| dom.tabbable_descendants(container).into_iter().next())
            .or_else(|| dom.is_focusable(container).then_some(container))?;
        dom.focus(target).then_some(target)
    }

    /// Stop trapping and return focus to the captured element.
    ///
    /// Returns the element that received focus, if any.
    pub fn release(&mut self, dom: &Dom) -> Option<ElementId> {
        self.container.take()?;
        self.trap = false;
        let restore = self.restore.take()?;
        if dom.is_connected(restore) && dom.focus(restore) {
            Some(restore)
        } else {
            tracing::trace!(element = restore.raw(), "focus restore target gone");
            None
        }
    }

    /// Forget the restore target so release leaves focus alone.
    pub fn forget_restore(&mut self) {
        self.restore = None;
    }

    /// Cycle Tab within the container while trapping.
    ///
    /// Returns `true` when the key was consumed.
    pub fn handle_tab(&self, dom: &Dom, shift: bool) -> bool {
        if !self.is_trapping() {
            return false;
        }
        let Some(container) = self.container else {
            return false;
        };
        let tabbable = dom.tabbable_descendants(container);
        let (Some(&first), Some(&last)) = (tabbable.first(), tabbable.last()) else {
            dom.focus(container);
            return true;
        };
        let current = dom
            .active_element()
            .and_then(|active| tabbable.iter().position(|&id| id == active));
        let target = match (current, shift) {
            (None, false) => first,
            (None, true) => last,
            (Some(i), false) => tabbable.get(i + 1).copied().unwrap_or(first),
            (Some(0), true) => last,
            (Some(i), true) => tabbable[i - 1],
        };
        dom.focus(target);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dui_core::dom::El;
    use dui_core::geometry::Size;

    fn setup() -> (Dom, ElementId, ElementId, Vec<ElementId>) {
        let dom = Dom::new(Size::new(800.0, 600.0));
        let opener = dom.mount(dom.body(), El::new("button").text("open"));
        let content = dom.mount(
            dom.body(),
            El::new("div").attr("tabindex", "-1").children([
                El::new("input"),
                El::new("button"),
                El::new("button").flag("disabled"),
                El::new("a").attr("href", "#"),
            ]),
        );
        let kids = dom.children(content);
        (dom, opener, content, kids)
    }

    #[test]
    fn acquire_focuses_first_tabbable_and_release_restores() {
        let (dom, opener, content, kids) = setup();
        dom.focus(opener);
        let mut fm = FocusManager::new();
        assert_eq!(fm.acquire(&dom, content, true, None), Some(kids[0]));
        assert_eq!(fm.restore_target(), Some(opener));
        assert_eq!(fm.release(&dom), Some(opener));
        assert_eq!(dom.active_element(), Some(opener));
        assert_eq!(fm.release(&dom), None);
    }

    #[test]
    fn initial_target_wins_when_focusable() {
        let (dom, _, content, kids) = setup();
        let mut fm = FocusManager::new();
        assert_eq!(fm.acquire(&dom, content, false, Some(kids[1])), Some(kids[1]));
        let mut fm = FocusManager::new();
        assert_eq!(fm.acquire(&dom, content, false, Some(kids[2])), Some(kids[0]));
    }

    #[test]
    fn falls_back_to_container() {
        let dom = Dom::new(Size::new(800.0, 600.0));
        let content = dom.mount(
            dom.body(),
            El::new("div").attr("tabindex", "-1").child(El::new("p")),
        );
        let mut fm = FocusManager::new();
        assert_eq!(fm.acquire(&dom, content, true, None), Some(content));
        assert!(fm.handle_tab(&dom, false));
        assert_eq!(dom.active_element(), Some(content));
    }

    #[test]
    fn tab_cycles_within_container() {
        let (dom, _, content, kids) = setup();
        let mut fm = FocusManager::new();
        fm.acquire(&dom, content, true, None);
        // input -> button -> link -> input (disabled button skipped)
        assert!(fm.handle_tab(&dom, false));
        assert_eq!(dom.active_element(), Some(kids[1]));
        fm.handle_tab(&dom, false);
        assert_eq!(dom.active_element(), Some(kids[3]));
        fm.handle_tab(&dom, false);
        assert_eq!(dom.active_element(), Some(kids[0]));
        fm.handle_tab(&dom, true);
        assert_eq!(dom.active_element(), Some(kids[3]));
    }

    #[test]
    fn non_trapping_ignores_tab() {
        let (dom, _, content, _) = setup();
        let mut fm = FocusManager::new();
        fm.acquire(&dom, content, false, None);
        assert!(!fm.handle_tab(&dom, false));
    }

    #[test]
    fn detached_restore_target_is_skipped() {
        let (dom, opener, content, kids) = setup();
        dom.focus(opener);
        let mut fm = FocusManager::new();
        fm.acquire(&dom, content, true, None);
        dom.remove(opener);
        assert_eq!(fm.release(&dom), None);
        assert_eq!(dom.active_element(), Some(kids[0]));
    }
}

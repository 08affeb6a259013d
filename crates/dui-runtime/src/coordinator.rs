#![forbid(unsafe_code)]

//! Modal coordination: document scroll lock and exclusive groups.
//!
//! The coordinator owns the only cross-instance mutable state of the
//! runtime:
//!
//! - the open-modal reference count, which locks document scroll on its
//!   first acquisition and restores the saved `overflow` on its last release;
//! - the registry of [`ExclusiveGroup`]s, each holding the "currently open"
//!   member of a set of widgets where at most one may be open.
//!
//! # Invariants
//!
//! 1. `body.style.overflow` is `hidden` iff the lock count is non-zero.
//! 2. The value saved at the first acquisition is restored verbatim at the
//!    last release.
//! 3. An exclusive group's active member is closed *before* `activate`
//!    returns for a different member, so two members are never open at once.
//!
//! # Failure Modes
//!
//! - Releasing with a zero count is ignored (no underflow).
//! - Activating in a group whose previous member was dropped simply replaces
//!   the pointer.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use dui_core::dom::Dom;

#[derive(Debug, Default)]
struct ScrollLock {
    count: usize,
    saved_overflow: Option<String>,
}

#[derive(Default)]
struct Registry {
    scroll: ScrollLock,
    groups: AHashMap<String, ExclusiveGroup>,
}

/// Shared coordinator handle injected into every widget instance.
#[derive(Clone, Default)]
pub struct ModalCoordinator {
    inner: Rc<RefCell<Registry>>,
}

impl fmt::Debug for ModalCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.borrow();
        f.debug_struct("ModalCoordinator")
            .field("scroll_locks", &registry.scroll.count)
            .field("groups", &registry.groups.len())
            .finish()
    }
}

impl ModalCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Scroll lock ---

    /// Take a scroll-lock reference. The first one hides body overflow.
    /// Returns the new count.
    pub fn lock_scroll(&self, dom: &Dom) -> usize {
        let mut registry = self.inner.borrow_mut();
        let lock = &mut registry.scroll;
        if lock.count == 0 {
            let body = dom.body();
            lock.saved_overflow = Some(dom.style(body, "overflow"));
            dom.set_style(body, "overflow", "hidden");
            tracing::debug!("document scroll locked");
        }
        lock.count += 1;
        lock.count
    }

    /// Drop a scroll-lock reference. The last one restores body overflow.
    /// Returns the new count.
    pub fn unlock_scroll(&self, dom: &Dom) -> usize {
        let mut registry = self.inner.borrow_mut();
        let lock = &mut registry.scroll;
        if lock.count == 0 {
            tracing::warn!("scroll unlock without matching lock ignored");
            return 0;
        }
        lock.count -= 1;
        if lock.count == 0 {
            let saved = lock.saved_overflow.take().unwrap_or_default();
            dom.set_style(dom.body(), "overflow", saved);
            tracing::debug!("document scroll unlocked");
        }
        lock.count
    }

    /// Current number of open modal instances.
    pub fn scroll_lock_count(&self) -> usize {
        self.inner.borrow().scroll.count
    }

    // --- Exclusive groups ---

    /// The group named `name`, created on first use.
    pub fn group(&self, name: &str) -> ExclusiveGroup {
        self.inner
            .borrow_mut()
            .groups
            .entry(name.to_owned())
            .or_insert_with(|| ExclusiveGroup::new(name))
            .clone()
    }
}

/// Identifier of a member within an [`ExclusiveGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId(u32);

/// A widget that can be closed because a sibling opened.
pub trait GroupMember {
    /// Close immediately in favour of `sibling`.
    fn close_for_sibling(&self);
}

struct GroupState {
    name: String,
    next_id: u32,
    members: Vec<(MemberId, Weak<dyn GroupMember>)>,
    active: Option<MemberId>,
}

/// A set of widgets of which at most one is open.
///
/// Members hold the group by value (it is a shared handle) and are held by
/// it weakly, so a group never keeps a widget alive.
#[derive(Clone)]
pub struct ExclusiveGroup {
    inner: Rc<RefCell<GroupState>>,
}

impl fmt::Debug for ExclusiveGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("ExclusiveGroup")
            .field("name", &state.name)
            .field("members", &state.members.len())
            .field("active", &state.active)
            .finish()
    }
}

impl ExclusiveGroup {
    /// Create a standalone group (not registered with a coordinator).
    pub fn new(name: &str) -> Self {
        Self {
            inner: Rc::new(RefCell::new(GroupState {
                name: name.to_owned(),
                next_id: 1,
                members: Vec::new(),
                active: None,
            })),
        }
    }

    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    /// Add a member. The group keeps only a weak reference.
    pub fn register(&self, member: Weak<dyn GroupMember>) -> MemberId {
        let mut state = self.inner.borrow_mut();
        let id = MemberId(state.next_id);
        state.next_id += 1;
        state.members.push((id, member));
        id
    }

    /// Remove a member, clearing the active pointer if it was active.
    pub fn unregister(&self, id: MemberId) {
        let mut state = self.inner.borrow_mut();
        state.members.retain(|(m, _)| *m != id);
        if state.active == Some(id) {
            state.active = None;
        }
    }

    /// Mark `id` active, closing the previously active member first.
    pub fn activate(&self, id: MemberId) {
        let previous = {
            let mut state = self.inner.borrow_mut();
            match state.active {
                Some(active) if active != id => {
                    state.active = None;
                    state
                        .members
                        .iter()
                        .find(|(m, _)| *m == active)
                        .and_then(|(_, w)| w.upgrade())
                }
                _ => None,
            }
        };
        if let Some(previous) = previous {
            tracing::debug!(group = %self.name(), "closing active sibling");
            previous.close_for_sibling();
        }
        self.inner.borrow_mut().active = Some(id);
    }

    /// Clear the active pointer if `id` holds it.
    pub fn deactivate(&self, id: MemberId) {
        let mut state = self.inner.borrow_mut();
        if state.active == Some(id) {
            state.active = None;
        }
    }

    pub fn active(&self) -> Option<MemberId> {
        self.inner.borrow().active
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether both handles refer to the same group.
    pub fn ptr_eq(&self, other: &ExclusiveGroup) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

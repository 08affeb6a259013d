#![forbid(unsafe_code)]

//! Element arena standing in for the browser document.
//!
//! [`Dom`] is a cheap, clonable handle (`Rc<RefCell<..>>`) to a single-threaded
//! document: a tree of elements with attributes, inline styles, text, and a
//! layout rectangle, plus the document-level state the disclosure runtime
//! touches (active element, viewport, document listener table).
//!
//! # Invariants
//!
//! 1. Every method borrows the document only for its own duration, so handles
//!    may be used freely from timer callbacks and nested handlers.
//! 2. An element is *connected* iff its parent chain reaches `body`.
//! 3. `active_element()` is always connected: removing a subtree that contains
//!    the active element clears it.
//! 4. Listener ids are never reused; `remove_listener` on a stale id is a no-op.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unknown id | Id from another document | Reads return defaults, writes are ignored |
//! | Cyclic append | Appending an ancestor into its descendant | Refused (`false`) |
//! | Focus on unfocusable | No tabindex, disabled, hidden, detached | Refused (`false`) |

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use crate::geometry::{Rect, Size};

/// Identifier of an element in a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32);

impl ElementId {
    /// Raw arena index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a document-level listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

/// Kind of document-level listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    KeyDown,
    PointerDown,
    Scroll,
    Resize,
}

#[derive(Debug, Clone)]
struct Listener {
    kind: ListenerKind,
    owner: String,
}

#[derive(Debug, Clone, Default)]
struct Node {
    tag: String,
    attrs: AHashMap<String, String>,
    styles: AHashMap<String, String>,
    text: String,
    rect: Rect,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

#[derive(Debug)]
struct Document {
    nodes: Vec<Node>,
    body: ElementId,
    active: Option<ElementId>,
    viewport: Rect,
    listeners: Vec<Option<Listener>>,
}

impl Document {
    fn node(&self, id: ElementId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    fn node_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    fn is_connected(&self, id: ElementId) -> bool {
        self.node(id).is_some() && self.contains(self.body, id)
    }

    fn descendants_into(&self, id: ElementId, out: &mut Vec<ElementId>) {
        if let Some(node) = self.node(id) {
            for &child in &node.children {
                out.push(child);
                self.descendants_into(child, out);
            }
        }
    }

    fn is_hidden(&self, id: ElementId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.node(current) else {
                return false;
            };
            if node.attrs.contains_key("hidden") {
                return true;
            }
            cursor = node.parent;
        }
        false
    }

    fn tabindex(&self, id: ElementId) -> Option<i32> {
        self.node(id)
            .and_then(|n| n.attrs.get("tabindex"))
            .and_then(|v| v.trim().parse().ok())
    }

    fn natively_focusable(&self, id: ElementId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        match node.tag.as_str() {
            "button" | "input" | "select" | "textarea" => true,
            "a" => node.attrs.contains_key("href"),
            _ => node.attrs.contains_key("contenteditable"),
        }
    }

    fn is_disabled(&self, id: ElementId) -> bool {
        self.node(id)
            .is_some_and(|n| n.attrs.contains_key("disabled"))
    }

    fn focusable(&self, id: ElementId) -> bool {
        self.is_connected(id)
            && !self.is_hidden(id)
            && !self.is_disabled(id)
            && (self.natively_focusable(id) || self.tabindex(id).is_some())
    }

    fn tabbable(&self, id: ElementId) -> bool {
        self.focusable(id)
            && match self.tabindex(id) {
                Some(index) => index >= 0,
                None => self.natively_focusable(id),
            }
    }
}

/// Handle to a single-threaded document.
#[derive(Debug, Clone)]
pub struct Dom {
    inner: Rc<RefCell<Document>>,
}

impl Dom {
    /// Create a document with an empty `body` filling a viewport of `viewport`.
    pub fn new(viewport: Size) -> Self {
        let body = Node {
            tag: "body".into(),
            rect: Rect::from_size(viewport),
            ..Node::default()
        };
        Self {
            inner: Rc::new(RefCell::new(Document {
                nodes: vec![body],
                body: ElementId(0),
                active: None,
                viewport: Rect::from_size(viewport),
                listeners: Vec::new(),
            })),
        }
    }

    /// Whether two handles refer to the same document.
    pub fn ptr_eq(&self, other: &Dom) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The `body` element.
    pub fn body(&self) -> ElementId {
        self.inner.borrow().body
    }

    // --- Tree ---

    /// Create a detached element.
    pub fn create_element(&self, tag: impl Into<String>) -> ElementId {
        let mut doc = self.inner.borrow_mut();
        let id = ElementId(doc.nodes.len() as u32);
        doc.nodes.push(Node {
            tag: tag.into(),
            ..Node::default()
        });
        id
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    ///
    /// Returns `false` when either id is unknown or the append would create a
    /// cycle.
    pub fn append_child(&self, parent: ElementId, child: ElementId) -> bool {
        let mut doc = self.inner.borrow_mut();
        if doc.node(parent).is_none() || doc.node(child).is_none() || doc.contains(child, parent) {
            return false;
        }
        if let Some(old) = doc.node(child).and_then(|n| n.parent)
            && let Some(old_parent) = doc.node_mut(old)
        {
            old_parent.children.retain(|&c| c != child);
        }
        if let Some(node) = doc.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = doc.node_mut(parent) {
            node.children.push(child);
        }
        true
    }

    /// Detach `id` (and its subtree) from its parent.
    pub fn remove(&self, id: ElementId) {
        let mut doc = self.inner.borrow_mut();
        if let Some(parent) = doc.node(id).and_then(|n| n.parent)
            && let Some(parent_node) = doc.node_mut(parent)
        {
            parent_node.children.retain(|&c| c != id);
        }
        if let Some(node) = doc.node_mut(id) {
            node.parent = None;
        }
        if let Some(active) = doc.active
            && !doc.is_connected(active)
        {
            doc.active = None;
        }
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.inner.borrow().node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.inner
            .borrow()
            .node(id)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// All descendants of `id` in document (pre-)order, excluding `id`.
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.inner.borrow().descendants_into(id, &mut out);
        out
    }

    /// Whether `node` is `ancestor` or lies inside it.
    pub fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        self.inner.borrow().contains(ancestor, node)
    }

    pub fn is_connected(&self, id: ElementId) -> bool {
        self.inner.borrow().is_connected(id)
    }

    pub fn tag(&self, id: ElementId) -> String {
        self.inner
            .borrow()
            .node(id)
            .map(|n| n.tag.clone())
            .unwrap_or_default()
    }

    // --- Attributes ---

    pub fn attribute(&self, id: ElementId, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .node(id)
            .and_then(|n| n.attrs.get(name).cloned())
    }

    pub fn has_attribute(&self, id: ElementId, name: &str) -> bool {
        self.inner
            .borrow()
            .node(id)
            .is_some_and(|n| n.attrs.contains_key(name))
    }

    /// Whether attribute `name` is present with exactly `value`.
    pub fn attribute_is(&self, id: ElementId, name: &str, value: &str) -> bool {
        self.inner
            .borrow()
            .node(id)
            .and_then(|n| n.attrs.get(name))
            .is_some_and(|v| v == value)
    }

    pub fn set_attribute(&self, id: ElementId, name: &str, value: impl Into<String>) {
        if let Some(node) = self.inner.borrow_mut().node_mut(id) {
            node.attrs.insert(name.to_owned(), value.into());
        }
    }

    /// Set (`true`) or remove (`false`) a presence attribute such as `hidden`.
    pub fn toggle_attribute(&self, id: ElementId, name: &str, present: bool) {
        if present {
            if !self.has_attribute(id, name) {
                self.set_attribute(id, name, "");
            }
        } else {
            self.remove_attribute(id, name);
        }
    }

    pub fn remove_attribute(&self, id: ElementId, name: &str) -> Option<String> {
        self.inner
            .borrow_mut()
            .node_mut(id)
            .and_then(|n| n.attrs.remove(name))
    }

    /// All attributes of `id`, sorted by name.
    pub fn attributes(&self, id: ElementId) -> Vec<(String, String)> {
        let mut attrs: Vec<(String, String)> = self
            .inner
            .borrow()
            .node(id)
            .map(|n| n.attrs.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        attrs.sort();
        attrs
    }

    /// Elements in `root`'s subtree (root included) carrying attribute `name`,
    /// optionally with exactly `value`, in document order.
    pub fn select(&self, root: ElementId, name: &str, value: Option<&str>) -> Vec<ElementId> {
        let doc = self.inner.borrow();
        let mut candidates = vec![root];
        doc.descendants_into(root, &mut candidates);
        candidates
            .into_iter()
            .filter(|&id| {
                doc.node(id)
                    .and_then(|n| n.attrs.get(name))
                    .is_some_and(|v| value.is_none_or(|want| v == want))
            })
            .collect()
    }

    /// Nearest ancestor-or-self of `id` carrying attribute `name`.
    pub fn closest(&self, id: ElementId, name: &str) -> Option<ElementId> {
        let doc = self.inner.borrow();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = doc.node(current)?;
            if node.attrs.contains_key(name) {
                return Some(current);
            }
            cursor = node.parent;
        }
        None
    }

    // --- Text ---

    /// Text content of `id` and its descendants, concatenated in order.
    pub fn text(&self, id: ElementId) -> String {
        let doc = self.inner.borrow();
        let mut out = doc.node(id).map(|n| n.text.clone()).unwrap_or_default();
        let mut descendants = Vec::new();
        doc.descendants_into(id, &mut descendants);
        for d in descendants {
            if let Some(node) = doc.node(d) {
                out.push_str(&node.text);
            }
        }
        out
    }

    pub fn set_text(&self, id: ElementId, text: impl Into<String>) {
        if let Some(node) = self.inner.borrow_mut().node_mut(id) {
            node.text = text.into();
        }
    }

    // --- Inline style & layout ---

    /// Inline style property, `""` when unset (like `element.style.prop`).
    pub fn style(&self, id: ElementId, property: &str) -> String {
        self.inner
            .borrow()
            .node(id)
            .and_then(|n| n.styles.get(property).cloned())
            .unwrap_or_default()
    }

    /// Set an inline style property; an empty value removes it.
    pub fn set_style(&self, id: ElementId, property: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(node) = self.inner.borrow_mut().node_mut(id) {
            if value.is_empty() {
                node.styles.remove(property);
            } else {
                node.styles.insert(property.to_owned(), value);
            }
        }
    }

    /// Layout rectangle (`getBoundingClientRect`).
    pub fn rect(&self, id: ElementId) -> Rect {
        self.inner
            .borrow()
            .node(id)
            .map(|n| n.rect)
            .unwrap_or_default()
    }

    pub fn set_rect(&self, id: ElementId, rect: Rect) {
        if let Some(node) = self.inner.borrow_mut().node_mut(id) {
            node.rect = rect;
        }
    }

    pub fn viewport(&self) -> Rect {
        self.inner.borrow().viewport
    }

    pub fn set_viewport(&self, size: Size) {
        let mut doc = self.inner.borrow_mut();
        doc.viewport = Rect::from_size(size);
        let body = doc.body;
        if let Some(node) = doc.node_mut(body) {
            node.rect = Rect::from_size(size);
        }
    }

    // --- Focus ---

    pub fn active_element(&self) -> Option<ElementId> {
        self.inner.borrow().active
    }

    /// Move focus to `id` if it can receive focus.
    pub fn focus(&self, id: ElementId) -> bool {
        let mut doc = self.inner.borrow_mut();
        if !doc.focusable(id) {
            return false;
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(element = id.raw(), "focus");
        doc.active = Some(id);
        true
    }

    pub fn blur(&self) {
        self.inner.borrow_mut().active = None;
    }

    /// Whether `id` or an ancestor carries `hidden`.
    pub fn is_hidden(&self, id: ElementId) -> bool {
        self.inner.borrow().is_hidden(id)
    }

    /// Whether `id` can receive programmatic focus.
    pub fn is_focusable(&self, id: ElementId) -> bool {
        self.inner.borrow().focusable(id)
    }

    /// Whether `id` participates in sequential (Tab) navigation.
    pub fn is_tabbable(&self, id: ElementId) -> bool {
        self.inner.borrow().tabbable(id)
    }

    /// Tabbable descendants of `root` in document order.
    pub fn tabbable_descendants(&self, root: ElementId) -> Vec<ElementId> {
        let doc = self.inner.borrow();
        let mut all = Vec::new();
        doc.descendants_into(root, &mut all);
        all.into_iter().filter(|&id| doc.tabbable(id)).collect()
    }

    /// Whether `id` is a text-editing control (Space types, not activates).
    pub fn is_editable(&self, id: ElementId) -> bool {
        let doc = self.inner.borrow();
        let Some(node) = doc.node(id) else {
            return false;
        };
        match node.tag.as_str() {
            "textarea" => true,
            "input" => !matches!(
                node.attrs.get("type").map(String::as_str),
                Some("button" | "checkbox" | "radio" | "submit" | "reset")
            ),
            _ => node
                .attrs
                .get("contenteditable")
                .is_some_and(|v| v != "false"),
        }
    }

    // --- Document listeners ---

    /// Register a document-level listener owned by `owner`.
    pub fn add_listener(&self, kind: ListenerKind, owner: impl Into<String>) -> ListenerId {
        let mut doc = self.inner.borrow_mut();
        let id = ListenerId(doc.listeners.len() as u32);
        doc.listeners.push(Some(Listener {
            kind,
            owner: owner.into(),
        }));
        id
    }

    /// Remove a listener registration; `false` if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner
            .borrow_mut()
            .listeners
            .get_mut(id.0 as usize)
            .and_then(Option::take)
            .is_some()
    }

    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.inner
            .borrow()
            .listeners
            .get(id.0 as usize)
            .is_some_and(Option::is_some)
    }

    /// Number of live listener registrations.
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.iter().flatten().count()
    }

    /// Live registrations of `kind` owned by `owner`.
    pub fn listener_count_for(&self, kind: ListenerKind, owner: &str) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .flatten()
            .filter(|l| l.kind == kind && l.owner == owner)
            .count()
    }

    // --- Markup ---

    /// Materialize `el` (recursively) and append it to `parent`.
    pub fn mount(&self, parent: ElementId, el: El) -> ElementId {
        let id = self.create_element(el.tag);
        {
            let mut doc = self.inner.borrow_mut();
            if let Some(node) = doc.node_mut(id) {
                node.attrs.extend(el.attrs);
                node.text = el.text;
                if let Some(rect) = el.rect {
                    node.rect = rect;
                }
            }
        }
        for child in el.children {
            self.mount(id, child);
        }
        self.append_child(parent, id);
        id
    }
}

/// Declarative element description, the shape server-rendered markup takes
/// before it is mounted into a [`Dom`].
///
/// ```
/// use dui_core::{Dom, El, Size};
///
/// let dom = Dom::new(Size::new(800.0, 600.0));
/// let root = dom.mount(
///     dom.body(),
///     El::new("div")
///         .attr("data-controller", "ui--popover")
///         .child(El::new("button").text("Open")),
/// );
/// assert_eq!(dom.children(root).len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct El {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    rect: Option<Rect>,
    children: Vec<El>,
}

impl El {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Presence attribute with an empty value (`hidden`, `data-disabled`).
    #[must_use]
    pub fn flag(self, name: impl Into<String>) -> Self {
        self.attr(name, "")
    }

    #[must_use]
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    #[must_use]
    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }

    #[must_use]
    pub fn child(mut self, child: El) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = El>) -> Self {
        self.children.extend(children);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dom() -> Dom {
        Dom::new(Size::new(800.0, 600.0))
    }

    #[test]
    fn mount_builds_tree_in_order() {
        let dom = dom();
        let root = dom.mount(
            dom.body(),
            El::new("ul").children(["a", "b", "c"].map(|t| El::new("li").text(t))),
        );
        let kids = dom.children(root);
        assert_eq!(kids.len(), 3);
        assert_eq!(dom.text(root), "abc");
        assert!(dom.is_connected(kids[2]));
    }

    #[test]
    fn detached_until_appended() {
        let dom = dom();
        let el = dom.create_element("div");
        assert!(!dom.is_connected(el));
        assert!(dom.append_child(dom.body(), el));
        assert!(dom.is_connected(el));
    }

    #[test]
    fn cyclic_append_refused() {
        let dom = dom();
        let outer = dom.mount(dom.body(), El::new("div").child(El::new("span")));
        let inner = dom.children(outer)[0];
        assert!(!dom.append_child(inner, outer));
        assert_eq!(dom.parent(inner), Some(outer));
    }

    #[test]
    fn remove_clears_focus_inside_subtree() {
        let dom = dom();
        let wrap = dom.mount(dom.body(), El::new("div").child(El::new("button")));
        let button = dom.children(wrap)[0];
        assert!(dom.focus(button));
        dom.remove(wrap);
        assert_eq!(dom.active_element(), None);
        assert!(!dom.is_connected(button));
    }

    #[test]
    fn focusability_rules() {
        let dom = dom();
        let root = dom.mount(
            dom.body(),
            El::new("div").children([
                El::new("button"),
                El::new("button").flag("disabled"),
                El::new("div").attr("tabindex", "-1"),
                El::new("div"),
                El::new("a"),
                El::new("a").attr("href", "#"),
                El::new("div").flag("hidden").child(El::new("button")),
            ]),
        );
        let kids = dom.children(root);
        assert!(dom.is_tabbable(kids[0]));
        assert!(!dom.is_focusable(kids[1]));
        assert!(dom.is_focusable(kids[2]));
        assert!(!dom.is_tabbable(kids[2]));
        assert!(!dom.is_focusable(kids[3]));
        assert!(!dom.is_focusable(kids[4]));
        assert!(dom.is_tabbable(kids[5]));
        let hidden_button = dom.children(kids[6])[0];
        assert!(!dom.is_focusable(hidden_button));
        assert_eq!(dom.tabbable_descendants(root), vec![kids[0], kids[5]]);
    }

    #[test]
    fn select_and_closest() {
        let dom = dom();
        let root = dom.mount(
            dom.body(),
            El::new("div").attr("data-x", "root").children([
                El::new("span").attr("data-x", "item"),
                El::new("span").attr("data-x", "other"),
            ]),
        );
        assert_eq!(dom.select(root, "data-x", None).len(), 3);
        assert_eq!(dom.select(root, "data-x", Some("item")).len(), 1);
        let item = dom.children(root)[0];
        assert_eq!(dom.closest(item, "data-x"), Some(item));
        let plain = dom.mount(item, El::new("b"));
        assert_eq!(dom.closest(plain, "data-x"), Some(item));
    }

    #[test]
    fn style_empty_value_removes() {
        let dom = dom();
        let body = dom.body();
        dom.set_style(body, "overflow", "hidden");
        assert_eq!(dom.style(body, "overflow"), "hidden");
        dom.set_style(body, "overflow", "");
        assert_eq!(dom.style(body, "overflow"), "");
    }

    #[test]
    fn listener_table_pairs_add_remove() {
        let dom = dom();
        let a = dom.add_listener(ListenerKind::KeyDown, "popover");
        let b = dom.add_listener(ListenerKind::PointerDown, "popover");
        assert_eq!(dom.listener_count(), 2);
        assert_eq!(dom.listener_count_for(ListenerKind::KeyDown, "popover"), 1);
        assert!(dom.remove_listener(a));
        assert!(!dom.remove_listener(a));
        assert!(dom.has_listener(b));
        assert_eq!(dom.listener_count(), 1);
    }

    #[test]
    fn editable_controls() {
        let dom = dom();
        let root = dom.mount(
            dom.body(),
            El::new("div").children([
                El::new("input"),
                El::new("input").attr("type", "checkbox"),
                El::new("textarea"),
                El::new("div").attr("contenteditable", "true"),
                El::new("button"),
            ]),
        );
        let kids = dom.children(root);
        assert!(dom.is_editable(kids[0]));
        assert!(!dom.is_editable(kids[1]));
        assert!(dom.is_editable(kids[2]));
        assert!(dom.is_editable(kids[3]));
        assert!(!dom.is_editable(kids[4]));
    }

    #[test]
    fn unknown_ids_are_harmless() {
        let a = dom();
        let b = dom();
        let foreign = b.mount(b.body(), El::new("div"));
        let other = b.mount(b.body(), El::new("div"));
        assert!(foreign != other);
        // `other` does not exist in `a`.
        a.set_attribute(other, "x", "y");
        assert_eq!(a.attribute(other, "x"), None);
        assert!(!a.focus(other));
    }
}

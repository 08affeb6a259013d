#![forbid(unsafe_code)]

//! Live item sets for keyboard navigation.
//!
//! An [`ItemSet`] is a *query*, not a cache: every call walks the container
//! again, so items added, removed, hidden, or disabled after mount are seen
//! immediately.
//!
//! # Invariants
//!
//! 1. Items are returned in document order.
//! 2. Boundary targets (e.g. a nested submenu's `sub-content`) are never
//!    crossed.
//! 3. An item is disabled iff it carries `data-disabled` or `disabled`
//!    (presence, any value) or `aria-disabled="true"`.

use dui_core::dom::{Dom, ElementId};
use dui_runtime::ControllerScope;

/// One navigable element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub element: ElementId,
    pub disabled: bool,
    /// `data-value`, else the label.
    pub value: String,
    /// `data-label`, else trimmed text content.
    pub label: String,
}

/// Whether `id` is disabled by attribute presence.
pub fn is_disabled(dom: &Dom, id: ElementId) -> bool {
    dom.has_attribute(id, "data-disabled")
        || dom.has_attribute(id, "disabled")
        || dom.attribute_is(id, "aria-disabled", "true")
}

/// Label used for typeahead and filtering.
pub fn item_label(dom: &Dom, id: ElementId) -> String {
    dom.attribute(id, "data-label")
        .unwrap_or_else(|| dom.text(id).trim().to_owned())
}

/// Value used for selection.
pub fn item_value(dom: &Dom, id: ElementId) -> String {
    dom.attribute(id, "data-value")
        .unwrap_or_else(|| item_label(dom, id))
}

/// Ordered, disabled-filterable view over a container's items.
#[derive(Debug, Clone)]
pub struct ItemSet {
    scope: ControllerScope,
    container: ElementId,
    names: Vec<&'static str>,
    boundaries: Vec<&'static str>,
}

impl ItemSet {
    /// Items are `names` targets of `scope` under `container`.
    pub fn new(scope: &ControllerScope, container: ElementId, names: &[&'static str]) -> Self {
        Self {
            scope: scope.clone(),
            container,
            names: names.to_vec(),
            boundaries: Vec::new(),
        }
    }

    /// Do not descend through targets named `boundaries`.
    #[must_use]
    pub fn with_boundaries(mut self, boundaries: &[&'static str]) -> Self {
        self.boundaries = boundaries.to_vec();
        self
    }

    pub fn container(&self) -> ElementId {
        self.container
    }

    pub fn dom(&self) -> &Dom {
        self.scope.dom()
    }

    fn is_item(&self, id: ElementId) -> bool {
        self.names.iter().any(|name| self.scope.is_target(id, name))
    }

    /// Visible and not behind a boundary or nested root.
    fn in_reach(&self, id: ElementId) -> bool {
        let dom = self.scope.dom();
        if !self.scope.owns(id) || dom.has_attribute(id, "hidden") {
            return false;
        }
        let mut cursor = dom.parent(id);
        while let Some(current) = cursor {
            if current == self.container {
                return true;
            }
            if dom.has_attribute(current, "hidden")
                || self.boundaries.iter().any(|b| self.scope.is_target(current, b))
            {
                return false;
            }
            cursor = dom.parent(current);
        }
        false
    }

    /// Every reachable item element, disabled ones included.
    pub fn elements(&self) -> Vec<ElementId> {
        self.scope
            .dom()
            .descendants(self.container)
            .into_iter()
            .filter(|&id| self.is_item(id) && self.in_reach(id))
            .collect()
    }

    /// Every reachable item with its metadata.
    pub fn all(&self) -> Vec<Item> {
        let dom = self.scope.dom();
        self.elements()
            .into_iter()
            .map(|element| Item {
                element,
                disabled: is_disabled(dom, element),
                value: item_value(dom, element),
                label: item_label(dom, element),
            })
            .collect()
    }

    /// Navigable items: reachable and not disabled.
    pub fn enabled(&self) -> Vec<Item> {
        self.all().into_iter().filter(|i| !i.disabled).collect()
    }

    /// Navigable item elements.
    pub fn enabled_elements(&self) -> Vec<ElementId> {
        let dom = self.scope.dom();
        self.elements()
            .into_iter()
            .filter(|&id| !is_disabled(dom, id))
            .collect()
    }

    /// Whether `id` is a reachable item of this set.
    pub fn contains(&self, id: ElementId) -> bool {
        self.is_item(id) && self.in_reach(id)
    }

    /// The item `id` is (or lies inside of).
    pub fn item_for(&self, id: ElementId) -> Option<ElementId> {
        let dom = self.scope.dom();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if self.contains(current) {
                return Some(current);
            }
            if current == self.container {
                return None;
            }
            cursor = dom.parent(current);
        }
        None
    }

    /// First enabled item whose value is `value`.
    pub fn find_value(&self, value: &str) -> Option<ElementId> {
        self.enabled()
            .into_iter()
            .find(|i| i.value == value)
            .map(|i| i.element)
    }
}

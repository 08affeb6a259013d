#![forbid(unsafe_code)]

//! Target resolution inside a controller's subtree.
//!
//! A controller scope is the subtree of a mount root minus any nested roots
//! of the same controller. Targets are elements carrying
//! `data-<identifier>-target`, whose value is a space-separated list of
//! target names.
//!
//! # Invariants
//!
//! 1. Target lookups never cross into a nested root of the same identifier;
//!    a nested root itself still belongs to the outer scope.
//! 2. Results are in document order and re-derived on every call.

use dui_core::dom::{Dom, ElementId};

use crate::config::AttributeReader;
use crate::error::MountError;

/// Attribute marking a mount root.
pub const CONTROLLER_ATTR: &str = "data-controller";

/// Whether `id`'s `data-controller` lists `identifier`.
pub fn has_controller(dom: &Dom, id: ElementId, identifier: &str) -> bool {
    dom.attribute(id, CONTROLLER_ATTR)
        .is_some_and(|v| v.split_whitespace().any(|c| c == identifier))
}

/// Targets and configuration of one mounted controller.
#[derive(Debug, Clone)]
pub struct ControllerScope {
    dom: Dom,
    root: ElementId,
    identifier: String,
}

impl ControllerScope {
    pub fn new(dom: &Dom, root: ElementId, identifier: impl Into<String>) -> Self {
        Self {
            dom: dom.clone(),
            root,
            identifier: identifier.into(),
        }
    }

    /// Roots of `identifier` inside `container` (inclusive), document order.
    pub fn roots(dom: &Dom, container: ElementId, identifier: &str) -> Vec<ElementId> {
        dom.select(container, CONTROLLER_ATTR, None)
            .into_iter()
            .filter(|&id| has_controller(dom, id, identifier))
            .collect()
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    /// Controller identifier, e.g. `ui--popover`.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Short widget name, e.g. `popover` for `ui--popover`.
    pub fn widget(&self) -> &str {
        self.identifier
            .rsplit_once("--")
            .map_or(self.identifier.as_str(), |(_, name)| name)
    }

    /// Name of the target attribute for this controller.
    pub fn target_attribute(&self) -> String {
        format!("data-{}-target", self.identifier)
    }

    /// Whether `id` is inside this scope (not behind a nested root).
    pub fn owns(&self, id: ElementId) -> bool {
        if !self.dom.contains(self.root, id) {
            return false;
        }
        let mut cursor = self.dom.parent(id);
        while let Some(current) = cursor {
            if current == self.root {
                return true;
            }
            if has_controller(&self.dom, current, &self.identifier) {
                return false;
            }
            cursor = self.dom.parent(current);
        }
        id == self.root
    }

    /// Whether `id` is a `name` target of this controller.
    pub fn is_target(&self, id: ElementId, name: &str) -> bool {
        self.dom
            .attribute(id, &self.target_attribute())
            .is_some_and(|v| v.split_whitespace().any(|t| t == name))
    }

    /// Target names `id` carries, if any.
    pub fn target_names(&self, id: ElementId) -> Vec<String> {
        self.dom
            .attribute(id, &self.target_attribute())
            .map(|v| v.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    /// All `name` targets in scope.
    pub fn targets(&self, name: &str) -> Vec<ElementId> {
        self.targets_within(self.root, name)
    }

    /// `name` targets in scope under `container` (inclusive).
    pub fn targets_within(&self, container: ElementId, name: &str) -> Vec<ElementId> {
        self.dom
            .select(container, &self.target_attribute(), None)
            .into_iter()
            .filter(|&id| self.is_target(id, name) && self.owns(id))
            .collect()
    }

    /// First `name` target in scope.
    pub fn target(&self, name: &str) -> Option<ElementId> {
        self.targets(name).into_iter().next()
    }

    /// First `name` target, or a [`MountError::MissingTarget`].
    pub fn require(&self, name: &'static str) -> Result<ElementId, MountError> {
        self.target(name).ok_or_else(|| MountError::MissingTarget {
            controller: self.identifier.clone(),
            target: name,
        })
    }

    /// Nearest ancestor-or-self of `id` (within scope) that is a `name` target.
    pub fn closest_target(&self, id: ElementId, name: &str) -> Option<ElementId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if self.is_target(current, name) && self.owns(current) {
                return Some(current);
            }
            if current == self.root {
                return None;
            }
            cursor = self.dom.parent(current);
        }
        None
    }

    /// Reader for this controller's value attributes.
    pub fn attrs(&self) -> AttributeReader {
        AttributeReader::new(&self.dom, self.root, self.identifier.clone())
    }
}

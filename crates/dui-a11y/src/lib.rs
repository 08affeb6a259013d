#![forbid(unsafe_code)]

//! ARIA and `data-state` writers.
//!
//! Widgets never format `aria-*` strings themselves; they call into this
//! crate so every boolean ARIA state is written as `"true"`/`"false"` and
//! every id reference points at an element that actually carries that id.
//!
//! # Invariants
//!
//! 1. Writes are synchronous: the attribute is updated before the call
//!    returns, so there is no staleness window between logical state and
//!    its ARIA mirror.
//! 2. [`ensure_id`] never overwrites an existing `id`.

use dui_core::dom::{Dom, ElementId};

/// Attribute carrying the CSS-visible state of a widget part.
pub const DATA_STATE: &str = "data-state";

/// Boolean ARIA states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AriaFlag {
    Expanded,
    Checked,
    Selected,
    Pressed,
    Disabled,
    Hidden,
    Modal,
}

impl AriaFlag {
    /// Attribute name, e.g. `aria-expanded`.
    pub const fn attribute(self) -> &'static str {
        match self {
            Self::Expanded => "aria-expanded",
            Self::Checked => "aria-checked",
            Self::Selected => "aria-selected",
            Self::Pressed => "aria-pressed",
            Self::Disabled => "aria-disabled",
            Self::Hidden => "aria-hidden",
            Self::Modal => "aria-modal",
        }
    }
}

/// Write `flag` as `"true"` or `"false"`.
pub fn set_flag(dom: &Dom, id: ElementId, flag: AriaFlag, value: bool) {
    dom.set_attribute(id, flag.attribute(), if value { "true" } else { "false" });
}

/// Remove `flag` entirely.
pub fn clear_flag(dom: &Dom, id: ElementId, flag: AriaFlag) {
    dom.remove_attribute(id, flag.attribute());
}

/// Read `flag`: `Some(true)` only for the literal `"true"`.
pub fn flag(dom: &Dom, id: ElementId, flag: AriaFlag) -> Option<bool> {
    dom.attribute(id, flag.attribute()).map(|v| v == "true")
}

/// Write `data-state` on every element in `ids`.
pub fn write_data_state(dom: &Dom, ids: &[ElementId], state: &str) {
    for &id in ids {
        dom.set_attribute(id, DATA_STATE, state);
    }
}

/// Current `data-state` of `id`.
pub fn data_state(dom: &Dom, id: ElementId) -> Option<String> {
    dom.attribute(id, DATA_STATE)
}

/// Set `role` unless the markup already chose one.
pub fn ensure_role(dom: &Dom, id: ElementId, role: &str) {
    if !dom.has_attribute(id, "role") {
        dom.set_attribute(id, "role", role);
    }
}

/// The element's `id`, assigning `<prefix>-<n>` when it has none.
pub fn ensure_id(dom: &Dom, id: ElementId, prefix: &str) -> String {
    if let Some(existing) = dom.attribute(id, "id").filter(|v| !v.is_empty()) {
        return existing;
    }
    let generated = format!("{prefix}-{}", id.raw());
    dom.set_attribute(id, "id", generated.clone());
    generated
}

/// Point `relation` (e.g. `aria-controls`, `aria-labelledby`) at `target`.
pub fn link(dom: &Dom, from: ElementId, relation: &str, target: ElementId) {
    let target_id = ensure_id(dom, target, "dui");
    dom.set_attribute(from, relation, target_id);
}

/// Set or clear `aria-activedescendant` on a virtual-focus host.
pub fn set_active_descendant(dom: &Dom, host: ElementId, active: Option<ElementId>) {
    match active {
        Some(item) => link(dom, host, "aria-activedescendant", item),
        None => {
            dom.remove_attribute(host, "aria-activedescendant");
        }
    }
}

/// Write `aria-valuenow`/`aria-valuemin`/`aria-valuemax`.
pub fn set_value_range(dom: &Dom, id: ElementId, now: f64, min: f64, max: f64) {
    dom.set_attribute(id, "aria-valuenow", format_number(now));
    dom.set_attribute(id, "aria-valuemin", format_number(min));
    dom.set_attribute(id, "aria-valuemax", format_number(max));
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#![forbid(unsafe_code)]

//! Floating content anchored to a trigger: popover, tooltip, hover card.
//!
//! | Kind | Trigger | Placement | Delays (open/close) | Focus |
//! |------|---------|-----------|---------------------|-------|
//! | `ui--popover` | click | bottom | 0 / 0 | content |
//! | `ui--tooltip` | hover | top | 700 / 0 | untouched |
//! | `ui--hover-card` | hover | bottom | 700 / 300 | untouched |
//!
//! Every default can be overridden by the `data-ui--<kind>-*-value`
//! attributes. A `close` target inside the content closes the widget.

use std::rc::Rc;

use dui_core::dom::ElementId;
use dui_core::event::{Event, PointerEventKind};
use dui_layout::{Placement, Side};
use dui_runtime::{ControllerScope, DisclosureConfig, DisclosureDefaults, MountError};

use crate::controller::{Controller, Env};
use crate::disclosure::{Disclosure, DisclosureParts, DisclosureState};

/// Which floating widget a root mounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatingKind {
    Popover,
    Tooltip,
    HoverCard,
}

impl FloatingKind {
    pub const ALL: [FloatingKind; 3] = [Self::Popover, Self::Tooltip, Self::HoverCard];

    pub const fn identifier(self) -> &'static str {
        match self {
            Self::Popover => "ui--popover",
            Self::Tooltip => "ui--tooltip",
            Self::HoverCard => "ui--hover-card",
        }
    }

    /// Defaults before attribute overrides.
    pub fn defaults(self) -> DisclosureDefaults {
        match self {
            Self::Popover => DisclosureDefaults::click().placement(Placement::default()),
            Self::Tooltip => DisclosureDefaults::hover(700, 0).placement(Placement::new(Side::Top)),
            Self::HoverCard => {
                DisclosureDefaults::hover(700, 300).placement(Placement::new(Side::Bottom))
            }
        }
    }

    const fn content_role(self) -> &'static str {
        match self {
            Self::Tooltip => "tooltip",
            Self::Popover | Self::HoverCard => "dialog",
        }
    }
}

/// A mounted popover, tooltip, or hover card.
#[derive(Debug)]
pub struct Popover {
    kind: FloatingKind,
    scope: ControllerScope,
    disclosure: Disclosure,
}

impl Popover {
    pub fn mount(env: &Env, root: ElementId, kind: FloatingKind) -> Result<Rc<Self>, MountError> {
        let scope = ControllerScope::new(&env.dom, root, kind.identifier());
        let parts = DisclosureParts::from_scope(&scope)?;
        let trigger = scope.require("trigger")?;
        let config = DisclosureConfig::read(&scope.attrs(), kind.defaults());

        let dom = &env.dom;
        dui_a11y::ensure_role(dom, parts.content, kind.content_role());
        match kind {
            FloatingKind::Tooltip => dui_a11y::link(dom, trigger, "aria-describedby", parts.content),
            FloatingKind::Popover => dom.set_attribute(trigger, "aria-haspopup", "dialog"),
            FloatingKind::HoverCard => {}
        }

        let disclosure = Disclosure::new(env, scope.widget(), parts, config);
        disclosure.open_if_configured();
        Ok(Rc::new(Self {
            kind,
            scope,
            disclosure,
        }))
    }

    pub fn kind(&self) -> FloatingKind {
        self.kind
    }

    pub fn disclosure(&self) -> &Disclosure {
        &self.disclosure
    }

    pub fn state(&self) -> DisclosureState {
        self.disclosure.state()
    }

    pub fn open(&self) -> bool {
        self.disclosure.open()
    }

    pub fn close(&self) -> bool {
        self.disclosure.close()
    }

    pub fn toggle(&self) -> bool {
        self.disclosure.toggle()
    }
}

impl Controller for Popover {
    fn identifier(&self) -> &'static str {
        self.kind.identifier()
    }

    fn root(&self) -> ElementId {
        self.scope.root()
    }

    fn handle_event(&self, event: &Event) -> bool {
        if let Event::Pointer(pointer) = event
            && pointer.kind == PointerEventKind::Click
            && self.disclosure.is_open()
            && self.scope.closest_target(pointer.target, "close").is_some()
        {
            return self.close();
        }
        self.disclosure.handle_event(event)
    }

    fn disconnect(&self) {
        self.disclosure.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dui_core::dom::{Dom, El};
    use dui_core::geometry::{Rect, Size};
    use web_time::Duration;

    fn mount(kind: FloatingKind, attrs: &[(&str, &str)]) -> (Env, Rc<Popover>, ElementId) {
        let env = Env::new(Dom::new(Size::new(800.0, 600.0)));
        let dom = &env.dom;
        let id = kind.identifier();
        let target = format!("data-{id}-target");
        let mut root = El::new("div").attr("data-controller", id);
        for (name, value) in attrs {
            root = root.attr(format!("data-{id}-{name}-value"), *value);
        }
        let root = dom.mount(
            dom.body(),
            root.children([
                El::new("button")
                    .attr(target.as_str(), "trigger")
                    .rect(Rect::new(300.0, 300.0, 100.0, 30.0)),
                El::new("div")
                    .attr(target.as_str(), "content")
                    .rect(Rect::new(0.0, 0.0, 200.0, 80.0))
                    .child(El::new("button").attr(target.as_str(), "close").text("x")),
            ]),
        );
        let popover = Popover::mount(&env, root, kind).unwrap();
        let trigger = dom.children(root)[0];
        (env, popover, trigger)
    }

    #[test]
    fn popover_click_and_close_target() {
        let (env, p, trigger) = mount(FloatingKind::Popover, &[]);
        let dom = &env.dom;
        assert!(p.handle_event(&Event::click(trigger)));
        assert_eq!(p.state(), DisclosureState::Open);
        let content = p.disclosure().parts().content;
        assert!(dom.attribute_is(content, "role", "dialog"));
        let close = dom.children(content)[0];
        assert!(p.handle_event(&Event::click(close)));
        assert_eq!(p.state(), DisclosureState::Closed);
    }

    #[test]
    fn popover_placement_top_resolves_top() {
        let (env, p, _) = mount(FloatingKind::Popover, &[("placement", "top")]);
        p.open();
        let content = p.disclosure().parts().content;
        assert!(env.dom.attribute_is(content, "data-side", "top"));
        assert!(env.dom.attribute_is(content, "data-align", "center"));
    }

    #[test]
    fn tooltip_waits_for_delay() {
        let (env, t, trigger) = mount(FloatingKind::Tooltip, &[]);
        let content = t.disclosure().parts().content;
        assert!(env.dom.attribute_is(trigger, "aria-describedby", &env.dom.attribute(content, "id").unwrap()));
        t.handle_event(&Event::pointer(PointerEventKind::Enter, trigger));
        env.scheduler.advance(Duration::from_millis(699));
        assert!(!t.disclosure().is_open());
        env.scheduler.advance(Duration::from_millis(1));
        assert!(t.disclosure().is_open());
        t.handle_event(&Event::pointer(PointerEventKind::Leave, trigger));
        assert!(!t.disclosure().is_open());
    }

    #[test]
    fn hover_card_delay_is_configurable() {
        let (env, h, trigger) = mount(FloatingKind::HoverCard, &[("open-delay", "50")]);
        h.handle_event(&Event::pointer(PointerEventKind::Enter, trigger));
        env.scheduler.advance(Duration::from_millis(50));
        assert!(h.disclosure().is_open());
        h.handle_event(&Event::pointer(PointerEventKind::Leave, trigger));
        env.scheduler.advance(Duration::from_millis(299));
        assert!(h.disclosure().is_open());
        env.scheduler.advance(Duration::from_millis(1));
        assert!(!h.disclosure().is_open());
    }

    #[test]
    fn missing_content_is_an_error() {
        let env = Env::new(Dom::new(Size::new(800.0, 600.0)));
        let dom = &env.dom;
        let root = dom.mount(
            dom.body(),
            El::new("div")
                .attr("data-controller", "ui--popover")
                .child(El::new("button").attr("data-ui--popover-target", "trigger")),
        );
        let err = Popover::mount(&env, root, FloatingKind::Popover).unwrap_err();
        assert_eq!(err.to_string(), "ui--popover: missing required target `content`");
    }
}

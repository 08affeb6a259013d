#![forbid(unsafe_code)]

//! Typed widget configuration read from `data-<controller>-<name>-value`
//! attributes.
//!
//! Attributes are parsed once at mount. A missing attribute yields the
//! widget's default; a malformed one is logged with [`tracing::warn!`] and
//! also yields the default, so configuration never fails a mount.
//!
//! | Kind | Accepted values |
//! |------|-----------------|
//! | bool | `true/false/1/0/yes/no` (case-insensitive), empty = `true` |
//! | millis | non-negative integer milliseconds |
//! | number | finite float |
//! | placement | `side[-align]`, e.g. `top`, `bottom-start` |
//! | list | comma-separated, blanks dropped |

use std::fmt;
use std::str::FromStr;

use dui_core::dom::{Dom, ElementId};
use dui_layout::{Placement, Side};
use web_time::Duration;

use crate::error::ConfigError;

/// How a disclosure is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriggerMode {
    #[default]
    Click,
    Hover,
}

impl FromStr for TriggerMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "click" => Ok(Self::Click),
            "hover" => Ok(Self::Hover),
            _ => Err(()),
        }
    }
}

/// Axis of a composite widget's keyboard traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    Horizontal,
    #[default]
    Vertical,
}

impl Orientation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Ok(Self::Horizontal),
            "vertical" => Ok(Self::Vertical),
            _ => Err(()),
        }
    }
}

/// Whether a selection-bearing composite allows one or many selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectionMode {
    #[default]
    Single,
    Multiple,
}

impl FromStr for SelectionMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "multiple" => Ok(Self::Multiple),
            _ => Err(()),
        }
    }
}

/// Whether focusing a tab also selects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Activation {
    #[default]
    Automatic,
    Manual,
}

impl FromStr for Activation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "automatic" => Ok(Self::Automatic),
            "manual" => Ok(Self::Manual),
            _ => Err(()),
        }
    }
}

/// Parse a boolean attribute value.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Parse non-negative integer milliseconds.
pub fn parse_millis(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_millis)
}

/// Parse a finite float.
pub fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Reads `data-<identifier>-<name>-value` attributes from a mount root.
#[derive(Debug, Clone)]
pub struct AttributeReader {
    dom: Dom,
    root: ElementId,
    identifier: String,
}

impl AttributeReader {
    /// `identifier` is the controller name, e.g. `ui--popover`.
    pub fn new(dom: &Dom, root: ElementId, identifier: impl Into<String>) -> Self {
        Self {
            dom: dom.clone(),
            root,
            identifier: identifier.into(),
        }
    }

    /// Full attribute name for value `name`.
    pub fn attribute_name(&self, name: &str) -> String {
        format!("data-{}-{name}-value", self.identifier)
    }

    /// Raw attribute value, if present.
    pub fn raw(&self, name: &str) -> Option<String> {
        self.dom.attribute(self.root, &self.attribute_name(name))
    }

    /// Whether the attribute is present at all.
    pub fn is_set(&self, name: &str) -> bool {
        self.dom.has_attribute(self.root, &self.attribute_name(name))
    }

    /// Parse value `name`: `Ok(None)` when absent, `Err` when malformed.
    pub fn try_value<T>(
        &self,
        name: &str,
        expected: &'static str,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> Result<Option<T>, ConfigError> {
        let Some(raw) = self.raw(name) else {
            return Ok(None);
        };
        match parse(&raw) {
            Some(value) => Ok(Some(value)),
            None => Err(ConfigError::InvalidValue {
                attribute: self.attribute_name(name),
                value: raw,
                expected,
            }),
        }
    }

    /// Parse value `name`, falling back to `default` (with a warning when the
    /// attribute is malformed).
    pub fn value_or<T>(
        &self,
        name: &str,
        default: T,
        expected: &'static str,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> T {
        match self.try_value(name, expected, parse) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(err) => {
                tracing::warn!(controller = %self.identifier, error = %err, "using default");
                default
            }
        }
    }

    pub fn bool(&self, name: &str, default: bool) -> bool {
        self.value_or(name, default, "a boolean", parse_bool)
    }

    pub fn millis(&self, name: &str, default: Duration) -> Duration {
        self.value_or(name, default, "milliseconds", parse_millis)
    }

    pub fn number(&self, name: &str, default: f64) -> f64 {
        self.value_or(name, default, "a number", parse_number)
    }

    /// Any `FromStr` enum (trigger mode, orientation, side, ...).
    pub fn parsed<T: FromStr>(&self, name: &str, default: T, expected: &'static str) -> T {
        self.value_or(name, default, expected, |raw| raw.parse().ok())
    }

    /// Free-form string value, `None` when absent.
    pub fn string(&self, name: &str) -> Option<String> {
        self.raw(name)
    }

    /// Comma-separated list; absent or blank yields an empty list.
    pub fn list(&self, name: &str) -> Vec<String> {
        self.raw(name)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Placement from `placement`, `offset`, `flip` and `collision-padding`.
    pub fn placement(&self, default: Placement) -> Placement {
        let base = self.value_or("placement", default, "side[-align]", |raw| {
            raw.parse::<Placement>().ok().map(|parsed| Placement {
                side: parsed.side,
                align: parsed.align,
                ..default
            })
        });
        base.offset(self.number("offset", default.offset))
            .flip(self.bool("flip", default.flip))
            .collision_padding(self.number("collision-padding", default.collision_padding).max(0.0))
    }

    /// Side value (sheet and drawer edge).
    pub fn side(&self, name: &str, default: Side) -> Side {
        self.parsed(name, default, "top|right|bottom|left")
    }
}

/// Per-widget defaults a [`DisclosureConfig`] starts from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisclosureDefaults {
    pub trigger_mode: TriggerMode,
    /// `None` for widgets that are not floated (dialogs, collapsibles).
    pub placement: Option<Placement>,
    pub modal: bool,
    pub close_on_outside_click: bool,
    pub close_on_overlay_click: bool,
    pub open_delay: Duration,
    pub close_delay: Duration,
    pub focus_on_open: bool,
}

impl Default for DisclosureDefaults {
    fn default() -> Self {
        Self::click()
    }
}

impl DisclosureDefaults {
    /// Click-triggered, non-modal, floated below the trigger.
    pub const fn click() -> Self {
        Self {
            trigger_mode: TriggerMode::Click,
            placement: None,
            modal: false,
            close_on_outside_click: true,
            close_on_overlay_click: false,
            open_delay: Duration::ZERO,
            close_delay: Duration::ZERO,
            focus_on_open: true,
        }
    }

    /// Hover-triggered with intent delays; never moves focus.
    pub const fn hover(open_delay_ms: u64, close_delay_ms: u64) -> Self {
        Self {
            trigger_mode: TriggerMode::Hover,
            open_delay: Duration::from_millis(open_delay_ms),
            close_delay: Duration::from_millis(close_delay_ms),
            focus_on_open: false,
            ..Self::click()
        }
    }

    /// Modal with overlay dismissal enabled.
    pub const fn modal() -> Self {
        Self {
            modal: true,
            close_on_outside_click: false,
            close_on_overlay_click: true,
            ..Self::click()
        }
    }

    #[must_use]
    pub const fn placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }

    #[must_use]
    pub const fn close_on_overlay_click(mut self, enabled: bool) -> Self {
        self.close_on_overlay_click = enabled;
        self
    }

    #[must_use]
    pub const fn focus_on_open(mut self, enabled: bool) -> Self {
        self.focus_on_open = enabled;
        self
    }
}

/// Resolved configuration of one disclosure instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisclosureConfig {
    pub trigger_mode: TriggerMode,
    pub placement: Option<Placement>,
    pub modal: bool,
    pub close_on_escape: bool,
    pub close_on_outside_click: bool,
    pub close_on_overlay_click: bool,
    pub open_delay: Duration,
    pub close_delay: Duration,
    pub animation: Duration,
    pub focus_on_open: bool,
    pub open_at_mount: bool,
}

impl From<DisclosureDefaults> for DisclosureConfig {
    fn from(defaults: DisclosureDefaults) -> Self {
        Self {
            trigger_mode: defaults.trigger_mode,
            placement: defaults.placement,
            modal: defaults.modal,
            close_on_escape: true,
            close_on_outside_click: defaults.close_on_outside_click,
            close_on_overlay_click: defaults.close_on_overlay_click,
            open_delay: defaults.open_delay,
            close_delay: defaults.close_delay,
            animation: Duration::ZERO,
            focus_on_open: defaults.focus_on_open,
            open_at_mount: false,
        }
    }
}

impl DisclosureConfig {
    /// Read every disclosure attribute, starting from `defaults`.
    pub fn read(attrs: &AttributeReader, defaults: DisclosureDefaults) -> Self {
        let base = Self::from(defaults);
        let trigger_mode = attrs.parsed("trigger", base.trigger_mode, "click|hover");
        let hover = trigger_mode == TriggerMode::Hover;
        Self {
            trigger_mode,
            placement: base.placement.map(|p| attrs.placement(p)),
            modal: attrs.bool("modal", base.modal),
            close_on_escape: attrs.bool("close-on-escape", base.close_on_escape),
            close_on_outside_click: attrs
                .bool("close-on-outside-click", base.close_on_outside_click),
            close_on_overlay_click: attrs
                .bool("close-on-overlay-click", base.close_on_overlay_click),
            open_delay: attrs.millis("open-delay", base.open_delay),
            close_delay: attrs.millis("close-delay", base.close_delay),
            animation: attrs.millis("animation-duration", base.animation),
            focus_on_open: base.focus_on_open && !hover,
            open_at_mount: attrs.bool("open", base.open_at_mount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dui_core::dom::El;
    use dui_core::geometry::Size;
    use dui_layout::Align;

    fn reader(attrs: &[(&str, &str)]) -> AttributeReader {
        let dom = Dom::new(Size::new(800.0, 600.0));
        let mut el = El::new("div").attr("data-controller", "ui--popover");
        for (name, value) in attrs {
            el = el.attr(format!("data-ui--popover-{name}-value"), *value);
        }
        let root = dom.mount(dom.body(), el);
        AttributeReader::new(&dom, root, "ui--popover")
    }

    #[test]
    fn bool_forms() {
        for (raw, want) in [
            ("true", Some(true)),
            ("YES", Some(true)),
            ("1", Some(true)),
            ("", Some(true)),
            ("false", Some(false)),
            ("No", Some(false)),
            ("0", Some(false)),
            ("maybe", None),
        ] {
            assert_eq!(parse_bool(raw), want, "{raw:?}");
        }
    }

    #[test]
    fn missing_attribute_uses_default() {
        let attrs = reader(&[]);
        assert!(attrs.bool("modal", true));
        assert_eq!(attrs.millis("open-delay", Duration::from_millis(5)), Duration::from_millis(5));
        assert_eq!(attrs.try_value("modal", "a boolean", parse_bool), Ok(None));
    }

    #[test]
    fn malformed_attribute_falls_back() {
        let attrs = reader(&[("offset", "wide"), ("open-delay", "-3")]);
        assert_eq!(attrs.number("offset", 4.0), 4.0);
        assert_eq!(attrs.millis("open-delay", Duration::ZERO), Duration::ZERO);
        let err = attrs
            .try_value("offset", "a number", parse_number)
            .unwrap_err();
        assert!(err.to_string().contains("data-ui--popover-offset-value"));
    }

    #[test]
    fn placement_combines_attributes() {
        let attrs = reader(&[
            ("placement", "top-start"),
            ("offset", "8"),
            ("flip", "false"),
            ("collision-padding", "-2"),
        ]);
        let p = attrs.placement(Placement::default());
        assert_eq!(p.side, Side::Top);
        assert_eq!(p.align, Align::Start);
        assert_eq!(p.offset, 8.0);
        assert!(!p.flip);
        assert_eq!(p.collision_padding, 0.0);
    }

    #[test]
    fn bad_placement_keeps_default_side() {
        let attrs = reader(&[("placement", "sideways")]);
        let p = attrs.placement(Placement::new(Side::Top));
        assert_eq!(p.side, Side::Top);
    }

    #[test]
    fn list_values() {
        let attrs = reader(&[("value", " a, ,b ,c")]);
        assert_eq!(attrs.list("value"), vec!["a", "b", "c"]);
        assert!(reader(&[]).list("value").is_empty());
    }

    #[test]
    fn disclosure_config_reads_overrides() {
        let attrs = reader(&[
            ("modal", "true"),
            ("close-on-escape", "false"),
            ("open-delay", "250"),
            ("animation-duration", "150"),
            ("open", ""),
        ]);
        let defaults = DisclosureDefaults::click().placement(Placement::default());
        let config = DisclosureConfig::read(&attrs, defaults);
        assert!(config.modal);
        assert!(!config.close_on_escape);
        assert_eq!(config.open_delay, Duration::from_millis(250));
        assert_eq!(config.animation, Duration::from_millis(150));
        assert!(config.open_at_mount);
        assert!(config.placement.is_some());
    }

    #[test]
    fn hover_trigger_disables_focus_movement() {
        let attrs = reader(&[("trigger", "hover")]);
        let config = DisclosureConfig::read(&attrs, DisclosureDefaults::click());
        assert_eq!(config.trigger_mode, TriggerMode::Hover);
        assert!(!config.focus_on_open);
        assert!(config.placement.is_none());
    }

    #[test]
    fn enum_parsers() {
        assert_eq!("Hover".parse::<TriggerMode>(), Ok(TriggerMode::Hover));
        assert_eq!("horizontal".parse::<Orientation>(), Ok(Orientation::Horizontal));
        assert_eq!("multiple".parse::<SelectionMode>(), Ok(SelectionMode::Multiple));
        assert_eq!("manual".parse::<Activation>(), Ok(Activation::Manual));
        assert!("diagonal".parse::<Orientation>().is_err());
    }
}

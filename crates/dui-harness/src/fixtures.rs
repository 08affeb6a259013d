#![forbid(unsafe_code)]

//! Reference markup for every widget, shaped like the server-rendered
//! templates the runtime mounts against.
//!
//! Each builder returns the root [`El`]; value attributes are appended with
//! [`with_values`]. Layout rects are set on triggers and content so that
//! positioning has something to measure.

use dui_core::dom::El;
use dui_core::geometry::Rect;

/// `data-<identifier>-target` attribute name.
pub fn target_attr(identifier: &str) -> String {
    format!("data-{identifier}-target")
}

/// Add `data-<identifier>-<name>-value` attributes to `root`.
pub fn with_values(mut root: El, identifier: &str, values: &[(&str, &str)]) -> El {
    for (name, value) in values {
        root = root.attr(format!("data-{identifier}-{name}-value"), *value);
    }
    root
}

fn controller(identifier: &str) -> El {
    El::new("div").attr("data-controller", identifier)
}

/// Trigger and content for popover, tooltip and hover card.
pub fn floating(identifier: &str, trigger: Rect, values: &[(&str, &str)]) -> El {
    let t = target_attr(identifier);
    with_values(controller(identifier), identifier, values).children([
        El::new("button").attr(t.as_str(), "trigger").text("Open").rect(trigger),
        El::new("div")
            .attr(t.as_str(), "content")
            .rect(Rect::new(0.0, 0.0, 200.0, 80.0))
            .children([
                El::new("input").attr("type", "text"),
                El::new("button").attr(t.as_str(), "close").text("Close"),
            ]),
    ])
}

/// Dialog family: trigger, overlay and content with title, description,
/// cancel, action and close.
pub fn dialog(identifier: &str, values: &[(&str, &str)]) -> El {
    let t = target_attr(identifier);
    let part = |name: &str, tag: &str| El::new(tag).attr(t.as_str(), name);
    with_values(controller(identifier), identifier, values).children([
        part("trigger", "button").text("Open"),
        part("overlay", "div"),
        part("content", "div").children([
            part("title", "h2").text("Are you absolutely sure?"),
            part("description", "p").text("This action cannot be undone."),
            part("cancel", "button").text("Cancel"),
            part("action", "button").text("Continue"),
            part("close", "button").text("Close"),
        ]),
    ])
}

/// Dropdown menu with plain items, a checkbox item and a submenu.
pub fn dropdown_menu(values: &[(&str, &str)]) -> El {
    let id = "ui--dropdown-menu";
    let t = target_attr(id);
    let item = |name: &str, label: &str| El::new("div").attr(t.as_str(), name).text(label);
    with_values(controller(id), id, values).children([
        El::new("button")
            .attr(t.as_str(), "trigger")
            .text("Options")
            .rect(Rect::new(20.0, 20.0, 90.0, 30.0)),
        El::new("div")
            .attr(t.as_str(), "content")
            .rect(Rect::new(0.0, 0.0, 180.0, 160.0))
            .children([
                item("item", "Profile"),
                item("item", "Billing").flag("data-disabled"),
                item("checkbox-item", "Show status bar"),
                El::new("div").attr(t.as_str(), "sub").children([
                    item("sub-trigger", "Invite users"),
                    El::new("div")
                        .attr(t.as_str(), "sub-content")
                        .rect(Rect::new(0.0, 0.0, 140.0, 60.0))
                        .children([item("item", "Email"), item("item", "Message")]),
                ]),
                item("item", "Log out"),
            ]),
    ])
}

/// Context menu over a 400x300 area.
pub fn context_menu() -> El {
    let id = "ui--context-menu";
    let t = target_attr(id);
    controller(id).children([
        El::new("div")
            .attr(t.as_str(), "trigger")
            .text("Right click here")
            .rect(Rect::new(0.0, 0.0, 400.0, 300.0)),
        El::new("div")
            .attr(t.as_str(), "content")
            .rect(Rect::new(0.0, 0.0, 150.0, 90.0))
            .children(
                ["Back", "Forward", "Reload"]
                    .map(|label| El::new("div").attr(t.as_str(), "item").text(label)),
            ),
    ])
}

/// Menubar with one menu per `(label, items)` pair.
pub fn menubar(menus: &[(&str, &[&str])]) -> El {
    let id = "ui--menubar";
    let t = target_attr(id);
    controller(id).children(menus.iter().enumerate().map(|(i, (label, items))| {
        El::new("div").attr(t.as_str(), "menu").children([
            El::new("button")
                .attr(t.as_str(), "trigger")
                .text(*label)
                .rect(Rect::new(i as f64 * 60.0, 0.0, 60.0, 24.0)),
            El::new("div")
                .attr(t.as_str(), "content")
                .rect(Rect::new(0.0, 0.0, 140.0, 100.0))
                .children(
                    items
                        .iter()
                        .map(|label| El::new("div").attr(t.as_str(), "item").text(*label)),
                ),
        ])
    }))
}

/// Navigation menu with two panels and one plain link.
pub fn navigation_menu() -> El {
    let id = "ui--navigation-menu";
    let t = target_attr(id);
    let panel = |label: &str, x: f64, links: &[&str]| {
        El::new("li").attr(t.as_str(), "item").children([
            El::new("button")
                .attr(t.as_str(), "trigger")
                .text(label)
                .rect(Rect::new(x, 0.0, 120.0, 40.0)),
            El::new("div")
                .attr(t.as_str(), "content")
                .rect(Rect::new(0.0, 0.0, 300.0, 200.0))
                .children(links.iter().map(|l| {
                    El::new("a").attr(t.as_str(), "link").attr("href", "#").text(*l)
                })),
        ])
    };
    El::new("nav").attr("data-controller", id).children([
        panel("Getting started", 0.0, &["Introduction", "Installation", "Typography"]),
        panel("Components", 120.0, &["Alert Dialog", "Hover Card", "Progress"]),
        El::new("li")
            .attr(t.as_str(), "item")
            .child(El::new("a").attr("href", "/docs").text("Documentation")),
    ])
}

/// Select over `(value, label, disabled)` options.
pub fn select(options: &[(&str, &str, bool)], values: &[(&str, &str)]) -> El {
    let id = "ui--select";
    let t = target_attr(id);
    with_values(controller(id), id, values).children([
        El::new("button")
            .attr(t.as_str(), "trigger")
            .rect(Rect::new(10.0, 10.0, 180.0, 36.0))
            .child(El::new("span").attr(t.as_str(), "value").text("Select a fruit")),
        El::new("input").attr(t.as_str(), "input").attr("type", "hidden"),
        El::new("div")
            .attr(t.as_str(), "content")
            .rect(Rect::new(0.0, 0.0, 180.0, 160.0))
            .children(options.iter().map(|(value, label, disabled)| {
                let option = El::new("div")
                    .attr(t.as_str(), "option")
                    .attr("data-value", *value)
                    .text(*label);
                if *disabled { option.flag("data-disabled") } else { option }
            })),
    ])
}

/// Combobox over `(value, label)` options with an empty state.
pub fn combobox(options: &[(&str, &str)]) -> El {
    let id = "ui--combobox";
    let t = target_attr(id);
    controller(id).children([
        El::new("input")
            .attr(t.as_str(), "input")
            .attr("placeholder", "Search framework...")
            .rect(Rect::new(10.0, 10.0, 200.0, 36.0)),
        El::new("div")
            .attr(t.as_str(), "content")
            .rect(Rect::new(0.0, 0.0, 200.0, 180.0))
            .children(
                options
                    .iter()
                    .map(|(value, label)| {
                        El::new("div")
                            .attr(t.as_str(), "option")
                            .attr("data-value", *value)
                            .text(*label)
                    })
                    .chain([El::new("div").attr(t.as_str(), "empty").text("No framework found.")]),
            ),
    ])
}

/// Palette body shared by `ui--command` and `ui--command-dialog`.
fn palette(identifier: &str) -> Vec<El> {
    let t = target_attr(identifier);
    let part = |name: &str, tag: &str| El::new(tag).attr(t.as_str(), name);
    vec![
        part("input", "input").attr("placeholder", "Type a command or search..."),
        part("list", "div").children([
            part("group", "div").attr("data-heading", "Suggestions").children([
                part("item", "div").text("Calendar"),
                part("item", "div").text("Search Emoji").attr("data-keywords", "smiley face"),
                part("item", "div").text("Calculator").flag("data-disabled"),
            ]),
            part("group", "div").attr("data-heading", "Settings").children([
                part("item", "div").text("Profile"),
                part("item", "div").text("Billing"),
                part("item", "div").text("Settings").attr("data-value", "settings"),
            ]),
        ]),
        part("empty", "div").text("No results found."),
    ]
}

/// Inline command palette.
pub fn command() -> El {
    controller("ui--command").children(palette("ui--command"))
}

/// Command palette inside a modal dialog.
pub fn command_dialog() -> El {
    let id = "ui--command-dialog";
    let t = target_attr(id);
    controller(id).children([
        El::new("div").attr(t.as_str(), "overlay"),
        El::new("div").attr(t.as_str(), "content").children(palette(id)),
    ])
}

/// Accordion with one section per value.
pub fn accordion(sections: &[&str], values: &[(&str, &str)]) -> El {
    let id = "ui--accordion";
    let t = target_attr(id);
    with_values(controller(id), id, values).children(sections.iter().map(|value| {
        El::new("div")
            .attr(t.as_str(), "item")
            .attr("data-value", *value)
            .children([
                El::new("button").attr(t.as_str(), "trigger").text(format!("Section {value}")),
                El::new("div").attr(t.as_str(), "content").text("Yes."),
            ])
    }))
}

/// Tabs with one trigger/panel pair per value.
pub fn tabs(tabs: &[&str], values: &[(&str, &str)]) -> El {
    let id = "ui--tabs";
    let t = target_attr(id);
    with_values(controller(id), id, values)
        .child(El::new("div").attr(t.as_str(), "list").children(tabs.iter().map(|v| {
            El::new("button")
                .attr(t.as_str(), "trigger")
                .attr("data-value", *v)
                .text(*v)
        })))
        .children(tabs.iter().map(|v| {
            El::new("div")
                .attr(t.as_str(), "content")
                .attr("data-value", *v)
                .text(format!("{v} panel"))
        }))
}

/// Toggle group of `kind` (`single`/`multiple`) over `items`.
pub fn toggle_group(kind: &str, items: &[&str]) -> El {
    let id = "ui--toggle-group";
    let t = target_attr(id);
    with_values(controller(id), id, &[("type", kind)]).children(items.iter().map(|v| {
        El::new("button")
            .attr(t.as_str(), "item")
            .attr("data-value", *v)
            .text(*v)
    }))
}

/// Collapsible with a trigger and content.
pub fn collapsible(values: &[(&str, &str)]) -> El {
    let id = "ui--collapsible";
    let t = target_attr(id);
    with_values(controller(id), id, values).children([
        El::new("button").attr(t.as_str(), "trigger").text("Toggle"),
        El::new("div").attr(t.as_str(), "content").text("@radix-ui/primitives"),
    ])
}

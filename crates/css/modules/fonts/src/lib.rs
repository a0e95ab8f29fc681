//! CSS Fonts Module Level 4 — `font` shorthand fusion.
//! Spec: <https://www.w3.org/TR/css-fonts-4/#font-prop>

#![forbid(unsafe_code)]

use css_syntax::values::{LonghandSlots, replace_with_shorthand};
use css_syntax::{Declaration, Node, for_each_rule_body_mut};

/// Contributors to the `font` shorthand, in output order.
pub const FONT_LONGHANDS: [&str; 7] = [
    "font-style",
    "font-variant",
    "font-weight",
    "font-stretch",
    "font-size",
    "line-height",
    "font-family",
];

const STYLE: usize = 0;
const VARIANT: usize = 1;
const WEIGHT: usize = 2;
const STRETCH: usize = 3;
const SIZE: usize = 4;
const LINE_HEIGHT: usize = 5;
const FAMILY: usize = 6;

/// `font-stretch` values the shorthand accepts.
/// Spec: Section 2.3 — Font width: the font-stretch property
const STRETCH_KEYWORDS: [&str; 9] = [
    "normal",
    "ultra-condensed",
    "extra-condensed",
    "condensed",
    "semi-condensed",
    "semi-expanded",
    "expanded",
    "extra-expanded",
    "ultra-expanded",
];

/// Whether the shorthand can carry this longhand value.
fn expressible(position: usize, value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    match position {
        VARIANT => lowered == "normal" || lowered == "small-caps",
        STRETCH => STRETCH_KEYWORDS.contains(&lowered.as_str()),
        _ => !lowered.is_empty(),
    }
}

/// Build `[style] [variant] [weight] [stretch] size[/line-height] family`.
fn font_value(slots: &LonghandSlots, body: &[Node]) -> Option<String> {
    let size = slots.value(body, SIZE)?;
    let family = slots.value(body, FAMILY)?;
    let mut parts: Vec<String> = [STYLE, VARIANT, WEIGHT, STRETCH]
        .into_iter()
        .filter_map(|position| slots.value(body, position))
        .map(str::to_owned)
        .collect();
    match slots.value(body, LINE_HEIGHT) {
        Some(line_height) => parts.push(format!("{size}/{line_height}")),
        None => parts.push(size.to_owned()),
    }
    parts.push(family.to_owned());
    Some(parts.join(" "))
}

/// Fuse the font longhands of one rule body. Returns true when fused.
fn fuse_body(body: &mut Vec<Node>) -> bool {
    let Some(slots) = LonghandSlots::locate(body, &FONT_LONGHANDS) else {
        return false;
    };
    let Some(anchor) = slots.slot(FAMILY) else {
        return false;
    };
    if slots.slot(SIZE).is_none() {
        return false;
    }
    let representable = (0..FONT_LONGHANDS.len()).all(|position| {
        slots
            .value(body, position)
            .is_none_or(|value| expressible(position, value))
    });
    if !representable || slots.has_interference(body, |name| name.starts_with("font")) {
        return false;
    }
    let Some(important) = slots.shared_importance(body) else {
        return false;
    };
    let Some(value) = font_value(&slots, body) else {
        return false;
    };
    let mut fused = Declaration::new("font", &value);
    fused.important = important;
    replace_with_shorthand(body, &slots.indices(), anchor, fused);
    true
}

/// Fuse font longhands in every rule under `nodes`. Returns the number of
/// `font` shorthands created.
pub fn optimize_fonts(nodes: &mut [Node]) -> usize {
    let mut fused: usize = 0;
    for_each_rule_body_mut(nodes, &mut |body| {
        if fuse_body(body) {
            fused = fused.saturating_add(1);
        }
    });
    fused
}

//! Border, border-image and border-radius longhand fusion.
//! Spec: Sections 4–6 — Borders, Border Images, Rounded Corners

use css_syntax::values::{LonghandSlots, replace_with_shorthand, split_top_level_whitespace};
use css_syntax::{Declaration, Node, for_each_rule_body_mut};

/// Border directions, the unprefixed `border` first.
pub const BORDER_DIRECTIONS: [&str; 11] = [
    "",
    "top",
    "right",
    "bottom",
    "left",
    "inline",
    "inline-start",
    "inline-end",
    "block",
    "block-start",
    "block-end",
];

/// `border-image` longhands in shorthand order.
/// Spec: Section 6.6 — The border-image shorthand
pub const BORDER_IMAGE_LONGHANDS: [&str; 5] = [
    "border-image-source",
    "border-image-slice",
    "border-image-width",
    "border-image-outset",
    "border-image-repeat",
];

/// Corner radius longhands: top-left, top-right, bottom-right, bottom-left.
pub const RADIUS_LONGHANDS: [&str; 4] = [
    "border-top-left-radius",
    "border-top-right-radius",
    "border-bottom-right-radius",
    "border-bottom-left-radius",
];

/// What a border pass fused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BorderReport {
    pub sides: usize,
    pub images: usize,
    pub radii: usize,
}

/// `border` or `border-<direction>`.
fn side_shorthand(direction: &str) -> String {
    if direction.is_empty() {
        "border".to_owned()
    } else {
        format!("border-{direction}")
    }
}

/// Border properties a side shorthand could reorder across.
fn is_side_family(name: &str) -> bool {
    name.starts_with("border")
        && !name.ends_with("-radius")
        && !name.starts_with("border-image")
        && name != "border-collapse"
        && name != "border-spacing"
}

/// Shared guards: every present value passes `accept`, importance is uniform
/// and nothing in `interferes` sits before the last contributor.
fn checked_importance<A, I>(slots: &LonghandSlots, body: &[Node], accept: A, interferes: I) -> Option<bool>
where
    A: Fn(&str) -> bool,
    I: Fn(&str) -> bool,
{
    let accepted = (0..slots.slots.len())
        .filter_map(|position| slots.value(body, position))
        .all(accept);
    if !accepted || slots.has_interference(body, interferes) {
        return None;
    }
    slots.shared_importance(body)
}

#[inline]
fn is_single_token(value: &str) -> bool {
    split_top_level_whitespace(value).len() == 1
}

/// Fuse `border[-direction]-{width,style,color}` when all three are present.
fn fuse_side(body: &mut Vec<Node>, direction: &str) -> bool {
    let shorthand = side_shorthand(direction);
    let longhands = [
        format!("{shorthand}-width"),
        format!("{shorthand}-style"),
        format!("{shorthand}-color"),
    ];
    let names: Vec<&str> = longhands.iter().map(String::as_str).collect();
    let Some(slots) = LonghandSlots::locate(body, &names) else {
        return false;
    };
    if slots.present() != names.len() {
        return false;
    }
    let resets_image = direction.is_empty();
    let Some(important) = checked_importance(&slots, body, is_single_token, |name| {
        is_side_family(name) || (resets_image && name.starts_with("border-image"))
    }) else {
        return false;
    };
    let values: Vec<&str> = (0..names.len())
        .filter_map(|position| slots.value(body, position))
        .collect();
    let mut fused = Declaration::new(&shorthand, &values.join(" "));
    fused.important = important;
    let contributors = slots.indices();
    let Some(&anchor) = contributors.last() else {
        return false;
    };
    replace_with_shorthand(body, &contributors, anchor, fused);
    true
}

/// `<source> <slice> [/ <width>? [/ <outset>]?]? <repeat>`; `None` when width
/// or outset appear without a slice.
fn border_image_value(parts: [Option<&str>; 5]) -> Option<String> {
    let [source, slice, width, outset, repeat] = parts;
    let mut out: Vec<String> = Vec::new();
    out.extend(source.map(str::to_owned));
    match (slice, width, outset) {
        (None, None, None) => {}
        (None, _, _) => return None,
        (Some(slice), None, None) => out.push(slice.to_owned()),
        (Some(slice), Some(width), None) => out.push(format!("{slice} / {width}")),
        (Some(slice), None, Some(outset)) => out.push(format!("{slice} / / {outset}")),
        (Some(slice), Some(width), Some(outset)) => out.push(format!("{slice} / {width} / {outset}")),
    }
    out.extend(repeat.map(str::to_owned));
    Some(out.join(" "))
}

fn fuse_border_image(body: &mut Vec<Node>) -> bool {
    let Some(slots) = LonghandSlots::locate(body, &BORDER_IMAGE_LONGHANDS) else {
        return false;
    };
    if slots.present() < 2 {
        return false;
    }
    let Some(important) = checked_importance(&slots, body, |_| true, |name| {
        name == "border-image" || name == "border"
    }) else {
        return false;
    };
    let parts = [0, 1, 2, 3, 4].map(|position| slots.value(body, position));
    let Some(value) = border_image_value(parts) else {
        return false;
    };
    let mut fused = Declaration::new("border-image", &value);
    fused.important = important;
    let contributors = slots.indices();
    let Some(&anchor) = contributors.last() else {
        return false;
    };
    replace_with_shorthand(body, &contributors, anchor, fused);
    true
}

/// Fuse the four corner radii as `<top-left> <top-right> / <bottom-right> <bottom-left>`.
fn fuse_radius(body: &mut Vec<Node>) -> bool {
    let Some(slots) = LonghandSlots::locate(body, &RADIUS_LONGHANDS) else {
        return false;
    };
    if slots.present() != RADIUS_LONGHANDS.len() {
        return false;
    }
    let Some(important) = checked_importance(&slots, body, is_single_token, |name| {
        name == "border-radius"
    }) else {
        return false;
    };
    let [Some(top_left), Some(top_right), Some(bottom_right), Some(bottom_left)] =
        [0, 1, 2, 3].map(|position| slots.value(body, position))
    else {
        return false;
    };
    let value = format!("{top_left} {top_right} / {bottom_right} {bottom_left}");
    let mut fused = Declaration::new("border-radius", &value);
    fused.important = important;
    let contributors = slots.indices();
    let Some(&anchor) = contributors.last() else {
        return false;
    };
    replace_with_shorthand(body, &contributors, anchor, fused);
    true
}

/// Fuse border longhands in every rule under `nodes`.
pub fn optimize_borders(nodes: &mut [Node]) -> BorderReport {
    let mut report = BorderReport::default();
    for_each_rule_body_mut(nodes, &mut |body| {
        for direction in BORDER_DIRECTIONS {
            if fuse_side(body, direction) {
                report.sides = report.sides.saturating_add(1);
            }
        }
        if fuse_border_image(body) {
            report.images = report.images.saturating_add(1);
        }
        if fuse_radius(body) {
            report.radii = report.radii.saturating_add(1);
        }
    });
    report
}

//! Background value normalization and longhand fusion.
//! Spec: Section 3 — Backgrounds

use css_syntax::values::{
    LonghandSlots, find_declaration, is_multi_layer, replace_with_shorthand,
    split_top_level_commas, split_top_level_whitespace,
};
use css_syntax::{Declaration, Node, for_each_rule_body_mut};

/// Longhands folded into `background`, in output order.
pub const BACKGROUND_LONGHANDS: [&str; 4] = [
    "background-color",
    "background-image",
    "background-repeat",
    "background-position",
];

/// Two-value `<repeat-style>` pairs and their one-value equivalents.
/// Spec: Section 3.4 — Tiling images: the background-repeat property
const REPEAT_PAIRS: [(&str, &str, &str); 4] = [
    ("repeat", "no-repeat", "repeat-x"),
    ("no-repeat", "repeat", "repeat-y"),
    ("repeat", "repeat", "repeat"),
    ("no-repeat", "no-repeat", "no-repeat"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
    Either,
}

/// Percentage and axis of a position keyword.
fn position_keyword(token: &str) -> Option<(&'static str, Axis)> {
    match token.to_ascii_lowercase().as_str() {
        "left" => Some(("0%", Axis::Horizontal)),
        "right" => Some(("100%", Axis::Horizontal)),
        "top" => Some(("0%", Axis::Vertical)),
        "bottom" => Some(("100%", Axis::Vertical)),
        "center" => Some(("50%", Axis::Either)),
        _ => None,
    }
}

/// Collapse adjacent repeat keyword pairs, left to right, non-overlapping.
pub fn collapse_repeat(value: &str) -> String {
    let tokens = split_top_level_whitespace(value);
    let mut out: Vec<&str> = Vec::with_capacity(tokens.len());
    let mut index = 0;
    while let Some(&token) = tokens.get(index) {
        let next = tokens.get(index.saturating_add(1)).copied();
        let collapsed = next.and_then(|second| {
            REPEAT_PAIRS
                .iter()
                .find(|(left, right, _)| token.eq_ignore_ascii_case(left) && second.eq_ignore_ascii_case(right))
                .map(|(_, _, single)| *single)
        });
        if let Some(single) = collapsed {
            out.push(single);
            index = index.saturating_add(2);
        } else {
            out.push(token);
            index = index.saturating_add(1);
        }
    }
    out.join(" ")
}

/// Percentages for a run of one or two position keywords, horizontal first.
/// Returns `None` for runs that are not a valid keyword position.
fn keyword_position(run: &[&str]) -> Option<[&'static str; 2]> {
    match run {
        [single] => {
            let (percent, axis) = position_keyword(single)?;
            Some(match axis {
                Axis::Horizontal => [percent, "50%"],
                Axis::Vertical => ["50%", percent],
                Axis::Either => ["50%", "50%"],
            })
        }
        [first, second] => {
            let (first_percent, first_axis) = position_keyword(first)?;
            let (second_percent, second_axis) = position_keyword(second)?;
            match (first_axis, second_axis) {
                (Axis::Horizontal, Axis::Horizontal) | (Axis::Vertical, Axis::Vertical) => None,
                (Axis::Vertical, _) | (_, Axis::Horizontal) => Some([second_percent, first_percent]),
                _ => Some([first_percent, second_percent]),
            }
        }
        _ => None,
    }
}

/// Rewrite keyword positions inside one background layer.
///
/// Only a run of one or two consecutive keywords that is not adjacent to
/// another position component (a length or percentage) is rewritten, so
/// offset forms such as `right 10px top` are left alone.
fn normalize_layer_position(layer: &str) -> String {
    let tokens = split_top_level_whitespace(layer);
    let mut out: Vec<String> = Vec::with_capacity(tokens.len());
    let mut index = 0;
    while index < tokens.len() {
        let end = tokens
            .iter()
            .skip(index)
            .take_while(|token| position_keyword(token).is_some())
            .count()
            .saturating_add(index);
        if end == index {
            out.extend(tokens.get(index).map(|token| (*token).to_owned()));
            index = index.saturating_add(1);
            continue;
        }
        let run = tokens.get(index..end).unwrap_or_default();
        let touches_offset = [index.checked_sub(1), Some(end)]
            .into_iter()
            .flatten()
            .filter_map(|neighbour| tokens.get(neighbour))
            .any(|token| is_length_percentage(token));
        match keyword_position(run) {
            Some(pair) if !touches_offset => out.extend(pair.map(str::to_owned)),
            _ => out.extend(run.iter().map(|token| (*token).to_owned())),
        }
        index = end;
    }
    out.join(" ")
}

/// `10px`, `-5%`, `0`, `1.5em`, `calc(…)`.
fn is_length_percentage(token: &str) -> bool {
    token.starts_with(|ch: char| ch.is_ascii_digit() || ch == '.' || ch == '-' || ch == '+')
        || token.starts_with("calc(")
}

/// Normalize position keywords in every comma-separated layer of `value`.
pub fn normalize_position(value: &str) -> String {
    per_layer(value, normalize_layer_position)
}

/// Apply `rewrite` to every comma-separated layer of `value`.
fn per_layer(value: &str, rewrite: fn(&str) -> String) -> String {
    split_top_level_commas(value)
        .into_iter()
        .map(rewrite)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rewrite repeat pairs and position keywords in the background declarations of one rule body.
fn normalize_values(body: &mut [Node]) {
    for node in body.iter_mut() {
        let Node::Declaration(declaration) = node else {
            continue;
        };
        let rewritten = match declaration.property.as_str() {
            "background" => per_layer(&declaration.value, |layer| {
                normalize_layer_position(&collapse_repeat(layer))
            }),
            "background-repeat" => per_layer(&declaration.value, collapse_repeat),
            "background-position" => normalize_position(&declaration.value),
            _ => continue,
        };
        declaration.value = rewritten;
    }
}

/// Fuse background longhands of one rule body. Returns true when fused.
fn fuse_body(body: &mut Vec<Node>) -> bool {
    let Some(slots) = LonghandSlots::locate(body, &BACKGROUND_LONGHANDS) else {
        return false;
    };
    if slots.present() < 2 || find_declaration(body, "background").is_some() {
        return false;
    }
    let Some(important) = slots.shared_importance(body) else {
        return false;
    };
    let values: Vec<&str> = (0..BACKGROUND_LONGHANDS.len())
        .filter_map(|position| slots.value(body, position))
        .collect();
    if values.iter().any(|value| is_multi_layer(value)) {
        return false;
    }
    if slots.has_interference(body, |name| name.starts_with("background")) {
        return false;
    }
    let mut shorthand = Declaration::new("background", &values.join(" "));
    shorthand.important = important;
    let contributors = slots.indices();
    let Some(&anchor) = contributors.last() else {
        return false;
    };
    replace_with_shorthand(body, &contributors, anchor, shorthand);
    true
}

/// Normalize background values and fuse background longhands in every rule
/// under `nodes`. Returns the number of `background` shorthands created.
pub fn optimize_backgrounds(nodes: &mut [Node]) -> usize {
    let mut fused: usize = 0;
    for_each_rule_body_mut(nodes, &mut |body| {
        normalize_values(body);
        if fuse_body(body) {
            fused = fused.saturating_add(1);
        }
    });
    fused
}

#[cfg(test)]
mod tests {
    use super::*;
    use css_syntax::{OutputStyle, parse_stylesheet};

    fn run(css: &str) -> String {
        let mut doc = parse_stylesheet(css);
        optimize_backgrounds(&mut doc.nodes);
        doc.to_css(OutputStyle::Pretty)
    }

    #[test]
    fn repeat_pairs_collapse() {
        assert_eq!(collapse_repeat("repeat no-repeat"), "repeat-x");
        assert_eq!(collapse_repeat("no-repeat repeat"), "repeat-y");
        assert_eq!(collapse_repeat("repeat repeat"), "repeat");
        assert_eq!(collapse_repeat("no-repeat no-repeat"), "no-repeat");
        assert_eq!(collapse_repeat("repeat repeat no-repeat"), "repeat no-repeat");
        assert_eq!(collapse_repeat("space round"), "space round");
    }

    #[test]
    fn positions_become_percentages() {
        assert_eq!(normalize_position("left top"), "0% 0%");
        assert_eq!(normalize_position("left"), "0% 50%");
        assert_eq!(normalize_position("bottom"), "50% 100%");
        assert_eq!(normalize_position("center"), "50% 50%");
        assert_eq!(normalize_position("top right"), "100% 0%");
        assert_eq!(normalize_position("center left"), "0% 50%");
        assert_eq!(normalize_position("right 10px top"), "right 10px top");
        assert_eq!(normalize_position("left left"), "left left");
        assert_eq!(normalize_position("left, bottom right"), "0% 50%, 100% 100%");
    }

    #[test]
    fn single_longhands_are_normalized_in_place() {
        assert_eq!(
            run(".a { background-repeat: repeat no-repeat; }"),
            ".a {\n\tbackground-repeat: repeat-x;\n}"
        );
        assert_eq!(
            run(".a { background-position: left; }"),
            ".a {\n\tbackground-position: 0% 50%;\n}"
        );
    }

    #[test]
    fn shorthand_values_are_normalized() {
        assert_eq!(
            run(".a { background: url(x.png) repeat no-repeat left top; }"),
            ".a {\n\tbackground: url(x.png) repeat-x 0% 0%;\n}"
        );
        assert_eq!(
            run(".a { background: url(x.png) left / cover; }"),
            ".a {\n\tbackground: url(x.png) 0% 50% / cover;\n}"
        );
    }

    #[test]
    fn longhands_fuse_in_fixed_order() {
        assert_eq!(
            run(".a { background-image: url(x.png); background-repeat: repeat no-repeat; }"),
            ".a {\n\tbackground: url(x.png) repeat-x;\n}"
        );
        assert_eq!(
            run(".a { background-color: red; background-position: left top; }"),
            ".a {\n\tbackground: red 0% 0%;\n}"
        );
        assert_eq!(
            run(
                ".a { background-color: red; background-image: url(x.png); background-repeat: repeat no-repeat; background-position: left top; }"
            ),
            ".a {\n\tbackground: red url(x.png) repeat-x 0% 0%;\n}"
        );
        assert_eq!(
            run(".a { background-position: left top; color: blue; background-color: red; }"),
            ".a {\n\tcolor: blue;\n\tbackground: red 0% 0%;\n}"
        );
    }

    #[test]
    fn single_contributor_is_unchanged() {
        assert_eq!(
            run(".a { background-color: red; }"),
            ".a {\n\tbackground-color: red;\n}"
        );
    }

    #[test]
    fn unsafe_groups_are_left_alone() {
        let untouched = [
            ".a {\n\tbackground-color: red;\n\tbackground-color: blue;\n\tbackground-image: none;\n}",
            ".a {\n\tbackground-color: red !important;\n\tbackground-image: none;\n}",
            ".a {\n\tbackground-color: red;\n\tbackground-size: cover;\n\tbackground-image: none;\n}",
            ".a {\n\tbackground: blue;\n\tbackground-color: red;\n\tbackground-image: none;\n}",
            ".a {\n\tbackground-image: url(a.png), url(b.png);\n\tbackground-color: red;\n}",
        ];
        for css in untouched {
            assert_eq!(run(css), css);
        }
    }

    #[test]
    fn fusion_is_idempotent_and_reaches_nested_rules() {
        let once = run("@media print { .a { background-color: red; background-image: none; } }");
        assert_eq!(once, "@media print {\n\t.a {\n\t\tbackground: red none;\n\t}\n}");
        assert_eq!(run(&once), once);
    }
}

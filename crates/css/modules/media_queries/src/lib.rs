//! Media Queries Level 4 — Grouping and ordering of `@media` blocks.
//! Spec: <https://www.w3.org/TR/mediaqueries-4/>
//!
//! Blocks with identical condition text are merged and the merged blocks are
//! re-emitted so that mobile-first viewport bounds come first and print
//! styles come last.

#![forbid(unsafe_code)]

use core::cmp::Ordering;
use css_syntax::{ConditionalBlock, LayerBlock, Node};
use once_cell::sync::Lazy;
use regex::Regex;

/// Preference media features, in emission order.
/// Spec: Section 12 — User preference media features
pub const PREFERENCE_FEATURES: [&str; 5] = [
    "prefers-color-scheme",
    "prefers-reduced-motion",
    "prefers-contrast",
    "prefers-reduced-transparency",
    "prefers-reduced-data",
];

/// Pixels per `em`/`rem` when comparing magnitudes across units.
const EM_IN_PX: f64 = 16.0;

static WORD_PRINT: Lazy<Option<Regex>> = Lazy::new(|| compile(r"\bprint\b"));
static WORD_SCREEN: Lazy<Option<Regex>> = Lazy::new(|| compile(r"\bscreen\b"));
static WORD_ALL: Lazy<Option<Regex>> = Lazy::new(|| compile(r"\ball\b"));
static PREFERENCE: Lazy<Option<Regex>> = Lazy::new(|| compile(r"\b(prefers-[a-z-]+)"));
static MIN_FEATURE: Lazy<Option<Regex>> = Lazy::new(|| compile(r"\bmin-[a-z-]+\s*:"));
static MAX_FEATURE: Lazy<Option<Regex>> = Lazy::new(|| compile(r"\bmax-[a-z-]+\s*:"));
static FEATURE_GROUP: Lazy<Option<Regex>> = Lazy::new(|| compile(r"\(([^()]*)\)"));
static COMPARISON: Lazy<Option<Regex>> = Lazy::new(|| compile(r"<=|>=|<|>"));
static MAGNITUDE: Lazy<Option<Regex>> = Lazy::new(|| compile(r"(\d*\.\d+|\d+)([a-z%]*)"));

/// Compile a built-in pattern; a pattern that fails to compile never matches.
fn compile(source: &str) -> Option<Regex> {
    match Regex::new(source) {
        Ok(regex) => Some(regex),
        Err(err) => {
            log::error!(target: "css_media_queries", "invalid built-in pattern `{source}`: {err}");
            None
        }
    }
}

#[inline]
fn is_match(pattern: &Lazy<Option<Regex>>, text: &str) -> bool {
    pattern.as_ref().is_some_and(|regex| regex.is_match(text))
}

/// Ordering class of a media condition, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum MediaBucket {
    /// Only lower bounds (`min-width`, `width >= …`).
    MinBound,
    /// Only upper bounds (`max-width`, `width < …`).
    MaxBound,
    /// Both bounds.
    Range,
    Screen,
    All,
    /// Conditions matching none of the other classes.
    Other,
    /// Index into [`PREFERENCE_FEATURES`]; unknown `prefers-*` features sort after the table.
    Preference(usize),
    Print,
}

/// Sort key of a merged block: bucket first, then summed magnitude.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MediaOrder {
    pub bucket: MediaBucket,
    pub magnitude: f64,
}

impl MediaOrder {
    #[inline]
    pub fn of(condition: &str) -> Self {
        Self {
            bucket: classify(condition),
            magnitude: magnitude(condition),
        }
    }

    #[inline]
    pub fn compare(&self, other: &Self) -> Ordering {
        self.bucket
            .cmp(&other.bucket)
            .then_with(|| self.magnitude.total_cmp(&other.magnitude))
    }
}

/// Which bounds a condition places on its features.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Bounds {
    min: bool,
    max: bool,
}

#[inline]
fn is_feature_name(operand: &str) -> bool {
    operand.starts_with(|ch: char| ch.is_ascii_alphabetic())
}

/// Detect range-syntax bounds such as `(width >= 40em)` or `(400px <= width < 900px)`.
/// Spec: Section 2.4.3 — Range context
fn range_bounds(condition: &str) -> Bounds {
    let mut bounds = Bounds::default();
    let (Some(feature_group), Some(comparison)) = (FEATURE_GROUP.as_ref(), COMPARISON.as_ref()) else {
        return bounds;
    };
    for group in feature_group.captures_iter(condition) {
        let Some(inner) = group.get(1).map(|found| found.as_str()) else {
            continue;
        };
        let operands: Vec<&str> = comparison.split(inner).map(str::trim).collect();
        let operators: Vec<&str> = comparison.find_iter(inner).map(|found| found.as_str()).collect();
        for (index, operator) in operators.iter().enumerate() {
            let (Some(left), Some(right)) = (operands.get(index), operands.get(index.saturating_add(1)))
            else {
                continue;
            };
            let greater = operator.starts_with('>');
            if is_feature_name(left) {
                // `width > x` bounds from below, `width < x` from above.
                if greater {
                    bounds.min = true;
                } else {
                    bounds.max = true;
                }
            } else if is_feature_name(right) {
                if greater {
                    bounds.max = true;
                } else {
                    bounds.min = true;
                }
            }
        }
    }
    bounds
}

/// Classify a media condition into its ordering bucket.
pub fn classify(condition: &str) -> MediaBucket {
    let lowered = condition.to_ascii_lowercase();
    if is_match(&WORD_PRINT, &lowered) {
        return MediaBucket::Print;
    }
    if let Some(feature) = PREFERENCE
        .as_ref()
        .and_then(|regex| regex.captures(&lowered))
        .and_then(|found| found.get(1))
    {
        let index = PREFERENCE_FEATURES
            .iter()
            .position(|known| *known == feature.as_str())
            .unwrap_or(PREFERENCE_FEATURES.len());
        return MediaBucket::Preference(index);
    }
    let range = range_bounds(&lowered);
    let min = range.min || is_match(&MIN_FEATURE, &lowered);
    let max = range.max || is_match(&MAX_FEATURE, &lowered);
    match (min, max) {
        (true, true) => MediaBucket::Range,
        (true, false) => MediaBucket::MinBound,
        (false, true) => MediaBucket::MaxBound,
        (false, false) if is_match(&WORD_SCREEN, &lowered) => MediaBucket::Screen,
        (false, false) if is_match(&WORD_ALL, &lowered) => MediaBucket::All,
        (false, false) => MediaBucket::Other,
    }
}

/// Sum of every number in `condition`, with `em`/`rem` scaled to pixels.
pub fn magnitude(condition: &str) -> f64 {
    let Some(numbers) = MAGNITUDE.as_ref() else {
        return 0.0;
    };
    let lowered = condition.to_ascii_lowercase();
    numbers
        .captures_iter(&lowered)
        .filter_map(|found| {
            let number: f64 = found.get(1)?.as_str().parse().ok()?;
            let unit = found.get(2).map_or("", |unit| unit.as_str());
            Some(if unit == "em" || unit == "rem" {
                number * EM_IN_PX
            } else {
                number
            })
        })
        .sum()
}

/// Remove conditional blocks with empty bodies, at any depth, innermost first.
fn drop_empty_conditionals(nodes: &mut Vec<Node>) -> usize {
    let mut removed: usize = 0;
    for node in nodes.iter_mut() {
        if let Some(children) = node.children_mut() {
            removed = removed.saturating_add(drop_empty_conditionals(children));
        }
    }
    let before = nodes.len();
    nodes.retain(|node| !matches!(node, Node::Conditional(block) if block.children.is_empty()));
    removed.saturating_add(before.saturating_sub(nodes.len()))
}

/// What a normalization pass changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MediaReport {
    /// Empty conditional blocks removed.
    pub emptied: usize,
    /// Blocks folded into an earlier block with the same condition.
    pub merged: usize,
}

/// Merge and reorder the conditional blocks directly inside `nodes`.
///
/// Empty blocks are removed at every depth. Blocks sharing a condition are
/// concatenated in encounter order, and the merged blocks are appended after
/// the remaining nodes in [`MediaOrder`] order (stable).
pub fn normalize_nodes(nodes: &mut Vec<Node>) -> MediaReport {
    let mut report = MediaReport {
        emptied: drop_empty_conditionals(nodes),
        merged: 0,
    };
    // Only direct children are grouped; blocks inside `@supports` or nested
    // rules stay in their wrapper and are never merged across it.
    let mut groups: Vec<ConditionalBlock> = Vec::new();
    for node in core::mem::take(nodes) {
        match node {
            Node::Conditional(block) => {
                if let Some(group) = groups
                    .iter_mut()
                    .find(|group| group.condition == block.condition)
                {
                    group.children.extend(block.children);
                    report.merged = report.merged.saturating_add(1);
                } else {
                    groups.push(block);
                }
            }
            other => nodes.push(other),
        }
    }
    let mut keyed: Vec<(MediaOrder, ConditionalBlock)> = groups
        .into_iter()
        .map(|block| (MediaOrder::of(&block.condition), block))
        .collect();
    keyed.sort_by(|left, right| left.0.compare(&right.0));
    nodes.extend(keyed.into_iter().map(|(_, block)| Node::Conditional(block)));
    report
}

/// Normalize the `@media` blocks of one layer.
#[inline]
pub fn normalize_layer(layer: &mut LayerBlock) -> MediaReport {
    normalize_nodes(&mut layer.children)
}

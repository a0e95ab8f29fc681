//! Component-value splitting and declaration-list helpers shared by the
//! shorthand passes.
//! Spec: Section 5.3 — Consume a list of component values

use crate::{Declaration, Node};

/// Split `text` on `separator` characters that are not nested inside
/// parentheses, brackets or quotes. Empty pieces are dropped.
fn split_top_level<P>(text: &str, is_separator: P) -> Vec<&str>
where
    P: Fn(char) -> bool,
{
    let mut pieces = Vec::new();
    let mut depth: usize = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (index, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '[' => depth = depth.saturating_add(1),
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 && is_separator(ch) => {
                if let Some(piece) = text.get(start..index)
                    && !piece.trim().is_empty()
                {
                    pieces.push(piece.trim());
                }
                start = index.saturating_add(ch.len_utf8());
            }
            _ => {}
        }
    }
    if let Some(piece) = text.get(start..)
        && !piece.trim().is_empty()
    {
        pieces.push(piece.trim());
    }
    pieces
}

/// Whitespace-separated component values, keeping `url(a b)` and `"a b"` whole.
pub fn split_top_level_whitespace(value: &str) -> Vec<&str> {
    split_top_level(value, char::is_whitespace)
}

/// Comma-separated layers of a value (e.g. multiple backgrounds).
pub fn split_top_level_commas(value: &str) -> Vec<&str> {
    split_top_level(value, |ch| ch == ',')
}

/// True when a value holds more than one comma-separated layer.
#[inline]
pub fn is_multi_layer(value: &str) -> bool {
    split_top_level_commas(value).len() > 1
}

/// Declaration slots of one shorthand family inside a rule body.
///
/// `slots[i]` is the body index of `longhands[i]`, if present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LonghandSlots {
    pub slots: Vec<Option<usize>>,
}

impl LonghandSlots {
    /// Locate each longhand in `body`. Returns `None` when any longhand occurs
    /// more than once, since fusing would drop a fallback declaration.
    pub fn locate(body: &[Node], longhands: &[&str]) -> Option<Self> {
        let mut slots = vec![None; longhands.len()];
        for (index, node) in body.iter().enumerate() {
            let Some(declaration) = node.as_declaration() else {
                continue;
            };
            if let Some(position) = longhands
                .iter()
                .position(|name| *name == declaration.property)
                && let Some(slot) = slots.get_mut(position)
            {
                if slot.is_some() {
                    return None;
                }
                *slot = Some(index);
            }
        }
        Some(Self { slots })
    }

    /// Number of longhands present.
    #[inline]
    pub fn present(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Body indices of all present longhands, in body order.
    pub fn indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.slots.iter().flatten().copied().collect();
        indices.sort_unstable();
        indices
    }

    #[inline]
    pub fn slot(&self, position: usize) -> Option<usize> {
        self.slots.get(position).copied().flatten()
    }

    /// Value of the longhand at `position`, if present.
    pub fn value<'body>(&self, body: &'body [Node], position: usize) -> Option<&'body str> {
        let index = self.slot(position)?;
        body.get(index)
            .and_then(Node::as_declaration)
            .map(|declaration| declaration.value.as_str())
    }

    /// Shared `!important` flag of every present longhand, or `None` when mixed.
    pub fn shared_importance(&self, body: &[Node]) -> Option<bool> {
        let mut flags = self
            .indices()
            .into_iter()
            .filter_map(|index| body.get(index).and_then(Node::as_declaration))
            .map(|declaration| declaration.important);
        let first = flags.next()?;
        flags.all(|flag| flag == first).then_some(first)
    }

    /// True when a declaration that is not part of this group, and for which
    /// `interferes` holds, sits before the last present longhand.
    pub fn has_interference<F>(&self, body: &[Node], interferes: F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        let indices = self.indices();
        let Some(&last) = indices.last() else {
            return false;
        };
        body.iter()
            .take(last)
            .enumerate()
            .filter(|(index, _)| !indices.contains(index))
            .filter_map(|(_, node)| node.as_declaration())
            .any(|declaration| interferes(&declaration.property))
    }
}

/// Insert `shorthand` at `anchor` and remove every index in `contributors`.
///
/// `anchor` is normally one of the contributors, so the shorthand takes over
/// that declaration's slot.
pub fn replace_with_shorthand(
    body: &mut Vec<Node>,
    contributors: &[usize],
    anchor: usize,
    shorthand: Declaration,
) {
    let mut shorthand = Some(shorthand);
    let previous = core::mem::take(body);
    body.reserve(previous.len());
    for (index, node) in previous.into_iter().enumerate() {
        if index == anchor
            && let Some(fused) = shorthand.take()
        {
            body.push(Node::Declaration(fused));
        }
        if !contributors.contains(&index) {
            body.push(node);
        }
    }
    if let Some(fused) = shorthand {
        body.push(Node::Declaration(fused));
    }
}

/// Index of the last declaration for `property` in `body`.
pub fn find_declaration(body: &[Node], property: &str) -> Option<usize> {
    body.iter().rposition(|node| {
        node.as_declaration()
            .is_some_and(|declaration| declaration.property == property)
    })
}

//! CSS Cascading and Inheritance Level 5 — Cascade layer organization.
//! Spec: <https://www.w3.org/TR/css-cascade-5/#layering>
//!
//! Top-level `@layer` blocks are grouped by name, loose top-level nodes are
//! wrapped into a synthetic layer, every block is handed to a caller-supplied
//! transform, and a single `@layer a, b, …;` statement is emitted to pin the
//! layer order.

#![forbid(unsafe_code)]

use css_syntax::{Directive, Document, LayerBlock, Node};
use std::collections::HashSet;

/// All blocks declared under one layer name, in discovery order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerGroup {
    pub name: String,
    pub blocks: Vec<LayerBlock>,
}

/// Naming and ordering inputs for [`organize_layers`].
#[derive(Clone, Copy, Debug)]
pub struct LayerPlan<'plan> {
    /// Name of the layer that collects nodes found outside any layer.
    pub orphans_name: &'plan str,
    /// Preferred layer order; names not listed here follow in discovery order.
    pub order: &'plan [String],
}

/// Remove every top-level layer block from `nodes` and group them by name.
///
/// Groups keep first-discovery order and blocks keep source order within a
/// group. Top-level `@layer a, b;` statements are dropped, since the ordering
/// directive emitted later supersedes them.
pub fn extract_layers(nodes: &mut Vec<Node>) -> Vec<LayerGroup> {
    let mut groups: Vec<LayerGroup> = Vec::new();
    let previous = core::mem::take(nodes);
    for node in previous {
        match node {
            Node::Layer(layer) => {
                let key = layer.key();
                if let Some(group) = groups.iter_mut().find(|group| group.name == key) {
                    group.blocks.push(layer);
                } else {
                    groups.push(LayerGroup {
                        name: key.to_owned(),
                        blocks: vec![layer],
                    });
                }
            }
            Node::Directive(directive) if directive.name == "layer" && directive.block.is_none() => {
                log::debug!(target: "css_cascade", "dropping layer statement `@layer {}`", directive.params);
            }
            other => nodes.push(other),
        }
    }
    groups
}

/// Move every remaining top-level node except source-map comments into a new
/// layer named `name`. Returns `None` when nothing qualifies.
pub fn collect_orphans(nodes: &mut Vec<Node>, name: &str) -> Option<LayerBlock> {
    let (kept, orphans): (Vec<Node>, Vec<Node>) = core::mem::take(nodes)
        .into_iter()
        .partition(|node| matches!(node, Node::Comment(comment) if comment.is_source_map()));
    *nodes = kept;
    if orphans.is_empty() {
        return None;
    }
    log::debug!(target: "css_cascade", "collected {} orphan node(s) into layer `{name}`", orphans.len());
    Some(LayerBlock::named(name, orphans))
}

/// Final layer order: configured names that survived, in configured order,
/// then the remaining survivors in discovery order.
pub fn ordering_names(survivors: &[String], order: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    order
        .iter()
        .filter(|name| survivors.contains(name))
        .chain(survivors.iter().filter(|name| !order.contains(name)))
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}

/// The `@layer a, b;` statement for `names`, or `None` when there are none.
pub fn ordering_directive(names: &[String]) -> Option<Node> {
    if names.is_empty() {
        return None;
    }
    Some(Node::Directive(Directive::statement("layer", &names.join(", "))))
}

/// Regroup the document's layers and run `transform` over each block.
///
/// `transform` receives the group name and one block at a time, groups in
/// discovery order with the orphan layer last. Blocks left empty afterwards
/// are discarded. Surviving blocks are written in processing order, followed
/// by whatever stayed at the root, and the ordering directive is prepended.
///
/// Returns the layer names written to the ordering directive; empty when the
/// document had no layers and no orphans, in which case nothing is emitted.
pub fn organize_layers<F>(document: &mut Document, plan: LayerPlan<'_>, mut transform: F) -> Vec<String>
where
    F: FnMut(&str, &mut LayerBlock),
{
    let mut groups = extract_layers(&mut document.nodes);
    if let Some(orphans) = collect_orphans(&mut document.nodes, plan.orphans_name) {
        // Always a separate group, even when a user layer shares the name.
        groups.push(LayerGroup {
            name: plan.orphans_name.to_owned(),
            blocks: vec![orphans],
        });
    }
    if groups.is_empty() {
        return Vec::new();
    }

    let trailing = core::mem::take(&mut document.nodes);
    let mut survivors: Vec<String> = Vec::new();
    for LayerGroup { name, blocks } in groups {
        for mut block in blocks {
            transform(&name, &mut block);
            if block.children.is_empty() {
                log::debug!(target: "css_cascade", "dropping empty layer block `{name}`");
                continue;
            }
            if !survivors.contains(&name) {
                survivors.push(name.clone());
            }
            document.nodes.push(Node::Layer(block));
        }
    }

    document.nodes.extend(trailing);

    let ordered = ordering_names(&survivors, plan.order);
    if let Some(directive) = ordering_directive(&ordered) {
        document.nodes.insert(0, directive);
    }
    ordered
}

//! Selector-level purging of rules against an allow-list.

use crate::{AllowList, Component, SelectorBranch, parse_selector_list};
use css_syntax::{Node, Rule};
use std::borrow::Cow;

/// Counters collected while purging a subtree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Rules removed because none of their branches survived.
    pub rules_removed: usize,
    /// Branches dropped from rules, including those of removed rules.
    pub branches_removed: usize,
    /// Rules left untouched because their selector could not be parsed.
    pub rules_skipped: usize,
}

impl PurgeReport {
    pub fn merge(&mut self, other: Self) {
        self.rules_removed = self.rules_removed.saturating_add(other.rules_removed);
        self.branches_removed = self.branches_removed.saturating_add(other.branches_removed);
        self.rules_skipped = self.rules_skipped.saturating_add(other.rules_skipped);
    }
}

/// Normalized prefixed form of a checked component, or `None` for
/// components that never consult the allow-list.
pub fn normalized_token(component: &Component) -> Option<Cow<'_, str>> {
    match component {
        Component::Tag(name) => Some(Cow::Borrowed(name.as_str())),
        Component::Id(name) => Some(Cow::Owned(format!("#{name}"))),
        Component::Class(name) => Some(Cow::Owned(format!(".{name}"))),
        Component::Universal => Some(Cow::Borrowed("*")),
        Component::Pseudo { .. }
        | Component::PseudoWithSelectors { .. }
        | Component::Combinator(_)
        | Component::Attribute(_)
        | Component::Other(_) => None,
    }
}

/// Decide whether a branch can survive purging.
///
/// Components are walked in order with a single verdict flag:
/// - combinators, attributes, bare pseudos and other tokens leave it alone;
/// - a tag/id/class/universal component that is not allowed marks the branch
///   invalid, and an allowed one cannot revive an invalid branch;
/// - a pseudo with selector arguments overwrites the verdict with "any of
///   its branches is allowed", regardless of what came before it.
///
/// The last rule means `.unknown:is(.known)` survives while
/// `:is(.known).unknown` does not. A branch with no checked component at all
/// (`:hover`, `[data-x]`) is kept.
pub fn branch_is_allowed(components: &[Component], allow: &AllowList) -> bool {
    let mut verdict: Option<bool> = None;
    for component in components {
        match component {
            Component::Combinator(_)
            | Component::Pseudo { .. }
            | Component::Attribute(_)
            | Component::Other(_) => {}
            Component::PseudoWithSelectors { selectors, .. } => {
                verdict = Some(
                    selectors
                        .iter()
                        .any(|branch| branch_is_allowed(&branch.components, allow)),
                );
            }
            Component::Tag(_) | Component::Id(_) | Component::Class(_) | Component::Universal => {
                let allowed =
                    normalized_token(component).is_some_and(|token| allow.matches(&token));
                verdict = Some(verdict.unwrap_or(true) && allowed);
            }
        }
    }
    verdict.unwrap_or(true)
}

/// Outcome of purging one rule's selector.
enum RuleVerdict {
    Keep,
    Remove,
}

fn purge_rule(rule: &mut Rule, allow: &AllowList, report: &mut PurgeReport) -> RuleVerdict {
    if rule.selector.trim().is_empty() {
        return RuleVerdict::Keep;
    }
    let list = match parse_selector_list(&rule.selector) {
        Ok(list) => list,
        Err(error) => {
            log::warn!(target: "css_selectors", "Error purging selector `{}`: {error}", rule.selector);
            report.rules_skipped = report.rules_skipped.saturating_add(1);
            return RuleVerdict::Keep;
        }
    };
    let total = list.branches.len();
    let kept: Vec<&SelectorBranch> = list
        .branches
        .iter()
        .filter(|branch| branch_is_allowed(&branch.components, allow))
        .collect();
    report.branches_removed = report
        .branches_removed
        .saturating_add(total.saturating_sub(kept.len()));
    if kept.is_empty() {
        log::debug!(target: "css_selectors", "removing rule `{}`", rule.selector);
        report.rules_removed = report.rules_removed.saturating_add(1);
        return RuleVerdict::Remove;
    }
    rule.selector = kept
        .iter()
        .map(|branch| branch.text.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    RuleVerdict::Keep
}

fn purge_into(nodes: &mut Vec<Node>, allow: &AllowList, report: &mut PurgeReport) {
    nodes.retain_mut(|node| {
        match node {
            Node::Rule(rule) => {
                if matches!(purge_rule(rule, allow, report), RuleVerdict::Remove) {
                    return false;
                }
                purge_into(&mut rule.children, allow, report);
            }
            // Keyframe preludes are offsets, not selectors.
            Node::Directive(directive) if directive.is_keyframes() => {}
            Node::Layer(_) | Node::Conditional(_) | Node::Directive(_) => {
                if let Some(children) = node.children_mut() {
                    purge_into(children, allow, report);
                }
            }
            Node::Declaration(_) | Node::Comment(_) => {}
        }
        true
    });
}

/// Purge every rule in `nodes` (at any depth) against `allow`.
///
/// Rules whose branches all fail are removed; surviving rules get their
/// selector rewritten to the comma-joined surviving branches. Selectors that
/// fail to parse are logged and left untouched.
pub fn purge_nodes(nodes: &mut Vec<Node>, allow: &AllowList) -> PurgeReport {
    let mut report = PurgeReport::default();
    purge_into(nodes, allow, &mut report);
    report
}

//! CSS Syntax Module Level 3 — Stylesheet tree, parsing and serialization.
//! Spec: <https://www.w3.org/TR/css-syntax-3/>
//!
//! The tree is a closed set of node kinds. Every container owns its children
//! vector exclusively, so removal always goes through the owning `Vec<Node>`.

#![forbid(unsafe_code)]

mod parser;
mod serialize;
pub mod values;

pub use parser::parse_stylesheet;
pub use serialize::OutputStyle;

/// Name used for anonymous `@layer { … }` blocks.
pub const ROOT_LAYER_NAME: &str = "root";

/// A single CSS declaration (property: value [!important]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercased property name.
    pub property: String,
    /// Raw value text (without trailing !important).
    pub value: String,
    /// Whether the declaration was marked as `!important`.
    pub important: bool,
}

impl Declaration {
    #[inline]
    pub fn new(property: &str, value: &str) -> Self {
        Self {
            property: property.to_ascii_lowercase(),
            value: value.to_owned(),
            important: false,
        }
    }
}

/// A qualified rule: selector prelude plus a body of declarations and nested rules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    /// Raw prelude text (the selector list).
    pub selector: String,
    pub children: Vec<Node>,
}

/// `@layer name { … }`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerBlock {
    /// Declared layer name; `None` for anonymous layers.
    pub name: Option<String>,
    pub children: Vec<Node>,
}

impl LayerBlock {
    #[inline]
    pub fn named(name: &str, children: Vec<Node>) -> Self {
        Self {
            name: Some(name.to_owned()),
            children,
        }
    }

    /// Grouping key: the declared name, or `"root"` when anonymous.
    #[inline]
    pub fn key(&self) -> &str {
        self.name.as_deref().unwrap_or(ROOT_LAYER_NAME)
    }
}

/// `@media condition { … }`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConditionalBlock {
    pub condition: String,
    pub children: Vec<Node>,
}

/// A comment; `text` excludes the `/*` and `*/` delimiters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
}

impl Comment {
    /// Comments starting with `!` are meant to survive minification.
    #[inline]
    pub fn is_bang(&self) -> bool {
        self.text.starts_with('!')
    }

    #[inline]
    pub fn is_source_map(&self) -> bool {
        self.text.contains("sourceMappingURL")
    }
}

/// Any other at-rule, with or without a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Directive {
    /// Lowercased at-keyword without the leading `@`.
    pub name: String,
    pub params: String,
    pub block: Option<Vec<Node>>,
}

impl Directive {
    #[inline]
    pub fn statement(name: &str, params: &str) -> Self {
        Self {
            name: name.to_owned(),
            params: params.to_owned(),
            block: None,
        }
    }

    /// Keyframe blocks contain `from`/`to`/percentage preludes rather than selectors.
    #[inline]
    pub fn is_keyframes(&self) -> bool {
        self.name.ends_with("keyframes")
    }
}

/// Closed set of node kinds that can appear in a stylesheet tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Layer(LayerBlock),
    Conditional(ConditionalBlock),
    Rule(Rule),
    Declaration(Declaration),
    Comment(Comment),
    Directive(Directive),
}

impl Node {
    /// Mutable access to this node's children, if it is a container.
    #[inline]
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Self::Layer(layer) => Some(&mut layer.children),
            Self::Conditional(block) => Some(&mut block.children),
            Self::Rule(rule) => Some(&mut rule.children),
            Self::Directive(directive) => directive.block.as_mut(),
            Self::Declaration(_) | Self::Comment(_) => None,
        }
    }

    #[inline]
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Self::Layer(layer) => Some(&layer.children),
            Self::Conditional(block) => Some(&block.children),
            Self::Rule(rule) => Some(&rule.children),
            Self::Directive(directive) => directive.block.as_deref(),
            Self::Declaration(_) | Self::Comment(_) => None,
        }
    }

    #[inline]
    pub fn as_declaration(&self) -> Option<&Declaration> {
        match self {
            Self::Declaration(declaration) => Some(declaration),
            _ => None,
        }
    }
}

/// Root container of a parsed stylesheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    #[inline]
    pub const fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Serialize the tree back to CSS text.
    #[inline]
    pub fn to_css(&self, style: OutputStyle) -> String {
        serialize::serialize_nodes(&self.nodes, style)
    }
}

/// Remove every node, at any depth, for which `keep` returns false.
pub fn retain_nodes<F>(nodes: &mut Vec<Node>, keep: &mut F)
where
    F: FnMut(&Node) -> bool,
{
    nodes.retain(|node| keep(node));
    for node in nodes.iter_mut() {
        if let Some(children) = node.children_mut() {
            retain_nodes(children, keep);
        }
    }
}

/// Visit the body of every rule, at any depth, outermost first.
pub fn for_each_rule_body_mut<F>(nodes: &mut [Node], visit: &mut F)
where
    F: FnMut(&mut Vec<Node>),
{
    for node in nodes.iter_mut() {
        if let Node::Rule(rule) = node {
            visit(&mut rule.children);
        }
        if let Some(children) = node.children_mut() {
            for_each_rule_body_mut(children, visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_layer_key_is_root() {
        let layer = LayerBlock {
            name: None,
            children: Vec::new(),
        };
        assert_eq!(layer.key(), "root");
        assert_eq!(LayerBlock::named("base", Vec::new()).key(), "base");
    }

    #[test]
    fn retain_nodes_reaches_nested_children() {
        let mut doc = parse_stylesheet(
            "/* a */ @media print { /* b */ .x { color: red; /* c */ } } .y { color: blue }",
        );
        retain_nodes(&mut doc.nodes, &mut |node| !matches!(node, Node::Comment(_)));
        assert_eq!(
            doc.to_css(OutputStyle::Minified),
            "@media print{.x{color:red}}.y{color:blue}"
        );
    }

    #[test]
    fn rule_bodies_are_visited_outermost_first() {
        let mut doc = parse_stylesheet(".a { color: red; .b { color: blue } }");
        let mut seen = Vec::new();
        for_each_rule_body_mut(&mut doc.nodes, &mut |body| seen.push(body.len()));
        assert_eq!(seen, vec![2, 1]);
    }
}

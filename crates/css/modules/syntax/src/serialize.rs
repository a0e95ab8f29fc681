//! Tree → text serialization.
//! Spec: Section 9 — Serialization

use crate::{Declaration, Node};

/// Output formatting for serialized stylesheets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputStyle {
    /// One node per line, tab indentation derived from tree depth.
    #[default]
    Pretty,
    /// No optional whitespace.
    Minified,
}

/// Collapse runs of whitespace and drop the space after commas. Quoted
/// strings and escaped characters are copied verbatim.
fn minify_prelude(prelude: &str) -> String {
    let mut out = String::with_capacity(prelude.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut pending_space = false;
    for ch in prelude.trim().chars() {
        if escaped {
            out.push(ch);
            escaped = false;
            continue;
        }
        if quote.is_none() && ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.ends_with(',') {
            out.push(' ');
        }
        pending_space = false;
        match (quote, ch) {
            (_, '\\') => escaped = true,
            (None, '"' | '\'') => quote = Some(ch),
            (Some(open), _) if ch == open => quote = None,
            _ => {}
        }
        out.push(ch);
    }
    out
}

fn write_declaration(out: &mut String, declaration: &Declaration, style: OutputStyle) {
    let (separator, bang) = match style {
        OutputStyle::Pretty => (": ", " !important"),
        OutputStyle::Minified => (":", "!important"),
    };
    out.push_str(&declaration.property);
    out.push_str(separator);
    out.push_str(&declaration.value);
    if declaration.important {
        out.push_str(bang);
    }
}

/// Write `head { children }` for any container node.
fn write_block(out: &mut String, head: &str, children: &[Node], depth: usize, style: OutputStyle) {
    match style {
        OutputStyle::Pretty => {
            out.push_str(head);
            if children.is_empty() {
                out.push_str(" {}");
                return;
            }
            out.push_str(" {\n");
            write_nodes(out, children, depth.saturating_add(1), style);
            out.push('\n');
            push_indent(out, depth);
            out.push('}');
        }
        OutputStyle::Minified => {
            out.push_str(&minify_prelude(head));
            out.push('{');
            write_nodes(out, children, depth.saturating_add(1), style);
            out.push('}');
        }
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn at_head(name: &str, params: &str) -> String {
    let mut head = String::with_capacity(name.len().saturating_add(params.len()).saturating_add(2));
    head.push('@');
    head.push_str(name);
    if !params.is_empty() {
        head.push(' ');
        head.push_str(params);
    }
    head
}

fn write_node(out: &mut String, node: &Node, depth: usize, style: OutputStyle) {
    match node {
        Node::Declaration(declaration) => {
            write_declaration(out, declaration, style);
            if style == OutputStyle::Pretty {
                out.push(';');
            }
        }
        Node::Comment(comment) => {
            out.push_str("/*");
            out.push_str(&comment.text);
            out.push_str("*/");
        }
        Node::Rule(rule) => write_block(out, &rule.selector, &rule.children, depth, style),
        Node::Layer(layer) => write_block(
            out,
            &at_head("layer", layer.name.as_deref().unwrap_or_default()),
            &layer.children,
            depth,
            style,
        ),
        Node::Conditional(block) => write_block(
            out,
            &at_head("media", &block.condition),
            &block.children,
            depth,
            style,
        ),
        Node::Directive(directive) => match &directive.block {
            Some(children) => write_block(
                out,
                &at_head(&directive.name, &directive.params),
                children,
                depth,
                style,
            ),
            None => {
                let head = at_head(&directive.name, &directive.params);
                match style {
                    OutputStyle::Pretty => out.push_str(&head),
                    OutputStyle::Minified => out.push_str(&minify_prelude(&head)),
                }
                out.push(';');
            }
        },
    }
}

fn write_nodes(out: &mut String, nodes: &[Node], depth: usize, style: OutputStyle) {
    let mut previous: Option<&Node> = None;
    for node in nodes {
        match style {
            OutputStyle::Pretty => {
                if previous.is_some() {
                    out.push('\n');
                }
                push_indent(out, depth);
            }
            OutputStyle::Minified => {
                if matches!(previous, Some(Node::Declaration(_))) {
                    out.push(';');
                }
            }
        }
        write_node(out, node, depth, style);
        previous = Some(node);
    }
}

/// Serialize a node list at depth zero.
pub fn serialize_nodes(nodes: &[Node], style: OutputStyle) -> String {
    let mut out = String::new();
    write_nodes(&mut out, nodes, 0, style);
    out
}

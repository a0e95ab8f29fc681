//! Charset and comment housekeeping.

use crate::options::CommentRemoval;
use css_syntax::{Comment, Directive, Document, Node, retain_nodes};

#[inline]
fn is_charset(node: &Node) -> bool {
    matches!(node, Node::Directive(directive) if directive.name == "charset")
}

/// Remove every `@charset` directive, at any depth. Returns how many went.
pub fn strip_charsets(nodes: &mut Vec<Node>) -> usize {
    let mut removed: usize = 0;
    retain_nodes(nodes, &mut |node| {
        let charset = is_charset(node);
        if charset {
            removed = removed.saturating_add(1);
        }
        !charset
    });
    removed
}

fn removes(mode: CommentRemoval, comment: &Comment) -> bool {
    match mode {
        CommentRemoval::None => false,
        CommentRemoval::NonBang => !comment.is_bang(),
        CommentRemoval::All => true,
    }
}

/// Remove comments under `nodes` according to `mode`.
pub fn remove_comments(nodes: &mut Vec<Node>, mode: CommentRemoval) {
    if mode == CommentRemoval::None {
        return;
    }
    retain_nodes(nodes, &mut |node| match node {
        Node::Comment(comment) => !removes(mode, comment),
        _ => true,
    });
}

/// Comment removal for the document root; source-map comments there survive.
pub fn remove_root_comments(document: &mut Document, mode: CommentRemoval) {
    if mode == CommentRemoval::None {
        return;
    }
    document.nodes.retain(|node| match node {
        Node::Comment(comment) => comment.is_source_map() || !removes(mode, comment),
        _ => true,
    });
}

/// Put `@charset "UTF-8";` in front of everything else.
pub fn prepend_charset(document: &mut Document) {
    document
        .nodes
        .insert(0, Node::Directive(Directive::statement("charset", "\"UTF-8\"")));
}

#[cfg(test)]
mod tests {
    use super::*;
    use css_syntax::{OutputStyle, parse_stylesheet};

    #[test]
    fn charsets_are_stripped_everywhere() {
        let mut doc = parse_stylesheet(
            "@charset \"latin1\"; @layer base { @charset \"UTF-8\"; a { color: red } }",
        );
        assert_eq!(strip_charsets(&mut doc.nodes), 2);
        prepend_charset(&mut doc);
        assert_eq!(
            doc.to_css(OutputStyle::Minified),
            "@charset \"UTF-8\";@layer base{a{color:red}}"
        );
    }

    #[test]
    fn comment_modes() {
        let css = "/*! keep */ a { /* drop */ color: red; /*! legal */ }";
        let mut none = parse_stylesheet(css);
        remove_comments(&mut none.nodes, CommentRemoval::None);
        assert_eq!(none, parse_stylesheet(css));

        let mut non_bang = parse_stylesheet(css);
        remove_comments(&mut non_bang.nodes, CommentRemoval::NonBang);
        assert_eq!(
            non_bang.to_css(OutputStyle::Minified),
            "/*! keep */a{color:red;/*! legal */}"
        );

        let mut all = parse_stylesheet(css);
        remove_comments(&mut all.nodes, CommentRemoval::All);
        assert_eq!(all.to_css(OutputStyle::Minified), "a{color:red}");
    }

    #[test]
    fn root_source_maps_survive() {
        let mut doc = parse_stylesheet("/* note */ /*# sourceMappingURL=site.css.map */");
        remove_root_comments(&mut doc, CommentRemoval::All);
        assert_eq!(doc.nodes.len(), 1);
        assert!(matches!(doc.nodes.first(), Some(Node::Comment(comment)) if comment.is_source_map()));
    }
}

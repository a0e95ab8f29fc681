//! Tree construction over the `cssparser` tokenizer.
//! Spec: Section 5 — Parsing (consume a list of rules / a block's contents)

use crate::{Comment, ConditionalBlock, Declaration, Directive, Document, LayerBlock, Node, Rule};
use cssparser::{ParseError, Parser, ParserInput, Token};

/// How a prelude scan stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Terminator {
    /// A `{}` block follows; its contents have not been consumed yet.
    Block,
    Semicolon,
    End,
}

/// Parse `!important` at the end of a value, returning (`value_without_important`, `important_flag`).
fn split_important_tail(value: &str) -> (String, bool) {
    let trimmed = value.trim();
    if let Some(pos) = trimmed.rfind('!')
        && let Some(prefix) = trimmed.get(..pos)
        && let Some(suffix) = trimmed.get(pos.saturating_add(1)..)
        && suffix.trim().eq_ignore_ascii_case("important")
    {
        return (prefix.trim_end().to_owned(), true);
    }
    (trimmed.to_owned(), false)
}

/// Build a declaration from `name: value` text. Returns `None` for malformed items.
fn parse_declaration(text: &str) -> Option<Declaration> {
    let (raw_name, raw_value) = text.split_once(':')?;
    let name = raw_name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    let (value, important) = split_important_tail(raw_value);
    // Custom properties are case-sensitive.
    let property = if name.starts_with("--") {
        name.to_owned()
    } else {
        name.to_ascii_lowercase()
    };
    Some(Declaration {
        property,
        value,
        important,
    })
}

/// Skip the contents of the function or bracket block that was just opened.
fn skip_nested_block(input: &mut Parser<'_, '_>) {
    let skipped = input.parse_nested_block(|nested| {
        while nested.next_including_whitespace_and_comments().is_ok() {}
        Ok::<_, ParseError<'_, ()>>(())
    });
    if skipped.is_err() {
        log::debug!(target: "css_syntax", "unterminated nested block");
    }
}

/// Consume tokens up to a `{` block, a `;`, or the end of the current block.
///
/// Nested function and bracket blocks are consumed whole, so the returned
/// slice always ends after the last closing delimiter.
fn scan_prelude<'i>(input: &mut Parser<'i, '_>) -> (&'i str, Terminator) {
    let start = input.position();
    loop {
        let before = input.position();
        let (stop, nested) = match input.next_including_whitespace_and_comments() {
            Ok(Token::CurlyBracketBlock) => (Some(Terminator::Block), false),
            Ok(Token::Semicolon) => (Some(Terminator::Semicolon), false),
            Ok(Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock) => (None, true),
            Ok(_) => (None, false),
            Err(_) => (Some(Terminator::End), false),
        };
        match stop {
            Some(Terminator::End) => return (input.slice_from(start), Terminator::End),
            Some(terminator) => return (input.slice(start..before), terminator),
            None if nested => skip_nested_block(input),
            None => {}
        }
    }
}

/// Parse the contents of the `{}` block that was just consumed.
fn parse_block_contents(input: &mut Parser<'_, '_>) -> Vec<Node> {
    input
        .parse_nested_block(|nested| Ok::<_, ParseError<'_, ()>>(parse_node_list(nested)))
        .unwrap_or_default()
}

/// Parse an at-rule whose at-keyword has already been consumed.
fn parse_at_rule(input: &mut Parser<'_, '_>, name: &str) -> Node {
    let (raw_params, terminator) = scan_prelude(input);
    let params = raw_params.trim();
    if terminator != Terminator::Block {
        return Node::Directive(Directive::statement(name, params));
    }
    let children = parse_block_contents(input);
    match name {
        "layer" => Node::Layer(LayerBlock {
            name: (!params.is_empty()).then(|| params.to_owned()),
            children,
        }),
        "media" => Node::Conditional(ConditionalBlock {
            condition: params.to_owned(),
            children,
        }),
        _ => Node::Directive(Directive {
            name: name.to_owned(),
            params: params.to_owned(),
            block: Some(children),
        }),
    }
}

/// Consume a list of rules, at-rules, declarations and comments until the
/// current block (or the input) ends.
fn parse_node_list(input: &mut Parser<'_, '_>) -> Vec<Node> {
    let mut nodes = Vec::new();
    loop {
        let state = input.state();
        let token = match input.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::WhiteSpace(_) | Token::Semicolon | Token::CDO | Token::CDC => {}
            Token::Comment(text) => nodes.push(Node::Comment(Comment {
                text: text.to_owned(),
            })),
            Token::AtKeyword(keyword) => {
                let keyword = keyword.to_ascii_lowercase();
                nodes.push(parse_at_rule(input, &keyword));
            }
            Token::CurlyBracketBlock => {
                // A block without a prelude is dropped wholesale.
                log::debug!(target: "css_syntax", "dropping block without prelude");
            }
            _ => {
                input.reset(&state);
                let (prelude, terminator) = scan_prelude(input);
                if terminator == Terminator::Block {
                    let children = parse_block_contents(input);
                    nodes.push(Node::Rule(Rule {
                        selector: prelude.trim().to_owned(),
                        children,
                    }));
                } else if let Some(declaration) = parse_declaration(prelude) {
                    nodes.push(Node::Declaration(declaration));
                } else {
                    log::debug!(target: "css_syntax", "dropping malformed item: {}", prelude.trim());
                }
            }
        }
    }
    nodes
}

/// Parse a full stylesheet into a `Document` using cssparser.
///
/// Parsing is tolerant and never fails; malformed items are dropped.
pub fn parse_stylesheet(css: &str) -> Document {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    Document::new(parse_node_list(&mut parser))
}

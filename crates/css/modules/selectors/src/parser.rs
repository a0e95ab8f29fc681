//! CSS selector tokenization.
//! Spec: <https://www.w3.org/TR/selectors-4/#grammar>

use crate::{Combinator, Component, SelectorBranch, SelectorList, SelectorParseError};

/// Functional pseudo-classes whose argument is itself a selector list.
const SELECTOR_PSEUDOS: [&str; 13] = [
    "is",
    "not",
    "where",
    "has",
    "matches",
    "any",
    "-webkit-any",
    "-moz-any",
    "host",
    "host-context",
    "slotted",
    "global",
    "local",
];

#[derive(Clone, Debug, PartialEq, Eq)]
/// Internal tokenizer token kinds.
pub enum Tok {
    /// A combinator token like child/adjacent/general sibling.
    Combinator(Combinator),
    /// Whitespace that implies a descendant combinator.
    DescendantWS,
    /// Any non-combinator component.
    Component(Component),
}

/// Tokenizer over a single selector branch.
pub struct SelectorTokenizer {
    /// Input decoded to chars so escapes and non-ASCII identifiers index cleanly.
    chars: Vec<char>,
    /// Current cursor index into `chars`.
    index: usize,
}

#[inline]
fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '-' || ch == '\\' || !ch.is_ascii()
}

#[inline]
fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || !ch.is_ascii()
}

impl SelectorTokenizer {
    /// Construct a tokenizer from input.
    #[inline]
    pub(crate) fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            index: 0,
        }
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    #[inline]
    fn bump(&mut self) {
        self.index = self.index.saturating_add(1);
    }

    /// Text between `start` and the cursor, excluding the `skip_tail` last chars.
    fn text_since(&self, start: usize, skip_tail: usize) -> String {
        let end = self.index.saturating_sub(skip_tail);
        self.chars.get(start..end).unwrap_or(&[]).iter().collect()
    }

    /// Return the next selector token, if any.
    ///
    /// # Errors
    /// Returns a `SelectorParseError` when the input is not a well-formed selector.
    pub(crate) fn next(&mut self) -> Result<Option<Tok>, SelectorParseError> {
        if self.skip_whitespace() && self.peek().is_some() {
            return Ok(Some(Tok::DescendantWS));
        }
        let Some(current) = self.peek() else {
            return Ok(None);
        };
        let token = match current {
            '*' => {
                self.bump();
                Tok::Component(Component::Universal)
            }
            '.' => {
                self.bump();
                Tok::Component(Component::Class(self.consume_required_ident('.')?))
            }
            '#' => {
                self.bump();
                Tok::Component(Component::Id(self.consume_required_ident('#')?))
            }
            '[' => self.consume_attr()?,
            ':' => self.consume_pseudo()?,
            '>' => {
                self.bump();
                Tok::Combinator(Combinator::Child)
            }
            '+' => {
                self.bump();
                Tok::Combinator(Combinator::AdjacentSibling)
            }
            '~' => {
                self.bump();
                Tok::Combinator(Combinator::GeneralSibling)
            }
            '&' | '|' => {
                self.bump();
                Tok::Component(Component::Other(current.to_string()))
            }
            ')' | ']' => return Err(SelectorParseError::StrayClose(current)),
            ch if is_ident_start(ch) => {
                Tok::Component(Component::Tag(self.consume_ident()?.to_ascii_lowercase()))
            }
            other => return Err(SelectorParseError::Unexpected(other)),
        };
        Ok(Some(token))
    }

    /// Skip whitespace, reporting whether any was seen.
    #[inline]
    fn skip_whitespace(&mut self) -> bool {
        let mut saw = false;
        while self.peek().is_some_and(char::is_whitespace) {
            saw = true;
            self.bump();
        }
        saw
    }

    /// Decode the escape following a consumed backslash.
    /// Spec: CSS Syntax §4.3.7 — Consume an escaped code point
    fn consume_escape(&mut self) -> Result<char, SelectorParseError> {
        let Some(first) = self.peek() else {
            return Err(SelectorParseError::DanglingEscape);
        };
        if !first.is_ascii_hexdigit() {
            self.bump();
            return Ok(first);
        }
        let mut code: u32 = 0;
        let mut digits = 0;
        while digits < 6 {
            let Some(digit) = self.peek().and_then(|ch| ch.to_digit(16)) else {
                break;
            };
            code = code.saturating_mul(16).saturating_add(digit);
            digits += 1;
            self.bump();
        }
        if self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        Ok(char::from_u32(code)
            .filter(|decoded| *decoded != '\0')
            .unwrap_or('\u{FFFD}'))
    }

    /// Consume an identifier, decoding escapes. Case is preserved.
    fn consume_ident(&mut self) -> Result<String, SelectorParseError> {
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\\' {
                self.bump();
                out.push(self.consume_escape()?);
            } else if is_ident_char(ch) {
                out.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        Ok(out)
    }

    fn consume_required_ident(&mut self, prefix: char) -> Result<String, SelectorParseError> {
        let ident = self.consume_ident()?;
        if ident.is_empty() {
            return Err(SelectorParseError::MissingIdent(prefix));
        }
        Ok(ident)
    }

    /// Consume up to and including the char that closes `open`, honouring
    /// quotes, escapes and nesting of the same bracket kind.
    fn consume_until_close(&mut self, open: char, close: char) -> Result<(), SelectorParseError> {
        let mut depth: usize = 0;
        let mut quote: Option<char> = None;
        loop {
            let Some(ch) = self.peek() else {
                return Err(if quote.is_some() {
                    SelectorParseError::UnterminatedString
                } else {
                    SelectorParseError::Unclosed(open)
                });
            };
            self.bump();
            if ch == '\\' {
                if self.peek().is_none() {
                    return Err(SelectorParseError::DanglingEscape);
                }
                self.bump();
                continue;
            }
            if let Some(open_quote) = quote {
                if ch == open_quote {
                    quote = None;
                }
                continue;
            }
            if ch == '"' || ch == '\'' {
                quote = Some(ch);
            } else if ch == open {
                depth = depth.saturating_add(1);
            } else if ch == close {
                if depth == 0 {
                    return Ok(());
                }
                depth = depth.saturating_sub(1);
            }
        }
    }

    /// Parse an attribute selector; the raw text between the brackets is kept.
    fn consume_attr(&mut self) -> Result<Tok, SelectorParseError> {
        // skip '['
        self.bump();
        let start = self.index;
        self.consume_until_close('[', ']')?;
        let inner = self.text_since(start, 1);
        Ok(Tok::Component(Component::Attribute(inner.trim().to_owned())))
    }

    /// Parse `:name`, `::name` or `:name(argument)`.
    fn consume_pseudo(&mut self) -> Result<Tok, SelectorParseError> {
        // skip ':' (and the second one of a pseudo-element)
        self.bump();
        if self.peek() == Some(':') {
            self.bump();
        }
        let name = self.consume_required_ident(':')?.to_ascii_lowercase();
        if self.peek() != Some('(') {
            return Ok(Tok::Component(Component::Pseudo {
                name,
                argument: None,
            }));
        }
        self.bump();
        let start = self.index;
        self.consume_until_close('(', ')')?;
        let argument = self.text_since(start, 1);
        if !SELECTOR_PSEUDOS.contains(&name.as_str()) {
            return Ok(Tok::Component(Component::Pseudo {
                name,
                argument: Some(argument.trim().to_owned()),
            }));
        }
        let selectors = if argument.trim().is_empty() {
            Vec::new()
        } else {
            parse_selector_list(&argument)?.branches
        };
        Ok(Tok::Component(Component::PseudoWithSelectors { name, selectors }))
    }
}

/// Split a selector list on top-level commas, validating bracket balance.
fn split_branches(input: &str) -> Result<Vec<&str>, SelectorParseError> {
    let mut pieces = Vec::new();
    let mut openers: Vec<char> = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (index, ch) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if let Some(open_quote) = quote {
            if ch == open_quote {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '[' => openers.push(ch),
            ')' | ']' => {
                let expected = if ch == ')' { '(' } else { '[' };
                if openers.pop() != Some(expected) {
                    return Err(SelectorParseError::StrayClose(ch));
                }
            }
            ',' if openers.is_empty() => {
                pieces.push(input.get(start..index).unwrap_or_default());
                start = index.saturating_add(1);
            }
            _ => {}
        }
    }
    if escaped {
        return Err(SelectorParseError::DanglingEscape);
    }
    if quote.is_some() {
        return Err(SelectorParseError::UnterminatedString);
    }
    if let Some(open) = openers.pop() {
        return Err(SelectorParseError::Unclosed(open));
    }
    pieces.push(input.get(start..).unwrap_or_default());
    Ok(pieces)
}

/// Parse a selector list from CSS text.
/// Spec: Section 4.1 — Selector lists
///
/// # Errors
/// Returns a `SelectorParseError` if any branch is malformed.
pub fn parse_selector_list(input: &str) -> Result<SelectorList, SelectorParseError> {
    let mut list = SelectorList::default();
    for piece in split_branches(input)? {
        let text = piece.trim();
        let components = parse_complex_selector(text)?;
        list.branches.push(SelectorBranch {
            text: text.to_owned(),
            components,
        });
    }
    Ok(list)
}

/// Parse one complex selector into its ordered components.
/// Spec: Section 16 — Combinators; Sections 5–6 — simple selectors
///
/// A leading combinator is accepted (relative selectors inside `:has()`).
///
/// # Errors
/// Returns a `SelectorParseError` if the branch is empty or malformed.
pub fn parse_complex_selector(input: &str) -> Result<Vec<Component>, SelectorParseError> {
    let mut tokens = SelectorTokenizer::new(input);
    let mut components: Vec<Component> = Vec::new();
    let mut pending_descendant = false;

    while let Some(token) = tokens.next()? {
        match token {
            Tok::DescendantWS => pending_descendant = true,
            Tok::Combinator(comb) => {
                pending_descendant = false;
                components.push(Component::Combinator(comb));
            }
            Tok::Component(component) => {
                if pending_descendant
                    && components
                        .last()
                        .is_some_and(|last| !matches!(last, Component::Combinator(_)))
                {
                    components.push(Component::Combinator(Combinator::Descendant));
                }
                pending_descendant = false;
                components.push(component);
            }
        }
    }

    match components.last() {
        None => Err(SelectorParseError::EmptyBranch),
        Some(Component::Combinator(_)) => Err(SelectorParseError::DanglingCombinator),
        Some(_) => Ok(components),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str) -> Component {
        Component::Tag(name.to_owned())
    }

    fn class(name: &str) -> Component {
        Component::Class(name.to_owned())
    }

    #[test]
    fn compound_and_combinators() {
        let components = parse_complex_selector("UL.nav > li  a:hover").unwrap_or_default();
        assert_eq!(
            components,
            vec![
                tag("ul"),
                class("nav"),
                Component::Combinator(Combinator::Child),
                tag("li"),
                Component::Combinator(Combinator::Descendant),
                tag("a"),
                Component::Pseudo {
                    name: "hover".to_owned(),
                    argument: None
                },
            ]
        );
    }

    #[test]
    fn escapes_are_decoded() {
        let components = parse_complex_selector(r".xs\:fs-1 #\31 23").unwrap_or_default();
        assert_eq!(
            components,
            vec![
                class("xs:fs-1"),
                Component::Combinator(Combinator::Descendant),
                Component::Id("123".to_owned()),
            ]
        );
    }

    #[test]
    fn selector_pseudos_nest_branches() {
        let list = parse_selector_list(":is(h1, .title) > span, a:nth-child(2n + 1)")
            .unwrap_or_default();
        assert_eq!(list.branches.len(), 2);
        let nested: Vec<&str> = match list.branches[0].components.first() {
            Some(Component::PseudoWithSelectors { name, selectors }) if name == "is" => {
                selectors.iter().map(|branch| branch.text.as_str()).collect()
            }
            _ => Vec::new(),
        };
        assert_eq!(nested, vec!["h1", ".title"]);
        assert_eq!(list.branches[1].text, "a:nth-child(2n + 1)");
        assert_eq!(
            list.branches[1].components.last(),
            Some(&Component::Pseudo {
                name: "nth-child".to_owned(),
                argument: Some("2n + 1".to_owned())
            })
        );
    }

    #[test]
    fn attributes_keep_raw_text() {
        let components = parse_complex_selector("input[type=\"a]b\"]::placeholder").unwrap_or_default();
        assert_eq!(components.len(), 3);
        assert_eq!(components[1], Component::Attribute("type=\"a]b\"".to_owned()));
    }

    #[test]
    fn relative_selectors_inside_has() {
        let list = parse_selector_list("figure:has(> img)");
        assert!(matches!(list, Ok(_)));
    }

    #[test]
    fn malformed_selectors_are_rejected() {
        assert_eq!(parse_selector_list("a,,b"), Err(SelectorParseError::EmptyBranch));
        assert_eq!(parse_selector_list("a,"), Err(SelectorParseError::EmptyBranch));
        assert_eq!(parse_selector_list(":is(a"), Err(SelectorParseError::Unclosed('(')));
        assert_eq!(parse_selector_list("a)"), Err(SelectorParseError::StrayClose(')')));
        assert_eq!(parse_selector_list("[x=\"y]"), Err(SelectorParseError::UnterminatedString));
        assert_eq!(parse_selector_list("a >"), Err(SelectorParseError::DanglingCombinator));
        assert_eq!(parse_selector_list(". a"), Err(SelectorParseError::MissingIdent('.')));
        assert_eq!(parse_selector_list("50%"), Err(SelectorParseError::Unexpected('5')));
    }
}

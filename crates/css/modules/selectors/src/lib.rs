//! Selectors Level 4 — Selector tokenization and allow-list purging.
//! Spec: <https://www.w3.org/TR/selectors-4/>
//!
//! This module implements the subset needed to decide whether a rule's
//! selector branches can ever match markup seen by the project:
//! - Tokenizing selector lists into typed components, including functional
//!   pseudo-classes that take nested selector lists (`:is()`, `:not()`, …)
//! - Allow-list matchers (literal or regular expression)
//! - Per-branch purging of rules inside a stylesheet tree

#![forbid(unsafe_code)]

mod allow_list;
mod parser;
mod purge;

use core::fmt;

// Re-export public API
pub use allow_list::{AllowList, GLOBAL_SAFELIST, Matcher};
pub use parser::{parse_complex_selector, parse_selector_list};
pub use purge::{PurgeReport, branch_is_allowed, normalized_token, purge_nodes};

/// Combinators between compounds.
/// Spec: Section 16 — Combinators
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

/// One component of a selector branch, in source order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Component {
    /// Spec: Section 5.1 — Type selectors (ASCII-lowercased)
    Tag(String),
    /// Spec: Section 6.7 — ID selectors
    Id(String),
    /// Spec: Section 6.6 — Class selectors
    Class(String),
    /// Spec: Section 5.2 — Universal selector
    Universal,
    /// A pseudo-class or pseudo-element whose argument, if any, is not a selector.
    Pseudo {
        name: String,
        argument: Option<String>,
    },
    /// A functional pseudo-class taking a selector list (`:is()`, `:not()`, `:has()`, …).
    PseudoWithSelectors {
        name: String,
        selectors: Vec<SelectorBranch>,
    },
    Combinator(Combinator),
    /// Spec: Section 6.1 — Attribute selectors (raw text between the brackets)
    Attribute(String),
    /// Nesting selector `&`, namespace separators and similar tokens.
    Other(String),
}

/// One comma-separated alternative of a selector list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorBranch {
    /// Trimmed source text of the branch.
    pub text: String,
    pub components: Vec<Component>,
}

/// A selector list separated by commas.
/// Spec: Section 4.1 — Selector lists
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SelectorList {
    pub branches: Vec<SelectorBranch>,
}

/// Reasons a selector list cannot be tokenized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectorParseError {
    /// A comma-separated branch has no content (`a,,b`, trailing comma).
    EmptyBranch,
    /// An opening `(` or `[` has no matching close.
    Unclosed(char),
    /// A `)` or `]` without a matching opener.
    StrayClose(char),
    UnterminatedString,
    /// A backslash at the very end of the input.
    DanglingEscape,
    /// `.`, `#` or `:` not followed by an identifier.
    MissingIdent(char),
    /// A combinator with nothing after it.
    DanglingCombinator,
    Unexpected(char),
}

impl fmt::Display for SelectorParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBranch => write!(formatter, "empty selector in list"),
            Self::Unclosed(open) => write!(formatter, "unclosed `{open}`"),
            Self::StrayClose(close) => write!(formatter, "unmatched `{close}`"),
            Self::UnterminatedString => write!(formatter, "unterminated string"),
            Self::DanglingEscape => write!(formatter, "escape at end of input"),
            Self::MissingIdent(prefix) => write!(formatter, "expected identifier after `{prefix}`"),
            Self::DanglingCombinator => write!(formatter, "combinator without a right-hand side"),
            Self::Unexpected(found) => write!(formatter, "unexpected character `{found}`"),
        }
    }
}

impl core::error::Error for SelectorParseError {}

//! Token kinds and the static keyword table.
//!
//! Classification is a pure lookup: [`classify`] maps a spelling to its
//! [`TokenKind`], and anything that is neither a keyword nor the conversion
//! operator is a free [`Value`](TokenKind::Value).  The table is immutable
//! and built at compile time.

use std::fmt;

/// The conversion operator that separates selection from actions.
pub const OPERATOR: &str = "->";

/// Wildcard value accepted by `DESK`, `MV_TO`, `MV_SEPARATE` and `WAIT`.
pub const WILDCARD: &str = "*";

/// Post-filter reduction of the matched set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    All,
    First,
    Last,
}

/// Window filters; they compose conjunctively in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Id,
    Regex,
    Contains,
    Full,
    Desk,
}

/// Actions applied to the resolved target list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Close,
    MvTo,
    MvSeparate,
    Active,
    Wait,
    Print,
}

/// Tokens that launch an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Creator {
    Create,
    ForceCreate,
}

/// Commands that make up a whole query on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unary {
    Switch,
}

/// Semantic kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Selector(Selector),
    Filter(FilterKind),
    Action(Action),
    Creator(Creator),
    /// `BY`, purely syntactic.
    Connective,
    /// `->`
    Operator,
    Unary(Unary),
    /// Free-form value.
    Value,
}

impl TokenKind {
    /// Whether a value token must immediately follow this token.
    pub fn requires_value(self) -> bool {
        matches!(
            self,
            TokenKind::Filter(_)
                | TokenKind::Action(Action::MvTo | Action::MvSeparate | Action::Wait)
                | TokenKind::Creator(_)
                | TokenKind::Unary(_)
        )
    }

    /// Whether the executor has a handler for this token.
    pub fn is_executable(self) -> bool {
        !matches!(self, TokenKind::Connective | TokenKind::Value)
    }

    /// Whether this token short-circuits the pipeline walk.
    pub fn is_unary(self) -> bool {
        matches!(self, TokenKind::Unary(_))
    }
}

static KEYWORDS: &[(&str, TokenKind)] = &[
    ("ALL", TokenKind::Selector(Selector::All)),
    ("FIRST", TokenKind::Selector(Selector::First)),
    ("LAST", TokenKind::Selector(Selector::Last)),
    ("BY", TokenKind::Connective),
    ("ID", TokenKind::Filter(FilterKind::Id)),
    ("REGEX", TokenKind::Filter(FilterKind::Regex)),
    ("CONTAINS", TokenKind::Filter(FilterKind::Contains)),
    ("FULL", TokenKind::Filter(FilterKind::Full)),
    ("DESK", TokenKind::Filter(FilterKind::Desk)),
    ("CLOSE", TokenKind::Action(Action::Close)),
    ("MV_TO", TokenKind::Action(Action::MvTo)),
    ("MV_SEPARATE", TokenKind::Action(Action::MvSeparate)),
    ("ACTIVE", TokenKind::Action(Action::Active)),
    ("WAIT", TokenKind::Action(Action::Wait)),
    ("PRINT", TokenKind::Action(Action::Print)),
    ("CREATE", TokenKind::Creator(Creator::Create)),
    ("FORCE_CREATE", TokenKind::Creator(Creator::ForceCreate)),
    ("SWITCH", TokenKind::Unary(Unary::Switch)),
];

/// Look up the kind of a keyword or the operator.  Returns `None` for free
/// values.  Keywords are case-sensitive.
pub fn classify(token: &str) -> Option<TokenKind> {
    if token == OPERATOR {
        return Some(TokenKind::Operator);
    }
    KEYWORDS
        .iter()
        .find(|(spelling, _)| *spelling == token)
        .map(|(_, kind)| *kind)
}

/// Kind of `token`, falling back to [`TokenKind::Value`].
pub fn kind_of(token: &str) -> TokenKind {
    classify(token).unwrap_or(TokenKind::Value)
}

/// `true` for anything that is neither the operator nor a keyword.
pub fn is_value_token(token: &str) -> bool {
    classify(token).is_none()
}

/// Spelling of a keyword kind, for messages.
pub fn spelling(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Operator => OPERATOR,
        TokenKind::Value => "<value>",
        _ => KEYWORDS
            .iter()
            .find(|(_, k)| *k == kind)
            .map(|(s, _)| *s)
            .unwrap_or("<unknown>"),
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(spelling(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_keywords_and_operator() {
        assert_eq!(classify("ALL"), Some(TokenKind::Selector(Selector::All)));
        assert_eq!(classify("CONTAINS"), Some(TokenKind::Filter(FilterKind::Contains)));
        assert_eq!(classify("MV_SEPARATE"), Some(TokenKind::Action(Action::MvSeparate)));
        assert_eq!(classify("FORCE_CREATE"), Some(TokenKind::Creator(Creator::ForceCreate)));
        assert_eq!(classify("SWITCH"), Some(TokenKind::Unary(Unary::Switch)));
        assert_eq!(classify("->"), Some(TokenKind::Operator));
    }

    #[test]
    fn free_values_are_unclassified() {
        assert_eq!(classify("Firefox"), None);
        assert_eq!(classify("contains"), None);
        assert_eq!(kind_of("*"), TokenKind::Value);
        assert!(is_value_token("Visual Studio Code"));
        assert!(!is_value_token("CLOSE"));
        assert!(!is_value_token("->"));
    }

    #[test]
    fn value_taking_tokens() {
        for t in ["ID", "REGEX", "CONTAINS", "FULL", "DESK", "MV_TO", "MV_SEPARATE", "WAIT", "CREATE", "FORCE_CREATE", "SWITCH"] {
            assert!(kind_of(t).requires_value(), "{t} should take a value");
        }
        for t in ["ALL", "FIRST", "LAST", "BY", "CLOSE", "ACTIVE", "PRINT", "->"] {
            assert!(!kind_of(t).requires_value(), "{t} should not take a value");
        }
    }

    #[test]
    fn connective_and_values_are_not_executable() {
        assert!(!kind_of("BY").is_executable());
        assert!(!kind_of("Firefox").is_executable());
        assert!(kind_of("->").is_executable());
        assert!(kind_of("SWITCH").is_unary());
        assert!(!kind_of("ACTIVE").is_unary());
    }

    #[test]
    fn spelling_round_trips_through_the_table() {
        for (s, k) in KEYWORDS {
            assert_eq!(spelling(*k), *s);
        }
        assert_eq!(TokenKind::Operator.to_string(), "->");
    }
}

//! Lexical analysis of query strings.
//!
//! A query is split on runs of whitespace that sit outside any balanced
//! `(...)` group, so `CONTAINS (Visual Studio Code)` survives as two raw
//! tokens, `CONTAINS` and `(Visual Studio Code)`.  [`tokenize`] then
//! flattens every `keyword(value)` unit into two entries and unwraps bare
//! `(value)` groups, giving a flat list the executor can walk.

use crate::error::QueryError;
use crate::token::{classify, kind_of};

/// Split `text` on characters matching `is_delim`, except inside
/// parentheses.  Empty pieces are dropped.
///
/// Fails when a `)` has no matching `(` or a `(` is never closed.
pub(crate) fn split_outside_parens(
    text: &str,
    is_delim: impl Fn(char) -> bool,
) -> Result<Vec<String>, QueryError> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in text.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    QueryError::ParseToken(format!("unmatched `)` in {:?}", text))
                })?;
                current.push(c);
            }
            c if depth == 0 && is_delim(c) => {
                if !current.is_empty() {
                    pieces.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if depth > 0 {
        return Err(QueryError::ParseToken(format!(
            "unbalanced `(` in {:?}",
            text
        )));
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    Ok(pieces)
}

/// Split a query into raw whitespace-separated tokens, keeping
/// parenthesized groups intact.
pub fn split_tokens(expression: &str) -> Result<Vec<String>, QueryError> {
    split_outside_parens(expression, char::is_whitespace)
}

/// Split a query into a flat token list.
///
/// `keyword(value)` becomes `[keyword, value]`; a standalone `(value)` is
/// accepted only right after a keyword that takes a value and becomes
/// `value`.  One pair of matching quotes around a value is stripped.
///
/// ```
/// # use wizarddes::tokenizer::tokenize;
/// let tokens = tokenize("ALL BY CONTAINS (Visual Studio Code) -> MV_TO(2)").unwrap();
/// assert_eq!(tokens, ["ALL", "BY", "CONTAINS", "Visual Studio Code", "->", "MV_TO", "2"]);
/// ```
pub fn tokenize(expression: &str) -> Result<Vec<String>, QueryError> {
    let mut tokens: Vec<String> = Vec::new();

    for raw in split_tokens(expression)? {
        if classify(&raw).is_some() {
            tokens.push(raw);
            continue;
        }

        // A bare group is the value of the keyword right before it, as in
        // `CONTAINS (a b)`.  After `->`, a value-less keyword or at the start
        // it has no keyword to belong to.
        if raw.starts_with('(') {
            let follows_keyword = tokens
                .last()
                .is_some_and(|prev| kind_of(prev).requires_value());
            if !follows_keyword {
                return Err(QueryError::ParseToken(format!(
                    "value {} does not follow a keyword that takes a value",
                    raw
                )));
            }
            tokens.push(enclosed_value(&raw, 0)?);
            continue;
        }

        let open = raw
            .find('(')
            .ok_or_else(|| QueryError::ParseToken(format!("bad token: {}", raw)))?;
        let value = enclosed_value(&raw, open)?;
        tokens.push(raw[..open].to_string());
        tokens.push(value);
    }

    Ok(tokens)
}

/// Extract the value of the group opened at byte `open`, which must close
/// on the last character of `token`.
fn enclosed_value(token: &str, open: usize) -> Result<String, QueryError> {
    let bad = || QueryError::ParseToken(format!("bad token: {}", token));

    let mut depth = 0usize;
    let mut close = None;
    for (i, c) in token[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(open + i);
                    break;
                }
            }
            _ => {}
        }
    }
    let close = close.ok_or_else(bad)?;
    if close != token.len() - 1 {
        return Err(bad());
    }

    let value = strip_quotes(token[open + 1..close].trim());
    if value.is_empty() {
        return Err(QueryError::ParseToken(format!("empty value in {}", token)));
    }
    Ok(value.to_string())
}

/// Remove one pair of matching surrounding quotes.
fn strip_quotes(s: &str) -> &str {
    for q in ['\'', '"'] {
        if let Some(inner) = s.strip_prefix(q).and_then(|rest| rest.strip_suffix(q)) {
            return inner;
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace_outside_parens() {
        let raw = split_tokens("ALL  BY CONTAINS (Visual Studio Code)\t-> CLOSE ").unwrap();
        assert_eq!(raw, ["ALL", "BY", "CONTAINS", "(Visual Studio Code)", "->", "CLOSE"]);
    }

    #[test]
    fn keyword_with_spaced_value_is_one_unit() {
        assert_eq!(
            tokenize("CONTAINS (Visual Studio Code)").unwrap(),
            ["CONTAINS", "Visual Studio Code"]
        );
        assert_eq!(
            tokenize("CONTAINS(Visual Studio Code)").unwrap(),
            ["CONTAINS", "Visual Studio Code"]
        );
    }

    #[test]
    fn flattens_a_full_query() {
        assert_eq!(
            tokenize("ALL BY CONTAINS(Firefox) -> MV_TO(3)").unwrap(),
            ["ALL", "BY", "CONTAINS", "Firefox", "->", "MV_TO", "3"]
        );
    }

    #[test]
    fn values_keep_punctuation() {
        assert_eq!(
            tokenize("FIRST BY FULL(~/src, main.rs - vim) -> MV_SEPARATE(1,3,5)").unwrap(),
            ["FIRST", "BY", "FULL", "~/src, main.rs - vim", "->", "MV_SEPARATE", "1,3,5"]
        );
    }

    #[test]
    fn nested_parens_stay_in_the_value() {
        assert_eq!(
            tokenize("ALL BY REGEX(^(foo|bar)$) -> PRINT").unwrap(),
            ["ALL", "BY", "REGEX", "^(foo|bar)$", "->", "PRINT"]
        );
    }

    #[test]
    fn strips_one_pair_of_quotes() {
        assert_eq!(tokenize("CONTAINS('Firefox')").unwrap(), ["CONTAINS", "Firefox"]);
        assert_eq!(tokenize("CONTAINS (\"a b\")").unwrap(), ["CONTAINS", "a b"]);
        assert_eq!(tokenize("CONTAINS('it\")").unwrap(), ["CONTAINS", "'it\""]);
    }

    #[test]
    fn unbalanced_parens_fail() {
        assert!(matches!(tokenize("ALL BY CONTAINS(Firefox -> CLOSE"), Err(QueryError::ParseToken(_))));
        assert!(matches!(tokenize("ALL BY CONTAINS Firefox) -> CLOSE"), Err(QueryError::ParseToken(_))));
    }

    #[test]
    fn trailing_text_after_group_fails() {
        assert!(matches!(tokenize("CONTAINS(a)(b)"), Err(QueryError::ParseToken(_))));
        assert!(matches!(tokenize("CONTAINS(a)->CLOSE"), Err(QueryError::ParseToken(_))));
    }

    #[test]
    fn bare_word_value_fails() {
        assert!(matches!(tokenize("ALL BY CONTAINS Firefox"), Err(QueryError::ParseToken(_))));
    }

    #[test]
    fn bare_group_needs_a_value_keyword_before_it() {
        // Accepted: directly after a keyword that takes a value.
        assert_eq!(tokenize("MV_TO (3)").unwrap(), ["MV_TO", "3"]);
        assert_eq!(tokenize("SWITCH ( 1 )").unwrap(), ["SWITCH", "1"]);
        // Rejected: at the start, after `->`, after a value-less keyword, or
        // after a value.
        assert!(matches!(tokenize("(Firefox) -> CLOSE"), Err(QueryError::ParseToken(_))));
        assert!(matches!(tokenize("ALL -> (x)"), Err(QueryError::ParseToken(_))));
        assert!(matches!(tokenize("ALL -> CLOSE (x)"), Err(QueryError::ParseToken(_))));
        assert!(matches!(tokenize("CONTAINS(a) (b)"), Err(QueryError::ParseToken(_))));
    }

    #[test]
    fn empty_value_fails() {
        assert!(matches!(tokenize("CONTAINS()"), Err(QueryError::ParseToken(_))));
        assert!(matches!(tokenize("CONTAINS ( '' )"), Err(QueryError::ParseToken(_))));
    }

    #[test]
    fn unknown_keyword_is_still_split() {
        assert_eq!(tokenize("FOO(bar)").unwrap(), ["FOO", "bar"]);
    }

    #[test]
    fn empty_expression_has_no_tokens() {
        assert!(tokenize("   ").unwrap().is_empty());
    }
}

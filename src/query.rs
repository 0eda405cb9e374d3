//! Compiles a query string into executable [`Step`]s.
//!
//! All structural checks happen here, before any handler runs: every
//! value-taking keyword must be followed by a genuine value (not another
//! keyword, not the operator), and a unary command must stand alone with
//! exactly one value.  Semantic checks on the values themselves are left
//! to the handlers in [`executor`](crate::executor).

use crate::error::QueryError;
use crate::token::{is_value_token, kind_of, spelling, TokenKind, Unary};
use crate::tokenizer::tokenize;

/// One token of a pipeline together with the value it consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Spelling as written in the query.
    pub token: String,
    pub kind: TokenKind,
    /// Present exactly when `kind.requires_value()`.
    pub value: Option<String>,
}

impl Step {
    /// The consumed value, for handlers whose kind requires one.
    pub(crate) fn value(&self) -> Result<&str, QueryError> {
        self.value.as_deref().ok_or_else(|| {
            QueryError::WrongQueryParameter(format!("`{}` token require value...", self.token))
        })
    }
}

/// A compiled query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// A standalone command such as `SWITCH(2)`.
    Unary { command: Unary, value: String },
    /// Selection, optional `->`, and actions, in declaration order.
    Pipeline(Vec<Step>),
}

impl Query {
    /// Tokenize and compile `expression`.
    pub fn parse(expression: &str) -> Result<Self, QueryError> {
        let tokens = tokenize(expression)?;
        Self::from_tokens(&tokens)
    }

    /// Compile an already tokenized query.
    pub fn from_tokens(tokens: &[String]) -> Result<Self, QueryError> {
        let first = tokens
            .first()
            .ok_or_else(|| QueryError::ExecuteQuery("empty query".into()))?;

        if let TokenKind::Unary(command) = kind_of(first) {
            if tokens.len() != 2 || !is_value_token(&tokens[1]) {
                return Err(QueryError::WrongQueryParameter(format!(
                    "unary operator `{}` requires only value and nothing more",
                    first
                )));
            }
            return Ok(Query::Unary {
                command,
                value: tokens[1].clone(),
            });
        }

        let mut steps = Vec::with_capacity(tokens.len());
        let mut iter = tokens.iter();
        while let Some(token) = iter.next() {
            let kind = kind_of(token);
            if kind.is_unary() {
                return Err(QueryError::ExecuteQuery(format!(
                    "`{}` can only be used on its own",
                    token
                )));
            }
            let value = if kind.requires_value() {
                let value = iter.next().ok_or_else(|| {
                    QueryError::WrongQueryParameter(format!("`{}` token require value...", token))
                })?;
                if !is_value_token(value) {
                    return Err(QueryError::WrongQueryParameter(format!(
                        "after `{}` expected a value, but got `{}`",
                        token, value
                    )));
                }
                Some(value.clone())
            } else {
                None
            };
            steps.push(Step {
                token: token.clone(),
                kind,
                value,
            });
        }
        Ok(Query::Pipeline(steps))
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.kind, &self.value) {
            (TokenKind::Value, _) => write!(f, "{}", self.token),
            (kind, Some(v)) => write!(f, "{}({})", spelling(*kind), v),
            (kind, None) => write!(f, "{}", spelling(*kind)),
        }
    }
}
